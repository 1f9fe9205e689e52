//! HTTP handlers: generic resource dispatch and multipart upload.

pub mod resource;
pub mod upload;
pub use resource::*;
pub use upload::*;
