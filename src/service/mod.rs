//! Request handling behind the transport: list queries, mutations, settings, dispatch.

mod dispatch;
pub mod mutation;
pub mod query;
pub mod settings;
pub use dispatch::{Dispatcher, Outcome, Payload};
pub use query::{build_list_query, ListQuery};
