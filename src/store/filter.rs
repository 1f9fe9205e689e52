//! Equality filter sets and ordering directives handed to datastore adapters.

use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

/// Ordered equality constraints, ANDed. A column appears at most once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSet(Vec<Filter>);

impl FilterSet {
    pub fn new() -> Self {
        FilterSet(Vec::new())
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut set = Self::new();
        set.set(column, value);
        set
    }

    pub fn and(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Add a constraint, replacing the value in place if the column is already filtered.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.0.iter_mut().find(|f| f.column == column) {
            Some(existing) => existing.value = value,
            None => self.0.push(Filter { column, value }),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.iter().find(|f| f.column == column).map(|f| &f.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderDirective {
    pub column: String,
    pub ascending: bool,
    pub nulls_first: bool,
}

impl OrderDirective {
    /// Ordering with nulls sorted last regardless of direction.
    pub fn nulls_last(column: impl Into<String>, ascending: bool) -> Self {
        OrderDirective {
            column: column.into(),
            ascending,
            nulls_first: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn setting_a_column_twice_replaces_in_place() {
        let mut set = FilterSet::eq("is_active", true).and("category", "web");
        set.set("is_active", false);
        let cols: Vec<_> = set.iter().map(|f| (f.column.as_str(), f.value.clone())).collect();
        assert_eq!(cols, vec![("is_active", json!(false)), ("category", json!("web"))]);
    }
}
