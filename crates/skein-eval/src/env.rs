//! Case-insensitive variable store.

use skein_types::ast::fold_name;
use skein_types::Value;
use std::collections::BTreeMap;

/// Dialogue variables, keyed by folded name.
///
/// `gold`, `Gold` and ` GOLD ` all address the same slot. A missing
/// variable reads as absent, which conditions treat as `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
    bindings: BTreeMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(&fold_name(name))
    }

    /// Store `value`, returning the previous value if there was one.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.bindings.insert(fold_name(name), value.into())
    }

    /// True when `name` holds a non-null value.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.bindings.remove(&fold_name(name))
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Numeric read; numeric-looking strings coerce.
    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_number)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in folded-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_fold_case() {
        let mut vars = VariableStore::new();
        vars.set("HasKey", true);
        assert_eq!(vars.get("haskey"), Some(&Value::Bool(true)));
        assert!(vars.has(" HASKEY "));
        assert_eq!(vars.set("hasKey", false), Some(Value::Bool(true)));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn test_null_is_not_has() {
        let mut vars = VariableStore::new();
        vars.set("x", Value::Null);
        assert!(!vars.has("x"));
        assert_eq!(vars.get("x"), Some(&Value::Null));
        assert!(!vars.has("missing"));
    }

    #[test]
    fn test_typed_getters() {
        let mut vars = VariableStore::new();
        vars.set("gold", 12.5);
        vars.set("count", "7");
        vars.set("name", "Ada");
        vars.set("flag", true);
        assert_eq!(vars.get_number("gold"), Some(12.5));
        assert_eq!(vars.get_number("count"), Some(7.0));
        assert_eq!(vars.get_number("flag"), None);
        assert_eq!(vars.get_str("name"), Some("Ada"));
        assert_eq!(vars.get_str("gold"), None);
        assert_eq!(vars.get_bool("flag"), Some(true));
        assert_eq!(vars.get_bool("name"), None);
    }

    #[test]
    fn test_remove_and_iter() {
        let mut vars = VariableStore::new();
        vars.set("b", 2);
        vars.set("A", 1);
        let names: Vec<&str> = vars.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(vars.remove("B"), Some(Value::Number(2.0)));
        assert_eq!(vars.len(), 1);
        vars.clear();
        assert!(vars.is_empty());
    }
}
