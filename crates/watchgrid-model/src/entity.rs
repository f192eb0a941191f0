//! Named entity with a client-local GUID and a key/value parameter bag.

use serde_json::{Map, Value};
use uuid::Uuid;

/// Identity and free-form parameters shared by watchers and scriptlets.
///
/// Parameters keep insertion order for display; keys are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    guid: String,
    parameters: Vec<(String, String)>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guid: Uuid::new_v4().to_string(),
            parameters: Vec::new(),
        }
    }

    /// Client-local identifier, generated once at construction.
    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert a parameter, overwriting the value in place if the key exists.
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.parameters.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((key, value)),
        }
    }

    /// Remove a parameter by key. Returns the previous value if it existed.
    pub fn remove_parameter(&mut self, key: &str) -> Option<String> {
        let idx = self.parameters.iter().position(|(k, _)| k == key)?;
        Some(self.parameters.remove(idx).1)
    }

    /// Replace the parameter bag from a JSON `parameters` object.
    ///
    /// Non-string values are kept in their JSON text form; anything that is
    /// not an object yields an empty bag.
    pub fn load_parameters(&mut self, json: Option<&Value>) {
        self.parameters.clear();
        if let Some(Value::Object(map)) = json {
            for (key, value) in map {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                self.set_parameter(key.clone(), value);
            }
        }
    }

    /// Flatten the parameter bag into a plain JSON key → value mapping.
    pub fn parameters_json(&self) -> Map<String, Value> {
        self.parameters
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_parameter_overwrites_in_place() {
        let mut entity = Entity::new("w");
        entity.set_parameter("a", "1");
        entity.set_parameter("b", "2");
        entity.set_parameter("a", "3");

        assert_eq!(entity.parameters().len(), 2);
        assert_eq!(entity.parameters()[0], ("a".to_string(), "3".to_string()));
        assert_eq!(entity.parameter("b"), Some("2"));
    }

    #[test]
    fn remove_parameter_by_key() {
        let mut entity = Entity::new("w");
        entity.set_parameter("a", "1");
        assert_eq!(entity.remove_parameter("a"), Some("1".to_string()));
        assert_eq!(entity.remove_parameter("a"), None);
        assert!(entity.parameters().is_empty());
    }

    #[test]
    fn guids_are_unique() {
        assert_ne!(Entity::new("a").guid(), Entity::new("a").guid());
    }

    #[test]
    fn load_parameters_stringifies_values() {
        let mut entity = Entity::new("w");
        entity.set_parameter("stale", "x");
        entity.load_parameters(Some(&json!({ "host": "db", "port": 5432, "tls": true })));

        assert_eq!(entity.parameter("stale"), None);
        assert_eq!(entity.parameter("host"), Some("db"));
        assert_eq!(entity.parameter("port"), Some("5432"));
        assert_eq!(entity.parameter("tls"), Some("true"));
    }

    #[test]
    fn non_object_parameters_are_empty() {
        let mut entity = Entity::new("w");
        entity.load_parameters(Some(&json!(["a"])));
        assert!(entity.parameters().is_empty());
        entity.load_parameters(None);
        assert!(entity.parameters().is_empty());
    }
}
