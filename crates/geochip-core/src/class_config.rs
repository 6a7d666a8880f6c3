//! Class id ↔ name lookup table.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

const DEFAULT_NULL_CLASS: &str = "null";

/// Class names indexed by class id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub names: Vec<String>,
    /// Name of the "don't care" class, if any. Must be one of `names`.
    #[serde(default)]
    pub null_class: Option<String>,
}

impl ClassConfig {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            null_class: None,
        }
    }

    pub fn with_null_class(mut self, name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if !self.names.contains(&name) {
            return Err(ConfigError::Invalid(format!(
                "null class `{name}` is not among the class names"
            )));
        }
        self.null_class = Some(name);
        Ok(self)
    }

    /// Make sure a null class exists, appending `"null"` when none is set.
    pub fn ensure_null_class(&mut self) {
        if self.null_class.is_some() {
            return;
        }
        if !self.names.iter().any(|n| n == DEFAULT_NULL_CLASS) {
            self.names.push(DEFAULT_NULL_CLASS.to_string());
        }
        self.null_class = Some(DEFAULT_NULL_CLASS.to_string());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get_name(&self, class_id: u32) -> Option<&str> {
        self.names.get(class_id as usize).map(String::as_str)
    }

    pub fn get_class_id(&self, name: &str) -> Option<u32> {
        self.names.iter().position(|n| n == name).map(|i| i as u32)
    }

    pub fn null_class_id(&self) -> Option<u32> {
        self.null_class.as_deref().and_then(|n| self.get_class_id(n))
    }

    /// Reject duplicate names and a dangling null class.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for name in &self.names {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate class name `{name}`")));
            }
        }
        if let Some(null) = &self.null_class {
            if !seen.contains(null.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "null class `{null}` is not among the class names"
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a JSON config.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_both_ways() {
        let cfg = ClassConfig::new(["background", "building", "road"]);
        assert_eq!(cfg.get_name(1), Some("building"));
        assert_eq!(cfg.get_name(3), None);
        assert_eq!(cfg.get_class_id("road"), Some(2));
        assert_eq!(cfg.null_class_id(), None);
    }

    #[test]
    fn ensure_null_class_appends_once() {
        let mut cfg = ClassConfig::new(["a", "b"]);
        cfg.ensure_null_class();
        cfg.ensure_null_class();
        assert_eq!(cfg.names, vec!["a", "b", "null"]);
        assert_eq!(cfg.null_class_id(), Some(2));
    }

    #[test]
    fn validation_catches_duplicates_and_dangling_null() {
        assert!(ClassConfig::new(["a", "a"]).validate().is_err());
        assert!(ClassConfig::new(["a"]).with_null_class("b").is_err());
    }

    #[test]
    fn json_round_trip_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("classes.json");
        let cfg = ClassConfig::new(["bg", "fg"])
            .with_null_class("bg")
            .expect("null class");
        cfg.write_json(&path).expect("write");
        assert_eq!(ClassConfig::load_json(&path).expect("load"), cfg);
    }
}
