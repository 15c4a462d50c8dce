//! Named configuration values: scalars and short strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetupError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Read-only after setup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterStore {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Builder-style insert, handy for tests and hosts.
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn require(&self, name: &str) -> Result<f64> {
        match self.values.get(name) {
            Some(ParamValue::Scalar(v)) => Ok(*v),
            Some(ParamValue::Text(_)) => Err(SetupError::invalid(format!(
                "parameter '{name}' must be numeric"
            ))),
            None => Err(SetupError::MissingParameter(name.to_string())),
        }
    }

    /// Absent (never a partial value) when not configured as a number.
    pub fn lookup_optional(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ParamValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_or(&self, name: &str, fallback: f64) -> f64 {
        self.lookup_optional(name).unwrap_or(fallback)
    }

    pub fn require_text(&self, name: &str) -> Result<&str> {
        match self.values.get(name) {
            Some(ParamValue::Text(s)) => Ok(s),
            Some(ParamValue::Scalar(_)) => Err(SetupError::invalid(format!(
                "parameter '{name}' must be a string"
            ))),
            None => Err(SetupError::MissingParameter(name.to_string())),
        }
    }

    pub fn lookup_text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ParamValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterStore {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParameterStore {
        ParameterStore::new()
            .with("PD_mL", 0.1)
            .with("ZLmeth", "rect")
    }

    #[test]
    fn test_require_scalar() {
        assert_eq!(store().require("PD_mL").unwrap(), 0.1);
    }

    #[test]
    fn test_require_missing() {
        assert_eq!(
            store().require("KO_aer").unwrap_err(),
            SetupError::MissingParameter("KO_aer".to_string())
        );
    }

    #[test]
    fn test_require_wrong_kind() {
        let s = store();
        assert!(matches!(
            s.require("ZLmeth"),
            Err(SetupError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            s.require_text("PD_mL"),
            Err(SetupError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_optional_lookups() {
        let s = store();
        assert_eq!(s.lookup_optional("ZLm"), None);
        assert_eq!(s.lookup_optional("ZLmeth"), None);
        assert_eq!(s.get_or("ZLm", 3.0), 3.0);
        assert_eq!(s.lookup_text("ZLmeth"), Some("rect"));
        assert_eq!(s.require_text("ZLmeth").unwrap(), "rect");
    }

    #[test]
    fn test_from_iter() {
        let s: ParameterStore = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        assert_eq!(s.len(), 2);
        assert_eq!(s.require("b").unwrap(), 2.0);
    }
}
