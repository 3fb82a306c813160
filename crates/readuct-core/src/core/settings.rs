use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use thiserror::Error;
use toml::Value;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Setting '{key}' has an invalid value: {source}")]
    InvalidType {
        key: String,
        #[source]
        source: toml::de::Error,
    },
}

/// A generic, string-keyed settings container.
///
/// Values are stored as untyped TOML values and converted on access. The
/// central operation is [`extract`](Self::extract), which *consumes* the key:
/// once a task has extracted every option it recognizes, whatever is left in
/// the collection was not understood by anyone and can be reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueCollection {
    values: BTreeMap<String, Value>,
}

impl ValueCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value_exists(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Converts the value stored under `key` without consuming it.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        self.values
            .get(key)
            .cloned()
            .map(|value| convert(key, value))
            .transpose()
    }

    pub fn add_or_override(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Removes `key` and returns its value converted to `T`, or `default` if the
    /// key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidType`] if the stored value cannot be
    /// converted to `T`. The key is consumed even in that case.
    pub fn extract<T: DeserializeOwned>(&mut self, key: &str, default: T) -> Result<T, SettingsError> {
        match self.values.remove(key) {
            Some(value) => convert(key, value),
            None => Ok(default),
        }
    }

    /// Copies every entry of `other` into `self`, overriding existing keys.
    pub fn merge(&mut self, other: &ValueCollection) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// The keys that are still present, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn convert<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, SettingsError> {
    value.try_into().map_err(|source| SettingsError::InvalidType {
        key: key.to_string(),
        source,
    })
}

impl From<toml::Table> for ValueCollection {
    fn from(table: toml::Table) -> Self {
        Self {
            values: table.into_iter().collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueCollection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
