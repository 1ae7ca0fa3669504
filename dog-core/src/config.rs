//! # DogRS Configuration
//!
//! A minimal string key/value store. Keys are dotted (`http.port`,
//! `blob.chunk_size`) and values are parsed on read.
//!
//! ```rust
//! use dog_core::DogConfig;
//! let mut config = DogConfig::new();
//!
//! config.set("blob.chunk_size", "1048576");
//! assert_eq!(config.get_u64("blob.chunk_size"), Some(1_048_576));
//! ```
//!
//! ## Environment overrides
//! `DogConfig::from_env` collects every variable starting with a prefix:
//!
//! ```bash
//! export VIDEO_PROXY__HTTP__PORT=9000   # → http.port
//! ```

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct DogConfig {
    values: HashMap<String, String>,
}

impl DogConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Load every process environment variable starting with `prefix`.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Load from an explicit iterator of `(name, value)` pairs.
    ///
    /// `PREFIX__BLOB__CHUNK_SIZE` becomes `blob.chunk_size`.
    pub fn from_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::new();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped
                    .trim_start_matches("__")
                    .to_lowercase()
                    .replace("__", ".");
                if !normalized.is_empty() {
                    config.set(normalized, value);
                }
            }
        }
        config
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set `key` only when it is not present yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    /// Whole seconds stored under `key`.
    pub fn get_duration_secs(&self, key: &str) -> Option<Duration> {
        self.get_u64(key).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_keys_are_normalized() {
        let config = DogConfig::from_vars(
            "VIDEO_PROXY",
            vars(&[
                ("VIDEO_PROXY__HTTP__PORT", "9000"),
                ("VIDEO_PROXY__BLOB__CHUNK_SIZE", "4096"),
                ("PATH", "/usr/bin"),
            ]),
        );

        assert_eq!(config.get("http.port"), Some("9000"));
        assert_eq!(config.get_u64("blob.chunk_size"), Some(4096));
        assert_eq!(config.get("path"), None);
    }

    #[test]
    fn typed_getters_reject_garbage() {
        let mut config = DogConfig::new();
        config.set("a", "nope");
        config.set("c", "30");

        assert_eq!(config.get_u64("a"), None);
        assert_eq!(config.get_duration_secs("c"), Some(Duration::from_secs(30)));
    }

    #[test]
    fn set_default_does_not_override() {
        let mut config = DogConfig::new();
        config.set("http.port", "9000");
        config.set_default("http.port", "8080");
        config.set_default("http.host", "0.0.0.0");

        assert_eq!(config.get("http.port"), Some("9000"));
        assert_eq!(config.get("http.host"), Some("0.0.0.0"));
    }
}
