/// Android property file (build.prop, default.prop) parser
/// Mimics the getprop view of a `key=value` file: comments skipped, last value wins
use std::collections::HashMap;
use std::path::Path;

use super::error::{DtgenError, Result};

#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    props: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl PropertyStore {
    /// Parse the contents of a property file
    pub fn parse(text: &str) -> Self {
        let mut store = Self::default();

        for line in text.lines() {
            if line.starts_with('#') {
                continue;
            }
            // Lines without a delimiter are vendor noise, not errors
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            store.set(key, value);
        }

        store
    }

    /// Read and parse a property file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DtgenError::io(path, e))?;
        let store = Self::parse(&text);
        tracing::debug!("Parsed {} properties from {}", store.len(), path.display());
        Ok(store)
    }

    /// Exact-match lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.props[i].1.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.index.get(key) {
            Some(&i) => self.props[i].1 = value.to_string(),
            None => {
                self.index.insert(key.to_string(), self.props.len());
                self.props.push((key.to_string(), value.to_string()));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Properties in order of first appearance
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
