use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat key/value attributes substituted into an email template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageAttributes(BTreeMap<String, String>);

impl MessageAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MessageAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// `key=value|_|` for every attribute, in key order. Used in log lines.
impl fmt::Display for MessageAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.0 {
            write!(f, "{key}={value}|_|")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_pairs_in_key_order() {
        let attrs: MessageAttributes = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(attrs.to_string(), "a=1|_|b=2|_|");
    }

    #[test]
    fn insert_replaces_existing_value() {
        let mut attrs = MessageAttributes::new();
        attrs.insert("AuthorName", "Ada").insert("AuthorName", "Grace");
        assert_eq!(attrs.get("AuthorName"), Some("Grace"));
        assert_eq!(attrs.len(), 1);
    }
}
