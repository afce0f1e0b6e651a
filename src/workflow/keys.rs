//! Process definition keys this application starts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKey {
    #[serde(rename = "key1")]
    Key1,
    #[serde(rename = "key2")]
    Key2,
}

impl ActivityKey {
    pub const ALL: [ActivityKey; 2] = [ActivityKey::Key1, ActivityKey::Key2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key1 => "key1",
            Self::Key2 => "key2",
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Key1 => "Key1",
            Self::Key2 => "Key2",
        }
    }
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKey {
    type Err = String;

    /// Accepts the key itself ("key1") or the variant name ("Key1").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.variant_name() == s)
            .ok_or_else(|| format!("unknown activity key '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_and_variant_name() {
        assert_eq!("key1".parse::<ActivityKey>(), Ok(ActivityKey::Key1));
        assert_eq!("Key2".parse::<ActivityKey>(), Ok(ActivityKey::Key2));
        assert!("key3".parse::<ActivityKey>().is_err());
    }

    #[test]
    fn test_serde_uses_key_string() {
        let json = serde_json::to_string(&ActivityKey::Key2).unwrap();
        assert_eq!(json, "\"key2\"");
        assert_eq!(ActivityKey::Key1.to_string(), "key1");
    }
}
