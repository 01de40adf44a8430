//! Identity directory — maps login usernames to internal ids.
//!
//! The directory is read-only once built. The server loads it at startup
//! (either the built-in table or a YAML file) and shares it across requests.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

/// Errors raised while loading a directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Read-only lookup from username to internal id.
pub trait IdentityDirectory: Send + Sync {
    /// Returns the internal id for `username`, or `None` if it is unknown.
    fn internal_id(&self, username: &str) -> Option<i64>;
}

/// Directory backed by a fixed in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: HashMap<String, i64>,
}

impl StaticDirectory {
    pub fn new(users: HashMap<String, i64>) -> Self {
        Self { users }
    }

    /// The default table shipped with the gateway.
    pub fn builtin() -> Self {
        Self::new(HashMap::from([
            ("tabone".to_string(), 0),
            ("lorenzo".to_string(), 25),
        ]))
    }

    /// Parse a YAML mapping of `username: internal_id`.
    ///
    /// An empty document yields an empty directory.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DirectoryError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let users: HashMap<String, i64> = serde_yaml::from_str(yaml)?;
        Ok(Self::new(users))
    }

    /// Read and parse a YAML directory file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl IdentityDirectory for StaticDirectory {
    fn internal_id(&self, username: &str) -> Option<i64> {
        self.users.get(username).copied()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_contains_known_users() {
        let dir = StaticDirectory::builtin();
        assert_eq!(dir.internal_id("tabone"), Some(0));
        assert_eq!(dir.internal_id("lorenzo"), Some(25));
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn lookup_is_exact() {
        let dir = StaticDirectory::builtin();
        assert_eq!(dir.internal_id("unknown"), None);
        assert_eq!(dir.internal_id("Tabone"), None);
        assert_eq!(dir.internal_id(""), None);
    }

    #[test]
    fn parses_yaml_mapping() {
        let dir = StaticDirectory::from_yaml_str("alice: 7\nbob: 1024\n").unwrap();
        assert_eq!(dir.internal_id("alice"), Some(7));
        assert_eq!(dir.internal_id("bob"), Some(1024));
        assert_eq!(dir.internal_id("tabone"), None);
    }

    #[test]
    fn empty_yaml_is_empty_directory() {
        let dir = StaticDirectory::from_yaml_str("  \n").unwrap();
        assert!(dir.is_empty());
    }

    #[test]
    fn rejects_non_integer_ids() {
        let err = StaticDirectory::from_yaml_str("alice: seven\n").unwrap_err();
        assert!(matches!(err, DirectoryError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "carol: 3").unwrap();
        let dir = StaticDirectory::from_file(file.path()).unwrap();
        assert_eq!(dir.internal_id("carol"), Some(3));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = StaticDirectory::from_file(tmp.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, DirectoryError::Io(_)));
    }
}
