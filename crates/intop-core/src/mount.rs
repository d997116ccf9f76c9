//! Parsing of mount trait entries.
//!
//! Accepted forms:
//!
//! - `configmap:<name>[/<key>][@<path>]`
//! - `secret:<name>[/<key>][@<path>]`
//! - `file:<path>`

use std::fmt;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    ConfigMap,
    Secret,
    File,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigMap => write!(f, "configmap"),
            Self::Secret => write!(f, "secret"),
            Self::File => write!(f, "file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountResource {
    storage_type: StorageType,
    name: String,
    key: Option<String>,
    destination: Option<String>,
}

impl MountResource {
    pub fn parse(value: &str) -> Result<Self> {
        let (prefix, rest) = value
            .split_once(':')
            .ok_or_else(|| CoreError::invalid_resource_spec(value))?;

        let storage_type = match prefix {
            "configmap" => StorageType::ConfigMap,
            "secret" => StorageType::Secret,
            "file" => StorageType::File,
            _ => return Err(CoreError::invalid_resource_spec(value)),
        };

        let (source, destination) = match rest.split_once('@') {
            Some((source, dest)) if !dest.is_empty() => (source, Some(dest.to_string())),
            Some(_) => return Err(CoreError::invalid_resource_spec(value)),
            None => (rest, None),
        };

        let (name, key) = match storage_type {
            StorageType::File => (source, None),
            _ => match source.split_once('/') {
                Some((name, key)) if !key.is_empty() => (name, Some(key.to_string())),
                Some(_) => return Err(CoreError::invalid_resource_spec(value)),
                None => (source, None),
            },
        };

        if name.is_empty() {
            return Err(CoreError::invalid_resource_spec(value));
        }

        Ok(Self {
            storage_type,
            name: name.to_string(),
            key,
            destination,
        })
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_configmap_with_key_and_path() {
        let res = MountResource::parse("configmap:app-config/application.properties@/etc/app").unwrap();
        assert_eq!(res.storage_type(), StorageType::ConfigMap);
        assert_eq!(res.name(), "app-config");
        assert_eq!(res.key(), Some("application.properties"));
        assert_eq!(res.destination(), Some("/etc/app"));
    }

    #[test]
    fn test_parse_secret() {
        let res = MountResource::parse("secret:db-credentials").unwrap();
        assert_eq!(res.storage_type(), StorageType::Secret);
        assert_eq!(res.name(), "db-credentials");
        assert!(res.key().is_none());
        assert!(res.destination().is_none());
    }

    #[test]
    fn test_parse_file_keeps_slashes() {
        let res = MountResource::parse("file:/tmp/data/input.csv").unwrap();
        assert_eq!(res.storage_type(), StorageType::File);
        assert_eq!(res.name(), "/tmp/data/input.csv");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for value in ["nothing", "volume:x", "configmap:", "configmap:cm/", "secret:s@"] {
            assert!(MountResource::parse(value).is_err(), "{value} should not parse");
        }
    }
}
