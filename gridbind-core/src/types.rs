//! Common types used throughout the gridbind workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type for envelope metadata.
pub type Timestamp = DateTime<Utc>;

/// Partition identifier within a binding's fixed shard set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PartitionId(pub u32);

impl PartitionId {
    /// Create a new partition ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw partition ID value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PartitionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Name of a binding, unique within a binder instance.
///
/// The name doubles as the grid region name component shared by every
/// process attached to the binding, so it is validated up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingName(String);

impl BindingName {
    /// Create a new binding name.
    ///
    /// # Errors
    /// Returns an error if the name is empty, longer than 255 characters,
    /// or contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::Configuration {
                message: "Binding name cannot be empty".to_string(),
            });
        }

        if name.len() > 255 {
            return Err(crate::Error::Configuration {
                message: "Binding name cannot exceed 255 characters".to_string(),
            });
        }

        if !name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.') {
            return Err(crate::Error::Configuration {
                message: format!("Binding name '{name}' contains invalid characters"),
            });
        }

        Ok(Self(name))
    }

    /// Get the binding name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BindingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BindingName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_name_validation() {
        assert!(BindingName::new("valid-binding_name.123").is_ok());
        assert!(BindingName::new("").is_err());
        assert!(BindingName::new("invalid name with spaces").is_err());
        assert!(BindingName::new("invalid@name").is_err());

        let long_name = "a".repeat(256);
        assert!(BindingName::new(long_name).is_err());
    }

    #[test]
    fn test_partition_id() {
        let p = PartitionId::new(3);
        assert_eq!(p.value(), 3);
        assert_eq!(PartitionId::from(3), p);
        assert_eq!(p.to_string(), "3");
    }
}
