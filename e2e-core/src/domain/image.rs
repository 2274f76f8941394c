//! Container image references

use serde::{Deserialize, Serialize};
use std::fmt;

/// Image known to the local container engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalImage {
    pub name: String,
    pub tag: String,
}

impl LocalImage {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }
}

impl fmt::Display for LocalImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Image stored in the platform registry under a user's namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteImage {
    pub name: String,
    pub tag: String,
    /// Registry host, e.g. `registry.dev.apolo.us`
    pub registry: String,
    pub owner: String,
}

impl RemoteImage {
    pub fn new(
        name: impl Into<String>,
        tag: impl Into<String>,
        registry: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            registry: registry.into(),
            owner: owner.into(),
        }
    }

    /// Repository path inside the registry (`owner/name`)
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RemoteImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}:{}",
            self.registry, self.owner, self.name, self.tag
        )
    }
}
