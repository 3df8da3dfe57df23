//! Api key group membership lookups.
//!
//! Group limits are granted through an external authorization service which
//! answers whether an api key is a member of a group (a token value of the
//! `avi` service). [`GroupAuthorizer`] is the only contract consumed from it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::QueryResult;

/// Service tag used for group membership queries.
pub const AVI_SERVICE: &str = "avi";

/// Answers group membership queries for api keys.
pub trait GroupAuthorizer: Send + Sync {
    /// Whether `api_key` is a member of `group` for `service`.
    ///
    /// With `require_group_exists` a group unknown to the service never
    /// grants access.
    fn authorize(
        &self,
        api_key: &str,
        group: &str,
        service: &str,
        require_group_exists: bool,
    ) -> QueryResult<bool>;
}

/// In-memory group memberships, loaded from YAML.
///
/// ```yaml
/// keys:
///   testkey: [A]
///   otherkey: [B, C]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticAuthorizer {
    #[serde(default)]
    keys: HashMap<String, Vec<String>>,

    #[serde(default = "default_services")]
    services: Vec<String>,
}

fn default_services() -> Vec<String> {
    vec![AVI_SERVICE.to_string()]
}

impl StaticAuthorizer {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            services: default_services(),
        }
    }

    /// Add a group membership for an api key.
    pub fn with_member(mut self, api_key: &str, group: &str) -> Self {
        self.keys
            .entry(api_key.to_string())
            .or_default()
            .push(group.to_string());
        self
    }

    pub fn from_yaml_str(yaml: &str) -> QueryResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let authorizer = Self::from_yaml_str(&content)?;

        tracing::info!(
            "Loaded memberships for {} api keys from {:?}",
            authorizer.keys.len(),
            path
        );

        Ok(authorizer)
    }

    fn known_groups(&self) -> HashSet<&str> {
        self.keys
            .values()
            .flat_map(|groups| groups.iter().map(String::as_str))
            .collect()
    }
}

impl GroupAuthorizer for StaticAuthorizer {
    fn authorize(
        &self,
        api_key: &str,
        group: &str,
        service: &str,
        require_group_exists: bool,
    ) -> QueryResult<bool> {
        if !self.services.iter().any(|s| s == service) {
            return Ok(false);
        }

        let is_member = self
            .keys
            .get(api_key)
            .is_some_and(|groups| groups.iter().any(|g| g == group));

        if is_member {
            return Ok(true);
        }

        // Unrestricted group
        Ok(!require_group_exists && !self.known_groups().contains(group))
    }
}
