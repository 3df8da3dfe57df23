//! Plugin configuration loading and types.
//!
//! ```yaml
//! message:
//!   maxstations: 0
//!   maxrows: 0
//!   maxrangedays: 31
//! multiplelocationoptions: true
//! apikey:
//!   disabled: false
//!   groups:
//!     - name: A
//!       maxrows: 1
//!       maxrangedays: 1
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{QueryError, QueryResult};
use crate::limits::QueryLimits;

/// Configuration loaded from a YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AviConfig {
    /// Default message query limits.
    #[serde(default)]
    pub message: MessageConfig,

    /// Whether more than one location option may be given.
    #[serde(default)]
    pub multiplelocationoptions: Option<bool>,

    /// Api key group limits.
    #[serde(default)]
    pub apikey: ApiKeyConfig,
}

/// Default limits, applied when group limits are disabled or the caller
/// belongs to no configured group.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageConfig {
    /// Max # of stations; if missing or < 0 the engine decides, 0 is unlimited.
    #[serde(default)]
    pub maxstations: Option<i32>,

    /// Max # of rows; if missing or < 0 the engine decides, 0 is unlimited.
    #[serde(default)]
    pub maxrows: Option<i32>,

    /// Max time range length in days; if missing or < 0 the default is used,
    /// 0 is unlimited.
    #[serde(default)]
    pub maxrangedays: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeyConfig {
    /// Use the default limits for every caller.
    #[serde(default)]
    pub disabled: bool,

    /// List of group definitions; validated by [`AviConfig::group_limits`].
    #[serde(default)]
    pub groups: Option<Value>,
}

impl AviConfig {
    pub fn from_yaml_str(yaml: &str) -> QueryResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_yaml_str(&content)?;
        tracing::info!("Loaded configuration from {:?}", path);

        Ok(config)
    }

    /// Limits applied when no group limits apply.
    pub fn default_limits(&self) -> QueryLimits {
        QueryLimits::new(
            self.message.maxstations.unwrap_or(-1),
            self.message.maxrows.unwrap_or(-1),
            self.message.maxrangedays.unwrap_or(-1),
            self.multiplelocationoptions.unwrap_or(false),
        )
    }

    /// Parse the configured group limits in definition order.
    ///
    /// Settings missing from a group are taken from the default limits.
    /// Returns no groups when group limits are disabled.
    pub fn group_limits(&self) -> QueryResult<Vec<(String, QueryLimits)>> {
        if self.apikey.disabled {
            return Ok(Vec::new());
        }

        let groups = match &self.apikey.groups {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(groups) => groups,
        };

        let entries = groups.as_sequence().ok_or_else(|| {
            QueryError::Config("Groups must be stored in a list of groups".to_string())
        })?;

        let defaults = self.default_limits();
        let mut names = HashSet::new();
        let mut result = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let (name, limits) = parse_group(entry, index + 1, defaults)?;

            if !names.insert(name.clone()) {
                return Err(QueryError::Config(format!(
                    "Duplicate group name '{}'",
                    name
                )));
            }

            result.push((name, limits));
        }

        Ok(result)
    }
}

fn parse_group(
    entry: &Value,
    number: usize,
    defaults: QueryLimits,
) -> QueryResult<(String, QueryLimits)> {
    let mapping = entry.as_mapping().ok_or_else(|| {
        QueryError::Config(format!(
            "Groups must be stored in a list of groups: entry {} is not a group",
            number
        ))
    })?;

    let mut name = None;
    let mut limits = defaults;

    for (key, value) in mapping {
        let key = key.as_str().ok_or_else(|| {
            QueryError::Config(format!("Group {} has a non-string setting name", number))
        })?;

        match key {
            "name" => {
                let value = value
                    .as_str()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        QueryError::Config(format!(
                            "Group {} name must be a non-empty string",
                            number
                        ))
                    })?;
                name = Some(value.to_string());
            }
            "maxstations" => limits = limits.with_max_stations(int_setting(value, key, number)?),
            "maxrows" => limits = limits.with_max_rows(int_setting(value, key, number)?),
            "maxrangedays" => {
                limits = limits.with_max_time_range_days(int_setting(value, key, number)?)
            }
            "multiplelocationoptions" => {
                let allow = value.as_bool().ok_or_else(|| {
                    QueryError::Config(format!(
                        "Group {} setting '{}' must be a boolean",
                        number, key
                    ))
                })?;
                limits = limits.with_allow_multiple_location_options(allow);
            }
            other => {
                return Err(QueryError::Config(format!(
                    "Unknown variable '{}' in group {}",
                    other, number
                )));
            }
        }
    }

    let name = name.ok_or_else(|| {
        QueryError::Config(format!("Group name missing for group definition {}", number))
    })?;

    Ok((name, limits))
}

fn int_setting(value: &Value, key: &str, number: usize) -> QueryResult<i32> {
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| {
            QueryError::Config(format!(
                "Group {} setting '{}' must be an integer",
                number, key
            ))
        })
}
