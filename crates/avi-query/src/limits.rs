//! Per-group message query limits.
//!
//! Limits are looked up by api key group. Groups are checked in ascending
//! group name order until the first membership is found; callers without a
//! key, or without any membership, get the default limits which are always
//! stored as the last table entry.

use serde::Serialize;

use crate::auth::{GroupAuthorizer, AVI_SERVICE};
use crate::config::AviConfig;
use crate::error::{QueryError, QueryResult};

/// Time range limit used when none (or a negative one) is configured.
pub const DEFAULT_MAX_TIME_RANGE_DAYS: i32 = 31;

/// Name of the default tier when no groups are configured.
const DEFAULT_TIER_NAME: &str = "default";

/// Message query limits.
///
/// For station and row counts a negative value lets the engine decide and
/// 0 means unlimited. A negative time range is replaced by
/// [`DEFAULT_MAX_TIME_RANGE_DAYS`]; 0 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryLimits {
    max_stations: i32,
    max_rows: i32,
    max_time_range_days: i32,
    allow_multiple_location_options: bool,
}

impl QueryLimits {
    pub fn new(
        max_stations: i32,
        max_rows: i32,
        max_time_range_days: i32,
        allow_multiple_location_options: bool,
    ) -> Self {
        Self {
            max_stations,
            max_rows,
            max_time_range_days: normalize_time_range_days(max_time_range_days),
            allow_multiple_location_options,
        }
    }

    pub fn max_stations(&self) -> i32 {
        self.max_stations
    }

    pub fn max_rows(&self) -> i32 {
        self.max_rows
    }

    pub fn max_time_range_days(&self) -> i32 {
        self.max_time_range_days
    }

    pub fn allow_multiple_location_options(&self) -> bool {
        self.allow_multiple_location_options
    }

    pub fn with_max_stations(self, max_stations: i32) -> Self {
        Self {
            max_stations,
            ..self
        }
    }

    pub fn with_max_rows(self, max_rows: i32) -> Self {
        Self { max_rows, ..self }
    }

    pub fn with_max_time_range_days(self, max_time_range_days: i32) -> Self {
        Self {
            max_time_range_days: normalize_time_range_days(max_time_range_days),
            ..self
        }
    }

    pub fn with_allow_multiple_location_options(self, allow: bool) -> Self {
        Self {
            allow_multiple_location_options: allow,
            ..self
        }
    }
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self::new(-1, -1, -1, false)
    }
}

fn normalize_time_range_days(days: i32) -> i32 {
    if days < 0 {
        DEFAULT_MAX_TIME_RANGE_DAYS
    } else {
        days
    }
}

/// Named limits tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitsTier {
    pub name: String,
    pub limits: QueryLimits,
}

/// Group limits in lookup order, default tier last.
#[derive(Debug, Clone)]
pub struct LimitsTable {
    tiers: Vec<LimitsTier>,
    use_authorization: bool,
}

impl LimitsTable {
    /// Build the table from group limits and the default limits.
    ///
    /// Groups are sorted by name; the default tier is appended under a name
    /// sorting after all group names.
    pub fn new(default_limits: QueryLimits, groups: Vec<(String, QueryLimits)>) -> QueryResult<Self> {
        let mut tiers: Vec<LimitsTier> = groups
            .into_iter()
            .map(|(name, limits)| LimitsTier { name, limits })
            .collect();

        tiers.sort_by(|a, b| a.name.cmp(&b.name));

        if let Some(pair) = tiers.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(QueryError::Config(format!(
                "Duplicate group name '{}'",
                pair[0].name
            )));
        }

        let use_authorization = !tiers.is_empty();

        let default_name = match tiers.last() {
            Some(last) => format!("{}Z", last.name),
            None => DEFAULT_TIER_NAME.to_string(),
        };

        tiers.push(LimitsTier {
            name: default_name,
            limits: default_limits,
        });

        Ok(Self {
            tiers,
            use_authorization,
        })
    }

    /// Build the table from configuration.
    pub fn from_config(config: &AviConfig) -> QueryResult<Self> {
        let table = Self::new(config.default_limits(), config.group_limits()?)?;

        tracing::info!(
            "Loaded {} api key limit groups, authorization {}",
            table.tiers.len() - 1,
            if table.use_authorization {
                "enabled"
            } else {
                "disabled"
            }
        );

        Ok(table)
    }

    /// Whether group memberships need to be checked at all.
    pub fn uses_authorization(&self) -> bool {
        self.use_authorization
    }

    /// All tiers in lookup order; the last one is the default tier.
    pub fn tiers(&self) -> &[LimitsTier] {
        &self.tiers
    }

    pub fn default_tier(&self) -> &LimitsTier {
        // The constructor always appends the default tier
        &self.tiers[self.tiers.len() - 1]
    }

    pub fn default_limits(&self) -> &QueryLimits {
        &self.default_tier().limits
    }

    /// Get the limits applicable for an api key.
    ///
    /// Returns the limits of the first group (in name order) the key is a
    /// member of, or the default limits when there is no authorizer, no key,
    /// no groups or no membership.
    pub fn resolve(
        &self,
        authorizer: Option<&dyn GroupAuthorizer>,
        api_key: Option<&str>,
    ) -> QueryResult<&LimitsTier> {
        let api_key = api_key.map(str::trim).filter(|key| !key.is_empty());

        let (authorizer, api_key) = match (authorizer, api_key) {
            (Some(authorizer), Some(api_key)) if self.tiers.len() > 1 => (authorizer, api_key),
            _ => return Ok(self.default_tier()),
        };

        let groups = &self.tiers[..self.tiers.len() - 1];

        for tier in groups {
            let is_member = authorizer
                .authorize(api_key, &tier.name, AVI_SERVICE, true)
                .map_err(|e| {
                    tracing::warn!("Group membership lookup for '{}' failed: {}", tier.name, e);
                    e
                })?;

            if is_member {
                tracing::debug!("Api key is a member of group '{}'", tier.name);
                return Ok(tier);
            }
        }

        Ok(self.default_tier())
    }
}
