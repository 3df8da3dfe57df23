//! Aviation message query parsing
//!
//! This crate turns the raw parameters of an aviation message (METAR, TAF,
//! SIGMET, ...) request into validated [`QueryOptions`] for the message store.
//!
//! # Limits
//!
//! Each request is subject to limits on the number of stations, rows and
//! the length of the time range. Limits can be configured per api key group;
//! group memberships are looked up through a [`GroupAuthorizer`].
//!
//! # Example
//!
//! ```rust
//! use avi_query::{AviConfig, LimitsTable, Query, RawParameters};
//!
//! let config = AviConfig::from_yaml_str("message:\n  maxrangedays: 7\n").unwrap();
//! let table = LimitsTable::from_config(&config).unwrap();
//!
//! let params = RawParameters::from_query_string("param=icao,message&icao=EFHK");
//! let query = Query::parse(&params, &table, None, None).unwrap();
//!
//! assert_eq!(query.options.location_options.icaos, vec!["EFHK"]);
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod limits;
pub mod location;
pub mod options;
pub mod params;
pub mod query;
pub mod time;
pub mod values;

// Re-export commonly used types
pub use auth::{GroupAuthorizer, StaticAuthorizer, AVI_SERVICE};
pub use config::AviConfig;
pub use error::{ErrorCategory, QueryError, QueryResult};
pub use limits::{LimitsTable, LimitsTier, QueryLimits, DEFAULT_MAX_TIME_RANGE_DAYS};
pub use location::{BBox, LocationOptions, LonLat};
pub use options::{MessageFormat, QueryOptions, Validity};
pub use params::RawParameters;
pub use query::Query;
pub use time::{ObservationTime, TimeFormat, TimeOptions, TimeSelection, UtcTime};
pub use values::StationId;
