//! Message query assembly.
//!
//! [`Query::parse`] runs the option parsers in a fixed order: message types,
//! parameters, limits resolution, location, validity, time (which needs the
//! resolved time range limit), message format, output format and flags.
//! The first failing step aborts the whole query.

use serde::Serialize;

use crate::auth::GroupAuthorizer;
use crate::error::QueryResult;
use crate::limits::{LimitsTable, QueryLimits};
use crate::location::parse_location_options;
use crate::options::{
    parse_flag, parse_message_format, parse_message_types, parse_parameters, parse_validity,
    MessageFormat, QueryOptions,
};
use crate::params::RawParameters;
use crate::time::parse_time_options;

/// Whether a tier's multiple location options setting is honored.
///
/// Currently every caller is limited to one location category.
pub const TIER_MULTIPLE_LOCATION_OPTIONS: bool = false;

/// Default output format.
pub const DEFAULT_FORMAT: &str = "ascii";

/// Default number of decimals in output.
pub const DEFAULT_PRECISION: u64 = 6;

/// A parsed message query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub options: QueryOptions,

    /// Output format; a `debug` token combined with a format is removed.
    pub format: String,

    pub precision: u64,

    /// Name of the limits tier applied.
    pub limits_tier: String,
}

impl Query {
    /// Parse a message query from request parameters.
    ///
    /// Limits are resolved for `api_key` via `authorizer`; without either the
    /// default limits apply.
    pub fn parse(
        params: &RawParameters,
        limits_table: &LimitsTable,
        authorizer: Option<&dyn GroupAuthorizer>,
        api_key: Option<&str>,
    ) -> QueryResult<Self> {
        let message_types = parse_message_types(params)?;
        let parameters = parse_parameters(params)?;

        let tier = limits_table.resolve(authorizer, api_key)?;
        let limits = tier.limits;
        tracing::debug!(tier = %tier.name, ?limits, "Resolved query limits");

        let location_options =
            parse_location_options(params, allow_multiple_location_options(&limits))?;
        let validity = parse_validity(params)?;
        let time_options = parse_time_options(params, validity, limits.max_time_range_days())?;
        let message_format = parse_message_format(params)?;

        let (format, debug) = parse_format(&params.optional_string("format", DEFAULT_FORMAT));
        let precision = params.optional_unsigned("precision", DEFAULT_PRECISION)?;

        let distinct_messages = parse_flag(params, "distinct", true)?;
        // METAR filtering applies to TAC messages only
        let filter_metars = message_format == MessageFormat::Tac
            && parse_flag(params, "filtermetars", true)?;
        let exclude_specis = parse_flag(params, "excludespecis", false)?;

        let options = QueryOptions {
            message_types,
            parameters,
            location_options,
            time_options,
            validity,
            message_format,
            debug,
            distinct_messages,
            filter_metars,
            exclude_specis,
            max_message_stations: limits.max_stations(),
            max_message_rows: limits.max_rows(),
        };

        tracing::debug!(?options, "Parsed message query");

        Ok(Self {
            options,
            format,
            precision,
            limits_tier: tier.name.clone(),
        })
    }
}

fn allow_multiple_location_options(limits: &QueryLimits) -> bool {
    TIER_MULTIPLE_LOCATION_OPTIONS && limits.allow_multiple_location_options()
}

/// Split the debug token from an output format.
///
/// `debug` alone is kept as the format; e.g. `jsondebug` selects `json`.
fn parse_format(format: &str) -> (String, bool) {
    if format == "debug" {
        return (format.to_string(), true);
    }

    if format.contains("debug") {
        (format.replacen("debug", "", 1), true)
    } else {
        (format.to_string(), false)
    }
}
