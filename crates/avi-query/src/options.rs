//! Query option types and the simple option parsers.

use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::location::LocationOptions;
use crate::params::RawParameters;
use crate::time::TimeOptions;
use crate::values::list_of_strings;

/// Message validity selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    #[default]
    Accepted,
    Rejected,
}

impl Validity {
    /// Parse a validity selector, case insensitively.
    pub fn parse(value: &str) -> QueryResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "accepted" => Ok(Validity::Accepted),
            "rejected" => Ok(Validity::Rejected),
            _ => Err(QueryError::UnknownValue(
                "Unknown 'validity', use 'accepted' or 'rejected'".to_string(),
            )),
        }
    }
}

/// Message format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MessageFormat {
    #[default]
    #[serde(rename = "TAC")]
    Tac,
    #[serde(rename = "IWXXM")]
    Iwxxm,
}

impl MessageFormat {
    /// Parse a message format selector, case insensitively.
    pub fn parse(value: &str) -> QueryResult<Self> {
        match value.trim().to_uppercase().as_str() {
            "TAC" => Ok(MessageFormat::Tac),
            "IWXXM" => Ok(MessageFormat::Iwxxm),
            _ => Err(QueryError::UnknownValue(
                "Unknown 'messageformat', use 'TAC' or 'IWXXM'".to_string(),
            )),
        }
    }
}

/// Options of a message query, consumed by the message store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOptions {
    /// Upper case message types; empty selects all types.
    pub message_types: Vec<String>,

    /// Lower case names of the columns to return.
    pub parameters: Vec<String>,

    pub location_options: LocationOptions,
    pub time_options: TimeOptions,
    pub validity: Validity,
    pub message_format: MessageFormat,
    pub debug: bool,
    pub distinct_messages: bool,
    pub filter_metars: bool,
    pub exclude_specis: bool,

    pub max_message_stations: i32,
    pub max_message_rows: i32,
}

/// Parse the `messagetype` option into upper case message types.
pub fn parse_message_types(params: &RawParameters) -> QueryResult<Vec<String>> {
    let mut message_types = Vec::new();

    for raw in params.get_all("messagetype") {
        match list_of_strings(raw, "messagetype")? {
            Some(types) => message_types.extend(types.into_iter().map(|t| t.to_uppercase())),
            None => return Err(QueryError::EmptyOption("messagetype".to_string())),
        }
    }

    Ok(message_types)
}

/// Parse the mandatory `param` option into lower case parameter names.
pub fn parse_parameters(params: &RawParameters) -> QueryResult<Vec<String>> {
    let mut parameters = Vec::new();

    for raw in params.get_all("param") {
        match list_of_strings(raw, "param")? {
            Some(names) => parameters.extend(names.into_iter().map(|n| n.to_lowercase())),
            None => return Err(QueryError::EmptyOption("param".to_string())),
        }
    }

    if parameters.is_empty() {
        return Err(QueryError::MissingParameter(
            "Option 'param' must be provided".to_string(),
        ));
    }

    Ok(parameters)
}

/// Parse the `validity` option; defaults to accepted messages.
pub fn parse_validity(params: &RawParameters) -> QueryResult<Validity> {
    params
        .get("validity")
        .map_or(Ok(Validity::default()), Validity::parse)
}

/// Parse the `messageformat` option; defaults to TAC.
pub fn parse_message_format(params: &RawParameters) -> QueryResult<MessageFormat> {
    params
        .get("messageformat")
        .map_or(Ok(MessageFormat::default()), MessageFormat::parse)
}

/// Parse an unsigned flag option; non-zero is set.
pub fn parse_flag(params: &RawParameters, name: &str, default: bool) -> QueryResult<bool> {
    Ok(params.optional_unsigned(name, u64::from(default))? != 0)
}
