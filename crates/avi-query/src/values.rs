//! Comma separated value and coordinate pair parsing.
//!
//! Every list valued option goes through [`list_of_values`]. Its result
//! distinguishes three cases:
//! - `Ok(None)`: the option value is empty (after trimming)
//! - `Ok(Some(values))`: all fields were converted and validated
//! - `Err(_)`: the value is malformed; the error cites the option name,
//!   the 1-based position of the offending field and the raw input

use crate::error::{QueryError, QueryResult};

/// Station identifier type used by the message store.
pub type StationId = i64;

/// Number of values an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many values (e.g. 4 for a bounding box).
    Exactly(usize),
    /// Any even number of values.
    Even,
    /// Any number of values.
    Any,
}

/// How consecutive values are interpreted as coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateOrder {
    /// Plain values without range checks.
    Unchecked,
    /// `lon,lat` pairs.
    LonLat,
    /// `lat,lon` pairs; values are returned in `lon,lat` order.
    LatLon,
}

impl CoordinateOrder {
    fn is_coordinate(&self) -> bool {
        !matches!(self, CoordinateOrder::Unchecked)
    }

    /// Index of the input field providing output value `n`.
    fn source_index(&self, n: usize) -> usize {
        match self {
            CoordinateOrder::LatLon if n % 2 == 0 => n + 1,
            CoordinateOrder::LatLon => n - 1,
            _ => n,
        }
    }
}

/// Valid range of output value `n` of a `lon,lat` sequence.
fn coordinate_range(n: usize) -> (i32, i32) {
    if n % 2 == 0 {
        (-180, 180)
    } else {
        (-90, 90)
    }
}

/// A value that can be decoded from a single trimmed field.
pub trait FieldValue: Sized {
    /// Decode a non-empty, trimmed field.
    fn decode(field: &str) -> Option<Self>;

    /// Numeric value used for coordinate range checks.
    ///
    /// Values without a numeric interpretation are never range checked.
    fn coordinate(&self) -> Option<f64> {
        None
    }
}

impl FieldValue for StationId {
    fn decode(field: &str) -> Option<Self> {
        field.parse().ok()
    }

    fn coordinate(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl FieldValue for f64 {
    fn decode(field: &str) -> Option<Self> {
        field.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn coordinate(&self) -> Option<f64> {
        Some(*self)
    }
}

impl FieldValue for String {
    fn decode(field: &str) -> Option<Self> {
        Some(field.to_string())
    }
}

/// Parse a comma separated list of values.
pub fn list_of_values<T: FieldValue>(
    input: &str,
    option: &str,
    arity: Arity,
    order: CoordinateOrder,
) -> QueryResult<Option<Vec<T>>> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();

    if let Arity::Exactly(count) = arity {
        if fields.len() != count {
            return Err(QueryError::ValueCount {
                option: option.to_string(),
                count,
                raw: input.to_string(),
            });
        }
    }

    // Coordinates always come in pairs, whatever the arity
    if fields.len() % 2 != 0 && (arity == Arity::Even || order.is_coordinate()) {
        return Err(QueryError::EvenValueCount {
            option: option.to_string(),
            raw: input.to_string(),
        });
    }

    if let Some(index) = fields.iter().position(|f| f.is_empty()) {
        return Err(QueryError::EmptyValue {
            option: option.to_string(),
            position: index + 1,
            raw: input.to_string(),
        });
    }

    let mut values = Vec::with_capacity(fields.len());

    for n in 0..fields.len() {
        let source = order.source_index(n);
        let position = source + 1;

        let value = T::decode(fields[source]).ok_or_else(|| QueryError::InvalidValue {
            option: option.to_string(),
            position,
            raw: input.to_string(),
        })?;

        if order.is_coordinate() {
            let (min, max) = coordinate_range(n);

            if let Some(coordinate) = value.coordinate() {
                if !(f64::from(min)..=f64::from(max)).contains(&coordinate) {
                    return Err(QueryError::OutOfRange {
                        option: option.to_string(),
                        position,
                        raw: input.to_string(),
                        min,
                        max,
                    });
                }
            }
        }

        values.push(value);
    }

    Ok(Some(values))
}

/// Parse a comma separated list of value pairs.
///
/// `pairs` is the required number of pairs; 0 accepts any number of pairs.
pub fn list_of_pairs<T: FieldValue>(
    input: &str,
    option: &str,
    pairs: usize,
    order: CoordinateOrder,
) -> QueryResult<Option<Vec<(T, T)>>> {
    let arity = if pairs > 0 {
        Arity::Exactly(2 * pairs)
    } else {
        Arity::Even
    };

    Ok(list_of_values(input, option, arity, order)?.map(into_pairs))
}

/// Parse a comma separated list of plain strings.
pub fn list_of_strings(input: &str, option: &str) -> QueryResult<Option<Vec<String>>> {
    list_of_values(input, option, Arity::Any, CoordinateOrder::Unchecked)
}

fn into_pairs<T>(values: Vec<T>) -> Vec<(T, T)> {
    let mut iter = values.into_iter();
    let mut pairs = Vec::new();

    while let (Some(first), Some(second)) = (iter.next(), iter.next()) {
        pairs.push((first, second));
    }

    pairs
}
