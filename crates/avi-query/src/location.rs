//! Location option parsing.
//!
//! Messages can be selected by place name, ICAO code, country code, station
//! id, coordinate points, bounding boxes or WKT geometries. Each family of
//! options fills one [`LocationCategory`]; unless the caller is allowed to
//! combine them, only one category may be used per query.

use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::params::RawParameters;
use crate::values::{list_of_pairs, list_of_strings, list_of_values, Arity, CoordinateOrder, StationId};

/// Option names listed in the multiple location options error.
const LOCATION_OPTION_NAMES: &str = "'place', 'places', 'bbox', 'lonlat', 'latlon', 'lonlats', \
     'latlons', 'wkt', 'icao', 'icaos', 'country', 'countries', 'stationid', 'stationids'";

/// A point in longitude/latitude order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

/// Bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Mutually exclusive families of location options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationCategory {
    Place,
    LonLat,
    BBox,
    Wkt,
    Icao,
    Country,
    StationId,
}

/// Distance units accepted for `maxdistance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Kilometers,
    Miles,
    Meters,
    NauticalMiles,
}

impl DistanceUnit {
    /// Parse a distance unit suffix.
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.trim().to_lowercase().as_str() {
            "km" | "kilometers" | "kilometres" => Some(DistanceUnit::Kilometers),
            "mi" | "miles" => Some(DistanceUnit::Miles),
            "m" | "meters" | "metres" => Some(DistanceUnit::Meters),
            "nm" | "nauticalmiles" => Some(DistanceUnit::NauticalMiles),
            _ => None,
        }
    }

    /// Convert a value in this unit to meters.
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            DistanceUnit::Kilometers => value * 1000.0,
            DistanceUnit::Miles => value * 1609.344,
            DistanceUnit::Meters => value,
            DistanceUnit::NauticalMiles => value * 1852.0,
        }
    }
}

/// Parse a distance with an optional unit suffix; a bare number is in
/// kilometers. Returns the distance in meters.
pub fn parse_distance(option: &str, raw: &str) -> QueryResult<f64> {
    let trimmed = raw.trim();
    let number = trimmed.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == ' ');
    let unit = &trimmed[number.len()..];

    let value = number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| QueryError::invalid_option(option, format!("Invalid distance '{}'", raw)))?;

    let unit = if unit.is_empty() {
        DistanceUnit::Kilometers
    } else {
        DistanceUnit::parse(unit).ok_or_else(|| {
            QueryError::invalid_option(
                option,
                format!("Unknown distance unit '{}'. Supported units: km, mi, m, nm", unit),
            )
        })?
    };

    Ok(unit.to_meters(value))
}

/// Location selection of a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationOptions {
    pub places: Vec<String>,
    pub lonlats: Vec<LonLat>,
    pub bboxes: Vec<BBox>,
    pub wkts: Vec<String>,
    pub icaos: Vec<String>,
    pub countries: Vec<String>,
    pub station_ids: Vec<StationId>,

    /// Search radius in meters; 0 when not used.
    pub max_distance: f64,

    pub number_of_nearest_stations: u64,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            places: Vec::new(),
            lonlats: Vec::new(),
            bboxes: Vec::new(),
            wkts: Vec::new(),
            icaos: Vec::new(),
            countries: Vec::new(),
            station_ids: Vec::new(),
            max_distance: 0.0,
            number_of_nearest_stations: 1,
        }
    }
}

impl LocationOptions {
    pub fn is_populated(&self, category: LocationCategory) -> bool {
        match category {
            LocationCategory::Place => !self.places.is_empty(),
            LocationCategory::LonLat => !self.lonlats.is_empty(),
            LocationCategory::BBox => !self.bboxes.is_empty(),
            LocationCategory::Wkt => !self.wkts.is_empty(),
            LocationCategory::Icao => !self.icaos.is_empty(),
            LocationCategory::Country => !self.countries.is_empty(),
            LocationCategory::StationId => !self.station_ids.is_empty(),
        }
    }

    /// Whether any location option was given.
    pub fn has_locations(&self) -> bool {
        ALL_CATEGORIES.iter().any(|c| self.is_populated(*c))
    }

    /// Whether the selection is area based and needs a search radius.
    pub fn requires_max_distance(&self) -> bool {
        !self.lonlats.is_empty() || !self.bboxes.is_empty() || !self.wkts.is_empty()
    }

    fn check_single_category(&self, category: LocationCategory, allow_multiple: bool) -> QueryResult<()> {
        if allow_multiple {
            return Ok(());
        }

        let conflict = ALL_CATEGORIES
            .iter()
            .any(|c| *c != category && self.is_populated(*c));

        if conflict {
            return Err(QueryError::Conflict(format!(
                "Only one location option ({}) allowed",
                LOCATION_OPTION_NAMES
            )));
        }

        Ok(())
    }
}

const ALL_CATEGORIES: [LocationCategory; 7] = [
    LocationCategory::Place,
    LocationCategory::LonLat,
    LocationCategory::BBox,
    LocationCategory::Wkt,
    LocationCategory::Icao,
    LocationCategory::Country,
    LocationCategory::StationId,
];

/// Parse location options.
///
/// Options are handled family by family in a fixed order; `place` values are
/// taken first and never conflict by themselves, every later family fails
/// if a different category is already populated and `allow_multiple` is not
/// set.
pub fn parse_location_options(
    params: &RawParameters,
    allow_multiple: bool,
) -> QueryResult<LocationOptions> {
    let mut options = LocationOptions::default();

    for raw in params.get_all("place") {
        options.places.push(non_empty(raw, "place")?);
    }

    for raw in params.get_all("places") {
        options.check_single_category(LocationCategory::Place, allow_multiple)?;
        let places = present(list_of_strings(raw, "places")?, "places")?;
        options.places.extend(places);
    }

    for raw in params.get_all("bbox") {
        options.check_single_category(LocationCategory::BBox, allow_multiple)?;
        let corners = present(
            list_of_pairs::<f64>(raw, "bbox", 2, CoordinateOrder::LonLat)?,
            "bbox",
        )?;
        let ((west, south), (east, north)) = (corners[0], corners[1]);
        options.bboxes.push(BBox {
            west,
            south,
            east,
            north,
        });
    }

    let coordinate_options = [
        ("lonlat", Arity::Exactly(2), CoordinateOrder::LonLat),
        ("latlon", Arity::Exactly(2), CoordinateOrder::LatLon),
        ("lonlats", Arity::Even, CoordinateOrder::LonLat),
        ("latlons", Arity::Even, CoordinateOrder::LatLon),
    ];

    for (name, arity, order) in coordinate_options {
        for raw in params.get_all(name) {
            options.check_single_category(LocationCategory::LonLat, allow_multiple)?;
            let values = present(list_of_values::<f64>(raw, name, arity, order)?, name)?;
            options.lonlats.extend(values.chunks_exact(2).map(|lonlat| LonLat {
                lon: lonlat[0],
                lat: lonlat[1],
            }));
        }
    }

    for raw in params.get_all("wkt") {
        options.check_single_category(LocationCategory::Wkt, allow_multiple)?;
        if raw.trim().is_empty() {
            return Err(QueryError::EmptyOption("wkt".to_string()));
        }
        options.wkts.push(raw.to_string());
    }

    for raw in params.get_all("icao") {
        options.check_single_category(LocationCategory::Icao, allow_multiple)?;
        options.icaos.push(non_empty(raw, "icao")?);
    }

    for raw in params.get_all("icaos") {
        options.check_single_category(LocationCategory::Icao, allow_multiple)?;
        let icaos = present(list_of_strings(raw, "icaos")?, "icaos")?;
        options.icaos.extend(icaos);
    }

    for raw in params.get_all("country") {
        options.check_single_category(LocationCategory::Country, allow_multiple)?;
        options.countries.push(non_empty(raw, "country")?);
    }

    for raw in params.get_all("countries") {
        options.check_single_category(LocationCategory::Country, allow_multiple)?;
        let countries = present(list_of_strings(raw, "countries")?, "countries")?;
        options.countries.extend(countries);
    }

    for name in ["stationid", "stationids"] {
        for raw in params.get_all(name) {
            options.check_single_category(LocationCategory::StationId, allow_multiple)?;
            let ids = present(
                list_of_values::<StationId>(raw, name, Arity::Any, CoordinateOrder::Unchecked)?,
                name,
            )?;
            options.station_ids.extend(ids);
        }
    }

    if options.requires_max_distance() {
        let raw = params.get("maxdistance").ok_or_else(|| {
            QueryError::MissingParameter(
                "Option maxdistance is required with latlon/lonlat, bbox and wkt options"
                    .to_string(),
            )
        })?;

        let meters = parse_distance("maxdistance", raw)?;

        if meters < 0.0 {
            return Err(QueryError::UnknownValue(
                "maxdistance can't be negative".to_string(),
            ));
        }

        options.max_distance = meters;
    }

    options.number_of_nearest_stations = params.optional_unsigned("numberofstations", 1)?;

    Ok(options)
}

/// Values of a list option; an empty list value is an error.
fn present<T>(values: Option<Vec<T>>, option: &str) -> QueryResult<Vec<T>> {
    values.ok_or_else(|| QueryError::EmptyOption(option.to_string()))
}

fn non_empty(raw: &str, option: &str) -> QueryResult<String> {
    if raw.trim().is_empty() {
        return Err(QueryError::EmptyOption(option.to_string()));
    }
    Ok(raw.to_string())
}
