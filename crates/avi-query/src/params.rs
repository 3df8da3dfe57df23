//! Raw request parameters.
//!
//! An option may be given any number of times; values are kept in the order
//! they were given.

use url::form_urlencoded;

use crate::error::{QueryError, QueryResult};

/// Multi-valued request parameters in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParameters {
    entries: Vec<(String, String)>,
}

impl RawParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an url encoded query string, with or without the leading `?`.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Remove all values of an option.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
    }

    /// First value of an option.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values of an option in request order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// First value of an option, or `default` when absent.
    pub fn optional_string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_string()
    }

    /// First value of an option as an unsigned integer, or `default` when
    /// absent.
    pub fn optional_unsigned(&self, name: &str, default: u64) -> QueryResult<u64> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| {
                QueryError::invalid_option(name, format!("'{}' is not an unsigned integer", raw))
            }),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_valued_order() {
        let mut params = RawParameters::new();
        params.add("place", "Helsinki");
        params.add("icao", "EFHK");
        params.add("place", "Tampere");

        assert_eq!(params.get("place"), Some("Helsinki"));
        assert_eq!(params.get_all("place"), vec!["Helsinki", "Tampere"]);
        assert!(params.contains("icao"));
        assert_eq!(params.len(), 3);

        params.remove("place");
        assert!(!params.contains("place"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_from_query_string() {
        let params = RawParameters::from_query_string(
            "?messagetype=METAR&param=icao,message&place=G%C3%B6teborg&place=Oulu&wkt=POINT(25+60)",
        );

        assert_eq!(params.get("messagetype"), Some("METAR"));
        assert_eq!(params.get_all("place"), vec!["Göteborg", "Oulu"]);
        assert_eq!(params.get("wkt"), Some("POINT(25 60)"));
    }

    #[test]
    fn test_optional_values() {
        let params: RawParameters = vec![("precision", "3"), ("distinct", "x")]
            .into_iter()
            .collect();

        assert_eq!(params.optional_string("format", "ascii"), "ascii");
        assert_eq!(params.optional_unsigned("precision", 6).unwrap(), 3);
        assert_eq!(params.optional_unsigned("numberofstations", 1).unwrap(), 1);
        assert!(params.optional_unsigned("distinct", 1).is_err());
    }
}
