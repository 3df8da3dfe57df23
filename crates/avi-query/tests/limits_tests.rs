//! Tests for configuration loading and limits resolution.

use std::io::Write;

use avi_query::{
    AviConfig, GroupAuthorizer, LimitsTable, QueryError, QueryResult, StaticAuthorizer,
    AVI_SERVICE,
};

/// Authorizer answering from a fixed list of (api key, group) memberships.
struct FakeAuthorizer {
    memberships: Vec<(&'static str, &'static str)>,
}

impl GroupAuthorizer for FakeAuthorizer {
    fn authorize(&self, api_key: &str, group: &str, service: &str, _exists: bool) -> QueryResult<bool> {
        assert_eq!(service, AVI_SERVICE);
        Ok(self
            .memberships
            .iter()
            .any(|(key, g)| *key == api_key && *g == group))
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ============================================================================
// Configuration files
// ============================================================================

#[test]
fn test_load_config_file() {
    let file = write_config(
        r#"
message:
  maxstations: 0
  maxrows: 0
  maxrangedays: 31
apikey:
  groups:
    - name: A
      maxrows: 1
      maxrangedays: 1
"#,
    );

    let config = AviConfig::from_file(file.path()).unwrap();
    let table = LimitsTable::from_config(&config).unwrap();

    assert!(table.uses_authorization());
    assert_eq!(table.tiers().len(), 2);
    assert_eq!(table.default_limits().max_rows(), 0);
    assert_eq!(table.default_limits().max_time_range_days(), 31);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = AviConfig::from_file(dir.path().join("avi.yaml")).unwrap_err();
    assert!(matches!(err, QueryError::Config(_)));
    assert_eq!(err.http_status_code(), 500);
}

#[test]
fn test_disabled_groups_do_not_use_authorization() {
    let config = AviConfig::from_yaml_str(
        r#"
apikey:
  disabled: true
  groups:
    - name: A
      maxrows: 1
"#,
    )
    .unwrap();
    let table = LimitsTable::from_config(&config).unwrap();

    assert!(!table.uses_authorization());
    assert_eq!(table.tiers().len(), 1);
}

#[test]
fn test_invalid_groups_fail_at_load() {
    for yaml in [
        "apikey:\n  groups: {name: A}\n",
        "apikey:\n  groups:\n    - A\n",
        "apikey:\n  groups:\n    - maxrows: 1\n",
        "apikey:\n  groups:\n    - name: A\n    - name: A\n",
        "apikey:\n  groups:\n    - name: A\n      maxcolumns: 1\n",
    ] {
        let config = AviConfig::from_yaml_str(yaml).unwrap();
        let err = LimitsTable::from_config(&config).unwrap_err();
        assert!(matches!(err, QueryError::Config(_)), "{}", yaml);
    }
}

#[test]
fn test_load_memberships_file() {
    let file = write_config("keys:\n  testkey: [A]\n");
    let auth = StaticAuthorizer::from_file(file.path()).unwrap();
    assert!(auth.authorize("testkey", "A", AVI_SERVICE, true).unwrap());
}

// ============================================================================
// Limits resolution
// ============================================================================

#[test]
fn test_resolve_group_and_default() {
    let config = AviConfig::from_yaml_str(
        r#"
message:
  maxrows: 0
  maxrangedays: 31
apikey:
  groups:
    - name: A
      maxrows: 1
      maxrangedays: 1
"#,
    )
    .unwrap();
    let table = LimitsTable::from_config(&config).unwrap();
    let auth = FakeAuthorizer {
        memberships: vec![("testkey", "A")],
    };

    let limits = table.resolve(Some(&auth), Some("testkey")).unwrap().limits;
    assert_eq!(limits.max_rows(), 1);
    assert_eq!(limits.max_time_range_days(), 1);

    for key in [Some("otherkey"), Some(""), None] {
        let limits = table.resolve(Some(&auth), key).unwrap().limits;
        assert_eq!(limits.max_rows(), 0);
        assert_eq!(limits.max_time_range_days(), 31);
    }
}

#[test]
fn test_resolve_in_group_name_order() {
    let config = AviConfig::from_yaml_str(
        r#"
apikey:
  groups:
    - name: gold
      maxrows: 100
    - name: bronze
      maxrows: 10
"#,
    )
    .unwrap();
    let table = LimitsTable::from_config(&config).unwrap();
    let auth = FakeAuthorizer {
        memberships: vec![("testkey", "gold"), ("testkey", "bronze")],
    };

    let tier = table.resolve(Some(&auth), Some("testkey")).unwrap();
    assert_eq!(tier.name, "bronze");
    assert_eq!(tier.limits.max_rows(), 10);
}
