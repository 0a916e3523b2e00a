use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_parse_minimal_config() {
    let yaml = r#"
name: crm
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.name, "crm");
    assert_eq!(config.database.path, ":memory:");
    assert_eq!(config.domain_id, 1);
    assert!(config.upload_dir.is_none());
    assert!(config.script_paths.is_empty());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: crm
database:
  path: ./crm.duckdb
domain_id: 3
upload_dir: files/custom
script_paths:
  - upgrades
vars:
  locale: en_US
targets:
  prod:
    database:
      path: /var/lib/crm.duckdb
    vars:
      locale: fr_FR
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.domain_id, 3);
    assert_eq!(config.script_paths, vec!["upgrades".to_string()]);

    let root = Path::new("/srv/crm");
    assert_eq!(
        config.upload_dir_absolute(root),
        Some(PathBuf::from("/srv/crm/files/custom"))
    );
    assert_eq!(
        config.script_paths_absolute(root),
        vec![PathBuf::from("/srv/crm/upgrades")]
    );
}

#[test]
fn test_unknown_field_rejected() {
    let yaml = r#"
name: crm
shedule: nightly
"#;
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_target_database_override() {
    let yaml = r#"
name: crm
database:
  path: dev.duckdb
targets:
  prod:
    database:
      path: prod.duckdb
  staging: {}
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.get_database_config(None).unwrap().path, "dev.duckdb");
    assert_eq!(
        config.get_database_config(Some("prod")).unwrap().path,
        "prod.duckdb"
    );
    assert_eq!(
        config.get_database_config(Some("staging")).unwrap().path,
        "dev.duckdb"
    );

    let err = config.get_database_config(Some("qa")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("qa"));
    assert!(msg.contains("prod, staging"));
}

#[test]
fn test_merged_vars() {
    let yaml = r#"
name: crm
vars:
  locale: en_US
  currency: USD
targets:
  prod:
    vars:
      locale: fr_FR
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let base = config.get_merged_vars(None);
    assert_eq!(base["locale"].as_str(), Some("en_US"));

    let prod = config.get_merged_vars(Some("prod"));
    assert_eq!(prod["locale"].as_str(), Some("fr_FR"));
    assert_eq!(prod["currency"].as_str(), Some("USD"));
}

#[test]
fn test_load_from_dir() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("stepwise.yml"), "name: crm\ndomain_id: 2\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.domain_id, 2);
}

#[test]
fn test_load_from_dir_yaml_extension() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("stepwise.yaml"), "name: crm\n").unwrap();
    assert!(Config::load_from_dir(dir.path()).is_ok());
}

#[test]
fn test_load_missing_config() {
    let dir = tempdir().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_rejects_zero_domain() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stepwise.yml");
    fs::write(&path, "name: crm\ndomain_id: 0\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_load_rejects_empty_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stepwise.yml");
    fs::write(&path, "name: ''\n").unwrap();
    assert!(Config::load(&path).is_err());
}

#[test]
fn test_load_reports_parse_error_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stepwise.yml");
    fs::write(&path, "name: [unterminated\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
    assert!(err.to_string().contains("stepwise.yml"));
}

#[test]
fn test_resolve_target_prefers_flag() {
    assert_eq!(
        Config::resolve_target(Some("prod")),
        Some("prod".to_string())
    );
}
