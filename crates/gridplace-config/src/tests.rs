//! Tests for service configuration.

use super::*;
use gridplace_core::geometry::{RowRule, ZoneGeometry};

#[test]
fn test_toml_parsing() {
    let toml = r#"
        [server]
        bind = "127.0.0.1:9000"
        seed = "seed.json"

        [swap]
        atomic = "required"
        serialize_zones = false

        [zones]
        default_max_col = 24

        [zones.zones.lkmetro]
        max_col = 9
        rows = [
            { min_row = 1, max_row = 1, min_col = 1, max_col = 9 },
            { min_row = 2, max_row = 2, min_col = 1, max_col = 8 },
            { min_row = 3, max_row = 3, min_col = 3, max_col = 9 },
            { min_row = 4, max_row = 4 },
        ]
    "#;

    let config = GridConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.server.bind.port(), 9000);
    assert_eq!(config.server.seed, Some(PathBuf::from("seed.json")));
    assert_eq!(config.swap.atomic, AtomicSwapPolicy::Required);
    assert!(!config.swap.serialize_zones);

    let lkmetro = config.zone_table().effective("lkmetro");
    assert_eq!(lkmetro.rows.len(), 4);
    assert_eq!(lkmetro.rows[2], RowRule::rows(3, 3).with_cols(3, 9));
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        swap:
          atomic: preferred
        zones:
          zones:
            soi6:
              max_col: 20
              rows:
                - min_row: 1
                  max_row: 2
    "#;

    let config = GridConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.swap.atomic, AtomicSwapPolicy::Preferred);
    assert!(config.swap.serialize_zones);
    assert_eq!(
        config.zone_table().get("soi6"),
        Some(&ZoneGeometry::new(20).with_rule(RowRule::rows(1, 2)))
    );
}

#[test]
fn test_defaults_use_builtin_zones() {
    let config = GridConfig::from_toml_str("").unwrap();
    assert_eq!(config.server.bind.port(), 8080);
    assert_eq!(config.swap.atomic, AtomicSwapPolicy::Preferred);
    assert_eq!(config.zone_table(), ZoneTable::builtin());
}

#[test]
fn test_rejects_inverted_row_band() {
    let toml = r#"
        [zones.zones.broken]
        max_col = 5
        rows = [{ min_row = 4, max_row = 2 }]
    "#;
    let err = GridConfig::from_toml_str(toml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("broken")));
}

#[test]
fn test_rejects_sub_range_wider_than_zone() {
    let wide = ZoneGeometry::new(5).with_rule(RowRule::rows(1, 1).with_cols(1, 6));
    let config = GridConfig::new().with_zones(ZoneTable::new().with_zone("wide", wide));
    assert!(config.validate().is_err());
}

#[test]
fn test_builder() {
    let config = GridConfig::new()
        .with_atomic_policy(AtomicSwapPolicy::Required)
        .with_zones(ZoneTable::new().with_default_max_col(10));
    assert_eq!(config.swap.atomic, AtomicSwapPolicy::Required);
    assert_eq!(config.zone_table().effective("any").max_col, 10);
}

#[test]
fn test_shipped_config_matches_builtin_zones() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../gridplace.toml");
    let config = GridConfig::load(path).unwrap();
    assert_eq!(config.zone_table(), ZoneTable::builtin());
    assert_eq!(config.server.seed.as_deref(), Some(std::path::Path::new("data/seed.json")));
}
