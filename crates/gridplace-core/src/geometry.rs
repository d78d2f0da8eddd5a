//! Zone geometry tables.
//!
//! Each zone has a column limit and, optionally, a list of row rules. A row
//! rule covers a contiguous band of rows and may narrow the columns available
//! on those rows, which models non-rectangular floor plans as data:
//!
//! ```
//! use gridplace_core::geometry::{RowRule, ZoneGeometry, ZoneTable};
//!
//! let table = ZoneTable::new().with_zone(
//!     "arcade",
//!     ZoneGeometry::new(6)
//!         .with_rule(RowRule::rows(1, 1))
//!         .with_rule(RowRule::rows(2, 2).with_cols(2, 5)),
//! );
//!
//! let arcade = table.effective("arcade");
//! assert_eq!(arcade.rule_for(2).unwrap().column_range(arcade.max_col).max, Some(5));
//! assert_eq!(table.effective("elsewhere").max_col, 24);
//! ```
//!
//! The table is built once at startup (from configuration or
//! [`ZoneTable::builtin`]) and shared read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Column limit applied to zones the table does not know.
pub const DEFAULT_MAX_COL: u32 = 24;

fn default_max_col() -> u32 {
    DEFAULT_MAX_COL
}

/// An inclusive range of accepted values, reported back to clients on rejection.
///
/// `max` is absent when the dimension has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidRange {
    pub min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl ValidRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max: Some(max) }
    }

    pub fn at_least(min: u32) -> Self {
        Self { min, max: None }
    }

    /// Returns true if `value` lies inside the range.
    pub fn contains(&self, value: i64) -> bool {
        let upper = self.max.unwrap_or(u32::MAX);
        value >= i64::from(self.min) && value <= i64::from(upper)
    }
}

/// A band of rows with an optional column sub-range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRule {
    pub min_row: u32,
    pub max_row: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_col: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_col: Option<u32>,
}

impl RowRule {
    /// Rows `min_row..=max_row` using the zone's full column range.
    pub fn rows(min_row: u32, max_row: u32) -> Self {
        Self {
            min_row,
            max_row,
            min_col: None,
            max_col: None,
        }
    }

    /// Narrows the columns available on these rows.
    pub fn with_cols(mut self, min_col: u32, max_col: u32) -> Self {
        self.min_col = Some(min_col);
        self.max_col = Some(max_col);
        self
    }

    pub fn covers(&self, row: i64) -> bool {
        row >= i64::from(self.min_row) && row <= i64::from(self.max_row)
    }

    /// Columns accepted on these rows, clamped to the zone limit.
    pub fn column_range(&self, zone_max_col: u32) -> ValidRange {
        let min = self.min_col.unwrap_or(1).max(1);
        let max = self.max_col.unwrap_or(zone_max_col).min(zone_max_col);
        ValidRange::new(min, max)
    }

    pub fn narrows_columns(&self) -> bool {
        self.min_col.is_some() || self.max_col.is_some()
    }
}

/// Geometry of a single zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneGeometry {
    pub max_col: u32,
    /// Row bands. Empty means any positive row is accepted.
    #[serde(default)]
    pub rows: Vec<RowRule>,
}

impl ZoneGeometry {
    pub fn new(max_col: u32) -> Self {
        Self {
            max_col,
            rows: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: RowRule) -> Self {
        self.rows.push(rule);
        self
    }

    pub fn column_range(&self) -> ValidRange {
        ValidRange::new(1, self.max_col)
    }

    /// Span of all row rules, or `None` when rows are unrestricted.
    pub fn row_range(&self) -> Option<ValidRange> {
        let min = self.rows.iter().map(|r| r.min_row).min()?;
        let max = self.rows.iter().map(|r| r.max_row).max()?;
        Some(ValidRange::new(min, max))
    }

    /// Returns the first rule covering `row`.
    pub fn rule_for(&self, row: i64) -> Option<&RowRule> {
        self.rows.iter().find(|rule| rule.covers(row))
    }
}

/// Geometry for every configured zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneTable {
    #[serde(default = "default_max_col")]
    pub default_max_col: u32,
    #[serde(default)]
    pub zones: BTreeMap<String, ZoneGeometry>,
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneTable {
    /// An empty table: every zone gets the default column limit.
    pub fn new() -> Self {
        Self {
            default_max_col: DEFAULT_MAX_COL,
            zones: BTreeMap::new(),
        }
    }

    /// The floor plans shipped with the application.
    pub fn builtin() -> Self {
        Self::new()
            .with_zone("soi6", ZoneGeometry::new(20).with_rule(RowRule::rows(1, 2)))
            .with_zone(
                "walkingstreet",
                ZoneGeometry::new(24).with_rule(RowRule::rows(1, 42)),
            )
            .with_zone(
                "lkmetro",
                ZoneGeometry::new(9)
                    .with_rule(RowRule::rows(1, 1).with_cols(1, 9))
                    .with_rule(RowRule::rows(2, 2).with_cols(1, 8))
                    .with_rule(RowRule::rows(3, 3).with_cols(3, 9))
                    .with_rule(RowRule::rows(4, 4).with_cols(1, 9)),
            )
            .with_zone("treetown", ZoneGeometry::new(24))
            .with_zone("soibuakhao", ZoneGeometry::new(18))
            .with_zone("beachroad", ZoneGeometry::new(40))
    }

    pub fn with_zone(mut self, name: impl Into<String>, geometry: ZoneGeometry) -> Self {
        self.zones.insert(name.into(), geometry);
        self
    }

    pub fn with_default_max_col(mut self, max_col: u32) -> Self {
        self.default_max_col = max_col;
        self
    }

    /// Configured geometry for `zone`, if any.
    pub fn get(&self, zone: &str) -> Option<&ZoneGeometry> {
        self.zones.get(zone)
    }

    /// Geometry applied to `zone`, falling back to the default column limit.
    pub fn effective(&self, zone: &str) -> ZoneGeometry {
        self.get(zone)
            .cloned()
            .unwrap_or_else(|| ZoneGeometry::new(self.default_max_col))
    }

    pub fn zone_names(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }
}
