//! Position validation against the zone geometry table.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::Cell;
use crate::geometry::{ValidRange, ZoneTable};

/// Structured rejection of a proposed cell.
///
/// Serializes as `{ error, details, validRange }` so clients can point at the
/// exact bound that was violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub error: String,
    pub details: String,
    #[serde(rename = "validRange")]
    pub valid_range: ValidRange,
}

impl Rejection {
    fn new(error: &str, details: String, valid_range: ValidRange) -> Self {
        Self {
            error: error.to_string(),
            details,
            valid_range,
        }
    }
}

/// Accepts or rejects `(zone, row, col)` proposals.
///
/// Checks run column bound first, then the row band, then the row's column
/// sub-range. Pure: no I/O, same answer for the same table.
#[derive(Debug, Clone)]
pub struct PositionValidator {
    table: Arc<ZoneTable>,
}

impl PositionValidator {
    pub fn new(table: Arc<ZoneTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ZoneTable {
        &self.table
    }

    /// Validates a proposed cell, returning it in typed form when accepted.
    pub fn validate(&self, zone: &str, row: i64, col: i64) -> Result<Cell, Rejection> {
        let geometry = self.table.effective(zone);

        let columns = geometry.column_range();
        if !columns.contains(col) {
            return Err(Rejection::new(
                "Invalid grid column",
                format!(
                    "Column {} is outside the bounds of zone {} (1-{})",
                    col, zone, geometry.max_col
                ),
                columns,
            ));
        }

        match geometry.row_range() {
            None => {
                let rows = ValidRange::at_least(1);
                if !rows.contains(row) {
                    return Err(Rejection::new(
                        "Invalid grid row",
                        format!("Row {} must be a positive integer", row),
                        rows,
                    ));
                }
            }
            Some(rows) => {
                let Some(rule) = geometry.rule_for(row).filter(|_| row >= 1) else {
                    return Err(Rejection::new(
                        "Invalid grid row",
                        format!(
                            "Row {} is outside the bounds of zone {} ({}-{})",
                            row,
                            zone,
                            rows.min,
                            rows.max.unwrap_or(rows.min)
                        ),
                        rows,
                    ));
                };

                let row_columns = rule.column_range(geometry.max_col);
                if !row_columns.contains(col) {
                    return Err(Rejection::new(
                        "Invalid grid column for row",
                        format!(
                            "Zone {} row {} accepts columns {}-{}, got {}",
                            zone,
                            row,
                            row_columns.min,
                            row_columns.max.unwrap_or(geometry.max_col),
                            col
                        ),
                        row_columns,
                    ));
                }
            }
        }

        // Both values are inside u32 bounds once the range checks pass.
        match (u32::try_from(row), u32::try_from(col)) {
            (Ok(row), Ok(col)) => Ok(Cell::new(row, col)),
            _ => Err(Rejection::new(
                "Invalid grid position",
                format!("Position ({}, {}) is out of range", row, col),
                ValidRange::at_least(1),
            )),
        }
    }
}
