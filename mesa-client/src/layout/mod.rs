//! Floor-plan layout engine
//!
//! Pure grid logic over [`FloorPlan`]: normalization of foreign plans, the
//! default packing for new tenants, and an editable draft with atomic
//! placement operations.

mod draft;
mod sanitize;
mod template;

pub use draft::FloorPlanDraft;
pub use sanitize::{prune_unknown_tables, sanitize_plan};
pub use template::LayoutTemplate;

use shared::models::{DEFAULT_CELL_SIZE, FloorPlan, GridSize, Table, TablePosition};
use thiserror::Error;

/// Columns of the default plan
pub const DEFAULT_COLUMNS: i32 = 6;
/// Minimum rows of the default plan
pub const DEFAULT_ROWS: i32 = 4;

/// Draft editing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("cell ({x}, {y}) on floor {floor} is outside the grid")]
    OutOfBounds { floor: i32, x: i32, y: i32 },

    #[error("cell ({x}, {y}) on floor {floor} is blocked")]
    CellBlocked { floor: i32, x: i32, y: i32 },

    #[error("a floor plan needs at least one floor")]
    LastFloor,

    #[error("floor {0} does not exist")]
    UnknownFloor(i32),

    #[error("table {0} is not part of this restaurant")]
    UnknownTable(String),
}

/// Plan for a tenant without one: tables packed row-major on floor 1
pub fn default_plan(tables: &[Table]) -> FloorPlan {
    let count = tables.len() as i32;
    let rows = ((count + DEFAULT_COLUMNS - 1) / DEFAULT_COLUMNS).max(DEFAULT_ROWS);
    let positions = tables
        .iter()
        .enumerate()
        .map(|(index, table)| {
            let index = index as i32;
            TablePosition {
                table_id: table.id.clone(),
                floor: 1,
                x: index % DEFAULT_COLUMNS,
                y: index / DEFAULT_COLUMNS,
            }
        })
        .collect();

    FloorPlan {
        floors: 1,
        grid: GridSize {
            columns: DEFAULT_COLUMNS,
            rows,
        },
        positions,
        blocked: Vec::new(),
        cell_size: DEFAULT_CELL_SIZE,
        zoom: 1.0,
    }
}
