//! Floor Plan Model
//!
//! One plan per tenant, always replaced as a whole.

use serde::{Deserialize, Serialize};

pub const MIN_GRID_SIZE: i32 = 2;
pub const MIN_CELL_SIZE: i32 = 48;
pub const MAX_CELL_SIZE: i32 = 120;
pub const DEFAULT_CELL_SIZE: i32 = 72;
pub const MIN_ZOOM: f64 = 0.6;
pub const MAX_ZOOM: f64 = 1.6;

/// Grid dimensions, shared by every floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub columns: i32,
    pub rows: i32,
}

impl GridSize {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..self.columns).contains(&x) && (0..self.rows).contains(&y)
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            columns: 6,
            rows: 4,
        }
    }
}

/// Placement of a table, keyed by table id (never by number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePosition {
    pub table_id: String,
    pub floor: i32,
    pub x: i32,
    pub y: i32,
}

impl TablePosition {
    pub fn cell(&self) -> (i32, i32, i32) {
        (self.floor, self.x, self.y)
    }
}

/// Structurally unusable cell (wall, bar, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockedCell {
    pub floor: i32,
    pub x: i32,
    pub y: i32,
}

impl BlockedCell {
    pub fn cell(&self) -> (i32, i32, i32) {
        (self.floor, self.x, self.y)
    }
}

/// Multi-floor grid layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlan {
    #[serde(default = "default_floors")]
    pub floors: i32,
    #[serde(default)]
    pub grid: GridSize,
    #[serde(default)]
    pub positions: Vec<TablePosition>,
    #[serde(default)]
    pub blocked: Vec<BlockedCell>,
    #[serde(default = "default_cell_size")]
    pub cell_size: i32,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_floors() -> i32 {
    1
}

fn default_cell_size() -> i32 {
    DEFAULT_CELL_SIZE
}

fn default_zoom() -> f64 {
    1.0
}

impl Default for FloorPlan {
    fn default() -> Self {
        Self {
            floors: default_floors(),
            grid: GridSize::default(),
            positions: Vec::new(),
            blocked: Vec::new(),
            cell_size: DEFAULT_CELL_SIZE,
            zoom: default_zoom(),
        }
    }
}

impl FloorPlan {
    pub fn position_of(&self, table_id: &str) -> Option<&TablePosition> {
        self.positions.iter().find(|p| p.table_id == table_id)
    }

    pub fn table_at(&self, floor: i32, x: i32, y: i32) -> Option<&str> {
        self.positions
            .iter()
            .find(|p| p.cell() == (floor, x, y))
            .map(|p| p.table_id.as_str())
    }

    pub fn is_blocked(&self, floor: i32, x: i32, y: i32) -> bool {
        self.blocked.iter().any(|b| b.cell() == (floor, x, y))
    }

    /// Cell lies inside `[0,columns) × [0,rows) × [1,floors]`
    pub fn in_bounds(&self, floor: i32, x: i32, y: i32) -> bool {
        (1..=self.floors).contains(&floor) && self.grid.contains(x, y)
    }

    /// Drops every placement of `table_id`; true if something was removed
    pub fn remove_table(&mut self, table_id: &str) -> bool {
        let before = self.positions.len();
        self.positions.retain(|p| p.table_id != table_id);
        self.positions.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_plan_uses_defaults() {
        let plan: FloorPlan = serde_json::from_str(r#"{"grid":{"columns":3,"rows":3}}"#).unwrap();
        assert_eq!(plan.floors, 1);
        assert_eq!(plan.cell_size, DEFAULT_CELL_SIZE);
        assert_eq!(plan.zoom, 1.0);
        assert!(plan.positions.is_empty());
    }

    #[test]
    fn test_camel_case_wire_format() {
        let mut plan = FloorPlan::default();
        plan.positions.push(TablePosition {
            table_id: "t1".into(),
            floor: 1,
            x: 0,
            y: 2,
        });
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["cellSize"], 72);
        assert_eq!(json["positions"][0]["tableId"], "t1");
        assert_eq!(json["grid"]["columns"], 6);
    }

    #[test]
    fn test_lookup_helpers() {
        let mut plan = FloorPlan::default();
        plan.positions.push(TablePosition {
            table_id: "t1".into(),
            floor: 1,
            x: 1,
            y: 1,
        });
        plan.blocked.push(BlockedCell { floor: 1, x: 0, y: 0 });

        assert_eq!(plan.table_at(1, 1, 1), Some("t1"));
        assert_eq!(plan.table_at(2, 1, 1), None);
        assert!(plan.is_blocked(1, 0, 0));
        assert!(plan.in_bounds(1, 5, 3));
        assert!(!plan.in_bounds(2, 0, 0));
        assert!(!plan.in_bounds(1, 6, 0));
        assert!(plan.remove_table("t1"));
        assert!(!plan.remove_table("t1"));
    }
}
