use shared::models::{
    BlockedCell, FloorPlan, GridSize, MAX_CELL_SIZE, MAX_ZOOM, MIN_CELL_SIZE, MIN_ZOOM, Table,
    TablePosition,
};

use super::{LayoutError, LayoutTemplate, sanitize_plan};

/// Locally edited copy of the floor plan
///
/// Edits apply to the active floor. Nothing leaves the draft until it is
/// committed through the sync engine; [`FloorPlanDraft::discard`] resets it
/// to the last committed plan.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorPlanDraft {
    committed: FloorPlan,
    plan: FloorPlan,
    active_floor: i32,
    table_ids: Vec<String>,
}

impl FloorPlanDraft {
    pub fn new(plan: &FloorPlan, tables: &[Table]) -> Self {
        let plan = sanitize_plan(plan);
        Self {
            committed: plan.clone(),
            plan,
            active_floor: 1,
            table_ids: tables.iter().map(|t| t.id.clone()).collect(),
        }
    }

    pub fn plan(&self) -> &FloorPlan {
        &self.plan
    }

    pub fn committed(&self) -> &FloorPlan {
        &self.committed
    }

    pub fn active_floor(&self) -> i32 {
        self.active_floor
    }

    pub fn is_dirty(&self) -> bool {
        self.plan != self.committed
    }

    /// Replace the list of tables the draft may place
    pub fn set_tables(&mut self, tables: &[Table]) {
        self.table_ids = tables.iter().map(|t| t.id.clone()).collect();
    }

    // ========== Floors ==========

    pub fn select_floor(&mut self, floor: i32) -> Result<(), LayoutError> {
        if !(1..=self.plan.floors).contains(&floor) {
            return Err(LayoutError::UnknownFloor(floor));
        }
        self.active_floor = floor;
        Ok(())
    }

    /// Append a floor and make it active; returns its number
    pub fn add_floor(&mut self) -> i32 {
        self.plan.floors += 1;
        self.active_floor = self.plan.floors;
        self.active_floor
    }

    /// Remove `floor` with everything on it; higher floors move down by one
    pub fn remove_floor(&mut self, floor: i32) -> Result<(), LayoutError> {
        if !(1..=self.plan.floors).contains(&floor) {
            return Err(LayoutError::UnknownFloor(floor));
        }
        if self.plan.floors == 1 {
            return Err(LayoutError::LastFloor);
        }

        self.plan.positions.retain(|p| p.floor != floor);
        self.plan.blocked.retain(|b| b.floor != floor);
        for position in self.plan.positions.iter_mut().filter(|p| p.floor > floor) {
            position.floor -= 1;
        }
        for cell in self.plan.blocked.iter_mut().filter(|b| b.floor > floor) {
            cell.floor -= 1;
        }
        self.plan.floors -= 1;
        self.plan = sanitize_plan(&self.plan);

        if self.active_floor > floor || self.active_floor > self.plan.floors {
            self.active_floor = (self.active_floor - 1).max(1);
        }
        Ok(())
    }

    // ========== Grid ==========

    /// Resize every floor; cells outside the new bounds are dropped
    pub fn resize_grid(&mut self, columns: i32, rows: i32) {
        self.plan.grid = GridSize { columns, rows };
        self.plan = sanitize_plan(&self.plan);
    }

    pub fn set_cell_size(&mut self, cell_size: i32) {
        self.plan.cell_size = cell_size.clamp(MIN_CELL_SIZE, MAX_CELL_SIZE);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.plan.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Replace the active floor's blocked cells with the template's
    pub fn apply_template(&mut self, template: LayoutTemplate) {
        let floor = self.active_floor;
        self.plan.blocked.retain(|b| b.floor != floor);
        self.plan
            .blocked
            .extend(template.blocked_cells(self.plan.grid, floor));
        self.plan = sanitize_plan(&self.plan);
    }

    fn check_cell(&self, x: i32, y: i32) -> Result<(), LayoutError> {
        let floor = self.active_floor;
        if !self.plan.in_bounds(floor, x, y) {
            return Err(LayoutError::OutOfBounds { floor, x, y });
        }
        Ok(())
    }

    /// Block or unblock a cell on the active floor; returns the new state.
    /// A table standing on a newly blocked cell becomes unplaced.
    pub fn toggle_blocked(&mut self, x: i32, y: i32) -> Result<bool, LayoutError> {
        self.check_cell(x, y)?;
        let floor = self.active_floor;
        if self.plan.is_blocked(floor, x, y) {
            self.plan.blocked.retain(|b| b.cell() != (floor, x, y));
            Ok(false)
        } else {
            self.plan.positions.retain(|p| p.cell() != (floor, x, y));
            self.plan.blocked.push(BlockedCell { floor, x, y });
            Ok(true)
        }
    }

    // ========== Tables ==========

    /// Put `table_id` on a cell of the active floor.
    ///
    /// A different table already on that cell is unplaced and returned. The
    /// moving table's previous position, on any floor, is removed in the
    /// same step.
    pub fn place_table_at(
        &mut self,
        table_id: &str,
        x: i32,
        y: i32,
    ) -> Result<Option<String>, LayoutError> {
        if !self.table_ids.iter().any(|id| id == table_id) {
            return Err(LayoutError::UnknownTable(table_id.to_string()));
        }
        self.check_cell(x, y)?;
        let floor = self.active_floor;
        if self.plan.is_blocked(floor, x, y) {
            return Err(LayoutError::CellBlocked { floor, x, y });
        }

        let displaced = self
            .plan
            .table_at(floor, x, y)
            .filter(|id| *id != table_id)
            .map(str::to_string);

        self.plan
            .positions
            .retain(|p| p.table_id != table_id && p.cell() != (floor, x, y));
        self.plan.positions.push(TablePosition {
            table_id: table_id.to_string(),
            floor,
            x,
            y,
        });
        Ok(displaced)
    }

    /// Remove the table from the plan; false if it was not placed
    pub fn unplace_table(&mut self, table_id: &str) -> bool {
        self.plan.remove_table(table_id)
    }

    /// Known tables without a position on any floor
    pub fn unplaced_tables(&self) -> Vec<&str> {
        self.table_ids
            .iter()
            .map(String::as_str)
            .filter(|id| self.plan.position_of(id).is_none())
            .collect()
    }

    /// Table on a cell of the active floor
    pub fn table_at(&self, x: i32, y: i32) -> Option<&str> {
        self.plan.table_at(self.active_floor, x, y)
    }

    // ========== Lifecycle ==========

    /// Drop every edit since the last commit
    pub fn discard(&mut self) {
        self.plan = self.committed.clone();
        self.active_floor = self.active_floor.clamp(1, self.plan.floors);
    }

    /// Record the plan the store accepted
    pub fn mark_committed(&mut self, saved: &FloorPlan) {
        self.committed = sanitize_plan(saved);
        self.plan = self.committed.clone();
        self.active_floor = self.active_floor.clamp(1, self.plan.floors);
    }
}
