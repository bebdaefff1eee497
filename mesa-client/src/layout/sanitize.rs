use std::collections::HashSet;

use shared::models::{
    FloorPlan, GridSize, MAX_CELL_SIZE, MAX_ZOOM, MIN_CELL_SIZE, MIN_GRID_SIZE, MIN_ZOOM, Table,
};

/// Normalize a plan so every grid invariant holds.
///
/// Clamps the scalar fields, then drops blocked cells and positions that
/// fall outside the grid, positions on blocked cells, positions without a
/// table id, and duplicates (first occurrence wins, by cell and by table).
/// Idempotent.
pub fn sanitize_plan(plan: &FloorPlan) -> FloorPlan {
    let floors = plan.floors.max(1);
    let grid = GridSize {
        columns: plan.grid.columns.max(MIN_GRID_SIZE),
        rows: plan.grid.rows.max(MIN_GRID_SIZE),
    };
    let in_bounds =
        |floor: i32, x: i32, y: i32| (1..=floors).contains(&floor) && grid.contains(x, y);

    let mut blocked_cells = HashSet::new();
    let blocked = plan
        .blocked
        .iter()
        .filter(|b| in_bounds(b.floor, b.x, b.y))
        .filter(|b| blocked_cells.insert(b.cell()))
        .copied()
        .collect();

    let mut taken_cells = HashSet::new();
    let mut placed_tables: HashSet<String> = HashSet::new();
    let positions = plan
        .positions
        .iter()
        .filter(|p| {
            let cell = p.cell();
            if p.table_id.is_empty()
                || !in_bounds(p.floor, p.x, p.y)
                || blocked_cells.contains(&cell)
                || taken_cells.contains(&cell)
                || placed_tables.contains(&p.table_id)
            {
                return false;
            }
            taken_cells.insert(cell);
            placed_tables.insert(p.table_id.clone());
            true
        })
        .cloned()
        .collect();

    let zoom = if plan.zoom.is_finite() {
        plan.zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    };

    FloorPlan {
        floors,
        grid,
        positions,
        blocked,
        cell_size: plan.cell_size.clamp(MIN_CELL_SIZE, MAX_CELL_SIZE),
        zoom,
    }
}

/// Drop positions of tables that are not in `tables`; returns how many went
pub fn prune_unknown_tables(plan: &mut FloorPlan, tables: &[Table]) -> usize {
    let known: HashSet<&str> = tables.iter().map(|t| t.id.as_str()).collect();
    let before = plan.positions.len();
    plan.positions.retain(|p| known.contains(p.table_id.as_str()));
    before - plan.positions.len()
}
