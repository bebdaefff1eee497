use shared::models::{BlockedCell, GridSize};

/// Room shapes that can be stamped onto a floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutTemplate {
    /// Whole grid usable
    Rectangle,
    /// Left column plus bottom row
    LShape,
    /// Left column, right column and bottom row
    UShape,
}

impl LayoutTemplate {
    /// Blocked cells this template puts on `floor`
    pub fn blocked_cells(self, grid: GridSize, floor: i32) -> Vec<BlockedCell> {
        let bottom = grid.rows - 1;
        let right = grid.columns - 1;
        let mut cells = Vec::new();
        for y in 0..grid.rows {
            for x in 0..grid.columns {
                let blocked = match self {
                    LayoutTemplate::Rectangle => false,
                    LayoutTemplate::LShape => x >= 1 && y < bottom,
                    LayoutTemplate::UShape => x >= 1 && x < right && y < bottom,
                };
                if blocked {
                    cells.push(BlockedCell { floor, x, y });
                }
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_blocks_nothing() {
        let grid = GridSize { columns: 4, rows: 3 };
        assert!(LayoutTemplate::Rectangle.blocked_cells(grid, 1).is_empty());
    }

    #[test]
    fn test_l_shape_keeps_left_column_and_bottom_row() {
        let grid = GridSize { columns: 3, rows: 3 };
        let cells: Vec<_> = LayoutTemplate::LShape
            .blocked_cells(grid, 2)
            .iter()
            .map(|c| (c.floor, c.x, c.y))
            .collect();
        assert_eq!(cells, vec![(2, 1, 0), (2, 2, 0), (2, 1, 1), (2, 2, 1)]);
    }

    #[test]
    fn test_u_shape_keeps_both_sides() {
        let grid = GridSize { columns: 4, rows: 2 };
        let cells: Vec<_> = LayoutTemplate::UShape
            .blocked_cells(grid, 1)
            .iter()
            .map(|c| (c.x, c.y))
            .collect();
        assert_eq!(cells, vec![(1, 0), (2, 0)]);
    }
}
