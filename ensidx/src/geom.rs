use ndarray::{s, Array2, ArrayView2};

use crate::errors::{Error, Result};
use crate::schema::DatasetSchema;

/// A half-open spatial window, `top..bottom` by `left..right`.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Window {
    pub fn new(top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Build a window from a `[row_start, row_end, col_start, col_end]`
    /// subgrid box.
    pub fn from_box(subgrid: [usize; 4]) -> Self {
        let [top, bottom, left, right] = subgrid;
        Self::new(top, bottom, left, right)
    }

    pub fn rows(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }

    pub fn cols(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    /// Check that the window has positive extent and fits a grid of
    /// `rows` x `cols`.
    pub fn validate(&self, rows: usize, cols: usize) -> Result<()> {
        if self.bottom <= self.top || self.right <= self.left {
            return Err(Error::GridBounds(format!(
                "window {self:?} has non-positive extent"
            )));
        }
        if self.bottom > rows || self.right > cols {
            return Err(Error::GridBounds(format!(
                "window {self:?} exceeds grid of {rows}x{cols}"
            )));
        }

        Ok(())
    }
}

/// Crop one raw grid down to the schema's spatial window.
///
/// The `border_size` margin is trimmed from all four edges first, then the
/// subgrid box is applied in the coordinates of the trimmed grid. Every
/// variable, level and coordinate of one schema goes through the same window,
/// so the output shape is identical across a whole dataset. The Sample
/// Assembler relies on that to stack fields together.
///
pub fn subset(raw: ArrayView2<f32>, schema: &DatasetSchema) -> Result<Array2<f32>> {
    let (rows, cols) = raw.dim();
    let border = schema.border_size;
    if rows <= 2 * border || cols <= 2 * border {
        return Err(Error::GridBounds(format!(
            "border of {border} leaves no interior on a {rows}x{cols} grid"
        )));
    }

    let trimmed = raw.slice(s![border..rows - border, border..cols - border]);
    let (rows, cols) = trimmed.dim();
    let window = match schema.subgrid {
        Some(window) => window,
        None => Window::new(0, rows, 0, cols),
    };
    window.validate(rows, cols)?;

    Ok(trimmed
        .slice(s![window.top..window.bottom, window.left..window.right])
        .to_owned())
}
