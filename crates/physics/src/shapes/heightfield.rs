use crate::error::ShapeError;
use crate::types::Vec2;

/// Terrain profile sampled at regular intervals along the local x axis.
///
/// Sample `i` sits at local `(i * element_width, heights[i])`. Everything
/// below the profile is solid.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightfield {
    heights: Vec<f32>,
    element_width: f32,
    min_value: f32,
    max_value: f32,
}

impl Heightfield {
    /// # Errors
    /// Fewer than two samples or a bad element width.
    pub fn new(heights: Vec<f32>, element_width: f32) -> Result<Self, ShapeError> {
        if heights.len() < 2 {
            return Err(ShapeError::HeightfieldTooShort(heights.len()));
        }
        if !(element_width.is_finite() && element_width > 0.0) {
            return Err(ShapeError::InvalidExtent(element_width));
        }
        if heights.iter().any(|h| !h.is_finite()) {
            return Err(ShapeError::InvalidExtent(f32::NAN));
        }
        let min_value = heights.iter().copied().fold(f32::INFINITY, f32::min);
        let max_value = heights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Ok(Self {
            heights,
            element_width,
            min_value,
            max_value,
        })
    }

    #[must_use]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    #[must_use]
    pub fn element_width(&self) -> f32 {
        self.element_width
    }

    #[must_use]
    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    #[must_use]
    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn span(&self) -> f32 {
        (self.heights.len() - 1) as f32 * self.element_width
    }

    /// Local-space endpoints of column `i`'s surface segment.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn segment(&self, i: usize) -> (Vec2, Vec2) {
        let x0 = i as f32 * self.element_width;
        (
            Vec2::new(x0, self.heights[i]),
            Vec2::new(x0 + self.element_width, self.heights[i + 1]),
        )
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.heights.len() - 1
    }

    /// Columns whose x range intersects `[min_x, max_x]` (local coordinates).
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn column_range(&self, min_x: f32, max_x: f32) -> std::ops::Range<usize> {
        let columns = self.column_count();
        if max_x < 0.0 || min_x > self.span() {
            return 0..0;
        }
        let start = (min_x / self.element_width).floor().max(0.0) as usize;
        let end = ((max_x / self.element_width).floor().max(0.0) as usize + 1).min(columns);
        start.min(end)..end
    }

    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        let span = self.span();
        let h = self.max_value.abs().max(self.min_value.abs());
        (span * span + h * h).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_short_is_rejected() {
        assert_eq!(
            Heightfield::new(vec![1.0], 1.0),
            Err(ShapeError::HeightfieldTooShort(1))
        );
    }

    #[test]
    fn column_range_clamps_to_field() {
        let hf = Heightfield::new(vec![0.0, 1.0, 0.0, 2.0], 2.0).unwrap();
        assert_eq!(hf.column_range(-5.0, 1.0), 0..1);
        assert_eq!(hf.column_range(2.5, 100.0), 1..3);
        assert_eq!(hf.column_range(7.0, 8.0), 0..0);
        assert_eq!(hf.segment(1), (Vec2::new(2.0, 1.0), Vec2::new(4.0, 0.0)));
    }
}
