//! Window classifier.
//!
//! Eight directional sums are formed around the centre sample. The strongest
//! one decides the gradient direction; a crossing test then rejects edges
//! that only graze the window, and the remaining cases map the direction to
//! a line, a contour side or a corner together with its polarity.
//!
//! All samples are light intensities: 0 is black, 255 is unmarked paper.

use crate::options::ScreenOptions;
use crate::tile::{Polarity, TileShape};
use crate::window::Window;

/// Gradient directions, named after the neighbour the sum points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Direction {
        Self::ALL[(self.index() + 4) % 8]
    }
}

/// The eight directional sums of one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalSums([f64; 8]);

impl DirectionalSums {
    /// Each sum is the three samples through the centre minus the three on
    /// the far side. Diagonal sums weight the far corner by `correlation`
    /// and its two neighbours by `(3 - correlation) / 2`.
    pub fn compute(w: &Window, correlation: f64) -> Self {
        let [a, b, c, d, e, f, g, h, i] = w.core().map(f64::from);
        let ks = (3.0 - correlation) / 2.0;
        let fd = correlation;
        DirectionalSums([
            d + e + f - a - b - c,
            a + e + i - b * ks - c * fd - f * ks,
            b + e + h - c - f - i,
            c + e + g - f * ks - i * fd - h * ks,
            d + e + f - g - h - i,
            a + e + i - d * ks - g * fd - h * ks,
            b + e + h - a - d - g,
            c + e + g - b * ks - a * fd - d * ks,
        ])
    }

    #[inline]
    pub fn get(&self, direction: Direction) -> f64 {
        self.0[direction.index()]
    }

    /// The direction with the largest absolute sum, if it exceeds `threshold`.
    ///
    /// Ties keep the first direction in `Direction::ALL` order.
    pub fn dominant(&self, threshold: f64) -> Option<Direction> {
        let mut best = None;
        let mut magnitude = threshold.abs();
        for direction in Direction::ALL {
            let value = self.get(direction).abs();
            if value > magnitude {
                magnitude = value;
                best = Some(direction);
            }
        }
        best
    }

    /// Whether two sums describe the same edge strength: same sign, on the
    /// same side of the threshold, and magnitudes within the threshold.
    pub fn comparable(&self, first: Direction, second: Direction, threshold: f64) -> bool {
        let (v1, v2) = (self.get(first), self.get(second));
        if (v1 > 0.0 && v2 < 0.0) || (v1 < 0.0 && v2 > 0.0) {
            return false;
        }
        let (m1, m2) = (v1.abs(), v2.abs());
        if (m1 < threshold && m2 > threshold) || (m1 > threshold && m2 < threshold) {
            return false;
        }
        (m1 - m2).abs() < threshold
    }
}

/// Outcome of classifying one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// `None` for a stationary pixel.
    pub shape: Option<TileShape>,
    pub polarity: Polarity,
    /// The winning gradient direction, when one exceeded the threshold.
    pub direction: Option<Direction>,
}

impl Classification {
    pub const EMPTY: Classification = Classification {
        shape: None,
        polarity: Polarity::Stroke,
        direction: None,
    };

    /// Mask tiles measure coverage against the window minimum instead of
    /// its maximum.
    #[inline]
    pub fn inverse(&self) -> bool {
        self.polarity == Polarity::Mask
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_none()
    }
}

/// Sample comparisons against the per-sample threshold.
struct Thresholds {
    value: i32,
}

impl Thresholds {
    #[inline]
    fn equal(&self, s1: u8, s2: u8) -> bool {
        (i32::from(s1) - i32::from(s2)).abs() < self.value
    }

    #[inline]
    fn sign(&self, diff: i32) -> i32 {
        if diff < -self.value {
            -1
        } else if diff > self.value {
            1
        } else {
            0
        }
    }

    /// Both samples brighter than the centre.
    fn both_above(&self, center: u8, s1: u8, s2: u8) -> bool {
        i32::from(s1) - i32::from(center) > self.value && i32::from(s2) - i32::from(center) > self.value
    }

    /// Both samples darker than the centre.
    fn both_below(&self, center: u8, s1: u8, s2: u8) -> bool {
        i32::from(s1) - i32::from(center) < -self.value
            && i32::from(s2) - i32::from(center) < -self.value
    }

    /// A step from the centre to `side` confirmed by a same-signed step
    /// from `near` to `outer` on the opposite side.
    fn confirms(&self, center: u8, side: u8, near: u8, outer: u8) -> bool {
        if self.equal(center, side) {
            return false;
        }
        let step = self.sign(i32::from(center) - i32::from(side));
        let beyond = self.sign(i32::from(near) - i32::from(outer));
        step != 0 && step == beyond
    }
}

/// Whether the edge found in direction `dominant` crosses the centre.
///
/// When two orthogonal neighbours match the centre, one of the other two
/// must step away from it and the step must continue past the matching
/// neighbour on the opposite side; otherwise the edge only touches the
/// window and the pixel is treated as stationary.
fn crosses_center(w: &Window, dominant: Direction, t: &Thresholds) -> bool {
    let e = w.e;
    let east = |t: &Thresholds| t.confirms(e, w.f, w.d, w.d1);
    let west = |t: &Thresholds| t.confirms(e, w.d, w.f, w.f1);
    let south = |t: &Thresholds| t.confirms(e, w.h, w.b, w.b1);
    let north = |t: &Thresholds| t.confirms(e, w.b, w.h, w.h1);

    if t.equal(e, w.d) && t.equal(e, w.b) {
        return east(t) || south(t);
    }
    if t.equal(e, w.f) && t.equal(e, w.b) {
        return west(t) || south(t);
    }
    if t.equal(e, w.f) && t.equal(e, w.h) {
        return west(t) || north(t);
    }
    if t.equal(e, w.d) && t.equal(e, w.h) && dominant != Direction::NorthEast {
        return east(t) || north(t);
    }
    true
}

/// Geometry candidates for one gradient direction.
struct Candidates {
    /// The two samples flanking the centre across the gradient.
    flank: (u8, u8),
    /// The sample on the far side of the gradient.
    far: u8,
    line: TileShape,
    near_side: TileShape,
    far_side: TileShape,
    near_corner: TileShape,
    far_corner: TileShape,
}

fn candidates(w: &Window, direction: Direction) -> Candidates {
    use TileShape::*;
    let (flank, far, line, near_side, far_side, near_corner, far_corner) = match direction {
        Direction::East => ((w.b, w.h), w.d, NorthLine, EastSide, WestSide, EastCorner, WestCorner),
        Direction::South => ((w.d, w.f), w.b, WestLine, SouthSide, NorthSide, SouthCorner, NorthCorner),
        Direction::SouthEast => (
            (w.c, w.g),
            w.a,
            NorthEastLine,
            SouthEastSide,
            NorthWestSide,
            SouthEastCorner,
            NorthWestCorner,
        ),
        Direction::SouthWest => (
            (w.a, w.i),
            w.c,
            NorthWestLine,
            SouthWestSide,
            NorthEastSide,
            SouthWestCorner,
            NorthEastCorner,
        ),
        Direction::West => ((w.b, w.h), w.f, NorthLine, WestSide, EastSide, WestCorner, EastCorner),
        Direction::NorthWest => (
            (w.g, w.c),
            w.i,
            NorthEastLine,
            NorthWestSide,
            SouthEastSide,
            NorthWestCorner,
            SouthEastCorner,
        ),
        Direction::North => ((w.d, w.f), w.h, WestLine, NorthSide, SouthSide, NorthCorner, SouthCorner),
        Direction::NorthEast => (
            (w.a, w.i),
            w.g,
            NorthWestLine,
            NorthEastSide,
            SouthWestSide,
            NorthEastCorner,
            SouthWestCorner,
        ),
    };
    Candidates {
        flank,
        far,
        line,
        near_side,
        far_side,
        near_corner,
        far_corner,
    }
}

/// Pick shape and polarity for a confirmed gradient direction.
fn identify(
    w: &Window,
    sums: &DirectionalSums,
    direction: Direction,
    t: &Thresholds,
    summary_threshold: f64,
) -> (TileShape, Polarity) {
    let c = candidates(w, direction);
    let value = sums.get(direction);
    let rising = value > 0.0;

    // Equal gradients on both sides: a thin line whose polarity is
    // opposite to the gradient.
    if sums.comparable(direction, direction.opposite(), summary_threshold) {
        let polarity = if rising { Polarity::Mask } else { Polarity::Stroke };
        return (c.line, polarity);
    }

    // Convex corner: always ink.
    if t.both_above(w.e, c.flank.0, c.flank.1) {
        let shape = if rising { c.near_corner } else { c.far_corner };
        return (shape, Polarity::Stroke);
    }

    // Concave corner: always paper.
    if t.both_below(w.e, c.flank.0, c.flank.1) {
        let shape = if rising { c.far_corner } else { c.near_corner };
        return (shape, Polarity::Mask);
    }

    // Straight contour side.
    let mask = value < 0.0 && c.far <= 128;
    let shape = match (value < 0.0, mask) {
        (true, true) | (false, false) => c.near_side,
        (true, false) | (false, true) => c.far_side,
    };
    let polarity = if mask { Polarity::Mask } else { Polarity::Stroke };
    (shape, polarity)
}

/// Classify one window.
///
/// Pure: the same window and options always give the same result.
pub fn classify(window: &Window, options: &ScreenOptions) -> Classification {
    let sums = DirectionalSums::compute(window, options.diagonal_correlation);
    let Some(direction) = sums.dominant(options.summary_threshold) else {
        return Classification::EMPTY;
    };

    let thresholds = Thresholds {
        value: options.value_threshold,
    };
    if options.crossing_test && !crosses_center(window, direction, &thresholds) {
        return Classification {
            direction: Some(direction),
            ..Classification::EMPTY
        };
    }

    let (shape, polarity) = identify(
        window,
        &sums,
        direction,
        &thresholds,
        options.summary_threshold,
    );
    Classification {
        shape: Some(shape),
        polarity,
        direction: Some(direction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(top: u8, middle: u8, bottom: u8) -> Window {
        Window::from_grid([
            [top; 5],
            [top; 5],
            [middle; 5],
            [bottom; 5],
            [bottom; 5],
        ])
    }

    #[test]
    fn test_uniform_window_is_empty() {
        for value in [0u8, 1, 100, 128, 254, 255] {
            let result = classify(&Window::uniform(value), &ScreenOptions::default());
            assert_eq!(result, Classification::EMPTY, "value {value}");
        }
    }

    #[test]
    fn test_directional_sums_of_horizontal_line() {
        let sums = DirectionalSums::compute(&rows(100, 200, 100), 1.0);
        assert_eq!(sums.get(Direction::North), 300.0);
        assert_eq!(sums.get(Direction::South), 300.0);
        assert_eq!(sums.get(Direction::East), 0.0);
        assert_eq!(sums.get(Direction::NorthEast), 0.0);
        assert_eq!(sums.dominant(38.4), Some(Direction::North));
    }

    #[test]
    fn test_dominant_requires_threshold() {
        let sums = DirectionalSums([38.4, -38.4, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(sums.dominant(38.4), None);
        let sums = DirectionalSums([38.4, -38.5, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(sums.dominant(38.4), Some(Direction::NorthEast));
    }

    #[test]
    fn test_comparable_sums() {
        let sums = DirectionalSums([300.0, 0.0, 0.0, 0.0, 290.0, -290.0, 20.0, 0.0]);
        assert!(sums.comparable(Direction::North, Direction::South, 38.4));
        assert!(!sums.comparable(Direction::North, Direction::SouthWest, 38.4));
        assert!(!sums.comparable(Direction::North, Direction::West, 38.4));
    }

    #[test]
    fn test_bright_line_is_mask_line() {
        let result = classify(&rows(100, 200, 100), &ScreenOptions::default());
        assert_eq!(result.shape, Some(TileShape::WestLine));
        assert_eq!(result.polarity, Polarity::Mask);
        assert!(result.inverse());
        assert_eq!(result.direction, Some(Direction::North));
    }

    #[test]
    fn test_dark_line_is_stroke_line() {
        let result = classify(&rows(200, 50, 200), &ScreenOptions::default());
        assert_eq!(result.shape, Some(TileShape::WestLine));
        assert_eq!(result.polarity, Polarity::Stroke);
        assert!(!result.inverse());
    }

    #[test]
    fn test_edge_grazing_window_is_rejected() {
        // The edge sits one row below the centre row.
        let grazing = rows(100, 100, 200);
        assert!(classify(&grazing, &ScreenOptions::default()).is_empty());
        let unchecked = ScreenOptions::default().crossing_test(false);
        assert!(!classify(&grazing, &unchecked).is_empty());
    }

    #[test]
    fn test_opposite_direction() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_ne!(direction.opposite(), direction);
        }
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::NorthEast.opposite(), Direction::SouthWest);
    }
}
