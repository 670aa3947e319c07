//! Area/polarity resolver: turns a classified window into a coverage value
//! and the background sample that replaces the centre in the tone plane.

use crate::options::ScreenOptions;
use crate::tile::TileShape;
use crate::window::Window;

/// Coverage and background for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// `None` when the pixel carries no tile.
    pub shape: Option<TileShape>,
    /// Relative area of the tile, 0..=255. Zero exactly when `shape` is `None`.
    pub coverage: u8,
    /// Tone-plane value for the pixel.
    pub background: u8,
}

impl Resolution {
    fn stationary(window: &Window) -> Self {
        Resolution {
            shape: None,
            coverage: 0,
            background: window.e,
        }
    }
}

/// Brightest core sample, snapped to the centre or to white when within
/// the value threshold of either.
fn bright_extremum(w: &Window, threshold: i32) -> u8 {
    let e = i32::from(w.e);
    let mut m = i32::from(w.core().into_iter().max().unwrap_or(w.e));
    if m - e < threshold {
        m = e;
    }
    if 255 - m < threshold {
        m = 255;
    }
    m as u8
}

/// Darkest core sample, snapped to the centre or to black.
fn dark_extremum(w: &Window, threshold: i32) -> u8 {
    let e = i32::from(w.e);
    let mut m = i32::from(w.core().into_iter().min().unwrap_or(w.e));
    if e - m < threshold {
        m = e;
    }
    if m < threshold {
        m = 0;
    }
    m as u8
}

fn scaled(numerator: i32, denominator: i32) -> u8 {
    if denominator == 0 {
        return 0;
    }
    let value = 255.0 * f64::from(numerator) / f64::from(denominator);
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Resolve the coverage of a classified pixel.
///
/// Stroke tiles (`inverse == false`) are measured against the brightest
/// sample of the window, mask tiles against the darkest. Thin shapes below
/// the minimum area and zero-coverage tiles fall back to a stationary pixel.
pub fn resolve(
    window: &Window,
    shape: Option<TileShape>,
    inverse: bool,
    options: &ScreenOptions,
) -> Resolution {
    let Some(shape) = shape else {
        return Resolution::stationary(window);
    };

    let e = i32::from(window.e);
    let (background, coverage) = if inverse {
        let m = dark_extremum(window, options.value_threshold);
        (m, scaled(e - i32::from(m), 255 - i32::from(m)))
    } else {
        let m = bright_extremum(window, options.value_threshold);
        (m, scaled(i32::from(m) - e, i32::from(m)))
    };

    if coverage == 0 || (shape.is_thin() && coverage < options.min_area) {
        return Resolution::stationary(window);
    }

    Resolution {
        shape: Some(shape),
        coverage,
        background,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(top: u8, middle: u8, bottom: u8) -> Window {
        Window::from_grid([[top; 5], [top; 5], [middle; 5], [bottom; 5], [bottom; 5]])
    }

    #[test]
    fn test_empty_shape_keeps_center() {
        let w = window(10, 90, 200);
        let r = resolve(&w, None, false, &ScreenOptions::default());
        assert_eq!(
            r,
            Resolution {
                shape: None,
                coverage: 0,
                background: 90
            }
        );
    }

    #[test]
    fn test_mask_coverage_against_minimum() {
        // (200 - 100) / (255 - 100) * 255 = 164.5..
        let w = window(100, 200, 100);
        let r = resolve(&w, Some(TileShape::WestLine), true, &ScreenOptions::default());
        assert_eq!(r.shape, Some(TileShape::WestLine));
        assert_eq!(r.coverage, 165);
        assert_eq!(r.background, 100);
    }

    #[test]
    fn test_stroke_coverage_against_maximum() {
        // (200 - 50) / 200 * 255 = 191.25
        let w = window(200, 50, 200);
        let r = resolve(&w, Some(TileShape::WestLine), false, &ScreenOptions::default());
        assert_eq!(r.coverage, 191);
        assert_eq!(r.background, 200);
    }

    #[test]
    fn test_extremum_snaps_to_white() {
        // 250 is within the threshold of white.
        let w = window(250, 50, 250);
        let r = resolve(&w, Some(TileShape::WestLine), false, &ScreenOptions::default());
        assert_eq!(r.background, 255);
        assert_eq!(r.coverage, 205);
    }

    #[test]
    fn test_extremum_snaps_to_center() {
        // max is only 5 above the centre, so the centre is the background
        // and coverage collapses to zero.
        let w = window(105, 100, 105);
        let r = resolve(&w, Some(TileShape::NorthCorner), false, &ScreenOptions::default());
        assert_eq!(r.shape, None);
        assert_eq!(r.coverage, 0);
        assert_eq!(r.background, 100);
    }

    #[test]
    fn test_thin_shape_below_min_area_is_dropped() {
        let w = window(100, 200, 100);
        let options = ScreenOptions::default().min_area(200);
        let line = resolve(&w, Some(TileShape::WestLine), true, &options);
        assert_eq!(line.shape, None);
        assert_eq!(line.background, 200);

        // Corners are never too thin.
        let corner = resolve(&w, Some(TileShape::NorthCorner), true, &options);
        assert_eq!(corner.shape, Some(TileShape::NorthCorner));
    }

    #[test]
    fn test_black_and_white_extremes_do_not_divide_by_zero() {
        let black = Window::uniform(0);
        let r = resolve(&black, Some(TileShape::EastSide), false, &ScreenOptions::default());
        assert_eq!(r.coverage, 0);
        let white = Window::uniform(255);
        let r = resolve(&white, Some(TileShape::EastSide), true, &ScreenOptions::default());
        assert_eq!(r.coverage, 0);
    }
}
