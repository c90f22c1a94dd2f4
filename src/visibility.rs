//! Show/hide policy for markers against the current viewport.

use geo::Point;

use crate::viewport::Viewport;

/// Buses appear once the map is zoomed in at least this far.
pub const BUS_MIN_ZOOM: f64 = 11.;
/// Stops clutter more; they appear later.
pub const STOP_MIN_ZOOM: f64 = 16.;

/// Visible iff the zoom has reached `min_zoom` and the viewport contains
/// the position. `force_show` keeps a marker on screen while its detail
/// popup is open, overriding the geometric test.
///
/// Called on every viewport change for the entire tracked set; marker
/// counts are small enough that re-evaluating everything beats keeping an
/// incremental index.
pub fn should_show(
    position: Point<f64>,
    viewport: &Viewport,
    min_zoom: f64,
    force_show: bool,
) -> bool {
    force_show || (viewport.zoom >= min_zoom && viewport.bounds.contains(position))
}

#[cfg(test)]
mod test {
    use super::{should_show, BUS_MIN_ZOOM};
    use crate::viewport::{LatLngBounds, Viewport};
    use geo::Point;

    fn viewport(zoom: f64) -> Viewport {
        Viewport {
            bounds: LatLngBounds::new(Point::new(34.6, 33.0), Point::new(34.7, 33.1)),
            zoom,
        }
    }

    #[test]
    fn requires_zoom_and_containment() {
        let inside = Point::new(34.65, 33.05);
        let outside = Point::new(34.8, 33.05);

        assert!(should_show(inside, &viewport(BUS_MIN_ZOOM), BUS_MIN_ZOOM, false));
        assert!(!should_show(inside, &viewport(BUS_MIN_ZOOM - 1.), BUS_MIN_ZOOM, false));
        assert!(!should_show(outside, &viewport(BUS_MIN_ZOOM), BUS_MIN_ZOOM, false));
    }

    #[test]
    fn monotonic_in_zoom() {
        let inside = Point::new(34.65, 33.05);
        for zoom in 11..=19 {
            assert!(should_show(inside, &viewport(zoom as f64), BUS_MIN_ZOOM, false));
        }
    }

    #[test]
    fn force_show_overrides_geometry() {
        let outside = Point::new(34.8, 33.2);
        assert!(should_show(outside, &viewport(0.), BUS_MIN_ZOOM, true));
    }
}
