//! Viewport state and its persistence between sessions.

use std::fmt;

use geo::Point;
use serde::{Deserialize, Serialize};

/// What the map currently shows. Owned by the map component; read-only to
/// the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: LatLngBounds,
    pub zoom: f64,
}

/// Geographic bounding box, south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south_west: Point<f64>,
    pub north_east: Point<f64>,
}

impl LatLngBounds {
    pub fn new(south_west: Point<f64>, north_east: Point<f64>) -> Self {
        LatLngBounds {
            south_west,
            north_east,
        }
    }

    pub fn contains(&self, point: Point<f64>) -> bool {
        self.south_west.x() <= point.x()
            && point.x() <= self.north_east.x()
            && self.south_west.y() <= point.y()
            && point.y() <= self.north_east.y()
    }
}

/// Storage key for the persisted map centre.
pub const CENTER_KEY: &str = "mapCenter";
/// Storage key for the persisted zoom level.
pub const ZOOM_KEY: &str = "mapZoom";

/// Centre + zoom as persisted on page unload and restored at startup.
/// Single-user, single-tab, so last-write-wins is all the coordination
/// the two entries need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedView {
    pub center: Point<f64>,
    pub zoom: f64,
}

#[derive(Serialize, Deserialize)]
struct CenterPayload {
    lat: f64,
    lng: f64,
}

impl SavedView {
    /// Values for the two storage entries: the centre as JSON `{lat,lng}`
    /// and the zoom as a stringified integer.
    pub fn to_entries(&self) -> (String, String) {
        let center = serde_json::to_string(&CenterPayload {
            lat: self.center.x(),
            lng: self.center.y(),
        })
        .expect("two floats serialise");
        (center, (self.zoom.round() as i64).to_string())
    }

    pub fn from_entries(center: &str, zoom: &str) -> Result<Self, ViewParseError> {
        let CenterPayload { lat, lng } =
            serde_json::from_str(center).map_err(ViewParseError::Center)?;
        let zoom = zoom.trim().parse::<i64>().map_err(ViewParseError::Zoom)?;
        Ok(SavedView {
            center: Point::new(lat, lng),
            zoom: zoom as f64,
        })
    }
}

#[derive(Debug)]
pub enum ViewParseError {
    Center(serde_json::Error),
    Zoom(std::num::ParseIntError),
}

impl fmt::Display for ViewParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewParseError::Center(err) => write!(f, "bad saved centre: {}", err),
            ViewParseError::Zoom(err) => write!(f, "bad saved zoom: {}", err),
        }
    }
}

impl std::error::Error for ViewParseError {}

#[cfg(test)]
mod test {
    use super::{LatLngBounds, SavedView};
    use geo::Point;

    #[test]
    fn bounds_contains() {
        let bounds = LatLngBounds::new(Point::new(34.6, 33.0), Point::new(34.7, 33.1));
        assert!(bounds.contains(Point::new(34.65, 33.05)));
        assert!(bounds.contains(Point::new(34.6, 33.0)));
        assert!(!bounds.contains(Point::new(34.59, 33.05)));
        assert!(!bounds.contains(Point::new(34.65, 33.11)));
    }

    #[test]
    fn saved_view_round_trips() {
        let view = SavedView {
            center: Point::new(34.6786, 33.0413),
            zoom: 13.,
        };
        let (center, zoom) = view.to_entries();
        assert_eq!(zoom, "13");
        let restored = SavedView::from_entries(&center, &zoom).unwrap();
        assert_eq!(restored, view);
    }

    #[test]
    fn restore_accepts_the_stored_format() {
        let restored =
            SavedView::from_entries(r#"{"lat":34.6786,"lng":33.0413}"#, "13").unwrap();
        assert_eq!(restored.center, Point::new(34.6786, 33.0413));
        assert_eq!(restored.zoom, 13.);
    }

    #[test]
    fn restore_rejects_garbage() {
        assert!(SavedView::from_entries("not json", "13").is_err());
        assert!(SavedView::from_entries(r#"{"lat":1.0,"lng":2.0}"#, "high").is_err());
    }
}
