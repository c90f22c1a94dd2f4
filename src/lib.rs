//! Engine for a live transit map viewer.
//!
//! Everything here is platform-independent: positions are `geo::Point<f64>`
//! (latitude in `x`, longitude in `y`, matching the backend's `[lat, lon]`
//! ordering), clocks are injected as millisecond timestamps, and the map
//! library sits behind the [`registry::MarkerVisual`] trait. The frontend
//! crate wires these pieces to Leaflet and the browser event loop.

pub mod api;
pub mod itinerary;
pub mod motion;
pub mod reconcile;
pub mod registry;
pub mod viewport;
pub mod visibility;
