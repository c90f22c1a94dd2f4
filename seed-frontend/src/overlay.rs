//! The transient overlay for a selected route: one polyline through the
//! shape, one circle per stop on the route. At most one route is drawn at
//! a time; a click on the bare map clears it.

use bus_map::api::{RouteId, RouteStop, ShapePoint};
use seed::log;
use wasm_bindgen::prelude::*;

use crate::leaflet;
use crate::map::MapView;

pub struct RouteOverlay {
    /// The polyline currently drawn, doubling as the "anything to clear on
    /// map click" flag.
    current: Option<leaflet::Polyline>,
}

impl RouteOverlay {
    pub fn new() -> RouteOverlay {
        RouteOverlay { current: None }
    }

    pub fn is_drawn(&self) -> bool {
        self.current.is_some()
    }

    /// Fully clears the previous route; runs before anything new is drawn.
    pub fn clear(&mut self, map: &MapView) {
        map.path_layer.clear_layers();
        self.current = None;
    }

    /// Draws the shape polyline and zooms the map to it. Returns whether
    /// anything was drawn, so the caller knows whether to go on and fetch
    /// the stops along the route.
    pub fn draw_shape(&mut self, map: &MapView, route_id: RouteId, shape: &[ShapePoint]) -> bool {
        if shape.is_empty() {
            log!(format!("no shape points returned for route {}", route_id));
            return false;
        }
        let latlngs = js_sys::Array::new();
        for point in shape {
            latlngs.push(leaflet::lat_lng(point.lat, point.lon).as_ref());
        }
        let polyline = leaflet::polyline(
            &latlngs,
            &JsValue::from_serde(&leaflet::PolylineOptions {
                color: "green",
                dash_array: None,
                weight: 3.,
                opacity: 1.,
            })
            .expect("serialise polyline options"),
        );
        polyline.add_to(map.path_layer.as_ref());
        map.map.fit_bounds(&polyline.get_bounds());
        self.current = Some(polyline);
        true
    }

    /// Highlights each stop along the drawn route. Arrives after the shape;
    /// an overlay cleared in the meantime just collects the circles onto the
    /// empty layer, the same unguarded late write the fetches always had.
    pub fn draw_stops(&self, map: &MapView, stops: &[RouteStop]) {
        for stop in stops {
            let circle = leaflet::circle_marker(
                &leaflet::lat_lng(stop.stop_lat, stop.stop_lon),
                &JsValue::from_serde(&leaflet::CircleOptions {
                    radius: 6.,
                    color: "green",
                    fill_color: "white",
                    fill_opacity: 0.8,
                })
                .expect("serialise circle options"),
            );
            circle.add_to(map.path_layer.as_ref());
        }
    }
}
