//! Ownership of the Leaflet map: initialisation, the three marker layers,
//! the persisted viewport, geolocation.

use bus_map::viewport::{SavedView, Viewport, CENTER_KEY, ZOOM_KEY};
use geo::Point;
use seed::error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::leaflet;

/// Falls back to the city centre when no viewport was persisted.
pub const DEFAULT_CENTER: (f64, f64) = (34.6786, 33.0413);
pub const DEFAULT_ZOOM: f64 = 13.;

const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

pub struct MapView {
    pub map: leaflet::Map,
    pub stop_layer: leaflet::LayerGroup,
    pub bus_layer: leaflet::LayerGroup,
    pub path_layer: leaflet::LayerGroup,
    user_marker: Option<leaflet::Marker>,
}

impl MapView {
    /// Creates the map in the host page's `#map` container, adds the tile
    /// layer and the marker layers, and restores the persisted view once the
    /// map is up.
    pub fn init() -> MapView {
        let map = leaflet::new_map("map");
        map.set_view(
            &leaflet::lat_lng(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            DEFAULT_ZOOM,
        );

        leaflet::tile_layer(
            TILE_URL,
            &JsValue::from_serde(&leaflet::TileOptions {
                max_zoom: 19.,
                attribution: "© OpenStreetMap contributors",
            })
            .expect("serialise tile options"),
        )
        .add_to(&map);

        let stop_layer = leaflet::layer_group().add_to(&map);
        let bus_layer = leaflet::layer_group().add_to(&map);
        let path_layer = leaflet::layer_group().add_to(&map);

        let view = MapView {
            map,
            stop_layer,
            bus_layer,
            path_layer,
            user_marker: None,
        };
        view.restore_view();
        view
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            bounds: self.map.get_bounds().to_bounds(),
            zoom: self.map.get_zoom(),
        }
    }

    pub fn center(&self) -> Point<f64> {
        self.map.get_center().to_point()
    }

    pub fn on(&self, event: &str, handler: &js_sys::Function) {
        self.map.on(event, handler);
    }

    /// Writes the two storage entries the next session restores from.
    pub fn save_view(&self) {
        let saved = SavedView {
            center: self.center(),
            zoom: self.map.get_zoom(),
        };
        let (center, zoom) = saved.to_entries();
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(CENTER_KEY, &center);
            let _ = storage.set_item(ZOOM_KEY, &zoom);
        }
    }

    fn restore_view(&self) {
        let storage = match local_storage() {
            Some(storage) => storage,
            None => return,
        };
        let center = storage.get_item(CENTER_KEY).ok().and_then(|entry| entry);
        let zoom = storage.get_item(ZOOM_KEY).ok().and_then(|entry| entry);
        if let (Some(center), Some(zoom)) = (center, zoom) {
            match SavedView::from_entries(&center, &zoom) {
                Ok(view) => self
                    .map
                    .set_view(&leaflet::lat_lng_of(view.center), view.zoom),
                Err(err) => error!(format!("ignoring saved map view: {}", err)),
            }
        }
    }

    /// Flies to the located position and drops, or moves, the pulsing
    /// user-location marker.
    pub fn show_user_location(&mut self, position: Point<f64>) {
        let latlng = leaflet::lat_lng_of(position);
        self.map.fly_to(
            &latlng,
            17.,
            &JsValue::from_serde(&leaflet::FlyOptions {
                animate: true,
                duration: 1.5,
            })
            .expect("serialise fly options"),
        );

        match &self.user_marker {
            Some(marker) => marker.set_lat_lng(&latlng),
            None => {
                let icon = leaflet::div_icon(
                    &JsValue::from_serde(&leaflet::DivIconOptions {
                        class_name: "user-location-icon",
                        html: concat!(
                            r#"<div class="pulse-wrapper">"#,
                            r#"<div class="red-ring"></div>"#,
                            r#"<div class="pulse-ring"></div>"#,
                            r#"<div class="pulse-center"></div>"#,
                            r#"</div>"#,
                        )
                        .to_owned(),
                        icon_size: [20., 20.],
                        icon_anchor: [10., 10.],
                    })
                    .expect("serialise icon options"),
                );
                let marker = leaflet::marker_with_icon(&latlng, icon.as_ref());
                marker.add_to(self.map.as_ref());
                self.user_marker = Some(marker);
            }
        }
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    seed::util::window().local_storage().ok().and_then(|storage| storage)
}

/// Asks the platform for the current position. Success lands back in the
/// app through `found`; failure alerts with the platform's own message, as
/// does a platform without geolocation at all.
pub fn locate(found: impl FnOnce(f64, f64) + 'static) {
    let window = seed::util::window();
    let geolocation = match window.navigator().geolocation() {
        Ok(geolocation) => geolocation,
        Err(_) => {
            alert("Geolocation is not supported by this browser.");
            return;
        }
    };

    let success = Closure::once_into_js(move |position: web_sys::GeolocationPosition| {
        let coords = position.coords();
        found(coords.latitude(), coords.longitude());
    });
    let failure = Closure::once_into_js(move |err: web_sys::GeolocationPositionError| {
        alert(&format!("Geolocation failed: {}", err.message()));
    });

    if geolocation
        .get_current_position_with_error_callback(
            success.unchecked_ref(),
            Some(failure.unchecked_ref()),
        )
        .is_err()
    {
        error!("geolocation request rejected");
    }
}

pub fn alert(message: &str) {
    let _ = seed::util::window().alert_with_message(message);
}
