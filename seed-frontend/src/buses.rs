//! The live bus layer: marker factory, snapshot application, the
//! visibility pass and glide ticking.

use std::rc::Rc;

use bus_map::api::{BusPosition, RouteId};
use bus_map::reconcile::reconcile;
use bus_map::registry::{MarkerRegistry, MarkerVisual};
use bus_map::visibility::{should_show, BUS_MIN_ZOOM};
use geo::Point;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::leaflet;
use crate::map::MapView;

/// The feed refresh cadence. No backoff, no jitter; a failed poll is
/// dropped until the next tick.
pub const POLL_INTERVAL_MS: u32 = 8_000;

pub type SelectRoute = Rc<dyn Fn(RouteId)>;

/// A tracked Leaflet marker plus the closure keeping its click listener
/// alive for the marker's lifetime.
pub struct BusMarker {
    marker: leaflet::Marker,
    _on_select: Closure<dyn FnMut()>,
}

impl MarkerVisual for BusMarker {
    fn position(&self) -> Point<f64> {
        self.marker.get_lat_lng().to_point()
    }

    fn set_position(&mut self, position: Point<f64>) {
        self.marker.set_lat_lng(&leaflet::lat_lng_of(position));
    }

    fn set_bearing(&mut self, degrees: f64) {
        // the arrow is the icon's inner element, rotated in place
        if let Some(element) = self.marker.get_element() {
            if let Ok(Some(inner)) = element.query_selector(".bus-icon-inner") {
                if let Some(inner) = inner.dyn_ref::<web_sys::HtmlElement>() {
                    let _ = inner
                        .style()
                        .set_property("transform", &format!("rotate({}deg)", degrees));
                }
            }
        }
    }
}

pub struct BusTracker {
    registry: MarkerRegistry<BusMarker>,
}

impl BusTracker {
    pub fn new() -> BusTracker {
        BusTracker {
            registry: MarkerRegistry::default(),
        }
    }

    /// One poll's worth of reconciliation. `select` fires with a route id
    /// when the user clicks a bus icon or its label.
    pub fn apply_snapshot(
        &mut self,
        snapshot: &[BusPosition],
        now_ms: f64,
        map: &MapView,
        select: &SelectRoute,
    ) {
        let bus_layer = &map.bus_layer;
        let removed = reconcile(&mut self.registry, snapshot, now_ms, |bus| {
            create_marker(bus, bus_layer, Rc::clone(select))
        });
        for marker in removed {
            bus_layer.remove_layer(marker.marker.as_ref());
        }
    }

    /// Re-evaluates every tracked marker against the viewport. Runs on each
    /// pan/zoom end, never during reconciliation.
    pub fn update_visibility(&self, map: &MapView) {
        let viewport = map.viewport();
        for marker in self.registry.visuals() {
            if should_show(marker.position(), &viewport, BUS_MIN_ZOOM, false) {
                map.bus_layer.add_layer(marker.marker.as_ref());
            } else {
                map.bus_layer.remove_layer(marker.marker.as_ref());
            }
        }
    }

    /// Advances the in-flight glides; true while more frames are wanted.
    pub fn animate(&mut self, now_ms: f64) -> bool {
        self.registry.animate(now_ms)
    }
}

fn create_marker(
    bus: &BusPosition,
    layer: &leaflet::LayerGroup,
    select: SelectRoute,
) -> BusMarker {
    let icon = leaflet::div_icon(
        &JsValue::from_serde(&leaflet::DivIconOptions {
            class_name: "bus-icon",
            html: format!(
                concat!(
                    r#"<div class="bus-icon-inner" style="transform: rotate({}deg);">"#,
                    r#"<img src="/static/images/bus-icon.png" width="24" height="24">"#,
                    r#"</div>"#,
                ),
                bus.bearing,
            ),
            icon_size: [24., 24.],
            icon_anchor: [12., 12.],
        })
        .expect("serialise icon options"),
    );
    let marker = leaflet::marker_with_icon(&leaflet::lat_lng(bus.lat, bus.lon), icon.as_ref());

    // the permanent label doubles as a click target; interactive tooltips
    // hand their clicks to the marker's own handler
    marker.bind_tooltip(
        &format!("<b>{}</b>", bus.route_short_name),
        &JsValue::from_serde(&leaflet::TooltipOptions {
            permanent: true,
            direction: "top",
            interactive: true,
            class_name: "bus-tooltip",
        })
        .expect("serialise tooltip options"),
    );

    let route_id = bus.route_id;
    let on_select =
        Closure::wrap(Box::new(move || select(route_id)) as Box<dyn FnMut()>);
    marker.on("click", on_select.as_ref().unchecked_ref());

    marker.add_to(layer.as_ref());
    BusMarker {
        marker,
        _on_select: on_select,
    }
}
