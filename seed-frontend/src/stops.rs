//! Static stop markers and their detail popups. The set is built once from
//! the dataset the host page carries and never changes afterwards; the
//! visibility pass is the only thing that touches it.

use std::rc::Rc;

use bus_map::api::{RouteAtStop, Stop, StopArrival, StopId};
use bus_map::visibility::{should_show, STOP_MIN_ZOOM};
use enclose::enclose;
use geo::Point;
use seed::error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::leaflet;
use crate::map::MapView;

pub type StopCallback = Rc<dyn Fn(StopId)>;

pub struct StopLayer {
    markers: Vec<StopMarker>,
}

/// One stop's marker together with its popup content. The refresh closure
/// lives here, held by the marker it serves, rather than on any global.
struct StopMarker {
    stop: Stop,
    marker: leaflet::Marker,
    route_list: web_sys::HtmlElement,
    details: web_sys::HtmlElement,
    _on_open: Closure<dyn FnMut()>,
    _on_refresh: Closure<dyn FnMut()>,
}

impl StopMarker {
    fn position(&self) -> Point<f64> {
        self.stop.position()
    }
}

impl StopLayer {
    /// Builds every marker up front, then runs one visibility pass so the
    /// restored viewport decides what is on screen.
    pub fn create(
        stops: Vec<Stop>,
        map: &MapView,
        open: StopCallback,
        refresh: StopCallback,
    ) -> StopLayer {
        let markers = stops
            .into_iter()
            .map(|stop| create_marker(stop, Rc::clone(&open), Rc::clone(&refresh)))
            .collect();
        let layer = StopLayer { markers };
        layer.update_visibility(map);
        layer
    }

    /// Re-evaluates every stop against the viewport. A marker whose popup is
    /// open stays visible wherever the map went.
    pub fn update_visibility(&self, map: &MapView) {
        let viewport = map.viewport();
        for entry in &self.markers {
            let popup_open = entry.marker.is_popup_open();
            if should_show(entry.position(), &viewport, STOP_MIN_ZOOM, popup_open) {
                map.stop_layer.add_layer(entry.marker.as_ref());
            } else {
                entry.marker.remove();
            }
        }
    }

    /// Resets the popup to its loading placeholders; runs on every open
    /// before the detail fetches go out.
    pub fn begin_loading(&self, stop_id: StopId) {
        if let Some(entry) = self.find(stop_id) {
            entry
                .route_list
                .set_inner_html("<i>Fetching routes...</i>");
            entry
                .details
                .set_inner_html("<b>Loading upcoming arrivals...</b>");
        }
    }

    pub fn show_refreshing(&self, stop_id: StopId) {
        if let Some(entry) = self.find(stop_id) {
            entry.details.set_inner_html("<b>Refreshing...</b>");
        }
    }

    pub fn render_routes(&self, stop_id: StopId, routes: &[RouteAtStop]) {
        if let Some(entry) = self.find(stop_id) {
            if routes.is_empty() {
                entry
                    .route_list
                    .set_inner_html("<b>No route data available for this stop.</b>");
            } else {
                let names: Vec<&str> = routes
                    .iter()
                    .map(|route| route.route_short_name.as_str())
                    .collect();
                entry
                    .route_list
                    .set_inner_html(&format!("<b>Routes:</b> {}", names.join(" | ")));
            }
        }
    }

    pub fn render_routes_error(&self, stop_id: StopId) {
        if let Some(entry) = self.find(stop_id) {
            entry.route_list.set_inner_html("Error loading routes.");
        }
    }

    pub fn render_arrivals(&self, stop_id: StopId, arrivals: &[StopArrival]) {
        if let Some(entry) = self.find(stop_id) {
            if arrivals.is_empty() {
                entry
                    .details
                    .set_inner_html("<b>No routes available in the next 60 minutes.</b>");
            } else {
                let mut details = String::from(r#"<div class="arrival-list">"#);
                for arrival in arrivals {
                    details.push_str(&format!(
                        concat!(
                            r#"<div class="arrival-item">"#,
                            r#"<span class="route-code">{}</span>"#,
                            r#"<span class="route-desc">{}</span>"#,
                            r#"<span class="route-time">{} min</span>"#,
                            r#"</div>"#,
                        ),
                        arrival.route_short_name,
                        arrival.route_long_name,
                        arrival.arrival_time,
                    ));
                }
                details.push_str("</div>");
                entry.details.set_inner_html(&details);
            }
        }
    }

    pub fn render_arrivals_error(&self, stop_id: StopId) {
        if let Some(entry) = self.find(stop_id) {
            entry
                .details
                .set_inner_html("<b>Failed to load stop details.</b>");
        }
    }

    fn find(&self, stop_id: StopId) -> Option<&StopMarker> {
        self.markers
            .iter()
            .find(|entry| entry.stop.stop_id == stop_id)
    }
}

fn create_marker(stop: Stop, open: StopCallback, refresh: StopCallback) -> StopMarker {
    let icon = leaflet::icon(
        &JsValue::from_serde(&leaflet::IconOptions {
            icon_url: "/static/images/bus-stop-icon.png",
            icon_size: [12., 12.],
            icon_anchor: [6., 6.],
            popup_anchor: Some([0., -24.]),
        })
        .expect("serialise icon options"),
    );
    let marker =
        leaflet::marker_with_icon(&leaflet::lat_lng(stop.stop_lat, stop.stop_lon), icon.as_ref());

    let document = seed::util::window().document().expect("page has a document");
    let content = document
        .create_element("div")
        .expect("create popup element");
    content.set_class_name("stop-popup");
    content.set_inner_html(&format!(
        concat!(
            r#"<div class="stop-header">"#,
            r#"<div><div class="stop-name">{name}</div><div class="stop-id">#{id}</div></div>"#,
            r#"<button class="refresh-btn" title="Refresh">🔄</button>"#,
            r#"</div>"#,
            r#"<div class="route-list"><i>Fetching routes...</i></div>"#,
            r#"<div class="stop-details"><b>Loading upcoming arrivals...</b></div>"#,
        ),
        name = stop.stop_name,
        id = stop.stop_id,
    ));

    let route_list = popup_part(&content, ".route-list");
    let details = popup_part(&content, ".stop-details");
    let button = popup_part(&content, ".refresh-btn");

    let stop_id = stop.stop_id;
    let on_refresh =
        Closure::wrap(Box::new(enclose!((refresh) move || refresh(stop_id))) as Box<dyn FnMut()>);
    button
        .add_event_listener_with_callback("click", on_refresh.as_ref().unchecked_ref())
        .expect("attach refresh listener");

    let on_open = Closure::wrap(Box::new(move || open(stop_id)) as Box<dyn FnMut()>);
    marker.on("popupopen", on_open.as_ref().unchecked_ref());
    marker.bind_popup(content.as_ref());

    StopMarker {
        stop,
        marker,
        route_list,
        details,
        _on_open: on_open,
        _on_refresh: on_refresh,
    }
}

fn popup_part(content: &web_sys::Element, selector: &str) -> web_sys::HtmlElement {
    content
        .query_selector(selector)
        .expect("query popup content")
        .expect("popup part present")
        .dyn_into::<web_sys::HtmlElement>()
        .expect("popup part is an html element")
}

/// The backend renders the stop dataset into the page as a global `stops`
/// array; it is read here exactly once and threaded through explicitly.
pub fn dataset_from_page() -> Vec<Stop> {
    let window = JsValue::from(seed::util::window());
    let dataset = js_sys::Reflect::get(&window, &JsValue::from_str("stops"))
        .ok()
        .and_then(|value| value.into_serde().ok());
    match dataset {
        Some(stops) => stops,
        None => {
            error!("no stop dataset on the page");
            Vec::new()
        }
    }
}
