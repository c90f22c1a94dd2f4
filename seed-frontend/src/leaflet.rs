//! Bindings to the Leaflet global `L`, covering only the surface the
//! viewer drives. The host page loads Leaflet itself; tile rendering and
//! pane management stay on its side of the boundary.

use geo::Point;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    pub type Map;

    #[wasm_bindgen(js_namespace = L, js_name = map)]
    pub fn new_map(id: &str) -> Map;

    #[wasm_bindgen(method, js_name = setView)]
    pub fn set_view(this: &Map, center: &LatLng, zoom: f64);

    #[wasm_bindgen(method, js_name = getCenter)]
    pub fn get_center(this: &Map) -> LatLng;

    #[wasm_bindgen(method, js_name = getZoom)]
    pub fn get_zoom(this: &Map) -> f64;

    #[wasm_bindgen(method, js_name = getBounds)]
    pub fn get_bounds(this: &Map) -> LatLngBounds;

    #[wasm_bindgen(method, js_name = fitBounds)]
    pub fn fit_bounds(this: &Map, bounds: &LatLngBounds);

    #[wasm_bindgen(method, js_name = flyTo)]
    pub fn fly_to(this: &Map, center: &LatLng, zoom: f64, options: &JsValue);

    #[wasm_bindgen(method)]
    pub fn on(this: &Map, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method, js_name = removeLayer)]
    pub fn remove_layer(this: &Map, layer: &JsValue);
}

#[wasm_bindgen]
extern "C" {
    pub type LatLng;

    #[wasm_bindgen(js_namespace = L, js_name = latLng)]
    pub fn lat_lng(lat: f64, lng: f64) -> LatLng;

    #[wasm_bindgen(method, getter)]
    pub fn lat(this: &LatLng) -> f64;

    #[wasm_bindgen(method, getter)]
    pub fn lng(this: &LatLng) -> f64;
}

#[wasm_bindgen]
extern "C" {
    pub type LatLngBounds;

    #[wasm_bindgen(method, js_name = getSouthWest)]
    pub fn get_south_west(this: &LatLngBounds) -> LatLng;

    #[wasm_bindgen(method, js_name = getNorthEast)]
    pub fn get_north_east(this: &LatLngBounds) -> LatLng;
}

#[wasm_bindgen]
extern "C" {
    pub type TileLayer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    pub fn tile_layer(url: &str, options: &JsValue) -> TileLayer;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &TileLayer, map: &Map);
}

#[wasm_bindgen]
extern "C" {
    pub type LayerGroup;

    #[wasm_bindgen(js_namespace = L, js_name = layerGroup)]
    pub fn layer_group() -> LayerGroup;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &LayerGroup, map: &Map) -> LayerGroup;

    #[wasm_bindgen(method, js_name = addLayer)]
    pub fn add_layer(this: &LayerGroup, layer: &JsValue);

    #[wasm_bindgen(method, js_name = removeLayer)]
    pub fn remove_layer(this: &LayerGroup, layer: &JsValue);

    #[wasm_bindgen(method, js_name = clearLayers)]
    pub fn clear_layers(this: &LayerGroup);
}

#[wasm_bindgen]
extern "C" {
    pub type Marker;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    pub fn marker(latlng: &LatLng, options: &JsValue) -> Marker;

    #[wasm_bindgen(method, js_name = setLatLng)]
    pub fn set_lat_lng(this: &Marker, latlng: &LatLng);

    #[wasm_bindgen(method, js_name = getLatLng)]
    pub fn get_lat_lng(this: &Marker) -> LatLng;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &Marker, layer: &JsValue);

    #[wasm_bindgen(method)]
    pub fn remove(this: &Marker);

    #[wasm_bindgen(method, js_name = bindTooltip)]
    pub fn bind_tooltip(this: &Marker, content: &str, options: &JsValue);

    #[wasm_bindgen(method, js_name = bindPopup)]
    pub fn bind_popup(this: &Marker, content: &JsValue);

    #[wasm_bindgen(method, js_name = isPopupOpen)]
    pub fn is_popup_open(this: &Marker) -> bool;

    #[wasm_bindgen(method)]
    pub fn on(this: &Marker, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method, js_name = getElement)]
    pub fn get_element(this: &Marker) -> Option<web_sys::HtmlElement>;
}

#[wasm_bindgen]
extern "C" {
    pub type Polyline;

    #[wasm_bindgen(js_namespace = L, js_name = polyline)]
    pub fn polyline(latlngs: &js_sys::Array, options: &JsValue) -> Polyline;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &Polyline, layer: &JsValue);

    #[wasm_bindgen(method, js_name = getBounds)]
    pub fn get_bounds(this: &Polyline) -> LatLngBounds;
}

#[wasm_bindgen]
extern "C" {
    pub type CircleMarker;

    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    pub fn circle_marker(latlng: &LatLng, options: &JsValue) -> CircleMarker;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &CircleMarker, layer: &JsValue);
}

#[wasm_bindgen]
extern "C" {
    pub type Icon;

    #[wasm_bindgen(js_namespace = L, js_name = icon)]
    pub fn icon(options: &JsValue) -> Icon;

    pub type DivIcon;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    pub fn div_icon(options: &JsValue) -> DivIcon;
}

impl LatLng {
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lat(), self.lng())
    }
}

pub fn lat_lng_of(point: Point<f64>) -> LatLng {
    lat_lng(point.x(), point.y())
}

impl LatLngBounds {
    pub fn to_bounds(&self) -> bus_map::viewport::LatLngBounds {
        bus_map::viewport::LatLngBounds::new(
            self.get_south_west().to_point(),
            self.get_north_east().to_point(),
        )
    }
}

/// Marker options carry an already-constructed icon object, so they are
/// assembled reflectively rather than through serde.
pub fn marker_with_icon(latlng: &LatLng, icon: &JsValue) -> Marker {
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &JsValue::from_str("icon"), icon).expect("set marker icon");
    marker(latlng, &options.into())
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileOptions {
    pub max_zoom: f64,
    pub attribution: &'static str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IconOptions {
    pub icon_url: &'static str,
    pub icon_size: [f64; 2],
    pub icon_anchor: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup_anchor: Option<[f64; 2]>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivIconOptions {
    pub class_name: &'static str,
    pub html: String,
    pub icon_size: [f64; 2],
    pub icon_anchor: [f64; 2],
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipOptions {
    pub permanent: bool,
    pub direction: &'static str,
    pub interactive: bool,
    pub class_name: &'static str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineOptions {
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<&'static str>,
    pub weight: f64,
    pub opacity: f64,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleOptions {
    pub radius: f64,
    pub color: &'static str,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlyOptions {
    pub animate: bool,
    pub duration: f64,
}
