//! Door-to-door itinerary planning: the two-phase picking flow, the
//! planner request, the per-leg polylines and the summary bars.

use bus_map::api::{ItineraryEdge, Leg, PlanEndpoint, PlanRequest};
use bus_map::itinerary::{summarize, ItinerarySummary, LegSummary, MAX_ITINERARIES};
use futures::prelude::*;
use geo::Point;
use seed::{prelude::*, *};
use wasm_bindgen::JsValue;

use crate::fetch;
use crate::leaflet;
use crate::map::{alert, MapView};

#[derive(Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    PickingDestination,
    PickingOrigin,
}

pub struct Model {
    pub phase: Phase,
    destination: Option<Pick>,
    origin: Option<Pick>,
    routes: Vec<RouteChoice>,
    selected: Option<usize>,
}

/// A picked endpoint and the pin dropped on it.
struct Pick {
    position: Point<f64>,
    marker: leaflet::Marker,
}

struct RouteChoice {
    layer: leaflet::LayerGroup,
    summary: ItinerarySummary,
}

impl Default for Model {
    fn default() -> Self {
        Model {
            phase: Phase::Idle,
            destination: None,
            origin: None,
            routes: Vec::new(),
            selected: None,
        }
    }
}

pub enum Msg {
    /// "Make Route" pressed: restart the flow from a clean map.
    Start,
    /// The map centre is the answer to the current question.
    Done,
    Back,
    Cancel,
    PlanFetched(Result<Vec<ItineraryEdge>, fetch::LoadError>),
    Select(usize),
}

pub fn update(msg: Msg, model: &mut Model, map: &MapView, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::Start => {
            reset(model, map);
            model.phase = Phase::PickingDestination;
        }

        Msg::Done => match model.phase {
            Phase::Idle => {}
            Phase::PickingDestination => {
                model.destination = Some(drop_pin(map));
                model.phase = Phase::PickingOrigin;
            }
            Phase::PickingOrigin => {
                let destination = match &model.destination {
                    Some(pick) => pick.position,
                    None => return,
                };
                let origin = drop_pin(map);
                model.phase = Phase::Idle;
                let request = PlanRequest {
                    origin: PlanEndpoint {
                        lat: origin.position.x(),
                        lng: origin.position.y(),
                    },
                    destination: PlanEndpoint {
                        lat: destination.x(),
                        lng: destination.y(),
                    },
                };
                model.origin = Some(origin);
                orders.perform_cmd(
                    fetch::post_json("/api/make_route".to_owned(), request)
                        .map(Msg::PlanFetched),
                );
            }
        },

        Msg::Back => match model.phase {
            Phase::Idle => {}
            Phase::PickingOrigin => {
                if let Some(pick) = model.destination.take() {
                    pick.marker.remove();
                }
                model.phase = Phase::PickingDestination;
            }
            Phase::PickingDestination => {
                reset(model, map);
            }
        },

        Msg::Cancel => reset(model, map),

        Msg::PlanFetched(Ok(edges)) => {
            if edges.is_empty() {
                alert("No route returned from server.");
                return;
            }
            for edge in edges.iter().take(MAX_ITINERARIES) {
                match summarize(&edge.node) {
                    Ok(summary) => {
                        let legs = edge.node.legs.as_ref().expect("summarised edges have legs");
                        model.routes.push(RouteChoice {
                            layer: route_layer(legs),
                            summary,
                        });
                    }
                    Err(err) => error!(format!("skipping itinerary edge: {}", err)),
                }
            }
            // the fastest route comes first and starts out shown
            if let Some(first) = model.routes.first() {
                first.layer.add_to(&map.map);
                model.selected = Some(0);
            }
        }

        Msg::PlanFetched(Err(err)) => {
            error!(format!("failed to fetch route: {:#?}", err));
            alert("Failed to fetch route from server.");
        }

        Msg::Select(index) => {
            for choice in &model.routes {
                map.map.remove_layer(choice.layer.as_ref());
            }
            if let Some(choice) = model.routes.get(index) {
                choice.layer.add_to(&map.map);
                model.selected = Some(index);
            }
        }
    }
}

fn reset(model: &mut Model, map: &MapView) {
    model.phase = Phase::Idle;
    if let Some(pick) = model.destination.take() {
        pick.marker.remove();
    }
    if let Some(pick) = model.origin.take() {
        pick.marker.remove();
    }
    for choice in model.routes.drain(..) {
        map.map.remove_layer(choice.layer.as_ref());
    }
    model.selected = None;
}

fn drop_pin(map: &MapView) -> Pick {
    let position = map.center();
    let icon = leaflet::icon(
        &JsValue::from_serde(&leaflet::IconOptions {
            icon_url: "/static/images/pin-icon.png",
            icon_size: [30., 30.],
            icon_anchor: [15., 30.],
            popup_anchor: None,
        })
        .expect("serialise icon options"),
    );
    let marker = leaflet::marker_with_icon(&leaflet::lat_lng_of(position), icon.as_ref());
    marker.add_to(map.map.as_ref());
    Pick { position, marker }
}

/// One layer group per itinerary: walk legs dashed blue, transit green.
fn route_layer(legs: &[Leg]) -> leaflet::LayerGroup {
    let layer = leaflet::layer_group();
    for leg in legs {
        let latlngs = js_sys::Array::new();
        for point in &leg.leg_geometry.points {
            latlngs.push(leaflet::lat_lng(point[0], point[1]).as_ref());
        }
        let walking = leg.mode == "WALK";
        let polyline = leaflet::polyline(
            &latlngs,
            &JsValue::from_serde(&leaflet::PolylineOptions {
                color: if walking { "blue" } else { "green" },
                dash_array: if walking { Some("5, 10") } else { None },
                weight: 4.,
                opacity: 0.9,
            })
            .expect("serialise polyline options"),
        );
        layer.add_layer(polyline.as_ref());
    }
    layer
}

pub fn view(model: &Model) -> Vec<Node<Msg>> {
    nodes![
        div![
            attrs! {At::Class => "route-controls"},
            match model.phase {
                Phase::Idle => nodes![button![
                    attrs! {At::Class => "make-route-btn"},
                    "Make Route",
                    ev(Ev::Click, |_| Msg::Start),
                ]],
                Phase::PickingDestination | Phase::PickingOrigin => nodes![
                    div![
                        attrs! {At::Class => "route-label"},
                        if let Phase::PickingDestination = model.phase {
                            "Where to?"
                        } else {
                            "Where from?"
                        },
                    ],
                    div![
                        attrs! {At::Class => "route-buttons"},
                        button!["Done", ev(Ev::Click, |_| Msg::Done)],
                        button!["Back", ev(Ev::Click, |_| Msg::Back)],
                    ],
                ],
            },
            if model.routes.is_empty() {
                empty![]
            } else {
                button![
                    attrs! {At::Class => "cancel-route-btn"},
                    "✕",
                    ev(Ev::Click, |_| Msg::Cancel),
                ]
            },
        ],
        if let Phase::Idle = model.phase {
            empty![]
        } else {
            div![attrs! {At::Class => "center-marker"}]
        },
        if model.routes.is_empty() {
            empty![]
        } else {
            div![
                attrs! {At::Class => "route-summaries"},
                model
                    .routes
                    .iter()
                    .enumerate()
                    .map(|(index, choice)| summary_bar(
                        index,
                        &choice.summary,
                        model.selected == Some(index),
                    ))
                    .collect::<Vec<_>>(),
            ]
        },
    ]
}

fn summary_bar(index: usize, summary: &ItinerarySummary, highlighted: bool) -> Node<Msg> {
    div![
        attrs! {At::Class => if highlighted { "route-summary-bar highlight" } else { "route-summary-bar" }},
        ev(Ev::Click, move |_| Msg::Select(index)),
        div![
            attrs! {At::Class => "route-time"},
            span![attrs! {At::Class => "start-time"}, summary.depart.as_str()],
            " - ",
            span![attrs! {At::Class => "end-time"}, summary.arrive.as_str()],
            span![
                attrs! {At::Class => "total-duration"},
                format!(" ({} min)", summary.total_minutes),
            ],
        ],
        div![
            attrs! {At::Class => "route-leg-summary"},
            leg_nodes(&summary.legs),
        ],
    ]
}

fn leg_nodes(legs: &[LegSummary]) -> Vec<Node<Msg>> {
    let mut nodes = Vec::new();
    for (index, leg) in legs.iter().enumerate() {
        if index > 0 {
            nodes.push(span![" → "]);
        }
        nodes.push(match leg {
            LegSummary::Walk { minutes } => span![
                attrs! {At::Class => "walk"},
                format!("Walk: {} min", minutes),
            ],
            LegSummary::Bus { route, minutes } => span![
                attrs! {At::Class => "bus-leg"},
                span![attrs! {At::Class => "bus-number"}, route.as_str()],
                format!(" {} min", minutes),
            ],
            LegSummary::Other { mode, minutes } => {
                span![format!("{}: {} min", mode, minutes)]
            }
        });
    }
    nodes
}
