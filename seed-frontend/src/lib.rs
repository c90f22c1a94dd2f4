//! Seed application for the live map. The host page carries the `#map`
//! container (Leaflet manages its subtree) and the stop dataset; this app
//! owns everything that changes: the live bus layer, the route overlay,
//! stop popups and the itinerary planner. Every browser callback lands
//! back here as a message, so the marker registry is only ever touched on
//! the update loop.

use std::rc::Rc;

use bus_map::api::{BusPosition, RouteAtStop, RouteId, RouteStop, ShapePoint, StopArrival, StopId};
use enclose::enclose;
use futures::prelude::*;
use geo::Point;
use gloo_timers::callback::Interval;
use seed::{prelude::*, *};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

mod buses;
mod fetch;
mod leaflet;
mod map;
mod overlay;
mod planner;
mod stops;

#[wasm_bindgen(start)]
pub fn render() {
    App::start("app", init, update, view);
}

fn init(_url: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders.after_next_render(|_| Msg::FirstRender);

    Model {
        viewer: None,
        planner: planner::Model::default(),
        poll: None,
        glide_frame: None,
    }
}

struct Model {
    viewer: Option<Viewer>,
    planner: planner::Model,
    /// Handle keeping the poll ticking; dropped only with the app.
    poll: Option<Interval>,
    /// The pending animation-frame callback while any marker is gliding.
    glide_frame: Option<Closure<dyn FnMut(f64)>>,
}

/// Everything that exists only once the map container is live.
struct Viewer {
    map: map::MapView,
    buses: buses::BusTracker,
    stops: stops::StopLayer,
    overlay: overlay::RouteOverlay,
    /// Shared with every bus marker the factory creates.
    select_route: buses::SelectRoute,
    _listeners: Vec<Closure<dyn FnMut()>>,
}

enum Msg {
    FirstRender,
    PollTick,
    BusesFetched(Result<Vec<BusPosition>, fetch::LoadError>),
    GlideFrame,
    ViewportChanged,
    MapClicked,
    BusSelected(RouteId),
    ShapeFetched(RouteId, Result<Vec<ShapePoint>, fetch::LoadError>),
    RouteStopsFetched(Result<Vec<RouteStop>, fetch::LoadError>),
    StopPopupOpened(StopId),
    RefreshStopDetails(StopId),
    StopRoutesFetched(StopId, Result<Vec<RouteAtStop>, fetch::LoadError>),
    StopDetailsFetched(StopId, Result<Vec<StopArrival>, fetch::LoadError>),
    Locate,
    LocationFound(f64, f64),
    SaveView,
    PlannerMsg(planner::Msg),
}

fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::FirstRender => {
            let send: Rc<dyn Fn(Msg)> = {
                let app = orders.clone_app();
                let msg_mapper = orders.msg_mapper();
                Rc::new(move |msg| app.update(msg_mapper(msg)))
            };

            let map_view = map::MapView::init();

            // viewport changes and bare-map clicks land back as messages
            let mut listeners = Vec::new();
            for event in &["moveend", "zoomend"] {
                let on_viewport = Closure::wrap(Box::new(
                    enclose!((send) move || send(Msg::ViewportChanged)),
                ) as Box<dyn FnMut()>);
                map_view.on(event, on_viewport.as_ref().unchecked_ref());
                listeners.push(on_viewport);
            }
            let on_click = Closure::wrap(Box::new(enclose!((send) move || send(Msg::MapClicked)))
                as Box<dyn FnMut()>);
            map_view.on("click", on_click.as_ref().unchecked_ref());
            listeners.push(on_click);

            let on_unload = Closure::wrap(Box::new(enclose!((send) move || send(Msg::SaveView)))
                as Box<dyn FnMut()>);
            seed::util::window()
                .add_event_listener_with_callback(
                    "beforeunload",
                    on_unload.as_ref().unchecked_ref(),
                )
                .expect("attach unload listener");
            listeners.push(on_unload);

            let stops = stops::StopLayer::create(
                stops::dataset_from_page(),
                &map_view,
                Rc::new(enclose!((send) move |stop_id| send(Msg::StopPopupOpened(stop_id)))),
                Rc::new(enclose!((send) move |stop_id| send(Msg::RefreshStopDetails(stop_id)))),
            );

            let select_route: buses::SelectRoute =
                Rc::new(enclose!((send) move |route_id| send(Msg::BusSelected(route_id))));

            model.viewer = Some(Viewer {
                map: map_view,
                buses: buses::BusTracker::new(),
                stops,
                overlay: overlay::RouteOverlay::new(),
                select_route,
                _listeners: listeners,
            });

            // one snapshot right away, then the fixed cadence
            orders.perform_cmd(
                fetch::get_json("/api/get_buses".to_owned()).map(Msg::BusesFetched),
            );
            model.poll = Some(Interval::new(
                buses::POLL_INTERVAL_MS,
                enclose!((send) move || send(Msg::PollTick)),
            ));
        }

        Msg::PollTick => {
            orders.perform_cmd(
                fetch::get_json("/api/get_buses".to_owned()).map(Msg::BusesFetched),
            );
            orders.skip();
        }

        Msg::BusesFetched(Ok(snapshot)) => {
            if let Some(viewer) = &mut model.viewer {
                let select = Rc::clone(&viewer.select_route);
                viewer
                    .buses
                    .apply_snapshot(&snapshot, js_sys::Date::now(), &viewer.map, &select);
            }
            if model.glide_frame.is_none() {
                request_glide_frame(model, orders);
            }
            orders.skip();
        }

        Msg::BusesFetched(Err(err)) => {
            error!(format!("failed to fetch buses: {:#?}", err));
            orders.skip();
        }

        Msg::GlideFrame => {
            model.glide_frame = None;
            let gliding = model
                .viewer
                .as_mut()
                .map_or(false, |viewer| viewer.buses.animate(js_sys::Date::now()));
            if gliding {
                request_glide_frame(model, orders);
            }
            orders.skip();
        }

        Msg::ViewportChanged => {
            if let Some(viewer) = &model.viewer {
                viewer.buses.update_visibility(&viewer.map);
                viewer.stops.update_visibility(&viewer.map);
            }
            orders.skip();
        }

        Msg::MapClicked => {
            if let Some(viewer) = &mut model.viewer {
                if viewer.overlay.is_drawn() {
                    viewer.overlay.clear(&viewer.map);
                    log!("route path removed on map click");
                }
            }
            orders.skip();
        }

        Msg::BusSelected(route_id) => {
            if let Some(viewer) = &mut model.viewer {
                viewer.overlay.clear(&viewer.map);
            }
            orders.perform_cmd(
                fetch::get_json(format!("/api/get_shape/{}", route_id))
                    .map(move |result| Msg::ShapeFetched(route_id, result)),
            );
            orders.skip();
        }

        Msg::ShapeFetched(route_id, Ok(shape)) => {
            let drawn = model.viewer.as_mut().map_or(false, |viewer| {
                viewer.overlay.draw_shape(&viewer.map, route_id, &shape)
            });
            // the stops request only goes out once the shape has landed
            if drawn {
                orders.perform_cmd(
                    fetch::get_json(format!("/buses/get_stops_on_route/{}", route_id))
                        .map(Msg::RouteStopsFetched),
                );
            }
            orders.skip();
        }

        Msg::ShapeFetched(_, Err(err)) => {
            error!(format!("failed to fetch shape points: {:#?}", err));
            orders.skip();
        }

        Msg::RouteStopsFetched(Ok(route_stops)) => {
            if let Some(viewer) = &model.viewer {
                viewer.overlay.draw_stops(&viewer.map, &route_stops);
            }
            orders.skip();
        }

        Msg::RouteStopsFetched(Err(err)) => {
            error!(format!("failed to fetch stops on the route: {:#?}", err));
            orders.skip();
        }

        Msg::StopPopupOpened(stop_id) => {
            if let Some(viewer) = &model.viewer {
                viewer.stops.begin_loading(stop_id);
            }
            orders.perform_cmd(
                fetch::get_json(format!("/stops/routes_stopping_at/{}", stop_id))
                    .map(move |result| Msg::StopRoutesFetched(stop_id, result)),
            );
            orders.perform_cmd(
                fetch::get_json(format!("/stops/{}", stop_id))
                    .map(move |result| Msg::StopDetailsFetched(stop_id, result)),
            );
            orders.skip();
        }

        Msg::RefreshStopDetails(stop_id) => {
            if let Some(viewer) = &model.viewer {
                viewer.stops.show_refreshing(stop_id);
            }
            orders.perform_cmd(
                fetch::get_json(format!("/stops/{}", stop_id))
                    .map(move |result| Msg::StopDetailsFetched(stop_id, result)),
            );
            orders.skip();
        }

        Msg::StopRoutesFetched(stop_id, Ok(routes)) => {
            if let Some(viewer) = &model.viewer {
                viewer.stops.render_routes(stop_id, &routes);
            }
            orders.skip();
        }

        Msg::StopRoutesFetched(stop_id, Err(err)) => {
            error!(format!("failed to fetch routes: {:#?}", err));
            if let Some(viewer) = &model.viewer {
                viewer.stops.render_routes_error(stop_id);
            }
            orders.skip();
        }

        Msg::StopDetailsFetched(stop_id, Ok(arrivals)) => {
            if let Some(viewer) = &model.viewer {
                viewer.stops.render_arrivals(stop_id, &arrivals);
            }
            orders.skip();
        }

        Msg::StopDetailsFetched(stop_id, Err(err)) => {
            error!(format!("failed to fetch stop details: {:#?}", err));
            if let Some(viewer) = &model.viewer {
                viewer.stops.render_arrivals_error(stop_id);
            }
            orders.skip();
        }

        Msg::Locate => {
            let app = orders.clone_app();
            let msg_mapper = orders.msg_mapper();
            map::locate(move |lat, lng| app.update(msg_mapper(Msg::LocationFound(lat, lng))));
            orders.skip();
        }

        Msg::LocationFound(lat, lng) => {
            if let Some(viewer) = &mut model.viewer {
                viewer.map.show_user_location(Point::new(lat, lng));
            }
            orders.skip();
        }

        Msg::SaveView => {
            if let Some(viewer) = &model.viewer {
                viewer.map.save_view();
            }
            orders.skip();
        }

        Msg::PlannerMsg(msg) => {
            if let Some(viewer) = &model.viewer {
                planner::update(
                    msg,
                    &mut model.planner,
                    &viewer.map,
                    &mut orders.proxy(Msg::PlannerMsg),
                );
            }
        }
    }
}

/// Schedules one animation frame; each frame replaces the handle, exactly
/// as many frames run as the glides need.
fn request_glide_frame(model: &mut Model, orders: &mut impl Orders<Msg>) {
    let app = orders.clone_app();
    let msg_mapper = orders.msg_mapper();
    let callback = Closure::wrap(Box::new(move |_timestamp: f64| {
        app.update(msg_mapper(Msg::GlideFrame));
    }) as Box<dyn FnMut(f64)>);
    seed::util::window()
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .expect("request animation frame");
    model.glide_frame = Some(callback);
}

fn view(model: &Model) -> Node<Msg> {
    div![
        div![
            attrs! {At::Class => "map-controls"},
            button![
                attrs! {At::Class => "show-location-btn", At::Title => "Show my location"},
                "📍",
                ev(Ev::Click, |_| Msg::Locate),
            ],
        ],
        planner::view(&model.planner).map_msg(Msg::PlannerMsg),
    ]
}
