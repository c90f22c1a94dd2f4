//! Wire models for the backend's HTTP/JSON endpoints.

use serde::{Deserialize, Serialize};

pub type BusId = i64;
pub type RouteId = i64;
pub type StopId = i64;

/// One live vehicle from `GET /api/get_buses`. The feed is an unordered
/// snapshot; consecutive polls carry no ordering guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusPosition {
    pub id: BusId,
    pub lat: f64,
    pub lon: f64,
    /// Heading in degrees, applied to the marker without interpolation.
    pub bearing: f64,
    pub route_id: RouteId,
    pub route_short_name: String,
}

impl BusPosition {
    pub fn position(&self) -> geo::Point<f64> {
        geo::Point::new(self.lat, self.lon)
    }
}

/// Ordered path point from `GET /api/get_shape/{route_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapePoint {
    pub lat: f64,
    pub lon: f64,
}

/// Stop location from `GET /buses/get_stops_on_route/{route_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub stop_lat: f64,
    pub stop_lon: f64,
}

/// One line of `GET /stops/routes_stopping_at/{stop_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAtStop {
    pub route_short_name: String,
}

/// Upcoming departure from `GET /stops/{stop_id}`. `arrival_time` is
/// minutes from now; the endpoint returns an empty array when nothing
/// arrives within the next 60 minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopArrival {
    pub route_short_name: String,
    pub route_long_name: String,
    pub arrival_time: i64,
}

/// Static stop entry. The backend renders the full set into the host page
/// as a `stops` array, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub stop_id: StopId,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

impl Stop {
    pub fn position(&self) -> geo::Point<f64> {
        geo::Point::new(self.stop_lat, self.stop_lon)
    }
}

/// Body of `POST /api/make_route`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanRequest {
    pub origin: PlanEndpoint,
    pub destination: PlanEndpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanEndpoint {
    pub lat: f64,
    pub lng: f64,
}

/// One connection returned by the planner. The backend passes its trip
/// planner's graph edges through, hence the `node` wrapper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItineraryEdge {
    pub node: Itinerary,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Itinerary {
    /// ISO-8601 departure timestamp of the whole connection.
    #[serde(default)]
    pub start: Option<String>,
    /// ISO-8601 arrival timestamp of the whole connection.
    #[serde(default)]
    pub end: Option<String>,
    /// Missing legs mark an undrawable edge; processing skips it.
    #[serde(default)]
    pub legs: Option<Vec<Leg>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub mode: String,
    pub leg_geometry: LegGeometry,
    #[serde(default)]
    pub from: LegPlace,
    #[serde(default)]
    pub to: LegPlace,
    #[serde(default)]
    pub route: Option<LegRoute>,
}

/// Decoded polyline of a leg, `[lat, lon]` pairs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegGeometry {
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegPlace {
    #[serde(default)]
    pub arrival: Option<ScheduledCall>,
    #[serde(default)]
    pub departure: Option<ScheduledCall>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledCall {
    #[serde(default)]
    pub scheduled_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegRoute {
    #[serde(default)]
    pub short_name: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_test::{assert_de_tokens, Token};

    #[test]
    fn bus_position_fields() {
        assert_de_tokens(
            &BusPosition {
                id: 42,
                lat: 34.6786,
                lon: 33.0413,
                bearing: 90.,
                route_id: 7,
                route_short_name: "30".to_owned(),
            },
            &[
                Token::Struct { name: "BusPosition", len: 6 },
                Token::Str("id"),
                Token::I64(42),
                Token::Str("lat"),
                Token::F64(34.6786),
                Token::Str("lon"),
                Token::F64(33.0413),
                Token::Str("bearing"),
                Token::F64(90.),
                Token::Str("route_id"),
                Token::I64(7),
                Token::Str("route_short_name"),
                Token::Str("30"),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn itinerary_edge_from_json() {
        let payload = r#"{
            "node": {
                "start": "2025-04-02T10:00:00+03:00",
                "end": "2025-04-02T10:30:00+03:00",
                "legs": [{
                    "mode": "BUS",
                    "legGeometry": {"points": [[34.6, 33.0], [34.61, 33.01]]},
                    "from": {"departure": {"scheduledTime": "2025-04-02T10:05:00+03:00"}},
                    "to": {"arrival": {"scheduledTime": "2025-04-02T10:25:00+03:00"}},
                    "route": {"shortName": "30"}
                }]
            }
        }"#;
        let edge: ItineraryEdge = serde_json::from_str(payload).unwrap();
        let legs = edge.node.legs.as_ref().unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].mode, "BUS");
        assert_eq!(legs[0].leg_geometry.points[1], [34.61, 33.01]);
        assert_eq!(
            legs[0].route.as_ref().unwrap().short_name.as_deref(),
            Some("30")
        );
    }

    #[test]
    fn itinerary_edge_without_legs() {
        let payload = r#"{"node": {"start": null, "end": null}}"#;
        let edge: ItineraryEdge = serde_json::from_str(payload).unwrap();
        assert_eq!(edge.node.legs, None);
    }

    #[test]
    fn plan_request_payload() {
        let request = PlanRequest {
            origin: PlanEndpoint { lat: 34.68, lng: 33.04 },
            destination: PlanEndpoint { lat: 34.7, lng: 33.1 },
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"origin":{"lat":34.68,"lng":33.04},"destination":{"lat":34.7,"lng":33.1}}"#
        );
    }
}
