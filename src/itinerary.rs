//! Summarising planner responses for the itinerary bars.

use std::fmt;

use chrono::NaiveDateTime;

use crate::api::{Itinerary, Leg, LegPlace};

/// How many itineraries are drawn and summarised out of a planner response.
pub const MAX_ITINERARIES: usize = 3;

/// What one summary bar shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ItinerarySummary {
    /// Departure clock label, `HH:MM` or `??:??` when the planner omitted it.
    pub depart: String,
    pub arrive: String,
    pub total_minutes: i64,
    pub legs: Vec<LegSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegSummary {
    Walk { minutes: i64 },
    Bus { route: String, minutes: i64 },
    Other { mode: String, minutes: i64 },
}

#[derive(Debug, PartialEq)]
pub enum SummaryError {
    /// The planner returned an edge without legs; the edge is undrawable.
    MissingLegs,
}

impl fmt::Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryError::MissingLegs => f.write_str("itinerary edge has no legs"),
        }
    }
}

impl std::error::Error for SummaryError {}

/// Summarises one planner edge. Callers log the error and skip the edge,
/// leaving already-rendered itineraries untouched.
pub fn summarize(itinerary: &Itinerary) -> Result<ItinerarySummary, SummaryError> {
    let legs = itinerary.legs.as_ref().ok_or(SummaryError::MissingLegs)?;
    Ok(ItinerarySummary {
        depart: clock_label(itinerary.start.as_deref()),
        arrive: clock_label(itinerary.end.as_deref()),
        total_minutes: minutes_between(itinerary.start.as_deref(), itinerary.end.as_deref())
            .unwrap_or(0),
        legs: legs.iter().map(|leg| summarize_leg(leg, itinerary)).collect(),
    })
}

fn summarize_leg(leg: &Leg, itinerary: &Itinerary) -> LegSummary {
    // a leg missing its own scheduled times falls back to the bounds of the
    // whole connection
    let start = scheduled(&leg.from).or_else(|| itinerary.start.as_deref());
    let end = scheduled(&leg.to).or_else(|| itinerary.end.as_deref());
    let minutes = minutes_between(start, end).unwrap_or(0);

    match leg.mode.as_str() {
        "WALK" => LegSummary::Walk { minutes },
        "BUS" => LegSummary::Bus {
            route: leg
                .route
                .as_ref()
                .and_then(|route| route.short_name.clone())
                .unwrap_or_else(|| "Bus".to_owned()),
            minutes,
        },
        _ => LegSummary::Other {
            mode: leg.mode.clone(),
            minutes,
        },
    }
}

fn scheduled(place: &LegPlace) -> Option<&str> {
    place
        .arrival
        .as_ref()
        .and_then(|call| call.scheduled_time.as_deref())
        .or_else(|| {
            place
                .departure
                .as_ref()
                .and_then(|call| call.scheduled_time.as_deref())
        })
}

fn clock_label(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(parse_iso)
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_else(|| "??:??".to_owned())
}

/// Wall-clock time as the planner's timezone sees it. The feed's timestamps
/// all carry the same offset, so differences stay exact.
fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|time| time.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
}

fn minutes_between(start: Option<&str>, end: Option<&str>) -> Option<i64> {
    let start = parse_iso(start?)?;
    let end = parse_iso(end?)?;
    let millis = (end - start).num_milliseconds();
    Some((millis as f64 / 60_000.).round() as i64)
}

#[cfg(test)]
mod test {
    use super::{summarize, LegSummary, SummaryError};
    use crate::api::{Itinerary, Leg, LegGeometry, LegPlace, LegRoute, ScheduledCall};

    fn call(timestamp: &str) -> Option<ScheduledCall> {
        Some(ScheduledCall {
            scheduled_time: Some(timestamp.to_owned()),
        })
    }

    fn leg(mode: &str, from: LegPlace, to: LegPlace, route: Option<&str>) -> Leg {
        Leg {
            mode: mode.to_owned(),
            leg_geometry: LegGeometry {
                points: vec![[34.6, 33.0], [34.61, 33.01]],
            },
            from,
            to,
            route: route.map(|short_name| LegRoute {
                short_name: Some(short_name.to_owned()),
            }),
        }
    }

    #[test]
    fn walk_then_bus() {
        let itinerary = Itinerary {
            start: Some("2025-04-02T10:00:00+03:00".to_owned()),
            end: Some("2025-04-02T10:30:00+03:00".to_owned()),
            legs: Some(vec![
                leg(
                    "WALK",
                    LegPlace {
                        departure: call("2025-04-02T10:00:00+03:00"),
                        arrival: None,
                    },
                    LegPlace {
                        arrival: call("2025-04-02T10:07:00+03:00"),
                        departure: None,
                    },
                    None,
                ),
                leg(
                    "BUS",
                    LegPlace {
                        departure: call("2025-04-02T10:07:00+03:00"),
                        arrival: None,
                    },
                    LegPlace {
                        arrival: call("2025-04-02T10:30:00+03:00"),
                        departure: None,
                    },
                    Some("30"),
                ),
            ]),
        };

        let summary = summarize(&itinerary).unwrap();
        assert_eq!(summary.depart, "10:00");
        assert_eq!(summary.arrive, "10:30");
        assert_eq!(summary.total_minutes, 30);
        assert_eq!(
            summary.legs,
            vec![
                LegSummary::Walk { minutes: 7 },
                LegSummary::Bus {
                    route: "30".to_owned(),
                    minutes: 23
                },
            ]
        );
    }

    #[test]
    fn missing_legs_is_an_error() {
        let itinerary = Itinerary {
            start: None,
            end: None,
            legs: None,
        };
        assert_eq!(summarize(&itinerary), Err(SummaryError::MissingLegs));
    }

    #[test]
    fn leg_times_fall_back_to_connection_bounds() {
        let itinerary = Itinerary {
            start: Some("2025-04-02T10:00:00+03:00".to_owned()),
            end: Some("2025-04-02T10:12:00+03:00".to_owned()),
            legs: Some(vec![leg(
                "WALK",
                LegPlace::default(),
                LegPlace::default(),
                None,
            )]),
        };

        let summary = summarize(&itinerary).unwrap();
        assert_eq!(summary.legs, vec![LegSummary::Walk { minutes: 12 }]);
    }

    #[test]
    fn unparseable_times_render_placeholders() {
        let itinerary = Itinerary {
            start: None,
            end: Some("whenever".to_owned()),
            legs: Some(vec![leg(
                "FERRY",
                LegPlace::default(),
                LegPlace::default(),
                None,
            )]),
        };

        let summary = summarize(&itinerary).unwrap();
        assert_eq!(summary.depart, "??:??");
        assert_eq!(summary.arrive, "??:??");
        assert_eq!(summary.total_minutes, 0);
        assert_eq!(
            summary.legs,
            vec![LegSummary::Other {
                mode: "FERRY".to_owned(),
                minutes: 0
            }]
        );
    }

    #[test]
    fn accepts_bare_timestamps() {
        let itinerary = Itinerary {
            start: Some("2025-04-02T10:00:00".to_owned()),
            end: Some("2025-04-02T10:45:00".to_owned()),
            legs: Some(vec![]),
        };
        let summary = summarize(&itinerary).unwrap();
        assert_eq!(summary.depart, "10:00");
        assert_eq!(summary.total_minutes, 45);
    }
}
