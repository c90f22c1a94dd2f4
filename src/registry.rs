//! Tracked marker set, one entry per currently-known bus.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use geo::Point;

use crate::api::{BusId, BusPosition};
use crate::motion::Motion;

/// Handle to an on-screen marker. The map library sits behind this seam;
/// tests substitute a plain struct.
pub trait MarkerVisual {
    fn position(&self) -> Point<f64>;
    fn set_position(&mut self, position: Point<f64>);
    /// Applied immediately on every update, never interpolated.
    fn set_bearing(&mut self, degrees: f64);
}

pub struct Tracked<M> {
    pub visual: M,
    pub motion: Motion,
}

/// Mapping from bus id to its marker. Holds exactly one entry per id seen
/// in the most recent snapshot.
pub struct MarkerRegistry<M> {
    entries: HashMap<BusId, Tracked<M>>,
}

impl<M> Default for MarkerRegistry<M> {
    fn default() -> Self {
        MarkerRegistry {
            entries: HashMap::new(),
        }
    }
}

impl<M> MarkerRegistry<M> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: BusId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: BusId) -> Option<&Tracked<M>> {
        self.entries.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = BusId> + '_ {
        self.entries.keys().copied()
    }

    pub fn visuals(&self) -> impl Iterator<Item = &M> {
        self.entries.values().map(|tracked| &tracked.visual)
    }
}

impl<M: MarkerVisual> MarkerRegistry<M> {
    /// Creates the marker on first sighting, otherwise rotates it in place
    /// and starts a glide from where it currently is to the new position.
    pub fn upsert(
        &mut self,
        bus: &BusPosition,
        now_ms: f64,
        create: impl FnOnce(&BusPosition) -> M,
    ) {
        match self.entries.entry(bus.id) {
            Entry::Occupied(mut entry) => {
                let tracked = entry.get_mut();
                tracked.visual.set_bearing(bus.bearing);
                let from = tracked.visual.position();
                tracked.motion.begin(from, bus.position(), now_ms);
            }
            Entry::Vacant(entry) => {
                entry.insert(Tracked {
                    visual: create(bus),
                    motion: Motion::default(),
                });
            }
        }
    }

    /// Removes every entry whose id is not in `seen`, returning the detached
    /// visuals so the caller can drop them from the map layer. `seen` must
    /// be sorted ascending.
    pub fn remove_missing(&mut self, seen: &[BusId]) -> Vec<M> {
        let stale: Vec<BusId> = self
            .entries
            .keys()
            .copied()
            .filter(|id| !binary_search(seen, *id))
            .collect();
        let mut removed = Vec::with_capacity(stale.len());
        for id in stale {
            if let Some(tracked) = self.entries.remove(&id) {
                removed.push(tracked.visual);
            }
        }
        removed
    }

    /// Advances every in-flight glide, writing the interpolated positions to
    /// the visuals. Returns true while any marker is still gliding, so the
    /// frame driver knows whether to schedule another frame.
    pub fn animate(&mut self, now_ms: f64) -> bool {
        let mut gliding = false;
        for tracked in self.entries.values_mut() {
            if let Some(position) = tracked.motion.sample(now_ms) {
                tracked.visual.set_position(position);
                gliding |= tracked.motion.is_gliding();
            }
        }
        gliding
    }
}

/// Membership test against an ascending id list.
pub fn binary_search(sorted: &[BusId], target: BusId) -> bool {
    let mut left = 0;
    let mut right = sorted.len();
    while left < right {
        let mid = (left + right) / 2;
        if sorted[mid] == target {
            return true;
        }
        if sorted[mid] < target {
            left = mid + 1;
        } else {
            right = mid;
        }
    }
    false
}

#[cfg(test)]
mod test {
    use super::{binary_search, MarkerRegistry, MarkerVisual};
    use crate::api::BusPosition;
    use geo::Point;

    #[derive(Debug, PartialEq)]
    struct FakeMarker {
        position: Point<f64>,
        bearing: f64,
    }

    impl MarkerVisual for FakeMarker {
        fn position(&self) -> Point<f64> {
            self.position
        }

        fn set_position(&mut self, position: Point<f64>) {
            self.position = position;
        }

        fn set_bearing(&mut self, degrees: f64) {
            self.bearing = degrees;
        }
    }

    fn bus(id: i64, lat: f64, lon: f64, bearing: f64) -> BusPosition {
        BusPosition {
            id,
            lat,
            lon,
            bearing,
            route_id: 7,
            route_short_name: "30".to_owned(),
        }
    }

    fn fake(bus: &BusPosition) -> FakeMarker {
        FakeMarker {
            position: bus.position(),
            bearing: bus.bearing,
        }
    }

    #[test]
    fn upsert_creates_then_mutates() {
        let mut registry = MarkerRegistry::default();
        registry.upsert(&bus(1, 34.6, 33.0, 90.), 0., fake);
        assert_eq!(registry.len(), 1);

        registry.upsert(&bus(1, 34.61, 33.01, 95.), 0., fake);
        assert_eq!(registry.len(), 1);
        let tracked = registry.get(1).unwrap();
        assert_eq!(tracked.visual.bearing, 95.);
        // position change goes through the glide, not a teleport
        assert_eq!(tracked.visual.position, Point::new(34.6, 33.0));
        assert_eq!(tracked.motion.target(), Some(Point::new(34.61, 33.01)));
    }

    #[test]
    fn remove_missing_keeps_only_seen() {
        let mut registry = MarkerRegistry::default();
        for id in &[1, 2, 3, 4] {
            registry.upsert(&bus(*id, 34.6, 33.0, 0.), 0., fake);
        }

        let removed = registry.remove_missing(&[2, 4]);
        assert_eq!(removed.len(), 2);
        assert!(!registry.contains(1));
        assert!(registry.contains(2));
        assert!(!registry.contains(3));
        assert!(registry.contains(4));
    }

    #[test]
    fn animate_moves_markers_and_reports_completion() {
        let mut registry = MarkerRegistry::default();
        registry.upsert(&bus(1, 34.6, 33.0, 90.), 0., fake);
        registry.upsert(&bus(1, 34.61, 33.01, 90.), 0., fake);

        assert!(registry.animate(500.));
        let midway = registry.get(1).unwrap().visual.position;
        assert!(midway.x() > 34.6 && midway.x() < 34.61);

        assert!(!registry.animate(1_000.));
        assert_eq!(
            registry.get(1).unwrap().visual.position,
            Point::new(34.61, 33.01)
        );
    }

    #[test]
    fn binary_search_hits_and_misses() {
        assert!(binary_search(&[1, 3, 5, 9], 5));
        assert!(!binary_search(&[1, 3, 5, 9], 4));
        assert!(binary_search(&[1, 3, 5, 9], 1));
        assert!(binary_search(&[1, 3, 5, 9], 9));
        assert!(!binary_search(&[], 1));
    }
}
