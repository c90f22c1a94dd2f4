//! Diffing one poll's snapshot against the tracked marker set.

use crate::api::{BusId, BusPosition};
use crate::registry::{MarkerRegistry, MarkerVisual};

/// Applies a fresh snapshot: upserts every listed bus, then drops markers
/// for ids the snapshot no longer carries. Returns the detached visuals so
/// the caller can remove them from the map layer.
///
/// Creation does not trigger a visibility pass; a marker born outside the
/// current policy stays hidden until the next viewport event re-evaluates
/// the set.
pub fn reconcile<M, F>(
    registry: &mut MarkerRegistry<M>,
    snapshot: &[BusPosition],
    now_ms: f64,
    mut create: F,
) -> Vec<M>
where
    M: MarkerVisual,
    F: FnMut(&BusPosition) -> M,
{
    let mut seen: Vec<BusId> = Vec::with_capacity(snapshot.len());
    for bus in snapshot {
        seen.push(bus.id);
        registry.upsert(bus, now_ms, &mut create);
    }
    seen.sort_unstable();
    registry.remove_missing(&seen)
}

#[cfg(test)]
mod test {
    use super::reconcile;
    use crate::api::BusPosition;
    use crate::motion::GLIDE_DURATION_MS;
    use crate::registry::{MarkerRegistry, MarkerVisual};
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

    fn ids(registry: &MarkerRegistry<FakeMarker>) -> Vec<i64> {
        let mut ids: Vec<i64> = registry.ids().collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn registry_mirrors_each_snapshot() {
        let mut registry = MarkerRegistry::default();

        reconcile(&mut registry, &[bus(3, 34.6, 33.0, 0.), bus(1, 34.7, 33.1, 0.)], 0., fake);
        assert_eq!(ids(&registry), vec![1, 3]);

        reconcile(&mut registry, &[bus(2, 34.6, 33.0, 0.), bus(3, 34.6, 33.0, 0.)], 0., fake);
        assert_eq!(ids(&registry), vec![2, 3]);

        // feeding the same snapshot twice never duplicates
        reconcile(&mut registry, &[bus(2, 34.6, 33.0, 0.), bus(3, 34.6, 33.0, 0.)], 0., fake);
        assert_eq!(ids(&registry), vec![2, 3]);
    }

    #[test]
    fn update_then_disappear() {
        let mut registry = MarkerRegistry::default();

        reconcile(&mut registry, &[bus(1, 34.6, 33.0, 90.)], 0., fake);
        assert_eq!(registry.len(), 1);

        let removed = reconcile(&mut registry, &[bus(1, 34.61, 33.01, 95.)], 0., fake);
        assert!(removed.is_empty());
        assert_eq!(registry.len(), 1);
        let tracked = registry.get(1).unwrap();
        assert_eq!(tracked.visual.bearing, 95.);
        assert_eq!(tracked.motion.target(), Some(Point::new(34.61, 33.01)));

        let removed = reconcile(&mut registry, &[], 0., fake);
        assert_eq!(removed.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn moved_bus_glides_to_its_new_position() {
        let mut registry = MarkerRegistry::default();
        reconcile(&mut registry, &[bus(1, 34.6, 33.0, 90.)], 0., fake);
        reconcile(&mut registry, &[bus(1, 34.61, 33.01, 90.)], 0., fake);

        registry.animate(GLIDE_DURATION_MS);
        assert_eq!(
            registry.get(1).unwrap().visual.position,
            Point::new(34.61, 33.01)
        );
    }

    #[test]
    fn removal_returns_the_detached_visuals() {
        let mut registry = MarkerRegistry::default();
        reconcile(
            &mut registry,
            &[bus(5, 34.6, 33.0, 0.), bus(8, 34.7, 33.1, 0.)],
            0.,
            fake,
        );

        let removed = reconcile(&mut registry, &[bus(8, 34.7, 33.1, 0.)], 0., fake);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].position, Point::new(34.6, 33.0));
    }
}
