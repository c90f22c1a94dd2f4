//! Glide animation between consecutive snapshot positions.

use geo::Point;

/// How long a marker takes to glide to a freshly reported position.
pub const GLIDE_DURATION_MS: f64 = 1000.;

/// Per-marker animation state machine.
///
/// A glide captures the marker's position and the clock at [`begin`]; each
/// [`sample`] interpolates latitude and longitude independently and parks
/// the machine back at idle once the duration has elapsed. Beginning a new
/// glide while one is in flight bumps the generation and replaces the old
/// glide, so a frame scheduled against it can never write a stale position.
///
/// [`begin`]: Motion::begin
/// [`sample`]: Motion::sample
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    generation: u64,
    state: State,
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Idle,
    Gliding {
        from: Point<f64>,
        to: Point<f64>,
        started_at: f64,
    },
}

impl Default for Motion {
    fn default() -> Self {
        Motion {
            generation: 0,
            state: State::Idle,
        }
    }
}

impl Motion {
    pub fn begin(&mut self, from: Point<f64>, to: Point<f64>, now_ms: f64) {
        self.generation += 1;
        self.state = State::Gliding {
            from,
            to,
            started_at: now_ms,
        };
    }

    /// Position for this frame, or `None` when idle. Returns the target and
    /// goes idle once the glide has run its course.
    pub fn sample(&mut self, now_ms: f64) -> Option<Point<f64>> {
        match self.state {
            State::Idle => None,
            State::Gliding {
                from,
                to,
                started_at,
            } => {
                let t = ((now_ms - started_at) / GLIDE_DURATION_MS).min(1.);
                if t >= 1. {
                    self.state = State::Idle;
                    Some(to)
                } else {
                    Some(Point::new(
                        from.x() + (to.x() - from.x()) * t,
                        from.y() + (to.y() - from.y()) * t,
                    ))
                }
            }
        }
    }

    pub fn is_gliding(&self) -> bool {
        match self.state {
            State::Gliding { .. } => true,
            State::Idle => false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Where the marker is headed, if anywhere.
    pub fn target(&self) -> Option<Point<f64>> {
        match self.state {
            State::Idle => None,
            State::Gliding { to, .. } => Some(to),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Motion, GLIDE_DURATION_MS};
    use geo::Point;

    #[test]
    fn interpolates_linearly() {
        let mut motion = Motion::default();
        motion.begin(Point::new(34.6, 33.0), Point::new(34.7, 33.2), 1_000.);

        let halfway = motion.sample(1_000. + GLIDE_DURATION_MS / 2.).unwrap();
        assert!((halfway.x() - 34.65).abs() < 1e-9);
        assert!((halfway.y() - 33.1).abs() < 1e-9);
        assert!(motion.is_gliding());
    }

    #[test]
    fn lands_on_target_and_goes_idle() {
        let mut motion = Motion::default();
        motion.begin(Point::new(34.6, 33.0), Point::new(34.61, 33.01), 0.);

        assert_eq!(
            motion.sample(GLIDE_DURATION_MS),
            Some(Point::new(34.61, 33.01))
        );
        assert!(!motion.is_gliding());
        assert_eq!(motion.sample(GLIDE_DURATION_MS + 16.), None);
    }

    #[test]
    fn superseding_glide_bumps_generation_and_retargets() {
        let mut motion = Motion::default();
        motion.begin(Point::new(34.6, 33.0), Point::new(34.7, 33.1), 0.);
        let first = motion.generation();

        motion.begin(Point::new(34.65, 33.05), Point::new(34.8, 33.2), 500.);
        assert_eq!(motion.generation(), first + 1);
        assert_eq!(motion.target(), Some(Point::new(34.8, 33.2)));

        // the old glide is gone, the sample lies on the new segment
        let sample = motion.sample(500. + GLIDE_DURATION_MS / 2.).unwrap();
        assert!((sample.x() - 34.725).abs() < 1e-9);
        assert!((sample.y() - 33.125).abs() < 1e-9);
    }

    #[test]
    fn idle_until_begun() {
        let mut motion = Motion::default();
        assert_eq!(motion.sample(123.), None);
        assert!(!motion.is_gliding());
        assert_eq!(motion.target(), None);
    }
}
