//! Ray lifecycle: birth, propagation, steady, vanishing, extinction
//!
//! A timed ray grows from source to destination during the first
//! `propagation_time_factor` of its life and erodes from source to
//! destination after `vanishing_time_factor`. Eternal root rays are always
//! drawn in full; their branches still follow the timed rules.

use crate::segment::Segment;

/// Visibility state of a ray for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum RayState {
    /// Constructed, no update yet
    #[default]
    Initialized,
    /// Birth time not reached
    Unborn,
    /// Growing towards the destination
    Propagating,
    /// Fully drawn
    Steady,
    /// Eroding towards the destination
    Vanishing,
    /// Death time passed
    Extinguished,
}

impl RayState {
    /// True for the states in which a mesh is produced
    pub fn is_active(self) -> bool {
        matches!(self, Self::Propagating | Self::Steady | Self::Vanishing)
    }
}

/// Birth/death times with the derived phase boundaries
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RayTiming {
    pub birth_time: f32,
    pub death_time: f32,
    /// `lerp(birth, death, propagation_time_factor)`
    pub end_propagation_time: f32,
    /// `lerp(death, birth, 1 - vanishing_time_factor)`
    pub begin_vanishing_time: f32,
    pub propagation_time_factor: f32,
    pub vanishing_time_factor: f32,
}

impl RayTiming {
    pub fn new(
        birth_time: f32,
        death_time: f32,
        propagation_time_factor: f32,
        vanishing_time_factor: f32,
    ) -> Self {
        let mut timing = Self {
            birth_time,
            death_time,
            end_propagation_time: 0.0,
            begin_vanishing_time: 0.0,
            propagation_time_factor,
            vanishing_time_factor,
        };
        timing.recompute();
        timing
    }

    /// Refresh the phase boundaries after birth or death moved
    pub fn recompute(&mut self) {
        self.end_propagation_time = lerp(
            self.birth_time,
            self.death_time,
            self.propagation_time_factor,
        );
        self.begin_vanishing_time = lerp(
            self.death_time,
            self.birth_time,
            1.0 - self.vanishing_time_factor,
        );
    }

    /// True when `time` lies in `[birth, death]`
    pub fn is_alive_at(&self, time: f32) -> bool {
        self.birth_time <= time && time <= self.death_time
    }

    /// Elapsed share of the lifetime; 1 for zero-length lifetimes
    pub fn fraction_at(&self, time: f32) -> f32 {
        let span = self.death_time - self.birth_time;
        if span > 0.0 {
            (time - self.birth_time) / span
        } else {
            1.0
        }
    }

    /// State of an active ray at `time`
    pub fn active_state(&self, time: f32) -> RayState {
        if time < self.end_propagation_time {
            RayState::Propagating
        } else if time > self.begin_vanishing_time {
            RayState::Vanishing
        } else {
            RayState::Steady
        }
    }
}

/// Frame classification of a root ray: state plus visibility
pub fn classify(is_eternal: bool, timing: &RayTiming, time: f32) -> (RayState, bool) {
    if is_eternal || timing.is_alive_at(time) {
        (timing.active_state(time), true)
    } else if time < timing.birth_time {
        (RayState::Unborn, false)
    } else {
        (RayState::Extinguished, false)
    }
}

/// What a leaf segment contributes this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentAction {
    /// Emit a prism for the segment
    pub draw: bool,
    /// Let the segment spawn a branch
    pub spawn: bool,
}

impl SegmentAction {
    const NONE: Self = Self {
        draw: false,
        spawn: false,
    };
    const ALL: Self = Self {
        draw: true,
        spawn: true,
    };
}

/// Growth and erosion gating for one leaf segment
///
/// `time_fraction` is the subray's [`RayTiming::fraction_at`] for `time`.
/// `always_full` marks an eternal root ray, which is drawn at any time.
/// Eroded segments keep spawning so branches outlive the trunk piece they
/// grew from.
pub fn segment_action(
    timing: &RayTiming,
    always_full: bool,
    segment: &Segment,
    time: f32,
    time_fraction: f32,
) -> SegmentAction {
    if always_full {
        SegmentAction::ALL
    } else if time < timing.birth_time {
        SegmentAction::NONE
    } else if time < timing.end_propagation_time {
        if time_fraction >= segment.fraction0 * timing.propagation_time_factor {
            SegmentAction::ALL
        } else {
            SegmentAction::NONE
        }
    } else if time < timing.begin_vanishing_time {
        SegmentAction::ALL
    } else {
        let vanishing = timing.vanishing_time_factor;
        SegmentAction {
            draw: time_fraction <= vanishing + segment.fraction1 * (1.0 - vanishing),
            spawn: true,
        }
    }
}

#[inline]
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> RayTiming {
        RayTiming::new(0.0, 1.0, 0.1, 0.9)
    }

    fn segment(fraction0: f32, fraction1: f32) -> Segment {
        Segment {
            fraction0,
            fraction1,
            ..Default::default()
        }
    }

    #[test]
    fn test_phase_boundaries() {
        let t = timing();
        assert!((t.end_propagation_time - 0.1).abs() < 1e-6);
        assert!((t.begin_vanishing_time - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_classify_timed() {
        let t = timing();
        assert_eq!(classify(false, &t, 0.05), (RayState::Propagating, true));
        assert_eq!(classify(false, &t, 0.5), (RayState::Steady, true));
        assert_eq!(classify(false, &t, 0.95), (RayState::Vanishing, true));
        assert_eq!(classify(false, &t, 1.5), (RayState::Extinguished, false));
        assert_eq!(classify(false, &t, -0.1), (RayState::Unborn, false));
    }

    #[test]
    fn test_classify_eternal_is_always_active() {
        let t = timing();
        for time in [-100.0, -0.1, 0.0, 0.5, 1.0, 7.0, 1e6] {
            let (state, visible) = classify(true, &t, time);
            assert!(visible);
            assert!(state.is_active());
        }
    }

    #[test]
    fn test_fraction_of_instant_lifetime() {
        let t = RayTiming::new(2.0, 2.0, 0.1, 0.9);
        assert_eq!(t.fraction_at(2.0), 1.0);
    }

    #[test]
    fn test_propagation_reveals_from_source() {
        let t = timing();
        let near = segment(0.0, 0.1);
        let far = segment(0.9, 1.0);
        let time = 0.05;
        let fraction = t.fraction_at(time);
        assert!(segment_action(&t, false, &near, time, fraction).draw);
        assert!(!segment_action(&t, false, &far, time, fraction).draw);
        assert!(!segment_action(&t, false, &far, time, fraction).spawn);
    }

    #[test]
    fn test_vanishing_erodes_from_source() {
        let t = timing();
        let near = segment(0.0, 0.1);
        let far = segment(0.9, 1.0);
        let time = 0.97;
        let fraction = t.fraction_at(time);
        let near_action = segment_action(&t, false, &near, time, fraction);
        assert!(!near_action.draw);
        assert!(near_action.spawn);
        assert!(segment_action(&t, false, &far, time, fraction).draw);
    }

    #[test]
    fn test_always_full_overrides_gating() {
        let t = timing();
        let far = segment(0.9, 1.0);
        let action = segment_action(&t, true, &far, 0.01, t.fraction_at(0.01));
        assert_eq!(action, SegmentAction::ALL);
    }

    #[test]
    fn test_before_birth_does_nothing() {
        let t = timing();
        let action = segment_action(&t, false, &segment(0.0, 1.0), -1.0, -1.0);
        assert_eq!(action, SegmentAction::NONE);

        let action = segment_action(&t, true, &segment(0.0, 1.0), -1.0, -1.0);
        assert_eq!(action, SegmentAction::ALL);
    }
}
