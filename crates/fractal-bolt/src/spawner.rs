//! Branch policy: when a leaf segment grows a child subray, and where it goes
//!
//! Every leaf segment handed to the visitor is offered to a
//! [`SubrayStrategy`]. The strategy first decides whether a child is born and
//! with which seed and lifetime, then places the new subray. Both hooks have
//! default implementations, so a host only overrides what it needs.

use crate::lifecycle::{RayTiming, lerp};
use crate::params::RayParameters;
use crate::rng::RandomGenerator;
use crate::segment::Segment;
use crate::subray::Subray;
use glam::Vec3;
use std::f32::consts::TAU;

/// Everything a spawn decision may look at for one leaf segment
#[derive(Debug)]
pub struct SpawnContext<'a> {
    pub rng: &'a mut RandomGenerator,
    pub params: &'a RayParameters,
    /// Time of the frame being generated
    pub time: f32,
    /// Subray owning the segment
    pub parent: &'a Subray,
    /// Branch probability per leaf segment for the parent's depth
    pub subray_probability: f32,
    /// Subrays allocated so far this frame, the root included
    pub subray_count: usize,
    /// Capacity of the subray pool
    pub max_subrays: usize,
}

/// A positive spawn decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnDecision {
    /// Random cursor of the child, as a table fraction (wraps)
    pub seed: f32,
    pub birth_time: f32,
    pub death_time: f32,
}

/// Shape of the region a child's endpoint is sampled from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementFactors {
    /// Spread of the endpoint along the parent axis
    pub height_factor: f32,
    /// Lateral reach relative to the distance along the parent
    pub side_width_factor: f32,
    /// Smallest lateral reach, as a share of the full reach
    pub min_side_width_factor: f32,
}

impl Default for PlacementFactors {
    fn default() -> Self {
        Self {
            height_factor: 0.5,
            side_width_factor: 0.6,
            min_side_width_factor: 0.2,
        }
    }
}

/// Pluggable branch policy
///
/// Implementations must draw randomness only from the supplied generator so
/// that generation stays reproducible.
pub trait SubrayStrategy {
    /// Decide whether `segment` spawns a child this frame
    fn decide_subray_creation(
        &mut self,
        segment: &Segment,
        ctx: &mut SpawnContext<'_>,
    ) -> Option<SpawnDecision> {
        default_decide(segment, ctx)
    }

    /// Place a freshly created child; `rng` is positioned at the child's seed
    fn on_subray_creation(
        &mut self,
        segment: &Segment,
        parent: &Subray,
        child: &mut Subray,
        rng: &mut RandomGenerator,
    ) {
        subray_cylinder_position(segment, parent, child, PlacementFactors::default(), rng);
    }
}

/// Periodic branching with children placed in a cylinder around the parent
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSubrayStrategy;

impl SubrayStrategy for DefaultSubrayStrategy {}

/// Periodic branching with children placed in a forward-facing cone
#[derive(Debug, Clone, Copy, Default)]
pub struct ConeSubrayStrategy {
    pub factors: PlacementFactors,
}

impl SubrayStrategy for ConeSubrayStrategy {
    fn on_subray_creation(
        &mut self,
        segment: &Segment,
        parent: &Subray,
        child: &mut Subray,
        rng: &mut RandomGenerator,
    ) {
        subray_cone_position(segment, parent, child, self.factors, rng);
    }
}

/// Default spawn rule
///
/// Each segment gets a phase offset along the parent's propagation front and
/// a random shift within one period. A child may only be born while that
/// phase sits inside the duty window; its lifetime is the rest of the window.
pub fn default_decide(segment: &Segment, ctx: &mut SpawnContext<'_>) -> Option<SpawnDecision> {
    let parent = ctx.parent;
    let params = ctx.params;
    let period = params.subray_period;

    let phase0 = if params.is_eternal && parent.recursion == 0 {
        -ctx.rng.random() * period
    } else {
        lerp(
            parent.timing.birth_time,
            parent.timing.end_propagation_time,
            segment.fraction0,
        ) - ctx.rng.random() * period
    };

    let phase = ctx.time - phase0;
    let cycle = (phase / period).floor();
    let seed = ctx.rng.random() * (cycle + 1.0);
    let active = phase.rem_euclid(period) <= params.subray_duty_cycle * period;
    let probability = if active { ctx.subray_probability } else { 0.0 };

    let may_spawn = parent.recursion < params.max_subray_recursion
        && ctx.subray_count < ctx.max_subrays;
    if !may_spawn || ctx.rng.random() >= probability {
        return None;
    }

    let mut birth_time = phase0 + cycle * period;
    let mut death_time = birth_time + period * params.subray_duty_cycle;
    if !params.is_eternal && parent.recursion == 0 {
        birth_time = birth_time.max(parent.timing.birth_time);
        death_time = death_time.min(parent.timing.death_time);
    }

    Some(SpawnDecision {
        seed,
        birth_time,
        death_time,
    })
}

/// Endpoint sampled around the parent axis, up to half a length either way
pub fn subray_cylinder_position(
    segment: &Segment,
    parent: &Subray,
    child: &mut Subray,
    factors: PlacementFactors,
    rng: &mut RandomGenerator,
) {
    let along = segment.fraction0
        + (1.0 - segment.fraction0) * ((rng.random() - 0.5) * factors.height_factor);
    place_endpoint(segment, parent, child, along, factors, rng);
}

/// Endpoint sampled ahead of the segment only
pub fn subray_cone_position(
    segment: &Segment,
    parent: &Subray,
    child: &mut Subray,
    factors: PlacementFactors,
    rng: &mut RandomGenerator,
) {
    let along =
        segment.fraction0 + (1.0 - segment.fraction0) * (rng.random() * factors.height_factor);
    place_endpoint(segment, parent, child, along, factors, rng);
}

fn place_endpoint(
    segment: &Segment,
    parent: &Subray,
    child: &mut Subray,
    along: f32,
    factors: PlacementFactors,
    rng: &mut RandomGenerator,
) {
    child.pos0 = segment.pos0;

    let span = parent.pos1 - parent.pos0;
    let axis = span * along;
    let reach = axis.length();

    let side = parent.up0.cross(span.normalize_or_zero());
    let angle = TAU * rng.random();
    let lateral = side * angle.cos() + parent.up0 * angle.sin();
    let width = reach
        * factors.side_width_factor
        * (factors.min_side_width_factor + rng.random() * (1.0 - factors.min_side_width_factor));

    child.pos1 = lateral * width + axis + parent.pos0;
}

/// Offer `segment` to the strategy and build the child it asks for
///
/// The generator's cursor is the same before and after the call, whether or
/// not a child was created, apart from the draws the decision itself made.
pub(crate) fn try_spawn(
    strategy: &mut dyn SubrayStrategy,
    segment: &Segment,
    ctx: &mut SpawnContext<'_>,
) -> Option<Subray> {
    let decision = strategy.decide_subray_creation(segment, ctx)?;
    let parent = ctx.parent;
    let params = ctx.params;

    let saved = ctx.rng.save();
    ctx.rng.set_seed(decision.seed);

    let mut child = Subray {
        pos0: segment.pos0,
        pos1: segment.pos1,
        lin_pos0: Vec3::ZERO,
        lin_pos1: Vec3::ZERO,
        up0: parent.up0,
        up1: parent.up1,
        radius0: (segment.radius0 * params.radius0_factor).max(params.min_radius),
        radius1: (segment.radius1 * params.radius1_factor).max(params.min_radius),
        timing: RayTiming::new(
            decision.birth_time,
            decision.death_time,
            parent.timing.propagation_time_factor,
            parent.timing.vanishing_time_factor,
        ),
        time_scale: parent.time_scale * 2.0,
        roughness: parent.roughness,
        straightness: parent.straightness,
        seed: decision.seed,
        recursion: parent.recursion + 1,
        // The segment pool is sized for the root's depth
        max_iterations: parent
            .max_iterations
            .saturating_sub(1)
            .max(1)
            .min(params.max_iterations),
    };

    strategy.on_subray_creation(segment, parent, &mut child, ctx.rng);
    ctx.rng.restore(saved);

    Some(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent(params: &RayParameters) -> Subray {
        Subray::root(params)
    }

    fn segment_of(subray: &Subray, fraction0: f32) -> Segment {
        let mut segment = Segment::root(subray);
        segment.fraction0 = fraction0;
        segment.fraction1 = (fraction0 + 0.1).min(1.0);
        segment.pos0 = subray.pos0.lerp(subray.pos1, fraction0);
        segment.pos1 = subray.pos0.lerp(subray.pos1, segment.fraction1);
        segment
    }

    fn always_spawn() -> RayParameters {
        RayParameters::default().with_subray_cycle(4.0, 1.0)
    }

    #[test]
    fn test_always_active_cycle_spawns() {
        let params = always_spawn();
        let root = parent(&params);
        let segment = segment_of(&root, 0.5);
        let mut rng = RandomGenerator::new();
        let mut ctx = SpawnContext {
            rng: &mut rng,
            params: &params,
            time: 2.0,
            parent: &root,
            subray_probability: 1.0,
            subray_count: 1,
            max_subrays: params.max_subrays(),
        };

        let decision = default_decide(&segment, &mut ctx).unwrap();
        assert!(decision.death_time >= decision.birth_time);
        assert!((decision.death_time - decision.birth_time - 4.0).abs() < 1e-5);
        assert!(decision.birth_time <= 2.0 && 2.0 < decision.birth_time + 4.0);
    }

    #[test]
    fn test_zero_probability_never_spawns() {
        let params = always_spawn();
        let root = parent(&params);
        let mut rng = RandomGenerator::new();
        for i in 0..50 {
            let segment = segment_of(&root, i as f32 / 50.0);
            let mut ctx = SpawnContext {
                rng: &mut rng,
                params: &params,
                time: i as f32 * 0.37,
                parent: &root,
                subray_probability: 0.0,
                subray_count: 1,
                max_subrays: 26,
            };
            assert_eq!(default_decide(&segment, &mut ctx), None);
        }
    }

    #[test]
    fn test_limits_block_spawning() {
        let params = always_spawn();
        let mut deep = parent(&params);
        deep.recursion = params.max_subray_recursion;
        let segment = segment_of(&deep, 0.2);
        let mut rng = RandomGenerator::new();

        let mut ctx = SpawnContext {
            rng: &mut rng,
            params: &params,
            time: 1.0,
            parent: &deep,
            subray_probability: 1.0,
            subray_count: 1,
            max_subrays: 26,
        };
        assert_eq!(default_decide(&segment, &mut ctx), None);

        let root = parent(&params);
        ctx.parent = &root;
        ctx.subray_count = 26;
        assert_eq!(default_decide(&segment, &mut ctx), None);
    }

    #[test]
    fn test_timed_root_clamps_child_lifetime() {
        let params = always_spawn().with_lifetime(1.0, 2.0);
        let root = parent(&params);
        let mut rng = RandomGenerator::new();
        for i in 0..20 {
            let segment = segment_of(&root, i as f32 / 20.0);
            let mut ctx = SpawnContext {
                rng: &mut rng,
                params: &params,
                time: 1.5,
                parent: &root,
                subray_probability: 1.0,
                subray_count: 1,
                max_subrays: 26,
            };
            let decision = default_decide(&segment, &mut ctx).unwrap();
            assert!(decision.birth_time >= 1.0);
            assert!(decision.death_time <= 2.0);
        }
    }

    #[test]
    fn test_try_spawn_builds_child_and_restores_cursor() {
        let params = always_spawn().with_radii(1.0, 1.0);
        let root = parent(&params);
        let segment = segment_of(&root, 0.3);
        let mut rng = RandomGenerator::new();
        let mut strategy = DefaultSubrayStrategy;

        // Phase offset, child seed and the spawn roll
        let mut reference = rng.clone();
        for _ in 0..3 {
            reference.random();
        }

        let mut ctx = SpawnContext {
            rng: &mut rng,
            params: &params,
            time: 0.5,
            parent: &root,
            subray_probability: 1.0,
            subray_count: 1,
            max_subrays: 26,
        };
        let child = try_spawn(&mut strategy, &segment, &mut ctx).unwrap();

        assert_eq!(rng.save(), reference.save());
        assert_eq!(child.recursion, 1);
        assert_eq!(child.time_scale, root.time_scale * 2.0);
        assert_eq!(child.max_iterations, root.max_iterations - 1);
        assert_eq!(child.radius0, 0.5);
        assert_eq!(child.radius1, 0.2);
        assert_eq!(child.pos0, segment.pos0);
        assert!(child.pos1.is_finite());
        assert_eq!(child.up0, root.up0);
    }

    #[test]
    fn test_child_iteration_budget_capped_by_root() {
        let params = always_spawn().with_max_iterations(0);
        let root = parent(&params);
        let segment = segment_of(&root, 0.0);
        let mut rng = RandomGenerator::new();
        let mut ctx = SpawnContext {
            rng: &mut rng,
            params: &params,
            time: 0.5,
            parent: &root,
            subray_probability: 1.0,
            subray_count: 1,
            max_subrays: 26,
        };
        let child = try_spawn(&mut DefaultSubrayStrategy, &segment, &mut ctx).unwrap();
        assert_eq!(child.max_iterations, 0);
    }

    #[test]
    fn test_cylinder_stays_within_reach() {
        let params = RayParameters::default();
        let root = parent(&params);
        let factors = PlacementFactors::default();
        let mut rng = RandomGenerator::new();
        let length = root.pos0.distance(root.pos1);

        for i in 0..200 {
            let segment = segment_of(&root, (i % 10) as f32 / 10.0);
            let mut child = root;
            subray_cylinder_position(&segment, &root, &mut child, factors, &mut rng);

            assert_eq!(child.pos0, segment.pos0);
            let along = (child.pos1 - root.pos0).y;
            assert!(along >= length * (segment.fraction0 - 0.25 * (1.0 - segment.fraction0)) - 1e-3);
            assert!(along <= length * (segment.fraction0 + 0.25 * (1.0 - segment.fraction0)) + 1e-3);

            let lateral = Vec3::new(child.pos1.x, 0.0, child.pos1.z).length();
            assert!(lateral <= along.abs() * factors.side_width_factor + 1e-3);
        }
    }

    #[test]
    fn test_cone_points_forward() {
        let params = RayParameters::default();
        let root = parent(&params);
        let mut rng = RandomGenerator::new();
        for i in 0..100 {
            let segment = segment_of(&root, (i % 10) as f32 / 10.0);
            let mut child = root;
            subray_cone_position(&segment, &root, &mut child, PlacementFactors::default(), &mut rng);
            assert!(child.pos1.y >= segment.pos0.y - 1e-3);
        }
    }

    #[test]
    fn test_custom_placement_hook() {
        struct Straight;
        impl SubrayStrategy for Straight {
            fn on_subray_creation(
                &mut self,
                segment: &Segment,
                _parent: &Subray,
                child: &mut Subray,
                _rng: &mut RandomGenerator,
            ) {
                child.pos1 = segment.pos0 + Vec3::X;
            }
        }

        let params = always_spawn();
        let root = parent(&params);
        let segment = segment_of(&root, 0.4);
        let mut rng = RandomGenerator::new();
        let mut ctx = SpawnContext {
            rng: &mut rng,
            params: &params,
            time: 0.0,
            parent: &root,
            subray_probability: 1.0,
            subray_count: 1,
            max_subrays: 26,
        };
        let child = try_spawn(&mut Straight, &segment, &mut ctx).unwrap();
        assert_eq!(child.pos1, segment.pos0 + Vec3::X);
    }
}
