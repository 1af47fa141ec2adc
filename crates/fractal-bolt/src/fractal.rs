//! Midpoint-displacement subdivision of a subray
//!
//! Starting from a subray's root segment, every step splits a segment at its
//! noise-displaced midpoint and recurses left-then-right until the subray's
//! iteration budget is reached. Leaves are handed to a visitor in order from
//! source to destination, so the caller can build a contiguous strip.
//!
//! All temporaries live in the call frame. Child records are written to
//! fresh pool slots before either child is visited, so no level reads state
//! that a deeper level may have overwritten.

use crate::noise::NoiseField;
use crate::pool::Pool;
use crate::segment::Segment;
use glam::Vec3;

/// Segments shorter than this use [`FALLBACK_FORWARD`] as their direction
pub const DEGENERATE_LENGTH: f32 = 1e-6;

/// Direction substituted for degenerate segments
pub const FALLBACK_FORWARD: Vec3 = Vec3::new(0.0, 0.0, 0.01);

/// Per-subray inputs shared by every level of one subdivision pass
#[derive(Debug, Clone, Copy)]
pub struct FractalPass<'a> {
    pub noise: &'a NoiseField,
    pub time: f32,
    pub time_scale: f32,
    pub roughness: f32,
    pub max_iterations: u32,
}

impl FractalPass<'_> {
    /// Subdivide the segment stored at `root` and visit every leaf
    ///
    /// Consumes `2^(max_iterations + 1) - 1` pool slots including `root`.
    pub fn run<F>(&self, segments: &mut Pool<Segment>, root: usize, visit: &mut F)
    where
        F: FnMut(&Segment),
    {
        self.subdivide(segments, root, visit);
    }

    fn subdivide<F>(&self, segments: &mut Pool<Segment>, id: usize, visit: &mut F)
    where
        F: FnMut(&Segment),
    {
        let segment = segments[id];

        if segment.iteration >= self.max_iterations {
            visit(&segment);
            return;
        }

        let (first, second) = self.split(&segment);

        match (segments.alloc(first), segments.alloc(second)) {
            (Some(first), Some(second)) => {
                self.subdivide(segments, first, visit);
                self.subdivide(segments, second, visit);
            }
            _ => {
                debug_assert!(false, "segment pool exhausted at iteration {}", segment.iteration);
                visit(&segment);
            }
        }
    }

    /// Split `segment` at its displaced midpoint
    pub fn split(&self, segment: &Segment) -> (Segment, Segment) {
        let mut forward = segment.pos1 - segment.pos0;
        let mut length = forward.length();
        if length < DEGENERATE_LENGTH {
            forward = FALLBACK_FORWARD;
            length = forward.length();
        }
        let forward = forward / length;

        let middle_radius = (segment.radius0 + segment.radius1) * 0.5;
        let middle_fraction = (segment.fraction0 + segment.fraction1) * 0.5;

        // Finer levels animate faster so detail shimmers over the coarse shape
        let time_dimension =
            f64::from(self.time) * f64::from(self.time_scale) * 2f64.powi(segment.iteration as i32);

        let middle_pos = segment.pos0.lerp(segment.pos1, 0.5);
        let middle_lin_pos = segment.lin_pos0.lerp(segment.lin_pos1, 0.5);

        let displacement = self.noise.noise3(middle_lin_pos, time_dimension)
            * (segment.position_variation_factor * length);
        let new_pos = middle_pos + displacement;

        let position_variation_factor = segment.position_variation_factor * self.roughness;
        let iteration = segment.iteration + 1;

        // Re-orthogonalize up against the local direction for the second half
        let middle_up = forward
            .cross(segment.up0.cross(forward))
            .try_normalize()
            .unwrap_or(segment.up0);

        let first = Segment {
            pos0: segment.pos0,
            pos1: new_pos,
            lin_pos0: segment.lin_pos0,
            lin_pos1: middle_lin_pos,
            up0: segment.up0,
            up1: segment.up1,
            radius0: segment.radius0,
            radius1: middle_radius,
            fraction0: segment.fraction0,
            fraction1: middle_fraction,
            position_variation_factor,
            iteration,
        };

        let second = Segment {
            pos0: new_pos,
            pos1: segment.pos1,
            lin_pos0: middle_lin_pos,
            lin_pos1: segment.lin_pos1,
            up0: middle_up,
            up1: segment.up1,
            radius0: middle_radius,
            radius1: segment.radius1,
            fraction0: middle_fraction,
            fraction1: segment.fraction1,
            position_variation_factor,
            iteration,
        };

        (first, second)
    }
}
