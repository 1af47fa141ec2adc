//! Subray records: one filament of the bolt, the root included

use crate::lifecycle::RayTiming;
use crate::params::RayParameters;
use crate::rng::RandomGenerator;
use glam::Vec3;

/// Scale of the random noise coordinates assigned to each subray
pub const LINEAR_POSITION_SCALE: f32 = 1000.0;

/// One filament of the bolt
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Subray {
    pub pos0: Vec3,
    pub pos1: Vec3,
    /// Noise coordinates, drawn from the subray's own seed
    pub lin_pos0: Vec3,
    pub lin_pos1: Vec3,
    pub up0: Vec3,
    pub up1: Vec3,
    pub radius0: f32,
    pub radius1: f32,
    pub timing: RayTiming,
    /// Noise animation speed; doubles with every nesting level
    pub time_scale: f32,
    pub roughness: f32,
    pub straightness: f32,
    /// Random cursor (as a table fraction) this subray generates from
    pub seed: f32,
    /// Nesting depth; 0 for the root ray
    pub recursion: u32,
    /// Subdivision depth of this subray
    pub max_iterations: u32,
}

impl Subray {
    /// The root ray described by `params`
    pub fn root(params: &RayParameters) -> Self {
        Self {
            pos0: params.source_offset,
            pos1: params.dest_offset,
            lin_pos0: Vec3::ZERO,
            lin_pos1: Vec3::ZERO,
            up0: params.up0,
            up1: params.up1,
            radius0: params.radius0,
            radius1: params.radius1,
            timing: RayTiming::new(
                params.birth_time,
                params.death_time,
                params.propagation_time_factor,
                params.vanishing_time_factor,
            ),
            time_scale: params.time_scale,
            roughness: params.roughness,
            straightness: params.straightness,
            seed: params.noise_seed,
            recursion: 0,
            max_iterations: params.max_iterations,
        }
    }

    /// Draw fresh noise coordinates from the generator's current cursor
    pub fn draw_linear_positions(&mut self, rng: &mut RandomGenerator) {
        self.lin_pos0 = Vec3::new(rng.random(), rng.random(), rng.random()) * LINEAR_POSITION_SCALE;
        self.lin_pos1 = Vec3::new(rng.random(), rng.random(), rng.random()) * LINEAR_POSITION_SCALE;
    }

    /// Leaf segments this subray produces
    pub fn leaf_count(&self) -> usize {
        1 << self.max_iterations
    }
}
