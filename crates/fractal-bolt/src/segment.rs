//! Segment records: edges of a subray's subdivided polyline

use crate::subray::Subray;
use glam::Vec3;

/// One edge of the subdivided polyline of a subray
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    pub pos0: Vec3,
    pub pos1: Vec3,
    /// Noise coordinates, decorrelated from the world positions
    pub lin_pos0: Vec3,
    pub lin_pos1: Vec3,
    pub up0: Vec3,
    pub up1: Vec3,
    pub radius0: f32,
    pub radius1: f32,
    /// Start of the segment along its subray (0..1)
    pub fraction0: f32,
    /// End of the segment along its subray (0..1)
    pub fraction1: f32,
    /// Current displacement amplitude relative to the segment length
    pub position_variation_factor: f32,
    /// Subdivision depth; 0 for the root segment
    pub iteration: u32,
}

impl Segment {
    /// Undivided segment spanning the whole subray
    pub fn root(subray: &Subray) -> Self {
        Self {
            pos0: subray.pos0,
            pos1: subray.pos1,
            lin_pos0: subray.lin_pos0,
            lin_pos1: subray.lin_pos1,
            up0: subray.up0,
            up1: subray.up1,
            radius0: subray.radius0,
            radius1: subray.radius1,
            fraction0: 0.0,
            fraction1: 1.0,
            position_variation_factor: 1.0 - subray.straightness,
            iteration: 0,
        }
    }

    /// Distance between the endpoints
    pub fn length(&self) -> f32 {
        self.pos0.distance(self.pos1)
    }
}
