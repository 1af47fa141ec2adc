//! Per-bolt generator: lifecycle, subray work list and mesh output
//!
//! Every [`update`](LightningGenerator::update) rebuilds the mesh from
//! scratch. The root subray is processed first; children spawned while a
//! subray is subdivided are appended to the subray pool and processed in
//! pool order afterwards, each from its own seed. This keeps every strip
//! contiguous in the buffers and a parent's random sequence independent of
//! how its children are generated.

use crate::fractal::FractalPass;
use crate::lifecycle::{RayState, RayTiming, classify, segment_action};
use crate::mesh::MeshBuffers;
use crate::noise::NoiseField;
use crate::params::RayParameters;
use crate::pool::Pool;
use crate::rng::RandomGenerator;
use crate::segment::Segment;
use crate::spawner::{DefaultSubrayStrategy, SpawnContext, SubrayStrategy, try_spawn};
use crate::subray::Subray;
use glam::Vec3;
use log::{debug, trace, warn};
use std::fmt;

/// Salt applied to the table seed for the noise permutations
const NOISE_TABLE_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Procedural lightning bolt between two endpoints
pub struct LightningGenerator {
    params: RayParameters,
    root_timing: RayTiming,
    rng: RandomGenerator,
    noise: NoiseField,
    subrays: Pool<Subray>,
    segments: Pool<Segment>,
    mesh: MeshBuffers,
    strategy: Box<dyn SubrayStrategy>,
    state: RayState,
    visible: bool,
}

impl LightningGenerator {
    /// Create a generator with the default branch policy
    pub fn new(params: &RayParameters) -> Self {
        Self::with_strategy(params, Box::new(DefaultSubrayStrategy))
    }

    /// Create a generator with a custom branch policy
    ///
    /// Out-of-range parameters are clamped (see [`RayParameters::sanitized`]).
    pub fn with_strategy(params: &RayParameters, strategy: Box<dyn SubrayStrategy>) -> Self {
        let params = params.sanitized();

        let rng = RandomGenerator::with_table_seed(params.table_seed);
        let mut noise_rng = RandomGenerator::with_table_seed(params.table_seed ^ NOISE_TABLE_SALT);
        let noise = NoiseField::from_rng(&mut noise_rng);

        let max_subrays = params.max_subrays();
        let subrays = Pool::with_capacity(max_subrays);
        let segments = Pool::with_capacity(params.max_segments());
        let mesh = MeshBuffers::for_bolt(params.max_iterations, max_subrays, params.generate_uvs);

        debug!(
            "Lightning generator: {} subrays, {} segments, {} vertices, {} indices{}",
            subrays.capacity(),
            segments.capacity(),
            mesh.vertex_capacity(),
            mesh.index_capacity(),
            if params.is_static { " (static)" } else { "" }
        );

        let root_timing = Subray::root(&params).timing;
        let mut generator = Self {
            params,
            root_timing,
            rng,
            noise,
            subrays,
            segments,
            mesh,
            strategy,
            state: RayState::Initialized,
            visible: false,
        };

        if generator.params.is_static {
            generator.generate(generator.static_time());
        }

        generator
    }

    /// Advance to `time`: classify the ray and rebuild its mesh
    ///
    /// Static rays keep the mesh built at construction and only update
    /// their state.
    pub fn update(&mut self, time: f32) {
        let (state, visible) = classify(self.params.is_eternal, &self.root_timing, time);
        if state != self.state {
            debug!("Ray state {:?} -> {:?} at t={}", self.state, state, time);
        }
        self.state = state;
        self.visible = visible;

        if self.params.is_static {
            return;
        }

        if visible {
            self.generate(time);
        } else {
            self.subrays.reset();
            self.mesh.reset();
        }

        trace!(
            "t={}: {} subrays, {} vertices, {} indices",
            time,
            self.subrays.len(),
            self.mesh.vertex_count(),
            self.mesh.index_count()
        );
    }

    /// Move the root endpoints; takes effect on the next update
    ///
    /// Static rays are rebuilt immediately. Non-finite points are ignored.
    pub fn set_endpoints(&mut self, source: Vec3, dest: Vec3) {
        if !source.is_finite() || !dest.is_finite() {
            warn!("Ignoring non-finite endpoints {source} -> {dest}");
            return;
        }
        self.params.source_offset = source;
        self.params.dest_offset = dest;

        if self.params.is_static {
            self.generate(self.static_time());
        }
    }

    /// Time at which static rays are built
    fn static_time(&self) -> f32 {
        if self.params.is_eternal {
            0.0
        } else {
            (self.root_timing.end_propagation_time + self.root_timing.begin_vanishing_time) * 0.5
        }
    }

    fn generate(&mut self, time: f32) {
        let Self {
            params,
            rng,
            noise,
            subrays,
            segments,
            mesh,
            strategy,
            ..
        } = self;
        let params = &*params;
        let noise = &*noise;

        subrays.reset();
        mesh.reset();
        if subrays.alloc(Subray::root(params)).is_none() {
            return;
        }
        let max_subrays = subrays.capacity();

        let mut next = 0;
        while next < subrays.len() {
            let mut subray = subrays[next];
            next += 1;

            rng.set_seed(subray.seed);
            subray.draw_linear_positions(rng);
            subrays[next - 1] = subray;

            let always_full = params.is_eternal && subray.recursion == 0;
            let time_fraction = subray.timing.fraction_at(time);
            let subray_probability = subray_probability(params, &subray);

            segments.reset();
            let Some(root) = segments.alloc(Segment::root(&subray)) else {
                debug_assert!(false, "segment pool has no capacity");
                return;
            };

            let pass = FractalPass {
                noise,
                time,
                time_scale: subray.time_scale,
                roughness: subray.roughness,
                max_iterations: subray.max_iterations,
            };

            mesh.begin_strip();
            let mut visit = |segment: &Segment| {
                let action = segment_action(&subray.timing, always_full, segment, time, time_fraction);
                if action.draw {
                    mesh.push_prism(segment);
                }
                if !action.spawn {
                    return;
                }

                let mut ctx = SpawnContext {
                    rng: &mut *rng,
                    params,
                    time,
                    parent: &subray,
                    subray_probability,
                    subray_count: subrays.len(),
                    max_subrays,
                };
                if let Some(child) = try_spawn(&mut **strategy, segment, &mut ctx) {
                    if subrays.alloc(child).is_none() {
                        trace!("Subray pool full, dropping branch at depth {}", child.recursion);
                    }
                }
            };
            pass.run(segments, root, &mut visit);
        }
    }

    /// Valid vertex coordinates, 3 floats per vertex
    pub fn vertices(&self) -> &[f32] {
        self.mesh.vertices()
    }

    /// Valid triangle indices (the draw range)
    pub fn indices(&self) -> &[u32] {
        self.mesh.indices()
    }

    /// Valid UVs when `generate_uvs` is set
    pub fn uvs(&self) -> Option<&[f32]> {
        self.mesh.uvs()
    }

    /// Mesh buffers with their statistics
    pub fn mesh(&self) -> &MeshBuffers {
        &self.mesh
    }

    /// State after the last update
    pub fn state(&self) -> RayState {
        self.state
    }

    /// Whether the host should draw the mesh this frame
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Subrays generated in the last pass, the root included
    pub fn subray_count(&self) -> usize {
        self.subrays.len()
    }

    /// Subrays generated in the last pass, in generation order
    pub fn subrays(&self) -> &[Subray] {
        self.subrays.live()
    }

    /// Parameters in effect after clamping
    pub fn params(&self) -> &RayParameters {
        &self.params
    }
}

impl fmt::Debug for LightningGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightningGenerator")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("visible", &self.visible)
            .field("subrays", &self.subrays.len())
            .field("vertices", &self.mesh.vertex_count())
            .field("indices", &self.mesh.index_count())
            .finish_non_exhaustive()
    }
}

/// Branch chance per leaf segment of `subray`
///
/// A zero recursion probability disables branching at every depth.
fn subray_probability(params: &RayParameters, subray: &Subray) -> f32 {
    if params.recursion_probability <= 0.0 {
        return 0.0;
    }
    params.ramification as f32 * params.recursion_probability.powi(subray.recursion as i32)
        / subray.leaf_count() as f32
}
