//! Ray configuration
//!
//! [`RayParameters`] is fixed for the lifetime of a generator. Construction
//! never rejects a record: [`RayParameters::sanitized`] clamps every field to
//! its accepted range and logs what it changed. Hosts that prefer to reject
//! bad input up front can call [`RayParameters::validate`].

use crate::error::{BoltError, Result};
use crate::rng::DEFAULT_TABLE_SEED;
use glam::Vec3;
use log::warn;

/// Deepest supported subdivision
pub const MAX_ITERATIONS: u32 = 12;

/// Largest subray pool a generator will allocate
pub const MAX_SUBRAYS: usize = 256;

/// Smallest radius a cross-section may have
pub const MIN_RADIUS_FLOOR: f32 = 1e-4;

/// Per-instance ray configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct RayParameters {
    /// Start point of the root ray
    pub source_offset: Vec3,
    /// End point of the root ray
    pub dest_offset: Vec3,
    /// Orientation of the cross-section at the source
    pub up0: Vec3,
    /// Orientation of the cross-section at the destination
    pub up1: Vec3,
    /// Radius at the source
    pub radius0: f32,
    /// Radius at the destination
    pub radius1: f32,
    /// Smallest radius a child subray may get
    pub min_radius: f32,
    /// Child radius at its start, relative to the parent segment
    pub radius0_factor: f32,
    /// Child radius at its end, relative to the parent segment
    pub radius1_factor: f32,
    /// Speed of the noise animation for the root ray
    pub time_scale: f32,
    /// Displacement decay per subdivision level (0..1)
    pub roughness: f32,
    /// 1 - initial displacement factor (0..1)
    pub straightness: f32,
    /// Ray never dies and is always fully drawn
    pub is_eternal: bool,
    /// Time the ray appears (ignored by eternal rays for visibility)
    pub birth_time: f32,
    /// Time the ray disappears
    pub death_time: f32,
    /// Fraction of the lifetime spent growing towards the destination
    pub propagation_time_factor: f32,
    /// Fraction of the lifetime after which the ray starts to erode
    pub vanishing_time_factor: f32,
    /// Length of one branch cycle
    pub subray_period: f32,
    /// Fraction of each cycle during which a branch may be live
    pub subray_duty_cycle: f32,
    /// Subdivision depth of the root ray
    pub max_iterations: u32,
    /// Deepest subray nesting (root is depth 0)
    pub max_subray_recursion: u32,
    /// Expected branch fan-out per subray
    pub ramification: u32,
    /// Branch probability decay per nesting level (0..1)
    pub recursion_probability: f32,
    /// Random cursor of the root ray, as a fraction of the sample table
    pub noise_seed: f32,
    /// Seed for the random sample table and the noise permutations
    pub table_seed: u64,
    /// Generate once at construction and never regenerate
    pub is_static: bool,
    /// Fill a UV buffer alongside positions
    pub generate_uvs: bool,
}

impl Default for RayParameters {
    fn default() -> Self {
        Self {
            source_offset: Vec3::ZERO,
            dest_offset: Vec3::new(0.0, 100.0, 0.0),
            up0: Vec3::Z,
            up1: Vec3::Z,
            radius0: 1.0,
            radius1: 1.0,
            min_radius: 0.2,
            radius0_factor: 0.5,
            radius1_factor: 0.2,
            time_scale: 1.0,
            roughness: 0.9,
            straightness: 0.7,
            is_eternal: true,
            birth_time: 0.0,
            death_time: 1.0,
            propagation_time_factor: 0.1,
            vanishing_time_factor: 0.9,
            subray_period: 4.0,
            subray_duty_cycle: 0.6,
            max_iterations: 9,
            max_subray_recursion: 3,
            ramification: 5,
            recursion_probability: 0.6,
            noise_seed: 0.0,
            table_seed: DEFAULT_TABLE_SEED,
            is_static: false,
            generate_uvs: false,
        }
    }
}

impl RayParameters {
    /// Set both endpoints
    pub fn with_endpoints(mut self, source: Vec3, dest: Vec3) -> Self {
        self.source_offset = source;
        self.dest_offset = dest;
        self
    }

    /// Set both radii
    pub fn with_radii(mut self, radius0: f32, radius1: f32) -> Self {
        self.radius0 = radius0;
        self.radius1 = radius1;
        self
    }

    /// Give the ray a finite lifetime
    pub fn with_lifetime(mut self, birth_time: f32, death_time: f32) -> Self {
        self.is_eternal = false;
        self.birth_time = birth_time;
        self.death_time = death_time;
        self
    }

    /// Make the ray eternal
    pub fn eternal(mut self) -> Self {
        self.is_eternal = true;
        self
    }

    /// Set propagation and vanishing time factors
    pub fn with_time_factors(mut self, propagation: f32, vanishing: f32) -> Self {
        self.propagation_time_factor = propagation;
        self.vanishing_time_factor = vanishing;
        self
    }

    /// Set the subdivision depth
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set branching controls
    pub fn with_branching(
        mut self,
        ramification: u32,
        max_subray_recursion: u32,
        recursion_probability: f32,
    ) -> Self {
        self.ramification = ramification;
        self.max_subray_recursion = max_subray_recursion;
        self.recursion_probability = recursion_probability;
        self
    }

    /// Set the branch cycle
    pub fn with_subray_cycle(mut self, period: f32, duty_cycle: f32) -> Self {
        self.subray_period = period;
        self.subray_duty_cycle = duty_cycle;
        self
    }

    /// Set displacement shape controls
    pub fn with_shape(mut self, roughness: f32, straightness: f32) -> Self {
        self.roughness = roughness;
        self.straightness = straightness;
        self
    }

    /// Set the root ray's random cursor
    pub fn with_noise_seed(mut self, noise_seed: f32) -> Self {
        self.noise_seed = noise_seed;
        self
    }

    /// Set the seed of the random sample table
    pub fn with_table_seed(mut self, table_seed: u64) -> Self {
        self.table_seed = table_seed;
        self
    }

    /// Generate once and freeze the mesh
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Request a UV buffer
    pub fn with_uvs(mut self, generate_uvs: bool) -> Self {
        self.generate_uvs = generate_uvs;
        self
    }

    /// Subray pool size: `ceil(1 + ramification^(max_subray_recursion - 1))`
    ///
    /// Saturates instead of overflowing; [`sanitized`](Self::sanitized)
    /// keeps the result within [`MAX_SUBRAYS`].
    pub fn max_subrays(&self) -> usize {
        let exponent = self.max_subray_recursion.saturating_sub(1);
        let fan_out = u64::from(self.ramification)
            .checked_pow(exponent)
            .unwrap_or(u64::MAX);
        usize::try_from(fan_out.saturating_add(1)).unwrap_or(usize::MAX)
    }

    /// Segment pool size: `2 * 2^max_iterations`
    pub fn max_segments(&self) -> usize {
        2 << self.max_iterations.min(MAX_ITERATIONS)
    }

    /// Check every field, returning the first out-of-range one
    pub fn validate(&self) -> Result<()> {
        for (field, v) in [
            ("source_offset", self.source_offset),
            ("dest_offset", self.dest_offset),
        ] {
            if !v.is_finite() {
                return Err(BoltError::invalid(field, "must be finite"));
            }
        }
        for (field, v) in [("up0", self.up0), ("up1", self.up1)] {
            if !v.is_finite() || v.length_squared() < f32::EPSILON {
                return Err(BoltError::invalid(field, "must be a finite non-zero vector"));
            }
        }
        for (field, v) in [
            ("radius0", self.radius0),
            ("radius1", self.radius1),
            ("min_radius", self.min_radius),
            ("subray_period", self.subray_period),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(BoltError::invalid(field, format!("must be > 0, got {v}")));
            }
        }
        for (field, v) in [
            ("roughness", self.roughness),
            ("straightness", self.straightness),
            ("propagation_time_factor", self.propagation_time_factor),
            ("vanishing_time_factor", self.vanishing_time_factor),
            ("subray_duty_cycle", self.subray_duty_cycle),
            ("recursion_probability", self.recursion_probability),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(BoltError::invalid(field, format!("must be in [0, 1], got {v}")));
            }
        }
        for (field, v) in [
            ("radius0_factor", self.radius0_factor),
            ("radius1_factor", self.radius1_factor),
            ("time_scale", self.time_scale),
            ("noise_seed", self.noise_seed),
            ("birth_time", self.birth_time),
            ("death_time", self.death_time),
        ] {
            if !v.is_finite() {
                return Err(BoltError::invalid(field, "must be finite"));
            }
        }
        if self.death_time < self.birth_time {
            return Err(BoltError::invalid(
                "death_time",
                format!(
                    "must not precede birth_time ({} < {})",
                    self.death_time, self.birth_time
                ),
            ));
        }
        if self.max_iterations > MAX_ITERATIONS {
            return Err(BoltError::invalid(
                "max_iterations",
                format!("must be <= {MAX_ITERATIONS}, got {}", self.max_iterations),
            ));
        }
        if self.max_subrays() > MAX_SUBRAYS {
            return Err(BoltError::invalid(
                "ramification",
                format!(
                    "{}^{} exceeds the subray pool limit of {MAX_SUBRAYS}",
                    self.ramification,
                    self.max_subray_recursion.saturating_sub(1)
                ),
            ));
        }
        Ok(())
    }

    /// Copy with every field clamped into its accepted range
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut p = self.clone();

        finite_vec("source_offset", &mut p.source_offset, defaults.source_offset);
        finite_vec("dest_offset", &mut p.dest_offset, defaults.dest_offset);
        unit_vec("up0", &mut p.up0);
        unit_vec("up1", &mut p.up1);

        at_least("radius0", &mut p.radius0, MIN_RADIUS_FLOOR, defaults.radius0);
        at_least("radius1", &mut p.radius1, MIN_RADIUS_FLOOR, defaults.radius1);
        at_least("min_radius", &mut p.min_radius, MIN_RADIUS_FLOOR, defaults.min_radius);
        at_least("radius0_factor", &mut p.radius0_factor, 0.0, defaults.radius0_factor);
        at_least("radius1_factor", &mut p.radius1_factor, 0.0, defaults.radius1_factor);
        at_least("subray_period", &mut p.subray_period, 1e-3, defaults.subray_period);

        unit_range("roughness", &mut p.roughness, defaults.roughness);
        unit_range("straightness", &mut p.straightness, defaults.straightness);
        unit_range(
            "propagation_time_factor",
            &mut p.propagation_time_factor,
            defaults.propagation_time_factor,
        );
        unit_range(
            "vanishing_time_factor",
            &mut p.vanishing_time_factor,
            defaults.vanishing_time_factor,
        );
        unit_range(
            "subray_duty_cycle",
            &mut p.subray_duty_cycle,
            defaults.subray_duty_cycle,
        );
        unit_range(
            "recursion_probability",
            &mut p.recursion_probability,
            defaults.recursion_probability,
        );

        finite("time_scale", &mut p.time_scale, defaults.time_scale);
        finite("noise_seed", &mut p.noise_seed, defaults.noise_seed);
        finite("birth_time", &mut p.birth_time, defaults.birth_time);
        finite("death_time", &mut p.death_time, defaults.death_time);
        if p.death_time < p.birth_time {
            warn!(
                "death_time {} precedes birth_time {}, using birth_time",
                p.death_time, p.birth_time
            );
            p.death_time = p.birth_time;
        }

        if p.max_iterations > MAX_ITERATIONS {
            warn!(
                "max_iterations {} clamped to {MAX_ITERATIONS}",
                p.max_iterations
            );
            p.max_iterations = MAX_ITERATIONS;
        }

        while p.max_subrays() > MAX_SUBRAYS {
            warn!(
                "subray pool of {} exceeds {MAX_SUBRAYS}, reducing max_subray_recursion to {}",
                p.max_subrays(),
                p.max_subray_recursion - 1
            );
            p.max_subray_recursion -= 1;
        }

        p
    }
}

fn finite(field: &str, value: &mut f32, default: f32) {
    if !value.is_finite() {
        warn!("{field} is not finite, using default {default}");
        *value = default;
    }
}

fn at_least(field: &str, value: &mut f32, min: f32, default: f32) {
    finite(field, value, default);
    if *value < min {
        warn!("{field} {} clamped to {min}", *value);
        *value = min;
    }
}

fn unit_range(field: &str, value: &mut f32, default: f32) {
    finite(field, value, default);
    let clamped = value.clamp(0.0, 1.0);
    if clamped != *value {
        warn!("{field} {} clamped to {clamped}", *value);
        *value = clamped;
    }
}

fn finite_vec(field: &str, value: &mut Vec3, default: Vec3) {
    if !value.is_finite() {
        warn!("{field} is not finite, using default {default}");
        *value = default;
    }
}

fn unit_vec(field: &str, value: &mut Vec3) {
    match value.try_normalize() {
        Some(n) => *value = n,
        None => {
            warn!("{field} {value} cannot be normalized, using +Z");
            *value = Vec3::Z;
        }
    }
}

#[cfg(feature = "serde-support")]
impl RayParameters {
    /// Parse parameters from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize parameters to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
