//! Procedural, time-varying lightning bolt meshes
//!
//! A [`LightningGenerator`] turns a [`RayParameters`] record and a time value
//! into a triangular-prism mesh: the bolt between two endpoints is subdivided
//! with noise-displaced midpoints, branches grow and die on a periodic
//! schedule, and timed bolts grow from the source and erode towards the
//! destination over their lifetime.
//!
//! ```
//! use fractal_bolt::{LightningGenerator, RayParameters};
//! use glam::Vec3;
//!
//! let params = RayParameters::default()
//!     .with_endpoints(Vec3::ZERO, Vec3::new(0.0, 50.0, 0.0))
//!     .with_max_iterations(6);
//! let mut bolt = LightningGenerator::new(&params);
//!
//! bolt.update(0.25);
//! assert!(bolt.is_visible());
//! assert_eq!(bolt.indices().len() % 18, 0);
//! ```

pub mod batch;
pub mod error;
pub mod fractal;
pub mod generator;
pub mod lifecycle;
pub mod mesh;
pub mod noise;
pub mod params;
pub mod pool;
pub mod rng;
pub mod segment;
pub mod spawner;
pub mod subray;

pub use batch::BoltBatch;
pub use error::{BoltError, Result};
pub use generator::LightningGenerator;
pub use lifecycle::RayState;
pub use mesh::MeshBuffers;
pub use params::RayParameters;
pub use rng::RandomGenerator;
pub use spawner::{
    ConeSubrayStrategy, DefaultSubrayStrategy, PlacementFactors, SpawnContext, SpawnDecision,
    SubrayStrategy,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
