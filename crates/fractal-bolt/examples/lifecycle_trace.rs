//! Step a timed bolt through its lifetime and log what each frame draws

use anyhow::Result;
use clap::Parser;
use fractal_bolt::{BoltBatch, RayParameters};
use glam::Vec3;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "lifecycle_trace", about = "Trace bolt states over time")]
struct Args {
    /// Birth time
    #[arg(long, default_value_t = 0.0)]
    birth: f32,

    /// Death time
    #[arg(long, default_value_t = 1.0)]
    death: f32,

    /// Number of frames to sample between birth and death
    #[arg(short, long, default_value_t = 20)]
    frames: u32,

    /// Number of parallel bolts
    #[arg(short, long, default_value_t = 1)]
    bolts: usize,

    /// Subdivision depth
    #[arg(short = 'i', long, default_value_t = 6)]
    iterations: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let template = RayParameters::default()
        .with_lifetime(args.birth, args.death)
        .with_max_iterations(args.iterations);
    template.validate()?;

    let pairs = (0..args.bolts).map(|i| {
        let x = i as f32 * 25.0;
        (Vec3::new(x, 0.0, 0.0), Vec3::new(x, 100.0, 0.0))
    });
    let mut batch = BoltBatch::from_pairs(&template, pairs);

    // Sample a little before birth and after death as well
    let span = args.death - args.birth;
    let frames = args.frames.max(1);
    for frame in 0..=frames + 2 {
        let time = args.birth + span * (frame as f32 - 1.0) / frames as f32;
        batch.update_all(time);

        for (i, bolt) in batch.iter().enumerate() {
            info!(
                "t={:7.3} bolt {}: {:<12} visible={} subrays={:3} triangles={}",
                time,
                i,
                format!("{:?}", bolt.state()),
                bolt.is_visible(),
                bolt.subray_count(),
                bolt.mesh().triangle_count()
            );
        }
    }

    Ok(())
}
