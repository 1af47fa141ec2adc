//! Generate one bolt frame and write it as a Wavefront OBJ file
//!
//! ```text
//! cargo run -p fractal-bolt --example dump_obj -- --time 1.5 -o bolt.obj
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use fractal_bolt::{ConeSubrayStrategy, LightningGenerator, RayParameters};
use glam::Vec3;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dump_obj", about = "Write a lightning bolt frame as OBJ")]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "bolt.obj")]
    output: PathBuf,

    /// Time of the frame
    #[arg(short, long, default_value_t = 1.0)]
    time: f32,

    /// Subdivision depth
    #[arg(short = 'i', long, default_value_t = 9)]
    iterations: u32,

    /// Root random cursor (0..1)
    #[arg(short, long, default_value_t = 0.0)]
    seed: f32,

    /// Destination point as x,y,z
    #[arg(long, value_delimiter = ',', num_args = 3, default_values_t = [0.0, 100.0, 0.0])]
    dest: Vec<f32>,

    /// Give the bolt a lifetime instead of making it eternal
    #[arg(long, value_delimiter = ',', num_args = 2, value_names = ["BIRTH", "DEATH"])]
    lifetime: Option<Vec<f32>>,

    /// Place branches in a forward cone instead of a cylinder
    #[arg(long)]
    cone: bool,

    /// Also write texture coordinates
    #[arg(long)]
    uvs: bool,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut params = RayParameters::default()
        .with_endpoints(Vec3::ZERO, Vec3::from_slice(&args.dest))
        .with_max_iterations(args.iterations)
        .with_noise_seed(args.seed)
        .with_uvs(args.uvs);
    if let Some(lifetime) = &args.lifetime {
        params = params.with_lifetime(lifetime[0], lifetime[1]);
    }

    let mut bolt = if args.cone {
        LightningGenerator::with_strategy(&params, Box::new(ConeSubrayStrategy::default()))
    } else {
        LightningGenerator::new(&params)
    };
    bolt.update(args.time);

    info!(
        "t={}: state {:?}, {} subrays, {} vertices, {} triangles",
        args.time,
        bolt.state(),
        bolt.subray_count(),
        bolt.mesh().vertex_count(),
        bolt.mesh().triangle_count()
    );

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    bolt.mesh().write_obj(BufWriter::new(file))?;

    info!("Wrote {}", args.output.display());
    Ok(())
}
