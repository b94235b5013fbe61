use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use log::info;
use parquet::arrow::ArrowWriter;

use fusor_explorer::data::loader::REQUIRED_COLUMNS;
use fusor_explorer::data::model::RawParticle;

const E: f64 = 1.602176634e-19;
const MEV: f64 = 1.602176634e-13;

const M_D: f64 = 3.3436e-27;
const M_T: f64 = 5.0074e-27;
const M_HE3: f64 = 5.0064e-27;
const M_N: f64 = 1.6749e-27;
const M_P: f64 = 1.6726e-27;

/// Outer grid radius (m).
const GRID_RADIUS: f64 = 0.08;

/// Write a synthetic fusor particle sample as CSV and Parquet.
#[derive(Parser, Debug)]
#[command(name = "generate-sample")]
struct Args {
    /// Number of particles.
    #[arg(short, long, default_value_t = 5000)]
    count: usize,

    /// Grid voltage in kV.
    #[arg(long, default_value_t = 40.0)]
    voltage: f64,

    /// Fraction of particles that are fusion products.
    #[arg(long, default_value_t = 0.05)]
    products: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output path without extension.
    #[arg(short, long, default_value = "fusion_particles")]
    output: PathBuf,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Uniformly distributed unit vector.
    fn direction(&mut self) -> [f64; 3] {
        let cos_theta = 2.0 * self.next_f64() - 1.0;
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        let phi = 2.0 * std::f64::consts::PI * self.next_f64();
        [sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta]
    }
}

fn with_speed(position: [f64; 3], dir: [f64; 3], speed: f64, mass: f64, charge: f64) -> RawParticle {
    RawParticle {
        vx: dir[0] * speed,
        vy: dir[1] * speed,
        vz: dir[2] * speed,
        ..RawParticle::at_rest(position, mass, charge)
    }
}

/// A deuteron that has fallen through the grid potential down to its radius,
/// moving mostly radially with some transverse scatter.
fn deuteron(rng: &mut SimpleRng, voltage_kv: f64) -> RawParticle {
    let r = GRID_RADIUS * rng.next_f64().cbrt();
    let dir = rng.direction();
    let position = [dir[0] * r, dir[1] * r, dir[2] * r];

    let depth = (1.0 - r / GRID_RADIUS).clamp(0.0, 1.0);
    let energy = (voltage_kv * 1e3 * E * depth * rng.gauss(1.0, 0.1).abs()).max(0.0);
    let speed = (2.0 * energy / M_D).sqrt();

    let sign = if rng.next_f64() < 0.5 { -1.0 } else { 1.0 };
    let mut v = [
        sign * dir[0] + rng.gauss(0.0, 0.15),
        sign * dir[1] + rng.gauss(0.0, 0.15),
        sign * dir[2] + rng.gauss(0.0, 0.15),
    ];
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt().max(1e-12);
    v.iter_mut().for_each(|c| *c /= norm);
    with_speed(position, v, speed, M_D, E)
}

/// A fusion product born near the centre with its reaction energy.
fn product(rng: &mut SimpleRng) -> RawParticle {
    // D-D branches: (n 2.45 MeV + He-3 0.82 MeV) or (p 3.02 MeV + T 1.01 MeV)
    let (mass, charge, mev) = match (rng.next_f64() * 4.0) as u32 {
        0 => (M_N, 0.0, 2.45),
        1 => (M_HE3, 2.0 * E, 0.82),
        2 => (M_P, E, 3.02),
        _ => (M_T, E, 1.01),
    };
    let position = [
        rng.gauss(0.0, 0.005),
        rng.gauss(0.0, 0.005),
        rng.gauss(0.0, 0.005),
    ];
    let speed = (2.0 * mev * MEV / mass).sqrt();
    let dir = rng.direction();
    with_speed(position, dir, speed, mass, charge)
}

fn to_batch(particles: &[RawParticle]) -> Result<RecordBatch> {
    let fields: Vec<Field> = REQUIRED_COLUMNS
        .iter()
        .map(|name| Field::new(*name, DataType::Float64, false))
        .collect();
    let getters: [fn(&RawParticle) -> f64; 8] = [
        |p| p.x,
        |p| p.y,
        |p| p.z,
        |p| p.vx,
        |p| p.vy,
        |p| p.vz,
        |p| p.mass,
        |p| p.charge,
    ];
    let columns: Vec<ArrayRef> = getters
        .iter()
        .map(|get| Arc::new(Float64Array::from_iter_values(particles.iter().map(|p| get(p)))) as ArrayRef)
        .collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let particles: Vec<RawParticle> = (0..args.count)
        .map(|_| {
            if rng.next_f64() < args.products {
                product(&mut rng)
            } else {
                deuteron(&mut rng, args.voltage)
            }
        })
        .collect();

    let csv_path = args.output.with_extension("csv");
    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("creating {}", csv_path.display()))?;
    for p in &particles {
        writer.serialize(p)?;
    }
    writer.flush()?;

    let batch = to_batch(&particles)?;
    let parquet_path = args.output.with_extension("parquet");
    let file = std::fs::File::create(&parquet_path)
        .with_context(|| format!("creating {}", parquet_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;

    info!("preview:\n{}", pretty_format_batches(&[batch.slice(0, batch.num_rows().min(5))])?);
    println!(
        "Wrote {} particles to {} and {}",
        particles.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
