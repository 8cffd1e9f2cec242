use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hmm_annotator::data::loader;
use hmm_annotator::data::naming;
use hmm_annotator::data::repository::RAW_DATA_DIR;

/// Write a synthetic storage root of nightly SSINS series.
#[derive(Debug, Parser)]
#[command(name = "generate_sample", about)]
struct Args {
    /// Storage root to create (raw_data/ is written inside it).
    #[arg(short, long, default_value = "assets")]
    out: PathBuf,

    /// Number of nights.
    #[arg(long, default_value_t = 6)]
    nights: u32,

    /// Pointings per night.
    #[arg(long, default_value_t = 5)]
    pointings: u8,

    /// Samples per series.
    #[arg(long, default_value_t = 400)]
    samples: usize,

    /// File extension: parquet, json, csv or npy.
    #[arg(long, default_value = "parquet")]
    format: String,

    #[arg(long, default_value_t = 42)]
    seed: u64,
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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }
}

/// Background noise with a few RFI events: a linear rise, an exponential
/// decay, and the occasional single-sample blip.
fn generate_series(samples: usize, rng: &mut SimpleRng) -> Vec<f64> {
    let mut y: Vec<f64> = (0..samples).map(|_| rng.gauss(0.0, 0.05)).collect();
    if samples < 40 {
        return y;
    }

    let events = 1 + rng.below(3);
    for _ in 0..events {
        let start = rng.below(samples - 30);
        let rise = 5 + rng.below(15);
        let peak = 0.5 + 2.0 * rng.next_f64();
        let tau = 5.0 + 20.0 * rng.next_f64();
        for (k, v) in y.iter_mut().enumerate().skip(start) {
            let dt = (k - start) as f64;
            *v += if k - start < rise {
                peak * dt / rise as f64
            } else {
                peak * (-(dt - rise as f64) / tau).exp()
            };
        }
    }

    for _ in 0..rng.below(4) {
        let at = rng.below(samples);
        y[at] += 1.0 + rng.next_f64();
    }
    y
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let raw = args.out.join(RAW_DATA_DIR);
    fs::create_dir_all(&raw).with_context(|| format!("creating {}", raw.display()))?;

    let mut written = 0;
    for night in 0..args.nights {
        let night_id = 2459800 + night;
        for pointing in 0..args.pointings {
            let mut name = format!("ssins_dtv7_{night_id}_p{pointing}.{}", args.format);
            // Roughly one recording in ten starts out flagged.
            if rng.below(10) == 0 {
                name = naming::apply_prefix(&name);
            }
            let series = generate_series(args.samples, &mut rng);
            let path = raw.join(&name);
            loader::write_series(&path, &series)
                .with_context(|| format!("writing {}", path.display()))?;
            log::debug!("wrote {}", path.display());
            written += 1;
        }
    }

    println!(
        "Wrote {written} series ({} samples each) to {}",
        args.samples,
        raw.display()
    );
    Ok(())
}
