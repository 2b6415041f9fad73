use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Two peaks on a sloped background. The primary peak broadens and the
/// secondary one grows with temperature.
fn generate_scan(x: &[f64], temperature: f64, rng: &mut SimpleRng) -> Vec<f64> {
    let t = temperature / 100.0;
    x.iter()
        .map(|&v| {
            let background = 0.2 + 0.002 * v;
            let primary = gaussian(v, 35.0, 2.0 + 0.8 * t, 1.0);
            let secondary = gaussian(v, 65.0, 3.0, 0.4 + 0.3 * t);
            background + primary + secondary + rng.gauss(0.0, 0.004)
        })
        .collect()
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
}

fn main() -> Result<()> {
    let dir = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("sample_scans"), PathBuf::from);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);

    // x: 0 → 100, step 0.25
    let x: Vec<f64> = (0..=400).map(|i| i as f64 * 0.25).collect();
    let temperatures = [-20.0, 0.0, 25.0, 50.0, 75.0, 100.0];

    for &temperature in &temperatures {
        let y = generate_scan(&x, temperature, &mut rng);
        let mut text = String::with_capacity(x.len() * 24);
        for (a, b) in x.iter().zip(&y) {
            writeln!(text, "{a},{b:.6}")?;
        }
        let path = dir.join(format!("run{temperature}.csv"));
        fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    println!(
        "Wrote {} scans ({} points each) to {}",
        temperatures.len(),
        x.len(),
        dir.display()
    );
    Ok(())
}
