//! Seeded 4D simplex noise and the three-channel displacement field
//!
//! Each channel owns its own permutation table so the x, y and z
//! displacements are decorrelated. Lattice math runs in `f64`; large but
//! finite inputs therefore fall off the kernel support and return zero
//! instead of overflowing.

use crate::rng::RandomGenerator;
use glam::Vec3;

const PERM_LEN: usize = 256;

/// Skew factor for 4D: (sqrt(5) - 1) / 4
const F4: f64 = 0.309_016_994_374_947_45;
/// Unskew factor for 4D: (5 - sqrt(5)) / 20
const G4: f64 = 0.138_196_601_125_010_5;

/// Output scale bringing the kernel sum to roughly [-1, 1]
const NOISE_SCALE: f64 = 27.0;

const GRAD4: [[f64; 4]; 32] = [
    [0.0, 1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0, -1.0],
    [0.0, 1.0, -1.0, 1.0],
    [0.0, 1.0, -1.0, -1.0],
    [0.0, -1.0, 1.0, 1.0],
    [0.0, -1.0, 1.0, -1.0],
    [0.0, -1.0, -1.0, 1.0],
    [0.0, -1.0, -1.0, -1.0],
    [1.0, 0.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, -1.0],
    [1.0, 0.0, -1.0, 1.0],
    [1.0, 0.0, -1.0, -1.0],
    [-1.0, 0.0, 1.0, 1.0],
    [-1.0, 0.0, 1.0, -1.0],
    [-1.0, 0.0, -1.0, 1.0],
    [-1.0, 0.0, -1.0, -1.0],
    [1.0, 1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0, -1.0],
    [1.0, -1.0, 0.0, 1.0],
    [1.0, -1.0, 0.0, -1.0],
    [-1.0, 1.0, 0.0, 1.0],
    [-1.0, 1.0, 0.0, -1.0],
    [-1.0, -1.0, 0.0, 1.0],
    [-1.0, -1.0, 0.0, -1.0],
    [1.0, 1.0, 1.0, 0.0],
    [1.0, 1.0, -1.0, 0.0],
    [1.0, -1.0, 1.0, 0.0],
    [1.0, -1.0, -1.0, 0.0],
    [-1.0, 1.0, 1.0, 0.0],
    [-1.0, 1.0, -1.0, 0.0],
    [-1.0, -1.0, 1.0, 0.0],
    [-1.0, -1.0, -1.0, 0.0],
];

/// Single-channel 4D simplex noise
#[derive(Debug, Clone)]
pub struct SimplexNoise {
    /// Permutation doubled to avoid index wrapping
    perm: Box<[u8; PERM_LEN * 2]>,
}

impl SimplexNoise {
    /// Build a permutation by shuffling `0..256` with draws from `rng`
    pub fn from_rng(rng: &mut RandomGenerator) -> Self {
        let mut base: [u8; PERM_LEN] = std::array::from_fn(|i| i as u8);

        for i in (1..PERM_LEN).rev() {
            let j = ((rng.random() * (i + 1) as f32) as usize).min(i);
            base.swap(i, j);
        }

        let mut perm = Box::new([0u8; PERM_LEN * 2]);
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = base[i % PERM_LEN];
        }

        Self { perm }
    }

    #[inline]
    fn hash(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// Sample the field at `(x, y, z, w)`; result lies in about `[-1, 1]`
    pub fn noise4(&self, x: f64, y: f64, z: f64, w: f64) -> f64 {
        let s = (x + y + z + w) * F4;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let k = (z + s).floor();
        let l = (w + s).floor();

        let t = (i + j + k + l) * G4;
        let x0 = x - (i - t);
        let y0 = y - (j - t);
        let z0 = z - (k - t);
        let w0 = w - (l - t);

        // Rank the offsets to pick the simplex traversal order
        let mut rank = [0u8; 4];
        let offsets = [x0, y0, z0, w0];
        for a in 0..4 {
            for b in (a + 1)..4 {
                if offsets[a] > offsets[b] {
                    rank[a] += 1;
                } else {
                    rank[b] += 1;
                }
            }
        }

        let step = |threshold: u8| -> [usize; 4] {
            [
                usize::from(rank[0] >= threshold),
                usize::from(rank[1] >= threshold),
                usize::from(rank[2] >= threshold),
                usize::from(rank[3] >= threshold),
            ]
        };
        let corners = [[0, 0, 0, 0], step(3), step(2), step(1), [1, 1, 1, 1]];

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let kk = (k as i64 & 255) as usize;
        let ll = (l as i64 & 255) as usize;

        let mut total = 0.0;
        for (n, corner) in corners.iter().enumerate() {
            let unskew = n as f64 * G4;
            let dx = x0 - corner[0] as f64 + unskew;
            let dy = y0 - corner[1] as f64 + unskew;
            let dz = z0 - corner[2] as f64 + unskew;
            let dw = w0 - corner[3] as f64 + unskew;

            let falloff = 0.6 - dx * dx - dy * dy - dz * dz - dw * dw;
            if falloff <= 0.0 {
                continue;
            }

            let gradient_index = self.hash(
                ii + corner[0]
                    + self.hash(
                        jj + corner[1] + self.hash(kk + corner[2] + self.hash(ll + corner[3])),
                    ),
            ) % GRAD4.len();
            let g = GRAD4[gradient_index];

            let falloff = falloff * falloff;
            total += falloff * falloff * (g[0] * dx + g[1] * dy + g[2] * dz + g[3] * dw);
        }

        NOISE_SCALE * total
    }
}

/// Three decorrelated simplex channels producing a displacement vector
#[derive(Debug, Clone)]
pub struct NoiseField {
    x: SimplexNoise,
    y: SimplexNoise,
    z: SimplexNoise,
}

impl NoiseField {
    /// Build the three channels from consecutive draws of `rng`
    pub fn from_rng(rng: &mut RandomGenerator) -> Self {
        Self {
            x: SimplexNoise::from_rng(rng),
            y: SimplexNoise::from_rng(rng),
            z: SimplexNoise::from_rng(rng),
        }
    }

    /// Displacement at `point` and `time_dimension`, each component in about `[-1, 1]`
    pub fn noise3(&self, point: Vec3, time_dimension: f64) -> Vec3 {
        let (px, py, pz) = (point.x as f64, point.y as f64, point.z as f64);
        Vec3::new(
            self.x.noise4(px, py, pz, time_dimension) as f32,
            self.y.noise4(px, py, pz, time_dimension) as f32,
            self.z.noise4(px, py, pz, time_dimension) as f32,
        )
    }
}
