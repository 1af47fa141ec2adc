//! Table-driven random sequence with a restorable cursor
//!
//! Branch decisions must not depend on how many children a subray spawned
//! before them, so the generator hands out values from a fixed table and
//! exposes its read cursor. Saving the cursor, jumping to a child's seed and
//! restoring afterwards leaves the parent's sequence exactly as it was.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of precomputed samples (prime, so seed products spread evenly)
pub const SEED_TABLE_LEN: usize = 2053;

/// Seed used for the sample table when none is given
pub const DEFAULT_TABLE_SEED: u64 = 0x6c69_6768_746e_696e;

/// Deterministic pseudo-random sequence over a precomputed table
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    table: Box<[f32]>,
    cursor: usize,
}

impl RandomGenerator {
    /// Create a generator over the default sample table
    pub fn new() -> Self {
        Self::with_table_seed(DEFAULT_TABLE_SEED)
    }

    /// Create a generator whose sample table is filled from `table_seed`
    pub fn with_table_seed(table_seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(table_seed);
        let table = (0..SEED_TABLE_LEN)
            .map(|_| rng.random::<f32>())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self { table, cursor: 0 }
    }

    /// Next value in `[0, 1)`, advancing the cursor with wrap-around
    #[inline]
    pub fn random(&mut self) -> f32 {
        let value = self.table[self.cursor];
        self.cursor = (self.cursor + 1) % self.table.len();
        value
    }

    /// Current cursor as a fraction of the table length
    pub fn seed(&self) -> f32 {
        self.cursor as f32 / self.table.len() as f32
    }

    /// Move the cursor to `floor(seed * N) mod N`
    ///
    /// Negative and oversized seeds wrap; a NaN seed selects the first slot.
    pub fn set_seed(&mut self, seed: f32) {
        let len = self.table.len() as i64;
        let slot = (seed * len as f32).floor() as i64;
        self.cursor = slot.rem_euclid(len) as usize;
    }

    /// Exact cursor position, for bracketing nested work
    #[inline]
    pub fn save(&self) -> usize {
        self.cursor
    }

    /// Return to a cursor obtained from [`save`](Self::save)
    #[inline]
    pub fn restore(&mut self, cursor: usize) {
        self.cursor = cursor % self.table.len();
    }

    /// Number of samples in the table
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false; the table is never empty
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}
