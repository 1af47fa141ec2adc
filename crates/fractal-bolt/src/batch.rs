//! Several independent bolts sharing one parameter template

use crate::generator::LightningGenerator;
use crate::params::RayParameters;
use glam::Vec3;
use log::debug;

/// Golden-ratio step between sibling seeds, so neighbors never share a shape
const SEED_STEP: f32 = 0.618_034;

/// One generator per endpoint pair, updated together
#[derive(Debug, Default)]
pub struct BoltBatch {
    bolts: Vec<LightningGenerator>,
}

impl BoltBatch {
    /// Build one bolt per `(source, dest)` pair, in order
    ///
    /// Each instance copies `template` with its own endpoints and a noise
    /// seed offset derived from its position in the list.
    pub fn from_pairs<I>(template: &RayParameters, pairs: I) -> Self
    where
        I: IntoIterator<Item = (Vec3, Vec3)>,
    {
        let bolts: Vec<_> = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (source, dest))| {
                let params = template
                    .clone()
                    .with_endpoints(source, dest)
                    .with_noise_seed(sibling_seed(template.noise_seed, i));
                LightningGenerator::new(&params)
            })
            .collect();

        debug!("Bolt batch with {} instances", bolts.len());
        Self { bolts }
    }

    /// Update every bolt to `time`
    pub fn update_all(&mut self, time: f32) {
        for bolt in &mut self.bolts {
            bolt.update(time);
        }
    }

    pub fn len(&self) -> usize {
        self.bolts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bolts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LightningGenerator> {
        self.bolts.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut LightningGenerator> {
        self.bolts.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LightningGenerator> {
        self.bolts.iter()
    }

    /// Bolts visible after the last update
    pub fn visible_count(&self) -> usize {
        self.bolts.iter().filter(|b| b.is_visible()).count()
    }

    /// Sum of the draw ranges of all visible bolts
    pub fn total_index_count(&self) -> usize {
        self.bolts
            .iter()
            .filter(|b| b.is_visible())
            .map(|b| b.indices().len())
            .sum()
    }
}

impl<'a> IntoIterator for &'a BoltBatch {
    type Item = &'a LightningGenerator;
    type IntoIter = std::slice::Iter<'a, LightningGenerator>;

    fn into_iter(self) -> Self::IntoIter {
        self.bolts.iter()
    }
}

fn sibling_seed(base: f32, index: usize) -> f32 {
    (base + index as f32 * SEED_STEP).fract()
}
