//! Multi-bolt orchestration

use fractal_bolt::{BoltBatch, LightningGenerator, RayParameters};
use glam::Vec3;
use pretty_assertions::assert_eq;

fn fan(n: usize) -> Vec<(Vec3, Vec3)> {
    (0..n)
        .map(|i| {
            let angle = i as f32 * 0.4;
            (Vec3::ZERO, Vec3::new(angle.cos(), 1.0, angle.sin()) * 80.0)
        })
        .collect()
}

#[test]
fn test_batch_matches_individual_generators() {
    let template = RayParameters::default().with_max_iterations(5);
    let pairs = fan(3);
    let mut batch = BoltBatch::from_pairs(&template, pairs.clone());
    batch.update_all(0.75);

    for (bolt, (source, dest)) in batch.iter().zip(pairs) {
        let params = bolt.params().clone();
        assert_eq!(params.source_offset, source);
        assert_eq!(params.dest_offset, dest);

        let mut single = LightningGenerator::new(&params);
        single.update(0.75);
        assert_eq!(single.indices(), bolt.indices());
        assert_eq!(single.vertices(), bolt.vertices());
    }
}

#[test]
fn test_siblings_do_not_share_shape() {
    let template = RayParameters::default().with_max_iterations(5);
    let same = vec![(Vec3::ZERO, Vec3::new(0.0, 50.0, 0.0)); 2];
    let mut batch = BoltBatch::from_pairs(&template, same);
    batch.update_all(1.0);

    let first = batch.get(0).unwrap();
    let second = batch.get(1).unwrap();
    assert_ne!(first.vertices(), second.vertices());
}

#[test]
fn test_staggered_lifetimes() {
    let template = RayParameters::default()
        .with_max_iterations(4)
        .with_lifetime(0.0, 1.0);
    let mut batch = BoltBatch::from_pairs(&template, fan(4));
    batch.update_all(0.5);
    assert_eq!(batch.visible_count(), 4);

    if let Some(bolt) = batch.get_mut(2) {
        bolt.set_endpoints(Vec3::ONE, Vec3::new(1.0, 30.0, 1.0));
    }
    batch.update_all(0.5);
    assert_eq!(batch.get(2).map(|b| b.params().source_offset), Some(Vec3::ONE));

    let counted: usize = (&batch).into_iter().map(|b| b.indices().len()).sum();
    assert_eq!(counted, batch.total_index_count());
}
