//! Randomized structural properties of generated meshes

use fractal_bolt::params::MAX_SUBRAYS;
use fractal_bolt::{LightningGenerator, RayParameters};
use glam::Vec3;
use proptest::prelude::*;

fn vec3(range: f32) -> impl Strategy<Value = Vec3> {
    (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

prop_compose! {
    fn ray_shape()(
        source in vec3(500.0),
        dest in vec3(500.0),
        up in vec3(1.0),
        radius0 in 0.01f32..10.0,
        radius1 in 0.01f32..10.0,
        roughness in 0.0f32..=1.0,
        straightness in 0.0f32..=1.0,
        noise_seed in 0.0f32..1.0,
    ) -> RayParameters {
        let mut params = RayParameters::default()
            .with_endpoints(source, dest)
            .with_radii(radius0, radius1)
            .with_shape(roughness, straightness)
            .with_noise_seed(noise_seed);
        params.up0 = up;
        params.up1 = up;
        params
    }
}

prop_compose! {
    fn ray_parameters()(
        shape in ray_shape(),
        max_iterations in 0u32..=7,
        ramification in 0u32..=8,
        max_subray_recursion in 0u32..=4,
        recursion_probability in 0.0f32..=1.0,
        period in 0.05f32..10.0,
        duty in 0.0f32..=1.0,
        eternal in any::<bool>(),
        birth in -5.0f32..5.0,
        lifetime in 0.0f32..5.0,
        time_scale in 0.0f32..8.0,
    ) -> RayParameters {
        let params = RayParameters { time_scale, ..shape }
            .with_max_iterations(max_iterations)
            .with_branching(ramification, max_subray_recursion, recursion_probability)
            .with_subray_cycle(period, duty);
        if eternal {
            params.eternal()
        } else {
            params.with_lifetime(birth, birth + lifetime)
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn prop_vertices_are_finite(
        params in ray_parameters(),
        times in prop::collection::vec(-20.0f32..20.0, 5),
    ) {
        let mut generator = LightningGenerator::new(&params);
        for time in times {
            generator.update(time);
            prop_assert!(generator.vertices().iter().all(|v| v.is_finite()));
            if let Some(uvs) = generator.uvs() {
                prop_assert!(uvs.iter().all(|v| v.is_finite()));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_subray_pool_bound(params in ray_parameters(), time in -20.0f32..20.0) {
        let mut generator = LightningGenerator::new(&params);
        generator.update(time);

        let bound = generator.params().max_subrays();
        prop_assert!(bound <= MAX_SUBRAYS);
        prop_assert!(generator.subray_count() <= bound);
        let deepest = generator.subrays().iter().map(|s| s.recursion).max().unwrap_or(0);
        prop_assert!(deepest <= generator.params().max_subray_recursion);
    }

    #[test]
    fn prop_indices_within_draw_range(params in ray_parameters(), time in -20.0f32..20.0) {
        let mut generator = LightningGenerator::new(&params);
        generator.update(time);

        let mesh = generator.mesh();
        prop_assert_eq!(mesh.index_count() % 18, 0);
        prop_assert!(mesh.vertex_count() <= mesh.vertex_capacity());
        prop_assert!(mesh.index_count() <= mesh.index_capacity());
        let vertex_count = mesh.vertex_count() as u32;
        prop_assert!(generator.indices().iter().all(|&i| i < vertex_count));
    }

    #[test]
    fn prop_no_branching_without_recursion_probability(
        params in ray_parameters(),
        times in prop::collection::vec(-20.0f32..20.0, 4),
    ) {
        let params = RayParameters { recursion_probability: 0.0, ..params };
        let mut generator = LightningGenerator::new(&params);
        for time in times {
            generator.update(time);
            if generator.is_visible() {
                prop_assert_eq!(generator.subray_count(), 1);
            }
        }
    }

    #[test]
    fn prop_zero_iterations_single_prism(params in ray_parameters(), time in -20.0f32..20.0) {
        let params = RayParameters {
            max_iterations: 0,
            recursion_probability: 0.0,
            ..params
        }
        .eternal();
        let mut generator = LightningGenerator::new(&params);
        generator.update(time);
        prop_assert_eq!(generator.mesh().vertex_count(), 6);
        prop_assert_eq!(generator.indices().len(), 18);
    }

    #[test]
    fn prop_leaf_count_per_subray(params in ray_parameters(), time in -20.0f32..20.0) {
        let params = params.eternal();
        let mut generator = LightningGenerator::new(&params);
        generator.update(time);

        // The eternal root strip comes first and is complete
        let root_prisms = 1usize << generator.params().max_iterations;
        prop_assert!(generator.indices().len() >= 18 * root_prisms);
        prop_assert!(generator.mesh().vertex_count() >= 3 * (root_prisms + 1));
    }
}
