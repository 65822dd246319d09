use absor::{
    solve, solve_detailed, solve_interleaved, solve_pairs, Correspondence, CorrespondenceSet,
    DegeneracyKind, ErrorKind, Pose6D, SolveError, SolveOptions, Transform,
};
use approx::assert_relative_eq;
use glam::{DMat3, DQuat, DVec3};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scenario_points() -> Vec<DVec3> {
    vec![
        DVec3::new(0.0, 0.5, 0.4),
        DVec3::new(1.0, 1.5, -0.1),
        DVec3::new(1.2, 1.1, 0.9),
        DVec3::new(0.7, 0.3, 3.4),
        DVec3::new(1.9, 2.5, -1.7),
    ]
}

fn scenario_pose() -> Pose6D {
    Pose6D::from_translation_ypr(
        DVec3::new(0.5, 1.5, 0.75),
        10f64.to_radians(),
        20f64.to_radians(),
        5f64.to_radians(),
    )
}

fn random_points(rng: &mut StdRng, n: usize) -> Vec<DVec3> {
    (0..n)
        .map(|_| {
            DVec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            )
        })
        .collect()
}

// uniformly distributed unit quaternion (Shoemake)
fn random_rotation(rng: &mut StdRng) -> DQuat {
    let r1: f64 = rng.random();
    let r2: f64 = rng.random();
    let r3: f64 = rng.random();
    let tau = 2.0 * std::f64::consts::PI;

    DQuat::from_xyzw(
        (1.0 - r1).sqrt() * (tau * r2).cos(),
        r1.sqrt() * (tau * r3).sin(),
        r1.sqrt() * (tau * r3).cos(),
        (1.0 - r1).sqrt() * (tau * r2).sin(),
    )
    .normalize()
}

fn assert_same_rotation(a: DQuat, b: DQuat, epsilon: f64) {
    assert!(
        DMat3::from_quat(a).abs_diff_eq(DMat3::from_quat(b), epsilon),
        "rotations differ: {a} vs {b}"
    );
}

#[test]
fn identity_correspondences() -> Result<(), SolveError> {
    init_logger();
    let mut rng = StdRng::seed_from_u64(1);
    let a = random_points(&mut rng, 30);

    for options in [SolveOptions::default(), SolveOptions::default().with_scale(true)] {
        let t = solve(&CorrespondenceSet::from_point_lists(&a, &a)?, &options)?;
        assert_relative_eq!(t.rotation.w, 1.0, epsilon = 1e-9);
        assert_relative_eq!(t.rotation.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(t.rotation.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(t.rotation.z, 0.0, epsilon = 1e-9);
        assert_relative_eq!(t.translation, DVec3::ZERO, epsilon = 1e-9);
        assert_relative_eq!(t.scale, 1.0, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn recovers_random_similarity() -> Result<(), SolveError> {
    init_logger();
    let mut rng = StdRng::seed_from_u64(1234);
    let options = SolveOptions::default().with_scale(true);

    for trial in 0..200 {
        let n = 3 + trial % 20;
        let a = random_points(&mut rng, n);
        let truth = Transform::new(
            random_rotation(&mut rng),
            DVec3::new(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            ),
            rng.random_range(0.1..10.0),
        );
        let b = a.iter().map(|&p| truth.transform_point(p)).collect::<Vec<_>>();

        let t = solve(&CorrespondenceSet::from_point_lists(&a, &b)?, &options)?;

        assert!(t.rotation.w >= 0.0);
        assert_relative_eq!(t.rotation.length(), 1.0, epsilon = 1e-12);
        assert_same_rotation(t.rotation, truth.rotation, 1e-6);
        assert_relative_eq!(t.translation, truth.translation, epsilon = 1e-6);
        assert_relative_eq!(t.scale, truth.scale, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn recovers_rigid_half_turns() -> Result<(), SolveError> {
    // w = 0 quaternions, the canonical sign falls back to the vector part
    let a = scenario_points();
    for axis in [DVec3::X, DVec3::Y, DVec3::Z, DVec3::new(1.0, -1.0, 2.0).normalize()] {
        let truth = Transform::from_rotation_translation(
            DQuat::from_axis_angle(axis, std::f64::consts::PI),
            DVec3::new(-1.0, 0.0, 2.0),
        );
        let b = a.iter().map(|&p| truth.transform_point(p)).collect::<Vec<_>>();
        let t = solve(&CorrespondenceSet::from_point_lists(&a, &b)?, &SolveOptions::default())?;
        assert_same_rotation(t.rotation, truth.rotation, 1e-9);
        assert_relative_eq!(t.translation, truth.translation, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn permutation_invariance() -> Result<(), SolveError> {
    let mut rng = StdRng::seed_from_u64(99);
    let a = random_points(&mut rng, 40);
    let truth = Transform::new(random_rotation(&mut rng), DVec3::new(0.3, -2.0, 1.0), 1.3);
    let mut pairs = a
        .iter()
        .map(|&p| {
            let noise = DVec3::new(
                rng.random_range(-0.01..0.01),
                rng.random_range(-0.01..0.01),
                rng.random_range(-0.01..0.01),
            );
            (p, truth.transform_point(p) + noise)
        })
        .collect::<Vec<_>>();

    let options = SolveOptions::default().with_scale(true);
    let reference = solve_pairs(&pairs, &options)?;

    for _ in 0..10 {
        pairs.shuffle(&mut rng);
        let t = solve_pairs(&pairs, &options)?;
        assert_relative_eq!(t.rotation, reference.rotation, epsilon = 1e-9);
        assert_relative_eq!(t.translation, reference.translation, epsilon = 1e-9);
        assert_relative_eq!(t.scale, reference.scale, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn degenerate_rejection() {
    let options = SolveOptions::default();

    let collinear = [
        (DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0)),
        (DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 2.0, 0.0)),
        (DVec3::new(3.0, 0.0, 0.0), DVec3::new(0.0, 4.0, 0.0)),
    ];
    let err = solve_pairs(&collinear, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegenerateGeometry);
    assert!(matches!(
        err,
        SolveError::DegenerateGeometry(DegeneracyKind::Collinear)
    ));

    let err = solve_pairs(&collinear[..2], &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientCorrespondences);

    let err = solve_pairs(&[], &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientCorrespondences);

    let coincident = [(DVec3::ONE, DVec3::ZERO); 5];
    let err = solve_pairs(&coincident, &options.clone().with_scale(true)).unwrap_err();
    assert!(matches!(
        err,
        SolveError::DegenerateGeometry(DegeneracyKind::Coincident)
    ));

    let mut non_finite = scenario_points()
        .into_iter()
        .map(|p| (p, p))
        .collect::<Vec<_>>();
    non_finite[3].1.z = f64::NEG_INFINITY;
    let err = solve_pairs(&non_finite, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NonFiniteInput);
}

#[test]
fn scenario_yaw_pitch_roll() -> Result<(), SolveError> {
    init_logger();
    let pose = scenario_pose();
    let truth = pose.to_transform();
    let a = scenario_points();
    let b = a.iter().map(|&p| truth.transform_point(p)).collect::<Vec<_>>();

    let t = solve(&CorrespondenceSet::from_point_lists(&a, &b)?, &SolveOptions::default())?;
    assert_same_rotation(t.rotation, truth.rotation, 1e-6);
    assert_relative_eq!(t.translation, DVec3::new(0.5, 1.5, 0.75), epsilon = 1e-6);

    let estimated = t.to_pose6d()?;
    assert_relative_eq!(estimated.yaw, pose.yaw, epsilon = 1e-6);
    assert_relative_eq!(estimated.pitch, pose.pitch, epsilon = 1e-6);
    assert_relative_eq!(estimated.roll, pose.roll, epsilon = 1e-6);
    Ok(())
}

#[test]
fn scenario_inverse_composed_points() -> Result<(), SolveError> {
    // frame B points generated as pose⁻¹ ⊕ a, so the pose maps B into A
    let pose = scenario_pose();
    let b_from_a = pose.to_transform().inverse();
    let a = scenario_points();
    let b = a.iter().map(|&p| b_from_a.transform_point(p)).collect::<Vec<_>>();
    let set = CorrespondenceSet::from_point_lists(&a, &b)?;

    let a_from_b = solve(&set.reversed(), &SolveOptions::default())?.to_pose6d()?;
    assert_relative_eq!(a_from_b.translation(), pose.translation(), epsilon = 1e-6);
    assert_relative_eq!(a_from_b.yaw, pose.yaw, epsilon = 1e-6);
    assert_relative_eq!(a_from_b.pitch, pose.pitch, epsilon = 1e-6);
    assert_relative_eq!(a_from_b.roll, pose.roll, epsilon = 1e-6);

    let forward = solve(&set, &SolveOptions::default())?;
    assert_same_rotation(forward.rotation, b_from_a.rotation, 1e-6);
    assert_relative_eq!(forward.translation, b_from_a.translation, epsilon = 1e-6);
    Ok(())
}

#[test]
fn call_styles_agree() -> Result<(), Box<dyn std::error::Error>> {
    let truth = scenario_pose().to_transform();
    let a = scenario_points();
    let b = a.iter().map(|&p| truth.transform_point(p)).collect::<Vec<_>>();
    let options = SolveOptions::default();

    // matching-pair list with indices
    let matches = a
        .iter()
        .zip(b.iter())
        .enumerate()
        .map(|(i, (&pa, &pb))| Correspondence::new(pa, pb).with_indices(i, i))
        .collect::<Vec<_>>();
    let from_matches = solve(&CorrespondenceSet::from_correspondences(matches)?, &options)?;

    let pairs = a.iter().copied().zip(b.iter().copied()).collect::<Vec<_>>();
    let from_pairs = solve_pairs(&pairs, &options)?;

    let interleaved = pairs
        .iter()
        .flat_map(|(pa, pb)| [pa.x, pa.y, pa.z, pb.x, pb.y, pb.z])
        .collect::<Vec<_>>();
    let from_interleaved = solve_interleaved(&interleaved, &options)?;

    assert_eq!(from_matches, from_pairs);
    assert_eq!(from_pairs, from_interleaved);

    // output adapters describe the same transform
    let pose6d = from_pairs.to_pose6d()?.to_transform();
    let pose_quat = from_pairs.to_pose_quat()?.to_transform();
    let p = DVec3::new(0.1, -0.2, 0.3);
    assert_relative_eq!(pose6d.transform_point(p), from_pairs.transform_point(p), epsilon = 1e-12);
    assert_relative_eq!(pose_quat.transform_point(p), from_pairs.transform_point(p), epsilon = 1e-12);
    let (q, t, s) = from_pairs.as_tuple();
    assert_relative_eq!(
        from_pairs.to_homogeneous().transform_point3(p),
        q * p * s + t,
        epsilon = 1e-12
    );
    Ok(())
}

#[test]
fn integer_weights_match_duplicated_pairs() -> Result<(), SolveError> {
    let mut rng = StdRng::seed_from_u64(5);
    let a = random_points(&mut rng, 8);
    let b = a
        .iter()
        .map(|&p| p + DVec3::new(rng.random_range(-0.1..0.1), rng.random_range(-0.1..0.1), 0.0))
        .collect::<Vec<_>>();
    let weights = (0..a.len()).map(|i| (1 + i % 3) as f64).collect::<Vec<_>>();

    let weighted = CorrespondenceSet::from_point_lists(&a, &b)?.with_weights(&weights)?;

    let mut dup_a = Vec::new();
    let mut dup_b = Vec::new();
    for ((&pa, &pb), &w) in a.iter().zip(b.iter()).zip(weights.iter()) {
        for _ in 0..w as usize {
            dup_a.push(pa);
            dup_b.push(pb);
        }
    }
    let duplicated = CorrespondenceSet::from_point_lists(&dup_a, &dup_b)?;

    let options = SolveOptions::default().with_scale(true);
    let t_weighted = solve(&weighted, &options)?;
    let t_dup = solve(&duplicated, &options)?;
    assert_relative_eq!(t_weighted.rotation, t_dup.rotation, epsilon = 1e-9);
    assert_relative_eq!(t_weighted.translation, t_dup.translation, epsilon = 1e-9);
    assert_relative_eq!(t_weighted.scale, t_dup.scale, epsilon = 1e-9);
    Ok(())
}

#[test]
fn agrees_with_svd_kabsch() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(2024);
    let a = random_points(&mut rng, 25);
    let truth = Transform::from_rotation_translation(random_rotation(&mut rng), DVec3::new(1.0, 2.0, 3.0));
    let b = a
        .iter()
        .map(|&p| {
            truth.transform_point(p)
                + DVec3::new(
                    rng.random_range(-0.05..0.05),
                    rng.random_range(-0.05..0.05),
                    rng.random_range(-0.05..0.05),
                )
        })
        .collect::<Vec<_>>();

    let solution = solve_detailed(&CorrespondenceSet::from_point_lists(&a, &b)?, &SolveOptions::default())?;

    // H = Σ b̃ ãᵀ, R = U diag(1, 1, det(U Vᵀ)) Vᵀ
    let ca = solution.centroid_a;
    let cb = solution.centroid_b;
    let mut h = nalgebra::Matrix3::<f64>::zeros();
    for (pa, pb) in a.iter().zip(b.iter()) {
        let da = nalgebra::Vector3::new(pa.x - ca.x, pa.y - ca.y, pa.z - ca.z);
        let db = nalgebra::Vector3::new(pb.x - cb.x, pb.y - cb.y, pb.z - cb.z);
        h += db * da.transpose();
    }
    let svd = h.svd(true, true);
    let u = svd.u.ok_or("failed to compute U")?;
    let v_t = svd.v_t.ok_or("failed to compute V^T")?;
    let d = (u * v_t).determinant().signum();
    let r = u * nalgebra::Matrix3::from_diagonal(&nalgebra::Vector3::new(1.0, 1.0, d)) * v_t;

    let r_horn = solution.transform.rotation_matrix();
    for i in 0..3 {
        for j in 0..3 {
            assert_relative_eq!(r_horn.col(j)[i], r[(i, j)], epsilon = 1e-9);
        }
    }
    Ok(())
}

#[test]
fn concurrent_solves() -> Result<(), SolveError> {
    let truth = scenario_pose().to_transform();
    let a = scenario_points();
    let b = a.iter().map(|&p| truth.transform_point(p)).collect::<Vec<_>>();
    let set = CorrespondenceSet::from_point_lists(&a, &b)?;
    let options = SolveOptions::default();
    let expected = solve(&set, &options)?;

    let results = std::thread::scope(|s| {
        let handles = (0..4)
            .map(|_| s.spawn(|| solve(&set, &options)))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().expect("solver thread panicked"))
            .collect::<Vec<_>>()
    });

    for res in results {
        assert_eq!(res?, expected);
    }
    Ok(())
}

fn assert_solution_finite(solution: &absor::Solution) {
    let t = &solution.transform;
    assert!(t.rotation.is_finite(), "rotation {}", t.rotation);
    assert!(t.translation.is_finite(), "translation {}", t.translation);
    assert!(t.scale.is_finite(), "scale {}", t.scale);
    assert!(solution.eigenvalues.is_finite());
    assert!(solution.centroid_a.is_finite() && solution.centroid_b.is_finite());
    assert!(solution.rms_error.is_finite());
}

#[test]
fn recovers_across_magnitudes() -> Result<(), SolveError> {
    init_logger();
    let q = DQuat::from_axis_angle(DVec3::new(0.2, -1.0, 0.6).normalize(), 0.9);
    let options = SolveOptions::default().with_scale(true);

    for unit in [1.0e-150, 1.0e-8, 1.0e-4, 1.0, 1.0e4, 1.0e50, 1.0e150, 1.0e300] {
        let truth = Transform::new(q, DVec3::new(0.5, 1.5, 0.75) * unit, 2.5);
        let a = scenario_points().iter().map(|&p| p * unit).collect::<Vec<_>>();
        let b = a.iter().map(|&p| truth.transform_point(p)).collect::<Vec<_>>();

        let solution = solve_detailed(&CorrespondenceSet::from_point_lists(&a, &b)?, &options)?;
        assert_solution_finite(&solution);

        let t = solution.transform;
        assert_same_rotation(t.rotation, q, 1e-9);
        assert_relative_eq!(t.scale, 2.5, max_relative = 1e-9);
        assert_relative_eq!(t.translation / unit, truth.translation / unit, epsilon = 1e-9);
        assert!(solution.rms_error <= 1e-9 * unit);
    }
    Ok(())
}

#[test]
fn recovers_far_from_origin() -> Result<(), SolveError> {
    init_logger();
    let q = DQuat::from_rotation_z(0.3);

    for offset in [1.0e2, 1.0e4, 1.0e6, 1.0e7, 1.0e8] {
        let a = scenario_points()
            .iter()
            .map(|&p| p * 0.5 + DVec3::splat(offset))
            .collect::<Vec<_>>();
        let b = a.iter().map(|&p| q * p).collect::<Vec<_>>();

        let solution = solve_detailed(
            &CorrespondenceSet::from_point_lists(&a, &b)?,
            &SolveOptions::default(),
        )?;
        assert_solution_finite(&solution);

        // coordinates carry an absolute rounding error of about ε · offset
        let tolerance = 1e-10 + 1e-13 * offset;
        assert_same_rotation(solution.transform.rotation, q, tolerance);
        assert!(solution.rms_error <= tolerance, "rms {}", solution.rms_error);
    }
    Ok(())
}

#[test]
fn small_clouds_are_not_coincident() -> Result<(), SolveError> {
    init_logger();
    let q = DQuat::from_rotation_z(0.3);

    for unit in [1.0e-9, 1.0e-12, 1.0e-100] {
        let a = scenario_points().iter().map(|&p| p * unit).collect::<Vec<_>>();
        let b = a.iter().map(|&p| q * p).collect::<Vec<_>>();
        let t = solve(&CorrespondenceSet::from_point_lists(&a, &b)?, &SolveOptions::default())?;
        assert_same_rotation(t.rotation, q, 1e-9);
    }

    // a cluster that is a single point up to rounding is still rejected
    let p = DVec3::new(1.0e8 + 0.1, 2.0e8, -3.0e8);
    let res = solve_pairs(
        &[(p, DVec3::ZERO), (p, DVec3::X), (p, DVec3::Y), (p, DVec3::Z)],
        &SolveOptions::default(),
    );
    assert!(matches!(
        res,
        Err(SolveError::DegenerateGeometry(DegeneracyKind::Coincident))
    ));
    Ok(())
}
