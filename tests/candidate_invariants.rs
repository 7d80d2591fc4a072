//! Candidate Invariant Tests.
//!
//! Properties that must hold for any seed:
//!
//! 1. **Domain**: after any number of moves every segment stays in range
//! 2. **Velocity clamp**: no component ever exceeds `v_max`
//! 3. **Personal best**: `best_fitness` never decreases
//! 4. **Idempotent scoring**: evaluating twice without moving changes nothing
//!
//! Run with: cargo test --test candidate_invariants

use rand::{rngs::StdRng, Rng, SeedableRng};
use rbfn_swarm::{Candidate, Rbfn, TrainingDataset, TrainingSample, SD_FLOOR};

// =============================================================================
// HELPERS
// =============================================================================

fn wave_dataset() -> TrainingDataset {
    let samples = (0..30)
        .map(|i| {
            let x = i as f64 * 0.5;
            TrainingSample::new(vec![x, 15.0 - x], (x * 0.4).sin() * 35.0)
        })
        .collect();
    TrainingDataset::new(samples).unwrap()
}

fn assert_in_domain(c: &Candidate) {
    let model = c.model();
    let layout = model.layout();
    let (lo, hi) = model.mean_range;
    let pos = c.position();

    for w in &pos[layout.weights()] {
        assert!((-1.0..=1.0).contains(w), "weight {w} out of range");
    }
    for x in &pos[layout.centers()] {
        assert!((lo..=hi).contains(x), "center {x} outside ({lo}, {hi})");
    }
    for sd in &pos[layout.deviations()] {
        assert!(*sd >= SD_FLOOR, "deviation {sd} below floor");
    }
    for v in c.velocity() {
        assert!(v.abs() <= c.v_max(), "velocity {v} exceeds {}", c.v_max());
    }
}

// =============================================================================
// INVARIANTS
// =============================================================================

#[test]
fn test_domain_holds_over_many_moves() {
    let ds = wave_dataset();
    let model = Rbfn::for_dataset(&ds, 4, 3.0);

    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut c = Candidate::random(model, 10.0, &mut rng);
        assert_in_domain(&c);

        for _ in 0..50 {
            let target = Candidate::random(model, 10.0, &mut rng);
            let c1 = rng.gen_range(0.0..=2.0);
            let c2 = rng.gen_range(0.0..=3.0);
            c.update_position(1.0, c1, c2, target.position()).unwrap();
            assert_in_domain(&c);
        }
    }
}

#[test]
fn test_extreme_pull_is_clamped() {
    let ds = wave_dataset();
    let model = Rbfn::for_dataset(&ds, 2, 1.0);
    let mut rng = StdRng::seed_from_u64(99);
    let mut c = Candidate::random(model, 0.5, &mut rng);

    let far = vec![1e6; model.param_count()];
    c.update_position(5.0, 10.0, 10.0, &far).unwrap();
    assert_in_domain(&c);

    let far = vec![-1e6; model.param_count()];
    c.update_position(5.0, 10.0, 10.0, &far).unwrap();
    assert_in_domain(&c);
}

#[test]
fn test_best_fitness_is_monotone() {
    let ds = wave_dataset();
    let model = Rbfn::for_dataset(&ds, 3, 5.0);
    let mut rng = StdRng::seed_from_u64(2024);
    let mut c = Candidate::random(model, 5.0, &mut rng);

    let mut prev_best = c.best_fitness();
    for _ in 0..40 {
        let fitness = c.evaluate_fitness(&ds).unwrap();
        assert!(c.best_fitness() >= prev_best);
        assert!(c.best_fitness() >= fitness);
        prev_best = c.best_fitness();

        let target = Candidate::random(model, 5.0, &mut rng);
        c.update_position(0.8, 1.5, 1.5, target.position()).unwrap();
    }
}

#[test]
fn test_best_position_tracks_best_fitness() {
    let ds = wave_dataset();
    let model = Rbfn::for_dataset(&ds, 3, 5.0);
    let mut rng = StdRng::seed_from_u64(17);
    let mut c = Candidate::random(model, 5.0, &mut rng);

    for _ in 0..20 {
        c.evaluate_fitness(&ds).unwrap();
        let best_error = model.mean_absolute_error(c.best_position(), &ds).unwrap();
        assert_eq!(1.0 / best_error, c.best_fitness());

        let target = Candidate::random(model, 5.0, &mut rng);
        c.update_position(1.0, 2.0, 3.0, target.position()).unwrap();
    }
}

#[test]
fn test_evaluation_is_idempotent() {
    let ds = wave_dataset();
    let model = Rbfn::for_dataset(&ds, 3, 5.0);
    let mut rng = StdRng::seed_from_u64(3);
    let mut c = Candidate::random(model, 5.0, &mut rng);

    let first = c.evaluate_fitness(&ds).unwrap();
    let snapshot = c.clone();
    let second = c.evaluate_fitness(&ds).unwrap();

    assert_eq!(first, second);
    assert_eq!(snapshot, c);
    assert_eq!(c.score(&ds).unwrap().fitness, first);
}

#[test]
fn test_from_parts_rejects_bad_shapes() {
    let model = Rbfn::new(2, 1, (0.0, 1.0), 1.0);
    let n = model.param_count();
    assert!(Candidate::from_parts(model, 1.0, vec![0.0; n], vec![0.0; n]).is_ok());
    assert!(Candidate::from_parts(model, 1.0, vec![0.0; n - 1], vec![0.0; n]).is_err());
    assert!(Candidate::from_parts(model, 1.0, vec![0.0; n], vec![0.0; n + 1]).is_err());
}
