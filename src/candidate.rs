//! Swarm candidates: one RBF parameter vector each.
//!
//! A [`Candidate`] owns its position (the parameter vector), its velocity,
//! and its personal best. Fitness is the reciprocal of the mean absolute
//! error over the training set.
//!
//! Scoring is split in two so it can run on a worker: [`Candidate::score`]
//! is a pure function of the position, and [`Candidate::apply`] writes an
//! [`Evaluation`] back and runs the personal-best check in the same call.
//! [`Candidate::evaluate_fitness`] does both in place.

use rand::Rng;

use crate::config::{DEGENERATE_FITNESS, SD_INIT_FLOOR};
use crate::dataset::TrainingDataset;
use crate::error::SwarmResult;
use crate::rbfn::Rbfn;

/// Result of scoring one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Mean absolute error over the dataset.
    pub error: f64,
    /// `1 / error`, or [`DEGENERATE_FITNESS`] when the error is zero.
    pub fitness: f64,
}

impl Evaluation {
    /// Derives fitness from a training error.
    pub fn from_error(error: f64) -> Self {
        let fitness = if error == 0.0 {
            DEGENERATE_FITNESS
        } else {
            1.0 / error
        };
        Self { error, fitness }
    }
}

/// One member of the swarm.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    model: Rbfn,
    v_max: f64,
    position: Vec<f64>,
    velocity: Vec<f64>,
    best_position: Vec<f64>,
    fitness: f64,
    best_fitness: f64,
    error: f64,
}

impl Candidate {
    /// Creates a candidate at a random point of the search space.
    ///
    /// - bias and weights: uniform in `[-1, 1]`
    /// - centers: uniform in `model.mean_range`
    /// - standard deviations: uniform in `[0.01, sd_max]`, or exactly
    ///   `sd_max` when it is below `0.01`
    /// - velocity: uniform in `[-v_max, v_max]`
    pub fn random<R: Rng>(model: Rbfn, v_max: f64, rng: &mut R) -> Self {
        let layout = model.layout();
        let (lo, hi) = model.mean_range;
        let sd_hi = model.sd_max;
        let sd_lo = SD_INIT_FLOOR.min(sd_hi);

        let mut position = Vec::with_capacity(layout.len());
        position.extend((0..layout.weights().len()).map(|_| rng.gen_range(-1.0..=1.0)));
        position.extend((0..layout.centers().len()).map(|_| rng.gen_range(lo..=hi)));
        position.extend((0..layout.deviations().len()).map(|_| rng.gen_range(sd_lo..=sd_hi)));

        let velocity = (0..layout.len())
            .map(|_| rng.gen_range(-v_max..=v_max))
            .collect();

        Self::with_state(model, v_max, position, velocity)
    }

    /// Creates a candidate from explicit vectors.
    ///
    /// # Errors
    ///
    /// [`SwarmError::ShapeMismatch`](crate::SwarmError::ShapeMismatch) if
    /// either vector does not fit the model's parameter layout.
    pub fn from_parts(
        model: Rbfn,
        v_max: f64,
        position: Vec<f64>,
        velocity: Vec<f64>,
    ) -> SwarmResult<Self> {
        let layout = model.layout();
        layout.check(&position)?;
        layout.check(&velocity)?;
        Ok(Self::with_state(model, v_max, position, velocity))
    }

    fn with_state(model: Rbfn, v_max: f64, position: Vec<f64>, velocity: Vec<f64>) -> Self {
        Self {
            model,
            v_max,
            best_position: position.clone(),
            position,
            velocity,
            fitness: 0.0,
            best_fitness: 0.0,
            error: f64::INFINITY,
        }
    }

    /// Network structure this candidate parameterises.
    pub fn model(&self) -> &Rbfn {
        &self.model
    }

    /// Current parameter vector.
    pub fn position(&self) -> &[f64] {
        &self.position
    }

    /// Current velocity.
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Lifetime best parameter vector.
    pub fn best_position(&self) -> &[f64] {
        &self.best_position
    }

    /// Fitness of the last evaluation (0 before the first one).
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Best fitness seen so far.
    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    /// Error of the last evaluation (infinite before the first one).
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Velocity clamp.
    pub fn v_max(&self) -> f64 {
        self.v_max
    }

    /// Scores the current position without touching any state.
    pub fn score(&self, dataset: &TrainingDataset) -> SwarmResult<Evaluation> {
        self.model
            .mean_absolute_error(&self.position, dataset)
            .map(Evaluation::from_error)
    }

    /// Records `eval` as the current fitness and updates the personal best.
    ///
    /// This is the only path that writes fitness, so the best check can
    /// never be skipped.
    pub fn apply(&mut self, eval: Evaluation) {
        self.error = eval.error;
        self.fitness = eval.fitness;
        if self.fitness > self.best_fitness {
            self.best_fitness = self.fitness;
            self.best_position.clone_from(&self.position);
        }
    }

    /// Scores the current position and applies the result.
    pub fn evaluate_fitness(&mut self, dataset: &TrainingDataset) -> SwarmResult<f64> {
        let eval = self.score(dataset)?;
        self.apply(eval);
        Ok(self.fitness)
    }

    /// Moves the candidate one PSO step.
    ///
    /// ```text
    /// v = w·v + c₁·(pbest - x) + c₂·(gbest - x)     clamped to ±v_max
    /// x = x + v                                    clamped per segment
    /// ```
    ///
    /// `cognitive_const` and `social_const` are drawn by the caller, once
    /// per candidate per iteration.
    pub fn update_position(
        &mut self,
        inertia_weight: f64,
        cognitive_const: f64,
        social_const: f64,
        global_best_position: &[f64],
    ) -> SwarmResult<()> {
        self.model.layout().check(global_best_position)?;

        for j in 0..self.position.len() {
            let x = self.position[j];
            let v = inertia_weight * self.velocity[j]
                + cognitive_const * (self.best_position[j] - x)
                + social_const * (global_best_position[j] - x);
            let v = v.clamp(-self.v_max, self.v_max);
            self.velocity[j] = v;
            self.position[j] = x + v;
        }
        self.model.clamp_params(&mut self.position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TrainingSample;
    use crate::SwarmError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn line_dataset() -> TrainingDataset {
        TrainingDataset::new(vec![
            TrainingSample::new(vec![0.0], 0.0),
            TrainingSample::new(vec![1.0], 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_random_candidate_in_domain() {
        let ds = line_dataset();
        let model = Rbfn::for_dataset(&ds, 3, 2.0);
        let mut rng = StdRng::seed_from_u64(5);
        let c = Candidate::random(model, 4.0, &mut rng);
        let layout = model.layout();

        assert_eq!(c.position().len(), layout.len());
        assert_eq!(c.velocity().len(), layout.len());
        assert_eq!(c.best_position(), c.position());
        assert!(c.position()[layout.weights()].iter().all(|w| (-1.0..=1.0).contains(w)));
        assert!(c.position()[layout.centers()].iter().all(|x| (0.0..=1.0).contains(x)));
        assert!(c.position()[layout.deviations()].iter().all(|s| (0.01..=2.0).contains(s)));
        assert!(c.velocity().iter().all(|v| v.abs() <= 4.0));
        assert_eq!(c.error(), f64::INFINITY);
    }

    #[test]
    fn test_deviations_never_exceed_sd_max() {
        let model = Rbfn::new(4, 1, (0.0, 1.0), 0.005);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..20 {
            let c = Candidate::random(model, 1.0, &mut rng);
            let layout = model.layout();
            assert!(c.position()[layout.deviations()].iter().all(|&s| s == 0.005));
        }

        let model = Rbfn::new(4, 1, (0.0, 1.0), 0.5);
        let c = Candidate::random(model, 1.0, &mut rng);
        assert!(c.position()[model.layout().deviations()]
            .iter()
            .all(|s| (SD_INIT_FLOOR..=0.5).contains(s)));
    }

    #[test]
    fn test_zero_error_uses_sentinel() {
        let eval = Evaluation::from_error(0.0);
        assert_eq!(eval.fitness, DEGENERATE_FITNESS);
        assert!(eval.fitness.is_finite());

        let eval = Evaluation::from_error(4.0);
        assert_eq!(eval.fitness, 0.25);
    }

    #[test]
    fn test_apply_tracks_best() {
        let model = Rbfn::new(1, 1, (0.0, 1.0), 1.0);
        let mut c = Candidate::from_parts(model, 1.0, vec![0.0; 4], vec![0.0; 4]).unwrap();

        c.apply(Evaluation::from_error(2.0));
        assert_eq!(c.best_fitness(), 0.5);

        c.apply(Evaluation::from_error(4.0));
        assert_eq!(c.fitness(), 0.25);
        assert_eq!(c.best_fitness(), 0.5);
    }

    #[test]
    fn test_update_position_formula() {
        let model = Rbfn::new(1, 1, (-10.0, 10.0), 1.0);
        let position = vec![0.0, 0.0, 0.0, 1.0];
        let velocity = vec![0.125, -0.125, 1.0, 0.5];
        let mut c = Candidate::from_parts(model, 100.0, position, velocity).unwrap();
        let global = vec![0.5, 0.5, 2.0, 3.0];

        // best_position == position, so only inertia and social terms act
        c.update_position(1.0, 2.0, 0.5, &global).unwrap();
        assert_eq!(c.velocity(), &[0.375, 0.125, 2.0, 1.5]);
        assert_eq!(c.position(), &[0.375, 0.125, 2.0, 2.5]);
    }

    #[test]
    fn test_update_position_rejects_bad_global() {
        let model = Rbfn::new(1, 1, (0.0, 1.0), 1.0);
        let mut c = Candidate::from_parts(model, 1.0, vec![0.0; 4], vec![0.0; 4]).unwrap();
        let err = c.update_position(1.0, 1.0, 1.0, &[0.0; 3]).unwrap_err();
        assert!(matches!(err, SwarmError::ShapeMismatch { .. }));
    }
}
