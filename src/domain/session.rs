use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, warn};

use crate::domain::engine::{self, ConvergencePolicy, StepStatus};
use crate::domain::generator;
use crate::domain::init::{self, InitMethod, InitialCentroids};
use crate::domain::point::Point;
use crate::error::EngineError;

/// Upper bound on dataset size when none is configured.
pub const DEFAULT_MAX_DATASET_SIZE: usize = 100_000;

/// Outcome of one engine step.
#[derive(Clone, Copy, Debug)]
pub struct StepOutcome {
    pub status: StepStatus,
    pub iteration: u32,
}

/// The single in-progress clustering run. Present only between
/// initialization and the next generate/reset.
struct Clustering {
    centroids: Vec<Point>,
    /// One label per dataset index. `None` until the first assignment
    /// phase has run.
    assignment: Option<Vec<usize>>,
    iteration: u32,
    converged: bool,
}

/// The mutable clustering session shared across requests.
///
/// Owns the dataset, the current clustering run, and the session RNG. All
/// engine operations go through the methods here, which validate
/// preconditions before touching state; a failed call leaves the session
/// exactly as it was.
pub struct Session {
    dataset: Vec<Point>,
    clustering: Option<Clustering>,
    policy: ConvergencePolicy,
    max_dataset_size: usize,
    rng: StdRng,
}

impl Session {
    /// Create an empty session. `seed` fixes the RNG for reproducible
    /// datasets and initializations; `None` draws from OS entropy.
    #[must_use]
    pub fn new(policy: ConvergencePolicy, max_dataset_size: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            dataset: Vec::new(),
            clustering: None,
            policy,
            max_dataset_size,
            rng,
        }
    }

    /// Create a session around a prepared dataset with a fixed RNG seed.
    /// Used when embedding the engine without the generate step.
    #[must_use]
    pub fn with_dataset(dataset: Vec<Point>, policy: ConvergencePolicy) -> Self {
        let mut session = Self::new(policy, DEFAULT_MAX_DATASET_SIZE.max(dataset.len()), Some(0));
        session.dataset = dataset;
        session
    }

    /// Replace the dataset with `num_points` freshly generated points.
    /// A fresh dataset invalidates any prior clustering state.
    pub fn generate(&mut self, num_points: usize) -> Result<&[Point], EngineError> {
        if num_points == 0 {
            return Err(EngineError::InvalidArgument(
                "num_points must be positive".into(),
            ));
        }
        if num_points > self.max_dataset_size {
            return Err(EngineError::InvalidArgument(format!(
                "num_points = {num_points} exceeds the maximum dataset size {}",
                self.max_dataset_size
            )));
        }

        self.dataset = generator::generate_points(num_points, &mut self.rng);
        self.clustering = None;
        Ok(&self.dataset)
    }

    /// Initialize a clustering run: choose k starting centroids with the
    /// given strategy, reset the iteration counter and the converged flag,
    /// and clear any prior assignment. Points stay unassigned until the
    /// first step runs the assignment phase.
    ///
    /// Returns the initializer's warning, if any (duplicate starting
    /// positions).
    pub fn initialize(
        &mut self,
        k: usize,
        method: InitMethod,
        manual_points: Option<Vec<Point>>,
    ) -> Result<Option<String>, EngineError> {
        if self.dataset.is_empty() {
            return Err(EngineError::PreconditionFailed(
                "no dataset available; generate a dataset first".into(),
            ));
        }
        if k == 0 {
            return Err(EngineError::InvalidArgument("k must be at least 1".into()));
        }
        if k > self.dataset.len() {
            return Err(EngineError::InvalidArgument(format!(
                "k = {k} exceeds the dataset size {}",
                self.dataset.len()
            )));
        }

        let initial = match method {
            InitMethod::Manual => {
                let centroids = manual_points.ok_or_else(|| {
                    EngineError::InvalidArgument(
                        "manual initialization requires manual_centroids".into(),
                    )
                })?;
                if centroids.len() != k {
                    return Err(EngineError::InvalidArgument(format!(
                        "expected {k} manual centroids, got {}",
                        centroids.len()
                    )));
                }
                InitialCentroids {
                    centroids,
                    warning: None,
                }
            }
            InitMethod::Random => init::random_sample(&self.dataset, k, &mut self.rng),
            InitMethod::KmeansPlusPlus => init::kmeans_plus_plus(&self.dataset, k, &mut self.rng),
            InitMethod::FarthestFirst => init::farthest_first(&self.dataset, k, &mut self.rng),
        };

        if initial.centroids.len() != k {
            error!(
                expected = k,
                got = initial.centroids.len(),
                "initializer returned wrong centroid count"
            );
            return Err(EngineError::InternalInvariant(format!(
                "initializer returned {} centroids for k = {k}",
                initial.centroids.len()
            )));
        }
        if let Some(warning) = &initial.warning {
            warn!(%warning, "centroid initialization degraded");
        }

        self.clustering = Some(Clustering {
            centroids: initial.centroids,
            assignment: None,
            iteration: 0,
            converged: false,
        });
        Ok(initial.warning)
    }

    /// Perform exactly one K-Means iteration: assignment phase, update
    /// phase, convergence check. Mutates the session in place and reports
    /// the new status. Calling `step` after convergence is a no-op that
    /// reports `Converged` with unchanged state.
    pub fn step(&mut self, k: usize) -> Result<StepOutcome, EngineError> {
        let policy = self.policy;
        let dataset_len = self.dataset.len();

        let clustering = self.clustering.as_mut().ok_or_else(|| {
            EngineError::PreconditionFailed(
                "k-means has not been initialized; call start first".into(),
            )
        })?;
        if k != clustering.centroids.len() {
            return Err(EngineError::InvalidArgument(format!(
                "k = {k} does not match the current centroid count {}",
                clustering.centroids.len()
            )));
        }
        if clustering.converged {
            return Ok(StepOutcome {
                status: StepStatus::Converged,
                iteration: clustering.iteration,
            });
        }

        let assignment = engine::assign_points(&self.dataset, &clustering.centroids);
        if assignment.len() != dataset_len {
            error!(
                assigned = assignment.len(),
                dataset = dataset_len,
                "assignment phase lost points"
            );
            return Err(EngineError::InternalInvariant(format!(
                "assignment covers {} points, dataset has {dataset_len}",
                assignment.len()
            )));
        }

        let updated = engine::recompute_centroids(&self.dataset, &assignment, &clustering.centroids);
        if updated.len() != clustering.centroids.len() {
            error!(
                before = clustering.centroids.len(),
                after = updated.len(),
                "centroid count drifted during update"
            );
            return Err(EngineError::InternalInvariant(format!(
                "centroid count drifted from {} to {} during update",
                clustering.centroids.len(),
                updated.len()
            )));
        }

        let moved = engine::max_displacement(&clustering.centroids, &updated);
        clustering.centroids = updated;
        clustering.assignment = Some(assignment);
        clustering.iteration += 1;

        if moved <= policy.epsilon || clustering.iteration >= policy.max_iterations {
            clustering.converged = true;
            debug!(
                iteration = clustering.iteration,
                moved, "clustering run converged"
            );
            return Ok(StepOutcome {
                status: StepStatus::Converged,
                iteration: clustering.iteration,
            });
        }

        Ok(StepOutcome {
            status: StepStatus::Stepping,
            iteration: clustering.iteration,
        })
    }

    /// Drive `step` until it reports convergence. The convergence rule caps
    /// the iteration count, so the loop is bounded by `max_iterations`
    /// calls (plus one for the already-converged case).
    pub fn run_to_convergence(&mut self, k: usize) -> Result<StepOutcome, EngineError> {
        for _ in 0..=self.policy.max_iterations {
            let outcome = self.step(k)?;
            if outcome.status == StepStatus::Converged {
                return Ok(outcome);
            }
        }
        Err(EngineError::InternalInvariant(
            "run loop exhausted the iteration cap without a convergence report".into(),
        ))
    }

    /// Wipe the clustering run but keep the dataset.
    pub fn reset(&mut self) -> Result<&[Point], EngineError> {
        if self.dataset.is_empty() {
            return Err(EngineError::PreconditionFailed(
                "no dataset to reset; generate a dataset first".into(),
            ));
        }
        self.clustering = None;
        Ok(&self.dataset)
    }

    #[must_use]
    pub fn dataset(&self) -> &[Point] {
        &self.dataset
    }

    /// Current centroids; empty before initialization.
    #[must_use]
    pub fn centroids(&self) -> &[Point] {
        match &self.clustering {
            Some(clustering) => &clustering.centroids,
            None => &[],
        }
    }

    #[must_use]
    pub fn iteration(&self) -> u32 {
        self.clustering.as_ref().map_or(0, |c| c.iteration)
    }

    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.clustering.as_ref().is_some_and(|c| c.converged)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.clustering.is_some()
    }

    /// Project the stored assignment into per-cluster point lists. Before
    /// the first step this is k empty lists; before initialization it is
    /// empty.
    #[must_use]
    pub fn clusters(&self) -> Vec<Vec<Point>> {
        match &self.clustering {
            Some(clustering) => match &clustering.assignment {
                Some(assignment) => engine::group_by_cluster(
                    &self.dataset,
                    assignment,
                    clustering.centroids.len(),
                ),
                None => vec![Vec::new(); clustering.centroids.len()],
            },
            None => Vec::new(),
        }
    }

    /// Group the dataset by nearest centroid without storing an assignment.
    /// Used to preview the initial grouping right after initialization;
    /// the session's own assignment stays unset until the first step.
    #[must_use]
    pub fn preview_clusters(&self) -> Vec<Vec<Point>> {
        match &self.clustering {
            Some(clustering) => {
                let assignment = engine::assign_points(&self.dataset, &clustering.centroids);
                engine::group_by_cluster(&self.dataset, &assignment, clustering.centroids.len())
            }
            None => Vec::new(),
        }
    }
}
