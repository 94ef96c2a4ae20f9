use rand::Rng;

use crate::domain::point::Point;

/// Generate a synthetic dataset of `num_points` points.
///
/// Sampling policy: each point is drawn independently and uniformly from
/// the unit square `[0,1) x [0,1)`. The policy is fixed so that a dataset
/// is stable and reproducible for a given RNG state.
pub fn generate_points<R: Rng + ?Sized>(num_points: usize, rng: &mut R) -> Vec<Point> {
    (0..num_points)
        .map(|_| Point::new(rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)))
        .collect()
}
