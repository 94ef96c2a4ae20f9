use serde::Serialize;

use crate::domain::point::Point;

/// Convergence rule for a run: a step converges when no centroid moved more
/// than `epsilon`, or when `max_iterations` is reached (terminates even
/// under oscillation).
#[derive(Clone, Copy, Debug)]
pub struct ConvergencePolicy {
    pub epsilon: f64,
    pub max_iterations: u32,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            max_iterations: 100,
        }
    }
}

/// Step result reported to the caller.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Stepping,
    Converged,
}

/// Assignment phase: label every point with its nearest centroid by squared
/// Euclidean distance. Centroids are scanned in index order with a strict
/// `<`, so an exact tie resolves to the lowest centroid index.
#[must_use]
pub fn assign_points(dataset: &[Point], centroids: &[Point]) -> Vec<usize> {
    dataset
        .iter()
        .map(|point| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (label, centroid) in centroids.iter().enumerate() {
                let d = point.distance_sq(centroid);
                if d < best_dist {
                    best_dist = d;
                    best = label;
                }
            }
            best
        })
        .collect()
}

/// Update phase: each centroid becomes the mean of its assigned points.
/// A centroid with no assigned points keeps its current position.
#[must_use]
pub fn recompute_centroids(
    dataset: &[Point],
    assignment: &[usize],
    centroids: &[Point],
) -> Vec<Point> {
    let k = centroids.len();
    let mut sums = vec![(0.0, 0.0); k];
    let mut counts = vec![0usize; k];

    for (point, &label) in dataset.iter().zip(assignment) {
        sums[label].0 += point.x;
        sums[label].1 += point.y;
        counts[label] += 1;
    }

    centroids
        .iter()
        .enumerate()
        .map(|(label, &old)| {
            if counts[label] == 0 {
                old
            } else {
                let n = counts[label] as f64;
                Point::new(sums[label].0 / n, sums[label].1 / n)
            }
        })
        .collect()
}

/// Maximum Euclidean displacement over all centroid pairs (old vs. new).
#[must_use]
pub fn max_displacement(old: &[Point], new: &[Point]) -> f64 {
    old.iter()
        .zip(new)
        .map(|(a, b)| a.distance(b))
        .fold(0.0, f64::max)
}

/// Project an assignment into per-cluster point lists, grouped by centroid
/// index. Empty clusters yield empty lists. This is the only place the
/// grouped wire shape is produced, so it cannot drift from the assignment.
#[must_use]
pub fn group_by_cluster(dataset: &[Point], assignment: &[usize], k: usize) -> Vec<Vec<Point>> {
    let mut clusters = vec![Vec::new(); k];
    for (&point, &label) in dataset.iter().zip(assignment) {
        clusters[label].push(point);
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_points_nearest_centroid() {
        let dataset = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 1.0),
        ];
        let centroids = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert_eq!(assign_points(&dataset, &centroids), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_assign_points_tie_breaks_to_lowest_index() {
        // Point exactly halfway between both centroids.
        let dataset = vec![Point::new(0.5, 0.0)];
        let centroids = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert_eq!(assign_points(&dataset, &centroids), vec![0]);

        // Identical centroids: still the lowest index.
        let twins = vec![Point::new(0.2, 0.2), Point::new(0.2, 0.2)];
        assert_eq!(assign_points(&dataset, &twins), vec![0]);
    }

    #[test]
    fn test_recompute_centroids_takes_means() {
        let dataset = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 1.0),
        ];
        let centroids = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let assignment = vec![0, 0, 1, 1];
        let updated = recompute_centroids(&dataset, &assignment, &centroids);
        assert_eq!(updated, vec![Point::new(0.0, 0.5), Point::new(10.0, 0.5)]);
    }

    #[test]
    fn test_recompute_centroids_keeps_empty_cluster_in_place() {
        let dataset = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0)];
        // Second centroid is far away and captures nothing.
        let centroids = vec![Point::new(0.0, 0.5), Point::new(50.0, 50.0)];
        let assignment = assign_points(&dataset, &centroids);
        assert_eq!(assignment, vec![0, 0]);

        let updated = recompute_centroids(&dataset, &assignment, &centroids);
        assert_eq!(updated[1], Point::new(50.0, 50.0));
    }

    #[test]
    fn test_max_displacement() {
        let old = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        let new = vec![Point::new(0.0, 0.5), Point::new(1.0, 1.0)];
        assert_eq!(max_displacement(&old, &new), 0.5);
        assert_eq!(max_displacement(&old, &old), 0.0);
    }

    #[test]
    fn test_group_by_cluster_keeps_empty_lists() {
        let dataset = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let assignment = vec![2, 2];
        let clusters = group_by_cluster(&dataset, &assignment, 3);
        assert_eq!(clusters.len(), 3);
        assert!(clusters[0].is_empty());
        assert!(clusters[1].is_empty());
        assert_eq!(clusters[2].len(), 2);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn arb_points(range: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Point>> {
            proptest::collection::vec((0.0f64..1.0, 0.0f64..1.0), range)
                .prop_map(|pairs| pairs.into_iter().map(Point::from).collect())
        }

        proptest! {
            #[test]
            fn assignment_labels_every_point_in_range(
                dataset in arb_points(1..50),
                centroids in arb_points(1..8),
            ) {
                let assignment = assign_points(&dataset, &centroids);
                prop_assert_eq!(assignment.len(), dataset.len());
                for &label in &assignment {
                    prop_assert!(label < centroids.len());
                }
            }

            #[test]
            fn update_preserves_centroid_count(
                dataset in arb_points(1..50),
                centroids in arb_points(1..8),
            ) {
                let assignment = assign_points(&dataset, &centroids);
                let updated = recompute_centroids(&dataset, &assignment, &centroids);
                prop_assert_eq!(updated.len(), centroids.len());
            }

            #[test]
            fn grouped_clusters_partition_the_dataset(
                dataset in arb_points(1..50),
                centroids in arb_points(1..8),
            ) {
                let assignment = assign_points(&dataset, &centroids);
                let clusters = group_by_cluster(&dataset, &assignment, centroids.len());
                prop_assert_eq!(clusters.len(), centroids.len());
                let total: usize = clusters.iter().map(Vec::len).sum();
                prop_assert_eq!(total, dataset.len());
            }
        }
    }
}
