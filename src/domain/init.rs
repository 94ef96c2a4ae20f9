use std::collections::HashSet;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::domain::point::Point;

/// Centroid initialization strategy.
///
/// `Manual` takes caller-supplied coordinates and is validated by the
/// session; the other three sample from the dataset.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InitMethod {
    Random,
    Manual,
    #[serde(rename = "kmeans++")]
    KmeansPlusPlus,
    FarthestFirst,
}

/// Result of an initialization strategy: exactly k starting centroids plus
/// an optional warning (duplicate starting positions).
pub struct InitialCentroids {
    pub centroids: Vec<Point>,
    pub warning: Option<String>,
}

/// Sample k distinct dataset points without replacement, so centroids start
/// inside the point cloud. When the dataset holds fewer than k distinct
/// positions, sampling falls back to distinct indices (positions may then
/// repeat) and a warning is attached.
pub fn random_sample<R: Rng + ?Sized>(
    dataset: &[Point],
    k: usize,
    rng: &mut R,
) -> InitialCentroids {
    let mut seen = HashSet::new();
    let distinct: Vec<Point> = dataset
        .iter()
        .filter(|p| seen.insert((p.x.to_bits(), p.y.to_bits())))
        .copied()
        .collect();

    if distinct.len() >= k {
        InitialCentroids {
            centroids: distinct.choose_multiple(rng, k).copied().collect(),
            warning: None,
        }
    } else {
        InitialCentroids {
            centroids: dataset.choose_multiple(rng, k).copied().collect(),
            warning: Some(format!(
                "dataset has only {} distinct positions for k = {k}; duplicate starting centroids are possible",
                distinct.len()
            )),
        }
    }
}

/// k-means++ seeding: the first centroid is a uniform draw, each subsequent
/// centroid is drawn with probability proportional to its distance to the
/// nearest already-chosen centroid.
pub fn kmeans_plus_plus<R: Rng + ?Sized>(
    dataset: &[Point],
    k: usize,
    rng: &mut R,
) -> InitialCentroids {
    let mut centroids: Vec<Point> = Vec::with_capacity(k);
    let mut degenerate = false;

    if let Some(&first) = dataset.choose(rng) {
        centroids.push(first);
    }

    while !centroids.is_empty() && centroids.len() < k {
        let weights: Vec<f64> = dataset
            .iter()
            .map(|p| nearest_distance(p, &centroids))
            .collect();
        let total: f64 = weights.iter().sum();

        if total == 0.0 {
            // Every remaining point coincides with a chosen centroid; fall
            // back to a uniform draw.
            degenerate = true;
            match dataset.choose(rng) {
                Some(&p) => centroids.push(p),
                None => break,
            }
            continue;
        }

        let threshold = rng.random_range(0.0..total);
        let mut cumsum = 0.0;
        let mut selected = dataset.len() - 1;
        for (i, &w) in weights.iter().enumerate() {
            cumsum += w;
            if cumsum > threshold {
                selected = i;
                break;
            }
        }
        centroids.push(dataset[selected]);
    }

    InitialCentroids {
        centroids,
        warning: degenerate.then(|| {
            format!("fewer than k = {k} distinct positions; duplicate starting centroids are possible")
        }),
    }
}

/// Farthest-first seeding: the first centroid is a uniform draw, each
/// subsequent centroid is the dataset point farthest from its nearest
/// already-chosen centroid.
pub fn farthest_first<R: Rng + ?Sized>(
    dataset: &[Point],
    k: usize,
    rng: &mut R,
) -> InitialCentroids {
    let mut centroids: Vec<Point> = Vec::with_capacity(k);

    if let Some(&first) = dataset.choose(rng) {
        centroids.push(first);
    }

    while !centroids.is_empty() && centroids.len() < k {
        let mut best = centroids[0];
        let mut best_dist = -1.0;
        for &p in dataset {
            let d = nearest_distance(&p, &centroids);
            if d > best_dist {
                best_dist = d;
                best = p;
            }
        }
        centroids.push(best);
    }

    InitialCentroids {
        centroids,
        warning: None,
    }
}

fn nearest_distance(p: &Point, centroids: &[Point]) -> f64 {
    centroids
        .iter()
        .map(|c| p.distance(c))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn square_dataset() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ]
    }

    #[test]
    fn test_init_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&InitMethod::KmeansPlusPlus).unwrap(),
            "\"kmeans++\""
        );
        assert_eq!(
            serde_json::from_str::<InitMethod>("\"farthest_first\"").unwrap(),
            InitMethod::FarthestFirst
        );
        assert_eq!(
            serde_json::from_str::<InitMethod>("\"random\"").unwrap(),
            InitMethod::Random
        );
        assert_eq!(
            serde_json::from_str::<InitMethod>("\"manual\"").unwrap(),
            InitMethod::Manual
        );
    }

    #[test]
    fn test_random_sample_returns_k_distinct_points() {
        let dataset = square_dataset();
        let mut rng = StdRng::seed_from_u64(3);
        for k in 1..=4 {
            let initial = random_sample(&dataset, k, &mut rng);
            assert_eq!(initial.centroids.len(), k);
            assert!(initial.warning.is_none());

            let mut seen = HashSet::new();
            for c in &initial.centroids {
                assert!(seen.insert((c.x.to_bits(), c.y.to_bits())), "duplicate centroid");
                assert!(dataset.contains(c), "centroid not a dataset point");
            }
        }
    }

    #[test]
    fn test_random_sample_warns_when_positions_collide() {
        // Four points but only two distinct positions.
        let dataset = vec![
            Point::new(0.5, 0.5),
            Point::new(0.5, 0.5),
            Point::new(0.2, 0.2),
            Point::new(0.2, 0.2),
        ];
        let mut rng = StdRng::seed_from_u64(11);
        let initial = random_sample(&dataset, 3, &mut rng);
        assert_eq!(initial.centroids.len(), 3);
        assert!(initial.warning.is_some());
    }

    #[test]
    fn test_kmeans_plus_plus_returns_k_centroids() {
        let dataset = square_dataset();
        let mut rng = StdRng::seed_from_u64(17);
        let initial = kmeans_plus_plus(&dataset, 3, &mut rng);
        assert_eq!(initial.centroids.len(), 3);
        for c in &initial.centroids {
            assert!(dataset.contains(c));
        }
    }

    #[test]
    fn test_kmeans_plus_plus_prefers_spread_out_points() {
        // Two coincident pairs far apart: whichever position the first draw
        // lands on, its twin has weight zero, so the second centroid must
        // come from the other group.
        let dataset = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 0.0),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let initial = kmeans_plus_plus(&dataset, 2, &mut rng);
        let &[a, b] = initial.centroids.as_slice() else {
            panic!("expected 2 centroids");
        };
        assert!(
            (a.x < 1.0) != (b.x < 1.0),
            "centroids should span both groups: {a:?} {b:?}"
        );
    }

    #[test]
    fn test_kmeans_plus_plus_degenerate_dataset_falls_back() {
        let dataset = vec![Point::new(0.3, 0.3); 5];
        let mut rng = StdRng::seed_from_u64(23);
        let initial = kmeans_plus_plus(&dataset, 3, &mut rng);
        assert_eq!(initial.centroids.len(), 3);
        assert!(initial.warning.is_some());
    }

    #[test]
    fn test_farthest_first_picks_extremes() {
        let dataset = vec![
            Point::new(0.0, 0.0),
            Point::new(0.1, 0.0),
            Point::new(10.0, 0.0),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let initial = farthest_first(&dataset, 2, &mut rng);
        assert_eq!(initial.centroids.len(), 2);
        let &[a, b] = initial.centroids.as_slice() else {
            panic!("expected 2 centroids");
        };
        // Whatever the first draw was, the pair must span the gap.
        assert!(a.distance(&b) >= 9.9, "expected extremes, got {a:?} {b:?}");
    }
}
