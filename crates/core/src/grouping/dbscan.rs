//! Density-based clustering over L2-normalized embeddings with cosine
//! distance. Deterministic: points are visited in input order, so equal
//! inputs always produce equal labels.

use std::collections::VecDeque;

const UNDEFINED: i64 = -2;
const NOISE: i64 = -1;

/// Cosine distance between L2-normalized vectors (`1 − dot`).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    1.0 - dot
}

/// DBSCAN over normalized embeddings.
///
/// Returns one label per input: `Some(cluster_id)` with ids dense from 0,
/// or `None` for noise. Points within `eps` cosine distance are
/// neighbors; a point's neighborhood includes itself, so a core point
/// needs `min_samples − 1` others nearby.
pub fn cluster(embeddings: &[Vec<f32>], eps: f32, min_samples: usize) -> Vec<Option<usize>> {
    let n = embeddings.len();
    let mut labels = vec![UNDEFINED; n];
    let mut next_cluster: i64 = 0;

    let neighbors_of = |p: usize| -> Vec<usize> {
        (0..n)
            .filter(|&q| cosine_distance(&embeddings[p], &embeddings[q]) <= eps)
            .collect()
    };

    for p in 0..n {
        if labels[p] != UNDEFINED {
            continue;
        }
        let neighbors = neighbors_of(p);
        if neighbors.len() < min_samples {
            labels[p] = NOISE;
            continue;
        }

        let cluster_id = next_cluster;
        next_cluster += 1;
        labels[p] = cluster_id;

        let mut seeds: VecDeque<usize> = neighbors.into_iter().filter(|&q| q != p).collect();
        while let Some(q) = seeds.pop_front() {
            if labels[q] == NOISE {
                // Border point reachable from a core point
                labels[q] = cluster_id;
            }
            if labels[q] != UNDEFINED {
                continue;
            }
            labels[q] = cluster_id;
            let q_neighbors = neighbors_of(q);
            if q_neighbors.len() >= min_samples {
                seeds.extend(q_neighbors);
            }
        }
    }

    labels
        .into_iter()
        .map(|l| if l >= 0 { Some(l as usize) } else { None })
        .collect()
}
