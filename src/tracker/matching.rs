//! Association between tracked centroids and new detections.

use nalgebra::Vector2;
use ndarray::Array2;
use serde::Deserialize;

/// How tracked objects are paired with detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Association {
    /// Accept pairs in ascending distance order while both sides are free.
    ///
    /// A greedy approximation of optimal assignment: crossing trajectories can
    /// end up with a suboptimal pairing.
    #[default]
    Greedy,
    /// Minimum total distance assignment (Jonker-Volgenant).
    Optimal,
}

/// Euclidean distance matrix of shape `(tracked, detections)`.
pub fn centroid_distance(tracked: &[Vector2<f32>], detections: &[Vector2<f32>]) -> Array2<f32> {
    let mut dists = Array2::zeros((tracked.len(), detections.len()));
    for (i, t) in tracked.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            dists[[i, j]] = (t - d).norm();
        }
    }
    dists
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn from_matches(matches: Vec<(usize, usize)>, num_rows: usize, num_cols: usize) -> Self {
        let mut row_used = vec![false; num_rows];
        let mut col_used = vec![false; num_cols];
        for &(r, c) in &matches {
            row_used[r] = true;
            col_used[c] = true;
        }

        Self {
            matches,
            unmatched_tracks: unused(&row_used),
            unmatched_detections: unused(&col_used),
        }
    }
}

fn unused(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &used)| if used { None } else { Some(i) })
        .collect()
}

pub fn assign(cost_matrix: &Array2<f32>, max_distance: f32, strategy: Association) -> AssignmentResult {
    match strategy {
        Association::Greedy => greedy_assignment(cost_matrix, max_distance),
        Association::Optimal => linear_assignment(cost_matrix, max_distance),
    }
}

/// Greedy global nearest-neighbour assignment.
///
/// All `(row, col, distance)` triples are sorted ascending; a pair is accepted
/// when neither index is taken and `distance < max_distance`.
pub fn greedy_assignment(cost_matrix: &Array2<f32>, max_distance: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    let mut triples: Vec<(usize, usize, f32)> = cost_matrix
        .indexed_iter()
        .map(|((r, c), &d)| (r, c, d))
        .filter(|&(_, _, d)| d < max_distance)
        .collect();
    // Stable sort keeps row-major order between equal distances.
    triples.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut row_used = vec![false; num_rows];
    let mut col_used = vec![false; num_cols];
    let mut matches = Vec::new();
    for (r, c, _) in triples {
        if row_used[r] || col_used[c] {
            continue;
        }
        row_used[r] = true;
        col_used[c] = true;
        matches.push((r, c));
    }

    AssignmentResult::from_matches(matches, num_rows, num_cols)
}

/// Minimum-cost assignment; pairs at or beyond `max_distance` stay unmatched.
pub fn linear_assignment(cost_matrix: &Array2<f32>, max_distance: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult::from_matches(vec![], num_rows, num_cols);
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), 1e6);

    for i in 0..num_rows {
        for j in 0..num_cols {
            let d = cost_matrix[[i, j]];
            // Out-of-range pairs cost as much as padding so lapjv avoids them.
            padded[[i, j]] = if d < max_distance { d as f64 } else { 1e6 };
        }
    }

    let mut matches = vec![];
    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate().take(num_rows) {
                if col_idx < num_cols && cost_matrix[[row_idx, col_idx]] < max_distance {
                    matches.push((row_idx, col_idx));
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = ?e, "optimal assignment failed, leaving frame unmatched");
        }
    }

    AssignmentResult::from_matches(matches, num_rows, num_cols)
}
