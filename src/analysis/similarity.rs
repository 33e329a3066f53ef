//! Frame-to-frame cosine similarity and repeating-neighbor selection.
//!
//! The similarity-driven strategies replace the periodicity assumption with
//! a direct search: frames whose spectra point in the same direction are
//! treated as repetitions of each other, wherever they fall in time.

use crate::core::fft::NORM_EPSILON;
use std::cmp::Ordering;

/// Unit-normalized copy of a magnitude frame, accumulated in f64.
///
/// Silent frames get an all-zero direction instead of NaN, so they are
/// dissimilar to everything (including themselves).
pub(crate) fn unit_frame(frame: &[f32]) -> Vec<f32> {
    let norm: f64 = frame
        .iter()
        .map(|&v| (v as f64) * (v as f64))
        .sum::<f64>()
        .sqrt();
    let norm = norm.max(NORM_EPSILON);
    frame.iter().map(|&v| (v as f64 / norm) as f32).collect()
}

/// Dot product of two unit frames: their cosine similarity.
pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| x as f64 * y as f64)
        .sum::<f64>() as f32
}

/// Self-similarity matrix of a magnitude spectrogram (frame-major).
///
/// Entry `[i][j]` is the cosine similarity between frames `i` and `j`. The
/// matrix is symmetric with a unit diagonal for non-silent frames, and all
/// values lie in `[0, 1]` because magnitudes are non-negative.
pub fn self_similarity(mags: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let unit: Vec<Vec<f32>> = mags.iter().map(|frame| unit_frame(frame)).collect();
    let n = unit.len();
    let mut matrix = vec![vec![0.0f32; n]; n];
    for i in 0..n {
        matrix[i][i] = cosine(&unit[i], &unit[i]);
        for j in i + 1..n {
            let value = cosine(&unit[i], &unit[j]);
            matrix[i][j] = value;
            matrix[j][i] = value;
        }
    }
    matrix
}

/// Similarities between each query frame and each history frame.
///
/// Row `i` holds query `i` against every history frame, which is the shape
/// the streaming processor sees: a rectangular slice of the similarity
/// matrix rather than the square whole.
pub fn cross_similarity(queries: &[Vec<f32>], history: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let history_units: Vec<Vec<f32>> = history.iter().map(|frame| unit_frame(frame)).collect();
    queries
        .iter()
        .map(|query| {
            let query_unit = unit_frame(query);
            history_units
                .iter()
                .map(|h| cosine(&query_unit, h))
                .collect()
        })
        .collect()
}

/// Picks repeating neighbors from one row of a similarity matrix.
///
/// A frame qualifies when its similarity is at least `threshold` and
/// strictly greater than every other value within `spacing` frames, so two
/// qualifying frames can never sit closer than `spacing + 1` apart.
/// Qualifying frames are ordered by descending similarity (ties by ascending
/// index) and truncated to `max_count`.
pub fn neighbor_indices(row: &[f32], threshold: f32, spacing: usize, max_count: usize) -> Vec<usize> {
    let mut candidates: Vec<usize> = Vec::new();
    for (idx, &value) in row.iter().enumerate() {
        if value < threshold {
            continue;
        }
        let start = idx.saturating_sub(spacing);
        let end = idx.saturating_add(spacing).saturating_add(1).min(row.len());
        let is_peak = (start..end).all(|other| other == idx || row[other] < value);
        if is_peak {
            candidates.push(idx);
        }
    }
    candidates.sort_by(|&a, &b| {
        row[b]
            .partial_cmp(&row[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    candidates.truncate(max_count);
    candidates
}
