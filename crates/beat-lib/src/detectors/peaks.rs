use log::debug;
use std::cmp::Ordering;

use crate::config::PeakConfig;
use crate::error::{check_fs, BeatError, BeatResult};
use crate::signal::Events;

/// Detect R-peaks in an already band-passed trace.
///
/// Candidates are local maxima at or above the configured height threshold. Candidates
/// closer than the refractory distance compete: the taller one survives. An empty result
/// (flat trace, nothing above threshold) is a valid outcome.
pub fn detect_r_peaks(data: &[f64], fs: f64, cfg: &PeakConfig) -> BeatResult<Events> {
    check_fs(fs)?;
    cfg.validate(fs)?;
    if data.is_empty() {
        return Err(BeatError::EmptyInput);
    }

    let (lo, hi) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if hi - lo <= cfg.flat_tolerance {
        debug!("trace span {:.3e} is flat; no peaks", hi - lo);
        return Ok(Events::default());
    }

    let height = cfg.threshold.threshold(data);
    let distance = cfg.min_distance_samples(fs);

    let candidates: Vec<usize> = local_maxima(data)
        .into_iter()
        .filter(|&i| data[i] >= height)
        .collect();
    let peaks = suppress_within_distance(data, &candidates, distance);
    debug!(
        "{} local maxima above {:.4}, {} kept with {}-sample spacing",
        candidates.len(),
        height,
        peaks.len(),
        distance
    );
    Ok(Events::from_indices(peaks))
}

/// Indices of strict local maxima. A plateau counts once, at its midpoint (rounded down),
/// when both neighbours of the plateau are lower. The first and last samples never qualify.
pub fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if data.len() < 3 {
        return peaks;
    }
    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
            i = ahead;
            continue;
        }
        i += 1;
    }
    peaks
}

/// Keep the tallest candidates such that kept indices are at least `distance` apart.
/// `candidates` must be sorted ascending; the result is too.
fn suppress_within_distance(data: &[f64], candidates: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || candidates.len() < 2 {
        return candidates.to_vec();
    }
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    // tallest first; equal heights keep the earlier index
    order.sort_by(|&a, &b| {
        data[candidates[b]]
            .partial_cmp(&data[candidates[a]])
            .unwrap_or(Ordering::Equal)
    });

    let mut keep = vec![true; candidates.len()];
    for &j in &order {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && candidates[j] - candidates[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }
        let mut k = j + 1;
        while k < candidates.len() && candidates[k] - candidates[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    candidates
        .iter()
        .zip(keep)
        .filter_map(|(&idx, kept)| kept.then_some(idx))
        .collect()
}
