//! Forward-backward application of cascaded biquads.

use log::warn;

use super::butterworth::Section;

/// Transposed direct-form II over every section in turn. `state` holds `[z1, z2]` per
/// section and is left at the final state.
pub(crate) fn sosfilt(sections: &[Section], data: &[f64], state: &mut [[f64; 2]]) -> Vec<f64> {
    let mut out = data.to_vec();
    for (section, z) in sections.iter().zip(state.iter_mut()) {
        let [b0, b1, b2] = section.b;
        let [_, a1, a2] = section.a;
        for sample in out.iter_mut() {
            let x = *sample;
            let y = b0 * x + z[0];
            z[0] = b1 * x - a1 * y + z[1];
            z[1] = b2 * x - a2 * y;
            *sample = y;
        }
    }
    out
}

/// Per-section state that makes a unit step start in steady state.
pub(crate) fn sosfilt_zi(sections: &[Section]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    let mut zi = Vec::with_capacity(sections.len());
    for section in sections {
        let [b0, b1, b2] = section.b;
        let [_, a1, a2] = section.a;
        let rhs0 = b1 - a1 * b0;
        let rhs1 = b2 - a2 * b0;
        let z0 = (rhs0 + rhs1) / (1.0 + a1 + a2);
        let z1 = rhs1 - a2 * z0;
        zi.push([scale * z0, scale * z1]);
        scale *= (b0 + b1 + b2) / (1.0 + a1 + a2);
    }
    zi
}

/// Edge padding length for a cascade of `n_sections` biquads.
pub(crate) fn default_padlen(n_sections: usize) -> usize {
    3 * (2 * n_sections + 1)
}

/// Zero-phase filtering: odd-extend both edges, run forward from steady state, run
/// backward from steady state, strip the padding. Output length equals input length.
pub(crate) fn filtfilt(sections: &[Section], data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let wanted = default_padlen(sections.len());
    let padlen = wanted.min(n - 1);
    if padlen < wanted {
        warn!(
            "signal of {} samples is shorter than the {}-sample edge padding; edges will ring",
            n, wanted
        );
    }

    let ext = odd_extension(data, padlen);
    let zi = sosfilt_zi(sections);

    let mut state: Vec<[f64; 2]> = zi.iter().map(|z| scaled(z, ext[0])).collect();
    let mut forward = sosfilt(sections, &ext, &mut state);

    forward.reverse();
    let mut state: Vec<[f64; 2]> = zi.iter().map(|z| scaled(z, forward[0])).collect();
    let mut backward = sosfilt(sections, &forward, &mut state);
    backward.reverse();

    backward[padlen..padlen + n].to_vec()
}

fn scaled(z: &[f64; 2], x0: f64) -> [f64; 2] {
    [z[0] * x0, z[1] * x0]
}

fn odd_extension(data: &[f64], padlen: usize) -> Vec<f64> {
    let n = data.len();
    let first = data[0];
    let last = data[n - 1];
    let mut ext = Vec::with_capacity(n + 2 * padlen);
    ext.extend((1..=padlen).rev().map(|i| 2.0 * first - data[i]));
    ext.extend_from_slice(data);
    ext.extend((1..=padlen).map(|i| 2.0 * last - data[n - 1 - i]));
    ext
}
