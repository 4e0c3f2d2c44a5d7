//! Random sampling helpers shared by the processors.

use crate::common::*;

/// Sample uniformly from the closed range `[lower, upper]`.
pub fn uniform<R>(rng: &mut R, lower: f64, upper: f64) -> f64
where
    R: Rng + ?Sized,
{
    if lower >= upper {
        lower
    } else {
        rng.gen_range(lower..=upper)
    }
}

/// Sample uniformly from `[-limit, limit]`.
pub fn symmetric<R>(rng: &mut R, limit: f64) -> f64
where
    R: Rng + ?Sized,
{
    let limit = limit.abs();
    uniform(rng, -limit, limit)
}

/// Round and saturate a value into the `u8` range.
pub fn saturate(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Build a lookup table from a per-intensity mapping.
pub fn lookup_table(f: impl Fn(f64) -> f64) -> [u8; 256] {
    let mut table = [0u8; 256];
    table
        .iter_mut()
        .enumerate()
        .for_each(|(value, entry)| *entry = saturate(f(value as f64)));
    table
}
