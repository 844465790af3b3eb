// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Type conversion utilities
//!
//! Identifiers (resources, font specs, realized fonts) are represented as
//! `u32` instead of `usize` in order to save space. None of the arenas in
//! this library are expected to approach `u32::MAX` entries.

use easy_cast::{Cast, CastApprox};

/// Convert `usize` → `u32`
///
/// This is a "safer" wrapper around `as` ensuring (on debug builds) that the
/// input value may be represented correctly by `u32`.
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Convert `u32` → `usize`
///
/// This is a "safer" wrapper around `as` ensuring that the operation is
/// zero-extension.
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

/// Convert a size in tenths of a point to pixels per em
///
/// `dpi` is the device resolution in dots per inch; one point is 1/72 inch.
#[inline]
pub fn dpem_from_size(size: u32, dpi: f32) -> f32 {
    let size: f32 = size.cast_approx();
    size / 10.0 * dpi / 72.0
}

/// Scale factor: pixels per font unit
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DPU(pub f32);

impl DPU {
    /// Construct from pixels-per-em and the font's units-per-em
    pub(crate) fn new(dpem: f32, units_per_em: u16) -> Self {
        DPU(dpem / f32::from(units_per_em.max(1)))
    }
    pub(crate) fn i16_to_px(self, x: i16) -> f32 {
        f32::from(x) * self.0
    }
    pub(crate) fn u16_to_px(self, x: u16) -> f32 {
        f32::from(x) * self.0
    }
}
