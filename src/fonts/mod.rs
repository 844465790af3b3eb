// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font description, scoring and selection
//!
//! Fonts are described by a [`FontSpec`]: one value per [`FontProperty`]
//! axis, where symbolic values are interned to small integers by the
//! [`PropertyTable`] of the [`FontLibrary`]. The same type serves as a
//! request, a pattern and the description of a concrete font offered by a
//! [`FontDriver`].
//!
//! ### Font sizes
//!
//! Sizes are given in tenths of a *point*, where 1 point = 1/72 inch; thus
//! a "12 point font" has size 120. A size of zero leaves the size
//! unspecified. A font with vertical resolution zero is *scalable*: it is
//! available at any size. Bitmap fonts have a fixed size and resolution.
//!
//! To translate to pixels we use:
//!
//! -   DPP (Dots Per Point): `dpp = dpi / 72`
//! -   DPEM (Dots Per Em): `dpem = point_size × dpp`
//!
//! The DPI of output is a property of the [`Frame`](crate::Frame). Digital
//! font files have an internally defined *font unit*; drivers scale from
//! font units with [`crate::DPU`].

mod driver;
mod fontdb_driver;
mod library;
mod overrides;
mod property;
mod score;
mod spec;

pub use driver::{Candidate, FontDriver, FontKey, GlyphMetric};
pub use fontdb_driver::FontdbDriver;
pub use library::FontLibrary;
pub use overrides::{Encoding, Overrides};
pub use property::{FontProperty, PropertyTable};
pub use score::{Score, ScorePriority};
pub use spec::FontSpec;
