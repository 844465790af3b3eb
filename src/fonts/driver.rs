// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font back-end drivers

use super::{FontProperty, FontSpec, PropertyTable, Score, ScorePriority};
use crate::Result;

/// Identifies a font within one driver
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontKey(pub u32);

/// The best font a driver offers for a request
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Properties of the font
    pub font: FontSpec,
    /// Driver-local identifier
    pub key: FontKey,
    /// Score against the request
    pub score: Score,
}

/// Metrics of one glyph, in pixels
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GlyphMetric {
    /// Horizontal advance
    pub advance: f32,
    /// Distance from the origin to the left edge of the ink
    pub lbearing: f32,
    /// Distance from the origin to the right edge of the ink
    pub rbearing: f32,
    /// Height above the baseline
    pub ascent: f32,
    /// Depth below the baseline
    pub descent: f32,
}

/// A source of fonts
///
/// A driver describes its fonts as [`FontSpec`]s, interning their
/// properties through the [`PropertyTable`] passed in. The default
/// [`FontDriver::list`] and [`FontDriver::select`] work from
/// [`FontDriver::catalog`]; drivers with an index of their own may
/// override them.
pub trait FontDriver {
    /// A short name for diagnostics
    fn name(&self) -> &str;

    /// All fonts this driver offers
    fn catalog(&mut self, table: &mut PropertyTable) -> &[(FontSpec, FontKey)];

    /// Fonts matching `pattern` on every specified axis
    fn list(&mut self, table: &mut PropertyTable, pattern: &FontSpec) -> Vec<FontSpec> {
        self.catalog(table)
            .iter()
            .filter(|(font, _)| {
                font.matches(pattern, FontProperty::Registry)
                    && (font.size() == 0 || pattern.size() == 0 || font.size() == pattern.size())
            })
            .map(|(font, _)| *font)
            .collect()
    }

    /// The best font for `request` among those agreeing with `spec`
    ///
    /// Fonts differing from `spec` on any symbolic property it specifies
    /// are never candidates; a font of unspecified registry is a candidate
    /// only if `spec` also leaves the registry unspecified. Ties go to the
    /// font listed first.
    fn select(
        &mut self,
        table: &mut PropertyTable,
        priority: &ScorePriority,
        spec: &FontSpec,
        request: &FontSpec,
        limited_size: bool,
    ) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for (font, key) in self.catalog(table) {
            if !font.matches(spec, FontProperty::Adstyle)
                || (spec.registry() != 0 && font.registry() != spec.registry())
            {
                continue;
            }
            let score = priority.score(font, spec, request, limited_size);
            if score.is_reject() || best.is_some_and(|best| best.score <= score) {
                continue;
            }
            best = Some(Candidate {
                font: *font,
                key: *key,
                score,
            });
        }
        best
    }

    /// Prepare a font for use
    fn open(&mut self, key: FontKey) -> Result<()>;

    /// Release resources held by an opened font
    fn close(&mut self, key: FontKey);

    /// Get the glyph code for `c`
    ///
    /// `code` is `c` as encoded by the font's encoding charset, if any.
    /// Returns `None` if the font has no glyph for `c`.
    fn encode_char(&mut self, key: FontKey, c: char, code: u32) -> Option<u32>;

    /// Get metrics of glyph `code` at `dpem` pixels per em
    fn find_metric(&mut self, key: FontKey, code: u32, dpem: f32) -> Option<GlyphMetric>;
}
