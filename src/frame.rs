// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Frames: font drivers and realized fonts for one output device

use crate::conv::{dpem_from_size, to_u32, to_usize};
use crate::fonts::{
    Candidate, Encoding, FontDriver, FontKey, FontLibrary, FontProperty, FontSpec, GlyphMetric,
    Score,
};
use crate::fontset::{FontsetId, RealizedFontset, RealizedFontsetId};
use crate::{Error, Result, Symbol};
use std::collections::HashMap;
use std::fmt;

/// Realized font identifier
///
/// Identifies a [`RealizedFont`] within its [`Frame`] by index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RealizedFontId(u32);

impl RealizedFontId {
    /// Get as `usize`
    pub fn get(self) -> usize {
        to_usize(self.0)
    }
}

/// Whether a font has been opened by its driver
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FontStatus {
    #[default]
    NotOpened,
    Opened,
    /// The driver failed to open the font; it will not be tried again
    Failed,
}

/// A font selected by a driver for a spec and request
///
/// Fonts differing only in layouter share one driver font, and hence one
/// [`FontStatus`].
#[derive(Clone, Debug)]
pub struct RealizedFont {
    driver: usize,
    key: FontKey,
    spec: FontSpec,
    request: FontSpec,
    font: FontSpec,
    score: Score,
    limited_size: bool,
    layouter: Symbol,
    encoding: Option<Encoding>,
}

impl RealizedFont {
    /// The spec the font was selected for
    pub fn spec(&self) -> &FontSpec {
        &self.spec
    }

    /// The request the font was scored against
    pub fn request(&self) -> &FontSpec {
        &self.request
    }

    /// Properties of the selected font
    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    /// Score of the font against the request
    pub fn score(&self) -> Score {
        self.score
    }

    /// True if selected with fonts of other sizes penalized
    pub fn limited_size(&self) -> bool {
        self.limited_size
    }

    /// Layout table name, or [`Symbol::NIL`]
    pub fn layouter(&self) -> Symbol {
        self.layouter
    }

    /// Driver-local identifier of the font
    pub fn key(&self) -> FontKey {
        self.key
    }

    /// Human-readable name of the font
    pub fn name(&self, lib: &FontLibrary) -> String {
        self.font.name(lib.properties())
    }
}

/// Font state for one output device
///
/// A frame owns a list of [`FontDriver`]s, the fonts realized from them and
/// the fontsets realized against requests. Realized fonts are cached by
/// `(spec, request, limited_size)` and never freed before the frame. Dropping the frame
/// closes every font it opened.
pub struct Frame {
    /// Device resolution in dots per inch, used to scale metrics
    pub dpi: f32,
    drivers: Vec<Box<dyn FontDriver>>,
    fonts: Vec<RealizedFont>,
    status: HashMap<(usize, FontKey), FontStatus>,
    pub(crate) fontsets: Vec<RealizedFontset>,
    pub(crate) fontset_index: HashMap<(FontsetId, FontSpec), RealizedFontsetId>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let drivers: Vec<&str> = self.drivers.iter().map(|d| d.name()).collect();
        f.debug_struct("Frame")
            .field("dpi", &self.dpi)
            .field("drivers", &drivers)
            .field("fonts", &self.fonts.len())
            .field("fontsets", &self.fontsets.len())
            .finish()
    }
}

impl Frame {
    /// Construct over `drivers`, in order of preference
    ///
    /// Where drivers offer equally good fonts the earlier driver wins.
    pub fn new(drivers: Vec<Box<dyn FontDriver>>) -> Self {
        Frame {
            dpi: 96.0,
            drivers,
            fonts: vec![],
            status: HashMap::new(),
            fontsets: vec![],
            fontset_index: HashMap::new(),
        }
    }

    /// Access a realized font
    pub fn font(&self, id: RealizedFontId) -> &RealizedFont {
        &self.fonts[id.get()]
    }

    /// Number of fonts realized so far
    pub fn num_fonts(&self) -> usize {
        self.fonts.len()
    }

    /// Get the open status of a font
    pub fn status(&self, id: RealizedFontId) -> FontStatus {
        let font = &self.fonts[id.get()];
        self.status
            .get(&(font.driver, font.key))
            .copied()
            .unwrap_or_default()
    }

    /// Select the best font for `request` among those agreeing with `spec`
    ///
    /// Every driver offers its best candidate; the lowest score wins. The
    /// result is cached: a repeated call with the same `spec`, `request` and
    /// `limited_size` returns the same font, or a copy sharing its driver
    /// font if `layouter` differs. Returns `None` if every driver rejects the
    /// request.
    pub fn select(
        &mut self,
        lib: &mut FontLibrary,
        spec: &FontSpec,
        request: &FontSpec,
        limited_size: bool,
        layouter: Symbol,
    ) -> Option<RealizedFontId> {
        let mut same_font = None;
        for (i, font) in self.fonts.iter().enumerate() {
            if font.spec == *spec
                && font.request == *request
                && font.limited_size == limited_size
            {
                if font.layouter == layouter {
                    return Some(RealizedFontId(to_u32(i)));
                }
                same_font = Some(i);
            }
        }
        if let Some(i) = same_font {
            let font = RealizedFont {
                layouter,
                ..self.fonts[i].clone()
            };
            return Some(self.push(font));
        }

        let mut best: Option<(usize, Candidate)> = None;
        for (i, driver) in self.drivers.iter_mut().enumerate() {
            let Some(c) = driver.select(&mut lib.props, &lib.priority, spec, request, limited_size)
            else {
                continue;
            };
            if c.score.is_reject() {
                continue;
            }
            if best.map_or(true, |(_, best)| c.score < best.score) {
                best = Some((i, c));
            }
        }

        let Some((driver, candidate)) = best else {
            log::debug!(
                "select: nothing for {} (request {})",
                spec.name(&lib.props),
                request.name(&lib.props)
            );
            return None;
        };
        log::debug!(
            "select: {} from {} with {:?}",
            candidate.font.name(&lib.props),
            self.drivers[driver].name(),
            candidate.score
        );
        Some(self.push(RealizedFont {
            driver,
            key: candidate.key,
            spec: *spec,
            request: *request,
            font: candidate.font,
            score: candidate.score,
            limited_size,
            layouter,
            encoding: None,
        }))
    }

    fn push(&mut self, font: RealizedFont) -> RealizedFontId {
        let id = RealizedFontId(to_u32(self.fonts.len()));
        self.fonts.push(font);
        id
    }

    /// Find the best font for `spec`
    ///
    /// Only the registry of `spec` is binding; other properties are
    /// preferences. Returns the font's properties and score.
    pub fn find(
        &mut self,
        lib: &mut FontLibrary,
        spec: &FontSpec,
        limited_size: bool,
    ) -> Option<(FontSpec, Score)> {
        let mut pin = FontSpec::new();
        pin.set_number(FontProperty::Registry, spec.registry());
        let id = self.select(lib, &pin, spec, limited_size, Symbol::NIL)?;
        let font = self.font(id);
        Some((font.font, font.score))
    }

    /// List the fonts of every driver matching `pattern`
    pub fn list_fonts(&mut self, lib: &mut FontLibrary, pattern: &FontSpec) -> Vec<FontSpec> {
        self.drivers
            .iter_mut()
            .flat_map(|driver| driver.list(&mut lib.props, pattern))
            .collect()
    }

    /// Open a font
    ///
    /// Opening is attempted once per driver font; a failure is remembered.
    pub fn open(&mut self, id: RealizedFontId) -> Result<()> {
        let font = &self.fonts[id.get()];
        let key = (font.driver, font.key);
        match self.status.get(&key).copied().unwrap_or_default() {
            FontStatus::Opened => Ok(()),
            FontStatus::Failed => Err(Error::Open(format!(
                "{} font {} failed previously",
                self.drivers[key.0].name(),
                key.1 .0
            ))),
            FontStatus::NotOpened => {
                let result = self.drivers[key.0].open(key.1);
                let status = match result {
                    Ok(()) => FontStatus::Opened,
                    Err(ref err) => {
                        log::warn!("{}: {err}", self.drivers[key.0].name());
                        FontStatus::Failed
                    }
                };
                self.status.insert(key, status);
                result
            }
        }
    }

    /// Get the encoding of a font
    pub fn encoding(&mut self, lib: &mut FontLibrary, id: RealizedFontId) -> &Encoding {
        let font = &mut self.fonts[id.get()];
        font.encoding
            .get_or_insert_with(|| lib.find_encoding(&font.font))
    }

    /// Get the code of `c` in a font
    ///
    /// Returns `None` if the font's repertory excludes `c`, its encoding
    /// cannot map `c`, or the driver has no glyph for it. The font need not
    /// be open.
    pub fn encode_char(
        &mut self,
        lib: &mut FontLibrary,
        id: RealizedFontId,
        c: char,
    ) -> Option<u32> {
        let encoding = self.encoding(lib, id);
        if let Some(repertory) = &encoding.repertory {
            repertory.encode_char(c)?;
        }
        let code = match &encoding.charset {
            Some(charset) => charset.encode_char(c)?,
            None => u32::from(c),
        };
        let font = &self.fonts[id.get()];
        self.drivers[font.driver].encode_char(font.key, c, code)
    }

    /// Get metrics of glyph `code` in a font
    ///
    /// Metrics are scaled to the request size (or the font's own size if
    /// the request leaves it unspecified) at the frame's resolution.
    pub fn glyph_metric(&mut self, id: RealizedFontId, code: u32) -> Option<GlyphMetric> {
        let font = &self.fonts[id.get()];
        let size = match font.request.size() {
            0 => font.font.size(),
            size => size,
        };
        let dpem = dpem_from_size(size, self.dpi);
        self.drivers[font.driver].find_metric(font.key, code, dpem)
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        for ((driver, key), status) in self.status.drain() {
            if status == FontStatus::Opened {
                self.drivers[driver].close(key);
            }
        }
    }
}
