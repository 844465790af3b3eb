// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! A font driver over system fonts
//!
//! Fonts are discovered by [`fontdb`] and read with [`ttf_parser`]. Every
//! face is offered as a scalable font of registry `iso10646-1`.

use super::{FontDriver, FontKey, FontProperty, FontSpec, GlyphMetric, PropertyTable};
use crate::conv::{to_u32, to_usize, DPU};
use crate::{Error, Result, Symbol};
use fontdb::{Database, Stretch, Style, Weight, ID};
use std::collections::{HashMap, HashSet};
use ttf_parser::{Face, GlyphId};

/// Registry of all faces offered
pub const REGISTRY: &str = "iso10646-1";

fn weight_name(weight: Weight) -> &'static str {
    match weight.0 {
        0..=149 => "ultralight",
        150..=249 => "extralight",
        250..=324 => "light",
        325..=374 => "demilight",
        375..=399 => "book",
        400..=449 => "normal",
        450..=549 => "medium",
        550..=649 => "demibold",
        650..=749 => "bold",
        750..=849 => "extrabold",
        _ => "black",
    }
}

fn style_name(style: Style) -> &'static str {
    match style {
        Style::Normal => "r",
        Style::Italic => "i",
        Style::Oblique => "o",
    }
}

fn stretch_name(stretch: Stretch) -> &'static str {
    match stretch {
        Stretch::UltraCondensed | Stretch::ExtraCondensed | Stretch::Condensed => "condensed",
        Stretch::SemiCondensed => "semicondensed",
        Stretch::Normal => "normal",
        Stretch::SemiExpanded => "semiexpanded",
        Stretch::Expanded | Stretch::ExtraExpanded | Stretch::UltraExpanded => "expanded",
    }
}

/// Font driver backed by a [`fontdb::Database`]
pub struct FontdbDriver {
    db: Database,
    faces: Vec<ID>,
    catalog: Option<Vec<(FontSpec, FontKey)>>,
    opened: HashSet<FontKey>,
    glyphs: HashMap<(FontKey, char), Option<u32>>,
}

impl FontdbDriver {
    /// Construct over an existing font database
    pub fn new(db: Database) -> Self {
        FontdbDriver {
            db,
            faces: vec![],
            catalog: None,
            opened: HashSet::new(),
            glyphs: HashMap::new(),
        }
    }

    /// Construct over the system's fonts
    pub fn system() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        log::info!("FontdbDriver: found {} faces", db.len());
        Self::new(db)
    }

    /// Access the font database
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn with_face<T>(&self, key: FontKey, f: impl FnOnce(&Face<'_>) -> Option<T>) -> Option<T> {
        let id = *self.faces.get(to_usize(key.0))?;
        self.db
            .with_face_data(id, |data, index| {
                Face::parse(data, index).ok().and_then(|face| f(&face))
            })
            .flatten()
    }
}

impl FontDriver for FontdbDriver {
    fn name(&self) -> &str {
        "fontdb"
    }

    fn catalog(&mut self, table: &mut PropertyTable) -> &[(FontSpec, FontKey)] {
        if self.catalog.is_none() {
            let registry = Symbol::new(REGISTRY);
            let mut catalog = Vec::with_capacity(self.db.len());
            for face in self.db.faces() {
                let Some((family, _)) = face.families.first() else {
                    continue;
                };
                let mut spec = FontSpec::new();
                spec.put(table, FontProperty::Family, Symbol::new(&family.to_lowercase()));
                spec.put(table, FontProperty::Weight, Symbol::new(weight_name(face.weight)));
                spec.put(table, FontProperty::Style, Symbol::new(style_name(face.style)));
                spec.put(table, FontProperty::Stretch, Symbol::new(stretch_name(face.stretch)));
                spec.put(table, FontProperty::Registry, registry);

                let key = FontKey(to_u32(self.faces.len()));
                self.faces.push(face.id);
                catalog.push((spec, key));
            }
            log::debug!("FontdbDriver: catalogued {} faces", catalog.len());
            self.catalog = Some(catalog);
        }
        self.catalog.as_deref().unwrap_or_default()
    }

    fn open(&mut self, key: FontKey) -> Result<()> {
        if self.opened.contains(&key) {
            return Ok(());
        }
        self.with_face(key, |_| Some(()))
            .ok_or_else(|| Error::Open(format!("fontdb face {} is unreadable", key.0)))?;
        self.opened.insert(key);
        Ok(())
    }

    fn close(&mut self, key: FontKey) {
        self.opened.remove(&key);
        self.glyphs.retain(|(k, _), _| *k != key);
    }

    fn encode_char(&mut self, key: FontKey, c: char, _: u32) -> Option<u32> {
        if let Some(code) = self.glyphs.get(&(key, c)) {
            return *code;
        }
        let code = self.with_face(key, |face| face.glyph_index(c).map(|id| u32::from(id.0)));
        self.glyphs.insert((key, c), code);
        code
    }

    fn find_metric(&mut self, key: FontKey, code: u32, dpem: f32) -> Option<GlyphMetric> {
        let id = GlyphId(u16::try_from(code).ok()?);
        self.with_face(key, |face| {
            let dpu = DPU::new(dpem, face.units_per_em());
            let mut metric = GlyphMetric {
                advance: dpu.u16_to_px(face.glyph_hor_advance(id)?),
                ..Default::default()
            };
            if let Some(rect) = face.glyph_bounding_box(id) {
                metric.lbearing = dpu.i16_to_px(rect.x_min);
                metric.rbearing = dpu.i16_to_px(rect.x_max);
                metric.ascent = dpu.i16_to_px(rect.y_max);
                metric.descent = -dpu.i16_to_px(rect.y_min);
            }
            Some(metric)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fonts::ScorePriority;

    #[test]
    fn names() {
        assert_eq!(weight_name(Weight::NORMAL), "normal");
        assert_eq!(weight_name(Weight::BOLD), "bold");
        assert_eq!(weight_name(Weight::THIN), "ultralight");
        assert_eq!(weight_name(Weight::BLACK), "black");
        assert_eq!(style_name(Style::Oblique), "o");
        assert_eq!(stretch_name(Stretch::ExtraCondensed), "condensed");
        assert_eq!(stretch_name(Stretch::Normal), "normal");
    }

    #[test]
    fn empty_database() {
        let mut driver = FontdbDriver::new(Database::new());
        let mut table = PropertyTable::default();
        assert!(driver.catalog(&mut table).is_empty());
        assert!(driver.list(&mut table, &FontSpec::new()).is_empty());
        let request = FontSpec::new();
        let priority = ScorePriority::default();
        assert!(driver
            .select(&mut table, &priority, &request, &request, false)
            .is_none());
        assert!(driver.open(FontKey(0)).is_err());
        assert_eq!(driver.encode_char(FontKey(0), 'a', 0x61), None);
    }
}
