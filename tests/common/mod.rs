// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Shared test fixtures

#![allow(dead_code)]

use kas_fontset::fonts::{
    FontDriver, FontKey, FontLibrary, FontProperty, FontSpec, GlyphMetric, PropertyTable,
};
use kas_fontset::{Config, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// A font offered by [`MockDriver`]
pub struct MockFont {
    pub spec: FontSpec,
    /// Characters the font has glyphs for
    pub chars: String,
    /// If true, opening the font fails
    pub broken: bool,
}

impl MockFont {
    /// A bitmap font at 75 DPI
    pub fn new(
        lib: &mut FontLibrary,
        props: &[(FontProperty, &str)],
        size: u32,
        chars: &str,
    ) -> Self {
        let mut spec = lib.spec(props);
        spec.set_size(size);
        spec.set_resy(75);
        MockFont {
            spec,
            chars: chars.to_string(),
            broken: false,
        }
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

/// Driver calls, in order
pub type CallLog = Rc<RefCell<Vec<String>>>;

/// An in-memory font driver which records calls
pub struct MockDriver {
    name: &'static str,
    fonts: Vec<MockFont>,
    catalog: Vec<(FontSpec, FontKey)>,
    pub log: CallLog,
}

impl MockDriver {
    pub fn new(name: &'static str, fonts: Vec<MockFont>) -> Self {
        let catalog = fonts
            .iter()
            .enumerate()
            .map(|(i, font)| (font.spec, FontKey(i as u32)))
            .collect();
        MockDriver {
            name,
            fonts,
            catalog,
            log: Rc::default(),
        }
    }

    fn font(&self, key: FontKey) -> &MockFont {
        &self.fonts[key.0 as usize]
    }
}

impl FontDriver for MockDriver {
    fn name(&self) -> &str {
        self.name
    }

    fn catalog(&mut self, _: &mut PropertyTable) -> &[(FontSpec, FontKey)] {
        &self.catalog
    }

    fn open(&mut self, key: FontKey) -> Result<()> {
        self.log.borrow_mut().push(format!("open {}", key.0));
        if self.font(key).broken {
            Err(kas_fontset::Error::Open(format!("mock font {}", key.0)))
        } else {
            Ok(())
        }
    }

    fn close(&mut self, key: FontKey) {
        self.log.borrow_mut().push(format!("close {}", key.0));
    }

    fn encode_char(&mut self, key: FontKey, c: char, code: u32) -> Option<u32> {
        self.log.borrow_mut().push(format!("encode {} {c} {code:#x}", key.0));
        self.font(key).chars.contains(c).then_some(code)
    }

    fn find_metric(&mut self, key: FontKey, code: u32, dpem: f32) -> Option<GlyphMetric> {
        let c = char::from_u32(code)?;
        self.font(key).chars.contains(c).then_some(GlyphMetric {
            advance: dpem / 2.0,
            ascent: dpem * 0.8,
            descent: dpem * 0.2,
            ..Default::default()
        })
    }
}

/// A library with no resource directories
pub fn library() -> FontLibrary {
    FontLibrary::new(&Config::empty())
}
