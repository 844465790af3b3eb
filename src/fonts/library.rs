// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font library

use super::{Encoding, FontProperty, FontSpec, Overrides, PropertyTable, ScorePriority};
use crate::charset::{Charset, CharsetRegistry};
use crate::database::Database;
use crate::fontset::Fontsets;
use crate::{Config, Result, Symbol};
use std::sync::Arc;

/// Library state shared by all frames
///
/// This owns the resource [`Database`] along with every table derived from
/// it: interned font properties, the selection priority, charsets, font
/// override tables and fontset definitions. Tables are loaded lazily on
/// first use. Dropping the library releases all of them.
#[derive(Debug)]
pub struct FontLibrary {
    pub(crate) db: Database,
    pub(crate) props: PropertyTable,
    pub(crate) priority: ScorePriority,
    pub(crate) charsets: CharsetRegistry,
    pub(crate) overrides: Overrides,
    pub(crate) fontsets: Fontsets,
}

impl Default for FontLibrary {
    fn default() -> Self {
        FontLibrary::new(&Config::default())
    }
}

impl FontLibrary {
    /// Construct over the directories of `config`
    pub fn new(config: &Config) -> Self {
        Self::with_database(Database::new(config))
    }

    /// Construct over an existing database
    pub fn with_database(db: Database) -> Self {
        FontLibrary {
            db,
            props: PropertyTable::default(),
            priority: ScorePriority::default(),
            charsets: CharsetRegistry::default(),
            overrides: Overrides::default(),
            fontsets: Fontsets::default(),
        }
    }

    /// Access the resource database
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Access the resource database mutably
    ///
    /// Override tables already loaded are kept; call
    /// [`Self::reload_overrides`] after registering replacements.
    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    /// Access the property table
    pub fn properties(&self) -> &PropertyTable {
        &self.props
    }

    /// Access the property table mutably
    ///
    /// This is needed to construct a [`FontSpec`] with new property values.
    pub fn properties_mut(&mut self) -> &mut PropertyTable {
        &mut self.props
    }

    /// Construct a spec from `(property, value)` pairs
    pub fn spec(&mut self, props: &[(FontProperty, &str)]) -> FontSpec {
        props.iter().fold(FontSpec::new(), |spec, (prop, value)| {
            spec.with(&mut self.props, *prop, value)
        })
    }

    /// Get the font selection priority
    pub fn priority(&self) -> &ScorePriority {
        &self.priority
    }

    /// Set the font selection priority, most important property first
    ///
    /// See [`ScorePriority::set`]. Fonts already realized keep their scores.
    pub fn set_priority(&mut self, order: &[FontProperty]) -> Result<()> {
        self.priority.set(order)
    }

    /// Look up a charset by name, loading it if necessary
    pub fn charset(&mut self, name: Symbol) -> Option<Arc<Charset>> {
        self.charsets.get(&mut self.db, name)
    }

    /// Add (or replace) a charset
    pub fn register_charset(&mut self, charset: Charset) -> Arc<Charset> {
        self.charsets.register(charset)
    }

    /// Scale the size of `request` per the resize table entry matching `spec`
    pub fn resize(&mut self, spec: &FontSpec, request: &mut FontSpec) {
        self.overrides
            .resize(&mut self.db, &mut self.props, spec, request);
    }

    /// Find the encoding of `font`
    pub fn find_encoding(&mut self, font: &FontSpec) -> Encoding {
        self.overrides
            .find_encoding(&mut self.db, &mut self.props, &mut self.charsets, font)
    }

    /// Set the encoding of fonts matching `font`
    ///
    /// Fonts already realized keep their encoding.
    pub fn set_encoding(
        &mut self,
        font: &FontSpec,
        encoding: Symbol,
        repertory: Symbol,
    ) -> Result<()> {
        self.overrides.set_encoding(
            &mut self.db,
            &mut self.props,
            &mut self.charsets,
            font,
            encoding,
            repertory,
        )
    }

    /// Discard loaded encoding and resize tables
    ///
    /// They are loaded again on next use, discarding any
    /// [`Self::set_encoding`] overrides.
    pub fn reload_overrides(&mut self) {
        self.overrides.clear();
    }
}
