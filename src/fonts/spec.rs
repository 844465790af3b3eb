// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font specifications

use super::{FontProperty, PropertyTable};
use crate::plist::Item;
use crate::Symbol;
use std::fmt::Write;

/// A font specification
///
/// One number per [`FontProperty`] axis. Symbolic axes hold a number from a
/// [`PropertyTable`]; zero on any axis means "unspecified". The same type
/// describes requests, patterns and concrete fonts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontSpec {
    props: [u32; FontProperty::COUNT],
}

impl FontSpec {
    /// A specification with every axis unspecified
    pub const fn new() -> Self {
        FontSpec {
            props: [0; FontProperty::COUNT],
        }
    }

    /// Get the raw number on an axis
    #[inline]
    pub fn number(&self, prop: FontProperty) -> u32 {
        self.props[prop.index()]
    }

    /// Set the raw number on an axis
    #[inline]
    pub fn set_number(&mut self, prop: FontProperty, value: u32) {
        self.props[prop.index()] = value;
    }

    /// Get a symbolic property
    pub fn get(&self, table: &PropertyTable, prop: FontProperty) -> Symbol {
        table.symbol(prop, self.number(prop))
    }

    /// Set a symbolic property, interning `value` if new
    pub fn put(&mut self, table: &mut PropertyTable, prop: FontProperty, value: Symbol) {
        let n = table.intern(prop, value);
        self.set_number(prop, n);
    }

    /// Builder form of [`Self::put`]
    pub fn with(mut self, table: &mut PropertyTable, prop: FontProperty, value: &str) -> Self {
        self.put(table, prop, Symbol::new(value));
        self
    }

    /// Size in tenths of a point
    #[inline]
    pub fn size(&self) -> u32 {
        self.number(FontProperty::Size)
    }

    /// Set the size in tenths of a point
    #[inline]
    pub fn set_size(&mut self, size: u32) {
        self.set_number(FontProperty::Size, size);
    }

    /// Vertical resolution in dots per inch
    #[inline]
    pub fn resy(&self) -> u32 {
        self.number(FontProperty::Resy)
    }

    /// Set the vertical resolution
    #[inline]
    pub fn set_resy(&mut self, resy: u32) {
        self.set_number(FontProperty::Resy, resy);
    }

    /// True if this describes a scalable font (resolution zero)
    #[inline]
    pub fn is_scalable(&self) -> bool {
        self.resy() == 0
    }

    /// Registry number
    #[inline]
    pub fn registry(&self) -> u32 {
        self.number(FontProperty::Registry)
    }

    /// Parse `([FOUNDRY FAMILY [WEIGHT [STYLE [STRETCH [ADSTYLE]]]]] REGISTRY)`
    ///
    /// The last symbol is the registry; the others fill axes from the foundry
    /// onwards. Returns `None` if any element is not a symbol or there are
    /// too many elements.
    pub fn from_plist(table: &mut PropertyTable, items: &[Item]) -> Option<Self> {
        let (registry, rest) = items.split_last()?;
        if rest.len() > FontProperty::Adstyle.index() + 1 {
            return None;
        }
        let registry = registry.as_symbol()?;
        let symbols: Option<Vec<Symbol>> = rest.iter().map(Item::as_symbol).collect();

        let mut spec = FontSpec::new();
        spec.put(table, FontProperty::Registry, registry);
        for (prop, sym) in FontProperty::SYMBOLIC.into_iter().zip(symbols?) {
            spec.put(table, prop, sym);
        }
        Some(spec)
    }

    /// Render as a nested list accepted by [`Self::from_plist`]
    pub fn to_plist(&self, table: &PropertyTable) -> Item {
        let last = FontProperty::SYMBOLIC[..6]
            .iter()
            .rposition(|prop| self.number(*prop) != 0);
        let mut items: Vec<Item> = match last {
            Some(last) => FontProperty::SYMBOLIC[..=last.max(1)]
                .iter()
                .map(|prop| Item::Symbol(self.get(table, *prop)))
                .collect(),
            None => vec![],
        };
        items.push(Item::Symbol(self.get(table, FontProperty::Registry)));
        Item::List(items)
    }

    /// True if `self` agrees with `pattern` on axes up to and including `last`
    ///
    /// An axis agrees if either side leaves it unspecified or both hold the
    /// same value.
    pub fn matches(&self, pattern: &FontSpec, last: FontProperty) -> bool {
        (0..=last.index()).all(|i| {
            let (a, b) = (self.props[i], pattern.props[i]);
            a == 0 || b == 0 || a == b
        })
    }

    /// Fill unspecified axes of `self` from `other`
    pub fn merge(&self, other: &FontSpec) -> FontSpec {
        let mut merged = *self;
        for (a, b) in merged.props.iter_mut().zip(other.props) {
            if *a == 0 {
                *a = b;
            }
        }
        merged
    }

    /// A human-readable name: comma-separated property names and point size
    pub fn name(&self, table: &PropertyTable) -> String {
        let mut name = String::new();
        for prop in FontProperty::SYMBOLIC {
            let sym = self.get(table, prop);
            if sym.is_nil() || sym.as_str().is_empty() {
                continue;
            }
            if !name.is_empty() {
                name.push(',');
            }
            name.push_str(sym.as_str());
        }
        let _ = write!(name, ",{}", self.size() / 10);
        name
    }
}
