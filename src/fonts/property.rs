// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font properties and their interning tables

use crate::conv::{to_u32, to_usize};
use crate::Symbol;
use std::collections::HashMap;
use std::fmt;

/// A font property axis
///
/// The first seven axes are symbolic and interned through a
/// [`PropertyTable`]; [`FontProperty::Size`] and [`FontProperty::Resy`] are
/// numeric.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FontProperty {
    Foundry = 0,
    Family,
    Weight,
    Style,
    Stretch,
    /// Additional style, e.g. `sans` or `serif`
    Adstyle,
    Registry,
    /// Size in tenths of a point
    Size,
    /// Vertical resolution in dots per inch; zero for scalable fonts
    Resy,
}

impl FontProperty {
    /// Number of axes
    pub const COUNT: usize = 9;

    /// The symbolic axes, in index order
    pub const SYMBOLIC: [FontProperty; 7] = [
        FontProperty::Foundry,
        FontProperty::Family,
        FontProperty::Weight,
        FontProperty::Style,
        FontProperty::Stretch,
        FontProperty::Adstyle,
        FontProperty::Registry,
    ];

    /// Index of this axis in a [`super::FontSpec`]
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// True for axes interned through a [`PropertyTable`]
    #[inline]
    pub fn is_symbolic(self) -> bool {
        self <= FontProperty::Registry
    }

    /// The axis's name, as used in property lists
    pub fn name(self) -> &'static str {
        match self {
            FontProperty::Foundry => "foundry",
            FontProperty::Family => "family",
            FontProperty::Weight => "weight",
            FontProperty::Style => "style",
            FontProperty::Stretch => "stretch",
            FontProperty::Adstyle => "adstyle",
            FontProperty::Registry => "registry",
            FontProperty::Size => "size",
            FontProperty::Resy => "resolution",
        }
    }

    /// Look up an axis by name
    pub fn from_name(name: &str) -> Option<Self> {
        let props = FontProperty::SYMBOLIC
            .into_iter()
            .chain([FontProperty::Size, FontProperty::Resy]);
        props.into_iter().find(|prop| prop.name() == name)
    }
}

impl fmt::Display for FontProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values known in advance, in the order they are numbered
///
/// Nearby weights get nearby numbers, which makes their difference a usable
/// distance when scoring.
const COMMON_NAMES: [&[&str]; 7] = [
    &["misc", "adobe"],
    &["fixed", "courier", "helvetica", "times"],
    &[
        "ultralight",
        "extralight",
        "light",
        "demilight",
        "book",
        "normal",
        "medium",
        "regular",
        "demibold",
        "bold",
        "extrabold",
        "ultrabold",
        "black",
    ],
    &["o", "i", "r", "ri", "ro"],
    &[
        "condensed",
        "narrow",
        "semicondensed",
        "normal",
        "semiexpanded",
        "expanded",
    ],
    &["serif", "", "sans"],
    &["iso8859-1"],
];

#[derive(Clone, Debug, Default)]
struct Axis {
    // names[0] is nil
    names: Vec<Symbol>,
    numbers: HashMap<Symbol, u32>,
}

impl Axis {
    fn intern(&mut self, sym: Symbol) -> u32 {
        if sym.is_nil() {
            return 0;
        }
        if let Some(n) = self.numbers.get(&sym) {
            return *n;
        }
        let n = to_u32(self.names.len());
        self.names.push(sym);
        self.numbers.insert(sym, n);
        n
    }
}

/// Dense numbering of symbolic font property values
///
/// Each symbolic axis numbers its values from 1 in order of first use;
/// 0 means "unspecified". Tables are pre-populated with common values.
#[derive(Clone, Debug)]
pub struct PropertyTable {
    axes: [Axis; 7],
}

impl Default for PropertyTable {
    fn default() -> Self {
        let mut table = PropertyTable {
            axes: Default::default(),
        };
        for (axis, names) in table.axes.iter_mut().zip(COMMON_NAMES) {
            axis.names.push(Symbol::NIL);
            for name in names {
                axis.intern(Symbol::new(name));
            }
        }
        table
    }
}

impl PropertyTable {
    /// Get the number of `sym` on axis `prop`, assigning one if new
    ///
    /// Returns 0 for [`Symbol::NIL`] and for non-symbolic axes.
    pub fn intern(&mut self, prop: FontProperty, sym: Symbol) -> u32 {
        match self.axes.get_mut(prop.index()) {
            Some(axis) => axis.intern(sym),
            None => 0,
        }
    }

    /// Get the number of `sym` on axis `prop` without assigning one
    pub fn number(&self, prop: FontProperty, sym: Symbol) -> Option<u32> {
        if sym.is_nil() {
            return Some(0);
        }
        self.axes.get(prop.index())?.numbers.get(&sym).copied()
    }

    /// Get the symbol numbered `n` on axis `prop`
    ///
    /// Returns [`Symbol::NIL`] for 0 and for unknown numbers.
    pub fn symbol(&self, prop: FontProperty, n: u32) -> Symbol {
        self.axes
            .get(prop.index())
            .and_then(|axis| axis.names.get(to_usize(n)))
            .copied()
            .unwrap_or(Symbol::NIL)
    }

    /// Number of values known on axis `prop`, excluding nil
    pub fn len(&self, prop: FontProperty) -> usize {
        self.axes
            .get(prop.index())
            .map(|axis| axis.names.len() - 1)
            .unwrap_or(0)
    }
}
