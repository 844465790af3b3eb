// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Charsets: mappings between character codes and code points
//!
//! A charset maps each of its code points to at most one character. Code
//! points are addressed through a linear index (`code - min_code`).
//! Built-in charsets are identity mappings over a range; others are decoded
//! from charset table resources (see [`crate::database`]).

use crate::chartab::CharTable;
use crate::database::{Database, Tags, Value};
use crate::Symbol;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
enum Method {
    Identity,
    Table {
        decoder: CharTable<Option<i64>>,
        encoder: CharTable<Option<i64>>,
    },
}

/// A coded character set
#[derive(Clone, Debug)]
pub struct Charset {
    name: Symbol,
    min_code: u32,
    max_code: u32,
    method: Method,
}

impl Charset {
    /// A charset where each code point equals its character code
    pub fn identity(name: Symbol, min_code: u32, max_code: u32) -> Self {
        Charset {
            name,
            min_code,
            max_code,
            method: Method::Identity,
        }
    }

    /// Unicode, as an identity charset over all scalar values
    pub fn unicode() -> Self {
        Self::identity(Symbol::new("unicode"), 0, 0x10FFFF)
    }

    /// ISO-8859-1 (Latin-1)
    pub fn iso8859_1() -> Self {
        Self::identity(Symbol::new("iso8859-1"), 0, 0xFF)
    }

    /// US-ASCII
    pub fn ascii() -> Self {
        Self::identity(Symbol::new("ascii"), 0, 0x7F)
    }

    /// Build from runs of `(first_code, last_code, first_char)`
    ///
    /// Each run maps `first_code + k` to `first_char + k`. Returns `None` if
    /// `runs` is empty. Where runs overlap, later runs decide decoding and
    /// earlier runs decide encoding. Codes mapping beyond the last valid
    /// character are dropped.
    pub fn from_runs(name: Symbol, runs: &[(u32, u32, u32)]) -> Option<Self> {
        let min_code = runs.iter().map(|r| r.0).min()?;
        let max_code = runs.iter().map(|r| r.1).max()?;

        // Both tables hold the offset from key to mapped value
        let mut decoder = CharTable::new(None);
        let mut encoder = CharTable::new(None);
        let valid = runs.iter().filter_map(|&(from, to, first_char)| {
            let room = u32::from(char::MAX).checked_sub(first_char)?;
            let to = to.min(from.saturating_add(room));
            (from <= to).then_some((from, to, first_char))
        });
        for (from, to, first_char) in valid.clone() {
            let offset = i64::from(first_char) - i64::from(from);
            decoder.set_range(from, to, Some(offset));
        }
        for (from, to, first_char) in valid.rev() {
            let offset = i64::from(from) - i64::from(first_char);
            encoder.set_range(first_char, first_char + (to - from), Some(offset));
        }

        Some(Charset {
            name,
            min_code,
            max_code,
            method: Method::Table { decoder, encoder },
        })
    }

    /// The charset's name
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// Smallest code point
    pub fn min_code(&self) -> u32 {
        self.min_code
    }

    /// Largest code point
    pub fn max_code(&self) -> u32 {
        self.max_code
    }

    /// Map a code point to its linear index
    pub fn code_point_to_index(&self, code: u32) -> Option<u32> {
        (self.min_code..=self.max_code)
            .contains(&code)
            .then(|| code - self.min_code)
    }

    /// Map a linear index to its code point
    pub fn index_to_code_point(&self, index: u32) -> Option<u32> {
        let code = self.min_code.checked_add(index)?;
        (code <= self.max_code).then_some(code)
    }

    /// Decode a code point to a character
    pub fn decode_char(&self, code: u32) -> Option<char> {
        self.code_point_to_index(code)?;
        match &self.method {
            Method::Identity => char::from_u32(code),
            Method::Table { decoder, .. } => {
                let offset = (*decoder.get(code))?;
                let c = i64::from(code) + offset;
                u32::try_from(c).ok().and_then(char::from_u32)
            }
        }
    }

    /// Encode a character to a code point
    pub fn encode_char(&self, c: char) -> Option<u32> {
        match &self.method {
            Method::Identity => {
                let code = u32::from(c);
                self.code_point_to_index(code).map(|_| code)
            }
            Method::Table { encoder, .. } => {
                let c = u32::from(c);
                let offset = (*encoder.get(c))?;
                u32::try_from(i64::from(c) + offset).ok()
            }
        }
    }
}

/// Charsets by name
///
/// Built-in charsets are always present. Others are loaded on first use
/// from the resource tagged `(charset NAME nil nil)`.
#[derive(Debug)]
pub struct CharsetRegistry {
    charsets: HashMap<Symbol, Arc<Charset>>,
}

impl Default for CharsetRegistry {
    fn default() -> Self {
        let mut registry = CharsetRegistry {
            charsets: HashMap::new(),
        };
        for charset in [Charset::unicode(), Charset::iso8859_1(), Charset::ascii()] {
            registry.register(charset);
        }
        registry
    }
}

impl CharsetRegistry {
    /// Add (or replace) a charset
    pub fn register(&mut self, charset: Charset) -> Arc<Charset> {
        let charset = Arc::new(charset);
        self.charsets.insert(charset.name(), charset.clone());
        charset
    }

    /// Look up a charset, loading it from `db` if necessary
    pub fn get(&mut self, db: &mut Database, name: Symbol) -> Option<Arc<Charset>> {
        if let Some(charset) = self.charsets.get(&name) {
            return Some(charset.clone());
        }

        let tags = Tags::new(Symbol::new("charset"), name, Symbol::NIL, Symbol::NIL);
        let id = db.find(tags)?;
        match db.load(id) {
            Ok(value) => match &*value {
                Value::Charset(charset) => {
                    self.charsets.insert(name, charset.clone());
                    Some(charset.clone())
                }
                _ => {
                    log::warn!("resource {tags} is not a charset table");
                    None
                }
            },
            Err(err) => {
                log::error!("failed to load charset {name}: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identity() {
        let latin1 = Charset::iso8859_1();
        assert_eq!(latin1.encode_char('é'), Some(0xE9));
        assert_eq!(latin1.encode_char('Ā'), None);
        assert_eq!(latin1.decode_char(0x41), Some('A'));
        assert_eq!(latin1.decode_char(0x100), None);
    }

    #[test]
    fn runs() {
        let runs = [(0x21, 0x23, 0x391), (0x30, 0x30, 0x3A9)];
        let cs = Charset::from_runs(Symbol::new("test-runs"), &runs).unwrap();
        assert_eq!(cs.min_code(), 0x21);
        assert_eq!(cs.max_code(), 0x30);
        assert_eq!(cs.decode_char(0x22), Some('Β'));
        assert_eq!(cs.decode_char(0x24), None);
        assert_eq!(cs.encode_char('Γ'), Some(0x23));
        assert_eq!(cs.encode_char('Ω'), Some(0x30));
        assert_eq!(cs.code_point_to_index(0x30), Some(0x0F));
        assert_eq!(cs.index_to_code_point(0x0F), Some(0x30));
        assert_eq!(cs.index_to_code_point(0x10), None);
        assert!(Charset::from_runs(Symbol::new("empty"), &[]).is_none());
    }

    #[test]
    fn sparse_runs() {
        let runs = [
            (0x00, 0x00, 0x41),
            (0x0FFF_FFFF, 0x0FFF_FFFF, 0x42),
            (0x8130_8130, 0x8130_8139, 0x80),
            (0xFFFF_FFF0, 0xFFFF_FFFF, 0x10_FFFA),
        ];
        let cs = Charset::from_runs(Symbol::new("test-sparse"), &runs).unwrap();
        assert_eq!(cs.max_code(), 0xFFFF_FFFF);
        assert_eq!(cs.decode_char(0x0FFF_FFFF), Some('B'));
        assert_eq!(cs.decode_char(0x0FFF_FFFE), None);
        assert_eq!(cs.decode_char(0x8130_8132), Some('\u{82}'));
        assert_eq!(cs.encode_char('\u{89}'), Some(0x8130_8139));
        assert_eq!(cs.encode_char('A'), Some(0x00));
        // Only six codes of the last run map to valid characters
        assert_eq!(cs.decode_char(0xFFFF_FFF5), Some(char::MAX));
        assert_eq!(cs.decode_char(0xFFFF_FFF6), None);
        assert_eq!(cs.encode_char(char::MAX), Some(0xFFFF_FFF5));
    }

    #[test]
    fn overlapping_runs() {
        let runs = [(0x10, 0x1F, 0x100), (0x18, 0x18, 0x41)];
        let cs = Charset::from_runs(Symbol::new("test-overlap"), &runs).unwrap();
        assert_eq!(cs.decode_char(0x18), Some('A'));
        assert_eq!(cs.decode_char(0x17), Some('\u{107}'));
        assert_eq!(cs.decode_char(0x19), Some('\u{109}'));
        assert_eq!(cs.encode_char('\u{108}'), Some(0x18));
        assert_eq!(cs.encode_char('A'), Some(0x18));
    }
}
