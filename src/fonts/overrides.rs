// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Per-registry font overrides: encodings and size adjustments
//!
//! Both tables are loaded on first use from the resources tagged
//! `(font encoding nil nil)` and `(font resize nil nil)`:
//!
//! ```none
//! ((FONT-SPEC) ENCODING [REPERTORY])   ; encoding table
//! ((FONT-SPEC) PERCENT)                ; resize table
//! ```
//!
//! `FONT-SPEC` is as for [`FontSpec::from_plist`]. Entries are indexed by
//! registry; entries with a nil registry apply to every font. When
//! `REPERTORY` is omitted the encoding charset doubles as repertory; `nil`
//! means the driver alone decides which characters the font supports.

use super::{FontProperty, FontSpec, PropertyTable};
use crate::charset::{Charset, CharsetRegistry};
use crate::database::{Database, Tags};
use crate::plist::Item;
use crate::{Error, Result, Symbol};
use std::sync::Arc;

/// Charsets used to encode characters for a font
#[derive(Clone, Debug, Default)]
pub struct Encoding {
    /// Maps characters to the code passed to the driver; if `None` the code
    /// is the character's scalar value
    pub charset: Option<Arc<Charset>>,
    /// Characters the font supports; if `None` the driver decides
    pub repertory: Option<Arc<Charset>>,
}

#[derive(Clone, Debug)]
struct EncodingEntry {
    registry: Symbol,
    spec: FontSpec,
    encoding: Symbol,
    /// [`Symbol::NIL`] for no repertory
    repertory: Symbol,
}

#[derive(Clone, Debug)]
struct ResizeEntry {
    registry: Symbol,
    spec: FontSpec,
    percent: u32,
}

/// Registry key of an entry; nil registries are keyed by `t`
fn registry_key(table: &PropertyTable, spec: &FontSpec) -> Symbol {
    match spec.get(table, FontProperty::Registry) {
        Symbol::NIL => Symbol::T,
        registry => registry,
    }
}

/// Indices of entries to try for a font of `registry`, in order
///
/// Entries of the font's registry come first, then catch-all entries. For
/// a font without registry every entry is tried in table order.
fn candidates<'a>(
    registries: impl Iterator<Item = Symbol> + Clone + 'a,
    registry: Symbol,
) -> impl Iterator<Item = usize> + 'a {
    let all = registries.clone().enumerate().map(|(i, _)| i);
    let specific = registries
        .clone()
        .enumerate()
        .filter(move |(_, r)| !registry.is_nil() && *r == registry)
        .map(|(i, _)| i);
    let fallback = registries
        .enumerate()
        .filter(move |(_, r)| !registry.is_nil() && registry != Symbol::T && *r == Symbol::T)
        .map(|(i, _)| i);
    let all = all.filter(move |_| registry.is_nil());
    all.chain(specific).chain(fallback)
}

fn load_table(db: &mut Database, kind: &str) -> Vec<Item> {
    let tags = Tags::new(Symbol::new("font"), Symbol::new(kind), Symbol::NIL, Symbol::NIL);
    let Some(id) = db.find(tags) else {
        log::debug!("no font {kind} table");
        return vec![];
    };
    match db.load(id) {
        Ok(value) => match value.as_plist() {
            Some(items) => items.to_vec(),
            None => vec![],
        },
        Err(err) => {
            log::error!("failed to load font {kind} table: {err}");
            vec![]
        }
    }
}

fn parse_encoding(table: &mut PropertyTable, item: &Item) -> Option<EncodingEntry> {
    let list = item.as_list()?;
    if !(2..=3).contains(&list.len()) {
        return None;
    }
    let spec = FontSpec::from_plist(table, list[0].as_list()?)?;
    let encoding = list[1].as_symbol()?;
    let repertory = match list.get(2) {
        None => encoding,
        Some(item) => item.as_symbol()?,
    };
    Some(EncodingEntry {
        registry: registry_key(table, &spec),
        spec,
        encoding,
        repertory,
    })
}

fn parse_resize(table: &mut PropertyTable, item: &Item) -> Option<ResizeEntry> {
    let list = item.as_list()?;
    if list.len() != 2 {
        return None;
    }
    let spec = FontSpec::from_plist(table, list[0].as_list()?)?;
    let percent = u32::try_from(list[1].as_integer()?).ok()?;
    Some(ResizeEntry {
        registry: registry_key(table, &spec),
        spec,
        percent,
    })
}

/// Lazily loaded override tables
#[derive(Debug, Default)]
pub struct Overrides {
    encodings: Option<Vec<EncodingEntry>>,
    resizes: Option<Vec<ResizeEntry>>,
}

impl Overrides {
    /// Drop loaded tables; they are reloaded on next use
    pub fn clear(&mut self) {
        self.encodings = None;
        self.resizes = None;
    }

    fn encodings(
        &mut self,
        db: &mut Database,
        table: &mut PropertyTable,
    ) -> &mut Vec<EncodingEntry> {
        self.encodings.get_or_insert_with(|| {
            load_table(db, "encoding")
                .iter()
                .filter_map(|item| {
                    let entry = parse_encoding(table, item);
                    if entry.is_none() {
                        log::warn!("bad font encoding entry: {item}");
                    }
                    entry
                })
                .collect()
        })
    }

    fn resizes(&mut self, db: &mut Database, table: &mut PropertyTable) -> &[ResizeEntry] {
        self.resizes.get_or_insert_with(|| {
            load_table(db, "resize")
                .iter()
                .filter_map(|item| {
                    let entry = parse_resize(table, item);
                    if entry.is_none() {
                        log::warn!("bad font resize entry: {item}");
                    }
                    entry
                })
                .collect()
        })
    }

    /// Scale the size of `request` if `spec` has a resize entry
    pub fn resize(
        &mut self,
        db: &mut Database,
        table: &mut PropertyTable,
        spec: &FontSpec,
        request: &mut FontSpec,
    ) {
        let registry = spec.get(table, FontProperty::Registry);
        let entries = self.resizes(db, table);
        let registries = entries.iter().map(|e| e.registry);
        for i in candidates(registries, registry) {
            let entry = &entries[i];
            if spec.matches(&entry.spec, FontProperty::Adstyle) {
                let size = u64::from(request.size()) * u64::from(entry.percent) / 100;
                request.set_size(u32::try_from(size).unwrap_or(u32::MAX));
                return;
            }
        }
    }

    /// Find the encoding of `font`
    ///
    /// Entries naming a charset which cannot be resolved are removed.
    pub fn find_encoding(
        &mut self,
        db: &mut Database,
        table: &mut PropertyTable,
        charsets: &mut CharsetRegistry,
        font: &FontSpec,
    ) -> Encoding {
        let registry = font.get(table, FontProperty::Registry);
        loop {
            let entries = self.encodings(db, table);
            let registries = entries.iter().map(|e| e.registry);
            let found = candidates(registries, registry)
                .find(|i| font.matches(&entries[*i].spec, FontProperty::Adstyle));
            let Some(i) = found else {
                return Encoding::default();
            };

            let entry = entries[i].clone();
            let charset = charsets.get(db, entry.encoding);
            let repertory = match entry.repertory {
                Symbol::NIL => Some(None),
                name if name == entry.encoding => Some(charset.clone()),
                name => charsets.get(db, name).map(Some),
            };
            match (charset, repertory) {
                (Some(charset), Some(repertory)) => {
                    return Encoding {
                        charset: Some(charset),
                        repertory,
                    };
                }
                _ => {
                    log::warn!(
                        "dropping font encoding {}: unknown charset",
                        entry.encoding
                    );
                    self.encodings(db, table).remove(i);
                }
            }
        }
    }

    /// Set the encoding of fonts matching `font`
    ///
    /// The new entry takes precedence over all others for the same registry
    /// and replaces any entry with the same spec. A `repertory` of
    /// [`Symbol::NIL`] leaves character support to the driver.
    pub fn set_encoding(
        &mut self,
        db: &mut Database,
        table: &mut PropertyTable,
        charsets: &mut CharsetRegistry,
        font: &FontSpec,
        encoding: Symbol,
        repertory: Symbol,
    ) -> Result<()> {
        if charsets.get(db, encoding).is_none() {
            return Err(Error::UnknownCharset(encoding));
        }
        if !repertory.is_nil() && charsets.get(db, repertory).is_none() {
            return Err(Error::UnknownCharset(repertory));
        }

        let registry = registry_key(table, font);
        let entries = self.encodings(db, table);
        entries.retain(|e| e.spec != *font);
        entries.insert(
            0,
            EncodingEntry {
                registry,
                spec: *font,
                encoding,
                repertory,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    #[test]
    fn candidate_order() {
        let regs = [sym("iso8859-1"), Symbol::T, sym("jisx0208"), sym("iso8859-1")];
        let order: Vec<usize> = candidates(regs.iter().copied(), sym("iso8859-1")).collect();
        assert_eq!(order, vec![0, 3, 1]);
        let order: Vec<usize> = candidates(regs.iter().copied(), sym("koi8-r")).collect();
        assert_eq!(order, vec![1]);
        let order: Vec<usize> = candidates(regs.iter().copied(), Symbol::NIL).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn entries() {
        let mut table = PropertyTable::default();
        let items = crate::plist::parse(
            "((iso8859-7) greek) ((nil) unicode nil) ((a b c) x y z) (bad)",
        )
        .unwrap();
        let e = parse_encoding(&mut table, &items[0]).unwrap();
        assert_eq!(e.registry, sym("iso8859-7"));
        assert_eq!(e.repertory, sym("greek"));
        let e = parse_encoding(&mut table, &items[1]).unwrap();
        assert_eq!(e.registry, Symbol::T);
        assert_eq!(e.repertory, Symbol::NIL);
        assert!(parse_encoding(&mut table, &items[2]).is_none());
        assert!(parse_encoding(&mut table, &items[3]).is_none());

        let items = crate::plist::parse("((misc fixed iso8859-1) 120) ((iso8859-1) -5)").unwrap();
        assert_eq!(parse_resize(&mut table, &items[0]).unwrap().percent, 120);
        assert!(parse_resize(&mut table, &items[1]).is_none());
    }
}
