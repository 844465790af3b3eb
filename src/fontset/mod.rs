// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Fontsets
//!
//! A fontset is a named collection of font specifications, grouped by
//! script and language, by charset, and a fallback group. Definitions are
//! read from the resource tagged `(fontset NAME nil nil)`:
//!
//! ```none
//! (SCRIPT (LANGUAGE FONT-ELT ...) ...)
//! (CHARSET FONT-ELT ...)
//! (nil FONT-ELT ...)
//!
//! FONT-ELT = ((FONT-SPEC) [LAYOUTER])
//! ```
//!
//! A `LANGUAGE` of `nil` makes the group apply to any language of the
//! script; such groups are stored under `t`. Fontsets are realized against
//! a request on a [`Frame`](crate::Frame); see [`RealizedFontset`].

mod realized;

pub use realized::{Glyph, RealizedFontset, RealizedFontsetId};

use crate::conv::{to_u32, to_usize};
use crate::database::Tags;
use crate::fonts::{FontLibrary, FontProperty, FontSpec, PropertyTable};
use crate::plist::Item;
use crate::{Error, Result, Symbol};
use std::collections::HashMap;
use std::fmt::Write;

/// Fontset identifier
///
/// Identifies a fontset within the [`FontLibrary`] by index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontsetId(u32);

impl FontsetId {
    /// Get as `usize`
    pub fn get(self) -> usize {
        to_usize(self.0)
    }
}

/// Selects a group of a fontset
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Fonts for `script`; a `language` of `None` applies to any language
    Script {
        script: Symbol,
        language: Option<Symbol>,
    },
    /// Fonts for a charset
    Charset(Symbol),
    /// Fonts tried when no other group applies
    Fallback,
}

/// How [`FontLibrary::modify_entry`] changes a group
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum How {
    /// Insert before existing entries
    Prepend,
    /// Insert after existing entries
    Append,
    /// Replace all existing entries
    Replace,
}

/// One entry of a font group
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Element {
    /// Index into [`Fontset::specs`]
    pub spec: usize,
    /// Layout table name, or [`Symbol::NIL`]
    pub layouter: Symbol,
}

type Group = Vec<Element>;

/// A fontset definition
#[derive(Clone, Debug)]
pub struct Fontset {
    name: Symbol,
    loaded: bool,
    tick: u32,
    /// Distinct specs used by this fontset
    specs: Vec<FontSpec>,
    pub(crate) per_script: Vec<(Symbol, Vec<(Symbol, Group)>)>,
    pub(crate) per_charset: Vec<(Symbol, Group)>,
    pub(crate) fallback: Group,
}

impl Fontset {
    fn new(name: Symbol) -> Self {
        Fontset {
            name,
            loaded: false,
            tick: 0,
            specs: vec![],
            per_script: vec![],
            per_charset: vec![],
            fallback: vec![],
        }
    }

    /// The fontset's name
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// Modification counter
    ///
    /// Realized fontsets built at an earlier tick are rebuilt on next use.
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Get the spec of an element
    pub(crate) fn spec(&self, element: &Element) -> FontSpec {
        self.specs[element.spec]
    }

    /// Number of distinct specs
    pub fn num_specs(&self) -> usize {
        self.specs.len()
    }

    /// Scripts with at least one group
    pub fn scripts(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.per_script.iter().map(|(script, _)| *script)
    }

    /// Charsets with a group
    pub fn charsets(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.per_charset.iter().map(|(charset, _)| *charset)
    }

    /// Specs and layouters of a group, if present
    pub fn group(&self, key: GroupKey) -> Option<Vec<(FontSpec, Symbol)>> {
        let group = match key {
            GroupKey::Script { script, language } => {
                let language = language.unwrap_or(Symbol::T);
                let (_, langs) = self.per_script.iter().find(|(s, _)| *s == script)?;
                &langs.iter().find(|(l, _)| *l == language)?.1
            }
            GroupKey::Charset(charset) => {
                &self.per_charset.iter().find(|(c, _)| *c == charset)?.1
            }
            GroupKey::Fallback => &self.fallback,
        };
        Some(group.iter().map(|e| (self.spec(e), e.layouter)).collect())
    }

    fn intern_spec(&mut self, spec: FontSpec) -> usize {
        match self.specs.iter().position(|s| *s == spec) {
            Some(index) => index,
            None => {
                self.specs.push(spec);
                self.specs.len() - 1
            }
        }
    }

    fn group_mut(&mut self, key: GroupKey) -> &mut Group {
        match key {
            GroupKey::Script { script, language } => {
                let language = language.unwrap_or(Symbol::T);
                let index = match self.per_script.iter().position(|(s, _)| *s == script) {
                    Some(index) => index,
                    None => {
                        self.per_script.push((script, vec![]));
                        self.per_script.len() - 1
                    }
                };
                let langs = &mut self.per_script[index].1;
                let index = match langs.iter().position(|(l, _)| *l == language) {
                    Some(index) => index,
                    None => {
                        langs.push((language, vec![]));
                        langs.len() - 1
                    }
                };
                &mut langs[index].1
            }
            GroupKey::Charset(charset) => {
                let index = match self.per_charset.iter().position(|(c, _)| *c == charset) {
                    Some(index) => index,
                    None => {
                        self.per_charset.push((charset, vec![]));
                        self.per_charset.len() - 1
                    }
                };
                &mut self.per_charset[index].1
            }
            GroupKey::Fallback => &mut self.fallback,
        }
    }

    fn add(&mut self, key: GroupKey, spec: FontSpec, layouter: Symbol, how: How) {
        let element = Element {
            spec: self.intern_spec(spec),
            layouter,
        };
        let group = self.group_mut(key);
        match how {
            How::Prepend => group.insert(0, element),
            How::Append => group.push(element),
            How::Replace => {
                group.clear();
                group.push(element);
            }
        }
    }

    /// Read definition items, skipping malformed entries
    fn read(&mut self, table: &mut PropertyTable, items: &[Item]) {
        for item in items {
            if self.read_entry(table, item).is_none() {
                log::warn!("fontset {}: bad entry {item}", self.name);
            }
        }
    }

    fn read_entry(&mut self, table: &mut PropertyTable, item: &Item) -> Option<()> {
        let list = item.as_list()?;
        let (head, rest) = list.split_first()?;
        let key = head.as_symbol()?;

        if key.is_nil() {
            for elt in rest {
                self.read_element(table, GroupKey::Fallback, elt);
            }
            return Some(());
        }

        match rest.first()?.as_list()?.first()? {
            Item::Symbol(_) => {
                for per_lang in rest {
                    let Some((lang, elts)) = per_lang.as_list().and_then(|l| l.split_first()) else {
                        log::warn!("fontset {}: bad language group {per_lang}", self.name);
                        continue;
                    };
                    let Some(language) = lang.as_symbol() else {
                        log::warn!("fontset {}: bad language {lang}", self.name);
                        continue;
                    };
                    let key = GroupKey::Script {
                        script: key,
                        language: language.non_nil(),
                    };
                    for elt in elts {
                        self.read_element(table, key, elt);
                    }
                }
            }
            Item::List(_) => {
                for elt in rest {
                    self.read_element(table, GroupKey::Charset(key), elt);
                }
            }
            _ => return None,
        }
        Some(())
    }

    fn read_element(&mut self, table: &mut PropertyTable, key: GroupKey, item: &Item) {
        let parsed = item.as_list().and_then(|list| {
            let spec = FontSpec::from_plist(table, list.first()?.as_list()?)?;
            let layouter = match list {
                [_] => Symbol::NIL,
                [_, layouter] => layouter.as_symbol()?,
                _ => return None,
            };
            Some((spec, layouter))
        });
        match parsed {
            Some((spec, layouter)) => self.add(key, spec, layouter, How::Append),
            None => log::warn!("fontset {}: bad font element {item}", self.name),
        }
    }

    fn dump_group(&self, out: &mut String, table: &PropertyTable, indent: usize, group: &Group) {
        for element in group {
            let spec = self.spec(element).to_plist(table);
            let _ = write!(out, "\n{:indent$}({} {spec})", "", element.layouter);
        }
    }

    /// Render as text, for debugging
    pub fn dump(&self, table: &PropertyTable) -> String {
        let mut out = format!("(fontset {}", self.name);
        for (script, langs) in &self.per_script {
            let _ = write!(out, "\n  ({script}");
            for (lang, group) in langs {
                let _ = write!(out, "\n    ({lang}");
                self.dump_group(&mut out, table, 6, group);
                out.push(')');
            }
            out.push(')');
        }
        for (charset, group) in &self.per_charset {
            let _ = write!(out, "\n  ({charset}");
            self.dump_group(&mut out, table, 4, group);
            out.push(')');
        }
        out.push_str("\n  (nil");
        self.dump_group(&mut out, table, 4, &self.fallback);
        out.push_str("))");
        out
    }
}

/// Fontsets by name
#[derive(Debug, Default)]
pub struct Fontsets {
    list: Vec<Fontset>,
    names: HashMap<Symbol, FontsetId>,
}

impl Fontsets {
    fn insert(&mut self, fontset: Fontset) -> FontsetId {
        let id = FontsetId(to_u32(self.list.len()));
        self.names.insert(fontset.name, id);
        self.list.push(fontset);
        id
    }
}

/// Name of the fontset used when none is specified
pub const DEFAULT_FONTSET: &str = "default";

impl FontLibrary {
    /// Get the fontset named `name`, creating it if necessary
    ///
    /// A new fontset's contents are loaded on first use from the resource
    /// tagged `(fontset NAME nil nil)`. If there is no such resource the
    /// fontset is empty, except for the [`DEFAULT_FONTSET`] which then gets
    /// fallback fonts of registries `iso8859-1` and `iso10646-1`.
    pub fn fontset(&mut self, name: &str) -> FontsetId {
        let name = Symbol::new(name);
        match self.fontsets.names.get(&name) {
            Some(id) => *id,
            None => self.fontsets.insert(Fontset::new(name)),
        }
    }

    /// Get an existing fontset by name
    pub fn find_fontset(&self, name: &str) -> Option<FontsetId> {
        self.fontsets.names.get(&Symbol::new(name)).copied()
    }

    /// Names of all fontsets created so far
    pub fn fontset_names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.fontsets.list.iter().map(|fs| fs.name)
    }

    /// Access a fontset, loading its contents if necessary
    pub fn fontset_data(&mut self, id: FontsetId) -> &Fontset {
        self.load_fontset(id);
        &self.fontsets.list[id.get()]
    }

    fn load_fontset(&mut self, id: FontsetId) {
        let fontset = &mut self.fontsets.list[id.get()];
        if fontset.loaded {
            return;
        }
        fontset.loaded = true;
        let name = fontset.name;

        let tags = Tags::new(Symbol::new("fontset"), name, Symbol::NIL, Symbol::NIL);
        let items = match self.db.find(tags) {
            Some(rid) => match self.db.load(rid) {
                Ok(value) => value.as_plist().map(<[Item]>::to_vec).unwrap_or_default(),
                Err(err) => {
                    log::error!("failed to load fontset {name}: {err}");
                    vec![]
                }
            },
            None if name.as_str() == DEFAULT_FONTSET => {
                log::debug!("no resource for fontset {name}; using built-in fallback");
                let fontset = &mut self.fontsets.list[id.get()];
                for registry in ["iso8859-1", "iso10646-1"] {
                    let spec =
                        FontSpec::new().with(&mut self.props, FontProperty::Registry, registry);
                    fontset.add(GroupKey::Fallback, spec, Symbol::NIL, How::Append);
                }
                return;
            }
            None => {
                log::debug!("no resource for fontset {name}");
                return;
            }
        };

        let fontset = &mut self.fontsets.list[id.get()];
        fontset.read(&mut self.props, &items);
        log::debug!(
            "loaded fontset {name}: {} distinct specs",
            fontset.specs.len()
        );
    }

    /// Create a fontset named `name` with the contents of `src`
    ///
    /// Fails if a fontset named `name` already exists.
    pub fn copy_fontset(&mut self, src: FontsetId, name: &str) -> Result<FontsetId> {
        let name = Symbol::new(name);
        if self.fontsets.names.contains_key(&name) {
            return Err(Error::FontsetExists(name));
        }
        self.load_fontset(src);
        let mut fontset = self.fontsets.list[src.get()].clone();
        fontset.name = name;
        fontset.tick = 0;
        Ok(self.fontsets.insert(fontset))
    }

    /// Add `spec` to a group of a fontset
    ///
    /// The group is created if necessary. Realized fontsets of this
    /// fontset are rebuilt on next use.
    pub fn modify_entry(
        &mut self,
        id: FontsetId,
        key: GroupKey,
        spec: &FontSpec,
        layouter: Symbol,
        how: How,
    ) {
        self.load_fontset(id);
        let fontset = &mut self.fontsets.list[id.get()];
        fontset.add(key, *spec, layouter, how);
        fontset.tick = fontset.tick.wrapping_add(1);
    }

    /// Render a fontset as text, for debugging
    pub fn dump_fontset(&mut self, id: FontsetId) -> String {
        self.load_fontset(id);
        self.fontsets.list[id.get()].dump(&self.props)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::{Source, Status, Value};
    use crate::fonts::FontProperty::*;
    use crate::{plist, Config};

    const GENERIC: &str = r#"
        (latin
          (nil ((nil times iso8859-1)) ((nil courier iso8859-1) otf))
          (vi ((nil times iso10646-1))))
        (iso8859-7 ((nil times iso8859-7)))
        (han (ja ((nil mincho jisx0208))) (zh bad))
        (bogus 12)
        (nil ((iso10646-1)) ((nil times iso8859-1)))
    "#;

    fn generic(_: &Tags) -> Result<Value> {
        Ok(Value::Plist(plist::parse(GENERIC).unwrap()))
    }

    fn library() -> FontLibrary {
        let mut lib = FontLibrary::new(&Config::empty());
        lib.database_mut().register(
            Tags::from_names(&["fontset", "generic"]),
            Source::Producer(generic),
            Status::Explicit,
        );
        lib
    }

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    #[test]
    fn load() {
        let mut lib = library();
        let id = lib.fontset("generic");
        assert_eq!(lib.fontset("generic"), id);
        let fs = lib.fontset_data(id);

        assert_eq!(fs.scripts().collect::<Vec<_>>(), vec![sym("latin"), sym("han")]);
        assert_eq!(fs.charsets().collect::<Vec<_>>(), vec![sym("iso8859-7")]);
        // (nil times iso8859-1) is shared by two groups
        assert_eq!(fs.num_specs(), 6);

        let latin = fs
            .group(GroupKey::Script {
                script: sym("latin"),
                language: None,
            })
            .unwrap();
        assert_eq!(latin.len(), 2);
        assert_eq!(latin[1].1, sym("otf"));
        assert_eq!(fs.group(GroupKey::Fallback).unwrap().len(), 2);
        let han = GroupKey::Script {
            script: sym("han"),
            language: Some(sym("ja")),
        };
        assert_eq!(fs.group(han).unwrap().len(), 1);
    }

    #[test]
    fn default_fontset() {
        let mut lib = FontLibrary::new(&Config::empty());
        let id = lib.fontset(DEFAULT_FONTSET);
        let fallback = lib.fontset_data(id).group(GroupKey::Fallback).unwrap();
        let registries: Vec<_> = fallback
            .iter()
            .map(|(spec, _)| spec.get(lib.properties(), Registry))
            .collect();
        assert_eq!(registries, vec![sym("iso8859-1"), sym("iso10646-1")]);

        let empty = lib.fontset("no-such-fontset");
        assert_eq!(lib.fontset_data(empty).num_specs(), 0);
    }

    #[test]
    fn modify() {
        let mut lib = library();
        let id = lib.fontset("generic");
        let arial = lib.spec(&[(Family, "arial"), (Registry, "iso8859-1")]);
        let key = GroupKey::Script {
            script: sym("latin"),
            language: None,
        };

        lib.modify_entry(id, key, &arial, Symbol::NIL, How::Prepend);
        let group = lib.fontset_data(id).group(key).unwrap();
        assert_eq!(group.len(), 3);
        assert_eq!(group[0].0, arial);
        assert_eq!(lib.fontset_data(id).tick(), 1);

        lib.modify_entry(id, key, &arial, sym("otf"), How::Append);
        let group = lib.fontset_data(id).group(key).unwrap();
        assert_eq!(group.len(), 4);
        assert_eq!(group[3], (arial, sym("otf")));
        assert_eq!(lib.fontset_data(id).num_specs(), 7);

        lib.modify_entry(id, GroupKey::Fallback, &arial, Symbol::NIL, How::Replace);
        let group = lib.fontset_data(id).group(GroupKey::Fallback).unwrap();
        assert_eq!(group, vec![(arial, Symbol::NIL)]);

        let cyrillic = GroupKey::Script {
            script: sym("cyrillic"),
            language: Some(sym("ru")),
        };
        lib.modify_entry(id, cyrillic, &arial, Symbol::NIL, How::Append);
        assert_eq!(lib.fontset_data(id).group(cyrillic).unwrap().len(), 1);
    }

    #[test]
    fn copy() {
        let mut lib = library();
        let id = lib.fontset("generic");
        let copy = lib.copy_fontset(id, "mine").unwrap();
        assert_ne!(copy, id);
        assert_eq!(lib.find_fontset("mine"), Some(copy));
        assert_eq!(lib.fontset_data(copy).num_specs(), 6);

        let arial = lib.spec(&[(Family, "arial"), (Registry, "iso8859-1")]);
        lib.modify_entry(copy, GroupKey::Fallback, &arial, Symbol::NIL, How::Append);
        assert_eq!(lib.fontset_data(copy).group(GroupKey::Fallback).unwrap().len(), 3);
        assert_eq!(lib.fontset_data(id).group(GroupKey::Fallback).unwrap().len(), 2);

        assert!(matches!(
            lib.copy_fontset(id, "mine"),
            Err(Error::FontsetExists(_))
        ));
    }

    #[test]
    fn dump() {
        let mut lib = library();
        let id = lib.fontset("generic");
        let text = lib.dump_fontset(id);
        assert!(text.starts_with("(fontset generic\n  (latin\n    (t\n"));
        assert!(text.contains("(otf (nil courier iso8859-1))"));
        assert!(text.contains("\n  (iso8859-7\n    (nil (nil times iso8859-7)))"));
        assert!(text.ends_with("(nil (nil times iso8859-1))))"));
    }
}
