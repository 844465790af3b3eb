// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Fontsets realized on a frame

use super::{Fontset, FontsetId, Group};
use crate::conv::{to_u32, to_usize};
use crate::fonts::{FontLibrary, FontSpec};
use crate::frame::{FontStatus, Frame, RealizedFontId};
use crate::Symbol;
use smallvec::SmallVec;

/// Font size used when a request leaves the size unspecified: 12pt
const DEFAULT_SIZE: u32 = 120;

/// A character to be drawn and the code found for it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Glyph {
    /// The character
    pub c: char,
    /// Code in the font chosen by [`Frame::lookup`], if any
    pub code: Option<u32>,
}

impl Glyph {
    /// Construct with no code
    pub fn new(c: char) -> Self {
        Glyph { c, code: None }
    }
}

/// Realized fontset identifier
///
/// Identifies a [`RealizedFontset`] within its [`Frame`] by index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RealizedFontsetId(u32);

impl RealizedFontsetId {
    /// Get as `usize`
    pub fn get(self) -> usize {
        to_usize(self.0)
    }
}

#[derive(Clone, Debug)]
struct FontGroup {
    /// Specs and layouters
    specs: Vec<(FontSpec, Symbol)>,
    /// Realized fonts, best score first, indexed by `limited_size`
    fonts: [Option<Vec<RealizedFontId>>; 2],
}

/// A fontset bound to a request on one frame
///
/// Groups are realized into fonts only when a lookup first reaches them.
#[derive(Clone, Debug)]
pub struct RealizedFontset {
    fontset: FontsetId,
    tick: u32,
    request: FontSpec,
    groups: Vec<FontGroup>,
    per_script: Vec<(Symbol, Vec<(Symbol, usize)>)>,
    per_charset: Vec<(Symbol, usize)>,
    fallback: usize,
}

impl RealizedFontset {
    fn new(id: FontsetId, fontset: &Fontset, request: FontSpec) -> Self {
        let mut groups = vec![];
        let mut push = |group: &Group| {
            let specs = group
                .iter()
                .map(|e| (fontset.spec(e), e.layouter))
                .collect();
            groups.push(FontGroup {
                specs,
                fonts: [None, None],
            });
            groups.len() - 1
        };

        let per_script = fontset
            .per_script
            .iter()
            .map(|(script, langs)| {
                let langs = langs.iter().map(|(lang, g)| (*lang, push(g))).collect();
                (*script, langs)
            })
            .collect();
        let per_charset = fontset
            .per_charset
            .iter()
            .map(|(charset, g)| (*charset, push(g)))
            .collect();
        let fallback = push(&fontset.fallback);

        RealizedFontset {
            fontset: id,
            tick: fontset.tick(),
            request,
            groups,
            per_script,
            per_charset,
            fallback,
        }
    }

    /// The fontset realized
    pub fn fontset(&self) -> FontsetId {
        self.fontset
    }

    /// The request fonts are realized against
    pub fn request(&self) -> &FontSpec {
        &self.request
    }

    /// Groups to try, in order of preference
    fn group_order(
        &self,
        script: Option<Symbol>,
        language: Option<Symbol>,
        charset: Option<Symbol>,
    ) -> SmallVec<[usize; 8]> {
        fn push(order: &mut SmallVec<[usize; 8]>, group: usize) {
            if !order.contains(&group) {
                order.push(group);
            }
        }
        let mut order = SmallVec::new();

        if let Some(charset) = charset {
            if let Some((_, group)) = self.per_charset.iter().find(|(c, _)| *c == charset) {
                push(&mut order, *group);
            }
        }
        if let Some(script) = script {
            if let Some((_, langs)) = self.per_script.iter().find(|(s, _)| *s == script) {
                let language = language.unwrap_or(Symbol::T);
                let exact = langs.iter().filter(|(l, _)| *l == language);
                let generic = langs.iter().filter(|(l, _)| *l == Symbol::T);
                for (_, group) in exact.chain(generic).chain(langs.iter()) {
                    push(&mut order, *group);
                }
            }
        }
        push(&mut order, self.fallback);

        if order.len() == 1 {
            // Nothing more specific applies: try every font we have
            for (_, langs) in &self.per_script {
                for (_, group) in langs {
                    push(&mut order, *group);
                }
            }
            for (_, group) in &self.per_charset {
                push(&mut order, *group);
            }
        }
        order
    }
}

impl Frame {
    /// Realize `fontset` against `request`
    ///
    /// Realized fontsets are cached per `(fontset, request)`; a cached one is
    /// rebuilt if the fontset was modified since. A request size of zero
    /// means 12pt.
    pub fn realize_fontset(
        &mut self,
        lib: &mut FontLibrary,
        fontset: FontsetId,
        request: &FontSpec,
    ) -> RealizedFontsetId {
        let mut request = *request;
        if request.size() == 0 {
            request.set_size(DEFAULT_SIZE);
        }

        let data = lib.fontset_data(fontset);
        if let Some(id) = self.fontset_index.get(&(fontset, request)) {
            let realized = &mut self.fontsets[id.get()];
            if realized.tick != data.tick() {
                log::debug!("fontset {} modified; realizing again", data.name());
                *realized = RealizedFontset::new(fontset, data, request);
            }
            return *id;
        }

        let id = RealizedFontsetId(to_u32(self.fontsets.len()));
        self.fontsets
            .push(RealizedFontset::new(fontset, data, request));
        self.fontset_index.insert((fontset, request), id);
        id
    }

    /// Access a realized fontset
    pub fn realized_fontset(&self, id: RealizedFontsetId) -> &RealizedFontset {
        &self.fontsets[id.get()]
    }

    /// Get the fonts of a group, realizing them if necessary
    fn realize_group(
        &mut self,
        lib: &mut FontLibrary,
        id: RealizedFontsetId,
        group: usize,
        limited_size: bool,
    ) -> Vec<RealizedFontId> {
        let realized = &self.fontsets[id.get()];
        let slot = usize::from(limited_size);
        if let Some(fonts) = &realized.groups[group].fonts[slot] {
            return fonts.clone();
        }
        let specs = realized.groups[group].specs.clone();
        let request = realized.request;

        let mut fonts: Vec<RealizedFontId> = Vec::with_capacity(specs.len());
        for (spec, layouter) in specs {
            let mut this_request = request;
            lib.resize(&spec, &mut this_request);
            let Some(font) = self.select(lib, &spec, &this_request, limited_size, layouter)
            else {
                continue;
            };
            let score = self.font(font).score();
            let pos = fonts
                .iter()
                .position(|f| self.font(*f).score() > score)
                .unwrap_or(fonts.len());
            fonts.insert(pos, font);
        }
        self.fontsets[id.get()].groups[group].fonts[slot] = Some(fonts.clone());
        fonts
    }

    /// Find a font for `glyphs`
    ///
    /// Groups are tried in this order: the group for `charset`; the groups
    /// for `script` with `language` first, then the group for any language,
    /// then other languages; the fallback group. If only the fallback group
    /// applies, every other group is tried after it. Within a group, fonts
    /// are tried best score first. A group's fonts are realized the first
    /// time a lookup reaches it. If `limited_size` is true, fonts not
    /// available at the requested size rank below all others of a group.
    ///
    /// The first font able to encode every glyph wins and is opened. If
    /// there is none, groups are tried again in the same order for a font
    /// able to encode the first glyph only. On success, `code` is set for
    /// each glyph the font encodes; otherwise `None` is returned and the
    /// caller should substitute something of its own.
    #[allow(clippy::too_many_arguments)]
    pub fn lookup(
        &mut self,
        lib: &mut FontLibrary,
        fontset: RealizedFontsetId,
        glyphs: &mut [Glyph],
        script: Option<Symbol>,
        language: Option<Symbol>,
        charset: Option<Symbol>,
        limited_size: bool,
    ) -> Option<RealizedFontId> {
        if glyphs.is_empty() {
            return None;
        }
        let order = self.fontsets[fontset.get()].group_order(script, language, charset);

        for &group in &order {
            let fonts = self.realize_group(lib, fontset, group, limited_size);
            for font in fonts {
                if self.status(font) == FontStatus::Failed {
                    continue;
                }
                let covered = glyphs.iter_mut().all(|g| {
                    g.code = self.encode_char(lib, font, g.c);
                    g.code.is_some()
                });
                if covered && self.open(font).is_ok() {
                    log::debug!(
                        "lookup: {} for {} glyphs",
                        self.font(font).name(lib),
                        glyphs.len()
                    );
                    return Some(font);
                }
            }
        }

        for g in glyphs.iter_mut() {
            g.code = None;
        }
        let first = &mut glyphs[0];
        for &group in &order {
            let fonts = self.realize_group(lib, fontset, group, limited_size);
            for font in fonts {
                if self.status(font) == FontStatus::Failed {
                    continue;
                }
                first.code = self.encode_char(lib, font, first.c);
                if first.code.is_some() && self.open(font).is_ok() {
                    log::debug!("lookup: {} for first glyph only", self.font(font).name(lib));
                    return Some(font);
                }
            }
        }
        first.code = None;
        log::debug!("lookup: no font for {:?}", first.c);
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fontset::{GroupKey, How};
    use crate::fonts::FontProperty::*;
    use crate::Config;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    #[test]
    fn order() {
        let mut lib = FontLibrary::new(&Config::empty());
        let id = lib.fontset("test");
        let spec = lib.spec(&[(Registry, "iso10646-1")]);
        let keys = [
            GroupKey::Script {
                script: sym("latin"),
                language: Some(sym("en")),
            },
            GroupKey::Script {
                script: sym("latin"),
                language: None,
            },
            GroupKey::Script {
                script: sym("latin"),
                language: Some(sym("vi")),
            },
            GroupKey::Charset(sym("iso8859-1")),
            GroupKey::Fallback,
        ];
        for key in keys {
            lib.modify_entry(id, key, &spec, Symbol::NIL, How::Append);
        }
        let realized = RealizedFontset::new(id, lib.fontset_data(id), spec);
        let (en, t, vi, latin1, fallback) = (0, 1, 2, 3, 4);
        assert_eq!(realized.fallback, fallback);

        let order = realized.group_order(Some(sym("latin")), Some(sym("vi")), None);
        assert_eq!(order.as_slice(), &[vi, t, en, fallback]);
        let order = realized.group_order(Some(sym("latin")), None, Some(sym("iso8859-1")));
        assert_eq!(order.as_slice(), &[latin1, t, en, vi, fallback]);
        let order = realized.group_order(Some(sym("latin")), Some(sym("fr")), None);
        assert_eq!(order.as_slice(), &[t, en, vi, fallback]);

        // Only the fallback applies: everything else follows it
        let order = realized.group_order(Some(sym("greek")), None, Some(sym("koi8-r")));
        assert_eq!(order.as_slice(), &[fallback, en, t, vi, latin1]);
        let order = realized.group_order(None, None, None);
        assert_eq!(order.as_slice(), &[fallback, en, t, vi, latin1]);
    }
}
