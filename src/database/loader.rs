// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Resource format loaders

use super::{CharValue, Tags, Value};
use crate::chartab::CharTable;
use crate::charset::Charset;
use crate::conv::to_u32;
use crate::plist::{self, parse_integer, Item};
use crate::{Error, Result, Symbol};
use std::sync::Arc;

/// Parse `text` according to the resource kind named by `tags`
pub(crate) fn load(tags: &Tags, text: &str) -> Result<Value> {
    match tags.kind().as_str() {
        "char-table" => load_char_table(tags.0[1], text).map(Value::CharTable),
        "charset" => load_charset(tags.0[1], text).map(Value::Charset),
        _ => load_plist(tags, text).map(Value::Plist),
    }
}

/// Parse a nested-list resource
///
/// Files discovered through a wildcard manifest entry start with their own
/// tag declaration; it is not part of the value.
fn load_plist(tags: &Tags, text: &str) -> Result<Vec<Item>> {
    let mut items = plist::parse(text).map_err(|e| e.into_error("nested list"))?;
    let is_declaration = items.first().and_then(Item::as_list).is_some_and(|list| {
        list.first().and_then(Item::as_symbol) == Some(tags.kind())
            && list.len() <= 4
            && list.iter().all(|item| item.as_symbol().is_some())
    });
    if is_declaration {
        items.remove(0);
    }
    Ok(items)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ValueType {
    Symbol,
    Integer,
    String,
    Text,
    Plist,
}

impl ValueType {
    fn from_symbol(sym: Symbol) -> Self {
        match sym.as_str() {
            "integer" => ValueType::Integer,
            "string" => ValueType::String,
            "text" => ValueType::Text,
            "plist" => ValueType::Plist,
            _ => ValueType::Symbol,
        }
    }
}

fn malformed(line: usize, msg: impl Into<String>) -> Error {
    Error::Malformed {
        context: "char-table",
        line: to_u32(line),
        msg: msg.into(),
    }
}

/// Parse a code: decimal, `0x` hexadecimal or a quoted character `'c'`
fn parse_code(s: &str) -> Option<u32> {
    if let Some(rest) = s.strip_prefix('\'') {
        let mut chars = rest.chars();
        let c = chars.next()?;
        return (chars.as_str() == "'").then_some(u32::from(c));
    }
    if s.starts_with('-') {
        return None;
    }
    parse_integer(s).and_then(|x| u32::try_from(x).ok())
}

fn parse_range(s: &str) -> Option<(u32, u32)> {
    // A quoted '-' must not be taken for a separator
    let split = if s.starts_with('\'') {
        s.get(1..)?.find('\'').map(|i| i + 2)
    } else {
        s.find('-')
    };
    match split {
        Some(i) if i < s.len() => {
            let (from, to) = (&s[..i], s[i..].strip_prefix('-')?);
            Some((parse_code(from)?, parse_code(to)?))
        }
        _ => {
            let code = parse_code(s)?;
            Some((code, code))
        }
    }
}

/// Take a bare symbol from the start of `s`, honouring backslash escapes
fn parse_symbol(s: &str) -> Option<Symbol> {
    let mut name = String::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => name.push(chars.next()?),
            c if c.is_whitespace() => break,
            c => name.push(c),
        }
    }
    (!name.is_empty()).then(|| Symbol::new(&name))
}

fn parse_text(s: &str) -> Option<String> {
    if s.starts_with('"') {
        return match plist::parse_one(s).ok()?? {
            Item::Text(text) => Some(text),
            _ => None,
        };
    }
    let text: Option<String> = s
        .split_whitespace()
        .map(|word| parse_code(word).and_then(char::from_u32))
        .collect();
    text.filter(|t| !t.is_empty())
}

fn parse_value(ty: ValueType, s: &str) -> Option<CharValue> {
    Some(match ty {
        ValueType::String => CharValue::String(s.to_string()),
        ValueType::Integer => {
            let word = s.split_whitespace().next()?;
            CharValue::Integer(parse_integer(word)?)
        }
        ValueType::Text => CharValue::String(parse_text(s)?),
        ValueType::Symbol => match parse_symbol(s)? {
            Symbol::NIL => CharValue::Nil,
            sym => CharValue::Symbol(sym),
        },
        ValueType::Plist => CharValue::Plist(plist::parse_one(s).ok()??),
    })
}

/// Split a table line after its code range
///
/// Quoted characters may be spaces.
fn split_range(line: &str) -> (&str, &str) {
    let mut chars = line.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            chars.nth(1);
        } else if c.is_whitespace() {
            return line.split_at(i);
        }
    }
    (line, "")
}

/// Parse a character table
///
/// Lines not starting with a digit or `'` are comments. Any other line
/// must be `FROM[-TO] VALUE`; a malformed range or value fails the load.
pub(crate) fn load_char_table(value_type: Symbol, text: &str) -> Result<CharTable<CharValue>> {
    let ty = ValueType::from_symbol(value_type);
    let default = match ty {
        ValueType::Integer => CharValue::Integer(-1),
        _ => CharValue::Nil,
    };
    let mut table = CharTable::new(default);

    for (n, line) in text.lines().enumerate() {
        let line_no = n + 1;
        if !line.starts_with(|c: char| c.is_ascii_digit() || c == '\'') {
            continue;
        }

        let (range, rest) = split_range(line);
        let Some((from, to)) = parse_range(range) else {
            return Err(malformed(line_no, format!("invalid code range `{range}`")));
        };
        if from > to {
            return Err(malformed(line_no, format!("empty code range `{range}`")));
        }

        let rest = rest.trim();
        let Some(value) = parse_value(ty, rest) else {
            return Err(malformed(line_no, format!("invalid {value_type} value `{rest}`")));
        };
        table.set_range(from, to, value);
    }

    Ok(table)
}

fn parse_hex(s: &str) -> Option<u32> {
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    u32::from_str_radix(hex, 16).ok()
}

/// Parse a charset table
///
/// Lines are `0xCODE 0xCHAR` or `0xFROM-0xTO 0xCHAR`; others are skipped.
pub(crate) fn load_charset(name: Symbol, text: &str) -> Result<Arc<Charset>> {
    let mut runs = Vec::new();
    for line in text.lines() {
        let mut words = line.split_whitespace();
        let (Some(codes), Some(c)) = (words.next(), words.next()) else {
            continue;
        };
        let range = match codes.split_once('-') {
            Some((from, to)) => parse_hex(from).zip(parse_hex(to)),
            None => parse_hex(codes).map(|code| (code, code)),
        };
        let (Some((from, to)), Some(c)) = (range, parse_hex(c)) else {
            continue;
        };
        if from > to || to - from > 0x10FFFF {
            continue;
        }
        runs.push((from, to, c));
    }

    Charset::from_runs(name, &runs)
        .map(Arc::new)
        .ok_or_else(|| Error::Malformed {
            context: "charset table",
            line: 0,
            msg: format!("no valid mapping for charset {name}"),
        })
}
