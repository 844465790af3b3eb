// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Nested-list text format
//!
//! Manifests, fontset definitions and override tables are all written in a
//! small parenthesised list syntax:
//!
//! ```none
//! ;; comment
//! (fontset default nil nil "fontset.def")
//! (latin ((nil "iso8859-1")) (nil ((misc fixed iso8859-1))))
//! ```
//!
//! Atoms are integers (`12`, `-3`, `0x41`, `#x41`, `?A`) or symbols.
//! Double-quoted strings support the escapes `\"`, `\\`, `\n`, `\t` and `\e`.
//! In symbols a backslash escapes the following character, so `a\ b` is the
//! one symbol `"a b"`. The symbol `nil` is [`Symbol::NIL`] and `##` is the
//! empty symbol. A symbol whose name would read as an integer is written
//! with its first character escaped: `\12`.

mod lexer;

use crate::Symbol;
use lexer::Token;
use logos::Logos;
use std::fmt;
use thiserror::Error;

/// An element of a nested list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Symbol(Symbol),
    Integer(i64),
    Text(String),
    List(Vec<Item>),
}

impl Item {
    /// Get as a symbol
    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Item::Symbol(sym) => Some(*sym),
            _ => None,
        }
    }

    /// Get as an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Item::Integer(x) => Some(*x),
            _ => None,
        }
    }

    /// Get as a string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Item::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as a list
    pub fn as_list(&self) -> Option<&[Item]> {
        match self {
            Item::List(list) => Some(list),
            _ => None,
        }
    }
}

/// Failure to parse nested-list text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {msg}")]
pub struct ParseError {
    /// One-based line number
    pub line: u32,
    pub msg: &'static str,
}

impl ParseError {
    /// Convert to a library error, naming the kind of data being parsed
    pub fn into_error(self, context: &'static str) -> crate::Error {
        crate::Error::Malformed {
            context,
            line: self.line,
            msg: self.msg.to_string(),
        }
    }
}

fn line_of(src: &str, offset: usize) -> u32 {
    let newlines = src.as_bytes()[..offset].iter().filter(|b| **b == b'\n');
    crate::conv::to_u32(newlines.count()) + 1
}

/// Parse all top-level items of `src`
pub fn parse(src: &str) -> Result<Vec<Item>, ParseError> {
    parse_items(src, usize::MAX)
}

/// Parse the first item of `src`, ignoring anything after it
///
/// Returns `Ok(None)` if `src` contains no items. Text following the first
/// item is not examined, so need not be valid.
pub fn parse_one(src: &str) -> Result<Option<Item>, ParseError> {
    Ok(parse_items(src, 1)?.into_iter().next())
}

fn parse_items(src: &str, limit: usize) -> Result<Vec<Item>, ParseError> {
    let mut stack: Vec<Vec<Item>> = vec![Vec::new()];
    let mut lexer = Token::lexer(src);
    let error = |offset, msg| ParseError {
        line: line_of(src, offset),
        msg,
    };

    while let Some(token) = lexer.next() {
        let item = match token {
            Token::Open => {
                stack.push(Vec::new());
                continue;
            }
            Token::Close => {
                if stack.len() < 2 {
                    return Err(error(lexer.span().start, "unbalanced ')'"));
                }
                let list = stack.pop().unwrap_or_default();
                Item::List(list)
            }
            Token::Text => {
                let slice = lexer.slice();
                Item::Text(unescape_text(&slice[1..slice.len() - 1]))
            }
            Token::Empty => Item::Symbol(Symbol::new("")),
            Token::Atom => parse_atom(lexer.slice()),
            Token::Error => return Err(error(lexer.span().start, "invalid token")),
        };
        if let Some(top) = stack.last_mut() {
            top.push(item);
        }
        if stack.len() == 1 && stack[0].len() >= limit {
            break;
        }
    }

    if stack.len() != 1 {
        return Err(error(src.len(), "unterminated list"));
    }
    Ok(stack.pop().unwrap_or_default())
}

fn parse_atom(s: &str) -> Item {
    if let Some(rest) = s.strip_prefix('?') {
        let rest = unescape_symbol(rest);
        let mut chars = rest.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Item::Integer(i64::from(u32::from(c)));
        }
    }
    if let Some(x) = parse_integer(s) {
        return Item::Integer(x);
    }
    Item::Symbol(Symbol::new(&unescape_symbol(s)))
}

/// Parse a decimal, `0x` or `#x` hexadecimal integer
pub(crate) fn parse_integer(s: &str) -> Option<i64> {
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .or_else(|| digits.strip_prefix("#x"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.starts_with(|c: char| c.is_ascii_digit()) {
        digits.parse::<i64>().ok()?
    } else {
        return None;
    };
    Some(if neg { -value } else { value })
}

fn unescape_symbol(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('e') => out.push('\u{1b}'),
            Some(other) => out.push(other),
            None => (),
        }
    }
    out
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Symbol(sym) => {
                let name = sym.as_str();
                if name.is_empty() {
                    return write!(f, "##");
                }
                // Atoms starting with these may read as integers or `##`
                if name.starts_with(|c: char| c.is_ascii_digit() || "-?#".contains(c)) {
                    write!(f, "\\")?;
                }
                for c in name.chars() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';' | '\\') {
                        write!(f, "\\")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            Item::Integer(x) => write!(f, "{x}"),
            Item::Text(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\u{1b}' => write!(f, "\\e")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Item::List(list) => {
                write!(f, "(")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Serialize items, one top-level item per line
pub fn write_items(items: &[Item]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&item.to_string());
        out.push('\n');
    }
    out
}
