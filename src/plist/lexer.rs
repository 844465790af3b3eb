// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Tokens of the nested-list text format

use logos::Logos;

#[derive(Copy, Clone, Debug, Logos, PartialEq, Eq)]
pub enum Token {
    #[token("(")]
    Open,
    #[token(")")]
    Close,

    /// A double-quoted string, possibly with backslash escapes
    #[regex(r#""([^"\\]|\\.)*""#)]
    Text,

    /// The empty symbol
    #[token("##")]
    Empty,

    /// Integer or symbol, told apart by the parser
    #[regex(r#"([^ \t\r\n\f()";\\]|\\.)+"#)]
    Atom,

    #[error]
    #[regex(r";[^\n]*", logos::skip)]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Error,
}
