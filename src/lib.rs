// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! KAS fontset resolution
//!
//! This library finds data and fonts for multilingual text:
//!
//! -   The [`Database`] indexes tagged resources (character property
//!     tables, charsets, plain data lists) held in files under a list of
//!     directories, loading and caching them on demand. Files may be written
//!     back under an advisory lock.
//! -   The [`fonts`] module describes fonts as [`fonts::FontSpec`]s and scores
//!     them against requests. Fonts are offered by [`fonts::FontDriver`]s.
//! -   The [`fontset`] module groups font specs by script, language and
//!     charset. A [`Frame`] realizes fontsets against a request and finds,
//!     for a run of characters, the best font able to display it.
//!
//! All state is owned by a [`fonts::FontLibrary`] (shared data) and one
//! [`Frame`] per output device. Neither is global.

mod env;
pub use env::*;

mod error;
pub use error::{Error, ErrorKind, Result};

mod symbol;
pub use symbol::Symbol;

pub(crate) mod conv;
pub use conv::{dpem_from_size, DPU};

pub mod chartab;
pub mod charset;
pub mod database;
pub mod plist;

pub mod fonts;
pub mod fontset;

mod frame;
pub use frame::{FontStatus, Frame, RealizedFont, RealizedFontId};

pub use database::Database;
pub use fonts::FontLibrary;
pub use fontset::Glyph;
