// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Interned symbols
//!
//! A [`Symbol`] is a small `Copy` token standing for a string. Symbols are
//! used as keys everywhere: resource tags, font property values, script,
//! language and charset names. The interner is process-wide and never
//! shrinks.

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, RwLock};

/// An interned string
///
/// Two symbols compare equal exactly when their names are equal.
/// The name `"nil"` always interns to [`Symbol::NIL`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// The null symbol, `nil`
    pub const NIL: Symbol = Symbol(0);
    /// The true symbol, `t`
    pub const T: Symbol = Symbol(1);

    /// Intern `name`
    pub fn new(name: &str) -> Symbol {
        if let Some(sym) = read_interner().map.get(name) {
            return *sym;
        }
        let mut interner = INTERNER.write().unwrap_or_else(|e| e.into_inner());
        interner.intern(name)
    }

    /// True if this is [`Symbol::NIL`]
    #[inline]
    pub fn is_nil(self) -> bool {
        self == Symbol::NIL
    }

    /// `None` for [`Symbol::NIL`], otherwise `Some(self)`
    #[inline]
    pub fn non_nil(self) -> Option<Symbol> {
        (!self.is_nil()).then_some(self)
    }

    /// Get the symbol's name
    pub fn as_str(self) -> &'static str {
        let interner = read_interner();
        interner.names[crate::conv::to_usize(self.0)]
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Symbol::NIL
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

struct Interner {
    // Names are leaked: symbols live until process exit.
    names: Vec<&'static str>,
    map: HashMap<&'static str, Symbol>,
}

impl Interner {
    fn intern(&mut self, name: &str) -> Symbol {
        if let Some(sym) = self.map.get(name) {
            return *sym;
        }
        let sym = Symbol(crate::conv::to_u32(self.names.len()));
        let name: &'static str = Box::leak(name.to_string().into_boxed_str());
        self.names.push(name);
        self.map.insert(name, sym);
        sym
    }
}

static INTERNER: LazyLock<RwLock<Interner>> = LazyLock::new(|| {
    let mut interner = Interner {
        names: Vec::new(),
        map: HashMap::new(),
    };
    interner.intern("nil");
    interner.intern("t");
    RwLock::new(interner)
});

fn read_interner() -> std::sync::RwLockReadGuard<'static, Interner> {
    INTERNER.read().unwrap_or_else(|e| e.into_inner())
}
