//! String interning.
//!
//! Identifiers, keywords and string-literal text appear repeatedly through a
//! source file; interning gives every occurrence of the same text a single,
//! cheaply comparable handle instead of a freshly allocated `String`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

/// A handle to an interned string. Two symbols compare equal iff the
/// strings they were interned from compare equal; comparison is a single
/// integer compare rather than a string compare.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

struct Interner {
    strings: Vec<&'static str>,
    lookup: FxHashMap<&'static str, u32>,
}

impl Interner {
    fn new() -> Self {
        Interner { strings: Vec::new(), lookup: FxHashMap::default() }
    }

    fn intern(&mut self, text: &str) -> u32 {
        if let Some(&id) = self.lookup.get(text) {
            return id;
        }
        let leaked: &'static str = Box::leak(text.to_string().into_boxed_str());
        let id = self.strings.len() as u32;
        self.strings.push(leaked);
        self.lookup.insert(leaked, id);
        id
    }

    fn resolve(&self, id: u32) -> &'static str {
        self.strings[id as usize]
    }
}

fn table() -> &'static RwLock<Interner> {
    static TABLE: OnceLock<RwLock<Interner>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(Interner::new()))
}

impl Symbol {
    /// Intern `text`, returning a handle shared by every prior and future
    /// interning of the same text.
    pub fn intern(text: &str) -> Self {
        Symbol(table().write().intern(text))
    }

    /// The original string this symbol was interned from.
    pub fn as_str(self) -> &'static str {
        table().read().resolve(self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_interns_to_the_same_symbol() {
        let a = Symbol::intern("hello");
        let b = Symbol::intern("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn different_text_interns_to_different_symbols() {
        let a = Symbol::intern("distinct_a");
        let b = Symbol::intern("distinct_b");
        assert_ne!(a, b);
    }

    #[test]
    fn resolves_back_to_original_text() {
        let s = Symbol::intern("printf");
        assert_eq!(s.as_str(), "printf");
    }
}
