//! String interning for identifiers.
//!
//! Identifiers, attribute names and keyword names are interned once per
//! session so scope layers can key on a 4-byte `Name`. Interned strings are
//! reference counted, not leaked: a session's interner is dropped with it.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Interned string identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Index into the interner's string table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

#[derive(Default)]
struct InternTable {
    map: FxHashMap<Arc<str>, u32>,
    strings: Vec<Arc<str>>,
}

/// String interner safe for concurrent access.
///
/// Reads take the shared lock; only the first interning of a string takes
/// the exclusive one.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create a new interner with the empty string at `Name::EMPTY`.
    pub fn new() -> Self {
        let interner = StringInterner {
            table: RwLock::new(InternTable::default()),
        };
        interner.intern("");
        interner
    }

    /// Intern a string, returning its Name.
    pub fn intern(&self, s: &str) -> Name {
        if let Some(&index) = self.table.read().map.get(s) {
            return Name(index);
        }

        let mut table = self.table.write();
        // Double-check after acquiring write lock
        if let Some(&index) = table.map.get(s) {
            return Name(index);
        }
        let index = u32::try_from(table.strings.len()).unwrap_or(u32::MAX);
        let shared: Arc<str> = Arc::from(s);
        table.strings.push(Arc::clone(&shared));
        table.map.insert(shared, index);
        Name(index)
    }

    /// Look up the string for a Name.
    ///
    /// Returns the empty string for names this interner never produced.
    pub fn lookup(&self, name: Name) -> Arc<str> {
        self.table
            .read()
            .strings
            .get(name.index())
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Check whether a name's text starts with `prefix`.
    pub fn starts_with(&self, name: Name, prefix: &str) -> bool {
        self.table
            .read()
            .strings
            .get(name.index())
            .is_some_and(|s| s.starts_with(prefix))
    }

    /// Find an already-interned string without interning it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.table.read().map.get(s).copied().map(Name)
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Always false: the empty string is pre-interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, thread-safe handle to a `StringInterner`.
#[derive(Clone, Default)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a new shared interner.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests;
