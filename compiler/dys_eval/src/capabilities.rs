//! Capability whitelist.
//!
//! Every callable a script can reach has a typed [`CapabilityId`]. The
//! session's [`CapabilitySet`] is seeded from the builtin catalog, grows
//! when host modules are installed and when scripts define functions or
//! classes, and never shrinks. Calls and attribute reads are checked here.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use tracing::debug;

use dys_ir::{ExprId, ProgramId, StmtId};

use crate::errors::{denied, forbidden, EvalError};
use crate::value::{BuiltinType, ExcType};

/// A Rust-implemented function: `owner.name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId {
    pub owner: Arc<str>,
    pub name: Arc<str>,
}

impl NativeId {
    pub fn new(owner: &str, name: &str) -> Self {
        NativeId {
            owner: Arc::from(owner),
            name: Arc::from(name),
        }
    }

    pub fn builtin(name: &str) -> Self {
        NativeId::new("builtins", name)
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// The node a script callable was defined by.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefNode {
    Stmt(StmtId),
    Expr(ExprId),
}

/// Definition site of a script function, lambda or class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId {
    pub program: ProgramId,
    pub node: DefNode,
    pub name: Arc<str>,
}

/// A whitelistable callable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityId {
    Native(NativeId),
    Type(BuiltinType),
    Exception(ExcType),
    Method {
        owner: BuiltinType,
        name: &'static str,
    },
    Script(DefId),
}

impl CapabilityId {
    /// Qualified name: `builtins.len`, `str.join`, `script.f`.
    pub fn qualified_name(&self) -> String {
        match self {
            CapabilityId::Native(id) => id.to_string(),
            CapabilityId::Type(ty) => format!("builtins.{}", ty.name()),
            CapabilityId::Exception(ty) => format!("builtins.{}", ty.name()),
            CapabilityId::Method { owner, name } => format!("{}.{name}", owner.name()),
            CapabilityId::Script(def) => format!("script.{}", def.name),
        }
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Session-wide, append-only whitelist.
///
/// Cloning shares the set.
#[derive(Clone, Default)]
pub struct CapabilitySet(Arc<RwLock<FxHashSet<CapabilityId>>>);

impl CapabilitySet {
    pub fn new() -> Self {
        CapabilitySet::default()
    }

    /// A set holding the builtin catalog.
    pub fn seeded() -> Self {
        let set = CapabilitySet::new();
        set.extend(crate::builtins::catalog());
        set
    }

    pub fn insert(&self, id: CapabilityId) {
        if self.0.write().insert(id.clone()) {
            debug!(capability = %id, "registered capability");
        }
    }

    pub fn extend(&self, ids: impl IntoIterator<Item = CapabilityId>) {
        self.0.write().extend(ids);
    }

    pub fn contains(&self, id: &CapabilityId) -> bool {
        self.0.read().contains(id)
    }

    /// Fail with `CapabilityDenied` unless `id` is whitelisted.
    pub fn check(&self, id: &CapabilityId) -> Result<(), EvalError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(denied(id.qualified_name()))
        }
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Sorted, deduplicated qualified names.
    pub fn list_functions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.read().iter().map(CapabilityId::qualified_name).collect();
        names.sort();
        names.dedup();
        names
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilitySet({} entries)", self.len())
    }
}

/// Members no script may touch, by owner type name.
const DENIED_MEMBERS: &[(&str, &str)] = &[("str", "format"), ("str", "format_map"), ("type", "mro")];

/// Check an attribute read or write before it happens.
///
/// `owner` is the type name of the object (or `type` for classes).
pub fn check_attribute(owner: &str, attr: &str) -> Result<(), EvalError> {
    if attr.starts_with('_') {
        return Err(forbidden(format!(
            "Sorry, access to this attribute is not available. ({attr})"
        )));
    }
    if DENIED_MEMBERS.contains(&(owner, attr)) {
        return Err(forbidden(format!(
            "Sorry, this method is not available. ({owner}.{attr})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
