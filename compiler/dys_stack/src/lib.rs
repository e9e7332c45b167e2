//! Stack safety for the recursive passes (parser, validator, evaluator).
//!
//! Script nesting is attacker controlled, so every recursive walk wraps its
//! step in [`ensure_sufficient_stack`] and the parser additionally bounds
//! syntactic nesting with a [`NestingBudget`].
//!
//! On wasm the stack cannot be grown; the wrapper is a passthrough there.

/// Grow when less than this much stack is left.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f`, first switching to a fresh stack segment if the current one is
/// nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Remaining stack in bytes, when the platform can tell.
#[cfg(not(target_arch = "wasm32"))]
pub fn remaining_stack() -> Option<usize> {
    stacker::remaining_stack()
}

#[cfg(target_arch = "wasm32")]
pub fn remaining_stack() -> Option<usize> {
    None
}

/// Counter for syntactic nesting depth.
///
/// `enter` fails once `limit` levels are open; each successful `enter`
/// must be paired with `exit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NestingBudget {
    depth: u32,
    limit: u32,
}

/// Returned by [`NestingBudget::enter`] when the limit is hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TooDeep {
    pub limit: u32,
}

impl NestingBudget {
    pub const fn new(limit: u32) -> Self {
        NestingBudget { depth: 0, limit }
    }

    #[inline]
    pub fn enter(&mut self) -> Result<(), TooDeep> {
        if self.depth >= self.limit {
            return Err(TooDeep { limit: self.limit });
        }
        self.depth += 1;
        Ok(())
    }

    #[inline]
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub const fn depth(&self) -> u32 {
        self.depth
    }
}

#[cfg(test)]
mod tests;
