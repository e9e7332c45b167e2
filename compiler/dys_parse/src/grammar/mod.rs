//! Grammar productions, one file per area.
//!
//! - `stmt`: statements and blocks
//! - `expr`: the operator precedence ladder
//! - `atom`: atoms, displays, comprehensions, calls and subscripts
//! - `params`: `def` and `lambda` parameter lists
//! - `strings`: literal concatenation and f-strings
//! - `target`: assignment and deletion target checks

mod atom;
mod expr;
mod params;
mod stmt;
mod strings;
mod target;
