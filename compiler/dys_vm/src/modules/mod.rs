//! Importable library modules.
//!
//! Each submodule builds one [`ModuleValue`]; [`install`] registers the
//! whole set in a session, which also whitelists their functions.

use std::rc::Rc;

use chrono::NaiveDateTime;
use dys_eval::{ModuleValue, Session};

pub mod datetime;
pub mod dys;
pub mod hashlib;
pub mod html;
pub mod json;
pub mod math;
pub mod random;
pub mod string;
pub mod typing;
pub mod urllib;

pub use dys::HostContext;
pub use random::{seeded, SharedRng};

/// The modules that need no host: everything but `dys`. `now` is the
/// frozen clock `datetime` reads.
pub fn library(session: &Session, rng: &SharedRng, now: NaiveDateTime) -> Vec<ModuleValue> {
    vec![
        datetime::module(session, now),
        hashlib::module(session),
        json::module(session),
        math::module(session),
        random::module(session, rng),
        string::module(session),
        html::module(session),
        typing::module(session),
        urllib::module(session),
    ]
}

/// Register the library and the `dys` module bound to `host`.
pub fn install(session: &Session, rng: &SharedRng, host: &Rc<HostContext>) {
    let now = datetime::block_time(&host.invocation.block_info.time);
    for module in library(session, rng, now) {
        session.register_module(module);
    }
    session.register_module(dys::module(session, host));
}
