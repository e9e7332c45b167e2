//! `typing`: annotation markers.
//!
//! The markers only exist so annotated scripts load; subscripting one
//! returns it unchanged and calling one fails.

use dys_eval::errors::type_error;
use dys_eval::{native, ModuleBuilder, ModuleValue, Session};

const MARKERS: &[(&str, &str)] = &[
    ("Any", "Special type indicating an unconstrained type."),
    ("Callable", "Callable type; Callable[[int], str] is a function of (int) -> str."),
    ("Dict", "A generic version of dict."),
    ("List", "A generic version of list."),
    ("Optional", "Optional type. Optional[X] is equivalent to Union[X, None]."),
];

pub fn module(session: &Session) -> ModuleValue {
    let mut builder = ModuleBuilder::new("typing", Some("Support for type hints."));
    for &(name, doc) in MARKERS {
        let func = native(move |_, _| Err(type_error(format!("Cannot instantiate typing.{name}"))));
        builder = builder.function(name, Some(doc), func);
    }
    builder.build(session.interner())
}
