//! `hashlib`: `md5`, `sha1`, `sha256`, `sha512` and `new`.
//!
//! Each constructor returns a hash object with `update`, `digest`,
//! `hexdigest` and `copy`, plus `name`, `digest_size` and `block_size`.

use std::cell::RefCell;
use std::rc::Rc;

use md5::Md5;
use sha1::Sha1;
use sha2::digest::DynDigest;
use sha2::{Sha256, Sha512};

use dys_eval::errors::{type_error, value_error};
use dys_eval::{native, CallArgs, EvalResult, Interpreter, ModuleBuilder, ModuleValue, Session, Value};

/// A supported algorithm: its name, block size and a fresh hasher.
#[derive(Copy, Clone)]
struct Algorithm {
    name: &'static str,
    block_size: i64,
    fresh: fn() -> Box<dyn DynDigest>,
}

fn fresh<D: DynDigest + Default + 'static>() -> Box<dyn DynDigest> {
    Box::new(D::default())
}

const ALGORITHMS: [Algorithm; 4] = [
    Algorithm {
        name: "md5",
        block_size: 64,
        fresh: fresh::<Md5>,
    },
    Algorithm {
        name: "sha1",
        block_size: 64,
        fresh: fresh::<Sha1>,
    },
    Algorithm {
        name: "sha256",
        block_size: 64,
        fresh: fresh::<Sha256>,
    },
    Algorithm {
        name: "sha512",
        block_size: 128,
        fresh: fresh::<Sha512>,
    },
];

type SharedDigest = Rc<RefCell<Box<dyn DynDigest>>>;

fn data_arg(value: &Value) -> EvalResult<Rc<[u8]>> {
    match value {
        Value::Bytes(b) => Ok(Rc::clone(b)),
        Value::Str(_) => Err(type_error("Strings must be encoded before hashing")),
        other => Err(type_error(format!(
            "object supporting the buffer API required, not '{}'",
            other.type_name()
        ))),
    }
}

fn finish(state: &SharedDigest) -> Box<[u8]> {
    state.borrow().box_clone().finalize()
}

/// A hash object over `state`, whitelisted in the running session.
fn hash_object(interp: &Interpreter<'_>, algorithm: Algorithm, state: SharedDigest) -> Value {
    let update = {
        let state = Rc::clone(&state);
        native(move |_, args| {
            args.arity("update", 1, 1)?;
            state.borrow_mut().update(&data_arg(&args.arg(0))?);
            Ok(Value::None)
        })
    };
    let digest = {
        let state = Rc::clone(&state);
        native(move |_, args| {
            args.arity("digest", 0, 0)?;
            Ok(Value::bytes(&finish(&state)))
        })
    };
    let hexdigest = {
        let state = Rc::clone(&state);
        native(move |_, args| {
            args.arity("hexdigest", 0, 0)?;
            Ok(Value::string(hex::encode(finish(&state))))
        })
    };
    let copy = {
        let state = Rc::clone(&state);
        native(move |interp, args| {
            args.arity("copy", 0, 0)?;
            let twin = Rc::new(RefCell::new(state.borrow().box_clone()));
            Ok(hash_object(interp, algorithm, twin))
        })
    };
    let digest_size = state.borrow().output_size();
    let repr = format!("<{} HASH object>", algorithm.name);
    let object = ModuleBuilder::object(&format!("hashlib.{}", algorithm.name), repr.as_str(), repr.as_str())
        .constant("name", Value::str(algorithm.name))
        .constant("digest_size", Value::Int(i64::try_from(digest_size).unwrap_or(i64::MAX)))
        .constant("block_size", Value::Int(algorithm.block_size))
        .function("update", Some("Update this hash object's state with the provided bytes."), update)
        .function("digest", Some("Return the digest value as a bytes object."), digest)
        .function("hexdigest", Some("Return the digest value as a string of hexadecimal digits."), hexdigest)
        .function("copy", Some("Return a copy of the hash object."), copy)
        .build(interp.session().interner());
    interp.session().adopt(object)
}

/// `algorithm(data=b'', *, usedforsecurity=True)`, once the algorithm is known.
fn construct(interp: &Interpreter<'_>, algorithm: Algorithm, mut args: CallArgs, data_at: usize) -> EvalResult {
    let data = args.take(data_at, "data").or_else(|| args.take_keyword("string"));
    args.take_keyword("usedforsecurity");
    args.no_extra_keywords(algorithm.name)?;
    args.positional_arity(algorithm.name, 0, data_at + 1)?;
    let mut hasher = (algorithm.fresh)();
    if let Some(data) = data {
        hasher.update(&data_arg(&data)?);
    }
    Ok(hash_object(interp, algorithm, Rc::new(RefCell::new(hasher))))
}

fn constructor(algorithm: Algorithm) -> dys_eval::NativeFn {
    native(move |interp, args| construct(interp, algorithm, args, 0))
}

/// `new(name, data=b'')`.
fn new(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    let name = match args.get(0) {
        Some(Value::Str(name)) => name.to_lowercase(),
        Some(other) => {
            return Err(type_error(format!(
                "new() argument 'name' must be str, not {}",
                other.type_name()
            )))
        }
        None => return Err(type_error("new() missing required argument 'name' (pos 1)")),
    };
    let algorithm = ALGORITHMS
        .iter()
        .find(|algorithm| algorithm.name == name)
        .copied()
        .ok_or_else(|| value_error(format!("unsupported hash type {name}")))?;
    construct(interp, algorithm, args, 1)
}

pub fn module(session: &Session) -> ModuleValue {
    let names: Vec<Value> = ALGORITHMS.iter().map(|a| Value::str(a.name)).collect();
    let mut builder = ModuleBuilder::new("hashlib", Some("Secure hash and message digest algorithms."))
        .function("new", Some("Return a new hash object using the named algorithm."), native(new))
        .constant("algorithms_guaranteed", Value::tuple(names.clone()))
        .constant("algorithms_available", Value::tuple(names));
    for algorithm in ALGORITHMS {
        builder = builder.function(
            algorithm.name,
            Some("Return a new hash object, optionally initialized with data."),
            constructor(algorithm),
        );
    }
    builder.build(session.interner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hex_of(name: &str, data: &[u8]) -> String {
        let algorithm = ALGORITHMS
            .iter()
            .find(|a| a.name == name)
            .unwrap_or_else(|| panic!("unknown algorithm {name}"));
        let mut hasher = (algorithm.fresh)();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    #[test]
    fn known_digests() {
        assert_eq!(hex_of("md5", b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(hex_of("sha1", b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(
            hex_of("sha256", b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hex_of("sha512", b"").len(), 128);
    }

    #[test]
    fn strings_must_be_encoded() {
        let err = data_arg(&Value::str("x")).err().map(|e| e.message());
        assert_eq!(err.as_deref(), Some("Strings must be encoded before hashing"));
    }
}
