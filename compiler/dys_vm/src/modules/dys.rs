//! The `dys` module: what a script can ask of the chain.
//!
//! Every function here closes over the invocation's [`HostContext`]. Host
//! failures surface to the script as plain `Exception`s carrying the
//! node's error text, so scripts can catch a rejected message.

use std::rc::Rc;

use dys_eval::errors::{exception, type_error, value_error};
use dys_eval::{
    native, CallArgs, Dict, EvalError, EvalResult, ExcType, Interpreter, ModuleBuilder,
    ModuleValue, NativeFn, Session, Value,
};
use dys_ir::Name;

use crate::context::Invocation;
use crate::convert::{encode, json_to_value, value_to_json, EncodeOptions, Strictness};
use crate::gas::SharedMeter;
use crate::host::HostError;

/// State shared by the host functions of one invocation.
pub struct HostContext {
    pub meter: SharedMeter,
    pub invocation: Rc<Invocation>,
}

type HostFn = for<'i> fn(&HostContext, &mut Interpreter<'i>, CallArgs) -> EvalResult;

fn bind(ctx: &Rc<HostContext>, f: HostFn) -> NativeFn {
    let ctx = Rc::clone(ctx);
    native(move |interp, args| f(&ctx, interp, args))
}

fn host_failure(err: &HostError) -> EvalError {
    tracing::warn!(%err, "host request failed");
    exception(ExcType::Exception, err.to_string())
}

#[allow(clippy::cast_possible_wrap, reason = "counters stay far below i64::MAX")]
fn counter(n: u64) -> Value {
    Value::Int(n as i64)
}

fn optional_str(s: Option<&String>) -> Value {
    s.map_or(Value::None, |s| Value::str(s))
}

fn get_gas_consumed(ctx: &HostContext, _: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("get_gas_consumed", 0, 0)?;
    Ok(counter(ctx.meter.gas_consumed()))
}

fn get_gas_limit(ctx: &HostContext, _: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("get_gas_limit", 0, 0)?;
    Ok(counter(ctx.meter.state().borrow().gas_limit))
}

fn get_nodes_called(ctx: &HostContext, _: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("get_nodes_called", 0, 0)?;
    Ok(counter(ctx.meter.state().borrow().nodes_called))
}

fn get_cumulative_size(ctx: &HostContext, _: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("get_cumulative_size", 0, 0)?;
    Ok(counter(ctx.meter.state().borrow().cumulative_size))
}

fn get_script_address(ctx: &HostContext, _: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("get_script_address", 0, 0)?;
    Ok(optional_str(ctx.invocation.script.address.as_ref()))
}

fn get_executor_address(ctx: &HostContext, _: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("get_executor_address", 0, 0)?;
    Ok(optional_str(ctx.invocation.message.executor_address.as_ref()))
}

fn get_block_info(ctx: &HostContext, _: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("get_block_info", 0, 0)?;
    let info = &ctx.invocation.block_info;
    let mut dict = Dict::new();
    dict.insert_str("height", json_to_value(&info.height)?);
    dict.insert_str("hash", json_to_value(&info.hash)?);
    dict.insert_str("time", json_to_value(&info.time)?);
    dict.insert_str("app_hash", json_to_value(&info.app_hash)?);
    dict.insert_str("chain_id", json_to_value(&info.chain_id)?);
    Ok(Value::dict(dict))
}

fn get_attached_messages(ctx: &HostContext, _: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("get_attached_messages", 0, 0)?;
    let messages = &ctx.invocation.message.attached_messages;
    Ok(Value::list(messages.iter().map(json_to_value).collect::<EvalResult<_>>()?))
}

fn get_attached_msg_results(ctx: &HostContext, _: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("get_attached_msg_results", 0, 0)?;
    let results = &ctx.invocation.attached_msg_results;
    Ok(Value::list(results.iter().map(json_to_value).collect::<EvalResult<_>>()?))
}

fn emit_event(ctx: &HostContext, _: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.positional_arity("emit_event", 0, 2)?;
    let key = args.take(0, "key");
    let value = args.take(1, "value");
    args.no_extra_keywords("emit_event")?;
    let Some(Value::Str(value)) = value else {
        return Err(value_error("emit_event value must be a string"));
    };
    let Some(Value::Str(key)) = key else {
        return Err(value_error("emit_event key must be a string"));
    };
    let result = ctx
        .meter
        .host()
        .emit_event(&key, &value)
        .map_err(|err| host_failure(&err))?;
    json_to_value(&result)
}

/// JSON text of a script value, in the default `json.dumps` layout.
fn params_json(params: &Value) -> EvalResult<String> {
    let json = value_to_json(params, Strictness::Strict)?;
    encode(&json, &EncodeOptions::default())
}

fn msg(ctx: &HostContext, _: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.positional_arity("_msg", 1, 1)?;
    let params = args.take(0, "params").unwrap_or(Value::None);
    args.no_extra_keywords("_msg")?;
    let result = ctx
        .meter
        .host()
        .msg(&params_json(&params)?)
        .map_err(|err| host_failure(&err))?;
    json_to_value(&result)
}

fn query(ctx: &HostContext, _: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.positional_arity("_query", 1, 2)?;
    let params = args.take(0, "params").unwrap_or(Value::None);
    let height = match args.take(1, "query_height") {
        None | Some(Value::None) => None,
        Some(Value::Int(h)) => Some(h),
        Some(other) => {
            return Err(type_error(format!(
                "query_height must be an int or None, not {}",
                other.type_name()
            )))
        }
    };
    args.no_extra_keywords("_query")?;
    let result = ctx
        .meter
        .host()
        .query(&params_json(&params)?, height)
        .map_err(|err| host_failure(&err))?;
    json_to_value(&result)
}

fn chain(_: &HostContext, _: &mut Interpreter<'_>, _: CallArgs) -> EvalResult {
    Err(exception(
        ExcType::DeprecationError,
        "The _chain function is deprecated. Please use _msg() for transactions and _query() for queries instead. \
         Example: replace _chain('Msg', json_msg=json.dumps(params)) with _msg(params)",
    ))
}

fn list_functions(_: &HostContext, interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("list_functions", 0, 0)?;
    let names = interp.session().capabilities().list_functions();
    Ok(Value::list(names.iter().map(|n| Value::str(n)).collect()))
}

fn list_modules(_: &HostContext, interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("list_modules", 0, 0)?;
    let session = interp.session();
    let mut modules = Dict::new();
    for module in session.modules() {
        let Value::Module(module) = module else {
            continue;
        };
        let mut members = Dict::new();
        for (name, member) in &module.members {
            let doc = member.doc().map_or(Value::None, |d| Value::str(&d));
            members.insert_str(&session.interner().lookup(*name), doc);
        }
        modules.insert_str(&module.name, Value::dict(members));
    }
    Ok(Value::dict(modules))
}

/// A positive cap passed as `max_node_calls=` or `max_scope_size=`.
fn cap(value: Option<Value>, name: &str) -> EvalResult<Option<u64>> {
    match value {
        None | Some(Value::None) => Ok(None),
        Some(Value::Int(n)) => u64::try_from(n)
            .map(Some)
            .map_err(|_| value_error(format!("{name} must not be negative"))),
        Some(other) => Err(type_error(format!(
            "{name} must be an int or None, not {}",
            other.type_name()
        ))),
    }
}

/// `dys_eval(code, scope=None, max_node_calls=None, max_scope_size=None,
/// track_func=None)`: evaluate `code` in a fresh globals layer seeded from
/// `scope`, under caps no looser than the running ones.
fn dys_eval(ctx: &HostContext, interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.positional_arity("dys_eval", 1, 5)?;
    let code = args.take(0, "code");
    let scope = args.take(1, "scope");
    let max_node_calls = cap(args.take(2, "max_node_calls"), "max_node_calls")?;
    let max_scope_size = cap(args.take(3, "max_scope_size"), "max_scope_size")?;
    let track_func = args.take(4, "track_func").filter(|f| !f.is_none());
    args.no_extra_keywords("dys_eval")?;

    let Some(Value::Str(code)) = code else {
        return Err(type_error("dys_eval() code must be a str"));
    };
    let mut globals: Vec<(Name, Value)> = Vec::new();
    match scope {
        None | Some(Value::None) => {}
        Some(Value::Dict(dict)) => {
            for (key, value) in dict.borrow().iter() {
                let Value::Str(key) = key else {
                    return Err(type_error("dys_eval() scope keys must be strings"));
                };
                globals.push((interp.session().interner().intern(key), value.clone()));
            }
        }
        Some(other) => {
            return Err(type_error(format!(
                "dys_eval() scope must be a dict, not {}",
                other.type_name()
            )))
        }
    }
    let mut limits = *interp.limits();
    if let Some(n) = max_node_calls {
        limits.max_node_calls = n;
    }
    if let Some(n) = max_scope_size {
        limits.max_scope_size = usize::try_from(n).unwrap_or(usize::MAX);
    }
    let value = interp.eval_nested(&code, globals, limits, track_func)?;
    ctx.meter.settle()?;
    Ok(value)
}

const FUNCTIONS: &[(&str, &str, HostFn)] = &[
    ("get_gas_consumed", "The total amount of gas consumed so far.", get_gas_consumed),
    ("get_gas_limit", "The maximum amount of gas that can be used in this query or transaction", get_gas_limit),
    ("get_script_address", "Returns the address of this current script.", get_script_address),
    ("get_executor_address", "Returns the address of the caller of this script.", get_executor_address),
    (
        "get_block_info",
        "Returns a dictionary with the height, hash, time, app_hash and chain_id of the current block header.",
        get_block_info,
    ),
    ("get_nodes_called", "The number of AST nodes evaluated in this query or transaction", get_nodes_called),
    (
        "get_cumulative_size",
        "The cumulative size of memory used for each node called in this query or script",
        get_cumulative_size,
    ),
    ("emit_event", "Emits an event to the blockchain", emit_event),
    ("get_attached_messages", "Returns the messages attached to this call.", get_attached_messages),
    ("get_attached_msg_results", "Returns the results of the attached messages.", get_attached_msg_results),
    ("dys_eval", "Evaluate a string of code with its own scope and tighter limits.", dys_eval),
    ("list_functions", "Returns the sorted names of the whitelisted functions.", list_functions),
    ("list_modules", "Returns a dictionary of available modules and the docstrings of their members.", list_modules),
    ("_msg", "Send a message to the chain; params are JSON encoded.", msg),
    ("_query", "Query the chain, optionally at query_height; params are JSON encoded.", query),
    ("_chain", "DEPRECATED: use _msg() and _query() instead.", chain),
];

pub fn module(session: &Session, ctx: &Rc<HostContext>) -> ModuleValue {
    let mut builder = ModuleBuilder::new("dys", Some("Access to the chain from a running script."));
    for &(name, doc, func) in FUNCTIONS {
        builder = builder.function(name, Some(doc), bind(ctx, func));
    }
    builder.build(session.interner())
}
