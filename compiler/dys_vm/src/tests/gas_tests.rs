//! Gas settlement against the host.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;

use dys_eval::{ResourceKind, ResourceLimits, ResourceState};

use super::{call, invoke, invoke_on, script, RecordingHost};
use crate::gas::GasMeter;
use crate::host::HostRpc;
use crate::sandbox::{Sandbox, SandboxConfig};

fn meter(host: &Rc<RecordingHost>, unconsumed: u64) -> GasMeter {
    let state = Rc::new(std::cell::RefCell::new(ResourceState {
        unconsumed_size: unconsumed,
        ..ResourceState::default()
    }));
    GasMeter::new(state, Rc::clone(host) as Rc<dyn HostRpc>, 2, 100)
}

#[test]
fn settlement_charges_the_multiplied_size() {
    let host = RecordingHost::new();
    let meter = meter(&host, 21);
    meter.settle().unwrap();
    assert_eq!(host.params("ConsumeGas"), vec![json!({ "amount": 42 })]);
    let state = meter.state().borrow().clone();
    assert_eq!(state.unconsumed_size, 0);
    assert_eq!(state.gas_consumed, 42);
}

#[test]
fn nothing_to_charge_reads_the_limit() {
    let host = RecordingHost::with_limit(500);
    let meter = meter(&host, 0);
    meter.settle().unwrap();
    assert_eq!(host.methods(), vec!["GasLimit"]);
    assert_eq!(meter.state().borrow().gas_limit, 500);
}

#[test]
fn exceeding_the_limit_aborts_for_good() {
    let host = RecordingHost::with_limit(10);
    let meter = meter(&host, 6);
    let err = meter.settle().unwrap_err();
    assert_eq!(err.resource_kind(), Some(ResourceKind::OutOfGas));
    assert!(err.message().starts_with("Out of Gas: {'unconsumed_size': 0, 'gas_consumed': 12, 'gas_limit': 10"));
    assert!(!err.is_catchable());
    assert!(meter.is_aborted());

    meter.settle().unwrap_err();
    assert_eq!(host.methods().len(), 1);
}

#[test]
fn host_failure_falls_back_to_the_limit() {
    let host = RecordingHost::with_limit(1_000);
    host.fail("ConsumeGas");
    let meter = meter(&host, 5);
    meter.settle().unwrap();
    assert_eq!(host.methods(), vec!["ConsumeGas", "GasLimit"]);
    assert_eq!(meter.state().borrow().gas_limit, 1_000);
}

#[test]
fn unreachable_host_aborts() {
    let host = RecordingHost::new();
    host.fail("ConsumeGas");
    host.fail("GasLimit");
    let err = meter(&host, 5).settle().unwrap_err();
    assert_eq!(err.message(), "Gas settlement failed: GasLimit rejected");
}

#[test]
fn invocation_settles_at_start_and_end() {
    let host = RecordingHost::new();
    let result = invoke_on(&host, &call("def f():\n    return 1\n", "f", "", ""));
    assert_eq!(result.exception, None);
    let amounts: Vec<u64> = host
        .params("ConsumeGas")
        .iter()
        .map(|p| p["amount"].as_u64().unwrap())
        .collect();
    // Opening charge, the module boundary, the function call, the close.
    assert_eq!(amounts[0], 1);
    assert!(amounts.len() >= 2);
    assert_eq!(result.gas_consumed, amounts.iter().sum::<u64>());
    assert_eq!(result.gas_consumed, result.cumsize + 1);
}

#[test]
fn low_threshold_settles_while_running() {
    let host = RecordingHost::new();
    let sandbox = Sandbox::new(SandboxConfig {
        settle_threshold: 10,
        ..SandboxConfig::default()
    });
    let code = "x = 0\nfor i in range(50):\n    x = x + i\nx\n";
    let result = sandbox.invoke(&script(code), Rc::clone(&host) as Rc<dyn HostRpc>);
    assert_eq!(result.result, json!(1225));
    assert!(host.params("ConsumeGas").len() > 10);
}

#[test]
fn running_out_of_gas_stops_the_script() {
    let host = RecordingHost::with_limit(50);
    let sandbox = Sandbox::new(SandboxConfig {
        settle_threshold: 10,
        ..SandboxConfig::default()
    });
    let code = "x = ''\nwhile True:\n    try:\n        x = x + 'a'\n    except:\n        pass\n";
    let result = sandbox.invoke(&script(code), Rc::clone(&host) as Rc<dyn HostRpc>);
    let exception = result.exception.unwrap();
    assert_eq!(exception.context, "MemoryError");
    assert!(exception.msg.contains("Out of Gas"), "{}", exception.msg);
    assert!(result.gas_consumed > 50);
}

#[test]
fn node_cap_makes_no_further_host_calls() {
    let host = RecordingHost::new();
    let sandbox = Sandbox::new(SandboxConfig {
        limits: ResourceLimits::default().with_max_node_calls(100),
        ..SandboxConfig::default()
    });
    let result = sandbox.invoke(&script("while True:\n    pass\n"), Rc::clone(&host) as Rc<dyn HostRpc>);
    let exception = result.exception.unwrap();
    assert_eq!(exception.context, "MemoryError");
    assert_eq!(exception.msg, "MemoryError('This program has too many evaluations')");
    assert_eq!(host.methods(), vec!["ConsumeGas"]);
}

#[test]
fn gas_counter_is_visible_to_the_script() {
    let host = RecordingHost::with_limit(1_000_000);
    let code = "from dys import get_gas_consumed, get_gas_limit\n(get_gas_consumed() > 1, get_gas_limit())\n";
    let result = invoke_on(&host, &script(code));
    assert_eq!(result.result, json!([true, 1_000_000]));
}

#[test]
fn first_abort_is_reported_at_its_node() {
    let host = RecordingHost::new();
    let sandbox = Sandbox::new(SandboxConfig {
        limits: ResourceLimits::default().with_max_scope_size(1_000),
        settle_threshold: 10,
        ..SandboxConfig::default()
    });
    let code = "x = 'a' * 400\ny = 1\nz = x + x + x\nz\n";
    let result = sandbox.invoke(&script(code), Rc::clone(&host) as Rc<dyn HostRpc>);
    let exception = result.exception.unwrap();
    assert_eq!(exception.class, "DysRuntimeError");
    assert_eq!(exception.context, "MemoryError");
    assert_eq!(exception.msg, "MemoryError('Scope has used too much memory')");
    assert_eq!(exception.lineno, 3);
    // Only the settlements made while running reached the host.
    assert!(host.methods().iter().all(|m| m == "ConsumeGas"));
}

#[test]
fn node_cap_in_nested_eval_keeps_its_kind() {
    let code = "from dys import dys_eval\ndys_eval('while True:\\n    pass\\n', max_node_calls=20)\n";
    let exception = invoke(&script(code)).exception.unwrap();
    assert_eq!(exception.class, "DysRuntimeError");
    assert_eq!(exception.msg, "MemoryError('This program has too many evaluations')");
    assert!(exception.lineno > 0);
}
