//! Evaluating scripts, calling their functions and reporting the outcome.

use pretty_assertions::assert_eq;
use serde_json::json;

use super::{call, invoke, invoke_on, script, value, RecordingHost};
use crate::sandbox::ExceptionRecord;

#[test]
fn expression_result_and_counters() {
    let result = invoke(&script("1 + 2"));
    assert_eq!(result.result, json!(3));
    assert_eq!(result.exception, None);
    assert!(result.nodes_called > 0);
    assert!(result.cumsize > 0);
    assert!(result.gas_consumed > 0);
}

#[test]
fn last_statement_value_is_the_result() {
    assert_eq!(value("for i in range(10):\n    pass\ni\n"), json!(9));
    assert_eq!(value("x = {'a': [1, 2.5, None]}\nx\n"), json!({ "a": [1, 2.5, null] }));
    assert_eq!(value("x = 1\n"), json!(null));
}

#[test]
fn division_by_zero_is_wrapped() {
    let result = invoke(&script("x = 1\n1/0\n"));
    let exception = result.exception.unwrap();
    assert_eq!(exception.class, "DysRuntimeError");
    assert_eq!(exception.context, "ZeroDivisionError");
    assert_eq!(exception.msg, "ZeroDivisionError('division by zero')");
    assert_eq!(exception.lineno, 2);
    assert_eq!(exception.col_offset, 0);
    assert_eq!(exception.end_col_offset, 3);
}

#[test]
fn dangerous_builtins_escape_every_handler() {
    for code in [
        "try:\n    eval('1')\nexcept:\n    pass\n",
        "try:\n    open('/etc/passwd')\nexcept Exception:\n    pass\n",
    ] {
        let exception = invoke(&script(code)).exception.unwrap();
        assert_eq!(exception.class, "DysRuntimeError", "{code:?}");
        assert_eq!(exception.context, "DangerousValue", "{code:?}");
    }
}

#[test]
fn unsupported_syntax_runs_nothing() {
    let host = RecordingHost::new();
    let result = invoke_on(&host, &script("print('x')\nglobal y\n"));
    let exception = result.exception.unwrap();
    assert_eq!(exception.context, "NotImplementedError");
    assert_eq!(exception.lineno, 2);
    assert_eq!(result.nodes_called, 0);
    assert_eq!(result.stdout, "");
    // Only the opening settlement reached the host.
    assert_eq!(host.methods(), vec!["ConsumeGas"]);
}

#[test]
fn calls_a_function_with_json_arguments() {
    let code = "def f(a, b=2):\n    return a + b\n";
    assert_eq!(invoke(&call(code, "f", "[5]", "")).result, json!(7));
    assert_eq!(invoke(&call(code, "f", "[5]", r#"{"b": 10}"#)).result, json!(15));
    assert_eq!(invoke(&call(code, "f", "", r#"{"a": 1, "b": 1}"#)).result, json!(2));
}

#[test]
fn bridge_call_matches_a_direct_call() {
    let code = "def greet(name, punct='!'):\n    return {'msg': 'hi ' + name + punct, 'n': len(name)}\n";
    let bridged = invoke(&call(code, "greet", r#"["ada"]"#, r#"{"punct": "?"}"#));
    let mut direct = script(code);
    direct.message.extra_code = "greet('ada', punct='?')".to_string();
    assert_eq!(bridged.result, invoke(&direct).result);
    assert_eq!(bridged.result, json!({ "msg": "hi ada?", "n": 3 }));
}

#[test]
fn bridge_errors_have_no_position() {
    let code = "def f():\n    return 1\ndef _hidden():\n    return 2\nwsgi = f\nvalue = 3\n";
    let cases = [
        ("g", "[]", "function not defined: g"),
        ("_hidden", "[]", "function not public: _hidden"),
        ("value", "[]", "function not public: value"),
        ("f", "{}", "args must be a list"),
    ];
    for (function, args, msg) in cases {
        let result = invoke(&call(code, function, args, ""));
        assert_eq!(result.exception, Some(ExceptionRecord::unlocated("Exception", msg)));
    }
    let result = invoke(&call(code, "f", "[]", "[1]"));
    assert_eq!(result.exception.unwrap().msg, "kwargs must be a dict");
}

#[test]
fn all_list_overrides_the_default_exports() {
    let code = "__all__ = ['_inner']\ndef _inner():\n    return 'in'\ndef outer():\n    return 'out'\n";
    assert_eq!(invoke(&call(code, "_inner", "", "")).result, json!("in"));
    let result = invoke(&call(code, "outer", "", ""));
    assert_eq!(result.exception.unwrap().msg, "function not public: outer");
}

#[test]
fn malformed_arguments_report_a_decode_error() {
    let result = invoke(&call("def f():\n    pass\n", "f", "[1,", ""));
    let exception = result.exception.unwrap();
    assert_eq!(exception.class, "JSONDecodeError");
    assert!(exception.msg.starts_with("args: "), "{}", exception.msg);
}

#[test]
fn arguments_wider_than_int_are_rejected() {
    let code = "def f(n, m=0):\n    return n\n";
    let result = invoke(&call(code, "f", "[18446744073709551615]", ""));
    assert_eq!(
        result.exception,
        Some(ExceptionRecord::unlocated(
            "OverflowError",
            "int too large to convert: 18446744073709551615"
        ))
    );
    let result = invoke(&call(code, "f", "[1]", r#"{"m": 9223372036854775808}"#));
    assert_eq!(result.exception.unwrap().class, "OverflowError");
    assert_eq!(invoke(&call(code, "f", "[9223372036854775807]", "")).result, json!(i64::MAX));
}

#[test]
fn output_is_captured_and_truncated() {
    let result = invoke(&script("print('hi', 1)\nprint('x' * 20000)\n"));
    assert_eq!(result.stdout.chars().count(), 10_000);
    assert!(result.stdout.ends_with("xxx\n"));

    let result = invoke(&script("print('a', 'b', sep='-')\n"));
    assert_eq!(result.stdout, "a-b\n");
}

#[test]
fn output_survives_an_exception() {
    let result = invoke(&script("print('before')\nraise ValueError('bad')\n"));
    assert_eq!(result.stdout, "before\n");
    let exception = result.exception.unwrap();
    assert_eq!(exception.context, "ValueError");
    assert_eq!(exception.msg, "ValueError('bad')");
}

#[test]
fn unserializable_results_fall_back_to_repr() {
    assert_eq!(value("def f():\n    pass\n(1, {2, 3}, f)\n")[0], json!(1));
    let result = value("class A:\n    pass\nA()\n");
    assert!(result.as_str().unwrap().contains("A object"), "{result}");
}

#[test]
fn circular_results_report_an_error() {
    let result = invoke(&script("x = []\nx.append(x)\nx\n"));
    assert_eq!(result.result, json!(null));
    let exception = result.exception.unwrap();
    assert!(exception.msg.starts_with("Error in return value: "), "{}", exception.msg);
}

#[test]
fn identical_inputs_give_identical_results() {
    let code = "import random\nprint(random.random())\nvalues = [random.randint(0, 100) for _ in range(5)]\nvalues\n";
    let first = invoke(&script(code));
    let second = invoke(&script(code));
    assert_eq!(first, second);
    assert_eq!(first.render().unwrap(), second.render().unwrap());
}

#[test]
fn test_functions_return_coverage() {
    let code = "def test_add():\n    x = 1 + 1\n    return x\n";
    let result = invoke(&call(code, "test_add", "", ""));
    assert_eq!(result.exception, None);
    let rows = result.result.as_array().unwrap().clone();
    assert!(!rows.is_empty());
    let ret = rows
        .iter()
        .find(|row| row[0][4] == json!("Return"))
        .unwrap();
    assert_eq!(ret[0], json!([3, 4, 3, 12, "Return"]));
    assert_eq!(ret[1][0], json!(1));
    // Rows are ordered by start position, outer nodes first.
    assert_eq!(rows[0][0][4], json!("FunctionDef"));
}

#[test]
fn rendered_result_is_compact_and_sorted() {
    let result = invoke(&script("{'é': 1.5, 'a': True}"));
    let text = result.render().unwrap();
    assert!(text.starts_with(r#"{"cumsize":"#), "{text}");
    assert!(text.contains(r#""exception":null"#), "{text}");
    assert!(text.contains(r#""result":{"a":true,"é":1.5}"#), "{text}");
}
