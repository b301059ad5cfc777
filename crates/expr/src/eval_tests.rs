// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for expression evaluation

use super::*;
use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;

/// Context backed by a flat map of dotted paths.
struct MapContext {
    vars: HashMap<String, Value>,
    hit_count: u32,
    thread_id: u32,
}

impl MapContext {
    fn new(pairs: &[(&str, Value)]) -> Self {
        Self {
            vars: pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            hit_count: 1,
            thread_id: 1,
        }
    }
}

impl ResolveContext for MapContext {
    fn hit_count(&self) -> u32 {
        self.hit_count
    }

    fn thread_id(&self) -> u32 {
        self.thread_id
    }

    fn resolve_path(&self, segments: &[String]) -> Result<Value, EvalError> {
        let path = segments.join(".");
        self.vars
            .get(&path)
            .cloned()
            .ok_or(EvalError::UnknownVariable(path))
    }
}

fn eval(input: &str, ctx: &MapContext) -> Value {
    let expr = Parser::parse(input).unwrap();
    evaluate(&expr, ctx).unwrap()
}

#[test]
fn loop_condition_matches_on_exact_value() {
    let ctx = MapContext::new(&[("i", Value::Int(5))]);
    assert_eq!(eval("i == 5", &ctx), Value::Bool(true));
    assert_eq!(eval("i == 4", &ctx), Value::Bool(false));
    assert_eq!(eval("i >= 5 && i < 10", &ctx), Value::Bool(true));
}

#[test]
fn string_comparison() {
    let ctx = MapContext::new(&[("name", Value::Str("World".into()))]);
    assert_eq!(eval("name == \"World\"", &ctx), Value::Bool(true));
    assert_eq!(eval("name != \"world\"", &ctx), Value::Bool(true));
}

#[test]
fn dotted_member_access_delegates_to_context() {
    let ctx = MapContext::new(&[("user.HomeAddress.City", Value::Str("Warsaw".into()))]);
    assert_eq!(eval("user.HomeAddress.City == \"Warsaw\"", &ctx), Value::Bool(true));
}

#[test]
fn hit_count_and_thread_id_intrinsics() {
    let mut ctx = MapContext::new(&[]);
    ctx.hit_count = 6;
    ctx.thread_id = 42;
    assert_eq!(eval("hitCount == 6", &ctx), Value::Bool(true));
    assert_eq!(eval("threadId == 42", &ctx), Value::Bool(true));
}

#[test]
fn bare_hit_count_always_resolves_to_the_intrinsic() {
    let mut ctx = MapContext::new(&[("hitCount", Value::Int(999))]);
    ctx.hit_count = 7;
    assert_eq!(eval("hitCount", &ctx), Value::Int(7));
}

#[test]
fn null_checks() {
    let ctx = MapContext::new(&[("user", Value::Null)]);
    assert_eq!(eval("user == null", &ctx), Value::Bool(true));
    assert_eq!(eval("user != null", &ctx), Value::Bool(false));
}

#[test]
fn short_circuit_skips_rhs_resolution() {
    // `missing` is not resolvable; && must not evaluate it.
    let ctx = MapContext::new(&[("ready", Value::Bool(false))]);
    assert_eq!(eval("ready && missing == 1", &ctx), Value::Bool(false));
}

#[test]
fn unknown_variable_is_an_error() {
    let ctx = MapContext::new(&[]);
    let expr = Parser::parse("nope == 1").unwrap();
    assert!(matches!(evaluate(&expr, &ctx), Err(EvalError::UnknownVariable(_))));
}

#[test]
fn condition_wrapper_reports_syntax_errors() {
    let ctx = MapContext::new(&[]);
    let result = evaluate_condition("i ==", &ctx);
    assert!(!result.success);
    // Failed conditions pause with the message attached.
    assert!(result.should_break);
    assert!(result.message.as_deref().is_some_and(|m| m.contains("syntax")));
}

#[test]
fn condition_wrapper_rejects_non_boolean_result() {
    let ctx = MapContext::new(&[("i", Value::Int(3))]);
    let result = evaluate_condition("i", &ctx);
    assert!(!result.success);
    assert!(result.message.as_deref().is_some_and(|m| m.contains("boolean")));
}

#[test]
fn condition_wrapper_happy_path() {
    let ctx = MapContext::new(&[("i", Value::Int(5))]);
    assert_eq!(evaluate_condition("i == 5", &ctx), ConditionResult::matched(true));
    assert_eq!(evaluate_condition("i == 9", &ctx), ConditionResult::matched(false));
}

#[test]
fn negative_literal_compares() {
    let ctx = MapContext::new(&[("delta", Value::Int(-3))]);
    assert_eq!(eval("delta == -3", &ctx), Value::Bool(true));
    assert_eq!(eval("delta < -1", &ctx), Value::Bool(true));
}

#[test]
fn validate_is_syntax_only() {
    assert!(validate("completely.unknown.path == 1").is_ok());
    assert!(validate("==").is_err());
}
