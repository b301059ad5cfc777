// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expression evaluation against a variable-resolving context.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{EvalError, ParseError};
use crate::parser::Parser;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Resolves identifier paths against the paused frame.
///
/// The engine supplies an implementation backed by its `resolve_member`
/// policy (field → backing field → property getter funceval → base chain).
pub trait ResolveContext {
    /// Current hit count of the breakpoint being evaluated (for the
    /// `hitCount` intrinsic).
    fn hit_count(&self) -> u32;

    /// Id of the thread that hit (for the `threadId` intrinsic).
    fn thread_id(&self) -> u32;

    /// Resolve a dotted path, e.g. `["user", "HomeAddress", "City"]`.
    fn resolve_path(&self, segments: &[String]) -> Result<Value, EvalError>;
}

/// Outcome of evaluating a breakpoint condition.
///
/// Runtime failures are reported here rather than as errors: the engine
/// pauses with the message attached instead of silently resuming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    pub success: bool,
    /// Whether the hit should pause; only meaningful when `success`.
    pub should_break: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConditionResult {
    pub fn matched(should_break: bool) -> Self {
        Self { success: true, should_break, message: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, should_break: true, message: Some(message.into()) }
    }
}

/// Parse and syntactically validate a condition without evaluating it.
pub fn validate(input: &str) -> Result<(), ParseError> {
    Parser::parse(input).map(|_| ())
}

/// Evaluate a full expression to a value.
pub fn evaluate(expr: &Expr, ctx: &dyn ResolveContext) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal { value, .. } => Ok(value.clone()),
        Expr::Path { segments, .. } => resolve(segments, ctx),
        Expr::Unary { op, operand, .. } => {
            let value = evaluate(operand, ctx)?;
            match op {
                UnaryOp::Not => match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    other => Err(EvalError::TypeMismatch(format!(
                        "'!' needs a bool, got {}",
                        other.type_name()
                    ))),
                },
                UnaryOp::Neg => match value {
                    Value::Int(n) => Ok(Value::Int(-n)),
                    Value::Float(n) => Ok(Value::Float(-n)),
                    other => Err(EvalError::TypeMismatch(format!(
                        "'-' needs a number, got {}",
                        other.type_name()
                    ))),
                },
            }
        }
        Expr::Binary { op, lhs, rhs, .. } => evaluate_binary(*op, lhs, rhs, ctx),
    }
}

/// Parse and evaluate a condition expression to a pause decision.
pub fn evaluate_condition(input: &str, ctx: &dyn ResolveContext) -> ConditionResult {
    let expr = match Parser::parse(input) {
        Ok(expr) => expr,
        Err(e) => return ConditionResult::failed(format!("condition syntax error: {e}")),
    };
    match evaluate(&expr, ctx) {
        Ok(Value::Bool(should_break)) => ConditionResult::matched(should_break),
        Ok(other) => ConditionResult::failed(format!(
            "condition did not produce a boolean (got {})",
            other.type_name()
        )),
        Err(e) => ConditionResult::failed(e.to_string()),
    }
}

fn evaluate_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    ctx: &dyn ResolveContext,
) -> Result<Value, EvalError> {
    // Short-circuit the logical operators before touching the rhs.
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        let left = expect_bool(evaluate(lhs, ctx)?, op)?;
        return match (op, left) {
            (BinaryOp::And, false) => Ok(Value::Bool(false)),
            (BinaryOp::Or, true) => Ok(Value::Bool(true)),
            _ => Ok(Value::Bool(expect_bool(evaluate(rhs, ctx)?, op)?)),
        };
    }

    let left = evaluate(lhs, ctx)?;
    let right = evaluate(rhs, ctx)?;
    let result = match op {
        BinaryOp::Eq => left.loose_eq(&right),
        BinaryOp::NotEq => !left.loose_eq(&right),
        BinaryOp::Lt => left.compare(&right)?.is_lt(),
        BinaryOp::Le => left.compare(&right)?.is_le(),
        BinaryOp::Gt => left.compare(&right)?.is_gt(),
        BinaryOp::Ge => left.compare(&right)?.is_ge(),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    };
    Ok(Value::Bool(result))
}

fn expect_bool(value: Value, op: BinaryOp) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "'{}' needs bool operands, got {}",
            op.symbol(),
            value.type_name()
        ))
    })
}

fn resolve(segments: &[String], ctx: &dyn ResolveContext) -> Result<Value, EvalError> {
    if segments.len() == 1 {
        match segments[0].as_str() {
            "hitCount" => return Ok(Value::from(ctx.hit_count())),
            "threadId" => return Ok(Value::from(ctx.thread_id())),
            _ => {}
        }
    }
    ctx.resolve_path(segments)
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
