// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AST for the condition-expression language.

use crate::span::Span;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal { value: Value, span: Span },
    /// Dotted identifier path: `user.HomeAddress.City` → `["user",
    /// "HomeAddress", "City"]`. Single identifiers are a path of one.
    Path { segments: Vec<String>, span: Span },
    Unary { op: UnaryOp, operand: Box<Expr>, span: Span },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Path { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. } => *span,
        }
    }

    /// The dotted path when this expression is a bare member access.
    pub fn as_path(&self) -> Option<&[String]> {
        match self {
            Expr::Path { segments, .. } => Some(segments),
            _ => None,
        }
    }

    /// All identifier paths referenced anywhere in the expression, in
    /// evaluation order. Used by callers that resolve variables up front.
    pub fn collect_paths(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        self.collect_paths_into(&mut out);
        out
    }

    fn collect_paths_into(&self, out: &mut Vec<Vec<String>>) {
        match self {
            Expr::Literal { .. } => {}
            Expr::Path { segments, .. } => {
                if !out.contains(segments) {
                    out.push(segments.clone());
                }
            }
            Expr::Unary { operand, .. } => operand.collect_paths_into(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_paths_into(out);
                rhs.collect_paths_into(out);
            }
        }
    }
}
