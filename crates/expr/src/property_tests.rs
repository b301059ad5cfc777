// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the expression language.
//!
//! Parsing arbitrary input must never panic, and well-formed comparisons of
//! integer literals must evaluate to the model answer.

use crate::error::EvalError;
use crate::eval::{evaluate, ResolveContext};
use crate::parser::Parser;
use crate::value::Value;
use proptest::prelude::*;

struct NoVars;

impl ResolveContext for NoVars {
    fn hit_count(&self) -> u32 {
        0
    }

    fn thread_id(&self) -> u32 {
        0
    }

    fn resolve_path(&self, segments: &[String]) -> Result<Value, EvalError> {
        Err(EvalError::UnknownVariable(segments.join(".")))
    }
}

proptest! {
    #[test]
    fn parser_never_panics(input in ".{0,64}") {
        let _ = Parser::parse(&input);
    }

    #[test]
    fn integer_comparisons_match_the_model(a in -1000i64..1000, b in -1000i64..1000) {
        for (op, expected) in [
            ("==", a == b),
            ("!=", a != b),
            ("<", a < b),
            ("<=", a <= b),
            (">", a > b),
            (">=", a >= b),
        ] {
            let source = format!("{a} {op} {b}");
            let expr = Parser::parse(&source).expect("literal comparison parses");
            let value = evaluate(&expr, &NoVars).expect("literal comparison evaluates");
            prop_assert_eq!(value, Value::Bool(expected), "source: {}", source);
        }
    }

    #[test]
    fn identifier_paths_round_trip(segs in prop::collection::vec("[a-zA-Z_][a-zA-Z0-9_]{0,8}", 1..5)) {
        // Filter out reserved words that lex as keywords.
        prop_assume!(segs.iter().all(|s| !matches!(s.as_str(), "true" | "false" | "null")));
        let source = segs.join(".");
        let expr = Parser::parse(&source).expect("path parses");
        prop_assert_eq!(expr.as_path(), Some(&segs[..]));
    }
}
