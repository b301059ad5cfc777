// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logpoint message templates.
//!
//! `"i is {i}, name={user.Name}"` renders each `{…}` segment through the
//! expression evaluator. `{{` and `}}` escape literal braces. A segment
//! that fails to evaluate renders as `{<error: …>}` so one bad expression
//! does not suppress the whole message.

use crate::eval::{evaluate, ResolveContext};
use crate::parser::Parser;

/// Render a logpoint template against the paused frame.
pub fn render(template: &str, ctx: &dyn ResolveContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        match ch {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut end = None;
                for (pos, c) in chars.by_ref() {
                    if c == '}' {
                        end = Some(pos);
                        break;
                    }
                }
                match end {
                    Some(end) => out.push_str(&render_segment(&template[start + 1..end], ctx)),
                    // Unterminated segment; keep the raw text.
                    None => {
                        out.push_str(&template[start..]);
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// All identifier paths referenced by a template's `{…}` segments.
/// Callers that resolve variables up front use this to know what to fetch.
pub fn template_paths(template: &str) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    for segment in segments(template) {
        if let Ok(expr) = Parser::parse(&segment) {
            for path in expr.collect_paths() {
                if !out.contains(&path) {
                    out.push(path);
                }
            }
        }
    }
    out
}

/// Expression sources of the template's substitution segments.
fn segments(template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = template.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        match ch {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
            }
            '{' => {
                for (pos, c) in chars.by_ref() {
                    if c == '}' {
                        out.push(template[start + 1..pos].to_string());
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    out
}

fn render_segment(source: &str, ctx: &dyn ResolveContext) -> String {
    let expr = match Parser::parse(source) {
        Ok(expr) => expr,
        Err(e) => return format!("{{<error: {e}>}}"),
    };
    match evaluate(&expr, ctx) {
        Ok(value) => value.to_string(),
        Err(e) => format!("{{<error: {e}>}}"),
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
