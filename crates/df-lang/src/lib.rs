//! Safe-subset boolean expression language for routing rules.
//!
//! A rule expression is evaluated against the tag mapping of a received
//! series and yields a truth value, e.g.
//!
//! ```text
//! Modality == "CT" && SeriesDescription != "localizer"
//! StationName in ("CT01", "CT02") || contains(StudyDescription, "trauma")
//! ```
//!
//! The language has no assignments, no function definitions and no access to
//! anything but the tag mapping passed in — evaluation cannot have side
//! effects. Unknown tags evaluate to [`Value::Null`], which compares unequal
//! to everything and is falsy.

pub mod ast;
pub mod eval;
mod parse_utils;
mod parser;

pub use ast::{CmpOp, Expr, Value};
pub use eval::{Tags, eval};
pub use parser::parse;

/// Parse and evaluate `expression` against `tags`, reducing the result to a
/// boolean via the language's truthiness rules.
///
/// Any parse or evaluation failure is returned as an error; callers treat it
/// as "this rule is invalid" and skip the rule.
pub fn evaluate(expression: &str, tags: &Tags) -> anyhow::Result<bool> {
    let expr = parse(expression)?;
    Ok(eval(&expr, tags)?.truthy())
}
