use winnow::combinator::{alt, cut_err, opt, separated};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::literal;

use crate::ast::{CmpOp, Expr};
use crate::parse_utils::{ident, kw, number_literal, quoted_string, ws_skip};

/// Parse a complete rule expression. Trailing input (other than whitespace)
/// is an error.
pub fn parse(expression: &str) -> anyhow::Result<Expr> {
    let mut input = expression;
    ws_skip
        .parse_next(&mut input)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let expr = or_expr
        .parse_next(&mut input)
        .map_err(|e| anyhow::anyhow!("invalid expression: {e}"))?;
    ws_skip
        .parse_next(&mut input)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    if !input.is_empty() {
        anyhow::bail!("unexpected trailing input: {input:?}");
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Precedence levels (lowest to highest)
// ---------------------------------------------------------------------------

/// `or_expr = and_expr { "||" and_expr }`
fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut left = and_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        if opt(literal("||")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let right = cut_err(and_expr).parse_next(input)?;
            left = Expr::Or(Box::new(left), Box::new(right));
        } else {
            break;
        }
    }
    Ok(left)
}

/// `and_expr = not_expr { "&&" not_expr }`
fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut left = not_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        if opt(literal("&&")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let right = cut_err(not_expr).parse_next(input)?;
            left = Expr::And(Box::new(left), Box::new(right));
        } else {
            break;
        }
    }
    Ok(left)
}

/// `not_expr = "!" not_expr | cmp_expr`
fn not_expr(input: &mut &str) -> ModalResult<Expr> {
    ws_skip.parse_next(input)?;
    // Careful not to swallow the first `!` of `!=` (cannot occur here, as
    // a comparison needs a left operand, but stay defensive about `!!x`).
    if opt(literal("!")).parse_next(input)?.is_some() {
        let inner = cut_err(not_expr).parse_next(input)?;
        return Ok(Expr::Not(Box::new(inner)));
    }
    cmp_expr.parse_next(input)
}

/// `cmp_expr = primary [cmp_op primary | "in" list | "not" "in" list]`
fn cmp_expr(input: &mut &str) -> ModalResult<Expr> {
    let left = primary.parse_next(input)?;
    ws_skip.parse_next(input)?;

    if opt((kw("not"), ws_skip, kw("in"))).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let list = in_list.parse_next(input)?;
        return Ok(Expr::InList {
            expr: Box::new(left),
            list,
            negated: true,
        });
    }

    if opt(kw("in")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let list = in_list.parse_next(input)?;
        return Ok(Expr::InList {
            expr: Box::new(left),
            list,
            negated: false,
        });
    }

    if let Some(op) = opt(cmp_op).parse_next(input)? {
        ws_skip.parse_next(input)?;
        let right = cut_err(primary).parse_next(input)?;
        return Ok(Expr::Cmp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        });
    }

    Ok(left)
}

fn cmp_op(input: &mut &str) -> ModalResult<CmpOp> {
    alt((
        literal("==").value(CmpOp::Eq),
        literal("!=").value(CmpOp::Ne),
        literal("<=").value(CmpOp::Le),
        literal(">=").value(CmpOp::Ge),
        literal("<").value(CmpOp::Lt),
        literal(">").value(CmpOp::Gt),
    ))
    .parse_next(input)
}

fn in_list(input: &mut &str) -> ModalResult<Vec<Expr>> {
    cut_err(literal("(")).parse_next(input)?;
    ws_skip.parse_next(input)?;
    let list: Vec<Expr> =
        separated(1.., (ws_skip, primary).map(|(_, e)| e), (ws_skip, literal(","))).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(")")).parse_next(input)?;
    Ok(list)
}

// ---------------------------------------------------------------------------
// Primary
// ---------------------------------------------------------------------------

fn primary(input: &mut &str) -> ModalResult<Expr> {
    ws_skip.parse_next(input)?;
    alt((
        number_literal.map(Expr::Number),
        quoted_string.map(Expr::StringLit),
        kw("true").map(|_| Expr::Bool(true)),
        kw("false").map(|_| Expr::Bool(false)),
        paren_expr,
        ident_primary,
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

fn paren_expr(input: &mut &str) -> ModalResult<Expr> {
    literal("(").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let inner = cut_err(or_expr).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(")")).parse_next(input)?;
    Ok(inner)
}

/// Bare identifier: either the `contains(...)` builtin or a tag reference.
fn ident_primary(input: &mut &str) -> ModalResult<Expr> {
    let name = ident.parse_next(input)?;

    if name == "contains" {
        ws_skip.parse_next(input)?;
        if opt(literal("(")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let haystack = cut_err(primary).parse_next(input)?;
            ws_skip.parse_next(input)?;
            cut_err(literal(",")).parse_next(input)?;
            ws_skip.parse_next(input)?;
            let needle = cut_err(primary).parse_next(input)?;
            ws_skip.parse_next(input)?;
            cut_err(literal(")")).parse_next(input)?;
            return Ok(Expr::Contains {
                haystack: Box::new(haystack),
                needle: Box::new(needle),
            });
        }
    }

    Ok(Expr::Tag(name.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_comparison() {
        let expr = parse(r#"Modality == "CT""#).unwrap();
        assert_eq!(
            expr,
            Expr::Cmp {
                op: CmpOp::Eq,
                left: Box::new(Expr::Tag("Modality".into())),
                right: Box::new(Expr::StringLit("CT".into())),
            }
        );
    }

    #[test]
    fn parse_precedence_and_binds_tighter_than_or() {
        let expr = parse("a || b && c").unwrap();
        match expr {
            Expr::Or(left, right) => {
                assert_eq!(*left, Expr::Tag("a".into()));
                assert!(matches!(*right, Expr::And(_, _)));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn parse_not_in() {
        let expr = parse(r#"StationName not in ("CT01", "CT02")"#).unwrap();
        match expr {
            Expr::InList { negated, list, .. } => {
                assert!(negated);
                assert_eq!(list.len(), 2);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn parse_bang_does_not_eat_bang_eq() {
        let expr = parse(r#"Modality != "MR""#).unwrap();
        assert!(matches!(expr, Expr::Cmp { op: CmpOp::Ne, .. }));
    }

    #[test]
    fn parse_contains_builtin() {
        let expr = parse(r#"contains(StudyDescription, "trauma")"#).unwrap();
        assert!(matches!(expr, Expr::Contains { .. }));
    }

    #[test]
    fn contains_without_call_is_a_tag() {
        // A tag may legitimately be named "contains".
        let expr = parse("contains").unwrap();
        assert_eq!(expr, Expr::Tag("contains".into()));
    }

    #[test]
    fn parse_nested_parens() {
        let expr = parse(r#"((Modality == "CT") || (Modality == "MR")) && !disabled"#).unwrap();
        assert!(matches!(expr, Expr::And(_, _)));
    }

    #[test]
    fn reject_empty_and_garbage() {
        assert!(parse("").is_err());
        assert!(parse("==").is_err());
        assert!(parse(r#"Modality == "CT" extra"#).is_err());
        assert!(parse(r#"Modality in ()"#).is_err());
    }
}
