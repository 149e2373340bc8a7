//! The side-channel expression evaluator behind watches, breakpoint
//! conditions and log-point interpolation. Deliberately not the VM: a
//! recursive-descent grammar over the expression subset, sharing the
//! VM's coercion rules but never calling handlers.

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::lingo::datum::{Datum, datum_bool};
use crate::lingo::ops::{
    add_datums, datum_equals, datum_greater_than, datum_less_than, divide_datums, mod_datums,
    multiply_datums, negate_datum, subtract_datums,
};

use super::methods::get_obj_prop;
use super::{MoviePlayer, ScriptError};

#[derive(Parser)]
#[grammar = "watch.pest"]
struct WatchParser;

#[derive(Debug, PartialEq, Clone)]
pub enum WatchExpr {
    IntLiteral(i32),
    FloatLiteral(f64),
    StringLiteral(String),
    SymbolLiteral(String),
    BoolLiteral(bool),
    Me,
    Identifier(String),
    Prop(Box<WatchExpr>, String),
    Neg(Box<WatchExpr>),
    Not(Box<WatchExpr>),
    Add(Box<WatchExpr>, Box<WatchExpr>),
    Sub(Box<WatchExpr>, Box<WatchExpr>),
    Mul(Box<WatchExpr>, Box<WatchExpr>),
    Div(Box<WatchExpr>, Box<WatchExpr>),
    Mod(Box<WatchExpr>, Box<WatchExpr>),
    Eq(Box<WatchExpr>, Box<WatchExpr>),
    Ne(Box<WatchExpr>, Box<WatchExpr>),
    Lt(Box<WatchExpr>, Box<WatchExpr>),
    Gt(Box<WatchExpr>, Box<WatchExpr>),
    Le(Box<WatchExpr>, Box<WatchExpr>),
    Ge(Box<WatchExpr>, Box<WatchExpr>),
    And(Box<WatchExpr>, Box<WatchExpr>),
    Or(Box<WatchExpr>, Box<WatchExpr>),
}

fn pratt() -> PrattParser<Rule> {
    // lowest binds loosest
    PrattParser::new()
        .op(Op::infix(Rule::op_or, Assoc::Left))
        .op(Op::infix(Rule::op_and, Assoc::Left))
        .op(Op::infix(Rule::op_eq, Assoc::Left)
            | Op::infix(Rule::op_ne, Assoc::Left)
            | Op::infix(Rule::op_lt, Assoc::Left)
            | Op::infix(Rule::op_gt, Assoc::Left)
            | Op::infix(Rule::op_le, Assoc::Left)
            | Op::infix(Rule::op_ge, Assoc::Left))
        .op(Op::infix(Rule::op_add, Assoc::Left) | Op::infix(Rule::op_sub, Assoc::Left))
        .op(Op::infix(Rule::op_mul, Assoc::Left)
            | Op::infix(Rule::op_div, Assoc::Left)
            | Op::infix(Rule::op_mod, Assoc::Left))
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::not_op))
        .op(Op::postfix(Rule::prop_access))
}

pub fn parse_expression(text: &str) -> Result<WatchExpr, ScriptError> {
    let mut pairs = WatchParser::parse(Rule::eval_expr, text)
        .map_err(|err| ScriptError::new(format!("Parse error: {}", err)))?;
    let expr_pair = pairs
        .next()
        .and_then(|pair| pair.into_inner().next())
        .ok_or_else(|| ScriptError::new("Empty expression".to_string()))?;
    build_expr(expr_pair.into_inner())
}

fn build_expr(pairs: Pairs<Rule>) -> Result<WatchExpr, ScriptError> {
    pratt()
        .map_primary(build_primary)
        .map_prefix(|op, rhs| {
            let rhs = rhs?;
            Ok(match op.as_rule() {
                Rule::neg => WatchExpr::Neg(Box::new(rhs)),
                Rule::not_op => WatchExpr::Not(Box::new(rhs)),
                _ => unreachable!(),
            })
        })
        .map_postfix(|lhs, op| {
            let lhs = lhs?;
            Ok(match op.as_rule() {
                Rule::prop_access => {
                    let name = op.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                    WatchExpr::Prop(Box::new(lhs), name.to_string())
                }
                _ => unreachable!(),
            })
        })
        .map_infix(|lhs, op, rhs| {
            let lhs = Box::new(lhs?);
            let rhs = Box::new(rhs?);
            Ok(match op.as_rule() {
                Rule::op_add => WatchExpr::Add(lhs, rhs),
                Rule::op_sub => WatchExpr::Sub(lhs, rhs),
                Rule::op_mul => WatchExpr::Mul(lhs, rhs),
                Rule::op_div => WatchExpr::Div(lhs, rhs),
                Rule::op_mod => WatchExpr::Mod(lhs, rhs),
                Rule::op_eq => WatchExpr::Eq(lhs, rhs),
                Rule::op_ne => WatchExpr::Ne(lhs, rhs),
                Rule::op_lt => WatchExpr::Lt(lhs, rhs),
                Rule::op_gt => WatchExpr::Gt(lhs, rhs),
                Rule::op_le => WatchExpr::Le(lhs, rhs),
                Rule::op_ge => WatchExpr::Ge(lhs, rhs),
                _ => unreachable!(),
            })
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<Rule>) -> Result<WatchExpr, ScriptError> {
    match pair.as_rule() {
        Rule::int => pair
            .as_str()
            .parse::<i32>()
            .map(WatchExpr::IntLiteral)
            .map_err(|e| ScriptError::new(format!("Invalid integer: {}", e))),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(WatchExpr::FloatLiteral)
            .map_err(|e| ScriptError::new(format!("Invalid float: {}", e))),
        Rule::string => {
            let inner = pair
                .into_inner()
                .next()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            Ok(WatchExpr::StringLiteral(inner))
        }
        Rule::symbol => {
            let inner = pair
                .into_inner()
                .next()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            Ok(WatchExpr::SymbolLiteral(inner))
        }
        Rule::kw_true => Ok(WatchExpr::BoolLiteral(true)),
        Rule::kw_false => Ok(WatchExpr::BoolLiteral(false)),
        Rule::me => Ok(WatchExpr::Me),
        Rule::ident => Ok(WatchExpr::Identifier(pair.as_str().to_string())),
        Rule::paren => build_expr(
            pair.into_inner()
                .next()
                .ok_or_else(|| ScriptError::new("Empty parens".to_string()))?
                .into_inner(),
        ),
        other => Err(ScriptError::new(format!(
            "Unexpected expression element {:?}",
            other
        ))),
    }
}

/// Parses and evaluates against the player's current scope.
pub fn eval_expression_text(
    player: &mut MoviePlayer,
    text: &str,
) -> Result<Datum, ScriptError> {
    let expr = parse_expression(text)?;
    eval_expr(player, &expr)
}

pub fn eval_expr(player: &mut MoviePlayer, expr: &WatchExpr) -> Result<Datum, ScriptError> {
    match expr {
        WatchExpr::IntLiteral(n) => Ok(Datum::Int(*n)),
        WatchExpr::FloatLiteral(f) => Ok(Datum::Float(*f)),
        WatchExpr::StringLiteral(s) => Ok(Datum::Str(s.clone())),
        WatchExpr::SymbolLiteral(s) => Ok(Datum::Symbol(s.clone())),
        WatchExpr::BoolLiteral(b) => Ok(datum_bool(*b)),
        WatchExpr::Me => lookup_me(player),
        WatchExpr::Identifier(name) => lookup_identifier(player, name),
        WatchExpr::Prop(base, name) => {
            let base = eval_expr(player, base)?;
            get_obj_prop(player, &base, name)
        }
        WatchExpr::Neg(inner) => negate_datum(&eval_expr(player, inner)?),
        WatchExpr::Not(inner) => {
            let value = eval_expr(player, inner)?;
            Ok(datum_bool(!value.bool_value().unwrap_or(false)))
        }
        WatchExpr::Add(a, b) => add_datums(&eval_expr(player, a)?, &eval_expr(player, b)?),
        WatchExpr::Sub(a, b) => subtract_datums(&eval_expr(player, a)?, &eval_expr(player, b)?),
        WatchExpr::Mul(a, b) => multiply_datums(&eval_expr(player, a)?, &eval_expr(player, b)?),
        WatchExpr::Div(a, b) => divide_datums(&eval_expr(player, a)?, &eval_expr(player, b)?),
        WatchExpr::Mod(a, b) => mod_datums(&eval_expr(player, a)?, &eval_expr(player, b)?),
        WatchExpr::Eq(a, b) => Ok(datum_bool(datum_equals(
            &eval_expr(player, a)?,
            &eval_expr(player, b)?,
        )?)),
        WatchExpr::Ne(a, b) => Ok(datum_bool(!datum_equals(
            &eval_expr(player, a)?,
            &eval_expr(player, b)?,
        )?)),
        WatchExpr::Lt(a, b) => Ok(datum_bool(datum_less_than(
            &eval_expr(player, a)?,
            &eval_expr(player, b)?,
        )?)),
        WatchExpr::Gt(a, b) => Ok(datum_bool(datum_greater_than(
            &eval_expr(player, a)?,
            &eval_expr(player, b)?,
        )?)),
        WatchExpr::Le(a, b) => {
            let left = eval_expr(player, a)?;
            let right = eval_expr(player, b)?;
            Ok(datum_bool(
                datum_less_than(&left, &right)? || datum_equals(&left, &right)?,
            ))
        }
        WatchExpr::Ge(a, b) => {
            let left = eval_expr(player, a)?;
            let right = eval_expr(player, b)?;
            Ok(datum_bool(
                datum_greater_than(&left, &right)? || datum_equals(&left, &right)?,
            ))
        }
        WatchExpr::And(a, b) => {
            // short-circuit
            if !eval_expr(player, a)?.bool_value().unwrap_or(false) {
                return Ok(datum_bool(false));
            }
            Ok(datum_bool(
                eval_expr(player, b)?.bool_value().unwrap_or(false),
            ))
        }
        WatchExpr::Or(a, b) => {
            if eval_expr(player, a)?.bool_value().unwrap_or(false) {
                return Ok(datum_bool(true));
            }
            Ok(datum_bool(
                eval_expr(player, b)?.bool_value().unwrap_or(false),
            ))
        }
    }
}

fn lookup_me(player: &MoviePlayer) -> Result<Datum, ScriptError> {
    let receiver = player
        .current_scope_ref()
        .and_then(|scope_ref| player.scope(scope_ref).receiver.clone());
    match receiver {
        Some(instance) => Ok(Datum::Instance(instance)),
        None => Ok(Datum::Void),
    }
}

/// Lookup order: locals, then params (by name or `argN`), then globals,
/// then properties of `me`.
fn lookup_identifier(player: &mut MoviePlayer, name: &str) -> Result<Datum, ScriptError> {
    if let Some(scope_ref) = player.current_scope_ref() {
        let handler = {
            let scope = player.scope(scope_ref);
            player
                .movie
                .cast_manager
                .get_script_by_ref(&scope.script_ref)
                .and_then(|script| script.handler_named(&scope.handler_name))
        };
        if let Some(handler) = &handler {
            if let Some(index) = handler
                .local_names
                .iter()
                .position(|local| local.eq_ignore_ascii_case(name))
            {
                return Ok(player.scope(scope_ref).local(index));
            }
            if let Some(index) = handler
                .argument_names
                .iter()
                .position(|arg| arg.eq_ignore_ascii_case(name))
            {
                return Ok(player.scope(scope_ref).arg(index));
            }
        }
        if let Some(rest) = name.to_ascii_lowercase().strip_prefix("arg") {
            if let Ok(index) = rest.parse::<usize>() {
                return Ok(player.scope(scope_ref).arg(index));
            }
        }
    }

    if let Some((_, value)) = player
        .globals
        .iter()
        .find(|(global, _)| global.eq_ignore_ascii_case(name))
    {
        return Ok(value.clone());
    }

    let receiver = player
        .current_scope_ref()
        .and_then(|scope_ref| player.scope(scope_ref).receiver.clone());
    if let Some(instance) = receiver {
        if let Some(value) = crate::player::script::instance_get_prop_opt(&instance, name) {
            return Ok(value);
        }
    }

    Err(ScriptError::new(format!("Unknown identifier {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_parse() {
        assert_eq!(parse_expression("42").unwrap(), WatchExpr::IntLiteral(42));
        assert_eq!(
            parse_expression("-42").unwrap(),
            WatchExpr::Neg(Box::new(WatchExpr::IntLiteral(42)))
        );
        assert_eq!(
            parse_expression("42.5").unwrap(),
            WatchExpr::FloatLiteral(42.5)
        );
        assert_eq!(
            parse_expression("\"hi\"").unwrap(),
            WatchExpr::StringLiteral("hi".to_string())
        );
        assert_eq!(
            parse_expression("#sym").unwrap(),
            WatchExpr::SymbolLiteral("sym".to_string())
        );
    }

    #[test]
    fn precedence_orders_mul_over_add() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            WatchExpr::Add(
                Box::new(WatchExpr::IntLiteral(1)),
                Box::new(WatchExpr::Mul(
                    Box::new(WatchExpr::IntLiteral(2)),
                    Box::new(WatchExpr::IntLiteral(3))
                ))
            )
        );
    }

    #[test]
    fn property_chains_parse() {
        let expr = parse_expression("me.name").unwrap();
        assert_eq!(
            expr,
            WatchExpr::Prop(Box::new(WatchExpr::Me), "name".to_string())
        );
    }

    #[test]
    fn evaluation_follows_vm_coercions() {
        let mut player = MoviePlayer::new();
        let result = eval_expression_text(&mut player, "3 + 0.5").unwrap();
        assert!(matches!(result, Datum::Float(f) if f == 3.5));
        let result = eval_expression_text(&mut player, "7 / 2").unwrap();
        assert!(matches!(result, Datum::Float(f) if f == 3.5));
        let result = eval_expression_text(&mut player, "6 / 2").unwrap();
        assert!(matches!(result, Datum::Int(3)));
        let result = eval_expression_text(&mut player, "1 = 2 or 3 < 4").unwrap();
        assert!(matches!(result, Datum::Int(1)));
    }

    #[test]
    fn globals_resolve_case_insensitively() {
        let mut player = MoviePlayer::new();
        player
            .globals
            .insert("gScore".to_string(), Datum::Int(12));
        let result = eval_expression_text(&mut player, "gscore + 1").unwrap();
        assert!(matches!(result, Datum::Int(13)));
    }
}
