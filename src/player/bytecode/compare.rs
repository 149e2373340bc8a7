use crate::lingo::datum::{Datum, datum_bool};
use crate::lingo::ops::{datum_equals, datum_greater_than, datum_less_than};
use crate::player::{MoviePlayer, OpResult, ScriptError};

use super::dispatch::HandlerCtx;

fn compare_op(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
    op: impl FnOnce(&Datum, &Datum) -> Result<bool, ScriptError>,
) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let right = scope.pop();
    let left = scope.pop();
    let result = op(&left, &right)?;
    player.scope_mut(ctx.scope_ref).push(datum_bool(result));
    Ok(OpResult::Advance)
}

pub fn lt(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    compare_op(player, ctx, datum_less_than)
}

pub fn lt_eq(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    compare_op(player, ctx, |a, b| {
        Ok(datum_less_than(a, b)? || datum_equals(a, b)?)
    })
}

pub fn gt(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    compare_op(player, ctx, datum_greater_than)
}

pub fn gt_eq(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    compare_op(player, ctx, |a, b| {
        Ok(datum_greater_than(a, b)? || datum_equals(a, b)?)
    })
}

pub fn eq(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    compare_op(player, ctx, datum_equals)
}

pub fn nt_eq(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    compare_op(player, ctx, |a, b| Ok(!datum_equals(a, b)?))
}

pub fn and(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    compare_op(player, ctx, |a, b| Ok(a.bool_value()? && b.bool_value()?))
}

pub fn or(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    compare_op(player, ctx, |a, b| Ok(a.bool_value()? || b.bool_value()?))
}

pub fn not(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let value = scope.pop();
    let result = !value.bool_value().unwrap_or(false);
    scope.push(datum_bool(result));
    Ok(OpResult::Advance)
}
