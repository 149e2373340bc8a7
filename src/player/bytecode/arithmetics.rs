use crate::lingo::ops::{
    add_datums, divide_datums, mod_datums, multiply_datums, negate_datum, subtract_datums,
};
use crate::player::{MoviePlayer, OpResult, ScriptError};

use super::dispatch::HandlerCtx;

fn binary_op(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
    op: impl FnOnce(
        &crate::lingo::datum::Datum,
        &crate::lingo::datum::Datum,
    ) -> Result<crate::lingo::datum::Datum, ScriptError>,
) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let right = scope.pop();
    let left = scope.pop();
    let result = op(&left, &right)?;
    player.scope_mut(ctx.scope_ref).push(result);
    Ok(OpResult::Advance)
}

pub fn add(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    binary_op(player, ctx, add_datums)
}

pub fn sub(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    binary_op(player, ctx, subtract_datums)
}

pub fn mul(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    binary_op(player, ctx, multiply_datums)
}

pub fn div(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    binary_op(player, ctx, divide_datums)
}

pub fn mod_op(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    binary_op(player, ctx, mod_datums)
}

pub fn inv(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let value = scope.pop();
    let result = negate_datum(&value)?;
    scope.push(result);
    Ok(OpResult::Advance)
}
