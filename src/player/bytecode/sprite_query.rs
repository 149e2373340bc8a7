use crate::lingo::datum::datum_bool;
use crate::player::{MoviePlayer, OpResult, ScriptError};

use super::dispatch::HandlerCtx;

/// `sprite A intersects B`: bounded-box test over the two channels.
pub fn onto_sprite(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let second = scope.pop().int_value()? as i16;
    let first = scope.pop().int_value()? as i16;
    let result = match (
        player.movie.score.get_sprite(first),
        player.movie.score.get_sprite(second),
    ) {
        (Some(a), Some(b)) => a.intersects(b),
        _ => false,
    };
    player.scope_mut(ctx.scope_ref).push(datum_bool(result));
    Ok(OpResult::Advance)
}

/// `sprite A within B`: containment test.
pub fn into_sprite(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let second = scope.pop().int_value()? as i16;
    let first = scope.pop().int_value()? as i16;
    let result = match (
        player.movie.score.get_sprite(first),
        player.movie.score.get_sprite(second),
    ) {
        (Some(a), Some(b)) => a.within(b),
        _ => false,
    };
    player.scope_mut(ctx.scope_ref).push(datum_bool(result));
    Ok(OpResult::Advance)
}
