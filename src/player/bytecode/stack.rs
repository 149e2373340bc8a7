use crate::lingo::datum::{Datum, VarTarget, new_list, new_prop_list};
use crate::player::methods::script as script_methods;
use crate::player::{MoviePlayer, OpResult, ScriptError};

use super::dispatch::HandlerCtx;
use super::var_access::{read_var_slot, resolve_var_value};

pub fn push_zero(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    player.scope_mut(ctx.scope_ref).push(Datum::Int(0));
    Ok(OpResult::Advance)
}

pub fn push_int(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let value = ctx.operand(player) as i32;
    player.scope_mut(ctx.scope_ref).push(Datum::Int(value));
    Ok(OpResult::Advance)
}

pub fn push_float32(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let bits = ctx.operand(player) as u32;
    let value = f32::from_bits(bits) as f64;
    player.scope_mut(ctx.scope_ref).push(Datum::Float(value));
    Ok(OpResult::Advance)
}

pub fn push_cons(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let literal_id = ctx.operand(player) as u32 / ctx.script.variable_multiplier;
    let literal = ctx
        .script
        .literals
        .get(literal_id as usize)
        .cloned()
        .unwrap_or(Datum::Void);
    player.scope_mut(ctx.scope_ref).push(literal);
    Ok(OpResult::Advance)
}

pub fn push_symb(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    player.scope_mut(ctx.scope_ref).push(Datum::Symbol(name));
    Ok(OpResult::Advance)
}

pub fn push_arg_list(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let count = ctx.operand(player) as usize;
    let scope = player.scope_mut(ctx.scope_ref);
    let items = scope.pop_n(count);
    scope.push(Datum::ArgList(items));
    Ok(OpResult::Advance)
}

pub fn push_arg_list_no_ret(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
) -> Result<OpResult, ScriptError> {
    let count = ctx.operand(player) as usize;
    let scope = player.scope_mut(ctx.scope_ref);
    let items = scope.pop_n(count);
    scope.push(Datum::ArgListNoRet(items));
    Ok(OpResult::Advance)
}

/// `[a, b, c]`: the compiler emits an arg list and converts it.
pub fn push_list(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let items = scope.pop().to_flat_args()?;
    scope.push(new_list(items));
    Ok(OpResult::Advance)
}

/// `[#a: 1, #b: 2]`: pairs pop off an even-length arg list.
pub fn push_prop_list(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let items = scope.pop().to_flat_args()?;
    if items.len() % 2 != 0 {
        return Err(ScriptError::new(
            "Property list literal needs an even item count".to_string(),
        ));
    }
    let entries = items
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    scope.push(new_prop_list(entries));
    Ok(OpResult::Advance)
}

pub fn push_var_ref(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    player
        .scope_mut(ctx.scope_ref)
        .push(Datum::VarRef(VarTarget::Global(name)));
    Ok(OpResult::Advance)
}

/// Pushes the resolved value of a context variable; chunk reads compose on
/// top of it.
pub fn push_chunk_var_ref(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
) -> Result<OpResult, ScriptError> {
    let var_type = ctx.operand(player) as u32;
    let slot = read_var_slot(player, ctx, var_type)?;
    let value = resolve_var_value(player, ctx, &slot)?;
    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

pub fn peek(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let offset = ctx.operand(player) as usize;
    let scope = player.scope_mut(ctx.scope_ref);
    let index = scope.stack.len().checked_sub(1 + offset);
    let value = index
        .and_then(|i| scope.stack.get(i))
        .cloned()
        .unwrap_or(Datum::Void);
    scope.push(value);
    Ok(OpResult::Advance)
}

pub fn pop(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let count = ctx.operand(player) as usize;
    player.scope_mut(ctx.scope_ref).pop_n(count);
    Ok(OpResult::Advance)
}

pub fn swap(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let a = scope.pop();
    let b = scope.pop();
    scope.push(a);
    scope.push(b);
    Ok(OpResult::Advance)
}

/// `new(script "Foo", ...)`: builds a script instance through the same
/// path as the `new` method.
pub fn new_obj(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let obj_type = ctx.operand_name(player);
    let args = player.scope_mut(ctx.scope_ref).pop().to_flat_args()?;
    if !obj_type.eq_ignore_ascii_case("script") {
        return Err(ScriptError::new(format!(
            "Cannot instantiate non-script object {}",
            obj_type
        )));
    }
    let Some(name_arg) = args.first() else {
        return Err(ScriptError::new("new(script ...) needs a name".to_string()));
    };
    let script_name = name_arg.string_value()?;
    let script_ref = player
        .movie
        .cast_manager
        .find_member_ref_by_name(&script_name)
        .ok_or_else(|| ScriptError::new(format!("No script member named {}", script_name)))?;
    let instance = script_methods::new_instance_of(player, &script_ref, &args[1..])?;
    player.scope_mut(ctx.scope_ref).push(instance);
    Ok(OpResult::Advance)
}
