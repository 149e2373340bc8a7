use crate::lingo::datum::Datum;
use crate::lingo::ops::datum_is_zero;
use crate::player::methods::{call_datum_method, call_datum_method_quiet};
use crate::player::script::find_instance_handler;
use crate::player::{MoviePlayer, OpResult, ScriptError};

use super::dispatch::HandlerCtx;

/// `ret` takes a value left on the stack when there is one; `return x`
/// itself ends the handler earlier, through the `return` builtin.
pub fn ret(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    if let Some(value) = scope.stack.pop() {
        scope.return_value = value;
    }
    scope.stack.clear();
    Ok(OpResult::Stop)
}

pub fn ret_factory(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    scope.return_value = Datum::Void;
    scope.stack.clear();
    Ok(OpResult::Stop)
}

pub fn jmp(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let bytecode = ctx.current_bytecode(player);
    let target = (bytecode.pos as i64 + bytecode.operand) as usize;
    let index = ctx.index_of_offset(target)?;
    player.scope_mut(ctx.scope_ref).bytecode_index = index;
    Ok(OpResult::Jump)
}

pub fn jmp_if_zero(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let (position, offset) = {
        let bytecode = ctx.current_bytecode(player);
        (bytecode.pos as i64, bytecode.operand)
    };
    let value = {
        let scope = player.scope_mut(ctx.scope_ref);
        scope.loop_return_indices.push(scope.bytecode_index);
        scope.pop()
    };
    if datum_is_zero(&value)? {
        let index = ctx.index_of_offset((position + offset) as usize)?;
        player.scope_mut(ctx.scope_ref).bytecode_index = index;
        Ok(OpResult::Jump)
    } else {
        Ok(OpResult::Advance)
    }
}

/// Backward jump closing a repeat loop.
pub fn end_repeat(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let bytecode = ctx.current_bytecode(player);
    let target = bytecode.pos - bytecode.operand as usize;
    let index = ctx.index_of_offset(target)?;
    let scope = player.scope_mut(ctx.scope_ref);
    scope.loop_return_indices.pop();
    scope.bytecode_index = index;
    Ok(OpResult::Jump)
}

pub fn ext_call(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let arg_list = player.scope_mut(ctx.scope_ref).pop();
    let is_no_ret = matches!(arg_list, Datum::ArgListNoRet(_));
    let args = arg_list.to_flat_args()?;

    if name.eq_ignore_ascii_case("return") {
        let return_value = args.first().cloned().unwrap_or(Datum::Void);
        let scope = player.scope_mut(ctx.scope_ref);
        scope.return_value = return_value;
        return Ok(OpResult::Stop);
    }

    let result = player.call_global_handler(&name, &args)?;
    player.last_handler_result = result.clone();
    if !is_no_ret {
        player.scope_mut(ctx.scope_ref).push(result);
    }
    Ok(OpResult::Advance)
}

/// `local_call` restricts resolution to the current script; the operand is
/// the handler's index in it.
pub fn local_call(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let handler_index = ctx.operand(player) as usize;
    let arg_list = player.scope_mut(ctx.scope_ref).pop();
    let is_no_ret = matches!(arg_list, Datum::ArgListNoRet(_));
    let args = arg_list.to_flat_args()?;

    let handler = ctx.script.handler_at(handler_index).ok_or_else(|| {
        ScriptError::new(format!(
            "No handler at index {} in script {}",
            handler_index, ctx.script.name
        ))
    })?;

    // a first argument carrying the same handler redirects the call
    let redirected = args.first().and_then(|first| match first {
        Datum::Instance(instance_ref) => {
            let cast_manager = &player.movie.cast_manager;
            find_instance_handler(instance_ref, &handler.name, &|member_ref| {
                cast_manager.get_script_by_ref(member_ref)
            })
        }
        _ => None,
    });

    let result = match redirected {
        Some((receiver, handler_ref)) => {
            player.call_handler_ref(Some(receiver), &handler_ref, args[1..].to_vec())?
        }
        None => {
            let receiver = player.scope(ctx.scope_ref).receiver.clone();
            player.call_handler(ctx.script.clone(), handler, receiver, args)?
        }
    };
    if result.passed {
        player.scope_mut(ctx.scope_ref).passed = true;
    }
    if !is_no_ret {
        player.scope_mut(ctx.scope_ref).push(result.return_value);
    }
    Ok(OpResult::Advance)
}

/// `obj_call`: the first arg-list element is the receiver.
pub fn obj_call(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let arg_list = player.scope_mut(ctx.scope_ref).pop();
    let is_no_ret = matches!(arg_list, Datum::ArgListNoRet(_));
    let args = arg_list.to_flat_args()?;
    let Some(obj) = args.first().cloned() else {
        return Err(ScriptError::new(format!(
            "Method call {} needs a receiver",
            name
        )));
    };

    let result = call_datum_method(player, &obj, &name, &args[1..])?;
    player.last_handler_result = result.clone();
    if !is_no_ret {
        player.scope_mut(ctx.scope_ref).push(result);
    }
    Ok(OpResult::Advance)
}

pub fn start_tell(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let target = player.scope_mut(ctx.scope_ref).pop();
    player.scope_mut(ctx.scope_ref).tell_targets.push(target);
    Ok(OpResult::Advance)
}

pub fn end_tell(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    player.scope_mut(ctx.scope_ref).tell_targets.pop();
    Ok(OpResult::Advance)
}

/// Inside a tell block, calls redirect to the innermost target.
pub fn tell_call(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let arg_list = player.scope_mut(ctx.scope_ref).pop();
    let is_no_ret = matches!(arg_list, Datum::ArgListNoRet(_));
    let args = arg_list.to_flat_args()?;

    let target = player
        .scope(ctx.scope_ref)
        .tell_targets
        .last()
        .cloned()
        .unwrap_or(Datum::Void);

    let result = if target.is_void() {
        player.call_global_handler(&name, &args)?
    } else {
        call_datum_method_quiet(player, &target, &name, &args)?
    };
    if !is_no_ret {
        player.scope_mut(ctx.scope_ref).push(result);
    }
    Ok(OpResult::Advance)
}
