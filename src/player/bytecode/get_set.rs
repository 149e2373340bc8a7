use crate::lingo::constants::{
    MAX_MOVIE_PROP_ID, anim_prop_name, anim2_prop_name, movie_prop_name, sprite_prop_name,
};
use crate::lingo::datum::{Datum, StringChunkType};
use crate::lingo::format::format_datum;
use crate::player::methods::string as string_methods;
use crate::player::methods::{get_obj_prop, member, set_obj_prop};
use crate::player::script::{instance_get_prop, instance_set_prop};
use crate::player::{MoviePlayer, OpResult, ScriptError};

use super::dispatch::HandlerCtx;

pub fn get_global(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let value = player.globals.get(&name).cloned().unwrap_or(Datum::Void);
    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

pub fn set_global(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let value = player.scope_mut(ctx.scope_ref).pop();
    let value_text = format_datum(&value, player.float_precision);
    player.globals.insert(name.clone(), value);
    player.trace.on_variable_set("global", &name, &value_text);
    Ok(OpResult::Advance)
}

pub fn get_local(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let index = ctx.operand(player) as u32 / ctx.script.variable_multiplier;
    let value = player.scope(ctx.scope_ref).local(index as usize);
    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

pub fn set_local(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let index = (ctx.operand(player) as u32 / ctx.script.variable_multiplier) as usize;
    let value = player.scope_mut(ctx.scope_ref).pop();
    let value_text = format_datum(&value, player.float_precision);
    player.scope_mut(ctx.scope_ref).set_local(index, value);
    let name = ctx
        .handler
        .local_names
        .get(index)
        .map(|s| s.as_str())
        .unwrap_or("?");
    player.trace.on_variable_set("local", name, &value_text);
    Ok(OpResult::Advance)
}

pub fn get_param(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let index = ctx.operand(player) as u32 / ctx.script.variable_multiplier;
    let value = player.scope(ctx.scope_ref).arg(index as usize);
    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

pub fn set_param(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let index = (ctx.operand(player) as u32 / ctx.script.variable_multiplier) as usize;
    let value = player.scope_mut(ctx.scope_ref).pop();
    let value_text = format_datum(&value, player.float_precision);
    player.scope_mut(ctx.scope_ref).set_arg(index, value);
    let name = ctx
        .handler
        .argument_names
        .get(index)
        .map(|s| s.as_str())
        .unwrap_or("?");
    player.trace.on_variable_set("param", name, &value_text);
    Ok(OpResult::Advance)
}

/// Script property read: through the receiver when there is one, through
/// the script's static storage otherwise.
pub fn get_prop(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let receiver = player.scope(ctx.scope_ref).receiver.clone();
    let value = match receiver {
        Some(instance) => instance_get_prop(&instance, &name)?,
        None => ctx
            .script
            .static_props
            .borrow()
            .get(&name)
            .cloned()
            .unwrap_or(Datum::Void),
    };
    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

pub fn set_prop(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let value = player.scope_mut(ctx.scope_ref).pop();
    let receiver = player.scope(ctx.scope_ref).receiver.clone();
    match receiver {
        Some(instance) => instance_set_prop(&instance, &name, value, false)?,
        None => {
            ctx.script.static_props.borrow_mut().insert(name, value);
        }
    }
    Ok(OpResult::Advance)
}

pub fn get_obj_prop_op(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let obj = player.scope_mut(ctx.scope_ref).pop();
    let value = get_obj_prop(player, &obj, &name)?;
    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

pub fn set_obj_prop_op(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let scope = player.scope_mut(ctx.scope_ref);
    let value = scope.pop();
    let obj = scope.pop();
    set_obj_prop(player, &obj, &name, value)?;
    Ok(OpResult::Advance)
}

/// Chained access (`sprite(3).member.name`) tolerates more receiver
/// shapes than plain property reads.
pub fn get_chained_prop(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let obj = player.scope_mut(ctx.scope_ref).pop();

    let value = match &obj {
        Datum::Sprite(channel) => {
            // behavior properties shadow built-in sprite properties
            let instances = player
                .movie
                .score
                .get_sprite(*channel)
                .map(|s| s.script_instance_list.clone())
                .unwrap_or_default();
            let from_instance = instances
                .iter()
                .find_map(|instance| crate::player::script::instance_get_prop_opt(instance, &name));
            match from_instance {
                Some(value) => value,
                None => member::get_sprite_prop(player, *channel, &name)?,
            }
        }
        Datum::List(items) => {
            if let Ok(index) = name.parse::<i32>() {
                let items = items.borrow();
                if index >= 1 && index as usize <= items.len() {
                    items[index as usize - 1].clone()
                } else {
                    return Err(ScriptError::new(format!(
                        "List index {} out of range",
                        index
                    )));
                }
            } else {
                get_obj_prop(player, &obj, &name)?
            }
        }
        _ => get_obj_prop(player, &obj, &name)?,
    };
    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

pub fn get_movie_prop(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let value = player.get_movie_prop(&name)?;
    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

pub fn set_movie_prop(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let value = player.scope_mut(ctx.scope_ref).pop();
    player.set_movie_prop(&name, value)?;
    Ok(OpResult::Advance)
}

pub fn get_top_level_prop(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let value = match name.as_str() {
        "_player" => Datum::PlayerRef,
        "_movie" => Datum::MovieRef,
        "_global" => Datum::MovieRef,
        _ => {
            return Err(ScriptError::new(format!(
                "Unknown top level property {}",
                name
            )));
        }
    };
    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

/// `the <name>`: environment values; the compiler leaves an empty arg
/// list on the stack.
pub fn the_builtin(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let name = ctx.operand_name(player);
    let scope_ref = ctx.scope_ref;
    let value = player.get_the_builtin_prop(scope_ref, &name)?;
    let scope = player.scope_mut(scope_ref);
    scope.pop();
    scope.push(value);
    Ok(OpResult::Advance)
}

/// Numeric-id property read: movie props, last-chunk, sprite, anim and
/// cast-count groups.
pub fn get(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let prop_type = ctx.operand(player);
    let prop_id = player.scope_mut(ctx.scope_ref).pop().int_value()?;

    let value = if prop_type == 0 && prop_id <= MAX_MOVIE_PROP_ID as i32 {
        let name = movie_prop_name(prop_id as u16)
            .ok_or_else(|| ScriptError::new(format!("Unknown movie prop id {}", prop_id)))?;
        player.get_the_builtin_prop(ctx.scope_ref, name)?
    } else if prop_type == 0 {
        // the last <chunk> of a string
        let text = player.scope_mut(ctx.scope_ref).pop().string_value()?;
        let chunk_type = chunk_type_from_id(prop_id - 0x0b)?;
        let delimiter = player.movie.item_delimiter.clone();
        Datum::Str(string_methods::last_chunk(&text, chunk_type, &delimiter))
    } else if prop_type == 0x01 {
        // the number of <chunk>s of a string
        let text = player.scope_mut(ctx.scope_ref).pop().string_value()?;
        let chunk_type = chunk_type_from_id(prop_id)?;
        let delimiter = player.movie.item_delimiter.clone();
        Datum::Int(string_methods::count_chunks(&text, chunk_type, &delimiter) as i32)
    } else if prop_type == 0x06 {
        let name = sprite_prop_name(prop_id as u16)
            .ok_or_else(|| ScriptError::new(format!("Unknown sprite prop id {}", prop_id)))?;
        let channel = player.scope_mut(ctx.scope_ref).pop().int_value()?;
        member::get_sprite_prop(player, channel as i16, name)?
    } else if prop_type == 0x07 {
        let name = anim_prop_name(prop_id as u16)
            .ok_or_else(|| ScriptError::new(format!("Unknown anim prop id {}", prop_id)))?;
        player.get_the_builtin_prop(ctx.scope_ref, name)?
    } else if prop_type == 0x08 {
        let name = anim2_prop_name(prop_id as u16)
            .ok_or_else(|| ScriptError::new(format!("Unknown anim2 prop id {}", prop_id)))?;
        match name {
            "number of castMembers" => {
                let total: usize = player
                    .movie
                    .cast_manager
                    .casts
                    .iter()
                    .map(|cast| cast.member_count())
                    .sum();
                Datum::Int(total as i32)
            }
            "number of castLibs" => Datum::Int(player.movie.cast_manager.casts.len() as i32),
            _ => Datum::Int(0),
        }
    } else {
        return Err(ScriptError::new(format!(
            "get: unsupported property type {} id {}",
            prop_type, prop_id
        )));
    };

    player.scope_mut(ctx.scope_ref).push(value);
    Ok(OpResult::Advance)
}

pub fn set(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let prop_type = ctx.operand(player);
    let scope = player.scope_mut(ctx.scope_ref);
    let prop_id = scope.pop().int_value()?;
    let value = scope.pop();

    if prop_type == 0 && prop_id <= MAX_MOVIE_PROP_ID as i32 {
        let name = movie_prop_name(prop_id as u16)
            .ok_or_else(|| ScriptError::new(format!("Unknown movie prop id {}", prop_id)))?;
        player.set_movie_prop(name, value)?;
    } else if prop_type == 0x06 {
        let name = sprite_prop_name(prop_id as u16)
            .ok_or_else(|| ScriptError::new(format!("Unknown sprite prop id {}", prop_id)))?;
        let channel = player.scope_mut(ctx.scope_ref).pop().int_value()?;
        member::set_sprite_prop(player, channel as i16, name, value)?;
    } else if prop_type == 0x07 {
        let name = anim_prop_name(prop_id as u16)
            .ok_or_else(|| ScriptError::new(format!("Unknown anim prop id {}", prop_id)))?;
        player.set_movie_prop(name, value)?;
    } else {
        return Err(ScriptError::new(format!(
            "set: unsupported property type {} id {}",
            prop_type, prop_id
        )));
    }
    Ok(OpResult::Advance)
}

fn chunk_type_from_id(id: i32) -> Result<StringChunkType, ScriptError> {
    num::FromPrimitive::from_i32(id)
        .ok_or_else(|| ScriptError::new(format!("Invalid chunk type id {}", id)))
}
