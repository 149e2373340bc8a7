//! The context-variable encoding shared by `put`, `put_chunk`,
//! `delete_chunk` and `push_chunk_var_ref`: a 4-bit slot kind in the
//! operand, with the slot id (and, for fields, the cast id) on the stack.

use crate::lingo::datum::{Datum, MemberRef};
use crate::player::script::instance_set_prop;
use crate::player::{MoviePlayer, ScriptError};

use super::dispatch::HandlerCtx;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PutKind {
    Into,
    After,
    Before,
}

impl PutKind {
    pub fn from_raw(raw: u8) -> Result<PutKind, ScriptError> {
        match raw {
            0x01 => Ok(PutKind::Into),
            0x02 => Ok(PutKind::After),
            0x03 => Ok(PutKind::Before),
            _ => Err(ScriptError::new(format!("Invalid put kind {}", raw))),
        }
    }
}

pub enum VarSlot {
    Global(String),
    Property(String),
    Arg(usize),
    Local(usize),
    Field(MemberRef),
}

/// Pops the slot operands and classifies the target.
pub fn read_var_slot(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
    var_type: u32,
) -> Result<VarSlot, ScriptError> {
    let cast_id = if var_type == 0x6 && player.movie.dir_version >= 500 {
        Some(player.scope_mut(ctx.scope_ref).pop())
    } else {
        None
    };
    let id = player.scope_mut(ctx.scope_ref).pop();

    match var_type {
        0x1 | 0x2 => {
            let name = ctx.script.resolve_name(id.int_value()? as u16);
            Ok(VarSlot::Global(name))
        }
        0x3 => {
            let name = ctx.script.resolve_name(id.int_value()? as u16);
            Ok(VarSlot::Property(name))
        }
        0x4 => {
            let index = id.int_value()? as u32 / ctx.script.variable_multiplier;
            Ok(VarSlot::Arg(index as usize))
        }
        0x5 => {
            let index = id.int_value()? as u32 / ctx.script.variable_multiplier;
            Ok(VarSlot::Local(index as usize))
        }
        0x6 => {
            let member_ref = player
                .movie
                .cast_manager
                .resolve_member_ref(&id, cast_id.as_ref())?
                .ok_or_else(|| ScriptError::new("Field member not found".to_string()))?;
            Ok(VarSlot::Field(member_ref))
        }
        _ => Err(ScriptError::new(format!(
            "Invalid context var type: {}",
            var_type
        ))),
    }
}

pub fn resolve_var_value(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
    slot: &VarSlot,
) -> Result<Datum, ScriptError> {
    match slot {
        VarSlot::Global(name) => Ok(player.globals.get(name).cloned().unwrap_or(Datum::Void)),
        VarSlot::Property(name) => {
            let receiver = player.scope(ctx.scope_ref).receiver.clone();
            match receiver {
                Some(instance) => {
                    Ok(crate::player::script::instance_get_prop_opt(&instance, name)
                        .unwrap_or(Datum::Void))
                }
                None => Ok(ctx
                    .script
                    .static_props
                    .borrow()
                    .get(name)
                    .cloned()
                    .unwrap_or(Datum::Void)),
            }
        }
        VarSlot::Arg(index) => Ok(player.scope(ctx.scope_ref).arg(*index)),
        VarSlot::Local(index) => Ok(player.scope(ctx.scope_ref).local(*index)),
        VarSlot::Field(member_ref) => {
            let text = player.movie.cast_manager.field_text(member_ref)?;
            Ok(Datum::Str(text))
        }
    }
}

pub fn write_var_slot(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
    slot: &VarSlot,
    value: Datum,
    put_kind: PutKind,
) -> Result<(), ScriptError> {
    let value = match put_kind {
        PutKind::Into => value,
        PutKind::Before => {
            let current = resolve_var_value(player, ctx, slot)?;
            Datum::Str(format!(
                "{}{}",
                value.string_value()?,
                current.string_value().unwrap_or_default()
            ))
        }
        PutKind::After => {
            let current = resolve_var_value(player, ctx, slot)?;
            Datum::Str(format!(
                "{}{}",
                current.string_value().unwrap_or_default(),
                value.string_value()?
            ))
        }
    };

    match slot {
        VarSlot::Global(name) => {
            player.globals.insert(name.clone(), value);
            Ok(())
        }
        VarSlot::Property(name) => {
            let receiver = player.scope(ctx.scope_ref).receiver.clone();
            match receiver {
                Some(instance) => instance_set_prop(&instance, name, value, false),
                None => {
                    ctx.script
                        .static_props
                        .borrow_mut()
                        .insert(name.clone(), value);
                    Ok(())
                }
            }
        }
        VarSlot::Arg(index) => {
            player.scope_mut(ctx.scope_ref).set_arg(*index, value);
            Ok(())
        }
        VarSlot::Local(index) => {
            player.scope_mut(ctx.scope_ref).set_local(*index, value);
            Ok(())
        }
        VarSlot::Field(member_ref) => {
            let text = value.string_value()?;
            let member = player
                .movie
                .cast_manager
                .find_member_mut(member_ref)
                .ok_or_else(|| ScriptError::new("Field member not found".to_string()))?;
            match member.member_type.as_text_data_mut() {
                Some(data) => {
                    data.set_text(&text);
                    Ok(())
                }
                None => Err(ScriptError::new(
                    "Cast member is not a field".to_string(),
                )),
            }
        }
    }
}
