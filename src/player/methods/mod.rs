//! Method dispatch on datum receivers: `obj.handler(args)` and
//! `call(#handler, obj, args)` land here and fan out by receiver kind.

pub mod geometry;
pub mod list;
pub mod member;
pub mod script;
pub mod string;

use crate::lingo::datum::{Datum, StringChunkSpan, StringChunkType, datum_bool};
use crate::lingo::ops::datum_equals;

use super::script::{instance_get_prop, instance_set_prop};
use super::{MoviePlayer, ScriptError};

/// The standard `obj_call` path: unknown methods fall through to a global
/// handler with the receiver as first argument.
pub fn call_datum_method(
    player: &mut MoviePlayer,
    obj: &Datum,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    call_datum_method_inner(player, obj, name, args, false)
}

/// The quiet path used by lifecycle events: a missing method returns VOID
/// instead of reaching for a global handler.
pub fn call_datum_method_quiet(
    player: &mut MoviePlayer,
    obj: &Datum,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    call_datum_method_inner(player, obj, name, args, true)
}

fn call_datum_method_inner(
    player: &mut MoviePlayer,
    obj: &Datum,
    name: &str,
    args: &[Datum],
    quiet: bool,
) -> Result<Datum, ScriptError> {
    match obj {
        Datum::Instance(instance_ref) => {
            script::call_instance_method(player, instance_ref, name, args, quiet)
        }
        Datum::Script(script_ref) => script::call_script_method(player, script_ref, name, args),
        Datum::List(_) | Datum::PropList(_) => list::call_method(player, obj, name, args),
        Datum::Str(_) | Datum::StringChunk(..) => string::call_method(player, obj, name, args),
        Datum::Point(..) | Datum::Rect(..) | Datum::Color(_) => {
            geometry::call_method(player, obj, name, args)
        }
        Datum::Member(member_ref) => member::call_member_method(player, member_ref, name, args),
        Datum::CastLib(cast_num) => member::call_cast_lib_method(player, *cast_num, name, args),
        Datum::Sprite(channel) => member::call_sprite_method(player, *channel, name, args),
        Datum::Timeout(timeout_name) => {
            member::call_timeout_method(player, timeout_name.clone(), name, args)
        }
        Datum::Stage => member::call_stage_method(player, name, args),
        Datum::XtraInstance(xtra_name, _) => {
            // xtra callbacks belong to the host; surface the gap
            Err(ScriptError::new(format!(
                "Xtra {} method {} not provided by host",
                xtra_name, name
            )))
        }
        _ => {
            if quiet {
                return Ok(Datum::Void);
            }
            // builtin with the receiver as first argument
            let mut full_args = vec![obj.clone()];
            full_args.extend_from_slice(args);
            player.call_global_handler(name, &full_args)
        }
    }
}

/// `obj.prop` reads, dispatched by receiver kind.
pub fn get_obj_prop(
    player: &mut MoviePlayer,
    obj: &Datum,
    prop: &str,
) -> Result<Datum, ScriptError> {
    match obj {
        Datum::CastLib(cast_num) => {
            let cast = player.movie.cast_manager.get_cast(*cast_num)?;
            cast.get_prop(prop)
        }
        Datum::Member(member_ref) => member::get_member_prop(player, member_ref, prop),
        Datum::Instance(instance_ref) => instance_get_prop(instance_ref, prop),
        Datum::Sprite(channel) => member::get_sprite_prop(player, *channel, prop),
        Datum::Timeout(timeout_name) => member::get_timeout_prop(player, timeout_name, prop),
        Datum::Stage => super::stage::get_stage_prop(player, prop),
        Datum::Point(x, y) => geometry::get_point_prop((*x, *y), prop),
        Datum::Rect(l, t, r, b) => geometry::get_rect_prop((*l, *t, *r, *b), prop),
        Datum::Color(color) => geometry::get_color_prop(color, prop),
        Datum::PropList(entries) => {
            let key = Datum::Symbol(prop.to_string());
            let found = entries
                .borrow()
                .iter()
                .find(|(entry_key, _)| datum_equals(entry_key, &key).unwrap_or(false))
                .map(|(_, value)| value.clone());
            found.ok_or_else(|| {
                ScriptError::new(format!("Property not found in list: {}", prop))
            })
        }
        Datum::List(items) => match prop {
            "count" => Ok(Datum::Int(items.borrow().len() as i32)),
            "ilk" => Ok(Datum::Symbol("list".to_string())),
            _ => Err(ScriptError::new(format!("No list property {}", prop))),
        },
        Datum::Str(_) | Datum::StringChunk(..) => {
            let text = obj.string_value()?;
            let delimiter = player.movie.item_delimiter.clone();
            match prop {
                "length" => Ok(Datum::Int(text.chars().count() as i32)),
                "ilk" => Ok(Datum::Symbol("string".to_string())),
                "char" | "word" | "line" | "item" => {
                    let chunk_type = StringChunkType::from_symbol(prop).unwrap();
                    let span = StringChunkSpan {
                        chunk_type,
                        start: 1,
                        end: string::count_chunks(&text, chunk_type, &delimiter) as i32,
                        item_delimiter: delimiter,
                    };
                    Ok(Datum::StringChunk(
                        crate::lingo::datum::StringChunkSource::Value,
                        span,
                        text,
                    ))
                }
                _ => Err(ScriptError::new(format!("No string property {}", prop))),
            }
        }
        Datum::Image(image) => {
            let image = image.borrow();
            match prop {
                "width" => Ok(Datum::Int(image.width)),
                "height" => Ok(Datum::Int(image.height)),
                "depth" => Ok(Datum::Int(image.bit_depth as i32)),
                "rect" => Ok(Datum::Rect(0, 0, image.width, image.height)),
                _ => Err(ScriptError::new(format!("No image property {}", prop))),
            }
        }
        Datum::Void => match prop {
            "ilk" => Ok(Datum::Symbol("void".to_string())),
            "string" => Ok(Datum::Str("".to_string())),
            _ => Err(ScriptError::new(format!(
                "Cannot read property {} of void",
                prop
            ))),
        },
        Datum::PlayerRef => match prop {
            "productVersion" => Ok(Datum::Str("10.1".to_string())),
            "traceScript" => Ok(datum_bool(false)),
            _ => player.get_movie_prop(prop),
        },
        Datum::MovieRef => player.get_movie_prop(prop),
        _ => {
            if prop == "ilk" {
                Ok(Datum::Symbol(obj.ilk().to_string()))
            } else {
                Err(ScriptError::new(format!(
                    "Cannot read property {} of {}",
                    prop,
                    obj.type_str()
                )))
            }
        }
    }
}

/// `obj.prop = value` writes, dispatched by receiver kind.
pub fn set_obj_prop(
    player: &mut MoviePlayer,
    obj: &Datum,
    prop: &str,
    value: Datum,
) -> Result<(), ScriptError> {
    match obj {
        Datum::CastLib(cast_num) => {
            let was_file_name = prop == "fileName";
            {
                let cast = player
                    .movie
                    .cast_manager
                    .get_cast_mut(*cast_num)
                    .ok_or_else(|| ScriptError::new(format!("Cast not found: {}", cast_num)))?;
                cast.set_prop(prop, value)?;
            }
            if was_file_name {
                member::preload_cast(player, *cast_num);
            }
            Ok(())
        }
        Datum::Member(member_ref) => member::set_member_prop(player, member_ref, prop, value),
        Datum::Instance(instance_ref) => instance_set_prop(instance_ref, prop, value, false),
        Datum::Sprite(channel) => member::set_sprite_prop(player, *channel, prop, value),
        Datum::Timeout(timeout_name) => {
            member::set_timeout_prop(player, timeout_name, prop, value)
        }
        Datum::Stage => super::stage::set_stage_prop(player, prop, value),
        Datum::PropList(entries) => {
            let key = Datum::Symbol(prop.to_string());
            let mut entries = entries.borrow_mut();
            let position = entries
                .iter()
                .position(|(entry_key, _)| datum_equals(entry_key, &key).unwrap_or(false));
            match position {
                Some(index) => entries[index].1 = value,
                None => entries.push((key, value)),
            }
            Ok(())
        }
        Datum::MovieRef => player.set_movie_prop(prop, value),
        Datum::PlayerRef => match prop {
            "traceScript" => Ok(()),
            _ => player.set_movie_prop(prop, value),
        },
        _ => Err(ScriptError::new(format!(
            "Cannot set property {} of {}",
            prop,
            obj.type_str()
        ))),
    }
}
