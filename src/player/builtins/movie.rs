use crate::lingo::datum::{Datum, datum_bool};
use crate::lingo::format::format_datum_for_put;
use crate::player::cast_lib::CastLoadState;
use crate::player::cast_member::{CastMemberType, TextData};
use crate::player::events::dispatch_targeted_event;
use crate::player::methods::{member as member_methods, script as script_methods};
use crate::player::{MoviePlayer, ScriptError};

pub fn call(player: &mut MoviePlayer, name: &str, args: &[Datum]) -> Result<Datum, ScriptError> {
    match name {
        "go" => {
            let Some(target) = args.first() else {
                return Ok(Datum::Void);
            };
            if target.is_number() {
                player.go_to_frame(target.int_value()?);
            } else if target.is_string() {
                player.go_to_label(&target.string_value()?);
            } else if let Datum::Symbol(label) = target {
                match label.to_ascii_lowercase().as_str() {
                    "next" => {
                        let frame = player.movie.current_frame as i32 + 1;
                        player.go_to_frame(frame);
                    }
                    "previous" => {
                        let frame = player.movie.current_frame as i32 - 1;
                        player.go_to_frame(frame);
                    }
                    "loop" => {
                        player.go_to_frame(player.movie.current_frame as i32);
                    }
                    other => player.go_to_label(other),
                }
            }
            Ok(Datum::Void)
        }
        "gotoframe" => {
            if let Some(target) = args.first() {
                player.go_to_frame(target.int_value()?);
            }
            Ok(Datum::Void)
        }
        "gotomovie" => {
            // multi-movie playback is out of scope; surface to the host
            player.trace.on_debug_message("gotoMovie ignored");
            Ok(Datum::Void)
        }
        "marker" => {
            // marker(0) is the label at or before the current frame;
            // marker(n) walks n labels forward, marker(-n) backward
            let offset = args
                .first()
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(0);
            let current = player.movie.current_frame as i32;
            let mut frames: Vec<i32> = player
                .movie
                .score
                .frame_labels
                .iter()
                .map(|label| label.frame_num)
                .collect();
            frames.sort_unstable();
            let at_or_before = frames.iter().rposition(|&f| f <= current);
            let index = match at_or_before {
                Some(i) => i as i32 + offset,
                None => offset - 1,
            };
            let frame = frames
                .get(index.max(0) as usize)
                .copied()
                .unwrap_or(current);
            Ok(Datum::Int(frame))
        }
        "label" => {
            let label_name = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            Ok(Datum::Int(
                player
                    .movie
                    .score
                    .label_to_frame(&label_name)
                    .map(|f| f as i32)
                    .unwrap_or(0),
            ))
        }
        "updatestage" => {
            for channel in &player.movie.score.channels {
                channel.sprite.publish_snapshot();
            }
            Ok(Datum::Void)
        }
        "halt" => {
            player.is_playing = false;
            Ok(Datum::Void)
        }
        "pass" => {
            if let Some(scope_ref) = player.current_scope_ref() {
                player.scope_mut(scope_ref).passed = true;
            }
            Ok(Datum::Void)
        }
        "nothing" => Ok(Datum::Void),
        "delay" => {
            // the scheduler owns pacing; a scripted delay is advisory
            Ok(Datum::Void)
        }
        "puppetsprite" => {
            let channel = args
                .first()
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(0) as i16;
            let puppeted = args
                .get(1)
                .map(|d| d.bool_value())
                .transpose()?
                .unwrap_or(true);
            if let Some(sprite) = player.movie.score.ensure_channel(channel) {
                sprite.puppet = puppeted;
            }
            Ok(Datum::Void)
        }
        "puppettempo" => {
            if let Some(tempo) = args.first() {
                player.movie.puppet_tempo = tempo.int_value()?.max(0) as u32;
            }
            Ok(Datum::Void)
        }
        "sendsprite" => {
            let channel = args
                .first()
                .map(|d| d.to_sprite_num())
                .transpose()?
                .unwrap_or(0);
            let event = args
                .get(1)
                .map(|d| d.symbol_value().or_else(|_| d.string_value()))
                .transpose()?
                .ok_or_else(|| ScriptError::new("sendSprite needs an event".to_string()))?;
            let handled = dispatch_targeted_event(player, channel, &event, &args[2..]);
            Ok(datum_bool(handled))
        }
        "sendallsprites" => {
            let event = args
                .first()
                .map(|d| d.symbol_value().or_else(|_| d.string_value()))
                .transpose()?
                .ok_or_else(|| ScriptError::new("sendAllSprites needs an event".to_string()))?;
            let channel_count = player.movie.score.channel_count() as i16;
            for channel in 1..=channel_count {
                dispatch_targeted_event(player, channel, &event, &args[1..]);
            }
            Ok(Datum::Void)
        }
        "rollover" => {
            let (x, y) = player.mouse_loc;
            let hit = player
                .movie
                .score
                .get_sorted_channels()
                .iter()
                .rev()
                .find(|channel| {
                    let (l, t, r, b) = channel.sprite.bounds();
                    x >= l && x < r && y >= t && y < b
                })
                .map(|channel| channel.number as i32)
                .unwrap_or(0);
            Ok(Datum::Int(hit))
        }
        "timeout" => {
            let timeout_name = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            Ok(Datum::Timeout(timeout_name))
        }
        "put" | "trace" => {
            let parts: Vec<String> = args
                .iter()
                .map(|arg| format_datum_for_put(arg, player.float_precision))
                .collect();
            player.trace.on_debug_message(&parts.join(" "));
            Ok(Datum::Void)
        }
        "alert" => {
            let message = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            player.trace.on_debug_message(&format!("alert: {}", message));
            Ok(Datum::Void)
        }
        "cursor" | "beep" => Ok(Datum::Void),

        "preloadnetthing" | "preloadcast" => {
            // resolve the url against the cast list and fetch synchronously
            let url = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            let cast_number = player
                .movie
                .cast_manager
                .casts
                .iter()
                .find(|cast| {
                    cast.file_name.eq_ignore_ascii_case(&url)
                        || cast.name.eq_ignore_ascii_case(&url)
                        || cast.file_name.to_lowercase().contains(&url.to_lowercase())
                })
                .map(|cast| cast.number);
            if let Some(cast_number) = cast_number {
                member_methods::preload_cast(player, cast_number);
            }
            Ok(Datum::Int(1))
        }
        "netdone" => Ok(Datum::Int(1)),
        "neterror" => Ok(Datum::Str("OK".to_string())),
        "mediaready" => {
            let identifier = args.first();
            let ready = match identifier {
                Some(datum) if datum.is_number() => player
                    .movie
                    .cast_manager
                    .get_cast_or_null(datum.int_value()? as u32)
                    .map(|cast| cast.state == CastLoadState::Loaded)
                    .unwrap_or(false),
                Some(datum) if datum.is_string() => player
                    .movie
                    .cast_manager
                    .get_cast_by_name(&datum.string_value()?)
                    .map(|cast| cast.state == CastLoadState::Loaded)
                    .unwrap_or(false),
                _ => true,
            };
            Ok(datum_bool(ready))
        }

        "script" => {
            let identifier = args
                .first()
                .ok_or_else(|| ScriptError::new("script() needs an identifier".to_string()))?;
            let script_ref = if identifier.is_string() {
                player
                    .movie
                    .cast_manager
                    .find_member_ref_by_name(&identifier.string_value()?)
            } else {
                player
                    .movie
                    .cast_manager
                    .find_member_ref_by_slot(identifier.int_value()?)
            };
            script_ref
                .map(Datum::Script)
                .ok_or_else(|| ScriptError::new("Script member not found".to_string()))
        }
        "member" => {
            let identifier = args
                .first()
                .ok_or_else(|| ScriptError::new("member() needs an identifier".to_string()))?;
            let found = player
                .movie
                .cast_manager
                .resolve_member_ref(identifier, args.get(1))?;
            Ok(found
                .map(Datum::Member)
                .unwrap_or(Datum::Member(crate::lingo::datum::INVALID_MEMBER_REF)))
        }
        "castlib" => {
            let identifier = args
                .first()
                .ok_or_else(|| ScriptError::new("castLib() needs an identifier".to_string()))?;
            let number = if identifier.is_string() {
                player
                    .movie
                    .cast_manager
                    .get_cast_number_by_name(&identifier.string_value()?)
            } else {
                Some(identifier.int_value()? as u32)
            };
            number
                .map(|n| Datum::CastLib(n))
                .ok_or_else(|| ScriptError::new("Cast library not found".to_string()))
        }
        "sprite" => {
            let channel = args
                .first()
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(0);
            Ok(Datum::Sprite(channel as i16))
        }
        "sound" => {
            let channel = args
                .first()
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(1);
            Ok(Datum::SoundRef((channel.max(1) - 1) as u16))
        }
        "new" => new_builtin(player, args),
        "call" => {
            let handler = args
                .first()
                .map(|d| d.symbol_value().or_else(|_| d.string_value()))
                .transpose()?
                .ok_or_else(|| ScriptError::new("call needs a handler".to_string()))?;
            let obj = args
                .get(1)
                .ok_or_else(|| ScriptError::new("call needs a receiver".to_string()))?;
            crate::player::methods::call_datum_method(player, obj, &handler, &args[2..])
        }
        "callancestor" => {
            let handler = args
                .first()
                .map(|d| d.symbol_value().or_else(|_| d.string_value()))
                .transpose()?
                .ok_or_else(|| ScriptError::new("callAncestor needs a handler".to_string()))?;
            let instance = args
                .get(1)
                .ok_or_else(|| ScriptError::new("callAncestor needs a receiver".to_string()))?
                .to_instance_ref()?;
            let ancestor = instance.borrow().ancestor.clone();
            match ancestor {
                Some(ancestor) => crate::player::methods::script::call_instance_method(
                    player,
                    &ancestor,
                    &handler,
                    &args[2..],
                    true,
                ),
                None => Ok(Datum::Void),
            }
        }
        _ => Err(ScriptError::new(format!("Unknown builtin {}", name))),
    }
}

/// `new(script "Foo", ...)` and `new(#bitmap, castLib 1)`: script
/// instantiation or dynamic member creation.
fn new_builtin(player: &mut MoviePlayer, args: &[Datum]) -> Result<Datum, ScriptError> {
    let Some(target) = args.first() else {
        return Err(ScriptError::new("new() needs a target".to_string()));
    };
    match target {
        Datum::Script(script_ref) => {
            script_methods::new_instance_of(player, &script_ref.clone(), &args[1..])
        }
        Datum::Member(script_ref) => {
            script_methods::new_instance_of(player, &script_ref.clone(), &args[1..])
        }
        Datum::Symbol(member_type) => {
            let cast_number = match args.get(1) {
                Some(Datum::CastLib(n)) => *n,
                Some(other) if other.is_number() => other.int_value()? as u32,
                _ => 1,
            };
            let member_type = match member_type.to_ascii_lowercase().as_str() {
                "bitmap" => CastMemberType::Bitmap(crate::player::cast_member::BitmapMember {
                    info: Default::default(),
                    image: Some(crate::player::bitmap::Bitmap::new(0, 0, 32)),
                    reg_point: (0, 0),
                }),
                "field" => CastMemberType::Field(TextData::new(String::new())),
                "text" => CastMemberType::Text(TextData::new(String::new())),
                "button" => CastMemberType::Button(TextData::new(String::new())),
                other => {
                    return Err(ScriptError::new(format!(
                        "Cannot create member of type #{}",
                        other
                    )));
                }
            };
            let cast = player
                .movie
                .cast_manager
                .get_cast_mut(cast_number)
                .ok_or_else(|| ScriptError::new(format!("Cast not found: {}", cast_number)))?;
            let created = cast.create_member(None, member_type)?;
            Ok(Datum::Member(created))
        }
        other if other.is_string() => {
            let script_ref = player
                .movie
                .cast_manager
                .find_member_ref_by_name(&other.string_value()?)
                .ok_or_else(|| ScriptError::new("Script member not found".to_string()))?;
            script_methods::new_instance_of(player, &script_ref, &args[1..])
        }
        _ => Err(ScriptError::new(format!(
            "Cannot instantiate {}",
            target.type_str()
        ))),
    }
}
