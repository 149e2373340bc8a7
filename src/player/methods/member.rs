//! Methods and property access for member refs, cast libraries, sprites,
//! timeouts and the stage object.

use std::cell::RefCell;
use std::rc::Rc;

use crate::lingo::datum::{ColorRef, Datum, MemberRef, datum_bool, new_list};
use crate::player::cast_member::CastMemberType;
use crate::player::font::TextRenderer;
use crate::player::{MoviePlayer, ScriptError};

/// Runs `f` with the player's text renderer detached, so member and
/// renderer borrows never overlap.
fn with_text_renderer<T>(
    player: &mut MoviePlayer,
    f: impl FnOnce(&mut MoviePlayer, &mut dyn TextRenderer) -> T,
) -> T {
    let mut renderer = std::mem::replace(
        &mut player.text_renderer,
        Box::new(crate::player::font::NullTextRenderer),
    );
    let result = f(player, renderer.as_mut());
    player.text_renderer = renderer;
    result
}

pub fn get_member_prop(
    player: &mut MoviePlayer,
    member_ref: &MemberRef,
    prop: &str,
) -> Result<Datum, ScriptError> {
    if prop == "image" {
        return member_image(player, member_ref);
    }
    if prop == "height" {
        // text members answer with their rendered height when they have one
        if let Some(member) = player.movie.cast_manager.find_member(member_ref) {
            if let Some(data) = member.member_type.as_text_data() {
                return Ok(Datum::Int(data.height()));
            }
        }
    }
    match player.movie.cast_manager.find_member(member_ref) {
        Some(member) => member.get_prop(prop),
        // invalid members answer with defaults instead of failing
        None => match prop {
            "name" => Ok(Datum::Str(String::new())),
            "number" => Ok(Datum::Int(-1)),
            "type" => Ok(Datum::Symbol("empty".to_string())),
            _ => Ok(Datum::Void),
        },
    }
}

pub fn set_member_prop(
    player: &mut MoviePlayer,
    member_ref: &MemberRef,
    prop: &str,
    value: Datum,
) -> Result<(), ScriptError> {
    let member = player
        .movie
        .cast_manager
        .find_member_mut(member_ref)
        .ok_or_else(|| ScriptError::new(format!("No member {:?}", member_ref)))?;
    member.set_prop(prop, value)
}

fn member_image(player: &mut MoviePlayer, member_ref: &MemberRef) -> Result<Datum, ScriptError> {
    with_text_renderer(player, |player, renderer| {
        let member = player
            .movie
            .cast_manager
            .find_member_mut(member_ref)
            .ok_or_else(|| ScriptError::new(format!("No member {:?}", member_ref)))?;
        match &mut member.member_type {
            CastMemberType::Bitmap(bitmap) => {
                let image = bitmap
                    .image
                    .clone()
                    .unwrap_or_else(|| crate::player::bitmap::Bitmap::new(0, 0, 32));
                Ok(Datum::Image(Rc::new(RefCell::new(image))))
            }
            CastMemberType::Field(data)
            | CastMemberType::Text(data)
            | CastMemberType::Button(data) => {
                let image = data.image(renderer).clone();
                Ok(Datum::Image(Rc::new(RefCell::new(image))))
            }
            _ => Err(ScriptError::new("Member has no image".to_string())),
        }
    })
}

pub fn call_member_method(
    player: &mut MoviePlayer,
    member_ref: &MemberRef,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    match name {
        "erase" => {
            if let Some(cast) = player.movie.cast_manager.get_cast_mut(member_ref.cast_lib as u32)
            {
                cast.erase_member(member_ref.cast_member as u32);
            }
            Ok(Datum::Void)
        }
        "charPosToLoc" => {
            let char_pos = args
                .first()
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(0);
            with_text_renderer(player, |player, renderer| {
                let member = player
                    .movie
                    .cast_manager
                    .find_member(member_ref)
                    .ok_or_else(|| ScriptError::new(format!("No member {:?}", member_ref)))?;
                let data = member.member_type.as_text_data().ok_or_else(|| {
                    ScriptError::new("charPosToLoc needs a text member".to_string())
                })?;
                let (x, y) = data.char_pos_to_loc(char_pos, renderer);
                Ok(Datum::Point(x, y))
            })
        }
        "duplicate" => Err(ScriptError::new(
            "member duplication is not supported".to_string(),
        )),
        _ => {
            let mut full_args = vec![Datum::Member(member_ref.clone())];
            full_args.extend_from_slice(args);
            player.call_global_handler(name, &full_args)
        }
    }
}

pub fn call_cast_lib_method(
    player: &mut MoviePlayer,
    cast_num: u32,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    match name {
        "getMember" | "member" => {
            let identifier = args
                .first()
                .ok_or_else(|| ScriptError::new("getMember needs an identifier".to_string()))?;
            let cast_datum = Datum::Int(cast_num as i32);
            let member_ref = player
                .movie
                .cast_manager
                .resolve_member_ref(identifier, Some(&cast_datum))?;
            Ok(member_ref.map(Datum::Member).unwrap_or(Datum::Void))
        }
        "findMemberByName" => {
            let member_name = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            let found = player
                .movie
                .cast_manager
                .get_cast_mut(cast_num)
                .and_then(|cast| cast.find_member_by_name(&member_name));
            Ok(found
                .map(|number| {
                    Datum::Member(crate::lingo::datum::member_ref(
                        cast_num as i32,
                        number as i32,
                    ))
                })
                .unwrap_or(Datum::Void))
        }
        "preload" => {
            let ok = preload_cast(player, cast_num);
            Ok(datum_bool(ok))
        }
        _ => Err(ScriptError::new(format!(
            "No method {} on castLib",
            name
        ))),
    }
}

/// External fetch through the injected loader and container parser.
pub fn preload_cast(player: &mut MoviePlayer, cast_num: u32) -> bool {
    let Some(mut parser) = player.container_parser.take() else {
        return false;
    };
    let mut loader = std::mem::replace(&mut player.byte_loader, Box::new(crate::player::net::NullByteLoader));
    let ok = player
        .movie
        .cast_manager
        .preload_cast(cast_num, loader.as_mut(), parser.as_mut());
    player.byte_loader = loader;
    player.container_parser = Some(parser);
    ok
}

pub fn get_sprite_prop(
    player: &mut MoviePlayer,
    channel: i16,
    prop: &str,
) -> Result<Datum, ScriptError> {
    let sprite = player.movie.score.get_sprite(channel);
    match prop {
        "ilk" => Ok(Datum::Symbol("sprite".to_string())),
        "spriteNum" => Ok(Datum::Int(
            sprite.map_or(channel as i32, |s| s.number as i32),
        )),
        "loc" => Ok(sprite.map_or(Datum::Point(0, 0), |s| Datum::Point(s.loc_h, s.loc_v))),
        "locH" => Ok(Datum::Int(sprite.map_or(0, |s| s.loc_h))),
        "locV" => Ok(Datum::Int(sprite.map_or(0, |s| s.loc_v))),
        "locZ" => Ok(Datum::Int(sprite.map_or(0, |s| s.loc_z))),
        "width" => Ok(Datum::Int(sprite.map_or(0, |s| s.width))),
        "height" => Ok(Datum::Int(sprite.map_or(0, |s| s.height))),
        "rect" => Ok(sprite.map_or(Datum::Rect(0, 0, 0, 0), |s| {
            let (l, t, r, b) = s.bounds();
            Datum::Rect(l, t, r, b)
        })),
        "left" => Ok(Datum::Int(sprite.map_or(0, |s| s.bounds().0))),
        "top" => Ok(Datum::Int(sprite.map_or(0, |s| s.bounds().1))),
        "right" => Ok(Datum::Int(sprite.map_or(0, |s| s.bounds().2))),
        "bottom" => Ok(Datum::Int(sprite.map_or(0, |s| s.bounds().3))),
        "ink" => Ok(Datum::Int(sprite.map_or(0, |s| s.ink))),
        "blend" => Ok(Datum::Int(sprite.map_or(100, |s| s.blend))),
        "visible" => Ok(datum_bool(sprite.map_or(true, |s| s.visible))),
        "puppet" => Ok(datum_bool(sprite.map_or(false, |s| s.puppet))),
        "foreColor" => Ok(Datum::Int(sprite.map_or(255, |s| s.fore_color))),
        "backColor" => Ok(Datum::Int(sprite.map_or(0, |s| s.back_color))),
        "color" => Ok(Datum::Color(
            sprite.map_or(ColorRef::Rgb(0, 0, 0), |s| s.color.clone()),
        )),
        "bgColor" => Ok(Datum::Color(
            sprite.map_or(ColorRef::Rgb(255, 255, 255), |s| s.bg_color.clone()),
        )),
        "flipH" => Ok(datum_bool(sprite.map_or(false, |s| s.flip_h))),
        "flipV" => Ok(datum_bool(sprite.map_or(false, |s| s.flip_v))),
        "rotation" => Ok(Datum::Float(sprite.map_or(0.0, |s| s.rotation))),
        "skew" => Ok(Datum::Float(sprite.map_or(0.0, |s| s.skew))),
        "stretch" => Ok(Datum::Int(sprite.map_or(0, |s| s.stretch))),
        "editable" => Ok(datum_bool(sprite.map_or(false, |s| s.editable))),
        "cursor" => Ok(Datum::Int(sprite.map_or(0, |s| s.cursor))),
        "member" => Ok(sprite
            .and_then(|s| s.member.clone())
            .map(Datum::Member)
            .unwrap_or(Datum::Member(crate::lingo::datum::NULL_MEMBER_REF))),
        "memberNum" => Ok(Datum::Int(
            sprite
                .and_then(|s| s.member.as_ref())
                .map(|m| m.cast_member)
                .unwrap_or(0),
        )),
        "castNum" => Ok(Datum::Int(
            sprite
                .and_then(|s| s.member.as_ref())
                .map(|m| m.slot_number())
                .unwrap_or(0),
        )),
        "scriptNum" => Ok(Datum::Int(
            sprite
                .and_then(|s| s.script_instance_list.first())
                .map(|instance| instance.borrow().script.cast_member)
                .unwrap_or(0),
        )),
        "scriptInstanceList" => Ok(new_list(
            sprite
                .map(|s| {
                    s.script_instance_list
                        .iter()
                        .map(|instance| Datum::Instance(instance.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        )),
        _ => Err(ScriptError::new(format!(
            "Cannot get sprite property {}",
            prop
        ))),
    }
}

pub fn set_sprite_prop(
    player: &mut MoviePlayer,
    channel: i16,
    prop: &str,
    value: Datum,
) -> Result<(), ScriptError> {
    // member assignment may need a cast lookup before the sprite borrow
    let member_ref = if prop == "member" || prop == "memberNum" || prop == "castNum" {
        resolve_member_assignment(player, channel, prop, &value)?
    } else {
        None
    };

    let Some(sprite) = player.movie.score.ensure_channel(channel) else {
        return Err(ScriptError::new(format!("No sprite channel {}", channel)));
    };
    match prop {
        "loc" => {
            let (x, y) = value.to_point()?;
            sprite.loc_h = x;
            sprite.loc_v = y;
        }
        "locH" => sprite.loc_h = value.int_value()?,
        "locV" => sprite.loc_v = value.int_value()?,
        "locZ" => sprite.loc_z = value.int_value()?,
        "width" => sprite.width = value.int_value()?,
        "height" => sprite.height = value.int_value()?,
        "rect" => {
            let (l, t, r, b) = value.to_rect()?;
            sprite.loc_h = l;
            sprite.loc_v = t;
            sprite.width = r - l;
            sprite.height = b - t;
        }
        "ink" => sprite.ink = value.int_value()?,
        "blend" => sprite.blend = value.int_value()?,
        "visible" => sprite.visible = value.bool_value()?,
        "puppet" => sprite.puppet = value.bool_value()?,
        "foreColor" => sprite.fore_color = value.int_value()?,
        "backColor" => sprite.back_color = value.int_value()?,
        "color" => sprite.color = value.to_color_ref()?,
        "bgColor" => sprite.bg_color = value.to_color_ref()?,
        "flipH" => sprite.flip_h = value.bool_value()?,
        "flipV" => sprite.flip_v = value.bool_value()?,
        "rotation" => sprite.rotation = value.float_value()?,
        "skew" => sprite.skew = value.float_value()?,
        "stretch" => sprite.stretch = value.int_value()?,
        "editable" => sprite.editable = value.bool_value()?,
        "cursor" => sprite.cursor = value.int_value()?,
        "member" | "memberNum" | "castNum" => sprite.member = member_ref,
        "scriptInstanceList" => {
            let mut instances = vec![];
            for item in value.to_list()?.borrow().iter() {
                instances.push(item.to_instance_ref()?);
            }
            sprite.script_instance_list = instances;
        }
        _ => {
            return Err(ScriptError::new(format!(
                "Cannot set sprite property {}",
                prop
            )));
        }
    }
    sprite.publish_snapshot();

    if prop == "scriptInstanceList" {
        let instances = player
            .movie
            .score
            .get_sprite(channel)
            .map(|s| s.script_instance_list.clone())
            .unwrap_or_default();
        for instance in instances {
            let _ = crate::player::script::instance_set_prop(
                &instance,
                "spriteNum",
                Datum::Int(channel as i32),
                false,
            );
        }
    }
    Ok(())
}

fn resolve_member_assignment(
    player: &mut MoviePlayer,
    channel: i16,
    prop: &str,
    value: &Datum,
) -> Result<Option<MemberRef>, ScriptError> {
    match value {
        Datum::Member(member_ref) => Ok(Some(member_ref.clone())),
        Datum::Void => Ok(None),
        other if other.is_string() => Ok(player
            .movie
            .cast_manager
            .find_member_ref_by_name(&other.string_value()?)),
        other if other.is_number() => {
            let number = other.int_value()?;
            if prop == "memberNum" {
                let current_lib = player
                    .movie
                    .score
                    .get_sprite(channel)
                    .and_then(|s| s.member.as_ref())
                    .map(|m| m.cast_lib)
                    .unwrap_or(1);
                Ok(Some(crate::lingo::datum::member_ref(current_lib, number)))
            } else {
                Ok(player.movie.cast_manager.find_member_ref_by_slot(number))
            }
        }
        _ => Ok(None),
    }
}

pub fn call_sprite_method(
    player: &mut MoviePlayer,
    channel: i16,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    match name {
        "intersects" => {
            let other = args
                .first()
                .ok_or_else(|| ScriptError::new("intersects needs a sprite".to_string()))?
                .to_sprite_num()?;
            let result = match (
                player.movie.score.get_sprite(channel),
                player.movie.score.get_sprite(other),
            ) {
                (Some(a), Some(b)) => a.intersects(b),
                _ => false,
            };
            Ok(datum_bool(result))
        }
        "within" => {
            let other = args
                .first()
                .ok_or_else(|| ScriptError::new("within needs a sprite".to_string()))?
                .to_sprite_num()?;
            let result = match (
                player.movie.score.get_sprite(channel),
                player.movie.score.get_sprite(other),
            ) {
                (Some(a), Some(b)) => a.within(b),
                _ => false,
            };
            Ok(datum_bool(result))
        }
        _ => {
            // behaviors on the sprite get the first chance at the call
            let instances = player
                .movie
                .score
                .get_sprite(channel)
                .map(|s| s.script_instance_list.clone())
                .unwrap_or_default();
            for instance in instances {
                let found = {
                    let cast_manager = &player.movie.cast_manager;
                    crate::player::script::find_instance_handler(&instance, name, &|member_ref| {
                        cast_manager.get_script_by_ref(member_ref)
                    })
                };
                if let Some((receiver, handler_ref)) = found {
                    let result =
                        player.call_handler_ref(Some(receiver), &handler_ref, args.to_vec())?;
                    return Ok(result.return_value);
                }
            }
            Ok(Datum::Void)
        }
    }
}

pub fn call_timeout_method(
    player: &mut MoviePlayer,
    timeout_name: String,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    match name {
        "new" => {
            let period = args
                .first()
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(0)
                .max(0) as u32;
            let handler = match args.get(1) {
                Some(Datum::Symbol(s)) => s.clone(),
                Some(other) => other.string_value()?,
                None => return Err(ScriptError::new("timeout new needs a handler".to_string())),
            };
            let target = args.get(2).cloned();
            let now = player.now_ms();
            player
                .timeout_manager
                .create(&timeout_name, period, &handler, target, now);
            Ok(Datum::Timeout(timeout_name))
        }
        "forget" => {
            player.timeout_manager.forget(&timeout_name);
            Ok(Datum::Void)
        }
        _ => Err(ScriptError::new(format!(
            "No method {} on timeout",
            name
        ))),
    }
}

pub fn get_timeout_prop(
    player: &mut MoviePlayer,
    timeout_name: &str,
    prop: &str,
) -> Result<Datum, ScriptError> {
    let timeout = player.timeout_manager.get(timeout_name);
    match prop {
        "name" => Ok(Datum::Str(timeout_name.to_string())),
        "period" => Ok(Datum::Int(timeout.map_or(0, |t| t.period_ms as i32))),
        "time" => Ok(Datum::Int(timeout.map_or(0, |t| {
            (t.last_fired + t.period_ms as u64) as i32
        }))),
        "target" => Ok(timeout
            .and_then(|t| t.target.clone())
            .unwrap_or(Datum::Void)),
        "handler" => Ok(Datum::Symbol(
            timeout.map_or(String::new(), |t| t.handler.clone()),
        )),
        _ => Err(ScriptError::new(format!(
            "No timeout property {}",
            prop
        ))),
    }
}

pub fn set_timeout_prop(
    player: &mut MoviePlayer,
    timeout_name: &str,
    prop: &str,
    value: Datum,
) -> Result<(), ScriptError> {
    let Some(timeout) = player.timeout_manager.get_mut(timeout_name) else {
        return Err(ScriptError::new(format!("No timeout {}", timeout_name)));
    };
    match prop {
        "period" => {
            timeout.period_ms = value.int_value()?.max(0) as u32;
            Ok(())
        }
        "target" => {
            timeout.target = Some(value);
            Ok(())
        }
        "handler" => {
            timeout.handler = value.symbol_value().or_else(|_| value.string_value())?;
            Ok(())
        }
        _ => Err(ScriptError::new(format!(
            "Cannot set timeout property {}",
            prop
        ))),
    }
}

pub fn call_stage_method(
    _player: &mut MoviePlayer,
    name: &str,
    _args: &[Datum],
) -> Result<Datum, ScriptError> {
    match name {
        // window ordering belongs to the host shell
        "moveToFront" | "moveToBack" | "close" | "forget" => Ok(Datum::Void),
        _ => Err(ScriptError::new(format!("No method {} on stage", name))),
    }
}
