//! Event routing. Three shapes, per the event model: sprite events walk
//! one channel's behaviors, frame events walk the frame script then movie
//! scripts, global events do both in that order. `pass` hands the event to
//! the next target in the cascade; an error funnels and the cascade moves
//! on to the sibling target.

use crate::lingo::datum::Datum;

use super::script::{ScriptInstanceRef, find_instance_handler};
use super::{MoviePlayer, ScriptError};

/// Calls `name` on one instance, walking its ancestor chain, with no
/// global fallback on a miss.
pub fn dispatch_event_to_instance_quiet(
    player: &mut MoviePlayer,
    instance_ref: &ScriptInstanceRef,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    let cast_manager = &player.movie.cast_manager;
    let found = find_instance_handler(instance_ref, name, &|member_ref| {
        cast_manager.get_script_by_ref(member_ref)
    });
    match found {
        Some((receiver, handler_ref)) => {
            let result = player.call_handler_ref(Some(receiver), &handler_ref, args.to_vec())?;
            Ok(result.return_value)
        }
        None => Ok(Datum::Void),
    }
}

/// Runs the cascade over a list of instances. Returns whether any handler
/// consumed the event (ran without passing). Per-target errors funnel and
/// the cascade continues with the next target.
pub fn dispatch_event_to_instances(
    player: &mut MoviePlayer,
    instances: &[ScriptInstanceRef],
    name: &str,
    args: &[Datum],
) -> bool {
    for instance_ref in instances {
        let found = {
            let cast_manager = &player.movie.cast_manager;
            find_instance_handler(instance_ref, name, &|member_ref| {
                cast_manager.get_script_by_ref(member_ref)
            })
        };
        let Some((receiver, handler_ref)) = found else {
            continue;
        };
        match player.call_handler_ref(Some(receiver), &handler_ref, args.to_vec()) {
            Ok(result) => {
                if !result.passed {
                    return true;
                }
            }
            Err(err) => {
                // siblings still receive the event
                player.on_script_error(&err);
            }
        }
    }
    false
}

/// Sprite event on one channel: its behaviors in score order, nothing
/// else. Handler errors funnel inside the cascade.
pub fn dispatch_sprite_event(player: &mut MoviePlayer, channel: i16, name: &str, args: &[Datum]) {
    let instances = player
        .movie
        .score
        .get_sprite(channel)
        .map(|sprite| sprite.script_instance_list.clone())
        .unwrap_or_default();
    dispatch_event_to_instances(player, &instances, name, args);
}

/// Frame-and-movie event: the frame script instance first, then each movie
/// script's top-level handler in script id order.
pub fn dispatch_frame_and_movie_event(
    player: &mut MoviePlayer,
    name: &str,
    args: &[Datum],
) -> bool {
    if let Some(instance) = player.movie.score.frame_script_instance.clone() {
        if dispatch_event_to_instances(player, &[instance], name, args) {
            return true;
        }
    }

    let movie_scripts = player.movie.cast_manager.get_movie_scripts();
    for script in movie_scripts {
        let Some(handler) = script.handler_named(name) else {
            continue;
        };
        let handler_ref = (script.member_ref.clone(), handler.name.clone());
        match player.call_handler_ref(None, &handler_ref, args.to_vec()) {
            Ok(result) => {
                if !result.passed {
                    return true;
                }
            }
            Err(err) => player.on_script_error(&err),
        }
    }
    false
}

/// Global event: every channel's behaviors in channel order, then
/// instances parked in globals, then the frame/movie cascade.
pub fn dispatch_global_event(player: &mut MoviePlayer, name: &str, args: &[Datum]) {
    let mut instances = player.movie.score.active_script_instances();
    for global in player.globals.values() {
        if let Datum::Instance(instance_ref) = global {
            if !instances.contains(instance_ref) {
                instances.push(instance_ref.clone());
            }
        }
    }

    if dispatch_event_to_instances(player, &instances, name, args) {
        return;
    }
    dispatch_frame_and_movie_event(player, name, args);
}

/// `sendSprite`: a targeted event that falls through to the frame/movie
/// cascade when no behavior on the channel handles it.
pub fn dispatch_targeted_event(
    player: &mut MoviePlayer,
    channel: i16,
    name: &str,
    args: &[Datum],
) -> bool {
    let instances = player
        .movie
        .score
        .get_sprite(channel)
        .map(|sprite| sprite.script_instance_list.clone())
        .unwrap_or_default();
    if dispatch_event_to_instances(player, &instances, name, args) {
        return true;
    }
    dispatch_frame_and_movie_event(player, name, args)
}
