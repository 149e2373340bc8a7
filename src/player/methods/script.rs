//! Method dispatch for script refs and script instances, including `new`
//! construction and the ancestor walk.

use crate::lingo::datum::{Datum, MemberRef};
use crate::player::script::{ScriptInstanceRef, find_instance_handler};
use crate::player::{MoviePlayer, ScriptError};

/// Constructs an instance and runs its `new` handler when present. The
/// handler's return value wins, so factories can substitute ancestors.
pub fn new_instance_of(
    player: &mut MoviePlayer,
    script_ref: &MemberRef,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    let instance = player.new_instance(script_ref)?;
    let handler_ref = player
        .movie
        .cast_manager
        .find_handler_in_script(script_ref, "new");
    if let Some(handler_ref) = handler_ref {
        let result = player.call_handler_ref(Some(instance.clone()), &handler_ref, args.to_vec())?;
        if !result.return_value.is_void() {
            return Ok(result.return_value);
        }
    }
    Ok(Datum::Instance(instance))
}

pub fn call_script_method(
    player: &mut MoviePlayer,
    script_ref: &MemberRef,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    match name {
        "new" | "rawNew" => new_instance_of(player, script_ref, args),
        _ => {
            let handler_ref = player
                .movie
                .cast_manager
                .find_handler_in_script(script_ref, name)
                .ok_or_else(|| {
                    ScriptError::new(format!("No handler {} in script {:?}", name, script_ref))
                })?;
            let result = player.call_handler_ref(None, &handler_ref, args.to_vec())?;
            Ok(result.return_value)
        }
    }
}

/// Instance dispatch: the script, then the ancestor chain. The quiet path
/// swallows misses; the standard path falls through to a global handler.
pub fn call_instance_method(
    player: &mut MoviePlayer,
    instance_ref: &ScriptInstanceRef,
    name: &str,
    args: &[Datum],
    quiet: bool,
) -> Result<Datum, ScriptError> {
    let found = {
        let cast_manager = &player.movie.cast_manager;
        find_instance_handler(instance_ref, name, &|member_ref| {
            cast_manager.get_script_by_ref(member_ref)
        })
    };
    match found {
        Some((receiver, handler_ref)) => {
            let result = player.call_handler_ref(Some(receiver), &handler_ref, args.to_vec())?;
            Ok(result.return_value)
        }
        None if quiet => Ok(Datum::Void),
        None => {
            let mut full_args = vec![Datum::Instance(instance_ref.clone())];
            full_args.extend_from_slice(args);
            player.call_global_handler(name, &full_args)
        }
    }
}
