use crate::lingo::datum::{Datum, StringChunkSpan, StringChunkType, datum_bool};
use crate::lingo::format::format_datum;
use crate::player::methods::string as string_methods;
use crate::player::{MoviePlayer, OpResult, ScriptError};

use super::dispatch::HandlerCtx;
use super::var_access::{PutKind, read_var_slot, resolve_var_value, write_var_slot};

/// Concatenation coerces the way the message window prints, minus quotes.
fn concat_value(player: &MoviePlayer, datum: &Datum) -> Result<String, ScriptError> {
    match datum {
        Datum::Str(s) => Ok(s.clone()),
        Datum::StringChunk(..) => datum.string_value(),
        Datum::Int(n) => Ok(n.to_string()),
        Datum::Float(f) => Ok(crate::lingo::format::format_float(*f, player.float_precision)),
        Datum::Symbol(s) => Ok(s.clone()),
        Datum::Void => Ok(String::new()),
        other => Ok(format_datum(other, player.float_precision)),
    }
}

pub fn join_str(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let right = scope.pop();
    let left = scope.pop();
    let joined = format!(
        "{}{}",
        concat_value(player, &left)?,
        concat_value(player, &right)?
    );
    player.scope_mut(ctx.scope_ref).push(Datum::Str(joined));
    Ok(OpResult::Advance)
}

/// Padded concatenation inserts exactly one space.
pub fn join_pad_str(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let right = scope.pop();
    let left = scope.pop();
    let joined = format!(
        "{} {}",
        concat_value(player, &left)?,
        concat_value(player, &right)?
    );
    player.scope_mut(ctx.scope_ref).push(Datum::Str(joined));
    Ok(OpResult::Advance)
}

/// `contains` is case-insensitive; lists test their string elements.
pub fn contains_str(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let needle = scope.pop().string_value()?.to_lowercase();
    let haystack = scope.pop();

    let contains = match &haystack {
        Datum::List(items) => items.borrow().iter().any(|item| {
            item.string_value()
                .map(|s| s.to_lowercase().contains(&needle))
                .unwrap_or(false)
        }),
        other if other.is_string() => other.string_value()?.to_lowercase().contains(&needle),
        Datum::Symbol(_) | Datum::Int(_) | Datum::Float(_) => false,
        _ => {
            return Err(ScriptError::new(
                "contains needs a string or list subject".to_string(),
            ));
        }
    };
    player.scope_mut(ctx.scope_ref).push(datum_bool(contains));
    Ok(OpResult::Advance)
}

/// `starts`: prefix test, case-insensitive like `contains`.
pub fn contains_0str(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let needle = scope.pop();
    let haystack = scope.pop();
    let result = if haystack.is_void() {
        false
    } else {
        haystack
            .string_value()?
            .to_lowercase()
            .starts_with(&needle.string_value()?.to_lowercase())
    };
    player.scope_mut(ctx.scope_ref).push(datum_bool(result));
    Ok(OpResult::Advance)
}

/// The chunk-range operand block: four (first, last) pairs, one per chunk
/// kind, only one of which is set.
fn pop_chunk_span(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
) -> Result<StringChunkSpan, ScriptError> {
    let scope = player.scope_mut(ctx.scope_ref);
    let last_line = scope.pop().int_value()?;
    let first_line = scope.pop().int_value()?;
    let last_item = scope.pop().int_value()?;
    let first_item = scope.pop().int_value()?;
    let last_word = scope.pop().int_value()?;
    let first_word = scope.pop().int_value()?;
    let last_char = scope.pop().int_value()?;
    let first_char = scope.pop().int_value()?;

    let item_delimiter = player.movie.item_delimiter.clone();
    let (chunk_type, start, end) = if first_line != 0 || last_line != 0 {
        (StringChunkType::Line, first_line, last_line)
    } else if first_item != 0 || last_item != 0 {
        (StringChunkType::Item, first_item, last_item)
    } else if first_word != 0 || last_word != 0 {
        (StringChunkType::Word, first_word, last_word)
    } else if first_char != 0 || last_char != 0 {
        (StringChunkType::Char, first_char, last_char)
    } else {
        return Err(ScriptError::new("Empty chunk range".to_string()));
    };
    Ok(StringChunkSpan {
        chunk_type,
        start,
        end,
        item_delimiter,
    })
}

pub fn get_chunk(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let source = player.scope_mut(ctx.scope_ref).pop();
    let span = pop_chunk_span(player, ctx)?;
    let text = source.string_value()?;
    let resolved = string_methods::resolve_span(&text, &span);
    player.scope_mut(ctx.scope_ref).push(Datum::Str(resolved));
    Ok(OpResult::Advance)
}

/// `put value into <var>` and friends; the operand packs put kind and
/// slot kind into nibbles.
pub fn put(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let operand = ctx.operand(player);
    let put_kind = PutKind::from_raw(((operand >> 4) & 0xf) as u8)?;
    let var_type = (operand & 0xf) as u32;
    let slot = read_var_slot(player, ctx, var_type)?;
    let value = player.scope_mut(ctx.scope_ref).pop();
    write_var_slot(player, ctx, &slot, value, put_kind)
        .map(|_| OpResult::Advance)
}

/// `put value into word 2 of <var>`: resolve, splice, write back.
pub fn put_chunk(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let operand = ctx.operand(player);
    let put_kind = PutKind::from_raw(((operand >> 4) & 0xf) as u8)?;
    let var_type = (operand & 0xf) as u32;
    let value = player.scope_mut(ctx.scope_ref).pop();
    let slot = read_var_slot(player, ctx, var_type)?;
    let span = pop_chunk_span(player, ctx)?;

    let current = resolve_var_value(player, ctx, &slot)?
        .string_value()
        .unwrap_or_default();
    let incoming = value.string_value()?;
    let replacement = match put_kind {
        PutKind::Into => incoming,
        PutKind::Before => format!(
            "{}{}",
            incoming,
            string_methods::resolve_span(&current, &span)
        ),
        PutKind::After => format!(
            "{}{}",
            string_methods::resolve_span(&current, &span),
            incoming
        ),
    };
    let updated = string_methods::replace_span(&current, &span, &replacement);
    write_var_slot(player, ctx, &slot, Datum::Str(updated), PutKind::Into)
        .map(|_| OpResult::Advance)
}

pub fn delete_chunk(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let var_type = ctx.operand(player) as u32;
    let slot = read_var_slot(player, ctx, var_type)?;
    let span = pop_chunk_span(player, ctx)?;
    let current = resolve_var_value(player, ctx, &slot)?
        .string_value()
        .unwrap_or_default();
    let updated = string_methods::delete_span(&current, &span);
    write_var_slot(player, ctx, &slot, Datum::Str(updated), PutKind::Into)
        .map(|_| OpResult::Advance)
}

pub fn get_field(player: &mut MoviePlayer, ctx: &HandlerCtx) -> Result<OpResult, ScriptError> {
    let cast_id = if player.movie.dir_version >= 500 {
        Some(player.scope_mut(ctx.scope_ref).pop())
    } else {
        None
    };
    let field_id = player.scope_mut(ctx.scope_ref).pop();
    let member_ref = player
        .movie
        .cast_manager
        .resolve_member_ref(&field_id, cast_id.as_ref())?
        .ok_or_else(|| ScriptError::new("Field member not found".to_string()))?;
    let text = player.movie.cast_manager.field_text(&member_ref)?;
    player.scope_mut(ctx.scope_ref).push(Datum::Str(text));
    Ok(OpResult::Advance)
}
