use crate::lingo::datum::{
    Datum, StringChunkSource, StringChunkSpan, StringChunkType, datum_bool, new_list,
};
use crate::player::{MoviePlayer, ScriptError};

/// Splits `text` into chunks of the given kind. Words collapse whitespace;
/// items and lines keep empty chunks, matching chunk-expression counting.
pub fn split_chunks(text: &str, chunk_type: StringChunkType, delimiter: &str) -> Vec<String> {
    match chunk_type {
        StringChunkType::Char => text.chars().map(|c| c.to_string()).collect(),
        StringChunkType::Word => text.split_whitespace().map(|w| w.to_string()).collect(),
        StringChunkType::Line => text.split('\r').map(|l| l.to_string()).collect(),
        StringChunkType::Item => {
            let delimiter = if delimiter.is_empty() { "," } else { delimiter };
            text.split(delimiter).map(|i| i.to_string()).collect()
        }
    }
}

fn join_str(chunk_type: StringChunkType, delimiter: &str) -> String {
    match chunk_type {
        StringChunkType::Char => String::new(),
        StringChunkType::Word => " ".to_string(),
        StringChunkType::Line => "\r".to_string(),
        StringChunkType::Item => {
            if delimiter.is_empty() {
                ",".to_string()
            } else {
                delimiter.to_string()
            }
        }
    }
}

/// Normalizes a 1-based inclusive span against a chunk count. `end == 0`
/// means a single chunk.
fn clamp_span(span: &StringChunkSpan, count: usize) -> Option<(usize, usize)> {
    if span.start < 1 {
        return None;
    }
    let start = span.start as usize;
    let end = if span.end <= 0 {
        start
    } else {
        (span.end as usize).max(start)
    };
    if start > count {
        return None;
    }
    Some((start - 1, end.min(count) - 1))
}

pub fn resolve_span(text: &str, span: &StringChunkSpan) -> String {
    let chunks = split_chunks(text, span.chunk_type, &span.item_delimiter);
    match clamp_span(span, chunks.len()) {
        Some((start, end)) => chunks[start..=end].join(&join_str(span.chunk_type, &span.item_delimiter)),
        None => String::new(),
    }
}

pub fn count_chunks(text: &str, chunk_type: StringChunkType, delimiter: &str) -> usize {
    split_chunks(text, chunk_type, delimiter).len()
}

pub fn last_chunk(text: &str, chunk_type: StringChunkType, delimiter: &str) -> String {
    split_chunks(text, chunk_type, delimiter)
        .last()
        .cloned()
        .unwrap_or_default()
}

/// Replaces the span with `replacement`, rebuilding from chunk pieces.
pub fn replace_span(text: &str, span: &StringChunkSpan, replacement: &str) -> String {
    let mut chunks = split_chunks(text, span.chunk_type, &span.item_delimiter);
    let joiner = join_str(span.chunk_type, &span.item_delimiter);
    match clamp_span(span, chunks.len()) {
        Some((start, end)) => {
            chunks.splice(start..=end, [replacement.to_string()]);
            chunks.join(&joiner)
        }
        None => {
            // writing past the end pads with empty chunks first
            if span.start >= 1 {
                while chunks.len() < span.start as usize - 1 {
                    chunks.push(String::new());
                }
                chunks.push(replacement.to_string());
                chunks.join(&joiner)
            } else {
                text.to_string()
            }
        }
    }
}

pub fn delete_span(text: &str, span: &StringChunkSpan) -> String {
    let mut chunks = split_chunks(text, span.chunk_type, &span.item_delimiter);
    let joiner = join_str(span.chunk_type, &span.item_delimiter);
    match clamp_span(span, chunks.len()) {
        Some((start, end)) => {
            chunks.drain(start..=end);
            chunks.join(&joiner)
        }
        None => text.to_string(),
    }
}

/// String receivers answer chunk counting, chunk refs and splitting.
pub fn call_method(
    player: &mut MoviePlayer,
    obj: &Datum,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    let text = obj.string_value()?;
    let delimiter = player.movie.item_delimiter.clone();
    match name {
        "count" => {
            let chunk_type = chunk_type_arg(args.first())?;
            Ok(Datum::Int(count_chunks(&text, chunk_type, &delimiter) as i32))
        }
        "getPropRef" => {
            let chunk_type = chunk_type_arg(args.first())?;
            let start = args
                .get(1)
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(1);
            let end = args.get(2).map(|d| d.int_value()).transpose()?.unwrap_or(0);
            let span = StringChunkSpan {
                chunk_type,
                start,
                end,
                item_delimiter: delimiter,
            };
            let resolved = resolve_span(&text, &span);
            Ok(Datum::StringChunk(
                StringChunkSource::Value,
                span,
                resolved,
            ))
        }
        "getProp" | "getAt" => {
            let chunk_type = chunk_type_arg(args.first())?;
            let start = args
                .get(1)
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(1);
            let end = args.get(2).map(|d| d.int_value()).transpose()?.unwrap_or(0);
            let span = StringChunkSpan {
                chunk_type,
                start,
                end,
                item_delimiter: delimiter,
            };
            Ok(Datum::Str(resolve_span(&text, &span)))
        }
        "split" => {
            let separator = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_else(|| ",".to_string());
            let parts = text
                .split(separator.as_str())
                .map(|part| Datum::Str(part.to_string()))
                .collect();
            Ok(new_list(parts))
        }
        "contains" => {
            let needle = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            Ok(datum_bool(
                text.to_lowercase().contains(&needle.to_lowercase()),
            ))
        }
        "char" | "word" | "line" | "item" => {
            let chunk_type = StringChunkType::from_symbol(name).unwrap();
            let start = args
                .first()
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(1);
            let end = args.get(1).map(|d| d.int_value()).transpose()?.unwrap_or(0);
            let span = StringChunkSpan {
                chunk_type,
                start,
                end,
                item_delimiter: delimiter,
            };
            Ok(Datum::Str(resolve_span(&text, &span)))
        }
        _ => Err(ScriptError::new(format!(
            "No method {} on string",
            name
        ))),
    }
}

fn chunk_type_arg(arg: Option<&Datum>) -> Result<StringChunkType, ScriptError> {
    let symbol = arg
        .ok_or_else(|| ScriptError::new("Missing chunk type argument".to_string()))?
        .symbol_value()?;
    StringChunkType::from_symbol(&symbol)
        .ok_or_else(|| ScriptError::new(format!("Invalid chunk type #{}", symbol)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(chunk_type: StringChunkType, start: i32, end: i32, delim: &str) -> StringChunkSpan {
        StringChunkSpan {
            chunk_type,
            start,
            end,
            item_delimiter: delim.to_string(),
        }
    }

    #[test]
    fn items_split_on_the_vm_delimiter() {
        let s = "a;b;c";
        assert_eq!(count_chunks(s, StringChunkType::Item, ";"), 3);
        assert_eq!(
            resolve_span(s, &span(StringChunkType::Item, 2, 0, ";")),
            "b"
        );
    }

    #[test]
    fn word_spans_join_with_single_spaces() {
        let s = "the  quick   brown fox";
        assert_eq!(
            resolve_span(s, &span(StringChunkType::Word, 2, 3, " ")),
            "quick brown"
        );
    }

    #[test]
    fn delete_item_removes_its_delimiter() {
        let s = "a,b,c";
        assert_eq!(delete_span(s, &span(StringChunkType::Item, 2, 0, ",")), "a,c");
    }

    #[test]
    fn replace_pads_past_the_end() {
        assert_eq!(
            replace_span("a,b", &span(StringChunkType::Item, 4, 0, ","), "x"),
            "a,b,,x"
        );
        assert_eq!(
            replace_span("a,b,c", &span(StringChunkType::Item, 2, 0, ","), "X"),
            "a,X,c"
        );
    }
}
