//! Display formatting for datums, used by `put`, watch values and debug
//! snapshots. Mirrors the message-window syntax: strings quoted, symbols
//! with a leading `#`, lists in brackets.

use super::datum::{ColorRef, Datum};

pub fn format_float(value: f64, float_precision: u8) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{:.*}", float_precision as usize, value)
    }
}

pub fn format_datum(datum: &Datum, float_precision: u8) -> String {
    match datum {
        Datum::Void => "<Void>".to_string(),
        Datum::Int(n) => n.to_string(),
        Datum::Float(f) => format_float(*f, float_precision),
        Datum::Str(s) => format!("\"{}\"", s),
        Datum::Symbol(s) => format!("#{}", s),
        Datum::StringChunk(_, _, text) => format!("\"{}\"", text),
        Datum::List(items) => {
            let parts: Vec<String> = items
                .borrow()
                .iter()
                .map(|item| format_datum(item, float_precision))
                .collect();
            format!("[{}]", parts.join(", "))
        }
        Datum::PropList(entries) => {
            let entries = entries.borrow();
            if entries.is_empty() {
                return "[:]".to_string();
            }
            let parts: Vec<String> = entries
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{}: {}",
                        format_datum(key, float_precision),
                        format_datum(value, float_precision)
                    )
                })
                .collect();
            format!("[{}]", parts.join(", "))
        }
        Datum::ArgList(items) | Datum::ArgListNoRet(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| format_datum(item, float_precision))
                .collect();
            format!("[{}]", parts.join(", "))
        }
        Datum::Point(x, y) => format!("point({}, {})", x, y),
        Datum::Rect(l, t, r, b) => format!("rect({}, {}, {}, {})", l, t, r, b),
        Datum::Vector3(v) => format!(
            "vector({}, {}, {})",
            format_float(v[0], float_precision),
            format_float(v[1], float_precision),
            format_float(v[2], float_precision)
        ),
        Datum::Color(ColorRef::Rgb(r, g, b)) => format!("rgb({}, {}, {})", r, g, b),
        Datum::Color(ColorRef::PaletteIndex(i)) => format!("paletteIndex({})", i),
        Datum::CastLib(n) => format!("(castLib {})", n),
        Datum::Member(member) => format!(
            "(member {} of castLib {})",
            member.cast_member, member.cast_lib
        ),
        Datum::Sprite(n) => format!("(sprite {})", n),
        Datum::Script(member) => format!(
            "(script member {} of castLib {})",
            member.cast_member, member.cast_lib
        ),
        Datum::Instance(instance) => {
            format!("<offspring #{}>", instance.borrow().instance_id)
        }
        Datum::Timeout(name) => format!("timeout(\"{}\")", name),
        Datum::VarRef(_) => "<varRef>".to_string(),
        Datum::Xtra(name) => format!("<Xtra \"{}\">", name),
        Datum::XtraInstance(name, id) => format!("<Xtra child \"{}\" {}>", name, id),
        Datum::SoundRef(n) => format!("sound({})", n),
        Datum::Image(image) => {
            let image = image.borrow();
            format!("<image {}x{}>", image.width, image.height)
        }
        Datum::Stage => "(the stage)".to_string(),
        Datum::PlayerRef => "(the player)".to_string(),
        Datum::MovieRef => "(the movie)".to_string(),
    }
}

/// `put` shows strings without quotes at the top level; everything else
/// formats the same as nested display.
pub fn format_datum_for_put(datum: &Datum, float_precision: u8) -> String {
    match datum {
        Datum::Str(s) => s.clone(),
        Datum::StringChunk(_, _, text) => text.clone(),
        other => format_datum(other, float_precision),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lingo::datum::{new_list, new_prop_list};

    #[test]
    fn lists_format_with_brackets() {
        let list = new_list(vec![Datum::Int(1), Datum::Str("a".to_string())]);
        assert_eq!(format_datum(&list, 4), "[1, \"a\"]");
    }

    #[test]
    fn empty_prop_list_uses_colon() {
        assert_eq!(format_datum(&new_prop_list(vec![]), 4), "[:]");
    }

    #[test]
    fn whole_floats_keep_one_decimal() {
        assert_eq!(format_datum(&Datum::Float(3.0), 4), "3.0");
        assert_eq!(format_datum(&Datum::Float(3.25), 4), "3.2500");
    }
}
