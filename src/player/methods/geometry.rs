use crate::lingo::datum::{ColorRef, Datum, datum_bool};
use crate::player::{MoviePlayer, ScriptError};

pub fn call_method(
    _player: &mut MoviePlayer,
    obj: &Datum,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    match (obj, name) {
        (Datum::Point(x, y), "getAt") => match args.first().map(|d| d.int_value()).transpose()? {
            Some(1) => Ok(Datum::Int(*x)),
            Some(2) => Ok(Datum::Int(*y)),
            _ => Err(ScriptError::new("Point index out of range".to_string())),
        },
        (Datum::Rect(l, t, r, b), "getAt") => {
            match args.first().map(|d| d.int_value()).transpose()? {
                Some(1) => Ok(Datum::Int(*l)),
                Some(2) => Ok(Datum::Int(*t)),
                Some(3) => Ok(Datum::Int(*r)),
                Some(4) => Ok(Datum::Int(*b)),
                _ => Err(ScriptError::new("Rect index out of range".to_string())),
            }
        }
        (Datum::Rect(l, t, r, b), "inside") => {
            let (x, y) = args
                .first()
                .ok_or_else(|| ScriptError::new("inside needs a point".to_string()))?
                .to_point()?;
            Ok(datum_bool(x >= *l && x < *r && y >= *t && y < *b))
        }
        (Datum::Rect(al, at, ar, ab), "intersect") => {
            let (bl, bt, br, bb) = args
                .first()
                .ok_or_else(|| ScriptError::new("intersect needs a rect".to_string()))?
                .to_rect()?;
            let l = (*al).max(bl);
            let t = (*at).max(bt);
            let r = (*ar).min(br);
            let b = (*ab).min(bb);
            if l < r && t < b {
                Ok(Datum::Rect(l, t, r, b))
            } else {
                Ok(Datum::Rect(0, 0, 0, 0))
            }
        }
        (Datum::Rect(al, at, ar, ab), "union") => {
            let (bl, bt, br, bb) = args
                .first()
                .ok_or_else(|| ScriptError::new("union needs a rect".to_string()))?
                .to_rect()?;
            Ok(Datum::Rect(
                (*al).min(bl),
                (*at).min(bt),
                (*ar).max(br),
                (*ab).max(bb),
            ))
        }
        _ => Err(ScriptError::new(format!(
            "No method {} on {}",
            name,
            obj.type_str()
        ))),
    }
}

pub fn get_point_prop(point: (i32, i32), prop: &str) -> Result<Datum, ScriptError> {
    match prop {
        "locH" => Ok(Datum::Int(point.0)),
        "locV" => Ok(Datum::Int(point.1)),
        "ilk" => Ok(Datum::Symbol("point".to_string())),
        _ => Err(ScriptError::new(format!("No point property {}", prop))),
    }
}

pub fn get_rect_prop(rect: (i32, i32, i32, i32), prop: &str) -> Result<Datum, ScriptError> {
    let (l, t, r, b) = rect;
    match prop {
        "left" => Ok(Datum::Int(l)),
        "top" => Ok(Datum::Int(t)),
        "right" => Ok(Datum::Int(r)),
        "bottom" => Ok(Datum::Int(b)),
        "width" => Ok(Datum::Int(r - l)),
        "height" => Ok(Datum::Int(b - t)),
        "ilk" => Ok(Datum::Symbol("rect".to_string())),
        _ => Err(ScriptError::new(format!("No rect property {}", prop))),
    }
}

pub fn get_color_prop(color: &ColorRef, prop: &str) -> Result<Datum, ScriptError> {
    match (color, prop) {
        (ColorRef::Rgb(r, _, _), "red") => Ok(Datum::Int(*r as i32)),
        (ColorRef::Rgb(_, g, _), "green") => Ok(Datum::Int(*g as i32)),
        (ColorRef::Rgb(_, _, b), "blue") => Ok(Datum::Int(*b as i32)),
        (ColorRef::PaletteIndex(i), "paletteIndex") => Ok(Datum::Int(*i as i32)),
        (_, "ilk") => Ok(Datum::Symbol("color".to_string())),
        _ => Err(ScriptError::new(format!("No color property {}", prop))),
    }
}
