use crate::lingo::datum::{ColorRef, Datum, new_list};
use crate::player::methods;
use crate::player::{MoviePlayer, ScriptError};

/// Collection builtins are thin wrappers over the method surface with the
/// receiver moved into the first argument slot.
pub fn call(player: &mut MoviePlayer, name: &str, args: &[Datum]) -> Result<Datum, ScriptError> {
    match name {
        "list" => Ok(new_list(args.to_vec())),
        "point" => {
            let x = arg_int(args, 0)?;
            let y = arg_int(args, 1)?;
            Ok(Datum::Point(x, y))
        }
        "rect" => {
            if args.len() == 2 {
                // rect(point, point)
                let (l, t) = args[0].to_point()?;
                let (r, b) = args[1].to_point()?;
                return Ok(Datum::Rect(l, t, r, b));
            }
            Ok(Datum::Rect(
                arg_int(args, 0)?,
                arg_int(args, 1)?,
                arg_int(args, 2)?,
                arg_int(args, 3)?,
            ))
        }
        "rgb" => {
            if args.len() == 1 {
                // rgb("#rrggbb")
                let text = args[0].string_value()?;
                let hex = text.trim_start_matches('#');
                let parsed = u32::from_str_radix(hex, 16).unwrap_or(0);
                return Ok(Datum::Color(ColorRef::Rgb(
                    ((parsed >> 16) & 0xff) as u8,
                    ((parsed >> 8) & 0xff) as u8,
                    (parsed & 0xff) as u8,
                )));
            }
            Ok(Datum::Color(ColorRef::Rgb(
                arg_int(args, 0)?.clamp(0, 255) as u8,
                arg_int(args, 1)?.clamp(0, 255) as u8,
                arg_int(args, 2)?.clamp(0, 255) as u8,
            )))
        }
        "paletteindex" => Ok(Datum::Color(ColorRef::PaletteIndex(
            arg_int(args, 0)?.clamp(0, 255) as u8,
        ))),
        "count" => {
            let obj = receiver(args)?;
            match &obj {
                Datum::List(_) | Datum::PropList(_) => {
                    methods::call_datum_method(player, &obj, "count", &args[1..])
                }
                other if other.is_string() => {
                    methods::string::call_method(player, other, "count", &args[1..])
                }
                other => Err(ScriptError::new(format!(
                    "count() cannot take {}",
                    other.type_str()
                ))),
            }
        }
        "duplicate" => {
            let obj = receiver(args)?;
            Ok(methods::list::duplicate_datum(&obj))
        }
        _ => {
            // getAt/setAt/add/.. all dispatch through the method table
            let obj = receiver(args)?;
            methods::call_datum_method(player, &obj, method_name(name), &args[1..])
        }
    }
}

/// The registry is lowercase; the method table wants canonical casing.
fn method_name(lower: &str) -> &'static str {
    match lower {
        "getat" => "getAt",
        "setat" => "setAt",
        "add" => "add",
        "append" => "append",
        "addat" => "addAt",
        "deleteat" => "deleteAt",
        "deleteone" => "deleteOne",
        "getlast" => "getLast",
        "getone" => "getOne",
        "getpos" => "getPos",
        "findpos" => "findPos",
        "findposnear" => "findPosNear",
        "sort" => "sort",
        "getprop" => "getProp",
        "setprop" => "setProp",
        "addprop" => "addProp",
        "deleteprop" => "deleteProp",
        "getpropat" => "getPropAt",
        "getaprop" => "getaProp",
        "setaprop" => "setaProp",
        _ => "count",
    }
}

fn receiver(args: &[Datum]) -> Result<Datum, ScriptError> {
    args.first()
        .cloned()
        .ok_or_else(|| ScriptError::new("Missing receiver argument".to_string()))
}

fn arg_int(args: &[Datum], index: usize) -> Result<i32, ScriptError> {
    args.get(index)
        .map(|d| d.int_value())
        .transpose()?
        .ok_or_else(|| ScriptError::new(format!("Missing argument {}", index + 1)))
}
