use rand::Rng;

use crate::lingo::datum::{Datum, datum_bool};
use crate::lingo::format::format_datum;
use crate::player::eval::eval_expression_text;
use crate::player::{MoviePlayer, ScriptError};

pub fn call(player: &mut MoviePlayer, name: &str, args: &[Datum]) -> Result<Datum, ScriptError> {
    match name {
        "value" => {
            let text = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            // value() parses literals and simple expressions; a parse
            // failure yields VOID, not an error
            Ok(eval_expression_text(player, &text).unwrap_or(Datum::Void))
        }
        "string" => {
            let datum = args.first().cloned().unwrap_or(Datum::Void);
            match datum {
                Datum::Str(s) => Ok(Datum::Str(s)),
                other => Ok(Datum::Str(
                    other
                        .string_value()
                        .unwrap_or_else(|_| format_datum(&other, player.float_precision)),
                )),
            }
        }
        "ilk" => {
            let datum = args.first().cloned().unwrap_or(Datum::Void);
            match args.get(1) {
                Some(expected) => {
                    let expected = expected.symbol_value()?;
                    Ok(datum_bool(datum.ilk().eq_ignore_ascii_case(&expected)))
                }
                None => Ok(Datum::Symbol(datum.ilk().to_string())),
            }
        }
        "symbol" => {
            let text = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            Ok(Datum::Symbol(text))
        }
        "symbolp" => Ok(datum_bool(matches!(args.first(), Some(Datum::Symbol(_))))),
        "voidp" => Ok(datum_bool(matches!(args.first(), Some(Datum::Void) | None))),
        "objectp" => Ok(datum_bool(matches!(
            args.first(),
            Some(Datum::Instance(_))
                | Some(Datum::Script(_))
                | Some(Datum::List(_))
                | Some(Datum::PropList(_))
                | Some(Datum::Xtra(_))
                | Some(Datum::XtraInstance(..))
        ))),
        "stringp" => Ok(datum_bool(
            args.first().map(|d| d.is_string()).unwrap_or(false),
        )),
        "integerp" => Ok(datum_bool(args.first().map(|d| d.is_int()).unwrap_or(false))),
        "floatp" => Ok(datum_bool(matches!(args.first(), Some(Datum::Float(_))))),
        "listp" => Ok(datum_bool(matches!(
            args.first(),
            Some(Datum::List(_)) | Some(Datum::PropList(_))
        ))),
        "integer" => {
            let datum = args.first().cloned().unwrap_or(Datum::Void);
            match datum {
                // integer() rounds, unlike the truncating coercion
                Datum::Float(f) => Ok(Datum::Int(f.round() as i32)),
                other => Ok(Datum::Int(other.int_value()?)),
            }
        }
        "float" => {
            let datum = args.first().cloned().unwrap_or(Datum::Void);
            Ok(Datum::Float(datum.float_value()?))
        }

        "abs" => {
            let datum = args.first().cloned().unwrap_or(Datum::Int(0));
            match datum {
                Datum::Int(n) => Ok(Datum::Int(n.abs())),
                other => Ok(Datum::Float(other.float_value()?.abs())),
            }
        }
        "min" => fold_extreme(args, true),
        "max" => fold_extreme(args, false),
        "random" => {
            let upper = args
                .first()
                .map(|d| d.int_value())
                .transpose()?
                .unwrap_or(1);
            if upper <= 1 {
                return Ok(Datum::Int(1));
            }
            Ok(Datum::Int(player.rng.random_range(1..=upper)))
        }
        "atan" => Ok(Datum::Float(arg_float(args, 0)?.atan())),
        "cos" => Ok(Datum::Float(arg_float(args, 0)?.cos())),
        "sin" => Ok(Datum::Float(arg_float(args, 0)?.sin())),
        "sqrt" => {
            let datum = args.first().cloned().unwrap_or(Datum::Int(0));
            match datum {
                // sqrt of an int floors back to an int
                Datum::Int(n) => Ok(Datum::Int((n.max(0) as f64).sqrt() as i32)),
                other => Ok(Datum::Float(other.float_value()?.sqrt())),
            }
        }
        "exp" => Ok(Datum::Float(arg_float(args, 0)?.exp())),
        "log" => Ok(Datum::Float(arg_float(args, 0)?.ln())),
        "power" => {
            let base = arg_float(args, 0)?;
            let exponent = arg_float(args, 1)?;
            Ok(Datum::Float(base.powf(exponent)))
        }
        "pi" => Ok(Datum::Float(std::f64::consts::PI)),
        "bitand" => Ok(Datum::Int(arg_int(args, 0)? & arg_int(args, 1)?)),
        "bitor" => Ok(Datum::Int(arg_int(args, 0)? | arg_int(args, 1)?)),
        "bitxor" => Ok(Datum::Int(arg_int(args, 0)? ^ arg_int(args, 1)?)),
        "bitnot" => Ok(Datum::Int(!arg_int(args, 0)?)),

        "length" => {
            let text = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            Ok(Datum::Int(text.chars().count() as i32))
        }
        "chars" => {
            let text = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            let start = arg_int(args, 1)?.max(1) as usize;
            let end = arg_int(args, 2)?.max(0) as usize;
            let chars: Vec<char> = text.chars().collect();
            if start > chars.len() || end < start {
                return Ok(Datum::Str(String::new()));
            }
            let end = end.min(chars.len());
            Ok(Datum::Str(chars[start - 1..end].iter().collect()))
        }
        "chartonum" | "charstonum" => {
            let text = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default();
            Ok(Datum::Int(
                text.chars().next().map(|c| c as i32).unwrap_or(0),
            ))
        }
        "numtochar" => {
            let code = arg_int(args, 0)?;
            let c = char::from_u32(code.max(0) as u32).unwrap_or('\0');
            Ok(Datum::Str(c.to_string()))
        }
        "offset" => {
            // offset(needle, haystack), case-insensitive, 0 on a miss
            let needle = args
                .first()
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default()
                .to_lowercase();
            let haystack = args
                .get(1)
                .map(|d| d.string_value())
                .transpose()?
                .unwrap_or_default()
                .to_lowercase();
            let position = haystack
                .find(&needle)
                .map(|byte_pos| haystack[..byte_pos].chars().count() as i32 + 1)
                .unwrap_or(0);
            Ok(Datum::Int(position))
        }
        _ => Err(ScriptError::new(format!("Unknown builtin {}", name))),
    }
}

fn fold_extreme(args: &[Datum], want_min: bool) -> Result<Datum, ScriptError> {
    // min/max accept either a single list or a spread of values
    let values: Vec<Datum> = match args.first() {
        Some(Datum::List(items)) if args.len() == 1 => items.borrow().clone(),
        _ => args.to_vec(),
    };
    let mut best: Option<Datum> = None;
    for value in values {
        let replace = match &best {
            None => true,
            Some(current) => {
                let less = crate::lingo::ops::datum_less_than(&value, current)?;
                if want_min { less } else { !less && !crate::lingo::ops::datum_equals(&value, current)? }
            }
        };
        if replace {
            best = Some(value);
        }
    }
    Ok(best.unwrap_or(Datum::Void))
}

fn arg_float(args: &[Datum], index: usize) -> Result<f64, ScriptError> {
    args.get(index)
        .map(|d| d.float_value())
        .transpose()?
        .ok_or_else(|| ScriptError::new(format!("Missing argument {}", index + 1)))
}

fn arg_int(args: &[Datum], index: usize) -> Result<i32, ScriptError> {
    args.get(index)
        .map(|d| d.int_value())
        .transpose()?
        .ok_or_else(|| ScriptError::new(format!("Missing argument {}", index + 1)))
}
