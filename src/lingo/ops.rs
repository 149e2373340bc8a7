//! Polymorphic operator semantics shared by the bytecode handlers, the
//! collection builtins and the watch evaluator.

use std::cmp::min;

use super::datum::{ColorRef, Datum, new_list};
use crate::player::ScriptError;

pub fn add_datums(left: &Datum, right: &Datum) -> Result<Datum, ScriptError> {
    match (left, right) {
        (Datum::Void, some) => Ok(some.clone()),
        (some, Datum::Void) => Ok(some.clone()),
        (Datum::Int(a), Datum::Int(b)) => Ok(Datum::Int(a.wrapping_add(*b))),
        (Datum::Float(a), Datum::Float(b)) => Ok(Datum::Float(a + b)),
        (Datum::Float(a), Datum::Int(b)) => Ok(Datum::Float(a + *b as f64)),
        (Datum::Int(a), Datum::Float(b)) => Ok(Datum::Float(*a as f64 + b)),
        (Datum::Str(_), b) if left_parses_numeric(left) => {
            add_datums(&numeric_of_string(left), b)
        }
        (a, Datum::Str(_)) if left_parses_numeric(right) => {
            add_datums(a, &numeric_of_string(right))
        }
        (Datum::Point(ax, ay), Datum::Point(bx, by)) => Ok(Datum::Point(ax + bx, ay + by)),
        (Datum::Point(ax, ay), Datum::Int(b)) => Ok(Datum::Point(ax + b, ay + b)),
        (Datum::Rect(al, at, ar, ab), Datum::Rect(bl, bt, br, bb)) => {
            Ok(Datum::Rect(al + bl, at + bt, ar + br, ab + bb))
        }
        (Datum::List(a), Datum::List(b)) => {
            let a = a.borrow();
            let b = b.borrow();
            let len = min(a.len(), b.len());
            let mut result = Vec::with_capacity(len);
            for i in 0..len {
                result.push(add_datums(&a[i], &b[i])?);
            }
            Ok(new_list(result))
        }
        (Datum::List(a), b) if b.is_number() => {
            let mut result = vec![];
            for item in a.borrow().iter() {
                result.push(add_datums(item, b)?);
            }
            Ok(new_list(result))
        }
        (Datum::Color(a), Datum::Color(b)) => match (a, b) {
            (ColorRef::PaletteIndex(a), ColorRef::PaletteIndex(b)) => {
                Ok(Datum::Color(ColorRef::PaletteIndex(a.wrapping_add(*b))))
            }
            (ColorRef::Rgb(ar, ag, ab), ColorRef::Rgb(br, bg, bb)) => Ok(Datum::Color(
                ColorRef::Rgb(ar.wrapping_add(*br), ag.wrapping_add(*bg), ab.wrapping_add(*bb)),
            )),
            _ => Err(ScriptError::new("Cannot add mixed color kinds".to_string())),
        },
        _ => Err(ScriptError::new(format!(
            "Invalid operands for add: {}, {}",
            left.type_str(),
            right.type_str()
        ))),
    }
}

pub fn subtract_datums(left: &Datum, right: &Datum) -> Result<Datum, ScriptError> {
    match (left, right) {
        (some, Datum::Void) => Ok(some.clone()),
        (Datum::Int(a), Datum::Int(b)) => Ok(Datum::Int(a.wrapping_sub(*b))),
        (Datum::Float(a), Datum::Float(b)) => Ok(Datum::Float(a - b)),
        (Datum::Float(a), Datum::Int(b)) => Ok(Datum::Float(a - *b as f64)),
        (Datum::Int(a), Datum::Float(b)) => Ok(Datum::Float(*a as f64 - b)),
        (Datum::Str(_), b) if left_parses_numeric(left) => {
            subtract_datums(&numeric_of_string(left), b)
        }
        (a, Datum::Str(_)) if left_parses_numeric(right) => {
            subtract_datums(a, &numeric_of_string(right))
        }
        (Datum::Point(ax, ay), Datum::Point(bx, by)) => {
            Ok(Datum::Point(ax.wrapping_sub(*bx), ay.wrapping_sub(*by)))
        }
        (Datum::Rect(al, at, ar, ab), Datum::Rect(bl, bt, br, bb)) => Ok(Datum::Rect(
            al.wrapping_sub(*bl),
            at.wrapping_sub(*bt),
            ar.wrapping_sub(*br),
            ab.wrapping_sub(*bb),
        )),
        (Datum::List(a), Datum::List(b)) => {
            let a = a.borrow();
            let b = b.borrow();
            let len = min(a.len(), b.len());
            let mut result = Vec::with_capacity(len);
            for i in 0..len {
                result.push(subtract_datums(&a[i], &b[i])?);
            }
            Ok(new_list(result))
        }
        _ => Err(ScriptError::new(format!(
            "Invalid operands for subtract: {}, {}",
            left.type_str(),
            right.type_str()
        ))),
    }
}

pub fn multiply_datums(left: &Datum, right: &Datum) -> Result<Datum, ScriptError> {
    match (left, right) {
        (Datum::Int(a), Datum::Int(b)) => Ok(Datum::Int(a.wrapping_mul(*b))),
        (Datum::Float(a), Datum::Float(b)) => Ok(Datum::Float(a * b)),
        (Datum::Float(a), Datum::Int(b)) => Ok(Datum::Float(a * *b as f64)),
        (Datum::Int(a), Datum::Float(b)) => Ok(Datum::Float(*a as f64 * b)),
        (Datum::Str(_), b) if left_parses_numeric(left) => {
            multiply_datums(&numeric_of_string(left), b)
        }
        (a, Datum::Str(_)) if left_parses_numeric(right) => {
            multiply_datums(a, &numeric_of_string(right))
        }
        (Datum::Point(ax, ay), Datum::Int(b)) => Ok(Datum::Point(ax * b, ay * b)),
        (Datum::Point(ax, ay), Datum::Float(b)) => {
            Ok(Datum::Point((*ax as f64 * b) as i32, (*ay as f64 * b) as i32))
        }
        _ => Err(ScriptError::new(format!(
            "Invalid operands for multiply: {}, {}",
            left.type_str(),
            right.type_str()
        ))),
    }
}

/// Integer division collapses to int only when divisible; a remainder
/// promotes to float, as do mixed operands.
pub fn divide_datums(left: &Datum, right: &Datum) -> Result<Datum, ScriptError> {
    match (left, right) {
        (Datum::Int(a), Datum::Int(b)) => {
            if *b == 0 {
                Err(zero_division())
            } else if a.wrapping_rem(*b) == 0 {
                Ok(Datum::Int(a.wrapping_div(*b)))
            } else {
                Ok(Datum::Float(*a as f64 / *b as f64))
            }
        }
        (Datum::Float(a), Datum::Float(b)) => {
            if *b == 0.0 {
                Err(zero_division())
            } else {
                Ok(Datum::Float(a / b))
            }
        }
        (Datum::Float(a), Datum::Int(b)) => {
            if *b == 0 {
                Err(zero_division())
            } else {
                Ok(Datum::Float(a / *b as f64))
            }
        }
        (Datum::Int(a), Datum::Float(b)) => {
            if *b == 0.0 {
                Err(zero_division())
            } else {
                Ok(Datum::Float(*a as f64 / b))
            }
        }
        (Datum::Str(_), b) if left_parses_numeric(left) => {
            divide_datums(&numeric_of_string(left), b)
        }
        (a, Datum::Str(_)) if left_parses_numeric(right) => {
            divide_datums(a, &numeric_of_string(right))
        }
        (Datum::Point(ax, ay), Datum::Int(b)) => {
            if *b == 0 {
                Err(zero_division())
            } else {
                Ok(Datum::Point(ax / b, ay / b))
            }
        }
        _ => Err(ScriptError::new(format!(
            "Invalid operands for divide: {}, {}",
            left.type_str(),
            right.type_str()
        ))),
    }
}

pub fn mod_datums(left: &Datum, right: &Datum) -> Result<Datum, ScriptError> {
    let a = left.int_value()?;
    let b = right.int_value()?;
    if b == 0 {
        return Err(zero_division());
    }
    Ok(Datum::Int(a.wrapping_rem(b)))
}

pub fn negate_datum(value: &Datum) -> Result<Datum, ScriptError> {
    match value {
        Datum::Int(n) => Ok(Datum::Int(n.wrapping_neg())),
        Datum::Float(n) => Ok(Datum::Float(-n)),
        Datum::Void => Ok(Datum::Int(0)),
        _ => Err(ScriptError::new(format!(
            "Cannot negate datum of type {}",
            value.type_str()
        ))),
    }
}

fn zero_division() -> ScriptError {
    ScriptError::new("Division by zero".to_string())
}

fn left_parses_numeric(datum: &Datum) -> bool {
    match datum {
        Datum::Str(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

fn numeric_of_string(datum: &Datum) -> Datum {
    match datum {
        Datum::Str(s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i32>() {
                Datum::Int(n)
            } else {
                Datum::Float(trimmed.parse::<f64>().unwrap_or(0.0))
            }
        }
        other => other.clone(),
    }
}

/// Equality: numeric across numeric types, case-insensitive on strings,
/// element-wise on lists, identity on instances.
pub fn datum_equals(left: &Datum, right: &Datum) -> Result<bool, ScriptError> {
    match (left, right) {
        (Datum::Int(a), Datum::Int(b)) => Ok(a == b),
        (Datum::Int(a), Datum::Float(b)) => Ok(*a as f64 == *b),
        (Datum::Float(a), Datum::Int(b)) => Ok(*a == *b as f64),
        (Datum::Float(a), Datum::Float(b)) => Ok(a == b),
        (Datum::Int(a), Datum::Void) | (Datum::Void, Datum::Int(a)) => Ok(*a == 0),
        (Datum::Void, Datum::Void) => Ok(true),
        (a, b) if a.is_number() && b.is_string() => {
            if let Ok(n) = b.string_value()?.trim().parse::<f64>() {
                Ok(a.float_value()? == n)
            } else {
                Ok(false)
            }
        }
        (a, b) if a.is_string() && b.is_number() => datum_equals(b, a),
        (a, b) if a.is_string() && b.is_string() => {
            Ok(a.string_value()?.eq_ignore_ascii_case(&b.string_value()?))
        }
        (Datum::Symbol(a), Datum::Symbol(b)) => Ok(a.eq_ignore_ascii_case(b)),
        (Datum::Symbol(a), b) if b.is_string() => {
            Ok(a.eq_ignore_ascii_case(&b.string_value()?))
        }
        (a, Datum::Symbol(_)) if a.is_string() => datum_equals(right, left),
        (Datum::List(a), Datum::List(b)) => {
            let a = a.borrow();
            let b = b.borrow();
            if a.len() != b.len() {
                return Ok(false);
            }
            for (left_item, right_item) in a.iter().zip(b.iter()) {
                if !datum_equals(left_item, right_item)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Datum::PropList(a), Datum::PropList(b)) => {
            let a = a.borrow();
            let b = b.borrow();
            if a.len() != b.len() {
                return Ok(false);
            }
            for ((ak, av), (bk, bv)) in a.iter().zip(b.iter()) {
                if !datum_equals(ak, bk)? || !datum_equals(av, bv)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Datum::Instance(a), Datum::Instance(b)) => Ok(a == b),
        (Datum::Sprite(a), Datum::Sprite(b)) => Ok(a == b),
        (Datum::Member(a), Datum::Member(b)) => Ok(a.slot_number() == b.slot_number()),
        (Datum::Member(a), Datum::Void) | (Datum::Void, Datum::Member(a)) => Ok(!a.is_valid()),
        (Datum::Timeout(a), Datum::Timeout(b)) => Ok(a == b),
        (Datum::Color(a), Datum::Color(b)) => Ok(a == b),
        (Datum::Point(ax, ay), Datum::Point(bx, by)) => Ok(ax == bx && ay == by),
        (Datum::Rect(al, at, ar, ab), Datum::Rect(bl, bt, br, bb)) => {
            Ok(al == bl && at == bt && ar == br && ab == bb)
        }
        _ => Ok(false),
    }
}

/// Ordering: both-numeric compares numerically, anything else compares as
/// case-insensitive strings.
pub fn datum_less_than(left: &Datum, right: &Datum) -> Result<bool, ScriptError> {
    if left.is_number() && right.is_number() {
        return Ok(left.float_value()? < right.float_value()?);
    }
    match (left.string_value(), right.string_value()) {
        (Ok(a), Ok(b)) => Ok(a.to_lowercase() < b.to_lowercase()),
        _ => Ok(false),
    }
}

pub fn datum_greater_than(left: &Datum, right: &Datum) -> Result<bool, ScriptError> {
    if left.is_number() && right.is_number() {
        return Ok(left.float_value()? > right.float_value()?);
    }
    match (left.string_value(), right.string_value()) {
        (Ok(a), Ok(b)) => Ok(a.to_lowercase() > b.to_lowercase()),
        _ => Ok(false),
    }
}

pub fn datum_is_zero(datum: &Datum) -> Result<bool, ScriptError> {
    Ok(match datum {
        Datum::Int(value) => *value == 0,
        Datum::Float(value) => *value == 0.0,
        Datum::Void => true,
        Datum::Str(s) => s.is_empty() || s == "0",
        Datum::Instance(_) => false,
        _ => !datum.bool_value().unwrap_or(true),
    })
}

pub fn sort_datums(items: &mut [Datum]) {
    items.sort_by(|a, b| {
        if datum_equals(a, b).unwrap_or(false) {
            std::cmp::Ordering::Equal
        } else if datum_less_than(a, b).unwrap_or(false) {
            std::cmp::Ordering::Less
        } else {
            std::cmp::Ordering::Greater
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_promote_to_float() {
        let result = add_datums(&Datum::Int(3), &Datum::Float(0.5)).unwrap();
        assert!(matches!(result, Datum::Float(f) if f == 3.5));
    }

    #[test]
    fn int_division_collapses_only_when_divisible() {
        let result = divide_datums(&Datum::Int(6), &Datum::Int(2)).unwrap();
        assert!(matches!(result, Datum::Int(3)));
        let result = divide_datums(&Datum::Int(7), &Datum::Int(2)).unwrap();
        assert!(matches!(result, Datum::Float(f) if f == 3.5));
        let result = divide_datums(&Datum::Int(-9), &Datum::Int(3)).unwrap();
        assert!(matches!(result, Datum::Int(-3)));
    }

    #[test]
    fn division_by_zero_fails() {
        assert!(divide_datums(&Datum::Int(1), &Datum::Int(0)).is_err());
        assert!(mod_datums(&Datum::Int(1), &Datum::Int(0)).is_err());
    }

    #[test]
    fn string_equality_ignores_case() {
        assert!(
            datum_equals(
                &Datum::Str("Hello".to_string()),
                &Datum::Str("hELLO".to_string())
            )
            .unwrap()
        );
    }

    #[test]
    fn numeric_equality_crosses_types() {
        assert!(datum_equals(&Datum::Int(3), &Datum::Float(3.0)).unwrap());
        assert!(datum_equals(&Datum::Int(3), &Datum::Str("3".to_string())).unwrap());
    }

    #[test]
    fn ordering_falls_back_to_strings() {
        assert!(
            datum_less_than(
                &Datum::Str("apple".to_string()),
                &Datum::Str("Banana".to_string())
            )
            .unwrap()
        );
        assert!(datum_less_than(&Datum::Int(2), &Datum::Float(2.5)).unwrap());
    }
}
