//! Collection methods for lists and property lists. Receivers stay
//! reference-shared: every mutation lands in the shared cell.

use crate::lingo::datum::{Datum, datum_bool, new_list, new_prop_list};
use crate::lingo::ops::{datum_equals, datum_less_than, sort_datums};
use crate::player::{MoviePlayer, ScriptError};

pub fn call_method(
    player: &mut MoviePlayer,
    obj: &Datum,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    match obj {
        Datum::List(_) => call_list_method(player, obj, name, args),
        Datum::PropList(_) => call_prop_list_method(player, obj, name, args),
        _ => Err(ScriptError::new(format!("{} is not a list", obj.type_str()))),
    }
}

fn one_based(index: i32, len: usize) -> Result<usize, ScriptError> {
    if index < 1 || index as usize > len {
        return Err(ScriptError::new(format!(
            "Index {} out of range 1..{}",
            index, len
        )));
    }
    Ok(index as usize - 1)
}

fn call_list_method(
    player: &mut MoviePlayer,
    obj: &Datum,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    let handle = obj.to_list()?;
    match name {
        "count" => Ok(Datum::Int(handle.borrow().len() as i32)),
        "getAt" => {
            let items = handle.borrow();
            let index = one_based(arg_int(args, 0)?, items.len())?;
            Ok(items[index].clone())
        }
        "setAt" => {
            let index = arg_int(args, 0)?;
            let value = arg_at(args, 1)?;
            let mut items = handle.borrow_mut();
            if index < 1 {
                return Err(ScriptError::new(format!("Index {} out of range", index)));
            }
            // setAt grows the list with VOIDs when needed
            while items.len() < index as usize {
                items.push(Datum::Void);
            }
            items[index as usize - 1] = value;
            Ok(Datum::Void)
        }
        "add" | "append" => {
            handle.borrow_mut().push(arg_at(args, 0)?);
            Ok(Datum::Void)
        }
        "addAt" => {
            let index = arg_int(args, 0)?;
            let value = arg_at(args, 1)?;
            let mut items = handle.borrow_mut();
            let index = (index.max(1) as usize - 1).min(items.len());
            items.insert(index, value);
            Ok(Datum::Void)
        }
        "deleteAt" => {
            let mut items = handle.borrow_mut();
            let index = one_based(arg_int(args, 0)?, items.len())?;
            items.remove(index);
            Ok(Datum::Void)
        }
        "deleteOne" => {
            let target = arg_at(args, 0)?;
            let mut items = handle.borrow_mut();
            let position = items
                .iter()
                .position(|item| datum_equals(item, &target).unwrap_or(false));
            if let Some(position) = position {
                items.remove(position);
                return Ok(datum_bool(true));
            }
            Ok(datum_bool(false))
        }
        "getLast" => Ok(handle.borrow().last().cloned().unwrap_or(Datum::Void)),
        "getOne" | "getPos" | "findPos" => {
            let target = arg_at(args, 0)?;
            let items = handle.borrow();
            let position = items
                .iter()
                .position(|item| datum_equals(item, &target).unwrap_or(false));
            Ok(Datum::Int(position.map(|p| p as i32 + 1).unwrap_or(0)))
        }
        "findPosNear" => {
            let target = arg_at(args, 0)?;
            let items = handle.borrow();
            let position = items
                .iter()
                .position(|item| !datum_less_than(item, &target).unwrap_or(false));
            Ok(Datum::Int(
                position.map(|p| p as i32 + 1).unwrap_or(items.len() as i32 + 1),
            ))
        }
        "sort" => {
            sort_datums(&mut handle.borrow_mut());
            Ok(Datum::Void)
        }
        "duplicate" => Ok(duplicate_datum(obj)),
        "getProp" => {
            // list getProp is positional
            let items = handle.borrow();
            let index = one_based(arg_int(args, 0)?, items.len())?;
            Ok(items[index].clone())
        }
        "max" => {
            let items = handle.borrow();
            let mut best: Option<Datum> = None;
            for item in items.iter() {
                let is_greater = match &best {
                    Some(current) => !datum_less_than(item, current)?
                        && !datum_equals(item, current)?,
                    None => true,
                };
                if is_greater {
                    best = Some(item.clone());
                }
            }
            Ok(best.unwrap_or(Datum::Void))
        }
        "min" => {
            let items = handle.borrow();
            let mut best: Option<Datum> = None;
            for item in items.iter() {
                let is_less = match &best {
                    Some(current) => datum_less_than(item, current)?,
                    None => true,
                };
                if is_less {
                    best = Some(item.clone());
                }
            }
            Ok(best.unwrap_or(Datum::Void))
        }
        _ => {
            let mut full_args = vec![obj.clone()];
            full_args.extend_from_slice(args);
            player.call_global_handler(name, &full_args)
        }
    }
}

fn call_prop_list_method(
    player: &mut MoviePlayer,
    obj: &Datum,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    let handle = obj.to_prop_list()?;
    match name {
        "count" => Ok(Datum::Int(handle.borrow().len() as i32)),
        "getProp" | "getaProp" | "getAt" => {
            let key = arg_at(args, 0)?;
            if name == "getAt" && key.is_number() {
                let entries = handle.borrow();
                let index = one_based(key.int_value()?, entries.len())?;
                return Ok(entries[index].1.clone());
            }
            let entries = handle.borrow();
            let found = entries
                .iter()
                .find(|(entry_key, _)| datum_equals(entry_key, &key).unwrap_or(false))
                .map(|(_, value)| value.clone());
            match found {
                Some(value) => Ok(value),
                None if name == "getaProp" => Ok(Datum::Void),
                None => Err(ScriptError::new(format!(
                    "Property not found in list: {}",
                    key.string_value().unwrap_or_default()
                ))),
            }
        }
        "setProp" | "setaProp" | "setAt" => {
            let key = arg_at(args, 0)?;
            let value = arg_at(args, 1)?;
            let mut entries = handle.borrow_mut();
            let position = entries
                .iter()
                .position(|(entry_key, _)| datum_equals(entry_key, &key).unwrap_or(false));
            match position {
                Some(index) => entries[index].1 = value,
                None => entries.push((key, value)),
            }
            Ok(Datum::Void)
        }
        "addProp" => {
            handle
                .borrow_mut()
                .push((arg_at(args, 0)?, arg_at(args, 1)?));
            Ok(Datum::Void)
        }
        "deleteProp" => {
            let key = arg_at(args, 0)?;
            let mut entries = handle.borrow_mut();
            let position = entries
                .iter()
                .position(|(entry_key, _)| datum_equals(entry_key, &key).unwrap_or(false));
            if let Some(position) = position {
                entries.remove(position);
                return Ok(datum_bool(true));
            }
            Ok(datum_bool(false))
        }
        "deleteAt" => {
            let mut entries = handle.borrow_mut();
            let index = one_based(arg_int(args, 0)?, entries.len())?;
            entries.remove(index);
            Ok(Datum::Void)
        }
        "getPropAt" => {
            let entries = handle.borrow();
            let index = one_based(arg_int(args, 0)?, entries.len())?;
            Ok(entries[index].0.clone())
        }
        "findPos" | "getOne" => {
            let key = arg_at(args, 0)?;
            let entries = handle.borrow();
            let position = entries
                .iter()
                .position(|(entry_key, _)| datum_equals(entry_key, &key).unwrap_or(false));
            Ok(Datum::Int(position.map(|p| p as i32 + 1).unwrap_or(0)))
        }
        "getLast" => Ok(handle
            .borrow()
            .last()
            .map(|(_, value)| value.clone())
            .unwrap_or(Datum::Void)),
        "sort" => {
            handle.borrow_mut().sort_by(|a, b| {
                if datum_equals(&a.0, &b.0).unwrap_or(false) {
                    std::cmp::Ordering::Equal
                } else if datum_less_than(&a.0, &b.0).unwrap_or(false) {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Greater
                }
            });
            Ok(Datum::Void)
        }
        "duplicate" => Ok(duplicate_datum(obj)),
        _ => {
            let mut full_args = vec![obj.clone()];
            full_args.extend_from_slice(args);
            player.call_global_handler(name, &full_args)
        }
    }
}

/// Deep copy: fresh cells all the way down, breaking reference sharing.
pub fn duplicate_datum(datum: &Datum) -> Datum {
    match datum {
        Datum::List(items) => new_list(items.borrow().iter().map(duplicate_datum).collect()),
        Datum::PropList(entries) => new_prop_list(
            entries
                .borrow()
                .iter()
                .map(|(key, value)| (duplicate_datum(key), duplicate_datum(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn arg_at(args: &[Datum], index: usize) -> Result<Datum, ScriptError> {
    args.get(index)
        .cloned()
        .ok_or_else(|| ScriptError::new(format!("Missing argument {}", index + 1)))
}

fn arg_int(args: &[Datum], index: usize) -> Result<i32, ScriptError> {
    arg_at(args, index)?.int_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::MoviePlayer;

    #[test]
    fn add_is_visible_through_every_alias() {
        let mut player = MoviePlayer::new();
        let a = new_list(vec![Datum::Int(1)]);
        let b = a.clone();
        call_method(&mut player, &a, "add", &[Datum::Int(2)]).unwrap();
        let count = call_method(&mut player, &b, "count", &[]).unwrap();
        assert!(matches!(count, Datum::Int(2)));
    }

    #[test]
    fn duplicate_breaks_sharing() {
        let mut player = MoviePlayer::new();
        let a = new_list(vec![Datum::Int(1)]);
        let b = call_method(&mut player, &a, "duplicate", &[]).unwrap();
        call_method(&mut player, &a, "add", &[Datum::Int(2)]).unwrap();
        assert_eq!(b.to_list().unwrap().borrow().len(), 1);
    }

    #[test]
    fn prop_list_set_replaces_matching_key() {
        let mut player = MoviePlayer::new();
        let plist = new_prop_list(vec![(Datum::Symbol("a".into()), Datum::Int(1))]);
        call_method(
            &mut player,
            &plist,
            "setProp",
            &[Datum::Symbol("A".into()), Datum::Int(9)],
        )
        .unwrap();
        let entries = plist.to_prop_list().unwrap();
        assert_eq!(entries.borrow().len(), 1);
        assert!(matches!(entries.borrow()[0].1, Datum::Int(9)));
    }
}
