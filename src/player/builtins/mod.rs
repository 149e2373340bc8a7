//! The built-in handler registry. Builtins win over user handlers in
//! `ext_call` resolution, so membership here is behavior, not style.

pub mod collections;
pub mod movie;
pub mod types;

use crate::lingo::datum::Datum;

use super::{MoviePlayer, ScriptError};

pub fn has_builtin(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    BUILTIN_NAMES.contains(&lower.as_str())
}

const BUILTIN_NAMES: &[&str] = &[
    // navigation and playback
    "go", "gotoframe", "gotomovie", "marker", "label", "updatestage", "halt", "pass",
    "nothing", "delay", "puppetsprite", "puppettempo", "sendsprite", "sendallsprites",
    "rollover", "timeout", "put", "trace", "alert", "cursor", "beep",
    // net and casts
    "preloadnetthing", "netdone", "neterror", "mediaready", "preloadcast",
    // objects
    "script", "member", "castlib", "sprite", "sound", "new", "call", "callancestor",
    // type predicates and conversion
    "value", "string", "ilk", "symbol", "symbolp", "voidp", "objectp", "stringp",
    "integerp", "floatp", "listp", "integer", "float",
    // math
    "abs", "min", "max", "random", "atan", "cos", "sin", "sqrt", "exp", "log", "power",
    "pi", "bitand", "bitor", "bitxor", "bitnot",
    // strings
    "length", "chars", "charstonum", "numtochar", "chartonum", "offset",
    // collections
    "list", "count", "getat", "setat", "add", "append", "addat", "deleteat", "deleteone",
    "getlast", "getone", "getpos", "findpos", "findposnear", "sort", "getprop", "setprop",
    "addprop", "deleteprop", "getpropat", "getaprop", "setaprop", "duplicate",
    "point", "rect", "rgb", "paletteindex",
];

pub fn call_builtin(
    player: &mut MoviePlayer,
    name: &str,
    args: &[Datum],
) -> Result<Datum, ScriptError> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "go" | "gotoframe" | "gotomovie" | "marker" | "label" | "updatestage" | "halt"
        | "pass" | "nothing" | "delay" | "puppetsprite" | "puppettempo" | "sendsprite"
        | "sendallsprites" | "rollover" | "timeout" | "put" | "trace" | "alert" | "cursor"
        | "beep" | "preloadnetthing" | "netdone" | "neterror" | "mediaready" | "preloadcast"
        | "script" | "member" | "castlib" | "sprite" | "sound" | "new" | "call"
        | "callancestor" => movie::call(player, &lower, args),

        "value" | "string" | "ilk" | "symbol" | "symbolp" | "voidp" | "objectp" | "stringp"
        | "integerp" | "floatp" | "listp" | "integer" | "float" | "abs" | "min" | "max"
        | "random" | "atan" | "cos" | "sin" | "sqrt" | "exp" | "log" | "power" | "pi"
        | "bitand" | "bitor" | "bitxor" | "bitnot" | "length" | "chars" | "charstonum"
        | "numtochar" | "chartonum" | "offset" => types::call(player, &lower, args),

        _ => collections::call(player, &lower, args),
    }
}
