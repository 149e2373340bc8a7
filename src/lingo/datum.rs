use std::cell::RefCell;
use std::rc::Rc;

use num_derive::FromPrimitive;

use crate::player::ScriptError;
use crate::player::bitmap::Bitmap;
use crate::player::script::ScriptInstanceRef;

pub type ImageHandle = Rc<RefCell<Bitmap>>;

/// Identifies a cast member by (library, member) pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub cast_lib: i32,
    pub cast_member: i32,
}

pub const INVALID_MEMBER_REF: MemberRef = MemberRef {
    cast_lib: -1,
    cast_member: -1,
};
pub const NULL_MEMBER_REF: MemberRef = MemberRef {
    cast_lib: 0,
    cast_member: 0,
};

pub fn member_ref(cast_lib: i32, cast_member: i32) -> MemberRef {
    MemberRef {
        cast_lib,
        cast_member,
    }
}

impl MemberRef {
    pub fn is_valid(&self) -> bool {
        self.cast_lib > 0 && self.cast_member > 0
    }

    /// Packed form scripts see as `member.number`: library in the high
    /// 16 bits, member number in the low 16.
    pub fn slot_number(&self) -> i32 {
        ((self.cast_lib as i32) << 16) | (self.cast_member as i32 & 0xffff)
    }

    pub fn from_slot_number(slot: i32) -> MemberRef {
        if slot <= 0 {
            return INVALID_MEMBER_REF;
        }
        let cast_lib = slot >> 16;
        let cast_member = slot & 0xffff;
        if cast_lib == 0 {
            // pre-multi-cast movies address members with a bare number
            MemberRef {
                cast_lib: 0,
                cast_member: slot,
            }
        } else {
            MemberRef {
                cast_lib,
                cast_member,
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorRef {
    PaletteIndex(u8),
    Rgb(u8, u8, u8),
}

#[derive(Clone, Copy, Debug, PartialEq, FromPrimitive)]
pub enum StringChunkType {
    Item = 0x01,
    Word = 0x02,
    Char = 0x03,
    Line = 0x04,
}

impl StringChunkType {
    pub fn from_symbol(s: &str) -> Option<StringChunkType> {
        match s.to_ascii_lowercase().as_str() {
            "item" => Some(StringChunkType::Item),
            "word" => Some(StringChunkType::Word),
            "char" => Some(StringChunkType::Char),
            "line" => Some(StringChunkType::Line),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StringChunkType::Item => "item",
            StringChunkType::Word => "word",
            StringChunkType::Char => "char",
            StringChunkType::Line => "line",
        }
    }
}

/// A `word 2 of`-style span over some source string. `start`/`end` are
/// 1-based and inclusive; `end == 0` means a single-chunk span.
#[derive(Clone, Debug, PartialEq)]
pub struct StringChunkSpan {
    pub chunk_type: StringChunkType,
    pub start: i32,
    pub end: i32,
    pub item_delimiter: String,
}

/// Where a chunk reference reads from (and, for members, writes back to).
#[derive(Clone, Debug)]
pub enum StringChunkSource {
    /// A detached snapshot; read-only.
    Value,
    /// A field/text member; puts resolve back into the member.
    Member(MemberRef),
}

/// Assignment target pushed by `push_var_ref`: resolved by `put`/`delete`
/// against the active scope.
#[derive(Clone, Debug, PartialEq)]
pub enum VarTarget {
    Global(String),
    Local(usize),
    Param(usize),
    Property(String),
    Field(MemberRef),
}

pub type ListHandle = Rc<RefCell<Vec<Datum>>>;
pub type PropListHandle = Rc<RefCell<Vec<(Datum, Datum)>>>;
pub type TimeoutName = String;

pub fn new_list(items: Vec<Datum>) -> Datum {
    Datum::List(Rc::new(RefCell::new(items)))
}

pub fn new_prop_list(entries: Vec<(Datum, Datum)>) -> Datum {
    Datum::PropList(Rc::new(RefCell::new(entries)))
}

/// The runtime value type. Lists and property lists are handles to shared
/// cells: cloning the datum aliases the same container, so a mutation is
/// visible through every holder.
#[derive(Clone, Debug)]
pub enum Datum {
    Void,
    Int(i32),
    Float(f64),
    Str(String),
    Symbol(String),
    List(ListHandle),
    PropList(PropListHandle),
    ArgList(Vec<Datum>),
    ArgListNoRet(Vec<Datum>),
    Point(i32, i32),
    Rect(i32, i32, i32, i32),
    Vector3([f64; 3]),
    Color(ColorRef),
    CastLib(u32),
    Member(MemberRef),
    Sprite(i16),
    Script(MemberRef),
    Instance(ScriptInstanceRef),
    Timeout(TimeoutName),
    StringChunk(StringChunkSource, StringChunkSpan, String),
    VarRef(VarTarget),
    Xtra(String),
    XtraInstance(String, u32),
    SoundRef(u16),
    Image(ImageHandle),
    Stage,
    PlayerRef,
    MovieRef,
}

pub const DATUM_TRUE: Datum = Datum::Int(1);
pub const DATUM_FALSE: Datum = Datum::Int(0);

pub fn datum_bool(val: bool) -> Datum {
    if val { DATUM_TRUE } else { DATUM_FALSE }
}

impl Datum {
    pub fn type_str(&self) -> &'static str {
        match self {
            Datum::Void => "void",
            Datum::Int(_) => "int",
            Datum::Float(_) => "float",
            Datum::Str(_) => "string",
            Datum::Symbol(_) => "symbol",
            Datum::List(_) => "list",
            Datum::PropList(_) => "prop_list",
            Datum::ArgList(_) => "arg_list",
            Datum::ArgListNoRet(_) => "arg_list_no_ret",
            Datum::Point(..) => "point",
            Datum::Rect(..) => "rect",
            Datum::Vector3(_) => "vector",
            Datum::Color(_) => "color",
            Datum::CastLib(_) => "cast_lib",
            Datum::Member(_) => "member",
            Datum::Sprite(_) => "sprite",
            Datum::Script(_) => "script",
            Datum::Instance(_) => "instance",
            Datum::Timeout(_) => "timeout",
            Datum::StringChunk(..) => "string_chunk",
            Datum::VarRef(_) => "var_ref",
            Datum::Xtra(_) => "xtra",
            Datum::XtraInstance(..) => "xtra_instance",
            Datum::SoundRef(_) => "sound",
            Datum::Image(_) => "image",
            Datum::Stage => "stage",
            Datum::PlayerRef => "player",
            Datum::MovieRef => "movie",
        }
    }

    pub fn ilk(&self) -> &'static str {
        match self {
            Datum::Int(_) => "integer",
            Datum::Float(_) => "float",
            Datum::Str(_) | Datum::StringChunk(..) => "string",
            Datum::Symbol(_) => "symbol",
            Datum::List(_) => "list",
            Datum::PropList(_) => "propList",
            Datum::Point(..) => "point",
            Datum::Rect(..) => "rect",
            Datum::Color(_) => "color",
            Datum::Member(_) => "member",
            Datum::Sprite(_) => "sprite",
            Datum::Script(_) => "script",
            Datum::Instance(_) => "instance",
            Datum::Timeout(_) => "timeout",
            Datum::Image(_) => "image",
            Datum::Void => "void",
            _ => "object",
        }
    }

    pub fn int_value(&self) -> Result<i32, ScriptError> {
        match self {
            Datum::Int(n) => Ok(*n),
            Datum::Float(n) => Ok(*n as i32),
            Datum::Str(s) => Ok(s.trim().parse().unwrap_or(0)),
            Datum::StringChunk(_, _, s) => Ok(s.trim().parse().unwrap_or(0)),
            Datum::Sprite(n) => Ok(*n as i32),
            Datum::Member(member_ref) => Ok(member_ref.cast_member),
            Datum::Symbol(_) => Ok(0),
            Datum::Void => Ok(0),
            _ => Err(ScriptError::new(format!(
                "Cannot convert datum of type {} to int",
                self.type_str()
            ))),
        }
    }

    pub fn float_value(&self) -> Result<f64, ScriptError> {
        match self {
            Datum::Float(n) => Ok(*n),
            Datum::Int(n) => Ok(*n as f64),
            Datum::Str(s) => Ok(s.trim().parse().unwrap_or(0.0)),
            Datum::StringChunk(_, _, s) => Ok(s.trim().parse().unwrap_or(0.0)),
            Datum::Void => Ok(0.0),
            _ => Err(ScriptError::new(format!(
                "Cannot convert datum of type {} to float",
                self.type_str()
            ))),
        }
    }

    pub fn string_value(&self) -> Result<String, ScriptError> {
        match self {
            Datum::Str(s) => Ok(s.clone()),
            Datum::StringChunk(_, _, text) => Ok(text.clone()),
            Datum::Int(n) => Ok(n.to_string()),
            Datum::Float(n) => Ok(n.to_string()),
            Datum::Symbol(s) => Ok(s.clone()),
            Datum::Void => Ok("".to_string()),
            _ => Err(ScriptError::new(format!(
                "Cannot convert datum of type {} to string",
                self.type_str()
            ))),
        }
    }

    pub fn symbol_value(&self) -> Result<String, ScriptError> {
        match self {
            Datum::Symbol(s) => Ok(s.clone()),
            _ => Err(ScriptError::new(format!(
                "Cannot convert datum of type {} to symbol",
                self.type_str()
            ))),
        }
    }

    pub fn bool_value(&self) -> Result<bool, ScriptError> {
        match self {
            Datum::Int(n) => Ok(*n != 0),
            Datum::Float(n) => Ok(*n != 0.0),
            Datum::Str(s) => Ok(!s.is_empty()),
            Datum::StringChunk(_, _, s) => Ok(!s.is_empty()),
            Datum::Symbol(_) => Ok(true),
            Datum::Void => Ok(false),
            Datum::List(items) => Ok(!items.borrow().is_empty()),
            Datum::PropList(entries) => Ok(!entries.borrow().is_empty()),
            // any live reference is truthy
            _ => Ok(true),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Datum::Int(_) | Datum::Float(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Datum::Int(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Datum::Str(_) | Datum::StringChunk(..))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Datum::Symbol(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Datum::List(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Datum::Void)
    }

    pub fn to_list(&self) -> Result<ListHandle, ScriptError> {
        match self {
            Datum::List(items) => Ok(items.clone()),
            _ => Err(ScriptError::new(format!(
                "Expected list, got {}",
                self.type_str()
            ))),
        }
    }

    pub fn to_prop_list(&self) -> Result<PropListHandle, ScriptError> {
        match self {
            Datum::PropList(entries) => Ok(entries.clone()),
            _ => Err(ScriptError::new(format!(
                "Expected prop list, got {}",
                self.type_str()
            ))),
        }
    }

    /// Arg lists and plain lists both answer to call-site flattening.
    pub fn to_flat_args(&self) -> Result<Vec<Datum>, ScriptError> {
        match self {
            Datum::ArgList(items) | Datum::ArgListNoRet(items) => Ok(items.clone()),
            Datum::List(items) => Ok(items.borrow().clone()),
            _ => Err(ScriptError::new(format!(
                "Expected arg list, got {}",
                self.type_str()
            ))),
        }
    }

    pub fn to_point(&self) -> Result<(i32, i32), ScriptError> {
        match self {
            Datum::Point(x, y) => Ok((*x, *y)),
            _ => Err(ScriptError::new(format!(
                "Expected point, got {}",
                self.type_str()
            ))),
        }
    }

    pub fn to_rect(&self) -> Result<(i32, i32, i32, i32), ScriptError> {
        match self {
            Datum::Rect(l, t, r, b) => Ok((*l, *t, *r, *b)),
            _ => Err(ScriptError::new(format!(
                "Expected rect, got {}",
                self.type_str()
            ))),
        }
    }

    pub fn to_member_ref(&self) -> Result<MemberRef, ScriptError> {
        match self {
            Datum::Member(member_ref) => Ok(member_ref.clone()),
            _ => Err(ScriptError::new(format!(
                "Expected member, got {}",
                self.type_str()
            ))),
        }
    }

    pub fn to_sprite_num(&self) -> Result<i16, ScriptError> {
        match self {
            Datum::Sprite(n) => Ok(*n),
            Datum::Int(n) => Ok(*n as i16),
            _ => Err(ScriptError::new(format!(
                "Expected sprite, got {}",
                self.type_str()
            ))),
        }
    }

    pub fn to_instance_ref(&self) -> Result<ScriptInstanceRef, ScriptError> {
        match self {
            Datum::Instance(instance_ref) => Ok(instance_ref.clone()),
            _ => Err(ScriptError::new(format!(
                "Expected script instance, got {}",
                self.type_str()
            ))),
        }
    }

    pub fn to_color_ref(&self) -> Result<ColorRef, ScriptError> {
        match self {
            Datum::Color(color) => Ok(color.clone()),
            _ => Err(ScriptError::new(format!(
                "Expected color, got {}",
                self.type_str()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_clone_aliases_storage() {
        let a = new_list(vec![Datum::Int(1)]);
        let b = a.clone();
        if let Datum::List(items) = &a {
            items.borrow_mut().push(Datum::Int(2));
        }
        assert_eq!(b.to_list().unwrap().borrow().len(), 2);
    }

    #[test]
    fn truthiness_follows_scripting_rules() {
        assert!(!Datum::Void.bool_value().unwrap());
        assert!(!Datum::Str("".to_string()).bool_value().unwrap());
        assert!(Datum::Str("x".to_string()).bool_value().unwrap());
        assert!(Datum::Float(0.5).bool_value().unwrap());
        assert!(!Datum::Int(0).bool_value().unwrap());
        assert!(!new_list(vec![]).bool_value().unwrap());
        assert!(new_list(vec![Datum::Int(0)]).bool_value().unwrap());
    }

    #[test]
    fn slot_number_packs_lib_and_member() {
        let member = member_ref(2, 7);
        assert_eq!(member.slot_number(), (2 << 16) | 7);
        assert_eq!(MemberRef::from_slot_number((2 << 16) | 7), member);
    }
}
