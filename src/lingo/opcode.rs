use num_derive::{FromPrimitive, ToPrimitive};

#[derive(Copy, Clone, FromPrimitive, ToPrimitive, PartialEq, Eq, Hash, Debug)]
pub enum OpCode {
    // single-byte
    Invalid = 0x00,
    Ret = 0x01,
    RetFactory = 0x02,
    PushZero = 0x03,
    Mul = 0x04,
    Add = 0x05,
    Sub = 0x06,
    Div = 0x07,
    Mod = 0x08,
    Inv = 0x09,
    JoinStr = 0x0a,
    JoinPadStr = 0x0b,
    Lt = 0x0c,
    LtEq = 0x0d,
    NtEq = 0x0e,
    Eq = 0x0f,
    Gt = 0x10,
    GtEq = 0x11,
    And = 0x12,
    Or = 0x13,
    Not = 0x14,
    ContainsStr = 0x15,
    Contains0Str = 0x16,
    GetChunk = 0x17,
    HiliteChunk = 0x18,
    OntoSpr = 0x19,
    IntoSpr = 0x1a,
    GetField = 0x1b,
    StartTell = 0x1c,
    EndTell = 0x1d,
    PushList = 0x1e,
    PushPropList = 0x1f,
    Swap = 0x21,

    // multi-byte
    PushInt8 = 0x41,
    PushArgListNoRet = 0x42,
    PushArgList = 0x43,
    PushCons = 0x44,
    PushSymb = 0x45,
    PushVarRef = 0x46,
    GetGlobal2 = 0x48,
    GetGlobal = 0x49,
    GetProp = 0x4a,
    GetParam = 0x4b,
    GetLocal = 0x4c,
    SetGlobal2 = 0x4e,
    SetGlobal = 0x4f,
    SetProp = 0x50,
    SetParam = 0x51,
    SetLocal = 0x52,
    Jmp = 0x53,
    EndRepeat = 0x54,
    JmpIfZ = 0x55,
    LocalCall = 0x56,
    ExtCall = 0x57,
    ObjCallV4 = 0x58,
    Put = 0x59,
    PutChunk = 0x5a,
    DeleteChunk = 0x5b,
    Get = 0x5c,
    Set = 0x5d,
    GetMovieProp = 0x5f,
    SetMovieProp = 0x60,
    GetObjProp = 0x61,
    SetObjProp = 0x62,
    TellCall = 0x63,
    Peek = 0x64,
    Pop = 0x65,
    TheBuiltin = 0x66,
    ObjCall = 0x67,
    PushChunkVarRef = 0x6d,
    PushInt16 = 0x6e,
    PushInt32 = 0x6f,
    GetChainedProp = 0x70,
    PushFloat32 = 0x71,
    GetTopLevelProp = 0x72,
    NewObj = 0x73,
}

impl OpCode {
    /// Multi-byte variants of a mnemonic share the low six bits.
    pub fn from_raw(raw: u16) -> OpCode {
        let normalized = if raw >= 0x40 { 0x40 + raw % 0x40 } else { raw };
        num::FromPrimitive::from_u16(normalized).unwrap_or(OpCode::Invalid)
    }
}

pub fn opcode_name(op: OpCode) -> &'static str {
    match op {
        OpCode::Invalid => "invalid",
        OpCode::Ret => "ret",
        OpCode::RetFactory => "ret_factory",
        OpCode::PushZero => "push_zero",
        OpCode::Mul => "mul",
        OpCode::Add => "add",
        OpCode::Sub => "sub",
        OpCode::Div => "div",
        OpCode::Mod => "mod",
        OpCode::Inv => "inv",
        OpCode::JoinStr => "join_str",
        OpCode::JoinPadStr => "join_pad_str",
        OpCode::Lt => "lt",
        OpCode::LtEq => "lt_eq",
        OpCode::NtEq => "nt_eq",
        OpCode::Eq => "eq",
        OpCode::Gt => "gt",
        OpCode::GtEq => "gt_eq",
        OpCode::And => "and",
        OpCode::Or => "or",
        OpCode::Not => "not",
        OpCode::ContainsStr => "contains_str",
        OpCode::Contains0Str => "contains_0str",
        OpCode::GetChunk => "get_chunk",
        OpCode::HiliteChunk => "hilite_chunk",
        OpCode::OntoSpr => "onto_spr",
        OpCode::IntoSpr => "into_spr",
        OpCode::GetField => "get_field",
        OpCode::StartTell => "start_tell",
        OpCode::EndTell => "end_tell",
        OpCode::PushList => "push_list",
        OpCode::PushPropList => "push_prop_list",
        OpCode::Swap => "swap",
        OpCode::PushInt8 => "push_int8",
        OpCode::PushArgListNoRet => "push_arg_list_no_ret",
        OpCode::PushArgList => "push_arg_list",
        OpCode::PushCons => "push_cons",
        OpCode::PushSymb => "push_symb",
        OpCode::PushVarRef => "push_var_ref",
        OpCode::GetGlobal2 => "get_global2",
        OpCode::GetGlobal => "get_global",
        OpCode::GetProp => "get_prop",
        OpCode::GetParam => "get_param",
        OpCode::GetLocal => "get_local",
        OpCode::SetGlobal2 => "set_global2",
        OpCode::SetGlobal => "set_global",
        OpCode::SetProp => "set_prop",
        OpCode::SetParam => "set_param",
        OpCode::SetLocal => "set_local",
        OpCode::Jmp => "jmp",
        OpCode::EndRepeat => "end_repeat",
        OpCode::JmpIfZ => "jmp_if_z",
        OpCode::LocalCall => "local_call",
        OpCode::ExtCall => "ext_call",
        OpCode::ObjCallV4 => "obj_call_v4",
        OpCode::Put => "put",
        OpCode::PutChunk => "put_chunk",
        OpCode::DeleteChunk => "delete_chunk",
        OpCode::Get => "get",
        OpCode::Set => "set",
        OpCode::GetMovieProp => "get_movie_prop",
        OpCode::SetMovieProp => "set_movie_prop",
        OpCode::GetObjProp => "get_obj_prop",
        OpCode::SetObjProp => "set_obj_prop",
        OpCode::TellCall => "tell_call",
        OpCode::Peek => "peek",
        OpCode::Pop => "pop",
        OpCode::TheBuiltin => "the_builtin",
        OpCode::ObjCall => "obj_call",
        OpCode::PushChunkVarRef => "push_chunk_var_ref",
        OpCode::PushInt16 => "push_int16",
        OpCode::PushInt32 => "push_int32",
        OpCode::GetChainedProp => "get_chained_prop",
        OpCode::PushFloat32 => "push_float32",
        OpCode::GetTopLevelProp => "get_top_level_prop",
        OpCode::NewObj => "new_obj",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_byte_variants_normalize() {
        // push_int8 appears with 1-, 2- and 4-byte operands
        assert_eq!(OpCode::from_raw(0x41), OpCode::PushInt8);
        assert_eq!(OpCode::from_raw(0x81), OpCode::PushInt8);
        assert_eq!(OpCode::from_raw(0xc1), OpCode::PushInt8);
        assert_eq!(OpCode::from_raw(0x01), OpCode::Ret);
    }

    #[test]
    fn unknown_raw_maps_to_invalid() {
        assert_eq!(OpCode::from_raw(0x3f), OpCode::Invalid);
    }
}
