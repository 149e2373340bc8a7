use std::rc::Rc;

use log::warn;

use crate::lingo::opcode::{OpCode, opcode_name};
use crate::movie::chunks::handler::Bytecode;
use crate::player::script::{Script, ScriptHandler};
use crate::player::{MoviePlayer, OpResult, ScriptError};

use super::{arithmetics, compare, flow_control, get_set, sprite_query, stack, string};

/// Everything one instruction needs: the pool slot plus the shared script
/// and handler definitions.
#[derive(Clone)]
pub struct HandlerCtx {
    pub scope_ref: usize,
    pub script: Rc<Script>,
    pub handler: Rc<ScriptHandler>,
}

impl HandlerCtx {
    pub fn current_bytecode<'a>(&'a self, player: &MoviePlayer) -> &'a Bytecode {
        &self.handler.def.instructions[player.scope(self.scope_ref).bytecode_index]
    }

    pub fn operand(&self, player: &MoviePlayer) -> i64 {
        self.current_bytecode(player).operand
    }

    pub fn operand_name(&self, player: &MoviePlayer) -> String {
        self.script.resolve_name(self.operand(player) as u16)
    }

    /// Maps a byte offset to an instruction index; every jump target must
    /// land on one.
    pub fn index_of_offset(&self, offset: usize) -> Result<usize, ScriptError> {
        self.handler.def.index_of_offset(offset).ok_or_else(|| {
            ScriptError::new(format!(
                "Jump lands between instructions: offset {} in {}",
                offset, self.handler.name
            ))
        })
    }
}

pub fn execute_instruction(
    player: &mut MoviePlayer,
    ctx: &HandlerCtx,
) -> Result<OpResult, ScriptError> {
    let opcode = ctx.current_bytecode(player).opcode;
    match opcode {
        // stack primitives
        OpCode::PushZero => stack::push_zero(player, ctx),
        OpCode::PushInt8 | OpCode::PushInt16 | OpCode::PushInt32 => stack::push_int(player, ctx),
        OpCode::PushFloat32 => stack::push_float32(player, ctx),
        OpCode::PushCons => stack::push_cons(player, ctx),
        OpCode::PushSymb => stack::push_symb(player, ctx),
        OpCode::PushList => stack::push_list(player, ctx),
        OpCode::PushPropList => stack::push_prop_list(player, ctx),
        OpCode::PushArgList => stack::push_arg_list(player, ctx),
        OpCode::PushArgListNoRet => stack::push_arg_list_no_ret(player, ctx),
        OpCode::PushVarRef => stack::push_var_ref(player, ctx),
        OpCode::PushChunkVarRef => stack::push_chunk_var_ref(player, ctx),
        OpCode::Peek => stack::peek(player, ctx),
        OpCode::Pop => stack::pop(player, ctx),
        OpCode::Swap => stack::swap(player, ctx),
        OpCode::NewObj => stack::new_obj(player, ctx),

        // arithmetic
        OpCode::Add => arithmetics::add(player, ctx),
        OpCode::Sub => arithmetics::sub(player, ctx),
        OpCode::Mul => arithmetics::mul(player, ctx),
        OpCode::Div => arithmetics::div(player, ctx),
        OpCode::Mod => arithmetics::mod_op(player, ctx),
        OpCode::Inv => arithmetics::inv(player, ctx),

        // comparison and logic
        OpCode::Lt => compare::lt(player, ctx),
        OpCode::LtEq => compare::lt_eq(player, ctx),
        OpCode::Gt => compare::gt(player, ctx),
        OpCode::GtEq => compare::gt_eq(player, ctx),
        OpCode::Eq => compare::eq(player, ctx),
        OpCode::NtEq => compare::nt_eq(player, ctx),
        OpCode::And => compare::and(player, ctx),
        OpCode::Or => compare::or(player, ctx),
        OpCode::Not => compare::not(player, ctx),

        // strings and chunks
        OpCode::JoinStr => string::join_str(player, ctx),
        OpCode::JoinPadStr => string::join_pad_str(player, ctx),
        OpCode::ContainsStr => string::contains_str(player, ctx),
        OpCode::Contains0Str => string::contains_0str(player, ctx),
        OpCode::GetChunk => string::get_chunk(player, ctx),
        OpCode::PutChunk => string::put_chunk(player, ctx),
        OpCode::DeleteChunk => string::delete_chunk(player, ctx),
        OpCode::Put => string::put(player, ctx),
        OpCode::GetField => string::get_field(player, ctx),

        // control flow
        OpCode::Ret => flow_control::ret(player, ctx),
        OpCode::RetFactory => flow_control::ret_factory(player, ctx),
        OpCode::Jmp => flow_control::jmp(player, ctx),
        OpCode::JmpIfZ => flow_control::jmp_if_zero(player, ctx),
        OpCode::EndRepeat => flow_control::end_repeat(player, ctx),
        OpCode::ExtCall => flow_control::ext_call(player, ctx),
        OpCode::LocalCall => flow_control::local_call(player, ctx),
        OpCode::ObjCall | OpCode::ObjCallV4 => flow_control::obj_call(player, ctx),
        OpCode::StartTell => flow_control::start_tell(player, ctx),
        OpCode::EndTell => flow_control::end_tell(player, ctx),
        OpCode::TellCall => flow_control::tell_call(player, ctx),

        // variables and properties
        OpCode::GetGlobal | OpCode::GetGlobal2 => get_set::get_global(player, ctx),
        OpCode::SetGlobal | OpCode::SetGlobal2 => get_set::set_global(player, ctx),
        OpCode::GetLocal => get_set::get_local(player, ctx),
        OpCode::SetLocal => get_set::set_local(player, ctx),
        OpCode::GetParam => get_set::get_param(player, ctx),
        OpCode::SetParam => get_set::set_param(player, ctx),
        OpCode::GetProp => get_set::get_prop(player, ctx),
        OpCode::SetProp => get_set::set_prop(player, ctx),
        OpCode::GetObjProp => get_set::get_obj_prop_op(player, ctx),
        OpCode::SetObjProp => get_set::set_obj_prop_op(player, ctx),
        OpCode::GetChainedProp => get_set::get_chained_prop(player, ctx),
        OpCode::GetMovieProp => get_set::get_movie_prop(player, ctx),
        OpCode::SetMovieProp => get_set::set_movie_prop(player, ctx),
        OpCode::GetTopLevelProp => get_set::get_top_level_prop(player, ctx),
        OpCode::TheBuiltin => get_set::the_builtin(player, ctx),
        OpCode::Get => get_set::get(player, ctx),
        OpCode::Set => get_set::set(player, ctx),

        // sprites
        OpCode::OntoSpr => sprite_query::onto_sprite(player, ctx),
        OpCode::IntoSpr => sprite_query::into_sprite(player, ctx),

        _ => {
            // unimplemented opcodes log and continue rather than abort
            warn!(
                "no handler for opcode {} ({:#04x}) in {}",
                opcode_name(opcode),
                ctx.current_bytecode(player).raw_opcode,
                ctx.handler.name
            );
            Ok(OpResult::Advance)
        }
    }
}
