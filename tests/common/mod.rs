//! Shared fixtures: hand-assembled scripts and casts, so the VM tests
//! drive the interpreter without a binary movie file.

use std::cell::RefCell;
use std::rc::Rc;

use fxhash::FxHashMap;

use shockplay::lingo::datum::{Datum, member_ref};
use shockplay::lingo::opcode::OpCode;
use shockplay::movie::chunks::handler::{Bytecode, HandlerDef};
use shockplay::movie::chunks::cast_member::ScriptKind;
use shockplay::player::MoviePlayer;
use shockplay::player::cast_lib::CastLib;
use shockplay::player::script::{Script, ScriptHandler};

pub struct HandlerSpec {
    pub name: &'static str,
    pub args: Vec<&'static str>,
    pub locals: Vec<&'static str>,
    pub code: Vec<(OpCode, i64)>,
}

impl HandlerSpec {
    pub fn new(name: &'static str, code: Vec<(OpCode, i64)>) -> HandlerSpec {
        HandlerSpec {
            name,
            args: vec![],
            locals: vec![],
            code,
        }
    }

    pub fn with_locals(mut self, locals: Vec<&'static str>) -> HandlerSpec {
        self.locals = locals;
        self
    }

    pub fn with_args(mut self, args: Vec<&'static str>) -> HandlerSpec {
        self.args = args;
        self
    }
}

/// Instructions get one byte offset per index, so jump operands are plain
/// index deltas.
fn build_handler(spec: &HandlerSpec) -> ScriptHandler {
    let instructions: Vec<Bytecode> = spec
        .code
        .iter()
        .enumerate()
        .map(|(index, (opcode, operand))| Bytecode {
            opcode: *opcode,
            raw_opcode: 0,
            operand: *operand,
            pos: index,
        })
        .collect();
    let offset_index_map = instructions
        .iter()
        .enumerate()
        .map(|(index, _)| (index, index))
        .collect();
    ScriptHandler {
        name: spec.name.to_string(),
        argument_names: spec.args.iter().map(|s| s.to_string()).collect(),
        local_names: spec.locals.iter().map(|s| s.to_string()).collect(),
        global_names: vec![],
        def: HandlerDef {
            name_id: 0,
            instructions,
            offset_index_map,
            argument_name_ids: vec![],
            local_name_ids: vec![],
            global_name_ids: vec![],
        },
    }
}

pub fn make_script(
    member_number: i32,
    script_number: u16,
    name: &str,
    kind: ScriptKind,
    context_names: Vec<&str>,
    literals: Vec<Datum>,
    property_names: Vec<&str>,
    handlers: Vec<HandlerSpec>,
) -> Rc<Script> {
    Rc::new(Script {
        member_ref: member_ref(1, member_number),
        name: name.to_string(),
        kind,
        literals,
        property_names: property_names.iter().map(|s| s.to_string()).collect(),
        global_names: vec![],
        handlers: handlers
            .iter()
            .map(|spec| Rc::new(build_handler(spec)))
            .collect(),
        context_names: Rc::new(context_names.iter().map(|s| s.to_string()).collect()),
        variable_multiplier: 1,
        script_number,
        static_props: RefCell::new(FxHashMap::default()),
    })
}

/// A player with one internal cast carrying the given scripts.
pub fn player_with_scripts(scripts: Vec<(u32, Rc<Script>)>) -> MoviePlayer {
    let mut player = MoviePlayer::new();
    let mut cast = CastLib::new(1, "Internal".to_string(), String::new());
    for (number, script) in scripts {
        cast.insert_script(number, script);
    }
    player.movie.cast_manager.casts.push(cast);
    player
}

pub fn f32_bits(value: f32) -> i64 {
    value.to_bits() as i64
}
