pub mod bitmap;
pub mod builtins;
pub mod bytecode;
pub mod cast_lib;
pub mod cast_manager;
pub mod cast_member;
pub mod debug;
pub mod eval;
pub mod events;
pub mod font;
pub mod methods;
pub mod movie;
pub mod net;
pub mod scope;
pub mod score;
pub mod script;
pub mod sprite;
pub mod stage;
pub mod timeout;

use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, Local};
use fxhash::FxHashMap;
use log::warn;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::lingo::datum::{Datum, MemberRef, datum_bool, new_list};
use crate::lingo::format::format_datum;
use crate::lingo::opcode::opcode_name;
use crate::movie::MovieFile;

use self::bytecode::dispatch::{HandlerCtx, execute_instruction};
use self::debug::DebugController;
use self::events::{
    dispatch_event_to_instance_quiet, dispatch_global_event, dispatch_sprite_event,
};
use self::font::{NullTextRenderer, TextRenderer};
use self::movie::Movie;
use self::net::{ByteLoader, ContainerParser, NullByteLoader};
use self::scope::{Scope, ScopeRef, ScopeResult};
use self::script::{
    HandlerRef, Script, ScriptHandler, ScriptInstance, ScriptInstanceRef, find_instance_handler,
};
use self::timeout::TimeoutManager;

pub const MAX_SCOPE_DEPTH: usize = 50;

#[derive(Debug, PartialEq, Eq)]
pub enum ScriptErrorCode {
    HandlerNotFound,
    Generic,
}

#[derive(Debug)]
pub struct ScriptError {
    pub code: ScriptErrorCode,
    pub message: String,
}

impl ScriptError {
    pub fn new(message: String) -> ScriptError {
        Self::new_code(ScriptErrorCode::Generic, message)
    }

    pub fn new_code(code: ScriptErrorCode, message: String) -> ScriptError {
        ScriptError { code, message }
    }
}

/// What one executed instruction asks of the interpreter loop.
pub enum OpResult {
    Advance,
    Jump,
    Stop,
}

#[derive(Clone)]
pub struct HandlerInfo {
    pub script_id: u16,
    pub script_name: String,
    pub handler_name: String,
}

#[derive(Clone)]
pub struct InstructionInfo {
    pub script_id: u16,
    pub script_name: String,
    pub handler_name: String,
    pub offset: usize,
    pub opcode: &'static str,
    pub operand: i64,
}

/// Host-side observation of the VM. All methods default to no-ops.
pub trait TraceListener {
    fn on_handler_enter(&mut self, _info: &HandlerInfo) {}
    fn on_handler_exit(&mut self, _info: &HandlerInfo, _return_value: &str) {}
    fn on_instruction(&mut self, _info: &InstructionInfo) {}
    fn on_variable_set(&mut self, _kind: &str, _name: &str, _value: &str) {}
    fn on_error(&mut self, _message: &str) {}
    fn on_debug_message(&mut self, _msg: &str) {}
}

struct NullTraceListener;
impl TraceListener for NullTraceListener {}

/// The player: movie state, the VM's scope pool, and every injected seam.
/// All script execution happens on the thread that drives this struct;
/// only the debug controller is shared with other threads.
pub struct MoviePlayer {
    pub movie: Movie,
    pub globals: FxHashMap<String, Datum>,
    pub scopes: Vec<Scope>,
    scope_count: usize,
    pub timeout_manager: TimeoutManager,
    pub debug: Arc<DebugController>,
    pub trace: Box<dyn TraceListener>,
    pub text_renderer: Box<dyn TextRenderer>,
    pub byte_loader: Box<dyn ByteLoader>,
    pub container_parser: Option<Box<dyn ContainerParser>>,
    pub is_playing: bool,
    pub next_frame: Option<u32>,
    pub start_time: DateTime<Local>,
    pub float_precision: u8,
    pub last_handler_result: Datum,
    pub mouse_loc: (i32, i32),
    pub is_double_click: bool,
    pub external_params: FxHashMap<String, String>,
    pub rng: SmallRng,
    next_instance_id: u32,
    now_ms: u64,
}

impl MoviePlayer {
    pub fn new() -> MoviePlayer {
        let mut player = MoviePlayer {
            movie: Movie::empty(),
            globals: FxHashMap::default(),
            scopes: Vec::with_capacity(MAX_SCOPE_DEPTH),
            scope_count: 0,
            timeout_manager: TimeoutManager::new(),
            debug: Arc::new(DebugController::new()),
            trace: Box::new(NullTraceListener),
            text_renderer: Box::new(NullTextRenderer),
            byte_loader: Box::new(NullByteLoader),
            container_parser: None,
            is_playing: false,
            next_frame: None,
            start_time: Local::now(),
            float_precision: 4,
            last_handler_result: Datum::Void,
            mouse_loc: (0, 0),
            is_double_click: false,
            external_params: FxHashMap::default(),
            rng: SmallRng::seed_from_u64(0x5eed),
            next_instance_id: 1,
            now_ms: 0,
        };
        for i in 0..MAX_SCOPE_DEPTH {
            player.scopes.push(Scope::new(i));
        }
        // the actorList starts as an empty, shared list
        player
            .globals
            .insert("actorList".to_string(), new_list(vec![]));
        player.globals.insert("VOID".to_string(), Datum::Void);
        player
    }

    pub fn load_movie(&mut self, file: MovieFile) {
        self.movie.load_from_file(file);
    }

    // --- scope pool ---

    pub fn push_scope(&mut self) -> Result<ScopeRef, ScriptError> {
        if self.scope_count + 1 >= MAX_SCOPE_DEPTH {
            return Err(ScriptError::new("Stack overflow".to_string()));
        }
        let scope_ref = self.scope_count;
        self.scopes[scope_ref].reset();
        self.scope_count += 1;
        Ok(scope_ref)
    }

    pub fn pop_scope(&mut self) {
        self.scope_count = self.scope_count.saturating_sub(1);
    }

    pub fn current_scope_ref(&self) -> Option<ScopeRef> {
        self.scope_count.checked_sub(1)
    }

    pub fn call_depth(&self) -> usize {
        self.scope_count
    }

    pub fn scope(&self, scope_ref: ScopeRef) -> &Scope {
        &self.scopes[scope_ref]
    }

    pub fn scope_mut(&mut self, scope_ref: ScopeRef) -> &mut Scope {
        &mut self.scopes[scope_ref]
    }

    pub fn alloc_instance_id(&mut self) -> u32 {
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        id
    }

    /// Builds a fresh instance of a parent/behavior script.
    pub fn new_instance(&mut self, script_ref: &MemberRef) -> Result<ScriptInstanceRef, ScriptError> {
        let script = self
            .movie
            .cast_manager
            .get_script_by_ref(script_ref)
            .ok_or_else(|| {
                ScriptError::new(format!("No script member {:?}", script_ref))
            })?;
        let id = self.alloc_instance_id();
        Ok(ScriptInstanceRef::new(ScriptInstance::new(
            id,
            script_ref.clone(),
            &script,
        )))
    }

    // --- handler invocation ---

    pub fn call_handler_ref(
        &mut self,
        receiver: Option<ScriptInstanceRef>,
        handler_ref: &HandlerRef,
        args: Vec<Datum>,
    ) -> Result<ScopeResult, ScriptError> {
        let (script_ref, handler_name) = handler_ref;
        let script = self
            .movie
            .cast_manager
            .get_script_by_ref(script_ref)
            .ok_or_else(|| {
                ScriptError::new_code(
                    ScriptErrorCode::HandlerNotFound,
                    format!("No script for handler {}", handler_name),
                )
            })?;
        let handler = script.handler_named(handler_name).ok_or_else(|| {
            ScriptError::new_code(
                ScriptErrorCode::HandlerNotFound,
                format!("Handler {} not found for script {}", handler_name, script.name),
            )
        })?;
        self.call_handler(script, handler, receiver, args)
    }

    /// Runs one handler to completion. Recursion happens through the call
    /// opcodes; suspension only inside the per-instruction debug hook.
    pub fn call_handler(
        &mut self,
        script: Rc<Script>,
        handler: Rc<ScriptHandler>,
        receiver: Option<ScriptInstanceRef>,
        args: Vec<Datum>,
    ) -> Result<ScopeResult, ScriptError> {
        let scope_ref = self.push_scope()?;
        {
            let scope = self.scope_mut(scope_ref);
            scope.script_ref = script.member_ref.clone();
            scope.handler_name = handler.name.clone();
            scope.receiver = receiver;
            scope.args = args;
            scope.locals = vec![Datum::Void; handler.local_names.len()];
        }

        let info = HandlerInfo {
            script_id: script.script_number,
            script_name: script.name.clone(),
            handler_name: handler.name.clone(),
        };
        self.trace.on_handler_enter(&info);
        let args_snapshot = self
            .scope(scope_ref)
            .args
            .iter()
            .map(|arg| format_datum(arg, self.float_precision))
            .collect();
        self.debug
            .clone()
            .on_handler_enter(&info, args_snapshot, self.call_depth());

        let ctx = HandlerCtx {
            scope_ref,
            script,
            handler,
        };
        let run_result = self.run_scope(&ctx);

        let result = {
            let scope = self.scope(scope_ref);
            ScopeResult {
                return_value: scope.return_value.clone(),
                passed: scope.passed,
            }
        };
        self.last_handler_result = result.return_value.clone();
        let return_text = format_datum(&result.return_value, self.float_precision);
        self.trace.on_handler_exit(&info, &return_text);
        self.debug.clone().on_handler_exit(self.call_depth() - 1);
        self.pop_scope();

        run_result.map(|_| result)
    }

    fn run_scope(&mut self, ctx: &HandlerCtx) -> Result<(), ScriptError> {
        loop {
            let bytecode_index = self.scope(ctx.scope_ref).bytecode_index;
            if bytecode_index >= ctx.handler.def.instructions.len() {
                // handlers without an explicit ret fall off the end
                return Ok(());
            }
            self.instruction_hook(ctx, bytecode_index);
            match execute_instruction(self, ctx)? {
                OpResult::Advance => {
                    self.scope_mut(ctx.scope_ref).bytecode_index += 1;
                }
                OpResult::Jump => {}
                OpResult::Stop => return Ok(()),
            }
        }
    }

    /// The per-instruction trace hook: the only place the player thread
    /// can suspend.
    fn instruction_hook(&mut self, ctx: &HandlerCtx, bytecode_index: usize) {
        let bytecode = &ctx.handler.def.instructions[bytecode_index];
        let info = InstructionInfo {
            script_id: ctx.script.script_number,
            script_name: ctx.script.name.clone(),
            handler_name: ctx.handler.name.clone(),
            offset: bytecode.pos,
            opcode: opcode_name(bytecode.opcode),
            operand: bytecode.operand,
        };
        self.trace.on_instruction(&info);
        let debug = self.debug.clone();
        debug.instruction_hook(self, ctx, &info);
    }

    /// `ext_call` resolution order: builtins beat user handlers; user
    /// handlers resolve through movie scripts, then external casts.
    pub fn call_global_handler(
        &mut self,
        name: &str,
        args: &[Datum],
    ) -> Result<Datum, ScriptError> {
        if builtins::has_builtin(name) {
            return builtins::call_builtin(self, name, args);
        }

        // customFunc(obj, ..) reaches a handler on a script/instance first arg
        if let Some(first) = args.first() {
            let receiver_handler: Option<(Option<ScriptInstanceRef>, HandlerRef)> = match first {
                Datum::Instance(instance_ref) => {
                    let cast_manager = &self.movie.cast_manager;
                    find_instance_handler(instance_ref, name, &|member_ref| {
                        cast_manager.get_script_by_ref(member_ref)
                    })
                    .map(|(receiver, handler_ref)| (Some(receiver), handler_ref))
                }
                Datum::Script(script_ref) => self
                    .movie
                    .cast_manager
                    .find_handler_in_script(script_ref, name)
                    .map(|handler_ref| (None, handler_ref)),
                _ => None,
            };
            if let Some((receiver, handler_ref)) = receiver_handler {
                let result = self.call_handler_ref(receiver, &handler_ref, args[1..].to_vec())?;
                self.propagate_pass(result.passed);
                return Ok(result.return_value);
            }
        }

        if let Some((_, handler_ref)) = self.movie.cast_manager.find_handler(name) {
            let result = self.call_handler_ref(None, &handler_ref, args.to_vec())?;
            self.propagate_pass(result.passed);
            return Ok(result.return_value);
        }

        Err(ScriptError::new_code(
            ScriptErrorCode::HandlerNotFound,
            format!("Handler not found: {}", name),
        ))
    }

    fn propagate_pass(&mut self, passed: bool) {
        if passed {
            if let Some(scope_ref) = self.current_scope_ref() {
                self.scope_mut(scope_ref).passed = true;
            }
        }
    }

    // --- frame loop ---

    /// Starts playback: prepareMovie, then the first frame's sprites come
    /// alive, then startMovie.
    pub fn play(&mut self, now_ms: u64) {
        if self.is_playing {
            return;
        }
        self.is_playing = true;
        self.now_ms = now_ms;
        dispatch_global_event(self, "prepareMovie", &[]);
        self.movie.score.apply_frame_to_sprites(self.movie.current_frame);
        self.begin_sprites_for_frame(self.movie.current_frame);
        self.dispatch_begin_sprites();
        dispatch_global_event(self, "startMovie", &[]);
    }

    pub fn stop(&mut self) {
        if !self.is_playing {
            return;
        }
        dispatch_global_event(self, "stopMovie", &[]);
        self.is_playing = false;
        self.next_frame = None;
        self.timeout_manager.clear();
    }

    /// One scheduler tick: timers, then the in-frame event ladder.
    pub fn tick(&mut self, now_ms: u64) {
        if !self.is_playing {
            return;
        }
        self.now_ms = now_ms;

        timeout::process_timeouts(self, now_ms);

        // 1. stepFrame to the actorList, quiet: no global fallback
        let actors = self.actor_list_snapshot();
        for actor in actors {
            if !self.actor_still_listed(&actor) {
                continue;
            }
            let result = dispatch_event_to_instance_quiet(self, &actor, "stepFrame", &[]);
            if let Err(err) = result {
                self.on_script_error(&err);
                return;
            }
        }

        // 2. stepFrame to behaviors
        dispatch_global_event(self, "stepFrame", &[]);
        // 3. prepareFrame fans out to timeout targets first
        timeout::dispatch_system_event(self, "prepareFrame");
        // 4. then to behaviors and scripts
        dispatch_global_event(self, "prepareFrame", &[]);
        // 5. enterFrame runs inside the frame-script window
        self.movie.score.in_frame_script = true;
        dispatch_global_event(self, "enterFrame", &[]);
        self.movie.score.in_frame_script = false;
    }

    /// End-of-tick transition: exitFrame decides, sprites swap, the new
    /// frame begins.
    pub fn advance_frame(&mut self) {
        if !self.is_playing {
            return;
        }

        timeout::dispatch_system_event(self, "exitFrame");
        dispatch_global_event(self, "exitFrame", &[]);

        // pendingFrame is read only after exitFrame has fully dispatched
        let frame_count = self.movie.frame_count();
        let destination = match self.next_frame.take() {
            Some(frame) => frame.clamp(1, frame_count),
            None => {
                let next = self.movie.current_frame + 1;
                if next > frame_count { 1 } else { next }
            }
        };

        let new_channels = self.movie.score.channels_for_frame(destination);
        let leaving: Vec<i16> = self
            .movie
            .score
            .active_channels
            .difference(&new_channels)
            .copied()
            .collect();
        for channel in leaving {
            dispatch_sprite_event(self, channel, "endSprite", &[]);
            if let Some(sprite) = self.movie.score.get_sprite_mut(channel) {
                sprite.script_instance_list.clear();
                sprite.exited = true;
            }
            self.movie.score.active_channels.remove(&channel);
        }
        self.movie.score.frame_script_instance = None;

        self.movie.current_frame = destination;
        if !self.movie.update_lock {
            self.movie.score.apply_frame_to_sprites(destination);
        }
        self.begin_sprites_for_frame(destination);
        self.dispatch_begin_sprites();
    }

    /// Populates the entered set and builds behavior/frame-script
    /// instances for channels newly active in `frame`.
    fn begin_sprites_for_frame(&mut self, frame: u32) {
        let channels = self.movie.score.channels_for_frame(frame);
        for channel in channels {
            if self.movie.score.active_channels.contains(&channel) {
                continue;
            }
            self.movie.score.active_channels.insert(channel);
            self.movie.score.entered_channels.insert(channel);

            let behaviors = self.movie.score.behaviors_for(frame, channel);
            let mut instances = vec![];
            for script_ref in behaviors {
                match self.new_instance(&script_ref) {
                    Ok(instance) => {
                        let _ = script::instance_set_prop(
                            &instance,
                            "spriteNum",
                            Datum::Int(channel as i32),
                            false,
                        );
                        instances.push(instance);
                    }
                    Err(err) => warn!("behavior on channel {} failed: {}", channel, err.message),
                }
            }
            if let Some(sprite) = self.movie.score.get_sprite_mut(channel) {
                sprite.script_instance_list = instances;
                sprite.exited = false;
            }
        }

        if self.movie.score.frame_script_instance.is_none() {
            if let Some(script_ref) = self.movie.score.frame_script_for(frame) {
                match self.new_instance(&script_ref) {
                    Ok(instance) => self.movie.score.frame_script_instance = Some(instance),
                    Err(err) => warn!("frame script failed: {}", err.message),
                }
            }
        }
    }

    fn dispatch_begin_sprites(&mut self) {
        let entered: Vec<i16> = self.movie.score.entered_channels.iter().copied().collect();
        for channel in entered {
            dispatch_sprite_event(self, channel, "beginSprite", &[]);
        }
        if let Some(instance) = self.movie.score.frame_script_instance.clone() {
            let result = dispatch_event_to_instance_quiet(self, &instance, "beginSprite", &[]);
            if let Err(err) = result {
                self.on_script_error(&err);
            }
        }
        self.movie.score.entered_channels.clear();
    }

    // --- navigation ---

    pub fn go_to_frame(&mut self, frame: i32) {
        if frame >= 1 && frame as u32 <= self.movie.frame_count() {
            self.next_frame = Some(frame as u32);
        }
    }

    /// Unknown labels are a no-op.
    pub fn go_to_label(&mut self, name: &str) {
        if let Some(frame) = self.movie.score.label_to_frame(name) {
            self.next_frame = Some(frame);
        }
    }

    // --- the actorList ---

    pub fn actor_list_snapshot(&self) -> Vec<ScriptInstanceRef> {
        match self.globals.get("actorList") {
            Some(Datum::List(items)) => items
                .borrow()
                .iter()
                .filter_map(|item| match item {
                    Datum::Instance(instance) => Some(instance.clone()),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    fn actor_still_listed(&self, actor: &ScriptInstanceRef) -> bool {
        match self.globals.get("actorList") {
            Some(Datum::List(items)) => items
                .borrow()
                .iter()
                .any(|item| matches!(item, Datum::Instance(other) if other == actor)),
            _ => false,
        }
    }

    // --- movie/environment properties ---

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn get_movie_prop(&mut self, prop: &str) -> Result<Datum, ScriptError> {
        match prop {
            "stage" => Ok(Datum::Stage),
            "time" => Ok(Datum::Str(Local::now().format("%H:%M %p").to_string())),
            "date" => Ok(Datum::Str(Local::now().format("%m/%d/%y").to_string())),
            "milliSeconds" => Ok(Datum::Int(
                Local::now()
                    .signed_duration_since(self.start_time)
                    .num_milliseconds() as i32,
            )),
            "ticks" | "timer" => Ok(Datum::Int(get_elapsed_ticks_since(self.start_time))),
            "platform" => Ok(Datum::Str(platform_string())),
            "runMode" => Ok(Datum::Str("Plugin".to_string())),
            "productVersion" => Ok(Datum::Str("10.1".to_string())),
            "frameTempo" => Ok(Datum::Int(self.movie.puppet_tempo as i32)),
            "frameLabel" => {
                let label = self
                    .movie
                    .score
                    .label_at_or_before(self.movie.current_frame)
                    .map(|label| label.label.clone());
                Ok(Datum::Str(label.unwrap_or_else(|| "0".to_string())))
            }
            "mouseLoc" => Ok(Datum::Point(self.mouse_loc.0, self.mouse_loc.1)),
            "mouseH" => Ok(Datum::Int(self.mouse_loc.0)),
            "mouseV" => Ok(Datum::Int(self.mouse_loc.1)),
            "doubleClick" => Ok(datum_bool(self.is_double_click)),
            "floatPrecision" => Ok(Datum::Int(self.float_precision as i32)),
            "colorDepth" => Ok(Datum::Int(32)),
            "actorList" => Ok(self
                .globals
                .get("actorList")
                .cloned()
                .unwrap_or(Datum::Void)),
            "currentSpriteNum" => {
                let receiver = self
                    .current_scope_ref()
                    .and_then(|scope_ref| self.scope(scope_ref).receiver.clone());
                let sprite_num = receiver
                    .and_then(|instance| script::instance_get_prop_opt(&instance, "spriteNum"))
                    .map(|datum| datum.int_value().unwrap_or(0))
                    .unwrap_or(0);
                Ok(Datum::Int(sprite_num))
            }
            _ => self.movie.get_prop(prop),
        }
    }

    pub fn set_movie_prop(&mut self, prop: &str, value: Datum) -> Result<(), ScriptError> {
        match prop {
            "floatPrecision" => {
                self.float_precision = value.int_value()?.clamp(0, 15) as u8;
                Ok(())
            }
            "actorList" => match value {
                list @ Datum::List(_) => {
                    self.globals.insert("actorList".to_string(), list);
                    Ok(())
                }
                _ => Err(ScriptError::new("actorList must be a list".to_string())),
            },
            _ => self.movie.set_prop(prop, value),
        }
    }

    /// `the paramCount`-style values that read through the active scope.
    pub fn get_the_builtin_prop(
        &mut self,
        scope_ref: ScopeRef,
        prop: &str,
    ) -> Result<Datum, ScriptError> {
        match prop {
            "paramCount" => Ok(Datum::Int(self.scope(scope_ref).args.len() as i32)),
            "result" => Ok(self.last_handler_result.clone()),
            _ => self.get_movie_prop(prop),
        }
    }

    // --- error funnel ---

    pub fn on_script_error(&mut self, err: &ScriptError) {
        warn!("script error: {}", err.message);
        self.trace.on_error(&err.message);
    }

    /// Releases a paused debugger and clears the pool, keeping the movie
    /// loaded.
    pub fn reset(&mut self) {
        self.is_playing = false;
        self.next_frame = None;
        self.scope_count = 0;
        for scope in &mut self.scopes {
            scope.reset();
        }
        self.globals.clear();
        self.globals
            .insert("actorList".to_string(), new_list(vec![]));
        self.globals.insert("VOID".to_string(), Datum::Void);
        self.timeout_manager.clear();
        self.movie.score.reset();
        self.movie.current_frame = 1;
        self.debug.reset();
    }
}

impl Default for MoviePlayer {
    fn default() -> Self {
        MoviePlayer::new()
    }
}

fn get_elapsed_ticks_since(start: DateTime<Local>) -> i32 {
    let millis = Local::now().signed_duration_since(start).num_milliseconds();
    (millis as f64 / (1000.0 / 60.0)) as i32
}

fn platform_string() -> String {
    if cfg!(target_os = "macos") {
        "Macintosh,PowerPC".to_string()
    } else {
        "Windows,32".to_string()
    }
}
