//! The synchronous debugger: breakpoints, stepping, pause/resume and
//! snapshot publication. The controller is the only object shared between
//! the player thread and the host UI; the player thread blocks inside
//! `instruction_hook` while paused, and every UI control method just
//! flips state under the lock and signals the condvar.
//!
//! Listener callbacks fire on whichever thread triggers them; hosts that
//! need a particular scheduler marshal inside their listener.

pub mod breakpoint;
pub mod snapshot;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex};

use log::warn;

use crate::lingo::format::format_datum;
use crate::player::bytecode::dispatch::HandlerCtx;
use crate::player::eval;
use crate::player::{HandlerInfo, InstructionInfo, MoviePlayer};

pub use breakpoint::{Breakpoint, BreakpointStore};
pub use snapshot::{DebugSnapshot, StackFrameInfo, WatchExpression, WatchValue};

pub trait DebugStateListener: Send {
    fn on_paused(&mut self, _snapshot: &DebugSnapshot) {}
    fn on_resumed(&mut self) {}
    fn on_breakpoints_changed(&mut self) {}
    fn on_log_point_hit(&mut self, _breakpoint: &Breakpoint, _message: &str) {}
    fn on_watch_expressions_changed(&mut self) {}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum StepMode {
    Running,
    Into,
    Over { target_depth: usize },
    Out { target_depth: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum StepCommand {
    Into,
    Over,
    Out,
    Continue,
}

struct ControlState {
    mode: StepMode,
    pause_requested: bool,
    paused: bool,
    pending_command: Option<StepCommand>,
    reset_requested: bool,
    call_stack: Vec<StackFrameInfo>,
}

pub struct DebugController {
    state: Mutex<ControlState>,
    resume: Condvar,
    breakpoints: Mutex<BreakpointStore>,
    listener: Mutex<Option<Box<dyn DebugStateListener>>>,
    watches: Mutex<Vec<WatchExpression>>,
    next_watch_id: AtomicU32,
}

impl DebugController {
    pub fn new() -> DebugController {
        DebugController {
            state: Mutex::new(ControlState {
                mode: StepMode::Running,
                pause_requested: false,
                paused: false,
                pending_command: None,
                reset_requested: false,
                call_stack: vec![],
            }),
            resume: Condvar::new(),
            breakpoints: Mutex::new(BreakpointStore::new()),
            listener: Mutex::new(None),
            watches: Mutex::new(vec![]),
            next_watch_id: AtomicU32::new(1),
        }
    }

    // --- host-facing control surface ---

    pub fn set_listener(&self, listener: Box<dyn DebugStateListener>) {
        *self.listener.lock().unwrap() = Some(listener);
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    /// Break on the next instruction.
    pub fn request_pause(&self) {
        self.state.lock().unwrap().pause_requested = true;
    }

    pub fn step_into(&self) {
        self.post_command(StepCommand::Into);
    }

    pub fn step_over(&self) {
        self.post_command(StepCommand::Over);
    }

    pub fn step_out(&self) {
        self.post_command(StepCommand::Out);
    }

    pub fn resume(&self) {
        self.post_command(StepCommand::Continue);
    }

    fn post_command(&self, command: StepCommand) {
        let mut state = self.state.lock().unwrap();
        state.pending_command = Some(command);
        self.resume.notify_all();
    }

    /// Releases a blocked VM without running further pause logic, drains
    /// any queued step command and returns the controller to RUNNING.
    pub fn reset(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.mode = StepMode::Running;
            state.pause_requested = false;
            state.pending_command = None;
            state.reset_requested = true;
            state.call_stack.clear();
            self.resume.notify_all();
        }
        self.breakpoints.lock().unwrap().reset_hit_counts();
    }

    // --- breakpoints ---

    pub fn add_breakpoint(&self, breakpoint: Breakpoint) {
        self.breakpoints.lock().unwrap().add(breakpoint);
        self.notify(|listener| listener.on_breakpoints_changed());
    }

    pub fn remove_breakpoint(&self, script_id: u16, offset: usize) {
        self.breakpoints.lock().unwrap().remove(script_id, offset);
        self.notify(|listener| listener.on_breakpoints_changed());
    }

    pub fn toggle_breakpoint(&self, script_id: u16, offset: usize) {
        self.breakpoints.lock().unwrap().toggle(script_id, offset);
        self.notify(|listener| listener.on_breakpoints_changed());
    }

    pub fn clear_breakpoints(&self) {
        self.breakpoints.lock().unwrap().clear();
        self.notify(|listener| listener.on_breakpoints_changed());
    }

    pub fn breakpoints_json(&self) -> String {
        self.breakpoints.lock().unwrap().to_json()
    }

    pub fn load_breakpoints(&self, text: &str) {
        *self.breakpoints.lock().unwrap() = BreakpointStore::load(text);
        self.notify(|listener| listener.on_breakpoints_changed());
    }

    pub fn breakpoint_list(&self) -> Vec<Breakpoint> {
        self.breakpoints.lock().unwrap().all().to_vec()
    }

    // --- watches ---

    pub fn add_watch(&self, expression: &str) -> u32 {
        let id = self.next_watch_id.fetch_add(1, Ordering::Relaxed);
        self.watches.lock().unwrap().push(WatchExpression {
            id,
            expression: expression.to_string(),
        });
        self.notify(|listener| listener.on_watch_expressions_changed());
        id
    }

    pub fn remove_watch(&self, id: u32) {
        self.watches.lock().unwrap().retain(|watch| watch.id != id);
        self.notify(|listener| listener.on_watch_expressions_changed());
    }

    pub fn watch_list(&self) -> Vec<WatchExpression> {
        self.watches.lock().unwrap().clone()
    }

    // --- player-thread hooks ---

    pub fn on_handler_enter(&self, info: &HandlerInfo, args: Vec<String>, _depth: usize) {
        let mut state = self.state.lock().unwrap();
        state.call_stack.push(StackFrameInfo {
            script_id: info.script_id,
            script_name: info.script_name.clone(),
            handler_name: info.handler_name.clone(),
            args,
        });
    }

    /// `depth` is the call depth after the handler unwinds. Stepping OUT
    /// becomes stepping INTO once the target depth is reached.
    pub fn on_handler_exit(&self, depth: usize) {
        let mut state = self.state.lock().unwrap();
        state.call_stack.pop();
        if let StepMode::Out { target_depth } = state.mode {
            if depth <= target_depth {
                state.mode = StepMode::Into;
            }
        }
    }

    /// The per-instruction decision, in strict order: explicit pause
    /// request, step-depth suppression, breakpoints, then step mode.
    pub fn instruction_hook(
        &self,
        player: &mut MoviePlayer,
        ctx: &HandlerCtx,
        info: &InstructionInfo,
    ) {
        let depth = player.call_depth();

        let mut pause = {
            let mut state = self.state.lock().unwrap();
            if state.pause_requested {
                state.pause_requested = false;
                true
            } else {
                false
            }
        };

        // inside a deeper call than the step target, breakpoints are
        // suppressed but their hit counts still advance
        let suppressed = {
            let state = self.state.lock().unwrap();
            match state.mode {
                StepMode::Over { target_depth } | StepMode::Out { target_depth } => {
                    depth > target_depth
                }
                _ => false,
            }
        };

        let mut log_hit: Option<(Breakpoint, String)> = None;
        if !pause {
            let found = self
                .breakpoints
                .lock()
                .unwrap()
                .find(info.script_id, info.offset)
                .cloned();
            if let Some(bp) = found {
                if bp.enabled && self.condition_holds(player, &bp) {
                    let (hit_count, threshold, log_message) = {
                        let mut store = self.breakpoints.lock().unwrap();
                        match store.find_mut(info.script_id, info.offset) {
                            Some(bp) => {
                                bp.hit_count += 1;
                                (bp.hit_count, bp.hit_count_threshold, bp.log_message.clone())
                            }
                            None => (0, 0, None),
                        }
                    };
                    if let Some(message) = log_message {
                        // log points never pause
                        let interpolated = interpolate_log_message(player, &message);
                        let mut updated = bp.clone();
                        updated.hit_count = hit_count;
                        log_hit = Some((updated, interpolated));
                    } else if !suppressed && (threshold == 0 || hit_count >= threshold) {
                        pause = true;
                    }
                }
            }
        }

        if !pause && !suppressed {
            let state = self.state.lock().unwrap();
            pause = match state.mode {
                StepMode::Into => true,
                StepMode::Over { target_depth } => depth <= target_depth,
                _ => false,
            };
        }

        if let Some((bp, message)) = log_hit {
            self.notify(|listener| listener.on_log_point_hit(&bp, &message));
        }

        if pause {
            self.enter_pause(player, ctx, info, depth);
        }
    }

    /// Fail-open: a condition that errors does not pause.
    fn condition_holds(&self, player: &mut MoviePlayer, bp: &Breakpoint) -> bool {
        match &bp.condition {
            None => true,
            Some(condition) => match eval::eval_expression_text(player, condition) {
                Ok(value) => value.bool_value().unwrap_or(false),
                Err(err) => {
                    warn!("breakpoint condition failed: {}", err.message);
                    false
                }
            },
        }
    }

    /// Publishes a snapshot and blocks the player thread until the host
    /// releases it (or `reset` fires).
    fn enter_pause(
        &self,
        player: &mut MoviePlayer,
        ctx: &HandlerCtx,
        info: &InstructionInfo,
        depth: usize,
    ) {
        let snapshot = self.build_snapshot(player, ctx, info);
        {
            let mut state = self.state.lock().unwrap();
            state.paused = true;
            state.pending_command = None;
        }
        self.notify(|listener| listener.on_paused(&snapshot));

        let mut state = self.state.lock().unwrap();
        loop {
            if state.reset_requested {
                state.reset_requested = false;
                state.paused = false;
                state.mode = StepMode::Running;
                drop(state);
                self.notify(|listener| listener.on_resumed());
                return;
            }
            if let Some(command) = state.pending_command.take() {
                state.mode = match command {
                    StepCommand::Into => StepMode::Into,
                    StepCommand::Over => StepMode::Over {
                        target_depth: depth,
                    },
                    StepCommand::Out => StepMode::Out {
                        target_depth: depth.saturating_sub(1),
                    },
                    StepCommand::Continue => StepMode::Running,
                };
                state.paused = false;
                drop(state);
                self.notify(|listener| listener.on_resumed());
                return;
            }
            state = self.resume.wait(state).unwrap();
        }
    }

    fn build_snapshot(
        &self,
        player: &mut MoviePlayer,
        ctx: &HandlerCtx,
        info: &InstructionInfo,
    ) -> DebugSnapshot {
        let precision = player.float_precision;
        let scope_ref = ctx.scope_ref;

        let stack: Vec<String> = player
            .scope(scope_ref)
            .stack
            .iter()
            .map(|d| format_datum(d, precision))
            .collect();
        let locals: Vec<(String, String)> = player
            .scope(scope_ref)
            .locals
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let name = ctx
                    .handler
                    .local_names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("local{}", i));
                (name, format_datum(value, precision))
            })
            .collect();
        let args: Vec<(String, String)> = player
            .scope(scope_ref)
            .args
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let name = ctx
                    .handler
                    .argument_names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("arg{}", i));
                (name, format_datum(value, precision))
            })
            .collect();
        let mut globals: Vec<(String, String)> = player
            .globals
            .iter()
            .map(|(name, value)| (name.clone(), format_datum(value, precision)))
            .collect();
        globals.sort_by(|a, b| a.0.cmp(&b.0));
        let receiver = player
            .scope(scope_ref)
            .receiver
            .as_ref()
            .map(|instance| format!("<offspring #{}>", instance.borrow().instance_id));

        let watch_list = self.watch_list();
        let watches = watch_list
            .into_iter()
            .map(|watch| match eval::eval_expression_text(player, &watch.expression) {
                Ok(value) => WatchValue {
                    id: watch.id,
                    expression: watch.expression,
                    value: format_datum(&value, precision),
                    error: None,
                },
                Err(err) => WatchValue {
                    id: watch.id,
                    expression: watch.expression,
                    value: String::new(),
                    error: Some(err.message),
                },
            })
            .collect();

        DebugSnapshot {
            script_id: info.script_id,
            script_name: info.script_name.clone(),
            handler_name: info.handler_name.clone(),
            offset: info.offset,
            opcode: info.opcode.to_string(),
            operand: info.operand,
            stack,
            locals,
            args,
            globals,
            receiver,
            call_stack: self.state.lock().unwrap().call_stack.clone(),
            watches,
        }
    }

    fn notify(&self, f: impl FnOnce(&mut dyn DebugStateListener)) {
        if let Some(listener) = self.listener.lock().unwrap().as_mut() {
            f(listener.as_mut());
        }
    }
}

impl Default for DebugController {
    fn default() -> Self {
        DebugController::new()
    }
}

/// `{expr}` fragments interpolate against the paused scope; a failed
/// fragment keeps its text in angle brackets.
pub fn interpolate_log_message(player: &mut MoviePlayer, message: &str) -> String {
    let mut result = String::new();
    let mut rest = message;
    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let fragment = &after_open[..close];
                match eval::eval_expression_text(player, fragment) {
                    Ok(value) => {
                        result.push_str(&crate::lingo::format::format_datum_for_put(
                            &value,
                            player.float_precision,
                        ));
                    }
                    Err(_) => {
                        result.push('<');
                        result.push_str(fragment);
                        result.push('>');
                    }
                }
                rest = &after_open[close + 1..];
            }
            None => {
                result.push('{');
                rest = after_open;
            }
        }
    }
    result.push_str(rest);
    result
}
