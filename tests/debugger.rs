mod common;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use common::{HandlerSpec, make_script, player_with_scripts};
use shockplay::lingo::datum::{Datum, member_ref};
use shockplay::lingo::opcode::OpCode;
use shockplay::movie::chunks::cast_member::ScriptKind;
use shockplay::player::debug::{
    Breakpoint, DebugController, DebugSnapshot, DebugStateListener,
};
use shockplay::player::script::{ScriptInstance, ScriptInstanceRef};

#[derive(Clone, Copy, Debug)]
enum Step {
    Into,
    Over,
    Continue,
    Reset,
}

/// Replays a scripted command per pause. The controller invokes the
/// listener on the player thread *before* blocking, so posting the next
/// command from inside `on_paused` releases the pause immediately.
struct ScriptedDebugger {
    controller: Arc<DebugController>,
    commands: Mutex<VecDeque<Step>>,
    pauses: Arc<Mutex<Vec<DebugSnapshot>>>,
    log_hits: Arc<Mutex<Vec<String>>>,
}

impl DebugStateListener for ScriptedDebugger {
    fn on_paused(&mut self, snapshot: &DebugSnapshot) {
        self.pauses.lock().unwrap().push(snapshot.clone());
        let next = self
            .commands
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Continue);
        match next {
            Step::Into => self.controller.step_into(),
            Step::Over => self.controller.step_over(),
            Step::Continue => self.controller.resume(),
            Step::Reset => self.controller.reset(),
        }
    }

    fn on_log_point_hit(&mut self, _breakpoint: &Breakpoint, message: &str) {
        self.log_hits.lock().unwrap().push(message.to_string());
    }
}

struct Harness {
    pauses: Arc<Mutex<Vec<DebugSnapshot>>>,
    log_hits: Arc<Mutex<Vec<String>>>,
}

fn install_debugger(
    player: &shockplay::player::MoviePlayer,
    commands: Vec<Step>,
) -> Harness {
    let pauses = Arc::new(Mutex::new(vec![]));
    let log_hits = Arc::new(Mutex::new(vec![]));
    player.debug.set_listener(Box::new(ScriptedDebugger {
        controller: player.debug.clone(),
        commands: Mutex::new(commands.into()),
        pauses: pauses.clone(),
        log_hits: log_hits.clone(),
    }));
    Harness { pauses, log_hits }
}

/// i = 1; repeat while i <= 10: i = i + 1 — the loop body head sits at
/// offset 6.
fn loop_script() -> std::rc::Rc<shockplay::player::script::Script> {
    make_script(
        1,
        1,
        "Loop",
        ScriptKind::Movie,
        vec![],
        vec![],
        vec![],
        vec![
            HandlerSpec::new(
                "spin",
                vec![
                    (OpCode::PushInt8, 1),
                    (OpCode::SetLocal, 0),
                    (OpCode::GetLocal, 0),
                    (OpCode::PushInt8, 10),
                    (OpCode::LtEq, 0),
                    (OpCode::JmpIfZ, 6),
                    (OpCode::GetLocal, 0),
                    (OpCode::PushInt8, 1),
                    (OpCode::Add, 0),
                    (OpCode::SetLocal, 0),
                    (OpCode::EndRepeat, 8),
                    (OpCode::Ret, 0),
                ],
            )
            .with_locals(vec!["i"]),
        ],
    )
}

#[test]
fn conditional_breakpoint_pauses_exactly_once() {
    let mut player = player_with_scripts(vec![(1, loop_script())]);
    let harness = install_debugger(&player, vec![Step::Continue]);

    let mut bp = Breakpoint::at(1, 6);
    bp.condition = Some("i = 7".to_string());
    player.debug.add_breakpoint(bp);

    player
        .call_handler_ref(None, &(member_ref(1, 1), "spin".to_string()), vec![])
        .unwrap();

    let pauses = harness.pauses.lock().unwrap();
    assert_eq!(pauses.len(), 1, "condition i = 7 must pause exactly once");
    let locals = &pauses[0].locals;
    assert!(
        locals.iter().any(|(name, value)| name == "i" && value == "7"),
        "paused with locals {:?}",
        locals
    );
    assert!(!player.debug.is_paused());
}

#[test]
fn hit_count_threshold_pauses_on_nth_encounter() {
    let mut player = player_with_scripts(vec![(1, loop_script())]);
    let harness = install_debugger(&player, vec![Step::Continue; 10]);

    let mut bp = Breakpoint::at(1, 6);
    bp.hit_count_threshold = 4;
    player.debug.add_breakpoint(bp);

    player
        .call_handler_ref(None, &(member_ref(1, 1), "spin".to_string()), vec![])
        .unwrap();

    // the body runs 10 times; encounters 4..10 all satisfy the threshold
    let pauses = harness.pauses.lock().unwrap();
    assert_eq!(pauses.len(), 7);
    let first = &pauses[0];
    assert!(first.locals.iter().any(|(n, v)| n == "i" && v == "4"));
    let final_count = player
        .debug
        .breakpoint_list()
        .first()
        .map(|bp| bp.hit_count)
        .unwrap_or(0);
    assert_eq!(final_count, 10, "every encounter counts a hit");
}

#[test]
fn log_points_interpolate_and_never_pause() {
    let script = make_script(
        1,
        1,
        "Widgetry",
        ScriptKind::Parent,
        vec![],
        vec![],
        vec!["name"],
        vec![
            HandlerSpec::new(
                "report",
                vec![
                    (OpCode::PushInt8, 42),
                    (OpCode::SetLocal, 0),
                    (OpCode::PushZero, 0),
                    (OpCode::Ret, 0),
                ],
            )
            .with_locals(vec!["i"]),
        ],
    );
    let mut player = player_with_scripts(vec![(1, script)]);
    let harness = install_debugger(&player, vec![]);

    let mut bp = Breakpoint::at(1, 2);
    bp.log_message = Some("i={i}, name={me.name}".to_string());
    player.debug.add_breakpoint(bp);

    let receiver = ScriptInstanceRef::new(ScriptInstance {
        instance_id: 1,
        script: member_ref(1, 1),
        ancestor: None,
        properties: Default::default(),
    });
    receiver
        .borrow_mut()
        .properties
        .insert("name".to_string(), Datum::Str("Widget".to_string()));

    player
        .call_handler_ref(
            Some(receiver),
            &(member_ref(1, 1), "report".to_string()),
            vec![],
        )
        .unwrap();

    assert!(harness.pauses.lock().unwrap().is_empty(), "log points never pause");
    let hits = harness.log_hits.lock().unwrap();
    assert_eq!(hits.as_slice(), ["i=42, name=Widget"]);
}

#[test]
fn step_over_skips_nested_calls() {
    // outer calls inner; stepping over from the breakpoint must pause at
    // outer's next instruction, not inside inner
    let script = make_script(
        1,
        1,
        "Nest",
        ScriptKind::Movie,
        vec!["inner"],
        vec![],
        vec![],
        vec![
            HandlerSpec::new(
                "outer",
                vec![
                    (OpCode::PushZero, 0), // breakpoint here
                    (OpCode::PushArgList, 0),
                    (OpCode::ExtCall, 0), // inner()
                    (OpCode::PushInt8, 5),
                    (OpCode::Ret, 0),
                ],
            ),
            HandlerSpec::new(
                "inner",
                vec![
                    (OpCode::PushInt8, 1),
                    (OpCode::PushInt8, 2),
                    (OpCode::Add, 0),
                    (OpCode::Ret, 0),
                ],
            ),
        ],
    );
    let mut player = player_with_scripts(vec![(1, script)]);
    let harness = install_debugger(&player, vec![Step::Over, Step::Continue]);

    player.debug.add_breakpoint(Breakpoint::at(1, 0));
    player
        .call_handler_ref(None, &(member_ref(1, 1), "outer".to_string()), vec![])
        .unwrap();

    let pauses = harness.pauses.lock().unwrap();
    assert!(pauses.len() >= 2);
    assert_eq!(pauses[0].handler_name, "outer");
    assert_eq!(pauses[0].offset, 0);
    assert_eq!(
        pauses[1].handler_name, "outer",
        "step over must not stop inside inner()"
    );
    assert_eq!(pauses[1].offset, 1);
}

#[test]
fn step_into_descends_into_calls() {
    let script = make_script(
        1,
        1,
        "Nest",
        ScriptKind::Movie,
        vec!["inner"],
        vec![],
        vec![],
        vec![
            HandlerSpec::new(
                "outer",
                vec![
                    (OpCode::PushArgList, 0),
                    (OpCode::ExtCall, 0), // breakpoint here, then step into
                    (OpCode::Ret, 0),
                ],
            ),
            HandlerSpec::new(
                "inner",
                vec![(OpCode::PushInt8, 1), (OpCode::Ret, 0)],
            ),
        ],
    );
    let mut player = player_with_scripts(vec![(1, script)]);
    let harness = install_debugger(&player, vec![Step::Into, Step::Reset]);

    player.debug.add_breakpoint(Breakpoint::at(1, 1));
    player
        .call_handler_ref(None, &(member_ref(1, 1), "outer".to_string()), vec![])
        .unwrap();

    let pauses = harness.pauses.lock().unwrap();
    assert!(pauses.len() >= 2);
    assert_eq!(pauses[1].handler_name, "inner");
    assert_eq!(pauses[1].call_stack.len(), 2, "outer then inner on the stack");
    // the reset released the second pause and cleared stepping
    assert!(!player.debug.is_paused());
}

#[test]
fn reset_while_paused_returns_to_running() {
    let mut player = player_with_scripts(vec![(1, loop_script())]);
    let harness = install_debugger(&player, vec![Step::Reset]);

    player.debug.add_breakpoint(Breakpoint::at(1, 0));
    player
        .call_handler_ref(None, &(member_ref(1, 1), "spin".to_string()), vec![])
        .unwrap();

    assert_eq!(harness.pauses.lock().unwrap().len(), 1);
    assert!(!player.debug.is_paused());
}

#[test]
fn watches_evaluate_at_pause_time() {
    let mut player = player_with_scripts(vec![(1, loop_script())]);
    let harness = install_debugger(&player, vec![Step::Continue]);

    player.debug.add_watch("i * 2");
    player.debug.add_watch("no_such_thing");
    let mut bp = Breakpoint::at(1, 6);
    bp.condition = Some("i = 3".to_string());
    player.debug.add_breakpoint(bp);

    player
        .call_handler_ref(None, &(member_ref(1, 1), "spin".to_string()), vec![])
        .unwrap();

    let pauses = harness.pauses.lock().unwrap();
    assert_eq!(pauses.len(), 1);
    let watches = &pauses[0].watches;
    assert_eq!(watches[0].value, "6");
    assert!(watches[0].error.is_none());
    assert!(watches[1].error.is_some(), "bad watches carry their error");
}
