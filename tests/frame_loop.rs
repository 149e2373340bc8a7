mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{HandlerSpec, make_script};
use shockplay::lingo::opcode::OpCode;
use shockplay::movie::chunks::cast_member::ScriptKind;
use shockplay::movie::chunks::score::ScoreSpan;
use shockplay::player::cast_lib::CastLib;
use shockplay::player::{HandlerInfo, MoviePlayer, TraceListener};

#[derive(Default)]
struct Recorder {
    entries: Rc<RefCell<Vec<String>>>,
}

impl TraceListener for Recorder {
    fn on_handler_enter(&mut self, info: &HandlerInfo) {
        self.entries
            .borrow_mut()
            .push(format!("{}.{}", info.script_name, info.handler_name));
    }
}

fn span(start: u32, end: u32, channel: i32, member: u16) -> ScoreSpan {
    ScoreSpan {
        start_frame: start,
        end_frame: end,
        channel,
        cast_lib: 1,
        cast_member: member,
    }
}

fn build_player() -> (MoviePlayer, Rc<RefCell<Vec<String>>>) {
    // channel 2 is alive only on frame 3; its behavior redirects exitFrame
    // to frame 1. channel 3 is alive only on frame 1.
    let leaving_behavior = make_script(
        10,
        10,
        "Leaving",
        ScriptKind::Score,
        vec!["go"],
        vec![],
        vec![],
        vec![
            HandlerSpec::new(
                "exitFrame",
                vec![
                    (OpCode::PushInt8, 1),
                    (OpCode::PushArgList, 1),
                    (OpCode::ExtCall, 0),
                    (OpCode::Ret, 0),
                ],
            ),
            HandlerSpec::new("endSprite", vec![(OpCode::Ret, 0)]),
        ],
    );
    let entering_behavior = make_script(
        11,
        11,
        "Entering",
        ScriptKind::Score,
        vec![],
        vec![],
        vec![],
        vec![HandlerSpec::new("beginSprite", vec![(OpCode::Ret, 0)])],
    );

    let mut player = MoviePlayer::new();
    let mut cast = CastLib::new(1, "Internal".to_string(), String::new());
    cast.insert_script(10, leaving_behavior);
    cast.insert_script(11, entering_behavior);
    player.movie.cast_manager.casts.push(cast);

    player.movie.score.set_channel_count(4);
    player.movie.score.frame_count = 5;
    player.movie.score.spans = vec![span(3, 3, 2, 10), span(1, 1, 3, 11)];

    let entries = Rc::new(RefCell::new(vec![]));
    player.trace = Box::new(Recorder {
        entries: entries.clone(),
    });
    (player, entries)
}

#[test]
fn go_during_exit_frame_lands_before_begin_sprite() {
    let (mut player, entries) = build_player();
    player.movie.current_frame = 3;
    player.play(0);

    entries.borrow_mut().clear();
    player.advance_frame();

    assert_eq!(player.movie.current_frame, 1);
    let log = entries.borrow().clone();
    let exit_pos = log.iter().position(|e| e == "Leaving.exitFrame").unwrap();
    let end_pos = log.iter().position(|e| e == "Leaving.endSprite").unwrap();
    let begin_pos = log.iter().position(|e| e == "Entering.beginSprite").unwrap();
    assert!(exit_pos < end_pos, "exitFrame must precede endSprite: {:?}", log);
    assert!(end_pos < begin_pos, "endSprite must precede beginSprite: {:?}", log);
}

#[test]
fn frame_loop_wraps_modularly() {
    let mut player = MoviePlayer::new();
    player.movie.cast_manager.casts.push(CastLib::new(
        1,
        "Internal".to_string(),
        String::new(),
    ));
    player.movie.score.set_channel_count(1);
    player.movie.score.frame_count = 5;
    player.play(0);

    let start = player.movie.current_frame;
    for _ in 0..5 {
        player.advance_frame();
    }
    // one full cycle through the five frames lands back where it started
    assert_eq!(player.movie.current_frame, start);
}

#[test]
fn tick_fires_the_prescribed_event_ladder() {
    // one behavior alive on frame 1 with every lifecycle handler
    let behavior = make_script(
        10,
        10,
        "B",
        ScriptKind::Score,
        vec![],
        vec![],
        vec![],
        vec![
            HandlerSpec::new("stepFrame", vec![(OpCode::Ret, 0)]),
            HandlerSpec::new("prepareFrame", vec![(OpCode::Ret, 0)]),
            HandlerSpec::new("enterFrame", vec![(OpCode::Ret, 0)]),
        ],
    );
    let mut player = MoviePlayer::new();
    let mut cast = CastLib::new(1, "Internal".to_string(), String::new());
    cast.insert_script(10, behavior);
    player.movie.cast_manager.casts.push(cast);
    player.movie.score.set_channel_count(2);
    player.movie.score.frame_count = 3;
    player.movie.score.spans = vec![span(1, 3, 1, 10)];

    let entries = Rc::new(RefCell::new(vec![]));
    player.trace = Box::new(Recorder {
        entries: entries.clone(),
    });

    player.play(0);
    entries.borrow_mut().clear();
    player.tick(100);

    let log = entries.borrow().clone();
    assert_eq!(
        log,
        vec!["B.stepFrame", "B.prepareFrame", "B.enterFrame"],
        "tick order must be stepFrame, prepareFrame, enterFrame"
    );
}

#[test]
fn unknown_labels_are_a_no_op() {
    let (mut player, _) = build_player();
    player.play(0);
    let before = player.movie.current_frame;
    player.go_to_label("no-such-label");
    player.advance_frame();
    assert_eq!(player.movie.current_frame, before + 1);
}
