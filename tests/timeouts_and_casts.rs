mod common;

use common::{HandlerSpec, make_script, player_with_scripts};
use shockplay::lingo::datum::{Datum, member_ref};
use shockplay::lingo::opcode::OpCode;
use shockplay::movie::chunks::cast_member::ScriptKind;
use shockplay::player::cast_member::{CastMemberType, TextData};
use shockplay::player::methods;
use shockplay::player::script::{ScriptInstance, ScriptInstanceRef, instance_get_prop};
use shockplay::player::timeout::process_timeouts;

/// A parent script whose `pulse` handler increments its `count` property.
fn counter_script() -> std::rc::Rc<shockplay::player::script::Script> {
    make_script(
        1,
        1,
        "Counter",
        ScriptKind::Parent,
        vec!["count"],
        vec![],
        vec!["count"],
        vec![HandlerSpec::new(
            "pulse",
            vec![
                (OpCode::GetProp, 0),
                (OpCode::PushInt8, 1),
                (OpCode::Add, 0),
                (OpCode::SetProp, 0),
                (OpCode::Ret, 0),
            ],
        )
        .with_args(vec!["t"])],
    )
}

fn counter_instance() -> ScriptInstanceRef {
    let instance = ScriptInstanceRef::new(ScriptInstance {
        instance_id: 1,
        script: member_ref(1, 1),
        ancestor: None,
        properties: Default::default(),
    });
    instance
        .borrow_mut()
        .properties
        .insert("count".to_string(), Datum::Int(0));
    instance
}

#[test]
fn timeouts_fire_on_their_period_boundaries() {
    let mut player = player_with_scripts(vec![(1, counter_script())]);
    let instance = counter_instance();
    player.timeout_manager.create(
        "heartbeat",
        50,
        "pulse",
        Some(Datum::Instance(instance.clone())),
        1000,
    );

    process_timeouts(&mut player, 1000);
    process_timeouts(&mut player, 1049);
    process_timeouts(&mut player, 1050);
    process_timeouts(&mut player, 1100);

    let count = instance_get_prop(&instance, "count").unwrap();
    assert!(matches!(count, Datum::Int(2)), "fires at 1050 and 1100 only");
}

#[test]
fn forgotten_timeouts_stop_firing() {
    let mut player = player_with_scripts(vec![(1, counter_script())]);
    let instance = counter_instance();
    player.timeout_manager.create(
        "gone",
        10,
        "pulse",
        Some(Datum::Instance(instance.clone())),
        0,
    );
    player.timeout_manager.forget("gone");
    process_timeouts(&mut player, 1000);
    let count = instance_get_prop(&instance, "count").unwrap();
    assert!(matches!(count, Datum::Int(0)));
}

#[test]
fn timeout_datum_new_creates_and_forget_removes() {
    let mut player = player_with_scripts(vec![(1, counter_script())]);
    let created = methods::call_datum_method(
        &mut player,
        &Datum::Timeout("pacer".to_string()),
        "new",
        &[
            Datum::Int(100),
            Datum::Symbol("pulse".to_string()),
            Datum::Void,
        ],
    )
    .unwrap();
    assert!(matches!(created, Datum::Timeout(ref name) if name == "pacer"));
    assert!(player.timeout_manager.get("pacer").is_some());

    methods::call_datum_method(&mut player, &created, "forget", &[]).unwrap();
    assert!(player.timeout_manager.get("pacer").is_none());
}

#[test]
fn member_numbers_pack_library_and_slot() {
    let mut player = player_with_scripts(vec![]);
    let cast = player.movie.cast_manager.get_cast_mut(1).unwrap();
    let created = cast
        .create_member(Some(7), CastMemberType::Field(TextData::new("hi".to_string())))
        .unwrap();
    assert_eq!(created.cast_lib, 1);
    assert_eq!(created.cast_member, 7);

    let number = methods::get_obj_prop(&mut player, &Datum::Member(created), "number")
        .unwrap()
        .int_value()
        .unwrap();
    assert_eq!(number & 0xffff, 7);
    assert_eq!(number >> 16, 1);
}

#[test]
fn invalid_members_answer_with_defaults() {
    let mut player = player_with_scripts(vec![]);
    let missing = Datum::Member(member_ref(1, 999));
    assert_eq!(
        methods::get_obj_prop(&mut player, &missing, "name")
            .unwrap()
            .string_value()
            .unwrap(),
        ""
    );
    assert_eq!(
        methods::get_obj_prop(&mut player, &missing, "number")
            .unwrap()
            .int_value()
            .unwrap(),
        -1
    );
    assert_eq!(
        methods::get_obj_prop(&mut player, &missing, "type")
            .unwrap()
            .symbol_value()
            .unwrap(),
        "empty"
    );
}

#[test]
fn field_text_reads_and_writes_through_members() {
    let mut player = player_with_scripts(vec![]);
    let cast = player.movie.cast_manager.get_cast_mut(1).unwrap();
    let created = cast
        .create_member(
            None,
            CastMemberType::Field(TextData::new("line one\nline two".to_string())),
        )
        .unwrap();

    let member = Datum::Member(created.clone());
    let text = methods::get_obj_prop(&mut player, &member, "text")
        .unwrap()
        .string_value()
        .unwrap();
    assert_eq!(text, "line one\rline two", "text normalizes to \\r endings");

    methods::set_obj_prop(
        &mut player,
        &member,
        "text",
        Datum::Str("fresh".to_string()),
    )
    .unwrap();
    assert_eq!(
        player.movie.cast_manager.field_text(&created).unwrap(),
        "fresh"
    );
}
