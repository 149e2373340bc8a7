mod common;

use common::{HandlerSpec, f32_bits, make_script, player_with_scripts};
use shockplay::lingo::datum::{Datum, member_ref, new_list};
use shockplay::lingo::opcode::OpCode;
use shockplay::movie::chunks::cast_member::ScriptKind;
use shockplay::player::methods;
use shockplay::player::script::{ScriptInstance, ScriptInstanceRef, instance_set_prop};

#[test]
fn arithmetic_promotes_int_to_float() {
    let script = make_script(
        1,
        1,
        "math",
        ScriptKind::Movie,
        vec![],
        vec![],
        vec![],
        vec![HandlerSpec::new(
            "calc",
            vec![
                (OpCode::PushInt8, 3),
                (OpCode::PushFloat32, f32_bits(0.5)),
                (OpCode::Add, 0),
                (OpCode::Ret, 0),
            ],
        )],
    );
    let mut player = player_with_scripts(vec![(1, script)]);

    let result = player
        .call_handler_ref(None, &(member_ref(1, 1), "calc".to_string()), vec![])
        .unwrap();
    assert!(matches!(result.return_value, Datum::Float(f) if f == 3.5));
}

#[test]
fn item_chunks_respect_the_delimiter() {
    let mut player = player_with_scripts(vec![]);
    player.movie.item_delimiter = ";".to_string();

    let subject = Datum::Str("a;b;c".to_string());
    let count = methods::string::call_method(
        &mut player,
        &subject,
        "count",
        &[Datum::Symbol("items".to_string())],
    )
    .unwrap();
    assert!(matches!(count, Datum::Int(3)));

    let second = methods::string::call_method(
        &mut player,
        &subject,
        "getProp",
        &[Datum::Symbol("item".to_string()), Datum::Int(2)],
    )
    .unwrap();
    assert_eq!(second.string_value().unwrap(), "b");
}

#[test]
fn missing_methods_walk_the_ancestor_chain() {
    let script_a = make_script(
        1,
        1,
        "Child",
        ScriptKind::Parent,
        vec![],
        vec![],
        vec![],
        vec![],
    );
    let script_b = make_script(
        2,
        2,
        "Parent",
        ScriptKind::Parent,
        vec![],
        vec![],
        vec![],
        vec![HandlerSpec::new(
            "hello",
            vec![(OpCode::PushInt8, 7), (OpCode::Ret, 0)],
        )],
    );
    let mut player = player_with_scripts(vec![(1, script_a), (2, script_b)]);

    let child = ScriptInstanceRef::new(ScriptInstance {
        instance_id: 1,
        script: member_ref(1, 1),
        ancestor: None,
        properties: Default::default(),
    });
    let parent = ScriptInstanceRef::new(ScriptInstance {
        instance_id: 2,
        script: member_ref(1, 2),
        ancestor: None,
        properties: Default::default(),
    });
    instance_set_prop(&child, "ancestor", Datum::Instance(parent), false).unwrap();

    let result =
        methods::script::call_instance_method(&mut player, &child, "hello", &[], false).unwrap();
    assert!(matches!(result, Datum::Int(7)));
}

#[test]
fn builtins_win_over_user_handlers() {
    // a movie script also defines "list"; the builtin must still answer
    let shadowing = make_script(
        1,
        1,
        "Shadow",
        ScriptKind::Movie,
        vec![],
        vec![],
        vec![],
        vec![HandlerSpec::new(
            "list",
            vec![(OpCode::PushInt8, 99), (OpCode::Ret, 0)],
        )],
    );
    let mut player = player_with_scripts(vec![(1, shadowing)]);

    let result = player
        .call_global_handler("list", &[Datum::Int(1), Datum::Int(2)])
        .unwrap();
    match result {
        Datum::List(items) => assert_eq!(items.borrow().len(), 2),
        other => panic!("expected a list, got {}", other.type_str()),
    }
}

#[test]
fn user_handlers_resolve_when_no_builtin_exists() {
    let script = make_script(
        1,
        1,
        "Util",
        ScriptKind::Movie,
        vec![],
        vec![],
        vec![],
        vec![HandlerSpec::new(
            "triple",
            vec![
                (OpCode::GetParam, 0),
                (OpCode::PushInt8, 3),
                (OpCode::Mul, 0),
                (OpCode::Ret, 0),
            ],
        )
        .with_args(vec!["n"])],
    );
    let mut player = player_with_scripts(vec![(1, script)]);

    let result = player.call_global_handler("triple", &[Datum::Int(5)]).unwrap();
    assert!(matches!(result, Datum::Int(15)));
}

#[test]
fn repeat_loops_run_to_completion() {
    // i = 1; repeat while i <= 10: i = i + 1; return i
    let script = make_script(
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
                    (OpCode::JmpIfZ, 6), // to index 11
                    (OpCode::GetLocal, 0),
                    (OpCode::PushInt8, 1),
                    (OpCode::Add, 0),
                    (OpCode::SetLocal, 0),
                    (OpCode::EndRepeat, 8), // back to index 2
                    (OpCode::GetLocal, 0),
                    (OpCode::Ret, 0),
                ],
            )
            .with_locals(vec!["i"]),
        ],
    );
    let mut player = player_with_scripts(vec![(1, script)]);

    let result = player
        .call_handler_ref(None, &(member_ref(1, 1), "spin".to_string()), vec![])
        .unwrap();
    assert!(matches!(result.return_value, Datum::Int(11)));
}

#[test]
fn list_aliasing_is_visible_through_globals() {
    let mut player = player_with_scripts(vec![]);
    let a = new_list(vec![Datum::Int(1)]);
    player.globals.insert("a".to_string(), a.clone());
    player.globals.insert("b".to_string(), a);

    let b = player.globals.get("b").cloned().unwrap();
    methods::call_datum_method(&mut player, &b, "add", &[Datum::Int(2)]).unwrap();

    let a = player.globals.get("a").cloned().unwrap();
    assert_eq!(a.to_list().unwrap().borrow().len(), 2);
}

#[test]
fn int_string_round_trips() {
    for n in [-12345, -1, 0, 1, 42, i32::MAX] {
        let text = Datum::Int(n).string_value().unwrap();
        assert_eq!(Datum::Str(text).int_value().unwrap(), n);
    }
}
