mod common;

use common::player_with_scripts;
use shockplay::lingo::datum::{Datum, member_ref};
use shockplay::player::methods::member::{set_sprite_prop};
use shockplay::player::stage::build_render_list;

#[test]
fn render_list_orders_by_loc_z_then_channel() {
    let mut player = player_with_scripts(vec![]);
    player.movie.score.set_channel_count(3);

    for (channel, loc_z) in [(1i16, 5), (2i16, 1), (3i16, 5)] {
        set_sprite_prop(&mut player, channel, "puppet", Datum::Int(1)).unwrap();
        set_sprite_prop(
            &mut player,
            channel,
            "member",
            Datum::Member(member_ref(1, channel as i32)),
        )
        .unwrap();
        set_sprite_prop(&mut player, channel, "locZ", Datum::Int(loc_z)).unwrap();
    }

    let list = build_render_list(&player);
    let channels: Vec<usize> = list.iter().map(|sprite| sprite.channel).collect();
    assert_eq!(channels, vec![2, 1, 3]);
}

#[test]
fn hidden_and_empty_sprites_stay_out_of_the_list() {
    let mut player = player_with_scripts(vec![]);
    player.movie.score.set_channel_count(2);

    set_sprite_prop(&mut player, 1, "member", Datum::Member(member_ref(1, 1))).unwrap();
    set_sprite_prop(&mut player, 1, "visible", Datum::Int(0)).unwrap();
    // channel 2 has no member at all

    assert!(build_render_list(&player).is_empty());
}

#[test]
fn snapshots_never_tear_across_moves() {
    let mut player = player_with_scripts(vec![]);
    player.movie.score.set_channel_count(1);
    set_sprite_prop(&mut player, 1, "loc", Datum::Point(10, 20)).unwrap();

    let handle = player
        .movie
        .score
        .get_sprite(1)
        .unwrap()
        .snapshot_handle();
    {
        let snapshot = handle.lock().unwrap();
        assert_eq!((snapshot.loc_h, snapshot.loc_v), (10, 20));
    }

    set_sprite_prop(&mut player, 1, "loc", Datum::Point(30, 40)).unwrap();
    let snapshot = *handle.lock().unwrap();
    assert_eq!((snapshot.loc_h, snapshot.loc_v), (30, 40));
}
