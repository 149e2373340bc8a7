//! The renderer driver: turns score rows plus runtime sprite state into
//! an ordered draw list each tick. Consumers only see this list and the
//! per-sprite positional snapshots.

use itertools::Itertools;

use crate::lingo::datum::{ColorRef, Datum, MemberRef};

use super::{MoviePlayer, ScriptError};

#[derive(Clone)]
pub struct RenderSprite {
    pub channel: usize,
    pub member: MemberRef,
    pub loc_h: i32,
    pub loc_v: i32,
    pub loc_z: i32,
    pub width: i32,
    pub height: i32,
    pub ink: i32,
    pub blend: i32,
    pub flip_h: bool,
    pub flip_v: bool,
    pub color: ColorRef,
    pub bg_color: ColorRef,
}

/// Visible, member-bearing sprites ordered by locZ then channel number.
pub fn build_render_list(player: &MoviePlayer) -> Vec<RenderSprite> {
    player
        .movie
        .score
        .get_sorted_channels()
        .iter()
        .map(|channel| {
            let sprite = &channel.sprite;
            RenderSprite {
                channel: channel.number,
                member: sprite.member.clone().unwrap(),
                loc_h: sprite.loc_h,
                loc_v: sprite.loc_v,
                loc_z: sprite.loc_z,
                width: sprite.width,
                height: sprite.height,
                ink: sprite.ink,
                blend: sprite.blend,
                flip_h: sprite.flip_h,
                flip_v: sprite.flip_v,
                color: sprite.color.clone(),
                bg_color: sprite.bg_color.clone(),
            }
        })
        .collect_vec()
}

pub fn get_stage_prop(player: &mut MoviePlayer, prop: &str) -> Result<Datum, ScriptError> {
    match prop {
        "rect" => {
            let (l, t, r, b) = player.movie.rect;
            Ok(Datum::Rect(l, t, r, b))
        }
        "sourceRect" => {
            let (l, t, r, b) = player.movie.rect;
            Ok(Datum::Rect(0, 0, r - l, b - t))
        }
        "title" => Ok(Datum::Str(player.movie.file_name.clone())),
        "bgColor" => {
            let (r, g, b) = player.movie.stage_color;
            Ok(Datum::Color(ColorRef::Rgb(r, g, b)))
        }
        _ => Err(ScriptError::new(format!(
            "Cannot get stage property {}",
            prop
        ))),
    }
}

pub fn set_stage_prop(
    player: &mut MoviePlayer,
    prop: &str,
    value: Datum,
) -> Result<(), ScriptError> {
    match prop {
        "title" => {
            player.movie.file_name = value.string_value()?;
            Ok(())
        }
        "bgColor" => {
            if let Datum::Color(ColorRef::Rgb(r, g, b)) = value {
                player.movie.stage_color = (r, g, b);
            }
            Ok(())
        }
        _ => Err(ScriptError::new(format!(
            "Cannot set stage property {}",
            prop
        ))),
    }
}
