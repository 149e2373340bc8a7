//! Property-id tables used by the `get`/`set` opcode pair, which address
//! well-known properties by number instead of through the names chunk.

pub fn movie_prop_name(prop_id: u16) -> Option<&'static str> {
    Some(match prop_id {
        0x00 => "floatPrecision",
        0x01 => "mouseDownScript",
        0x02 => "mouseUpScript",
        0x03 => "keyDownScript",
        0x04 => "keyUpScript",
        0x05 => "timeoutScript",
        0x06 => "short time",
        0x07 => "abbr time",
        0x08 => "long time",
        0x09 => "short date",
        0x0a => "abbr date",
        0x0b => "long date",
        _ => return None,
    })
}

pub const MAX_MOVIE_PROP_ID: u16 = 0x0b;

pub fn sprite_prop_name(prop_id: u16) -> Option<&'static str> {
    Some(match prop_id {
        0x01 => "type",
        0x02 => "backColor",
        0x03 => "bottom",
        0x04 => "castNum",
        0x05 => "constraint",
        0x06 => "cursor",
        0x07 => "foreColor",
        0x08 => "height",
        0x0a => "ink",
        0x0b => "left",
        0x0c => "lineSize",
        0x0d => "locH",
        0x0e => "locV",
        0x0f => "movieRate",
        0x10 => "movieTime",
        0x12 => "puppet",
        0x13 => "right",
        0x14 => "startTime",
        0x15 => "stopTime",
        0x16 => "stretch",
        0x17 => "top",
        0x18 => "trails",
        0x19 => "visible",
        0x1a => "volume",
        0x1b => "width",
        0x1c => "blend",
        0x1d => "scriptNum",
        0x1e => "moveableSprite",
        0x1f => "editableText",
        0x20 => "scoreColor",
        0x21 => "loc",
        0x22 => "rect",
        0x23 => "memberNum",
        0x24 => "castLibNum",
        0x25 => "member",
        0x26 => "scriptInstanceList",
        0x2a => "name",
        _ => return None,
    })
}

pub fn anim_prop_name(prop_id: u16) -> Option<&'static str> {
    Some(match prop_id {
        0x01 => "beepOn",
        0x02 => "buttonStyle",
        0x03 => "centerStage",
        0x04 => "checkBoxAccess",
        0x05 => "checkboxType",
        0x06 => "colorDepth",
        0x07 => "colorQD",
        0x08 => "exitLock",
        0x09 => "fixStageSize",
        0x0c => "doubleClick",
        0x0d => "key",
        0x0e => "lastClick",
        0x0f => "lastEvent",
        0x10 => "keyCode",
        0x11 => "lastKey",
        0x12 => "lastRoll",
        0x13 => "timeoutLapsed",
        0x15 => "pauseState",
        0x17 => "selEnd",
        0x18 => "selStart",
        0x19 => "soundEnabled",
        0x1a => "soundLevel",
        0x1b => "stageColor",
        0x1e => "timeoutKeyDown",
        0x1f => "timeoutLength",
        0x20 => "timeoutMouse",
        0x21 => "timeoutPlay",
        0x22 => "timer",
        0x25 => "netPresent",
        0x26 => "safePlayer",
        _ => return None,
    })
}

pub fn anim2_prop_name(prop_id: u16) -> Option<&'static str> {
    Some(match prop_id {
        0x01 => "perFrameHook",
        0x02 => "number of castMembers",
        0x03 => "number of menus",
        0x04 => "number of castLibs",
        0x05 => "number of xtras",
        _ => return None,
    })
}
