use std::sync::{Arc, Mutex};

use crate::lingo::datum::{ColorRef, MemberRef};

use super::script::ScriptInstanceRef;

/// Positional snapshot published for the renderer thread. The whole block
/// swaps at once so a script-driven move never tears.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct SpriteSnapshot {
    pub loc_h: i32,
    pub loc_v: i32,
    pub loc_z: i32,
    pub width: i32,
    pub height: i32,
}

/// Runtime state of one channel's sprite: the score row's values overlaid
/// with puppet mutations.
pub struct Sprite {
    pub number: usize,
    pub puppet: bool,
    pub visible: bool,
    pub member: Option<MemberRef>,
    pub loc_h: i32,
    pub loc_v: i32,
    pub loc_z: i32,
    pub width: i32,
    pub height: i32,
    pub ink: i32,
    pub blend: i32,
    pub fore_color: i32,
    pub back_color: i32,
    pub color: ColorRef,
    pub bg_color: ColorRef,
    pub flip_h: bool,
    pub flip_v: bool,
    pub rotation: f64,
    pub skew: f64,
    pub stretch: i32,
    pub editable: bool,
    pub cursor: i32,
    pub script_instance_list: Vec<ScriptInstanceRef>,
    pub exited: bool,
    shared: Arc<Mutex<SpriteSnapshot>>,
}

impl Sprite {
    pub fn new(number: usize) -> Sprite {
        Sprite {
            number,
            puppet: false,
            visible: true,
            member: None,
            loc_h: 0,
            loc_v: 0,
            loc_z: number as i32,
            width: 0,
            height: 0,
            ink: 0,
            blend: 100,
            fore_color: 255,
            back_color: 0,
            color: ColorRef::Rgb(0, 0, 0),
            bg_color: ColorRef::Rgb(255, 255, 255),
            flip_h: false,
            flip_v: false,
            rotation: 0.0,
            skew: 0.0,
            stretch: 0,
            editable: false,
            cursor: 0,
            script_instance_list: vec![],
            exited: false,
            shared: Arc::new(Mutex::new(SpriteSnapshot::default())),
        }
    }

    pub fn reset(&mut self) {
        let number = self.number;
        let shared = self.shared.clone();
        *self = Sprite::new(number);
        self.shared = shared;
        self.publish_snapshot();
    }

    pub fn publish_snapshot(&self) {
        let snapshot = SpriteSnapshot {
            loc_h: self.loc_h,
            loc_v: self.loc_v,
            loc_z: self.loc_z,
            width: self.width,
            height: self.height,
        };
        if let Ok(mut shared) = self.shared.lock() {
            *shared = snapshot;
        }
    }

    /// Renderer-side handle; clones cheaply and reads whole snapshots.
    pub fn snapshot_handle(&self) -> Arc<Mutex<SpriteSnapshot>> {
        self.shared.clone()
    }

    pub fn snapshot(&self) -> SpriteSnapshot {
        self.shared.lock().map(|s| *s).unwrap_or_default()
    }

    /// Bounding box used by the `onto`/`into` sprite tests.
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        (
            self.loc_h,
            self.loc_v,
            self.loc_h + self.width,
            self.loc_v + self.height,
        )
    }

    pub fn intersects(&self, other: &Sprite) -> bool {
        let (al, at, ar, ab) = self.bounds();
        let (bl, bt, br, bb) = other.bounds();
        al < br && bl < ar && at < bb && bt < ab
    }

    pub fn within(&self, other: &Sprite) -> bool {
        let (al, at, ar, ab) = self.bounds();
        let (bl, bt, br, bb) = other.bounds();
        al >= bl && at >= bt && ar <= br && ab <= bb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tracks_published_fields() {
        let mut sprite = Sprite::new(1);
        sprite.loc_h = 10;
        sprite.loc_v = 20;
        sprite.publish_snapshot();
        let handle = sprite.snapshot_handle();
        assert_eq!(handle.lock().unwrap().loc_h, 10);
        sprite.loc_h = 30;
        sprite.publish_snapshot();
        assert_eq!(handle.lock().unwrap().loc_h, 30);
    }

    #[test]
    fn bounds_tests_cover_intersection_and_containment() {
        let mut a = Sprite::new(1);
        a.loc_h = 0;
        a.loc_v = 0;
        a.width = 10;
        a.height = 10;
        let mut b = Sprite::new(2);
        b.loc_h = 5;
        b.loc_v = 5;
        b.width = 20;
        b.height = 20;
        assert!(a.intersects(&b));
        assert!(!a.within(&b));
        b.loc_h = -5;
        b.loc_v = -5;
        assert!(a.within(&b));
    }
}
