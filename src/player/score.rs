use std::collections::BTreeSet;

use itertools::Itertools;

use crate::lingo::datum::{MemberRef, member_ref};
use crate::movie::MovieFile;
use crate::movie::chunks::frame_labels::FrameLabel;
use crate::movie::chunks::score::{ChannelRecord, ScoreSpan};

use super::script::ScriptInstanceRef;
use super::sprite::Sprite;

pub struct SpriteChannel {
    pub number: usize,
    pub sprite: Sprite,
}

impl SpriteChannel {
    pub fn new(number: usize) -> SpriteChannel {
        SpriteChannel {
            number,
            sprite: Sprite::new(number),
        }
    }
}

/// The runtime score: channels, the static grid/span data from the file,
/// and the per-tick frame state the scheduler maintains.
pub struct Score {
    pub channels: Vec<SpriteChannel>,
    pub spans: Vec<ScoreSpan>,
    pub frames: Vec<Vec<ChannelRecord>>,
    pub frame_labels: Vec<FrameLabel>,
    pub frame_count: u32,
    /// channels with live sprite instances this frame
    pub active_channels: BTreeSet<i16>,
    /// channels that began this frame and still await beginSprite
    pub entered_channels: BTreeSet<i16>,
    pub in_frame_script: bool,
    pub frame_script_instance: Option<ScriptInstanceRef>,
}

impl Score {
    pub fn empty() -> Score {
        Score {
            channels: vec![],
            spans: vec![],
            frames: vec![],
            frame_labels: vec![],
            frame_count: 1,
            active_channels: BTreeSet::new(),
            entered_channels: BTreeSet::new(),
            in_frame_script: false,
            frame_script_instance: None,
        }
    }

    pub fn load_from_file(&mut self, file: &MovieFile) {
        if let Some(score) = &file.score {
            self.set_channel_count(score.header.num_channels as usize);
            self.spans = score.spans.clone();
            self.frames = score.frames.clone();
            self.frame_count = score.header.frame_count.max(1);
        }
        if let Some(labels) = &file.frame_labels {
            self.frame_labels = labels.labels.clone();
        }
    }

    pub fn set_channel_count(&mut self, new_count: usize) {
        while self.channels.len() < new_count {
            self.channels.push(SpriteChannel::new(self.channels.len() + 1));
        }
        self.channels.truncate(new_count);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn get_sprite(&self, number: i16) -> Option<&Sprite> {
        if number <= 0 || number as usize > self.channels.len() {
            return None;
        }
        self.channels.get(number as usize - 1).map(|c| &c.sprite)
    }

    pub fn get_sprite_mut(&mut self, number: i16) -> Option<&mut Sprite> {
        if number <= 0 || number as usize > self.channels.len() {
            return None;
        }
        self.channels
            .get_mut(number as usize - 1)
            .map(|c| &mut c.sprite)
    }

    /// Ensures a channel exists for dynamically puppeted sprite numbers.
    pub fn ensure_channel(&mut self, number: i16) -> Option<&mut Sprite> {
        if number <= 0 {
            return None;
        }
        if number as usize > self.channels.len() {
            self.set_channel_count(number as usize);
        }
        self.get_sprite_mut(number)
    }

    fn frame_record(&self, frame: u32, channel: usize) -> Option<&ChannelRecord> {
        self.frames
            .get(frame.saturating_sub(1) as usize)
            .and_then(|records| records.get(channel))
    }

    /// Channels with sprite content in the given frame: a member in the
    /// score grid, a span covering the frame, or a live puppet.
    pub fn channels_for_frame(&self, frame: u32) -> BTreeSet<i16> {
        let mut result = BTreeSet::new();
        for channel in &self.channels {
            let index = channel.number - 1;
            let in_grid = self
                .frame_record(frame, index)
                .map(|record| record.has_member())
                .unwrap_or(false);
            if in_grid || channel.sprite.puppet {
                result.insert(channel.number as i16);
                continue;
            }
            if self
                .spans
                .iter()
                .any(|span| span.channel == channel.number as i32 && span_covers(span, frame))
            {
                result.insert(channel.number as i16);
            }
        }
        result
    }

    /// Behavior script members attached to a channel in a frame, score
    /// order.
    pub fn behaviors_for(&self, frame: u32, channel: i16) -> Vec<MemberRef> {
        self.spans
            .iter()
            .filter(|span| span.channel == channel as i32 && span_covers(span, frame))
            .filter(|span| span.cast_member != 0)
            .map(|span| member_ref(span.cast_lib.max(1) as i32, span.cast_member as i32))
            .collect_vec()
    }

    /// The frame script row is the span table's channel-zero lane.
    pub fn frame_script_for(&self, frame: u32) -> Option<MemberRef> {
        self.spans
            .iter()
            .find(|span| span.channel <= 0 && span_covers(span, frame) && span.cast_member != 0)
            .map(|span| member_ref(span.cast_lib.max(1) as i32, span.cast_member as i32))
    }

    /// Applies the score row to a channel's sprite unless a puppet holds
    /// it.
    pub fn apply_frame_to_sprites(&mut self, frame: u32) {
        for index in 0..self.channels.len() {
            let record = match self.frame_record(frame, index) {
                Some(record) => record.clone(),
                None => continue,
            };
            let sprite = &mut self.channels[index].sprite;
            if sprite.puppet {
                continue;
            }
            if record.has_member() {
                sprite.member = Some(member_ref(
                    record.cast_lib.max(1) as i32,
                    record.cast_member as i32,
                ));
                sprite.loc_h = record.pos_x as i32;
                sprite.loc_v = record.pos_y as i32;
                sprite.width = record.width as i32;
                sprite.height = record.height as i32;
            } else {
                sprite.member = None;
            }
            sprite.publish_snapshot();
        }
    }

    pub fn label_to_frame(&self, name: &str) -> Option<u32> {
        self.frame_labels
            .iter()
            .find(|label| label.label.eq_ignore_ascii_case(name))
            .map(|label| label.frame_num.max(1) as u32)
    }

    /// The label at or before the given frame, the way `the frameLabel`
    /// reads it.
    pub fn label_at_or_before(&self, frame: u32) -> Option<&FrameLabel> {
        self.frame_labels
            .iter()
            .filter(|label| label.frame_num <= frame as i32)
            .max_by_key(|label| label.frame_num)
    }

    pub fn active_script_instances(&self) -> Vec<ScriptInstanceRef> {
        let mut result = vec![];
        for channel in &self.channels {
            result.extend(channel.sprite.script_instance_list.iter().cloned());
        }
        result
    }

    pub fn get_sorted_channels(&self) -> Vec<&SpriteChannel> {
        self.channels
            .iter()
            .filter(|c| {
                c.sprite.visible
                    && c.sprite
                        .member
                        .as_ref()
                        .map(|m| m.is_valid())
                        .unwrap_or(false)
            })
            .sorted_by(|a, b| {
                a.sprite
                    .loc_z
                    .cmp(&b.sprite.loc_z)
                    .then(a.number.cmp(&b.number))
            })
            .collect_vec()
    }

    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.sprite.reset();
        }
        self.active_channels.clear();
        self.entered_channels.clear();
        self.in_frame_script = false;
        self.frame_script_instance = None;
    }
}

fn span_covers(span: &ScoreSpan, frame: u32) -> bool {
    frame >= span.start_frame && frame <= span.end_frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32, end: u32, channel: i32, member: u16) -> ScoreSpan {
        ScoreSpan {
            start_frame: start,
            end_frame: end,
            channel,
            cast_lib: 1,
            cast_member: member,
        }
    }

    #[test]
    fn behaviors_respect_span_ranges() {
        let mut score = Score::empty();
        score.set_channel_count(4);
        score.spans = vec![span(1, 3, 2, 10), span(2, 5, 2, 11), span(1, 9, 3, 12)];
        let behaviors = score.behaviors_for(2, 2);
        assert_eq!(behaviors.len(), 2);
        assert_eq!(behaviors[0].cast_member, 10);
        assert_eq!(behaviors[1].cast_member, 11);
        assert!(score.behaviors_for(4, 2).len() == 1);
    }

    #[test]
    fn frame_script_reads_channel_zero_lane() {
        let mut score = Score::empty();
        score.spans = vec![span(1, 2, 0, 20), span(3, 4, 0, 21)];
        assert_eq!(score.frame_script_for(1).unwrap().cast_member, 20);
        assert_eq!(score.frame_script_for(3).unwrap().cast_member, 21);
        assert!(score.frame_script_for(5).is_none());
    }

    #[test]
    fn labels_resolve_case_insensitively() {
        let mut score = Score::empty();
        score.frame_labels = vec![FrameLabel {
            frame_num: 4,
            label: "Intro".to_string(),
        }];
        assert_eq!(score.label_to_frame("intro"), Some(4));
        assert_eq!(score.label_to_frame("INTRO"), Some(4));
        assert_eq!(score.label_to_frame("outro"), None);
    }
}
