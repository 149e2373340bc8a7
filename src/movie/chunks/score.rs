use binary_reader::{BinaryReader, Endian};
use itertools::Itertools;
use log::debug;

/// One channel's cell in one frame of the score grid.
#[derive(Clone, Default)]
pub struct ChannelRecord {
    pub flags: u16,
    pub cast_lib: u16,
    pub cast_member: u16,
    pub pos_y: i16,
    pub pos_x: i16,
    pub height: i16,
    pub width: i16,
}

impl ChannelRecord {
    fn read(reader: &mut BinaryReader) -> Option<ChannelRecord> {
        Some(ChannelRecord {
            flags: reader.read_u16().ok()?,
            cast_lib: {
                let _unk0 = reader.read_u16().ok()?;
                reader.read_u16().ok()?
            },
            cast_member: reader.read_u16().ok()?,
            pos_y: {
                let _unk1 = reader.read_u16().ok()?;
                reader.read_i16().ok()?
            },
            pos_x: reader.read_i16().ok()?,
            height: reader.read_i16().ok()?,
            width: reader.read_i16().ok()?,
        })
    }

    pub fn has_member(&self) -> bool {
        self.cast_member != 0
    }
}

/// A sprite (or frame-script) span over a frame range. Spans come in
/// primary/secondary/tertiary triples; the secondary names the attached
/// script member.
#[derive(Clone)]
pub struct ScoreSpan {
    pub start_frame: u32,
    pub end_frame: u32,
    pub channel: i32,
    pub cast_lib: u16,
    pub cast_member: u16,
}

pub struct ScoreHeader {
    pub frame_count: u32,
    pub sprite_record_size: u16,
    pub num_channels: u16,
}

/// `VWSC`: the score grid plus the span table.
pub struct ScoreChunk {
    pub header: ScoreHeader,
    pub frames: Vec<Vec<ChannelRecord>>,
    pub spans: Vec<ScoreSpan>,
}

impl ScoreChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<ScoreChunk, String> {
        reader.set_endian(Endian::Big);

        let _total_length = reader.read_u32().map_err(|e| e.to_string())?;
        let _unk1 = reader.read_u32().map_err(|e| e.to_string())?;
        let _unk2 = reader.read_u32().map_err(|e| e.to_string())?;
        let entry_count = reader.read_u32().map_err(|e| e.to_string())?;
        let _unk3 = reader.read_u32().map_err(|e| e.to_string())?;
        let _entry_size_sum = reader.read_u32().map_err(|e| e.to_string())?;

        let offsets: Vec<usize> = (0..entry_count + 1)
            .map(|_| reader.read_u32().map(|x| x as usize))
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?;

        let mut entries = (0..entry_count as usize)
            .map(|index| {
                let length = offsets[index + 1].saturating_sub(offsets[index]);
                reader.read_bytes(length).map(|b| b.to_vec())
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        if entries.is_empty() {
            return Err("score chunk has no entries".to_string());
        }

        let mut frame_reader = BinaryReader::from_vec(&entries[0]);
        frame_reader.set_endian(Endian::Big);
        let (header, frames) = Self::read_frame_grid(&mut frame_reader)?;

        // entries beyond the first three hold span triples
        let span_entries = if entries.len() > 3 {
            entries.split_off(3)
        } else {
            vec![]
        };

        let mut primaries: Vec<(u32, u32, i32)> = vec![];
        let mut secondaries: Vec<(u16, u16)> = vec![];
        for (i, entry) in span_entries.iter().enumerate() {
            if entry.is_empty() {
                continue;
            }
            let mut span_reader = BinaryReader::from_u8(entry);
            span_reader.set_endian(Endian::Big);
            match i % 3 {
                0 => {
                    let start_frame = span_reader.read_u32().map_err(|e| e.to_string())?;
                    let end_frame = span_reader.read_u32().map_err(|e| e.to_string())?;
                    let _unk0 = span_reader.read_u32().map_err(|e| e.to_string())?;
                    let _unk1 = span_reader.read_u32().map_err(|e| e.to_string())?;
                    let channel = span_reader.read_u32().map_err(|e| e.to_string())? as i32;
                    primaries.push((start_frame, end_frame, channel));
                }
                1 => {
                    let cast_lib = span_reader.read_u16().map_err(|e| e.to_string())?;
                    let cast_member = span_reader.read_u16().map_err(|e| e.to_string())?;
                    secondaries.push((cast_lib, cast_member));
                }
                _ => {}
            }
        }

        let spans = primaries
            .iter()
            .zip(secondaries.iter())
            .map(|(&(start_frame, end_frame, channel), &(cast_lib, cast_member))| ScoreSpan {
                start_frame,
                end_frame,
                channel,
                cast_lib,
                cast_member,
            })
            .collect_vec();

        Ok(ScoreChunk {
            header,
            frames,
            spans,
        })
    }

    /// The grid is delta-compressed: each frame patches byte ranges of the
    /// previous frame's channel block.
    fn read_frame_grid(
        reader: &mut BinaryReader,
    ) -> Result<(ScoreHeader, Vec<Vec<ChannelRecord>>), String> {
        let _actual_length = reader.read_u32().map_err(|e| e.to_string())?;
        let _unk1 = reader.read_u32().map_err(|e| e.to_string())?;
        let frame_count = reader.read_u32().map_err(|e| e.to_string())?;
        let frames_version = reader.read_u16().map_err(|e| e.to_string())?;
        let sprite_record_size = reader.read_u16().map_err(|e| e.to_string())?;
        let num_channels = reader.read_u16().map_err(|e| e.to_string())?;
        let _num_channels_displayed = reader.read_u16().map_err(|e| e.to_string())?;

        debug!(
            "score grid: {} frames, {} channels, record size {} (version {})",
            frame_count, num_channels, sprite_record_size, frames_version
        );

        let block_size = num_channels as usize * sprite_record_size as usize;
        let mut channel_block = vec![0u8; block_size];
        let mut frames: Vec<Vec<ChannelRecord>> = Vec::with_capacity(frame_count as usize);

        for _ in 0..frame_count {
            if reader.pos >= reader.length {
                break;
            }
            let length = reader.read_u16().map_err(|e| e.to_string())?;
            if length == 0 {
                break;
            }
            let frame_length = (length - 2) as usize;
            if frame_length > 0 {
                let chunk_data = reader.read_bytes(frame_length).map_err(|e| e.to_string())?;
                let mut delta_reader = BinaryReader::from_u8(chunk_data);
                delta_reader.set_endian(Endian::Big);
                while delta_reader.pos < delta_reader.length {
                    let patch_size = delta_reader.read_u16().map_err(|e| e.to_string())? as usize;
                    let patch_offset = delta_reader.read_u16().map_err(|e| e.to_string())? as usize;
                    let patch = delta_reader
                        .read_bytes(patch_size)
                        .map_err(|e| e.to_string())?;
                    if patch_offset + patch_size <= channel_block.len() {
                        channel_block[patch_offset..patch_offset + patch_size]
                            .copy_from_slice(patch);
                    }
                }
            }

            let mut block_reader = BinaryReader::from_vec(&channel_block);
            block_reader.set_endian(Endian::Big);
            let mut records = Vec::with_capacity(num_channels as usize);
            for channel in 0..num_channels {
                let pos = channel as usize * sprite_record_size as usize;
                block_reader.jmp(pos);
                records.push(ChannelRecord::read(&mut block_reader).unwrap_or_default());
            }
            frames.push(records);
        }

        Ok((
            ScoreHeader {
                frame_count,
                sprite_record_size,
                num_channels,
            },
            frames,
        ))
    }
}
