use binary_reader::{BinaryReader, Endian};
use num_derive::FromPrimitive;

use super::list::OffsetTableList;

#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum MemberKind {
    Null = 0,
    Bitmap = 1,
    FilmLoop = 2,
    Text = 3,
    Palette = 4,
    Picture = 5,
    Sound = 6,
    Button = 7,
    Shape = 8,
    Movie = 9,
    DigitalVideo = 10,
    Script = 11,
    RichText = 12,
    Ole = 13,
    Transition = 14,
    Xtra = 15,
}

impl MemberKind {
    pub fn from_raw(raw: u32) -> MemberKind {
        num::FromPrimitive::from_u32(raw).unwrap_or(MemberKind::Null)
    }

    pub fn type_symbol(&self) -> &'static str {
        match self {
            MemberKind::Null => "empty",
            MemberKind::Bitmap => "bitmap",
            MemberKind::FilmLoop => "filmLoop",
            MemberKind::Text => "field",
            MemberKind::Palette => "palette",
            MemberKind::Picture => "picture",
            MemberKind::Sound => "sound",
            MemberKind::Button => "button",
            MemberKind::Shape => "shape",
            MemberKind::Movie => "movie",
            MemberKind::DigitalVideo => "digitalVideo",
            MemberKind::Script => "script",
            MemberKind::RichText => "text",
            MemberKind::Ole => "ole",
            MemberKind::Transition => "transition",
            MemberKind::Xtra => "xtra",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, Default)]
pub enum ScriptKind {
    #[default]
    Invalid = 0,
    Score = 1,
    Movie = 3,
    Parent = 7,
}

impl ScriptKind {
    pub fn from_raw(raw: u16) -> ScriptKind {
        num::FromPrimitive::from_u16(raw).unwrap_or(ScriptKind::Invalid)
    }
}

/// Bitmap header packed into the member's specific data.
#[derive(Clone, Debug, Default)]
pub struct BitmapInfo {
    pub stride: u16,
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
    pub reg_y: i16,
    pub reg_x: i16,
    pub bit_depth: u8,
    pub palette_id: i16,
}

impl BitmapInfo {
    pub fn from_bytes(data: &[u8]) -> BitmapInfo {
        if data.len() < 22 {
            return BitmapInfo::default();
        }
        let u16_at = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);
        let i16_at = |i: usize| i16::from_be_bytes([data[i], data[i + 1]]);
        BitmapInfo {
            stride: u16_at(0) & 0x7fff,
            top: i16_at(2),
            left: i16_at(4),
            bottom: i16_at(6),
            right: i16_at(8),
            reg_y: i16_at(12),
            reg_x: i16_at(14),
            bit_depth: if data.len() > 22 { data[22] } else { 1 },
            palette_id: if data.len() >= 26 { i16_at(24) } else { 0 },
        }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left) as i32
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top) as i32
    }
}

pub enum MemberSpecificData {
    Script(ScriptKind),
    Bitmap(BitmapInfo),
    None,
}

/// `CASt`: the per-member header record. Media payloads live in child
/// chunks keyed off this section.
pub struct CastMemberChunk {
    pub kind: MemberKind,
    pub name: String,
    pub script_id: u32,
    pub specific_data: MemberSpecificData,
    pub specific_data_raw: Vec<u8>,
}

impl CastMemberChunk {
    pub fn from_reader(
        reader: &mut BinaryReader,
        dir_version: u16,
    ) -> Result<CastMemberChunk, String> {
        reader.set_endian(Endian::Big);

        let kind: MemberKind;
        let specific_data: Vec<u8>;
        let mut name = String::new();
        let mut script_id = 0u32;

        if dir_version >= 500 {
            kind = MemberKind::from_raw(reader.read_u32().map_err(|e| e.to_string())?);
            let info_len = reader.read_u32().map_err(|e| e.to_string())? as usize;
            let specific_len = reader.read_u32().map_err(|e| e.to_string())? as usize;

            if info_len != 0 {
                let info_bytes = reader.read_bytes(info_len).map_err(|e| e.to_string())?;
                let mut info_reader = BinaryReader::from_u8(info_bytes);
                info_reader.set_endian(Endian::Big);
                if let Ok((info_name, info_script_id)) = Self::read_info(&mut info_reader) {
                    name = info_name;
                    script_id = info_script_id;
                }
            }
            specific_data = reader
                .read_bytes(specific_len)
                .map_err(|e| e.to_string())?
                .to_vec();
        } else {
            let specific_len = reader.read_u16().map_err(|e| e.to_string())? as usize;
            let info_len = reader.read_u32().map_err(|e| e.to_string())? as usize;

            let mut specific_left = specific_len;
            kind = MemberKind::from_raw(reader.read_u8().map_err(|e| e.to_string())? as u32);
            specific_left = specific_left.saturating_sub(1);
            if specific_left != 0 {
                let _flags1 = reader.read_u8().map_err(|e| e.to_string())?;
                specific_left -= 1;
            }
            specific_data = reader
                .read_bytes(specific_left)
                .map_err(|e| e.to_string())?
                .to_vec();

            if info_len != 0 {
                let info_bytes = reader.read_bytes(info_len).map_err(|e| e.to_string())?;
                let mut info_reader = BinaryReader::from_u8(info_bytes);
                info_reader.set_endian(Endian::Big);
                if let Ok((info_name, info_script_id)) = Self::read_info(&mut info_reader) {
                    name = info_name;
                    script_id = info_script_id;
                }
            }
        }

        let specific_data_parsed = match kind {
            MemberKind::Script => {
                let raw = if specific_data.len() >= 2 {
                    u16::from_be_bytes([specific_data[0], specific_data[1]])
                } else {
                    0
                };
                MemberSpecificData::Script(ScriptKind::from_raw(raw))
            }
            MemberKind::Bitmap => {
                MemberSpecificData::Bitmap(BitmapInfo::from_bytes(&specific_data))
            }
            _ => MemberSpecificData::None,
        };

        Ok(CastMemberChunk {
            kind,
            name,
            script_id,
            specific_data: specific_data_parsed,
            specific_data_raw: specific_data,
        })
    }

    fn read_info(reader: &mut BinaryReader) -> Result<(String, u32), String> {
        let data_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let _unk1 = reader.read_u32().map_err(|e| e.to_string())?;
        let _unk2 = reader.read_u32().map_err(|e| e.to_string())?;
        let _flags = reader.read_u32().map_err(|e| e.to_string())?;
        let script_id = reader.read_u32().map_err(|e| e.to_string())?;

        let items = OffsetTableList::read(reader, data_offset)?;
        // item 0 is the script source text, item 1 the member name
        let name = items.pascal_string(1);
        Ok((name, script_id))
    }

    pub fn script_kind(&self) -> Option<ScriptKind> {
        match &self.specific_data {
            MemberSpecificData::Script(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn bitmap_info(&self) -> Option<&BitmapInfo> {
        match &self.specific_data {
            MemberSpecificData::Bitmap(info) => Some(info),
            _ => None,
        }
    }
}
