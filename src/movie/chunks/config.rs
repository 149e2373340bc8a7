use binary_reader::BinaryReader;

use crate::io::reader::big_endian_reader;

/// Stage configuration (`DRCF`/`VWCF`). Only the fields the player acts on
/// are retained; the rest of the record is carried as opaque bytes.
pub struct ConfigChunk {
    pub len: u16,
    pub file_version: u16,
    pub movie_top: i16,
    pub movie_left: i16,
    pub movie_bottom: i16,
    pub movie_right: i16,
    pub min_member: u16,
    pub max_member: u16,
    pub stage_color: (u8, u8, u8),
    pub bit_depth: u16,
    pub director_version: u16,
    pub frame_rate: u16,
    pub platform: u16,
}

/// Raw versions map onto marketing versions in uneven steps.
pub fn human_version(raw: u16) -> u16 {
    match raw {
        0..=0x403 => 300,
        0x404..=0x45c => 400,
        0x45d..=0x4c6 => 500,
        0x4c7..=0x578 => 600,
        0x579..=0x6a3 => 700,
        0x6a4..=0x73a => 800,
        _ => 850,
    }
}

impl ConfigChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<ConfigChunk, String> {
        reader.set_endian(binary_reader::Endian::Big);

        // version lives at a fixed offset and steers the rest of the layout
        reader.jmp(36);
        let raw_version = reader.read_u16().map_err(|e| e.to_string())?;
        let dir_version = human_version(raw_version);
        reader.jmp(0);

        let len = reader.read_u16().map_err(|e| e.to_string())?;
        let file_version = reader.read_u16().map_err(|e| e.to_string())?;
        let movie_top = reader.read_i16().map_err(|e| e.to_string())?;
        let movie_left = reader.read_i16().map_err(|e| e.to_string())?;
        let movie_bottom = reader.read_i16().map_err(|e| e.to_string())?;
        let movie_right = reader.read_i16().map_err(|e| e.to_string())?;
        let min_member = reader.read_u16().map_err(|e| e.to_string())?;
        let max_member = reader.read_u16().map_err(|e| e.to_string())?;
        let _field9 = reader.read_u8().map_err(|e| e.to_string())?;
        let _field10 = reader.read_u8().map_err(|e| e.to_string())?;

        let mut stage_color_g = 0u8;
        let mut stage_color_b = 0u8;
        let mut legacy_stage_color = 0u16;
        if dir_version < 700 {
            legacy_stage_color = reader.read_u16().map_err(|e| e.to_string())?;
        } else {
            stage_color_g = reader.read_u8().map_err(|e| e.to_string())?;
            stage_color_b = reader.read_u8().map_err(|e| e.to_string())?;
        }
        let _comment_font = reader.read_u16().map_err(|e| e.to_string())?;
        let _comment_size = reader.read_u16().map_err(|e| e.to_string())?;
        let _comment_style = reader.read_u16().map_err(|e| e.to_string())?;
        let mut stage_color_r = 0u8;
        if dir_version < 700 {
            let _legacy = reader.read_u16().map_err(|e| e.to_string())?;
        } else {
            let _is_rgb = reader.read_u8().map_err(|e| e.to_string())?;
            stage_color_r = reader.read_u8().map_err(|e| e.to_string())?;
        }
        let bit_depth = reader.read_u16().map_err(|e| e.to_string())?;

        reader.jmp(54);
        let frame_rate = reader.read_u16().map_err(|e| e.to_string())?;
        let platform = reader.read_u16().map_err(|e| e.to_string())?;

        let stage_color = if dir_version < 700 {
            // palette index; approximate as grayscale until the palette loads
            let v = (legacy_stage_color & 0xff) as u8;
            (v, v, v)
        } else {
            (stage_color_r, stage_color_g, stage_color_b)
        };

        Ok(ConfigChunk {
            len,
            file_version,
            movie_top,
            movie_left,
            movie_bottom,
            movie_right,
            min_member,
            max_member,
            stage_color,
            bit_depth,
            director_version: raw_version,
            frame_rate,
            platform,
        })
    }

    pub fn from_bytes(data: &[u8]) -> Option<ConfigChunk> {
        if data.len() < 58 {
            return None;
        }
        ConfigChunk::from_reader(&mut big_endian_reader(data)).ok()
    }

    pub fn human_version(&self) -> u16 {
        human_version(self.director_version)
    }
}
