use binary_reader::BinaryReader;

use crate::utils::decode_mac_roman;

#[derive(Clone)]
pub struct FrameLabel {
    pub frame_num: i32,
    pub label: String,
}

/// `VWLB`: (frame, offset) pairs followed by the packed label text.
pub struct FrameLabelsChunk {
    pub labels: Vec<FrameLabel>,
}

impl FrameLabelsChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<FrameLabelsChunk, String> {
        reader.set_endian(binary_reader::Endian::Big);

        let label_count = reader.read_u16().map_err(|e| e.to_string())? as usize;
        let mut heads: Vec<(u16, u16)> = Vec::with_capacity(label_count + 1);
        for _ in 0..label_count + 1 {
            let frame_num = reader.read_u16().map_err(|e| e.to_string())?;
            let offset = reader.read_u16().map_err(|e| e.to_string())?;
            heads.push((frame_num, offset));
        }

        let text_len = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let text = reader.read_bytes(text_len).map_err(|e| e.to_string())?;

        let labels = (0..label_count)
            .map(|i| {
                let (frame_num, start) = heads[i];
                let end = heads[i + 1].1 as usize;
                let start = (start as usize).min(text.len());
                let end = end.clamp(start, text.len());
                FrameLabel {
                    frame_num: frame_num as i32,
                    label: decode_mac_roman(&text[start..end]),
                }
            })
            .collect();

        Ok(FrameLabelsChunk { labels })
    }
}
