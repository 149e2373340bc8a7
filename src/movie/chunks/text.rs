use binary_reader::BinaryReader;

use crate::io::reader::ChunkReaderExt;

/// `STXT`: styled text. The style run data is carried raw; the core only
/// needs the plain text and leaves run decoding to the text renderer.
pub struct TextChunk {
    pub text: String,
    pub style_data: Vec<u8>,
}

impl TextChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<TextChunk, String> {
        reader.set_endian(binary_reader::Endian::Big);

        let offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        if offset != 12 {
            return Err("unhandled text chunk offset".to_string());
        }
        let text_length = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let data_length = reader.read_u32().map_err(|e| e.to_string())? as usize;

        Ok(TextChunk {
            text: reader.read_text(text_length).map_err(|e| e.to_string())?,
            style_data: reader
                .read_bytes(data_length)
                .map(|b| b.to_vec())
                .unwrap_or_default(),
        })
    }
}
