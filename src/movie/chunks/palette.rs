use binary_reader::BinaryReader;

/// `CLUT`: 256 colors, each component stored as a 16-bit value whose high
/// byte carries the color.
pub struct PaletteChunk {
    pub colors: Vec<(u8, u8, u8)>,
}

impl PaletteChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<PaletteChunk, String> {
        reader.set_endian(binary_reader::Endian::Big);

        let count = (reader.length / 6).min(256);
        let mut colors = Vec::with_capacity(count);
        for _ in 0..count {
            let r = reader.read_u8().unwrap_or(0);
            reader.read_u8().ok();
            let g = reader.read_u8().unwrap_or(0);
            reader.read_u8().ok();
            let b = reader.read_u8().unwrap_or(0);
            reader.read_u8().ok();
            colors.push((r, g, b));
        }

        Ok(PaletteChunk { colors })
    }
}
