use binary_reader::BinaryReader;

/// `CAS*`: the ordered table mapping member slots of one cast library to
/// `CASt` section ids. Slot `i` holds member `min_member + i`; zero means
/// the slot is empty.
pub struct CastMapChunk {
    pub member_section_ids: Vec<u32>,
}

impl CastMapChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<CastMapChunk, String> {
        reader.set_endian(binary_reader::Endian::Big);
        let count = reader.length / 4;
        let member_section_ids = (0..count)
            .map_while(|_| reader.read_u32().ok())
            .collect();
        Ok(CastMapChunk { member_section_ids })
    }
}
