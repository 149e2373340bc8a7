use binary_reader::{BinaryReader, Endian};

use super::list::OffsetTableList;

pub struct CastListEntry {
    pub name: String,
    pub file_path: String,
    pub preload_settings: u16,
    pub min_member: u16,
    pub max_member: u16,
    pub id: u32,
}

/// `MCsL`: one entry per cast library of the movie.
pub struct CastListChunk {
    pub entries: Vec<CastListEntry>,
}

impl CastListChunk {
    pub fn from_reader(
        reader: &mut BinaryReader,
        item_endian: Endian,
    ) -> Result<CastListChunk, String> {
        reader.set_endian(Endian::Big);

        let data_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let _unk0 = reader.read_u16().map_err(|e| e.to_string())?;
        let cast_count = reader.read_u16().map_err(|e| e.to_string())?;
        let items_per_cast = reader.read_u16().map_err(|e| e.to_string())?;
        let _unk1 = reader.read_u16().map_err(|e| e.to_string())?;

        let items = OffsetTableList::read(reader, data_offset)?;

        let entries = (0..cast_count)
            .map(|i| {
                let base = (i * items_per_cast) as usize;
                let mut entry = CastListEntry {
                    name: String::new(),
                    file_path: String::new(),
                    preload_settings: 0,
                    min_member: 0,
                    max_member: 0,
                    id: 0,
                };
                if items_per_cast >= 1 {
                    entry.name = items.pascal_string(base + 1);
                }
                if items_per_cast >= 2 {
                    entry.file_path = items.pascal_string(base + 2);
                }
                if items_per_cast >= 3 {
                    entry.preload_settings = items.u16(base + 3, item_endian);
                }
                if items_per_cast >= 4 {
                    let buf = items.item(base + 4);
                    if buf.len() >= 8 {
                        entry.min_member = u16::from_be_bytes([buf[0], buf[1]]);
                        entry.max_member = u16::from_be_bytes([buf[2], buf[3]]);
                        entry.id = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
                    }
                }
                entry
            })
            .collect();

        Ok(CastListChunk { entries })
    }
}
