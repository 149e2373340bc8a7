use binary_reader::{BinaryReader, Endian};

/// `Lctx`/`LctX`: maps script numbers of one cast to `Lscr` sections and
/// names the shared `Lnam` table.
pub struct ScriptContextChunk {
    pub entry_count: u32,
    pub lnam_section_id: u32,
    pub section_map: Vec<ScriptContextMapEntry>,
}

pub struct ScriptContextMapEntry {
    pub section_id: i32,
}

impl ScriptContextChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<ScriptContextChunk, String> {
        reader.set_endian(Endian::Big);

        let _unknown0 = reader.read_u32().map_err(|e| e.to_string())?;
        let _unknown1 = reader.read_u32().map_err(|e| e.to_string())?;
        let entry_count = reader.read_u32().map_err(|e| e.to_string())?;
        let _entry_count2 = reader.read_u32().map_err(|e| e.to_string())?;
        let entries_offset = reader.read_u16().map_err(|e| e.to_string())? as usize;
        let _unknown2 = reader.read_u16().map_err(|e| e.to_string())?;
        let _unknown3 = reader.read_u32().map_err(|e| e.to_string())?;
        let _unknown4 = reader.read_u32().map_err(|e| e.to_string())?;
        let _unknown5 = reader.read_u32().map_err(|e| e.to_string())?;
        let lnam_section_id = reader.read_u32().map_err(|e| e.to_string())?;
        let _valid_count = reader.read_u16().map_err(|e| e.to_string())?;
        let _flags = reader.read_u16().map_err(|e| e.to_string())?;
        let _free_pointer = reader.read_u16().map_err(|e| e.to_string())?;

        reader.jmp(entries_offset);
        let section_map = (0..entry_count)
            .map_while(|_| {
                let _unknown0 = reader.read_u32().ok()?;
                let section_id = reader.read_i32().ok()?;
                let _unknown1 = reader.read_u16().ok()?;
                let _unknown2 = reader.read_u16().ok()?;
                Some(ScriptContextMapEntry { section_id })
            })
            .collect();

        Ok(ScriptContextChunk {
            entry_count,
            lnam_section_id,
            section_map,
        })
    }
}
