use binary_reader::BinaryReader;

use crate::io::reader::ChunkReaderExt;

/// `Lnam`: the names table shared by every script of a context. Handler,
/// property, global and symbol names all resolve through it.
pub struct ScriptNamesChunk {
    pub names: Vec<String>,
}

impl ScriptNamesChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<ScriptNamesChunk, String> {
        reader.set_endian(binary_reader::Endian::Big);

        let _unknown0 = reader.read_u32().map_err(|e| e.to_string())?;
        let _unknown1 = reader.read_u32().map_err(|e| e.to_string())?;
        let _len1 = reader.read_u32().map_err(|e| e.to_string())?;
        let _len2 = reader.read_u32().map_err(|e| e.to_string())?;
        let names_offset = reader.read_u16().map_err(|e| e.to_string())? as usize;
        let names_count = reader.read_u16().map_err(|e| e.to_string())?;

        reader.jmp(names_offset);
        let names = (0..names_count)
            .map_while(|_| reader.read_pascal_string().ok())
            .collect();

        Ok(ScriptNamesChunk { names })
    }
}
