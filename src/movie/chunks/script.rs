use binary_reader::BinaryReader;
use itertools::Itertools;

use super::handler::{HandlerDef, HandlerRecord};
use super::literal::LiteralRecord;
use crate::lingo::datum::Datum;

/// `Lscr`: one compiled script with its handlers, literal pool, and
/// property/global name id tables.
#[derive(Clone)]
pub struct ScriptChunk {
    pub script_number: u16,
    pub literals: Vec<Datum>,
    pub handlers: Vec<HandlerDef>,
    pub property_name_ids: Vec<u16>,
    pub global_name_ids: Vec<u16>,
}

impl ScriptChunk {
    pub fn from_reader(
        reader: &mut BinaryReader,
        dir_version: u16,
        capital_x: bool,
    ) -> Result<ScriptChunk, String> {
        // script sections are big endian regardless of file endianness
        reader.set_endian(binary_reader::Endian::Big);

        reader.jmp(16);
        let _header_length = reader.read_u16().map_err(|e| e.to_string())?;
        let script_number = reader.read_u16().map_err(|e| e.to_string())?;

        reader.jmp(60);
        let properties_count = reader.read_u16().map_err(|e| e.to_string())? as usize;
        let properties_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let globals_count = reader.read_u16().map_err(|e| e.to_string())? as usize;
        let globals_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let handlers_count = reader.read_u16().map_err(|e| e.to_string())?;
        let handlers_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let literals_count = reader.read_u16().map_err(|e| e.to_string())?;
        let literals_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let _literals_data_count = reader.read_u32().map_err(|e| e.to_string())?;
        let literals_data_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;

        let property_name_ids = read_name_id_table(reader, properties_count, properties_offset);
        let global_name_ids = read_name_id_table(reader, globals_count, globals_offset);

        reader.jmp(handlers_offset);
        let handler_records = (0..handlers_count)
            .map(|_| HandlerRecord::read_record(reader, capital_x))
            .collect::<Result<Vec<_>, _>>()?;

        let handlers = handler_records
            .iter()
            .map(|record| record.read_data(reader))
            .collect::<Result<Vec<_>, _>>()?;

        reader.jmp(literals_offset);
        let literal_records = (0..literals_count)
            .filter_map(|_| LiteralRecord::read_record(reader, dir_version).ok())
            .collect_vec();

        let literals = literal_records
            .iter()
            .map(|record| {
                record
                    .read_data(reader, literals_data_offset)
                    .unwrap_or(Datum::Void)
            })
            .collect_vec();

        Ok(ScriptChunk {
            script_number,
            literals,
            handlers,
            property_name_ids,
            global_name_ids,
        })
    }
}

fn read_name_id_table(reader: &mut BinaryReader, count: usize, offset: usize) -> Vec<u16> {
    reader.jmp(offset);
    (0..count).map_while(|_| reader.read_u16().ok()).collect()
}
