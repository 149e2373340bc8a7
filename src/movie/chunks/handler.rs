use binary_reader::BinaryReader;
use fxhash::FxHashMap;

use crate::lingo::opcode::OpCode;

/// One decoded instruction. `pos` is the byte offset inside the handler's
/// compiled block; jump targets are expressed relative to it.
#[derive(Clone)]
pub struct Bytecode {
    pub opcode: OpCode,
    pub raw_opcode: u16,
    pub operand: i64,
    pub pos: usize,
}

pub struct HandlerRecord {
    pub name_id: u16,
    compiled_len: usize,
    compiled_offset: usize,
    argument_count: u16,
    argument_offset: usize,
    locals_count: u16,
    locals_offset: usize,
    globals_count: u16,
    globals_offset: usize,
}

#[derive(Clone)]
pub struct HandlerDef {
    pub name_id: u16,
    pub instructions: Vec<Bytecode>,
    /// byte offset -> instruction index, for jump resolution
    pub offset_index_map: FxHashMap<usize, usize>,
    pub argument_name_ids: Vec<u16>,
    pub local_name_ids: Vec<u16>,
    pub global_name_ids: Vec<u16>,
}

impl HandlerDef {
    pub fn index_of_offset(&self, offset: usize) -> Option<usize> {
        self.offset_index_map.get(&offset).copied()
    }
}

impl HandlerRecord {
    pub fn read_record(
        reader: &mut BinaryReader,
        capital_x: bool,
    ) -> Result<HandlerRecord, String> {
        let name_id = reader.read_u16().map_err(|e| e.to_string())?;
        let _vector_pos = reader.read_u16().map_err(|e| e.to_string())?;
        let compiled_len = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let compiled_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let argument_count = reader.read_u16().map_err(|e| e.to_string())?;
        let argument_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let locals_count = reader.read_u16().map_err(|e| e.to_string())?;
        let locals_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let globals_count = reader.read_u16().map_err(|e| e.to_string())?;
        let globals_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let _unknown1 = reader.read_u32().map_err(|e| e.to_string())?;
        let _unknown2 = reader.read_u16().map_err(|e| e.to_string())?;
        let _line_count = reader.read_u16().map_err(|e| e.to_string())?;
        let _line_offset = reader.read_u32().map_err(|e| e.to_string())?;
        if capital_x {
            let _stack_height = reader.read_u32().map_err(|e| e.to_string())?;
        }

        Ok(HandlerRecord {
            name_id,
            compiled_len,
            compiled_offset,
            argument_count,
            argument_offset,
            locals_count,
            locals_offset,
            globals_count,
            globals_offset,
        })
    }

    pub fn read_data(&self, reader: &mut BinaryReader) -> Result<HandlerDef, String> {
        let mut instructions: Vec<Bytecode> = Vec::new();
        let mut offset_index_map: FxHashMap<usize, usize> = FxHashMap::default();

        reader.jmp(self.compiled_offset);
        while reader.pos < self.compiled_offset + self.compiled_len {
            let pos = reader.pos - self.compiled_offset;
            let raw = reader.read_u8().map_err(|e| e.to_string())? as u16;
            let opcode = OpCode::from_raw(raw);

            // operand width is banded by the raw opcode
            let operand: i64 = if raw >= 0xc0 {
                reader.read_i32().map_err(|e| e.to_string())? as i64
            } else if raw >= 0x80 {
                match opcode {
                    // the two push_int variants carry signed operands;
                    // push_int8 may push a 16-bit int in older movies
                    OpCode::PushInt8 | OpCode::PushInt16 => {
                        reader.read_i16().map_err(|e| e.to_string())? as i64
                    }
                    _ => reader.read_u16().map_err(|e| e.to_string())? as i64,
                }
            } else if raw >= 0x40 {
                match opcode {
                    OpCode::PushInt8 => reader.read_i8().map_err(|e| e.to_string())? as i64,
                    _ => reader.read_u8().map_err(|e| e.to_string())? as i64,
                }
            } else {
                0
            };

            instructions.push(Bytecode {
                opcode,
                raw_opcode: raw,
                operand,
                pos,
            });
            offset_index_map.insert(pos, instructions.len() - 1);
        }

        let argument_name_ids =
            read_name_id_table(reader, self.argument_count as usize, self.argument_offset);
        let local_name_ids =
            read_name_id_table(reader, self.locals_count as usize, self.locals_offset);
        let global_name_ids =
            read_name_id_table(reader, self.globals_count as usize, self.globals_offset);

        Ok(HandlerDef {
            name_id: self.name_id,
            instructions,
            offset_index_map,
            argument_name_ids,
            local_name_ids,
            global_name_ids,
        })
    }
}

fn read_name_id_table(reader: &mut BinaryReader, count: usize, offset: usize) -> Vec<u16> {
    reader.jmp(offset);
    (0..count).map_while(|_| reader.read_u16().ok()).collect()
}
