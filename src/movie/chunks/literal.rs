use binary_reader::BinaryReader;
use num_derive::FromPrimitive;

use crate::io::reader::ChunkReaderExt;
use crate::lingo::datum::Datum;
use crate::utils::decode_mac_roman;

#[derive(Copy, Clone, FromPrimitive)]
pub enum LiteralKind {
    Invalid = 0,
    String = 1,
    Int = 4,
    Float = 9,
    CompiledJs = 11,
}

pub struct LiteralRecord {
    pub kind: LiteralKind,
    pub offset: usize,
}

impl LiteralRecord {
    pub fn read_record(
        reader: &mut BinaryReader,
        dir_version: u16,
    ) -> Result<LiteralRecord, String> {
        let kind_id = if dir_version >= 500 {
            reader.read_u32().map_err(|e| e.to_string())?
        } else {
            reader.read_u16().map_err(|e| e.to_string())? as u32
        };
        let kind = num::FromPrimitive::from_u32(kind_id)
            .ok_or_else(|| format!("Invalid literal kind: {}", kind_id))?;
        let offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        Ok(LiteralRecord { kind, offset })
    }

    /// Ints carry their value in the offset field; everything else is a
    /// length-prefixed payload in the literal data block.
    pub fn read_data(
        &self,
        reader: &mut BinaryReader,
        data_offset: usize,
    ) -> Result<Datum, String> {
        match self.kind {
            LiteralKind::Int => Ok(Datum::Int(self.offset as i32)),
            LiteralKind::String => {
                reader.jmp(data_offset + self.offset);
                let length = reader.read_u32().map_err(|e| e.to_string())? as usize;
                // length includes a trailing NUL
                let bytes = reader
                    .read_bytes(length.saturating_sub(1))
                    .map_err(|e| e.to_string())?;
                Ok(Datum::Str(decode_mac_roman(bytes)))
            }
            LiteralKind::Float => {
                reader.jmp(data_offset + self.offset);
                let length = reader.read_u32().map_err(|e| e.to_string())? as usize;
                let value = if length == 8 {
                    let bytes = reader.read_bytes(8).map_err(|e| e.to_string())?;
                    f64::from_be_bytes([
                        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6],
                        bytes[7],
                    ])
                } else if length == 10 {
                    reader.read_apple_float_80()?
                } else {
                    0.0
                };
                Ok(Datum::Float(value))
            }
            _ => Ok(Datum::Void),
        }
    }
}
