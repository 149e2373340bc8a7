//! Several chunk kinds share an offset-table list layout: a data offset,
//! a u16 count of u32 offsets, then the packed item buffers.

use binary_reader::{BinaryReader, Endian};

use crate::utils::decode_mac_roman;

pub struct OffsetTableList {
    pub items: Vec<Vec<u8>>,
}

impl OffsetTableList {
    pub fn read(reader: &mut BinaryReader, data_offset: usize) -> Result<OffsetTableList, String> {
        reader.jmp(data_offset);
        let offset_table_len = reader.read_u16().map_err(|e| e.to_string())?;
        let offset_table: Vec<usize> = (0..offset_table_len)
            .map(|_| reader.read_u32().map(|x| x as usize))
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?;

        let items_len = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let list_offset = reader.pos;

        let items = (0..offset_table.len())
            .map(|i| {
                let offset = offset_table[i];
                let next_offset = if i == offset_table.len() - 1 {
                    items_len
                } else {
                    offset_table[i + 1]
                };
                reader.jmp(list_offset + offset);
                reader
                    .read_bytes(next_offset.saturating_sub(offset))
                    .map(|b| b.to_vec())
            })
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?;

        Ok(OffsetTableList { items })
    }

    pub fn item(&self, index: usize) -> &[u8] {
        self.items.get(index).map(|x| x.as_slice()).unwrap_or(&[])
    }

    pub fn pascal_string(&self, index: usize) -> String {
        let buf = self.item(index);
        if buf.is_empty() {
            return String::new();
        }
        let len = (buf[0] as usize).min(buf.len() - 1);
        decode_mac_roman(&buf[1..1 + len])
    }

    pub fn string(&self, index: usize) -> String {
        decode_mac_roman(self.item(index))
    }

    pub fn u16(&self, index: usize, endian: Endian) -> u16 {
        let buf = self.item(index);
        if buf.len() < 2 {
            return 0;
        }
        match endian {
            Endian::Little => u16::from_le_bytes([buf[0], buf[1]]),
            _ => u16::from_be_bytes([buf[0], buf[1]]),
        }
    }
}
