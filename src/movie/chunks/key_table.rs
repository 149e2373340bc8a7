use binary_reader::BinaryReader;
use fxhash::FxHashMap;

/// One row of the resource-owner table: section `section_id` (of kind
/// `fourcc`) belongs to owner `owner_id`.
#[derive(Clone, Debug)]
pub struct KeyTableEntry {
    pub section_id: u32,
    pub owner_id: u32,
    pub fourcc: u32,
}

pub struct KeyTableChunk {
    pub entries: Vec<KeyTableEntry>,
}

impl KeyTableChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<KeyTableChunk, String> {
        let _entry_size = reader.read_u16().map_err(|e| e.to_string())?;
        let _entry_size2 = reader.read_u16().map_err(|e| e.to_string())?;
        let entry_count = reader.read_u32().map_err(|e| e.to_string())?;
        let used_count = reader.read_u32().map_err(|e| e.to_string())?;

        let entries = (0..entry_count.min(used_count.max(entry_count)))
            .map_while(|_| {
                let section_id = reader.read_u32().ok()?;
                let owner_id = reader.read_u32().ok()?;
                let fourcc = reader.read_u32().ok()?;
                Some(KeyTableEntry {
                    section_id,
                    owner_id,
                    fourcc,
                })
            })
            .collect();

        Ok(KeyTableChunk { entries })
    }

    pub fn entries_for_owner(&self, owner_id: u32) -> Vec<&KeyTableEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .collect()
    }

    pub fn find_for_owner(&self, owner_id: u32, fourcc: u32) -> Option<&KeyTableEntry> {
        self.entries
            .iter()
            .find(|entry| entry.owner_id == owner_id && entry.fourcc == fourcc)
    }

    pub fn owner_of(&self, section_id: u32) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.section_id == section_id)
            .map(|entry| entry.owner_id)
    }

    /// owner id -> entries, built once for repeated lookups.
    pub fn owner_map(&self) -> FxHashMap<u32, Vec<&KeyTableEntry>> {
        let mut map: FxHashMap<u32, Vec<&KeyTableEntry>> = FxHashMap::default();
        for entry in &self.entries {
            map.entry(entry.owner_id).or_default().push(entry);
        }
        map
    }
}
