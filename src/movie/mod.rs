pub mod chunks;

use std::collections::HashMap;

use binary_reader::{BinaryReader, Endian};
use fxhash::FxHashMap;
use log::warn;

use chunks::bitmap::BitmapChunk;
use chunks::cast_list::{CastListChunk, CastListEntry};
use chunks::cast_map::CastMapChunk;
use chunks::cast_member::CastMemberChunk;
use chunks::config::ConfigChunk;
use chunks::frame_labels::FrameLabelsChunk;
use chunks::key_table::{KeyTableChunk, KeyTableEntry};
use chunks::palette::PaletteChunk;
use chunks::score::ScoreChunk;
use chunks::script::ScriptChunk;
use chunks::script_context::ScriptContextChunk;
use chunks::script_names::ScriptNamesChunk;
use chunks::sound::SoundChunk;
use chunks::text::TextChunk;
use chunks::{FOURCC, RawChunk, fourcc_to_string};

/// Per-cast script table: the shared names list plus every `Lscr` keyed by
/// its context slot (1-based).
#[derive(Clone, Default)]
pub struct ScriptContext {
    pub names: Vec<String>,
    pub scripts: HashMap<u32, ScriptChunk>,
}

impl ScriptContext {
    /// Missing ids resolve to a `#<id>` sentinel rather than failing.
    pub fn resolve_name(&self, name_id: u16) -> String {
        self.names
            .get(name_id as usize)
            .cloned()
            .unwrap_or_else(|| format!("#{}", name_id))
    }
}

/// One member's header chunk plus the key-table rows naming its media
/// children, so payloads decode lazily.
pub struct CastMemberDef {
    pub chunk: CastMemberChunk,
    pub children: Vec<KeyTableEntry>,
}

impl CastMemberDef {
    pub fn child_of_kind(&self, fourcc: u32) -> Option<&KeyTableEntry> {
        self.children.iter().find(|entry| entry.fourcc == fourcc)
    }
}

/// One cast library as laid out in the file.
pub struct CastDef {
    pub id: u32,
    pub name: String,
    pub file_path: String,
    pub min_member: u16,
    pub members: HashMap<u32, CastMemberDef>,
    pub lctx: Option<ScriptContext>,
    pub capital_x: bool,
}

/// The parsed movie container. Splitting the container into sections is
/// the host parser's job; this type links the sections into casts, score
/// and script contexts through the key table.
pub struct MovieFile {
    pub file_name: String,
    pub base_path: String,
    pub endian: Endian,
    pub dir_version: u16,
    pub config: Option<ConfigChunk>,
    pub key_table: KeyTableChunk,
    pub cast_entries: Vec<CastListEntry>,
    pub casts: Vec<CastDef>,
    pub score: Option<ScoreChunk>,
    pub frame_labels: Option<FrameLabelsChunk>,
    chunks_by_id: FxHashMap<u32, RawChunk>,
}

// owner id of the lone cast in movies that predate cast lists
const SINGLE_CAST_OWNER: u32 = 1024;

impl MovieFile {
    pub fn from_chunks(
        chunks: Vec<RawChunk>,
        endian: Endian,
        file_name: &str,
        base_path: &str,
    ) -> MovieFile {
        let mut chunks_by_id: FxHashMap<u32, RawChunk> = FxHashMap::default();
        let mut ids_by_fourcc: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        for chunk in chunks {
            ids_by_fourcc.entry(chunk.fourcc).or_default().push(chunk.id);
            chunks_by_id.insert(chunk.id, chunk);
        }

        let first_of = |fourcc: &str| -> Option<&RawChunk> {
            ids_by_fourcc
                .get(&FOURCC(fourcc))
                .and_then(|ids| ids.first())
                .and_then(|id| chunks_by_id.get(id))
        };

        let config = first_of("DRCF")
            .or_else(|| first_of("VWCF"))
            .and_then(|chunk| ConfigChunk::from_bytes(&chunk.data));
        let dir_version = config
            .as_ref()
            .map(|c| c.human_version())
            .unwrap_or(500);

        let key_table = first_of("KEY*")
            .and_then(|chunk| {
                let mut reader = reader_for(&chunk.data, endian);
                KeyTableChunk::from_reader(&mut reader).ok()
            })
            .unwrap_or(KeyTableChunk { entries: vec![] });

        let cast_entries = first_of("MCsL")
            .and_then(|chunk| {
                let mut reader = reader_for(&chunk.data, endian);
                CastListChunk::from_reader(&mut reader, endian).ok()
            })
            .map(|list| list.entries)
            .unwrap_or_else(|| {
                // single-cast movie: synthesize the internal library
                vec![CastListEntry {
                    name: "Internal".to_string(),
                    file_path: String::new(),
                    preload_settings: 0,
                    min_member: config.as_ref().map(|c| c.min_member).unwrap_or(1),
                    max_member: config.as_ref().map(|c| c.max_member).unwrap_or(0),
                    id: SINGLE_CAST_OWNER,
                }]
            });

        let score = first_of("VWSC")
            .or_else(|| first_of("SCVW"))
            .and_then(|chunk| {
                let mut reader = reader_for(&chunk.data, endian);
                ScoreChunk::from_reader(&mut reader)
                    .map_err(|err| warn!("score chunk rejected: {}", err))
                    .ok()
            });

        let frame_labels = first_of("VWLB").and_then(|chunk| {
            let mut reader = reader_for(&chunk.data, endian);
            FrameLabelsChunk::from_reader(&mut reader).ok()
        });

        let mut movie = MovieFile {
            file_name: file_name.to_string(),
            base_path: base_path.to_string(),
            endian,
            dir_version,
            config,
            key_table,
            cast_entries,
            casts: vec![],
            score,
            frame_labels,
            chunks_by_id,
        };
        movie.link_casts();
        movie
    }

    fn link_casts(&mut self) {
        let mut casts = Vec::with_capacity(self.cast_entries.len());
        for entry in &self.cast_entries {
            let cast_map = self
                .key_table
                .find_for_owner(entry.id, FOURCC("CAS*"))
                .and_then(|key| self.chunks_by_id.get(&key.section_id))
                .or_else(|| {
                    // pre-cast-list movies carry a lone CAS* section
                    self.chunks_by_id
                        .values()
                        .find(|chunk| chunk.fourcc == FOURCC("CAS*"))
                })
                .and_then(|chunk| {
                    let mut reader = reader_for(&chunk.data, self.endian);
                    CastMapChunk::from_reader(&mut reader).ok()
                });

            let lctx_key = self
                .key_table
                .find_for_owner(entry.id, FOURCC("Lctx"))
                .or_else(|| self.key_table.find_for_owner(entry.id, FOURCC("LctX")))
                .cloned();
            let capital_x = lctx_key
                .as_ref()
                .map(|key| key.fourcc == FOURCC("LctX"))
                .unwrap_or(false);

            let lctx = lctx_key.as_ref().and_then(|key| self.read_script_context(key, capital_x));

            let mut members: HashMap<u32, CastMemberDef> = HashMap::new();
            if let Some(cast_map) = cast_map {
                for (slot, section_id) in cast_map.member_section_ids.iter().enumerate() {
                    if *section_id == 0 {
                        continue;
                    }
                    let member_number = entry.min_member.max(1) as u32 + slot as u32;
                    let Some(chunk) = self.chunks_by_id.get(section_id) else {
                        continue;
                    };
                    let mut reader = reader_for(&chunk.data, self.endian);
                    match CastMemberChunk::from_reader(&mut reader, self.dir_version) {
                        Ok(member_chunk) => {
                            let children = self
                                .key_table
                                .entries_for_owner(*section_id)
                                .into_iter()
                                .cloned()
                                .collect();
                            members.insert(
                                member_number,
                                CastMemberDef {
                                    chunk: member_chunk,
                                    children,
                                },
                            );
                        }
                        Err(err) => {
                            warn!(
                                "member section {} of cast {} rejected: {}",
                                section_id, entry.name, err
                            );
                        }
                    }
                }
            }

            casts.push(CastDef {
                id: entry.id,
                name: entry.name.clone(),
                file_path: entry.file_path.clone(),
                min_member: entry.min_member,
                members,
                lctx,
                capital_x,
            });
        }
        self.casts = casts;
    }

    fn read_script_context(&self, key: &KeyTableEntry, capital_x: bool) -> Option<ScriptContext> {
        let chunk = self.chunks_by_id.get(&key.section_id)?;
        let mut reader = reader_for(&chunk.data, self.endian);
        let lctx = ScriptContextChunk::from_reader(&mut reader).ok()?;

        let names = self
            .chunks_by_id
            .get(&lctx.lnam_section_id)
            .and_then(|chunk| {
                let mut reader = reader_for(&chunk.data, self.endian);
                ScriptNamesChunk::from_reader(&mut reader).ok()
            })
            .map(|chunk| chunk.names)
            .unwrap_or_default();

        let mut scripts: HashMap<u32, ScriptChunk> = HashMap::new();
        for (i, entry) in lctx.section_map.iter().enumerate() {
            if entry.section_id < 0 {
                continue;
            }
            let Some(chunk) = self.chunks_by_id.get(&(entry.section_id as u32)) else {
                continue;
            };
            if chunk.fourcc != FOURCC("Lscr") {
                continue;
            }
            let mut reader = reader_for(&chunk.data, self.endian);
            match ScriptChunk::from_reader(&mut reader, self.dir_version, capital_x) {
                Ok(script) => {
                    scripts.insert(i as u32 + 1, script);
                }
                Err(err) => {
                    warn!(
                        "script section {} rejected ({}): {}",
                        entry.section_id,
                        fourcc_to_string(chunk.fourcc),
                        err
                    );
                }
            }
        }

        Some(ScriptContext { names, scripts })
    }

    pub fn raw_chunk(&self, section_id: u32) -> Option<&RawChunk> {
        self.chunks_by_id.get(&section_id)
    }

    pub fn text_chunk(&self, section_id: u32) -> Option<TextChunk> {
        let chunk = self.chunks_by_id.get(&section_id)?;
        let mut reader = reader_for(&chunk.data, self.endian);
        TextChunk::from_reader(&mut reader).ok()
    }

    pub fn bitmap_chunk(&self, section_id: u32) -> Option<BitmapChunk> {
        let chunk = self.chunks_by_id.get(&section_id)?;
        let mut reader = reader_for(&chunk.data, self.endian);
        BitmapChunk::from_reader(&mut reader).ok()
    }

    pub fn palette_chunk(&self, section_id: u32) -> Option<PaletteChunk> {
        let chunk = self.chunks_by_id.get(&section_id)?;
        let mut reader = reader_for(&chunk.data, self.endian);
        PaletteChunk::from_reader(&mut reader).ok()
    }

    pub fn sound_chunk(&self, section_id: u32) -> Option<SoundChunk> {
        let chunk = self.chunks_by_id.get(&section_id)?;
        let mut reader = reader_for(&chunk.data, self.endian);
        match fourcc_to_string(chunk.fourcc).as_str() {
            "snd " => SoundChunk::from_snd_chunk(&mut reader).ok(),
            "ediM" => SoundChunk::from_media_chunk(&mut reader).ok(),
            _ => None,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.score
            .as_ref()
            .map(|score| score.header.frame_count)
            .unwrap_or(1)
            .max(1)
    }
}

fn reader_for(data: &[u8], endian: Endian) -> BinaryReader {
    let mut reader = BinaryReader::from_u8(data);
    reader.set_endian(endian);
    reader
}
