use std::collections::HashMap;
use std::rc::Rc;

use log::{info, warn};

use crate::lingo::datum::{Datum, MemberRef, datum_bool, member_ref};
use crate::movie::chunks::cast_member::{MemberKind, MemberSpecificData};
use crate::movie::chunks::FOURCC;
use crate::movie::{CastDef, MovieFile, ScriptContext};

use super::ScriptError;
use super::bitmap::decode_bitmap;
use super::cast_member::{
    BitmapMember, CastMember, CastMemberType, PaletteMember, ScriptMember, ShapeMember,
    SoundMember, TextData,
};
use super::script::Script;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CastLoadState {
    None,
    Loading,
    Loaded,
}

/// One cast library. Internal casts alias the movie's file; external casts
/// get their own file exactly once, when the fetch succeeds.
pub struct CastLib {
    pub number: u32,
    pub name: String,
    pub file_name: String,
    pub state: CastLoadState,
    pub preload_mode: u8,
    pub min_member: u16,
    pub lctx: ScriptContext,
    pub capital_x: bool,
    pub dir_version: u16,
    source: Option<Rc<MovieFile>>,
    source_cast_index: usize,
    members: HashMap<u32, CastMember>,
    scripts: HashMap<u32, Rc<Script>>,
    next_dynamic_member: u32,
}

impl CastLib {
    pub fn new(number: u32, name: String, file_name: String) -> CastLib {
        CastLib {
            number,
            name,
            file_name,
            state: CastLoadState::None,
            preload_mode: 0,
            min_member: 1,
            lctx: ScriptContext::default(),
            capital_x: false,
            dir_version: 0,
            source: None,
            source_cast_index: 0,
            members: HashMap::new(),
            scripts: HashMap::new(),
            next_dynamic_member: 1,
        }
    }

    pub fn is_external(&self) -> bool {
        !self.file_name.is_empty()
    }

    fn cast_def(&self) -> Option<&CastDef> {
        self.source
            .as_ref()
            .and_then(|file| file.casts.get(self.source_cast_index))
    }

    /// Adopts a parsed file's cast: scripts build eagerly (handler
    /// resolution needs them), media members decode on first access.
    pub fn attach_source(&mut self, file: Rc<MovieFile>, cast_index: usize) {
        self.members.clear();
        self.scripts.clear();
        self.dir_version = file.dir_version;

        let Some(def) = file.casts.get(cast_index) else {
            self.source = Some(file);
            self.source_cast_index = cast_index;
            self.state = CastLoadState::Loaded;
            return;
        };
        self.min_member = def.min_member.max(1);
        self.capital_x = def.capital_x;
        self.lctx = def.lctx.clone().unwrap_or_default();
        if self.name.is_empty() {
            self.name = def.name.clone();
        }

        let variable_multiplier = variable_multiplier(self.capital_x, self.dir_version);
        let context_names = Rc::new(self.lctx.names.clone());
        let mut scripts = HashMap::new();
        let mut max_member = self.min_member as u32;
        for (&number, member_def) in &def.members {
            max_member = max_member.max(number);
            if member_def.chunk.kind != MemberKind::Script {
                continue;
            }
            let script_id = member_def.chunk.script_id;
            let Some(chunk) = self.lctx.scripts.get(&script_id) else {
                warn!(
                    "script member {} of cast {} names missing context slot {}",
                    number, self.number, script_id
                );
                continue;
            };
            let kind = match &member_def.chunk.specific_data {
                MemberSpecificData::Script(kind) => *kind,
                _ => crate::movie::chunks::cast_member::ScriptKind::Invalid,
            };
            let script = Script::from_chunk(
                member_ref(self.number as i32, number as i32),
                member_def.chunk.name.clone(),
                kind,
                chunk,
                &self.lctx,
                context_names.clone(),
                variable_multiplier,
            );
            scripts.insert(number, Rc::new(script));
        }
        self.scripts = scripts;
        self.next_dynamic_member = max_member + 1;
        self.source = Some(file);
        self.source_cast_index = cast_index;
        self.state = CastLoadState::Loaded;
        info!("cast {} \"{}\" loaded", self.number, self.name);
    }

    pub fn member_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self
            .cast_def()
            .map(|def| def.members.keys().copied().collect())
            .unwrap_or_default();
        for number in self.members.keys() {
            if !numbers.contains(number) {
                numbers.push(*number);
            }
        }
        numbers.sort_unstable();
        numbers
    }

    pub fn member_count(&self) -> usize {
        self.member_numbers().len()
    }

    pub fn max_member_number(&self) -> u32 {
        self.member_numbers().last().copied().unwrap_or(0)
    }

    pub fn first_free_member_number(&self) -> u32 {
        let numbers = self.member_numbers();
        let mut candidate = self.min_member as u32;
        while numbers.contains(&candidate) {
            candidate += 1;
        }
        candidate
    }

    /// Creates and caches the decoded member on first access.
    pub fn load_member(&mut self, number: u32) -> Option<&CastMember> {
        if !self.members.contains_key(&number) {
            let member = self.decode_member(number)?;
            self.members.insert(number, member);
        }
        self.members.get(&number)
    }

    pub fn load_member_mut(&mut self, number: u32) -> Option<&mut CastMember> {
        if !self.members.contains_key(&number) {
            let member = self.decode_member(number)?;
            self.members.insert(number, member);
        }
        self.members.get_mut(&number)
    }

    pub fn member_cached(&self, number: u32) -> Option<&CastMember> {
        self.members.get(&number)
    }

    fn decode_member(&self, number: u32) -> Option<CastMember> {
        let file = self.source.as_ref()?;
        let def = self.cast_def()?;
        let member_def = def.members.get(&number)?;
        let chunk = &member_def.chunk;

        let member_type = match chunk.kind {
            MemberKind::Bitmap => {
                let info = chunk.bitmap_info().cloned().unwrap_or_default();
                let image = member_def
                    .child_of_kind(FOURCC("BITD"))
                    .and_then(|entry| file.bitmap_chunk(entry.section_id))
                    .map(|bitd| {
                        let palette = member_def
                            .child_of_kind(FOURCC("CLUT"))
                            .and_then(|entry| file.palette_chunk(entry.section_id))
                            .map(|clut| clut.colors);
                        decode_bitmap(&info, &bitd.data, palette.as_deref())
                    });
                CastMemberType::Bitmap(BitmapMember {
                    reg_point: (info.reg_x, info.reg_y),
                    info,
                    image,
                })
            }
            MemberKind::Text | MemberKind::RichText | MemberKind::Button => {
                let text = member_def
                    .child_of_kind(FOURCC("STXT"))
                    .and_then(|entry| file.text_chunk(entry.section_id))
                    .map(|stxt| stxt.text)
                    .unwrap_or_default();
                let data = TextData::new(text);
                match chunk.kind {
                    MemberKind::Text => CastMemberType::Field(data),
                    MemberKind::Button => CastMemberType::Button(data),
                    _ => CastMemberType::Text(data),
                }
            }
            MemberKind::Script => CastMemberType::Script(ScriptMember {
                script_kind: chunk.script_kind().unwrap_or_default(),
                script_id: chunk.script_id,
            }),
            MemberKind::Sound => {
                let sound = member_def
                    .child_of_kind(FOURCC("snd "))
                    .or_else(|| member_def.child_of_kind(FOURCC("ediM")))
                    .and_then(|entry| file.sound_chunk(entry.section_id));
                CastMemberType::Sound(SoundMember {
                    chunk: sound,
                    looped: false,
                })
            }
            MemberKind::Shape => CastMemberType::Shape(ShapeMember::default()),
            MemberKind::Palette => {
                let colors = member_def
                    .child_of_kind(FOURCC("CLUT"))
                    .and_then(|entry| file.palette_chunk(entry.section_id))
                    .map(|clut| clut.colors)
                    .unwrap_or_default();
                CastMemberType::Palette(PaletteMember { colors })
            }
            _ => CastMemberType::Empty,
        };

        Some(CastMember {
            cast_lib: self.number,
            number,
            name: chunk.name.clone(),
            member_type,
        })
    }

    /// Script-created members have no chunk and are live immediately.
    pub fn create_member(
        &mut self,
        number: Option<u32>,
        member_type: CastMemberType,
    ) -> Result<MemberRef, ScriptError> {
        let number = number.unwrap_or_else(|| self.first_free_member_number());
        self.next_dynamic_member = self.next_dynamic_member.max(number + 1);
        self.members.insert(
            number,
            CastMember {
                cast_lib: self.number,
                number,
                name: String::new(),
                member_type,
            },
        );
        Ok(member_ref(self.number as i32, number as i32))
    }

    pub fn erase_member(&mut self, number: u32) {
        self.members.insert(
            number,
            CastMember {
                cast_lib: self.number,
                number,
                name: String::new(),
                member_type: CastMemberType::Empty,
            },
        );
        self.scripts.remove(&number);
    }

    pub fn find_member_by_name(&mut self, name: &str) -> Option<u32> {
        // decoded members first, then undecoded chunk names
        if let Some(member) = self
            .members
            .values()
            .find(|member| member.name.eq_ignore_ascii_case(name))
        {
            return Some(member.number);
        }
        let number = self.cast_def().and_then(|def| {
            def.members
                .iter()
                .find(|(_, member_def)| member_def.chunk.name.eq_ignore_ascii_case(name))
                .map(|(&number, _)| number)
        })?;
        Some(number)
    }

    /// Registers a script member built outside the chunk pipeline, for
    /// dynamically assembled casts and embedding hosts.
    pub fn insert_script(&mut self, number: u32, script: Rc<Script>) {
        self.next_dynamic_member = self.next_dynamic_member.max(number + 1);
        self.state = CastLoadState::Loaded;
        self.scripts.insert(number, script);
    }

    pub fn script_for_member(&self, number: u32) -> Option<Rc<Script>> {
        self.scripts.get(&number).cloned()
    }

    pub fn scripts(&self) -> impl Iterator<Item = (&u32, &Rc<Script>)> {
        self.scripts.iter()
    }

    pub fn get_prop(&self, prop: &str) -> Result<Datum, ScriptError> {
        match prop {
            "number" => Ok(Datum::Int(self.number as i32)),
            "name" => Ok(Datum::Str(self.name.clone())),
            "fileName" => Ok(Datum::Str(self.file_name.clone())),
            "preloadMode" => Ok(Datum::Int(self.preload_mode as i32)),
            "selection" => Ok(crate::lingo::datum::new_list(vec![])),
            "loaded" => Ok(datum_bool(self.state == CastLoadState::Loaded)),
            _ if prop.eq_ignore_ascii_case("memberCount")
                || prop.to_ascii_lowercase().contains("member") =>
            {
                Ok(Datum::Int(self.member_count() as i32))
            }
            _ => Err(ScriptError::new(format!(
                "Cannot get castLib property {}",
                prop
            ))),
        }
    }

    pub fn set_prop(&mut self, prop: &str, value: Datum) -> Result<(), ScriptError> {
        match prop {
            "preloadMode" => {
                self.preload_mode = value.int_value()? as u8;
                Ok(())
            }
            "name" => {
                self.name = value.string_value()?;
                Ok(())
            }
            "fileName" => {
                self.file_name = value.string_value()?;
                // a new file name invalidates whatever was loaded
                self.state = CastLoadState::None;
                Ok(())
            }
            _ => Err(ScriptError::new(format!(
                "Cannot set castLib property {}",
                prop
            ))),
        }
    }
}

pub fn variable_multiplier(capital_x: bool, dir_version: u16) -> u32 {
    if capital_x {
        1
    } else if dir_version >= 500 {
        8
    } else {
        6
    }
}
