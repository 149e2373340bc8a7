use std::rc::Rc;

use log::warn;

use crate::lingo::datum::{Datum, MemberRef, member_ref};
use crate::movie::MovieFile;
use crate::movie::chunks::cast_member::ScriptKind;

use super::ScriptError;
use super::cast_lib::{CastLib, CastLoadState};
use super::cast_member::CastMember;
use super::net::{ByteLoader, ContainerParser, display_name_for, fetch_bytes, normalize_cast_path};
use super::script::{HandlerRef, Script};

pub struct CastManager {
    pub casts: Vec<CastLib>,
}

impl CastManager {
    pub const fn empty() -> CastManager {
        CastManager { casts: Vec::new() }
    }

    /// Builds the library list from the movie's cast list. Internal casts
    /// adopt the movie file immediately; external casts wait for an
    /// explicit preload.
    pub fn load_from_file(&mut self, file: &Rc<MovieFile>) {
        let mut casts = Vec::with_capacity(file.cast_entries.len());
        for (index, entry) in file.cast_entries.iter().enumerate() {
            let file_name = normalize_cast_path(&file.base_path, &entry.file_path)
                .unwrap_or_default();
            let mut cast = CastLib::new((index + 1) as u32, entry.name.clone(), file_name);
            if !cast.is_external() {
                cast.attach_source(file.clone(), index);
                if cast.name.is_empty() && cast.number == 1 {
                    cast.name = "Internal".to_string();
                }
            }
            casts.push(cast);
        }
        self.casts = casts;
    }

    /// External fetch: candidate transports in order, then parse and adopt
    /// the blob's first cast. Failure leaves the cast empty in `None`.
    pub fn preload_cast(
        &mut self,
        number: u32,
        loader: &mut dyn ByteLoader,
        parser: &mut dyn ContainerParser,
    ) -> bool {
        let Some(cast) = self.get_cast_mut(number) else {
            return false;
        };
        if cast.state == CastLoadState::Loaded || !cast.is_external() {
            return cast.state == CastLoadState::Loaded;
        }
        cast.state = CastLoadState::Loading;
        let file_name = cast.file_name.clone();

        let fetched = fetch_bytes(loader, &file_name);
        let Some((resolved_url, bytes)) = fetched else {
            warn!("fetching {} failed", file_name);
            if let Some(cast) = self.get_cast_mut(number) {
                cast.state = CastLoadState::None;
            }
            return false;
        };

        let parsed = parser.parse(&bytes, &resolved_url, &resolved_url);
        let Some(cast_file) = parsed else {
            warn!("could not parse {}", resolved_url);
            if let Some(cast) = self.get_cast_mut(number) {
                cast.state = CastLoadState::None;
            }
            return false;
        };

        if let Some(cast) = self.get_cast_mut(number) {
            if cast.name.is_empty() {
                cast.name = display_name_for(&resolved_url);
            }
            cast.file_name = resolved_url;
            cast.attach_source(Rc::new(cast_file), 0);
            return true;
        }
        false
    }

    pub fn get_cast(&self, number: u32) -> Result<&CastLib, ScriptError> {
        self.get_cast_or_null(number)
            .ok_or_else(|| ScriptError::new(format!("Cast not found: {}", number)))
    }

    pub fn get_cast_or_null(&self, number: u32) -> Option<&CastLib> {
        if number == 0 {
            return None;
        }
        self.casts.get(number as usize - 1)
    }

    pub fn get_cast_mut(&mut self, number: u32) -> Option<&mut CastLib> {
        if number == 0 {
            return None;
        }
        self.casts.get_mut(number as usize - 1)
    }

    pub fn get_cast_by_name(&self, name: &str) -> Option<&CastLib> {
        self.casts
            .iter()
            .find(|cast| cast.name.eq_ignore_ascii_case(name))
    }

    pub fn get_cast_number_by_name(&self, name: &str) -> Option<u32> {
        self.get_cast_by_name(name).map(|cast| cast.number)
    }

    pub fn find_member(&mut self, member_ref: &MemberRef) -> Option<&CastMember> {
        if member_ref.cast_lib > 0 {
            return self
                .get_cast_mut(member_ref.cast_lib as u32)?
                .load_member(member_ref.cast_member as u32);
        }
        // bare member numbers search every cast in order
        let cast_numbers: Vec<u32> = self.casts.iter().map(|cast| cast.number).collect();
        for number in cast_numbers {
            let found = self
                .get_cast_mut(number)
                .and_then(|cast| cast.load_member(member_ref.cast_member as u32))
                .is_some();
            if found {
                return self
                    .get_cast_mut(number)
                    .and_then(|cast| cast.load_member(member_ref.cast_member as u32));
            }
        }
        None
    }

    pub fn find_member_mut(&mut self, member_ref: &MemberRef) -> Option<&mut CastMember> {
        if member_ref.cast_lib > 0 {
            return self
                .get_cast_mut(member_ref.cast_lib as u32)?
                .load_member_mut(member_ref.cast_member as u32);
        }
        let cast_numbers: Vec<u32> = self.casts.iter().map(|cast| cast.number).collect();
        for number in cast_numbers {
            let found = self
                .get_cast_mut(number)
                .and_then(|cast| cast.load_member(member_ref.cast_member as u32))
                .is_some();
            if found {
                return self
                    .get_cast_mut(number)
                    .and_then(|cast| cast.load_member_mut(member_ref.cast_member as u32));
            }
        }
        None
    }

    pub fn find_member_ref_by_name(&mut self, name: &str) -> Option<MemberRef> {
        let cast_numbers: Vec<u32> = self.casts.iter().map(|cast| cast.number).collect();
        for number in cast_numbers {
            if let Some(member_number) = self
                .get_cast_mut(number)
                .and_then(|cast| cast.find_member_by_name(name))
            {
                return Some(member_ref(number as i32, member_number as i32));
            }
        }
        None
    }

    pub fn find_member_ref_by_slot(&self, slot: i32) -> Option<MemberRef> {
        let reference = MemberRef::from_slot_number(slot);
        if reference.cast_lib > 0 {
            return Some(reference);
        }
        if reference.cast_member <= 0 {
            return None;
        }
        // resolve the bare number against the first cast that owns it
        for cast in &self.casts {
            if cast
                .member_numbers()
                .contains(&(reference.cast_member as u32))
            {
                return Some(member_ref(cast.number as i32, reference.cast_member));
            }
        }
        None
    }

    /// `member("name")` / `member(7, "castName")`-style resolution.
    pub fn resolve_member_ref(
        &mut self,
        member_name_or_num: &Datum,
        cast_name_or_num: Option<&Datum>,
    ) -> Result<Option<MemberRef>, ScriptError> {
        let cast_number = match cast_name_or_num {
            Some(datum) if datum.is_string() => {
                self.get_cast_number_by_name(&datum.string_value()?)
            }
            Some(datum) if datum.is_number() => {
                let number = datum.int_value()?;
                if number > 0 { Some(number as u32) } else { None }
            }
            _ => None,
        };

        if member_name_or_num.is_string() {
            let name = member_name_or_num.string_value()?;
            if let Some(cast_number) = cast_number {
                let found = self
                    .get_cast_mut(cast_number)
                    .and_then(|cast| cast.find_member_by_name(&name));
                Ok(found.map(|n| member_ref(cast_number as i32, n as i32)))
            } else {
                Ok(self.find_member_ref_by_name(&name))
            }
        } else if member_name_or_num.is_number() {
            let number = member_name_or_num.int_value()?;
            if let Some(cast_number) = cast_number {
                Ok(Some(member_ref(cast_number as i32, number)))
            } else {
                Ok(self.find_member_ref_by_slot(number))
            }
        } else {
            Err(ScriptError::new(format!(
                "Member identifier type invalid: {}",
                member_name_or_num.type_str()
            )))
        }
    }

    pub fn get_script_by_ref(&self, member_ref: &MemberRef) -> Option<Rc<Script>> {
        if member_ref.cast_lib > 0 {
            return self
                .get_cast_or_null(member_ref.cast_lib as u32)?
                .script_for_member(member_ref.cast_member as u32);
        }
        for cast in &self.casts {
            if let Some(script) = cast.script_for_member(member_ref.cast_member as u32) {
                return Some(script);
            }
        }
        None
    }

    pub fn get_movie_scripts(&self) -> Vec<Rc<Script>> {
        let mut result = Vec::new();
        for cast in &self.casts {
            let mut cast_scripts: Vec<&Rc<Script>> = cast
                .scripts()
                .filter(|(_, script)| script.kind == ScriptKind::Movie)
                .map(|(_, script)| script)
                .collect();
            cast_scripts.sort_by_key(|script| script.member_ref.cast_member);
            result.extend(cast_scripts.into_iter().cloned());
        }
        result
    }

    /// Module-D handler search: movie scripts first, then every loaded
    /// external cast's scripts in id order.
    pub fn find_handler(&self, name: &str) -> Option<(Rc<Script>, HandlerRef)> {
        for script in self.get_movie_scripts() {
            if let Some(handler) = script.handler_named(name) {
                return Some((
                    script.clone(),
                    (script.member_ref.clone(), handler.name.clone()),
                ));
            }
        }
        for cast in &self.casts {
            if !cast.is_external() || cast.state != CastLoadState::Loaded {
                continue;
            }
            let mut scripts: Vec<&Rc<Script>> = cast.scripts().map(|(_, s)| s).collect();
            scripts.sort_by_key(|script| script.member_ref.cast_member);
            for script in scripts {
                if let Some(handler) = script.handler_named(name) {
                    return Some((
                        (*script).clone(),
                        (script.member_ref.clone(), handler.name.clone()),
                    ));
                }
            }
        }
        None
    }

    pub fn find_handler_in_script(
        &self,
        script_ref: &MemberRef,
        name: &str,
    ) -> Option<HandlerRef> {
        let script = self.get_script_by_ref(script_ref)?;
        script
            .handler_named(name)
            .map(|handler| (script.member_ref.clone(), handler.name.clone()))
    }

    pub fn field_text(&mut self, member_ref: &MemberRef) -> Result<String, ScriptError> {
        let member = self
            .find_member(member_ref)
            .ok_or_else(|| ScriptError::new("Cast member not found".to_string()))?;
        member
            .member_type
            .as_text_data()
            .map(|data| data.text.clone())
            .ok_or_else(|| ScriptError::new("Cast member is not a field".to_string()))
    }
}
