use serde::{Deserialize, Serialize};

/// One breakpoint, keyed by `(script_id, offset)`. `hit_count` is runtime
/// bookkeeping and never serializes.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub script_id: u16,
    pub offset: usize,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub log_message: Option<String>,
    #[serde(default)]
    pub hit_count_threshold: u32,
    #[serde(skip)]
    pub hit_count: u32,
}

fn default_enabled() -> bool {
    true
}

impl Breakpoint {
    pub fn at(script_id: u16, offset: usize) -> Breakpoint {
        Breakpoint {
            script_id,
            offset,
            enabled: true,
            condition: None,
            log_message: None,
            hit_count_threshold: 0,
            hit_count: 0,
        }
    }

    pub fn is_log_point(&self) -> bool {
        self.log_message.is_some()
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedBreakpoints {
    version: u32,
    breakpoints: Vec<Breakpoint>,
}

const PERSIST_VERSION: u32 = 2;

#[derive(Default)]
pub struct BreakpointStore {
    breakpoints: Vec<Breakpoint>,
}

impl BreakpointStore {
    pub fn new() -> BreakpointStore {
        BreakpointStore {
            breakpoints: vec![],
        }
    }

    pub fn add(&mut self, breakpoint: Breakpoint) {
        self.remove(breakpoint.script_id, breakpoint.offset);
        self.breakpoints.push(breakpoint);
    }

    pub fn remove(&mut self, script_id: u16, offset: usize) {
        self.breakpoints
            .retain(|bp| bp.script_id != script_id || bp.offset != offset);
    }

    pub fn toggle(&mut self, script_id: u16, offset: usize) {
        if self.find(script_id, offset).is_some() {
            self.remove(script_id, offset);
        } else {
            self.add(Breakpoint::at(script_id, offset));
        }
    }

    pub fn find(&self, script_id: u16, offset: usize) -> Option<&Breakpoint> {
        self.breakpoints
            .iter()
            .find(|bp| bp.script_id == script_id && bp.offset == offset)
    }

    pub fn find_mut(&mut self, script_id: u16, offset: usize) -> Option<&mut Breakpoint> {
        self.breakpoints
            .iter_mut()
            .find(|bp| bp.script_id == script_id && bp.offset == offset)
    }

    pub fn all(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn clear(&mut self) {
        self.breakpoints.clear();
    }

    pub fn reset_hit_counts(&mut self) {
        for bp in &mut self.breakpoints {
            bp.hit_count = 0;
        }
    }

    pub fn to_json(&self) -> String {
        let persisted = PersistedBreakpoints {
            version: PERSIST_VERSION,
            breakpoints: self.breakpoints.clone(),
        };
        serde_json::to_string(&persisted).unwrap_or_else(|_| "{}".to_string())
    }

    /// Reads the JSON form, falling back to the legacy
    /// `scriptId:off,off;scriptId:off` format.
    pub fn load(text: &str) -> BreakpointStore {
        if let Ok(persisted) = serde_json::from_str::<PersistedBreakpoints>(text) {
            return BreakpointStore {
                breakpoints: persisted.breakpoints,
            };
        }
        Self::parse_legacy(text)
    }

    fn parse_legacy(text: &str) -> BreakpointStore {
        let mut store = BreakpointStore::new();
        for group in text.split(';') {
            let group = group.trim();
            if group.is_empty() {
                continue;
            }
            let Some((script_part, offsets_part)) = group.split_once(':') else {
                continue;
            };
            let Ok(script_id) = script_part.trim().parse::<u16>() else {
                continue;
            };
            for offset in offsets_part.split(',') {
                if let Ok(offset) = offset.trim().parse::<usize>() {
                    store.add(Breakpoint::at(script_id, offset));
                }
            }
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_keeps_conditions_and_drops_hits() {
        let mut store = BreakpointStore::new();
        let mut bp = Breakpoint::at(3, 12);
        bp.condition = Some("i = 7".to_string());
        bp.hit_count_threshold = 4;
        bp.hit_count = 99;
        store.add(bp);

        let json = store.to_json();
        assert!(json.contains("\"version\":2"));
        assert!(json.contains("\"scriptId\":3"));
        assert!(json.contains("\"hitCountThreshold\":4"));

        let restored = BreakpointStore::load(&json);
        let bp = restored.find(3, 12).unwrap();
        assert_eq!(bp.condition.as_deref(), Some("i = 7"));
        assert_eq!(bp.hit_count_threshold, 4);
        assert_eq!(bp.hit_count, 0);
    }

    #[test]
    fn legacy_format_parses() {
        let store = BreakpointStore::load("1:4,8;2:0");
        assert!(store.find(1, 4).is_some());
        assert!(store.find(1, 8).is_some());
        assert!(store.find(2, 0).is_some());
        assert_eq!(store.all().len(), 3);
    }

    #[test]
    fn add_replaces_same_location() {
        let mut store = BreakpointStore::new();
        store.add(Breakpoint::at(1, 4));
        let mut replacement = Breakpoint::at(1, 4);
        replacement.enabled = false;
        store.add(replacement);
        assert_eq!(store.all().len(), 1);
        assert!(!store.find(1, 4).unwrap().enabled);
    }
}
