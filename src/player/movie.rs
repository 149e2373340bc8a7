use std::rc::Rc;

use crate::lingo::datum::{Datum, datum_bool};
use crate::movie::MovieFile;

use super::ScriptError;
use super::cast_manager::CastManager;
use super::score::Score;

/// Movie-level state: the cast manager, the score, and the knobs scripts
/// reach through `the`-properties.
pub struct Movie {
    pub rect: (i32, i32, i32, i32),
    pub cast_manager: CastManager,
    pub score: Score,
    pub current_frame: u32,
    pub puppet_tempo: u32,
    pub exit_lock: bool,
    pub update_lock: bool,
    pub dir_version: u16,
    pub item_delimiter: String,
    pub base_path: String,
    pub file_name: String,
    pub stage_color: (u8, u8, u8),
    pub frame_rate: u16,
    pub file: Option<Rc<MovieFile>>,
}

impl Movie {
    pub fn empty() -> Movie {
        Movie {
            rect: (0, 0, 0, 0),
            cast_manager: CastManager::empty(),
            score: Score::empty(),
            current_frame: 1,
            puppet_tempo: 0,
            exit_lock: false,
            update_lock: false,
            dir_version: 0,
            item_delimiter: ",".to_string(),
            base_path: String::new(),
            file_name: String::new(),
            stage_color: (0, 0, 0),
            frame_rate: 30,
            file: None,
        }
    }

    pub fn load_from_file(&mut self, file: MovieFile) {
        let file = Rc::new(file);
        if let Some(config) = &file.config {
            self.rect = (
                config.movie_left as i32,
                config.movie_top as i32,
                config.movie_right as i32,
                config.movie_bottom as i32,
            );
            self.stage_color = config.stage_color;
            self.frame_rate = config.frame_rate;
        }
        self.dir_version = file.dir_version;
        self.base_path = file.base_path.clone();
        self.file_name = file.file_name.clone();
        self.cast_manager.load_from_file(&file);
        self.score.load_from_file(&file);
        self.current_frame = 1;
        self.file = Some(file);
    }

    pub fn frame_count(&self) -> u32 {
        self.score.frame_count.max(1)
    }

    pub fn get_prop(&self, prop: &str) -> Result<Datum, ScriptError> {
        match prop {
            "name" => Ok(Datum::Str(self.file_name.clone())),
            "frame" => Ok(Datum::Int(self.current_frame as i32)),
            "lastFrame" => Ok(Datum::Int(self.frame_count() as i32)),
            "frameRate" => Ok(Datum::Int(self.frame_rate as i32)),
            "itemDelimiter" => Ok(Datum::Str(self.item_delimiter.clone())),
            "exitLock" => Ok(datum_bool(self.exit_lock)),
            "updateLock" => Ok(datum_bool(self.update_lock)),
            "moviePath" | "path" | "pathName" => Ok(Datum::Str(self.base_path.clone())),
            "movie" | "movieName" => Ok(Datum::Str(self.file_name.clone())),
            "stageRight" => Ok(Datum::Int(self.rect.2)),
            "stageBottom" => Ok(Datum::Int(self.rect.3)),
            "stageLeft" => Ok(Datum::Int(self.rect.0)),
            "stageTop" => Ok(Datum::Int(self.rect.1)),
            "rect" => Ok(Datum::Rect(self.rect.0, self.rect.1, self.rect.2, self.rect.3)),
            "number of castLibs" => Ok(Datum::Int(self.cast_manager.casts.len() as i32)),
            _ => Err(ScriptError::new(format!("Unknown movie property {}", prop))),
        }
    }

    pub fn set_prop(&mut self, prop: &str, value: Datum) -> Result<(), ScriptError> {
        match prop {
            "itemDelimiter" => {
                self.item_delimiter = value.string_value()?;
                Ok(())
            }
            "exitLock" => {
                self.exit_lock = value.bool_value()?;
                Ok(())
            }
            "updateLock" => {
                self.update_lock = value.bool_value()?;
                Ok(())
            }
            "frameRate" | "puppetTempo" => {
                self.puppet_tempo = value.int_value()?.max(0) as u32;
                Ok(())
            }
            _ => Err(ScriptError::new(format!(
                "Cannot set movie property {}",
                prop
            ))),
        }
    }
}
