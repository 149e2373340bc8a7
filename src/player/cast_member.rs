use crate::lingo::datum::{Datum, MemberRef, member_ref};
use crate::movie::chunks::cast_member::{BitmapInfo, ScriptKind};
use crate::movie::chunks::sound::SoundChunk;

use super::ScriptError;
use super::bitmap::Bitmap;
use super::font::{TextRenderSpec, TextRenderer};

#[derive(Clone)]
pub struct BitmapMember {
    pub info: BitmapInfo,
    pub image: Option<Bitmap>,
    pub reg_point: (i16, i16),
}

#[derive(Clone)]
pub struct ScriptMember {
    pub script_kind: ScriptKind,
    pub script_id: u32,
}

/// Field and text members share this state: the content string plus the
/// dirty-flag-guarded rendering properties.
#[derive(Clone)]
pub struct TextData {
    pub text: String,
    pub spec: TextRenderSpec,
    pub rect: (i32, i32, i32, i32),
    pub editable: bool,
    rendered: Option<Bitmap>,
    dirty: bool,
}

impl TextData {
    pub fn new(text: String) -> TextData {
        TextData {
            text: normalize_line_endings(&text),
            spec: TextRenderSpec::default(),
            rect: (0, 0, 0, 0),
            editable: false,
            rendered: None,
            dirty: true,
        }
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = normalize_line_endings(text);
        self.dirty = true;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Renders on first access and after any property write.
    pub fn image(&mut self, renderer: &mut dyn TextRenderer) -> &Bitmap {
        if self.dirty || self.rendered.is_none() {
            let mut spec = self.spec.clone();
            spec.width = self.rect.2 - self.rect.0;
            self.rendered = Some(renderer.render(&self.text, &spec));
            self.dirty = false;
        }
        self.rendered.as_ref().unwrap()
    }

    /// Rendered height when available, the member rect's height otherwise.
    pub fn height(&self) -> i32 {
        match &self.rendered {
            Some(bitmap) if !self.dirty => bitmap.height,
            _ => self.rect.3 - self.rect.1,
        }
    }

    /// Measures line by line to locate the given 1-based character index.
    pub fn char_pos_to_loc(&self, char_pos: i32, renderer: &mut dyn TextRenderer) -> (i32, i32) {
        let line_height = renderer.line_height(&self.spec);
        if char_pos <= 0 {
            return (0, line_height);
        }
        let mut remaining = (char_pos - 1) as usize;
        let mut y = line_height;
        for line in self.text.split('\r') {
            let line_chars = line.chars().count();
            if remaining <= line_chars {
                let prefix: String = line.chars().take(remaining).collect();
                let x = renderer.measure_line(&prefix, &self.spec);
                return (x, y);
            }
            remaining -= line_chars + 1;
            y += line_height;
        }
        (0, y)
    }
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\r").replace('\n', "\r")
}

#[derive(Clone)]
pub struct SoundMember {
    pub chunk: Option<SoundChunk>,
    pub looped: bool,
}

#[derive(Clone, Default)]
pub struct ShapeMember {
    pub shape_kind: u16,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone)]
pub struct PaletteMember {
    pub colors: Vec<(u8, u8, u8)>,
}

pub enum CastMemberType {
    Bitmap(BitmapMember),
    Field(TextData),
    Text(TextData),
    Button(TextData),
    Script(ScriptMember),
    Shape(ShapeMember),
    Sound(SoundMember),
    Palette(PaletteMember),
    Empty,
}

impl CastMemberType {
    pub fn type_symbol(&self) -> &'static str {
        match self {
            CastMemberType::Bitmap(_) => "bitmap",
            CastMemberType::Field(_) => "field",
            CastMemberType::Text(_) => "text",
            CastMemberType::Button(_) => "button",
            CastMemberType::Script(_) => "script",
            CastMemberType::Shape(_) => "shape",
            CastMemberType::Sound(_) => "sound",
            CastMemberType::Palette(_) => "palette",
            CastMemberType::Empty => "empty",
        }
    }

    pub fn as_text_data(&self) -> Option<&TextData> {
        match self {
            CastMemberType::Field(data) | CastMemberType::Text(data) | CastMemberType::Button(data) => {
                Some(data)
            }
            _ => None,
        }
    }

    pub fn as_text_data_mut(&mut self) -> Option<&mut TextData> {
        match self {
            CastMemberType::Field(data) | CastMemberType::Text(data) | CastMemberType::Button(data) => {
                Some(data)
            }
            _ => None,
        }
    }

    pub fn as_bitmap(&self) -> Option<&BitmapMember> {
        match self {
            CastMemberType::Bitmap(member) => Some(member),
            _ => None,
        }
    }

    pub fn as_script(&self) -> Option<&ScriptMember> {
        match self {
            CastMemberType::Script(member) => Some(member),
            _ => None,
        }
    }
}

/// A loaded cast member. Media payloads decode lazily at the cast layer;
/// dynamic members (created from script) start out loaded.
pub struct CastMember {
    pub cast_lib: u32,
    pub number: u32,
    pub name: String,
    pub member_type: CastMemberType,
}

impl CastMember {
    pub fn member_ref(&self) -> MemberRef {
        member_ref(self.cast_lib as i32, self.number as i32)
    }

    pub fn get_prop(&self, prop: &str) -> Result<Datum, ScriptError> {
        match prop {
            "name" => Ok(Datum::Str(self.name.clone())),
            "number" => Ok(Datum::Int(self.member_ref().slot_number())),
            "memberNum" => Ok(Datum::Int(self.number as i32)),
            "castLibNum" => Ok(Datum::Int(self.cast_lib as i32)),
            "type" => Ok(Datum::Symbol(self.member_type.type_symbol().to_string())),
            "rect" => match &self.member_type {
                CastMemberType::Bitmap(bitmap) => Ok(Datum::Rect(
                    0,
                    0,
                    bitmap.info.width(),
                    bitmap.info.height(),
                )),
                CastMemberType::Field(data)
                | CastMemberType::Text(data)
                | CastMemberType::Button(data) => {
                    Ok(Datum::Rect(data.rect.0, data.rect.1, data.rect.2, data.rect.3))
                }
                CastMemberType::Shape(shape) => Ok(Datum::Rect(0, 0, shape.width, shape.height)),
                _ => Ok(Datum::Rect(0, 0, 0, 0)),
            },
            "width" => match &self.member_type {
                CastMemberType::Bitmap(bitmap) => Ok(Datum::Int(bitmap.info.width())),
                CastMemberType::Shape(shape) => Ok(Datum::Int(shape.width)),
                CastMemberType::Field(data)
                | CastMemberType::Text(data)
                | CastMemberType::Button(data) => Ok(Datum::Int(data.rect.2 - data.rect.0)),
                _ => Ok(Datum::Int(0)),
            },
            "height" => match &self.member_type {
                CastMemberType::Bitmap(bitmap) => Ok(Datum::Int(bitmap.info.height())),
                CastMemberType::Shape(shape) => Ok(Datum::Int(shape.height)),
                CastMemberType::Field(data)
                | CastMemberType::Text(data)
                | CastMemberType::Button(data) => Ok(Datum::Int(data.height())),
                _ => Ok(Datum::Int(0)),
            },
            "regPoint" => match &self.member_type {
                CastMemberType::Bitmap(bitmap) => Ok(Datum::Point(
                    bitmap.reg_point.0 as i32,
                    bitmap.reg_point.1 as i32,
                )),
                _ => Ok(Datum::Point(0, 0)),
            },
            "text" => match self.member_type.as_text_data() {
                Some(data) => Ok(Datum::Str(data.text.clone())),
                None => Err(ScriptError::new(format!(
                    "Member {} has no text",
                    self.name
                ))),
            },
            "editable" => match self.member_type.as_text_data() {
                Some(data) => Ok(crate::lingo::datum::datum_bool(data.editable)),
                None => Ok(crate::lingo::datum::DATUM_FALSE),
            },
            "font" => text_spec_prop(self, |spec| Datum::Str(spec.font_name.clone())),
            "fontSize" => text_spec_prop(self, |spec| Datum::Int(spec.font_size as i32)),
            "alignment" => text_spec_prop(self, |spec| Datum::Symbol(spec.alignment.clone())),
            "wordWrap" => {
                text_spec_prop(self, |spec| crate::lingo::datum::datum_bool(spec.word_wrap))
            }
            "antialias" => {
                text_spec_prop(self, |spec| crate::lingo::datum::datum_bool(spec.anti_alias))
            }
            "fixedLineSpace" => {
                text_spec_prop(self, |spec| Datum::Int(spec.fixed_line_space as i32))
            }
            "loop" => match &self.member_type {
                CastMemberType::Sound(sound) => {
                    Ok(crate::lingo::datum::datum_bool(sound.looped))
                }
                _ => Ok(crate::lingo::datum::DATUM_FALSE),
            },
            _ => Err(ScriptError::new(format!(
                "Cannot get member property {}",
                prop
            ))),
        }
    }

    pub fn set_prop(&mut self, prop: &str, value: Datum) -> Result<(), ScriptError> {
        match prop {
            "name" => {
                self.name = value.string_value()?;
                Ok(())
            }
            "text" => match self.member_type.as_text_data_mut() {
                Some(data) => {
                    data.set_text(&value.string_value()?);
                    Ok(())
                }
                None => Err(ScriptError::new(format!(
                    "Member {} has no text",
                    self.name
                ))),
            },
            "editable" => {
                if let Some(data) = self.member_type.as_text_data_mut() {
                    data.editable = value.bool_value()?;
                }
                Ok(())
            }
            "rect" => {
                if let Some(data) = self.member_type.as_text_data_mut() {
                    data.rect = value.to_rect()?;
                    data.mark_dirty();
                }
                Ok(())
            }
            "font" => set_text_spec_prop(self, |spec| {
                spec.font_name = value.string_value()?;
                Ok(())
            }),
            "fontSize" => set_text_spec_prop(self, |spec| {
                spec.font_size = value.int_value()? as u16;
                Ok(())
            }),
            "fontStyle" => set_text_spec_prop(self, |spec| {
                spec.styles = match &value {
                    Datum::List(items) => items
                        .borrow()
                        .iter()
                        .map(|item| item.string_value())
                        .collect::<Result<Vec<_>, _>>()?,
                    other => vec![other.string_value()?],
                };
                Ok(())
            }),
            "alignment" => set_text_spec_prop(self, |spec| {
                spec.alignment = match &value {
                    Datum::Symbol(s) => s.clone(),
                    other => other.string_value()?,
                };
                Ok(())
            }),
            "color" => set_text_spec_prop(self, |spec| {
                if let Datum::Color(crate::lingo::datum::ColorRef::Rgb(r, g, b)) = value {
                    spec.fore_color = (r, g, b);
                }
                Ok(())
            }),
            "bgColor" => set_text_spec_prop(self, |spec| {
                if let Datum::Color(crate::lingo::datum::ColorRef::Rgb(r, g, b)) = value {
                    spec.back_color = (r, g, b);
                }
                Ok(())
            }),
            "wordWrap" => set_text_spec_prop(self, |spec| {
                spec.word_wrap = value.bool_value()?;
                Ok(())
            }),
            "antialias" => set_text_spec_prop(self, |spec| {
                spec.anti_alias = value.bool_value()?;
                Ok(())
            }),
            "fixedLineSpace" => set_text_spec_prop(self, |spec| {
                spec.fixed_line_space = value.int_value()? as u16;
                Ok(())
            }),
            "regPoint" => {
                if let CastMemberType::Bitmap(bitmap) = &mut self.member_type {
                    let (x, y) = value.to_point()?;
                    bitmap.reg_point = (x as i16, y as i16);
                }
                Ok(())
            }
            "loop" => {
                if let CastMemberType::Sound(sound) = &mut self.member_type {
                    sound.looped = value.bool_value()?;
                }
                Ok(())
            }
            _ => Err(ScriptError::new(format!(
                "Cannot set member property {}",
                prop
            ))),
        }
    }
}

fn text_spec_prop(
    member: &CastMember,
    f: impl FnOnce(&TextRenderSpec) -> Datum,
) -> Result<Datum, ScriptError> {
    match member.member_type.as_text_data() {
        Some(data) => Ok(f(&data.spec)),
        None => Err(ScriptError::new(format!(
            "Member {} has no text properties",
            member.name
        ))),
    }
}

fn set_text_spec_prop(
    member: &mut CastMember,
    f: impl FnOnce(&mut TextRenderSpec) -> Result<(), ScriptError>,
) -> Result<(), ScriptError> {
    match member.member_type.as_text_data_mut() {
        Some(data) => {
            f(&mut data.spec)?;
            data.mark_dirty();
            Ok(())
        }
        None => Err(ScriptError::new(format!(
            "Member {} has no text properties",
            member.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::font::NullTextRenderer;

    #[test]
    fn text_content_normalizes_to_carriage_returns() {
        let data = TextData::new("a\r\nb\nc".to_string());
        assert_eq!(data.text, "a\rb\rc");
    }

    #[test]
    fn image_renders_once_until_dirty() {
        let mut data = TextData::new("hello".to_string());
        let mut renderer = NullTextRenderer;
        let first_height = data.image(&mut renderer).height;
        assert_eq!(data.height(), first_height);
        data.set_text("one\rtwo");
        let second_height = data.image(&mut renderer).height;
        assert_eq!(second_height, first_height * 2);
    }

    #[test]
    fn char_pos_to_loc_walks_lines() {
        let mut data = TextData::new("ab\rcd".to_string());
        let mut renderer = NullTextRenderer;
        let line_height = renderer.line_height(&data.spec);
        // position 5 is "d": second line, one glyph in
        let (x, y) = data.char_pos_to_loc(5, &mut renderer);
        assert_eq!(y, line_height * 2);
        assert_eq!(x, renderer.measure_line("c", &data.spec));
    }
}
