use chrono::Local;
use itertools::Itertools;
use url::Url;

pub const PATH_SEPARATOR: &str = "/";

pub fn get_basename_no_extension(path: &str) -> String {
    let file_name = path.split('/').next_back().unwrap_or_default();
    let dot_segments = file_name.split('.').collect_vec();
    if dot_segments.len() <= 1 {
        return file_name.to_string();
    }
    dot_segments[0..dot_segments.len() - 1].join(".")
}

pub fn get_base_url(url: &Url) -> Url {
    let mut result = url.clone();
    result.set_fragment(None);
    result.join("./").unwrap_or(result)
}

pub fn get_ticks() -> u32 {
    // 60 ticks per second
    let millis = Local::now().timestamp_millis();
    (millis as f64 / (1000.0 / 60.0)) as u32
}

pub fn get_elapsed_ticks(tick_start: u32) -> i32 {
    get_ticks() as i32 - tick_start as i32
}

/// Upper half of the MacRoman code page (0x80..=0xFF).
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{a0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{f8ff}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

pub fn decode_mac_roman(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                MAC_ROMAN_HIGH[(b - 0x80) as usize]
            }
        })
        .collect()
}

pub trait ToHexString {
    fn to_hex_string(&self) -> String;
}

impl ToHexString for Vec<u8> {
    fn to_hex_string(&self) -> String {
        self.iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<String>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_directories_and_extension() {
        assert_eq!(get_basename_no_extension("media/intro.dcr"), "intro");
        assert_eq!(get_basename_no_extension("archive.tar.cct"), "archive.tar");
        assert_eq!(get_basename_no_extension("plain"), "plain");
    }

    #[test]
    fn mac_roman_high_bytes_decode() {
        assert_eq!(decode_mac_roman(b"caf\x8e"), "café");
        assert_eq!(decode_mac_roman(b"abc"), "abc");
    }
}
