use itertools::Itertools;
use log::info;
use url::Url;

use crate::movie::MovieFile;
use crate::utils::get_basename_no_extension;

/// Transport for external casts. Implementations own their timeouts and
/// should keep them small; the player tries each candidate URL once, in
/// order, with no retries.
pub trait ByteLoader {
    fn try_fetch(&mut self, url: &str) -> Option<Vec<u8>>;
}

/// Splits fetched bytes into sections. The container format parser stays
/// outside the core; this is its seam.
pub trait ContainerParser {
    fn parse(&mut self, bytes: &[u8], file_name: &str, base_path: &str) -> Option<MovieFile>;
}

pub struct NullByteLoader;

impl ByteLoader for NullByteLoader {
    fn try_fetch(&mut self, _url: &str) -> Option<Vec<u8>> {
        None
    }
}

/// Serves `file:` URLs and bare paths from the local filesystem.
pub struct LocalFileLoader;

impl ByteLoader for LocalFileLoader {
    fn try_fetch(&mut self, url: &str) -> Option<Vec<u8>> {
        let path = match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "file" => parsed.to_file_path().ok()?,
            Ok(_) => return None,
            Err(_) => std::path::PathBuf::from(url),
        };
        std::fs::read(path).ok()
    }
}

/// Cast files ship under several extensions; network casts are almost
/// always the compressed `.cct` flavor.
pub fn normalize_cast_path(base_path: &str, file_path: &str) -> Option<String> {
    if file_path.is_empty() {
        return None;
    }
    let slash_normalized = file_path.replace('\\', "/");
    let file_base_name = slash_normalized.split('/').next_back()?;
    let name_split = file_base_name.split('.').collect_vec();
    let without_ext = if name_split.len() > 1 {
        name_split[0..name_split.len() - 1].join(".")
    } else {
        file_base_name.to_string()
    };
    let cast_file_name = format!("{}.cct", without_ext);

    if base_path.is_empty() {
        return Some(cast_file_name);
    }
    match Url::parse(base_path) {
        Ok(base) => Some(
            base.join(&cast_file_name)
                .map(|joined| joined.to_string())
                .unwrap_or(cast_file_name),
        ),
        Err(_) => Some(format!(
            "{}/{}",
            base_path.trim_end_matches('/'),
            cast_file_name
        )),
    }
}

/// Transport order is fixed: secure first, then plain, then disk.
pub fn candidate_urls(file_name: &str) -> Vec<String> {
    if let Ok(url) = Url::parse(file_name) {
        match url.scheme() {
            "https" => {
                let mut http = url.clone();
                let _ = http.set_scheme("http");
                return vec![url.to_string(), http.to_string()];
            }
            "http" => {
                let mut https = url.clone();
                let _ = https.set_scheme("https");
                return vec![https.to_string(), url.to_string()];
            }
            "file" => return vec![url.to_string()],
            _ => {}
        }
    }
    let bare = file_name.trim_start_matches('/');
    vec![
        format!("https://{}", bare),
        format!("http://{}", bare),
        file_name.to_string(),
    ]
}

/// One fetch attempt per candidate; the first hit wins.
pub fn fetch_bytes(loader: &mut dyn ByteLoader, file_name: &str) -> Option<(String, Vec<u8>)> {
    for url in candidate_urls(file_name) {
        if let Some(bytes) = loader.try_fetch(&url) {
            info!("fetched {} ({} bytes)", url, bytes.len());
            return Some((url, bytes));
        }
    }
    None
}

pub fn display_name_for(url: &str) -> String {
    get_basename_no_extension(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_prefer_https_then_http_then_file() {
        let urls = candidate_urls("example.com/casts/shared.cct");
        assert_eq!(urls[0], "https://example.com/casts/shared.cct");
        assert_eq!(urls[1], "http://example.com/casts/shared.cct");
        assert_eq!(urls[2], "example.com/casts/shared.cct");
    }

    #[test]
    fn explicit_scheme_is_kept_first() {
        let urls = candidate_urls("http://example.com/a.cct");
        assert_eq!(urls[0], "https://example.com/a.cct");
        assert_eq!(urls[1], "http://example.com/a.cct");
    }

    #[test]
    fn cast_paths_rewrite_to_cct() {
        assert_eq!(
            normalize_cast_path("https://example.com/movie/", "media\\shared.cst"),
            Some("https://example.com/movie/shared.cct".to_string())
        );
        assert_eq!(normalize_cast_path("", ""), None);
    }
}
