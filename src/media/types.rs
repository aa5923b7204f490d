use crate::utils::format_size;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Photo,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Video => write!(f, "video"),
            ContentType::Photo => write!(f, "photo"),
        }
    }
}

/// Broad media category of a format. Decides container, extension and MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Video,
    Photo,
    Audio,
}

impl FormatKind {
    pub fn extension(self) -> &'static str {
        match self {
            FormatKind::Video => "mp4",
            FormatKind::Photo => "jpg",
            FormatKind::Audio => "mp3",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FormatKind::Video => "video/mp4",
            FormatKind::Photo => "image/jpeg",
            FormatKind::Audio => "audio/mpeg",
        }
    }
}

/// A downloadable rendition of a post, keyed by its display label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Format {
    Hd1080,
    Hd720,
    Mp3Audio,
    CoverImage,
    Photo(u32),
}

impl Format {
    pub fn kind(&self) -> FormatKind {
        match self {
            Format::Hd1080 | Format::Hd720 => FormatKind::Video,
            Format::Mp3Audio => FormatKind::Audio,
            Format::CoverImage | Format::Photo(_) => FormatKind::Photo,
        }
    }

    /// Short quality tag used in generated filenames.
    pub fn quality(&self) -> String {
        match self {
            Format::Hd1080 => "1080p".to_string(),
            Format::Hd720 => "720p".to_string(),
            Format::Mp3Audio => "audio".to_string(),
            Format::CoverImage => "cover".to_string(),
            Format::Photo(n) => format!("photo_{n}"),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Hd1080 => write!(f, "1080p HD"),
            Format::Hd720 => write!(f, "720p HD"),
            Format::Mp3Audio => write!(f, "MP3 Audio"),
            Format::CoverImage => write!(f, "Cover Image"),
            Format::Photo(n) => write!(f, "Photo {n}"),
        }
    }
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "1080p hd" | "1080p" => return Ok(Format::Hd1080),
            "720p hd" | "720p" => return Ok(Format::Hd720),
            "mp3 audio" | "mp3" | "audio" => return Ok(Format::Mp3Audio),
            "cover image" | "cover" => return Ok(Format::CoverImage),
            _ => {}
        }

        let index = normalized
            .strip_prefix("photo")
            .map(|rest| rest.trim_start_matches([' ', '_', '-']))
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|n| *n > 0);

        index
            .map(Format::Photo)
            .ok_or_else(|| anyhow!("Unknown format: {}", s))
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.to_string()
    }
}

impl TryFrom<String> for Format {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Where a format can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "url", rename_all = "lowercase")]
pub enum DownloadUrl {
    Available(String),
    /// Generated stand-in with no media behind it.
    Placeholder(String),
    Unavailable,
}

impl DownloadUrl {
    pub fn is_available(&self) -> bool {
        matches!(self, DownloadUrl::Available(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            DownloadUrl::Available(url) | DownloadUrl::Placeholder(url) => url,
            DownloadUrl::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatEntry {
    pub url: DownloadUrl,
    /// Human-readable size shown next to the format.
    pub size: String,
    /// Exact byte count the size label was derived from.
    pub bytes: u64,
}

impl FormatEntry {
    pub fn new(url: DownloadUrl, bytes: u64) -> Self {
        Self {
            url,
            size: format_size(bytes),
            bytes,
        }
    }
}

/// Pairs every download URL with its byte count so no format can exist
/// without a size. Formats missing from `sizes` get `default_bytes`.
pub fn pair_formats(
    urls: BTreeMap<Format, DownloadUrl>,
    sizes: &BTreeMap<Format, u64>,
    default_bytes: u64,
) -> BTreeMap<Format, FormatEntry> {
    urls.into_iter()
        .map(|(format, url)| {
            let bytes = sizes.get(&format).copied().unwrap_or(default_bytes);
            (format, FormatEntry::new(url, bytes))
        })
        .collect()
}

/// Metadata describing one TikTok post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentInfo {
    pub id: String,
    pub title: String,
    pub username: String,
    pub display_name: String,
    pub thumbnail: String,
    pub duration: String,
    pub views: String,
    pub likes: String,
    pub shares: String,
    pub comments: String,
    pub upload_date: String,
    pub music_title: Option<String>,
    pub original_url: String,
    pub content_type: ContentType,
    pub photo_count: Option<u32>,
    pub formats: BTreeMap<Format, FormatEntry>,
    pub watermark_warning: bool,
    /// Set when no metadata endpoint answered and every field was generated.
    pub synthetic: bool,
}

impl ContentInfo {
    pub fn format(&self, format: &Format) -> Option<&FormatEntry> {
        self.formats.get(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_labels() {
        assert_eq!(Format::Hd1080.to_string(), "1080p HD");
        assert_eq!(Format::Mp3Audio.to_string(), "MP3 Audio");
        assert_eq!(Format::Photo(3).to_string(), "Photo 3");
        assert_eq!("720p HD".parse::<Format>().unwrap(), Format::Hd720);
        assert_eq!("mp3".parse::<Format>().unwrap(), Format::Mp3Audio);
        assert_eq!("Photo 12".parse::<Format>().unwrap(), Format::Photo(12));
        assert_eq!("photo-2".parse::<Format>().unwrap(), Format::Photo(2));
        assert!("Photo 0".parse::<Format>().is_err());
        assert!("4k".parse::<Format>().is_err());
    }

    #[test]
    fn test_format_kind() {
        assert_eq!(Format::Hd1080.kind(), FormatKind::Video);
        assert_eq!(Format::Mp3Audio.kind(), FormatKind::Audio);
        assert_eq!(Format::Photo(1).kind(), FormatKind::Photo);
        assert_eq!(Format::CoverImage.kind().extension(), "jpg");
        assert_eq!(FormatKind::Audio.mime_type(), "audio/mpeg");
    }

    #[test]
    fn test_photo_formats_sort_numerically() {
        let mut formats = vec![Format::Photo(10), Format::Photo(2), Format::Photo(1)];
        formats.sort();
        assert_eq!(
            formats,
            vec![Format::Photo(1), Format::Photo(2), Format::Photo(10)]
        );
    }

    #[test]
    fn test_pair_formats_covers_every_url() {
        let mut urls = BTreeMap::new();
        urls.insert(
            Format::Hd720,
            DownloadUrl::Available("https://a.example/v.mp4".to_string()),
        );
        urls.insert(Format::Mp3Audio, DownloadUrl::Unavailable);

        let mut sizes = BTreeMap::new();
        sizes.insert(Format::Hd720, 11 * 1024 * 1024);

        let formats = pair_formats(urls, &sizes, 2048);
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[&Format::Hd720].size, "11.0 MB");
        assert_eq!(formats[&Format::Mp3Audio].bytes, 2048);
    }

    #[test]
    fn test_format_map_serializes_with_labels() {
        let mut formats = BTreeMap::new();
        formats.insert(Format::Photo(1), FormatEntry::new(DownloadUrl::Unavailable, 1024));
        let json = serde_json::to_value(&formats).unwrap();
        assert_eq!(json["Photo 1"]["url"]["status"], "unavailable");
        assert_eq!(json["Photo 1"]["size"], "1 KB");
    }
}
