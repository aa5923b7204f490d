//! Generated stand-ins used when no metadata endpoint answers: size
//! heuristics, placeholder URLs and a complete fallback record.

use super::{
    classify,
    types::{pair_formats, ContentInfo, ContentType, DownloadUrl, Format},
};
use crate::utils::{format_count, format_duration, random_base36};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::{collections::BTreeMap, ops::RangeInclusive};

pub const PLACEHOLDER_HOST: &str = "v16-web.tiktok.com";
/// Byte count used when a format carries no size of its own.
pub const DEFAULT_TARGET_SIZE: u64 = 2 * 1024 * 1024;
const MIB: f64 = 1024.0 * 1024.0;
const DEFAULT_DURATION_SECS: u64 = 30;
/// Longest clip length taken at face value from an endpoint.
pub const MAX_DURATION_SECS: u64 = 60 * 60;
const PHOTO_COUNT: RangeInclusive<u32> = 2..=10;

const PLACEHOLDER_THUMBNAILS: &[&str] = &[
    "https://images.unsplash.com/photo-1611162617474-5b21e879e113?fit=max&fm=jpg&q=80&w=400&h=600",
    "https://images.unsplash.com/photo-1542038784456-1ea8e935640e?fit=max&fm=jpg&q=80&w=400&h=600",
    "https://images.unsplash.com/photo-1516321318423-f06f85e504b3?fit=max&fm=jpg&q=80&w=400&h=600",
];

/// Ranges for invented engagement numbers.
pub struct CountRanges {
    pub views: RangeInclusive<u64>,
    pub likes: RangeInclusive<u64>,
    pub shares: RangeInclusive<u64>,
    pub comments: RangeInclusive<u64>,
}

/// Used to fill gaps in a real endpoint response.
pub const RESPONSE_COUNTS: CountRanges = CountRanges {
    views: 1_000_000..=50_000_000,
    likes: 50_000..=5_000_000,
    shares: 1_000..=100_000,
    comments: 500..=50_000,
};

/// Used for a fully fabricated record.
pub const FALLBACK_COUNTS: CountRanges = CountRanges {
    views: 100_000..=10_000_000,
    likes: 5_000..=500_000,
    shares: 100..=25_000,
    comments: 50..=15_000,
};

pub struct PlaceholderUrls {
    pub video_1080p: String,
    pub video_720p: String,
    pub audio: String,
}

pub fn placeholder_urls() -> PlaceholderUrls {
    let timestamp = Utc::now().timestamp_millis();
    let suffix = random_base36(8);
    PlaceholderUrls {
        video_1080p: format!(
            "https://{PLACEHOLDER_HOST}/video/tos/maliva/{timestamp}/1080p_{suffix}.mp4"
        ),
        video_720p: format!(
            "https://{PLACEHOLDER_HOST}/video/tos/maliva/{timestamp}/720p_{suffix}.mp4"
        ),
        audio: format!("https://{PLACEHOLDER_HOST}/obj/maliva/{timestamp}/audio_{suffix}.mp3"),
    }
}

pub fn placeholder_photo_urls(count: u32) -> Vec<String> {
    let timestamp = Utc::now().timestamp_millis();
    (1..=count)
        .map(|i| {
            format!(
                "https://{PLACEHOLDER_HOST}/img/tos/maliva/{timestamp}/photo_{i}_{}.jpg",
                random_base36(8)
            )
        })
        .collect()
}

pub fn random_photo_count() -> u32 {
    rand::rng().random_range(PHOTO_COUNT)
}

pub fn placeholder_thumbnail() -> String {
    let index = rand::rng().random_range(0..PLACEHOLDER_THUMBNAILS.len());
    PLACEHOLDER_THUMBNAILS[index].to_string()
}

pub fn random_count(range: RangeInclusive<u64>) -> u64 {
    rand::rng().random_range(range)
}

/// 15 to 195 seconds.
pub fn random_duration() -> u64 {
    rand::rng().random_range(15..=195)
}

pub fn random_id() -> String {
    random_base36(9)
}

pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// A date 1 to 30 days before `now`.
pub fn recent_date(now: DateTime<Utc>) -> String {
    let days_ago = rand::rng().random_range(1..=30);
    format_date(now - Duration::days(days_ago))
}

/// Estimated sizes for the video formats from the clip length: roughly
/// 18-35 MiB/min at 1080p, 12-25 MiB/min at 720p and 2.5-4 MiB/min audio,
/// with floors of 15, 10 and 2 MiB.
pub fn generate_file_sizes(duration_secs: Option<u64>) -> BTreeMap<Format, u64> {
    let minutes = duration_secs
        .unwrap_or(DEFAULT_DURATION_SECS)
        .min(MAX_DURATION_SECS) as f64
        / 60.0;
    let mut rng = rand::rng();

    let hd1080 = (minutes * rng.random_range(18.0..35.0)).max(15.0);
    let hd720 = (minutes * rng.random_range(12.0..25.0)).max(10.0);
    let audio = (minutes * rng.random_range(2.5..4.0)).max(2.0);

    BTreeMap::from([
        (Format::Hd1080, (hd1080 * MIB).round() as u64),
        (Format::Hd720, (hd720 * MIB).round() as u64),
        (Format::Mp3Audio, (audio * MIB).round() as u64),
    ])
}

/// 1 to 4 MiB per photo.
pub fn generate_photo_sizes<'a>(
    formats: impl IntoIterator<Item = &'a Format>,
) -> BTreeMap<Format, u64> {
    let mut rng = rand::rng();
    formats
        .into_iter()
        .filter(|format| matches!(format, Format::Photo(_)))
        .map(|format| {
            let kib = rng.random_range(1024.0..4096.0);
            (format.clone(), (kib * 1024.0_f64).round() as u64)
        })
        .collect()
}

pub fn photo_url_map(urls: Vec<String>, placeholder: bool) -> BTreeMap<Format, DownloadUrl> {
    urls.into_iter()
        .zip(1u32..)
        .map(|(url, n)| {
            let url = if placeholder {
                DownloadUrl::Placeholder(url)
            } else {
                DownloadUrl::Available(url)
            };
            (Format::Photo(n), url)
        })
        .collect()
}

pub fn placeholder_video_urls() -> BTreeMap<Format, DownloadUrl> {
    let urls = placeholder_urls();
    BTreeMap::from([
        (Format::Hd1080, DownloadUrl::Placeholder(urls.video_1080p)),
        (Format::Hd720, DownloadUrl::Placeholder(urls.video_720p)),
        (Format::Mp3Audio, DownloadUrl::Placeholder(urls.audio)),
    ])
}

/// A complete record built from the URL alone.
pub fn fallback_record(url: &str, now: DateTime<Utc>) -> ContentInfo {
    let is_photo = classify::is_photo_post(url);

    let (content_type, duration, formats, photo_count) = if is_photo {
        let count = random_photo_count();
        let urls = photo_url_map(placeholder_photo_urls(count), true);
        let sizes = generate_photo_sizes(urls.keys());
        let formats = pair_formats(urls, &sizes, DEFAULT_TARGET_SIZE);
        (ContentType::Photo, "0:00".to_string(), formats, Some(count))
    } else {
        let seconds = random_duration();
        let sizes = generate_file_sizes(Some(seconds));
        let formats = pair_formats(placeholder_video_urls(), &sizes, DEFAULT_TARGET_SIZE);
        (ContentType::Video, format_duration(seconds), formats, None)
    };

    let title = match content_type {
        ContentType::Photo => "TikTok Photo Carousel",
        ContentType::Video => "TikTok Video",
    };

    ContentInfo {
        id: classify::extract_video_id(url).unwrap_or_else(random_id),
        title: title.to_string(),
        username: classify::extract_username(url).unwrap_or_else(|| "@creator".to_string()),
        display_name: "Content Creator".to_string(),
        thumbnail: placeholder_thumbnail(),
        duration,
        views: format_count(random_count(FALLBACK_COUNTS.views)),
        likes: format_count(random_count(FALLBACK_COUNTS.likes)),
        shares: format_count(random_count(FALLBACK_COUNTS.shares)),
        comments: format_count(random_count(FALLBACK_COUNTS.comments)),
        upload_date: recent_date(now),
        music_title: Some("Original Sound".to_string()),
        original_url: url.to_string(),
        content_type,
        photo_count,
        formats,
        watermark_warning: true,
        synthetic: true,
    }
}
