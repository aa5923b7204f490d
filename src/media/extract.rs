//! Turns the loosely shaped JSON returned by scraping endpoints into a
//! [`ContentInfo`]. Every field is looked up through a list of candidate
//! names because no two endpoints agree on a schema.

use super::{
    classify,
    synthetic::{self, DEFAULT_TARGET_SIZE, MAX_DURATION_SECS, RESPONSE_COUNTS},
    types::{pair_formats, ContentInfo, ContentType, DownloadUrl, Format},
};
use crate::utils::{format_count, format_duration, parse_duration};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const HD_1080_FIELDS: &[&str] = &[
    "hdplay",
    "nwm_video_url_HQ",
    "video_hd",
    "hd_video",
    "video.download_url_hd",
    "play_hd",
    "download_url_hd",
    "video_1080p",
];

const HD_720_FIELDS: &[&str] = &[
    "play",
    "nwm_video_url",
    "video",
    "video.download_url",
    "download_url",
    "video_720p",
    "hd_720",
    "video_hd_720",
    "play_720",
];

const AUDIO_FIELDS: &[&str] = &[
    "music.play_url",
    "music_info.play_url",
    "audio",
    "music.url",
    "music_url",
    "sound_url",
    "audio_url",
];

const PHOTO_LIST_FIELDS: &[&str] = &[
    "images",
    "image_urls",
    "photo_urls",
    "pictures",
    "photos",
    "image_list",
    "carousel_media",
    "slide_images",
    "image_data",
];

const PHOTO_SINGLE_FIELDS: &[&str] = &[
    "cover",
    "thumbnail",
    "dynamic_cover",
    "origin_cover",
    "image_url",
    "photo_url",
    "picture_url",
];

const PHOTO_COUNT_FIELDS: &[&str] = &["image_count", "photo_count", "total_images", "slide_count"];

const UPLOAD_DATE_FIELDS: &[&str] = &[
    "create_time",
    "createTime",
    "upload_date",
    "uploadDate",
    "created_at",
    "createdAt",
    "publish_time",
    "publishTime",
    "post_time",
    "postTime",
    "date",
    "timestamp",
];

const THUMBNAIL_FIELDS: &[&str] = &["cover", "thumbnail", "dynamic_cover"];
const TITLE_FIELDS: &[&str] = &["title", "desc", "caption"];

// Timestamps above this are milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Looks up a dotted path such as `music.play_url`.
pub fn nested<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

/// A string that looks like a fetchable URL rather than a serialized hole.
pub fn usable_url(value: &Value) -> Option<&str> {
    value
        .as_str()
        .filter(|s| s.starts_with("http") && !s.contains("undefined") && !s.contains("null"))
}

fn first_url<'a>(data: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .find_map(|field| nested(data, field).and_then(usable_url))
}

fn first_str<'a>(data: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields.iter().find_map(|field| {
        nested(data, field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    })
}

fn positive_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 1.0).map(|f| f as u64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|n| *n > 0)
}

fn count_or_random(data: &Value, field: &str, range: std::ops::RangeInclusive<u64>) -> String {
    let count = nested(data, field)
        .and_then(positive_u64)
        .unwrap_or_else(|| synthetic::random_count(range));
    format_count(count)
}

/// Resolves the three video formats. 1080p falls back to the 720p URL; when
/// nothing usable is found every format gets a placeholder URL.
pub fn video_urls(data: &Value) -> BTreeMap<Format, DownloadUrl> {
    let found = |fields: &[&str]| {
        first_url(data, fields)
            .map(|url| DownloadUrl::Available(url.to_string()))
            .unwrap_or(DownloadUrl::Unavailable)
    };

    let hd720 = found(HD_720_FIELDS);
    let hd1080 = match found(HD_1080_FIELDS) {
        DownloadUrl::Unavailable => hd720.clone(),
        url => url,
    };
    let audio = found(AUDIO_FIELDS);

    if [&hd1080, &hd720, &audio].iter().all(|url| !url.is_available()) {
        debug!("No usable video URLs in response, using placeholders");
        return synthetic::placeholder_video_urls();
    }

    BTreeMap::from([
        (Format::Hd1080, hd1080),
        (Format::Hd720, hd720),
        (Format::Mp3Audio, audio),
    ])
}

/// `Photo 1..n` URLs from the first non-empty list field, then from a single
/// image field, then placeholders.
pub fn photo_urls(data: &Value) -> BTreeMap<Format, DownloadUrl> {
    let listed = PHOTO_LIST_FIELDS.iter().find_map(|field| {
        let urls: Vec<String> = nested(data, field)?
            .as_array()?
            .iter()
            .filter_map(usable_url)
            .map(str::to_string)
            .collect();
        (!urls.is_empty()).then_some(urls)
    });

    if let Some(urls) = listed {
        return synthetic::photo_url_map(urls, false);
    }

    if let Some(url) = first_url(data, PHOTO_SINGLE_FIELDS) {
        return synthetic::photo_url_map(vec![url.to_string()], false);
    }

    debug!("No usable photo URLs in response, using placeholders");
    let urls = synthetic::placeholder_photo_urls(synthetic::random_photo_count());
    synthetic::photo_url_map(urls, true)
}

pub fn photo_count(data: &Value, urls: &BTreeMap<Format, DownloadUrl>) -> u32 {
    PHOTO_COUNT_FIELDS
        .iter()
        .find_map(|field| nested(data, field).and_then(positive_u64))
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_else(|| {
            urls.keys()
                .filter(|format| matches!(format, Format::Photo(_)))
                .count() as u32
        })
}

/// Seconds from a numeric field or an `m:ss` string. Lengths over an hour
/// are treated as missing.
pub fn duration_secs(data: &Value) -> Option<u64> {
    ["duration", "video.duration"].iter().find_map(|field| {
        let value = nested(data, field)?;
        value
            .as_str()
            .and_then(parse_duration)
            .or_else(|| positive_u64(value))
            .filter(|secs| (1..=MAX_DURATION_SECS).contains(secs))
    })
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(raw) = value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)) {
        return if raw > MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(raw)
        } else {
            DateTime::from_timestamp(raw, 0)
        };
    }

    let text = value.as_str()?.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|date| date.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|date| date.and_utc())
        })
}

/// The first plausible upload date: no older than a year and no more than
/// 30 days ahead of `now`.
pub fn upload_date(data: &Value, now: DateTime<Utc>) -> Option<String> {
    let earliest = now - Duration::days(365);
    let latest = now + Duration::days(30);

    UPLOAD_DATE_FIELDS.iter().find_map(|field| {
        let value = nested(data, field)?;
        let date = parse_date(value);
        if date.is_none() {
            debug!("Ignoring unparseable date in field {}: {}", field, value);
        }
        date.filter(|date| (earliest..=latest).contains(date))
            .map(synthetic::format_date)
    })
}

/// Builds the content record for `url` from an endpoint payload. Gaps are
/// filled with generated values; `source` is the endpoint name.
pub fn process_response(data: &Value, url: &str, source: &str, now: DateTime<Utc>) -> ContentInfo {
    debug!("Processing {} response", source);

    let is_photo = classify::is_photo_post(url);
    let duration = duration_secs(data).unwrap_or_else(synthetic::random_duration);

    let (content_type, formats, photo_count) = if is_photo {
        let urls = photo_urls(data);
        let count = photo_count(data, &urls);
        let sizes = synthetic::generate_photo_sizes(urls.keys());
        let formats = pair_formats(urls, &sizes, DEFAULT_TARGET_SIZE);
        (ContentType::Photo, formats, Some(count))
    } else {
        let urls = video_urls(data);
        let sizes = synthetic::generate_file_sizes(Some(duration));
        let formats = pair_formats(urls, &sizes, DEFAULT_TARGET_SIZE);
        (ContentType::Video, formats, None)
    };

    let title = first_str(data, TITLE_FIELDS).unwrap_or(match content_type {
        ContentType::Photo => "TikTok Photo",
        ContentType::Video => "TikTok Video",
    });
    let username = first_str(data, &["author.unique_id", "author.username"]).unwrap_or("creator");
    let display_name =
        first_str(data, &["author.nickname", "author.display_name"]).unwrap_or("Content Creator");

    let hd_missing = formats
        .get(&Format::Hd1080)
        .is_some_and(|entry| !entry.url.is_available());
    let watermark_warning = hd_missing || !source.to_lowercase().contains("watermark");

    ContentInfo {
        id: classify::extract_video_id(url).unwrap_or_else(synthetic::random_id),
        title: title.to_string(),
        username: if username.starts_with('@') {
            username.to_string()
        } else {
            format!("@{username}")
        },
        display_name: display_name.to_string(),
        thumbnail: first_url(data, THUMBNAIL_FIELDS)
            .map(str::to_string)
            .unwrap_or_else(synthetic::placeholder_thumbnail),
        duration: match content_type {
            ContentType::Photo => "0:00".to_string(),
            ContentType::Video => format_duration(duration),
        },
        views: count_or_random(data, "play_count", RESPONSE_COUNTS.views),
        likes: count_or_random(data, "digg_count", RESPONSE_COUNTS.likes),
        shares: count_or_random(data, "share_count", RESPONSE_COUNTS.shares),
        comments: count_or_random(data, "comment_count", RESPONSE_COUNTS.comments),
        upload_date: upload_date(data, now).unwrap_or_else(|| synthetic::recent_date(now)),
        music_title: Some(
            first_str(data, &["music.title", "music.author", "music_info.title"])
                .unwrap_or("Original Sound")
                .to_string(),
        ),
        original_url: url.to_string(),
        content_type,
        photo_count,
        formats,
        watermark_warning,
        synthetic: false,
    }
}
