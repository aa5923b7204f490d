use crate::media::{ContentInfo, ContentType, DownloadOutcome, DownloadUrl, ProgressUpdate, Stage};
use std::fmt::Write;

const BAR_WIDTH: usize = 30;

pub const FAQ: &str = "\
Which formats are offered?
  Video posts: 1080p HD and 720p HD (MP4) plus MP3 audio.
  Photo posts: every image of the carousel as JPG (\"Photo 1\", \"Photo 2\", ...).

Where do files go?
  The configured download.output_dir, else your Downloads folder. Override with --output.

Why is a format marked unavailable?
  The metadata endpoint did not return a usable link for it. Private, deleted or
  region-locked posts usually have none.

What does \"synthetic\" mean?
  No metadata endpoint answered, so the record was generated from the link alone.
  Its numbers are invented and its links are placeholders with no media behind them.

What is a placeholder file?
  A file with a valid-looking header padded to the advertised size. It contains no
  real video, image or audio. tokgrab only writes one when asked to
  (--placeholder-fallback, download.fallback = \"placeholder\", or `tokgrab placeholder`)
  and always says so.

Do I need an API key?
  No. Public endpoints are tried without one. A RapidAPI key
  (`tokgrab api-key set <KEY>`) adds a watermark-free source that is tried first.

Is downloading allowed?
  Respect creators' rights and TikTok's terms. Do not redistribute content without permission.
";

pub fn validity(url: &str, valid: bool) -> String {
    if valid {
        format!("✅ {url} is a TikTok link")
    } else {
        format!("❌ {url} is not a TikTok link")
    }
}

/// The results view: metadata, warnings and the format table.
pub fn content(info: &ContentInfo) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "🎬 {}", info.title);
    let _ = writeln!(out, "   {} ({})", info.display_name, info.username);
    match info.content_type {
        ContentType::Video => {
            let _ = writeln!(out, "   Duration {} · Uploaded {}", info.duration, info.upload_date);
        }
        ContentType::Photo => {
            let _ = writeln!(
                out,
                "   {} photos · Uploaded {}",
                info.photo_count.unwrap_or(0),
                info.upload_date
            );
        }
    }
    let _ = writeln!(
        out,
        "   👁 {}  ❤ {}  ↗ {}  💬 {}",
        info.views, info.likes, info.shares, info.comments
    );
    if let Some(music) = &info.music_title {
        let _ = writeln!(out, "   ♪ {music}");
    }

    if info.synthetic {
        let _ = writeln!(
            out,
            "⚠️  No metadata source answered: every value above is generated and no format has real media."
        );
    } else if info.watermark_warning {
        let _ = writeln!(out, "⚠️  Downloads may carry a watermark.");
    }

    let _ = writeln!(out, "Formats:");
    for (format, entry) in &info.formats {
        let status = match &entry.url {
            DownloadUrl::Available(_) => "",
            DownloadUrl::Placeholder(_) => " (placeholder)",
            DownloadUrl::Unavailable => " (unavailable)",
        };
        let _ = writeln!(out, "  {:<12} {:>9}{}", format.to_string(), entry.size, status);
    }

    out
}

pub fn outcome(outcome: &DownloadOutcome) -> String {
    match outcome {
        DownloadOutcome::Saved { path, bytes } => {
            format!("✅ Saved {} ({} bytes)", path.display(), bytes)
        }
        DownloadOutcome::Placeholder {
            path,
            bytes,
            reason,
        } => format!(
            "⚠️  Wrote PLACEHOLDER file {} ({} bytes). It is not real media: {}",
            path.display(),
            bytes,
            reason
        ),
    }
}

pub fn progress_line(update: &ProgressUpdate) -> String {
    let percent = update.percent.clamp(0.0, 100.0);
    let filled = (percent / 100.0 * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));
    let speed = update.speed.as_deref().unwrap_or("");
    let label = if update.stage == Stage::Complete {
        "done".to_string()
    } else {
        update.stage.to_string()
    };
    format!("[{bar}] {percent:>5.1}% {label:<11} {speed:<10}")
}

/// Keeps the first and last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}
