use regex::Regex;
use std::{borrow::Cow, sync::LazyLock};
use url::Url;

const VALID_DOMAINS: &[&str] = &[
    "tiktok.com",
    "vm.tiktok.com",
    "vt.tiktok.com",
    "m.tiktok.com",
    "www.tiktok.com",
];

// Used only when the input does not parse as a URL at all.
static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:https?://)?(?:www\.)?tiktok\.com/@([^/]+)/video/(\d+)",
        r"(?:https?://)?(?:www\.)?tiktok\.com/@([^/]+)/photo/(\d+)",
        r"(?:https?://)?vm\.tiktok\.com/([A-Za-z0-9]+)",
        r"(?:https?://)?vt\.tiktok\.com/([A-Za-z0-9]+)",
        r"(?:https?://)?m\.tiktok\.com/v/(\d+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("URL pattern must compile"))
    .collect()
});

static POST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:video|photo)/(\d+)").expect("post id pattern"));
static SHORT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:vm|vt)\.tiktok\.com/([A-Za-z0-9]+)").expect("short link pattern")
});
static MOBILE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"m\.tiktok\.com/v/(\d+)").expect("mobile id pattern"));
static PHOTO_POST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/photo/\d+").expect("photo post pattern"));
static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([^/?#\s]+)").expect("username pattern"));

/// Returns true when `input` points at a TikTok host. Never fails: anything
/// unparseable or off-domain is simply rejected.
pub fn validate_url(input: &str) -> bool {
    let input = input.trim();
    if input.is_empty() {
        return false;
    }

    let has_scheme = input
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"));
    let candidate = if has_scheme {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("https://{input}"))
    };

    match Url::parse(&candidate) {
        Ok(parsed) => {
            let Some(host) = parsed.host_str() else {
                return false;
            };
            let host = host.to_ascii_lowercase();
            let domain = host.strip_prefix("www.").unwrap_or(&host);
            VALID_DOMAINS.iter().any(|valid| {
                domain == *valid
                    || domain
                        .strip_suffix(valid)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
        }
        Err(_) => URL_PATTERNS.iter().any(|pattern| pattern.is_match(input)),
    }
}

/// Numeric post id for full links, or the short code for `vm.`/`vt.` links.
pub fn extract_video_id(url: &str) -> Option<String> {
    [&*POST_ID, &*SHORT_LINK, &*MOBILE_ID]
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn is_photo_post(url: &str) -> bool {
    PHOTO_POST.is_match(url)
}

/// The `@handle` segment of a profile-style link, `@` included.
pub fn extract_username(url: &str) -> Option<String> {
    USERNAME
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("@{}", m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_video_urls_validate() {
        for id in ["1", "7234567890123456789", "42"] {
            for user in ["user", "some.creator", "a_b"] {
                let url = format!("https://www.tiktok.com/@{user}/video/{id}");
                assert!(validate_url(&url), "{url} should validate");
            }
        }
    }

    #[test]
    fn test_short_and_mobile_links_validate() {
        assert!(validate_url("https://vm.tiktok.com/ZMabc123/"));
        assert!(validate_url("https://vt.tiktok.com/ZSxyz/"));
        assert!(validate_url("https://m.tiktok.com/v/123456.html"));
        assert!(validate_url("tiktok.com/@user/photo/99"));
        assert!(validate_url("HTTPS://WWW.TIKTOK.COM/@User/video/1"));
    }

    #[test]
    fn test_subdomains_validate() {
        assert!(validate_url("https://us.tiktok.com/@user/video/1"));
        assert!(validate_url("https://www.vm.tiktok.com/abc"));
    }

    #[test]
    fn test_unrelated_hosts_rejected() {
        for url in [
            "https://www.youtube.com/watch?v=abc",
            "https://example.com/@user/video/123",
            "https://nottiktok.com/@user/video/123",
            "https://tiktok.com.evil.example/@user/video/1",
            "ftp://files.example.org/tiktok.com",
        ] {
            assert!(!validate_url(url), "{url} should be rejected");
        }
    }

    #[test]
    fn test_garbage_input_rejected() {
        assert!(!validate_url(""));
        assert!(!validate_url("   "));
        assert!(!validate_url("not a url at all"));
        assert!(!validate_url("http://[::1"));
    }

    #[test]
    fn test_unparseable_input_falls_back_to_patterns() {
        // A space in the host fails URL parsing but the path still matches
        let url = "https://www tiktok.com/@user/video/123";
        assert!(Url::parse(url).is_err());
        assert!(validate_url(url));

        let bad_port = "https://www.tiktok.com:99999/@u/video/1";
        assert!(Url::parse(bad_port).is_err());
        assert!(!validate_url(bad_port));
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.tiktok.com/@user/video/7234567890").as_deref(),
            Some("7234567890")
        );
        assert_eq!(
            extract_video_id("https://www.tiktok.com/@user/photo/555").as_deref(),
            Some("555")
        );
        assert_eq!(
            extract_video_id("https://vm.tiktok.com/ZMabc123/").as_deref(),
            Some("ZMabc123")
        );
        assert_eq!(
            extract_video_id("https://m.tiktok.com/v/98765.html").as_deref(),
            Some("98765")
        );
        assert_eq!(extract_video_id("https://www.tiktok.com/@user"), None);
    }

    #[test]
    fn test_photo_post_and_username() {
        assert!(is_photo_post("https://www.tiktok.com/@user/photo/123"));
        assert!(!is_photo_post("https://www.tiktok.com/@user/video/123"));
        assert_eq!(
            extract_username("https://www.tiktok.com/@dance.crew/video/1").as_deref(),
            Some("@dance.crew")
        );
        assert_eq!(extract_username("https://vm.tiktok.com/abc"), None);
    }
}
