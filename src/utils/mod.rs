use rand::Rng;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Compact engagement count, e.g. `1.2M`, `45.0K`, `812`.
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Human-readable file size. Two decimals below 10 MB so that small files
/// still show a visible difference between formats.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        let mb = bytes as f64 / MIB;
        if mb >= 10.0 {
            format!("{mb:.1} MB")
        } else {
            format!("{mb:.2} MB")
        }
    } else {
        format!("{:.0} KB", bytes as f64 / KIB)
    }
}

pub fn format_speed(kib_per_sec: f64) -> String {
    if kib_per_sec > 1024.0 {
        format!("{:.1} MB/s", kib_per_sec / 1024.0)
    } else {
        format!("{kib_per_sec:.0} KB/s")
    }
}

/// `m:ss`, with a leading `0:` for clips under a minute.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Seconds from `m:ss`. Rejects `ss >= 60` and totals that overflow.
pub fn parse_duration(duration: &str) -> Option<u64> {
    let (mins, secs) = duration.split_once(':')?;
    let mins: u64 = mins.trim().parse().ok()?;
    let secs: u64 = secs.trim().parse().ok()?;
    if secs >= 60 {
        return None;
    }
    mins.checked_mul(60)?.checked_add(secs)
}

pub fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1.0K");
        assert_eq!(format_count(1500), "1.5K");
        assert_eq!(format_count(250_000), "250.0K");
        assert_eq!(format_count(2_500_000), "2.5M");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512_000), "500 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.50 MB");
        assert_eq!(format_size(15 * 1024 * 1024), "15.0 MB");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(640.0), "640 KB/s");
        assert_eq!(format_speed(2048.0), "2.0 MB/s");
    }

    #[test]
    fn test_duration_round_trip() {
        assert_eq!(format_duration(5), "0:05");
        assert_eq!(format_duration(75), "1:15");
        assert_eq!(format_duration(600), "10:00");
        assert_eq!(parse_duration("1:15"), Some(75));
        assert_eq!(parse_duration("0:09"), Some(9));
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("1:xx"), None);
    }

    #[test]
    fn test_parse_duration_rejects_out_of_range() {
        assert_eq!(parse_duration("1:60"), None);
        assert_eq!(parse_duration("999999999999999999:00"), None);
        assert_eq!(parse_duration(&format!("{}:00", u64::MAX)), None);
    }

    #[test]
    fn test_random_base36() {
        let id = random_base36(8);
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
