use std::time::Duration;

/// Compact elapsed time for progress lines: `850ms`, `4.3s`, `2m05s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1_000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        let secs = elapsed.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

/// Binary-prefixed size with one decimal: `512 B`, `1.5 KiB`, `3.0 MiB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.1} {}", UNITS[unit])
}

/// Trailing detail of a saved-capture line, e.g. `(1.5 MiB, 4.3s)`.
///
/// The size is omitted when the written file could not be inspected.
pub fn capture_detail(bytes: Option<u64>, elapsed: Duration) -> String {
    match bytes {
        Some(bytes) => format!("({}, {})", format_file_size(bytes), format_elapsed(elapsed)),
        None => format!("({})", format_elapsed(elapsed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(850)), "850ms");
        assert_eq!(format_elapsed(Duration::from_millis(4_320)), "4.3s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m05s");
        assert_eq!(format_elapsed(Duration::from_secs(3_665)), "61m05s");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1_536), "1.5 KiB");
        assert_eq!(format_file_size(3 * 1_048_576), "3.0 MiB");
    }

    #[test]
    fn test_capture_detail() {
        assert_eq!(
            capture_detail(Some(2_048), Duration::from_millis(300)),
            "(2.0 KiB, 300ms)"
        );
        assert_eq!(capture_detail(None, Duration::from_secs(2)), "(2.0s)");
    }
}
