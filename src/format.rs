//! Human-readable rendering of sizes and durations.

/// Render a byte count in at most four characters, `ls -h` style.
///
/// `u64::MAX` marks a value the OS did not report and renders as `-`.
#[must_use]
pub fn format_size(size: u64) -> String {
    const ORDERS: &[u8] = b"KMGTPE";

    if size == u64::MAX {
        return "-".to_string();
    }
    if size < 973 {
        return format!("{size:3} ");
    }

    let mut size = size;
    let mut order = 0;
    loop {
        let mut remain = size & 1023;
        size >>= 10;

        if size >= 973 {
            order += 1;
            continue;
        }

        let unit = char::from(ORDERS[order]);
        if size < 9 || (size == 9 && remain < 973) {
            remain = (remain * 5 + 256) / 512;
            if remain >= 10 {
                size += 1;
                remain = 0;
            }
            return format!("{size}.{remain}{unit}");
        }

        if remain >= 512 {
            size += 1;
        }
        return format!("{size:3}{unit}");
    }
}

/// Render an uptime in seconds as `N days, HH:MM` or `M min`.
#[must_use]
pub fn uptime_string(seconds: u64) -> String {
    let days = seconds / (60 * 60 * 24);
    let minutes = seconds / 60;
    let hours = (minutes / 60) % 24;
    let minutes = minutes % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days} day{}, ", if days > 1 { "s" } else { "" }));
    }
    if hours > 0 {
        out.push_str(&format!("{hours:2}:{minutes:02}"));
    } else {
        out.push_str(&format!("{minutes} min"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_sizes_are_padded_bytes() {
        assert_eq!(format_size(0), "  0 ");
        assert_eq!(format_size(5), "  5 ");
        assert_eq!(format_size(972), "972 ");
    }

    #[test]
    fn sizes_below_ten_units_keep_one_decimal() {
        assert_eq!(format_size(973), "1.0K");
        assert_eq!(format_size(1024), "1.0K");
        assert_eq!(format_size(1536), "1.5K");
        assert_eq!(format_size(10188), "9.9K");
        assert_eq!(format_size(1 << 20), "1.0M");
        assert_eq!(format_size(3 * (1 << 30) + (1 << 29)), "3.5G");
        assert_eq!(format_size(1 << 60), "1.0E");
    }

    #[test]
    fn larger_sizes_are_rounded() {
        assert_eq!(format_size(10240), " 10K");
        assert_eq!(format_size(500 << 20), "500M");
        assert_eq!(format_size(u64::MAX - 1), " 16E");
    }

    #[test]
    fn unreported_size_is_a_dash() {
        assert_eq!(format_size(u64::MAX), "-");
    }

    #[test]
    fn uptime_forms() {
        assert_eq!(uptime_string(0), "0 min");
        assert_eq!(uptime_string(59 * 60 + 30), "59 min");
        assert_eq!(uptime_string(3 * 3600 + 7 * 60), " 3:07");
        assert_eq!(uptime_string(86_400 + 600), "1 day, 10 min");
        assert_eq!(uptime_string(3 * 86_400 + 13 * 3600 + 5 * 60), "3 days, 13:05");
    }
}
