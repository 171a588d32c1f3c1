use std::time::Duration;

const MICROSECOND: u64 = 1000;
const MILLISECOND: u64 = MICROSECOND * 1000;
const SECOND: u64 = MILLISECOND * 1000;
const MINUTE: u64 = SECOND * 60;
const HOUR: u64 = MINUTE * 60;
const DAY: u64 = HOUR * 24;

pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos().min(u128::from(u64::MAX)) as u64;
    match nanos {
        t if t < MICROSECOND => format!("{t}ns"),
        t if t < MILLISECOND => format_unit(t, "us", MICROSECOND),
        t if t < SECOND => format_unit(t, "ms", MILLISECOND),
        t if t < MINUTE => format_unit(t, "s", SECOND),
        t if t < HOUR => format_unit(t, "m", MINUTE),
        t if t < DAY => format_unit(t, "h", HOUR),
        t => format_unit(t, "d", DAY),
    }
}

fn format_unit(nanos: u64, units_label: &str, units_factor: u64) -> String {
    let integer_digits = nanos / units_factor;
    let fraction_digits = (nanos % units_factor) * 1000 / units_factor;
    format!("{integer_digits}.{fraction_digits:03}{units_label}")
}

/// Replaces every byte outside `[A-Za-z0-9.-]` with `_`, so a candidate URI
/// can be used as a filename component.
pub fn sanitize_filename(candidate: &str) -> String {
    candidate
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_path_separators_and_query_punctuation() {
        assert_eq!(sanitize_filename("/a/b?x=1&y=2"), "_a_b_x_1_y_2");
    }

    #[test]
    fn leaves_safe_characters_alone() {
        assert_eq!(sanitize_filename("a-B.9"), "a-B.9");
    }

    #[test]
    fn formats_sub_second_durations() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
        assert_eq!(format_duration(Duration::from_millis(250)), "250.000ms");
    }
}
