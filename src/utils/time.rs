/// Duration parsing and formatting for command arguments like `1h30m`.
const UNITS: &[(char, u64)] = &[
    ('s', 1),
    ('m', 60),
    ('h', 3_600),
    ('d', 86_400),
    ('w', 604_800),
];

/// Parse a human duration string into seconds.
///
/// Accepts concatenated `<number><unit>` groups (`30s`, `5m`, `1h30m`, `2d`).
/// A bare number is read as minutes.
pub fn parse_duration(input: &str) -> Option<u64> {
    let input = input.trim().to_lowercase();

    if input.is_empty() {
        return None;
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        return input.parse::<u64>().ok().map(|n| n * 60);
    }

    let mut total = 0u64;
    let mut digits = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else {
            let unit = UNITS.iter().find(|(u, _)| *u == c)?;
            if digits.is_empty() {
                return None;
            }
            let value: u64 = digits.parse().ok()?;
            total = total.checked_add(value.checked_mul(unit.1)?)?;
            digits.clear();
        }
    }

    // trailing digits without a unit make the whole input invalid
    if !digits.is_empty() {
        return None;
    }

    (total > 0).then_some(total)
}

/// Format a duration in seconds as the two most significant units.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return plural(seconds, "second");
    }

    let (minutes, _secs) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    let (days, hours) = (hours / 24, hours % 24);
    let (weeks, days) = (days / 7, days % 7);

    let mut parts = Vec::new();
    if weeks > 0 {
        parts.push(plural(weeks, "week"));
    }
    if days > 0 {
        parts.push(plural(days, "day"));
    }
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(plural(minutes, "minute"));
    }

    parts.truncate(2);
    parts.join(", ")
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse_duration("30s"), Some(30));
        assert_eq!(parse_duration("5m"), Some(300));
        assert_eq!(parse_duration("1h"), Some(3_600));
        assert_eq!(parse_duration("1d"), Some(86_400));
        assert_eq!(parse_duration("1w"), Some(604_800));
    }

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse_duration("1h30m"), Some(5_400));
        assert_eq!(parse_duration("1d12h"), Some(129_600));
    }

    #[test]
    fn bare_numbers_are_minutes() {
        assert_eq!(parse_duration("10"), Some(600));
    }

    #[test]
    fn rejects_invalid_input() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("10x"), None);
        assert_eq!(parse_duration("h"), None);
        assert_eq!(parse_duration("5m3"), None);
        assert_eq!(parse_duration("0s"), None);
    }

    #[test]
    fn formats_two_most_significant_units() {
        assert_eq!(format_duration(45), "45 seconds");
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(300), "5 minutes");
        assert_eq!(format_duration(5_400), "1 hour, 30 minutes");
        assert_eq!(format_duration(129_600), "1 day, 12 hours");
        assert_eq!(format_duration(604_800 + 86_400), "1 week, 1 day");
    }
}
