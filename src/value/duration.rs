//! Duration text coercion.
//!
//! Suffix grammar follows the conventional shell `sleep` argument
//! (`s|m|h|d`, default seconds), extended with sub-second suffixes
//! (`ns|us|ms`) since the value store's `Duration` kind needs finer
//! granularity than a shell `sleep` argument typically does.

use std::time::Duration;

use regex_lite::Regex;

pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let re = Regex::new(r"^(\d+\.?\d*)(ns|us|ms|s|m|h|d)?$").unwrap();
    let caps = re
        .captures(text)
        .ok_or_else(|| format!("invalid duration {text:?}"))?;
    let value: f64 = caps
        .get(1)
        .unwrap()
        .as_str()
        .parse()
        .map_err(|_| format!("invalid duration {text:?}"))?;
    let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or("s");
    let nanos = match suffix {
        "ns" => value,
        "us" => value * 1_000.0,
        "ms" => value * 1_000_000.0,
        "s" => value * 1_000_000_000.0,
        "m" => value * 60.0 * 1_000_000_000.0,
        "h" => value * 3_600.0 * 1_000_000_000.0,
        "d" => value * 86_400.0 * 1_000_000_000.0,
        _ => return Err(format!("invalid duration suffix in {text:?}")),
    };
    Ok(Duration::from_nanos(nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parses_minutes() {
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn parses_milliseconds() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_suffix() {
        assert!(parse_duration("1x").is_err());
    }
}
