//! Conversion of raw configuration strings into typed values.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

pub fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Parse `PT1H30M`, `PT0.5S`, `45` (seconds), `250ms`, `30s`, `5m`, `2h`.
pub fn parse_duration(name: &str, raw: &str) -> Result<Duration> {
    let invalid = || ConfigError::InvalidDuration {
        name: name.to_string(),
        value: raw.to_string(),
    };
    let text = raw.trim();
    if text.is_empty() {
        return Err(invalid());
    }

    let upper = text.to_ascii_uppercase();
    if let Some(iso) = upper.strip_prefix("PT") {
        return parse_iso_time(iso).ok_or_else(invalid);
    }

    let (digits, per_second) = if let Some(v) = text.strip_suffix("ms") {
        (v, 1000.0)
    } else if let Some(v) = text.strip_suffix('s') {
        (v, 1.0)
    } else if let Some(v) = text.strip_suffix('m') {
        (v, 1.0 / 60.0)
    } else if let Some(v) = text.strip_suffix('h') {
        (v, 1.0 / 3600.0)
    } else {
        (text, 1.0)
    };
    let amount: f64 = digits.trim().parse().map_err(|_| invalid())?;
    seconds(amount / per_second).ok_or_else(invalid)
}

// `1H30M15.5S` (the part after `PT`)
fn parse_iso_time(spec: &str) -> Option<Duration> {
    if spec.is_empty() {
        return None;
    }
    let mut total = 0.0;
    let mut number = String::new();
    for ch in spec.chars() {
        match ch {
            '0'..='9' | '.' => number.push(ch),
            'H' | 'M' | 'S' => {
                let amount: f64 = number.parse().ok()?;
                number.clear();
                total += amount
                    * match ch {
                        'H' => 3600.0,
                        'M' => 60.0,
                        _ => 1.0,
                    };
            }
            _ => return None,
        }
    }
    if !number.is_empty() {
        return None;
    }
    seconds(total)
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}
