//! ISO-8601 durations (`PT5S`, `PT1M30S`, `P1DT2H`) as milliseconds.
//!
//! Observation windows, analysis depths and cooldowns are held in
//! milliseconds in memory and travel as ISO-8601 strings on the wire.

use crate::error::{ModelError, ModelResult};

const SECOND_MS: f64 = 1_000.0;
const MINUTE_MS: f64 = 60.0 * SECOND_MS;
const HOUR_MS: f64 = 60.0 * MINUTE_MS;
const DAY_MS: f64 = 24.0 * HOUR_MS;
const WEEK_MS: f64 = 7.0 * DAY_MS;

/// Parse an ISO-8601 duration into whole milliseconds.
///
/// Units must appear in descending order, at most once each. Only the
/// seconds field is expected to carry a fraction, but any field may.
pub fn parse_iso8601(text: &str) -> ModelResult<u64> {
    let invalid = || ModelError::InvalidDuration(text.to_string());

    let upper = text.trim().to_ascii_uppercase();
    let rest = upper.strip_prefix('P').ok_or_else(invalid)?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((_, "")) => return Err(invalid()),
        Some((date, time)) => (date, time),
        None => (rest, ""),
    };
    if date_part.is_empty() && time_part.is_empty() {
        return Err(invalid());
    }

    let millis = sum_fields(date_part, &[('W', WEEK_MS), ('D', DAY_MS)]).ok_or_else(invalid)?
        + sum_fields(time_part, &[('H', HOUR_MS), ('M', MINUTE_MS), ('S', SECOND_MS)])
            .ok_or_else(invalid)?;

    Ok(millis.round() as u64)
}

fn sum_fields(part: &str, units: &[(char, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut number = String::new();
    let mut next_unit = 0;

    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            number.push(if c == ',' { '.' } else { c });
            continue;
        }
        let offset = units[next_unit..].iter().position(|(unit, _)| *unit == c)?;
        let (_, scale) = units[next_unit + offset];
        let value: f64 = number.parse().ok()?;
        total += value * scale;
        number.clear();
        next_unit += offset + 1;
    }

    number.is_empty().then_some(total)
}

/// Format milliseconds as an ISO-8601 time duration (`PT1H30M`, `PT0.25S`).
pub fn format_iso8601(millis: u64) -> String {
    if millis == 0 {
        return "PT0S".to_string();
    }

    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    let seconds = (millis % 60_000) / 1_000;
    let fraction = millis % 1_000;

    let mut out = String::from("PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if seconds > 0 || fraction > 0 {
        if fraction > 0 {
            let fraction = format!("{fraction:03}");
            out.push_str(&format!("{seconds}.{}S", fraction.trim_end_matches('0')));
        } else {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}

/// Round a numeric millisecond count; negative and non-finite values have none.
pub fn millis_from_f64(millis: f64) -> Option<u64> {
    (millis.is_finite() && millis >= 0.0).then(|| millis.round() as u64)
}

/// Serde adapter: milliseconds in memory, ISO-8601 string on the wire.
///
/// Bare JSON numbers are accepted as milliseconds when reading.
pub mod iso8601 {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(millis: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso8601(*millis))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(MillisVisitor)
    }

    struct MillisVisitor;

    impl Visitor<'_> for MillisVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an ISO-8601 duration string or milliseconds")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            super::parse_iso8601(v).map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative duration: {v}")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
            super::millis_from_f64(v).ok_or_else(|| E::custom(format!("invalid duration: {v}")))
        }
    }
}
