//! Operational range — a numeric interval in bracket notation.
//!
//! ```text
//! [0‥100]     0 ≤ x ≤ 100
//! (0‥80)      0 < x < 80
//! (-∞‥+∞)     unbounded
//! ```
//!
//! A left `[` marks an inclusive finite begin and a right `]` an inclusive
//! finite end; any other bracket means exclusive. Infinite bounds are always
//! written with `(` / `)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelError, ModelResult};

/// Separator between the begin and end tokens.
pub const DELIMITER: char = '‥';
/// Token standing in for an unbounded begin.
pub const NEG_INFINITY: &str = "-∞";
/// Token standing in for an unbounded end.
pub const POS_INFINITY: &str = "+∞";

/// Numeric interval used as the acceptable band of an attribute value.
///
/// When a bound is infinite its numeric value and inclusivity flag carry no
/// meaning; equality ignores them.
#[derive(Debug, Clone, Copy)]
pub struct OpRange {
    pub begin: f64,
    pub end: f64,
    pub is_begin_infinite: bool,
    pub is_end_infinite: bool,
    pub is_begin_including: bool,
    pub is_end_including: bool,
}

impl OpRange {
    /// Finite range with explicit inclusivity on each side.
    pub fn new(begin: f64, end: f64, is_begin_including: bool, is_end_including: bool) -> Self {
        Self {
            begin,
            end,
            is_begin_infinite: false,
            is_end_infinite: false,
            is_begin_including,
            is_end_including,
        }
    }

    /// `(-∞‥+∞)`
    pub fn unbounded() -> Self {
        Self {
            begin: f64::NEG_INFINITY,
            end: f64::INFINITY,
            is_begin_infinite: true,
            is_end_infinite: true,
            is_begin_including: false,
            is_end_including: false,
        }
    }

    /// `(-∞‥end]` or `(-∞‥end)`
    pub fn below(end: f64, is_end_including: bool) -> Self {
        Self {
            end,
            is_end_infinite: false,
            is_end_including,
            ..Self::unbounded()
        }
    }

    /// `[begin‥+∞)` or `(begin‥+∞)`
    pub fn above(begin: f64, is_begin_including: bool) -> Self {
        Self {
            begin,
            is_begin_infinite: false,
            is_begin_including,
            ..Self::unbounded()
        }
    }

    /// Render the canonical bracket notation. Never fails.
    pub fn format(&self) -> String {
        let open = if !self.is_begin_infinite && self.is_begin_including {
            '['
        } else {
            '('
        };
        let close = if !self.is_end_infinite && self.is_end_including {
            ']'
        } else {
            ')'
        };
        let begin = if self.is_begin_infinite {
            NEG_INFINITY.to_string()
        } else {
            self.begin.to_string()
        };
        let end = if self.is_end_infinite {
            POS_INFINITY.to_string()
        } else {
            self.end.to_string()
        };
        format!("{open}{begin}{DELIMITER}{end}{close}")
    }

    /// Parse the bracket notation produced by [`OpRange::format`].
    ///
    /// Only a literal `[` / `]` makes a bound inclusive. The delimiter must
    /// appear exactly once and finite tokens must be numbers.
    pub fn parse(text: &str) -> ModelResult<Self> {
        let malformed = || ModelError::Format(text.to_string());

        let mut segments = text.trim().split(DELIMITER);
        let (Some(left), Some(right), None) = (segments.next(), segments.next(), segments.next())
        else {
            return Err(malformed());
        };

        let mut left_chars = left.chars();
        let open = left_chars.next().ok_or_else(malformed)?;
        let begin_token = left_chars.as_str().trim();

        let mut right_chars = right.chars();
        let close = right_chars.next_back().ok_or_else(malformed)?;
        let end_token = right_chars.as_str().trim();

        let is_begin_infinite = begin_token == NEG_INFINITY;
        let is_end_infinite = end_token == POS_INFINITY;

        let begin = if is_begin_infinite {
            f64::NEG_INFINITY
        } else {
            parse_bound(begin_token).ok_or_else(malformed)?
        };
        let end = if is_end_infinite {
            f64::INFINITY
        } else {
            parse_bound(end_token).ok_or_else(malformed)?
        };

        Ok(Self {
            begin,
            end,
            is_begin_infinite,
            is_end_infinite,
            is_begin_including: !is_begin_infinite && open == '[',
            is_end_including: !is_end_infinite && close == ']',
        })
    }

    /// Whether `value` lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        let above_begin = self.is_begin_infinite
            || if self.is_begin_including {
                value >= self.begin
            } else {
                value > self.begin
            };
        let below_end = self.is_end_infinite
            || if self.is_end_including {
                value <= self.end
            } else {
                value < self.end
            };
        above_begin && below_end
    }
}

fn parse_bound(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl Default for OpRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl PartialEq for OpRange {
    fn eq(&self, other: &Self) -> bool {
        let begin_eq = match (self.is_begin_infinite, other.is_begin_infinite) {
            (true, true) => true,
            (false, false) => {
                self.begin == other.begin && self.is_begin_including == other.is_begin_including
            }
            _ => false,
        };
        let end_eq = match (self.is_end_infinite, other.is_end_infinite) {
            (true, true) => true,
            (false, false) => {
                self.end == other.end && self.is_end_including == other.is_end_including
            }
            _ => false,
        };
        begin_eq && end_eq
    }
}

impl fmt::Display for OpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for OpRange {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for OpRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OpRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
