//! Colored attribute checker and its predicate variants.
//!
//! A checker holds a green and a yellow predicate. An attribute value that
//! satisfies green is healthy, yellow is degraded, anything else is red.
//! Each predicate travels as a JSON object tagged by `@type`:
//!
//! ```text
//! {"@type":"constant","value":true}
//! {"@type":"comparator","operator":"GREATER_THAN","value":80}
//! {"@type":"isInRange","rangeStart":0,"rangeEnd":10,
//!  "isRangeStartInclusive":true,"isRangeEndInclusive":false}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};

/// Discriminator key carried by every serialized predicate.
pub const TYPE_KEY: &str = "@type";

/// Scripts shorter than this carry no predicates.
const MIN_CHECKER_SCRIPT_LEN: usize = 5;

/// Health color assigned to an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeColor {
    Green,
    Yellow,
    Red,
}

impl fmt::Display for AttributeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeColor::Green => "green",
            AttributeColor::Yellow => "yellow",
            AttributeColor::Red => "red",
        })
    }
}

// ── Operators ─────────────────────────────────────────────────────

/// Numeric comparison used by [`NumberComparatorPredicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Equal,
    NotEqual,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 6] = [
        ComparisonOperator::GreaterThan,
        ComparisonOperator::GreaterThanOrEqual,
        ComparisonOperator::LessThan,
        ComparisonOperator::LessThanOrEqual,
        ComparisonOperator::Equal,
        ComparisonOperator::NotEqual,
    ];

    /// Wire tag, e.g. `GREATER_THAN_OR_EQUAL`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => "GREATER_THAN",
            ComparisonOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            ComparisonOperator::LessThan => "LESS_THAN",
            ComparisonOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            ComparisonOperator::Equal => "EQUAL",
            ComparisonOperator::NotEqual => "NOT_EQUAL",
        }
    }

    /// Mathematical symbol used in human-readable output.
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => "≥",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "≤",
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "≠",
        }
    }

    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonOperator::GreaterThan => lhs > rhs,
            ComparisonOperator::GreaterThanOrEqual => lhs >= rhs,
            ComparisonOperator::LessThan => lhs < rhs,
            ComparisonOperator::LessThanOrEqual => lhs <= rhs,
            ComparisonOperator::Equal => lhs == rhs,
            ComparisonOperator::NotEqual => lhs != rhs,
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = ModelError;

    /// Accepts the wire tag or the display symbol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s || op.symbol() == s)
            .ok_or_else(|| ModelError::UnknownOperator(s.to_string()))
    }
}

// ── Predicate variants ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantAttributePredicate {
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberComparatorPredicate {
    pub operator: ComparisonOperator,
    pub value: f64,
}

/// Range membership. Renders as `rangeEnd ▷ value ▷ rangeStart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsInRangePredicate {
    pub range_start: f64,
    pub range_end: f64,
    pub is_range_start_inclusive: bool,
    pub is_range_end_inclusive: bool,
}

/// One condition of a colored checker.
#[derive(Debug, Clone, PartialEq)]
pub enum ColoredAttributePredicate {
    Constant(ConstantAttributePredicate),
    Comparator(NumberComparatorPredicate),
    IsInRange(IsInRangePredicate),
}

impl ColoredAttributePredicate {
    pub fn constant(value: bool) -> Self {
        Self::Constant(ConstantAttributePredicate { value })
    }

    pub fn comparator(operator: ComparisonOperator, value: f64) -> Self {
        Self::Comparator(NumberComparatorPredicate { operator, value })
    }

    pub fn in_range(start: f64, end: f64, start_inclusive: bool, end_inclusive: bool) -> Self {
        Self::IsInRange(IsInRangePredicate {
            range_start: start,
            range_end: end,
            is_range_start_inclusive: start_inclusive,
            is_range_end_inclusive: end_inclusive,
        })
    }

    /// Discriminator written as `@type`.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Constant(_) => "constant",
            Self::Comparator(_) => "comparator",
            Self::IsInRange(_) => "isInRange",
        }
    }

    /// Decode a predicate object, dispatching on its `@type`.
    pub fn from_json(json: &Value) -> ModelResult<Self> {
        let tag = json.get(TYPE_KEY).and_then(Value::as_str).unwrap_or_default();
        match tag {
            "constant" => Ok(Self::Constant(ConstantAttributePredicate::deserialize(json)?)),
            "comparator" => {
                if let Some(op) = json.get("operator").and_then(Value::as_str) {
                    op.parse::<ComparisonOperator>()?;
                }
                Ok(Self::Comparator(NumberComparatorPredicate::deserialize(json)?))
            }
            "isInRange" => Ok(Self::IsInRange(IsInRangePredicate::deserialize(json)?)),
            other => Err(ModelError::UnrecognizedVariant(other.to_string())),
        }
    }

    /// Encode as a JSON object carrying `@type` and the variant's fields.
    pub fn to_json(&self) -> ModelResult<Value> {
        let fields = match self {
            Self::Constant(p) => serde_json::to_value(p)?,
            Self::Comparator(p) => serde_json::to_value(p)?,
            Self::IsInRange(p) => serde_json::to_value(p)?,
        };
        let mut object = Map::new();
        object.insert(TYPE_KEY.to_string(), Value::from(self.type_tag()));
        if let Value::Object(fields) = fields {
            object.extend(fields);
        }
        Ok(Value::Object(object))
    }

    /// Human-readable rendering, e.g. `value ≥ 42`.
    pub fn represent(&self) -> String {
        match self {
            Self::Constant(p) => format!("value = {}", p.value),
            Self::Comparator(p) => format!("value {} {}", p.operator.symbol(), p.value),
            Self::IsInRange(p) => format!(
                "{} {} value {} {}",
                p.range_end,
                if p.is_range_end_inclusive { "≥" } else { ">" },
                if p.is_range_start_inclusive { "≥" } else { ">" },
                p.range_start,
            ),
        }
    }

    /// Evaluate against a sampled attribute value.
    pub fn test(&self, value: f64) -> bool {
        match self {
            Self::Constant(p) => p.value,
            Self::Comparator(p) => p.operator.apply(value, p.value),
            Self::IsInRange(p) => {
                let above_start = if p.is_range_start_inclusive {
                    value >= p.range_start
                } else {
                    value > p.range_start
                };
                let below_end = if p.is_range_end_inclusive {
                    value <= p.range_end
                } else {
                    value < p.range_end
                };
                above_start && below_end
            }
        }
    }
}

// ── Checker ───────────────────────────────────────────────────────

/// Green/yellow predicate pair classifying an attribute's health.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColoredAttributeChecker {
    pub green: Option<ColoredAttributePredicate>,
    pub yellow: Option<ColoredAttributePredicate>,
}

impl ColoredAttributeChecker {
    pub fn new(green: ColoredAttributePredicate, yellow: ColoredAttributePredicate) -> Self {
        Self {
            green: Some(green),
            yellow: Some(yellow),
        }
    }

    /// Decode the JSON carried in a checker scriptlet's `script`.
    ///
    /// Empty or near-empty scripts yield a checker with no predicates.
    pub fn from_script(script: &str) -> ModelResult<Self> {
        if script.trim().chars().count() < MIN_CHECKER_SCRIPT_LEN {
            return Ok(Self::default());
        }
        let json: Value = serde_json::from_str(script)?;
        let predicate = |key: &str| -> ModelResult<Option<ColoredAttributePredicate>> {
            match json.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(p) => ColoredAttributePredicate::from_json(p).map(Some),
            }
        };
        Ok(Self {
            green: predicate("green")?,
            yellow: predicate("yellow")?,
        })
    }

    pub fn to_json(&self) -> ModelResult<Value> {
        let mut object = Map::new();
        if let Some(green) = &self.green {
            object.insert("green".to_string(), green.to_json()?);
        }
        if let Some(yellow) = &self.yellow {
            object.insert("yellow".to_string(), yellow.to_json()?);
        }
        Ok(Value::Object(object))
    }

    /// Color for a sampled value: green wins over yellow, otherwise red.
    pub fn classify(&self, value: f64) -> AttributeColor {
        if self.green.as_ref().is_some_and(|p| p.test(value)) {
            AttributeColor::Green
        } else if self.yellow.as_ref().is_some_and(|p| p.test(value)) {
            AttributeColor::Yellow
        } else {
            AttributeColor::Red
        }
    }
}
