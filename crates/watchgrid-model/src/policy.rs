//! Structured scaling policies.
//!
//! Both variants share a [`PolicyWeight`] (vote weight, observation window,
//! incremental flag) and travel JSON-encoded in their scriptlet's `script`:
//!
//! ```text
//! HealthStatusBased: {"level":"SEVERE","voteWeight":1,"incrementalWeight":false,
//!                     "observationTime":"PT5S"}
//! MetricBased:       {"attributeName":"cpu","aggregation":"MAX","operationalRange":"[0‥80)",
//!                     "voteWeight":1,"incrementalWeight":false,
//!                     "observationTime":"PT5S","analysisDepth":"PT60S"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::duration::iso8601;
use crate::error::ModelResult;
use crate::range::OpRange;
use crate::scriptlet::Language;

/// Vote parameters common to every structured policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyWeight {
    pub vote_weight: f64,
    /// Milliseconds the condition must hold before the policy votes.
    #[serde(with = "iso8601")]
    pub observation_time: u64,
    pub incremental_weight: bool,
}

impl Default for PolicyWeight {
    fn default() -> Self {
        Self {
            vote_weight: 1.0,
            observation_time: 0,
            incremental_weight: false,
        }
    }
}

/// Severity of the health status a policy reacts to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthLevel {
    #[default]
    Low,
    Moderate,
    Substantial,
    Severe,
    Critical,
}

/// How samples within the analysis depth are reduced to one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    #[default]
    #[serde(rename = "MAX")]
    Max,
    #[serde(rename = "MIN")]
    Min,
    #[serde(rename = "MEAN")]
    Mean,
    #[serde(rename = "MEDIAN")]
    Median,
    #[serde(rename = "PERCENTILE_90")]
    Percentile90,
    #[serde(rename = "PERCENTILE_95")]
    Percentile95,
    #[serde(rename = "PERCENTILE_97")]
    Percentile97,
    #[serde(rename = "SUM")]
    Sum,
}

/// Votes when the watched group reaches a given health level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatusBasedScalingPolicy {
    #[serde(flatten)]
    pub weight: PolicyWeight,
    #[serde(default)]
    pub level: HealthLevel,
}

/// Votes when an aggregated attribute leaves its operational range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeBasedScalingPolicy {
    #[serde(flatten)]
    pub weight: PolicyWeight,
    #[serde(default)]
    pub attribute_name: String,
    #[serde(default)]
    pub operational_range: OpRange,
    /// Milliseconds of history fed into the aggregation.
    #[serde(with = "iso8601", default)]
    pub analysis_depth: u64,
    #[serde(default)]
    pub aggregation: Aggregation,
}

/// Payload of a structured scaling-policy scriptlet.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalingPolicy {
    HealthStatus(HealthStatusBasedScalingPolicy),
    AttributeBased(AttributeBasedScalingPolicy),
}

impl ScalingPolicy {
    /// Scriptlet language this payload is carried under.
    pub fn language(&self) -> Language {
        match self {
            ScalingPolicy::HealthStatus(_) => Language::HealthStatusBased,
            ScalingPolicy::AttributeBased(_) => Language::MetricBased,
        }
    }

    pub fn weight(&self) -> &PolicyWeight {
        match self {
            ScalingPolicy::HealthStatus(p) => &p.weight,
            ScalingPolicy::AttributeBased(p) => &p.weight,
        }
    }

    pub fn weight_mut(&mut self) -> &mut PolicyWeight {
        match self {
            ScalingPolicy::HealthStatus(p) => &mut p.weight,
            ScalingPolicy::AttributeBased(p) => &mut p.weight,
        }
    }

    pub fn to_json(&self) -> ModelResult<Value> {
        Ok(match self {
            ScalingPolicy::HealthStatus(p) => serde_json::to_value(p)?,
            ScalingPolicy::AttributeBased(p) => serde_json::to_value(p)?,
        })
    }
}

impl From<HealthStatusBasedScalingPolicy> for ScalingPolicy {
    fn from(p: HealthStatusBasedScalingPolicy) -> Self {
        ScalingPolicy::HealthStatus(p)
    }
}

impl From<AttributeBasedScalingPolicy> for ScalingPolicy {
    fn from(p: AttributeBasedScalingPolicy) -> Self {
        ScalingPolicy::AttributeBased(p)
    }
}
