//! Scriptlets — units of configurable watcher logic.
//!
//! A scriptlet is either free text in a scripting language (optionally a URL
//! to fetch the text from) or a structured object whose JSON encoding is
//! carried in `script`. The `language` tag selects which:
//!
//! | language                  | payload                         |
//! |---------------------------|---------------------------------|
//! | `Groovy`, `JavaScript`    | none, `script` is source or URL |
//! | `ColoredAttributeChecker` | `object`                        |
//! | `HealthStatusBased`       | `policy_object` (health)        |
//! | `MetricBased`             | `policy_object` (attribute)     |

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::policy::{
    AttributeBasedScalingPolicy, HealthStatusBasedScalingPolicy, ScalingPolicy,
};
use crate::predicate::ColoredAttributeChecker;
use crate::range::OpRange;

/// Scriptlet language tag as it appears on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    Groovy,
    JavaScript,
    ColoredAttributeChecker,
    HealthStatusBased,
    MetricBased,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Groovy,
        Language::JavaScript,
        Language::ColoredAttributeChecker,
        Language::HealthStatusBased,
        Language::MetricBased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Groovy => "Groovy",
            Language::JavaScript => "JavaScript",
            Language::ColoredAttributeChecker => "ColoredAttributeChecker",
            Language::HealthStatusBased => "HealthStatusBased",
            Language::MetricBased => "MetricBased",
        }
    }

    /// Whether `script` carries an encoded structured object.
    pub fn is_structured(&self) -> bool {
        !matches!(self, Language::Groovy | Language::JavaScript)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| ModelError::UnrecognizedLanguage(s.to_string()))
    }
}

/// A typed unit of user-supplied logic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scriptlet {
    pub entity: Entity,
    pub language: Language,
    /// Source text, a URL when `is_url`, or the JSON of the structured payload.
    pub script: String,
    pub is_url: bool,
    /// Set only for `ColoredAttributeChecker`.
    pub object: Option<ColoredAttributeChecker>,
    /// Set only for `HealthStatusBased` and `MetricBased`.
    pub policy_object: Option<ScalingPolicy>,
}

impl Scriptlet {
    /// Inline script text in a free-text language.
    pub fn script(language: Language, text: impl Into<String>) -> Self {
        let mut scriptlet = Self::default();
        scriptlet.set_language(language);
        scriptlet.script = text.into();
        scriptlet
    }

    /// Script text fetched from `url` at evaluation time.
    pub fn url(language: Language, url: impl Into<String>) -> Self {
        Self {
            is_url: true,
            ..Self::script(language, url)
        }
    }

    pub fn checker(checker: ColoredAttributeChecker) -> Self {
        Self {
            language: Language::ColoredAttributeChecker,
            object: Some(checker),
            ..Self::default()
        }
    }

    pub fn policy(policy: impl Into<ScalingPolicy>) -> Self {
        let policy = policy.into();
        Self {
            language: policy.language(),
            policy_object: Some(policy),
            ..Self::default()
        }
    }

    /// Client-local identifier.
    pub fn id(&self) -> &str {
        self.entity.guid()
    }

    /// Switch language, dropping payloads the new language does not carry
    /// and installing an empty payload where one is required.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        match language {
            Language::Groovy | Language::JavaScript => {
                self.object = None;
                self.policy_object = None;
            }
            Language::ColoredAttributeChecker => {
                self.policy_object = None;
                self.object.get_or_insert_with(ColoredAttributeChecker::default);
            }
            Language::HealthStatusBased | Language::MetricBased => {
                self.object = None;
                if self.policy_object.as_ref().map(ScalingPolicy::language) != Some(language) {
                    self.policy_object = Some(if language == Language::HealthStatusBased {
                        HealthStatusBasedScalingPolicy::default().into()
                    } else {
                        AttributeBasedScalingPolicy::default().into()
                    });
                }
            }
        }
    }

    /// Decode a scriptlet from its wire JSON, building the structured payload
    /// its language calls for.
    pub fn from_json(json: &Value) -> ModelResult<Self> {
        let mut scriptlet = Self::default();
        scriptlet.entity.load_parameters(json.get("parameters"));

        if let Some(language) = json
            .get("language")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            scriptlet.language = language.parse()?;
        }
        scriptlet.script = json
            .get("script")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        scriptlet.is_url = match json.get("url") {
            Some(Value::String(s)) => s == "true",
            Some(Value::Bool(b)) => *b,
            _ => false,
        };

        match scriptlet.language {
            Language::Groovy | Language::JavaScript => {}
            Language::HealthStatusBased => {
                let policy: HealthStatusBasedScalingPolicy =
                    serde_json::from_str(&scriptlet.script)?;
                scriptlet.policy_object = Some(policy.into());
            }
            Language::MetricBased => {
                let payload: Value = serde_json::from_str(&scriptlet.script)?;
                if let Some(range) = payload.get("operationalRange").and_then(Value::as_str) {
                    OpRange::parse(range)?;
                }
                let policy = AttributeBasedScalingPolicy::deserialize(&payload)?;
                scriptlet.policy_object = Some(policy.into());
            }
            Language::ColoredAttributeChecker => {
                scriptlet.object = Some(ColoredAttributeChecker::from_script(&scriptlet.script)?);
            }
        }

        debug!(language = %scriptlet.language, url = scriptlet.is_url, "scriptlet decoded");
        Ok(scriptlet)
    }

    /// Re-encode the structured payload into `script`.
    ///
    /// Free-text languages are left untouched. Structured languages fail
    /// when the matching payload is absent.
    pub fn sync(&mut self) -> ModelResult<()> {
        let missing = || ModelError::MissingStructuredPayload(self.language.to_string());
        let encoded = match self.language {
            Language::Groovy | Language::JavaScript => return Ok(()),
            Language::ColoredAttributeChecker => {
                self.object.as_ref().ok_or_else(missing)?.to_json()?
            }
            Language::HealthStatusBased | Language::MetricBased => self
                .policy_object
                .as_ref()
                .filter(|p| p.language() == self.language)
                .ok_or_else(missing)?
                .to_json()?,
        };
        self.script = encoded.to_string();
        Ok(())
    }

    /// Sync the structured payload into `script`, then encode for the wire.
    pub fn to_json(&mut self) -> ModelResult<Value> {
        self.sync()?;
        let mut object = Map::new();
        object.insert("language".to_string(), Value::from(self.language.as_str()));
        object.insert("script".to_string(), Value::from(self.script.clone()));
        object.insert("url".to_string(), Value::from(self.is_url.to_string()));
        object.insert(
            "parameters".to_string(),
            Value::Object(self.entity.parameters_json()),
        );
        Ok(Value::Object(object))
    }

    /// Check that the structured payload matches the language.
    pub fn validate(&self) -> ModelResult<()> {
        let present = match self.language {
            Language::Groovy | Language::JavaScript => true,
            Language::ColoredAttributeChecker => self.object.is_some(),
            lang => self
                .policy_object
                .as_ref()
                .is_some_and(|p| p.language() == lang),
        };
        if present {
            Ok(())
        } else {
            Err(ModelError::MissingStructuredPayload(self.language.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Aggregation, HealthLevel, PolicyWeight};
    use crate::predicate::{ColoredAttributePredicate, ComparisonOperator};
    use serde_json::json;

    fn metric_policy() -> AttributeBasedScalingPolicy {
        AttributeBasedScalingPolicy {
            weight: PolicyWeight {
                vote_weight: 1.0,
                observation_time: 5_000,
                incremental_weight: false,
            },
            attribute_name: "cpu".to_string(),
            operational_range: OpRange::new(0.0, 80.0, true, false),
            analysis_depth: 60_000,
            aggregation: Aggregation::Max,
        }
    }

    #[test]
    fn groovy_keeps_script_text() {
        let s = Scriptlet::from_json(&json!({
            "language": "Groovy",
            "script": "return true",
            "url": "false",
            "parameters": { "timeout": "5" },
        }))
        .unwrap();
        assert_eq!(s.language, Language::Groovy);
        assert_eq!(s.script, "return true");
        assert!(!s.is_url);
        assert!(s.object.is_none() && s.policy_object.is_none());
        assert_eq!(s.entity.parameter("timeout"), Some("5"));
    }

    #[test]
    fn url_flag_requires_literal_true() {
        let s = Scriptlet::from_json(&json!({
            "language": "JavaScript",
            "script": "https://scripts.example.com/check.js",
            "url": "true",
        }))
        .unwrap();
        assert!(s.is_url);

        let s = Scriptlet::from_json(&json!({ "language": "JavaScript", "url": "yes" })).unwrap();
        assert!(!s.is_url);
    }

    #[test]
    fn missing_language_defaults_to_groovy() {
        let s = Scriptlet::from_json(&json!({ "script": "x" })).unwrap();
        assert_eq!(s.language, Language::Groovy);
    }

    #[test]
    fn metric_based_builds_policy() {
        let s = Scriptlet::from_json(&json!({
            "language": "MetricBased",
            "script": "{\"attributeName\":\"cpu\",\"aggregation\":\"MAX\",\"operationalRange\":\"[0‥80)\",\"voteWeight\":1,\"incrementalWeight\":false,\"observationTime\":\"PT5S\",\"analysisDepth\":\"PT60S\"}",
        }))
        .unwrap();
        let Some(ScalingPolicy::AttributeBased(policy)) = &s.policy_object else {
            panic!("expected attribute-based policy");
        };
        assert_eq!(policy.attribute_name, "cpu");
        assert_eq!(policy.operational_range.end, 80.0);
        assert!(!policy.operational_range.is_end_including);
        assert_eq!(policy.analysis_depth, 60_000);
        assert!(s.object.is_none());
    }

    #[test]
    fn health_status_builds_policy() {
        let s = Scriptlet::from_json(&json!({
            "language": "HealthStatusBased",
            "script": "{\"level\":\"CRITICAL\",\"observationTime\":\"PT30S\",\"incrementalWeight\":true,\"voteWeight\":0.5}",
        }))
        .unwrap();
        let Some(ScalingPolicy::HealthStatus(policy)) = &s.policy_object else {
            panic!("expected health-status policy");
        };
        assert_eq!(policy.level, HealthLevel::Critical);
        assert_eq!(policy.weight.observation_time, 30_000);
        assert!(policy.weight.incremental_weight);
    }

    #[test]
    fn empty_checker_script_is_not_an_error() {
        let s = Scriptlet::from_json(&json!({
            "language": "ColoredAttributeChecker",
            "script": "",
        }))
        .unwrap();
        let checker = s.object.unwrap();
        assert!(checker.green.is_none());
        assert!(checker.yellow.is_none());
    }

    #[test]
    fn unknown_language_fails() {
        let err = Scriptlet::from_json(&json!({ "language": "Unknown", "script": "" })).unwrap_err();
        assert!(matches!(err, ModelError::UnrecognizedLanguage(l) if l == "Unknown"));
    }

    #[test]
    fn unknown_predicate_type_fails() {
        let err = Scriptlet::from_json(&json!({
            "language": "ColoredAttributeChecker",
            "script": "{\"green\":{\"@type\":\"between\"}}",
        }))
        .unwrap_err();
        assert!(matches!(err, ModelError::UnrecognizedVariant(_)));
    }

    #[test]
    fn to_json_rewrites_script_from_payload() {
        let mut s = Scriptlet::policy(metric_policy());
        s.script = "stale".to_string();

        let json = s.to_json().unwrap();
        assert_eq!(json["language"], "MetricBased");
        assert_eq!(json["url"], "false");
        assert_ne!(s.script, "stale");
        assert_eq!(json["script"], s.script.as_str());

        let script: Value = serde_json::from_str(&s.script).unwrap();
        assert_eq!(script["operationalRange"], "[0‥80)");
        assert_eq!(script["observationTime"], "PT5S");
    }

    #[test]
    fn to_json_is_idempotent() {
        let mut s = Scriptlet::checker(ColoredAttributeChecker::new(
            ColoredAttributePredicate::comparator(ComparisonOperator::LessThan, 50.0),
            ColoredAttributePredicate::constant(false),
        ));
        let first = s.to_json().unwrap();
        let second = s.to_json().unwrap();
        assert_eq!(first["script"], second["script"]);
    }

    #[test]
    fn to_json_requires_payload() {
        let mut s = Scriptlet::default();
        s.language = Language::HealthStatusBased;
        assert!(matches!(s.to_json(), Err(ModelError::MissingStructuredPayload(_))));

        // A payload of the other policy kind does not count.
        s.policy_object = Some(metric_policy().into());
        assert!(matches!(s.to_json(), Err(ModelError::MissingStructuredPayload(_))));
        assert!(s.validate().is_err());
    }

    #[test]
    fn structured_payload_survives_roundtrip() {
        let mut original = Scriptlet::policy(metric_policy());
        let decoded = Scriptlet::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(decoded.policy_object, original.policy_object);

        let mut original = Scriptlet::checker(ColoredAttributeChecker::new(
            ColoredAttributePredicate::in_range(0.0, 10.0, true, true),
            ColoredAttributePredicate::comparator(ComparisonOperator::GreaterThan, 10.0),
        ));
        let decoded = Scriptlet::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(decoded.object, original.object);
    }

    #[test]
    fn set_language_swaps_payloads() {
        let mut s = Scriptlet::policy(metric_policy());
        s.set_language(Language::MetricBased);
        assert_eq!(s.policy_object, Some(metric_policy().into()));

        s.set_language(Language::HealthStatusBased);
        assert!(matches!(s.policy_object, Some(ScalingPolicy::HealthStatus(_))));

        s.set_language(Language::ColoredAttributeChecker);
        assert!(s.policy_object.is_none());
        assert!(s.object.is_some());

        s.set_language(Language::Groovy);
        assert!(s.object.is_none() && s.policy_object.is_none());
    }
}
