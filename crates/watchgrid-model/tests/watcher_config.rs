//! End-to-end decoding and encoding of a watcher configuration document.

use serde_json::{Value, json};

use watchgrid_model::*;

fn config_document() -> Value {
    json!({
        "web-tier": {
            "parameters": { "$strategy$": "most", "owner": "ops" },
            "type": "MetricWatcher",
            "autoScaling": true,
            "cooldownTime": "PT2M",
            "scalingSize": 1,
            "minClusterSize": 2,
            "maxClusterSize": 6,
            "connectionStringTemplate": "http://{host}:8080",
            "trigger": { "language": "Groovy", "script": "return votes > 1", "url": "false" },
            "attributeCheckers": {
                "cpu": {
                    "language": "ColoredAttributeChecker",
                    "script": "{\"green\":{\"@type\":\"comparator\",\"operator\":\"LESS_THAN\",\"value\":70},\"yellow\":{\"@type\":\"isInRange\",\"rangeStart\":70,\"rangeEnd\":90,\"isRangeStartInclusive\":true,\"isRangeEndInclusive\":false}}",
                    "url": "false"
                },
                "latency": {
                    "language": "Groovy",
                    "script": "https://scripts.example.com/latency.groovy",
                    "url": "true"
                }
            },
            "scalingPolicies": {
                "cpu-high": {
                    "language": "MetricBased",
                    "script": "{\"attributeName\":\"cpu\",\"aggregation\":\"MAX\",\"operationalRange\":\"[0‥80)\",\"voteWeight\":1,\"incrementalWeight\":false,\"observationTime\":\"PT5S\",\"analysisDepth\":\"PT60S\"}"
                },
                "health": {
                    "language": "HealthStatusBased",
                    "script": "{\"level\":\"SEVERE\",\"observationTime\":\"PT10S\",\"incrementalWeight\":false,\"voteWeight\":3}"
                },
                "custom": {
                    "language": "Groovy",
                    "script": "vote(1)"
                }
            }
        }
    })
}

#[test]
fn decodes_full_document() {
    let watchers = parse_watchers(&config_document()).unwrap();
    let web = &watchers["web-tier"];

    assert_eq!(web.voting_strategy, VotingStrategy::Most);
    assert_eq!(web.cooldown_time, 120_000);
    assert_eq!((web.min_cluster_size, web.max_cluster_size), (2, 6));
    assert_eq!(web.checkers_count(), 2);
    assert_eq!(web.policies_count(), 3);
    assert_eq!(web.checker_type_for_attribute_name("cpu"), "ColoredAttributeChecker");
    assert!(web.attribute_checkers["latency"].is_url);

    let checker = web.attribute_checkers["cpu"].object.as_ref().unwrap();
    assert_eq!(checker.green.as_ref().unwrap().represent(), "value < 70");
    assert_eq!(checker.yellow.as_ref().unwrap().represent(), "90 > value ≥ 70");
    assert_eq!(checker.classify(75.0), AttributeColor::Yellow);
}

#[test]
fn most_strategy_normalizes_structured_policies() {
    let mut watchers = parse_watchers(&config_document()).unwrap();
    let web = watchers.get_mut("web-tier").unwrap();
    web.recalculate_votes();

    for name in ["cpu-high", "health"] {
        let weight = web.scaling_policies[name]
            .policy_object
            .as_ref()
            .unwrap()
            .weight()
            .vote_weight;
        assert_eq!(weight, 1.0, "{name}");
    }
    assert!(web.scaling_policies["custom"].policy_object.is_none());
}

#[test]
fn encode_then_decode_preserves_payloads() {
    let mut watchers = parse_watchers(&config_document()).unwrap();
    let web = watchers.get_mut("web-tier").unwrap();

    let encoded = web.to_json().unwrap();
    let again = web.to_json().unwrap();
    assert_eq!(encoded, again);
    assert_eq!(encoded["parameters"]["$strategy$"], "most");
    assert_eq!(encoded["cooldownTime"], "PT2M");

    let decoded = Watcher::from_json("web-tier", &encoded).unwrap();
    for (name, policy) in &web.scaling_policies {
        assert_eq!(decoded.scaling_policies[name].policy_object, policy.policy_object);
    }
    for (name, checker) in &web.attribute_checkers {
        assert_eq!(decoded.attribute_checkers[name].object, checker.object);
        assert_eq!(decoded.attribute_checkers[name].is_url, checker.is_url);
    }
    assert_eq!(decoded.trigger.script, "return votes > 1");
}

#[test]
fn invalid_entry_fails_whole_document() {
    let mut doc = config_document();
    doc["web-tier"]["scalingPolicies"]["bad"] = json!({ "language": "Python", "script": "" });

    let err = parse_watchers(&doc).unwrap_err();
    assert!(matches!(err, ModelError::UnrecognizedLanguage(l) if l == "Python"));
}

#[test]
fn malformed_range_in_policy_is_reported() {
    let err = Scriptlet::from_json(&json!({
        "language": "MetricBased",
        "script": "{\"attributeName\":\"cpu\",\"operationalRange\":\"0 to 80\"}",
    }))
    .unwrap_err();
    assert!(matches!(err, ModelError::Format(text) if text == "0 to 80"));
}
