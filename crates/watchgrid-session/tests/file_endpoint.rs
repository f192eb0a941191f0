//! FileEndpoint behaviour against a real directory.

use serde_json::json;
use tempfile::TempDir;

use watchgrid_model::{
    AttributeBasedScalingPolicy, HealthStatusBasedScalingPolicy, Scriptlet, ScalingPolicy,
    VotingStrategy,
};
use watchgrid_session::{ConfigEndpoint, FileEndpoint, SessionError, WatcherConsole};

fn endpoint(dir: &TempDir) -> FileEndpoint {
    FileEndpoint::new(dir.path().join("watchers.json"))
}

#[tokio::test]
async fn missing_document_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    let endpoint = endpoint(&dir);

    assert_eq!(endpoint.fetch_watchers().await.unwrap(), json!({}));
    assert!(endpoint.supervisor_types().await.unwrap().is_empty());
    assert!(endpoint.recommend_range("web", "cpu").await.is_err());
}

#[tokio::test]
async fn saved_watcher_survives_reload() {
    let dir = TempDir::new().unwrap();
    let endpoint = endpoint(&dir);

    let mut console = WatcherConsole::load(&endpoint).await.unwrap();
    let draft = console.begin_new("web").unwrap();
    draft.kind = "MetricWatcher".to_string();
    draft.auto_scaling = true;
    draft.min_cluster_size = 1;
    draft.max_cluster_size = 3;
    draft.cooldown_time = 45_000;
    draft.put_policy("cpu", Scriptlet::policy(AttributeBasedScalingPolicy::default()));
    draft.put_policy("health", Scriptlet::policy(HealthStatusBasedScalingPolicy::default()));
    draft.set_voting_strategy(VotingStrategy::All);
    console.save(&endpoint).await.unwrap();

    let reloaded = WatcherConsole::load(&endpoint).await.unwrap();
    let web = reloaded.watcher("web").unwrap();
    assert_eq!(web.cooldown_time, 45_000);
    assert_eq!(web.voting_strategy, VotingStrategy::All);
    assert!(matches!(
        web.scaling_policies["health"].policy_object,
        Some(ScalingPolicy::HealthStatus(_))
    ));
    for policy in web.scaling_policies.values() {
        let weight = policy.policy_object.as_ref().unwrap().weight().vote_weight;
        assert_eq!(weight, 0.5 + f64::EPSILON);
    }
}

#[tokio::test]
async fn delete_unknown_watcher_fails() {
    let dir = TempDir::new().unwrap();
    let endpoint = endpoint(&dir);

    endpoint.put_watcher("web", json!({ "type": "A" })).await.unwrap();
    assert!(endpoint.delete_watcher("db").await.is_err());
    endpoint.delete_watcher("web").await.unwrap();
    assert_eq!(endpoint.fetch_watchers().await.unwrap(), json!({}));
}

#[tokio::test]
async fn catalog_feeds_recommendations() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("catalog.json");
    std::fs::write(
        &catalog,
        json!({
            "types": ["MetricWatcher", "HealthWatcher"],
            "attributes": { "web": ["cpu", "latency"] },
            "recommendations": { "web/cpu": "(-∞‥70]" }
        })
        .to_string(),
    )
    .unwrap();
    let endpoint = endpoint(&dir).with_catalog(&catalog);

    assert_eq!(endpoint.supervisor_types().await.unwrap().len(), 2);
    assert_eq!(
        endpoint.component_attributes().await.unwrap()["web"],
        vec!["cpu".to_string(), "latency".to_string()]
    );

    let mut console = WatcherConsole::load(&endpoint).await.unwrap();
    console
        .begin_new("web")
        .unwrap()
        .put_policy("cpu", Scriptlet::policy(AttributeBasedScalingPolicy::default()));
    let range = console.recommend_range(&endpoint, "cpu").await.unwrap();
    assert!(range.is_begin_infinite);
    assert_eq!(range.end, 70.0);
    assert!(range.is_end_including);

    assert!(matches!(
        console.recommend_range(&endpoint, "mem").await,
        Err(SessionError::NotFound(_))
    ));
}

#[tokio::test]
async fn corrupt_document_is_reported() {
    let dir = TempDir::new().unwrap();
    let endpoint = endpoint(&dir);
    std::fs::write(endpoint.path(), "[1, 2]").unwrap();

    assert!(matches!(
        WatcherConsole::load(&endpoint).await,
        Err(SessionError::Endpoint(_))
    ));
}
