use anyhow::{Context, bail};
use tracing::{debug, info};
use watchgrid_model::{
    AttributeColor, ColoredAttributePredicate, OpRange, ScalingPolicy, Scriptlet, VotingStrategy, Watcher,
    duration::format_iso8601,
};
use watchgrid_session::{FileEndpoint, WatcherConsole};

async fn load(endpoint: &FileEndpoint) -> anyhow::Result<WatcherConsole> {
    let console = WatcherConsole::load(endpoint).await?;
    debug!(
        store = %endpoint.path().display(),
        watchers = console.saved().len(),
        "watchers loaded"
    );
    Ok(console)
}

pub async fn list(endpoint: &FileEndpoint) -> anyhow::Result<()> {
    let console = load(endpoint).await?;
    if console.saved().is_empty() {
        println!("no watchers in {}", endpoint.path().display());
        return Ok(());
    }
    for (name, watcher) in console.saved() {
        println!(
            "{name:<24} {:<20} strategy={:<6} checkers={} policies={} autoscaling={}",
            watcher.kind,
            watcher.voting_strategy,
            watcher.checkers_count(),
            watcher.policies_count(),
            watcher.auto_scaling,
        );
    }
    Ok(())
}

pub async fn show(endpoint: &FileEndpoint, name: &str, json: bool) -> anyhow::Result<()> {
    let console = load(endpoint).await?;
    let watcher = console
        .watcher(name)
        .with_context(|| format!("watcher {name} not found"))?;
    if json {
        let mut watcher = watcher.clone();
        println!("{}", serde_json::to_string_pretty(&watcher.to_json()?)?);
    } else {
        print!("{}", describe(watcher));
    }
    Ok(())
}

fn describe(watcher: &Watcher) -> String {
    let mut out = format!("{} ({})\n", watcher.name(), watcher.kind);
    out.push_str(&format!("  voting strategy: {}\n", watcher.voting_strategy));
    if watcher.auto_scaling {
        out.push_str(&format!(
            "  autoscaling: size {}..{} step {} cooldown {}\n",
            watcher.min_cluster_size,
            watcher.max_cluster_size,
            watcher.scaling_size,
            format_iso8601(watcher.cooldown_time),
        ));
    } else {
        out.push_str("  autoscaling: off\n");
    }
    if !watcher.connection_string_template.is_empty() {
        out.push_str(&format!("  connection: {}\n", watcher.connection_string_template));
    }
    for (key, value) in watcher.entity.parameters() {
        out.push_str(&format!("  param {key} = {value}\n"));
    }

    out.push_str(&format!("  trigger: {}\n", scriptlet_summary(&watcher.trigger)));

    out.push_str(&format!("  checkers ({}):\n", watcher.checkers_count()));
    for (attribute, checker) in &watcher.attribute_checkers {
        match &checker.object {
            Some(colored) => {
                let render = |p: &Option<ColoredAttributePredicate>| {
                    p.as_ref().map_or("-".to_string(), ColoredAttributePredicate::represent)
                };
                out.push_str(&format!(
                    "    {attribute}: green [{}] yellow [{}]\n",
                    render(&colored.green),
                    render(&colored.yellow),
                ));
            }
            None => out.push_str(&format!("    {attribute}: {}\n", scriptlet_summary(checker))),
        }
    }

    out.push_str(&format!("  policies ({}):\n", watcher.policies_count()));
    for (name, policy) in &watcher.scaling_policies {
        let line = match &policy.policy_object {
            Some(ScalingPolicy::AttributeBased(p)) => format!(
                "{} {:?} in {} over {} (weight {}, observe {})",
                p.attribute_name,
                p.aggregation,
                p.operational_range,
                format_iso8601(p.analysis_depth),
                p.weight.vote_weight,
                format_iso8601(p.weight.observation_time),
            ),
            Some(ScalingPolicy::HealthStatus(p)) => format!(
                "health {:?} (weight {}, observe {})",
                p.level,
                p.weight.vote_weight,
                format_iso8601(p.weight.observation_time),
            ),
            None => scriptlet_summary(policy),
        };
        out.push_str(&format!("    {name}: {line}\n"));
    }
    out
}

fn scriptlet_summary(scriptlet: &Scriptlet) -> String {
    let first_line = scriptlet.script.lines().next().unwrap_or_default();
    if scriptlet.is_url {
        format!("{} from {}", scriptlet.language, first_line)
    } else {
        format!("{} `{}`", scriptlet.language, first_line)
    }
}

pub async fn validate(endpoint: &FileEndpoint) -> anyhow::Result<()> {
    let console = load(endpoint).await?;
    let mut failures = 0;
    for (name, watcher) in console.saved() {
        match watcher.validate() {
            Ok(()) => println!("✓ {name}"),
            Err(e) => {
                failures += 1;
                println!("✗ {name}: {e}");
            }
        }
    }
    if failures > 0 {
        bail!("{failures} invalid watcher(s)");
    }
    Ok(())
}

pub async fn create(
    endpoint: &FileEndpoint,
    name: &str,
    kind: Option<String>,
    default_strategy: &str,
) -> anyhow::Result<()> {
    let strategy: VotingStrategy = default_strategy.parse()?;
    let mut console = load(endpoint).await?;
    if console.watcher(name).is_some() {
        bail!("watcher {name} already exists");
    }

    let draft = console.begin_new(name)?;
    draft.kind = kind.unwrap_or_default();
    draft.voting_strategy = strategy;
    console.save(endpoint).await?;
    info!(watcher = %name, %strategy, "watcher created");
    println!("✓ Created {name}");
    Ok(())
}

pub async fn set_strategy(endpoint: &FileEndpoint, name: &str, strategy: &str) -> anyhow::Result<()> {
    let strategy: VotingStrategy = strategy.parse()?;
    let mut console = load(endpoint).await?;

    console.begin_edit(name)?.set_voting_strategy(strategy);
    console.save(endpoint).await?;
    info!(watcher = %name, %strategy, "voting strategy saved");
    println!("✓ {name} now votes with strategy {strategy}");
    Ok(())
}

pub async fn set_range(
    endpoint: &FileEndpoint,
    name: &str,
    policy: &str,
    range: &str,
) -> anyhow::Result<()> {
    let range = OpRange::parse(range)?;
    let mut console = load(endpoint).await?;

    let draft = console.begin_edit(name)?;
    match draft
        .scaling_policies
        .get_mut(policy)
        .and_then(|s| s.policy_object.as_mut())
    {
        Some(ScalingPolicy::AttributeBased(p)) => p.operational_range = range,
        Some(_) => bail!("policy {policy} is not metric-based"),
        None => bail!("watcher {name} has no structured policy {policy}"),
    }
    console.save(endpoint).await?;
    info!(watcher = %name, %policy, %range, "operational range saved");
    println!("✓ {name}/{policy} range set to {range}");
    Ok(())
}

pub async fn recommend(endpoint: &FileEndpoint, name: &str, policy: &str) -> anyhow::Result<()> {
    let mut console = load(endpoint).await?;
    console.begin_edit(name)?;
    let range = console.recommend_range(endpoint, policy).await?;
    console.save(endpoint).await?;
    info!(watcher = %name, %policy, %range, "recommended range saved");
    println!("✓ {name}/{policy} range set to recommended {range}");
    Ok(())
}

pub async fn delete(endpoint: &FileEndpoint, name: &str) -> anyhow::Result<()> {
    let mut console = load(endpoint).await?;
    console.delete(name, endpoint).await?;
    info!(watcher = %name, store = %endpoint.path().display(), "watcher deleted");
    println!("✓ Deleted {name}");
    Ok(())
}

/// Color a sample value with a watcher's structured attribute checker.
pub async fn classify(
    endpoint: &FileEndpoint,
    name: &str,
    attribute: &str,
    value: f64,
) -> anyhow::Result<()> {
    let console = load(endpoint).await?;
    let watcher = console
        .watcher(name)
        .with_context(|| format!("watcher {name} not found"))?;
    let color = classify_attribute(watcher, attribute, value)?;
    println!("{name}/{attribute} {value} → {color}");
    Ok(())
}

fn classify_attribute(
    watcher: &Watcher,
    attribute: &str,
    value: f64,
) -> anyhow::Result<AttributeColor> {
    let Some(checker) = watcher.attribute_checkers.get(attribute) else {
        bail!("watcher {} has no checker for {attribute}", watcher.name());
    };
    let Some(colored) = &checker.object else {
        bail!(
            "{attribute} is checked by a {} script, not a colored checker",
            checker.language
        );
    };
    let color = colored.classify(value);
    debug!(watcher = %watcher.name(), %attribute, value, %color, "attribute classified");
    Ok(color)
}

pub async fn catalog(endpoint: &FileEndpoint) -> anyhow::Result<()> {
    let types = WatcherConsole::supervisor_types(endpoint).await?;
    let attributes = WatcherConsole::component_attributes(endpoint).await?;

    println!("supervisor types:");
    for kind in &types {
        println!("  {kind}");
    }
    println!("component attributes:");
    for (component, names) in &attributes {
        println!("  {component}: {}", names.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchgrid_model::{
        AttributeBasedScalingPolicy, ColoredAttributeChecker, ComparisonOperator, Language,
    };

    #[test]
    fn describe_renders_predicates_and_policies() {
        let mut watcher = Watcher::new("web");
        watcher.kind = "MetricWatcher".to_string();
        watcher.put_checker(
            "cpu",
            Scriptlet::checker(ColoredAttributeChecker::new(
                ColoredAttributePredicate::comparator(ComparisonOperator::LessThan, 70.0),
                ColoredAttributePredicate::in_range(70.0, 90.0, true, false),
            )),
        );
        watcher.put_checker("disk", Scriptlet::url(Language::Groovy, "https://x/disk.groovy"));
        watcher.put_policy(
            "cpu-high",
            Scriptlet::policy(AttributeBasedScalingPolicy {
                attribute_name: "cpu".to_string(),
                operational_range: OpRange::new(0.0, 80.0, true, false),
                ..Default::default()
            }),
        );

        let text = describe(&watcher);
        assert!(text.contains("cpu: green [value < 70] yellow [90 > value ≥ 70]"));
        assert!(text.contains("disk: Groovy from https://x/disk.groovy"));
        assert!(text.contains("cpu-high: cpu Max in [0‥80)"));
        assert!(text.contains("autoscaling: off"));
    }

    #[test]
    fn classify_colors_by_first_matching_predicate() {
        let mut watcher = Watcher::new("web");
        watcher.put_checker(
            "cpu",
            Scriptlet::checker(ColoredAttributeChecker::new(
                ColoredAttributePredicate::comparator(ComparisonOperator::LessThan, 70.0),
                ColoredAttributePredicate::in_range(70.0, 90.0, true, false),
            )),
        );
        watcher.put_checker("disk", Scriptlet::script(Language::Groovy, "true"));

        assert_eq!(classify_attribute(&watcher, "cpu", 12.0).unwrap(), AttributeColor::Green);
        assert_eq!(classify_attribute(&watcher, "cpu", 70.0).unwrap(), AttributeColor::Yellow);
        assert_eq!(classify_attribute(&watcher, "cpu", 90.0).unwrap(), AttributeColor::Red);
        assert!(classify_attribute(&watcher, "disk", 1.0).is_err());
        assert!(classify_attribute(&watcher, "mem", 1.0).is_err());
    }

    #[tokio::test]
    async fn create_then_set_range() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = FileEndpoint::new(dir.path().join("watchers.json"));

        create(&endpoint, "web", Some("MetricWatcher".to_string()), "most")
            .await
            .unwrap();
        assert!(create(&endpoint, "web", None, "all").await.is_err());

        let mut console = WatcherConsole::load(&endpoint).await.unwrap();
        console
            .begin_edit("web")
            .unwrap()
            .put_policy("cpu", Scriptlet::policy(AttributeBasedScalingPolicy::default()));
        console.save(&endpoint).await.unwrap();

        set_range(&endpoint, "web", "cpu", "[5‥50]").await.unwrap();
        assert!(set_range(&endpoint, "web", "mem", "[5‥50]").await.is_err());

        let console = WatcherConsole::load(&endpoint).await.unwrap();
        let web = console.watcher("web").unwrap();
        assert_eq!(web.voting_strategy, VotingStrategy::Most);
        let Some(ScalingPolicy::AttributeBased(p)) = &web.scaling_policies["cpu"].policy_object
        else {
            panic!("expected metric policy");
        };
        assert_eq!(p.operational_range, OpRange::new(5.0, 50.0, true, true));
    }
}
