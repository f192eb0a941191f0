//! watchgrid-model — in-memory watcher configuration model.
//!
//! A *watcher* (autoscaling supervisor) owns a set of attribute checkers,
//! a trigger and a set of scaling policies. Each of these is a
//! [`Scriptlet`]: either opaque user script text (Groovy, JavaScript) or a
//! strongly-typed structured object that is carried JSON-encoded inside the
//! scriptlet's `script` field on the wire.
//!
//! # Wire shape
//!
//! ```text
//! {
//!   "parameters":       { "$strategy$": "most", ... },
//!   "attributeCheckers": { "<attribute>": <scriptlet>, ... },
//!   "scalingPolicies":   { "<policy>":    <scriptlet>, ... },
//!   "trigger":           <scriptlet>,
//!   "type": "...", "autoScaling": true, "cooldownTime": "PT30S", ...
//! }
//!
//! <scriptlet> = { "language": "MetricBased", "script": "{...}", "url": "false",
//!                 "parameters": { ... } }
//! ```
//!
//! Everything here is synchronous and free of I/O; fetching and persisting
//! watchers belongs to `watchgrid-session`.

pub mod duration;
pub mod entity;
pub mod error;
pub mod policy;
pub mod predicate;
pub mod range;
pub mod scriptlet;
pub mod watcher;

pub use entity::Entity;
pub use error::{ModelError, ModelResult};
pub use policy::{
    Aggregation, AttributeBasedScalingPolicy, HealthLevel, HealthStatusBasedScalingPolicy,
    PolicyWeight, ScalingPolicy,
};
pub use predicate::{
    AttributeColor, ColoredAttributeChecker, ColoredAttributePredicate, ComparisonOperator,
    ConstantAttributePredicate, IsInRangePredicate, NumberComparatorPredicate,
};
pub use range::OpRange;
pub use scriptlet::{Language, Scriptlet};
pub use watcher::{Watcher, VotingStrategy, parse_watchers};
