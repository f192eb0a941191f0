pub mod range;
pub mod watcher;
