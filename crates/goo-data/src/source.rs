//! Where a pusher's rules come from, and the fail-closed cache around them.

use crate::loader::load_optional;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Inline rules, or `{base_name}.{ron,json,toml}` in a config directory.
#[derive(Debug, Clone)]
pub enum Source<T> {
    Inline(T),
    File {
        dir: PathBuf,
        base_name: &'static str,
    },
}

impl<T> Source<T> {
    /// Where the rules live, for diagnostics.
    pub fn location(&self) -> PathBuf {
        match self {
            Source::Inline(_) => PathBuf::from("<inline>"),
            Source::File { dir, base_name } => dir.join(base_name),
        }
    }
}

/// A [`Source`] plus whatever was last loaded from it.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    source: Source<T>,
    current: Option<T>,
    /// Message of the most recent failed load, cleared by a success.
    last_error: Option<String>,
}

impl<T: DeserializeOwned + Default + Clone> Cached<T> {
    pub fn new(source: Source<T>) -> Self {
        Self {
            source,
            current: None,
            last_error: None,
        }
    }

    /// Load when nothing is cached or `reload` is set. A failed load leaves
    /// the cache empty, so the pusher contributes nothing until a later call
    /// succeeds. The same failure is warned about once, then only at debug.
    /// Returns whether fresh rules were loaded.
    pub fn refresh(&mut self, pusher: &str, reload: bool) -> bool {
        if self.current.is_some() && !reload {
            return false;
        }
        let loaded = match &self.source {
            Source::Inline(rules) => Ok(rules.clone()),
            Source::File { dir, base_name } => load_optional(dir, base_name),
        };
        match loaded {
            Ok(rules) => {
                self.current = Some(rules);
                self.last_error = None;
                true
            }
            Err(err) => {
                let message = err.to_string();
                if self.last_error.as_deref() == Some(message.as_str()) {
                    tracing::debug!(
                        target: "pusher",
                        pusher,
                        error = %message,
                        "rule_source_still_failing"
                    );
                } else {
                    tracing::warn!(
                        target: "pusher",
                        pusher,
                        error = %message,
                        "rule_source_failed"
                    );
                }
                self.current = None;
                self.last_error = Some(message);
                false
            }
        }
    }

    /// The error from the most recent load, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn source(&self) -> &Source<T> {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DenyList;
    use goo_core::test_utils::scratch_dir;

    #[test]
    fn inline_source_is_always_available() {
        let list = DenyList {
            denied: vec!["minecraft:air".to_string()],
        };
        let mut cached = Cached::new(Source::Inline(list.clone()));
        assert!(cached.current().is_none());
        assert!(cached.refresh("test", false));
        assert!(!cached.refresh("test", false));
        assert_eq!(cached.current(), Some(&list));
    }

    #[test]
    fn broken_file_fails_closed_then_recovers() {
        let dir = scratch_dir("source_recover");
        std::fs::write(dir.join("denied.json"), "not json").unwrap();
        let mut cached: Cached<DenyList> = Cached::new(Source::File {
            dir: dir.clone(),
            base_name: "denied",
        });

        assert!(!cached.refresh("test", false));
        assert!(cached.current().is_none());
        let first = cached.last_error().map(str::to_string);
        assert!(first.is_some());

        // Retried on every call, but remembered as the same failure.
        assert!(!cached.refresh("test", false));
        assert_eq!(cached.last_error().map(str::to_string), first);

        std::fs::write(dir.join("denied.json"), r#"{"denied": ["goo:x"]}"#).unwrap();
        assert!(cached.refresh("test", false));
        assert_eq!(cached.current().unwrap().denied, vec!["goo:x".to_string()]);
        assert!(cached.last_error().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn cached_file_is_not_reread_without_reload() {
        let dir = scratch_dir("source_cache");
        std::fs::write(dir.join("denied.json"), r#"{"denied": ["goo:a"]}"#).unwrap();
        let mut cached: Cached<DenyList> = Cached::new(Source::File {
            dir: dir.clone(),
            base_name: "denied",
        });
        cached.refresh("test", false);

        std::fs::write(dir.join("denied.json"), r#"{"denied": ["goo:b"]}"#).unwrap();
        cached.refresh("test", false);
        assert_eq!(cached.current().unwrap().denied, vec!["goo:a".to_string()]);

        cached.refresh("test", true);
        assert_eq!(cached.current().unwrap().denied, vec!["goo:b".to_string()]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
