//! Process-wide plugin registry.
//!
//! Rust has no load-time decorator magic, so registration is an explicit
//! `register_all()` call made once from the binary's startup path, rather
//! than the source's import-time auto-registration.

use crate::plugin::ScraperPlugin;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

type Constructor = fn() -> Box<dyn ScraperPlugin>;

static REGISTRY: Lazy<RwLock<HashMap<&'static str, Constructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

pub struct ScraperRegistry;

impl ScraperRegistry {
    pub fn register(name: &'static str, constructor: Constructor) {
        REGISTRY.write().expect("registry poisoned").insert(name, constructor);
    }

    /// A fresh plugin instance per call — no shared state across scrapes.
    pub fn get(name: &str) -> Option<Box<dyn ScraperPlugin>> {
        REGISTRY
            .read()
            .expect("registry poisoned")
            .get(name)
            .map(|constructor| constructor())
    }

    pub fn registered_names() -> Vec<&'static str> {
        let mut names: Vec<_> = REGISTRY.read().expect("registry poisoned").keys().copied().collect();
        names.sort();
        names
    }
}

/// Register all ten built-in plugins. Called once from the host binary.
pub fn register_all() {
    ScraperRegistry::register("hackernews", || Box::new(crate::hackernews::HackerNewsPlugin));
    ScraperRegistry::register("reddit", || Box::new(crate::reddit::RedditPlugin::new()));
    ScraperRegistry::register("devto", || Box::new(crate::devto::DevToPlugin));
    ScraperRegistry::register("arxiv", || Box::new(crate::arxiv::ArxivPlugin));
    ScraperRegistry::register("official_blogs", || Box::new(crate::official_blogs::OfficialBlogsPlugin));
    ScraperRegistry::register("github_trending", || Box::new(crate::github_trending::GitHubTrendingPlugin));
    ScraperRegistry::register("medium", || Box::new(crate::medium::MediumPlugin));
    ScraperRegistry::register("twitter", || Box::new(crate::twitter_nitter::TwitterNitterPlugin::new()));
    ScraperRegistry::register("youtube_rss", || Box::new(crate::youtube_rss::YouTubeRssPlugin));
    ScraperRegistry::register("youtube_trending", || Box::new(crate::youtube_trending::YouTubeTrendingPlugin));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_is_idempotent_and_covers_all_ten() {
        register_all();
        register_all();
        let names = ScraperRegistry::registered_names();
        assert_eq!(names.len(), 10);
        assert!(names.contains(&"hackernews"));
        assert!(names.contains(&"youtube_trending"));
    }

    #[test]
    fn get_returns_none_for_unknown_plugin() {
        assert!(ScraperRegistry::get("does-not-exist").is_none());
    }

    #[test]
    fn get_returns_a_fresh_instance_each_call() {
        register_all();
        let a = ScraperRegistry::get("hackernews").unwrap();
        let b = ScraperRegistry::get("hackernews").unwrap();
        assert_eq!(a.name(), b.name());
    }
}
