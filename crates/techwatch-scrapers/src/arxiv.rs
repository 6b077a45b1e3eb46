//! arXiv via the public Atom API, scoped to AI/ML categories.

use crate::plugin::{ScrapeConfig, ScraperPlugin};
use crate::{PluginError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use techwatch_core::{NormalizedItem, ScoredKeyword};
use techwatch_http::{HttpClientConfig, HttpError, RateLimiter, create_client, with_retry};

const BASE_URL: &str = "https://export.arxiv.org/api/query";
const CATEGORIES: &[&str] = &["cs.AI", "cs.CL", "cs.LG", "cs.MA"];

pub struct ArxivPlugin;

impl ArxivPlugin {
    fn build_query(keywords: &[String]) -> String {
        let cat_query = CATEGORIES.iter().map(|c| format!("cat:{c}")).collect::<Vec<_>>().join(" OR ");
        if keywords.is_empty() {
            format!("({cat_query})")
        } else {
            let kw_query = keywords
                .iter()
                .map(|k| format!("all:{}", urlencoding::encode(k)))
                .collect::<Vec<_>>()
                .join(" OR ");
            format!("({cat_query}) AND ({kw_query})")
        }
    }

    async fn fetch(client: &reqwest::Client, keywords: &[String], max_results: usize) -> Result<String> {
        let query = Self::build_query(keywords);
        let max_results = max_results.to_string();

        let resp = with_retry(3, || async {
            client
                .get(BASE_URL)
                .query(&[
                    ("search_query", query.as_str()),
                    ("max_results", max_results.as_str()),
                    ("sortBy", "submittedDate"),
                    ("sortOrder", "descending"),
                ])
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;

        resp.text().await.map_err(|e| PluginError::Parse(e.to_string()))
    }

    /// Parses the Atom response into items, tolerating malformed individual
    /// entries the way the upstream plugin does — one bad `<entry>` never
    /// aborts the rest of the feed.
    fn parse_entries(xml: &str) -> Vec<NormalizedItem> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut items = Vec::new();

        let mut in_entry = false;
        let mut tag_stack: Vec<String> = Vec::new();

        let mut title = String::new();
        let mut id_text = String::new();
        let mut alt_link: Option<String> = None;
        let mut summary = String::new();
        let mut authors: Vec<String> = Vec::new();
        let mut current_author_name = String::new();
        let mut published = String::new();
        let mut primary_category: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let local = local_name(&e.name().into_inner());
                    if local == "entry" {
                        in_entry = true;
                        title.clear();
                        id_text.clear();
                        alt_link = None;
                        summary.clear();
                        authors.clear();
                        published.clear();
                        primary_category = None;
                    }
                    if in_entry && local == "link" {
                        let mut is_alternate = false;
                        let mut href = None;
                        for attr in e.attributes().flatten() {
                            let key = local_name(attr.key.into_inner());
                            let value = attr.unescape_value().unwrap_or_default().to_string();
                            if key == "rel" && value == "alternate" {
                                is_alternate = true;
                            }
                            if key == "href" {
                                href = Some(value);
                            }
                        }
                        if is_alternate {
                            alt_link = href;
                        }
                    }
                    if in_entry && local == "primary_category" {
                        for attr in e.attributes().flatten() {
                            if local_name(attr.key.into_inner()) == "term" {
                                primary_category = Some(attr.unescape_value().unwrap_or_default().to_string());
                            }
                        }
                    }
                    tag_stack.push(local);
                }
                Ok(Event::Text(t)) => {
                    if !in_entry {
                        continue;
                    }
                    let text = t.unescape().unwrap_or_default().to_string();
                    match tag_stack.last().map(String::as_str) {
                        Some("title") => title.push_str(&text),
                        Some("id") => id_text.push_str(&text),
                        Some("summary") => summary.push_str(&text),
                        Some("name") => current_author_name.push_str(&text),
                        Some("published") => published.push_str(&text),
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => {
                    let local = local_name(&e.name().into_inner());
                    if local == "name" && !current_author_name.trim().is_empty() {
                        authors.push(current_author_name.trim().to_string());
                        current_author_name.clear();
                    }
                    if local == "entry" {
                        in_entry = false;
                        if let Some(item) = Self::finish_entry(
                            &title,
                            &id_text,
                            alt_link.take(),
                            &summary,
                            &authors,
                            &published,
                            primary_category.take(),
                        ) {
                            items.push(item);
                        }
                    }
                    tag_stack.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "malformed arXiv entry, stopping parse");
                    break;
                }
                _ => {}
            }
        }

        items
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_entry(
        title: &str,
        id_text: &str,
        alt_link: Option<String>,
        summary: &str,
        authors: &[String],
        published: &str,
        primary_category: Option<String>,
    ) -> Option<NormalizedItem> {
        let title: String = title.split_whitespace().collect::<Vec<_>>().join(" ");
        if title.is_empty() || id_text.is_empty() {
            return None;
        }
        let arxiv_id = id_text.rsplit('/').next().unwrap_or(id_text).to_string();
        let url = alt_link.unwrap_or_else(|| id_text.to_string());
        let content = summary.split_whitespace().collect::<Vec<_>>().join(" ");

        let published_at = DateTime::parse_from_rfc3339(published.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let mut item = NormalizedItem::new(title, url, "arxiv");
        item.external_id = arxiv_id;
        item.content = if content.is_empty() { None } else { Some(content) };
        item.author = if authors.is_empty() { None } else { Some(authors.join(", ")) };
        item.published_at = published_at;
        item.tags = primary_category.into_iter().collect();
        Some(item)
    }
}

fn local_name(qname: &[u8]) -> String {
    let s = String::from_utf8_lossy(qname);
    s.rsplit(':').next().unwrap_or(&s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <entry>
    <id>https://arxiv.org/abs/2507.00001v1</id>
    <title>A Study of Rust Async Runtimes</title>
    <summary>We examine
    scheduling behavior.</summary>
    <published>2025-07-01T12:00:00Z</published>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <link href="https://arxiv.org/abs/2507.00001v1" rel="alternate"/>
    <arxiv:primary_category term="cs.LG"/>
  </entry>
  <entry>
    <id>https://arxiv.org/abs/2507.00002v1</id>
    <summary>Missing a title, should be dropped.</summary>
    <published>2025-07-02T00:00:00Z</published>
  </entry>
</feed>"#;

    #[test]
    fn build_query_without_keywords_is_category_only() {
        let query = ArxivPlugin::build_query(&[]);
        assert!(query.contains("cat:cs.AI"));
        assert!(!query.contains("all:"));
    }

    #[test]
    fn build_query_with_keywords_ands_categories_and_terms() {
        let query = ArxivPlugin::build_query(&["diffusion models".to_string()]);
        assert!(query.contains("cat:cs.CL"));
        assert!(query.contains("all:"));
        assert!(query.contains("AND"));
    }

    #[test]
    fn parse_entries_extracts_title_authors_and_category() {
        let items = ArxivPlugin::parse_entries(SAMPLE_FEED);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "A Study of Rust Async Runtimes");
        assert_eq!(item.external_id, "2507.00001v1");
        assert_eq!(item.author.as_deref(), Some("Ada Lovelace, Alan Turing"));
        assert_eq!(item.tags, vec!["cs.LG".to_string()]);
        assert_eq!(item.content.as_deref(), Some("We examine scheduling behavior."));
    }

    #[test]
    fn parse_entries_skips_entries_missing_a_title() {
        let items = ArxivPlugin::parse_entries(SAMPLE_FEED);
        assert!(items.iter().all(|i| i.external_id != "2507.00002v1"));
    }
}

#[async_trait]
impl ScraperPlugin for ArxivPlugin {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    fn display_name(&self) -> &'static str {
        "arXiv"
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let max_articles = config.max_articles;
        let client = create_client(&HttpClientConfig::default())?;
        let limiter = RateLimiter::new(30);

        let keywords = crate::plugin::keyword_strings(keywords);
        limiter.acquire().await;
        let xml = Self::fetch(&client, &keywords, max_articles).await?;

        let mut items = Self::parse_entries(&xml);
        items.truncate(max_articles);
        Ok(items)
    }
}
