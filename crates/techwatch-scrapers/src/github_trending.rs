//! GitHub Trending via HTML scraping of github.com/trending — no API key.

use crate::plugin::{ScrapeConfig, ScraperPlugin};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use scraper::{Html, Selector};
use techwatch_core::{NormalizedItem, ScoredKeyword};
use techwatch_http::{HttpClientConfig, HttpError, RateLimiter, create_client, with_retry};

const BASE_URL: &str = "https://github.com/trending";

pub struct GitHubTrendingPlugin;

impl GitHubTrendingPlugin {
    async fn fetch(client: &reqwest::Client, language: &str, since: &str) -> Result<String> {
        let mut url = BASE_URL.to_string();
        if !language.is_empty() {
            url.push('/');
            url.push_str(language);
        }

        let resp = with_retry(3, || async {
            client
                .get(&url)
                .query(&[("since", since)])
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;

        resp.text().await.map_err(HttpError::from).map_err(Into::into)
    }

    fn parse(html: &str, keywords: &[String]) -> Vec<NormalizedItem> {
        let document = Html::parse_document(html);
        let row_sel = Selector::parse("article.Box-row").unwrap();
        let name_sel = Selector::parse("h2 a").unwrap();
        let desc_sel = Selector::parse("p").unwrap();
        let lang_sel = Selector::parse("[itemprop=\"programmingLanguage\"]").unwrap();
        let stars_sel = Selector::parse("a[href$=\"/stargazers\"]").unwrap();
        let forks_sel = Selector::parse("a[href$=\"/forks\"]").unwrap();
        let today_sel = Selector::parse("span.d-inline-block.float-sm-right").unwrap();

        let mut items = Vec::new();

        for row in document.select(&row_sel) {
            let Some(name_el) = row.select(&name_sel).next() else { continue };
            let repo_path = name_el.value().attr("href").unwrap_or("").trim_matches('/').to_string();
            if repo_path.is_empty() {
                continue;
            }
            let repo_name = repo_path.replace('/', " / ");
            let repo_url = format!("https://github.com/{repo_path}");

            let description = row
                .select(&desc_sel)
                .next()
                .map(|d| d.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            let text_to_search = format!("{repo_name} {description}").to_lowercase();
            if !keywords.is_empty() && !keywords.iter().any(|k| text_to_search.contains(&k.to_lowercase())) {
                continue;
            }

            let language = row
                .select(&lang_sel)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
                .unwrap_or_else(|| "Unknown".to_string());

            let stars: i64 = row
                .select(&stars_sel)
                .next()
                .and_then(|e| e.text().collect::<String>().trim().replace(',', "").parse().ok())
                .unwrap_or(0);

            let forks: i64 = row
                .select(&forks_sel)
                .next()
                .and_then(|e| e.text().collect::<String>().trim().replace(',', "").parse().ok())
                .unwrap_or(0);

            let today_stars: i64 = row
                .select(&today_sel)
                .next()
                .and_then(|e| {
                    e.text()
                        .collect::<String>()
                        .trim()
                        .split_whitespace()
                        .next()
                        .map(|s| s.replace(',', ""))
                })
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);

            let mut tags = Vec::new();
            if language != "Unknown" {
                tags.push(language.clone());
            }
            if today_stars > 100 {
                tags.push("hot".to_string());
            }

            let title = if description.is_empty() {
                repo_name.clone()
            } else {
                format!("{repo_name} - {}", description.chars().take(100).collect::<String>())
            };

            let mut item = NormalizedItem::new(title, repo_url, "github_trending");
            item.external_id = repo_path.replace('/', "_");
            item.content = if description.is_empty() { None } else { Some(description) };
            item.author = repo_path.split('/').next().map(|s| s.to_string());
            item.published_at = Utc::now();
            item.tags = tags;
            item.upvotes = stars;
            item.comments_count = forks;
            items.push(item);
        }

        items
    }
}

#[async_trait]
impl ScraperPlugin for GitHubTrendingPlugin {
    fn name(&self) -> &'static str {
        "github_trending"
    }

    fn display_name(&self) -> &'static str {
        "GitHub Trending"
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let language = config.get_str("language").unwrap_or("").to_string();
        let since = config.get_str("since").unwrap_or("daily").to_string();
        let limiter = RateLimiter::new(30);
        let client = create_client(&HttpClientConfig::default())?;

        limiter.acquire().await;
        let html = Self::fetch(&client, &language, &since).await?;

        let keywords = crate::plugin::keyword_strings(keywords);
        let mut items = Self::parse(&html, &keywords);
        items.truncate(config.max_articles);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
    <html><body>
      <article class="Box-row">
        <h2><a href="/rustlang/rust">rustlang / rust</a></h2>
        <p>Empowering everyone to build reliable software</p>
        <span itemprop="programmingLanguage">Rust</span>
        <a href="/rustlang/rust/stargazers">90,123</a>
        <a href="/rustlang/rust/forks">12,000</a>
        <span class="d-inline-block float-sm-right">250 stars today</span>
      </article>
      <article class="Box-row">
        <h2><a href="/someorg/unrelated">someorg / unrelated</a></h2>
        <p>A project about baking bread</p>
        <span itemprop="programmingLanguage">Go</span>
      </article>
    </body></html>
    "#;

    #[test]
    fn parse_extracts_repo_fields_and_marks_hot_repos() {
        let items = GitHubTrendingPlugin::parse(SAMPLE_HTML, &[]);
        assert_eq!(items.len(), 2);
        let rust_repo = items.iter().find(|i| i.external_id == "rustlang_rust").unwrap();
        assert_eq!(rust_repo.upvotes, 90123);
        assert_eq!(rust_repo.comments_count, 12000);
        assert!(rust_repo.tags.contains(&"Rust".to_string()));
        assert!(rust_repo.tags.contains(&"hot".to_string()));
    }

    #[test]
    fn parse_filters_by_keyword_across_name_and_description() {
        let items = GitHubTrendingPlugin::parse(SAMPLE_HTML, &["bread".to_string()]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].external_id, "someorg_unrelated");
    }
}
