//! Web lookup collaborator.
//!
//! Two-stage strategy: search scoped to a curated knowledge source first,
//! fall back to a general query, then fetch the top hit and extract a
//! bounded plain-text snippet. The whole pipeline is infallible by contract:
//! every failure mode degrades to a descriptive string so the engine can
//! treat "lookup broke" and "no information" uniformly.

use futures::future::BoxFuture;
use tracing::{debug, warn};

use stanceflow_core::config::LookupConfig;
use stanceflow_core::traits::LookupTool;

const NO_RESULTS: &str = "No search results found.";
const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; Stanceflow/0.3)";

/// A search hit: title and link.
#[derive(Debug, Clone)]
struct SearchHit {
    title: String,
    url: String,
}

pub struct WebLookup {
    http: reqwest::Client,
    config: LookupConfig,
}

impl WebLookup {
    pub fn new(config: LookupConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    async fn search_hits(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        let resp = match self
            .http
            .post(SEARCH_ENDPOINT)
            .form(&[("q", query)])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Search request failed");
                return Vec::new();
            }
        };

        if !resp.status().is_success() {
            warn!(status = resp.status().as_u16(), "Search returned non-success");
            return Vec::new();
        }

        match resp.text().await {
            Ok(body) => extract_result_links(&body, max_results),
            Err(e) => {
                warn!(error = %e, "Failed to read search response");
                Vec::new()
            }
        }
    }

    async fn fetch_snippet(&self, url: &str) -> String {
        let resp = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => return format!("[Error fetching page: {}]", e),
        };

        let status = resp.status();
        if !status.is_success() {
            return format!("[Error fetching page: HTTP {}]", status.as_u16());
        }

        let body = match resp.text().await {
            Ok(b) => b,
            Err(e) => return format!("[Error reading page: {}]", e),
        };

        let snippet = extract_paragraphs(&body, 5);
        if snippet.is_empty() {
            "[Could not extract a meaningful snippet.]".to_string()
        } else {
            truncate_chars(&snippet, self.config.snippet_max_chars)
        }
    }
}

impl LookupTool for WebLookup {
    fn search(&self, query: String) -> BoxFuture<'_, String> {
        Box::pin(async move {
            let scoped = format!("{} site:{}", query, self.config.curated_site);
            debug!(query = %query, "Performing web lookup");

            let mut hits = self.search_hits(&scoped, self.config.max_results).await;
            if hits.is_empty() {
                debug!("No curated-source results, falling back to general search");
                hits = self.search_hits(&query, 1).await;
            }

            let Some(best) = hits.first() else {
                return NO_RESULTS.to_string();
            };

            debug!(title = %best.title, url = %best.url, "Fetching top search hit");
            self.fetch_snippet(&best.url).await
        })
    }
}

/// Pull `result__a` anchors out of the search result page.
fn extract_result_links(html: &str, max_results: usize) -> Vec<SearchHit> {
    let re = regex::Regex::new(r#"(?is)<a[^>]*class="result__a"[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#)
        .unwrap();
    re.captures_iter(html)
        .take(max_results)
        .map(|cap| SearchHit {
            title: strip_html_tags(&cap[2]),
            url: decode_entities(&cap[1]),
        })
        .collect()
}

/// Extract the first few paragraphs of page text, HTML stripped.
fn extract_paragraphs(html: &str, max_paragraphs: usize) -> String {
    let re = regex::Regex::new(r"(?is)<p[^>]*>(.*?)</p>").unwrap();
    let paragraphs: Vec<String> = re
        .captures_iter(html)
        .map(|cap| strip_html_tags(&cap[1]))
        .filter(|p| !p.is_empty())
        .take(max_paragraphs)
        .collect();
    paragraphs.join("\n")
}

/// Basic HTML tag stripping using regex.
fn strip_html_tags(html: &str) -> String {
    // Remove script and style blocks entirely
    let re_script = regex::Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap();
    let cleaned = re_script.replace_all(html, "");
    let re_style = regex::Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap();
    let cleaned = re_style.replace_all(&cleaned, "");

    // Remove HTML tags
    let re_tags = regex::Regex::new(r"<[^>]+>").unwrap();
    let text = re_tags.replace_all(&cleaned, "");

    decode_entities(&text).trim().to_string()
}

/// Decode common HTML entities.
fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Truncate to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <div class="result">
          <a rel="nofollow" class="result__a" href="https://en.wikipedia.org/wiki/Carbon_tax">Carbon tax - Wikipedia</a>
        </div>
        <div class="result">
          <a rel="nofollow" class="result__a" href="https://example.com/other">Other &amp; sundry</a>
        </div>
    "#;

    #[test]
    fn test_extract_result_links() {
        let hits = extract_result_links(RESULTS_PAGE, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://en.wikipedia.org/wiki/Carbon_tax");
        assert_eq!(hits[0].title, "Carbon tax - Wikipedia");
        assert_eq!(hits[1].title, "Other & sundry");
    }

    #[test]
    fn test_extract_result_links_respects_limit() {
        let hits = extract_result_links(RESULTS_PAGE, 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_extract_paragraphs() {
        let html = r#"
            <html><body>
            <p>A carbon tax is a tax levied on <b>carbon emissions</b>.</p>
            <p></p>
            <p>It is a form of carbon pricing.</p>
            </body></html>
        "#;
        let text = extract_paragraphs(html, 5);
        assert_eq!(
            text,
            "A carbon tax is a tax levied on carbon emissions.\nIt is a form of carbon pricing."
        );
    }

    #[test]
    fn test_strip_html_tags_removes_scripts() {
        let html = "<p>keep</p><script>alert('no')</script><style>p{}</style>";
        assert_eq!(strip_html_tags(html), "keep");
    }

    #[test]
    fn test_truncate_chars_boundary_safe() {
        let text = "ééééé";
        assert_eq!(truncate_chars(text, 3), "ééé...");
        assert_eq!(truncate_chars(text, 5), "ééééé");
    }

    #[test]
    fn test_truncate_respects_snippet_cap() {
        let long = "x".repeat(5000);
        let out = truncate_chars(&long, 2000);
        assert_eq!(out.chars().count(), 2003); // 2000 + "..."
    }
}
