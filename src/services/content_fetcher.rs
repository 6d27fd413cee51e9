use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;

use super::ContentSource;

// Some publishers and feed redirectors refuse non-browser clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Tried in order; the first match is treated as the article body.
const MAIN_CONTENT_SELECTORS: &[&str] = &["article", "main", "[role=\"main\"]", "body"];

const MIN_CONTENT_CHARS: usize = 200;

// Wide enough that html2text never wraps a paragraph onto several lines.
const TEXT_WIDTH: usize = 10_000;

/// Once a page has a line this long, lines under `MIN_LINE_WORDS` are
/// menu and button text rather than body.
const LONG_PARAGRAPH_CHARS: usize = 150;
const MIN_LINE_WORDS: usize = 4;

pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch a page and extract its main readable text
    pub async fn fetch_full_content(&self, article_url: &str) -> Result<Option<String>> {
        if Url::parse(article_url).is_err() {
            tracing::debug!("Skipping invalid URL {}", article_url);
            return Ok(None);
        }

        let response = self.client.get(article_url).send().await?;

        if !response.status().is_success() {
            tracing::debug!("Failed to fetch {}: {}", article_url, response.status());
            return Ok(None);
        }

        let html = response.text().await?;
        Ok(extract_content(&html))
    }
}

#[async_trait]
impl ContentSource for ContentFetcher {
    async fn extract(&self, url: &str) -> Option<String> {
        match self.fetch_full_content(url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }
}

/// Extract readable content from HTML: narrow to the main content element,
/// render it with html2text and strip link footnotes.
pub fn extract_content(html: &str) -> Option<String> {
    let fragment = main_fragment(html);

    let text = match html2text::from_read(fragment.as_bytes(), TEXT_WIDTH) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("Failed to convert HTML to text: {}", e);
            return None;
        }
    };

    let cleaned = clean_text(&text);

    if cleaned.chars().count() >= MIN_CONTENT_CHARS {
        Some(cleaned)
    } else {
        tracing::debug!("Extracted content too short ({} chars)", cleaned.len());
        None
    }
}

/// The matching element with the most text, for the first selector whose
/// best match is long enough to be an article. Teaser cards and related-story
/// boxes fall through to the next selector.
fn main_fragment(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut fallback = None;

    for raw in MAIN_CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let best = document
            .select(&selector)
            .map(|element| (text_len(&element), element))
            .max_by_key(|(len, _)| *len);

        match best {
            Some((len, element)) if len >= MIN_CONTENT_CHARS => return element.html(),
            Some((_, element)) if fallback.is_none() => fallback = Some(element.html()),
            _ => {}
        }
    }

    fallback.unwrap_or_else(|| html.to_string())
}

fn text_len(element: &ElementRef) -> usize {
    element.text().map(|t| t.trim().chars().count()).sum()
}

fn clean_text(text: &str) -> String {
    // html2text renders links as `[label][n]` with `[n]: url` footnotes
    let footnote = Regex::new(r"^\[\d+\]:\s").ok();
    let link_ref = Regex::new(r"\[([^\]]*)\]\[\d+\]").ok();

    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !footnote.as_ref().is_some_and(|re| re.is_match(l)))
        .map(|l| match &link_ref {
            Some(re) => re.replace_all(l, "$1").into_owned(),
            None => l.to_string(),
        })
        .collect();

    let has_paragraphs = lines
        .iter()
        .any(|l| l.chars().count() >= LONG_PARAGRAPH_CHARS);
    if !has_paragraphs {
        return lines.join("\n");
    }

    lines
        .into_iter()
        .filter(|l| l.split_whitespace().count() >= MIN_LINE_WORDS)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const PARAGRAPH: &str = "Taiwan Semiconductor Manufacturing Co said on Monday that production \
        at its second Arizona fab would slip into next year because of a shortage of skilled \
        installers and delays in permitting for specialty gas lines.";

    fn article_page() -> String {
        format!(
            r#"<html><head><title>TSMC</title><script>var x = 1;</script></head>
            <body>
              <nav><a href="/">Home</a> <a href="/markets">Markets</a></nav>
              <article>
                <h1>TSMC delays Arizona fab</h1>
                <p>{PARAGRAPH}</p>
                <p>Analysts at <a href="https://example.com/analyst">Example Research</a> expect knock-on effects.</p>
              </article>
              <footer>Copyright footer text</footer>
            </body></html>"#
        )
    }

    #[test]
    fn extracts_article_element_only() {
        let text = extract_content(&article_page()).unwrap();
        assert!(text.contains("TSMC delays Arizona fab"));
        assert!(text.contains("skilled"));
        assert!(text.contains("Example Research"));
        assert!(!text.contains("Markets"));
        assert!(!text.contains("Copyright footer"));
        assert!(!text.contains("https://example.com/analyst"));
    }

    #[test]
    fn menu_lines_are_dropped_next_to_long_paragraphs() {
        let html = format!(
            "<html><body><div>Home</div><div>Markets</div><div>Sign in</div>\
             <p>{PARAGRAPH}</p><p>{PARAGRAPH}</p></body></html>"
        );
        let text = extract_content(&html).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(!lines.contains(&"Home"));
        assert!(!lines.contains(&"Markets"));
        assert!(!lines.contains(&"Sign in"));
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.ends_with("specialty gas lines.")));
    }

    #[test]
    fn short_lines_survive_without_long_paragraphs() {
        assert_eq!(clean_text("Fab fire\nOutput halted at two lines"), "Fab fire\nOutput halted at two lines");
    }

    #[test]
    fn teaser_article_falls_through_to_main() {
        let html = format!(
            "<html><body><aside><article><a href=\"/chips\">Related: Chip stocks</a></article></aside>\
             <main><p>{PARAGRAPH} {PARAGRAPH}</p></main></body></html>"
        );
        let text = extract_content(&html).unwrap();
        assert!(text.contains("skilled installers"));
        assert!(!text.contains("Related: Chip stocks"));
    }

    #[test]
    fn longest_matching_article_wins() {
        let html = format!(
            "<html><body><article><p>Teaser: fab delays</p></article>\
             <article><p>{PARAGRAPH} {PARAGRAPH}</p></article></body></html>"
        );
        let text = extract_content(&html).unwrap();
        assert!(text.contains("skilled installers"));
        assert!(!text.contains("Teaser"));
    }

    #[test]
    fn short_pages_have_no_content() {
        assert_eq!(extract_content("<html><body><p>Subscribe now.</p></body></html>"), None);
    }

    #[tokio::test]
    async fn fetch_sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .and(|req: &Request| {
                req.headers
                    .get("user-agent")
                    .is_some_and(|v| v.as_bytes() == BROWSER_USER_AGENT.as_bytes())
            })
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .mount(&server)
            .await;

        let fetcher = ContentFetcher::new().unwrap();
        let text = fetcher.extract(&format!("{}/story", server.uri())).await;
        assert!(text.is_some_and(|t| t.contains("skilled")));
    }

    #[tokio::test]
    async fn non_success_status_has_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string(article_page()))
            .mount(&server)
            .await;

        let fetcher = ContentFetcher::new().unwrap();
        assert_eq!(fetcher.extract(&format!("{}/story", server.uri())).await, None);
    }

    #[tokio::test]
    async fn invalid_url_has_no_content() {
        let fetcher = ContentFetcher::new().unwrap();
        assert_eq!(fetcher.extract("not a url").await, None);
    }
}
