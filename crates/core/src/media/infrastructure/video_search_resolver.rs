use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::media::domain::media_resolver::{MediaRef, MediaResolver, ResolverError};
use crate::shared::constants::{DEFAULT_MAX_RESULTS, DEFAULT_QUERY_SUFFIX, VIDEO_SEARCH_URL};
use crate::shared::emotion::Mood;

#[derive(Debug, Clone, PartialEq)]
pub struct VideoSearchConfig {
    pub base_url: String,
    /// Appended to the emotion label to form the query.
    pub query_suffix: String,
    pub max_results: usize,
    pub timeout: Duration,
}

impl Default for VideoSearchConfig {
    fn default() -> Self {
        Self {
            base_url: VIDEO_SEARCH_URL.to_string(),
            query_suffix: DEFAULT_QUERY_SUFFIX.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Resolves a mood by scraping video ids out of a search results page.
///
/// The blocking HTTP client is built per call so that the resolver can be
/// constructed on an async runtime thread and used from a worker.
pub struct VideoSearchResolver {
    config: VideoSearchConfig,
}

impl VideoSearchResolver {
    pub fn new(config: VideoSearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VideoSearchConfig {
        &self.config
    }

    fn query(&self, mood: Mood) -> String {
        if self.config.query_suffix.is_empty() {
            mood.emotion.label().to_string()
        } else {
            format!("{} {}", mood.emotion.label(), self.config.query_suffix)
        }
    }
}

impl MediaResolver for VideoSearchResolver {
    fn resolve(&self, mood: Mood) -> Result<Vec<MediaRef>, ResolverError> {
        let query = self.query(mood);
        let url = reqwest::Url::parse_with_params(&self.config.base_url, &[("search_query", &query)])
            .map_err(|e| ResolverError::Network(format!("invalid search url: {e}")))?;
        log::debug!("Searching {url}");

        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| ResolverError::Network(e.to_string()))?;
        let response = client
            .get(url)
            .send()
            .map_err(|e| ResolverError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolverError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .map_err(|e| ResolverError::Network(e.to_string()))?;

        let ids = extract_video_ids(&body, self.config.max_results);
        if ids.is_empty() {
            return Err(ResolverError::NoMatch(query));
        }
        log::info!("Resolved '{query}' to {} result(s)", ids.len());
        Ok(ids.iter().map(|id| MediaRef::from_video_id(id)).collect())
    }
}

fn watch_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/watch\?v=([A-Za-z0-9_-]{11})").expect("watch pattern is a valid regex")
    })
}

/// Distinct 11-character video ids in order of first appearance, at most `max`.
pub fn extract_video_ids(body: &str, max: usize) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for caps in watch_pattern().captures_iter(body) {
        if ids.len() >= max {
            break;
        }
        let id = &caps[1];
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::emotion::Emotion;
    use std::thread;

    /// Serve one canned response and report the request URL back.
    fn serve(status: u16, body: &'static str) -> (String, crossbeam_channel::Receiver<String>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        thread::spawn(move || {
            if let Ok(request) = server.recv() {
                let _ = tx.send(request.url().to_string());
                let response = tiny_http::Response::from_string(body).with_status_code(status);
                let _ = request.respond(response);
            }
        });
        (format!("http://{addr}/results"), rx)
    }

    fn resolver(base_url: String) -> VideoSearchResolver {
        VideoSearchResolver::new(VideoSearchConfig {
            base_url,
            timeout: Duration::from_secs(5),
            ..VideoSearchConfig::default()
        })
    }

    #[test]
    fn test_resolves_first_watch_link() {
        let (url, requests) = serve(200, r#"<a href="/watch?v=abc12345678">x</a>"#);
        let media = resolver(url).resolve(Mood::new(Emotion::Happy, 80)).unwrap();

        assert_eq!(media[0].url, "https://www.youtube.com/watch?v=abc12345678");
        assert_eq!(
            requests.recv().unwrap(),
            "/results?search_query=Happy+background+tunes"
        );
    }

    #[test]
    fn test_non_success_status_is_failure() {
        let (url, _) = serve(503, r#"/watch?v=abc12345678"#);
        let err = resolver(url).resolve(Mood::new(Emotion::Sad, 40)).unwrap_err();
        assert_eq!(err, ResolverError::Status(503));
    }

    #[test]
    fn test_page_without_links_is_no_match() {
        let (url, _) = serve(200, "<html>nothing here</html>");
        let err = resolver(url).resolve(Mood::default()).unwrap_err();
        assert_eq!(err, ResolverError::NoMatch("Neutral background tunes".into()));
    }

    #[test]
    fn test_unreachable_endpoint_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = resolver(format!("http://{addr}/results"))
            .resolve(Mood::default())
            .unwrap_err();
        assert!(matches!(err, ResolverError::Network(_)));
    }

    #[test]
    fn test_extract_keeps_first_seen_order_without_duplicates() {
        let body = "/watch?v=AAAAAAAAAAA /watch?v=BBBBBBBBBBB /watch?v=AAAAAAAAAAA /watch?v=CCCCCCCCCCC";
        assert_eq!(
            extract_video_ids(body, 5),
            vec!["AAAAAAAAAAA", "BBBBBBBBBBB", "CCCCCCCCCCC"]
        );
    }

    #[test]
    fn test_extract_respects_max() {
        let body = "/watch?v=AAAAAAAAAAA /watch?v=BBBBBBBBBBB";
        assert_eq!(extract_video_ids(body, 1), vec!["AAAAAAAAAAA"]);
    }

    #[test]
    fn test_extract_accepts_dash_and_underscore() {
        let body = r#""url":"/watch?v=a-b_c123XYZ&pp=1""#;
        assert_eq!(extract_video_ids(body, 5), vec!["a-b_c123XYZ"]);
    }

    #[test]
    fn test_extract_ignores_short_ids() {
        assert!(extract_video_ids("/watch?v=short", 5).is_empty());
    }

    #[test]
    fn test_empty_suffix_uses_bare_label() {
        let resolver = VideoSearchResolver::new(VideoSearchConfig {
            query_suffix: String::new(),
            ..VideoSearchConfig::default()
        });
        assert_eq!(resolver.query(Mood::new(Emotion::Fear, 10)), "Fear");
    }
}
