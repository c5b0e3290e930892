use tracing::debug;
use url::Url;

/// Ordered set of trusted origins, static for the process lifetime
///
/// Entries are exact scheme+host+port strings; the first entry doubles as
/// the canonical origin echoed to callers that are not allow-listed.
#[derive(Debug, Clone)]
pub struct OriginAllowList {
    origins: Vec<String>,
}

impl OriginAllowList {
    pub fn new(origins: Vec<String>) -> Self {
        Self { origins }
    }

    /// Exact membership test
    pub fn contains(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    /// The canonical default origin used for non-allow-listed callers
    pub fn canonical(&self) -> Option<&str> {
        self.origins.first().map(|s| s.as_str())
    }

    /// Decide whether a request's origin is trusted.
    ///
    /// Requests carrying neither header (direct calls, server-to-server) are
    /// trusted by absence; that is a deliberate permissive default for an
    /// anonymous public API. A present `Origin` header is authoritative: if
    /// it is not allow-listed the request is rejected even when the referer
    /// would have matched. `Referer` is consulted only when `Origin` is
    /// absent, and a malformed referer fails validation rather than
    /// erroring out of the pipeline.
    pub fn validate(&self, origin: Option<&str>, referer: Option<&str>) -> bool {
        match (origin, referer) {
            (None, None) => true,
            (Some(origin), _) => self.contains(origin),
            (None, Some(referer)) => match Url::parse(referer) {
                Ok(url) => {
                    let referer_origin = url.origin().ascii_serialization();
                    self.contains(&referer_origin)
                }
                Err(e) => {
                    debug!(referer, error = %e, "Unparseable referer, rejecting");
                    false
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list() -> OriginAllowList {
        OriginAllowList::new(vec![
            "https://cards.example.com".to_string(),
            "http://localhost:5173".to_string(),
        ])
    }

    #[test]
    fn test_missing_both_headers_is_trusted() {
        assert!(allow_list().validate(None, None));
    }

    #[test]
    fn test_allow_listed_origin_passes() {
        assert!(allow_list().validate(Some("https://cards.example.com"), None));
    }

    #[test]
    fn test_unknown_origin_rejected() {
        assert!(!allow_list().validate(Some("https://evil.example"), None));
    }

    #[test]
    fn test_origin_is_authoritative_over_referer() {
        // Referer matches but the explicit Origin header does not
        assert!(!allow_list().validate(
            Some("https://evil.example"),
            Some("https://cards.example.com/page")
        ));
    }

    #[test]
    fn test_referer_fallback_when_origin_absent() {
        assert!(allow_list().validate(None, Some("https://cards.example.com/players/8478402")));
        assert!(!allow_list().validate(None, Some("https://evil.example/page")));
    }

    #[test]
    fn test_referer_with_port_matches_exactly() {
        assert!(allow_list().validate(None, Some("http://localhost:5173/")));
        assert!(!allow_list().validate(None, Some("http://localhost:3000/")));
    }

    #[test]
    fn test_malformed_referer_fails_without_panicking() {
        assert!(!allow_list().validate(None, Some("not a url")));
        assert!(!allow_list().validate(None, Some("")));
    }

    #[test]
    fn test_canonical_is_first_entry() {
        assert_eq!(allow_list().canonical(), Some("https://cards.example.com"));
    }
}
