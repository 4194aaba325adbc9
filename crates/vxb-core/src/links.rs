//! Detection and rewriting of Twitter / X links.
//!
//! `find_links` scans free-form text; `Rewriter` swaps the host for an
//! embed-friendly one and drops the query string (tracking params like `?s=20`).

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Host that rewritten links point at.
pub const DEFAULT_TARGET_HOST: &str = "vxtwitter.com";

static SOURCE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://(www\.)?(twitter\.com|x\.com)/[^\s]+")
        .expect("source link regex is valid")
});

/// A source-host link found in a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkMatch<'a> {
    pub raw: &'a str,
    pub start: usize,
}

impl LinkMatch<'_> {
    pub fn end(&self) -> usize {
        self.start + self.raw.len()
    }
}

/// Lazily yield every source-host link in `text`, left to right.
pub fn find_links(text: &str) -> impl Iterator<Item = LinkMatch<'_>> {
    SOURCE_LINK_RE.find_iter(text).map(|m| LinkMatch {
        raw: m.as_str(),
        start: m.start(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("invalid url `{url}`: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot set host `{host}` on `{url}`")]
    Host { url: String, host: String },
}

#[derive(Clone, Debug)]
pub struct Rewriter {
    target_host: String,
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_HOST)
    }
}

impl Rewriter {
    pub fn new(target_host: impl Into<String>) -> Self {
        Self {
            target_host: target_host.into(),
        }
    }

    pub fn target_host(&self) -> &str {
        &self.target_host
    }

    /// Swap the host for the target host and clear the query.
    ///
    /// Scheme, path and fragment are kept. Rewriting an already rewritten link
    /// yields the same link.
    pub fn rewrite(&self, raw: &str) -> Result<String, RewriteError> {
        let mut url = Url::parse(raw).map_err(|source| RewriteError::Parse {
            url: raw.to_string(),
            source,
        })?;

        url.set_host(Some(&self.target_host))
            .map_err(|_| RewriteError::Host {
                url: raw.to_string(),
                host: self.target_host.clone(),
            })?;
        url.set_query(None);

        Ok(url.into())
    }

    /// Rewrite a batch in order, skipping (and logging) links that fail.
    pub fn rewrite_all<'a>(&self, links: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        links
            .into_iter()
            .filter_map(|raw| match self.rewrite(raw) {
                Ok(out) => Some(out),
                Err(e) => {
                    tracing::warn!("skipping link: {e}");
                    None
                }
            })
            .collect()
    }

    /// Return `text` with every source link replaced in place by its rewrite.
    ///
    /// Links that fail to rewrite are left as they were. `None` when `text`
    /// holds no source link at all.
    pub fn rewrite_text(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0usize;
        let mut found = false;

        for m in find_links(text) {
            found = true;
            out.push_str(&text[last..m.start]);
            match self.rewrite(m.raw) {
                Ok(rewritten) => out.push_str(&rewritten),
                Err(e) => {
                    tracing::warn!("keeping link as-is: {e}");
                    out.push_str(m.raw);
                }
            }
            last = m.end();
        }

        if !found {
            return None;
        }
        out.push_str(&text[last..]);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raws(text: &str) -> Vec<&str> {
        find_links(text).map(|m| m.raw).collect()
    }

    #[test]
    fn finds_nothing_in_plain_text() {
        assert!(raws("no links here, just twitter.com mentioned").is_empty());
        assert!(raws("https://example.com/foo").is_empty());
    }

    #[test]
    fn finds_both_hosts_in_order() {
        let text = "a https://x.com/a/status/1 b http://www.twitter.com/b/status/2?s=20\nc";
        assert_eq!(
            raws(text),
            vec![
                "https://x.com/a/status/1",
                "http://www.twitter.com/b/status/2?s=20"
            ]
        );
    }

    #[test]
    fn match_is_case_insensitive_and_offsets_are_tracked() {
        let text = "see HTTPS://Twitter.COM/Foo/status/9";
        let m: Vec<_> = find_links(text).collect();
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].start, 4);
        assert_eq!(m[0].end(), text.len());
        assert_eq!(m[0].raw, "HTTPS://Twitter.COM/Foo/status/9");
    }

    #[test]
    fn does_not_match_rewritten_host_or_lookalikes() {
        assert!(raws("https://vxtwitter.com/a/status/1").is_empty());
        assert!(raws("https://fxtwitter.com/a/status/1").is_empty());
        assert!(raws("https://twitter.com.evil.test/x").is_empty());
    }

    #[test]
    fn rewrites_host_and_drops_query() {
        let rw = Rewriter::default();
        let text = "check https://twitter.com/foo/status/123?s=20";
        let links = raws(text);
        assert_eq!(links.len(), 1);
        assert_eq!(
            rw.rewrite(links[0]).unwrap(),
            "https://vxtwitter.com/foo/status/123"
        );
    }

    #[test]
    fn keeps_scheme_path_and_fragment() {
        let rw = Rewriter::default();
        let out = rw
            .rewrite("http://www.x.com/user/status/42/photo/1?t=abc#frag")
            .unwrap();
        let url = Url::parse(&out).unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("vxtwitter.com"));
        assert_eq!(url.path(), "/user/status/42/photo/1");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), Some("frag"));
    }

    #[test]
    fn rewriting_is_idempotent() {
        let rw = Rewriter::default();
        for raw in [
            "https://twitter.com/foo/status/123?s=20",
            "https://x.com/a/status/1",
            "http://www.twitter.com/b?x=1&y=2#z",
        ] {
            let once = rw.rewrite(raw).unwrap();
            assert_eq!(rw.rewrite(&once).unwrap(), once);
        }
    }

    #[test]
    fn parse_error_is_reported() {
        let rw = Rewriter::default();
        assert!(matches!(
            rw.rewrite("not a url"),
            Err(RewriteError::Parse { .. })
        ));
    }

    #[test]
    fn invalid_target_host_is_reported() {
        let rw = Rewriter::new("bad host");
        assert!(matches!(
            rw.rewrite("https://x.com/a"),
            Err(RewriteError::Host { .. })
        ));
    }

    #[test]
    fn batch_skips_malformed_links() {
        let rw = Rewriter::default();
        let out = rw.rewrite_all(["https://x.com/a/status/1?s=1", "http://[::1", "https://twitter.com/b"]);
        assert_eq!(
            out,
            vec![
                "https://vxtwitter.com/a/status/1".to_string(),
                "https://vxtwitter.com/b".to_string()
            ]
        );
    }

    #[test]
    fn rewrite_text_substitutes_in_place() {
        let rw = Rewriter::default();
        let out = rw
            .rewrite_text("lol https://x.com/a/status/1?s=20 and https://twitter.com/b/status/2 ok")
            .unwrap();
        assert_eq!(
            out,
            "lol https://vxtwitter.com/a/status/1 and https://vxtwitter.com/b/status/2 ok"
        );
        assert_eq!(rw.rewrite_text("nothing to see"), None);
    }
}
