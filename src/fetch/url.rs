//! Request URL composition shared by every fetcher.

use url::Url;

use super::QueryMap;
use crate::error::{Result, ScrapeError};

/// Schemes a composed URL may start with.
///
/// `data:` is accepted because some playlists are handed around as
/// base64-encoded inline documents rather than network locations.
const ALLOWED_PREFIXES: &[&str] = &["http://", "https://", "data:"];

/// Inputs for [`compose`] besides the path itself.
#[derive(Debug, Clone, Default)]
pub struct UrlParts<'a> {
    pub base_url: Option<&'a str>,
    pub query: Option<&'a QueryMap>,
}

/// Glue `base_url` and `path` together with exactly one slash, validate the
/// scheme and set every `query` entry on the result.
///
/// Existing parameters with the same name as a `query` key are replaced in
/// place; unrelated parameters are kept.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidUrl`] when the joined string does not start
/// with `http://`, `https://` or `data:`, or cannot be parsed.
pub fn compose(path: &str, parts: &UrlParts<'_>) -> Result<Url> {
    let joined = join(parts.base_url.unwrap_or_default(), path);

    if !ALLOWED_PREFIXES.iter().any(|p| joined.starts_with(p)) {
        return Err(ScrapeError::InvalidUrl(format!(
            "url doesn't start with a http scheme: '{joined}'"
        )));
    }

    let mut url = Url::parse(&joined)?;
    if let Some(query) = parts.query.filter(|q| !q.is_empty()) {
        set_query(&mut url, query);
    }
    Ok(url)
}

/// Shorthand for composing with only a base URL.
pub fn compose_with_base(path: &str, base_url: &str) -> Result<Url> {
    compose(
        path,
        &UrlParts {
            base_url: Some(base_url),
            query: None,
        },
    )
}

fn join(base: &str, path: &str) -> String {
    let right = path.trim_start_matches('/');
    if base.is_empty() {
        return right.to_string();
    }
    let left = base.trim_end_matches('/');
    format!("{left}/{right}")
}

fn set_query(url: &mut Url, query: &QueryMap) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in query {
        let mut seen = false;
        pairs.retain_mut(|(k, v)| {
            if k != key {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            v.clone_from(value);
            true
        });
        if !seen {
            pairs.push((key.clone(), value.clone()));
        }
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> QueryMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn joins_with_exactly_one_slash() {
        for base in ["https://x.test", "https://x.test/", "https://x.test//"] {
            for path in ["p/q", "/p/q", "//p/q"] {
                let url = compose_with_base(path, base).unwrap();
                assert_eq!(url.as_str(), "https://x.test/p/q", "{base} + {path}");
            }
        }
    }

    #[test]
    fn keeps_base_path_segments() {
        let url = compose_with_base("/search", "https://api.test/v1/").unwrap();
        assert_eq!(url.as_str(), "https://api.test/v1/search");
    }

    #[test]
    fn absolute_path_without_base() {
        let url = compose("https://x.test/movie/1", &UrlParts::default()).unwrap();
        assert_eq!(url.as_str(), "https://x.test/movie/1");
    }

    #[test]
    fn rejects_other_schemes() {
        for bad in ["ftp://x.test/a", "x.test/a", "/relative", "javascript:alert(1)"] {
            let err = compose(bad, &UrlParts::default()).unwrap_err();
            assert!(matches!(err, ScrapeError::InvalidUrl(_)), "{bad}");
        }
    }

    #[test]
    fn accepts_http_https_and_data() {
        assert!(compose("http://x.test", &UrlParts::default()).is_ok());
        assert!(compose("https://x.test", &UrlParts::default()).is_ok());
        let data = compose(
            "data:application/vnd.apple.mpegurl;base64,I0VYVE0zVQ==",
            &UrlParts::default(),
        )
        .unwrap();
        assert_eq!(data.scheme(), "data");
    }

    #[test]
    fn query_overwrites_existing_parameter() {
        let q = query(&[("a", "1"), ("b", "2")]);
        let url = compose(
            "https://x.test/p?a=0",
            &UrlParts {
                base_url: None,
                query: Some(&q),
            },
        )
        .unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn query_keeps_unrelated_parameters_and_collapses_duplicates() {
        let q = query(&[("a", "9")]);
        let url = compose(
            "https://x.test/p?keep=yes&a=0&a=1",
            &UrlParts {
                base_url: None,
                query: Some(&q),
            },
        )
        .unwrap();
        assert_eq!(url.query(), Some("keep=yes&a=9"));
    }

    #[test]
    fn query_values_are_encoded() {
        let q = query(&[("keyword", "the office")]);
        let url = compose(
            "/search.html",
            &UrlParts {
                base_url: Some("https://soaper.test"),
                query: Some(&q),
            },
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://soaper.test/search.html?keyword=the+office");
    }
}
