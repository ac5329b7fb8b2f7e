//! Incoming HTTP request type.

/// An incoming HTTP request, reduced to what handlers read.
///
/// The query string is decoded once (`application/x-www-form-urlencoded`,
/// so `+` is a space and `%XX` escapes are resolved) when the request is
/// built.
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
}

impl Request {
    pub(crate) fn new(parts: &http::request::Parts) -> Self {
        Self {
            method: parts.method.as_str().to_owned(),
            path: parts.uri.path().to_owned(),
            query: parse_query(parts.uri.query()),
        }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }

    /// First value of a query parameter, if present.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value of a query parameter, or `""` when absent.
    pub fn query_or_empty(&self, key: &str) -> &str {
        self.query(key).unwrap_or("")
    }
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
