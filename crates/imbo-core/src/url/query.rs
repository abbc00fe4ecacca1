//! Image listing query
//!
//! Parameters for the `/users/<user>/images` resource, serialized in a fixed
//! order so the resulting URL (and its access token) is deterministic.

use chrono::{DateTime, Utc};

use super::ImboUrl;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 20;

/// Builder for image listing parameters
///
/// # Example
///
/// ```rust
/// use imbo_core::url::ImagesQuery;
///
/// let query = ImagesQuery::new().page(2).limit(5).metadata(true);
/// assert_eq!(
///     query.params(),
///     vec![
///         ("page".to_string(), "2".to_string()),
///         ("limit".to_string(), "5".to_string()),
///         ("metadata".to_string(), "1".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagesQuery {
    page: u32,
    limit: u32,
    metadata: bool,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    fields: Vec<String>,
    sort: Vec<String>,
    ids: Vec<String>,
    checksums: Vec<String>,
    original_checksums: Vec<String>,
}

impl Default for ImagesQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            metadata: false,
            from: None,
            to: None,
            fields: Vec::new(),
            sort: Vec::new(),
            ids: Vec::new(),
            checksums: Vec::new(),
            original_checksums: Vec::new(),
        }
    }
}

impl ImagesQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Include image metadata in the listing
    pub fn metadata(mut self, enable: bool) -> Self {
        self.metadata = enable;
        self
    }

    /// Only images added at or after this time
    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Only images added at or before this time
    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Sort expressions, e.g. "size:desc"
    pub fn sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort.extend(sort.into_iter().map(Into::into));
        self
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn checksums<I, S>(mut self, checksums: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checksums.extend(checksums.into_iter().map(Into::into));
        self
    }

    pub fn original_checksums<I, S>(mut self, checksums: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.original_checksums
            .extend(checksums.into_iter().map(Into::into));
        self
    }

    /// Query parameters in wire order. `page` and `limit` are always present.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];

        if self.metadata {
            params.push(("metadata".to_string(), "1".to_string()));
        }
        if let Some(from) = self.from {
            params.push(("from".to_string(), from.timestamp().to_string()));
        }
        if let Some(to) = self.to {
            params.push(("to".to_string(), to.timestamp().to_string()));
        }

        let lists = [
            ("fields[]", &self.fields),
            ("sort[]", &self.sort),
            ("ids[]", &self.ids),
            ("checksums[]", &self.checksums),
            ("originalChecksums[]", &self.original_checksums),
        ];
        for (key, values) in lists {
            params.extend(values.iter().map(|v| (key.to_string(), v.clone())));
        }

        params
    }

    /// Add the parameters to `url`, after any existing ones.
    pub fn apply(&self, url: &mut ImboUrl) {
        for (key, value) in self.params() {
            url.add_query_param(key, value);
        }
    }
}
