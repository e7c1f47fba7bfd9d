//! Query-string handling and page-number pagination.
//!
//! Repeated keys are kept (`?tags=a&tags=b`), so the query is parsed into an
//! ordered list of pairs instead of a struct.

use crate::{
    api::AppState,
    core::{PageRequest, filter::parse_flag},
    errors::{Error, Result},
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Serialize;

/// Largest `limit` a client may ask for.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Raw query parameters of a request together with its path.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    path: String,
    raw: Option<String>,
    pairs: Vec<(String, String)>,
    default_limit: u64,
}

#[async_trait]
impl FromRequestParts<AppState> for ListQuery {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| Error::validation("query", e.body_text()))?;
        Ok(Self {
            path: parts.uri.path().to_string(),
            raw: parts.uri.query().map(str::to_string),
            pairs,
            default_limit: state.config.page_size,
        })
    }
}

impl ListQuery {
    /// First value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `key`, in request order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Parses `key` as an integer id.
    pub fn id(&self, key: &str) -> Result<Option<i64>> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| Error::validation(key, format!("'{raw}' is not a valid id")))
            })
            .transpose()
    }

    /// Parses `key` as a boolean flag; absent means `false`.
    pub fn flag(&self, key: &str) -> Result<bool> {
        self.get(key).map_or(Ok(false), |raw| {
            parse_flag(raw).ok_or_else(|| Error::validation(key, format!("'{raw}' is not a boolean")))
        })
    }

    /// Parses `key` as a positive integer.
    pub fn positive(&self, key: &str) -> Result<Option<u64>> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        Error::validation(key, format!("'{raw}' is not a positive integer"))
                    })
            })
            .transpose()
    }

    /// The requested page: `page` (1-based) and `limit`, falling back to the
    /// configured page size.
    ///
    /// # Errors
    /// A `limit` above [`MAX_PAGE_SIZE`] is a validation error. A page too far
    /// out to be addressed at all is [`Error::NotFound`].
    pub fn page(&self) -> Result<PageRequest> {
        let per_page = match self.positive("limit")? {
            Some(limit) if limit > MAX_PAGE_SIZE => {
                return Err(Error::validation(
                    "limit",
                    format!("Ensure this value is less than or equal to {MAX_PAGE_SIZE}"),
                ));
            }
            Some(limit) => limit,
            None => self.default_limit,
        };
        let request = PageRequest::new(self.positive("page")?.unwrap_or(1), per_page);
        match request.offset() {
            Some(_) => Ok(request),
            None => Err(request.not_found()),
        }
    }

    /// Link to `page` of the same listing, keeping every other parameter.
    fn page_link(&self, page: u64) -> String {
        let page_param = format!("page={page}");
        let mut params: Vec<&str> = self
            .raw
            .as_deref()
            .unwrap_or_default()
            .split('&')
            .filter(|p| !p.is_empty() && *p != "page" && !p.starts_with("page="))
            .collect();
        if page > 1 {
            params.push(&page_param);
        }

        if params.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, params.join("&"))
        }
    }

    /// Wraps one page of `results` out of `count` rows.
    ///
    /// # Errors
    /// A page past the end of a non-empty listing is [`Error::NotFound`].
    pub fn paginate<T>(&self, results: Vec<T>, count: u64, page: PageRequest) -> Result<Paginated<T>> {
        let last_page = count.div_ceil(page.per_page).max(1);
        if page.page > last_page {
            return Err(page.not_found());
        }

        Ok(Paginated {
            count,
            next: (page.page < last_page).then(|| self.page_link(page.page + 1)),
            previous: (page.page > 1).then(|| self.page_link(page.page - 1)),
            results,
        })
    }
}

/// Page-number pagination envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    /// Rows in the whole listing
    pub count: u64,
    /// Link to the following page, if any
    pub next: Option<String>,
    /// Link to the preceding page, if any
    pub previous: Option<String>,
    pub results: Vec<T>,
}
