//! List endpoint description

use backoffice_domain::{ApiRequest, HttpMethod, PageParamStyle, QueryFilters};
use serde_json::Value;

/// How a store reaches its list endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEndpoint {
    /// Logical endpoint key resolved by the gateway
    pub endpoint: String,
    pub method: HttpMethod,
    /// Path segments appended after the resolved path
    pub segments: Vec<String>,
    pub page_params: PageParamStyle,
    /// Name of the search parameter (`search` unless overridden)
    pub search_param: String,
    /// Entity-specific member holding the items (`jobs`)
    pub items_key: Option<String>,
}

impl ListEndpoint {
    /// List fetched with `GET`, filters in the query string.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            segments: Vec::new(),
            page_params: PageParamStyle::Page,
            search_param: "search".to_string(),
            items_key: None,
        }
    }

    /// List fetched with `POST`, filters in the JSON body.
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self { method: HttpMethod::Post, ..Self::get(endpoint) }
    }

    #[must_use]
    pub fn segment(mut self, segment: impl ToString) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    #[must_use]
    pub const fn page_params(mut self, style: PageParamStyle) -> Self {
        self.page_params = style;
        self
    }

    #[must_use]
    pub fn search_param(mut self, name: impl Into<String>) -> Self {
        self.search_param = name.into();
        self
    }

    #[must_use]
    pub fn items_key(mut self, key: impl Into<String>) -> Self {
        self.items_key = Some(key.into());
        self
    }

    /// Gateway request for one page under `filters`.
    pub fn request<F: QueryFilters>(&self, filters: &F) -> ApiRequest {
        let mut request = ApiRequest::new(self.method, self.endpoint.clone());
        request.segments.clone_from(&self.segments);

        match self.method {
            HttpMethod::Get | HttpMethod::Delete => {
                request.queries(filters.to_query(self.page_params, &self.search_param))
            }
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => request
                .json(Value::Object(filters.to_body(self.page_params, &self.search_param))),
        }
    }
}
