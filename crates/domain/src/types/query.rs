//! Reactive list state shared by every entity store.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

/// Pagination window of the last successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub const fn with_page_size(page_size: u32) -> Self {
        Self { page: DEFAULT_PAGE, page_size, total_count: 0, total_pages: 0 }
    }

    /// Page count implied by `total_count` and `page_size`.
    #[must_use]
    pub fn pages_for(total_count: u64, page_size: u32) -> u32 {
        if page_size == 0 {
            return 0;
        }
        u32::try_from(total_count.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > DEFAULT_PAGE
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

/// One normalised page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// How an endpoint family names its paging query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageParamStyle {
    /// `page` / `pageSize`
    #[default]
    Page,
    /// `pageNumber` / `pageSize`
    PageNumber,
}

impl PageParamStyle {
    #[must_use]
    pub const fn page_key(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::PageNumber => "pageNumber",
        }
    }
}

/// Filters every list endpoint understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilters {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Free-form field filters set through `filter_by`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

impl ListFilters {
    pub fn with_page_size(page_size: u32) -> Self {
        Self { page_size, ..Self::default() }
    }
}

impl Default for ListFilters {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, page_size: DEFAULT_PAGE_SIZE, search: None, fields: BTreeMap::new() }
    }
}

/// Partial filter update merged over a store's remembered filters.
///
/// `search: Some(None)` clears the term; a field mapped to `None` removes
/// that filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<Option<String>>,
    pub fields: BTreeMap<String, Option<Value>>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub const fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the search term; blank terms clear it.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let term = term.trim();
        self.search = Some((!term.is_empty()).then(|| term.to_string()));
        self
    }

    /// Sets a field filter; `Value::Null` removes it.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.fields.insert(name.into(), (!value.is_null()).then_some(value));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.page.is_none()
            && self.page_size.is_none()
            && self.search.is_none()
            && self.fields.is_empty()
    }
}

/// Filter type carried by a `QueryStore`.
///
/// Every filter type embeds [`ListFilters`]; entity-specific types add typed
/// fields and route matching `filter_by` names to them in [`apply`].
///
/// [`apply`]: QueryFilters::apply
pub trait QueryFilters: Clone + Default + Debug + PartialEq + Send + Sync + 'static {
    fn base(&self) -> &ListFilters;

    fn base_mut(&mut self) -> &mut ListFilters;

    /// Merge `patch` into `self`.
    fn apply(&mut self, patch: &FilterPatch) {
        apply_base(self.base_mut(), patch);
    }

    /// Extra parameters contributed by entity-specific fields.
    fn extra_params(&self) -> Vec<(String, Value)> {
        Vec::new()
    }

    /// Every list parameter with its JSON value; `search_key` names the
    /// search parameter (`search`, or `searchTerm` on some endpoint
    /// families).
    fn to_params(&self, style: PageParamStyle, search_key: &str) -> Vec<(String, Value)> {
        let base = self.base();
        let mut params = vec![
            (style.page_key().to_string(), Value::from(base.page)),
            ("pageSize".to_string(), Value::from(base.page_size)),
        ];
        if let Some(term) = &base.search {
            params.push((search_key.to_string(), Value::String(term.clone())));
        }
        params.extend(base.fields.iter().map(|(name, value)| (name.clone(), value.clone())));
        params.extend(self.extra_params());
        params
    }

    /// Query string for a `GET` list request.
    fn to_query(&self, style: PageParamStyle, search_key: &str) -> Vec<(String, String)> {
        self.to_params(style, search_key)
            .into_iter()
            .map(|(name, value)| (name, query_value(&value)))
            .collect()
    }

    /// JSON body for a list fetched with `POST`; values keep their type.
    fn to_body(&self, style: PageParamStyle, search_key: &str) -> Map<String, Value> {
        self.to_params(style, search_key).into_iter().collect()
    }
}

/// Applies the shared part of a patch.
pub fn apply_base(base: &mut ListFilters, patch: &FilterPatch) {
    if let Some(page) = patch.page {
        base.page = page.max(DEFAULT_PAGE);
    }
    if let Some(page_size) = patch.page_size {
        base.page_size = page_size.max(1);
    }
    if let Some(search) = &patch.search {
        base.search.clone_from(search);
    }
    for (name, value) in &patch.fields {
        match value {
            Some(value) => {
                base.fields.insert(name.clone(), value.clone());
            }
            None => {
                base.fields.remove(name);
            }
        }
    }
}

/// Renders a JSON value as a query-string value (strings unquoted).
#[must_use]
pub fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl QueryFilters for ListFilters {
    fn base(&self) -> &ListFilters {
        self
    }

    fn base_mut(&mut self) -> &mut ListFilters {
        self
    }
}

/// State observed by the UI layer for one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T, F = ListFilters> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub pagination: Pagination,
    pub filters: F,
    pub selected: Option<T>,
}

impl<T, F: QueryFilters> QueryState<T, F> {
    /// Empty state whose filters start from `filters`.
    pub fn initial(filters: F) -> Self {
        let pagination = Pagination::with_page_size(filters.base().page_size);
        Self { items: Vec::new(), loading: false, error: None, pagination, filters, selected: None }
    }
}

impl<T, F: QueryFilters> Default for QueryState<T, F> {
    fn default() -> Self {
        Self::initial(F::default())
    }
}

/// Result shape every mutation returns to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub success: bool,
    pub message: String,
}

impl MutationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}
