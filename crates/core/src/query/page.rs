//! Page adapter
//!
//! List endpoints disagree on where items and paging metadata live. This
//! module normalises every shape the admin API produces into [`Page`]:
//!
//! - `data: {items, page, pageSize, totalCount, totalPages}` (canonical)
//! - `data: {<entity key>: [...], currentPage | pageNumber, ...}`
//! - a nested `pagination` object inside `data` or beside it
//! - `data: [...]` with an optional top-level `totalCount` (legacy)
//!
//! Metadata the server omits is taken from the filters of the request.

use backoffice_domain::{Envelope, ListFilters, Page, Pagination, RequestError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const ITEM_KEYS: [&str; 3] = ["items", "data", "rows"];
const PAGE_KEYS: [&str; 3] = ["page", "currentPage", "pageNumber"];
const PAGE_SIZE_KEYS: [&str; 2] = ["pageSize", "page_size"];
const TOTAL_COUNT_KEYS: [&str; 3] = ["totalCount", "total_count", "total"];
const TOTAL_PAGES_KEYS: [&str; 2] = ["totalPages", "total_pages"];

/// Converts a list response into a typed page.
///
/// `items_key` names the entity-specific items member (`jobs`,
/// `weeklyTimesheets`), tried before the generic names.
///
/// # Errors
/// `MalformedResponse` when `data` is missing, holds no item array, or an
/// item does not decode as `T`.
pub fn into_page<T: DeserializeOwned>(
    envelope: Envelope,
    items_key: Option<&str>,
    requested: &ListFilters,
) -> Result<Page<T>, RequestError> {
    let data = envelope.data.ok_or_else(|| RequestError::malformed("list response has no data"))?;
    let outer = &envelope.extra;

    let (raw_items, meta) = match data {
        Value::Array(items) => (items, Map::new()),
        Value::Object(mut map) => {
            let items = take_items(&mut map, items_key).ok_or_else(|| {
                RequestError::malformed("list response has no item array")
            })?;
            (items, map)
        }
        Value::Null => return Err(RequestError::malformed("list response has no data")),
        other => {
            return Err(RequestError::malformed(format!(
                "list data is {}, expected array or object",
                kind_of(&other)
            )))
        }
    };

    let item_count = raw_items.len();
    let items = raw_items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| RequestError::malformed(format!("unexpected item shape: {e}")))?;

    let sources = [Some(&meta), nested(&meta), Some(outer), nested(outer)];
    let page = lookup_u64(&sources, &PAGE_KEYS).map_or(requested.page, saturate_u32);
    let page_size = lookup_u64(&sources, &PAGE_SIZE_KEYS)
        .filter(|size| *size > 0)
        .map_or(requested.page_size, saturate_u32);
    let total_count = lookup_u64(&sources, &TOTAL_COUNT_KEYS).unwrap_or(item_count as u64);
    let total_pages = lookup_u64(&sources, &TOTAL_PAGES_KEYS)
        .map_or_else(|| Pagination::pages_for(total_count, page_size), saturate_u32);

    Ok(Page { items, pagination: Pagination { page, page_size, total_count, total_pages } })
}

fn take_items(map: &mut Map<String, Value>, items_key: Option<&str>) -> Option<Vec<Value>> {
    if let Some(items) = items_key.and_then(|key| take_array(map, key)) {
        return Some(items);
    }
    ITEM_KEYS.iter().find_map(|key| take_array(map, key))
}

fn take_array(map: &mut Map<String, Value>, key: &str) -> Option<Vec<Value>> {
    if !map.get(key).is_some_and(Value::is_array) {
        return None;
    }
    match map.remove(key) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn nested(map: &Map<String, Value>) -> Option<&Map<String, Value>> {
    map.get("pagination").and_then(Value::as_object)
}

fn lookup_u64(sources: &[Option<&Map<String, Value>>], keys: &[&str]) -> Option<u64> {
    sources.iter().flatten().find_map(|map| keys.iter().find_map(|key| as_u64(map.get(*key)?)))
}

/// Accepts integers and numeric strings (`"3"`), which some endpoints send.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
