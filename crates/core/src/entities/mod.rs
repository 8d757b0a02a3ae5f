//! Entity catalog
//!
//! List endpoints, filter types and mutation builders for every back-office
//! entity. Items are kept as [`Record`]s: field schemas belong to the UI
//! layer, the store only needs an id.

pub mod access;
pub mod applications;
pub mod candidates;
pub mod clients;
pub mod jobs;
pub mod timesheets;

use backoffice_domain::{FilterPatch, ListFilters, Record};
use serde_json::Value;

use crate::query::QueryStore;

/// Store over raw records with the given filter type
pub type EntityStore<F = ListFilters> = QueryStore<Record, F>;

/// Removes `name` from `patch` and reports what the patch wanted for it:
/// `None` when untouched, `Some(None)` when cleared.
pub(crate) fn take_field(patch: &mut FilterPatch, name: &str) -> Option<Option<Value>> {
    patch.fields.remove(name)
}

/// Applies a patched boolean filter; anything that is not a bool clears it.
pub(crate) fn patch_bool(slot: &mut Option<bool>, patch: &mut FilterPatch, name: &str) {
    if let Some(value) = take_field(patch, name) {
        *slot = value.as_ref().and_then(Value::as_bool);
    }
}

pub(crate) fn patch_string(slot: &mut Option<String>, patch: &mut FilterPatch, name: &str) {
    if let Some(value) = take_field(patch, name) {
        *slot = value.map(|v| backoffice_domain::query_value(&v)).filter(|v| !v.trim().is_empty());
    }
}
