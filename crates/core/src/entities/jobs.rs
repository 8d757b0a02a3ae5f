//! Jobs: permanent, temporary and internal postings, plus the weekly
//! timesheets recorded against internal jobs

use std::fmt;

use backoffice_domain::{
    apply_base, ApiRequest, FilterPatch, ListFilters, QueryFilters, RecordId,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{take_field, EntityStore};
use crate::query::{ListEndpoint, Mutation};

pub type JobStore = EntityStore;
pub type WeeklyTimesheetStore = EntityStore<WeeklyTimesheetFilters>;

pub fn permanent_list() -> ListEndpoint {
    ListEndpoint::get("jobs.permanent.list").items_key("jobs")
}

pub fn temporary_list() -> ListEndpoint {
    ListEndpoint::get("jobs.temporary.list").items_key("jobs")
}

pub fn posted_list() -> ListEndpoint {
    ListEndpoint::get("jobs.posted.list").items_key("jobs")
}

/// Internal jobs across all clients. This family answers with a bare
/// `{jobs, totalCount}` body and searches on `searchTerm`.
pub fn internal_list() -> ListEndpoint {
    ListEndpoint::get("internal_jobs.list").search_param("searchTerm").items_key("jobs")
}

pub fn internal_for_client(client_id: impl Into<RecordId>) -> ListEndpoint {
    ListEndpoint::get("internal_jobs.by_client")
        .segment(client_id.into())
        .search_param("searchTerm")
        .items_key("jobs")
}

pub fn weekly_timesheets() -> ListEndpoint {
    ListEndpoint::get("internal_jobs.weekly_timesheets").items_key("weeklyTimesheets")
}

/// Temporary job posted for a client.
pub fn create(client_id: impl Into<RecordId>, job: Value) -> Mutation {
    Mutation::new(ApiRequest::post("jobs.create").query("clientId", client_id.into()).json(job))
        .with_message("Job created")
}

pub fn create_permanent(job: Value) -> Mutation {
    Mutation::new(ApiRequest::post("jobs.permanent.create").json(job))
        .with_message("Permanent job created")
}

pub fn update(job_id: impl Into<RecordId>, client_id: impl Into<RecordId>, job: Value) -> Mutation {
    Mutation::new(
        ApiRequest::put("jobs.update")
            .segment(job_id.into())
            .query("clientId", client_id.into())
            .json(job),
    )
    .with_message("Job updated")
}

pub fn delete(job_id: impl Into<RecordId>) -> Mutation {
    Mutation::new(ApiRequest::delete("jobs.delete").segment(job_id.into()))
        .with_message("Job deleted")
}

/// Publishes or withdraws a job; the server takes the flag as 1/0.
pub fn set_published(job_id: impl Into<RecordId>, published: bool) -> Mutation {
    let id = job_id.into();
    let message = if published { "Job published" } else { "Job unpublished" };
    Mutation::new(
        ApiRequest::post("jobs.publish").json(json!({"id": &id, "publish": u8::from(published)})),
    )
    .with_message(message)
}

pub fn update_internal(job_id: impl Into<RecordId>, job: Value) -> Mutation {
    Mutation::new(ApiRequest::put("internal_jobs.item").segment(job_id.into()).json(job))
        .with_message("Internal job updated")
}

pub fn delete_internal(job_id: impl Into<RecordId>) -> Mutation {
    Mutation::new(ApiRequest::delete("internal_jobs.item").segment(job_id.into()))
        .with_message("Internal job deleted")
}

/// Review state of a weekly timesheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeeklyStatus {
    #[default]
    Pending,
    Completed,
}

impl WeeklyStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for WeeklyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn set_weekly_status(
    job_id: impl Into<RecordId>,
    candidate_id: impl Into<RecordId>,
    timesheet_id: impl Into<RecordId>,
    status: &str,
) -> Mutation {
    let request = ApiRequest::patch("internal_jobs.item")
        .segment(job_id.into())
        .segment("candidates")
        .segment(candidate_id.into())
        .segment("timesheets")
        .segment("weekly")
        .segment(timesheet_id.into())
        .segment("status")
        .json(json!({"status": status}));
    Mutation::new(request).with_message("Timesheet status updated")
}

/// Filters for the weekly timesheet list. The server always expects a
/// `weeklyStatus`, so it is never absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyTimesheetFilters {
    pub base: ListFilters,
    pub weekly_status: WeeklyStatus,
}

impl QueryFilters for WeeklyTimesheetFilters {
    fn base(&self) -> &ListFilters {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ListFilters {
        &mut self.base
    }

    fn apply(&mut self, patch: &FilterPatch) {
        let mut patch = patch.clone();
        if let Some(value) = take_field(&mut patch, "weeklyStatus") {
            self.weekly_status = value
                .as_ref()
                .and_then(Value::as_str)
                .and_then(WeeklyStatus::parse)
                .unwrap_or_default();
        }
        apply_base(&mut self.base, &patch);
    }

    fn extra_params(&self) -> Vec<(String, Value)> {
        vec![("weeklyStatus".to_string(), Value::from(self.weekly_status.as_str()))]
    }
}
