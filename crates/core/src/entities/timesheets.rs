//! Timesheets, invoice reports and payslips

use backoffice_domain::{ApiRequest, PageParamStyle, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::EntityStore;
use crate::query::{ListEndpoint, Mutation};

pub type TimesheetStore = EntityStore;
pub type InvoiceStore = EntityStore;

pub fn list() -> ListEndpoint {
    ListEndpoint::get("timesheets.list")
}

pub fn approve(timesheet_id: impl Into<RecordId>) -> Mutation {
    let id = timesheet_id.into();
    Mutation::new(ApiRequest::post("timesheets.approve").json(json!({ "tsm_id": &id })))
        .with_message("Timesheet approved")
}

pub fn reject(timesheet_id: impl Into<RecordId>) -> Mutation {
    let id = timesheet_id.into();
    Mutation::new(ApiRequest::post("timesheets.reject").json(json!({ "tsm_id": &id })))
        .with_message("Timesheet rejected")
}

/// Corrected shift for one timesheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetCorrection {
    pub tsm_id: RecordId,
    pub start: String,
    pub end: String,
    pub break_time: String,
    pub amount: f64,
    pub location: String,
}

pub fn update(correction: &TimesheetCorrection) -> Mutation {
    Mutation::new(ApiRequest::post("timesheets.update").json(json!(correction)))
        .with_message("Timesheet updated")
}

/// Report listing used by the invoices view.
pub fn invoices() -> ListEndpoint {
    ListEndpoint::get("invoices.list").items_key("reports")
}

/// Generated report for a date range. Paged with `pageNumber`, and the
/// range goes in the body alongside the paging fields.
pub fn invoice_report() -> ListEndpoint {
    ListEndpoint::post("invoices.generate")
        .page_params(PageParamStyle::PageNumber)
        .items_key("reports")
}

/// Stores payslips for the report described by `report` (date range and
/// client).
pub fn generate_payslips(report: Value) -> Mutation {
    Mutation::new(ApiRequest::post("payslips.generate").json(report))
        .with_message("Payslips generated")
}
