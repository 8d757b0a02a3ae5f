//! Job applications and bookings

use backoffice_domain::{ApiRequest, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::EntityStore;
use crate::query::{ListEndpoint, Mutation};

pub type ApplicationStore = EntityStore;
pub type BookingStore = EntityStore;

pub fn list() -> ListEndpoint {
    ListEndpoint::get("applications.list")
}

pub fn accept(application_id: impl Into<RecordId>) -> Mutation {
    let id = application_id.into();
    Mutation::new(ApiRequest::post("applications.accept").json(json!({ "id": &id })))
        .with_message("Application accepted")
}

pub fn decline(application_id: impl Into<RecordId>) -> Mutation {
    let id = application_id.into();
    Mutation::new(ApiRequest::post("applications.decline").json(json!({ "id": &id })))
        .with_message("Application declined")
}

/// Interview slot offered to an applicant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub application_id: RecordId,
    /// `YYYY-MM-DD`
    pub interview_date: String,
    /// `HH:MM`
    pub interview_time: String,
    pub interview_by: String,
    pub interview_link: String,
}

pub fn schedule_interview(interview: &Interview) -> Mutation {
    Mutation::new(ApiRequest::post("applications.interview").json(json!(interview)))
        .with_message("Interview scheduled")
}

pub fn bookings() -> ListEndpoint {
    ListEndpoint::get("bookings.list")
}

pub fn book(job_id: impl Into<RecordId>, candidate_id: impl Into<RecordId>) -> Mutation {
    let (job_id, candidate_id) = (job_id.into(), candidate_id.into());
    let body = json!({ "job_id": &job_id, "candidate_id": &candidate_id });
    Mutation::new(ApiRequest::post("bookings.create").json(body)).with_message("Booking created")
}

pub fn cancel_booking(booking_id: impl Into<RecordId>) -> Mutation {
    Mutation::new(ApiRequest::delete("bookings.delete").segment(booking_id.into()))
        .with_message("Booking deleted")
}

#[cfg(test)]
mod tests {
    use backoffice_domain::RequestBody;

    use super::*;

    #[test]
    fn interview_body_uses_wire_names() {
        let interview = Interview {
            application_id: RecordId::Number(8),
            interview_date: "2026-11-02".into(),
            interview_time: "14:30".into(),
            interview_by: "R. Okafor".into(),
            interview_link: "https://meet.example.test/abc".into(),
        };
        let request = schedule_interview(&interview).request;
        let RequestBody::Json(body) = request.body else { panic!("expected json body") };
        assert_eq!(body["application_id"], json!(8));
        assert_eq!(body["interview_time"], json!("14:30"));
    }

    #[test]
    fn booking_pairs_job_and_candidate() {
        let request = book(4_i64, "cand-9").request;
        assert_eq!(request.body, RequestBody::Json(json!({"job_id": 4, "candidate_id": "cand-9"})));
    }
}
