//! Client companies

use backoffice_domain::{ApiRequest, FormPart, RecordId};
use serde_json::json;

use super::EntityStore;
use crate::query::{ListEndpoint, Mutation};

pub type ClientStore = EntityStore;

pub fn list() -> ListEndpoint {
    ListEndpoint::get("clients.list")
}

pub fn details(client_id: impl Into<RecordId>) -> ApiRequest {
    let id = client_id.into();
    ApiRequest::post("clients.details").json(json!({ "id": &id }))
}

/// Registers a client. The form carries the company fields and its logo.
pub fn create(form: Vec<FormPart>) -> Mutation {
    Mutation::new(ApiRequest::post("clients.create").multipart(form))
        .with_message("Client created")
}

/// Updates a client; the id travels inside the form as `id`.
pub fn update(client_id: impl Into<RecordId>, mut form: Vec<FormPart>) -> Mutation {
    form.retain(|part| part.name() != "id");
    form.insert(0, FormPart::text("id", client_id.into().to_string()));
    Mutation::new(ApiRequest::patch("clients.update").multipart(form))
        .with_message("Client updated")
}

pub fn unarchive(client_id: impl Into<RecordId>) -> Mutation {
    let id = client_id.into();
    Mutation::new(ApiRequest::post("clients.unarchive").json(json!({ "id": &id })))
        .with_message("Client restored")
}
