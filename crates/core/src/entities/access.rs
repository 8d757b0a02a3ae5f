//! Roles and system users (admins)

use std::collections::BTreeSet;

use backoffice_domain::{ApiRequest, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::EntityStore;
use crate::query::{ListEndpoint, Mutation};

pub type RoleStore = EntityStore;
pub type AdminStore = EntityStore;

pub fn roles() -> ListEndpoint {
    ListEndpoint::get("roles.list")
}

/// A role and the access rights it grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub role_name: String,
    pub role_description: String,
    pub access: BTreeSet<String>,
}

pub fn create_role(role: &RoleDraft) -> Mutation {
    let mut role = role.clone();
    role.id = None;
    Mutation::new(ApiRequest::post("roles.create").json(json!(role))).with_message("Role created")
}

pub fn update_role(role_id: impl Into<RecordId>, role: &RoleDraft) -> Mutation {
    let role = RoleDraft { id: Some(role_id.into()), ..role.clone() };
    Mutation::new(ApiRequest::patch("roles.update").json(json!(role))).with_message("Role updated")
}

pub fn delete_role(role_id: impl Into<RecordId>) -> Mutation {
    let id = role_id.into();
    Mutation::new(ApiRequest::delete("roles.delete").json(json!({ "id": &id })))
        .with_message("Role deleted")
}

pub fn admins() -> ListEndpoint {
    ListEndpoint::get("admins.list")
}

/// System user as the admin endpoints expect it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub role_id: RecordId,
    pub full_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

pub fn create_admin(admin: &AdminDraft) -> Mutation {
    let admin = AdminDraft { id: None, ..admin.clone() };
    Mutation::new(ApiRequest::post("admins.create").json(json!(admin)))
        .with_message("System user created")
}

pub fn update_admin(admin_id: impl Into<RecordId>, admin: &AdminDraft) -> Mutation {
    let admin = AdminDraft { id: Some(admin_id.into()), ..admin.clone() };
    Mutation::new(ApiRequest::patch("admins.update").json(json!(admin)))
        .with_message("System user updated")
}
