//! Candidates and their verification

use backoffice_domain::{
    apply_base, ApiRequest, FilterPatch, ListFilters, QueryFilters, RecordId,
};
use serde_json::{json, Value};

use super::{patch_bool, patch_string, EntityStore};
use crate::query::{ListEndpoint, Mutation};

pub type CandidateStore = EntityStore<CandidateFilters>;

pub fn list() -> ListEndpoint {
    ListEndpoint::get("candidates.list")
}

/// Full profile of one candidate, for `fetch_one`.
pub fn details(candidate_id: impl Into<RecordId>) -> ApiRequest {
    let id = candidate_id.into();
    ApiRequest::post("candidates.details").json(json!({ "id": &id }))
}

/// Records the admin's verification decision. The body carries the
/// candidate id and the checks the admin signed off.
pub fn verify(verification: Value) -> Mutation {
    Mutation::new(ApiRequest::post("candidates.verify").json(verification))
        .with_message("Candidate verified")
}

/// Candidate list filters with the typed flags the endpoint understands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilters {
    pub base: ListFilters,
    pub is_active: Option<bool>,
    pub user_type: Option<String>,
    pub is_admin_verified: Option<bool>,
    pub is_email_verified: Option<bool>,
    pub qualification: Option<String>,
}

impl QueryFilters for CandidateFilters {
    fn base(&self) -> &ListFilters {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ListFilters {
        &mut self.base
    }

    fn apply(&mut self, patch: &FilterPatch) {
        let mut patch = patch.clone();
        patch_bool(&mut self.is_active, &mut patch, "isActive");
        patch_string(&mut self.user_type, &mut patch, "userType");
        patch_bool(&mut self.is_admin_verified, &mut patch, "isAdminVerified");
        patch_bool(&mut self.is_email_verified, &mut patch, "isEmailVerified");
        patch_string(&mut self.qualification, &mut patch, "qualificationReadableName");
        apply_base(&mut self.base, &patch);
    }

    fn extra_params(&self) -> Vec<(String, Value)> {
        let flags = [
            ("isActive", self.is_active.map(Value::Bool)),
            ("userType", self.user_type.clone().map(Value::String)),
            ("isAdminVerified", self.is_admin_verified.map(Value::Bool)),
            ("isEmailVerified", self.is_email_verified.map(Value::Bool)),
            ("qualificationReadableName", self.qualification.clone().map(Value::String)),
        ];
        flags
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name.to_string(), value)))
            .collect()
    }
}
