//! Mutations run through a store
//!
//! Every create, update, delete or status change follows one discipline:
//! the store's previous error is cleared, the gateway is called, a failure
//! is surfaced as the store error and returned as a failed
//! [`MutationOutcome`](backoffice_domain::MutationOutcome), and a success
//! triggers exactly one refetch with the filters then in effect. Items are
//! never patched in place.

use backoffice_domain::constants::MSG_OPERATION_SUCCEEDED;
use backoffice_domain::{ApiRequest, Envelope};

/// A state-changing request plus the message reported on success
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub request: ApiRequest,
    pub success_message: Option<String>,
}

impl Mutation {
    pub fn new(request: ApiRequest) -> Self {
        Self { request, success_message: None }
    }

    /// Message used when the server does not send one.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    /// Message reported for a successful `envelope`: the server's own, else
    /// this mutation's, else a generic one.
    pub(crate) fn success_text(&self, envelope: &Envelope) -> String {
        envelope
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| self.success_message.clone())
            .unwrap_or_else(|| MSG_OPERATION_SUCCEEDED.to_string())
    }
}

impl From<ApiRequest> for Mutation {
    fn from(request: ApiRequest) -> Self {
        Self::new(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins() {
        let mutation = Mutation::new(ApiRequest::post("jobs.create")).with_message("Job created");
        let mut envelope = Envelope::empty(200);
        assert_eq!(mutation.success_text(&envelope), "Job created");

        envelope.message = Some("Saved".into());
        assert_eq!(mutation.success_text(&envelope), "Saved");

        let bare = Mutation::from(ApiRequest::delete("jobs.delete"));
        assert_eq!(bare.success_text(&Envelope::empty(204)), MSG_OPERATION_SUCCEEDED);
    }
}
