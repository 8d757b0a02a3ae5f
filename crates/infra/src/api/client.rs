//! Authenticated request gateway over HTTP
//!
//! Resolves logical endpoint keys against the configured base URL, attaches
//! the bearer token, and classifies every response into an [`Envelope`] or a
//! [`RequestError`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoffice_core::{AccessTokenProvider, ApiGateway};
use backoffice_domain::{
    ApiConfig, ApiRequest, BackofficeError, EndpointRegistry, Envelope, FormPart, HttpMethod,
    RequestBody, RequestError,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::transport_error;
use crate::http::HttpClient;

/// Longest plain-text error body surfaced as a server message.
const MAX_TEXT_MESSAGE_LEN: usize = 200;

/// HTTP implementation of [`ApiGateway`]
pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
    endpoints: EndpointRegistry,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl ApiClient {
    /// # Errors
    /// Returns `BackofficeError::Config` for an unparseable base URL or an
    /// HTTP client that cannot be built.
    pub fn new(
        config: &ApiConfig,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, BackofficeError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Self::with_http(http, config, tokens)
    }

    /// Client reusing an existing transport.
    ///
    /// # Errors
    /// Returns `BackofficeError::Config` for an unparseable base URL.
    pub fn with_http(
        http: HttpClient,
        config: &ApiConfig,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, BackofficeError> {
        let base_url = parse_base_url(&config.base_url)?;
        Ok(Self { http, base_url, endpoints: config.endpoints.clone(), tokens })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for `request`: resolved path, segments, then query.
    ///
    /// # Errors
    /// `InvalidRequest` when the endpoint key is not registered.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, RequestError> {
        let path = self.endpoints.resolve(&request.endpoint).ok_or_else(|| {
            RequestError::invalid_request(format!("unknown endpoint `{}`", request.endpoint))
        })?;

        let mut url = self.base_url.join(path.trim_start_matches('/')).map_err(|e| {
            RequestError::invalid_request(format!("bad path for `{}`: {e}", request.endpoint))
        })?;

        if !request.segments.is_empty() {
            let mut segments = url.path_segments_mut().map_err(|()| {
                RequestError::invalid_request("base URL cannot carry path segments")
            })?;
            segments.pop_if_empty().extend(&request.segments);
        }

        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &request.query {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }

    /// Send `request` without a bearer token.
    ///
    /// Used for login; a 401 here is an ordinary rejection and never touches
    /// the session.
    ///
    /// # Errors
    /// Same classification as [`ApiGateway::request`].
    #[instrument(skip(self, request), fields(method = %request.method, endpoint = %request.endpoint))]
    pub async fn send_unauthenticated(&self, request: ApiRequest) -> Result<Envelope, RequestError> {
        self.execute(request, None).await
    }

    async fn execute(
        &self,
        request: ApiRequest,
        bearer: Option<&str>,
    ) -> Result<Envelope, RequestError> {
        let url = self.url_for(&request)?;
        let mut builder = self.http.request(method_of(request.method), url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder = attach_body(builder, request.body)?;

        let response = self.http.send(builder).await?;
        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        if status == StatusCode::UNAUTHORIZED {
            if let Some(token) = bearer {
                warn!("Server rejected the access token; ending session");
                self.tokens.on_unauthorized(token).await;
                return Err(RequestError::session_expired().with_status(status.as_u16()));
            }
        }

        let result = classify(status, &body);
        match &result {
            Ok(_) => debug!(status = status.as_u16(), "Request succeeded"),
            Err(err) => debug!(status = status.as_u16(), error = %err, "Request failed"),
        }
        result
    }
}

#[async_trait]
impl ApiGateway for ApiClient {
    #[instrument(skip(self, request), fields(method = %request.method, endpoint = %request.endpoint))]
    async fn request(&self, request: ApiRequest) -> Result<Envelope, RequestError> {
        let token = self.tokens.access_token().await?;
        self.execute(request, Some(&token)).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, BackofficeError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| BackofficeError::Config(format!("invalid API base URL `{raw}`: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(BackofficeError::Config(format!("API base URL `{raw}` cannot be a base")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

const fn method_of(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn attach_body(builder: RequestBuilder, body: RequestBody) -> Result<RequestBuilder, RequestError> {
    match body {
        RequestBody::Empty => Ok(builder),
        RequestBody::Json(value) => Ok(builder.json(&value)),
        RequestBody::Multipart(parts) => {
            let mut form = Form::new();
            for part in parts {
                form = match part {
                    FormPart::Text { name, value } => form.text(name, value),
                    FormPart::File { name, file_name, content_type, bytes } => {
                        let mut file = Part::bytes(bytes).file_name(file_name);
                        if let Some(content_type) = content_type {
                            file = file.mime_str(&content_type).map_err(|e| {
                                RequestError::invalid_request(format!(
                                    "invalid content type `{content_type}`: {e}"
                                ))
                            })?;
                        }
                        form.part(name, file)
                    }
                };
            }
            Ok(builder.multipart(form))
        }
    }
}

/// Maps a status and raw body to the gateway result.
fn classify(status: StatusCode, body: &str) -> Result<Envelope, RequestError> {
    let code = status.as_u16();

    if !status.is_success() {
        return Err(RequestError::rejected(Some(code), error_message(code, body)));
    }

    if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) || body.trim().is_empty()
    {
        return Ok(Envelope::empty(code));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| RequestError::malformed(format!("response is not JSON: {e}")).with_status(code))?;
    Envelope::from_body(value, code)
        .map_err(|e| RequestError::malformed(format!("unexpected envelope shape: {e}")).with_status(code))?
        .into_result()
}

/// Server message of an error response: the envelope's, else a short text body.
fn error_message(status: u16, body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let from_envelope = Envelope::from_body(value.clone(), status)
            .ok()
            .and_then(|envelope| envelope.server_message());
        return from_envelope.or_else(|| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        });
    }

    let text = body.trim();
    (!text.is_empty() && text.len() <= MAX_TEXT_MESSAGE_LEN && !text.starts_with('<'))
        .then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use backoffice_core::testing::token_expiring_at;
    use backoffice_core::{MemorySessionStorage, SessionContext};
    use backoffice_domain::RequestErrorKind;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn signed_in() -> (Arc<SessionContext>, String) {
        let session = Arc::new(SessionContext::new(Arc::new(MemorySessionStorage::new())));
        let token = token_expiring_at(Utc::now() + ChronoDuration::hours(1));
        session.set_token(token.clone(), None).unwrap();
        (session, token)
    }

    fn client_for(server: &MockServer, session: Arc<SessionContext>) -> ApiClient {
        let config = ApiConfig { base_url: format!("{}/api", server.uri()), ..ApiConfig::default() };
        ApiClient::new(&config, session).unwrap()
    }

    #[test]
    fn url_joins_path_segments_and_query() {
        let session = Arc::new(SessionContext::new(Arc::new(MemorySessionStorage::new())));
        let config = ApiConfig { base_url: "https://admin.example.test/v1".into(), ..ApiConfig::default() };
        let client = ApiClient::new(&config, session).unwrap();

        let request = ApiRequest::get("internal_jobs.by_client")
            .segment(42)
            .query("searchTerm", "night shift")
            .query("page", 2);
        let url = client.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://admin.example.test/v1/internal-jobs/clients/42?searchTerm=night+shift&page=2"
        );

        let err = client.url_for(&ApiRequest::get("no.such.endpoint")).unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let server = MockServer::start().await;
        let (session, token) = signed_in();
        Mock::given(method("GET"))
            .and(path("/api/get-all-candidate"))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "statusCode": 200,
                "data": {"items": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, session);
        let envelope = client.request(ApiRequest::get("candidates.list").query("page", 1)).await.unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data, Some(json!({"items": []})));
    }

    #[tokio::test]
    async fn missing_token_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let session = Arc::new(SessionContext::new(Arc::new(MemorySessionStorage::new())));
        let client = client_for(&server, session);
        let err = client.request(ApiRequest::get("clients.list")).await.unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn no_content_is_empty_success() {
        let server = MockServer::start().await;
        let (session, _) = signed_in();
        Mock::given(method("DELETE"))
            .and(path("/api/delete-booking/7"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server, session);
        let envelope =
            client.request(ApiRequest::delete("bookings.delete").segment(7)).await.unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data, None);
        assert_eq!(envelope.status_code, Some(204));
    }

    #[tokio::test]
    async fn unauthorized_ends_session() {
        let server = MockServer::start().await;
        let (session, _) = signed_in();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"success": false, "message": "jwt expired"})))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::clone(&session));
        let err = client.request(ApiRequest::get("roles.list")).await.unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::SessionExpired);
        assert_eq!(err.http_status, Some(401));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn forbidden_is_a_rejection_and_keeps_session() {
        let server = MockServer::start().await;
        let (session, _) = signed_in();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "success": false,
                "statusCode": 403,
                "message": "Missing permission: roles"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::clone(&session));
        let err = client
            .request(ApiRequest::post("roles.create").json(json!({"role_name": "Ops"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::ServerRejected);
        assert_eq!(err.http_status, Some(403));
        assert_eq!(err.user_message(), "Missing permission: roles");
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_rejected() {
        let server = MockServer::start().await;
        let (session, _) = signed_in();
        Mock::given(method("POST"))
            .and(path("/api/post-job"))
            .and(query_param("clientId", "3"))
            .and(body_json(json!({"title": "Chef"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Title already used"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, session);
        let request = ApiRequest::post("jobs.create").query("clientId", 3).json(json!({"title": "Chef"}));
        let err = client.request(request).await.unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::ServerRejected);
        assert_eq!(err.server_message.as_deref(), Some("Title already used"));
    }

    #[tokio::test]
    async fn non_json_success_is_malformed() {
        let server = MockServer::start().await;
        let (session, _) = signed_in();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, session);
        let err = client.request(ApiRequest::get("jobs.temporary.list")).await.unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn plain_text_error_body_becomes_message() {
        let server = MockServer::start().await;
        let (session, _) = signed_in();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
            .mount(&server)
            .await;

        let client = client_for(&server, session);
        let err = client.request(ApiRequest::get("timesheets.list")).await.unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::ServerRejected);
        assert_eq!(err.user_message(), "database unavailable");
    }

    #[tokio::test]
    async fn multipart_parts_are_sent() {
        let server = MockServer::start().await;
        let (session, _) = signed_in();
        Mock::given(method("POST"))
            .and(path("/api/Client/register"))
            .and(body_string_contains("name=\"companyName\""))
            .and(body_string_contains("filename=\"logo.png\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true, "message": "Client created"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, session);
        let logo = FormPart::File {
            name: "logo".into(),
            file_name: "logo.png".into(),
            content_type: Some("image/png".into()),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        };
        let request = ApiRequest::post("clients.create")
            .multipart(vec![FormPart::text("companyName", "Acme Care"), logo]);
        let envelope = client.request(request).await.unwrap();
        assert_eq!(envelope.message.as_deref(), Some("Client created"));
    }

    #[tokio::test]
    async fn unauthenticated_401_leaves_session_alone() {
        let server = MockServer::start().await;
        let (session, _) = signed_in();
        Mock::given(method("POST"))
            .and(path("/api/admin/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"success": false, "message": "Invalid credentials"})))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::clone(&session));
        let err = client.send_unauthenticated(ApiRequest::post("auth.login")).await.unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::ServerRejected);
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(session.is_authenticated());
    }
}
