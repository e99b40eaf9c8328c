//! OAuth 2.0 management for YouTube API authentication.
//!
//! This module encapsulates the OAuth operations needed to read a channel's data: loading the
//! application's client secrets, the interactive authorization-code flow (with PKCE and a local
//! redirect listener), and token refresh. The [`Authorizer`] trait is the seam the credential
//! cache in [`crate::credentials`] talks to, so the human-in-the-loop step can be replaced in
//! tests.

use crate::error::ReportError;
use eyre::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, body};
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, HttpClientError,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RequestTokenError, Scope, TokenResponse,
    TokenUrl, reqwest,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// Google's OAuth2 authorization endpoint, used when the secrets file does not name one.
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google's OAuth2 token endpoint, used when the secrets file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Read-only access to the authenticated user's YouTube account.
pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// How long the interactive flow waits for the user by default.
pub const DEFAULT_AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(300);

const OAUTH_DONE_HTML: &str = "<html><body><h1>Authorization complete</h1>\
    <p>You can close this window and return to the terminal.</p></body></html>";

const OAUTH_FAILED_HTML: &str = "<html><body><h1>Authorization failed</h1>\
    <p>Check the terminal for details. You can close this window.</p></body></html>";

/// The application identity issued by the Google Cloud console.
///
/// See: <https://developers.google.com/api-client-library/dotnet/guide/aaa_client_secrets>
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The on-disk shape: the secrets are nested under the application type.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parses a client secrets document as downloaded from the Google Cloud console.
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| ReportError::Configuration(format!("invalid client secrets: {e}")))?;
        match file.installed.or(file.web) {
            Some(secrets) => Ok(secrets),
            None => Err(ReportError::Configuration(
                "client secrets contain neither an \"installed\" nor a \"web\" application".into(),
            )
            .into()),
        }
    }

    /// Loads the client secrets file at `path`.
    ///
    /// A missing file is a configuration error naming the absolute path that was looked up.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let shown = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
                return Err(ReportError::Configuration(format!(
                    "client secrets file {} is not found",
                    shown.display()
                ))
                .into());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read client secrets file {}", path.display()));
            }
        };
        Self::from_json(&json).with_context(|| format!("load client secrets from {}", path.display()))
    }
}

/// Obtains and renews OAuth tokens.
///
/// [`OAuthManager`] is the real implementation; tests substitute their own.
pub trait Authorizer {
    /// Runs the interactive consent flow and returns a brand new token.
    fn authorize(&self) -> impl Future<Output = eyre::Result<BasicTokenResponse>> + Send;

    /// Exchanges the refresh token in `token` for a new access token.
    ///
    /// Returns `Ok(None)` if the token cannot be refreshed (no refresh token, or the grant was
    /// revoked) and the user has to go through [`Authorizer::authorize`] again.
    fn refresh(
        &self,
        token: &BasicTokenResponse,
    ) -> impl Future<Output = eyre::Result<Option<BasicTokenResponse>>> + Send;
}

/// Manages OAuth 2.0 authentication flows for YouTube API access.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    secrets: ClientSecrets,
    scopes: Vec<String>,
    timeout: Duration,
}

impl OAuthManager {
    /// Creates a new OAuth manager for the given application identity and scopes.
    pub fn new(secrets: ClientSecrets, scopes: Vec<String>) -> Self {
        Self {
            secrets,
            scopes,
            timeout: DEFAULT_AUTHORIZATION_TIMEOUT,
        }
    }

    /// Sets how long [`Authorizer::authorize`] waits for the user to complete the consent flow.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn token_url(&self) -> eyre::Result<TokenUrl> {
        TokenUrl::new(self.secrets.token_uri.clone()).map_err(|e| {
            ReportError::Configuration(format!(
                "invalid token_uri {:?} in client secrets: {e}",
                self.secrets.token_uri
            ))
            .into()
        })
    }

    fn http_client() -> eyre::Result<reqwest::Client> {
        reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")
    }

    /// Performs a complete OAuth 2.0 authorization flow to obtain a new access token.
    ///
    /// This method:
    /// 1. Starts a local HTTP server to receive the authorization callback
    /// 2. Sends the user to the consent page (browser, plus the URL on stderr)
    /// 3. Exchanges the authorization code for an access token
    async fn authenticate(&self) -> eyre::Result<BasicTokenResponse> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let auth_url = AuthUrl::new(self.secrets.auth_uri.clone()).map_err(|e| {
            ReportError::Configuration(format!(
                "invalid auth_uri {:?} in client secrets: {e}",
                self.secrets.auth_uri
            ))
        })?;
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_auth_uri(auth_url)
            .set_redirect_uri(redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf.clone())
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        eprintln!("Open the following URL in your browser to authorize access:\n\n    {auth_url}\n");
        if let Err(e) = webbrowser::open(auth_url.as_ref()) {
            tracing::warn!(error = %e, "could not open a browser, visit the URL manually");
        }

        self.complete_authorization(redirect_url, eventually_authorization_code, pkce_verifier)
            .await
    }

    /// Waits (at most the configured timeout) for the redirect to deliver an authorization
    /// code, then exchanges it for a token at the `token_uri`.
    async fn complete_authorization(
        &self,
        redirect_url: RedirectUrl,
        eventually_authorization_code: impl Future<Output = eyre::Result<AuthorizationCode>>,
        pkce_verifier: PkceCodeVerifier,
    ) -> eyre::Result<BasicTokenResponse> {
        let authorization_code =
            match tokio::time::timeout(self.timeout, eventually_authorization_code).await {
                Ok(code) => code.context("await user authorization code")?,
                Err(_) => {
                    return Err(ReportError::Authorization(format!(
                        "no authorization received within {:?}",
                        self.timeout
                    ))
                    .into());
                }
            };

        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_token_uri(self.token_url()?)
            .set_redirect_uri(redirect_url);

        let http_client = Self::http_client()?;
        let token_result = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .map_err(|e| {
                ReportError::Authorization(format!(
                    "exchange authorization code for access token: {e}"
                ))
            })?;

        tracing::info!("obtained new OAuth token");
        Ok(token_result)
    }

    /// Attempts to refresh an existing OAuth token using its refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(new_token))` - Refresh succeeded, new token is available
    /// * `Ok(None)` - No refresh token, or the server considers the grant invalid
    /// * `Err(_)` - Network or other error occurred during refresh attempt
    async fn refresh_token(
        &self,
        token: &BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");

        // No redirect URL is needed to refresh.
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_token_uri(self.token_url()?);

        let http_client = Self::http_client()?;
        match client
            .exchange_refresh_token(refresh_token)
            .request_async(&http_client)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(refresh_failure(e).into()),
        }
    }

    /// Sets up a local HTTP server to receive the OAuth authorization callback.
    ///
    /// The server listens on a random local port and accepts a single connection. The callback
    /// is checked against `csrf` by [`callback_outcome`].
    ///
    /// # Returns
    ///
    /// A tuple containing:
    /// - The redirect URL to use in the OAuth flow
    /// - A future that resolves to the authorization code when the callback is received
    async fn setup_redirect(
        &self,
        csrf: CsrfToken,
    ) -> eyre::Result<(
        RedirectUrl,
        impl Future<Output = eyre::Result<AuthorizationCode>> + Send,
    )> {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let r = async move {
                let (conn, _) = socket.accept().await.context("accept")?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (got, mut gotten) = tokio::sync::mpsc::channel(1);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let got = got.clone();
                    async move {
                        // Browsers like to ask for /favicon.ico on the same connection.
                        if req.uri().path() != "/" {
                            let mut not_found = Response::new(Full::<Bytes>::from(""));
                            *not_found.status_mut() = StatusCode::NOT_FOUND;
                            return Ok::<_, Infallible>(not_found);
                        }
                        let outcome = callback_outcome(req.uri().query().unwrap_or(""), &csrf);
                        let page = if outcome.is_ok() {
                            OAUTH_DONE_HTML
                        } else {
                            OAUTH_FAILED_HTML
                        };
                        let _ = got.send(outcome).await;
                        Ok(Response::new(Full::<Bytes>::from(page)))
                    }
                });
                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                tokio::select! {
                    exit = &mut serve => {
                        if let Err(e) = exit {
                            Err(e).context("redirect server got bad request")
                        } else {
                            eyre::bail!("redirect server exit prematurely");
                        }
                    }
                    outcome = gotten.recv() => {
                        serve.as_mut().graceful_shutdown();
                        // Let the browser receive the result page.
                        let _ = tokio::time::timeout(Duration::from_secs(5), serve).await;
                        let outcome = outcome.ok_or_else(|| {
                            eyre::eyre!("redirect handler went away without an outcome")
                        })?;
                        Ok(outcome?)
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            rx.await.context("redirect future dropped prematurely")?
        }))
    }
}

impl Authorizer for OAuthManager {
    async fn authorize(&self) -> eyre::Result<BasicTokenResponse> {
        self.authenticate().await
    }

    async fn refresh(&self, token: &BasicTokenResponse) -> eyre::Result<Option<BasicTokenResponse>> {
        self.refresh_token(token).await
    }
}

/// Classifies a failed refresh: transport failures are network errors, anything else the token
/// endpoint says is an authorization failure.
fn refresh_failure(
    e: RequestTokenError<HttpClientError<reqwest::Error>, BasicErrorResponse>,
) -> ReportError {
    match e {
        RequestTokenError::Request(HttpClientError::Reqwest(e)) => ReportError::Network(*e),
        e => ReportError::Authorization(format!("refresh OAuth token: {e}")),
    }
}

/// Interprets the query string of the OAuth redirect.
///
/// The `state` must match `csrf`; an `error` parameter (such as `access_denied`) means the user
/// declined.
fn callback_outcome(query: &str, csrf: &CsrfToken) -> Result<AuthorizationCode, ReportError> {
    let mut presented_state = None;
    let mut presented_code = None;
    let mut presented_error = None;
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        match &*k {
            "state" => presented_state = Some(v),
            "code" => presented_code = Some(v),
            "error" => presented_error = Some(v),
            _ => {}
        }
    }
    if let Some(error) = presented_error {
        return Err(ReportError::Authorization(format!(
            "consent was not granted: {error}"
        )));
    }
    if presented_state.as_deref() != Some(csrf.secret().as_str()) {
        return Err(ReportError::Authorization(
            "redirect carried an invalid csrf state".into(),
        ));
    }
    let Some(code) = presented_code else {
        return Err(ReportError::Authorization(
            "redirect carried no authorization code".into(),
        ));
    };
    Ok(AuthorizationCode::new(code.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oauth2::basic::BasicTokenType;
    use oauth2::{AccessToken, EmptyExtraTokenFields, RefreshToken};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager(token_uri: &str) -> OAuthManager {
        let secrets = ClientSecrets::from_json(
            &json!({
                "installed": {
                    "client_id": "test-client",
                    "client_secret": "test-secret",
                    "token_uri": token_uri,
                }
            })
            .to_string(),
        )
        .unwrap();
        OAuthManager::new(secrets, vec![YOUTUBE_READONLY_SCOPE.to_string()])
    }

    fn redirect() -> RedirectUrl {
        RedirectUrl::new("http://127.0.0.1:1".to_string()).unwrap()
    }

    fn verifier() -> PkceCodeVerifier {
        PkceCodeVerifier::new("a-verifier-that-is-long-enough-for-pkce-0123456789".to_string())
    }

    fn code(value: &str) -> impl Future<Output = eyre::Result<AuthorizationCode>> {
        let value = value.to_string();
        async move { Ok(AuthorizationCode::new(value)) }
    }

    fn unreachable_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{address}/token")
    }

    async fn token_endpoint(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn installed_app_secrets() {
        let secrets = ClientSecrets::from_json(
            r#"{"installed":{"client_id":"abc.apps.googleusercontent.com",
                "client_secret":"shh","redirect_uris":["http://localhost"],
                "auth_uri":"https://accounts.google.com/o/oauth2/auth"}}"#,
        )
        .unwrap();
        assert_eq!(
            secrets,
            ClientSecrets {
                client_id: "abc.apps.googleusercontent.com".into(),
                client_secret: "shh".into(),
                auth_uri: DEFAULT_AUTH_URI.into(),
                token_uri: DEFAULT_TOKEN_URI.into(),
            }
        );
    }

    #[test]
    fn web_app_secrets() {
        let secrets = ClientSecrets::from_json(
            r#"{"web":{"client_id":"id","client_secret":"s","token_uri":"http://127.0.0.1:1/token"}}"#,
        )
        .unwrap();
        assert_eq!(secrets.token_uri, "http://127.0.0.1:1/token");
    }

    #[test]
    fn secrets_without_application_are_a_configuration_error() {
        let e = ClientSecrets::from_json(r#"{"other":{}}"#).unwrap_err();
        assert!(matches!(
            ReportError::of(&e),
            Some(ReportError::Configuration(_))
        ));
    }

    #[test]
    fn missing_secrets_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let e = ClientSecrets::load(&dir.path().join(".top_secrets.json")).unwrap_err();
        match ReportError::of(&e) {
            Some(ReportError::Configuration(msg)) => {
                assert!(msg.contains(".top_secrets.json"), "{msg}");
                assert!(msg.ends_with("is not found"), "{msg}");
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn callback_with_code_and_state() {
        let csrf = CsrfToken::new("xyz".into());
        let code = callback_outcome("state=xyz&code=4%2F0Ab&scope=a+b", &csrf).unwrap();
        assert_eq!(code.secret(), "4/0Ab");
    }

    #[test]
    fn callback_denied() {
        let csrf = CsrfToken::new("xyz".into());
        let e = callback_outcome("error=access_denied&state=xyz", &csrf).unwrap_err();
        assert!(matches!(e, ReportError::Authorization(ref m) if m.contains("access_denied")));
    }

    #[test]
    fn callback_with_wrong_state() {
        let csrf = CsrfToken::new("xyz".into());
        let e = callback_outcome("state=abc&code=1", &csrf).unwrap_err();
        assert!(matches!(e, ReportError::Authorization(_)));
    }

    #[test]
    fn callback_without_code() {
        let csrf = CsrfToken::new("xyz".into());
        let e = callback_outcome("state=xyz", &csrf).unwrap_err();
        assert!(matches!(e, ReportError::Authorization(_)));
    }

    #[tokio::test]
    async fn consent_wait_times_out() {
        let manager = manager(&unreachable_url()).with_timeout(Duration::from_millis(10));
        let never = std::future::pending::<eyre::Result<AuthorizationCode>>();
        let e = manager
            .complete_authorization(redirect(), never, verifier())
            .await
            .unwrap_err();
        assert!(matches!(
            ReportError::of(&e),
            Some(ReportError::Authorization(m)) if m.contains("no authorization received")
        ));
    }

    #[tokio::test]
    async fn code_is_exchanged_for_a_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code_verifier="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(&format!("{}/token", server.uri()));
        let token = manager
            .complete_authorization(redirect(), code("4/0Ab"), verifier())
            .await
            .unwrap();
        assert_eq!(token.access_token().secret(), "new-access");
        assert_eq!(
            token.refresh_token().map(|t| t.secret().as_str()),
            Some("new-refresh")
        );
    }

    #[tokio::test]
    async fn failed_code_exchange() {
        let server = token_endpoint(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Malformed auth code."
        })))
        .await;

        let manager = manager(&format!("{}/token", server.uri()));
        let e = manager
            .complete_authorization(redirect(), code("4/0Ab"), verifier())
            .await
            .unwrap_err();
        assert!(matches!(
            ReportError::of(&e),
            Some(ReportError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn redirect_listener_delivers_the_code() {
        let manager = manager(&unreachable_url());
        let csrf = CsrfToken::new("xyz".into());
        let (url, eventually_code) = manager.setup_redirect(csrf).await.unwrap();

        let response = reqwest::get(format!("{}/?state=xyz&code=abc", url.as_str()))
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(eventually_code.await.unwrap().secret(), "abc");
    }

    #[tokio::test]
    async fn redirect_listener_reports_denial() {
        let manager = manager(&unreachable_url());
        let csrf = CsrfToken::new("xyz".into());
        let (url, eventually_code) = manager.setup_redirect(csrf).await.unwrap();

        let response = reqwest::get(format!(
            "{}/?error=access_denied&state=xyz",
            url.as_str()
        ))
        .await
        .unwrap();
        assert!(response.status().is_success());
        let e = eventually_code.await.unwrap_err();
        assert!(matches!(
            ReportError::of(&e),
            Some(ReportError::Authorization(m)) if m.contains("access_denied")
        ));
    }

    fn refreshable_token() -> BasicTokenResponse {
        let mut token = BasicTokenResponse::new(
            AccessToken::new("old-access".to_string()),
            BasicTokenType::Bearer,
            EmptyExtraTokenFields {},
        );
        token.set_refresh_token(Some(RefreshToken::new("old-refresh".to_string())));
        token
    }

    #[tokio::test]
    async fn refresh_without_refresh_token() {
        let mut token = refreshable_token();
        token.set_refresh_token(None);
        let refreshed = manager(&unreachable_url())
            .refresh_token(&token)
            .await
            .unwrap();
        assert!(refreshed.is_none());
    }

    #[tokio::test]
    async fn refresh_with_revoked_grant() {
        let server = token_endpoint(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .await;
        let refreshed = manager(&format!("{}/token", server.uri()))
            .refresh_token(&refreshable_token())
            .await
            .unwrap();
        assert!(refreshed.is_none());
    }

    #[tokio::test]
    async fn refresh_transport_failure_is_a_network_error() {
        let e = manager(&unreachable_url())
            .refresh_token(&refreshable_token())
            .await
            .unwrap_err();
        assert!(matches!(ReportError::of(&e), Some(ReportError::Network(_))));
    }

    #[tokio::test]
    async fn refresh_server_failure_is_an_authorization_error() {
        let server = token_endpoint(ResponseTemplate::new(500).set_body_string("oops")).await;
        let e = manager(&format!("{}/token", server.uri()))
            .refresh_token(&refreshable_token())
            .await
            .unwrap_err();
        assert!(matches!(
            ReportError::of(&e),
            Some(ReportError::Authorization(_))
        ));
    }
}
