use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, io, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
    time::timeout,
};
use url::Url;
use uuid::Uuid;

use super::{
    provider::{AuthProvider, ProviderConfig},
    token::{Credential, TokenResponse},
    Error, Result,
};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Callback requests with a larger head are dropped.
const MAX_CALLBACK_REQUEST_LEN: usize = 8192;

/// OAuth 2.0 authorization code flow handler.
///
/// Runs the interactive authorization (browser, loopback callback,
/// code exchange) and refreshes expired credentials.
pub struct OAuthFlow {
    http: reqwest::Client,
    config: ProviderConfig,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_host: String,
    redirect_port: u16,
}

impl OAuthFlow {
    pub fn new(provider: AuthProvider, client_id: String, client_secret: String) -> Self {
        let config = provider.config();

        Self {
            http: reqwest::Client::new(),
            token_url: config.token_url.to_owned(),
            config,
            client_id,
            client_secret,
            redirect_host: "localhost".to_string(),
            redirect_port: 8080,
        }
    }

    pub fn with_redirect_port(mut self, port: u16) -> Self {
        self.redirect_port = port;
        self
    }

    /// Use the given HTTP client and token endpoint instead of the
    /// provider ones.
    pub fn with_token_endpoint(mut self, http: reqwest::Client, token_url: Url) -> Self {
        self.http = http;
        self.token_url = token_url.into();
        self
    }

    fn redirect_uri(&self) -> String {
        format!(
            "http://{}:{}/callback",
            self.redirect_host, self.redirect_port
        )
    }

    /// Execute the complete interactive authorization flow.
    pub async fn execute(&self) -> Result<Credential> {
        let (code_challenge, code_verifier) = Self::generate_pkce();
        let state = Self::generate_state();
        let auth_url = self.build_auth_url(&state, &code_challenge)?;

        let listener = TcpListener::bind((self.redirect_host.as_str(), self.redirect_port))
            .await
            .map_err(|err| Error::BindListener(err, self.redirect_port))?;

        eprintln!("🔐 Authorization required for {}", self.config.name);

        if let Err(err) = open::that(auth_url.as_str()) {
            debug!("cannot open browser: {err}");
            eprintln!("\n⚠️  Could not open browser automatically.");
            eprintln!("Please open this URL in your browser:");
            eprintln!("\n{auth_url}\n");
        }

        eprintln!("⏳ Waiting for authorization response... (5 minute timeout)");

        let (code, received_state) = timeout(CALLBACK_TIMEOUT, Self::wait_for_callback(&listener))
            .await
            .map_err(|_| Error::CallbackTimeout)??;

        if received_state != state {
            return Err(Error::InvalidCallbackState);
        }

        info!("authorization received, exchanging code for tokens");

        let res = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri().as_str()),
                ("code_verifier", code_verifier.as_str()),
            ])
            .await?;

        Ok(res.into_credential(None, Utc::now()))
    }

    /// Exchange the refresh token of the given credential for a new
    /// access token.
    pub async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or(Error::MissingRefreshToken)?;

        let res = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .await?;

        Ok(res.into_credential(Some(refresh_token.to_owned()), Utc::now()))
    }

    /// Generate PKCE (RFC 7636) code challenge and verifier
    fn generate_pkce() -> (String, String) {
        let code_verifier = format!(
            "{}{}",
            Uuid::new_v4().to_simple(),
            Uuid::new_v4().to_simple()
        );

        let hash = Sha256::digest(code_verifier.as_bytes());
        let code_challenge = URL_SAFE_NO_PAD.encode(hash);

        (code_challenge, code_verifier)
    }

    /// Generate a random state for CSRF protection
    fn generate_state() -> String {
        Uuid::new_v4().to_string()
    }

    fn build_auth_url(&self, state: &str, code_challenge: &str) -> Result<Url> {
        let mut auth_url = Url::parse(self.config.auth_url).map_err(Error::BuildAuthUrl)?;

        auth_url
            .query_pairs_mut()
            .append_pair("client_id", self.client_id.as_str())
            .append_pair("redirect_uri", self.redirect_uri().as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes_str())
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline");

        Ok(auth_url)
    }

    /// Wait for the OAuth callback on the loopback listener.
    ///
    /// Connections are handled concurrently, so that an idle one
    /// (browser preconnect) does not hold back the actual callback.
    async fn wait_for_callback(listener: &TcpListener) -> Result<(String, String)> {
        let (tx, mut rx) = mpsc::channel(1);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, addr) = accepted.map_err(Error::ReceiveCallback)?;
                    debug!("callback connection from {addr}");

                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(res) = Self::handle_callback_connection(stream).await {
                            let _ = tx.send(res).await;
                        }
                    });
                }
                Some(res) = rx.recv() => return res,
            }
        }
    }

    /// Answer a single callback connection.
    ///
    /// Requests that carry neither a code nor an error (favicon and
    /// the like) are answered with a 404 and yield nothing.
    async fn handle_callback_connection(
        mut stream: TcpStream,
    ) -> Option<Result<(String, String)>> {
        let request = match Self::read_request_head(&mut stream).await {
            Ok(request) => request,
            Err(err) => {
                debug!("dropping callback connection: {err}");
                return None;
            }
        };

        let res = match Self::parse_callback_request(&request) {
            Some(res) => res,
            None => {
                let _ = stream
                    .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
                    .await;
                return None;
            }
        };

        let response = match res {
            Ok(_) => "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
                <html><body><h1>Authorization successful!</h1>\
                <p>You can close this window and return to the terminal.</p>\
                </body></html>",
            Err(_) => "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
                <html><body><h1>Authorization failed</h1>\
                <p>Check the terminal for details.</p>\
                </body></html>",
        };

        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;

        Some(res)
    }

    /// Read the request up to the end of its head.
    async fn read_request_head(stream: &mut TcpStream) -> io::Result<String> {
        let mut request = Vec::new();
        let mut buffer = [0; 1024];

        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            if request.len() > MAX_CALLBACK_REQUEST_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "callback request too large",
                ));
            }

            let n = stream.read(&mut buffer).await?;
            if n == 0 {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }

            request.extend_from_slice(&buffer[..n]);
        }

        Ok(String::from_utf8_lossy(&request).into_owned())
    }

    /// Parse authorization code and state from the callback request
    /// line.
    fn parse_callback_request(request: &str) -> Option<Result<(String, String)>> {
        let target = request.lines().next()?.split_whitespace().nth(1)?;
        let (_, query) = target.split_once('?')?;

        let params: HashMap<_, _> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        if let Some(err) = params.get("error") {
            return Some(Err(Error::AuthorizationDenied(err.clone())));
        }

        let code = params.get("code")?.clone();

        let res = match params.get("state") {
            Some(state) => Ok((code, state.clone())),
            None => Err(Error::InvalidCallbackState),
        };

        Some(res)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        debug!("requesting token at {}", self.token_url);

        let res = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(Error::TokenRequest)?;

        let status = res.status();
        let body = res.text().await.map_err(Error::TokenRequest)?;

        if !status.is_success() {
            return Err(Error::TokenEndpoint(status.as_u16(), body));
        }

        TokenResponse::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn flow() -> OAuthFlow {
        OAuthFlow::new(AuthProvider::Gmail, "client-id".into(), "secret".into())
            .with_redirect_port(9090)
    }

    #[test]
    fn test_state_generation_is_unique() {
        let state1 = OAuthFlow::generate_state();
        let state2 = OAuthFlow::generate_state();
        assert_ne!(state1, state2);
        assert!(!state1.is_empty());
    }

    #[test]
    fn test_pkce_generation() {
        let (challenge, verifier) = OAuthFlow::generate_pkce();
        assert_eq!(verifier.len(), 64);
        assert_eq!(challenge, URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())));
    }

    #[test]
    fn test_build_auth_url() {
        let url = flow().build_auth_url("state", "challenge").unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["redirect_uri"], "http://localhost:9090/callback");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "https://www.googleapis.com/auth/gmail.send");
        assert_eq!(params["state"], "state");
        assert_eq!(params["code_challenge"], "challenge");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["access_type"], "offline");
    }

    #[test]
    fn test_parse_callback_request() {
        let req = "GET /callback?code=4%2Fabc&state=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (code, state) = OAuthFlow::parse_callback_request(req).unwrap().unwrap();
        assert_eq!(code, "4/abc");
        assert_eq!(state, "xyz");
    }

    #[test]
    fn test_parse_callback_request_denied() {
        let req = "GET /callback?error=access_denied&state=xyz HTTP/1.1\r\n\r\n";
        let err = OAuthFlow::parse_callback_request(req).unwrap().unwrap_err();
        assert!(matches!(err, Error::AuthorizationDenied(reason) if reason == "access_denied"));
    }

    #[test]
    fn test_parse_callback_request_without_state() {
        let req = "GET /callback?code=abc HTTP/1.1\r\n\r\n";
        let err = OAuthFlow::parse_callback_request(req).unwrap().unwrap_err();
        assert!(matches!(err, Error::InvalidCallbackState));
    }

    #[test]
    fn test_parse_callback_request_unrelated() {
        assert!(OAuthFlow::parse_callback_request("GET /favicon.ico HTTP/1.1\r\n\r\n").is_none());
        assert!(OAuthFlow::parse_callback_request("").is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let err = flow().refresh(&Credential::new("at")).await.unwrap_err();
        assert!(matches!(err, Error::MissingRefreshToken));
    }

    #[tokio::test]
    async fn test_wait_for_callback_times_out_on_idle_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let _idle = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();

        let res = timeout(
            Duration::from_millis(200),
            OAuthFlow::wait_for_callback(&listener),
        )
        .await;

        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_wait_for_callback_behind_idle_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _idle = TcpStream::connect(addr).await.unwrap();

        let browser = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"GET /callback?code=4%2Fabc").await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            stream
                .write_all(b"&state=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();

            let mut response = String::new();
            stream.read_to_string(&mut response).await.unwrap();
            response
        });

        let (code, state) = timeout(
            Duration::from_secs(5),
            OAuthFlow::wait_for_callback(&listener),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(code, "4/abc");
        assert_eq!(state, "xyz");
        assert!(browser.await.unwrap().starts_with("HTTP/1.1 200 OK"));
    }

    #[tokio::test]
    async fn test_wait_for_callback_skips_unrelated_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut favicon = TcpStream::connect(addr).await.unwrap();
            favicon
                .write_all(b"GET /favicon.ico HTTP/1.1\r\n\r\n")
                .await
                .unwrap();
            let mut response = String::new();
            favicon.read_to_string(&mut response).await.unwrap();
            assert!(response.starts_with("HTTP/1.1 404"));

            let mut callback = TcpStream::connect(addr).await.unwrap();
            callback
                .write_all(b"GET /callback?error=access_denied HTTP/1.1\r\n\r\n")
                .await
                .unwrap();
            let _ = callback.read_to_string(&mut response).await;
        });

        let err = timeout(
            Duration::from_secs(5),
            OAuthFlow::wait_for_callback(&listener),
        )
        .await
        .unwrap()
        .unwrap_err();

        assert!(matches!(err, Error::AuthorizationDenied(reason) if reason == "access_denied"));
    }
}
