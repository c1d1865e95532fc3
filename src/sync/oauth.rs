//! Google OAuth 2.0 cho CLI (installed-app flow).
//!
//! Flow:
//! 1. Đọc client secret JSON do Google Cloud console cấp
//! 2. Mở browser tới trang consent, redirect về loopback server trên localhost
//! 3. Đổi authorization code lấy access token + refresh token (PKCE)
//! 4. Lưu credential vào cache để dùng cho các lần chạy sau
//!
//! Lần chạy sau chỉ cần refresh token khi access token hết hạn.

use super::credential::{Credential, CredentialState};
use crate::error::{ApiError, AuthError};
use crate::utils::browser::open_browser;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration as ChronoDuration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tiny_http::{Header, Response, Server};
use tracing::{debug, info};
use url::Url;

/// Scopes: chỉ truy cập các file do app tạo ra
pub const DRIVE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive.install",
];

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const SUCCESS_PAGE: &str = "<html><body><h3>Authorization complete.</h3>\
<p>You can close this window and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h3>Authorization failed.</h3>\
<p>Check the terminal for details.</p></body></html>";

/// Thông tin OAuth client trong file client secret
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
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

/// File của Google bọc client trong key "installed" (Desktop app) hoặc "web"
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn from_json(path: &Path, json: &str) -> Result<Self, AuthError> {
        let file: ClientSecretFile =
            serde_json::from_str(json).map_err(|e| AuthError::InvalidClientSecret {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        file.installed
            .or(file.web)
            .ok_or_else(|| AuthError::InvalidClientSecret {
                path: path.to_path_buf(),
                reason: "expected an \"installed\" or \"web\" client".to_string(),
            })
    }

    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::MissingClientSecret(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(path, &json)
    }
}

/// Response từ token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

/// Hai cách lấy token mới. Tách thành trait để `authorize` test được
/// mà không cần network.
pub trait OAuthFlow {
    /// Đổi refresh token lấy access token mới
    fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;

    /// Xác thực tương tác qua browser
    fn run_interactive(&self) -> Result<Credential, AuthError>;
}

/// Load credential từ cache, refresh hoặc xác thực lại nếu cần,
/// rồi lưu kết quả vào cache. Credential còn hạn thì không ghi lại cache.
pub fn authorize<F: OAuthFlow>(cache_path: &Path, flow: &F) -> Result<Credential, AuthError> {
    let cached = Credential::load(cache_path)?;

    let credential = match cached {
        Some(credential) => match credential.state_at(Utc::now()) {
            CredentialState::Valid => {
                debug!("Using cached credential from {}", cache_path.display());
                return Ok(credential);
            }
            CredentialState::Refreshable => {
                info!("Access token expired, refreshing");
                flow.refresh(&credential)?
            }
            CredentialState::Invalid => {
                info!("Cached credential cannot be refreshed, starting authorization");
                flow.run_interactive()?
            }
        },
        None => {
            info!("No cached credential, starting authorization");
            flow.run_interactive()?
        }
    };

    credential.save(cache_path)?;
    debug!("Saved credential to {}", cache_path.display());
    Ok(credential)
}

/// Installed-app flow với loopback redirect và PKCE
pub struct InstalledAppFlow {
    client: reqwest::blocking::Client,
    client_secret_path: PathBuf,
    scopes: Vec<String>,
}

impl InstalledAppFlow {
    pub fn new(client_secret_path: &Path) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            client_secret_path: client_secret_path.to_path_buf(),
            scopes: DRIVE_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn request_token(
        &self,
        token_uri: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, ApiError> {
        let response = self.client.post(token_uri).form(params).send()?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response));
        }

        let text = response.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Chờ browser redirect về loopback server, trả về authorization code
    fn wait_for_code(
        &self,
        server: &Server,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, AuthError> {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Waiting for authorization in browser...");

        let result = loop {
            let request = match server.recv() {
                Ok(request) => request,
                Err(e) => break Err(AuthError::Callback(e.to_string())),
            };

            let callback = match Url::parse(redirect_uri).and_then(|base| base.join(request.url())) {
                Ok(url) => url,
                Err(e) => break Err(AuthError::Callback(e.to_string())),
            };

            let outcome = parse_callback(&callback, state);
            match outcome {
                // Request không liên quan (favicon...), tiếp tục chờ
                None => {
                    let _ = request.respond(Response::empty(404));
                }
                Some(outcome) => {
                    let page = if outcome.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
                    let mut response = Response::from_string(page);
                    if let Ok(header) =
                        Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
                    {
                        response = response.with_header(header);
                    }
                    let _ = request.respond(response);
                    break outcome;
                }
            }
        };

        spinner.finish_and_clear();
        result
    }
}

impl OAuthFlow for InstalledAppFlow {
    fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential.refresh_token.as_deref().unwrap_or_default();
        let response = self.request_token(
            &credential.token_uri,
            &[
                ("client_id", credential.client_id.as_str()),
                ("client_secret", credential.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ],
        )?;

        let mut refreshed = credential.clone();
        refreshed.apply_refresh(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            Utc::now(),
        );
        Ok(refreshed)
    }

    fn run_interactive(&self) -> Result<Credential, AuthError> {
        let secret = ClientSecret::load(&self.client_secret_path)?;

        let server =
            Server::http("127.0.0.1:0").map_err(|e| AuthError::Listener(e.to_string()))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| AuthError::Listener("listener has no IP address".to_string()))?;
        let redirect_uri = format!("http://localhost:{}/", port);

        let (code_verifier, code_challenge) = generate_pkce();
        let state = random_string(32);
        let auth_url = build_auth_url(&secret, &self.scopes, &redirect_uri, &state, &code_challenge)
            .map_err(|e| AuthError::InvalidClientSecret {
                path: self.client_secret_path.clone(),
                reason: format!("invalid auth_uri: {}", e),
            })?;

        println!("Please visit this URL to authorize this application:");
        println!("  {}", auth_url);
        if !open_browser(auth_url.as_str()) {
            debug!("Could not open a browser, waiting for manual visit");
        }

        let code = self.wait_for_code(&server, &redirect_uri, &state)?;
        debug!("Received authorization code, exchanging for tokens");

        let response = self.request_token(
            &secret.token_uri,
            &[
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("code", code.as_str()),
                ("code_verifier", code_verifier.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
        )?;

        let scopes = match response.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => self.scopes.clone(),
        };

        Ok(Credential {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at: response
                .expires_in
                .map(|secs| Utc::now() + ChronoDuration::seconds(secs as i64)),
            scopes,
            client_id: secret.client_id,
            client_secret: secret.client_secret,
            token_uri: secret.token_uri,
        })
    }
}

/// Tạo PKCE code verifier và code challenge (S256)
fn generate_pkce() -> (String, String) {
    let code_verifier = random_string(96);
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    let code_challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());
    (code_verifier, code_challenge)
}

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn build_auth_url(
    secret: &ClientSecret,
    scopes: &[String],
    redirect_uri: &str,
    state: &str,
    code_challenge: &str,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&secret.auth_uri)?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &secret.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &scopes.join(" "))
        .append_pair("state", state)
        .append_pair("code_challenge", code_challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");
    Ok(url)
}

/// Phân tích URL callback. `None` nếu request không mang code hay error.
fn parse_callback(url: &Url, expected_state: &str) -> Option<Result<String, AuthError>> {
    let mut code = None;
    let mut error = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(AuthError::Denied(error)));
    }
    let code = code?;
    if state.as_deref() != Some(expected_state) {
        return Some(Err(AuthError::StateMismatch));
    }
    Some(Ok(code))
}
