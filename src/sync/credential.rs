//! Credential - token OAuth được cache giữa các lần chạy.
//!
//! Credential chứa cả client id/secret và token URI nên có thể refresh
//! mà không cần đọc lại file client secret.

use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Coi token là hết hạn sớm hơn một chút để tránh hết hạn giữa chừng
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// `None` = không rõ thời hạn, coi như còn hiệu lực
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Trạng thái của credential so với thời điểm hiện tại
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Valid,
    /// Access token hết hạn nhưng có refresh token
    Refreshable,
    /// Phải xác thực lại từ đầu
    Invalid,
}

impl Credential {
    /// Load credential từ cache. Trả về `None` nếu file chưa tồn tại.
    pub fn load(path: &Path) -> Result<Option<Self>, AuthError> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        let credential: Credential = serde_json::from_str(&json)?;
        Ok(Some(credential))
    }

    /// Lưu credential vào cache (ghi đè nếu đã có)
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expires_at,
            None => false,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> CredentialState {
        if self.is_valid_at(now) {
            CredentialState::Valid
        } else if self
            .refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
        {
            CredentialState::Refreshable
        } else {
            CredentialState::Invalid
        }
    }

    /// Áp dụng response của token endpoint sau khi refresh.
    /// Google thường không trả refresh token mới, giữ lại token cũ.
    pub fn apply_refresh(
        &mut self,
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<u64>,
        now: DateTime<Utc>,
    ) {
        self.access_token = access_token;
        if let Some(token) = refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_token = Some(token);
        }
        self.expires_at = expires_in.map(|secs| now + Duration::seconds(secs as i64));
    }

    /// Giá trị cho header Authorization
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(expires_at: Option<DateTime<Utc>>, refresh: Option<&str>) -> Credential {
        Credential {
            access_token: "ya29.test".to_string(),
            refresh_token: refresh.map(str::to_string),
            token_type: "Bearer".to_string(),
            expires_at,
            scopes: vec!["https://www.googleapis.com/auth/drive.file".to_string()],
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        }
    }

    #[test]
    fn test_save_load_roundtrip() -> Result<(), AuthError> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("cache").join("token.json");

        let credential = sample(Some(Utc::now()), Some("1//refresh"));
        credential.save(&path)?;

        let loaded = Credential::load(&path)?.expect("cache should exist");
        assert_eq!(loaded, credential);
        Ok(())
    }

    #[test]
    fn test_load_missing_cache() -> Result<(), AuthError> {
        let temp_dir = TempDir::new()?;
        assert!(Credential::load(&temp_dir.path().join("token.json"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_load_corrupt_cache() -> Result<(), AuthError> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("token.json");
        fs::write(&path, "not json")?;

        assert!(matches!(
            Credential::load(&path),
            Err(AuthError::CacheFormat(_))
        ));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_cache_is_owner_only() -> Result<(), AuthError> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("token.json");
        sample(None, None).save(&path)?;

        let mode = fs::metadata(&path)?.permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        Ok(())
    }

    #[test]
    fn test_state() {
        let now = Utc::now();

        let fresh = sample(Some(now + Duration::hours(1)), None);
        assert_eq!(fresh.state_at(now), CredentialState::Valid);

        let no_expiry = sample(None, None);
        assert_eq!(no_expiry.state_at(now), CredentialState::Valid);

        let expired = sample(Some(now - Duration::minutes(5)), Some("1//refresh"));
        assert_eq!(expired.state_at(now), CredentialState::Refreshable);

        // Sắp hết hạn trong khoảng skew cũng tính là hết hạn
        let almost = sample(Some(now + Duration::seconds(10)), Some("1//refresh"));
        assert_eq!(almost.state_at(now), CredentialState::Refreshable);

        let dead = sample(Some(now - Duration::minutes(5)), None);
        assert_eq!(dead.state_at(now), CredentialState::Invalid);

        let empty_refresh = sample(Some(now - Duration::minutes(5)), Some(""));
        assert_eq!(empty_refresh.state_at(now), CredentialState::Invalid);
    }

    #[test]
    fn test_apply_refresh_keeps_refresh_token() {
        let now = Utc::now();
        let mut credential = sample(Some(now - Duration::minutes(5)), Some("1//refresh"));

        credential.apply_refresh("ya29.new".to_string(), None, Some(3600), now);

        assert_eq!(credential.access_token, "ya29.new");
        assert_eq!(credential.refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(credential.expires_at, Some(now + Duration::seconds(3600)));
        assert!(credential.is_valid_at(now));
    }
}
