//! Local password accounts and opaque session tokens.
//!
//! Passwords are stored as `v1$<salt>$<digest>` where the digest is
//! HMAC-SHA256 keyed by the password, iterated [`HASH_ROUNDS`] times over
//! the salt. Session tokens are random alphanumeric strings mapped to the
//! account email in the `sessions` table.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{DevflowError, Result};
use crate::store::{db_err, Store, ACCOUNTS, SESSIONS};

type HmacSha256 = Hmac<Sha256>;

const HASH_VERSION: &str = "v1";
const HASH_ROUNDS: u32 = 10_000;
const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The public face of an account, safe to return over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
}

impl From<&Account> for UserInfo {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id.clone(),
            email: a.email.clone(),
        }
    }
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: UserInfo,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

/// Run every round but the last and return the final round's MAC, ready to
/// be finalized or verified.
fn final_round(password: &str, salt: &[u8]) -> Result<HmacSha256> {
    let new_mac = || {
        HmacSha256::new_from_slice(password.as_bytes())
            .map_err(|e| DevflowError::Store(e.to_string()))
    };
    let mut mac = new_mac()?;
    mac.update(salt);
    for _ in 1..HASH_ROUNDS {
        let block = mac.finalize().into_bytes();
        mac = new_mac()?;
        mac.update(&block);
    }
    Ok(mac)
}

pub fn hash_password(password: &str) -> Result<String> {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = final_round(password, &salt)?.finalize().into_bytes();
    Ok(format!(
        "{HASH_VERSION}${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    ))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(HASH_VERSION), Some(salt), Some(digest), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (URL_SAFE_NO_PAD.decode(salt), URL_SAFE_NO_PAD.decode(digest))
    else {
        return false;
    };
    final_round(password, &salt).is_ok_and(|mac| mac.verify_slice(&expected).is_ok())
}

/// Generate a random session token.
pub fn generate_token() -> String {
    use rand::{distributions::Alphanumeric, Rng};
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Store operations
// ---------------------------------------------------------------------------

impl Store {
    pub fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(DevflowError::InvalidInput("a valid email is required".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DevflowError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };
        let token = generate_token();
        let value = serde_json::to_vec(&account)?;

        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut accounts = wt.open_table(ACCOUNTS).map_err(db_err)?;
            if accounts.get(email.as_str()).map_err(db_err)?.is_some() {
                return Err(DevflowError::AccountExists(email));
            }
            accounts
                .insert(email.as_str(), value.as_slice())
                .map_err(db_err)?;
            let mut sessions = wt.open_table(SESSIONS).map_err(db_err)?;
            sessions
                .insert(token.as_str(), email.as_str())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;

        tracing::info!(user_id = %account.id, "account created");
        Ok(Session {
            token,
            user: UserInfo::from(&account),
        })
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);
        let account = self
            .account_by_email(&email)?
            .ok_or(DevflowError::InvalidCredentials)?;
        if !verify_password(password, &account.password_hash) {
            return Err(DevflowError::InvalidCredentials);
        }

        let token = generate_token();
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut sessions = wt.open_table(SESSIONS).map_err(db_err)?;
            sessions
                .insert(token.as_str(), email.as_str())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;

        Ok(Session {
            token,
            user: UserInfo::from(&account),
        })
    }

    /// Invalidate a session token. Returns the user it belonged to, if any.
    pub fn sign_out(&self, token: &str) -> Result<Option<UserInfo>> {
        let user = match self.account_for_token(token) {
            Ok(account) => Some(UserInfo::from(&account)),
            Err(DevflowError::Unauthorized) => None,
            Err(e) => return Err(e),
        };
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut sessions = wt.open_table(SESSIONS).map_err(db_err)?;
            sessions.remove(token).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(user)
    }

    /// Resolve a session token to its account.
    pub fn account_for_token(&self, token: &str) -> Result<Account> {
        let email = {
            let rt = self.db.begin_read().map_err(db_err)?;
            let sessions = rt.open_table(SESSIONS).map_err(db_err)?;
            let guard = sessions
                .get(token)
                .map_err(db_err)?
                .ok_or(DevflowError::Unauthorized)?;
            guard.value().to_string()
        };
        self.account_by_email(&email)?
            .ok_or(DevflowError::Unauthorized)
    }

    fn account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let accounts = rt.open_table(ACCOUNTS).map_err(db_err)?;
        match accounts.get(email).map_err(db_err)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
