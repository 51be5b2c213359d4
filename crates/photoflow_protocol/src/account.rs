//! Accounts and the opaque credential/session material they own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::AccountId;

/// One cookie jar entry, shared shape for both Netscape and single-line imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    pub expires_at: i64,
    pub name: String,
    pub value: String,
}

pub type CookieJar = Vec<CookieRecord>;

/// Opaque session material produced by [`photoflow_rpc`]'s bootstrap call.
/// Mutable; overwritten wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub account: Option<String>,
    pub f_sid: String,
    pub bl: String,
    pub path: String,
    pub at: String,
    pub rapt: Option<String>,
}

/// A credential-bearing tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: AccountId,
    pub label: String,
    pub is_active: bool,
    /// Opaque bearer string for the bulk-upload provider.
    pub bulk_upload_auth_data: Option<String>,
    #[sqlx(json)]
    pub cookie_jar: Option<CookieJar>,
    #[sqlx(json)]
    pub session_state: Option<SessionState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            label: label.into(),
            is_active: true,
            bulk_upload_auth_data: None,
            cookie_jar: None,
            session_state: None,
            created_at: now,
            updated_at: now,
        }
    }
}
