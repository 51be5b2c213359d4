//! Account row CRUD.

use chrono::Utc;
use photoflow_protocol::{Account, AccountId, CookieJar, SessionState};
use sqlx::SqlitePool;

use crate::pool::DbError;

pub struct AccountRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, account: &Account) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, label, is_active, bulk_upload_auth_data, cookie_jar,
                session_state, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.label)
        .bind(account.is_active)
        .bind(&account.bulk_upload_auth_data)
        .bind(account.cookie_jar.as_ref().map(sqlx::types::Json))
        .bind(account.session_state.as_ref().map(sqlx::types::Json))
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: &AccountId) -> Result<Option<Account>, DbError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(account)
    }

    pub async fn list_active(&self) -> Result<Vec<Account>, DbError> {
        let accounts =
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE is_active = 1")
                .fetch_all(self.pool)
                .await?;
        Ok(accounts)
    }

    pub async fn set_cookie_jar(&self, id: &AccountId, jar: &CookieJar) -> Result<(), DbError> {
        sqlx::query("UPDATE accounts SET cookie_jar = ?, updated_at = ? WHERE id = ?")
            .bind(sqlx::types::Json(jar))
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_bulk_upload_auth_data(&self, id: &AccountId, auth_data: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE accounts SET bulk_upload_auth_data = ?, updated_at = ? WHERE id = ?")
            .bind(auth_data)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Last-writer-wins session refresh; see SPEC_FULL.md §5 on why
    /// concurrent writers are not a practical concern here.
    pub async fn set_session_state(&self, id: &AccountId, session: &SessionState) -> Result<(), DbError> {
        sqlx::query("UPDATE accounts SET session_state = ?, updated_at = ? WHERE id = ?")
            .bind(sqlx::types::Json(session))
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
