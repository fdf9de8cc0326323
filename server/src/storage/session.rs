use std::time::Duration;

use jiff::Timestamp;
use jiff_sqlx::{Timestamp as SqlxTimestamp, ToSqlx};
use secrecy::SecretString;
use types::{Error, Result, UserData};
use uuid::Uuid;

use super::Storage;
use crate::uuid_v7::UuidV7Ext;

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    user_data: String,
    expires_at: SqlxTimestamp,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    user_data: UserData,
    expires_at: Timestamp,
}

impl Session {
    pub fn new(user_data: UserData, ttl: Duration) -> Result<Self> {
        let id = Uuid::now_v7();
        let expires_at = id.jiff_timestamp()?.checked_add(ttl)?;

        Ok(Self {
            id,
            user_data,
            expires_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_data(&self) -> &UserData {
        &self.user_data
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    pub fn as_token(&self, secret: &SecretString) -> Result<String> {
        self.id.as_token(secret)
    }
}

impl Storage {
    pub async fn create_session(&self, user_data: UserData, ttl: Duration) -> Result<Session> {
        let session = Session::new(user_data, ttl)?;
        let user_data = serde_json::to_string(&session.user_data)?;

        sqlx::query("INSERT INTO sessions (id, user_data, expires_at) VALUES (?, ?, ?)")
            .bind(session.id)
            .bind(user_data)
            .bind(session.expires_at.to_sqlx())
            .execute(&self.pool)
            .await?;

        tracing::debug!(session = %session.id, user = %session.user_data.email, "session created");
        Ok(session)
    }

    /// Find a live session. Expired sessions are removed and reported as 401.
    pub async fn find_session(&self, id: Uuid) -> Result<Session> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT id, user_data, expires_at FROM sessions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Err(Error::unauthorized("session not found"));
        };

        let session = Session {
            id: row.id,
            user_data: serde_json::from_str(&row.user_data)?,
            expires_at: row.expires_at.to_jiff(),
        };

        if session.is_expired(Timestamp::now()) {
            self.delete_session(id).await?;
            return Err(Error::unauthorized("session expired"));
        }

        Ok(session)
    }

    /// Find session by signed token (cookie value).
    pub async fn find_session_token(&self, token: &str, secret: &SecretString) -> Result<Session> {
        let id = Uuid::from_token(token, secret)?;
        self.find_session(id).await
    }

    pub async fn delete_session(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Log out. Unknown or forged tokens are ignored.
    pub async fn delete_session_token(&self, token: &str, secret: &SecretString) -> Result<()> {
        if let Ok(id) = Uuid::from_token(token, secret) {
            self.delete_session(id).await?;
        }
        Ok(())
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Timestamp::now().to_sqlx())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
