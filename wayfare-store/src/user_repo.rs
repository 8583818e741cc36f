use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use wayfare_core::identity::{Account, Session, User};
use wayfare_core::repository::UserRepository;
use wayfare_core::CoreResult;

use crate::database::map_db_error;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: Option<String>,
    email: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_token: String,
    user_id: String,
    expires: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    user_id: String,
    provider: String,
    provider_account_id: String,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &User) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, image, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn get_user(&self, id: &str) -> CoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, image, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(User::from))
    }

    async fn create_session(&self, session: &Session) -> CoreResult<()> {
        sqlx::query("INSERT INTO sessions (session_token, user_id, expires) VALUES ($1, $2, $3)")
            .bind(&session.session_token)
            .bind(&session.user_id)
            .bind(session.expires)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    async fn get_session(&self, session_token: &str) -> CoreResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT session_token, user_id, expires FROM sessions WHERE session_token = $1",
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(|r| Session {
            session_token: r.session_token,
            user_id: r.user_id,
            expires: r.expires,
        }))
    }

    async fn list_accounts(&self, user_id: &str) -> CoreResult<Vec<Account>> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            r#"
            SELECT user_id, provider, provider_account_id
            FROM accounts
            WHERE user_id = $1
            ORDER BY provider
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows
            .into_iter()
            .map(|r| Account {
                user_id: r.user_id,
                provider: r.provider,
                provider_account_id: r.provider_account_id,
            })
            .collect())
    }
}
