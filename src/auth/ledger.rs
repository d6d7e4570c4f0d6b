use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

/// token台账：只追加、只打吊销标记，从不删除
#[derive(Debug, Serialize, FromRow)]
pub struct Token {
    pub id: i32,
    pub token: String,
    pub revoked: bool,
    pub revoked_on: Option<DateTime<Utc>>,
}

impl Token {
    pub async fn record(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO tokens (token, revoked) VALUES ($1, false)")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// 未登记或已吊销一律视为不可用
    pub async fn is_usable(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let revoked = sqlx::query_scalar::<_, bool>("SELECT revoked FROM tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await?;

        Ok(revoked == Some(false))
    }

    /// 吊销前调用方必须已通过校验，记录不存在属于契约违反。
    /// 重复吊销保留首次的吊销时间
    pub async fn revoke(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tokens SET revoked = true, revoked_on = COALESCE(revoked_on, $1) WHERE token = $2",
        )
        .bind(Utc::now())
        .bind(token)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}
