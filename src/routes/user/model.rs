use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub registered_on: DateTime<Utc>,
    pub admin: bool,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub verified: bool,
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    pub verified_on: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_recovery_code: Option<String>,
    #[serde(skip_serializing)]
    pub password_recovery_gendate: Option<DateTime<Utc>>,
    pub group_id: Option<i32>,
}

/// 对外暴露的用户信息，不含任何哈希或验证码字段
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub fullname: String,
    pub admin: bool,
    pub verified: bool,
    pub group_id: Option<i32>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        let fullname = user.fullname();
        UserInfo {
            id: user.id,
            email: user.email,
            firstname: user.firstname,
            lastname: user.lastname,
            fullname,
            admin: user.admin,
            verified: user.verified,
            group_id: user.group_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub admin: Option<bool>,
}

impl User {
    pub fn fullname(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    pub async fn create(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
        firstname: &str,
        lastname: &str,
        group_id: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, firstname, lastname, registered_on, admin, password_hash, verified, group_id)
            VALUES ($1, $2, $3, $4, false, $5, false, $6)
            RETURNING id, email, firstname, lastname, registered_on, admin, password_hash,
                      verified, verification_code, verified_on,
                      password_recovery_code, password_recovery_gendate, group_id
            "#,
        )
        .bind(email)
        .bind(firstname)
        .bind(lastname)
        .bind(Utc::now())
        .bind(password_hash)
        .bind(group_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, firstname, lastname, registered_on, admin, password_hash,
                   verified, verification_code, verified_on,
                   password_recovery_code, password_recovery_gendate, group_id
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, user_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, firstname, lastname, registered_on, admin, password_hash,
                   verified, verification_code, verified_on,
                   password_recovery_code, password_recovery_gendate, group_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, firstname, lastname, registered_on, admin, password_hash,
                   verified, verification_code, verified_on,
                   password_recovery_code, password_recovery_gendate, group_id
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// 按全名模糊查找，orphaned=true时只保留尚未关联宾客席位的账号
    pub async fn search(
        pool: &PgPool,
        q: &str,
        orphaned: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = if orphaned {
            r#"
            SELECT id, email, firstname, lastname, registered_on, admin, password_hash,
                   verified, verification_code, verified_on,
                   password_recovery_code, password_recovery_gendate, group_id
            FROM users
            WHERE firstname || ' ' || lastname ILIKE $1
              AND NOT EXISTS (SELECT 1 FROM guests WHERE guests.user_id = users.id)
            ORDER BY id
            "#
        } else {
            r#"
            SELECT id, email, firstname, lastname, registered_on, admin, password_hash,
                   verified, verification_code, verified_on,
                   password_recovery_code, password_recovery_gendate, group_id
            FROM users
            WHERE firstname || ' ' || lastname ILIKE $1
            ORDER BY id
            "#
        };

        sqlx::query_as::<_, User>(sql)
            .bind(format!("%{}%", q))
            .fetch_all(pool)
            .await
    }

    pub async fn update_profile(
        pool: &PgPool,
        user_id: i32,
        req: &UpdateProfileRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($1, email),
                firstname = COALESCE($2, firstname),
                lastname = COALESCE($3, lastname)
            WHERE id = $4
            RETURNING id, email, firstname, lastname, registered_on, admin, password_hash,
                      verified, verification_code, verified_on,
                      password_recovery_code, password_recovery_gendate, group_id
            "#,
        )
        .bind(req.email.as_deref())
        .bind(req.firstname.as_deref())
        .bind(req.lastname.as_deref())
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// 管理端更新，admin传None表示保持不变
    pub async fn update_details(
        pool: &PgPool,
        user_id: i32,
        req: &AdminUpdateUserRequest,
        admin: Option<bool>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($1, email),
                firstname = COALESCE($2, firstname),
                lastname = COALESCE($3, lastname),
                admin = COALESCE($4, admin)
            WHERE id = $5
            RETURNING id, email, firstname, lastname, registered_on, admin, password_hash,
                      verified, verification_code, verified_on,
                      password_recovery_code, password_recovery_gendate, group_id
            "#,
        )
        .bind(req.email.as_deref())
        .bind(req.firstname.as_deref())
        .bind(req.lastname.as_deref())
        .bind(admin)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_password(
        pool: &PgPool,
        user_id: i32,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_verification_code(
        pool: &PgPool,
        user_id: i32,
        code: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET verified = false, verification_code = $1, verified_on = NULL WHERE id = $2",
        )
        .bind(code)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_verified(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET verified = true, verification_code = NULL, verified_on = $1
            WHERE email = $2
            RETURNING id, email, firstname, lastname, registered_on, admin, password_hash,
                      verified, verification_code, verified_on,
                      password_recovery_code, password_recovery_gendate, group_id
            "#,
        )
        .bind(Utc::now())
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// 生成新找回码会覆盖旧码，旧码随即作废
    pub async fn set_recovery_code(
        pool: &PgPool,
        user_id: i32,
        code: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET password_recovery_code = $1, password_recovery_gendate = $2 WHERE id = $3",
        )
        .bind(code)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// 找回码必须与当前存储的一致，被新码顶掉的旧码在这里被拒绝
    pub async fn find_by_email_and_recovery_code(
        pool: &PgPool,
        email: &str,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, firstname, lastname, registered_on, admin, password_hash,
                   verified, verification_code, verified_on,
                   password_recovery_code, password_recovery_gendate, group_id
            FROM users
            WHERE email = $1 AND password_recovery_code = $2
            "#,
        )
        .bind(email)
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    pub async fn reset_password(
        pool: &PgPool,
        user_id: i32,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, password_recovery_code = NULL, password_recovery_gendate = NULL
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &PgPool, user_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
