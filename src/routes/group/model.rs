use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum InvitationType {
    House = 0,
    Weekend = 1,
    Day = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ResponseType {
    NoResponse = 0,
    Confirmed = 1,
    Declined = 2,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvitationGroup {
    pub id: i32,
    pub friendly_name: String,
    pub group_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    pub id: i32,
    pub invitation_type: InvitationType,
    pub response: ResponseType,
    pub requirements: Option<String>,
    pub plus_one: bool,
    pub plus_one_name: Option<String>,
    pub staying_in_house: bool,
    pub locked: bool,
    pub group_id: i32,
}

/// 一个具名席位，可由管理员关联到注册账号
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Guest {
    pub id: i32,
    pub name: String,
    pub group_id: i32,
    pub user_id: Option<i32>,
    pub is_coming: Option<bool>,
    pub first_course: Option<i32>,
    pub main_course: Option<i32>,
    pub desert_course: Option<i32>,
}

/// 邀请组全量视图：组 + 邀请状态 + 席位
#[derive(Debug, Serialize)]
pub struct GroupDetail {
    pub id: i32,
    pub name: String,
    pub registration_code: String,
    pub invitation: Invitation,
    pub guests: Vec<Guest>,
}

/// 注册页可见的未认领席位，只暴露名字
#[derive(Debug, Serialize)]
pub struct AvailableGuest {
    pub id: i32,
    pub name: String,
}

impl InvitationGroup {
    /// 创建组的同时建一条空邀请，两步在同一事务内
    pub async fn create(
        pool: &PgPool,
        friendly_name: &str,
        group_code: &str,
        invitation_type: InvitationType,
        plus_one: bool,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let group = sqlx::query_as::<_, InvitationGroup>(
            r#"
            INSERT INTO invitation_groups (friendly_name, group_code)
            VALUES ($1, $2)
            RETURNING id, friendly_name, group_code
            "#,
        )
        .bind(friendly_name)
        .bind(group_code)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO invitations (invitation_type, response, plus_one, staying_in_house, locked, group_id)
            VALUES ($1, $2, $3, false, false, $4)
            "#,
        )
        .bind(invitation_type)
        .bind(ResponseType::NoResponse)
        .bind(plus_one)
        .bind(group.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(group)
    }

    pub async fn all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, InvitationGroup>(
            "SELECT id, friendly_name, group_code FROM invitation_groups ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, group_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InvitationGroup>(
            "SELECT id, friendly_name, group_code FROM invitation_groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InvitationGroup>(
            "SELECT id, friendly_name, group_code FROM invitation_groups WHERE group_code = $1",
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        group_id: i32,
        friendly_name: Option<&str>,
        group_code: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InvitationGroup>(
            r#"
            UPDATE invitation_groups
            SET friendly_name = COALESCE($1, friendly_name),
                group_code = COALESCE($2, group_code)
            WHERE id = $3
            RETURNING id, friendly_name, group_code
            "#,
        )
        .bind(friendly_name)
        .bind(group_code)
        .bind(group_id)
        .fetch_optional(pool)
        .await
    }

    /// 邀请与席位由外键级联删除
    pub async fn delete(pool: &PgPool, group_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM invitation_groups WHERE id = $1")
            .bind(group_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl Invitation {
    pub async fn find_by_group(pool: &PgPool, group_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, invitation_type, response, requirements, plus_one, plus_one_name,
                   staying_in_house, locked, group_id
            FROM invitations
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(pool)
        .await
    }

    /// 管理端局部更新，None的字段保持不变
    pub async fn admin_update(
        pool: &PgPool,
        group_id: i32,
        response: Option<ResponseType>,
        invitation_type: Option<InvitationType>,
        requirements: Option<&str>,
        locked: Option<bool>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET response = COALESCE($1, response),
                invitation_type = COALESCE($2, invitation_type),
                requirements = COALESCE($3, requirements),
                locked = COALESCE($4, locked)
            WHERE group_id = $5
            RETURNING id, invitation_type, response, requirements, plus_one, plus_one_name,
                      staying_in_house, locked, group_id
            "#,
        )
        .bind(response)
        .bind(invitation_type)
        .bind(requirements)
        .bind(locked)
        .bind(group_id)
        .fetch_optional(pool)
        .await
    }

    /// 宾客提交回执
    pub async fn submit(
        pool: &PgPool,
        group_id: i32,
        response: ResponseType,
        requirements: Option<&str>,
        staying_in_house: bool,
        plus_one_name: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE invitations
            SET response = $1, requirements = $2, staying_in_house = $3,
                plus_one_name = COALESCE($4, plus_one_name)
            WHERE group_id = $5
            "#,
        )
        .bind(response)
        .bind(requirements)
        .bind(staying_in_house)
        .bind(plus_one_name)
        .bind(group_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl Guest {
    pub async fn create(pool: &PgPool, group_id: i32, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Guest>(
            r#"
            INSERT INTO guests (name, group_id)
            VALUES ($1, $2)
            RETURNING id, name, group_id, user_id, is_coming, first_course, main_course, desert_course
            "#,
        )
        .bind(name)
        .bind(group_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, guest_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Guest>(
            r#"
            SELECT id, name, group_id, user_id, is_coming, first_course, main_course, desert_course
            FROM guests
            WHERE id = $1
            "#,
        )
        .bind(guest_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_group(pool: &PgPool, group_id: i32) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Guest>(
            r#"
            SELECT id, name, group_id, user_id, is_coming, first_course, main_course, desert_course
            FROM guests
            WHERE group_id = $1
            ORDER BY id
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }

    pub async fn unclaimed_by_group(
        pool: &PgPool,
        group_id: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Guest>(
            r#"
            SELECT id, name, group_id, user_id, is_coming, first_course, main_course, desert_course
            FROM guests
            WHERE group_id = $1 AND user_id IS NULL
            ORDER BY id
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, guest_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM guests WHERE id = $1")
            .bind(guest_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// 关联/解除账号与席位，user_id传None即解除
    pub async fn set_user(
        pool: &PgPool,
        guest_id: i32,
        user_id: Option<i32>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Guest>(
            r#"
            UPDATE guests
            SET user_id = $1
            WHERE id = $2
            RETURNING id, name, group_id, user_id, is_coming, first_course, main_course, desert_course
            "#,
        )
        .bind(user_id)
        .bind(guest_id)
        .fetch_optional(pool)
        .await
    }

    /// 宾客回执里的出席与选菜，不来的人选菜一并清空
    pub async fn update_attendance(
        pool: &PgPool,
        guest_id: i32,
        is_coming: bool,
        first_course: Option<i32>,
        main_course: Option<i32>,
        desert_course: Option<i32>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE guests
            SET is_coming = $1, first_course = $2, main_course = $3, desert_course = $4
            WHERE id = $5
            "#,
        )
        .bind(is_coming)
        .bind(first_course)
        .bind(main_course)
        .bind(desert_course)
        .bind(guest_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// 管理端改选菜，None的菜式保持不变
    pub async fn set_courses(
        pool: &PgPool,
        guest_id: i32,
        first_course: Option<i32>,
        main_course: Option<i32>,
        desert_course: Option<i32>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE guests
            SET first_course = COALESCE($1, first_course),
                main_course = COALESCE($2, main_course),
                desert_course = COALESCE($3, desert_course)
            WHERE id = $4
            "#,
        )
        .bind(first_course)
        .bind(main_course)
        .bind(desert_course)
        .bind(guest_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_wire_names_match_the_catalog() {
        assert_eq!(
            serde_json::to_string(&ResponseType::NoResponse).unwrap(),
            "\"NO_RESPONSE\""
        );
        assert_eq!(
            serde_json::to_string(&InvitationType::Weekend).unwrap(),
            "\"WEEKEND\""
        );
        let parsed: ResponseType = serde_json::from_str("\"DECLINED\"").unwrap();
        assert_eq!(parsed, ResponseType::Declined);
    }

    #[test]
    fn enum_db_values_are_stable() {
        assert_eq!(InvitationType::House as i32, 0);
        assert_eq!(InvitationType::Day as i32, 2);
        assert_eq!(ResponseType::NoResponse as i32, 0);
        assert_eq!(ResponseType::Declined as i32, 2);
    }
}
