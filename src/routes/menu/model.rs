use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum MenuCourse {
    Starter = 0,
    Main = 1,
    Desert = 2,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MenuItem {
    pub id: i32,
    pub course: MenuCourse,
    pub description: String,
    pub gluten_free: bool,
    pub vegetarian: bool,
    pub additional_info: Option<String>,
}

impl MenuItem {
    pub async fn all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, course, description, gluten_free, vegetarian, additional_info
            FROM menu_items
            ORDER BY course, id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, item_id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, course, description, gluten_free, vegetarian, additional_info
            FROM menu_items
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(pool)
        .await
    }

    /// 选菜校验用：id存在且属于指定菜式才算数
    pub async fn find_by_course_and_id(
        pool: &PgPool,
        course: MenuCourse,
        item_id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, course, description, gluten_free, vegetarian, additional_info
            FROM menu_items
            WHERE course = $1 AND id = $2
            "#,
        )
        .bind(course)
        .bind(item_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        course: MenuCourse,
        description: &str,
        gluten_free: bool,
        vegetarian: bool,
        additional_info: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, MenuItem>(
            r#"
            INSERT INTO menu_items (course, description, gluten_free, vegetarian, additional_info)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, course, description, gluten_free, vegetarian, additional_info
            "#,
        )
        .bind(course)
        .bind(description)
        .bind(gluten_free)
        .bind(vegetarian)
        .bind(additional_info)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        item_id: i32,
        course: Option<MenuCourse>,
        description: Option<&str>,
        gluten_free: Option<bool>,
        vegetarian: Option<bool>,
        additional_info: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MenuItem>(
            r#"
            UPDATE menu_items
            SET course = COALESCE($1, course),
                description = COALESCE($2, description),
                gluten_free = COALESCE($3, gluten_free),
                vegetarian = COALESCE($4, vegetarian),
                additional_info = COALESCE($5, additional_info)
            WHERE id = $6
            RETURNING id, course, description, gluten_free, vegetarian, additional_info
            "#,
        )
        .bind(course)
        .bind(description)
        .bind(gluten_free)
        .bind(vegetarian)
        .bind(additional_info)
        .bind(item_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, item_id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(item_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_wire_names_round_trip() {
        assert_eq!(
            serde_json::to_string(&MenuCourse::Starter).unwrap(),
            "\"STARTER\""
        );
        let parsed: MenuCourse = serde_json::from_str("\"DESERT\"").unwrap();
        assert_eq!(parsed, MenuCourse::Desert);
    }

    #[test]
    fn course_db_values_are_stable() {
        assert_eq!(MenuCourse::Starter as i32, 0);
        assert_eq!(MenuCourse::Main as i32, 1);
        assert_eq!(MenuCourse::Desert as i32, 2);
    }
}
