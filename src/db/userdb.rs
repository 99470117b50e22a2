// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::User;

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Whether the contractor is the assigned contractor on the project.
    async fn is_project_contractor(
        &self,
        project_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<bool, sqlx::Error>;

    /// The homeowner who owns the project, if the project exists.
    async fn get_project_homeowner(&self, project_id: Uuid)
        -> Result<Option<Uuid>, sqlx::Error>;

    /// The contractor who published the technical-details record, if it
    /// exists.
    async fn get_technical_details_contractor(
        &self,
        detail_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, role, phone, created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, role, phone, created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn is_project_contractor(
        &self,
        project_id: Uuid,
        contractor_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM projects
            WHERE id = $1 AND contractor_id = $2
            "#,
        )
        .bind(project_id)
        .bind(contractor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exists.is_some())
    }

    async fn get_project_homeowner(
        &self,
        project_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT homeowner_id FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    async fn get_technical_details_contractor(
        &self,
        detail_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT contractor_id FROM technical_details
            WHERE id = $1
            "#,
        )
        .bind(detail_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }
}
