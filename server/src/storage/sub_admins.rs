use types::{Error, InviteStatus, Permissions, Result, SubAdmin, SubAdminStatus, err};
use uuid::Uuid;

use super::{Storage, expect_one, map_conflict};

#[derive(sqlx::FromRow)]
struct SubAdminRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    status: String,
    permissions: String,
    invite: String,
}

impl TryFrom<SubAdminRow> for SubAdmin {
    type Error = Error;

    fn try_from(row: SubAdminRow) -> Result<Self> {
        Ok(SubAdmin {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            status: SubAdminStatus::parse(&row.status)
                .ok_or_else(|| err!("unknown sub-admin status {:?}", row.status))?,
            permissions: serde_json::from_str(&row.permissions)?,
            invite: InviteStatus::parse(&row.invite)
                .ok_or_else(|| err!("unknown invite status {:?}", row.invite))?,
        })
    }
}

const DUPLICATE: &str = "A sub-admin with this email already exists";

impl Storage {
    pub async fn list_sub_admins(&self) -> Result<Vec<SubAdmin>> {
        let rows: Vec<SubAdminRow> = sqlx::query_as("SELECT * FROM sub_admins ORDER BY name, email")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(SubAdmin::try_from).collect()
    }

    pub async fn get_sub_admin(&self, id: Uuid) -> Result<SubAdmin> {
        let row: Option<SubAdminRow> = sqlx::query_as("SELECT * FROM sub_admins WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| Error::not_found("sub-admin not found"))?
            .try_into()
    }

    pub async fn find_sub_admin_by_email(&self, email: &str) -> Result<Option<SubAdmin>> {
        let row: Option<SubAdminRow> = sqlx::query_as("SELECT * FROM sub_admins WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.map(SubAdmin::try_from).transpose()
    }

    pub async fn insert_sub_admin(&self, sub_admin: &SubAdmin) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sub_admins (id, name, email, role, status, permissions, invite)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sub_admin.id)
        .bind(&sub_admin.name)
        .bind(&sub_admin.email)
        .bind(&sub_admin.role)
        .bind(sub_admin.status.as_str())
        .bind(serde_json::to_string(&sub_admin.permissions)?)
        .bind(sub_admin.invite.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_conflict(e, DUPLICATE))?;

        Ok(())
    }

    pub async fn update_sub_admin(&self, sub_admin: &SubAdmin) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sub_admins
            SET name = ?, email = ?, role = ?, status = ?, permissions = ?, invite = ?
            WHERE id = ?
            "#,
        )
        .bind(&sub_admin.name)
        .bind(&sub_admin.email)
        .bind(&sub_admin.role)
        .bind(sub_admin.status.as_str())
        .bind(serde_json::to_string(&sub_admin.permissions)?)
        .bind(sub_admin.invite.as_str())
        .bind(sub_admin.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_conflict(e, DUPLICATE))?;

        expect_one(result.rows_affected(), "sub-admin")
    }

    pub async fn set_permissions(&self, id: Uuid, permissions: Permissions) -> Result<()> {
        let result = sqlx::query("UPDATE sub_admins SET permissions = ? WHERE id = ?")
            .bind(serde_json::to_string(&permissions)?)
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "sub-admin")
    }

    pub async fn set_invite_status(&self, id: Uuid, invite: InviteStatus) -> Result<()> {
        let result = sqlx::query("UPDATE sub_admins SET invite = ? WHERE id = ?")
            .bind(invite.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "sub-admin")
    }

    pub async fn delete_sub_admin(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM sub_admins WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "sub-admin")
    }
}

#[cfg(test)]
mod tests {
    use types::Feature;

    use super::*;

    fn sub_admin(email: &str) -> SubAdmin {
        SubAdmin {
            id: Uuid::now_v7(),
            name: "Asha".into(),
            email: email.into(),
            role: "Dispatcher".into(),
            status: SubAdminStatus::Active,
            permissions: Permissions::default(),
            invite: InviteStatus::Pending,
        }
    }

    #[tokio::test]
    async fn permissions_and_invite_are_persisted() {
        let storage = Storage::in_memory().await.unwrap();
        let saved = sub_admin("asha@example.com");
        storage.insert_sub_admin(&saved).await.unwrap();

        let granted = saved.permissions.toggled(Feature::Cabs);
        storage.set_permissions(saved.id, granted).await.unwrap();
        storage
            .set_invite_status(saved.id, InviteStatus::Success)
            .await
            .unwrap();

        let found = storage
            .find_sub_admin_by_email("Asha@Example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, saved.id);
        assert!(found.permissions.get(Feature::Cabs));
        assert!(found.permissions.get(Feature::Dashboard));
        assert_eq!(found.invite, InviteStatus::Success);
    }

    #[tokio::test]
    async fn emails_are_unique() {
        let storage = Storage::in_memory().await.unwrap();
        storage.insert_sub_admin(&sub_admin("asha@example.com")).await.unwrap();

        let error = storage
            .insert_sub_admin(&sub_admin("asha@example.com"))
            .await
            .unwrap_err();
        assert_eq!(error.status(), 400);
    }

    #[tokio::test]
    async fn status_updates_and_deletion() {
        let storage = Storage::in_memory().await.unwrap();
        let mut saved = sub_admin("asha@example.com");
        storage.insert_sub_admin(&saved).await.unwrap();

        saved.status = saved.status.flipped();
        storage.update_sub_admin(&saved).await.unwrap();
        assert_eq!(
            storage.list_sub_admins().await.unwrap()[0].status,
            SubAdminStatus::Inactive
        );

        storage.delete_sub_admin(saved.id).await.unwrap();
        assert!(storage.list_sub_admins().await.unwrap().is_empty());
        assert_eq!(
            storage.set_permissions(saved.id, Permissions::all()).await.unwrap_err().status(),
            404
        );
    }
}
