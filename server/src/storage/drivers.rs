use types::{Driver, Error, Result, err};
use uuid::Uuid;

use super::{Storage, expect_one, map_conflict, parse_date};

#[derive(sqlx::FromRow)]
struct DriverRow {
    id: Uuid,
    name: String,
    license_number: String,
    assigned_cab: Option<String>,
    phone: String,
    email: Option<String>,
    address: String,
    national_id: String,
    joined_on: String,
    left_on: Option<String>,
}

impl TryFrom<DriverRow> for Driver {
    type Error = Error;

    fn try_from(row: DriverRow) -> Result<Self> {
        let joined_on = parse_date("joined_on", Some(row.joined_on))?
            .ok_or_else(|| err!("driver {} has no joining date", row.id))?;

        Ok(Driver {
            id: row.id,
            name: row.name,
            license_number: row.license_number,
            assigned_cab: row.assigned_cab,
            phone: row.phone,
            email: row.email,
            address: row.address,
            national_id: row.national_id,
            joined_on,
            left_on: parse_date("left_on", row.left_on)?,
        })
    }
}

const DUPLICATE: &str = "A driver with this licence number already exists";

impl Storage {
    pub async fn list_drivers(&self) -> Result<Vec<Driver>> {
        let rows: Vec<DriverRow> = sqlx::query_as("SELECT * FROM drivers ORDER BY name, license_number")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Driver::try_from).collect()
    }

    pub async fn insert_driver(&self, driver: &Driver) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO drivers (id, name, license_number, assigned_cab, phone, email, address,
                                 national_id, joined_on, left_on)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(driver.id)
        .bind(&driver.name)
        .bind(&driver.license_number)
        .bind(&driver.assigned_cab)
        .bind(&driver.phone)
        .bind(&driver.email)
        .bind(&driver.address)
        .bind(&driver.national_id)
        .bind(driver.joined_on.to_string())
        .bind(driver.left_on.map(|d| d.to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_conflict(e, DUPLICATE))?;

        Ok(())
    }

    pub async fn update_driver(&self, driver: &Driver) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE drivers
            SET name = ?, license_number = ?, assigned_cab = ?, phone = ?, email = ?, address = ?,
                national_id = ?, joined_on = ?, left_on = ?
            WHERE id = ?
            "#,
        )
        .bind(&driver.name)
        .bind(&driver.license_number)
        .bind(&driver.assigned_cab)
        .bind(&driver.phone)
        .bind(&driver.email)
        .bind(&driver.address)
        .bind(&driver.national_id)
        .bind(driver.joined_on.to_string())
        .bind(driver.left_on.map(|d| d.to_string()))
        .bind(driver.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_conflict(e, DUPLICATE))?;

        expect_one(result.rows_affected(), "driver")
    }

    pub async fn delete_driver(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "driver")
    }
}
