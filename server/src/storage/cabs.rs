use types::{Cab, CabStatus, Result, err};
use uuid::Uuid;

use super::{Storage, expect_one, map_conflict, parse_date};

#[derive(sqlx::FromRow)]
struct CabRow {
    id: Uuid,
    cab_number: String,
    model: String,
    driver_name: Option<String>,
    last_service: Option<String>,
    next_service: Option<String>,
    odometer_km: i64,
    status: String,
}

impl TryFrom<CabRow> for Cab {
    type Error = types::Error;

    fn try_from(row: CabRow) -> Result<Self> {
        Ok(Cab {
            id: row.id,
            cab_number: row.cab_number,
            model: row.model,
            driver_name: row.driver_name,
            last_service: parse_date("last_service", row.last_service)?,
            next_service: parse_date("next_service", row.next_service)?,
            odometer_km: u32::try_from(row.odometer_km)?,
            status: CabStatus::parse(&row.status)
                .ok_or_else(|| err!("unknown cab status {:?}", row.status))?,
        })
    }
}

const DUPLICATE: &str = "A cab with this number already exists";

impl Storage {
    pub async fn list_cabs(&self) -> Result<Vec<Cab>> {
        let rows: Vec<CabRow> = sqlx::query_as("SELECT * FROM cabs ORDER BY cab_number")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Cab::try_from).collect()
    }

    pub async fn insert_cab(&self, cab: &Cab) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cabs (id, cab_number, model, driver_name, last_service, next_service, odometer_km, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(cab.id)
        .bind(&cab.cab_number)
        .bind(&cab.model)
        .bind(&cab.driver_name)
        .bind(cab.last_service.map(|d| d.to_string()))
        .bind(cab.next_service.map(|d| d.to_string()))
        .bind(i64::from(cab.odometer_km))
        .bind(cab.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_conflict(e, DUPLICATE))?;

        Ok(())
    }

    pub async fn update_cab(&self, cab: &Cab) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE cabs
            SET cab_number = ?, model = ?, driver_name = ?, last_service = ?, next_service = ?,
                odometer_km = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(&cab.cab_number)
        .bind(&cab.model)
        .bind(&cab.driver_name)
        .bind(cab.last_service.map(|d| d.to_string()))
        .bind(cab.next_service.map(|d| d.to_string()))
        .bind(i64::from(cab.odometer_km))
        .bind(cab.status.as_str())
        .bind(cab.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_conflict(e, DUPLICATE))?;

        expect_one(result.rows_affected(), "cab")
    }

    pub async fn delete_cab(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM cabs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "cab")
    }
}
