use types::{Breakdown, Error, Expense, ExpenseSource, Result};

use super::{Storage, expect_one, parse_date};

#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: String,
    cab_number: String,
    total_amount: f64,
    fuel: f64,
    toll: f64,
    tyre: f64,
    other: f64,
    recorded_on: Option<String>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = Error;

    fn try_from(row: ExpenseRow) -> Result<Self> {
        Ok(Expense {
            id: row.id,
            cab_number: row.cab_number,
            total_amount: row.total_amount,
            breakdown: Breakdown {
                fuel: row.fuel,
                toll: row.toll,
                tyre: row.tyre,
                other: row.other,
            },
            recorded_on: parse_date("recorded_on", row.recorded_on)?,
            source: ExpenseSource::Local,
        })
    }
}

fn ensure_local(expense: &Expense) -> Result<()> {
    if !expense.is_editable() {
        return Err(Error::bad_request("Backend expense records are read-only"));
    }
    Ok(())
}

/// Only locally recorded expenses live here; backend ones are fetched per request.
impl Storage {
    pub async fn list_local_expenses(&self) -> Result<Vec<Expense>> {
        let rows: Vec<ExpenseRow> =
            sqlx::query_as("SELECT * FROM expenses ORDER BY recorded_on DESC, cab_number")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Expense::try_from).collect()
    }

    pub async fn insert_expense(&self, expense: &Expense) -> Result<()> {
        ensure_local(expense)?;

        sqlx::query(
            r#"
            INSERT INTO expenses (id, cab_number, total_amount, fuel, toll, tyre, other, recorded_on)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.cab_number)
        .bind(expense.total_amount)
        .bind(expense.breakdown.fuel)
        .bind(expense.breakdown.toll)
        .bind(expense.breakdown.tyre)
        .bind(expense.breakdown.other)
        .bind(expense.recorded_on.map(|d| d.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_expense(&self, expense: &Expense) -> Result<()> {
        ensure_local(expense)?;

        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET cab_number = ?, total_amount = ?, fuel = ?, toll = ?, tyre = ?, other = ?, recorded_on = ?
            WHERE id = ?
            "#,
        )
        .bind(&expense.cab_number)
        .bind(expense.total_amount)
        .bind(expense.breakdown.fuel)
        .bind(expense.breakdown.toll)
        .bind(expense.breakdown.tyre)
        .bind(expense.breakdown.other)
        .bind(expense.recorded_on.map(|d| d.to_string()))
        .bind(&expense.id)
        .execute(&self.pool)
        .await?;

        expect_one(result.rows_affected(), "expense")
    }

    pub async fn delete_expense(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result.rows_affected(), "expense")
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn expense(id: &str, cab: &str) -> Expense {
        Expense {
            id: id.into(),
            cab_number: cab.into(),
            total_amount: 1500.0,
            breakdown: Breakdown {
                fuel: 1000.0,
                toll: 200.0,
                tyre: 0.0,
                other: 300.0,
            },
            recorded_on: Some(date(2024, 6, 3)),
            source: ExpenseSource::Local,
        }
    }

    #[tokio::test]
    async fn local_expenses_round_trip() {
        let storage = Storage::in_memory().await.unwrap();
        let mut saved = expense("e-1", "KA-01");
        storage.insert_expense(&saved).await.unwrap();

        saved.breakdown.tyre = 250.0;
        saved.total_amount = 1750.0;
        storage.update_expense(&saved).await.unwrap();

        let listed = storage.list_local_expenses().await.unwrap();
        assert_eq!(listed, vec![saved]);
        assert!(listed[0].is_balanced());
    }

    #[tokio::test]
    async fn remote_records_cannot_be_written() {
        let storage = Storage::in_memory().await.unwrap();
        let mut remote = expense("r-1", "KA-01");
        remote.source = ExpenseSource::Remote;

        assert_eq!(storage.insert_expense(&remote).await.unwrap_err().status(), 400);
        assert!(storage.list_local_expenses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_unknown_expense_is_not_found() {
        let storage = Storage::in_memory().await.unwrap();
        assert_eq!(storage.delete_expense("nope").await.unwrap_err().status(), 404);
    }
}
