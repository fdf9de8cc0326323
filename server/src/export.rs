use axum::Router;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use types::{Category, Expense, ExpenseSummary, Feature, Result, err};

use crate::{Access, BACKEND_CLIENT, STORAGE, authorize, expense_list, session_from_headers};

const CSV_HEADER: [&str; 9] = [
    "id",
    "cab_number",
    "date",
    "total_amount",
    "fuel",
    "toll",
    "tyre",
    "other",
    "source",
];

pub fn export_router() -> Router {
    Router::new()
        .route("/export/expenses.csv", get(csv_export))
        .route("/export/expenses.xlsx", get(xlsx_export))
}

async fn csv_export(headers: HeaderMap) -> Response {
    match exported_expenses(&headers).await.and_then(|e| expenses_csv(&e)) {
        Ok(body) => attachment(body, "text/csv; charset=utf-8", "expenses.csv"),
        Err(error) => failure(error),
    }
}

async fn xlsx_export(headers: HeaderMap) -> Response {
    match exported_expenses(&headers).await.and_then(|e| expenses_xlsx(&e)) {
        Ok(body) => attachment(
            body,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "expenses.xlsx",
        ),
        Err(error) => failure(error),
    }
}

/// Everything the expense page shows. An unreachable backend narrows the export to local records.
async fn exported_expenses(headers: &HeaderMap) -> Result<Vec<Expense>> {
    let session = session_from_headers(&STORAGE, headers).await?;
    let user = authorize(&STORAGE, session.user_data().clone(), Access::Feature(Feature::Reports)).await?;

    let list = expense_list(&STORAGE, &BACKEND_CLIENT.session(&user.access_token)).await?;
    if let Some(error) = &list.remote_error {
        tracing::warn!(%error, "exporting local expenses only");
    }
    tracing::info!(user = %user.email, records = list.expenses.len(), "expenses exported");
    Ok(list.expenses)
}

fn attachment(body: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

fn failure(error: types::Error) -> Response {
    let status = StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(?error, "export failed");
    }
    (status, error.to_string()).into_response()
}

fn amount(value: f64) -> String {
    format!("{value:.2}")
}

pub fn expenses_csv(expenses: &[Expense]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for expense in expenses {
        writer.write_record([
            expense.id.clone(),
            expense.cab_number.clone(),
            expense.recorded_on.map(|d| d.to_string()).unwrap_or_default(),
            amount(expense.total_amount),
            amount(expense.breakdown.fuel),
            amount(expense.breakdown.toll),
            amount(expense.breakdown.tyre),
            amount(expense.breakdown.other),
            format!("{:?}", expense.source),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| err!("failed to flush csv: {}", e.error()))
}

/// Workbook with a summary sheet followed by one row per expense.
pub fn expenses_xlsx(expenses: &[Expense]) -> Result<Vec<u8>> {
    let summary = ExpenseSummary::from_expenses(expenses);
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");
    let percent = Format::new().set_num_format("0.0\"%\"");

    write_summary(&mut workbook, &summary, &bold, &money, &percent)?;

    let sheet = workbook.add_worksheet().set_name("Expenses")?;
    for (col, title) in CSV_HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (i, expense) in expenses.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &expense.id)?;
        sheet.write_string(row, 1, &expense.cab_number)?;
        if let Some(date) = expense.recorded_on {
            sheet.write_string(row, 2, date.to_string())?;
        }
        sheet.write_number_with_format(row, 3, expense.total_amount, &money)?;
        for (offset, category) in Category::ALL.into_iter().enumerate() {
            sheet.write_number_with_format(row, 4 + offset as u16, expense.breakdown.get(category), &money)?;
        }
        sheet.write_string(row, 8, format!("{:?}", expense.source))?;
    }
    sheet.set_column_width(1, 14)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_summary(
    workbook: &mut Workbook,
    summary: &ExpenseSummary,
    bold: &Format,
    money: &Format,
    percent: &Format,
) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet().set_name("Summary")?;
    sheet.set_column_width(0, 22)?;

    sheet.write_string_with_format(0, 0, "Total", bold)?;
    sheet.write_number_with_format(0, 1, summary.total, money)?;
    sheet.write_string_with_format(1, 0, "Records", bold)?;
    sheet.write_number(1, 1, summary.record_count as f64)?;
    sheet.write_string_with_format(2, 0, "Average per cab", bold)?;
    sheet.write_number_with_format(2, 1, summary.average_per_cab(), money)?;
    sheet.write_string_with_format(3, 0, "Unbalanced records", bold)?;
    sheet.write_number(3, 1, summary.unbalanced as f64)?;

    sheet.write_string_with_format(5, 0, "Category", bold)?;
    sheet.write_string_with_format(5, 1, "Amount", bold)?;
    sheet.write_string_with_format(5, 2, "Share", bold)?;
    for (i, (category, total, share)) in summary.category_shares().into_iter().enumerate() {
        let row = 6 + i as u32;
        sheet.write_string(row, 0, category.label())?;
        sheet.write_number_with_format(row, 1, total, money)?;
        sheet.write_number_with_format(row, 2, share, percent)?;
    }

    let start = 7 + Category::ALL.len() as u32;
    sheet.write_string_with_format(start, 0, "Cab", bold)?;
    sheet.write_string_with_format(start, 1, "Amount", bold)?;
    for (i, (cab, total)) in summary.by_cab.iter().enumerate() {
        let row = start + 1 + i as u32;
        sheet.write_string(row, 0, cab)?;
        sheet.write_number_with_format(row, 1, *total, money)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use types::{Breakdown, ExpenseSource};

    use super::*;

    fn expenses() -> Vec<Expense> {
        vec![
            Expense {
                id: "e1".into(),
                cab_number: "KA-01".into(),
                total_amount: 1200.0,
                breakdown: Breakdown {
                    fuel: 1000.0,
                    toll: 200.0,
                    tyre: 0.0,
                    other: 0.0,
                },
                recorded_on: Some(date(2024, 6, 1)),
                source: ExpenseSource::Remote,
            },
            Expense {
                id: "l1".into(),
                cab_number: "KA-02, spare".into(),
                total_amount: 99.5,
                breakdown: Breakdown::default(),
                recorded_on: None,
                source: ExpenseSource::Local,
            },
        ]
    }

    #[test]
    fn csv_has_a_header_and_one_row_per_expense() {
        let csv = String::from_utf8(expenses_csv(&expenses()).unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,cab_number,date,total_amount,fuel,toll,tyre,other,source");
        assert_eq!(lines[1], "e1,KA-01,2024-06-01,1200.00,1000.00,200.00,0.00,0.00,Remote");
        assert_eq!(lines[2], "l1,\"KA-02, spare\",,99.50,0.00,0.00,0.00,0.00,Local");
    }

    #[test]
    fn empty_csv_still_has_the_header() {
        let csv = String::from_utf8(expenses_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = expenses_xlsx(&expenses()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn failures_keep_their_status() {
        let response = failure(types::Error::forbidden("no reports"));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
