use dioxus::prelude::*;
use types::expense::format_amount;
use types::{ExpenseList, ExpenseSummary};
use ui::{BarChart, LineChart, PieChart, StatCard};

use super::components::{ExportLinks, PageHeader};
use crate::ErrorInfo;

/// Cabs in the bar chart, highest spend first.
const TOP_CABS: usize = 8;

/// `(value, error)` for a stat card fed by one request.
fn card_state<T>(
    result: Option<&Result<T, ServerFnError>>,
    show: impl Fn(&T) -> String,
) -> (Option<String>, Option<String>) {
    match result {
        None => (None, None),
        Some(Ok(value)) => (Some(show(value)), None),
        Some(Err(e)) => (None, Some(ErrorInfo::from_server_error(e).message)),
    }
}

/// Total for the expense card, read from the summary the charts share.
fn expense_total(summary: Option<&ExpenseSummary>) -> Option<String> {
    summary.map(|s| format_amount(s.total))
}

#[component]
pub fn Dashboard() -> Element {
    // Each card loads on its own; one failing request leaves the others intact.
    let sub_admins = use_resource(api::sub_admin_count);
    let drivers = use_resource(api::driver_count);
    let cabs = use_resource(api::cab_count);
    let expenses = use_resource(api::list_expenses);

    let summary = use_memo(move || {
        expenses
            .read()
            .as_ref()
            .and_then(|result| result.as_ref().ok())
            .map(|list: &ExpenseList| ExpenseSummary::from_expenses(&list.expenses))
    });

    let (sub_admin_value, sub_admin_error) = card_state(sub_admins.read().as_ref(), u64::to_string);
    let (driver_value, driver_error) = card_state(drivers.read().as_ref(), u64::to_string);
    let (cab_value, cab_error) = card_state(cabs.read().as_ref(), u64::to_string);
    let (_, expense_error) = card_state(expenses.read().as_ref(), |_: &ExpenseList| String::new());
    let expense_value = expense_total(summary.read().as_ref());
    let remote_error = expenses
        .read()
        .as_ref()
        .and_then(|result| result.as_ref().ok())
        .and_then(|list| list.remote_error.clone());

    rsx! {
        div {
            PageHeader {
                title: "Dashboard",
                subtitle: "Fleet at a glance.",
                actions: rsx! {
                    ExportLinks { class: "btn btn-secondary" }
                },
            }

            div { class: "grid grid-cols-4",
                StatCard { title: "Sub-Admins", value: sub_admin_value, error: sub_admin_error }
                StatCard { title: "Drivers", value: driver_value, error: driver_error }
                StatCard { title: "Cabs", value: cab_value, error: cab_error }
                StatCard {
                    title: "Total Expenses",
                    value: expense_value,
                    error: expense_error,
                    hint: summary().map(|s| format!("{} records", s.record_count)),
                }
            }

            if let Some(error) = remote_error {
                div { class: "alert alert-warning",
                    "Fleet backend unavailable, charts show locally recorded expenses only: {error}"
                }
            }

            {match summary() {
                None => rsx! {
                    div { class: "loading", "Loading expenses..." }
                },
                Some(summary) => rsx! {
                    ExpenseCharts { summary }
                },
            }}
        }
    }
}

#[component]
fn ExpenseCharts(summary: ExpenseSummary) -> Element {
    let shares = summary.category_shares();
    let categories: Vec<(String, f64)> = shares
        .iter()
        .map(|(category, amount, _)| (category.label().to_string(), *amount))
        .collect();
    let top_cabs: Vec<(String, f64)> = summary.by_cab.iter().take(TOP_CABS).cloned().collect();
    let average = format_amount(summary.average_per_cab());

    rsx! {
        div { class: "grid grid-cols-2",
            div { class: "card",
                div { class: "card-header",
                    h2 { class: "card-title", "Spend by category" }
                }
                PieChart { data: categories }
            }
            div { class: "card",
                div { class: "card-header",
                    h2 { class: "card-title", "Spend by cab" }
                    span { class: "text-muted", "Average per cab: {average}" }
                }
                BarChart { data: top_cabs }
            }
        }

        div { class: "card",
            div { class: "card-header",
                h2 { class: "card-title", "Monthly spend" }
            }
            LineChart { data: summary.by_month.clone() }
        }

        div { class: "card",
            div { class: "card-header",
                h2 { class: "card-title", "Category breakdown" }
                if summary.unbalanced > 0 {
                    span { class: "badge badge-warning",
                        "{summary.unbalanced} records don't add up to their total"
                    }
                }
            }
            div { class: "table-container",
                table {
                    thead {
                        tr {
                            th { "Category" }
                            th { class: "text-right", "Amount" }
                            th { class: "text-right", "Share" }
                        }
                    }
                    tbody {
                        for (category, amount, share) in shares {
                            tr { key: "{category:?}",
                                td { {category.label()} }
                                td { class: "text-right", {format_amount(amount)} }
                                td { class: "text-right", "{share:.1}%" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use types::{Breakdown, Expense, ExpenseSource};

    use super::*;

    #[test]
    fn card_state_covers_loading_success_and_failure() {
        assert_eq!(card_state::<u64>(None, u64::to_string), (None, None));
        assert_eq!(card_state(Some(&Ok(12u64)), u64::to_string), (Some("12".into()), None));

        let failed: Result<u64, ServerFnError> = Err(ServerFnError::ServerError {
            message: "backend down".into(),
            code: 502,
            details: None,
        });
        let (value, error) = card_state(Some(&failed), u64::to_string);
        assert!(value.is_none());
        assert_eq!(error.as_deref(), Some("backend down"));
    }

    #[test]
    fn expense_card_shows_the_summary_total() {
        let expense = |id: &str, total: f64| Expense {
            id: id.into(),
            cab_number: "KA-01".into(),
            total_amount: total,
            breakdown: Breakdown::default(),
            recorded_on: None,
            source: ExpenseSource::Local,
        };
        let summary = ExpenseSummary::from_expenses(&[expense("a", 1000.0), expense("b", 234.5)]);

        assert_eq!(expense_total(Some(&summary)).as_deref(), Some("1,234.50"));
        assert_eq!(expense_total(None), None);
    }
}
