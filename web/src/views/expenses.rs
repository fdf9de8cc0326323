use dioxus::prelude::*;
use types::expense::format_amount;
use types::listing::{filter_records, paginate};
use types::{Expense, ExpenseDraft, ExpenseList, ExpenseSource, FieldErrors};
use ui::{ConfirmDelete, Modal, Pagination, SearchBar, SelectField, TextField};
use uuid::Uuid;

use super::components::{Editing, ExportLinks, PageHeader, field_error, upsert};
use crate::{use_error, use_page_size};

fn source_filter_options() -> Vec<(String, String)> {
    vec![
        (String::new(), "All sources".to_string()),
        ("remote".to_string(), "Fleet backend".to_string()),
        ("local".to_string(), "Recorded here".to_string()),
    ]
}

fn parse_source(value: &str) -> Option<ExpenseSource> {
    match value {
        "remote" => Some(ExpenseSource::Remote),
        "local" => Some(ExpenseSource::Local),
        _ => None,
    }
}

fn source_badge(source: ExpenseSource) -> (&'static str, &'static str) {
    match source {
        ExpenseSource::Remote => ("badge badge-info", "Backend"),
        ExpenseSource::Local => ("badge badge-neutral", "Local"),
    }
}

/// Backend records stay ahead of local ones.
fn by_source(a: &Expense, b: &Expense) -> std::cmp::Ordering {
    let local = |e: &Expense| e.source == ExpenseSource::Local;
    local(a).cmp(&local(b))
}

/// What a blank total will be saved as.
fn breakdown_preview(draft: &ExpenseDraft) -> Option<String> {
    if !draft.total_amount.trim().is_empty() {
        return None;
    }
    let parse = |v: &str| v.trim().parse::<f64>().unwrap_or(0.0);
    let sum = parse(&draft.fuel) + parse(&draft.toll) + parse(&draft.tyre) + parse(&draft.other);
    Some(format_amount(sum))
}

#[component]
pub fn Expenses() -> Element {
    let mut list = use_signal(ExpenseList::default);
    let mut loading = use_signal(|| true);
    let mut error_state = use_error();
    let mut search = use_signal(String::new);
    let mut source_filter = use_signal(|| None::<ExpenseSource>);
    let mut page = use_signal(|| 1usize);
    let mut editing = use_signal(|| None::<Editing<Expense>>);
    let mut deleting = use_signal(|| None::<Expense>);
    let mut delete_in_flight = use_signal(|| false);
    let page_size = use_page_size();

    use_effect(move || {
        spawn(async move {
            loading.set(true);
            match api::list_expenses().await {
                Ok(fetched) => list.set(fetched),
                Err(e) => error_state.set_server_error(&e),
            }
            loading.set(false);
        });
    });

    let filter = source_filter();
    let filtered: Vec<Expense> = filter_records(list.read().expenses.as_slice(), search.read().as_str(), |e| {
        filter.is_none_or(|source| e.source == source)
    })
    .into_iter()
    .cloned()
    .collect();
    let filtered_total = format_amount(filtered.iter().map(|e| e.total_amount).sum());
    let current = paginate(&filtered, page(), page_size);
    let remote_error = list.read().remote_error.clone();
    let filter_value = match filter {
        Some(ExpenseSource::Remote) => "remote",
        Some(ExpenseSource::Local) => "local",
        None => "",
    };

    rsx! {
        div {
            PageHeader {
                title: "Expense Tracking",
                subtitle: "Fuel, toll, tyre and other running costs per cab.",
                actions: rsx! {
                    ExportLinks { class: "btn btn-secondary" }
                    button {
                        class: "btn btn-primary",
                        onclick: move |_| editing.set(Some(Editing::New)),
                        "Add Expense"
                    }
                },
            }

            if let Some(error) = remote_error {
                div { class: "alert alert-warning",
                    "Could not reach the fleet backend; showing locally recorded expenses only. {error}"
                }
            }

            if let Some(target) = editing() {
                ExpenseEditor {
                    editing: target,
                    on_close: move |_| editing.set(None),
                    on_saved: move |expense: Expense| {
                        upsert(&mut list.write().expenses, expense, |a, b| a.id == b.id, by_source);
                        editing.set(None);
                    },
                }
            }

            if let Some(expense) = deleting() {
                ConfirmDelete {
                    title: "Delete Expense",
                    item_name: format!("{} ({})", expense.cab_number, format_amount(expense.total_amount)),
                    deleting: delete_in_flight(),
                    on_close: move |_| deleting.set(None),
                    on_confirm: move |_| {
                        let id = expense.id.clone();
                        spawn(async move {
                            delete_in_flight.set(true);
                            match api::delete_expense(id.clone()).await {
                                Ok(()) => list.write().expenses.retain(|e| e.id != id),
                                Err(e) => error_state.set_server_error(&e),
                            }
                            delete_in_flight.set(false);
                            deleting.set(None);
                        });
                    },
                }
            }

            div { class: "card",
                div { class: "card-header list-controls",
                    SearchBar {
                        value: search(),
                        placeholder: "Search by cab number",
                        on_input: move |value: String| {
                            search.set(value);
                            page.set(1);
                        },
                    }
                    SelectField {
                        id: "expense-source-filter",
                        label: "Source",
                        value: filter_value.to_string(),
                        options: source_filter_options(),
                        on_change: move |value: String| {
                            source_filter.set(parse_source(&value));
                            page.set(1);
                        },
                    }
                    span { class: "list-total", "Total: {filtered_total}" }
                }

                if loading() {
                    div { class: "loading", "Loading expenses..." }
                } else if current.items.is_empty() {
                    div { class: "empty-state", "No expenses match." }
                } else {
                    div { class: "table-container",
                        table {
                            thead {
                                tr {
                                    th { "Cab No." }
                                    th { "Date" }
                                    th { class: "text-right", "Fuel" }
                                    th { class: "text-right", "Toll" }
                                    th { class: "text-right", "Tyre" }
                                    th { class: "text-right", "Other" }
                                    th { class: "text-right", "Total" }
                                    th { "Source" }
                                    th { "" }
                                }
                            }
                            tbody {
                                for expense in current.items.clone() {
                                    {
                                        let (badge_class, badge_text) = source_badge(expense.source);
                                        let date = expense.recorded_on.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
                                        let balanced = expense.is_balanced();
                                        let editable = expense.is_editable();
                                        let for_edit = expense.clone();
                                        let for_delete = expense.clone();

                                        rsx! {
                                            tr { key: "{expense.id}",
                                                td { class: "font-medium", "{expense.cab_number}" }
                                                td { "{date}" }
                                                td { class: "text-right", {format_amount(expense.breakdown.fuel)} }
                                                td { class: "text-right", {format_amount(expense.breakdown.toll)} }
                                                td { class: "text-right", {format_amount(expense.breakdown.tyre)} }
                                                td { class: "text-right", {format_amount(expense.breakdown.other)} }
                                                td { class: "text-right",
                                                    {format_amount(expense.total_amount)}
                                                    if !balanced {
                                                        span {
                                                            class: "badge badge-warning",
                                                            title: "The breakdown does not add up to the total",
                                                            "!"
                                                        }
                                                    }
                                                }
                                                td {
                                                    span { class: badge_class, "{badge_text}" }
                                                }
                                                td { class: "row-actions",
                                                    if editable {
                                                        button {
                                                            class: "btn btn-secondary btn-sm",
                                                            onclick: move |_| editing.set(Some(Editing::Existing(for_edit.clone()))),
                                                            "Edit"
                                                        }
                                                        button {
                                                            class: "btn btn-danger btn-sm",
                                                            onclick: move |_| deleting.set(Some(for_delete.clone())),
                                                            "Delete"
                                                        }
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                Pagination {
                    info: current.info,
                    on_change: move |p: usize| page.set(p),
                }
            }
        }
    }
}

#[component]
fn ExpenseEditor(
    editing: Editing<Expense>,
    on_close: EventHandler<()>,
    on_saved: EventHandler<Expense>,
) -> Element {
    let mut error_state = use_error();
    let existing_id = editing.existing().map(|expense| expense.id.clone());
    let mut draft = use_signal(|| editing.existing().map(ExpenseDraft::from).unwrap_or_default());
    let mut errors = use_signal(FieldErrors::default);
    let mut server_error = use_signal(|| None::<String>);
    let mut saving = use_signal(|| false);
    let title = if existing_id.is_some() { "Edit Expense" } else { "Add Expense" };
    let preview = breakdown_preview(&draft.read());

    let save = move |_: Event<MouseData>| {
        let current = draft();
        if let Err(found) = current.build(Uuid::nil()) {
            errors.set(found);
            return;
        }
        errors.set(FieldErrors::default());

        let existing_id = existing_id.clone();
        spawn(async move {
            saving.set(true);
            let result = match existing_id {
                Some(id) => api::update_expense(id, current).await,
                None => api::create_expense(current).await,
            };
            saving.set(false);
            match result {
                Ok(expense) => on_saved.call(expense),
                Err(e) => server_error.set(error_state.inline_message(&e)),
            }
        });
    };

    rsx! {
        Modal {
            title: "{title}",
            busy: saving(),
            on_close: on_close,
            footer: rsx! {
                button {
                    class: "btn btn-secondary",
                    disabled: saving(),
                    onclick: move |_| on_close.call(()),
                    "Cancel"
                }
                button {
                    class: "btn btn-primary",
                    disabled: saving(),
                    onclick: save,
                    if saving() { "Saving..." } else { "Save" }
                }
            },

            if let Some(message) = server_error() {
                div { class: "alert alert-error", "{message}" }
            }
            div { class: "form-grid",
                TextField {
                    id: "cab_number",
                    label: "Cab number",
                    value: draft.read().cab_number.clone(),
                    on_input: move |v: String| draft.write().cab_number = v,
                    error: field_error(&errors, "cab_number"),
                    required: true,
                }
                TextField {
                    id: "recorded_on",
                    label: "Date",
                    input_type: "date",
                    value: draft.read().recorded_on.clone(),
                    on_input: move |v: String| draft.write().recorded_on = v,
                    error: field_error(&errors, "recorded_on"),
                }
                TextField {
                    id: "fuel",
                    label: "Fuel",
                    input_type: "number",
                    value: draft.read().fuel.clone(),
                    on_input: move |v: String| draft.write().fuel = v,
                    error: field_error(&errors, "fuel"),
                }
                TextField {
                    id: "toll",
                    label: "Toll",
                    input_type: "number",
                    value: draft.read().toll.clone(),
                    on_input: move |v: String| draft.write().toll = v,
                    error: field_error(&errors, "toll"),
                }
                TextField {
                    id: "tyre",
                    label: "Tyre",
                    input_type: "number",
                    value: draft.read().tyre.clone(),
                    on_input: move |v: String| draft.write().tyre = v,
                    error: field_error(&errors, "tyre"),
                }
                TextField {
                    id: "other",
                    label: "Other",
                    input_type: "number",
                    value: draft.read().other.clone(),
                    on_input: move |v: String| draft.write().other = v,
                    error: field_error(&errors, "other"),
                }
                TextField {
                    id: "total_amount",
                    label: "Total",
                    input_type: "number",
                    placeholder: "Sum of the breakdown",
                    value: draft.read().total_amount.clone(),
                    on_input: move |v: String| draft.write().total_amount = v,
                    error: field_error(&errors, "total_amount"),
                }
            }
            if let Some(sum) = preview {
                p { class: "text-muted", "Total will be saved as {sum}." }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(id: &str, source: ExpenseSource) -> Expense {
        Expense {
            id: id.into(),
            cab_number: "KA-01".into(),
            total_amount: 1.0,
            breakdown: Default::default(),
            recorded_on: None,
            source,
        }
    }

    #[test]
    fn saved_local_records_stay_after_backend_ones() {
        let mut expenses = vec![expense("r1", ExpenseSource::Remote), expense("l1", ExpenseSource::Local)];
        upsert(&mut expenses, expense("l2", ExpenseSource::Local), |a, b| a.id == b.id, by_source);

        let ids: Vec<_> = expenses.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "l1", "l2"]);
    }

    #[test]
    fn preview_only_when_total_is_blank() {
        let mut draft = ExpenseDraft {
            fuel: "100".into(),
            toll: "20.5".into(),
            ..Default::default()
        };
        assert_eq!(breakdown_preview(&draft).as_deref(), Some("120.50"));

        draft.total_amount = "500".into();
        assert_eq!(breakdown_preview(&draft), None);
    }

    #[test]
    fn source_filter_values_round_trip() {
        assert_eq!(parse_source("remote"), Some(ExpenseSource::Remote));
        assert_eq!(parse_source("local"), Some(ExpenseSource::Local));
        assert_eq!(parse_source(""), None);
    }
}
