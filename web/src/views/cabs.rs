use dioxus::prelude::*;
use jiff::civil::Date;
use types::listing::{filter_records, paginate};
use types::notification::SERVICE_WARNING_DAYS;
use types::{Cab, CabDraft, CabStatus, FieldErrors};
use ui::{ConfirmDelete, Modal, Pagination, SearchBar, SelectField, TextField};
use uuid::Uuid;

use super::components::{Editing, PageHeader, field_error, today, upsert};
use crate::{use_error, use_page_size};

/// Badge class and text for an upcoming or missed service.
fn service_badge(cab: &Cab, today: Date) -> Option<(&'static str, String)> {
    match cab.days_until_service(today)? {
        days if days < 0 => Some(("badge badge-danger", format!("Overdue by {} days", -days))),
        0 => Some(("badge badge-warning", "Due today".to_string())),
        days if days <= SERVICE_WARNING_DAYS => Some(("badge badge-warning", format!("Due in {days} days"))),
        _ => None,
    }
}

fn date_cell(date: Option<Date>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn status_options() -> Vec<(String, String)> {
    CabStatus::ALL
        .into_iter()
        .map(|s| (s.as_str().to_string(), s.as_str().to_string()))
        .collect()
}

#[component]
pub fn Cabs() -> Element {
    let mut cabs = use_signal(Vec::<Cab>::new);
    let mut loading = use_signal(|| true);
    let mut error_state = use_error();
    let mut search = use_signal(String::new);
    let mut status_filter = use_signal(|| None::<CabStatus>);
    let mut page = use_signal(|| 1usize);
    let mut editing = use_signal(|| None::<Editing<Cab>>);
    let mut deleting = use_signal(|| None::<Cab>);
    let mut delete_in_flight = use_signal(|| false);
    let page_size = use_page_size();

    use_effect(move || {
        spawn(async move {
            loading.set(true);
            match api::list_cabs().await {
                Ok(list) => cabs.set(list),
                Err(e) => error_state.set_server_error(&e),
            }
            loading.set(false);
        });
    });

    let today = today();
    let filter = status_filter();
    let filtered: Vec<Cab> = filter_records(cabs.read().as_slice(), search.read().as_str(), |cab| {
        filter.is_none_or(|status| cab.status == status)
    })
    .into_iter()
    .cloned()
    .collect();
    let current = paginate(&filtered, page(), page_size);
    let mut filter_options = vec![(String::new(), "All statuses".to_string())];
    filter_options.extend(status_options());

    rsx! {
        div {
            PageHeader {
                title: "Cab Management",
                subtitle: "Vehicles, service dates and availability.",
                actions: rsx! {
                    button {
                        class: "btn btn-primary",
                        onclick: move |_| editing.set(Some(Editing::New)),
                        "Add Cab"
                    }
                },
            }

            if let Some(target) = editing() {
                CabEditor {
                    editing: target,
                    on_close: move |_| editing.set(None),
                    on_saved: move |cab: Cab| {
                        upsert(
                            &mut *cabs.write(),
                            cab,
                            |a, b| a.id == b.id,
                            |a, b| a.cab_number.cmp(&b.cab_number),
                        );
                        editing.set(None);
                    },
                }
            }

            if let Some(cab) = deleting() {
                ConfirmDelete {
                    title: "Delete Cab",
                    item_name: cab.cab_number.clone(),
                    deleting: delete_in_flight(),
                    on_close: move |_| deleting.set(None),
                    on_confirm: move |_| {
                        let id = cab.id;
                        spawn(async move {
                            delete_in_flight.set(true);
                            match api::delete_cab(id).await {
                                Ok(()) => cabs.write().retain(|c| c.id != id),
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
                        placeholder: "Search cab number, model or driver",
                        on_input: move |value: String| {
                            search.set(value);
                            page.set(1);
                        },
                    }
                    SelectField {
                        id: "cab-status-filter",
                        label: "Status",
                        value: filter.map(|s| s.as_str().to_string()).unwrap_or_default(),
                        options: filter_options,
                        on_change: move |value: String| {
                            status_filter.set(CabStatus::parse(&value));
                            page.set(1);
                        },
                    }
                }

                if loading() {
                    div { class: "loading", "Loading cabs..." }
                } else if current.items.is_empty() {
                    div { class: "empty-state", "No cabs match." }
                } else {
                    div { class: "table-container",
                        table {
                            thead {
                                tr {
                                    th { "Cab No." }
                                    th { "Model" }
                                    th { "Driver" }
                                    th { "Last Service" }
                                    th { "Next Service" }
                                    th { class: "text-right", "Odometer (km)" }
                                    th { "Status" }
                                    th { "" }
                                }
                            }
                            tbody {
                                for cab in current.items.clone() {
                                    {
                                        let badge = service_badge(&cab, today);
                                        let status_class = format!("badge {}", cab.status.badge());
                                        let for_edit = cab.clone();
                                        let for_delete = cab.clone();

                                        rsx! {
                                            tr { key: "{cab.id}",
                                                td { class: "font-medium", "{cab.cab_number}" }
                                                td { "{cab.model}" }
                                                td { {cab.driver_name.clone().unwrap_or_else(|| "-".to_string())} }
                                                td { {date_cell(cab.last_service)} }
                                                td {
                                                    {date_cell(cab.next_service)}
                                                    if let Some((badge_class, text)) = badge {
                                                        " "
                                                        span { class: badge_class, "{text}" }
                                                    }
                                                }
                                                td { class: "text-right", "{cab.odometer_km}" }
                                                td {
                                                    span { class: "{status_class}", "{cab.status}" }
                                                }
                                                td { class: "row-actions",
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

                Pagination {
                    info: current.info,
                    on_change: move |p: usize| page.set(p),
                }
            }
        }
    }
}

#[component]
fn CabEditor(editing: Editing<Cab>, on_close: EventHandler<()>, on_saved: EventHandler<Cab>) -> Element {
    let mut error_state = use_error();
    let existing_id = editing.existing().map(|cab| cab.id);
    let mut draft = use_signal(|| editing.existing().map(CabDraft::from).unwrap_or_default());
    let mut errors = use_signal(FieldErrors::default);
    let mut server_error = use_signal(|| None::<String>);
    let mut saving = use_signal(|| false);
    let title = if existing_id.is_some() { "Edit Cab" } else { "Add Cab" };

    let save = move |_: Event<MouseData>| {
        let current = draft();
        if let Err(found) = current.build(Uuid::nil()) {
            errors.set(found);
            return;
        }
        errors.set(FieldErrors::default());

        spawn(async move {
            saving.set(true);
            let result = match existing_id {
                Some(id) => api::update_cab(id, current).await,
                None => api::create_cab(current).await,
            };
            saving.set(false);
            match result {
                Ok(cab) => on_saved.call(cab),
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
                    id: "model",
                    label: "Model",
                    value: draft.read().model.clone(),
                    on_input: move |v: String| draft.write().model = v,
                    error: field_error(&errors, "model"),
                    required: true,
                }
                TextField {
                    id: "driver_name",
                    label: "Driver",
                    value: draft.read().driver_name.clone(),
                    on_input: move |v: String| draft.write().driver_name = v,
                    placeholder: "Unassigned",
                }
                TextField {
                    id: "odometer_km",
                    label: "Odometer (km)",
                    input_type: "number",
                    value: draft.read().odometer_km.clone(),
                    on_input: move |v: String| draft.write().odometer_km = v,
                    error: field_error(&errors, "odometer_km"),
                }
                TextField {
                    id: "last_service",
                    label: "Last service",
                    input_type: "date",
                    value: draft.read().last_service.clone(),
                    on_input: move |v: String| draft.write().last_service = v,
                    error: field_error(&errors, "last_service"),
                }
                TextField {
                    id: "next_service",
                    label: "Next service",
                    input_type: "date",
                    value: draft.read().next_service.clone(),
                    on_input: move |v: String| draft.write().next_service = v,
                    error: field_error(&errors, "next_service"),
                }
                SelectField {
                    id: "status",
                    label: "Status",
                    value: draft.read().status.as_str().to_string(),
                    options: status_options(),
                    on_change: move |v: String| {
                        if let Some(status) = CabStatus::parse(&v) {
                            draft.write().status = status;
                        }
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn cab(next_service: Option<Date>) -> Cab {
        Cab {
            id: Uuid::nil(),
            cab_number: "KA-01".into(),
            model: "Dzire".into(),
            driver_name: None,
            last_service: None,
            next_service,
            odometer_km: 0,
            status: CabStatus::Active,
        }
    }

    #[test]
    fn service_badges_warn_a_week_ahead() {
        let today = date(2024, 6, 10);

        assert_eq!(service_badge(&cab(None), today), None);
        assert_eq!(service_badge(&cab(Some(date(2024, 7, 1))), today), None);
        assert_eq!(
            service_badge(&cab(Some(date(2024, 6, 15))), today),
            Some(("badge badge-warning", "Due in 5 days".to_string()))
        );
        assert_eq!(
            service_badge(&cab(Some(today)), today),
            Some(("badge badge-warning", "Due today".to_string()))
        );
        assert_eq!(
            service_badge(&cab(Some(date(2024, 6, 8))), today),
            Some(("badge badge-danger", "Overdue by 2 days".to_string()))
        );
    }
}
