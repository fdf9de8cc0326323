use dioxus::prelude::*;
use jiff::civil::Date;
use types::listing::{filter_records, paginate};
use types::{Driver, DriverDraft, FieldErrors};
use ui::{ConfirmDelete, Modal, Pagination, SearchBar, SelectField, TextField};
use uuid::Uuid;

use super::components::{Editing, PageHeader, field_error, today, upsert};
use crate::{use_error, use_page_size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Employment {
    All,
    Employed,
    Former,
}

impl Employment {
    const ALL: [Employment; 3] = [Employment::All, Employment::Employed, Employment::Former];

    fn as_str(self) -> &'static str {
        match self {
            Employment::All => "all",
            Employment::Employed => "employed",
            Employment::Former => "former",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Employment::All => "All drivers",
            Employment::Employed => "Currently employed",
            Employment::Former => "Former drivers",
        }
    }

    fn parse(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == value)
            .unwrap_or(Employment::All)
    }

    fn keeps(self, driver: &Driver, today: Date) -> bool {
        match self {
            Employment::All => true,
            Employment::Employed => driver.is_employed(today),
            Employment::Former => !driver.is_employed(today),
        }
    }
}

#[component]
pub fn Drivers() -> Element {
    let mut drivers = use_signal(Vec::<Driver>::new);
    let mut loading = use_signal(|| true);
    let mut error_state = use_error();
    let mut search = use_signal(String::new);
    let mut employment = use_signal(|| Employment::All);
    let mut page = use_signal(|| 1usize);
    let mut editing = use_signal(|| None::<Editing<Driver>>);
    let mut deleting = use_signal(|| None::<Driver>);
    let mut delete_in_flight = use_signal(|| false);
    let page_size = use_page_size();

    use_effect(move || {
        spawn(async move {
            loading.set(true);
            match api::list_drivers().await {
                Ok(list) => drivers.set(list),
                Err(e) => error_state.set_server_error(&e),
            }
            loading.set(false);
        });
    });

    let today = today();
    let filter = employment();
    let filtered: Vec<Driver> = filter_records(drivers.read().as_slice(), search.read().as_str(), |driver| {
        filter.keeps(driver, today)
    })
    .into_iter()
    .cloned()
    .collect();
    let current = paginate(&filtered, page(), page_size);
    let filter_options: Vec<(String, String)> = Employment::ALL
        .into_iter()
        .map(|e| (e.as_str().to_string(), e.label().to_string()))
        .collect();

    rsx! {
        div {
            PageHeader {
                title: "Driver Management",
                subtitle: "Drivers, licences and cab assignments.",
                actions: rsx! {
                    button {
                        class: "btn btn-primary",
                        onclick: move |_| editing.set(Some(Editing::New)),
                        "Add Driver"
                    }
                },
            }

            if let Some(target) = editing() {
                DriverEditor {
                    editing: target,
                    on_close: move |_| editing.set(None),
                    on_saved: move |driver: Driver| {
                        upsert(
                            &mut *drivers.write(),
                            driver,
                            |a, b| a.id == b.id,
                            |a, b| a.name.cmp(&b.name).then_with(|| a.license_number.cmp(&b.license_number)),
                        );
                        editing.set(None);
                    },
                }
            }

            if let Some(driver) = deleting() {
                ConfirmDelete {
                    title: "Delete Driver",
                    item_name: driver.name.clone(),
                    deleting: delete_in_flight(),
                    on_close: move |_| deleting.set(None),
                    on_confirm: move |_| {
                        let id = driver.id;
                        spawn(async move {
                            delete_in_flight.set(true);
                            match api::delete_driver(id).await {
                                Ok(()) => drivers.write().retain(|d| d.id != id),
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
                        placeholder: "Search name, licence, cab or phone",
                        on_input: move |value: String| {
                            search.set(value);
                            page.set(1);
                        },
                    }
                    SelectField {
                        id: "driver-employment-filter",
                        label: "Show",
                        value: filter.as_str().to_string(),
                        options: filter_options,
                        on_change: move |value: String| {
                            employment.set(Employment::parse(&value));
                            page.set(1);
                        },
                    }
                }

                if loading() {
                    div { class: "loading", "Loading drivers..." }
                } else if current.items.is_empty() {
                    div { class: "empty-state", "No drivers match." }
                } else {
                    div { class: "table-container",
                        table {
                            thead {
                                tr {
                                    th { "Name" }
                                    th { "Licence No." }
                                    th { "Cab" }
                                    th { "Phone" }
                                    th { "Email" }
                                    th { "Joined" }
                                    th { "Left" }
                                    th { "" }
                                }
                            }
                            tbody {
                                for driver in current.items.clone() {
                                    {
                                        let employed = driver.is_employed(today);
                                        let left = driver.left_on.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
                                        let for_edit = driver.clone();
                                        let for_delete = driver.clone();

                                        rsx! {
                                            tr { key: "{driver.id}",
                                                class: if !employed { "row-muted" },
                                                td { class: "font-medium", "{driver.name}" }
                                                td { "{driver.license_number}" }
                                                td { {driver.assigned_cab.clone().unwrap_or_else(|| "-".to_string())} }
                                                td { "{driver.phone}" }
                                                td { {driver.email.clone().unwrap_or_else(|| "-".to_string())} }
                                                td { "{driver.joined_on}" }
                                                td { "{left}" }
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
fn DriverEditor(
    editing: Editing<Driver>,
    on_close: EventHandler<()>,
    on_saved: EventHandler<Driver>,
) -> Element {
    let mut error_state = use_error();
    let existing_id = editing.existing().map(|driver| driver.id);
    let mut draft = use_signal(|| editing.existing().map(DriverDraft::from).unwrap_or_default());
    let mut errors = use_signal(FieldErrors::default);
    let mut server_error = use_signal(|| None::<String>);
    let mut saving = use_signal(|| false);
    let title = if existing_id.is_some() { "Edit Driver" } else { "Add Driver" };

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
                Some(id) => api::update_driver(id, current).await,
                None => api::create_driver(current).await,
            };
            saving.set(false);
            match result {
                Ok(driver) => on_saved.call(driver),
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
                    id: "name",
                    label: "Name",
                    value: draft.read().name.clone(),
                    on_input: move |v: String| draft.write().name = v,
                    error: field_error(&errors, "name"),
                    required: true,
                }
                TextField {
                    id: "license_number",
                    label: "Licence number",
                    value: draft.read().license_number.clone(),
                    on_input: move |v: String| draft.write().license_number = v,
                    error: field_error(&errors, "license_number"),
                    required: true,
                }
                TextField {
                    id: "phone",
                    label: "Phone",
                    input_type: "tel",
                    value: draft.read().phone.clone(),
                    on_input: move |v: String| draft.write().phone = v,
                    error: field_error(&errors, "phone"),
                    required: true,
                }
                TextField {
                    id: "email",
                    label: "Email",
                    input_type: "email",
                    value: draft.read().email.clone(),
                    on_input: move |v: String| draft.write().email = v,
                    error: field_error(&errors, "email"),
                }
                TextField {
                    id: "assigned_cab",
                    label: "Assigned cab",
                    value: draft.read().assigned_cab.clone(),
                    on_input: move |v: String| draft.write().assigned_cab = v,
                    placeholder: "None",
                }
                TextField {
                    id: "national_id",
                    label: "National ID",
                    value: draft.read().national_id.clone(),
                    on_input: move |v: String| draft.write().national_id = v,
                    error: field_error(&errors, "national_id"),
                    required: true,
                }
                TextField {
                    id: "address",
                    label: "Address",
                    value: draft.read().address.clone(),
                    on_input: move |v: String| draft.write().address = v,
                }
                TextField {
                    id: "joined_on",
                    label: "Joined on",
                    input_type: "date",
                    value: draft.read().joined_on.clone(),
                    on_input: move |v: String| draft.write().joined_on = v,
                    error: field_error(&errors, "joined_on"),
                    required: true,
                }
                TextField {
                    id: "left_on",
                    label: "Left on",
                    input_type: "date",
                    value: draft.read().left_on.clone(),
                    on_input: move |v: String| draft.write().left_on = v,
                    error: field_error(&errors, "left_on"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn driver(left_on: Option<Date>) -> Driver {
        Driver {
            id: Uuid::nil(),
            name: "Ravi".into(),
            license_number: "DL-1".into(),
            assigned_cab: None,
            phone: "99".into(),
            email: None,
            address: String::new(),
            national_id: "N1".into(),
            joined_on: date(2020, 1, 1),
            left_on,
        }
    }

    #[test]
    fn employment_filter_splits_current_and_former() {
        let today = date(2024, 6, 10);
        let current = driver(None);
        let leaving = driver(Some(date(2024, 7, 1)));
        let gone = driver(Some(date(2024, 1, 1)));

        assert!(Employment::Employed.keeps(&current, today));
        assert!(Employment::Employed.keeps(&leaving, today));
        assert!(Employment::Former.keeps(&gone, today));
        assert!(!Employment::Former.keeps(&current, today));
        assert!([&current, &leaving, &gone].iter().all(|d| Employment::All.keeps(d, today)));
    }

    #[test]
    fn unknown_filter_values_show_everyone() {
        assert_eq!(Employment::parse("former"), Employment::Former);
        assert_eq!(Employment::parse("bogus"), Employment::All);
    }
}
