use dioxus::prelude::*;
use types::listing::{filter_records, paginate};
use types::{FieldErrors, InviteStatus, SubAdmin, SubAdminDraft, SubAdminStatus};
use ui::{ConfirmDelete, Modal, Pagination, SearchBar, SelectField, TextField};
use uuid::Uuid;

use super::components::{Editing, PageHeader, field_error, upsert};
use crate::{use_error, use_page_size};

fn status_class(status: SubAdminStatus) -> &'static str {
    match status {
        SubAdminStatus::Active => "badge badge-success",
        SubAdminStatus::Inactive => "badge badge-neutral",
    }
}

fn invite_class(invite: InviteStatus) -> &'static str {
    match invite {
        InviteStatus::Success => "badge badge-success",
        InviteStatus::Pending => "badge badge-warning",
    }
}

fn status_options() -> Vec<(String, String)> {
    [SubAdminStatus::Active, SubAdminStatus::Inactive]
        .into_iter()
        .map(|s| (s.as_str().to_string(), s.as_str().to_string()))
        .collect()
}

fn matches_status(filter: Option<SubAdminStatus>, sub_admin: &SubAdmin) -> bool {
    filter.is_none_or(|status| sub_admin.status == status)
}

pub(super) fn by_name(a: &SubAdmin, b: &SubAdmin) -> std::cmp::Ordering {
    a.name.cmp(&b.name).then_with(|| a.email.cmp(&b.email))
}

#[component]
pub fn SubAdmins() -> Element {
    let mut sub_admins = use_signal(Vec::<SubAdmin>::new);
    let mut loading = use_signal(|| true);
    let mut error_state = use_error();
    let mut search = use_signal(String::new);
    let mut status_filter = use_signal(|| None::<SubAdminStatus>);
    let mut page = use_signal(|| 1usize);
    let mut editing = use_signal(|| None::<Editing<SubAdmin>>);
    let mut deleting = use_signal(|| None::<SubAdmin>);
    let mut delete_in_flight = use_signal(|| false);
    let mut resending = use_signal(|| None::<Uuid>);
    let page_size = use_page_size();

    use_effect(move || {
        spawn(async move {
            loading.set(true);
            match api::list_sub_admins().await {
                Ok(list) => sub_admins.set(list),
                Err(e) => error_state.set_server_error(&e),
            }
            loading.set(false);
        });
    });

    let filter = status_filter();
    let filtered: Vec<SubAdmin> = filter_records(sub_admins.read().as_slice(), search.read().as_str(), |sub_admin| {
        matches_status(filter, sub_admin)
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
                title: "Sub-Admins",
                subtitle: "People who help run the fleet. New sub-admins get an e-mail invitation.",
                actions: rsx! {
                    button {
                        class: "btn btn-primary",
                        onclick: move |_| editing.set(Some(Editing::New)),
                        "Add Sub-Admin"
                    }
                },
            }

            if let Some(target) = editing() {
                SubAdminEditor {
                    editing: target,
                    on_close: move |_| editing.set(None),
                    on_saved: move |sub_admin: SubAdmin| {
                        upsert(&mut *sub_admins.write(), sub_admin, |a, b| a.id == b.id, by_name);
                        editing.set(None);
                    },
                }
            }

            if let Some(sub_admin) = deleting() {
                ConfirmDelete {
                    title: "Delete Sub-Admin",
                    item_name: sub_admin.name.clone(),
                    deleting: delete_in_flight(),
                    on_close: move |_| deleting.set(None),
                    on_confirm: move |_| {
                        let id = sub_admin.id;
                        spawn(async move {
                            delete_in_flight.set(true);
                            match api::delete_sub_admin(id).await {
                                Ok(()) => sub_admins.write().retain(|s| s.id != id),
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
                        placeholder: "Search name, e-mail or role",
                        on_input: move |value: String| {
                            search.set(value);
                            page.set(1);
                        },
                    }
                    SelectField {
                        id: "sub-admin-status-filter",
                        label: "Status",
                        value: filter.map(|s| s.as_str().to_string()).unwrap_or_default(),
                        options: filter_options,
                        on_change: move |value: String| {
                            status_filter.set(SubAdminStatus::parse(&value));
                            page.set(1);
                        },
                    }
                }

                if loading() {
                    div { class: "loading", "Loading sub-admins..." }
                } else if current.items.is_empty() {
                    div { class: "empty-state", "No sub-admins yet." }
                } else {
                    div { class: "table-container",
                        table {
                            thead {
                                tr {
                                    th { "Name" }
                                    th { "Email" }
                                    th { "Role" }
                                    th { "Status" }
                                    th { "Invite" }
                                    th { "" }
                                }
                            }
                            tbody {
                                for sub_admin in current.items.clone() {
                                    {
                                        let id = sub_admin.id;
                                        let pending = sub_admin.invite == InviteStatus::Pending;
                                        let is_resending = resending() == Some(id);
                                        let for_edit = sub_admin.clone();
                                        let for_delete = sub_admin.clone();

                                        rsx! {
                                            tr { key: "{id}",
                                                td { class: "font-medium", "{sub_admin.name}" }
                                                td { "{sub_admin.email}" }
                                                td { "{sub_admin.role}" }
                                                td {
                                                    span { class: status_class(sub_admin.status), "{sub_admin.status}" }
                                                }
                                                td {
                                                    span { class: invite_class(sub_admin.invite), {sub_admin.invite.as_str()} }
                                                }
                                                td { class: "row-actions",
                                                    if pending {
                                                        button {
                                                            class: "btn btn-secondary btn-sm",
                                                            disabled: is_resending,
                                                            onclick: move |_| {
                                                                spawn(async move {
                                                                    resending.set(Some(id));
                                                                    match api::resend_invite(id).await {
                                                                        Ok(updated) => upsert(&mut *sub_admins.write(), updated, |a, b| a.id == b.id, by_name),
                                                                        Err(e) => error_state.set_server_error(&e),
                                                                    }
                                                                    resending.set(None);
                                                                });
                                                            },
                                                            if is_resending { "Sending..." } else { "Resend invite" }
                                                        }
                                                    }
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
fn SubAdminEditor(
    editing: Editing<SubAdmin>,
    on_close: EventHandler<()>,
    on_saved: EventHandler<SubAdmin>,
) -> Element {
    let mut error_state = use_error();
    let existing_id = editing.existing().map(|sub_admin| sub_admin.id);
    let mut draft = use_signal(|| editing.existing().map(SubAdminDraft::from).unwrap_or_default());
    let mut errors = use_signal(FieldErrors::default);
    let mut server_error = use_signal(|| None::<String>);
    let mut saving = use_signal(|| false);
    let title = if existing_id.is_some() { "Edit Sub-Admin" } else { "Add Sub-Admin" };

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
                Some(id) => api::update_sub_admin(id, current).await,
                None => api::create_sub_admin(current).await,
            };
            saving.set(false);
            match result {
                Ok(sub_admin) => on_saved.call(sub_admin),
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
            TextField {
                id: "name",
                label: "Name",
                value: draft.read().name.clone(),
                on_input: move |v: String| draft.write().name = v,
                error: field_error(&errors, "name"),
                required: true,
            }
            TextField {
                id: "email",
                label: "Email",
                input_type: "email",
                value: draft.read().email.clone(),
                on_input: move |v: String| draft.write().email = v,
                error: field_error(&errors, "email"),
                required: true,
            }
            TextField {
                id: "role",
                label: "Role",
                placeholder: "e.g. Dispatcher",
                value: draft.read().role.clone(),
                on_input: move |v: String| draft.write().role = v,
                error: field_error(&errors, "role"),
                required: true,
            }
            SelectField {
                id: "status",
                label: "Status",
                value: draft.read().status.as_str().to_string(),
                options: status_options(),
                on_change: move |v: String| {
                    if let Some(status) = SubAdminStatus::parse(&v) {
                        draft.write().status = status;
                    }
                },
            }
            if existing_id.is_none() {
                p { class: "text-muted",
                    "An invitation is e-mailed through the fleet backend. New sub-admins start with Dashboard access only."
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use types::Permissions;

    use super::*;

    fn sub_admin(name: &str, status: SubAdminStatus) -> SubAdmin {
        SubAdmin {
            id: Uuid::from_u128(name.len() as u128),
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: "Dispatcher".into(),
            status,
            permissions: Permissions::default(),
            invite: InviteStatus::Success,
        }
    }

    #[test]
    fn status_filter_narrows_the_list() {
        let list = vec![
            sub_admin("Asha", SubAdminStatus::Active),
            sub_admin("Bala", SubAdminStatus::Inactive),
            sub_admin("Chitra", SubAdminStatus::Active),
        ];
        let names = |filter: Option<SubAdminStatus>| -> Vec<String> {
            filter_records(&list, "", |s| matches_status(filter, s))
                .into_iter()
                .map(|s| s.name.clone())
                .collect()
        };

        assert_eq!(names(None).len(), 3);
        assert_eq!(names(Some(SubAdminStatus::Active)), ["Asha", "Chitra"]);
        assert_eq!(names(Some(SubAdminStatus::Inactive)), ["Bala"]);
    }

    #[test]
    fn filter_values_round_trip_through_the_select() {
        for (value, _) in status_options() {
            assert!(SubAdminStatus::parse(&value).is_some());
        }
        assert_eq!(SubAdminStatus::parse(""), None);
    }
}
