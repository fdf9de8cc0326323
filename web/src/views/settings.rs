use dioxus::prelude::*;
use types::{Feature, SubAdmin, SubAdminStatus};
use uuid::Uuid;

use super::components::{PageHeader, PermissionToggles, upsert};
use super::sub_admins::by_name;
use crate::use_error;

/// A change being saved: a feature flag, or the account status when `None`.
type Pending = (Uuid, Option<Feature>);

fn saving_features(pending: &[Pending], id: Uuid) -> Vec<Feature> {
    pending
        .iter()
        .filter(|(pending_id, _)| *pending_id == id)
        .filter_map(|(_, feature)| *feature)
        .collect()
}

/// Any save in flight for the account, feature or status.
fn row_busy(pending: &[Pending], id: Uuid) -> bool {
    pending.iter().any(|(pending_id, _)| *pending_id == id)
}

#[component]
pub fn Settings() -> Element {
    let mut sub_admins = use_signal(Vec::<SubAdmin>::new);
    let mut loading = use_signal(|| true);
    let mut error_state = use_error();
    let mut pending = use_signal(Vec::<Pending>::new);

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

    // A row takes one save at a time, so each response carries the
    // latest stored record.
    let mut toggle_feature = move |id: Uuid, feature: Feature| {
        if row_busy(&pending.read(), id) {
            return;
        }
        let Some(permissions) = sub_admins
            .read()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.permissions.toggled(feature))
        else {
            return;
        };

        let key = (id, Some(feature));
        pending.write().push(key);
        spawn(async move {
            match api::update_permissions(id, permissions).await {
                Ok(updated) => upsert(&mut *sub_admins.write(), updated, |a, b| a.id == b.id, by_name),
                Err(e) => error_state.set_server_error(&e),
            }
            pending.write().retain(|k| *k != key);
        });
    };

    let mut toggle_status = move |id: Uuid, status: SubAdminStatus| {
        if row_busy(&pending.read(), id) {
            return;
        }
        let key = (id, None);
        pending.write().push(key);
        spawn(async move {
            match api::set_sub_admin_status(id, status.flipped()).await {
                Ok(updated) => upsert(&mut *sub_admins.write(), updated, |a, b| a.id == b.id, by_name),
                Err(e) => error_state.set_server_error(&e),
            }
            pending.write().retain(|k| *k != key);
        });
    };

    let rows = sub_admins.read().clone();

    rsx! {
        div {
            PageHeader {
                title: "Settings",
                subtitle: "Choose what each sub-admin can see and do. Changes apply immediately.",
                actions: rsx! {},
            }

            if loading() {
                div { class: "loading", "Loading sub-admins..." }
            } else if rows.is_empty() {
                div { class: "card empty-state", "Add a sub-admin to manage their permissions." }
            } else {
                div { class: "grid grid-cols-2",
                    for sub_admin in rows {
                        {
                            let id = sub_admin.id;
                            let status = sub_admin.status;
                            let saving = saving_features(&pending.read(), id);
                            let busy = row_busy(&pending.read(), id);
                            let status_saving = pending.read().contains(&(id, None));
                            let inactive = status == SubAdminStatus::Inactive;

                            rsx! {
                                div { key: "{id}", class: "card",
                                    div { class: "card-header",
                                        div {
                                            h2 { class: "card-title", "{sub_admin.name}" }
                                            p { class: "text-muted", "{sub_admin.email} · {sub_admin.role}" }
                                        }
                                        button {
                                            class: if inactive { "btn btn-primary btn-sm" } else { "btn btn-secondary btn-sm" },
                                            disabled: busy,
                                            onclick: move |_| toggle_status(id, status),
                                            if status_saving {
                                                "Saving..."
                                            } else if inactive {
                                                "Activate"
                                            } else {
                                                "Deactivate"
                                            }
                                        }
                                    }
                                    if inactive {
                                        p { class: "text-muted", "This account cannot sign in until it is activated again." }
                                    }
                                    PermissionToggles {
                                        permissions: sub_admin.permissions,
                                        updating: saving,
                                        disabled: busy,
                                        on_toggle: move |feature: Feature| toggle_feature(id, feature),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_feature_saves_of_that_account_are_reported() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let pending = vec![
            (a, Some(Feature::Cabs)),
            (a, None),
            (b, Some(Feature::Reports)),
        ];

        assert_eq!(saving_features(&pending, a), vec![Feature::Cabs]);
        assert_eq!(saving_features(&pending, b), vec![Feature::Reports]);
        assert!(saving_features(&pending, Uuid::nil()).is_empty());
    }

    #[test]
    fn a_feature_save_blocks_status_changes_on_the_same_row() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let pending = vec![(a, Some(Feature::Cabs))];

        assert!(row_busy(&pending, a));
        assert!(!row_busy(&pending, b));
        assert!(row_busy(&[(b, None)], b));
        assert!(!row_busy(&[], a));
    }
}
