use dioxus::prelude::*;
use jiff::Zoned;
use jiff::civil::Date;
use types::{FieldErrors, Feature, Permissions, Profile};

use crate::use_profile;

/// Today's date in the browser's time zone.
pub fn today() -> Date {
    Zoned::now().date()
}

/// Owned error message for a field, for passing into `TextField`.
pub fn field_error(errors: &Signal<FieldErrors>, field: &str) -> Option<String> {
    errors.read().get(field).map(str::to_string)
}

/// `(href, file name, label)` of each expense download.
type Export = (&'static str, &'static str, &'static str);

const EXPORTS: [Export; 2] = [
    ("/export/expenses.csv", "expenses.csv", "Export CSV"),
    ("/export/expenses.xlsx", "expenses.xlsx", "Export Excel"),
];

/// Downloads the account may use; exports need the Reports feature.
pub fn export_links(profile: &Profile) -> &'static [Export] {
    if profile.can(Feature::Reports) { &EXPORTS } else { &[] }
}

#[component]
pub fn ExportLinks(class: String) -> Element {
    let profile = use_profile();

    rsx! {
        for (href, file, label) in export_links(&profile).iter().copied() {
            a {
                key: "{href}",
                class: "{class}",
                href: "{href}",
                rel: "external",
                download: "{file}",
                "{label}"
            }
        }
    }
}

#[component]
pub fn PageHeader(title: String, subtitle: String, actions: Element) -> Element {
    rsx! {
        div { class: "page-header",
            div { class: "page-header-content",
                h1 { class: "page-title", "{title}" }
                p { class: "page-subtitle", "{subtitle}" }
            }
            div { class: "page-header-actions", {actions} }
        }
    }
}

/// One checkbox per feature. `updating` marks the toggles being saved;
/// `disabled` locks the whole list.
#[component]
pub fn PermissionToggles(
    permissions: Permissions,
    on_toggle: EventHandler<Feature>,
    #[props(default)] updating: Vec<Feature>,
    #[props(default)] disabled: bool,
) -> Element {
    rsx! {
        ul { class: "permission-list",
            for feature in Feature::ALL {
                {
                    let is_checked = permissions.get(feature);
                    let is_updating = updating.contains(&feature);

                    rsx! {
                        li { key: "{feature:?}", class: "permission-item",
                            label { class: "checkbox-label",
                                input {
                                    r#type: "checkbox",
                                    checked: is_checked,
                                    disabled: disabled || is_updating,
                                    onchange: move |_| on_toggle.call(feature),
                                }
                                span { {feature.label()} }
                                if is_updating {
                                    span { class: "checkbox-updating", "(saving...)" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Target of the editor modal.
#[derive(Debug, Clone, PartialEq)]
pub enum Editing<T> {
    New,
    Existing(T),
}

impl<T> Editing<T> {
    pub fn existing(&self) -> Option<&T> {
        match self {
            Editing::New => None,
            Editing::Existing(item) => Some(item),
        }
    }
}

/// Replace the item `same` matches, or append it, then reorder with `order`.
pub fn upsert<T>(
    items: &mut Vec<T>,
    item: T,
    same: impl Fn(&T, &T) -> bool,
    order: impl Fn(&T, &T) -> std::cmp::Ordering,
) {
    match items.iter_mut().find(|existing| same(existing, &item)) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
    items.sort_by(order);
}

#[cfg(test)]
mod tests {
    use types::Role;

    use super::*;

    #[test]
    fn upsert_replaces_then_appends() {
        let mut items = vec![(1, "b"), (2, "a")];
        let by_name = |a: &(i32, &str), b: &(i32, &str)| a.1.cmp(b.1);
        let same_id = |a: &(i32, &str), b: &(i32, &str)| a.0 == b.0;

        upsert(&mut items, (1, "c"), same_id, by_name);
        assert_eq!(items, vec![(2, "a"), (1, "c")]);

        upsert(&mut items, (3, "b"), same_id, by_name);
        assert_eq!(items, vec![(2, "a"), (3, "b"), (1, "c")]);
    }

    fn profile(role: Role, permissions: Permissions) -> Profile {
        Profile {
            user_id: "u".into(),
            email: "u@example.com".into(),
            display_name: "U".into(),
            role,
            permissions,
        }
    }

    #[test]
    fn exports_follow_the_reports_feature() {
        let reports_only = Permissions::none().toggled(Feature::Reports);

        assert_eq!(export_links(&profile(Role::SubAdmin, reports_only)).len(), 2);
        assert!(export_links(&profile(Role::SubAdmin, Permissions::default())).is_empty());
        assert_eq!(export_links(&profile(Role::Admin, Permissions::none())).len(), 2);
    }

    #[test]
    fn editing_exposes_the_existing_record() {
        assert_eq!(Editing::<u8>::New.existing(), None);
        assert_eq!(Editing::Existing(4).existing(), Some(&4));
    }
}
