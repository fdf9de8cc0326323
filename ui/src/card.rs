use dioxus::prelude::*;

/// A headline number. Shows a placeholder while `value` and `error` are both empty.
#[component]
pub fn StatCard(
    title: String,
    value: Option<String>,
    #[props(default)] error: Option<String>,
    #[props(default)] hint: Option<String>,
) -> Element {
    rsx! {
        div { class: "stat-card",
            span { class: "stat-card-title", "{title}" }
            {match (value, error) {
                (_, Some(error)) => rsx! {
                    span { class: "stat-card-error", title: "{error}", "Unavailable" }
                },
                (Some(value), None) => rsx! {
                    span { class: "stat-card-value", "{value}" }
                },
                (None, None) => rsx! {
                    span { class: "stat-card-value stat-card-loading", "…" }
                },
            }}
            if let Some(hint) = hint {
                span { class: "stat-card-hint text-muted", "{hint}" }
            }
        }
    }
}
