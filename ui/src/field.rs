use dioxus::prelude::*;

#[component]
pub fn TextField(
    id: String,
    label: String,
    value: String,
    on_input: EventHandler<String>,
    #[props(default = "text".to_string())] input_type: String,
    #[props(default)] placeholder: String,
    #[props(default)] error: Option<String>,
    #[props(default)] required: bool,
) -> Element {
    rsx! {
        div { class: "form-group",
            label { class: "form-label", r#for: "{id}",
                "{label}"
                if required { " *" }
            }
            input {
                id: "{id}",
                class: if error.is_some() { "form-input form-input-invalid" } else { "form-input" },
                r#type: "{input_type}",
                placeholder: "{placeholder}",
                value: "{value}",
                oninput: move |e| on_input.call(e.value()),
            }
            if let Some(ref error) = error {
                span { class: "form-error", "{error}" }
            }
        }
    }
}

/// A `select` over `(value, label)` pairs.
#[component]
pub fn SelectField(
    id: String,
    label: String,
    value: String,
    options: Vec<(String, String)>,
    on_change: EventHandler<String>,
) -> Element {
    rsx! {
        div { class: "form-group",
            label { class: "form-label", r#for: "{id}", "{label}" }
            select {
                id: "{id}",
                class: "form-input",
                value: "{value}",
                onchange: move |e| on_change.call(e.value()),
                for (option_value, option_label) in options {
                    option {
                        key: "{option_value}",
                        value: "{option_value}",
                        selected: option_value == value,
                        "{option_label}"
                    }
                }
            }
        }
    }
}
