use dioxus::prelude::*;
use types::listing::PageInfo;

#[component]
pub fn SearchBar(
    value: String,
    on_input: EventHandler<String>,
    #[props(default = "Search...".to_string())] placeholder: String,
) -> Element {
    rsx! {
        input {
            class: "form-input search-input",
            r#type: "search",
            placeholder: "{placeholder}",
            value: "{value}",
            oninput: move |e| on_input.call(e.value()),
        }
    }
}

#[component]
pub fn Pagination(info: PageInfo, on_change: EventHandler<usize>) -> Element {
    let page = info.page;

    rsx! {
        div { class: "pagination",
            span { class: "pagination-summary text-muted",
                if info.total_items == 0 {
                    "No records"
                } else {
                    "Showing {info.first_item}-{info.last_item} of {info.total_items}"
                }
            }
            div { class: "pagination-controls",
                button {
                    class: "btn btn-secondary btn-sm",
                    disabled: !info.has_previous(),
                    onclick: move |_| on_change.call(page - 1),
                    "Previous"
                }
                span { class: "pagination-page", "Page {page} of {info.total_pages}" }
                button {
                    class: "btn btn-secondary btn-sm",
                    disabled: !info.has_next(),
                    onclick: move |_| on_change.call(page + 1),
                    "Next"
                }
            }
        }
    }
}
