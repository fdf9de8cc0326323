use dioxus::prelude::*;
use types::Notification;

#[component]
pub fn NotificationBanner(notification: Notification, on_dismiss: EventHandler<String>) -> Element {
    let id = notification.id.clone();
    let class = format!("notification {}", notification.severity.class());

    rsx! {
        div { class: "{class}", role: "status",
            div { class: "notification-body",
                strong { class: "notification-title", "{notification.title}" }
                span { class: "notification-message", "{notification.message}" }
            }
            button {
                class: "notification-close",
                title: "Dismiss",
                onclick: move |_| on_dismiss.call(id.clone()),
                "×"
            }
        }
    }
}
