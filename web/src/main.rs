use std::time::Duration;

use dioxus::prelude::*;
use types::listing::DEFAULT_PAGE_SIZE;
use types::notification::{NOTIFICATION_POLL_INTERVAL, NotificationFeed};
use types::{Feature, Profile};
use ui::NotificationBanner;

mod views;

use views::{Cabs, Dashboard, Drivers, ExportLinks, Expenses, Login, Register, Settings, SubAdmins};

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[route("/login?:error")]
    Login { error: Option<String> },
    #[route("/register?:error")]
    Register { error: Option<String> },
    #[layout(AuthenticatedLayout)]
        #[route("/")]
        Dashboard {},
        #[route("/cabs")]
        Cabs {},
        #[route("/drivers")]
        Drivers {},
        #[route("/expenses")]
        Expenses {},
        #[route("/sub-admins")]
        SubAdmins {},
        #[route("/settings")]
        Settings {},
}

impl Route {
    /// Sidebar entries, in display order.
    pub fn navigation() -> [Route; 6] {
        [
            Route::Dashboard {},
            Route::Cabs {},
            Route::Drivers {},
            Route::Expenses {},
            Route::SubAdmins {},
            Route::Settings {},
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::Login { .. } => "Sign in",
            Route::Register { .. } => "Register",
            Route::Dashboard {} => "Dashboard",
            Route::Cabs {} => "Cabs",
            Route::Drivers {} => "Drivers",
            Route::Expenses {} => "Expenses",
            Route::SubAdmins {} => "Sub-Admins",
            Route::Settings {} => "Settings",
        }
    }

    pub fn allowed(&self, profile: &Profile) -> bool {
        match self {
            Route::Login { .. } | Route::Register { .. } => true,
            Route::Dashboard {} => profile.can(Feature::Dashboard),
            Route::Cabs {} => profile.can(Feature::Cabs),
            Route::Drivers {} => profile.can(Feature::Drivers),
            Route::Expenses {} => profile.can(Feature::Expenses),
            Route::SubAdmins {} | Route::Settings {} => profile.is_admin(),
        }
    }
}

fn main() {
    #[cfg(feature = "server")]
    {
        server::init_tracing();
        dioxus::serve(|| async move {
            let routes = server::init().await?;

            Ok(dioxus::server::router(App).merge(routes))
        });
    }

    #[cfg(all(feature = "web", not(feature = "server")))]
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "CabDesk" }
        document::Link { rel: "icon", href: asset!("/assets/favicon.svg") }
        document::Link { rel: "stylesheet", href: asset!("/assets/main.css") }

        Router::<Route> {}
    }
}

#[component]
fn NavLink(to: Route) -> Element {
    let current_route: Route = use_route();
    let is_active = current_route == to;
    let label = to.label();

    rsx! {
        Link {
            to,
            class: if is_active { "active" },
            "{label}"
        }
    }
}

/// Structured error information for display
#[derive(Clone, Debug, Default)]
pub struct ErrorInfo {
    pub message: String,
    pub chain: Vec<String>,
    pub backtrace: Option<String>,
}

impl ErrorInfo {
    /// Parse a ServerFnError to extract structured error info
    pub fn from_server_error(err: &ServerFnError) -> Self {
        match err {
            ServerFnError::ServerError {
                message, details, ..
            } => {
                let chain = details
                    .as_ref()
                    .and_then(|d| d.get("chain"))
                    .and_then(|c| c.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_else(|| vec![message.clone()]);
                let backtrace = details
                    .as_ref()
                    .and_then(|d| d.get("backtrace"))
                    .and_then(|b| b.as_str())
                    .map(String::from);

                Self {
                    message: message.clone(),
                    chain,
                    backtrace,
                }
            }
            other => Self {
                message: other.to_string(),
                chain: vec![other.to_string()],
                backtrace: None,
            },
        }
    }
}

/// Global error state - use `use_error()` to access
#[derive(Clone, Copy)]
pub struct ErrorState(Signal<Option<ErrorInfo>>);

impl ErrorState {
    pub fn set_server_error(&mut self, err: &ServerFnError) {
        // Session expired: back to the login page
        if let ServerFnError::ServerError { code: 401, message, .. } = err {
            navigator().push(Route::Login {
                error: Some(message.clone()),
            });
            return;
        }
        self.0.set(Some(ErrorInfo::from_server_error(err)));
    }

    /// Message to show next to a form. Expired sessions redirect instead.
    pub fn inline_message(&mut self, err: &ServerFnError) -> Option<String> {
        match err {
            ServerFnError::ServerError { code: 401, .. } => {
                self.set_server_error(err);
                None
            }
            other => Some(ErrorInfo::from_server_error(other).message),
        }
    }

    pub fn clear(&mut self) {
        self.0.set(None);
    }
}

pub fn use_error() -> ErrorState {
    use_context::<ErrorState>()
}

/// Rows per page in the management tables.
#[derive(Clone, Copy)]
pub struct PageSize(Signal<usize>);

pub fn use_page_size() -> usize {
    *use_context::<PageSize>().0.read()
}

/// The signed-in account, provided by the layout.
pub fn use_profile() -> Profile {
    use_context::<Profile>()
}

/// Keep only frames from this workspace.
fn filter_backtrace(backtrace: &str) -> String {
    const CRATES: [&str; 5] = ["web::", "api::", "server::", "types::", "ui::"];

    backtrace
        .lines()
        .filter(|line| CRATES.iter().any(|krate| line.contains(krate)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[component]
fn ErrorBanner() -> Element {
    let mut error_state = use_error();
    let error = error_state.0.read();

    let Some(err) = error.as_ref() else {
        return rsx! {};
    };

    let has_chain = err.chain.len() > 1;
    let filtered_backtrace = err
        .backtrace
        .as_deref()
        .map(filter_backtrace)
        .filter(|bt| !bt.is_empty());

    rsx! {
        div { class: "error-banner",
            div { class: "error-banner-content",
                div { class: "error-banner-header",
                    span { class: "error-banner-message", "{err.message}" }
                    div { class: "error-banner-actions",
                        button {
                            class: "error-banner-close",
                            onclick: move |_| error_state.clear(),
                            "×"
                        }
                    }
                }
                if has_chain || filtered_backtrace.is_some() {
                    div { class: "error-details",
                        if has_chain {
                            div { class: "error-chain",
                                h4 { class: "error-section-title", "Error Chain" }
                                ol { class: "error-chain-list",
                                    for (i, msg) in err.chain.iter().enumerate() {
                                        li {
                                            key: "{i}",
                                            class: "error-chain-item",
                                            "{msg}"
                                        }
                                    }
                                }
                            }
                        }
                        if let Some(backtrace) = &filtered_backtrace {
                            div { class: "error-backtrace",
                                h4 { class: "error-section-title", "Backtrace" }
                                pre { class: "error-backtrace-content", "{backtrace}" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn AuthenticatedLayout() -> Element {
    use_context_provider(|| ErrorState(Signal::new(None)));
    let user = use_server_future(api::get_current_user)?;

    match &*user.read() {
        Some(Ok(Some(profile))) => rsx! {
            SignedIn { profile: profile.clone() }
        },
        Some(Ok(None)) => {
            navigator().push(Route::Login { error: None });
            rsx! {
                div { class: "loading", "Redirecting to login..." }
            }
        }
        Some(Err(e)) => {
            navigator().push(Route::Login {
                error: Some(ErrorInfo::from_server_error(e).message),
            });
            rsx! {
                div { class: "loading", "Redirecting to login..." }
            }
        }
        None => rsx! {
            div { class: "loading", "Loading..." }
        },
    }
}

/// Resolves after `duration` in the browser; never during server rendering.
async fn sleep(duration: Duration) {
    #[cfg(feature = "web")]
    gloo_timers::future::sleep(duration).await;

    #[cfg(not(feature = "web"))]
    {
        let _ = duration;
        std::future::pending::<()>().await;
    }
}

#[component]
fn SignedIn(profile: Profile) -> Element {
    use_context_provider(|| profile.clone());
    let mut page_size = use_context_provider(|| PageSize(Signal::new(DEFAULT_PAGE_SIZE)));
    let mut feed = use_signal(NotificationFeed::default);
    let current_route: Route = use_route();

    use_future(move || async move {
        if let Ok(size) = api::page_size().await {
            page_size.0.set(size);
        }
    });

    use_future(move || async move {
        loop {
            match api::list_notifications().await {
                Ok(notifications) => feed.write().replace(notifications),
                Err(error) => tracing::debug!(%error, "notification poll failed"),
            }
            sleep(NOTIFICATION_POLL_INTERVAL).await;
        }
    });

    let visible: Vec<_> = feed.read().visible().cloned().collect();
    let initial = profile.initial();
    let role = if profile.is_admin() { "Administrator" } else { "Sub-Admin" };
    let links: Vec<Route> = Route::navigation()
        .into_iter()
        .filter(|route| route.allowed(&profile))
        .collect();

    rsx! {
        div { class: "app-layout",
            aside { class: "sidebar",
                div { class: "sidebar-header",
                    span { class: "sidebar-logo", "CabDesk" }
                }
                nav { class: "sidebar-nav",
                    for route in links {
                        NavLink { key: "{route:?}", to: route }
                    }
                }
                if profile.can(Feature::Reports) {
                    div { class: "sidebar-exports",
                        span { class: "sidebar-section", "Reports" }
                        ExportLinks { class: "sidebar-export" }
                    }
                }
                div { class: "sidebar-footer",
                    div { class: "sidebar-user",
                        div { class: "sidebar-avatar", "{initial}" }
                        div { class: "sidebar-user-info",
                            div { class: "sidebar-user-name", "{profile.display_name}" }
                            div { class: "sidebar-user-role", "{role}" }
                        }
                    }
                    a { href: "/auth/logout", rel: "external", class: "sidebar-logout", "Sign out" }
                }
            }
            main { class: "main-content",
                div { class: "notification-stack",
                    for notification in visible {
                        NotificationBanner {
                            key: "{notification.id}",
                            notification: notification.clone(),
                            on_dismiss: move |id: String| feed.write().dismiss(&id),
                        }
                    }
                }
                ErrorBanner {}
                if current_route.allowed(&profile) {
                    Outlet::<Route> {}
                } else {
                    div { class: "card empty-state",
                        h2 { "Not available" }
                        p { class: "text-muted", "Your account does not have access to this page." }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use types::{Permissions, Role};

    use super::*;

    fn profile(role: Role, permissions: Permissions) -> Profile {
        Profile {
            user_id: "u".into(),
            email: "u@example.com".into(),
            display_name: "U".into(),
            role,
            permissions,
        }
    }

    fn labels(profile: &Profile) -> Vec<&'static str> {
        Route::navigation()
            .iter()
            .filter(|r| r.allowed(profile))
            .map(Route::label)
            .collect()
    }

    #[test]
    fn admins_see_every_link() {
        assert_eq!(
            labels(&profile(Role::Admin, Permissions::none())),
            vec!["Dashboard", "Cabs", "Drivers", "Expenses", "Sub-Admins", "Settings"]
        );
    }

    #[test]
    fn sub_admins_see_granted_features_only() {
        let permissions = Permissions::default().toggled(Feature::Drivers);
        assert_eq!(
            labels(&profile(Role::SubAdmin, permissions)),
            vec!["Dashboard", "Drivers"]
        );
    }

    #[test]
    fn backtraces_keep_workspace_frames() {
        let bt = "0: std::rt::lang_start\n1: server::storage::open\n2: tokio::runtime";
        assert_eq!(filter_backtrace(bt), "1: server::storage::open");
    }
}
