mod auth_routes;
mod backend;
mod config;
mod export;
pub mod storage;
pub mod sub_admins;
mod uuid_v7;

use axum::Router;
use axum::http::{HeaderMap, header};
use cookie::Cookie;
use dioxus::fullstack::FullstackContext;
use jiff::Zoned;
use tracing_subscriber::EnvFilter;
use types::notification::derive_notifications;
use types::{
    Error, ExpenseList, Feature, Notification, Result, SESSION_COOKIE_NAME, SubAdminStatus,
    UserData,
};

use crate::auth_routes::auth_router;
pub use crate::backend::{BACKEND_CLIENT, BackendClient, BackendSession};
pub use crate::config::{CONFIG, Config};
use crate::export::export_router;
pub use crate::storage::{STORAGE, Session, Storage};

const DEFAULT_LOG_FILTER: &str = "info,server=debug,web=debug";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Open storage and build the non-server-function routes.
pub async fn init() -> anyhow::Result<Router> {
    match STORAGE.purge_expired_sessions().await {
        Ok(purged) => tracing::info!(purged, "expired sessions removed"),
        Err(error) => anyhow::bail!("failed to prepare storage: {error}"),
    }
    tracing::info!(backend = %CONFIG.backend_url, "cabdesk server ready");

    Ok(auth_router().merge(export_router()))
}

/// What an operation needs from the signed-in account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Session,
    Feature(Feature),
    Admin,
}

/// Value of the session cookie, if the request carries one.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|cookie| cookie.ok())
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

pub(crate) async fn session_from_headers(storage: &Storage, headers: &HeaderMap) -> Result<Session> {
    let token = session_token(headers).ok_or_else(|| Error::unauthorized("not signed in"))?;
    storage.find_session_token(&token, &CONFIG.signing_secret).await
}

/// Check `access` for `user`. Sub-admins are re-read from storage so
/// permission toggles, deactivation and deletion apply to live sessions.
pub async fn authorize(storage: &Storage, mut user: UserData, access: Access) -> Result<UserData> {
    if !user.is_admin() {
        let Some(sub_admin) = storage.find_sub_admin_by_email(&user.email).await? else {
            tracing::debug!(user = %user.email, "no sub-admin record for account");
            return Err(Error::forbidden("This account is not a registered sub-admin"));
        };
        if sub_admin.status == SubAdminStatus::Inactive {
            return Err(Error::forbidden("This account has been deactivated"));
        }
        user.permissions = sub_admin.permissions;
    }

    let denied = match access {
        Access::Session => None,
        Access::Feature(feature) if user.can(feature) => None,
        Access::Feature(feature) => Some(format!("You do not have access to {}", feature.label())),
        Access::Admin if user.is_admin() => None,
        Access::Admin => Some("Only the administrator can do this".to_string()),
    };

    if let Some(message) = denied {
        tracing::debug!(user = %user.email, ?access, "access denied");
        return Err(Error::forbidden(message));
    }
    Ok(user)
}

async fn require(access: Access) -> Result<UserData> {
    let headers: HeaderMap = FullstackContext::extract().await?;
    let session = session_from_headers(&STORAGE, &headers).await?;
    authorize(&STORAGE, session.user_data().clone(), access).await
}

/// The signed-in account, or `None` without a live session.
pub async fn current_user() -> Result<Option<UserData>> {
    match require(Access::Session).await {
        Ok(user) => Ok(Some(user)),
        Err(error) if error.status() == 401 => Ok(None),
        Err(error) => Err(error),
    }
}

pub async fn require_session() -> Result<UserData> {
    require(Access::Session).await
}

pub async fn require_permission(feature: Feature) -> Result<UserData> {
    require(Access::Feature(feature)).await
}

pub async fn require_admin() -> Result<UserData> {
    require(Access::Admin).await
}

/// Backend expenses followed by local ones; a backend failure only costs the remote half.
pub async fn expense_list(storage: &Storage, backend: &BackendSession<'_>) -> Result<ExpenseList> {
    let remote = backend.list_expenses().await.map_err(|error| {
        tracing::warn!(%error, "showing local expenses only");
        error.to_string()
    });
    let local = storage.list_local_expenses().await?;

    Ok(ExpenseList::merge(remote, local))
}

/// Notifications the account is allowed to see, derived from stored state.
pub async fn notifications(storage: &Storage, user: &UserData) -> Result<Vec<Notification>> {
    let cabs = if user.can(Feature::Cabs) {
        storage.list_cabs().await?
    } else {
        Vec::new()
    };
    let sub_admins = if user.is_admin() {
        storage.list_sub_admins().await?
    } else {
        Vec::new()
    };

    Ok(derive_notifications(&cabs, &sub_admins, Zoned::now().date()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use types::{
        Cab, CabStatus, Expense, ExpenseSource, InviteStatus, Permissions, Role, SubAdmin,
    };
    use uuid::Uuid;

    use super::*;

    fn user(role: Role, permissions: Permissions) -> UserData {
        UserData {
            user_id: "u-1".into(),
            email: "asha@example.com".into(),
            display_name: "Asha".into(),
            role,
            permissions,
            access_token: "t".to_string().into(),
        }
    }

    fn sub_admin(status: SubAdminStatus, permissions: Permissions) -> SubAdmin {
        SubAdmin {
            id: Uuid::now_v7(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            role: "Dispatcher".into(),
            status,
            permissions,
            invite: InviteStatus::Pending,
        }
    }

    #[test]
    fn session_token_is_read_from_any_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("a=1; cabdesk_session=abc.def; b=2"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn admins_pass_every_check() {
        let storage = Storage::in_memory().await.unwrap();
        let admin = user(Role::Admin, Permissions::none());

        for access in [Access::Session, Access::Feature(Feature::Reports), Access::Admin] {
            assert!(authorize(&storage, admin.clone(), access).await.is_ok());
        }
    }

    #[tokio::test]
    async fn sub_admins_need_the_feature() {
        let storage = Storage::in_memory().await.unwrap();
        storage
            .insert_sub_admin(&sub_admin(SubAdminStatus::Active, Permissions::default()))
            .await
            .unwrap();
        let sub = user(Role::SubAdmin, Permissions::default());

        assert!(authorize(&storage, sub.clone(), Access::Feature(Feature::Dashboard)).await.is_ok());
        let denied = authorize(&storage, sub.clone(), Access::Feature(Feature::Cabs))
            .await
            .unwrap_err();
        assert_eq!(denied.status(), 403);
        assert_eq!(denied.to_string(), "You do not have access to Cab Management");
        assert_eq!(authorize(&storage, sub, Access::Admin).await.unwrap_err().status(), 403);
    }

    #[tokio::test]
    async fn stored_permissions_override_the_session_copy() {
        let storage = Storage::in_memory().await.unwrap();
        let sub = user(Role::SubAdmin, Permissions::default());
        storage
            .insert_sub_admin(&sub_admin(SubAdminStatus::Active, Permissions::all()))
            .await
            .unwrap();

        let user = authorize(&storage, sub.clone(), Access::Feature(Feature::Expenses))
            .await
            .unwrap();
        assert!(user.permissions.get(Feature::Reports));
    }

    #[tokio::test]
    async fn deactivated_sub_admins_are_locked_out() {
        let storage = Storage::in_memory().await.unwrap();
        storage
            .insert_sub_admin(&sub_admin(SubAdminStatus::Inactive, Permissions::all()))
            .await
            .unwrap();

        let error = authorize(&storage, user(Role::SubAdmin, Permissions::all()), Access::Session)
            .await
            .unwrap_err();
        assert_eq!(error.status(), 403);
    }

    #[tokio::test]
    async fn deleted_sub_admins_lose_their_session_permissions() {
        let storage = Storage::in_memory().await.unwrap();
        let stored = sub_admin(SubAdminStatus::Active, Permissions::all());
        storage.insert_sub_admin(&stored).await.unwrap();
        let sub = user(Role::SubAdmin, Permissions::all());
        assert!(authorize(&storage, sub.clone(), Access::Session).await.is_ok());

        storage.delete_sub_admin(stored.id).await.unwrap();
        let error = authorize(&storage, sub, Access::Feature(Feature::Dashboard))
            .await
            .unwrap_err();
        assert_eq!(error.status(), 403);
    }

    #[tokio::test]
    async fn unreachable_backend_still_lists_local_expenses() {
        let storage = Storage::in_memory().await.unwrap();
        let local = Expense {
            id: "l1".into(),
            cab_number: "KA-01".into(),
            total_amount: 10.0,
            breakdown: Default::default(),
            recorded_on: None,
            source: ExpenseSource::Local,
        };
        storage.insert_expense(&local).await.unwrap();

        let backend = BackendClient::new("http://127.0.0.1:9/".parse().unwrap());
        let token = "t".to_string().into();
        let list = expense_list(&storage, &backend.session(&token)).await.unwrap();

        assert_eq!(list.expenses, vec![local]);
        assert!(list.remote_error.is_some());
    }

    #[tokio::test]
    async fn notifications_follow_what_the_account_can_see() {
        let storage = Storage::in_memory().await.unwrap();
        storage
            .insert_cab(&Cab {
                id: Uuid::now_v7(),
                cab_number: "KA-01".into(),
                model: "Dzire".into(),
                driver_name: None,
                last_service: None,
                next_service: None,
                odometer_km: 0,
                status: CabStatus::NeedsRepair,
            })
            .await
            .unwrap();
        storage
            .insert_sub_admin(&sub_admin(SubAdminStatus::Active, Permissions::default()))
            .await
            .unwrap();

        let admin = notifications(&storage, &user(Role::Admin, Permissions::none()))
            .await
            .unwrap();
        assert_eq!(admin.len(), 2);

        let sub = notifications(&storage, &user(Role::SubAdmin, Permissions::default()))
            .await
            .unwrap();
        assert!(sub.is_empty());
    }
}
