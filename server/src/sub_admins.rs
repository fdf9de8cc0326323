use types::{InviteStatus, Permissions, Result, SubAdmin, SubAdminDraft, SubAdminStatus};
use uuid::Uuid;

use crate::backend::BackendSession;
use crate::storage::Storage;

/// Store a new sub-admin and try to invite them. A failed invite leaves the
/// record `Pending` for a later resend.
pub async fn create(storage: &Storage, backend: &BackendSession<'_>, draft: &SubAdminDraft) -> Result<SubAdmin> {
    let sub_admin = draft.build(Uuid::now_v7()).map_err(|e| e.into_error())?;
    storage.insert_sub_admin(&sub_admin).await?;
    tracing::info!(sub_admin = %sub_admin.email, "sub-admin created");

    deliver_invite(storage, backend, sub_admin).await
}

pub async fn update(
    storage: &Storage,
    backend: &BackendSession<'_>,
    id: Uuid,
    draft: &SubAdminDraft,
) -> Result<SubAdmin> {
    let existing = storage.get_sub_admin(id).await?;
    let updated = draft.apply(&existing).map_err(|e| e.into_error())?;
    storage.update_sub_admin(&updated).await?;

    if updated.email != existing.email {
        return deliver_invite(storage, backend, updated).await;
    }
    Ok(updated)
}

pub async fn resend_invite(storage: &Storage, backend: &BackendSession<'_>, id: Uuid) -> Result<SubAdmin> {
    let mut sub_admin = storage.get_sub_admin(id).await?;
    backend.send_invite(&sub_admin).await?;

    storage.set_invite_status(id, InviteStatus::Success).await?;
    sub_admin.invite = InviteStatus::Success;
    Ok(sub_admin)
}

async fn deliver_invite(
    storage: &Storage,
    backend: &BackendSession<'_>,
    mut sub_admin: SubAdmin,
) -> Result<SubAdmin> {
    match backend.send_invite(&sub_admin).await {
        Ok(()) => {
            storage
                .set_invite_status(sub_admin.id, InviteStatus::Success)
                .await?;
            sub_admin.invite = InviteStatus::Success;
        }
        Err(error) => {
            tracing::warn!(sub_admin = %sub_admin.email, %error, "invite failed, left pending");
        }
    }
    Ok(sub_admin)
}

/// Post the full set to the backend first; the local copy only changes once it accepted.
pub async fn update_permissions(
    storage: &Storage,
    backend: &BackendSession<'_>,
    id: Uuid,
    permissions: Permissions,
) -> Result<SubAdmin> {
    let mut sub_admin = storage.get_sub_admin(id).await?;
    backend.update_permissions(&sub_admin, permissions).await?;

    storage.set_permissions(id, permissions).await?;
    sub_admin.permissions = permissions;
    Ok(sub_admin)
}

pub async fn set_status(storage: &Storage, id: Uuid, status: SubAdminStatus) -> Result<SubAdmin> {
    let mut sub_admin = storage.get_sub_admin(id).await?;
    sub_admin.status = status;
    storage.update_sub_admin(&sub_admin).await?;

    tracing::info!(sub_admin = %sub_admin.email, %status, "sub-admin status changed");
    Ok(sub_admin)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use secrecy::SecretString;
    use types::Feature;

    use super::*;
    use crate::backend::BackendClient;

    /// Stub backend whose availability can be flipped mid-test.
    async fn serve(up: Arc<AtomicBool>) -> BackendClient {
        async fn respond(State(up): State<Arc<AtomicBool>>) -> StatusCode {
            if up.load(Ordering::SeqCst) {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }

        let app = axum::Router::new()
            .route("/subadmin/invite", post(respond))
            .route("/subadmin/permissions", post(respond))
            .with_state(up);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        BackendClient::new(format!("http://{addr}/").parse().unwrap())
    }

    fn draft() -> SubAdminDraft {
        SubAdminDraft {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            role: "Dispatcher".into(),
            ..Default::default()
        }
    }

    fn token() -> SecretString {
        "user-token".to_string().into()
    }

    #[tokio::test]
    async fn failed_invites_stay_pending_until_resent() {
        let up = Arc::new(AtomicBool::new(false));
        let backend = serve(up.clone()).await;
        let token = token();
        let session = backend.session(&token);
        let storage = Storage::in_memory().await.unwrap();

        let created = create(&storage, &session, &draft()).await.unwrap();
        assert_eq!(created.invite, InviteStatus::Pending);

        assert_eq!(
            resend_invite(&storage, &session, created.id).await.unwrap_err().status(),
            502
        );

        up.store(true, Ordering::SeqCst);
        let resent = resend_invite(&storage, &session, created.id).await.unwrap();
        assert_eq!(resent.invite, InviteStatus::Success);
        assert_eq!(
            storage.get_sub_admin(created.id).await.unwrap().invite,
            InviteStatus::Success
        );
    }

    #[tokio::test]
    async fn rejected_permission_changes_leave_local_copy_alone() {
        let up = Arc::new(AtomicBool::new(true));
        let backend = serve(up.clone()).await;
        let token = token();
        let session = backend.session(&token);
        let storage = Storage::in_memory().await.unwrap();
        let created = create(&storage, &session, &draft()).await.unwrap();
        assert_eq!(created.invite, InviteStatus::Success);

        let granted = created.permissions.toggled(Feature::Expenses);
        let updated = update_permissions(&storage, &session, created.id, granted)
            .await
            .unwrap();
        assert!(updated.permissions.get(Feature::Expenses));

        up.store(false, Ordering::SeqCst);
        let revoked = granted.toggled(Feature::Expenses);
        assert!(update_permissions(&storage, &session, created.id, revoked).await.is_err());
        let stored = storage.get_sub_admin(created.id).await.unwrap();
        assert!(stored.permissions.get(Feature::Expenses));
    }

    #[tokio::test]
    async fn changing_the_email_sends_a_new_invite() {
        let up = Arc::new(AtomicBool::new(true));
        let backend = serve(up.clone()).await;
        let token = token();
        let session = backend.session(&token);
        let storage = Storage::in_memory().await.unwrap();
        let created = create(&storage, &session, &draft()).await.unwrap();

        up.store(false, Ordering::SeqCst);
        let mut edit = draft();
        edit.email = "asha.k@example.com".into();
        let updated = update(&storage, &session, created.id, &edit).await.unwrap();
        assert_eq!(updated.invite, InviteStatus::Pending);

        let toggled = set_status(&storage, created.id, updated.status.flipped())
            .await
            .unwrap();
        assert_eq!(toggled.status, SubAdminStatus::Inactive);
    }

    #[tokio::test]
    async fn invalid_drafts_are_bad_requests() {
        let backend = serve(Arc::new(AtomicBool::new(true))).await;
        let token = token();
        let storage = Storage::in_memory().await.unwrap();
        let error = create(&storage, &backend.session(&token), &SubAdminDraft::default())
            .await
            .unwrap_err();
        assert_eq!(error.status(), 400);
    }
}
