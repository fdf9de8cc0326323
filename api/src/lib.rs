use dioxus::prelude::*;
use types::{
    Cab, CabDraft, Driver, DriverDraft, Expense, ExpenseDraft, ExpenseList, Notification,
    Permissions, Profile, SubAdmin, SubAdminDraft, SubAdminStatus,
};
use uuid::Uuid;

#[post("/api/current-user")]
pub async fn get_current_user() -> ServerFnResult<Option<Profile>> {
    Ok(server::current_user().await?.map(|user| user.profile()))
}

#[post("/api/page-size")]
pub async fn page_size() -> ServerFnResult<usize> {
    server::require_session().await?;
    Ok(server::CONFIG.page_size)
}

#[post("/api/notifications")]
pub async fn list_notifications() -> ServerFnResult<Vec<Notification>> {
    let user = server::require_session().await?;
    Ok(server::notifications(&server::STORAGE, &user).await?)
}

#[post("/api/dashboard/sub-admin-count")]
pub async fn sub_admin_count() -> ServerFnResult<u64> {
    let user = server::require_permission(types::Feature::Dashboard).await?;
    Ok(server::BACKEND_CLIENT
        .session(&user.access_token)
        .sub_admin_count()
        .await?)
}

#[post("/api/dashboard/driver-count")]
pub async fn driver_count() -> ServerFnResult<u64> {
    let user = server::require_permission(types::Feature::Dashboard).await?;
    Ok(server::BACKEND_CLIENT
        .session(&user.access_token)
        .driver_count()
        .await?)
}

#[post("/api/dashboard/cab-count")]
pub async fn cab_count() -> ServerFnResult<u64> {
    let user = server::require_permission(types::Feature::Dashboard).await?;
    Ok(server::BACKEND_CLIENT
        .session(&user.access_token)
        .cab_count()
        .await?)
}

/// Read by both the dashboard charts and the expense table.
#[post("/api/expenses")]
pub async fn list_expenses() -> ServerFnResult<ExpenseList> {
    let user = server::require_session().await?;
    if !user.can(types::Feature::Dashboard) && !user.can(types::Feature::Expenses) {
        return Err(types::Error::forbidden("You do not have access to expenses").into());
    }

    let backend = server::BACKEND_CLIENT.session(&user.access_token);
    Ok(server::expense_list(&server::STORAGE, &backend).await?)
}

#[post("/api/expenses/create")]
pub async fn create_expense(draft: ExpenseDraft) -> ServerFnResult<Expense> {
    server::require_permission(types::Feature::Expenses).await?;
    let expense = draft.build(Uuid::now_v7()).map_err(|e| e.into_error())?;
    server::STORAGE.insert_expense(&expense).await?;
    Ok(expense)
}

#[post("/api/expenses/update")]
pub async fn update_expense(id: String, draft: ExpenseDraft) -> ServerFnResult<Expense> {
    server::require_permission(types::Feature::Expenses).await?;
    let expense = Expense {
        id,
        ..draft.build(Uuid::nil()).map_err(|e| e.into_error())?
    };
    server::STORAGE.update_expense(&expense).await?;
    Ok(expense)
}

#[post("/api/expenses/delete")]
pub async fn delete_expense(id: String) -> ServerFnResult<()> {
    server::require_permission(types::Feature::Expenses).await?;
    server::STORAGE.delete_expense(&id).await?;
    Ok(())
}

#[post("/api/cabs")]
pub async fn list_cabs() -> ServerFnResult<Vec<Cab>> {
    server::require_permission(types::Feature::Cabs).await?;
    Ok(server::STORAGE.list_cabs().await?)
}

#[post("/api/cabs/create")]
pub async fn create_cab(draft: CabDraft) -> ServerFnResult<Cab> {
    server::require_permission(types::Feature::Cabs).await?;
    let cab = draft.build(Uuid::now_v7()).map_err(|e| e.into_error())?;
    server::STORAGE.insert_cab(&cab).await?;
    Ok(cab)
}

#[post("/api/cabs/update")]
pub async fn update_cab(id: Uuid, draft: CabDraft) -> ServerFnResult<Cab> {
    server::require_permission(types::Feature::Cabs).await?;
    let cab = draft.build(id).map_err(|e| e.into_error())?;
    server::STORAGE.update_cab(&cab).await?;
    Ok(cab)
}

#[post("/api/cabs/delete")]
pub async fn delete_cab(id: Uuid) -> ServerFnResult<()> {
    server::require_permission(types::Feature::Cabs).await?;
    server::STORAGE.delete_cab(id).await?;
    Ok(())
}

#[post("/api/drivers")]
pub async fn list_drivers() -> ServerFnResult<Vec<Driver>> {
    server::require_permission(types::Feature::Drivers).await?;
    Ok(server::STORAGE.list_drivers().await?)
}

#[post("/api/drivers/create")]
pub async fn create_driver(draft: DriverDraft) -> ServerFnResult<Driver> {
    server::require_permission(types::Feature::Drivers).await?;
    let driver = draft.build(Uuid::now_v7()).map_err(|e| e.into_error())?;
    server::STORAGE.insert_driver(&driver).await?;
    Ok(driver)
}

#[post("/api/drivers/update")]
pub async fn update_driver(id: Uuid, draft: DriverDraft) -> ServerFnResult<Driver> {
    server::require_permission(types::Feature::Drivers).await?;
    let driver = draft.build(id).map_err(|e| e.into_error())?;
    server::STORAGE.update_driver(&driver).await?;
    Ok(driver)
}

#[post("/api/drivers/delete")]
pub async fn delete_driver(id: Uuid) -> ServerFnResult<()> {
    server::require_permission(types::Feature::Drivers).await?;
    server::STORAGE.delete_driver(id).await?;
    Ok(())
}

#[post("/api/sub-admins")]
pub async fn list_sub_admins() -> ServerFnResult<Vec<SubAdmin>> {
    server::require_admin().await?;
    Ok(server::STORAGE.list_sub_admins().await?)
}

#[post("/api/sub-admins/create")]
pub async fn create_sub_admin(draft: SubAdminDraft) -> ServerFnResult<SubAdmin> {
    let user = server::require_admin().await?;
    let backend = server::BACKEND_CLIENT.session(&user.access_token);
    Ok(server::sub_admins::create(&server::STORAGE, &backend, &draft).await?)
}

#[post("/api/sub-admins/update")]
pub async fn update_sub_admin(id: Uuid, draft: SubAdminDraft) -> ServerFnResult<SubAdmin> {
    let user = server::require_admin().await?;
    let backend = server::BACKEND_CLIENT.session(&user.access_token);
    Ok(server::sub_admins::update(&server::STORAGE, &backend, id, &draft).await?)
}

#[post("/api/sub-admins/delete")]
pub async fn delete_sub_admin(id: Uuid) -> ServerFnResult<()> {
    server::require_admin().await?;
    server::STORAGE.delete_sub_admin(id).await?;
    Ok(())
}

#[post("/api/sub-admins/resend-invite")]
pub async fn resend_invite(id: Uuid) -> ServerFnResult<SubAdmin> {
    let user = server::require_admin().await?;
    let backend = server::BACKEND_CLIENT.session(&user.access_token);
    Ok(server::sub_admins::resend_invite(&server::STORAGE, &backend, id).await?)
}

#[post("/api/sub-admins/permissions")]
pub async fn update_permissions(id: Uuid, permissions: Permissions) -> ServerFnResult<SubAdmin> {
    let user = server::require_admin().await?;
    let backend = server::BACKEND_CLIENT.session(&user.access_token);
    Ok(server::sub_admins::update_permissions(&server::STORAGE, &backend, id, permissions).await?)
}

#[post("/api/sub-admins/status")]
pub async fn set_sub_admin_status(id: Uuid, status: SubAdminStatus) -> ServerFnResult<SubAdmin> {
    server::require_admin().await?;
    Ok(server::sub_admins::set_status(&server::STORAGE, id, status).await?)
}
