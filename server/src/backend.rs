use std::convert::Infallible;

use dioxus::fullstack::Lazy;
use jiff::civil::Date;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use types::{
    Breakdown, Error, Expense, ExpenseSource, Permissions, Result, Role, SubAdmin, UserData, err,
};

use crate::CONFIG;

pub static BACKEND_CLIENT: Lazy<BackendClient> =
    Lazy::new(|| async { Ok::<_, Infallible>(BackendClient::new(CONFIG.backend_url.clone())) });

trait ReqwestExt {
    async fn try_send<T: DeserializeOwned>(self) -> Result<T>;
    async fn try_send_empty(self) -> Result<()>;
}

impl ReqwestExt for RequestBuilder {
    async fn try_send<T: DeserializeOwned>(self) -> Result<T> {
        let body = checked(self).await?.bytes().await?;

        serde_json::from_slice(&body).map_err(|error| {
            tracing::debug!(?error, "failed to parse backend response");
            Error::from(error)
                .context("unexpected response from the fleet backend")
                .with_status(502)
        })
    }

    async fn try_send_empty(self) -> Result<()> {
        checked(self).await?;
        Ok(())
    }
}

/// Send the request; non-2xx responses become errors carrying the backend's message.
async fn checked(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await.map_err(|error| {
        tracing::warn!(%error, "fleet backend unreachable");
        Error::from(error)
            .context("the fleet backend is unreachable")
            .with_status(502)
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = backend_message(&body).unwrap_or_else(|| format!("backend returned {status}"));
    tracing::warn!(%status, %url, %message, "fleet backend request failed");

    let code = match status.as_u16() {
        code @ (401 | 403) => code,
        400 | 404 | 409 | 422 => 400,
        _ => 502,
    };
    Err(err!("{message}").with_status(code))
}

/// Pull a human message out of an error body, JSON or plain text.
fn backend_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(alias = "error")]
        message: String,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return Some(parsed.message);
    }

    let body = body.trim();
    (!body.is_empty() && body.len() <= 200 && !body.starts_with('<')).then(|| body.to_string())
}

#[derive(Debug, Deserialize)]
pub struct BackendUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: SecretString,
    pub user: BackendUser,
}

impl AuthResponse {
    /// Only an explicit "admin" role is the administrator; anything else, a missing role included, is a sub-admin.
    pub fn into_user_data(self) -> UserData {
        let role = match self.user.role.as_deref() {
            Some(role) if role.trim().eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::SubAdmin,
        };

        UserData {
            user_id: self.user.id,
            email: self.user.email,
            display_name: self.user.name,
            role,
            permissions: self.user.permissions.unwrap_or_default(),
            access_token: self.token,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteExpense {
    #[serde(alias = "_id")]
    id: String,
    cab_number: String,
    total_amount: f64,
    #[serde(default)]
    breakdown: Breakdown,
    #[serde(default, alias = "createdAt")]
    date: Option<String>,
}

impl From<RemoteExpense> for Expense {
    fn from(remote: RemoteExpense) -> Self {
        // Timestamps like 2024-06-01T10:00:00Z only contribute their date.
        let recorded_on = remote
            .date
            .as_deref()
            .and_then(|d| d.get(..10))
            .and_then(|d| d.parse::<Date>().ok());

        Expense {
            id: remote.id,
            cab_number: remote.cab_number,
            total_amount: remote.total_amount,
            breakdown: remote.breakdown,
            recorded_on,
            source: ExpenseSource::Remote,
        }
    }
}

#[derive(Deserialize)]
struct Count {
    count: u64,
}

/// Client for the fleet REST backend.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(path)?;
        Ok(self.client.request(method, url))
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .request(Method::POST, "auth/login")?
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .try_send()
            .await?;

        tracing::info!(user = %response.user.email, "backend login succeeded");
        Ok(response)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .request(Method::POST, "auth/register")?
            .json(&json!({
                "name": name,
                "email": email,
                "password": password.expose_secret(),
            }))
            .try_send()
            .await?;

        tracing::info!(user = %response.user.email, "backend registration succeeded");
        Ok(response)
    }

    /// Calls made on behalf of a signed-in user.
    pub fn session<'a>(&'a self, token: &'a SecretString) -> BackendSession<'a> {
        BackendSession {
            backend: self,
            token,
        }
    }
}

pub struct BackendSession<'a> {
    backend: &'a BackendClient,
    token: &'a SecretString,
}

impl BackendSession<'_> {
    fn get(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .backend
            .request(Method::GET, path)?
            .bearer_auth(self.token.expose_secret()))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .backend
            .request(Method::POST, path)?
            .bearer_auth(self.token.expose_secret()))
    }

    async fn count(&self, path: &str) -> Result<u64> {
        Ok(self.get(path)?.try_send::<Count>().await?.count)
    }

    pub async fn sub_admin_count(&self) -> Result<u64> {
        self.count("subadmin/count").await
    }

    pub async fn driver_count(&self) -> Result<u64> {
        self.count("driver/count").await
    }

    pub async fn cab_count(&self) -> Result<u64> {
        self.count("cab/count").await
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>> {
        Ok(self
            .get("expenses")?
            .try_send::<Vec<RemoteExpense>>()
            .await?
            .into_iter()
            .map(Expense::from)
            .collect())
    }

    pub async fn update_permissions(&self, sub_admin: &SubAdmin, permissions: Permissions) -> Result<()> {
        self.post("subadmin/permissions")?
            .json(&json!({
                "subAdminId": sub_admin.id,
                "permissions": permissions,
            }))
            .try_send_empty()
            .await?;

        tracing::info!(sub_admin = %sub_admin.email, ?permissions, "permissions posted to backend");
        Ok(())
    }

    pub async fn send_invite(&self, sub_admin: &SubAdmin) -> Result<()> {
        self.post("subadmin/invite")?
            .json(&json!({
                "name": sub_admin.name,
                "email": sub_admin.email,
            }))
            .try_send_empty()
            .await?;

        tracing::info!(sub_admin = %sub_admin.email, "invite sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Json;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use serde_json::Value;
    use types::{Feature, InviteStatus, SubAdminStatus};
    use uuid::Uuid;

    use super::*;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer user-token")
    }

    async fn login(Json(body): Json<Value>) -> Response {
        if body["password"] == "correct horse" {
            Json(json!({
                "token": "user-token",
                "user": {
                    "_id": "64f0",
                    "name": "Owner",
                    "email": body["email"],
                    "role": "admin"
                }
            }))
            .into_response()
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid credentials" })),
            )
                .into_response()
        }
    }

    async fn cab_count(headers: HeaderMap) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Json(json!({ "count": 7 })).into_response()
    }

    async fn expenses(headers: HeaderMap) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Json(json!([
            {
                "_id": "e1",
                "cabNumber": "KA-01",
                "totalAmount": 1200.0,
                "breakdown": { "fuel": 1000.0, "toll": 200.0 },
                "createdAt": "2024-06-01T10:30:00.000Z"
            },
            { "id": "e2", "cabNumber": "KA-02", "totalAmount": 50.0 }
        ]))
        .into_response()
    }

    async fn permissions(Json(body): Json<Value>) -> Response {
        if body["permissions"]["cabs"] == true && body["subAdminId"].is_string() {
            StatusCode::OK.into_response()
        } else {
            StatusCode::UNPROCESSABLE_ENTITY.into_response()
        }
    }

    async fn serve() -> BackendClient {
        let app = axum::Router::new()
            .route("/auth/login", post(login))
            .route("/cab/count", get(cab_count))
            .route("/driver/count", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/expenses", get(expenses))
            .route("/subadmin/permissions", post(permissions))
            .route("/subadmin/invite", post(|| async { "sent" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        BackendClient::new(format!("http://{addr}/").parse().unwrap())
    }

    fn password(s: &str) -> SecretString {
        s.to_string().into()
    }

    fn sub_admin() -> SubAdmin {
        SubAdmin {
            id: Uuid::now_v7(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            role: "Dispatcher".into(),
            status: SubAdminStatus::Active,
            permissions: Permissions::default(),
            invite: InviteStatus::Pending,
        }
    }

    #[tokio::test]
    async fn login_builds_user_data() {
        let backend = serve().await;
        let user = backend
            .login("owner@example.com", &password("correct horse"))
            .await
            .unwrap()
            .into_user_data();

        assert_eq!(user.user_id, "64f0");
        assert_eq!(user.email, "owner@example.com");
        assert!(user.is_admin());
        assert_eq!(user.access_token.expose_secret(), "user-token");
    }

    #[test]
    fn accounts_without_a_role_are_sub_admins() {
        let response: AuthResponse = serde_json::from_value(json!({
            "token": "t",
            "user": { "id": "u1", "email": "new@example.com", "name": "Newcomer" }
        }))
        .unwrap();
        let user = response.into_user_data();

        assert_eq!(user.role, Role::SubAdmin);
        assert_eq!(user.permissions, Permissions::default());
        assert!(!user.is_admin());
    }

    #[test]
    fn only_the_admin_role_is_the_administrator() {
        let parse = |role: &str| -> Role {
            let response: AuthResponse = serde_json::from_value(json!({
                "token": "t",
                "user": { "id": "u1", "email": "a@example.com", "name": "A", "role": role }
            }))
            .unwrap();
            response.into_user_data().role
        };

        assert_eq!(parse("Admin"), Role::Admin);
        assert_eq!(parse("dispatcher"), Role::SubAdmin);
        assert_eq!(parse(""), Role::SubAdmin);
    }

    #[tokio::test]
    async fn rejected_login_keeps_the_backend_message() {
        let backend = serve().await;
        let error = backend
            .login("owner@example.com", &password("wrong"))
            .await
            .unwrap_err();

        assert_eq!(error.status(), 401);
        assert_eq!(error.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn session_calls_carry_the_bearer_token() {
        let backend = serve().await;
        let token = password("user-token");
        assert_eq!(backend.session(&token).cab_count().await.unwrap(), 7);

        let other = password("someone-else");
        assert_eq!(backend.session(&other).cab_count().await.unwrap_err().status(), 401);
    }

    #[tokio::test]
    async fn backend_failures_are_bad_gateway() {
        let backend = serve().await;
        let token = password("user-token");
        let error = backend.session(&token).driver_count().await.unwrap_err();
        assert_eq!(error.status(), 502);
    }

    #[tokio::test]
    async fn expenses_are_marked_remote() {
        let backend = serve().await;
        let token = password("user-token");
        let expenses = backend.session(&token).list_expenses().await.unwrap();

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].source, ExpenseSource::Remote);
        assert_eq!(expenses[0].month().as_deref(), Some("2024-06"));
        assert_eq!(expenses[1].breakdown.sum(), 0.0);
        assert!(!expenses[1].is_balanced());
    }

    #[tokio::test]
    async fn permissions_are_posted_in_full() {
        let backend = serve().await;
        let token = password("user-token");
        let session = backend.session(&token);
        let sub = sub_admin();

        let granted = sub.permissions.toggled(Feature::Cabs);
        session.update_permissions(&sub, granted).await.unwrap();

        let error = session
            .update_permissions(&sub, Permissions::none())
            .await
            .unwrap_err();
        assert_eq!(error.status(), 400);

        session.send_invite(&sub).await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_backend_is_bad_gateway() {
        let backend = BackendClient::new("http://127.0.0.1:9/".parse().unwrap());
        let error = backend
            .login("owner@example.com", &password("x"))
            .await
            .unwrap_err();
        assert_eq!(error.status(), 502);
    }

    #[test]
    fn messages_are_extracted_from_error_bodies() {
        assert_eq!(backend_message(r#"{"error":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(backend_message("plain words").as_deref(), Some("plain words"));
        assert_eq!(backend_message("<html>").as_deref(), None);
        assert_eq!(backend_message("  ").as_deref(), None);
    }
}
