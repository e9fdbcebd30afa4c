//! HTTP client for the SAMM backend.
//!
//! Endpoints:
//! - POST /members/root/
//! - POST /token/owner/, POST /token
//! - GET|POST /samms/, GET /samms/me/, PATCH|DELETE /samms/{id}/
//! - GET|POST /samms/{id}/members/
//! - GET /samms/{id}/transactions/
//! - GET /transactions/{id}/approvals/, GET /transactions/{id}/approvals/me/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use samm_types::{
    DbTransaction, DbTransactionApproval, DbTransactionStatus, Member, Result, SammData, SammError,
    SendingSammData, TokenResponse,
};

pub const DEFAULT_OFFSET: u64 = 0;
pub const DEFAULT_LIMIT: u64 = 100;

const MISSING_TOKEN: &str = "No access token found. Please log in.";

/// Page window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self { offset: DEFAULT_OFFSET, limit: DEFAULT_LIMIT }
    }
}

/// Signed owner authorization exchanged for an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerTokenRequest {
    pub owner_address: String,
    pub samm_address: String,
    pub chain_id: u64,
    pub timestamp: u64,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RootResponse {
    root: String,
}

#[derive(Debug, Serialize)]
struct UpdateSamm {
    threshold: u64,
    is_active: bool,
}

#[derive(Debug, Serialize)]
struct TransactionsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    offset: u64,
    limit: u64,
}

/// Backend client. Calls marked authenticated need a token set through
/// `with_token` or `set_token`.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(30_000);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SammError::UnauthorizedToken(MISSING_TOKEN.into()))?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp = builder
            .send()
            .await
            .map_err(|e| SammError::BackendRequestFailed(format!("backend request failed: {e}")))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "backend request rejected");
            return Err(response_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            SammError::BackendRequestFailed(format!("Failed to parse server response: {e}"))
        })
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        let resp = builder
            .send()
            .await
            .map_err(|e| SammError::BackendRequestFailed(format!("backend request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(response_error(status.as_u16(), &body));
        }
        Ok(())
    }

    /// Merkle root of the member email set.
    ///
    /// POST /members/root/
    pub async fn members_root(&self, emails: &[String]) -> Result<String> {
        let resp: RootResponse = self
            .send(self.request(Method::POST, "/members/root/").json(emails))
            .await?;
        Ok(resp.root)
    }

    /// Exchange a signed owner authorization for a token.
    ///
    /// POST /token/owner/?owner_address=..&samm_address=..&chain_id=..&timestamp=..&signature=..[&name=..]
    pub async fn owner_token(&self, request: &OwnerTokenRequest) -> Result<TokenResponse> {
        self.send(self.request(Method::POST, "/token/owner/").query(request))
            .await
    }

    /// Password login for a member.
    ///
    /// POST /token (form encoded)
    pub async fn member_token(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let form = [("grant_type", "password"), ("username", username), ("password", password)];
        self.send(self.request(Method::POST, "/token").form(&form)).await
    }

    /// Modules registered for a Safe on the given chain.
    ///
    /// GET /samms/?safe_address=..
    pub async fn samms_by_safe(&self, safe_address: &str, chain_id: u64) -> Result<Vec<SammData>> {
        let all: Vec<SammData> = self
            .send(
                self.request(Method::GET, "/samms/")
                    .query(&[("safe_address", safe_address)]),
            )
            .await?;
        Ok(filter_by_chain(all, chain_id))
    }

    /// POST /samms/
    pub async fn create_samm(&self, data: &SendingSammData) -> Result<SammData> {
        self.send(self.request(Method::POST, "/samms/").json(data)).await
    }

    /// Modules visible to the token holder.
    ///
    /// GET /samms/me/
    pub async fn user_samms(&self) -> Result<Vec<SammData>> {
        self.send(self.authed(Method::GET, "/samms/me/")?).await
    }

    /// DELETE /samms/{id}/
    pub async fn delete_samm(&self, samm_id: u64) -> Result<()> {
        self.send_empty(self.authed(Method::DELETE, &format!("/samms/{samm_id}/"))?)
            .await
    }

    /// PATCH /samms/{id}/
    pub async fn update_samm(&self, samm_id: u64, threshold: u64, is_active: bool) -> Result<SammData> {
        let body = UpdateSamm { threshold, is_active };
        self.send(
            self.authed(Method::PATCH, &format!("/samms/{samm_id}/"))?
                .json(&body),
        )
        .await
    }

    /// Active members of a module.
    ///
    /// GET /samms/{id}/members/?offset=..&limit=..
    pub async fn members(&self, samm_id: u64, page: Page) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self
            .send(
                self.authed(Method::GET, &format!("/samms/{samm_id}/members/"))?
                    .query(&page),
            )
            .await?;
        members.retain(|m| m.is_active);
        Ok(members)
    }

    /// Replace the module's member list; members left out are deactivated.
    ///
    /// POST /samms/{id}/members/
    pub async fn update_members(&self, samm_id: u64, emails: &[String]) -> Result<Vec<Member>> {
        self.send(
            self.authed(Method::POST, &format!("/samms/{samm_id}/members/"))?
                .json(emails),
        )
        .await
    }

    /// GET /samms/{id}/transactions/?[status=..&]offset=..&limit=..
    pub async fn transactions(
        &self,
        samm_id: u64,
        status: Option<DbTransactionStatus>,
        page: Page,
    ) -> Result<Vec<DbTransaction>> {
        let query = TransactionsQuery {
            status: status.map(DbTransactionStatus::as_str),
            offset: page.offset,
            limit: page.limit,
        };
        self.send(
            self.authed(Method::GET, &format!("/samms/{samm_id}/transactions/"))?
                .query(&query),
        )
        .await
    }

    /// GET /transactions/{id}/approvals/?offset=..&limit=..
    pub async fn approvals(&self, txn_id: u64, page: Page) -> Result<Vec<DbTransactionApproval>> {
        if txn_id == 0 {
            return Err(SammError::MissingTransactionId);
        }
        self.send(
            self.authed(Method::GET, &format!("/transactions/{txn_id}/approvals/"))?
                .query(&page),
        )
        .await
    }

    /// Approval submitted by the token holder, if any.
    ///
    /// GET /transactions/{id}/approvals/me/
    pub async fn my_approval(&self, txn_id: u64) -> Result<Option<DbTransactionApproval>> {
        if txn_id == 0 {
            return Err(SammError::MissingTransactionId);
        }
        self.send(self.authed(Method::GET, &format!("/transactions/{txn_id}/approvals/me/"))?)
            .await
    }
}

/// Backend calls a member list change goes through.
#[async_trait]
pub trait MembersBackend: Send + Sync {
    async fn members_root(&self, emails: &[String]) -> Result<String>;

    /// Replace the whole member list of `samm_id` with `emails`.
    async fn update_members(&self, samm_id: u64, emails: &[String]) -> Result<Vec<Member>>;
}

#[async_trait]
impl MembersBackend for ApiClient {
    async fn members_root(&self, emails: &[String]) -> Result<String> {
        ApiClient::members_root(self, emails).await
    }

    async fn update_members(&self, samm_id: u64, emails: &[String]) -> Result<Vec<Member>> {
        ApiClient::update_members(self, samm_id, emails).await
    }
}

/// Keep only records on `chain_id`.
pub fn filter_by_chain(samms: Vec<SammData>, chain_id: u64) -> Vec<SammData> {
    samms.into_iter().filter(|s| s.chain_id == chain_id).collect()
}

/// Map a non-success response to an error.
///
/// 401 means the token was rejected. Otherwise the body's `detail` or
/// `error` field is used when present.
pub fn response_error(status: u16, body: &str) -> SammError {
    if status == 401 {
        return SammError::UnauthorizedToken("Invalid token".into());
    }

    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        ["detail", "error"].iter().find_map(|key| match v.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
    });

    SammError::BackendRequestFailed(
        message.unwrap_or_else(|| format!("Request failed with status {status}")),
    )
}
