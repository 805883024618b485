//! PocketSmith v2 REST client.

use anyhow::Result;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use slipsync_core::{
    Attachment, CandidateTransaction, CategoryRef, CategoryRule, Ledger, LedgerUser,
    TransactionUpdate,
};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.pocketsmith.com/v2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PocketSmithError {
    #[error("developer key is not a valid header value")]
    InvalidKey(#[from] reqwest::header::InvalidHeaderValue),
    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{method} {path}: {source}")]
    Transport {
        method: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: &'static str,
        path: String,
        status: StatusCode,
        body: String,
    },
    #[error("{method} {path}: decoding response: {source}")]
    Decode {
        method: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

pub struct PocketSmith {
    http: reqwest::Client,
    base_url: String,
}

impl PocketSmith {
    pub fn new(token: &str, base_url: &str) -> Result<Self, PocketSmithError> {
        let mut key = HeaderValue::from_str(token)?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-Developer-Key", key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("slipsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PocketSmithError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send `req`, turning transport failures and non-2xx statuses into errors.
    async fn execute(
        &self,
        method: &'static str,
        path: &str,
        req: RequestBuilder,
    ) -> Result<reqwest::Response, PocketSmithError> {
        debug!(method, path, "pocketsmith request");
        let resp = req.send().await.map_err(|source| PocketSmithError::Transport {
            method,
            path: path.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PocketSmithError::Status {
                method,
                path: path.to_string(),
                status,
                body,
            });
        }
        Ok(resp)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        req: RequestBuilder,
    ) -> Result<T, PocketSmithError> {
        let resp = self.execute(method, path, req).await?;
        resp.json().await.map_err(|source| PocketSmithError::Decode {
            method,
            path: path.to_string(),
            source,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PocketSmithError> {
        let req = self.http.get(self.url(path)).query(query);
        self.send("GET", path, req).await
    }
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: i64,
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    id: i64,
    title: Option<String>,
}

impl From<WireCategory> for CategoryRef {
    fn from(c: WireCategory) -> Self {
        CategoryRef {
            id: c.id,
            title: c.title.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireCategoryRule {
    payee_matches: Option<String>,
    category: WireCategory,
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    id: i64,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireTransaction {
    id: i64,
    payee: Option<String>,
    original_payee: Option<String>,
    memo: Option<String>,
    amount: f64,
    date: NaiveDate,
    is_transfer: Option<bool>,
    needs_review: Option<bool>,
    category: Option<WireCategory>,
    note: Option<String>,
}

impl From<WireTransaction> for CandidateTransaction {
    fn from(t: WireTransaction) -> Self {
        CandidateTransaction {
            id: t.id,
            payee: t.payee.unwrap_or_default(),
            original_payee: t.original_payee.unwrap_or_default(),
            memo: t.memo.unwrap_or_default(),
            amount: t.amount,
            date: t.date,
            is_transfer: t.is_transfer.unwrap_or(false),
            needs_review: t.needs_review.unwrap_or(false),
            category: t.category.map(CategoryRef::from),
            note: t.note.unwrap_or_default(),
        }
    }
}

impl Ledger for PocketSmith {
    async fn current_user(&self) -> Result<LedgerUser> {
        let u: WireUser = self.get("/me", &[]).await?;
        Ok(LedgerUser {
            id: u.id,
            login: u.login.unwrap_or_default(),
        })
    }

    async fn category_rules(&self, user_id: i64) -> Result<Vec<CategoryRule>> {
        let rules: Vec<WireCategoryRule> = self
            .get(&format!("/users/{user_id}/category_rules"), &[])
            .await?;
        Ok(rules
            .into_iter()
            .map(|r| CategoryRule {
                pattern: r.payee_matches.unwrap_or_default(),
                category: r.category.into(),
            })
            .collect())
    }

    async fn search_transactions(
        &self,
        account_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        query: &str,
    ) -> Result<Vec<CandidateTransaction>> {
        let txs: Vec<WireTransaction> = self
            .get(
                &format!("/transaction_accounts/{account_id}/transactions"),
                &[
                    ("start_date", from.format("%Y-%m-%d").to_string()),
                    ("end_date", to.format("%Y-%m-%d").to_string()),
                    ("search", query.to_string()),
                ],
            )
            .await?;
        Ok(txs.into_iter().map(CandidateTransaction::from).collect())
    }

    async fn attachments(&self, user_id: i64, unassigned_only: bool) -> Result<Vec<Attachment>> {
        let mut query = Vec::new();
        if unassigned_only {
            query.push(("unassigned", "1".to_string()));
        }
        let attachments: Vec<WireAttachment> = self
            .get(&format!("/users/{user_id}/attachments"), &query)
            .await?;
        Ok(attachments
            .into_iter()
            .map(|a| Attachment {
                id: a.id,
                title: a.title.unwrap_or_default(),
            })
            .collect())
    }

    async fn assign_attachment(&self, transaction_id: i64, attachment_id: i64) -> Result<()> {
        let path = format!("/transactions/{transaction_id}/attachments");
        let req = self
            .http
            .post(self.url(&path))
            .json(&json!({ "attachment_id": attachment_id }));
        self.execute("POST", &path, req).await?;
        Ok(())
    }

    async fn update_transaction(
        &self,
        transaction_id: i64,
        update: &TransactionUpdate,
    ) -> Result<CandidateTransaction> {
        let path = format!("/transactions/{transaction_id}");
        let req = self.http.put(self.url(&path)).json(update);
        let updated: WireTransaction = self.send("PUT", &path, req).await?;
        Ok(updated.into())
    }
}
