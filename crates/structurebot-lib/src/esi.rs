//! Blocking ESI client that supplies corporation structure records.
//!
//! The client resolves a corporation name to its id, pages through the
//! corporation structure and asset endpoints, and joins fitted items onto
//! their structures. Every request runs under a [`RetryPolicy`].

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::auth::{refresh_access_token, SsoCredentials};
use crate::error::{Error, Result};
use crate::structure::{FittedModule, StructureId, StructureProvider, StructureRecord};
use crate::types::TypeId;

/// Default ESI base URL.
pub const DEFAULT_ESI_URL: &str = "https://esi.evetech.net/latest";

/// Bounded exponential-backoff retry for transient upstream failures.
///
/// Only errors for which [`Error::is_retryable`] holds are retried; anything
/// else is returned on the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    ///
    /// # Errors
    /// The first non-retryable error, or [`Error::RetriesExhausted`] wrapping
    /// the last retryable one.
    pub fn run<T, F>(&self, endpoint: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(endpoint, attempt, max_attempts, "requesting");

            let err = match operation() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= max_attempts {
                error!(endpoint, attempts = attempt, error = %err, "retries exhausted");
                return Err(Error::RetriesExhausted {
                    endpoint: endpoint.to_string(),
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let backoff = self.backoff(attempt);
            warn!(endpoint, attempt, ?backoff, error = %err, "retrying after transient failure");
            thread::sleep(backoff);
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdsResponse {
    #[serde(default)]
    corporations: Vec<NamedId>,
}

#[derive(Debug, Deserialize)]
struct NamedId {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct EsiStructure {
    structure_id: StructureId,
    type_id: TypeId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    fuel_expires: Option<DateTime<Utc>>,
    #[serde(default)]
    unanchors_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct EsiAsset {
    type_id: TypeId,
    location_id: i64,
    location_flag: String,
}

#[derive(Debug, Deserialize)]
struct EsiErrorBody {
    error: String,
}

/// ESI client for corporation structures.
#[derive(Debug, Clone)]
pub struct EsiClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    retry: RetryPolicy,
}

impl EsiClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
            retry,
        })
    }

    /// Attach the bearer token used for corporation endpoints.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Exchange SSO credentials for an access token and attach it.
    pub fn authenticate(self, login_url: &str, credentials: &SsoCredentials) -> Result<Self> {
        let token = self.retry.run("oauth/token", || {
            refresh_access_token(&self.client, login_url, credentials)
        })?;
        info!("obtained ESI access token");
        Ok(self.with_access_token(token))
    }

    /// Resolve a corporation name to its id.
    pub fn corporation_id(&self, name: &str) -> Result<i64> {
        let response: IdsResponse = self.retry.run("/universe/ids/", || {
            let request = self
                .client
                .post(self.url("/universe/ids/"))
                .json(&[name]);
            let response = self.send(request, "/universe/ids/")?;
            Ok(response.json()?)
        })?;

        response
            .corporations
            .iter()
            .find(|corp| corp.name.eq_ignore_ascii_case(name))
            .or_else(|| response.corporations.first())
            .map(|corp| corp.id)
            .ok_or_else(|| Error::CorporationNotFound {
                name: name.to_string(),
            })
    }

    fn structures(&self, corporation_id: i64) -> Result<Vec<EsiStructure>> {
        self.paged(&format!("/corporations/{corporation_id}/structures/"))
    }

    fn assets(&self, corporation_id: i64) -> Result<Vec<EsiAsset>> {
        self.paged(&format!("/corporations/{corporation_id}/assets/"))
    }

    /// Fetch every page of an authenticated list endpoint.
    fn paged<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let (mut batch, pages) = self.retry.run(endpoint, || {
                let request = self
                    .authorized(self.client.get(self.url(endpoint)))?
                    .query(&[("page", page)]);
                let response = self.send(request, endpoint)?;
                let pages = response
                    .headers()
                    .get("x-pages")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u32>().ok())
                    .unwrap_or(1);
                Ok((response.json::<Vec<T>>()?, pages))
            })?;
            items.append(&mut batch);

            if page >= pages {
                break;
            }
            page += 1;
        }

        debug!(endpoint, pages = page, count = items.len(), "fetched paged endpoint");
        Ok(items)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token.as_deref().ok_or_else(|| Error::Auth {
            message: "no access token configured for corporation endpoints".to_string(),
        })?;
        Ok(request.bearer_auth(token))
    }

    fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<reqwest::blocking::Response> {
        let response = request.header(ACCEPT, "application/json").send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<EsiErrorBody>(&body)
            .map(|body| body.error)
            .unwrap_or(body);
        Err(Error::Esi {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

impl StructureProvider for EsiClient {
    fn corporation_structures(&self, corporation: &str) -> Result<Vec<StructureRecord>> {
        let corporation_id = self.corporation_id(corporation)?;
        info!(corporation, corporation_id, "fetching corporation structures");

        let structures = self.structures(corporation_id)?;
        let mut modules: HashMap<StructureId, Vec<FittedModule>> = structures
            .iter()
            .map(|structure| (structure.structure_id, Vec::new()))
            .collect();

        for asset in self.assets(corporation_id)? {
            if let Some(fitted) = modules.get_mut(&asset.location_id) {
                fitted.push(FittedModule {
                    type_id: asset.type_id,
                    location_flag: asset.location_flag,
                });
            }
        }

        Ok(structures
            .into_iter()
            .map(|structure| StructureRecord {
                modules: modules.remove(&structure.structure_id).unwrap_or_default(),
                structure_id: structure.structure_id,
                type_id: structure.type_id,
                name: structure.name,
                fuel_expires: structure.fuel_expires,
                unanchors_at: structure.unanchors_at,
            })
            .collect())
    }
}

pub(crate) fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(user_agent())
        .build()
        .map_err(Error::Http)
}

fn user_agent() -> String {
    format!("structurebot/{}", env!("CARGO_PKG_VERSION"))
}
