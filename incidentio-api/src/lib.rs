//! # incident.io API bindings
//!
//! Typed endpoint calls on top of the resilient request executor from
//! `incidentio-http-client`:
//!
//! - **Incidents** (v2): list with filters, get, create, update
//! - **Severities** (v1): list and get, read through a TTL cache
//! - **Workflows** (v2): list, get, update
//!
//! Every call takes a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! that aborts rate-limit waits, in-flight attempts and retry backoff.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use incidentio_api::{IncidentIoClient, ListIncidentsOptions, DEFAULT_V1_BASE_URL};
//! use incidentio_cache::TtlCache;
//! use incidentio_http_client::{HttpClientConfig, ReqwestTransport, RequestExecutor};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig::builder().api_key("secret").build();
//! let transport = Arc::new(ReqwestTransport::new(&config)?);
//! let executor = Arc::new(RequestExecutor::builder(transport, "https://api.incident.io/v2").build());
//! let cache = Arc::new(TtlCache::<Bytes>::new(Duration::from_secs(300)));
//!
//! let client = IncidentIoClient::new(executor, cache, DEFAULT_V1_BASE_URL);
//! let page = client
//!     .list_incidents(&ListIncidentsOptions::default(), &CancellationToken::new())
//!     .await?;
//! println!("{} incidents", page.incidents.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod health;
mod incidents;
mod severities;
mod types;
mod workflows;

pub use client::{DEFAULT_V1_BASE_URL, IncidentIoClient};
pub use error::{ApiError, Result};
pub use health::{CircuitBreakerHealth, ClientHealth, RateLimiterHealth};
pub use severities::{SEVERITIES_CACHE_KEY, severity_cache_key};
pub use types::{
    CreateIncidentRequest, Incident, ListIncidentsOptions, ListIncidentsResponse,
    ListSeveritiesResponse, ListWorkflowsParams, ListWorkflowsResponse, NamedRef, PaginationMeta,
    Severity, UpdateIncidentRequest, UpdateWorkflowRequest, Workflow, WorkflowTrigger,
};
