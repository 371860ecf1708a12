//! Wire types for the incident.io API.
//!
//! Objects keep unknown fields in `extra` so nothing the API returns is lost
//! when a full object is handed back to a caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cursor pagination block returned by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_record_count: Option<u64>,
}

/// A named reference such as an incident status or type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub permalink: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_status: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListIncidentsResponse {
    #[serde(default)]
    pub incidents: Vec<Incident>,
    #[serde(default)]
    pub pagination_meta: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct IncidentEnvelope {
    pub incident: Incident,
}

/// Filters for `GET /incidents`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListIncidentsOptions {
    pub page_size: Option<u32>,
    pub after: Option<String>,
    pub status: Vec<String>,
    pub severity_one_of: Vec<String>,
    pub severity_gte: Option<String>,
    pub severity_lte: Option<String>,
    pub created_at_gte: Option<String>,
    pub created_at_lte: Option<String>,
    pub updated_at_gte: Option<String>,
    pub updated_at_lte: Option<String>,
    /// Custom field ID to option ID.
    pub custom_field_one_of: Vec<(String, String)>,
}

impl ListIncidentsOptions {
    /// Query pairs in the API's `field[operator]=value` form.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();

        if let Some(page_size) = self.page_size {
            query.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(after) = &self.after {
            query.push(("after".to_string(), after.clone()));
        }
        for status in &self.status {
            query.push(("status[one_of]".to_string(), status.clone()));
        }
        for severity in &self.severity_one_of {
            query.push(("severity[one_of]".to_string(), severity.clone()));
        }

        let ranged = [
            ("severity[gte]", &self.severity_gte),
            ("severity[lte]", &self.severity_lte),
            ("created_at[gte]", &self.created_at_gte),
            ("created_at[lte]", &self.created_at_lte),
            ("updated_at[gte]", &self.updated_at_gte),
            ("updated_at[lte]", &self.updated_at_lte),
        ];
        for (key, value) in ranged {
            if let Some(value) = value {
                query.push((key.to_string(), value.clone()));
            }
        }

        for (field_id, option_id) in &self.custom_field_one_of {
            query.push((format!("custom_field[{}][one_of]", field_id), option_id.clone()));
        }

        query
    }
}

/// Body for `POST /incidents`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIncidentRequest {
    pub idempotency_key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_status_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_type_id: Option<String>,
    pub mode: String,
    pub visibility: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_channel_name_override: Option<String>,
}

impl CreateIncidentRequest {
    /// A standard, public incident with a fresh idempotency key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            idempotency_key: format!("mcp-{}", uuid::Uuid::new_v4()),
            name: name.into(),
            summary: None,
            incident_status_id: None,
            severity_id: None,
            incident_type_id: None,
            mode: "standard".to_string(),
            visibility: "public".to_string(),
            slack_channel_name_override: None,
        }
    }
}

/// Fields accepted by an incident edit. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateIncidentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_status_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_id: Option<String>,
}

impl UpdateIncidentRequest {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.summary.is_none()
            && self.incident_status_id.is_none()
            && self.severity_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Severity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rank: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSeveritiesResponse {
    #[serde(default)]
    pub severities: Vec<Severity>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct SeverityEnvelope {
    pub severity: Severity,
}

/// What fires a workflow, e.g. `incident.created`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTrigger {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub trigger: WorkflowTrigger,
    #[serde(default)]
    pub enabled: bool,
    /// e.g. `active`, `disabled`, `draft`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListWorkflowsResponse {
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    #[serde(default, alias = "pagination_info")]
    pub pagination_meta: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct WorkflowEnvelope {
    pub workflow: Workflow,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListWorkflowsParams {
    pub page_size: Option<u32>,
    pub after: Option<String>,
}

impl ListWorkflowsParams {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(page_size) = self.page_size.filter(|size| *size > 0) {
            query.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(after) = &self.after {
            query.push(("after".to_string(), after.clone()));
        }
        query
    }
}

/// Fields accepted by a workflow update. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateWorkflowRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl UpdateWorkflowRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.enabled.is_none() && self.state.is_none()
    }
}
