//! Incident tools: list, get, create, update.

use super::{
    Arguments, Tool, ToolError, bool_arg, format_json_response, format_pretty, int_arg,
    require_string_arg, string_arg, string_array_arg,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use incidentio_api::{
    CreateIncidentRequest, Incident, IncidentIoClient, ListIncidentsOptions, UpdateIncidentRequest,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const DEFAULT_PAGE_SIZE: i64 = 25;
const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// list_incidents
// ============================================================================

/// Compact view of an incident used by `list_incidents` in summary mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentSummary {
    pub reference: String,
    pub name: String,
    pub status: String,
    pub severity: String,
    pub created_at: String,
    pub updated_at: String,
    pub permalink: String,
}

impl From<&Incident> for IncidentSummary {
    fn from(incident: &Incident) -> Self {
        Self {
            reference: incident.reference.clone(),
            name: incident.name.clone(),
            status: incident
                .incident_status
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            severity: incident
                .severity
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            created_at: rfc3339(incident.created_at),
            updated_at: rfc3339(incident.updated_at),
            permalink: incident.permalink.clone(),
        }
    }
}

fn rfc3339(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

pub struct ListIncidentsTool {
    client: IncidentIoClient,
    max_response_size: usize,
}

impl ListIncidentsTool {
    pub fn new(client: IncidentIoClient, max_response_size: usize) -> Self {
        Self {
            client,
            max_response_size,
        }
    }

    fn options(args: &Arguments) -> ListIncidentsOptions {
        let page_size = int_arg(args, "page_size", DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let mut custom_field_one_of = Vec::new();
        if let (Some(id), Some(value)) = (
            string_arg(args, "custom_field_id"),
            string_arg(args, "custom_field_value"),
        ) {
            custom_field_one_of.push((id, value));
        }

        ListIncidentsOptions {
            page_size: Some(page_size as u32),
            after: string_arg(args, "after"),
            status: string_array_arg(args, "status"),
            severity_one_of: string_array_arg(args, "severity_one_of"),
            severity_gte: string_arg(args, "severity_gte"),
            severity_lte: string_arg(args, "severity_lte"),
            created_at_gte: string_arg(args, "created_at_gte"),
            created_at_lte: string_arg(args, "created_at_lte"),
            updated_at_gte: string_arg(args, "updated_at_gte"),
            updated_at_lte: string_arg(args, "updated_at_lte"),
            custom_field_one_of,
        }
    }
}

#[async_trait]
impl Tool for ListIncidentsTool {
    fn name(&self) -> &'static str {
        "list_incidents"
    }

    fn description(&self) -> &'static str {
        "List incidents with filtering. Returns compact summaries by default to avoid large responses.\n\n\
         KEY FEATURES:\n\
         - search: Filter by name (case-insensitive substring match on the current page)\n\
         - summary: true (default) returns compact summaries, false returns full details\n\
         - page_size: Default 25, increase only if needed\n\n\
         RESPONSE FORMAT (summary=true, default):\n\
         Returns: reference, name, status, severity, created_at, updated_at, permalink\n\n\
         EXAMPLES:\n\
         Find database incidents: list_incidents({\"search\": \"database\"})\n\
         Recent incidents: list_incidents({\"created_at_gte\": \"2025-01-28\"})\n\
         Full details: list_incidents({\"search\": \"database\", \"summary\": false})\n\n\
         PAGINATION:\n\
         If has_more_results=true, call again with the 'after' cursor from pagination_meta.\n\n\
         INCIDENT REFERENCE RESOLUTION:\n\
         For INC-1691, use get_incident({\"incident_id\": \"1691\"}) for full details.\n\n\
         Date format: \"2025-10-15\"."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "search": {
                    "type": "string",
                    "description": "Filter incidents by name (case-insensitive substring match)."
                },
                "summary": {
                    "type": "boolean",
                    "description": "Return compact summaries instead of full incident details. Defaults to true.",
                    "default": true
                },
                "page_size": {
                    "type": "integer",
                    "description": "Number of results per page. Default is 25.",
                    "default": DEFAULT_PAGE_SIZE,
                    "minimum": 1,
                    "maximum": MAX_PAGE_SIZE
                },
                "after": {
                    "type": "string",
                    "description": "Pagination cursor from pagination_meta.after of the previous response."
                },
                "status": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Filter by status. Values: triage, active, investigating, monitoring, resolved, closed."
                },
                "severity_one_of": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Filter by exact severity IDs. Use list_severities to get IDs."
                },
                "severity_gte": {
                    "type": "string",
                    "description": "Filter by severity rank >= this severity ID."
                },
                "severity_lte": {
                    "type": "string",
                    "description": "Filter by severity rank <= this severity ID."
                },
                "created_at_gte": {
                    "type": "string",
                    "description": "Created on or after this date. Format: '2025-10-15' or '2025-10-15T10:30:00Z'."
                },
                "created_at_lte": {
                    "type": "string",
                    "description": "Created on or before this date. Format: '2025-10-15' or '2025-10-15T23:59:59Z'."
                },
                "updated_at_gte": {
                    "type": "string",
                    "description": "Updated on or after this date. Format: '2025-10-15' or '2025-10-15T10:30:00Z'."
                },
                "updated_at_lte": {
                    "type": "string",
                    "description": "Updated on or before this date. Format: '2025-10-15' or '2025-10-15T23:59:59Z'."
                },
                "custom_field_id": {
                    "type": "string",
                    "description": "Custom field ID to filter by. Must be used with custom_field_value."
                },
                "custom_field_value": {
                    "type": "string",
                    "description": "Custom field option ID to match (the option's ID, not its label)."
                }
            }
        })
    }

    async fn execute(
        &self,
        args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let search = string_arg(args, "search").map(|s| s.to_lowercase());
        let summary_mode = bool_arg(args, "summary").unwrap_or(true);
        let options = Self::options(args);

        let page = self.client.list_incidents(&options, cancel).await?;

        let matching: Vec<&Incident> = page
            .incidents
            .iter()
            .filter(|incident| match &search {
                Some(needle) => incident.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();

        let incidents = if summary_mode {
            serde_json::to_value(
                matching
                    .iter()
                    .map(|incident| IncidentSummary::from(*incident))
                    .collect::<Vec<_>>(),
            )?
        } else {
            serde_json::to_value(&matching)?
        };

        let mut response = Map::new();
        response.insert("incidents".into(), incidents);
        response.insert(
            "pagination_meta".into(),
            serde_json::to_value(&page.pagination_meta)?,
        );
        response.insert("count".into(), json!(matching.len()));

        if let Some(needle) = &search {
            response.insert("search_applied".into(), json!(needle));
            response.insert(
                "search_note".into(),
                json!(format!(
                    "Filtered {} incidents from {} total on this page",
                    matching.len(),
                    page.incidents.len()
                )),
            );
        }

        let fetched = page.incidents.len() as u64;
        let total = page.pagination_meta.total_record_count.unwrap_or(0);
        add_pagination_status(&mut response, fetched, total, page.pagination_meta.after.as_deref());

        debug!(
            fetched,
            total,
            matching = matching.len(),
            "Listed incidents"
        );
        format_json_response(&Value::Object(response), self.max_response_size)
    }
}

/// Spell out whether another page is needed; callers tend to stop at page one.
fn add_pagination_status(
    response: &mut Map<String, Value>,
    fetched: u64,
    total: u64,
    after: Option<&str>,
) {
    if fetched < total {
        let percent = fetched as f64 / total as f64 * 100.0;
        let after = after.unwrap_or_default();
        response.insert("has_more_results".into(), json!(true));
        response.insert(
            "pagination_progress".into(),
            json!({
                "records_fetched": fetched,
                "total_records": total,
                "remaining": total - fetched,
                "progress_percent": format!("{:.1}%", percent),
            }),
        );
        response.insert(
            "FETCH_NEXT_PAGE".into(),
            json!({
                "action": "REQUIRED - You must call list_incidents again to get remaining results",
                "after": after,
                "message": format!(
                    "Fetched {} of {} incidents ({:.1}%). Call list_incidents again with after='{}' plus same filters. Repeat until has_more_results=false.",
                    fetched, total, percent, after
                ),
            }),
        );
    } else {
        response.insert("has_more_results".into(), json!(false));
        response.insert(
            "pagination_progress".into(),
            json!({
                "records_fetched": fetched,
                "total_records": total,
                "remaining": 0,
                "progress_percent": "100.0%",
            }),
        );
        response.insert(
            "pagination_status".into(),
            json!(format!("COMPLETE - All {} incidents fetched", total)),
        );
    }
}

// ============================================================================
// get_incident
// ============================================================================

pub struct GetIncidentTool {
    client: IncidentIoClient,
}

impl GetIncidentTool {
    pub fn new(client: IncidentIoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetIncidentTool {
    fn name(&self) -> &'static str {
        "get_incident"
    }

    fn description(&self) -> &'static str {
        "Get details of a specific incident by ID or reference.\n\n\
         ACCEPTS BOTH:\n\
         - Full incident ID: '01K3VHM0T0ZTMG9JPJ9GESB7XX'\n\
         - Short reference: '1691' (just the number from INC-1691)\n\n\
         The response contains the full incident ID that other tools require."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "incident_id": {
                    "type": "string",
                    "description": "The incident ID or reference number (1691 from INC-1691)."
                }
            },
            "required": ["incident_id"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let id = require_string_arg(args, "incident_id")?;
        let incident = self.client.get_incident(&id, cancel).await?;
        format_pretty(&incident)
    }
}

// ============================================================================
// create_incident
// ============================================================================

pub struct CreateIncidentTool {
    client: IncidentIoClient,
}

impl CreateIncidentTool {
    pub fn new(client: IncidentIoClient) -> Self {
        Self { client }
    }

    fn request(args: &Arguments) -> Result<CreateIncidentRequest, ToolError> {
        let name = args
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("name parameter is required".to_string()))?;

        let mut request = CreateIncidentRequest::new(name);
        request.summary = string_arg(args, "summary");
        request.incident_status_id = string_arg(args, "incident_status_id");
        request.severity_id = string_arg(args, "severity_id");
        request.incident_type_id = string_arg(args, "incident_type_id");
        request.slack_channel_name_override = string_arg(args, "slack_channel_name_override");
        if let Some(mode) = string_arg(args, "mode") {
            request.mode = mode;
        }
        if let Some(visibility) = string_arg(args, "visibility") {
            request.visibility = visibility;
        }
        Ok(request)
    }
}

/// Hints for fields the API would otherwise fill with account defaults.
fn missing_field_suggestions(request: &CreateIncidentRequest) -> Vec<&'static str> {
    let mut suggestions = Vec::new();
    if request.severity_id.is_none() {
        suggestions.push("severity_id is not set. Use list_severities to see available options.");
    }
    if request.incident_type_id.is_none() {
        suggestions
            .push("incident_type_id is not set. The account's default incident type will be used.");
    }
    if request.incident_status_id.is_none() {
        suggestions.push(
            "incident_status_id is not set. The account's default initial status will be used.",
        );
    }
    suggestions
}

#[async_trait]
impl Tool for CreateIncidentTool {
    fn name(&self) -> &'static str {
        "create_incident"
    }

    fn description(&self) -> &'static str {
        "Create a new incident in incident.io"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "The incident name/title"},
                "summary": {"type": "string", "description": "A summary of the incident"},
                "severity_id": {"type": "string", "description": "The severity ID"},
                "incident_type_id": {"type": "string", "description": "The incident type ID"},
                "incident_status_id": {"type": "string", "description": "The incident status ID"},
                "mode": {
                    "type": "string",
                    "description": "The incident mode (standard, retrospective, tutorial)",
                    "enum": ["standard", "retrospective", "tutorial"],
                    "default": "standard"
                },
                "visibility": {
                    "type": "string",
                    "description": "The incident visibility (public, private)",
                    "enum": ["public", "private"],
                    "default": "public"
                },
                "slack_channel_name_override": {
                    "type": "string",
                    "description": "Override the auto-generated Slack channel name"
                }
            },
            "required": ["name"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let request = Self::request(args)?;
        let suggestions = missing_field_suggestions(&request);

        let incident = match self.client.create_incident(&request, cancel).await {
            Ok(incident) => incident,
            Err(err) => {
                let message = err.to_string();
                let about_missing_field = ["severity", "incident_type", "incident_status"]
                    .iter()
                    .any(|field| message.contains(field));
                if !suggestions.is_empty() && about_missing_field {
                    return Err(ToolError::Message(format!(
                        "{}\n\nSuggestions:\n{}",
                        message,
                        suggestions.join("\n")
                    )));
                }
                return Err(err.into());
            }
        };

        let rendered = format_pretty(&incident)?;
        if suggestions.is_empty() {
            Ok(rendered)
        } else {
            Ok(format!(
                "{}\n\nNote: Incident created with defaults. {}",
                rendered,
                suggestions.join(" ")
            ))
        }
    }
}

// ============================================================================
// update_incident
// ============================================================================

pub struct UpdateIncidentTool {
    client: IncidentIoClient,
}

impl UpdateIncidentTool {
    pub fn new(client: IncidentIoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UpdateIncidentTool {
    fn name(&self) -> &'static str {
        "update_incident"
    }

    fn description(&self) -> &'static str {
        "Update an existing incident"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "incident_id": {"type": "string", "description": "The incident ID to update"},
                "name": {"type": "string", "description": "Update the incident name"},
                "summary": {"type": "string", "description": "Update the incident summary"},
                "incident_status_id": {"type": "string", "description": "Update the incident status ID"},
                "severity_id": {"type": "string", "description": "Update the severity ID"}
            },
            "required": ["incident_id"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let id = require_string_arg(args, "incident_id")?;

        let field = |key: &str| args.get(key).and_then(Value::as_str).map(str::to_string);
        let update = UpdateIncidentRequest {
            name: field("name"),
            summary: field("summary"),
            incident_status_id: field("incident_status_id"),
            severity_id: field("severity_id"),
        };
        if update.is_empty() {
            return Err(ToolError::InvalidArgument(
                "at least one field to update must be provided".to_string(),
            ));
        }

        let incident = self.client.update_incident(&id, &update, cancel).await?;
        format_pretty(&incident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_options_defaults_and_clamp() {
        let options = ListIncidentsTool::options(&Arguments::new());
        assert_eq!(options.page_size, Some(25));
        assert!(options.status.is_empty());

        let options = ListIncidentsTool::options(&args(json!({"page_size": 500})));
        assert_eq!(options.page_size, Some(100));
    }

    #[test]
    fn test_options_custom_field_needs_both_parts() {
        let options =
            ListIncidentsTool::options(&args(json!({"custom_field_id": "cf_1"})));
        assert!(options.custom_field_one_of.is_empty());

        let options = ListIncidentsTool::options(&args(json!({
            "custom_field_id": "cf_1",
            "custom_field_value": "opt_9",
            "status": ["active"],
            "severity_gte": "sev_2"
        })));
        assert_eq!(
            options.custom_field_one_of,
            vec![("cf_1".to_string(), "opt_9".to_string())]
        );
        assert_eq!(options.status, vec!["active"]);
        assert_eq!(options.severity_gte.as_deref(), Some("sev_2"));
    }

    #[test]
    fn test_pagination_status_more_pages() {
        let mut response = Map::new();
        add_pagination_status(&mut response, 25, 100, Some("01ABC"));

        assert_eq!(response["has_more_results"], true);
        assert_eq!(response["pagination_progress"]["remaining"], 75);
        assert_eq!(response["pagination_progress"]["progress_percent"], "25.0%");
        assert_eq!(response["FETCH_NEXT_PAGE"]["after"], "01ABC");
        assert!(
            response["FETCH_NEXT_PAGE"]["message"]
                .as_str()
                .unwrap()
                .contains("after='01ABC'")
        );
    }

    #[test]
    fn test_pagination_status_complete() {
        let mut response = Map::new();
        add_pagination_status(&mut response, 3, 3, None);

        assert_eq!(response["has_more_results"], false);
        assert_eq!(response["pagination_status"], "COMPLETE - All 3 incidents fetched");
        assert!(response.get("FETCH_NEXT_PAGE").is_none());
    }

    #[test]
    fn test_create_request_from_args() {
        let request = CreateIncidentTool::request(&args(json!({
            "name": "Checkout errors",
            "severity_id": "sev_1",
            "visibility": "private"
        })))
        .unwrap();

        assert_eq!(request.name, "Checkout errors");
        assert_eq!(request.mode, "standard");
        assert_eq!(request.visibility, "private");
        assert_eq!(missing_field_suggestions(&request).len(), 2);

        assert!(CreateIncidentTool::request(&args(json!({"summary": "x"}))).is_err());
    }

    #[test]
    fn test_summary_from_incident() {
        let incident: Incident = serde_json::from_value(json!({
            "id": "01H",
            "reference": "INC-7",
            "name": "API latency",
            "permalink": "https://app.incident.io/incidents/7",
            "incident_status": {"id": "st", "name": "Investigating"},
            "created_at": "2025-01-28T10:00:00Z"
        }))
        .unwrap();

        let summary = IncidentSummary::from(&incident);
        assert_eq!(summary.status, "Investigating");
        assert_eq!(summary.severity, "");
        assert_eq!(summary.created_at, "2025-01-28T10:00:00Z");
        assert_eq!(summary.updated_at, "");
    }
}
