//! Integration tests for incidentio-api against a mock incident.io server

use bytes::Bytes;
use incidentio_api::{
    ApiError, CreateIncidentRequest, IncidentIoClient, ListIncidentsOptions, ListWorkflowsParams,
    SEVERITIES_CACHE_KEY, UpdateIncidentRequest, UpdateWorkflowRequest, severity_cache_key,
};
use incidentio_cache::TtlCache;
use incidentio_http_client::{
    HttpClientConfig, ReqwestTransport, RequestExecutor, RetryPolicy,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> IncidentIoClient {
    let config = HttpClientConfig::builder().api_key("test-api-key").build();
    let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
    let executor = RequestExecutor::builder(transport, format!("{}/v2", server.uri()))
        .retry_policy(RetryPolicy::exponential(2, Duration::from_millis(5)))
        .build();
    let cache = Arc::new(TtlCache::<Bytes>::new(Duration::from_secs(300)));

    IncidentIoClient::new(Arc::new(executor), cache, format!("{}/v1", server.uri()))
}

fn severity(id: &str, name: &str, rank: i64) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{} impact", name),
        "rank": rank,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn workflow(id: &str, enabled: bool, state: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Test Workflow",
        "trigger": {"name": "incident.created", "label": "Incident created"},
        "enabled": enabled,
        "state": state,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-02T00:00:00Z"
    })
}

fn incident(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "reference": "INC-42",
        "name": name,
        "permalink": "https://app.incident.io/incidents/42",
        "incident_status": {"id": "st_active", "name": "Active"},
        "severity": severity("sev_1", "Critical", 1),
        "created_at": "2025-01-28T10:00:00Z",
        "updated_at": "2025-01-28T11:00:00Z"
    })
}

#[tokio::test]
async fn test_list_severities_uses_v1_and_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/severities"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "severities": [severity("sev_1", "Critical", 1), severity("sev_2", "Minor", 3)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let cancel = CancellationToken::new();

    let first = client.list_severities(&cancel).await.unwrap();
    let second = client.list_severities(&cancel).await.unwrap();

    assert_eq!(first.severities.len(), 2);
    assert_eq!(first, second);
    assert_eq!(first.severities[0].name, "Critical");
    assert!(client.cache().get(SEVERITIES_CACHE_KEY).is_some());
}

#[tokio::test]
async fn test_get_severity_cached_per_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/severities/sev_2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"severity": severity("sev_2", "Minor", 3)})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let cancel = CancellationToken::new();

    for _ in 0..3 {
        let severity = client.get_severity("sev_2", &cancel).await.unwrap();
        assert_eq!(severity.rank, 3);
    }
    assert!(client.cache().get(&severity_cache_key("sev_2")).is_some());
}

#[tokio::test]
async fn test_undecodable_body_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/severities"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let cancel = CancellationToken::new();

    for _ in 0..2 {
        let error = client.list_severities(&cancel).await.unwrap_err();
        assert!(matches!(error, ApiError::Decode { .. }));
    }
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_list_incidents_sends_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/incidents"))
        .and(query_param("page_size", "25"))
        .and(query_param("status[one_of]", "active"))
        .and(query_param("created_at[gte]", "2025-01-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "incidents": [incident("01H", "Database outage")],
            "pagination_meta": {"after": "01H", "page_size": 25, "total_record_count": 40}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let options = ListIncidentsOptions {
        page_size: Some(25),
        status: vec!["active".into()],
        created_at_gte: Some("2025-01-28".into()),
        ..Default::default()
    };

    let page = client
        .list_incidents(&options, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.incidents.len(), 1);
    assert_eq!(page.incidents[0].reference, "INC-42");
    assert_eq!(page.pagination_meta.total_record_count, Some(40));
    assert_eq!(page.pagination_meta.after.as_deref(), Some("01H"));
}

#[tokio::test]
async fn test_get_incident_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/incidents/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "Incident not found", "code": "not_found"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let error = client
        .get_incident("missing", &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(error.status_code(), Some(404));
    assert!(error.to_string().contains("Incident not found"));
}

#[tokio::test]
async fn test_ids_stay_inside_their_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/incidents/a%2F..%2Fb%3Fx%3D1%23y"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "Incident not found", "code": "not_found"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let cancel = CancellationToken::new();

    let error = client.get_incident("a/../b?x=1#y", &cancel).await.unwrap_err();
    assert_eq!(error.status_code(), Some(404));

    for id in [".", ".."] {
        let error = client.get_workflow(id, &cancel).await.unwrap_err();
        assert!(matches!(error, ApiError::InvalidArgument(_)), "{}", error);
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_incident_posts_idempotency_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/incidents"))
        .and(body_partial_json(json!({
            "name": "Checkout errors",
            "mode": "standard",
            "visibility": "public",
            "severity_id": "sev_1"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"incident": incident("01N", "Checkout errors")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut request = CreateIncidentRequest::new("Checkout errors");
    request.severity_id = Some("sev_1".into());

    let created = client
        .create_incident(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(created.id, "01N");

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body["idempotency_key"].as_str().unwrap().starts_with("mcp-"));
}

#[tokio::test]
async fn test_update_incident_wraps_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v2/incidents/01H"))
        .and(body_json(json!({"incident": {"summary": "Mitigated"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"incident": incident("01H", "Database outage")})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let update = UpdateIncidentRequest {
        summary: Some("Mitigated".into()),
        ..Default::default()
    };

    let updated = client
        .update_incident("01H", &update, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(updated.id, "01H");
}

#[tokio::test]
async fn test_empty_update_rejected_without_request() {
    let server = MockServer::start().await;
    let client = client(&server);

    let error = client
        .update_incident("01H", &UpdateIncidentRequest::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::InvalidArgument(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_workflows_parses_trigger_and_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/workflows"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workflows": [workflow("wf_123", true, "active"), workflow("wf_456", false, "disabled")],
            "pagination_info": {"page_size": 10}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let params = ListWorkflowsParams {
        page_size: Some(10),
        ..Default::default()
    };

    let list = client
        .list_workflows(Some(&params), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(list.workflows.len(), 2);
    assert_eq!(list.workflows[0].trigger.name, "incident.created");
    assert_eq!(list.workflows[0].trigger.label, "Incident created");
    assert_eq!(list.workflows[1].state.as_deref(), Some("disabled"));
}

#[tokio::test]
async fn test_update_workflow_patch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v2/workflows/wf_123"))
        .and(body_json(json!({"enabled": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"workflow": workflow("wf_123", false, "disabled")})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let update = UpdateWorkflowRequest {
        enabled: Some(false),
        ..Default::default()
    };

    let workflow = client
        .update_workflow("wf_123", &update, &CancellationToken::new())
        .await
        .unwrap();
    assert!(!workflow.enabled);
    assert_eq!(workflow.state.as_deref(), Some("disabled"));
}

#[tokio::test]
async fn test_health_reports_components() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/workflows/wf_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"workflow": workflow("wf_123", true, "active")})))
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .get_workflow("wf_123", &CancellationToken::new())
        .await
        .unwrap();

    let health = client.health();
    assert!(health.healthy);
    assert_eq!(health.circuit_breaker.state, "closed");
    assert_eq!(health.circuit_breaker.successes, 1);
    assert_eq!(health.rate_limiter.request_count, 1);
    assert_eq!(health.cache_entries, 0);
}
