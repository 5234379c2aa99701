//! Integration tests for git-issue-tracker
//!
//! These tests drive the public API against a mock upstream, from config
//! loading through the adapters and the REST dispatch layer.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use git_issue_tracker::config::{ProviderSettings, TrackerConfig};
use git_issue_tracker::server::IssueServer;
use git_issue_tracker::{
    GitHubAdapter, GitLabAdapter, IssueLister, IssueRequest, IssueResponse, IssueStatus,
    IssueTracker, TrackerError,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config with inline tokens, both providers pointed at the mock server
fn config_for(server: &MockServer) -> TrackerConfig {
    let mut config = TrackerConfig::new();
    config.git_services.github = ProviderSettings::default()
        .with_token("fake-token")
        .with_api_url(server.uri());
    config.git_services.gitlab = ProviderSettings::default()
        .with_token("fake-token")
        .with_api_url(server.uri());
    config
}

mod github_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_issue_returns_open_issue() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/owner/repo/issues"))
            .and(header("authorization", "Bearer fake-token"))
            .and(body_json(json!({"title": "Test issue", "body": "Test desc"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 1,
                "html_url": "https://github.com/owner/repo/issues/1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let github = GitHubAdapter::from_config(&config_for(&server)).unwrap();
        let response = github
            .create_issue("owner/repo", &IssueRequest::new("Test issue", "Test desc"))
            .await
            .unwrap();

        assert_eq!(
            response,
            IssueResponse::new(
                1,
                Some("https://github.com/owner/repo/issues/1".to_string()),
                IssueStatus::Open
            )
        );
    }

    #[tokio::test]
    async fn test_update_then_close() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/owner/repo/issues/1"))
            .and(body_json(json!({"title": "Updated title", "body": "Updated desc"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": 1,
                "html_url": "https://github.com/owner/repo/issues/1",
                "state": "open"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/owner/repo/issues/1"))
            .and(body_json(json!({"state": "closed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": 1,
                "state": "closed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let github = GitHubAdapter::from_config(&config_for(&server)).unwrap();

        let updated = github
            .update_issue(
                "owner/repo",
                1,
                &IssueRequest::new("Updated title", "Updated desc"),
            )
            .await
            .unwrap();
        assert_eq!(updated.issue_number, 1);
        assert_eq!(updated.status, IssueStatus::Open);

        assert!(github.close_issue("owner/repo", 1).await);
    }

    #[tokio::test]
    async fn test_upstream_rejection_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/owner/repo/issues"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let github = GitHubAdapter::from_config(&config_for(&server)).unwrap();
        let err = github
            .create_issue("owner/repo", &IssueRequest::new("t", "d"))
            .await
            .unwrap_err();

        assert_eq!(err.upstream_status(), Some(401));
    }
}

mod gitlab_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_issue_uses_iid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/repo/issues"))
            .and(body_json(json!({"title": "GitLab test", "description": "Some desc"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 9001,
                "iid": 101,
                "web_url": "https://gitlab.com/repo/issues/101"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gitlab = GitLabAdapter::from_config(&config_for(&server)).unwrap();
        let response = gitlab
            .create_issue("repo", &IssueRequest::new("GitLab test", "Some desc"))
            .await
            .unwrap();

        assert_eq!(response.issue_number, 101);
        assert_eq!(
            response.url.as_deref(),
            Some("https://gitlab.com/repo/issues/101")
        );
        assert_eq!(response.status, IssueStatus::Open);
    }

    #[tokio::test]
    async fn test_close_issue() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/projects/repo/issues/5"))
            .and(body_json(json!({"state_event": "close"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iid": 5,
                "state": "closed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gitlab = GitLabAdapter::from_config(&config_for(&server)).unwrap();
        assert!(gitlab.close_issue("repo", 5).await);
    }

    #[tokio::test]
    async fn test_list_issues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/42/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"iid": 3, "web_url": "https://gitlab.com/g/p/-/issues/3", "state": "opened"},
                {"iid": 1, "web_url": "https://gitlab.com/g/p/-/issues/1", "state": "closed"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let gitlab = GitLabAdapter::from_config(&config_for(&server)).unwrap();
        let issues = gitlab.list_issues("42").await.unwrap();

        let summary: Vec<(u64, IssueStatus)> =
            issues.iter().map(|i| (i.issue_number, i.status)).collect();
        assert_eq!(
            summary,
            vec![(3, IssueStatus::Open), (1, IssueStatus::Closed)]
        );
    }
}

mod config_tests {
    use super::*;

    #[tokio::test]
    async fn test_adapters_from_config_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/owner/repo/issues"))
            .and(header("authorization", "Bearer file-token"))
            .and(header("user-agent", "IntegrationTest/1.0"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 12,
                "html_url": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            format!(
                "git_services:\n  github:\n    token: file-token\n    api_url: {}/\nhttp:\n  user_agent: IntegrationTest/1.0\n",
                server.uri()
            ),
        )
        .unwrap();

        let config = TrackerConfig::load(&config_path).unwrap();
        let github = GitHubAdapter::from_config(&config).unwrap();
        assert_eq!(github.rest_base_url(), server.uri());

        let response = github
            .create_issue("owner/repo", &IssueRequest::new("t", "d"))
            .await
            .unwrap();
        assert_eq!(response.issue_number, 12);
        assert_eq!(response.url, None);
    }

    #[test]
    fn test_token_from_named_env_var() {
        let settings = ProviderSettings {
            token_env: Some("TRACKER_IT_GITLAB_TOKEN".to_string()),
            ..Default::default()
        };

        temp_env::with_var("TRACKER_IT_GITLAB_TOKEN", Some("from-env"), || {
            assert!(GitLabAdapter::new(&settings, &Default::default()).is_ok());
        });

        temp_env::with_vars_unset(["TRACKER_IT_GITLAB_TOKEN", "GITLAB_TOKEN"], || {
            let err = GitLabAdapter::new(&settings, &Default::default()).err();
            assert!(matches!(err, Some(TrackerError::Config(_))));
        });
    }
}

mod server_tests {
    use super::*;

    fn router(config: &TrackerConfig) -> axum::Router {
        let github = GitHubAdapter::from_config(config).unwrap();
        let gitlab = GitLabAdapter::from_config(config).unwrap();
        IssueServer::new(Arc::new(github), Arc::new(gitlab)).into_router()
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_encoded_repository_decoded_for_github_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/owner/repo/issues"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 1,
                "html_url": "https://github.com/owner/repo/issues/1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/projects/owner%2Frepo/issues"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "iid": 7,
                "web_url": "https://gitlab.com/owner/repo/-/issues/7"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = router(&config_for(&server));
        let body = json!({"title": "t", "description": "d"});

        let response = app
            .clone()
            .oneshot(post("/api/issues/github/owner%2Frepo", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(post("/api/issues/gitlab/owner%2Frepo", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let created: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(created["issueNumber"], 7);
        assert_eq!(created["status"], "Open");
    }

    #[tokio::test]
    async fn test_failed_close_maps_to_500() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/owner/repo/issues/9"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let response = router(&config_for(&server))
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/issues/github/owner%2Frepo/9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
