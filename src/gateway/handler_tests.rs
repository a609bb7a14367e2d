use axum::{Router, body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use crate::clock::SystemClock;
use crate::embedding::MockEmbedder;
use crate::gate::{ContentModerationGate, EscalationPolicy};
use crate::gateway::state::HandlerState;
use crate::gateway::{STATUS_HEADER, USER_ID_HEADER, create_router_with_state};
use crate::ids::QuestionId;
use crate::ledger::InMemoryLedger;
use crate::notify::InMemoryNotificationSink;
use crate::relevance::{CommunityRelevanceAdvisor, RelevanceConfig, RelevanceScorer};
use crate::store::{Community, InMemoryCommunityDirectory, InMemoryQuestionStore, QuestionSummary};
use crate::toxicity::{MockToxicityClassifier, ToxicityConfig, ToxicityScorer};

struct TestApp {
    router: Router,
    embedder: Arc<MockEmbedder>,
    classifier: Arc<MockToxicityClassifier>,
}

fn setup() -> TestApp {
    let embedder = Arc::new(
        MockEmbedder::new()
            .with_topic("development", &["git", "python", "programming", "compiler"])
            .with_topic("gaming", &["game", "zelda", "console"]),
    );
    let directory = Arc::new(InMemoryCommunityDirectory::with_communities([
        Community::new(
            "dev",
            "Development",
            "Software programming, git and compiler questions",
        ),
        Community::new("games", "Gaming", "Video game talk: zelda, console hardware"),
    ]));
    let questions = Arc::new(InMemoryQuestionStore::with_questions([QuestionSummary {
        id: QuestionId::new("q1"),
        community_id: "dev".into(),
        title: "Undo a git commit".to_string(),
        body: "I committed to the wrong branch.".to_string(),
    }]));
    let config = RelevanceConfig::default();
    let scorer = Arc::new(RelevanceScorer::new(
        embedder.clone(),
        config.reference_cache_capacity,
        config.timeout,
    ));
    let advisor = Arc::new(CommunityRelevanceAdvisor::new(
        scorer, directory, questions, config,
    ));

    let classifier = Arc::new(
        MockToxicityClassifier::new().with_rule("idiot", &[("toxicity", 0.95), ("insult", 0.7)]),
    );
    let toxicity =
        Arc::new(ToxicityScorer::new(classifier.clone(), ToxicityConfig::stub()).unwrap());

    let clock = Arc::new(SystemClock);
    let gate = Arc::new(ContentModerationGate::new(
        advisor,
        toxicity,
        Arc::new(InMemoryLedger::new(clock.clone())),
        Arc::new(InMemoryNotificationSink::new()),
        clock,
        EscalationPolicy::default(),
    ));

    TestApp {
        router: create_router_with_state(HandlerState::new(gate)),
        embedder,
        classifier,
    }
}

async fn post_json(
    router: &Router,
    uri: &str,
    user: Option<&str>,
    body: serde_json::Value,
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn get(router: &Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn status_header(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(STATUS_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn moderate_body(community: &str, text: &str) -> serde_json::Value {
    serde_json::json!({ "community_id": community, "text": text })
}

mod moderate_tests {
    use super::*;

    #[tokio::test]
    async fn test_accepted() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/moderate",
            Some("alice"),
            moderate_body("dev", "How do I use Git for version control?"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(status_header(&response), "accepted");
        let json = body_json(response).await;
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["text"], "How do I use Git for version control?");
    }

    #[tokio::test]
    async fn test_inappropriate() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/moderate",
            Some("alice"),
            moderate_body("dev", "git rebase is for idiots"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["status"], "rejected_inappropriate");
        assert_eq!(json["attempts_left"], 4);
        assert_eq!(json["categories"], serde_json::json!(["toxicity", "insult"]));
    }

    #[tokio::test]
    async fn test_off_topic() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/moderate",
            Some("alice"),
            moderate_body("dev", "Best zelda game?"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["status"], "rejected_off_topic");
        assert_eq!(json["suggested_community"]["id"], "games");
        assert_eq!(json["suggested_community"]["name"], "Gaming");
    }

    #[tokio::test]
    async fn test_ban_is_forbidden() {
        let app = setup();
        for _ in 0..4 {
            post_json(
                &app.router,
                "/v1/moderate",
                Some("alice"),
                moderate_body("dev", "git rebase is for idiots"),
            )
            .await;
        }
        let response = post_json(
            &app.router,
            "/v1/moderate",
            Some("alice"),
            moderate_body("dev", "git rebase is for idiots"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["status"], "rejected_banned");
        assert!(json["expires_at"].is_string());

        let response = get(&app.router, "/v1/communities/dev/bans").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json[0]["user_id"], "alice");
        assert_eq!(json[0]["ban_count"], 1);
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthorized() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/moderate",
            None,
            moderate_body("dev", "How do I use Git?"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(status_header(&response), "unauthenticated");
        assert_eq!(app.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_community_is_not_found() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/moderate",
            Some("alice"),
            moderate_body("cooking", "How long do I knead dough?"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "community_not_found");
    }

    #[tokio::test]
    async fn test_scoring_failure_is_unavailable() {
        let app = setup();
        app.classifier.set_failing(true);
        let response = post_json(
            &app.router,
            "/v1/moderate",
            Some("alice"),
            moderate_body("dev", "How do I use Git?"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["kind"], "scoring_unavailable");
        assert_eq!(json["retryable"], true);
    }

    #[tokio::test]
    async fn test_schema_errors() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/moderate",
            Some("alice"),
            serde_json::json!({ "text": "no community" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(status_header(&response), "invalid_request");

        let response = post_json(
            &app.router,
            "/v1/moderate",
            Some("alice"),
            moderate_body("dev", "   "),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["kind"], "invalid_submission");
    }
}

mod advisory_tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_content() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/validate-content",
            Some("alice"),
            serde_json::json!({ "community_id": "dev", "content": "git reflog saved me" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["is_relevant"], true);
        assert_eq!(json["similar_questions"][0]["id"], "q1");
        assert_eq!(app.classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_validate_content_requires_fields() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/validate-content",
            Some("alice"),
            serde_json::json!({ "community_id": "dev", "content": "" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post_json(
            &app.router,
            "/v1/validate-content",
            Some("alice"),
            serde_json::json!({ "community_id": "nowhere", "content": "git" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recommendations() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/recommendations",
            None,
            serde_json::json!({ "query": "zelda console", "top_k": 2 }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["type"], "community");
        assert_eq!(items[0]["id"], "games");
    }

    #[tokio::test]
    async fn test_recommendations_reject_bad_top_k() {
        let app = setup();
        let response = post_json(
            &app.router,
            "/v1/recommendations",
            None,
            serde_json::json!({ "query": "git", "top_k": 0 }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bans_for_unknown_community() {
        let app = setup();
        let response = get(&app.router, "/v1/communities/nowhere/bans").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_healthz() {
        let app = setup();
        let response = get(&app.router, "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(status_header(&response), "healthy");
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready_reports_modes() {
        let app = setup();
        let response = get(&app.router, "/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["components"]["embedder_mode"], "stub");
        assert_eq!(json["components"]["classifier_mode"], "stub");
    }
}
