pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::captioning::handlers as captions;
use crate::catalog::handlers as catalog;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Catalog API
        .route("/api/v1/memes", get(catalog::handle_list_memes))
        .route("/api/v1/memes/:id", get(catalog::handle_get_meme))
        // Caption API
        .route(
            "/api/v1/memes/:id/captions",
            post(captions::handle_generate_caption),
        )
        .route(
            "/api/v1/memes/:id/captions/upload",
            post(captions::handle_upload_caption),
        )
        .layer(body_limit)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::captioning::pipeline::PipelineConfig;
    use crate::captioning::retry::RetryPolicy;
    use crate::models::meme::MemeTemplate;
    use crate::testing::{meme_fixture, InMemoryCatalog, ScriptedLlm};

    fn app(memes: Vec<MemeTemplate>, llm: ScriptedLlm) -> (Router, Arc<ScriptedLlm>) {
        let llm = Arc::new(llm);
        let state = AppState {
            catalog: Arc::new(InMemoryCatalog::new(memes)),
            llm: llm.clone(),
            pipeline: PipelineConfig {
                retry: RetryPolicy::immediate(2),
                ..PipelineConfig::default()
            },
            max_upload_bytes: 64 * 1024,
        };
        (build_router(state), llm)
    }

    fn ok_llm() -> ScriptedLlm {
        ScriptedLlm::new(|_| {
            Ok(json!({ "top_caption": "tabs", "bottom_caption": "spaces" }).to_string())
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(vec![], ok_llm());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_and_get_meme() {
        let meme = meme_fixture("disaster-girl", "Disaster / Subject");
        let id = meme.id;
        let (app, _) = app(vec![meme], ok_llm());

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/memes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["memes"].as_array().unwrap().len(), 1);

        let response = app
            .oneshot(
                Request::get(format!("/api/v1/memes/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["display_name"], "disaster girl");
        assert_eq!(body["rules"][0], "Keep it about the group");
        assert_eq!(body["caption_fields"][0]["name"], "disaster");
        assert_eq!(body["text_placements"][1]["x"], 1330);
    }

    #[tokio::test]
    async fn test_unknown_meme_is_404() {
        let (app, llm) = app(vec![], ok_llm());
        let response = app
            .oneshot(
                Request::post(format!("/api/v1/memes/{}/captions", uuid::Uuid::new_v4()))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "context": "hi" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_caption_from_json() {
        let meme = meme_fixture("drake-hotline-bling", "Top Caption / Bottom Caption");
        let id = meme.id;
        let (app, llm) = app(vec![meme], ok_llm());

        let response = app
            .oneshot(
                Request::post(format!("/api/v1/memes/{id}/captions"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "context": "alice: tabs\nbob: spaces" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["caption"]["top_caption"], "tabs");
        assert_eq!(body["text"], "tabs / spaces");
        assert_eq!(body["chunks"], 1);
        assert_eq!(body["consolidated"], false);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_context_is_400() {
        let meme = meme_fixture("drake-hotline-bling", "Top Caption / Bottom Caption");
        let id = meme.id;
        let (app, llm) = app(vec![meme], ok_llm());

        let response = app
            .oneshot(
                Request::post(format!("/api/v1/memes/{id}/captions"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "context": "  \n " }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_is_502() {
        let meme = meme_fixture("drake-hotline-bling", "Top Caption / Bottom Caption");
        let id = meme.id;
        let (app, llm) = app(vec![meme], ScriptedLlm::new(|_| Ok("nope".to_string())));

        let response = app
            .oneshot(
                Request::post(format!("/api/v1/memes/{id}/captions"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "context": "hello" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"]["code"], "GENERATION_FAILED");
        assert_eq!(llm.call_count(), 2);
    }

    fn multipart_request(id: uuid::Uuid, field: &str, content: &[u8]) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"chat.txt\"\r\nContent-Type: text/plain\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::post(format!("/api/v1/memes/{id}/captions/upload"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_text_file() {
        let meme = meme_fixture("drake-hotline-bling", "Top Caption / Bottom Caption");
        let id = meme.id;
        let (app, llm) = app(vec![meme], ok_llm());

        let response = app
            .oneshot(multipart_request(id, "file", b"alice: lunch?\nbob: again?"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["caption"]["bottom_caption"], "spaces");
        assert!(llm.user_prompts()[0].contains("alice: lunch?\nbob: again?"));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_utf8_and_missing_field() {
        let meme = meme_fixture("drake-hotline-bling", "Top Caption / Bottom Caption");
        let id = meme.id;
        let (app, llm) = app(vec![meme], ok_llm());

        let response = app
            .clone()
            .oneshot(multipart_request(id, "file", &[0xff, 0xfe, 0x00]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(multipart_request(id, "attachment", b"hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_long_context_is_chunked_and_consolidated() {
        let meme = meme_fixture("drake-hotline-bling", "Top Caption / Bottom Caption");
        let id = meme.id;
        let (app, llm) = app(vec![meme], ok_llm());
        let context = (1..=1200)
            .map(|i| format!("user{}: message {i}", i % 7))
            .collect::<Vec<_>>()
            .join("\n");

        let response = app
            .oneshot(
                Request::post(format!("/api/v1/memes/{id}/captions"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "context": context }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["chunks"], 3);
        assert_eq!(body["consolidated"], true);
        assert_eq!(body["llm_calls"], 4);
        assert_eq!(llm.call_count(), 4);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413() {
        let meme = meme_fixture("drake-hotline-bling", "Top Caption / Bottom Caption");
        let id = meme.id;
        let (app, llm) = app(vec![meme], ok_llm());
        let too_big = vec![b'a'; 128 * 1024];

        let response = app
            .oneshot(multipart_request(id, "file", &too_big))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(llm.call_count(), 0);
    }
}
