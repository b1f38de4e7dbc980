mod chain;
mod entries;
pub mod errors;
mod health;
pub mod models;
mod sessions;

use actix_web::web::{self, ServiceConfig};

pub use errors::ApiError;
pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(sessions::create_session)
            .service(sessions::delete_session)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::get_difficulty)
            .service(chain::set_difficulty)
            .service(entries::post_entry)
            .service(entries::mine_pending),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use crate::config::Config;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(Config {
            difficulty: 2,
            ..Config::default()
        }))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(init_routes)).await
        };
    }

    macro_rules! new_session {
        ($app:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/v1/sessions/")
                .set_json($body)
                .to_request();
            let resp: Value = test::call_and_read_body_json(&$app, req).await;
            resp["session_id"].as_str().expect("session id").to_string()
        }};
    }

    #[actix_web::test]
    async fn health_is_up() {
        let state = state();
        let app = app!(state);
        let req = test::TestRequest::get().uri("/api/v1/health/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn instant_session_seals_each_entry() {
        let state = state();
        let app = app!(state);
        let id = new_session!(app, json!({}));

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/entries/"))
            .set_json(json!({ "author": "Ada", "text": "Learned proof of work" }))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["status"], "sealed");
        assert_eq!(resp["block"]["index"], 1);
        assert!(resp["block"]["hash"].as_str().unwrap().starts_with("00"));

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/sessions/{id}/chain/"))
            .to_request();
        let chain: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(chain["length"], 2);
        assert_eq!(chain["blocks"][0]["index"], 1);
        assert_eq!(chain["blocks"][0]["previous_hash"], chain["blocks"][1]["hash"]);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/sessions/{id}/validate/"))
            .to_request();
        let valid: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(valid["valid"], true);
        assert_eq!(valid["reason"], Value::Null);
    }

    #[actix_web::test]
    async fn blank_entry_is_a_bad_request() {
        let state = state();
        let app = app!(state);
        let id = new_session!(app, json!({}));

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/entries/"))
            .set_json(json!({ "text": "   " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn batched_session_stages_then_mines() {
        let state = state();
        let app = app!(state);
        let id = new_session!(app, json!({ "mode": "batched", "difficulty": 1 }));

        for text in ["one", "two"] {
            let req = test::TestRequest::post()
                .uri(&format!("/api/v1/sessions/{id}/entries/"))
                .set_json(json!({ "author": "Ada", "text": text }))
                .to_request();
            let resp: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(resp["status"], "staged");
        }

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/mine/"))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["block"]["index"], 1);
        assert_eq!(resp["block"]["payload"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/mine/"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn difficulty_can_be_read_and_bounded() {
        let state = state();
        let app = app!(state);
        let id = new_session!(app, json!({}));

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/difficulty/"))
            .set_json(json!({ "difficulty": 1 }))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["difficulty"], 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/sessions/{id}/difficulty/"))
            .set_json(json!({ "difficulty": 9 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/sessions/{id}/difficulty/"))
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["difficulty"], 1);
    }

    #[actix_web::test]
    async fn deleted_session_is_gone() {
        let state = state();
        let app = app!(state);
        let id = new_session!(app, json!({}));
        assert_eq!(state.len(), 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/sessions/{id}/"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.len(), 0);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/sessions/{id}/chain/"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
