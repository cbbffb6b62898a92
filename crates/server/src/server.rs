use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{masks, purchase, users};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

async fn welcome() -> &'static str {
    "Welcome to Phantom Mask"
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/users/{user_id}", get(users::get))
        .route("/users/{user_id}/purchases", get(users::purchases))
        .route("/pharmacies/{pharmacy_name}/masks", get(masks::list))
        .route("/purchase", post(purchase::purchase_new))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use engine::transform::{PharmacyDocument, UserDocument};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectOptions, Database};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    const PHARMACIES: &str = r#"[{
        "name": "DFW Wellness",
        "cashBalance": 328.41,
        "openingHours": "Mon, Wed, Fri 08:00 - 12:00 / Tue, Thu 14:00 - 18:00",
        "masks": [
            {"name": "True Barrier (green) (3 per pack)", "price": 13.7},
            {"name": "MaskT (green) (10 per pack)", "price": 41.86},
            {"name": "Cheap Cover (white) (1 per pack)", "price": 10}
        ]
    }]"#;

    const USERS: &str = r#"[{"name": "Ada Pierce", "cashBalance": 50, "purchaseHistories": []}]"#;

    async fn app() -> (Router, Arc<Engine>) {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();
        engine
            .ingest_pharmacies(&serde_json::from_str::<Vec<PharmacyDocument>>(PHARMACIES).unwrap())
            .await
            .unwrap();
        engine
            .ingest_users(&serde_json::from_str::<Vec<UserDocument>>(USERS).unwrap())
            .await
            .unwrap();

        let engine = Arc::new(engine);
        let state = ServerState {
            engine: Arc::clone(&engine),
        };
        (router(state), engine)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn purchase_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/purchase")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn mask_id(engine: &Engine, name: &str) -> i32 {
        engine
            .pharmacy_masks("DFW Wellness", engine::MaskSort::Name)
            .await
            .unwrap()
            .into_iter()
            .find(|mask| mask.mask_name == name)
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn welcome_responds() {
        let (router, _) = app().await;
        let response = router.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn user_lookup() {
        let (router, engine) = app().await;
        let user_id = engine.user_id("Ada Pierce").await.unwrap();

        let (status, body) = send(&router, get_request(&format!("/users/{user_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ada Pierce");
        assert_eq!(body["cash_balance"], "50.00");

        let (status, body) = send(&router, get_request("/users/9999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn masks_sorted_by_known_keys_only() {
        let (router, _) = app().await;

        let (status, body) = send(
            &router,
            get_request("/pharmacies/DFW%20Wellness/masks?sort=price"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let prices: Vec<_> = body["masks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|mask| mask["price"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(prices, vec!["10.00", "13.70", "41.86"]);

        let (status, _) = send(
            &router,
            get_request("/pharmacies/DFW%20Wellness/masks?sort=price;DROP%20TABLE%20masks"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&router, get_request("/pharmacies/Nowhere/masks")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn purchase_then_refusal() {
        let (router, engine) = app().await;
        let user_id = engine.user_id("Ada Pierce").await.unwrap();
        let pharmacy_id = engine.pharmacy_account_id("DFW Wellness").await.unwrap();
        let mask_id = mask_id(&engine, "MaskT").await;
        let payload = json!({"user_id": user_id, "pharmacy_id": pharmacy_id, "mask_id": mask_id});

        let (status, body) = send(&router, purchase_request(payload.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["trn_amount"], "41.86");
        assert_eq!(body["pharmacy_name"], "DFW Wellness");

        let (status, body) = send(&router, purchase_request(payload)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("Insufficient funds"));

        let (status, body) =
            send(&router, get_request(&format!("/users/{user_id}/purchases"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["purchases"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn purchase_of_unknown_mask_is_not_found() {
        let (router, engine) = app().await;
        let user_id = engine.user_id("Ada Pierce").await.unwrap();
        let pharmacy_id = engine.pharmacy_account_id("DFW Wellness").await.unwrap();

        let (status, _) = send(
            &router,
            purchase_request(json!({"user_id": user_id, "pharmacy_id": pharmacy_id, "mask_id": 9999})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            engine.user(user_id).await.unwrap().cash_balance,
            engine::MoneyCents::new(5000)
        );
    }
}
