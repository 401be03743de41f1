#![cfg(feature = "inmem-store")]

use actix_web::{test, App};
use propfolio::auth::create_jwt;
use propfolio::changes::ChangeFeed;
use propfolio::images::ImageManager;
use propfolio::models::{CaptureMode, NewListing};
use propfolio::rate_limit::{InMemoryRateLimiter, RateLimitConfig, RateLimiterFacade};
use propfolio::repo::inmem::InMemRepo;
use propfolio::repo::ListingRepo;
use propfolio::routes::{config, AppState};
use propfolio::storage::MemImageStore;
use rust_decimal::Decimal;
use serial_test::serial;
use std::sync::Arc;
use uuid::Uuid;

fn setup_env() {
    std::env::set_var("JWT_SECRET", "test-secret-must-be-32-bytes-long!!");
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("PROPFOLIO_DATA_DIR", tmp.path().to_str().unwrap());
}

struct Fixture {
    state: AppState,
    store: Arc<MemImageStore>,
    owner: Uuid,
    listing_id: Uuid,
}

async fn fixture() -> Fixture {
    setup_env();
    let repo = Arc::new(InMemRepo::new());
    let store = Arc::new(MemImageStore::new());
    let owner = Uuid::new_v4();
    let listing = repo
        .create_listing(
            owner,
            NewListing {
                title: "With photos".into(),
                price: Decimal::new(410_000, 0),
                description: String::new(),
                location: "Omaha, NE".into(),
                primary_image_url: None,
                image_urls: vec![],
                capture_mode: CaptureMode::BookCall,
            },
        )
        .await
        .unwrap();
    let state = AppState {
        repo,
        images: ImageManager::new(store.clone()),
        feed: ChangeFeed::new(),
        limits: RateLimiterFacade::new(
            InMemoryRateLimiter::new(false),
            RateLimitConfig::from_env(),
        ),
    };
    Fixture { state, store, owner, listing_id: listing.id }
}

fn bearer(owner: Uuid) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", create_jwt(owner).unwrap()))
}

// Minimal valid PNG (1x1) for MIME sniffing.
fn png_bytes() -> Vec<u8> {
    vec![
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A,
        0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00,
        0x1F, 0x15, 0xC4, 0x89,
        0x00, 0x00, 0x00, 0x0A, b'I', b'D', b'A', b'T', 0x78, 0x9C, 0x63, 0x00, 0x01,
        0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4,
        0x00, 0x00, 0x00, 0x00, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82,
    ]
}

fn multipart_two_files(boundary: &str, filename: &str, payload: &[u8]) -> Vec<u8> {
    let mut body: Vec<u8> = Vec::new();
    for _ in 0..2 {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[actix_web::test]
#[serial]
async fn test_upload_same_filename_twice_yields_distinct_urls() {
    let fx = fixture().await;
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(fx.state.clone()))
            .configure(config),
    )
    .await;

    let boundary = "BOUNDARYIMG";
    let body = multipart_two_files(boundary, "house.png", &png_bytes());
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/listings/{}/images", fx.listing_id))
        .insert_header(bearer(fx.owner))
        .insert_header(("Content-Type", format!("multipart/form-data; boundary={boundary}")))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let outcomes: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let arr = outcomes.as_array().unwrap();
    assert_eq!(arr.len(), 2);
    for o in arr {
        assert_eq!(o["status"], "ok");
        assert!(o["path"].as_str().unwrap().starts_with(&format!("{}/", fx.listing_id)));
        assert!(o["path"].as_str().unwrap().ends_with(".png"));
    }
    // identical original filenames, distinct keys and URLs
    assert_ne!(arr[0]["path"], arr[1]["path"]);
    assert_ne!(arr[0]["url"], arr[1]["url"]);
    assert_eq!(fx.store.len(), 2);
}

#[actix_web::test]
#[serial]
async fn test_upload_rejects_non_image_payloads() {
    let fx = fixture().await;
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(fx.state.clone()))
            .configure(config),
    )
    .await;

    let boundary = "BOUNDARYTXT";
    let body = multipart_two_files(boundary, "notes.txt", b"just some text");
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/listings/{}/images", fx.listing_id))
        .insert_header(bearer(fx.owner))
        .insert_header(("Content-Type", format!("multipart/form-data; boundary={boundary}")))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 415);
    assert!(fx.store.is_empty());
}

#[actix_web::test]
#[serial]
async fn test_upload_requires_the_listing_owner() {
    let fx = fixture().await;
    let intruder = Uuid::new_v4();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(fx.state.clone()))
            .configure(config),
    )
    .await;

    let boundary = "BOUNDARYFORB";
    let body = multipart_two_files(boundary, "house.png", &png_bytes());
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/listings/{}/images", fx.listing_id))
        .insert_header(bearer(intruder))
        .insert_header(("Content-Type", format!("multipart/form-data; boundary={boundary}")))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    assert!(fx.store.is_empty());
}

#[actix_web::test]
#[serial]
async fn test_delete_image_requires_the_listing_owner() {
    let fx = fixture().await;
    let intruder = Uuid::new_v4();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(fx.state.clone()))
            .configure(config),
    )
    .await;

    let boundary = "BOUNDARYDELFORB";
    let body = multipart_two_files(boundary, "house.png", &png_bytes());
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/listings/{}/images", fx.listing_id))
        .insert_header(bearer(fx.owner))
        .insert_header(("Content-Type", format!("multipart/form-data; boundary={boundary}")))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let outcomes: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let path = outcomes[0]["path"].as_str().unwrap().to_string();

    // another realtor's token cannot touch this listing's objects
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/images/{path}"))
        .insert_header(bearer(intruder))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    assert_eq!(fx.store.len(), 2);

    // keys that do not lead with a listing id are rejected outright
    let req = test::TestRequest::delete()
        .uri("/api/v1/images/not-a-uuid/photo.png")
        .insert_header(bearer(fx.owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // keys under a listing that no longer exists are unreachable
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/images/{}/photo.png", Uuid::new_v4()))
        .insert_header(bearer(fx.owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
#[serial]
async fn test_delete_image_is_best_effort() {
    let fx = fixture().await;
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(fx.state.clone()))
            .configure(config),
    )
    .await;

    let boundary = "BOUNDARYDEL";
    let body = multipart_two_files(boundary, "house.png", &png_bytes());
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/listings/{}/images", fx.listing_id))
        .insert_header(bearer(fx.owner))
        .insert_header(("Content-Type", format!("multipart/form-data; boundary={boundary}")))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let outcomes: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let path = outcomes[0]["path"].as_str().unwrap().to_string();

    // delete an existing object
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/images/{path}"))
        .insert_header(bearer(fx.owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let res: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(res["deleted"], true);
    assert_eq!(fx.store.len(), 1);

    // deleting it again reports false, not an error
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/images/{path}"))
        .insert_header(bearer(fx.owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let res: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(res["deleted"], false);
}
