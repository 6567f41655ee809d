mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{Value, json};

async fn create_gallery(app: &TestApp, token: &str, body: Value) -> common::TestResponse {
    app.json("POST", "/api/admin/galleries", body, Some(token)).await
}

#[tokio::test]
async fn new_gallery_is_public_with_no_images() {
    let app = TestApp::new().await;
    let token = app.admin_token();

    let created = create_gallery(
        &app,
        &token,
        json!({"slug": "studio-shoot", "title": "Studio Shoot", "display_order": 1}),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["message"], "Gallery created successfully");

    let fetched = app.get("/api/galleries/studio-shoot", None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["title"], "Studio Shoot");
    assert_eq!(fetched.body["data"]["images"], json!([]));

    let missing = app.get("/api/galleries/nope", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Gallery not found");
}

#[tokio::test]
async fn slug_is_derived_from_the_title_when_omitted() {
    let app = TestApp::new().await;

    let created = create_gallery(&app, &app.admin_token(), json!({"title": "  Fashion & Beauty! "})).await;

    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["slug"], "fashion-beauty");
    assert_eq!(created.body["data"]["title"], "Fashion & Beauty!");
}

#[tokio::test]
async fn duplicate_or_malformed_slugs_are_rejected() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    create_gallery(&app, &token, json!({"slug": "editorial", "title": "Editorial"})).await;

    let duplicate = create_gallery(&app, &token, json!({"slug": "editorial", "title": "Again"})).await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        duplicate.body["message"],
        "A category with this slug already exists"
    );

    let malformed = create_gallery(&app, &token, json!({"slug": "Bad Slug", "title": "Bad"})).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.error_fields(), vec!["slug"]);
}

#[tokio::test]
async fn galleries_are_listed_in_display_order() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    create_gallery(&app, &token, json!({"slug": "second", "title": "Second", "display_order": 2})).await;
    create_gallery(&app, &token, json!({"slug": "first", "title": "First", "display_order": 1})).await;

    let listed = app.get("/api/galleries", None).await;

    let slugs: Vec<&str> = listed.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["first", "second"]);
}

#[tokio::test]
async fn update_changes_only_the_given_fields() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let created = create_gallery(
        &app,
        &token,
        json!({"slug": "weddings", "title": "Weddings", "description": "Ceremonies"}),
    )
    .await;
    let id = created.body["data"]["id"].as_i64().unwrap();

    let updated = app
        .json(
            "PUT",
            &format!("/api/admin/galleries/{id}"),
            json!({"title": "Wedding Days"}),
            Some(&token),
        )
        .await;

    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["title"], "Wedding Days");
    assert_eq!(updated.body["data"]["description"], "Ceremonies");
    assert_eq!(updated.body["data"]["slug"], "weddings");

    let missing = app
        .json("PUT", "/api/admin/galleries/999", json!({"title": "Ghost"}), Some(&token))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cover_image_longer_than_its_column_is_rejected() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let too_long = format!("https://cdn.example.com/{}", "x".repeat(480));

    let created = create_gallery(
        &app,
        &token,
        json!({"slug": "covers", "title": "Covers", "cover_image": too_long}),
    )
    .await;
    assert_eq!(created.status, StatusCode::BAD_REQUEST);
    assert_eq!(created.error_fields(), vec!["cover_image"]);

    let created = create_gallery(&app, &token, json!({"slug": "covers", "title": "Covers"})).await;
    let id = created.body["data"]["id"].as_i64().unwrap();
    let updated = app
        .json(
            "PUT",
            &format!("/api/admin/galleries/{id}"),
            json!({"cover_image": too_long}),
            Some(&token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::BAD_REQUEST);
    assert_eq!(updated.error_fields(), vec!["cover_image"]);
}

#[tokio::test]
async fn images_belong_to_an_existing_gallery() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let created = create_gallery(&app, &token, json!({"slug": "portraits", "title": "Portraits"})).await;
    let id = created.body["data"]["id"].as_i64().unwrap();

    let image = app
        .json(
            "POST",
            &format!("/api/admin/galleries/{id}/images"),
            json!({"src": "/uploads/a.jpg", "alt": "A portrait", "aspect_ratio": "square"}),
            Some(&token),
        )
        .await;
    assert_eq!(image.status, StatusCode::CREATED);
    assert_eq!(image.body["data"]["aspect_ratio"], "square");

    let fetched = app.get("/api/galleries/portraits", None).await;
    assert_eq!(fetched.body["data"]["images"].as_array().unwrap().len(), 1);

    let orphan = app
        .json(
            "POST",
            "/api/admin/galleries/999/images",
            json!({"src": "/uploads/b.jpg"}),
            Some(&token),
        )
        .await;
    assert_eq!(orphan.status, StatusCode::NOT_FOUND);
    assert_eq!(orphan.body["message"], "Category not found");
}

#[tokio::test]
async fn deleting_a_gallery_removes_its_images() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let created = create_gallery(&app, &token, json!({"slug": "events", "title": "Events"})).await;
    let id = created.body["data"]["id"].as_i64().unwrap();
    for src in ["/uploads/1.jpg", "/uploads/2.jpg"] {
        app.json(
            "POST",
            &format!("/api/admin/galleries/{id}/images"),
            json!({"src": src}),
            Some(&token),
        )
        .await;
    }
    assert_eq!(app.repo.images().await.len(), 2);

    let deleted = app
        .delete(&format!("/api/admin/galleries/{id}"), Some(&token))
        .await;

    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Gallery deleted successfully");
    assert!(app.repo.images().await.is_empty());
    assert_eq!(
        app.get("/api/galleries/events", None).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn single_images_can_be_deleted() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let created = create_gallery(&app, &token, json!({"slug": "travel", "title": "Travel"})).await;
    let gallery_id = created.body["data"]["id"].as_i64().unwrap();
    let image = app
        .json(
            "POST",
            &format!("/api/admin/galleries/{gallery_id}/images"),
            json!({"src": "/uploads/t.jpg"}),
            Some(&token),
        )
        .await;
    let image_id = image.body["data"]["id"].as_i64().unwrap();

    let deleted = app
        .delete(&format!("/api/admin/images/{image_id}"), Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let again = app
        .delete(&format!("/api/admin/images/{image_id}"), Some(&token))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.body["message"], "Image not found");

    let invalid = app.delete("/api/admin/images/x", Some(&token)).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gallery_writes_require_a_token() {
    let app = TestApp::new().await;

    let res = app
        .json("POST", "/api/admin/galleries", json!({"title": "Sneaky"}), None)
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(app.get("/api/galleries", None).await.body["data"]
        .as_array()
        .unwrap()
        .is_empty());
}
