mod common;

use axum::http::StatusCode;
use common::{FilePart, TestApp};
use portfolio_backend::{images::MockImageHost, repository::PortfolioStore};

fn image_part() -> FilePart<'static> {
    FilePart::jpeg("image", "Hero Shot.jpg", 512)
}

#[tokio::test]
async fn sections_are_listed_in_display_order() {
    let app = TestApp::new().await;
    app.repo.seed_section("Fashion", "fashion", 2).await;
    app.repo.seed_section("Portrait", "portrait", 1).await;

    let res = app
        .get("/api/admin/portfolio/sections", Some(&app.admin_token()))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"][0]["slug"], "portrait");
    assert_eq!(res.body["data"][1]["slug"], "fashion");
}

#[tokio::test]
async fn replacing_an_image_stores_the_hosted_reference() {
    let app = TestApp::new().await;
    let id = app.repo.seed_section("Portrait", "portrait", 1).await;

    let res = app
        .multipart(
            "PUT",
            &format!("/api/admin/portfolio/sections/{id}/image"),
            &[image_part()],
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Image updated successfully");

    let uploaded = app.images.uploaded().await;
    assert_eq!(uploaded.len(), 1);
    let url = res.body["data"]["url"].as_str().unwrap();
    assert_eq!(url, format!("https://images.test/{}", uploaded[0]));
    assert!(res.body["data"]["thumbnail"].as_str().unwrap().contains(&uploaded[0]));

    let sections = app.repo.list_sections().await.unwrap();
    assert_eq!(sections[0].image_public_id.as_deref(), Some(uploaded[0].as_str()));
    assert_eq!(sections[0].image_url.as_deref(), Some(url));
    assert!(app.images.deleted().await.is_empty());
}

#[tokio::test]
async fn unknown_section_deletes_the_fresh_upload() {
    let app = TestApp::new().await;

    let res = app
        .multipart(
            "PUT",
            "/api/admin/portfolio/sections/42/image",
            &[image_part()],
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Section not found");
    assert_eq!(app.images.deleted().await, app.images.uploaded().await);
    assert_eq!(app.images.deleted().await.len(), 1);
}

#[tokio::test]
async fn database_failure_deletes_the_fresh_upload() {
    let app = TestApp::new().await;
    let id = app.repo.seed_section("Portrait", "portrait", 1).await;
    app.repo.set_failing(true);

    let res = app
        .multipart(
            "PUT",
            &format!("/api/admin/portfolio/sections/{id}/image"),
            &[image_part()],
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["message"], "Failed to update section");
    assert_eq!(app.images.deleted().await.len(), 1);
}

#[tokio::test]
async fn failed_cleanup_still_reports_the_original_error() {
    let app = TestApp::builder()
        .images(MockImageHost::failing_delete())
        .build()
        .await;

    let res = app
        .multipart(
            "PUT",
            "/api/admin/portfolio/sections/42/image",
            &[image_part()],
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Section not found");
}

#[tokio::test]
async fn host_upload_failure_leaves_the_section_untouched() {
    let app = TestApp::builder()
        .images(MockImageHost::failing_upload())
        .build()
        .await;
    let id = app.repo.seed_section("Portrait", "portrait", 1).await;

    let res = app
        .multipart(
            "PUT",
            &format!("/api/admin/portfolio/sections/{id}/image"),
            &[image_part()],
            Some(&app.admin_token()),
        )
        .await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["message"], "Failed to upload image");
    let sections = app.repo.list_sections().await.unwrap();
    assert!(sections[0].image_url.is_none());
}

#[tokio::test]
async fn missing_image_or_bad_id_is_a_bad_request() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let id = app.repo.seed_section("Portrait", "portrait", 1).await;

    let no_image = app
        .multipart(
            "PUT",
            &format!("/api/admin/portfolio/sections/{id}/image"),
            &[FilePart::jpeg("file", "wrong-field.jpg", 10)],
            Some(&token),
        )
        .await;
    assert_eq!(no_image.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_image.body["message"], "No image provided");

    let bad_id = app
        .multipart(
            "PUT",
            "/api/admin/portfolio/sections/abc/image",
            &[image_part()],
            Some(&token),
        )
        .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["message"], "Invalid section ID");
    assert!(app.images.uploaded().await.is_empty());
}
