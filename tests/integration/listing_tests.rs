//! Listing and HTTP fetching tests.
//!
//! These tests verify that:
//! - The S3-compatible listing follows continuation tokens and honors its key cap
//! - The PAR manifest is read over HTTP and normalized
//! - Unusable manifests and local files fall through to the next source
//! - The chain ends in placeholder names when nothing else works
//! - `HttpFetcher` maps upstream status codes onto storage errors
//! - The full router proxies images from a real HTTP upstream

use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::test_utils::{authed_get, create_test_jpeg, test_auth};
use bucket_gallery::error::StorageError;
use bucket_gallery::gallery::{
    FileListing, GalleryService, ListingResolver, ListingStrategy, ManifestListing,
    PlaceholderListing, SdkListing, StaticListing,
};
use bucket_gallery::storage::{create_s3_client, HttpFetcher, ObjectFetcher, UrlResolver};
use bucket_gallery::{create_router, RouterConfig};

const PAR_PATH: &str = "/p/tok/n/testns/b/testbucket/o";

fn par_urls(server: &MockServer) -> UrlResolver {
    UrlResolver::from_par(&format!("{}{}/", server.uri(), PAR_PATH)).unwrap()
}

fn manifest_listing(server: &MockServer) -> ManifestListing<HttpFetcher> {
    let manifest_url = par_urls(server).manifest_url().unwrap();
    ManifestListing::new(Arc::new(HttpFetcher::new()), manifest_url)
}

// =============================================================================
// SDK Listing
// =============================================================================

const BUCKET: &str = "photos";

/// A `ListObjectsV2` response body.
fn list_page(keys: &[&str], next_token: Option<&str>) -> String {
    let contents: String = keys
        .iter()
        .map(|k| format!("<Contents><Key>{}</Key><Size>1024</Size></Contents>", k))
        .collect();
    let truncation = match next_token {
        Some(token) => format!(
            "<IsTruncated>true</IsTruncated><NextContinuationToken>{}</NextContinuationToken>",
            token
        ),
        None => "<IsTruncated>false</IsTruncated>".to_string(),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>{}</Name><Prefix></Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys>{}{}</ListBucketResult>"#,
        BUCKET,
        keys.len(),
        truncation,
        contents
    )
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/xml")
}

/// S3 server with two listing pages; the second is reached through `tok2`.
async fn two_page_bucket() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/", BUCKET)))
        .and(query_param("list-type", "2"))
        .and(query_param_is_missing("continuation-token"))
        .respond_with(xml(list_page(&["a.jpg", "b.JPG", "notes.TXT"], Some("tok2"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/", BUCKET)))
        .and(query_param("list-type", "2"))
        .and(query_param("continuation-token", "tok2"))
        .respond_with(xml(list_page(&["c.png", "d.txt"], None)))
        .mount(&server)
        .await;
    server
}

async fn sdk_client(server: &MockServer) -> aws_sdk_s3::Client {
    std::env::set_var("AWS_ACCESS_KEY_ID", "test-access-key");
    std::env::set_var("AWS_SECRET_ACCESS_KEY", "test-secret-key");
    std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
    create_s3_client(&server.uri(), "us-ashburn-1", None, None).await
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

#[tokio::test]
async fn test_sdk_listing_follows_continuation_token() {
    let server = two_page_bucket().await;
    let listing = SdkListing::new(sdk_client(&server).await, BUCKET);

    let keys = listing.list().await.unwrap();
    assert_eq!(keys, vec!["a.jpg", "b.JPG", "c.png"]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[1]
        .url
        .query_pairs()
        .any(|(k, v)| k == "continuation-token" && v == "tok2"));
}

#[tokio::test]
async fn test_sdk_listing_max_keys_stops_paging() {
    let server = two_page_bucket().await;
    let listing = SdkListing::new(sdk_client(&server).await, BUCKET).with_max_keys(2);

    assert_eq!(listing.list().await.unwrap(), vec!["a.jpg", "b.JPG"]);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_sdk_listing_max_keys_counts_images_only() {
    let server = two_page_bucket().await;
    let listing = SdkListing::new(sdk_client(&server).await, BUCKET).with_max_keys(3);

    // The first page holds three objects but only two images
    assert_eq!(listing.list().await.unwrap(), vec!["a.jpg", "b.JPG", "c.png"]);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_sdk_listing_truncated_without_token_stops() {
    let server = MockServer::start().await;
    let body = list_page(&["only.jpg"], None).replace(
        "<IsTruncated>false</IsTruncated>",
        "<IsTruncated>true</IsTruncated>",
    );
    Mock::given(method("GET"))
        .and(path(format!("/{}/", BUCKET)))
        .respond_with(xml(body))
        .expect(1)
        .mount(&server)
        .await;

    let listing = SdkListing::new(sdk_client(&server).await, BUCKET);
    assert_eq!(listing.list().await.unwrap(), vec!["only.jpg"]);
}

#[tokio::test]
async fn test_sdk_listing_through_resolver() {
    let server = two_page_bucket().await;
    let resolver = ListingResolver::new()
        .with_strategy(SdkListing::new(sdk_client(&server).await, BUCKET))
        .with_strategy(PlaceholderListing::new(1));

    assert_eq!(resolver.strategy_names(), vec!["sdk", "placeholder"]);
    assert_eq!(resolver.resolve().await, vec!["a.jpg", "b.JPG", "c.png"]);
}

#[tokio::test]
async fn test_sdk_client_with_credentials_file() {
    let server = two_page_bucket().await;

    let mut credentials = NamedTempFile::new().unwrap();
    writeln!(credentials, "[gallery]").unwrap();
    writeln!(credentials, "aws_access_key_id = file-access-key").unwrap();
    writeln!(credentials, "aws_secret_access_key = file-secret-key").unwrap();

    let client = create_s3_client(
        &server.uri(),
        "us-ashburn-1",
        Some(credentials.path()),
        Some("gallery"),
    )
    .await;

    let keys = SdkListing::new(client, BUCKET).list().await.unwrap();
    assert_eq!(keys, vec!["a.jpg", "b.JPG", "c.png"]);
}

#[tokio::test]
async fn test_sdk_listing_denied_falls_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let resolver = ListingResolver::new()
        .with_strategy(SdkListing::new(sdk_client(&server).await, BUCKET))
        .with_strategy(StaticListing::from_comma_separated("fallback.jpg"));

    assert_eq!(resolver.resolve().await, vec!["fallback.jpg"]);
}

// =============================================================================
// Manifest
// =============================================================================

#[tokio::test]
async fn test_manifest_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/manifest.json", PAR_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": ["b.jpg", "a.PNG", "readme.txt", "b.jpg", "nested/c.webp"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = ListingResolver::new()
        .with_strategy(manifest_listing(&server))
        .with_strategy(PlaceholderListing::new(3));

    assert_eq!(
        resolver.resolve().await,
        vec!["a.PNG", "b.jpg", "nested/c.webp"]
    );
}

#[tokio::test]
async fn test_manifest_missing_falls_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resolver = ListingResolver::new()
        .with_strategy(manifest_listing(&server))
        .with_strategy(StaticListing::from_comma_separated("x.jpg, y.gif"));

    assert_eq!(resolver.resolve().await, vec!["x.jpg", "y.gif"]);
}

#[tokio::test]
async fn test_manifest_without_images_falls_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/manifest.json", PAR_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": ["a.jpg"]})))
        .mount(&server)
        .await;

    let resolver = ListingResolver::new()
        .with_strategy(manifest_listing(&server))
        .with_strategy(PlaceholderListing::new(2));

    assert_eq!(
        resolver.resolve().await,
        vec!["image_001.jpg", "image_002.jpg"]
    );
}

#[tokio::test]
async fn test_manifest_empty_images_is_a_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/manifest.json", PAR_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"images": []})))
        .mount(&server)
        .await;

    let resolver = ListingResolver::new()
        .with_strategy(manifest_listing(&server))
        .with_strategy(PlaceholderListing::new(2));

    assert!(resolver.resolve().await.is_empty());
}

// =============================================================================
// Local Sources
// =============================================================================

#[tokio::test]
async fn test_file_listing() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "z.jpg").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "  holiday/beach.jpeg  ").unwrap();
    writeln!(file, "notes.md").unwrap();

    let resolver = ListingResolver::new()
        .with_strategy(FileListing::new(file.path()))
        .with_strategy(PlaceholderListing::new(1));

    assert_eq!(resolver.resolve().await, vec!["holiday/beach.jpeg", "z.jpg"]);
}

#[tokio::test]
async fn test_full_chain_falls_back_to_placeholders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let resolver = ListingResolver::new()
        .with_strategy(manifest_listing(&server))
        .with_strategy(FileListing::new(dir.path().join("absent.txt")))
        .with_strategy(StaticListing::new(vec![]))
        .with_strategy(PlaceholderListing::default());

    let images = resolver.resolve().await;
    assert_eq!(images.len(), 500);
    assert_eq!(images[0], "image_001.jpg");
    assert_eq!(images[499], "image_500.jpg");
}

// =============================================================================
// HttpFetcher
// =============================================================================

#[tokio::test]
async fn test_http_fetcher_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/denied.jpg"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new();
    let timeout = Duration::from_secs(5);

    let data = fetcher
        .fetch(&format!("{}/ok.jpg", server.uri()), timeout)
        .await
        .unwrap();
    assert_eq!(data.as_ref(), &[1, 2, 3]);

    let err = fetcher
        .fetch(&format!("{}/gone.jpg", server.uri()), timeout)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));

    let err = fetcher
        .fetch(&format!("{}/denied.jpg", server.uri()), timeout)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Status { status: 403, .. }));
}

#[tokio::test]
async fn test_http_fetcher_head_reads_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .mount(&server)
        .await;

    let info = HttpFetcher::new()
        .head(&format!("{}/a.png", server.uri()), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(info.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_http_fetcher_connection_error() {
    // Nothing listens on port 9 of localhost in the test environment
    let err = HttpFetcher::new()
        .fetch("http://127.0.0.1:9/a.jpg", Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Connection(_)));
    assert!(!err.is_not_found());
}

// =============================================================================
// End to End
// =============================================================================

#[tokio::test]
async fn test_router_over_http_upstream() {
    let server = MockServer::start().await;
    let jpeg = create_test_jpeg(120, 80);

    Mock::given(method("GET"))
        .and(path(format!("{}/manifest.json", PAR_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"images": ["p.jpg"]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/p.jpg", PAR_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg.clone()))
        .mount(&server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new());
    let urls = par_urls(&server);
    let listing = ListingResolver::new()
        .with_strategy(ManifestListing::new(
            Arc::clone(&fetcher),
            urls.manifest_url().unwrap(),
        ))
        .with_strategy(PlaceholderListing::new(1));
    let gallery = GalleryService::new(fetcher, urls, listing);
    let router = create_router(gallery, RouterConfig::new(test_auth()).with_tracing(false));

    let response = router
        .clone()
        .oneshot(authed_get("/api/images"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["images"][0]["name"], "p.jpg");
    assert!(json["images"][0]["thumbnail"].is_string());

    let response = router.oneshot(authed_get("/api/image/p.jpg")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.as_ref(), jpeg.as_slice());
}
