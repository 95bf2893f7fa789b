//! HTTP service and client, end to end over loopback with fake rasterizers.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{
    file_names, write_pdf_stub, FailingRasterizer, SlowRasterizer, SolidRasterizer, PDF_STUB,
};
use pdf2img::service::{router, ServiceState};
use pdf2img::{ConversionEngine, Pdf2ImgClient, Pdf2ImgError, Rasterizer, ServerConfig};
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "pdf2img-test-boundary";

fn state(rasterizer: Arc<dyn Rasterizer>, root: &Path) -> ServiceState {
    let config = ServerConfig {
        workspace_root: root.to_path_buf(),
        ..ServerConfig::default()
    };
    ServiceState::new(ConversionEngine::new(rasterizer), config)
}

fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, file_name, content)))
        .unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
}

/// The workspace goes away when the response body is dropped, which can
/// trail the client's last read by a moment.
async fn assert_root_drains(root: &Path) {
    for _ in 0..100 {
        if file_names(root).is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("workspace root not empty: {:?}", file_names(root));
}

async fn spawn_service(state: ServiceState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

// ── Router level ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let root = TempDir::new().unwrap();
    let app = router(state(SolidRasterizer::new(1), root.path()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn convert_returns_flat_named_zip() {
    let root = TempDir::new().unwrap();
    let app = router(state(SolidRasterizer::new(5), root.path()));

    let response = app
        .oneshot(upload("/convert?pages=2-3", "file", "report.pdf", PDF_STUB))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report_images.zip\""
    );

    let bytes = body_bytes(response.into_body()).await;
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, vec!["report_2.png", "report_3.png"]);

    assert_root_drains(root.path()).await;
}

#[tokio::test]
async fn non_pdf_upload_is_rejected() {
    let root = TempDir::new().unwrap();
    let raster = SolidRasterizer::new(1);
    let app = router(state(raster.clone(), root.path()));

    let response = app
        .oneshot(upload("/convert", "file", "notes.txt", PDF_STUB))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
    assert_eq!(json["detail"], "File must be a PDF");
    assert!(raster.calls().is_empty());
    assert!(file_names(root.path()).is_empty());
}

#[tokio::test]
async fn missing_file_field_is_rejected() {
    let root = TempDir::new().unwrap();
    let app = router(state(SolidRasterizer::new(1), root.path()));

    let response = app
        .oneshot(upload("/convert", "document", "report.pdf", PDF_STUB))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(file_names(root.path()).is_empty());
}

#[tokio::test]
async fn bad_parameters_are_rejected() {
    let root = TempDir::new().unwrap();
    let app = router(state(SolidRasterizer::new(1), root.path()));

    for uri in ["/convert?fmt=gif", "/convert?dpi=5"] {
        let response = app
            .clone()
            .oneshot(upload(uri, "file", "report.pdf", PDF_STUB))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
    assert!(file_names(root.path()).is_empty());
}

#[tokio::test]
async fn conversion_failure_is_500_and_cleans_up() {
    let root = TempDir::new().unwrap();
    let app = router(state(Arc::new(FailingRasterizer), root.path()));

    let response = app
        .oneshot(upload("/convert", "file", "broken.pdf", PDF_STUB))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
    assert!(json["detail"].as_str().unwrap().contains("xref table missing"));
    assert!(file_names(root.path()).is_empty());
}

#[tokio::test]
async fn upload_without_pdf_header_is_rejected() {
    let root = TempDir::new().unwrap();
    let app = router(state(SolidRasterizer::new(1), root.path()));

    let response = app
        .oneshot(upload("/convert", "file", "renamed.pdf", b"GIF89a"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(file_names(root.path()).is_empty());
}

#[tokio::test]
async fn malformed_query_gets_json_detail() {
    let root = TempDir::new().unwrap();
    let app = router(state(SolidRasterizer::new(1), root.path()));

    let response = app
        .oneshot(upload("/convert?dpi=abc", "file", "report.pdf", PDF_STUB))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
    assert!(json["detail"].as_str().unwrap().starts_with("Invalid query"));
    assert!(file_names(root.path()).is_empty());
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let root = TempDir::new().unwrap();
    let config = ServerConfig {
        workspace_root: root.path().to_path_buf(),
        max_upload_bytes: 256,
        ..ServerConfig::default()
    };
    let raster = SolidRasterizer::new(1);
    let app = router(ServiceState::new(ConversionEngine::new(raster.clone()), config));

    let mut big = PDF_STUB.to_vec();
    big.resize(8 * 1024, b'0');
    let response = app
        .oneshot(upload("/convert", "file", "big.pdf", &big))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
    assert!(json["detail"].is_string());
    assert!(raster.calls().is_empty());
    assert!(file_names(root.path()).is_empty());
}

#[tokio::test]
async fn abandoned_request_leaves_no_workspace() {
    let root = TempDir::new().unwrap();
    let raster = SlowRasterizer::new(2, Duration::from_millis(500));
    let app = router(state(raster.clone(), root.path()));

    // The client gives up while the document is still rendering.
    let request = app.oneshot(upload("/convert", "file", "r.pdf", PDF_STUB));
    assert!(tokio::time::timeout(Duration::from_millis(150), request)
        .await
        .is_err());

    // The conversion task still owns the workspace.
    assert_eq!(file_names(root.path()).len(), 1);

    raster.wait_finished().await;
    assert_root_drains(root.path()).await;
}

// ── Client against a live listener ───────────────────────────────────────────

#[tokio::test]
async fn client_round_trip_matches_local_conversion() {
    let root = TempDir::new().unwrap();
    let raster = SolidRasterizer::new(4);
    let url = spawn_service(state(raster.clone(), root.path())).await;

    let tmp = TempDir::new().unwrap();
    let pdf = write_pdf_stub(tmp.path(), "slides.pdf");
    let remote_out = tmp.path().join("remote");
    let local_out = tmp.path().join("local");

    let client = Pdf2ImgClient::new(url);
    assert_eq!(client.health().await.unwrap(), "ok");

    let files = client.convert(&pdf, &remote_out, "png", 150).await.unwrap();
    assert_eq!(files.len(), 4);
    assert_eq!(
        file_names(&remote_out),
        vec!["slides_1.png", "slides_2.png", "slides_3.png", "slides_4.png"]
    );

    let config = pdf2img::ConversionConfig::builder().dpi(150).build().unwrap();
    ConversionEngine::new(raster)
        .convert_sync(&pdf.as_path().into(), Some(&local_out), &config)
        .unwrap();
    for name in file_names(&local_out) {
        assert_eq!(
            std::fs::read(remote_out.join(&name)).unwrap(),
            std::fs::read(local_out.join(&name)).unwrap(),
            "{name}"
        );
    }

    assert_root_drains(root.path()).await;
}

#[tokio::test]
async fn client_forwards_page_selection() {
    let root = TempDir::new().unwrap();
    let url = spawn_service(state(SolidRasterizer::new(8), root.path())).await;

    let tmp = TempDir::new().unwrap();
    let pdf = write_pdf_stub(tmp.path(), "a.pdf");
    let out = tmp.path().join("out");

    Pdf2ImgClient::new(url)
        .convert_pages(&pdf, &out, "jpg", 72, Some("1,6-7"))
        .await
        .unwrap();

    assert_eq!(file_names(&out), vec!["a_1.jpg", "a_6.jpg", "a_7.jpg"]);
}

#[tokio::test]
async fn client_surfaces_server_errors() {
    let root = TempDir::new().unwrap();
    let url = spawn_service(state(Arc::new(FailingRasterizer), root.path())).await;
    let client = Pdf2ImgClient::new(url);

    let tmp = TempDir::new().unwrap();
    let txt = tmp.path().join("notes.txt");
    std::fs::write(&txt, PDF_STUB).unwrap();
    let err = client
        .convert(&txt, tmp.path().join("out"), "png", 200)
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2ImgError::Server { status: 400, .. }));

    let pdf = write_pdf_stub(tmp.path(), "doc.pdf");
    let err = client
        .convert(&pdf, tmp.path().join("out"), "png", 200)
        .await
        .unwrap_err();
    match err {
        Pdf2ImgError::Server { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("detail"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_root_drains(root.path()).await;
}

#[tokio::test]
async fn client_reports_unreachable_service() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);

    let err = Pdf2ImgClient::new(format!("http://{addr}"))
        .health()
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2ImgError::Network { .. }));
}
