//! Subcommands run against a mock server.

use clap::Parser;
use nwkit_cli::{commands, Cli, Exit};
use nwkit_http::HttpClient;
use nwkit_test_utils::{temp_dir, temp_file, TestHttpServer};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn run(args: &[&str]) -> (anyhow::Result<()>, String) {
    let cli = Cli::try_parse_from(std::iter::once("nwkit").chain(args.iter().copied())).unwrap();
    let client = HttpClient::new().unwrap();
    let mut out = Vec::new();
    let result = commands::execute(cli.command, &client, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_get_prints_body_and_head() {
    let server = TestHttpServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .and(header("x-trace", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Served-By", "mock")
                .set_body_string("hi there"),
        )
        .mount(server.inner())
        .await;

    let url = server.url_for("/hello");
    let (result, out) = run(&["get", &url, "-H", "X-Trace: 1", "--include"]).await;
    result.unwrap();
    assert!(out.starts_with("200 OK\n"));
    assert!(out.contains("x-served-by: mock\n"));
    assert!(out.ends_with("\nhi there"));
}

#[tokio::test]
async fn test_get_with_json_data() {
    let server = TestHttpServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_json(json!({"name": "x"})))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .mount(server.inner())
        .await;

    let url = server.url_for("/items");
    let (result, out) = run(&["get", &url, "-X", "post", "-d", r#"{"name":"x"}"#]).await;
    result.unwrap();
    assert_eq!(out, "created");

    let (result, _) = run(&["get", &url, "-d", "[1, 2]"]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_canonical_header() {
    let server = TestHttpServer::start().await;
    Mock::given(path("/cached"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Cache-Control", "no-cache,, max-age=0"),
        )
        .mount(server.inner())
        .await;

    let url = server.url_for("/cached");
    let (result, out) = run(&["get", &url, "--canonical", "cache-control"]).await;
    result.unwrap();
    assert_eq!(out, "no-cache\nmax-age=0\n");

    let (result, _) = run(&["headers", &url, "--canonical", "x-missing"]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_headers_reports_keep_alive() {
    let server = TestHttpServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server.inner())
        .await;

    let (result, out) = run(&["headers", &server.url_for("/ping")]).await;
    result.unwrap();
    assert!(out.starts_with("200 OK\n"));
    assert!(out.ends_with("keep-alive: true\n"));
}

#[tokio::test]
async fn test_download_and_upload() {
    let server = TestHttpServer::start().await;
    server.get_bytes("/file.txt", "file body").await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"owner\""))
        .and(body_string_contains("filename=\"notes.txt\""))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .mount(server.inner())
        .await;

    let dir = temp_dir();
    let target = dir.path().join("out/file.txt");
    let target_arg = target.to_string_lossy().into_owned();
    let (result, out) = run(&[
        "download",
        &server.url_for("/file.txt"),
        "-o",
        &target_arg,
        "--mkdir",
    ])
    .await;
    result.unwrap();
    assert!(out.starts_with("200 OK\n"));
    assert!(out.contains("content-length: 9\n"));
    assert!(out.ends_with(&format!("\nsaved {} (9 bytes)\n", target.display())));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "file body");

    let (_upload_dir, file) = temp_file("notes.txt", "remember");
    let file_arg = format!("doc={}", file.display());
    let (result, out) = run(&[
        "upload",
        &server.url_for("/upload"),
        "--file",
        &file_arg,
        "--field",
        "owner=ops",
    ])
    .await;
    result.unwrap();
    assert!(out.starts_with("200 OK\n"));
    assert!(out.ends_with("\n\nstored"));
}

#[tokio::test]
async fn test_stream_and_exit_codes() {
    let server = TestHttpServer::start().await;
    server.get_bytes("/feed", "line one\nline two\n").await;
    server.error("/down", 503, "maintenance").await;

    let (result, out) = run(&["stream", &server.url_for("/feed")]).await;
    result.unwrap();
    assert_eq!(out, "line one\nline two\n");

    let (result, out) = run(&["stream", &server.url_for("/down")]).await;
    let err = result.unwrap_err();
    assert_eq!(Exit::for_error(&err), Exit::HttpError);
    assert!(out.is_empty());

    let (result, _) = run(&["get", "http://127.0.0.1:1/"]).await;
    assert_eq!(Exit::for_error(&result.unwrap_err()), Exit::NetworkError);
}
