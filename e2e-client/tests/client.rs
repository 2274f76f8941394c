use e2e_client::{JobsApi, PlatformClient};
use e2e_core::domain::image::RemoteImage;
use e2e_core::domain::job::{Container, JobStatus, Resources};
use e2e_core::dto::job::{JobFilter, RunJob};
use futures::StreamExt;
use mockito::Matcher;
use reqwest::Url;
use serde_json::json;

fn job_body(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "owner": "alice",
        "cluster_name": "default",
        "status": status,
        "history": {
            "status": status,
            "reason": "",
            "created_at": "2024-05-01T10:00:00Z"
        },
        "container": {
            "image": "ubuntu:latest",
            "command": "sleep 1",
            "resources": { "cpu": 0.1, "memory": 20971520, "shm": true }
        },
        "internal_hostname": format!("{}.platform-jobs", id)
    })
}

#[tokio::test]
async fn test_status_sends_token_and_parses_job() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/jobs/job-1")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(job_body("job-1", "pending").to_string())
        .create_async()
        .await;

    let client = PlatformClient::new(server.url()).with_token("secret");
    let job = client.status("job-1").await.unwrap();

    assert_eq!(job.id, "job-1");
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(
        job.internal_hostname.as_deref(),
        Some("job-1.platform-jobs")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_posts_container() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/jobs")
        .match_body(Matcher::PartialJson(json!({
            "container": { "image": "ubuntu:latest", "command": "true" },
            "is_preemptible": false,
            "name": "e2e"
        })))
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(job_body("job-2", "pending").to_string())
        .create_async()
        .await;

    let mut container = Container::new("ubuntu:latest", Resources::default());
    container.command = Some("true".to_string());
    let mut req = RunJob::new(container);
    req.name = Some("e2e".to_string());

    let client = PlatformClient::new(server.url());
    let job = client.submit(req).await.unwrap();

    assert_eq!(job.id, "job-2");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_kill_missing_job_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/jobs/job-gone")
        .with_status(404)
        .with_body("job not found")
        .create_async()
        .await;

    let client = PlatformClient::new(server.url());
    let err = client.kill("job-gone").await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/jobs")
        .match_query(Matcher::Exact("status=running&status=pending".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "jobs": [job_body("job-a", "running"), job_body("job-b", "pending")] })
                .to_string(),
        )
        .create_async()
        .await;

    let client = PlatformClient::new(server.url());
    let jobs = client.list(&JobFilter::active()).await.unwrap();

    let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["job-a", "job-b"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_monitor_yields_output() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/jobs/job-1/log")
        .with_status(200)
        .with_body("hello\nworld\n")
        .create_async()
        .await;

    let client = PlatformClient::new(server.url());
    let mut stream = client.monitor("job-1").await.unwrap();

    let mut output = Vec::new();
    while let Some(chunk) = stream.next().await {
        output.extend(chunk.unwrap());
    }
    assert_eq!(String::from_utf8(output).unwrap(), "hello\nworld\n");
}

#[tokio::test]
async fn test_monitor_rejects_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/jobs/job-1/log")
        .with_status(500)
        .with_body("log source unavailable")
        .create_async()
        .await;

    let client = PlatformClient::new(server.url());
    let err = client.monitor("job-1").await.err().unwrap();

    assert!(err.is_server_error());
}

#[tokio::test]
async fn test_mkdirs_uses_owner_path() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/storage/alice/tmp/data")
        .match_query(Matcher::UrlEncoded("op".into(), "MKDIRS".into()))
        .with_status(201)
        .create_async()
        .await;

    let client = PlatformClient::new(server.url());
    let uri = Url::parse("storage://alice/tmp/data").unwrap();
    client.mkdirs(&uri).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_download_file_writes_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/storage/alice/tmp/foo")
        .match_query(Matcher::UrlEncoded("op".into(), "OPEN".into()))
        .with_status(200)
        .with_body(vec![7u8; 4096])
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dst = dir.path().join("foo");

    let client = PlatformClient::new(server.url());
    let uri = Url::parse("storage://alice/tmp/foo").unwrap();
    client.download_file(&uri, &dst).await.unwrap();

    let content = std::fs::read(&dst).unwrap();
    assert_eq!(content.len(), 4096);
    assert!(content.iter().all(|b| *b == 7));
}

#[tokio::test]
async fn test_image_digest_reads_header() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("HEAD", "/v2/alice/e2e-echo-image/manifests/v1")
        .with_status(200)
        .with_header("Docker-Content-Digest", "sha256:abc")
        .create_async()
        .await;

    let client = PlatformClient::new("http://unused").with_registry(server.url());
    let image = RemoteImage::new("e2e-echo-image", "v1", "unused", "alice");

    assert_eq!(client.image_digest(&image).await.unwrap(), "sha256:abc");
}

#[tokio::test]
async fn test_image_tags_without_registry_is_rejected() {
    let client = PlatformClient::new("http://unused");
    let err = client.image_tags("alice/e2e-echo-image").await.unwrap_err();

    assert!(matches!(err, e2e_client::ClientError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_list_buckets() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/blob/buckets")
        .with_status(200)
        .with_body(
            json!([{
                "id": "bucket-1",
                "name": "e2e-3f2a",
                "owner": "alice",
                "created_at": "2024-05-01T10:00:00Z"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let client = PlatformClient::new(server.url());
    let buckets = client.list_buckets().await.unwrap();

    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].name, "e2e-3f2a");
}

#[tokio::test]
async fn test_user_token_reads_access_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/users/bob/token")
        .match_header("authorization", "Bearer admin")
        .with_status(200)
        .with_body(r#"{"access_token": "minted"}"#)
        .create_async()
        .await;

    let client = PlatformClient::new(server.url()).with_token("admin");

    assert_eq!(client.user_token("bob").await.unwrap(), "minted");
    mock.assert_async().await;
}
