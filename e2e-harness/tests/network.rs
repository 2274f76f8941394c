//! Network connectivity between jobs and through the ingress

mod common;

use e2e_client::JobsApi;
use e2e_core::domain::job::JobStatus;
use e2e_harness::fixtures::{SecretJob, SecretJobSpec};
use e2e_harness::{Helper, ProbeError, RunJobOptions};

async fn fetch_from_job(helper: &Helper, url: &str, expected: JobStatus, description: &str) -> String {
    let command = format!("wget -q -T 15 {} -O -", url);
    let job = helper
        .run_job(
            "alpine:latest",
            Some(command.as_str()),
            RunJobOptions::default()
                .wait_for(expected)
                .with_description(description),
        )
        .await
        .expect("fetcher job");
    job.id
}

#[tokio::test]
#[ignore = "requires a live platform"]
async fn test_connectivity_job_with_http_port() {
    let Some(suite) = common::setup().await else { return };
    let helper = &suite.helper;

    let http_job = SecretJob::start(helper, &suite.reaper, SecretJobSpec::with_http(false))
        .await
        .expect("secret job");
    let secret_url = http_job.secret_url().expect("ingress url").to_string();

    // external ingress
    let probe = helper.http_get(&secret_url).await.expect("probe ingress");
    assert_eq!(probe.trim(), http_job.secret);

    // ingress from inside the cluster
    let job_id = fetch_from_job(helper, &secret_url, JobStatus::Succeeded, "secret ingress fetcher").await;
    helper
        .check_job_output(&job_id, &regex::escape(&http_job.secret))
        .await
        .expect("secret via ingress");

    // cluster network
    let internal_url = http_job.internal_secret_url().expect("internal hostname");
    let job_id = fetch_from_job(
        helper,
        &internal_url,
        JobStatus::Succeeded,
        "secret internal network fetcher",
    )
    .await;
    helper
        .check_job_output(&job_id, &regex::escape(&http_job.secret))
        .await
        .expect("secret via internal network");

    suite.teardown().await;
}

#[tokio::test]
#[ignore = "requires a live platform"]
async fn test_connectivity_job_without_http_port() {
    let Some(suite) = common::setup().await else { return };
    let helper = &suite.helper;

    // A forwarded job only to learn the shape of an ingress url
    let http_job = SecretJob::start(helper, &suite.reaper, SecretJobSpec::with_http(false))
        .await
        .expect("secret job");
    helper.client().kill(&http_job.id).await.expect("kill http job");
    let ingress_url = http_job.secret_url().expect("ingress url").to_string();

    let no_http_job = SecretJob::start(helper, &suite.reaper, SecretJobSpec::default())
        .await
        .expect("secret job without port");
    let emulated_url = ingress_url.replace(&http_job.id, &no_http_job.id);

    let err = helper.http_get(&emulated_url).await.unwrap_err();
    assert!(matches!(err, ProbeError::UnexpectedStatus { .. }), "{err}");

    let job_id = fetch_from_job(helper, &emulated_url, JobStatus::Failed, "secret ingress fetcher").await;
    helper
        .check_job_output(&job_id, r"wget.+404.+Not Found")
        .await
        .expect("404 from ingress");

    suite.teardown().await;
}

#[tokio::test]
#[ignore = "requires a live platform"]
async fn test_check_isolation() {
    let Some(suite) = common::setup().await else { return };
    let Some(alt) = suite.alt().await else { return };

    let http_job = SecretJob::start(&suite.helper, &suite.reaper, SecretJobSpec::with_http(false))
        .await
        .expect("secret job");
    let secret_url = http_job.secret_url().expect("ingress url").to_string();

    // The ingress is public without auth
    let job_id = fetch_from_job(&alt.helper, &secret_url, JobStatus::Succeeded, "secret ingress fetcher").await;
    alt.helper
        .check_job_output(&job_id, &regex::escape(&http_job.secret))
        .await
        .expect("secret via ingress");

    // Other users cannot reach the job on the cluster network
    let internal_url = http_job.internal_secret_url().expect("internal hostname");
    let job_id = fetch_from_job(
        &alt.helper,
        &internal_url,
        JobStatus::Failed,
        "secret internal network fetcher",
    )
    .await;
    alt.helper
        .check_job_output(&job_id, "timed out")
        .await
        .expect("isolated network");

    alt.teardown().await;
    suite.teardown().await;
}
