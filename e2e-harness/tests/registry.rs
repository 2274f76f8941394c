//! Registry push, pull and run against a live platform
//!
//! Needs a local docker-compatible engine in addition to the platform.

mod common;

use e2e_core::domain::image::{LocalImage, RemoteImage};
use e2e_core::domain::job::JobStatus;
use e2e_harness::RunJobOptions;
use e2e_harness::engine::ContainerEngine;
use uuid::Uuid;

const TEST_IMAGE_NAME: &str = "e2e-echo-image";

const ECHO_TAG_DOCKERFILE: &str = "FROM alpine:latest\nARG TAG\nENV TAG=${TAG}\nCMD echo $TAG\n";

#[tokio::test]
#[ignore = "requires a live platform and a container engine"]
async fn test_push_pull_and_run() {
    let Some(suite) = common::setup().await else { return };
    let engine = ContainerEngine::from_env();
    if let Err(e) = engine.check_available().await {
        eprintln!("skipping: {e}");
        return;
    }

    let tag = Uuid::new_v4().to_string();
    let registry_host = suite.helper.registry_host().expect("registry host");
    let user = suite.helper.user_name().to_string();

    let context = tempfile::tempdir().expect("build context");
    std::fs::write(context.path().join("Dockerfile"), ECHO_TAG_DOCKERFILE).expect("Dockerfile");

    let local = LocalImage::new(TEST_IMAGE_NAME, tag.as_str());
    let remote = RemoteImage::new(TEST_IMAGE_NAME, tag.as_str(), registry_host.as_str(), user.as_str());
    let pulled = LocalImage::new(TEST_IMAGE_NAME, format!("{}-pull", tag));

    engine
        .build(context.path(), &local, &[("TAG", tag.as_str())])
        .await
        .expect("build image");
    let token = suite.config.token.as_deref().expect("provisioned token");
    engine
        .login(&registry_host, &user, token)
        .await
        .expect("registry login");

    // push
    engine.push(&local, &remote).await.expect("push image");
    let client = suite.helper.client();
    let tags = client.image_tags(&remote.repository()).await.expect("image tags");
    assert!(tags.contains(&tag), "{tag} not in {tags:?}");

    // pull
    engine.pull(&remote, &pulled).await.expect("pull image");
    assert!(engine.image_exists(&pulled.to_string()).await.expect("inspect image"));

    // run
    let job = suite
        .helper
        .run_job(
            &remote.to_string(),
            None,
            RunJobOptions::default().wait_for(JobStatus::Succeeded),
        )
        .await
        .expect("run pushed image");
    suite
        .helper
        .check_job_output(&job.id, &regex::escape(&tag))
        .await
        .expect("job echoes its tag");

    // cleanup
    let digest = client.image_digest(&remote).await.expect("image digest");
    client.image_rm(&remote, &digest).await.expect("remove remote image");
    for image in [&local, &pulled] {
        engine.remove_image(&image.to_string()).await.expect("remove local image");
    }

    suite.teardown().await;
}
