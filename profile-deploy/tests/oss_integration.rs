use profile_deploy::oss::OssClient;
use profile_deploy_core::config::StorageConfig;
use profile_deploy_core::publisher::Publisher;
use std::sync::Arc;
use tempfile::tempdir;

/// Publishes one file to the bucket configured in `.env` / the environment.
#[tokio::test]
#[ignore = "needs OSS credentials and network access"]
async fn test_publish_to_real_bucket_succeeds() {
    dotenvy::dotenv().ok();
    let storage = StorageConfig::from_env().expect("OSS_* variables must be set");

    let dir = tempdir().unwrap();
    let local = dir.path().join("integration-test.txt");
    std::fs::write(&local, "placeholder\nline2\n").unwrap();

    let client = OssClient::from_config(&storage).await;
    let publisher = Publisher::new(Arc::new(client), storage.target.clone());

    let result = publisher
        .publish(&local, "profiles/integration-test.txt", "integration-test.txt")
        .await;

    assert!(
        result.is_ok(),
        "Expected successful publish, but got error: {:?}",
        result.as_ref().err()
    );
    assert!(result
        .unwrap()
        .url
        .ends_with("/profiles/integration-test.txt"));
}
