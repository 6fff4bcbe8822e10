use profile_deploy_core::config::StorageTarget;
use profile_deploy_core::contract::{
    MockObjectStore, ObjectAcl, PutObjectOutput, PutObjectRequest, StorageClass,
};
use profile_deploy_core::publisher::Publisher;
use profile_deploy_core::DeployError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// What the mock saw at call time: the request and the staged payload.
type Captured = Arc<Mutex<Vec<(PutObjectRequest, String)>>>;

fn capturing_store(captured: Captured) -> MockObjectStore {
    let mut store = MockObjectStore::new();
    store
        .expect_put_object()
        .returning(move |req: PutObjectRequest| {
            let body = std::fs::read_to_string(&req.body)
                .expect("staged file must exist during put");
            captured.lock().unwrap().push((req, body));
            Ok(PutObjectOutput {
                etag: Some("\"etag\"".to_string()),
            })
        });
    store
}

#[tokio::test]
async fn publish_rewrites_first_line_and_uploads_with_profile_headers() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("a.txt");
    std::fs::write(&local, "old-header\nline2\nline3").unwrap();

    let captured: Captured = Arc::default();
    let publisher = Publisher::new(
        Arc::new(capturing_store(captured.clone())),
        StorageTarget::new("b", "r"),
    );

    let published = publisher
        .publish(&local, "profiles/a.txt", "a.txt")
        .await
        .expect("publish should succeed");

    assert_eq!(published.key, "profiles/a.txt");
    assert_eq!(published.url, "https://b.r.aliyuncs.com/profiles/a.txt");

    let calls = captured.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (req, body) = &calls[0];
    assert_eq!(req.key, "profiles/a.txt");
    assert_eq!(
        body,
        "#!MANAGED-CONFIG https://b.r.aliyuncs.com/profiles/a.txt interval=86400\nline2\nline3"
    );
    assert_eq!(req.headers.storage_class, StorageClass::Standard);
    assert_eq!(req.headers.acl, ObjectAcl::PublicRead);
    assert_eq!(req.headers.content_disposition, "attachment; filename=\"a.txt\"");
    assert!(!req.headers.forbid_overwrite);

    // The local source is left untouched.
    assert_eq!(
        std::fs::read_to_string(&local).unwrap(),
        "old-header\nline2\nline3"
    );
}

#[tokio::test]
async fn staged_file_is_removed_after_successful_upload() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("clash.yaml");
    std::fs::write(&local, "x\ny").unwrap();

    let captured: Captured = Arc::default();
    let publisher = Publisher::new(
        Arc::new(capturing_store(captured.clone())),
        StorageTarget::new("b", "r"),
    );
    publisher
        .publish(&local, "profiles/clash.yaml", "clash.yaml")
        .await
        .unwrap();

    let staged = captured.lock().unwrap()[0].0.body.clone();
    let staged_name = staged.file_name().unwrap().to_string_lossy().into_owned();
    assert!(staged_name.starts_with("temp-"), "got {staged_name}");
    assert!(staged_name.ends_with("-clash.yaml"), "got {staged_name}");
    assert!(!staged.exists(), "temp file should be deleted after upload");
}

#[tokio::test]
async fn staged_file_is_removed_when_upload_fails() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("a.txt");
    std::fs::write(&local, "x\ny").unwrap();

    let seen: Arc<Mutex<Option<PathBuf>>> = Arc::default();
    let seen_in_mock = seen.clone();
    let mut store = MockObjectStore::new();
    store.expect_put_object().returning(move |req| {
        *seen_in_mock.lock().unwrap() = Some(req.body.clone());
        Err("access denied".into())
    });

    let publisher = Publisher::new(Arc::new(store), StorageTarget::new("b", "r"));
    let err = publisher
        .publish(&local, "profiles/a.txt", "a.txt")
        .await
        .unwrap_err();

    match &err {
        DeployError::Upload { key, source } => {
            assert_eq!(key, "profiles/a.txt");
            assert!(source.to_string().contains("access denied"));
        }
        other => panic!("expected upload error, got {other:?}"),
    }

    let staged = seen.lock().unwrap().clone().expect("put was attempted");
    assert!(!staged.exists(), "temp file should be deleted after failure");
}

#[tokio::test]
async fn missing_file_fails_without_calling_store() {
    let dir = tempdir().unwrap();
    let mut store = MockObjectStore::new();
    store.expect_put_object().never();

    let publisher = Publisher::new(Arc::new(store), StorageTarget::new("b", "r"));
    let err = publisher
        .publish(&dir.path().join("gone.txt"), "profiles/gone.txt", "gone.txt")
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Filesystem { .. }), "got {err:?}");
}

#[tokio::test]
async fn non_utf8_file_is_a_filesystem_error() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("bin.dat");
    std::fs::write(&local, [0xff, 0xfe, 0x00, b'\n', b'a']).unwrap();

    let mut store = MockObjectStore::new();
    store.expect_put_object().never();

    let publisher = Publisher::new(Arc::new(store), StorageTarget::new("b", "r"));
    let err = publisher
        .publish(&local, "profiles/bin.dat", "bin.dat")
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Filesystem { .. }), "got {err:?}");
}
