use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use svgward::gzip;
use svgward_upload::{
	Actor, Dimensions, Error, RolePermission, StagedUpload, SvgConfig, UploadHandler, UploadOutcome,
	UploadPermission,
};

fn handler() -> UploadHandler {
	UploadHandler::from_config(&SvgConfig::default(), Arc::new(RolePermission::new(["leader"]))).unwrap()
}

fn leader() -> Actor {
	Actor::new("alice.example", &["leader"])
}

fn stage(dir: &tempfile::TempDir, name: &str, content: &[u8], content_type: Option<&str>) -> StagedUpload {
	let path = dir.path().join(name);
	std::fs::write(&path, content).unwrap();
	StagedUpload { path, file_name: name.into(), content_type: content_type.map(Into::into) }
}

#[tokio::test]
async fn sanitizes_in_place() {
	let dir = tempfile::tempdir().unwrap();
	let input = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 32 16" onload="alert(1)"><script>alert(2)</script><rect width="1" height="1"/></svg>"#;
	let staged = stage(&dir, "icon.svg", input, Some("image/svg+xml"));

	let outcome = handler().process(&leader(), &staged).await.unwrap();
	let stored = std::fs::read_to_string(&staged.path).unwrap();
	assert_eq!(
		stored,
		r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 32 16"><rect width="1" height="1"/></svg>"#
	);
	assert_eq!(
		outcome,
		UploadOutcome::Sanitized {
			original_size: input.len() as u64,
			size: stored.len() as u64,
			dim: Dimensions { width: 32, height: 16 },
		}
	);
	// no temporary leftovers
	assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn svgz_stays_compressed() {
	let dir = tempfile::tempdir().unwrap();
	let input = gzip::deflate(br#"<svg width="10" height="20"><script>x()</script></svg>"#).unwrap();
	let staged = stage(&dir, "drawing.svgz", &input, None);

	let outcome = handler().process(&leader(), &staged).await.unwrap();
	let stored = std::fs::read(&staged.path).unwrap();
	assert!(gzip::is_gzip(&stored));
	assert_eq!(gzip::inflate(&stored, 1 << 20).unwrap(), br#"<svg width="10" height="20"/>"#);
	assert!(matches!(outcome, UploadOutcome::Sanitized { dim: Dimensions { width: 10, height: 20 }, .. }));
}

#[tokio::test]
async fn non_svg_passes_through() {
	let dir = tempfile::tempdir().unwrap();
	let staged = stage(&dir, "photo.png", b"\x89PNG\r\n\x1a\n", Some("image/png"));
	let outcome = handler().process(&Actor::new("bob.example", &[]), &staged).await.unwrap();
	assert_eq!(outcome, UploadOutcome::Passthrough);
	assert_eq!(std::fs::read(&staged.path).unwrap(), b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn octet_stream_is_sniffed() {
	let dir = tempfile::tempdir().unwrap();
	let staged = stage(&dir, "blob", b"<svg><circle r=\"2\" onclick=\"x()\"/></svg>", Some("application/octet-stream"));
	let outcome = handler().process(&leader(), &staged).await.unwrap();
	assert!(matches!(outcome, UploadOutcome::Sanitized { .. }));
	assert_eq!(std::fs::read_to_string(&staged.path).unwrap(), "<svg><circle r=\"2\"/></svg>");
}

struct CountingPermission {
	calls: AtomicUsize,
}

#[async_trait]
impl UploadPermission for CountingPermission {
	async fn user_can_upload(&self, _actor: &Actor) -> bool {
		self.calls.fetch_add(1, Ordering::SeqCst);
		false
	}
}

#[tokio::test]
async fn permission_denied_never_sanitizes() {
	let dir = tempfile::tempdir().unwrap();
	let staged = stage(&dir, "icon.svg", b"<svg/>", None);
	let perm = Arc::new(CountingPermission { calls: AtomicUsize::new(0) });
	let handler = UploadHandler::from_config(&SvgConfig::default(), perm.clone()).unwrap();

	let err = handler.process(&leader(), &staged).await.unwrap_err();
	assert!(matches!(err, Error::PermissionDenied));
	assert_eq!(perm.calls.load(Ordering::SeqCst), 1);
	assert!(!staged.path.exists());
}

#[tokio::test]
async fn rejected_file_is_removed() {
	let dir = tempfile::tempdir().unwrap();
	let staged = stage(&dir, "fake.svg", b"<html><script>alert(1)</script></html>", None);

	let err = handler().process(&leader(), &staged).await.unwrap_err();
	assert!(matches!(err, Error::SanitizeFailed(svgward::Error::NotSvg)));
	assert!(err.to_string().starts_with("file could not be sanitized"));
	assert!(!staged.path.exists());
}

#[tokio::test]
async fn failed_store_removes_original() {
	let dir = tempfile::tempdir().unwrap();
	let staged = stage(&dir, "icon.svg", br#"<svg onload="alert(1)"><rect/></svg>"#, None);
	// the temporary sibling cannot be written when a directory holds its name
	let blocker = dir.path().join("icon.svg.sanitized");
	std::fs::create_dir(&blocker).unwrap();

	let err = handler().process(&leader(), &staged).await.unwrap_err();
	assert!(matches!(err, Error::Io(_)));
	assert!(!staged.path.exists());
	assert!(blocker.is_dir());
}

#[tokio::test]
async fn empty_file_is_rejected() {
	let dir = tempfile::tempdir().unwrap();
	let staged = stage(&dir, "empty.svg", b"", None);
	let err = handler().process(&leader(), &staged).await.unwrap_err();
	assert!(matches!(err, Error::SanitizeFailed(svgward::Error::EmptyInput)));
}

#[tokio::test]
async fn default_dimension_when_unmeasurable() {
	let dir = tempfile::tempdir().unwrap();
	let staged = stage(&dir, "wide.svg", br#"<svg width="100%" height="100%"><rect/></svg>"#, None);
	let config = SvgConfig::from_json(r#"{"upload": {"defaultDimension": 48}}"#).unwrap();
	let handler = UploadHandler::from_config(&config, Arc::new(RolePermission::new(["leader"]))).unwrap();

	let outcome = handler.process(&leader(), &staged).await.unwrap();
	assert!(matches!(outcome, UploadOutcome::Sanitized { dim: Dimensions { width: 48, height: 48 }, .. }));
}

#[tokio::test]
async fn allow_list_swap_applies_to_next_upload() {
	let dir = tempfile::tempdir().unwrap();
	let handler = handler();

	let first = stage(&dir, "a.svg", b"<svg><circle r=\"1\"/><rect/></svg>", None);
	handler.process(&leader(), &first).await.unwrap();
	assert_eq!(std::fs::read_to_string(&first.path).unwrap(), "<svg><circle r=\"1\"/><rect/></svg>");

	handler
		.sanitizer()
		.replace_config(svgward::AllowListConfig::new(["svg", "rect"], ["width"]).unwrap());

	let second = stage(&dir, "b.svg", b"<svg><circle r=\"1\"/><rect/></svg>", None);
	handler.process(&leader(), &second).await.unwrap();
	assert_eq!(std::fs::read_to_string(&second.path).unwrap(), "<svg><rect/></svg>");
}
