use std::fs;
use std::path::Path;

use axum::http::StatusCode;
use axum_test::TestServer;
use partvault::api::create_router;
use partvault::models::*;
use partvault::vault::Vault;
use tempfile::TempDir;

const PART: &str = "Bracket.SLDPRT";

fn setup() -> (TestServer, TempDir) {
    let vault = Vault::default();
    let project = tempfile::tempdir().expect("Failed to create temp dir");
    vault
        .init_project(project.path())
        .expect("Failed to init project");
    let server = TestServer::new(create_router(vault)).expect("Failed to create test server");
    (server, project)
}

fn seed_working(root: &Path, name: &str, content: &str) {
    fs::write(root.join("Working").join(name), content).expect("Failed to seed working copy");
}

fn create_input(root: &Path, note: &str) -> CreateVersionInput {
    CreateVersionInput {
        project_path: root.to_path_buf(),
        change_note: note.to_string(),
        author: Some("amy".to_string()),
    }
}

fn version_input(root: &Path, version: &str) -> VersionRefInput {
    VersionRefInput {
        project_path: root.to_path_buf(),
        version: version.to_string(),
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let (server, _project) = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
    }
}

mod versions {
    use super::*;

    #[tokio::test]
    async fn create_returns_201_with_the_new_record() {
        let (server, project) = setup();
        seed_working(project.path(), PART, "solid bracket rev A");

        let response = server
            .post(&format!("/api/v1/parts/{PART}/versions"))
            .json(&create_input(project.path(), "first cut"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let record: VersionRecord = response.json();
        assert_eq!(record.version.to_string(), "v001");
        assert_eq!(record.author, "amy");
        assert_eq!(record.change_note, "first cut");
        assert!(record.locked);
    }

    #[tokio::test]
    async fn create_without_a_working_copy_is_404() {
        let (server, project) = setup();

        let response = server
            .post(&format!("/api/v1/parts/{PART}/versions"))
            .json(&create_input(project.path(), "nothing there"))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["kind"], "working_file_missing");
    }

    #[tokio::test]
    async fn history_returns_snapshots_oldest_first() {
        let (server, project) = setup();
        seed_working(project.path(), PART, "rev A");
        server
            .post(&format!("/api/v1/parts/{PART}/versions"))
            .json(&create_input(project.path(), "rev A"))
            .await
            .assert_status(StatusCode::CREATED);
        seed_working(project.path(), PART, "rev B");
        server
            .post(&format!("/api/v1/parts/{PART}/versions"))
            .json(&create_input(project.path(), "rev B"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(&format!(
                "/api/v1/parts/{PART}/versions?project_path={}",
                project.path().display()
            ))
            .await;

        response.assert_status_ok();
        let history: Vec<VersionRecord> = response.json();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].version.to_string(), "v001");
        assert_eq!(history[0].change_note, "rev A");
        assert_eq!(history[1].version.to_string(), "v002");
    }

    #[tokio::test]
    async fn latest_is_the_sentinel_for_untracked_parts() {
        let (server, project) = setup();

        let response = server
            .get(&format!(
                "/api/v1/parts/{PART}/versions/latest?project_path={}",
                project.path().display()
            ))
            .await;

        response.assert_status_ok();
        let latest: LatestVersionResponse = response.json();
        assert_eq!(latest.version.to_string(), "v000");
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn freeze_returns_the_new_version_id() {
        let (server, project) = setup();
        seed_working(project.path(), PART, "solid bracket rev A");

        let response = server
            .post(&format!("/api/v1/parts/{PART}/freeze"))
            .json(&create_input(project.path(), "first cut"))
            .await;

        response.assert_status_ok();
        let frozen: FreezeResponse = response.json();
        assert_eq!(frozen.version.to_string(), "v001");
    }

    #[tokio::test]
    async fn release_then_rework_walks_the_lifecycle() {
        let (server, project) = setup();
        seed_working(project.path(), PART, "solid bracket rev A");
        server
            .post(&format!("/api/v1/parts/{PART}/freeze"))
            .json(&create_input(project.path(), "first cut"))
            .await
            .assert_status_ok();

        server
            .post(&format!("/api/v1/parts/{PART}/release"))
            .json(&version_input(project.path(), "v001"))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let state: PartStateResponse = server
            .get(&format!(
                "/api/v1/parts/{PART}/state?project_path={}",
                project.path().display()
            ))
            .await
            .json();
        assert_eq!(state.state, PartState::Released);

        server
            .post(&format!("/api/v1/parts/{PART}/rework"))
            .json(&version_input(project.path(), "v001"))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let state: PartStateResponse = server
            .get(&format!(
                "/api/v1/parts/{PART}/state?project_path={}",
                project.path().display()
            ))
            .await
            .json();
        assert_eq!(state.state, PartState::Working);
    }

    #[tokio::test]
    async fn releasing_a_missing_version_is_404_with_its_kind() {
        let (server, project) = setup();
        seed_working(project.path(), PART, "solid bracket rev A");
        server
            .post(&format!("/api/v1/parts/{PART}/freeze"))
            .json(&create_input(project.path(), "first cut"))
            .await
            .assert_status_ok();

        let response = server
            .post(&format!("/api/v1/parts/{PART}/release"))
            .json(&version_input(project.path(), "v009"))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["kind"], "version_not_found");
    }

    #[tokio::test]
    async fn releasing_without_a_lifecycle_document_is_422() {
        let (server, project) = setup();
        seed_working(project.path(), PART, "solid bracket rev A");
        server
            .post(&format!("/api/v1/parts/{PART}/freeze"))
            .json(&create_input(project.path(), "first cut"))
            .await
            .assert_status_ok();
        fs::remove_file(
            project
                .path()
                .join("Parts")
                .join("Bracket")
                .join("part_meta.json"),
        )
        .expect("Failed to delete document");

        let response = server
            .post(&format!("/api/v1/parts/{PART}/release"))
            .json(&version_input(project.path(), "v001"))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["kind"], "invalid_transition");
    }
}

mod state {
    use super::*;

    #[tokio::test]
    async fn untracked_parts_are_working() {
        let (server, project) = setup();

        let response = server
            .get(&format!(
                "/api/v1/parts/{PART}/state?project_path={}",
                project.path().display()
            ))
            .await;

        response.assert_status_ok();
        let state: PartStateResponse = response.json();
        assert_eq!(state.state, PartState::Working);
    }

    #[tokio::test]
    async fn corrupt_documents_report_unknown() {
        let (server, project) = setup();
        seed_working(project.path(), PART, "solid bracket rev A");
        server
            .post(&format!("/api/v1/parts/{PART}/freeze"))
            .json(&create_input(project.path(), "first cut"))
            .await
            .assert_status_ok();
        fs::write(
            project
                .path()
                .join("Parts")
                .join("Bracket")
                .join("part_meta.json"),
            "{ not json",
        )
        .expect("Failed to corrupt document");

        let response = server
            .get(&format!(
                "/api/v1/parts/{PART}/state?project_path={}",
                project.path().display()
            ))
            .await;

        response.assert_status_ok();
        let state: PartStateResponse = response.json();
        assert_eq!(state.state, PartState::Unknown);
    }

    #[tokio::test]
    async fn summary_reports_the_lifecycle_row() {
        let (server, project) = setup();
        seed_working(project.path(), PART, "solid bracket rev A");
        server
            .post(&format!("/api/v1/parts/{PART}/freeze"))
            .json(&create_input(project.path(), "first cut"))
            .await
            .assert_status_ok();
        server
            .post(&format!("/api/v1/parts/{PART}/release"))
            .json(&version_input(project.path(), "v001"))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let response = server
            .get(&format!(
                "/api/v1/parts/{PART}/summary?project_path={}",
                project.path().display()
            ))
            .await;

        response.assert_status_ok();
        let summary: PartSummary = response.json();
        assert_eq!(summary.name, "Bracket");
        assert_eq!(summary.state, PartState::Released);
        assert_eq!(summary.latest_version, "v001");
        assert_eq!(summary.released_version.as_deref(), Some("v001"));
    }
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn init_creates_the_layout() {
        let (server, _unused) = setup();
        let fresh = tempfile::tempdir().expect("Failed to create temp dir");

        let response = server
            .post("/api/v1/projects/init")
            .json(&InitProjectInput {
                project_path: fresh.path().to_path_buf(),
            })
            .await;

        response.assert_status(StatusCode::NO_CONTENT);
        assert!(fresh.path().join("Working").is_dir());
        assert!(fresh.path().join("Parts").is_dir());
    }

    #[tokio::test]
    async fn parts_listing_covers_every_tracked_part() {
        let (server, project) = setup();
        seed_working(project.path(), "Axle.SLDPRT", "shaft");
        seed_working(project.path(), PART, "solid bracket rev A");
        for file in ["Axle.SLDPRT", PART] {
            server
                .post(&format!("/api/v1/parts/{file}/versions"))
                .json(&create_input(project.path(), "first cut"))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(&format!(
                "/api/v1/parts?project_path={}",
                project.path().display()
            ))
            .await;

        response.assert_status_ok();
        let parts: Vec<PartSummary> = response.json();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "Axle");
        assert_eq!(parts[1].name, "Bracket");
    }
}
