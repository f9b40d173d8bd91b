//! 감사 실행 -- Docker 스냅샷 수집, 분류, 선택적 레이어 확장
//!
//! ```text
//! DockerClient.list_running_images()
//!        │
//!        ▼
//! Classifier.classify()  ──► ClassificationSink
//!        │
//!        ▼ (include_layers)
//! collect_image_layers(flagged)
//!        │
//!        ▼
//!   AuditReport
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classifier::{ClassificationReport, Classifier};
use crate::docker::{DockerClient, collect_image_layers};
use crate::error::ImagePolicyError;
use crate::sink::ClassificationSink;

/// 감사 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// 분류 결과
    #[serde(flatten)]
    pub classification: ClassificationReport,
    /// 플래그된 이미지의 레이어 (`include_layers`일 때만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<BTreeMap<String, Vec<String>>>,
}

impl AuditReport {
    /// 플래그된 이미지 목록
    pub fn flagged(&self) -> &[String] {
        &self.classification.flagged
    }

    /// 플래그된 이미지가 없는지 여부
    pub fn is_clean(&self) -> bool {
        self.classification.is_clean()
    }
}

/// 실행 중인 이미지 스냅샷을 가져와 분류합니다.
///
/// 스냅샷은 한 번만 수집되며, 분류가 진행되는 동안 Docker 상태가 바뀌어도
/// 결과에 반영되지 않습니다.
///
/// # Errors
/// Docker 스냅샷 또는 레이어 조회 실패 시 해당 `ImagePolicyError`.
pub async fn run_audit<C, S>(
    client: &C,
    classifier: &Classifier,
    include_layers: bool,
    sink: &S,
) -> Result<AuditReport, ImagePolicyError>
where
    C: DockerClient,
    S: ClassificationSink + ?Sized,
{
    let images = client.list_running_images().await?;
    tracing::info!(
        mode = %classifier.mode(),
        images = images.len(),
        patterns = classifier.pattern_count(),
        "auditing running images"
    );

    let classification = classifier.classify(&images, sink);

    let layers = if include_layers {
        Some(collect_image_layers(client, &classification.flagged).await?)
    } else {
        None
    };

    tracing::info!(
        mode = %classification.mode,
        checked = classification.images_checked,
        flagged = classification.flagged.len(),
        "audit completed"
    );

    Ok(AuditReport {
        classification,
        layers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::MockDockerClient;
    use crate::pattern::PatternSet;
    use crate::sink::{NullSink, RecordingSink};
    use crate::types::{Mode, Outcome};

    fn client() -> MockDockerClient {
        MockDockerClient::new()
            .with_container("malicious_repo/some_image")
            .with_container("python:3.7-alpine3.10")
            .with_container("python:3.7-alpine3.10")
            .with_layers("malicious_repo/some_image", &["sha256:111", "sha256:222"])
            .with_layers("python:3.7-alpine3.10", &["sha256:333"])
    }

    fn classifier(mode: Mode) -> Classifier {
        let patterns = PatternSet::from_lines([
            "malicious_repo/.*",
            "some_repo/malicious_image",
            r"python:2\.7.*",
        ]);
        Classifier::new(mode, &patterns).unwrap()
    }

    #[tokio::test]
    async fn blacklist_audit_without_layers() {
        let report = run_audit(&client(), &classifier(Mode::Blacklist), false, &NullSink)
            .await
            .unwrap();
        assert_eq!(report.flagged(), ["malicious_repo/some_image"]);
        assert_eq!(report.classification.images_checked, 2);
        assert!(report.layers.is_none());
    }

    #[tokio::test]
    async fn whitelist_audit_with_layers_expands_flagged_only() {
        let report = run_audit(&client(), &classifier(Mode::Whitelist), true, &NullSink)
            .await
            .unwrap();
        let layers = report.layers.unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers["python:3.7-alpine3.10"], vec!["sha256:333"]);
    }

    #[tokio::test]
    async fn audit_reports_to_sink() {
        let sink = RecordingSink::new();
        run_audit(&client(), &classifier(Mode::Blacklist), false, &sink)
            .await
            .unwrap();
        assert_eq!(sink.outcomes().len(), 2);
        assert_eq!(
            sink.images_with(Outcome::Clear),
            vec!["python:3.7-alpine3.10"]
        );
    }

    #[tokio::test]
    async fn audit_fails_when_daemon_unreachable() {
        let client = MockDockerClient::new().unreachable();
        let result = run_audit(&client, &classifier(Mode::Blacklist), false, &NullSink).await;
        assert!(matches!(result, Err(ImagePolicyError::DockerConnection(_))));
    }

    #[tokio::test]
    async fn audit_with_no_running_containers_is_clean() {
        let report = run_audit(
            &MockDockerClient::new(),
            &classifier(Mode::Whitelist),
            true,
            &NullSink,
        )
        .await
        .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.layers, Some(BTreeMap::new()));
    }

    #[tokio::test]
    async fn report_json_flattens_classification() {
        let report = run_audit(&client(), &classifier(Mode::Blacklist), true, &NullSink)
            .await
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "blacklist");
        assert_eq!(json["flagged"][0], "malicious_repo/some_image");
        assert_eq!(json["layers"]["malicious_repo/some_image"][1], "sha256:222");

        let without = run_audit(&client(), &classifier(Mode::Blacklist), false, &NullSink)
            .await
            .unwrap();
        let json = serde_json::to_value(&without).unwrap();
        assert!(json.get("layers").is_none());
    }
}
