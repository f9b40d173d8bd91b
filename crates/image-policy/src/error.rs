//! 이미지 정책 에러 타입
//!
//! [`ImagePolicyError`]는 패턴 로딩, 분류, Docker 스냅샷 수집 중 발생하는 모든 에러를 표현합니다.
//! `From<ImagePolicyError> for WardenError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use imagewarden_core::error::{AuditError, WardenError};

/// 이미지 정책 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ImagePolicyError {
    /// 알 수 없는 감사 모드 문자열
    #[error("invalid mode: '{0}' (expected: blacklist, whitelist)")]
    InvalidMode(String),

    /// 패턴을 정규식으로 컴파일할 수 없음
    #[error("pattern compilation failed for '{pattern}': {reason}")]
    PatternCompilation {
        /// 문제가 된 패턴 원문
        pattern: String,
        /// 컴파일 실패 사유
        reason: String,
    },

    /// 패턴 파일 로딩 실패
    #[error("pattern file load error: {path}: {reason}")]
    PatternFileLoad {
        /// 패턴 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// Docker 소켓 연결 실패
    #[error("docker connection error: {0}")]
    DockerConnection(String),

    /// Docker API 호출 실패
    #[error("docker api error: {0}")]
    DockerApi(String),

    /// Docker 데몬이 이미지를 알지 못함
    #[error("image not found: {0}")]
    ImageNotFound(String),
}

impl From<ImagePolicyError> for WardenError {
    fn from(err: ImagePolicyError) -> Self {
        match &err {
            ImagePolicyError::InvalidMode(mode) => {
                WardenError::Audit(AuditError::InvalidMode(mode.clone()))
            }
            ImagePolicyError::PatternCompilation { pattern, reason } => {
                WardenError::Audit(AuditError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: reason.clone(),
                })
            }
            ImagePolicyError::PatternFileLoad { .. } => {
                WardenError::Audit(AuditError::PatternSource(err.to_string()))
            }
            ImagePolicyError::DockerConnection(_)
            | ImagePolicyError::DockerApi(_)
            | ImagePolicyError::ImageNotFound(_) => {
                WardenError::Audit(AuditError::Docker(err.to_string()))
            }
        }
    }
}
