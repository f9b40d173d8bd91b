//! 에러 타입 -- 도메인별 에러 정의

/// imagewarden 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 이미지 감사(패턴/모드/Docker) 에러
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 이미지 감사 에러
///
/// 정책 크레이트의 세부 에러가 이 타입으로 변환되어 상위 레이어로 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// 알 수 없는 감사 모드
    #[error("invalid mode: '{0}' (expected: blacklist, whitelist)")]
    InvalidMode(String),

    /// 정규식으로 컴파일할 수 없는 패턴
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// 패턴 파일 로딩 실패
    #[error("pattern file error: {0}")]
    PatternSource(String),

    /// Docker 데몬 연결/호출 실패
    #[error("docker error: {0}")]
    Docker(String),
}
