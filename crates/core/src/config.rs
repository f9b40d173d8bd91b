//! 설정 관리 -- imagewarden.toml 파싱 및 런타임 설정
//!
//! [`WardenConfig`]는 CLI가 사용하는 모든 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`IMAGEWARDEN_AUDIT_IMAGE_FILE=/etc/images.txt` 형식)
//! 3. 설정 파일 (`imagewarden.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), imagewarden_core::error::WardenError> {
//! use imagewarden_core::config::WardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = WardenConfig::load("imagewarden.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = WardenConfig::parse("[audit]\nimage_file = \"deny.txt\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, WardenError};

/// `--config`가 주어지지 않았을 때 찾는 설정 파일 이름
pub const DEFAULT_CONFIG_FILE: &str = "imagewarden.toml";

/// Docker 호출 타임아웃 상한 (초)
const MAX_DOCKER_TIMEOUT_SECS: u64 = 600;

/// imagewarden 통합 설정
///
/// `imagewarden.toml` 파일의 최상위 구조를 나타냅니다.
/// 모든 섹션은 생략 가능하며, 생략된 값은 기본값을 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// 일반 설정 (로깅)
    #[serde(default)]
    pub general: GeneralConfig,
    /// Docker 연결 설정
    #[serde(default)]
    pub docker: DockerConfig,
    /// 감사 실행 설정
    #[serde(default)]
    pub audit: AuditConfig,
}

impl WardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let mut config = Self::read_file(path.as_ref()).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 명시적인 경로가 없으면 기본 설정 파일을 찾아 로드합니다.
    ///
    /// - `Some(path)`: 파일이 없으면 `ConfigError::FileNotFound`
    /// - `None`: `imagewarden.toml`이 없으면 기본값 + 환경변수 오버라이드
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, WardenError> {
        let config = Self::load_unvalidated(path).await?;
        config.validate()?;
        Ok(config)
    }

    /// 파일(또는 기본값)과 환경변수를 병합하되 검증은 하지 않습니다.
    ///
    /// CLI 인자를 덮어쓴 뒤 [`validate`](Self::validate)를 한 번 호출하는 용도입니다.
    pub async fn load_unvalidated(path: Option<&Path>) -> Result<Self, WardenError> {
        let mut config = match path {
            Some(path) => Self::read_file(path).await?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if tokio::fs::try_exists(default_path).await.unwrap_or(false) {
                    Self::read_file(default_path).await?
                } else {
                    debug!(path = DEFAULT_CONFIG_FILE, "no config file, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let config = Self::read_file(path.as_ref()).await?;
        config.validate()?;
        Ok(config)
    }

    async fn read_file(path: &Path) -> Result<Self, WardenError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                WardenError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, WardenError> {
        toml::from_str(toml_str).map_err(|e| {
            WardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `IMAGEWARDEN_{SECTION}_{FIELD}`
    /// 예: `IMAGEWARDEN_DOCKER_TIMEOUT_SECS=30`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(
            &mut self.general.log_level,
            "IMAGEWARDEN_GENERAL_LOG_LEVEL",
        );
        override_string(
            &mut self.general.log_format,
            "IMAGEWARDEN_GENERAL_LOG_FORMAT",
        );

        // Docker
        override_string(&mut self.docker.socket, "IMAGEWARDEN_DOCKER_SOCKET");
        override_u64(
            &mut self.docker.timeout_secs,
            "IMAGEWARDEN_DOCKER_TIMEOUT_SECS",
        );

        // Audit
        override_string(&mut self.audit.image_file, "IMAGEWARDEN_AUDIT_IMAGE_FILE");
        override_bool(&mut self.audit.layers, "IMAGEWARDEN_AUDIT_LAYERS");
        override_bool(
            &mut self.audit.fail_on_flagged,
            "IMAGEWARDEN_AUDIT_FAIL_ON_FLAGGED",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), WardenError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty", "compact"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.docker.timeout_secs == 0 || self.docker.timeout_secs > MAX_DOCKER_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "docker.timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_DOCKER_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.audit.image_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "audit.image_file".to_owned(),
                reason: "image_file must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty, compact)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "compact".to_owned(),
        }
    }
}

/// Docker 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Docker 소켓 경로 (비어있으면 플랫폼 기본값)
    pub socket: String,
    /// Docker API 호출 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: String::new(),
            timeout_secs: 120,
        }
    }
}

/// 감사 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// 이미지 패턴 파일 경로
    pub image_file: String,
    /// 플래그된 이미지의 레이어 정보 출력 여부
    pub layers: bool,
    /// 플래그된 이미지가 있으면 비정상 종료할지 여부
    pub fail_on_flagged: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            image_file: "images.txt".to_owned(),
            layers: false,
            fail_on_flagged: false,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
