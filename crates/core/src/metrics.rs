//! 메트릭 상수
//!
//! 모든 메트릭의 이름과 레이블 키를 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `imagewarden_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(imagewarden_core::metrics::IMAGES_FLAGGED_TOTAL, "mode" => "blacklist").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 감사 모드 레이블 키 (blacklist, whitelist)
pub const LABEL_MODE: &str = "mode";

// ─── 분류 엔진 메트릭 ───────────────────────────────────────────────

/// 정책 위반으로 플래그된 이미지 수 (counter, label: mode)
pub const IMAGES_FLAGGED_TOTAL: &str = "imagewarden_images_flagged_total";

/// 정책을 통과한 이미지 수 (counter, label: mode)
pub const IMAGES_CLEAR_TOTAL: &str = "imagewarden_images_clear_total";

/// 마지막 감사에서 로드된 패턴 수 (gauge)
pub const PATTERNS_LOADED: &str = "imagewarden_patterns_loaded";
