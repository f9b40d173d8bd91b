//! 분류 관측 싱크
//!
//! 분류 엔진은 전역 로거 대신 [`ClassificationSink`]를 주입받아 이미지별 결과를 보고합니다.
//!
//! - [`TracingSink`]: `tracing` 이벤트 + `metrics` 카운터 (CLI 기본값)
//! - [`RecordingSink`]: 결과를 메모리에 기록 (테스트, 임베딩용)
//! - [`NullSink`]: 아무것도 하지 않음

use std::sync::Mutex;

use imagewarden_core::metrics as m;

use crate::types::{Mode, Outcome};

/// 분류 결과를 받는 관측 싱크
pub trait ClassificationSink {
    /// 이미지 하나의 최종 분류 결과를 기록합니다.
    fn record_outcome(&self, mode: Mode, image: &str, outcome: Outcome);

    /// 이미지-패턴 쌍 하나의 매칭 결과를 기록합니다.
    ///
    /// 기본 구현은 아무것도 하지 않습니다.
    fn record_test(&self, _image: &str, _pattern: &str, _is_match: bool) {}
}

impl<S: ClassificationSink + ?Sized> ClassificationSink for &S {
    fn record_outcome(&self, mode: Mode, image: &str, outcome: Outcome) {
        (**self).record_outcome(mode, image, outcome);
    }

    fn record_test(&self, image: &str, pattern: &str, is_match: bool) {
        (**self).record_test(image, pattern, is_match);
    }
}

/// `tracing` 로그와 메트릭 카운터로 결과를 내보내는 싱크
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ClassificationSink for TracingSink {
    fn record_outcome(&self, mode: Mode, image: &str, outcome: Outcome) {
        match outcome {
            Outcome::Flagged => {
                tracing::info!(mode = %mode, image, "bad image found");
                metrics::counter!(m::IMAGES_FLAGGED_TOTAL, m::LABEL_MODE => mode.as_str())
                    .increment(1);
            }
            Outcome::Clear => {
                tracing::info!(mode = %mode, image, "good image found");
                metrics::counter!(m::IMAGES_CLEAR_TOTAL, m::LABEL_MODE => mode.as_str())
                    .increment(1);
            }
        }
    }

    fn record_test(&self, image: &str, pattern: &str, is_match: bool) {
        tracing::debug!(image, pattern, is_match, "pattern tested");
    }
}

/// 아무것도 기록하지 않는 싱크
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ClassificationSink for NullSink {
    fn record_outcome(&self, _mode: Mode, _image: &str, _outcome: Outcome) {}
}

/// 기록된 분류 결과 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOutcome {
    /// 감사 모드
    pub mode: Mode,
    /// 이미지 이름
    pub image: String,
    /// 분류 결과
    pub outcome: Outcome,
}

/// 결과를 메모리에 기록하는 싱크
#[derive(Debug, Default)]
pub struct RecordingSink {
    outcomes: Mutex<Vec<RecordedOutcome>>,
    tests: Mutex<Vec<(String, String, bool)>>,
}

impl RecordingSink {
    /// 빈 싱크를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기록된 분류 결과 (기록 순서)
    pub fn outcomes(&self) -> Vec<RecordedOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 기록된 (image, pattern, is_match) 매칭 시도 (기록 순서)
    pub fn tests(&self) -> Vec<(String, String, bool)> {
        self.tests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 특정 결과로 기록된 이미지 목록
    pub fn images_with(&self, outcome: Outcome) -> Vec<String> {
        self.outcomes()
            .into_iter()
            .filter(|r| r.outcome == outcome)
            .map(|r| r.image)
            .collect()
    }
}

impl ClassificationSink for RecordingSink {
    fn record_outcome(&self, mode: Mode, image: &str, outcome: Outcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedOutcome {
                mode,
                image: image.to_owned(),
                outcome,
            });
    }

    fn record_test(&self, image: &str, pattern: &str, is_match: bool) {
        self.tests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((image.to_owned(), pattern.to_owned(), is_match));
    }
}
