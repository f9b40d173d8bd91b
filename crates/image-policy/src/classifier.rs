//! 분류 엔진 -- 실행 중인 이미지를 패턴 집합과 모드에 따라 분류
//!
//! 각 패턴은 이미지 이름의 **시작 위치(0)에서** 매칭되어야 합니다 (prefix 매칭).
//! 패턴이 `$`로 끝을 고정하지 않는 한, 패턴이 소비하지 않은 뒷부분은 무시됩니다.
//!
//! | 모드        | 플래그 조건                  |
//! |-------------|------------------------------|
//! | `blacklist` | 하나 이상의 패턴에 매칭      |
//! | `whitelist` | 어떤 패턴에도 매칭되지 않음  |
//!
//! 이미지별 평가는 서로 독립적이며, 첫 번째 매칭에서 나머지 패턴 검사를 중단합니다.
//! 결과는 중복 없는 사전순 목록입니다.
//!
//! # 사용 예시
//! ```
//! use imagewarden_policy::{classify, Mode, NullSink, PatternSet};
//!
//! let patterns = PatternSet::from_lines(["malicious_repo/.*", r"python:2\.7.*"]);
//! let images = ["malicious_repo/some_image", "python:3.7-alpine3.10"];
//!
//! let report = classify(Mode::Blacklist, &patterns, images, &NullSink)?;
//! assert_eq!(report.flagged, vec!["malicious_repo/some_image"]);
//! # Ok::<(), imagewarden_policy::ImagePolicyError>(())
//! ```

use std::collections::BTreeSet;

use imagewarden_core::metrics as m;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::ImagePolicyError;
use crate::pattern::PatternSet;
use crate::sink::ClassificationSink;
use crate::types::{Mode, Outcome};

/// Compiled program size limit per pattern (1 MB)
const PATTERN_SIZE_LIMIT: usize = 1024 * 1024;

/// 컴파일된 패턴 목록
///
/// 분류 전에 모든 패턴을 한 번에 컴파일합니다. 하나라도 실패하면
/// 감사 전체가 실패합니다 (잘못된 패턴을 건너뛰지 않음).
#[derive(Debug, Clone)]
pub struct CompiledPatterns {
    entries: Vec<(String, Regex)>,
}

impl CompiledPatterns {
    /// 패턴 집합 전체를 컴파일합니다.
    ///
    /// # Errors
    /// 정규식 문법 오류 또는 크기 제한 초과 시 해당 패턴을 담은
    /// `ImagePolicyError::PatternCompilation`을 반환합니다.
    pub fn compile(patterns: &PatternSet) -> Result<Self, ImagePolicyError> {
        let entries = patterns
            .iter()
            .map(|pattern| compile_pattern(pattern).map(|regex| (pattern.to_owned(), regex)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// 모든 패턴을 컴파일해 보고 실패한 패턴의 오류를 전부 수집합니다.
    ///
    /// [`compile`](Self::compile)은 첫 오류에서 멈추므로, 파일 점검처럼
    /// 문제를 한 번에 보고해야 할 때 사용합니다. 순서는 패턴 순회 순서입니다.
    pub fn compile_errors(patterns: &PatternSet) -> Vec<ImagePolicyError> {
        patterns
            .iter()
            .filter_map(|pattern| compile_pattern(pattern).err())
            .collect()
    }

    /// 컴파일된 패턴 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 패턴이 하나도 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 이미지가 하나 이상의 패턴에 prefix 매칭되는지 확인합니다.
    pub fn is_match(&self, image: &str) -> bool {
        self.entries
            .iter()
            .any(|(_, regex)| matches_at_start(regex, image))
    }

    /// [`is_match`](Self::is_match)와 같지만 각 시도를 싱크에 보고합니다.
    pub fn is_match_with<S>(&self, image: &str, sink: &S) -> bool
    where
        S: ClassificationSink + ?Sized,
    {
        for (pattern, regex) in &self.entries {
            let is_match = matches_at_start(regex, image);
            sink.record_test(image, pattern, is_match);
            if is_match {
                return true;
            }
        }
        false
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ImagePolicyError> {
    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| ImagePolicyError::PatternCompilation {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })
}

/// Leftmost-first search reports a match starting at 0 whenever one exists.
fn matches_at_start(regex: &Regex, image: &str) -> bool {
    regex.find(image).is_some_and(|m| m.start() == 0)
}

/// 분류 결과
///
/// `flagged`는 중복 없는 사전순 목록이며, 모든 원소는 입력 이미지 집합에 속합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationReport {
    /// 감사 모드
    pub mode: Mode,
    /// 평가한 (중복 제거된) 이미지 수
    pub images_checked: usize,
    /// 정책 위반 이미지 (사전순)
    pub flagged: Vec<String>,
}

impl ClassificationReport {
    /// 플래그된 이미지가 없는지 여부
    pub fn is_clean(&self) -> bool {
        self.flagged.is_empty()
    }

    /// 정책을 통과한 이미지 수
    pub fn clear_count(&self) -> usize {
        self.images_checked - self.flagged.len()
    }
}

/// 모드와 컴파일된 패턴을 묶은 분류기
#[derive(Debug, Clone)]
pub struct Classifier {
    mode: Mode,
    patterns: CompiledPatterns,
}

impl Classifier {
    /// 패턴을 컴파일하여 분류기를 생성합니다.
    pub fn new(mode: Mode, patterns: &PatternSet) -> Result<Self, ImagePolicyError> {
        let patterns = CompiledPatterns::compile(patterns)?;
        metrics::gauge!(m::PATTERNS_LOADED, m::LABEL_MODE => mode.as_str())
            .set(patterns.len() as f64);
        tracing::debug!(mode = %mode, count = patterns.len(), "compiled image patterns");
        Ok(Self { mode, patterns })
    }

    /// 감사 모드
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// 컴파일된 패턴 수
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// 이미지 하나를 분류하고 결과를 싱크에 보고합니다.
    pub fn classify_image<S>(&self, image: &str, sink: &S) -> Outcome
    where
        S: ClassificationSink + ?Sized,
    {
        let is_match = self.patterns.is_match_with(image, sink);
        let outcome = self.mode.outcome(is_match);
        sink.record_outcome(self.mode, image, outcome);
        outcome
    }

    /// 이미지 스냅샷 전체를 분류합니다.
    ///
    /// 입력 중복은 제거되며, 각 이미지는 한 번씩만 평가/보고됩니다.
    pub fn classify<I, T, S>(&self, images: I, sink: &S) -> ClassificationReport
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
        S: ClassificationSink + ?Sized,
    {
        let snapshot: BTreeSet<String> = images
            .into_iter()
            .map(|image| image.as_ref().to_owned())
            .collect();

        let flagged: BTreeSet<&str> = snapshot
            .iter()
            .filter(|image| self.classify_image(image, sink).is_flagged())
            .map(String::as_str)
            .collect();

        ClassificationReport {
            mode: self.mode,
            images_checked: snapshot.len(),
            flagged: flagged.into_iter().map(str::to_owned).collect(),
        }
    }
}

/// 패턴을 컴파일하고 이미지 스냅샷을 한 번에 분류합니다.
///
/// # Errors
/// 패턴 하나라도 컴파일에 실패하면 `ImagePolicyError::PatternCompilation`.
/// 이미지 스냅샷이 비어있어도 패턴 검증은 수행됩니다.
pub fn classify<I, T, S>(
    mode: Mode,
    patterns: &PatternSet,
    images: I,
    sink: &S,
) -> Result<ClassificationReport, ImagePolicyError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
    S: ClassificationSink + ?Sized,
{
    let classifier = Classifier::new(mode, patterns)?;
    Ok(classifier.classify(images, sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{NullSink, RecordingSink};

    fn scenario_patterns() -> PatternSet {
        PatternSet::from_lines([
            "malicious_repo/.*",
            "some_repo/malicious_image",
            r"python:2\.7.*",
        ])
    }

    const SCENARIO_IMAGES: [&str; 2] = ["malicious_repo/some_image", "python:3.7-alpine3.10"];

    #[test]
    fn blacklist_scenario_flags_malicious_repo() {
        let report =
            classify(Mode::Blacklist, &scenario_patterns(), SCENARIO_IMAGES, &NullSink).unwrap();
        assert_eq!(report.flagged, vec!["malicious_repo/some_image"]);
        assert_eq!(report.images_checked, 2);
        assert_eq!(report.clear_count(), 1);
    }

    #[test]
    fn whitelist_scenario_flags_unapproved_python() {
        let report =
            classify(Mode::Whitelist, &scenario_patterns(), SCENARIO_IMAGES, &NullSink).unwrap();
        assert_eq!(report.flagged, vec!["python:3.7-alpine3.10"]);
    }

    #[test]
    fn prefix_match_is_anchored_at_start() {
        let patterns = PatternSet::from_lines(["nginx"]);
        let report = classify(
            Mode::Blacklist,
            &patterns,
            ["nginx:latest", "nginx-custom", "my-nginx"],
            &NullSink,
        )
        .unwrap();
        assert_eq!(report.flagged, vec!["nginx-custom", "nginx:latest"]);
    }

    #[test]
    fn end_anchor_requires_full_match() {
        let patterns = PatternSet::from_lines(["nginx$"]);
        let report = classify(
            Mode::Blacklist,
            &patterns,
            ["nginx", "nginx:latest"],
            &NullSink,
        )
        .unwrap();
        assert_eq!(report.flagged, vec!["nginx"]);
    }

    #[test]
    fn malformed_pattern_fails_whole_run() {
        let patterns = PatternSet::from_lines(["nginx", "["]);
        let err = classify(Mode::Blacklist, &patterns, ["nginx:latest"], &NullSink).unwrap_err();
        match err {
            ImagePolicyError::PatternCompilation { pattern, .. } => assert_eq!(pattern, "["),
            other => panic!("expected PatternCompilation, got {other:?}"),
        }
    }

    #[test]
    fn malformed_pattern_fails_even_without_images() {
        let patterns = PatternSet::from_lines(["(unclosed"]);
        let result = classify(Mode::Whitelist, &patterns, Vec::<String>::new(), &NullSink);
        assert!(matches!(
            result,
            Err(ImagePolicyError::PatternCompilation { .. })
        ));
    }

    #[test]
    fn compile_errors_reports_every_bad_pattern() {
        let patterns = PatternSet::from_lines(["nginx", "[", "redis", "(unclosed"]);
        let errors = CompiledPatterns::compile_errors(&patterns);
        let failed: Vec<String> = errors
            .into_iter()
            .map(|e| match e {
                ImagePolicyError::PatternCompilation { pattern, .. } => pattern,
                other => panic!("expected PatternCompilation, got {other:?}"),
            })
            .collect();
        assert_eq!(failed, vec!["(unclosed", "["]);
    }

    #[test]
    fn compile_errors_empty_for_valid_patterns() {
        assert!(CompiledPatterns::compile_errors(&scenario_patterns()).is_empty());
    }

    #[test]
    fn unsupported_lookaround_is_compilation_error() {
        let patterns = PatternSet::from_lines(["nginx(?!:latest)"]);
        assert!(CompiledPatterns::compile(&patterns).is_err());
    }

    #[test]
    fn empty_patterns_blacklist_flags_nothing() {
        let report = classify(Mode::Blacklist, &PatternSet::new(), ["a", "b"], &NullSink).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn empty_patterns_whitelist_flags_everything() {
        let report = classify(Mode::Whitelist, &PatternSet::new(), ["b", "a"], &NullSink).unwrap();
        assert_eq!(report.flagged, vec!["a", "b"]);
    }

    #[test]
    fn empty_images_gives_empty_result() {
        for mode in [Mode::Blacklist, Mode::Whitelist] {
            let report =
                classify(mode, &scenario_patterns(), Vec::<&str>::new(), &NullSink).unwrap();
            assert!(report.is_clean());
            assert_eq!(report.images_checked, 0);
        }
    }

    #[test]
    fn match_everything_pattern() {
        let patterns = PatternSet::from_lines([".*"]);
        let images = ["alpine", "", "redis:7"];

        let black = classify(Mode::Blacklist, &patterns, images, &NullSink).unwrap();
        assert_eq!(black.flagged, vec!["", "alpine", "redis:7"]);

        let white = classify(Mode::Whitelist, &patterns, images, &NullSink).unwrap();
        assert!(white.is_clean());
    }

    #[test]
    fn empty_width_match_at_start_counts() {
        // "x*" matches the empty prefix of any string
        let patterns = PatternSet::from_lines(["x*"]);
        let report = classify(Mode::Blacklist, &patterns, ["abc"], &NullSink).unwrap();
        assert_eq!(report.flagged, vec!["abc"]);
    }

    #[test]
    fn later_match_does_not_count() {
        let patterns = PatternSet::from_lines(["latest"]);
        let report = classify(Mode::Blacklist, &patterns, ["nginx:latest"], &NullSink).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn duplicate_images_are_evaluated_once() {
        let sink = RecordingSink::new();
        let patterns = PatternSet::from_lines(["nginx"]);
        let report = classify(
            Mode::Blacklist,
            &patterns,
            ["nginx:1", "nginx:1", "redis"],
            &sink,
        )
        .unwrap();
        assert_eq!(report.flagged, vec!["nginx:1"]);
        assert_eq!(report.images_checked, 2);
        assert_eq!(sink.outcomes().len(), 2);
    }

    #[test]
    fn sink_receives_one_outcome_per_image() {
        let sink = RecordingSink::new();
        classify(Mode::Blacklist, &scenario_patterns(), SCENARIO_IMAGES, &sink).unwrap();

        assert_eq!(
            sink.images_with(Outcome::Flagged),
            vec!["malicious_repo/some_image"]
        );
        assert_eq!(
            sink.images_with(Outcome::Clear),
            vec!["python:3.7-alpine3.10"]
        );
        assert!(sink.outcomes().iter().all(|r| r.mode == Mode::Blacklist));
    }

    #[test]
    fn matching_short_circuits_after_first_hit() {
        let sink = RecordingSink::new();
        let patterns = PatternSet::from_lines(["a", "ab", "abc"]);
        let classifier = Classifier::new(Mode::Blacklist, &patterns).unwrap();

        classifier.classify_image("abc", &sink);

        // Patterns iterate in sorted order: "a" matches first
        let tests = sink.tests();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].1, "a");
        assert!(tests[0].2);
    }

    #[test]
    fn non_matching_image_tests_every_pattern() {
        let sink = RecordingSink::new();
        let patterns = PatternSet::from_lines(["a", "b", "c"]);
        let classifier = Classifier::new(Mode::Whitelist, &patterns).unwrap();

        let outcome = classifier.classify_image("zzz", &sink);
        assert_eq!(outcome, Outcome::Flagged);
        assert_eq!(sink.tests().len(), 3);
        assert!(sink.tests().iter().all(|(_, _, m)| !m));
    }

    #[test]
    fn classifier_reports_mode_and_pattern_count() {
        let classifier = Classifier::new(Mode::Whitelist, &scenario_patterns()).unwrap();
        assert_eq!(classifier.mode(), Mode::Whitelist);
        assert_eq!(classifier.pattern_count(), 3);
    }

    #[test]
    fn compiled_patterns_is_match_without_sink() {
        let compiled = CompiledPatterns::compile(&scenario_patterns()).unwrap();
        assert!(compiled.is_match("python:2.7.18"));
        assert!(!compiled.is_match("python:3.11"));
        assert!(!compiled.is_match("docker.io/malicious_repo/x"));
    }

    #[test]
    fn report_serializes_to_json() {
        let report = classify(Mode::Whitelist, &PatternSet::new(), ["a"], &NullSink).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "whitelist");
        assert_eq!(json["images_checked"], 1);
        assert_eq!(json["flagged"][0], "a");
    }

    #[test]
    fn classification_is_idempotent() {
        let patterns = scenario_patterns();
        let images = ["python:2.7", "malicious_repo/x", "alpine", "some_repo/malicious_image"];
        let first = classify(Mode::Blacklist, &patterns, images, &NullSink).unwrap();
        let second = classify(Mode::Blacklist, &patterns, images, &NullSink).unwrap();
        assert_eq!(first, second);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn image_name() -> impl Strategy<Value = String> {
            "[a-z]{1,6}(/[a-z]{1,6})?(:[a-z0-9.]{1,5})?"
        }

        fn literal_prefix() -> impl Strategy<Value = String> {
            "[a-z]{1,4}"
        }

        proptest! {
            #[test]
            fn modes_partition_the_snapshot(
                images in proptest::collection::vec(image_name(), 0..20),
                prefixes in proptest::collection::vec(literal_prefix(), 0..5),
            ) {
                let patterns = PatternSet::from_lines(&prefixes);
                let black = classify(Mode::Blacklist, &patterns, &images, &NullSink).unwrap();
                let white = classify(Mode::Whitelist, &patterns, &images, &NullSink).unwrap();

                let black_set: BTreeSet<&String> = black.flagged.iter().collect();
                let white_set: BTreeSet<&String> = white.flagged.iter().collect();
                let all: BTreeSet<&String> = images.iter().collect();

                prop_assert!(black_set.is_disjoint(&white_set));
                let union: BTreeSet<&String> = black_set.union(&white_set).copied().collect();
                prop_assert_eq!(union, all);
            }

            #[test]
            fn flagged_is_sorted_unique_subset(
                images in proptest::collection::vec(image_name(), 0..20),
                prefixes in proptest::collection::vec(literal_prefix(), 0..5),
            ) {
                let patterns = PatternSet::from_lines(&prefixes);
                let report = classify(Mode::Blacklist, &patterns, &images, &NullSink).unwrap();

                prop_assert!(report.flagged.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(report.flagged.iter().all(|f| images.contains(f)));
            }

            #[test]
            fn literal_prefix_matches_agree_with_starts_with(
                image in image_name(),
                prefix in literal_prefix(),
            ) {
                let compiled = CompiledPatterns::compile(&PatternSet::from_lines([&prefix])).unwrap();
                prop_assert_eq!(compiled.is_match(&image), image.starts_with(&prefix));
            }
        }
    }
}
