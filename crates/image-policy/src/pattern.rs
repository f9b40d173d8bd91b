//! 이미지 패턴 집합 -- 패턴 파일 로딩 및 정규화
//!
//! 패턴 파일은 한 줄에 하나의 패턴을 담습니다. 앞뒤 공백은 제거되며,
//! 빈 줄과 `#`으로 시작하는 줄은 무시됩니다.
//!
//! ```text
//! # comment
//! malicious_repo/.*
//! some_repo/malicious_image
//! python:2\.7.*
//! ```
//!
//! 로딩 시점에는 정규식 문법을 검증하지 않습니다. 잘못된 패턴은
//! [`CompiledPatterns::compile`](crate::classifier::CompiledPatterns::compile)에서 드러납니다.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::ImagePolicyError;

/// Maximum pattern file size (10 MB) to prevent OOM via a hostile file
const MAX_PATTERN_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// 정규화된 이미지 패턴 집합
///
/// 동일한 문자열은 하나로 합쳐집니다. 순회 순서는 사전순이지만
/// 분류 결과는 순서에 의존하지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: BTreeSet<String>,
}

impl PatternSet {
    /// 빈 패턴 집합을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 텍스트 줄에서 패턴 집합을 만듭니다.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = lines
            .into_iter()
            .filter_map(|line| normalize_line(line.as_ref()).map(str::to_owned))
            .collect();
        Self { patterns }
    }

    /// 파일 내용 전체를 파싱합니다.
    ///
    /// `\n`, `\r\n`, 단독 `\r` 모두 줄 구분자로 취급합니다.
    pub fn parse(content: &str) -> Self {
        Self::from_lines(content.split(['\n', '\r']))
    }

    /// 패턴을 하나 추가합니다. 정규화 후 비어있거나 주석이면 무시됩니다.
    ///
    /// 새로 추가되었으면 `true`를 반환합니다.
    pub fn insert(&mut self, pattern: &str) -> bool {
        match normalize_line(pattern) {
            Some(p) => self.patterns.insert(p.to_owned()),
            None => false,
        }
    }

    /// 패턴 수
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// 패턴이 하나도 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// 패턴 포함 여부
    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern)
    }

    /// 패턴 순회
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}

/// 주석/빈 줄이면 `None`, 아니면 공백을 제거한 패턴을 반환합니다.
fn normalize_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        None
    } else {
        Some(trimmed)
    }
}

/// 파일에서 패턴 집합을 로드합니다.
///
/// # Errors
/// - 파일 메타데이터/내용 읽기 실패
/// - 파일 크기 초과 (10 MB)
pub fn load_patterns_from_file(path: &Path) -> Result<PatternSet, ImagePolicyError> {
    // Check file size before reading to prevent OOM
    let metadata = std::fs::metadata(path).map_err(|e| ImagePolicyError::PatternFileLoad {
        path: path.display().to_string(),
        reason: format!("failed to read metadata: {e}"),
    })?;

    if !metadata.is_file() {
        return Err(ImagePolicyError::PatternFileLoad {
            path: path.display().to_string(),
            reason: "not a regular file".to_owned(),
        });
    }

    if metadata.len() > MAX_PATTERN_FILE_SIZE {
        return Err(ImagePolicyError::PatternFileLoad {
            path: path.display().to_string(),
            reason: format!(
                "file too large: {} bytes (max: {MAX_PATTERN_FILE_SIZE})",
                metadata.len()
            ),
        });
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| ImagePolicyError::PatternFileLoad {
            path: path.display().to_string(),
            reason: format!("failed to read file: {e}"),
        })?;

    let patterns = PatternSet::parse(&content);
    tracing::debug!(
        path = %path.display(),
        count = patterns.len(),
        "loaded image patterns"
    );
    Ok(patterns)
}
