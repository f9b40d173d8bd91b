#![no_main]

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use imagewarden_policy::{Classifier, Mode, NullSink, PatternSet};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 패턴 목록 (최대 8개로 제한)
    patterns: Vec<String>,
    /// 실행 중인 이미지 이름
    images: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    let patterns = PatternSet::from_lines(input.patterns.iter().take(8));

    let (Ok(black), Ok(white)) = (
        Classifier::new(Mode::Blacklist, &patterns),
        Classifier::new(Mode::Whitelist, &patterns),
    ) else {
        return;
    };

    let flagged_black = black.classify(&input.images, &NullSink).flagged;
    let flagged_white = white.classify(&input.images, &NullSink).flagged;

    // Sorted, unique
    assert!(flagged_black.windows(2).all(|w| w[0] < w[1]));
    assert!(flagged_white.windows(2).all(|w| w[0] < w[1]));

    // Modes partition the snapshot
    let all: BTreeSet<&String> = input.images.iter().collect();
    let black_set: BTreeSet<&String> = flagged_black.iter().collect();
    let white_set: BTreeSet<&String> = flagged_white.iter().collect();
    assert!(black_set.is_disjoint(&white_set));
    assert_eq!(black_set.union(&white_set).count(), all.len());
});
