//! 감사 모드와 분류 결과 타입

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ImagePolicyError;

/// 감사 모드
///
/// 패턴 목록을 어떻게 해석할지 결정합니다. 한 번의 감사 동안 변경되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 패턴은 금지된 이미지 -- 매칭되면 플래그
    Blacklist,
    /// 패턴은 승인된 이미지 -- 매칭되지 않으면 플래그
    Whitelist,
}

impl Mode {
    /// 모드 이름 (`blacklist` / `whitelist`)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blacklist => "blacklist",
            Self::Whitelist => "whitelist",
        }
    }

    /// 패턴 매칭 여부에 이 모드의 정책을 적용합니다.
    pub fn outcome(self, is_match: bool) -> Outcome {
        let flagged = match self {
            Self::Blacklist => is_match,
            Self::Whitelist => !is_match,
        };
        if flagged {
            Outcome::Flagged
        } else {
            Outcome::Clear
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ImagePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blacklist" => Ok(Self::Blacklist),
            "whitelist" => Ok(Self::Whitelist),
            _ => Err(ImagePolicyError::InvalidMode(s.to_owned())),
        }
    }
}

/// 이미지 하나에 대한 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 정책 위반 (bad image)
    Flagged,
    /// 정책 준수 (good image)
    Clear,
}

impl Outcome {
    /// 플래그 여부
    pub fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_modes() {
        assert_eq!("blacklist".parse::<Mode>().unwrap(), Mode::Blacklist);
        assert_eq!("whitelist".parse::<Mode>().unwrap(), Mode::Whitelist);
        assert_eq!(" Whitelist ".parse::<Mode>().unwrap(), Mode::Whitelist);
    }

    #[test]
    fn parse_unknown_mode_is_invalid_mode() {
        let err = "greylist".parse::<Mode>().unwrap_err();
        assert!(matches!(err, ImagePolicyError::InvalidMode(ref m) if m == "greylist"));
    }

    #[test]
    fn parse_empty_mode_is_invalid_mode() {
        assert!(matches!(
            "".parse::<Mode>(),
            Err(ImagePolicyError::InvalidMode(_))
        ));
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(Mode::Blacklist.to_string(), "blacklist");
        assert_eq!(Mode::Whitelist.to_string(), "whitelist");
    }

    #[test]
    fn blacklist_flags_matches() {
        assert_eq!(Mode::Blacklist.outcome(true), Outcome::Flagged);
        assert_eq!(Mode::Blacklist.outcome(false), Outcome::Clear);
    }

    #[test]
    fn whitelist_flags_non_matches() {
        assert_eq!(Mode::Whitelist.outcome(true), Outcome::Clear);
        assert_eq!(Mode::Whitelist.outcome(false), Outcome::Flagged);
    }

    #[test]
    fn mode_serde_lowercase() {
        let json = serde_json::to_string(&Mode::Whitelist).unwrap();
        assert_eq!(json, "\"whitelist\"");
        let mode: Mode = serde_json::from_str("\"blacklist\"").unwrap();
        assert_eq!(mode, Mode::Blacklist);
        assert!(serde_json::from_str::<Mode>("\"greylist\"").is_err());
    }
}
