use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Narrative shape of the generated post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StyleVariant {
    #[default]
    Standard,
    Story,
    Faq,
    MythBust,
}

impl StyleVariant {
    pub const ALL: [StyleVariant; 4] = [
        StyleVariant::Standard,
        StyleVariant::Story,
        StyleVariant::Faq,
        StyleVariant::MythBust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleVariant::Standard => "Standard",
            StyleVariant::Story => "Story",
            StyleVariant::Faq => "FAQ",
            StyleVariant::MythBust => "MythBust",
        }
    }

    /// Display name shown to writers.
    pub fn label(&self) -> &'static str {
        match self {
            StyleVariant::Standard => "기본 정보성",
            StyleVariant::Story => "환자 스토리텔링",
            StyleVariant::Faq => "Q&A 질의응답",
            StyleVariant::MythBust => "팩트체크/오해와 진실",
        }
    }

    /// Heading of this variant's structural block; unique per variant.
    pub fn marker(&self) -> &'static str {
        match self {
            StyleVariant::Standard => "[구성 방식: 기본 정보형]",
            StyleVariant::Story => "[구성 방식: 환자 이야기형]",
            StyleVariant::Faq => "[구성 방식: 질문 답변형]",
            StyleVariant::MythBust => "[구성 방식: 오해 바로잡기형]",
        }
    }

    /// Only the story variant consumes a free-text patient episode.
    pub fn accepts_episode(&self) -> bool {
        matches!(self, StyleVariant::Story)
    }
}

impl fmt::Display for StyleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStyle(pub String);

impl fmt::Display for UnknownStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown style '{}' (expected Standard, Story, FAQ or MythBust)",
            self.0
        )
    }
}

impl std::error::Error for UnknownStyle {}

impl FromStr for StyleVariant {
    type Err = UnknownStyle;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "standard" => Ok(StyleVariant::Standard),
            "story" => Ok(StyleVariant::Story),
            "faq" | "q&a" | "qna" | "qa" => Ok(StyleVariant::Faq),
            "mythbust" | "myth_bust" | "myth-bust" => Ok(StyleVariant::MythBust),
            _ => Err(UnknownStyle(value.to_string())),
        }
    }
}

impl TryFrom<String> for StyleVariant {
    type Error = UnknownStyle;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StyleVariant> for String {
    fn from(style: StyleVariant) -> Self {
        style.as_str().to_string()
    }
}
