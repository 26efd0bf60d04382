//! Core types used throughout the project.

use std::fmt;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// Error returned when a raw tag is not a supported language.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported language tag '{tag}'")]
pub struct UnknownLanguage {
    /// The rejected tag.
    pub tag: String,
}

/// Interface languages supported by the site (closed set).
///
/// `en` is the designated fallback: an absent, invalid, or unloadable
/// selection degrades to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    #[default]
    En,
    Fr,
    Es,
    It,
    Pt,
    De,
    Nl,
    Tr,
    Pl,
    Hi,
    Ru,
    Id,
    Ja,
    Zh,
    Ko,
    Vi,
    Th,
    Uk,
    Ar,
}

impl LanguageCode {
    /// The designated fallback language.
    pub const FALLBACK: Self = Self::En;

    /// All supported codes, in picker order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::En,
            Self::Fr,
            Self::Es,
            Self::It,
            Self::Pt,
            Self::De,
            Self::Nl,
            Self::Tr,
            Self::Pl,
            Self::Hi,
            Self::Ru,
            Self::Id,
            Self::Ja,
            Self::Zh,
            Self::Ko,
            Self::Vi,
            Self::Th,
            Self::Uk,
            Self::Ar,
        ]
    }

    /// Lowercase language tag (e.g. `"en"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::It => "it",
            Self::Pt => "pt",
            Self::De => "de",
            Self::Nl => "nl",
            Self::Tr => "tr",
            Self::Pl => "pl",
            Self::Hi => "hi",
            Self::Ru => "ru",
            Self::Id => "id",
            Self::Ja => "ja",
            Self::Zh => "zh",
            Self::Ko => "ko",
            Self::Vi => "vi",
            Self::Th => "th",
            Self::Uk => "uk",
            Self::Ar => "ar",
        }
    }

    /// The language's self-designation, shown by language pickers.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Fr => "Français",
            Self::Es => "Español",
            Self::It => "Italiano",
            Self::Pt => "Português",
            Self::De => "Deutsch",
            Self::Nl => "Nederlands",
            Self::Tr => "Türkçe",
            Self::Pl => "Polski",
            Self::Hi => "हिन्दी",
            Self::Ru => "Русский",
            Self::Id => "Bahasa Indonesia",
            Self::Ja => "日本語",
            Self::Zh => "中文",
            Self::Ko => "한국어",
            Self::Vi => "Tiếng Việt",
            Self::Th => "ไทย",
            Self::Uk => "Українська",
            Self::Ar => "العربية",
        }
    }

    /// Rendering direction of the language.
    #[must_use]
    pub const fn direction(self) -> TextDirection {
        match self {
            Self::Ar => TextDirection::RightToLeft,
            _ => TextDirection::LeftToRight,
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        match tag.as_str() {
            "en" => Ok(Self::En),
            "fr" => Ok(Self::Fr),
            "es" => Ok(Self::Es),
            "it" => Ok(Self::It),
            "pt" => Ok(Self::Pt),
            "de" => Ok(Self::De),
            "nl" => Ok(Self::Nl),
            "tr" => Ok(Self::Tr),
            "pl" => Ok(Self::Pl),
            "hi" => Ok(Self::Hi),
            "ru" => Ok(Self::Ru),
            "id" => Ok(Self::Id),
            "ja" => Ok(Self::Ja),
            "zh" => Ok(Self::Zh),
            "ko" => Ok(Self::Ko),
            "vi" => Ok(Self::Vi),
            "th" => Ok(Self::Th),
            "uk" => Ok(Self::Uk),
            "ar" => Ok(Self::Ar),
            _ => Err(UnknownLanguage { tag }),
        }
    }
}

/// Horizontal rendering direction of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextDirection {
    /// Left-to-right scripts.
    LeftToRight,
    /// Right-to-left scripts.
    RightToLeft,
}

impl TextDirection {
    /// Value for the document's `dir` attribute.
    #[must_use]
    pub const fn html_attr(self) -> &'static str {
        match self {
            Self::LeftToRight => "ltr",
            Self::RightToLeft => "rtl",
        }
    }
}
