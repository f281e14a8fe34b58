//! Language selectors, store variants, and their declarative field tables.
//!
//! A request's `selectedLanguage` is interpreted two ways:
//! - the resolver maps it permissively onto a store [`Variant`] (unknown → `Base`),
//! - the aggregator parses it exactly into a [`Language`], which carries the
//!   chapter/section/verse [`FieldMapping`] used for grouping.

use crate::config;
use std::fmt;
use std::str::FromStr;

/// Display language accepted by `selectedLanguage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Tamil text of the base collection.
    Tamil,
    /// English fields of the base collection.
    English,
    /// Hindi collection.
    Hindi,
    /// Russian collection.
    Russian,
}

/// Error returned when a selector does not name a [`Language`] exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLanguage(pub String);

impl fmt::Display for UnknownLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown language '{}', expected one of: Tamil, English, Hindi, Russian",
            self.0
        )
    }
}

impl std::error::Error for UnknownLanguage {}

impl Language {
    /// Every selectable language, in display order.
    pub const ALL: [Language; 4] = [
        Language::Tamil,
        Language::English,
        Language::Hindi,
        Language::Russian,
    ];

    /// Canonical selector spelling, also forwarded to the scorer.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Tamil => "Tamil",
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Russian => "Russian",
        }
    }

    /// Store variant holding this language's records.
    pub fn variant(self) -> Variant {
        match self {
            Language::Tamil | Language::English => Variant::Base,
            Language::Hindi => Variant::Hindi,
            Language::Russian => Variant::Russian,
        }
    }

    /// Record fields used as chapter, section and verse identifiers when aggregating.
    pub fn field_mapping(self) -> FieldMapping {
        match self {
            Language::Tamil => FieldMapping {
                chapter: "chapterName",
                section: "sectionName",
                verse: "verse",
            },
            Language::English => FieldMapping {
                chapter: "Chapter_Eng",
                section: "section_eng",
                verse: "translation",
            },
            Language::Hindi => FieldMapping {
                chapter: "chapter",
                section: "section",
                verse: "translation",
            },
            Language::Russian => FieldMapping {
                chapter: "Chapter",
                section: "Section",
                verse: "translation",
            },
        }
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    /// Exact, case-sensitive match on the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chapter/section/verse attribute names for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub chapter: &'static str,
    pub section: &'static str,
    pub verse: &'static str,
}

/// A language-specific record-store shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Tamil/English records (`DETAIL1`, questions in `DETAIL2`).
    Base,
    /// Hindi records.
    Hindi,
    /// Russian records.
    Russian,
}

/// Base verse filter fields, in scorer token order.
pub const BASE_VERSE_FIELDS: &[&str] = &[
    "chapterName",
    "sectionName",
    "verse",
    "translation",
    "explanation",
    "Chapter",
    "Chapter_Eng",
    "section_trans",
    "section_eng",
];

/// Hindi verse filter fields.
pub const HINDI_VERSE_FIELDS: &[&str] = &["chapter", "chapter_group", "section", "translation"];

/// Russian verse filter fields.
pub const RUSSIAN_VERSE_FIELDS: &[&str] = &["Chapter", "Chapter_group", "Section", "translation"];

/// Generic question filter fields.
pub const BASE_QUESTION_FIELDS: &[&str] = &["inputs", "english_input"];

/// Hindi and Russian question filter fields.
pub const LANGUAGE_QUESTION_FIELDS: &[&str] = &["input"];

impl Variant {
    /// All variants.
    pub const ALL: [Variant; 3] = [Variant::Base, Variant::Hindi, Variant::Russian];

    /// Permissive selection used by the resolver: absent, empty, or unrecognized
    /// selectors fall back to [`Variant::Base`].
    pub fn from_selector(selector: Option<&str>) -> Variant {
        selector
            .and_then(|s| s.parse::<Language>().ok())
            .map(Language::variant)
            .unwrap_or(Variant::Base)
    }

    /// Verse collection name.
    pub fn verse_collection(self) -> &'static str {
        match self {
            Variant::Base => config::BASE_VERSE_COLLECTION,
            Variant::Hindi => config::HINDI_VERSE_COLLECTION,
            Variant::Russian => config::RUSSIAN_VERSE_COLLECTION,
        }
    }

    /// Question collection name.
    pub fn question_collection(self) -> &'static str {
        match self {
            Variant::Base => config::BASE_QUESTION_COLLECTION,
            Variant::Hindi => config::HINDI_QUESTION_COLLECTION,
            Variant::Russian => config::RUSSIAN_QUESTION_COLLECTION,
        }
    }

    /// Verse fields a caller may filter on.
    pub fn verse_fields(self) -> &'static [&'static str] {
        match self {
            Variant::Base => BASE_VERSE_FIELDS,
            Variant::Hindi => HINDI_VERSE_FIELDS,
            Variant::Russian => RUSSIAN_VERSE_FIELDS,
        }
    }

    /// Question fields a caller may filter on.
    pub fn question_fields(self) -> &'static [&'static str] {
        match self {
            Variant::Base => BASE_QUESTION_FIELDS,
            Variant::Hindi | Variant::Russian => LANGUAGE_QUESTION_FIELDS,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::Base => "base",
            Variant::Hindi => "hindi",
            Variant::Russian => "russian",
        };
        f.write_str(name)
    }
}
