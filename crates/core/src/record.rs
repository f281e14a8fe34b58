//! Verse and question records.
//!
//! Each language variant has its own record shape. Field names match the
//! stored JSON documents exactly, including the mixed-case ones, since
//! clients and the scorer address fields by these names. `number` is the
//! cross-variant join key: the same verse carries the same number in every
//! collection it was loaded into, by convention only.

use crate::language::Variant;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Named-field access shared by every record shape.
pub trait Record {
    /// Join key.
    fn number(&self) -> i64;

    /// Returns the textual value of a named field, or `None` if the record
    /// has no such field or it is unset.
    fn field(&self, name: &str) -> Option<&str>;
}

/// Base verse: Tamil text plus parallel English fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KuralRecord {
    #[serde(rename = "chapterName")]
    pub chapter_name: String,
    #[serde(rename = "sectionName")]
    pub section_name: String,
    pub verse: String,
    pub translation: String,
    pub explanation: String,
    pub number: i64,
    #[serde(rename = "Chapter", default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(rename = "Chapter_Eng", default, skip_serializing_if = "Option::is_none")]
    pub chapter_eng: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_group_eng: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_group_tam: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_group_trans: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_eng: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_trans: Option<String>,
}

impl Record for KuralRecord {
    fn number(&self) -> i64 {
        self.number
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "chapterName" => Some(self.chapter_name.as_str()),
            "sectionName" => Some(self.section_name.as_str()),
            "verse" => Some(self.verse.as_str()),
            "translation" => Some(self.translation.as_str()),
            "explanation" => Some(self.explanation.as_str()),
            "Chapter" => self.chapter.as_deref(),
            "Chapter_Eng" => self.chapter_eng.as_deref(),
            "chapter_group_eng" => self.chapter_group_eng.as_deref(),
            "chapter_group_tam" => self.chapter_group_tam.as_deref(),
            "chapter_group_trans" => self.chapter_group_trans.as_deref(),
            "section_eng" => self.section_eng.as_deref(),
            "section_trans" => self.section_trans.as_deref(),
            _ => None,
        }
    }
}

/// Hindi verse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HindiKuralRecord {
    pub chapter: String,
    pub chapter_group: String,
    pub section: String,
    pub translation: String,
    pub number: i64,
}

impl Record for HindiKuralRecord {
    fn number(&self) -> i64 {
        self.number
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "chapter" => Some(self.chapter.as_str()),
            "chapter_group" => Some(self.chapter_group.as_str()),
            "section" => Some(self.section.as_str()),
            "translation" => Some(self.translation.as_str()),
            _ => None,
        }
    }
}

/// Russian verse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RussianKuralRecord {
    #[serde(rename = "Chapter")]
    pub chapter: String,
    #[serde(rename = "Chapter_group")]
    pub chapter_group: String,
    #[serde(rename = "Section")]
    pub section: String,
    pub translation: String,
    pub number: i64,
}

impl Record for RussianKuralRecord {
    fn number(&self) -> i64 {
        self.number
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "Chapter" => Some(self.chapter.as_str()),
            "Chapter_group" => Some(self.chapter_group.as_str()),
            "Section" => Some(self.section.as_str()),
            "translation" => Some(self.translation.as_str()),
            _ => None,
        }
    }
}

/// Generic question/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub inputs: String,
    pub targets: String,
    pub english_input: String,
    pub number: i64,
}

impl Record for QuestionRecord {
    fn number(&self) -> i64 {
        self.number
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "inputs" => Some(self.inputs.as_str()),
            "targets" => Some(self.targets.as_str()),
            "english_input" => Some(self.english_input.as_str()),
            _ => None,
        }
    }
}

/// Hindi or Russian question/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageQuestionRecord {
    pub input: String,
    pub target: String,
    pub number: i64,
}

impl Record for LanguageQuestionRecord {
    fn number(&self) -> i64 {
        self.number
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "input" => Some(self.input.as_str()),
            "target" => Some(self.target.as_str()),
            _ => None,
        }
    }
}

/// A verse from any variant. Serializes as the bare record object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VerseRecord {
    Base(Arc<KuralRecord>),
    Hindi(Arc<HindiKuralRecord>),
    Russian(Arc<RussianKuralRecord>),
}

impl VerseRecord {
    /// Variant the record was read from.
    pub fn variant(&self) -> Variant {
        match self {
            VerseRecord::Base(_) => Variant::Base,
            VerseRecord::Hindi(_) => Variant::Hindi,
            VerseRecord::Russian(_) => Variant::Russian,
        }
    }
}

impl Record for VerseRecord {
    fn number(&self) -> i64 {
        match self {
            VerseRecord::Base(r) => r.number(),
            VerseRecord::Hindi(r) => r.number(),
            VerseRecord::Russian(r) => r.number(),
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        match self {
            VerseRecord::Base(r) => r.field(name),
            VerseRecord::Hindi(r) => r.field(name),
            VerseRecord::Russian(r) => r.field(name),
        }
    }
}

/// A question from any variant. Serializes as the bare record object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuestionEntry {
    Base(Arc<QuestionRecord>),
    Language(Arc<LanguageQuestionRecord>),
}

impl Record for QuestionEntry {
    fn number(&self) -> i64 {
        match self {
            QuestionEntry::Base(r) => r.number(),
            QuestionEntry::Language(r) => r.number(),
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        match self {
            QuestionEntry::Base(r) => r.field(name),
            QuestionEntry::Language(r) => r.field(name),
        }
    }
}
