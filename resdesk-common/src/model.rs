//! Domain model for the ResDesk annotated library
//!
//! Serialized field names stay camelCase so workspace files written by
//! earlier builds of the tool load unchanged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Character budget for the locally-derived excerpt kept as a display
/// fallback when the model returns no abstract.
pub const EXCERPT_CHARS: usize = 300;

/// A freshly uploaded document, before analysis.
///
/// Transient: consumed by the classification pipeline and merged into an
/// [`Article`]; never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    /// Opaque unique identifier, carried into the resulting Article
    pub id: Uuid,
    /// Original filename
    pub title: String,
    /// Complete source text
    pub full_text: String,
}

impl RawDocument {
    pub fn new(title: impl Into<String>, full_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            full_text: full_text.into(),
        }
    }
}

/// The persistent unit of the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Stable identifier assigned at ingestion
    pub id: Uuid,

    /// Original filename (fallback display)
    pub title: String,

    /// Complete source text, retained for chat and search
    pub full_text: String,

    /// First-300-character excerpt of the full text (fallback display only)
    #[serde(rename = "abstract")]
    pub excerpt: String,

    /// Paper title as extracted from the document body ("Unknown Title" on failure)
    #[serde(default)]
    pub real_title: String,

    /// Publication year, free-form ("Unknown" on failure)
    #[serde(default)]
    pub year: String,

    /// Author list, free-form
    #[serde(default)]
    pub authors: String,

    /// Verbatim abstract extracted by the model; UI falls back to `excerpt`
    #[serde(default)]
    pub full_abstract: String,

    /// Detailed methods/results summary (markdown-bearing)
    #[serde(default)]
    pub main_points: String,

    /// Detailed conclusions summary (markdown-bearing)
    #[serde(default)]
    pub conclusions: String,

    /// Category labels. At ingestion: 1-3 tags, all drawn from the run's
    /// taxonomy. User edits afterwards are uncapped.
    #[serde(default)]
    pub tags: Vec<String>,

    /// "Supports Thesis" / "Contradicts Thesis" / "Neutral".
    ///
    /// Kept as a string: the model is not guaranteed to emit the canonical
    /// labels, and filtering is case-insensitive substring containment.
    #[serde(default)]
    pub alignment: String,

    /// Direct quotes. Ten are requested from the model; the count is not
    /// guaranteed, and the user may append or remove entries.
    #[serde(default)]
    pub quotes: Vec<String>,

    /// Formatted bibliographic citation draft
    #[serde(default)]
    pub abnt_draft: String,

    /// True when this record carries fallback placeholder content because the
    /// analysis call failed. Defaulted so older workspace files still load.
    #[serde(default)]
    pub degraded: bool,
}

impl Article {
    /// Compute the local excerpt kept as a display fallback.
    ///
    /// Char-boundary safe; appends "..." like the original excerpts did.
    pub fn excerpt_of(full_text: &str) -> String {
        let mut excerpt: String = full_text.chars().take(EXCERPT_CHARS).collect();
        excerpt.push_str("...");
        excerpt
    }

    /// Bibliography entry: the model's citation draft, or a synthesized
    /// fallback from authors/title/year when the draft is empty.
    pub fn citation(&self) -> String {
        if !self.abnt_draft.is_empty() {
            return self.abnt_draft.clone();
        }
        let authors = if self.authors.is_empty() {
            "UNKNOWN"
        } else {
            &self.authors
        };
        let title = if self.real_title.is_empty() {
            &self.title
        } else {
            &self.real_title
        };
        let year = if self.year.is_empty() { "s.d." } else { &self.year };
        format!("{}. {}. {}.", authors, title, year)
    }
}

/// Classification session state.
///
/// A run moves `Setup -> Processing -> Ready` and never backwards; `Ready`
/// is terminal for the run (a reloaded workspace also lands here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Awaiting thesis text and file selection
    #[default]
    Setup,
    /// Taxonomy generation + per-document deep analysis in progress
    Processing,
    /// Library populated; browse/report/chat features available
    Ready,
}

/// Taxonomy size/granularity requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyMode {
    /// 3-5 high-level disciplines
    Broad,
    /// 5-10 common academic themes
    #[default]
    Standard,
    /// 10-20 niche topics
    Specific,
}

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

/// One turn of the chat-with-library conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Ai,
            text: text.into(),
        }
    }
}

/// Workspace persistence document (save-to-file / load-from-file).
///
/// `articles` is required: a JSON document without it is rejected as an
/// invalid workspace. Everything else defaults, so minimal or older files
/// still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub articles: Vec<Article>,
    #[serde(default)]
    pub taxonomy: Vec<String>,
    #[serde(default)]
    pub user_guide: String,
    #[serde(default)]
    pub chat_messages: Vec<ChatMessage>,
    #[serde(default)]
    pub comp_report: Option<String>,
    #[serde(default)]
    pub synth_report: Option<String>,
    #[serde(default)]
    pub taxonomy_mode: TaxonomyMode,
}
