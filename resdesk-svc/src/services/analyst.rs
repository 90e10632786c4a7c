//! Fallback-applying operation layer over the model gateway
//!
//! Every operation here degrades to a deterministic fallback value instead of
//! returning an error: a network failure, a non-2xx response, and an
//! unparsable reply all collapse into the same placeholder content. A single
//! bad document never aborts a batch. The `degraded` markers are the only
//! record of which outcome occurred.

use crate::services::gemini::ModelGateway;
use crate::services::prompt;
use resdesk_common::model::{Article, ChatMessage, TaxonomyMode};
use serde_json::Value;
use std::sync::Arc;

/// Taxonomy used when the generation call fails outright.
pub const FALLBACK_TAXONOMY: [&str; 3] = ["General Ecology", "Management", "Unsorted"];

/// Tag assigned when the model names none usable.
pub const FALLBACK_TAG: &str = "Unsorted";

pub const FALLBACK_SYNTHESIS: &str = "Failed to generate synthesis.";
pub const FALLBACK_COMPARATIVE: &str = "Failed to generate comparative analysis.";
pub const FALLBACK_CHAT: &str = "Error communicating with AI.";

/// Model output tag count cap. Binds model output only; user edits through
/// the store are uncapped.
const MAX_MODEL_TAGS: usize = 3;

/// Result of a corpus taxonomy generation call.
#[derive(Debug, Clone)]
pub struct TaxonomyOutcome {
    pub tags: Vec<String>,
    /// True when `tags` is the fixed fallback list
    pub degraded: bool,
}

/// Result of one per-document deep-analysis call.
///
/// Field names mirror the JSON object requested from the model.
#[derive(Debug, Clone)]
pub struct DeepAnalysis {
    pub selected_tags: Vec<String>,
    pub alignment: String,
    pub real_title: String,
    pub year: String,
    pub authors: String,
    pub full_abstract: String,
    pub main_points: String,
    pub conclusions: String,
    pub quotes: Vec<String>,
    pub abnt_draft: String,
    /// True when this is the placeholder produced by a failed call
    pub degraded: bool,
}

impl DeepAnalysis {
    /// Placeholder record for a failed analysis call.
    pub fn fallback() -> Self {
        Self {
            selected_tags: vec![FALLBACK_TAG.to_string()],
            alignment: "Neutral".to_string(),
            real_title: "Unknown Title".to_string(),
            year: "Unknown".to_string(),
            authors: String::new(),
            full_abstract: "Error processing abstract.".to_string(),
            main_points: "Error processing points.".to_string(),
            conclusions: "Error processing conclusions.".to_string(),
            quotes: Vec::new(),
            abnt_draft: "Error processing reference.".to_string(),
            degraded: true,
        }
    }

    /// Build from the model's parsed JSON object, applying the defensive
    /// normalizations (the only validation applied to model output):
    ///
    /// - a single tag instead of an array is wrapped in a one-element array
    ///   (the singular `selectedTag` key is also honored);
    /// - more than 3 tags are truncated to the first 3, and an empty list
    ///   becomes `["Unsorted"]` so ingested articles always carry 1-3 tags;
    /// - a non-array `quotes` is coerced to an empty list.
    ///
    /// Everything else is taken on trust.
    pub fn from_value(value: &Value) -> Self {
        let mut selected_tags = match value.get("selectedTags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(tag)) => vec![tag.clone()],
            _ => match value.get("selectedTag").and_then(Value::as_str) {
                Some(tag) => vec![tag.to_string()],
                None => Vec::new(),
            },
        };
        if selected_tags.is_empty() {
            selected_tags.push(FALLBACK_TAG.to_string());
        }
        selected_tags.truncate(MAX_MODEL_TAGS);

        let quotes = match value.get("quotes") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        let field = |key: &str| -> String {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            selected_tags,
            alignment: field("alignment"),
            real_title: field("realTitle"),
            year: field("year"),
            authors: field("authors"),
            full_abstract: field("fullAbstract"),
            main_points: field("mainPoints"),
            conclusions: field("conclusions"),
            quotes,
            abnt_draft: field("abntDraft"),
            degraded: false,
        }
    }
}

/// Analyst service: prompt construction + gateway call + fallback policy.
#[derive(Clone)]
pub struct Analyst {
    gateway: Arc<dyn ModelGateway>,
}

impl Analyst {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Generate the corpus taxonomy. Never fails: a failed call yields the
    /// fixed fallback list, marked degraded.
    pub async fn generate_taxonomy(
        &self,
        titles: &[String],
        user_guide: &str,
        mode: TaxonomyMode,
    ) -> TaxonomyOutcome {
        let request = prompt::taxonomy_prompt(titles, user_guide, mode);
        match self.gateway.generate(&request, true).await {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => match value.get("tags").and_then(Value::as_array) {
                    Some(items) => TaxonomyOutcome {
                        tags: items
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect(),
                        degraded: false,
                    },
                    None => {
                        tracing::warn!("Taxonomy reply missing tags array, using fallback");
                        Self::fallback_taxonomy()
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Taxonomy reply was not valid JSON, using fallback");
                    Self::fallback_taxonomy()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Taxonomy generation failed, using fallback");
                Self::fallback_taxonomy()
            }
        }
    }

    fn fallback_taxonomy() -> TaxonomyOutcome {
        TaxonomyOutcome {
            tags: FALLBACK_TAXONOMY.iter().map(|t| t.to_string()).collect(),
            degraded: true,
        }
    }

    /// Deep-analyze one document against the fixed taxonomy. Never fails: a
    /// failed call yields the placeholder record.
    pub async fn analyze_document(
        &self,
        text: &str,
        user_guide: &str,
        taxonomy: &[String],
    ) -> DeepAnalysis {
        let request = prompt::analysis_prompt(text, user_guide, taxonomy);
        match self.gateway.generate(&request, true).await {
            Ok(reply) => match serde_json::from_str::<Value>(&reply) {
                Ok(value) => DeepAnalysis::from_value(&value),
                Err(e) => {
                    tracing::warn!(error = %e, "Analysis reply was not valid JSON, using placeholder");
                    DeepAnalysis::fallback()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Deep analysis failed, using placeholder");
                DeepAnalysis::fallback()
            }
        }
    }

    /// Generate the synthesis (gap-analysis) report over the subset of
    /// articles carrying `tag` (or all articles when `tag` is None).
    pub async fn synthesis_report(&self, articles: &[Article], tag: Option<&str>) -> String {
        let subset: Vec<Article> = articles
            .iter()
            .filter(|a| tag.map_or(true, |t| a.tags.iter().any(|at| at == t)))
            .cloned()
            .collect();
        let request = prompt::synthesis_prompt(&subset, tag);
        match self.gateway.generate(&request, false).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "Synthesis report generation failed");
                FALLBACK_SYNTHESIS.to_string()
            }
        }
    }

    /// Generate the comparative (thesis validation) report over the whole
    /// library.
    pub async fn comparative_report(&self, user_guide: &str, articles: &[Article]) -> String {
        let request = prompt::comparative_prompt(user_guide, articles);
        match self.gateway.generate(&request, false).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "Comparative report generation failed");
                FALLBACK_COMPARATIVE.to_string()
            }
        }
    }

    /// Answer one chat turn over the full corpus.
    pub async fn chat(
        &self,
        articles: &[Article],
        history: &[ChatMessage],
        question: &str,
    ) -> String {
        let request = prompt::chat_prompt(articles, history, question);
        match self.gateway.generate(&request, false).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Chat turn failed");
                FALLBACK_CHAT.to_string()
            }
        }
    }
}
