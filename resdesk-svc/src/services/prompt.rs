//! Prompt construction for the five model operations
//!
//! Pure functions: given corpus/document data and user context, produce the
//! request text for taxonomy generation, deep analysis, synthesis,
//! comparative analysis, or a chat turn. All payload-size bounds live here.

use resdesk_common::model::{Article, ChatMessage, TaxonomyMode};
use serde_json::json;

/// Deep-analysis request text is truncated to this many characters to bound
/// request size.
pub const ANALYSIS_TEXT_LIMIT: usize = 20_000;

/// Taxonomy generation samples at most this many document titles.
pub const TAXONOMY_TITLE_SAMPLE: usize = 20;

/// Synthesis context is capped at this many article records.
pub const SYNTHESIS_ARTICLE_CAP: usize = 40;

/// Comparative context is capped at this many article records.
pub const COMPARATIVE_ARTICLE_CAP: usize = 50;

/// Chat prompts carry at most this many prior conversation turns.
pub const CHAT_HISTORY_TURNS: usize = 3;

/// Granularity instruction for the requested taxonomy mode.
fn taxonomy_instruction(mode: TaxonomyMode) -> &'static str {
    match mode {
        TaxonomyMode::Broad => {
            "Create a taxonomy of 3 to 5 BROAD, high-level categories \
             (e.g., 'Ecology', 'Management'). Avoid specific details."
        }
        TaxonomyMode::Standard => {
            "Create a taxonomy of 5 to 10 STANDARD academic categories \
             (e.g., 'Soil Nutrients', 'Grazing Impact'). Balance breadth and depth."
        }
        TaxonomyMode::Specific => {
            "Create a taxonomy of 10 to 20 HIGHLY SPECIFIC, nuanced categories \
             (e.g., 'Nitrogen Mineralization', 'Mechanical Shrub Removal'). Be granular."
        }
    }
}

/// Build the corpus-wide taxonomy generation prompt.
///
/// Samples the first [`TAXONOMY_TITLE_SAMPLE`] titles only; the reply is
/// requested as a JSON object with a `tags` array.
pub fn taxonomy_prompt(titles: &[String], user_guide: &str, mode: TaxonomyMode) -> String {
    let sample: Vec<&String> = titles.iter().take(TAXONOMY_TITLE_SAMPLE).collect();
    format!(
        "I have {count} academic papers about: \"{guide}\".\n\
         Sample titles: {titles}\n\n\
         TASK: {instruction}\n\n\
         RETURN JSON ONLY: {{ \"tags\": [\"Tag 1\", \"Tag 2\", ...] }}",
        count = titles.len(),
        guide = user_guide,
        titles = json!(sample),
        instruction = taxonomy_instruction(mode),
    )
}

/// Build the per-document deep-analysis prompt.
///
/// The document text is truncated to [`ANALYSIS_TEXT_LIMIT`] characters.
/// Requests 1-3 tags from the given taxonomy, an alignment label, extracted
/// metadata, a verbatim abstract, detailed summaries, exactly 10 quotes, and
/// a citation draft, as a single JSON object with fixed field names.
pub fn analysis_prompt(text: &str, user_guide: &str, taxonomy: &[String]) -> String {
    let safe_text: String = text.chars().take(ANALYSIS_TEXT_LIMIT).collect();
    format!(
        "Analyze this academic text carefully: \"{safe_text}...\"\n\n\
         Context: My thesis is \"{guide}\".\n\
         Available Tags: {tags}\n\n\
         TASK:\n\
         1. Assign the TOP 3 Most Relevant Tags from the list (Select at least 1, but NO MORE THAN 3).\n\
         2. Alignment (Supports/Contradicts/Neutral).\n\
         3. Extract Metadata:\n\
            - Real Title (Look for the actual paper title inside the text).\n\
            - Publication Year.\n\
            - Authors.\n\
         4. Deep Read (BE VERY DETAILED):\n\
            - Full Abstract: Extract the complete abstract text verbatim.\n\
            - Main Points: Write a detailed, multi-paragraph summary of the methods and results.\n\
            - Conclusions: Write a detailed, multi-paragraph summary of the authors' final conclusions.\n\
         5. Quotes: Extract exactly 10 powerful, direct quotes relevant to the thesis.\n\n\
         RETURN JSON ONLY:\n\
         {{\n\
           \"selectedTags\": [\"String\", \"String\"],\n\
           \"alignment\": \"String\",\n\
           \"realTitle\": \"String\",\n\
           \"year\": \"String\",\n\
           \"authors\": \"String\",\n\
           \"fullAbstract\": \"String\",\n\
           \"mainPoints\": \"String (Markdown supported)\",\n\
           \"conclusions\": \"String (Markdown supported)\",\n\
           \"quotes\": [\"Quote 1\", \"Quote 2\", ... \"Quote 10\"],\n\
           \"abntDraft\": \"String\"\n\
         }}",
        safe_text = safe_text,
        guide = user_guide,
        tags = json!(taxonomy),
    )
}

/// Build the synthesis (literature-review gap analysis) prompt.
///
/// `articles` should already be filtered to the requested subset; each record
/// is reduced to title/year/alignment/conclusions and the context is capped
/// at [`SYNTHESIS_ARTICLE_CAP`] records. The reply is free-form prose.
pub fn synthesis_prompt(articles: &[Article], tag: Option<&str>) -> String {
    let context: Vec<serde_json::Value> = articles
        .iter()
        .take(SYNTHESIS_ARTICLE_CAP)
        .map(|a| {
            json!({
                "title": a.real_title,
                "year": a.year,
                "alignment": a.alignment,
                "conclusions": a.conclusions,
            })
        })
        .collect();
    format!(
        "Literature Review Synthesis. Topic: {topic}. Papers: {count}. Data: {data}. \
         Write critical analysis (Markdown). \
         Sections: Executive Summary, Strengths, Weaknesses, Gaps, Suggestions.",
        topic = tag.unwrap_or("General"),
        count = articles.len(),
        data = json!(context),
    )
}

/// Build the comparative (thesis validation) prompt.
///
/// Context is capped at [`COMPARATIVE_ARTICLE_CAP`] records of
/// author/year/alignment/mainPoints/conclusions. The reply is free-form prose.
pub fn comparative_prompt(user_guide: &str, articles: &[Article]) -> String {
    let context: Vec<serde_json::Value> = articles
        .iter()
        .take(COMPARATIVE_ARTICLE_CAP)
        .map(|a| {
            json!({
                "author": a.authors,
                "year": a.year,
                "alignment": a.alignment,
                "arguments": a.main_points,
                "conclusions": a.conclusions,
            })
        })
        .collect();
    format!(
        "Comparative Analysis Report. THESIS: \"{guide}\". EVIDENCE ({count} papers): {data}. \
         TASK: Report validating/critiquing thesis. \
         Sections: Validation, Nuance, Refinement, Smoking Guns.",
        guide = user_guide,
        count = articles.len(),
        data = json!(context),
    )
}

/// Build a chat-turn prompt over the full corpus.
///
/// Deliberately unbounded: every article contributes its complete full text
/// so answers can cite any document. Only the last [`CHAT_HISTORY_TURNS`]
/// conversation turns are carried.
pub fn chat_prompt(articles: &[Article], history: &[ChatMessage], question: &str) -> String {
    let library: Vec<String> = articles
        .iter()
        .map(|a| {
            format!(
                "--- DOCUMENT START ---\nID: {}\nTitle: {} ({})\nAuthor: {}\nCONTENT:\n{}\n--- DOCUMENT END ---",
                a.id, a.real_title, a.year, a.authors, a.full_text
            )
        })
        .collect();
    let recent: Vec<&ChatMessage> = history
        .iter()
        .skip(history.len().saturating_sub(CHAT_HISTORY_TURNS))
        .collect();
    format!(
        "Research Assistant. Context: {count} papers. LIBRARY: {library}. \
         HISTORY: {history}. QUESTION: \"{question}\". \
         INSTRUCTIONS: Answer strictly from context. Cite [Author, Year].",
        count = articles.len(),
        library = library.join("\n"),
        history = json!(recent),
        question = question,
    )
}
