//! In-memory library store
//!
//! Owns the annotated-article list, the workspace taxonomy, the chat history,
//! and the two report slots. One instance lives behind a lock in `AppState`;
//! every mutation is applied synchronously by the handler or pipeline task
//! that triggered it.

use resdesk_common::model::{Article, ChatMessage, TaxonomyMode, Workspace};
use resdesk_common::{Error, Result};
use serde::Deserialize;
use uuid::Uuid;

/// Partial-field patch for one article.
///
/// Absent fields are left untouched. Deserialized directly from PATCH
/// request bodies, so field names stay camelCase.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    pub tags: Option<Vec<String>>,
    pub alignment: Option<String>,
    pub quotes: Option<Vec<String>>,
    pub real_title: Option<String>,
    pub year: Option<String>,
    pub authors: Option<String>,
    pub full_abstract: Option<String>,
    pub main_points: Option<String>,
    pub conclusions: Option<String>,
    pub abnt_draft: Option<String>,
}

/// The workspace library: articles, taxonomy, chat, reports.
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub articles: Vec<Article>,
    pub taxonomy: Vec<String>,
    pub user_guide: String,
    pub taxonomy_mode: TaxonomyMode,
    pub chat_messages: Vec<ChatMessage>,
    pub comp_report: Option<String>,
    pub synth_report: Option<String>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly analyzed article (pipeline use).
    pub fn add_article(&mut self, article: Article) {
        self.articles.push(article);
    }

    pub fn article(&self, id: Uuid) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    /// Merge a partial-field patch into one article.
    ///
    /// Tags set through the patch are uncapped (the 3-tag limit binds model
    /// output only), and any tag the taxonomy does not yet know is silently
    /// added to it.
    pub fn update_article(&mut self, id: Uuid, patch: ArticlePatch) -> Result<Article> {
        let article = self
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;

        if let Some(tags) = patch.tags {
            for tag in &tags {
                if !self.taxonomy.contains(tag) {
                    self.taxonomy.push(tag.clone());
                }
            }
            article.tags = tags;
        }
        if let Some(alignment) = patch.alignment {
            article.alignment = alignment;
        }
        if let Some(quotes) = patch.quotes {
            article.quotes = quotes;
        }
        if let Some(real_title) = patch.real_title {
            article.real_title = real_title;
        }
        if let Some(year) = patch.year {
            article.year = year;
        }
        if let Some(authors) = patch.authors {
            article.authors = authors;
        }
        if let Some(full_abstract) = patch.full_abstract {
            article.full_abstract = full_abstract;
        }
        if let Some(main_points) = patch.main_points {
            article.main_points = main_points;
        }
        if let Some(conclusions) = patch.conclusions {
            article.conclusions = conclusions;
        }
        if let Some(abnt_draft) = patch.abnt_draft {
            article.abnt_draft = abnt_draft;
        }

        Ok(article.clone())
    }

    /// Add a tag to the taxonomy. Returns false on empty or duplicate input.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if tag.is_empty() || self.taxonomy.iter().any(|t| t == tag) {
            return false;
        }
        self.taxonomy.push(tag.to_string());
        true
    }

    /// Delete a tag from the taxonomy and cascade removal from every
    /// article's tag list. Returns false when the tag was unknown.
    pub fn delete_tag(&mut self, tag: &str) -> bool {
        let before = self.taxonomy.len();
        self.taxonomy.retain(|t| t != tag);
        if self.taxonomy.len() == before {
            return false;
        }
        for article in &mut self.articles {
            article.tags.retain(|t| t != tag);
        }
        true
    }

    /// Append a quote as the new last element.
    pub fn add_quote(&mut self, id: Uuid, quote: String) -> Result<()> {
        let article = self
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
        article.quotes.push(quote);
        Ok(())
    }

    /// Remove the quote at `index`, preserving the order of the rest.
    pub fn remove_quote(&mut self, id: Uuid, index: usize) -> Result<()> {
        let article = self
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
        if index >= article.quotes.len() {
            return Err(Error::InvalidInput(format!(
                "quote index {} out of range (have {})",
                index,
                article.quotes.len()
            )));
        }
        article.quotes.remove(index);
        Ok(())
    }

    /// Filtered view of the library.
    ///
    /// `tag` matches exact membership in an article's tag list; `alignment`
    /// matches case-insensitive substring containment against the alignment
    /// label. Both given means both must match.
    pub fn filter(&self, tag: Option<&str>, alignment: Option<&str>) -> Vec<Article> {
        let alignment_lower = alignment.map(str::to_lowercase);
        self.articles
            .iter()
            .filter(|a| {
                let tag_match = tag.map_or(true, |t| a.tags.iter().any(|at| at == t));
                let alignment_match = alignment_lower
                    .as_deref()
                    .map_or(true, |al| a.alignment.to_lowercase().contains(al));
                tag_match && alignment_match
            })
            .cloned()
            .collect()
    }

    /// Formatted citation list, sorted by authors.
    pub fn bibliography(&self) -> Vec<String> {
        let mut sorted: Vec<&Article> = self.articles.iter().collect();
        sorted.sort_by(|a, b| a.authors.cmp(&b.authors));
        sorted.iter().map(|a| a.citation()).collect()
    }

    pub fn push_chat(&mut self, message: ChatMessage) {
        self.chat_messages.push(message);
    }

    /// Snapshot the library as a persistence document.
    pub fn to_workspace(&self) -> Workspace {
        Workspace {
            articles: self.articles.clone(),
            taxonomy: self.taxonomy.clone(),
            user_guide: self.user_guide.clone(),
            chat_messages: self.chat_messages.clone(),
            comp_report: self.comp_report.clone(),
            synth_report: self.synth_report.clone(),
            taxonomy_mode: self.taxonomy_mode,
        }
    }

    /// Replace the library's contents with a loaded workspace.
    pub fn load_workspace(&mut self, workspace: Workspace) {
        self.articles = workspace.articles;
        self.taxonomy = workspace.taxonomy;
        self.user_guide = workspace.user_guide;
        self.chat_messages = workspace.chat_messages;
        self.comp_report = workspace.comp_report;
        self.synth_report = workspace.synth_report;
        self.taxonomy_mode = workspace.taxonomy_mode;
    }
}
