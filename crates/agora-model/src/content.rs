//! Published content records and their synthetic chapter pages.
//!
//! A [`PublishedContent`] is a versioned published work (tutorial, article,
//! or opinion). It is indexed as one document for itself plus one synthetic
//! "chapter" document per structural section. Chapter pages are not stored
//! as their own rows: they are derived on the fly from the parent, and their
//! identifiers are `{parent_slug}__{section_slug}`, so re-publishing with a
//! different section set orphans the old chapter documents. The caller is
//! responsible for removing those via the deletion propagator.

use agora_core::util::ids::chapter_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a published content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Multi-chapter tutorial.
    Tutorial,
    /// Single-page article.
    Article,
    /// Reader opinion, published without validation.
    Opinion,
}

impl ContentType {
    /// Lowercase name as stored in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Tutorial => "tutorial",
            ContentType::Article => "article",
            ContentType::Opinion => "opinion",
        }
    }
}

/// A structural section of a published content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Section slug, unique within the parent.
    pub slug: String,
    /// Section title.
    pub title: String,
    /// Rendered HTML body.
    pub text_html: String,
}

impl Section {
    /// Create a section.
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        text_html: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            text_html: text_html.into(),
        }
    }
}

/// The published, public version of a content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedContent {
    /// Primary key of the publication row (0 until saved).
    pub pk: i64,
    /// Primary key of the underlying editable content.
    pub content_pk: i64,
    /// Public slug.
    pub slug: String,
    /// Title.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Tag titles.
    pub tags: Vec<String>,
    /// Category titles.
    pub categories: Vec<String>,
    /// Subcategory titles.
    pub subcategories: Vec<String>,
    /// Tutorial, article, or opinion.
    pub content_type: ContentType,
    /// Whether an opinion was picked by the staff.
    pub picked: bool,
    /// Rendered HTML of the introduction/body.
    pub text_html: String,
    /// Structural sections, in reading order.
    pub sections: Vec<Section>,
    /// Publication date.
    pub pubdate: DateTime<Utc>,
    /// Whether the content needs (re)indexing.
    pub requires_index: bool,
    /// Bumped by the store on every save.
    pub revision: u64,
}

impl PublishedContent {
    /// Create a published content with no sections.
    pub fn new(
        content_pk: i64,
        slug: impl Into<String>,
        title: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        Self {
            pk: 0,
            content_pk,
            slug: slug.into(),
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            categories: Vec::new(),
            subcategories: Vec::new(),
            content_type,
            picked: false,
            text_html: String::new(),
            sections: Vec::new(),
            pubdate: Utc::now(),
            requires_index: true,
            revision: 0,
        }
    }

    /// Derive the chapter pages for the current section set.
    ///
    /// One page per section, carrying the parent pk so the pipeline can mark
    /// the parent clean after a successful chapter batch.
    pub fn chapter_pages(&self) -> Vec<ChapterPage> {
        self.sections
            .iter()
            .map(|section| ChapterPage {
                parent_pk: self.pk,
                parent_slug: self.slug.clone(),
                slug: section.slug.clone(),
                title: section.title.clone(),
                text_html: section.text_html.clone(),
                categories: self.categories.clone(),
                subcategories: self.subcategories.clone(),
            })
            .collect()
    }
}

/// A synthetic chapter document source, derived from one parent section.
///
/// Not stored as a row; exists only during conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterPage {
    /// Primary key of the parent [`PublishedContent`].
    pub parent_pk: i64,
    /// Slug of the parent content.
    pub parent_slug: String,
    /// Section slug.
    pub slug: String,
    /// Section title.
    pub title: String,
    /// Rendered HTML body.
    pub text_html: String,
    /// Parent categories, denormalized for filtering.
    pub categories: Vec<String>,
    /// Parent subcategories, denormalized for filtering.
    pub subcategories: Vec<String>,
}

impl ChapterPage {
    /// Stable identifier in the chapter collection.
    pub fn search_id(&self) -> String {
        chapter_id(&self.parent_slug, &self.slug)
    }
}
