//! Conversion of domain records into backend documents.
//!
//! One [`Indexable`] impl per document kind. Each impl owns its collection
//! schema and its field extraction, so adding a field to a kind touches
//! exactly one place. The relevance weight is computed here, at conversion
//! time, from the boost table.

use agora_core::util::html::strip_html;
use agora_core::util::time::to_timestamp;
use agora_model::{ChapterPage, ContentType, Post, PublishedContent, Topic};

use crate::boost::{conditions, BoostConfig};
use crate::document::Document;
use crate::schema::{CollectionSchema, DocumentKind, FieldDef, FieldKind};

/// A record that maps to a search document.
pub trait Indexable {
    /// Collection this record belongs to.
    const KIND: DocumentKind;

    /// Schema of the collection.
    fn schema() -> CollectionSchema;

    /// Stable document id, or `None` for a record that was never saved.
    fn search_id(&self) -> Option<String>;

    /// Convert to a document, baking the boost weight in.
    fn to_document(&self, boosts: &BoostConfig) -> Document;
}

fn pk_id(pk: i64) -> Option<String> {
    (pk > 0).then(|| pk.to_string())
}

impl Indexable for Topic {
    const KIND: DocumentKind = DocumentKind::Topic;

    fn schema() -> CollectionSchema {
        CollectionSchema::new(
            Self::KIND,
            vec![
                FieldDef::new("pk", FieldKind::Int),
                FieldDef::new("forum_pk", FieldKind::Int),
                FieldDef::new("title", FieldKind::Text),
                FieldDef::new("subtitle", FieldKind::Text),
                FieldDef::new("tags", FieldKind::TextArray),
                FieldDef::new("tag_slugs", FieldKind::TextArray),
                FieldDef::new("author", FieldKind::Text),
                FieldDef::new("pubdate", FieldKind::Int),
                FieldDef::new("is_solved", FieldKind::Bool),
                FieldDef::new("is_sticky", FieldKind::Bool),
                FieldDef::new("weight", FieldKind::Float),
            ],
        )
    }

    fn search_id(&self) -> Option<String> {
        pk_id(self.pk)
    }

    fn to_document(&self, boosts: &BoostConfig) -> Document {
        let mut weight = 1.0_f32;
        if self.is_solved {
            weight *= boosts.factor(Self::KIND, conditions::SOLVED);
        }
        if self.is_sticky {
            weight *= boosts.factor(Self::KIND, conditions::STICKY);
        }

        Document::new(self.pk.to_string())
            .with_int("pk", self.pk)
            .with_int("forum_pk", self.forum_pk)
            .with_text("title", &self.title)
            .with_text("subtitle", &self.subtitle)
            .with_text_array("tags", self.tags.clone())
            .with_text_array("tag_slugs", self.tag_slugs())
            .with_text("author", &self.author)
            .with_int("pubdate", to_timestamp(&self.pubdate))
            .with_bool("is_solved", self.is_solved)
            .with_bool("is_sticky", self.is_sticky)
            .with_float("weight", weight as f64)
    }
}

impl Indexable for Post {
    const KIND: DocumentKind = DocumentKind::Post;

    fn schema() -> CollectionSchema {
        CollectionSchema::new(
            Self::KIND,
            vec![
                FieldDef::new("pk", FieldKind::Int),
                FieldDef::new("topic_pk", FieldKind::Int),
                FieldDef::new("forum_pk", FieldKind::Int),
                FieldDef::new("position", FieldKind::Int),
                FieldDef::new("text", FieldKind::Text),
                FieldDef::new("author", FieldKind::Text),
                FieldDef::new("pubdate", FieldKind::Int),
                FieldDef::new("is_visible", FieldKind::Bool),
                FieldDef::new("weight", FieldKind::Float),
            ],
        )
    }

    fn search_id(&self) -> Option<String> {
        pk_id(self.pk)
    }

    fn to_document(&self, boosts: &BoostConfig) -> Document {
        let mut weight = 1.0_f32;
        if self.is_first() {
            weight *= boosts.factor(Self::KIND, conditions::FIRST_POST);
        }
        if self.has_useful_ratio() {
            weight *= boosts.factor(Self::KIND, conditions::USEFUL_RATIO);
        }

        Document::new(self.pk.to_string())
            .with_int("pk", self.pk)
            .with_int("topic_pk", self.topic_pk)
            .with_int("forum_pk", self.forum_pk)
            .with_int("position", i64::from(self.position))
            .with_text("text", strip_html(&self.text_html))
            .with_text("author", &self.author)
            .with_int("pubdate", to_timestamp(&self.pubdate))
            .with_bool("is_visible", self.is_visible)
            .with_float("weight", weight as f64)
    }
}

impl Indexable for PublishedContent {
    const KIND: DocumentKind = DocumentKind::PublishedContent;

    fn schema() -> CollectionSchema {
        CollectionSchema::new(
            Self::KIND,
            vec![
                FieldDef::new("pk", FieldKind::Int),
                FieldDef::new("content_pk", FieldKind::Int),
                FieldDef::new("title", FieldKind::Text),
                FieldDef::new("description", FieldKind::Text),
                FieldDef::new("tags", FieldKind::TextArray),
                FieldDef::new("categories", FieldKind::TextArray),
                FieldDef::new("subcategories", FieldKind::TextArray),
                FieldDef::new("content_type", FieldKind::Text),
                FieldDef::new("text", FieldKind::Text),
                FieldDef::new("pubdate", FieldKind::Int),
                FieldDef::new("weight", FieldKind::Float),
            ],
        )
    }

    fn search_id(&self) -> Option<String> {
        pk_id(self.pk)
    }

    fn to_document(&self, boosts: &BoostConfig) -> Document {
        let mut weight = 1.0_f32;
        if self.content_type == ContentType::Article {
            weight *= boosts.factor(Self::KIND, conditions::ARTICLE);
        }
        if self.content_type == ContentType::Opinion && !self.picked {
            weight *= boosts.factor(Self::KIND, conditions::UNPICKED_OPINION);
        }

        Document::new(self.pk.to_string())
            .with_int("pk", self.pk)
            .with_int("content_pk", self.content_pk)
            .with_text("title", &self.title)
            .with_text("description", &self.description)
            .with_text_array("tags", self.tags.clone())
            .with_text_array("categories", self.categories.clone())
            .with_text_array("subcategories", self.subcategories.clone())
            .with_text("content_type", self.content_type.as_str())
            .with_text("text", strip_html(&self.text_html))
            .with_int("pubdate", to_timestamp(&self.pubdate))
            .with_float("weight", weight as f64)
    }
}

impl Indexable for ChapterPage {
    const KIND: DocumentKind = DocumentKind::Chapter;

    fn schema() -> CollectionSchema {
        CollectionSchema::new(
            Self::KIND,
            vec![
                FieldDef::new("parent_pk", FieldKind::Int),
                FieldDef::new("title", FieldKind::Text),
                FieldDef::new("text", FieldKind::Text),
                FieldDef::new("categories", FieldKind::TextArray),
                FieldDef::new("subcategories", FieldKind::TextArray),
                FieldDef::new("weight", FieldKind::Float),
            ],
        )
    }

    fn search_id(&self) -> Option<String> {
        Some(ChapterPage::search_id(self))
    }

    // No boost conditions apply to chapters; they rank on text alone.
    fn to_document(&self, _boosts: &BoostConfig) -> Document {
        Document::new(ChapterPage::search_id(self))
            .with_int("parent_pk", self.parent_pk)
            .with_text("title", &self.title)
            .with_text("text", strip_html(&self.text_html))
            .with_text_array("categories", self.categories.clone())
            .with_text_array("subcategories", self.subcategories.clone())
            .with_float("weight", 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldValue;
    use agora_model::Section;

    // ------------------------------------------------------------------------
    // Schema / document agreement
    // ------------------------------------------------------------------------

    #[test]
    fn test_documents_validate_against_their_schemas() {
        let boosts = BoostConfig::recommended();

        let mut topic = Topic::new(1, "Borrow checker", "alice");
        topic.pk = 10;
        topic.tags = vec!["rust".to_string()];
        Topic::schema().validate_document(&topic.to_document(&boosts)).unwrap();

        let mut post = Post::new(10, 1, 1, "<p>body</p>", "bob");
        post.pk = 11;
        Post::schema().validate_document(&post.to_document(&boosts)).unwrap();

        let mut content = PublishedContent::new(5, "tuto", "Tuto", ContentType::Tutorial);
        content.pk = 12;
        content.sections = vec![Section::new("intro", "Intro", "<p>x</p>")];
        PublishedContent::schema()
            .validate_document(&content.to_document(&boosts))
            .unwrap();

        let chapter = &content.chapter_pages()[0];
        ChapterPage::schema()
            .validate_document(&chapter.to_document(&boosts))
            .unwrap();
    }

    #[test]
    fn test_unsaved_record_has_no_search_id() {
        let topic = Topic::new(1, "t", "alice");
        assert_eq!(Indexable::search_id(&topic), None);
    }

    #[test]
    fn test_chapter_document_id_is_composite() {
        let mut content = PublishedContent::new(5, "tuto", "Tuto", ContentType::Tutorial);
        content.pk = 12;
        content.sections = vec![Section::new("intro", "Intro", "")];
        let doc = content.chapter_pages()[0].to_document(&BoostConfig::new());
        assert_eq!(doc.id, "tuto__intro");
    }

    // ------------------------------------------------------------------------
    // Weight computation
    // ------------------------------------------------------------------------

    #[test]
    fn test_solved_topic_outweighs_unsolved() {
        let boosts = BoostConfig::recommended();
        let mut topic = Topic::new(1, "t", "alice");
        topic.pk = 1;
        let plain = topic.to_document(&boosts).weight();
        topic.is_solved = true;
        let solved = topic.to_document(&boosts).weight();
        assert!(solved > plain);
    }

    #[test]
    fn test_boost_conditions_compound() {
        let mut boosts = BoostConfig::new();
        boosts.set(DocumentKind::Post, conditions::FIRST_POST, 1.2);
        boosts.set(DocumentKind::Post, conditions::USEFUL_RATIO, 1.5);

        let mut post = Post::new(1, 1, 1, "", "bob");
        post.pk = 1;
        post.like_count = 2;
        let weight = post.to_document(&boosts).weight();
        assert!((weight - 1.8).abs() < 1e-5);
    }

    #[test]
    fn test_unpicked_opinion_is_penalized() {
        let boosts = BoostConfig::recommended();
        let mut opinion = PublishedContent::new(1, "op", "Op", ContentType::Opinion);
        opinion.pk = 1;
        let unpicked = opinion.to_document(&boosts).weight();
        opinion.picked = true;
        let picked = opinion.to_document(&boosts).weight();
        assert!(unpicked < 1.0);
        assert_eq!(picked, 1.0);
    }

    #[test]
    fn test_post_text_is_html_stripped() {
        let mut post = Post::new(1, 1, 2, "<p>hello <em>world</em></p>", "bob");
        post.pk = 1;
        let doc = post.to_document(&BoostConfig::new());
        assert_eq!(
            doc.get("text"),
            Some(&FieldValue::Text("hello world".to_string()))
        );
    }
}
