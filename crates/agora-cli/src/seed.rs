//! Demo data seeding.
//!
//! The store is in-process, so the administration commands need something
//! to chew on. `--seed N` populates N of each record kind with plausible
//! shapes: tagged topics, threads of posts, contents with sections.

use agora_model::{
    ContentType, Forum, Post, PublishedContent, SaveOptions, Section, Store, Topic,
};

/// Populate `store` with `n` topics (each with replies) and `n` contents.
pub fn seed(store: &Store, n: usize) {
    let forum = store.save_forum(Forum::new("General"));

    for i in 0..n {
        let mut topic = Topic::new(forum.pk, format!("How do I fix error {i}?"), "alice");
        topic.tags = vec!["rust".to_string(), "help".to_string()];
        topic.is_solved = i % 3 == 0;
        let topic = store.save_topic(topic, SaveOptions::default());

        store.save_post(
            Post::new(
                topic.pk,
                forum.pk,
                1,
                format!("<p>I keep hitting error {i} when compiling.</p>"),
                "alice",
            ),
            SaveOptions::default(),
        );
        let mut reply = Post::new(
            topic.pk,
            forum.pk,
            2,
            format!("<p>Error {i} usually means a missing lifetime.</p>"),
            "bob",
        );
        reply.like_count = (i % 5) as u32;
        store.save_post(reply, SaveOptions::default());
    }

    for i in 0..n {
        let kind = match i % 3 {
            0 => ContentType::Tutorial,
            1 => ContentType::Article,
            _ => ContentType::Opinion,
        };
        let mut content = PublishedContent::new(
            (i + 1) as i64,
            format!("guide-{i}"),
            format!("Guide number {i}"),
            kind,
        );
        content.description = "A walk through the basics.".to_string();
        content.categories = vec!["programming".to_string()];
        if kind == ContentType::Tutorial {
            content.sections = vec![
                Section::new("setup", "Setup", "<p>Install the toolchain.</p>"),
                Section::new("first-steps", "First steps", "<p>Write a program.</p>"),
            ];
        }
        store.save_content(content, SaveOptions::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_flags_everything_dirty() {
        let store = Store::new();
        seed(&store, 4);
        assert_eq!(store.dirty_topics(false, 0, 100).len(), 4);
        assert_eq!(store.dirty_posts(false, 0, 100).len(), 8);
        assert_eq!(store.dirty_contents(false, 0, 100).len(), 4);
    }
}
