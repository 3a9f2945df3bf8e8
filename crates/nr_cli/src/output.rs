use nr_core::{Article, BlockKind, Bookmark};
use nr_reader::PostView;
use std::fmt::Write;

pub fn article_line(article: &Article) -> String {
    let category = article.primary_category().unwrap_or("-");
    format!(
        "{:<16} {} ({}, {}, {})",
        article.id, article.title, article.source, article.published_at_display, category
    )
}

pub fn article_list(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "No articles found.".to_string();
    }
    articles.iter().map(article_line).collect::<Vec<_>>().join("\n")
}

pub fn bookmark_list(bookmarks: &[Bookmark]) -> String {
    if bookmarks.is_empty() {
        return "No saved articles.".to_string();
    }
    bookmarks
        .iter()
        .map(|b| format!("{}  saved {}", article_line(&b.article), b.saved_at.format("%Y-%m-%d %H:%M")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn post(view: &PostView) -> String {
    let article = &view.article;
    let mut out = String::new();
    let _ = writeln!(out, "{}", article.title);
    let _ = writeln!(out, "{} | {}", article.source, article.published_at_display);
    if !article.lead.is_empty() {
        let _ = writeln!(out, "\n{}", article.lead);
    }
    for block in &article.body {
        match block.kind {
            BlockKind::Paragraph => {
                let _ = writeln!(out, "\n{}", block.text);
            }
            BlockKind::Quote => {
                let _ = writeln!(out, "\n  > {}", block.text);
            }
        }
    }
    if let Some(link) = &article.link {
        let _ = writeln!(out, "\n{}", link);
    }

    let _ = writeln!(
        out,
        "\n♥ {}{}  💬 {}{}",
        view.like.count,
        if view.like.liked { " (you)" } else { "" },
        view.interaction.comments_count(),
        if view.saved { "  🔖 saved" } else { "" }
    );
    for comment in &view.interaction.comments {
        let _ = writeln!(out, "  {}: {}", comment.author.user_name, comment.text);
    }
    if !view.related.is_empty() {
        let _ = writeln!(out, "\nRelated:");
        for related in &view.related {
            let _ = writeln!(out, "  {}", article_line(related));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nr_core::{BodyBlock, Interaction};
    use nr_reader::LikeState;

    fn article() -> Article {
        Article {
            id: "a1".to_string(),
            source: "Wire".to_string(),
            published_at_display: "2024-06-01".to_string(),
            title: "Headline".to_string(),
            lead: "Lead".to_string(),
            body: vec![BodyBlock::paragraph("First."), BodyBlock::quote("Said so.")],
            image: None,
            category: Some(vec!["world".to_string()]),
            likes_count: 0,
            comments_count: 0,
            link: None,
            sentiment: None,
            source_url: None,
        }
    }

    #[test]
    fn test_article_line() {
        let line = article_line(&article());
        assert!(line.starts_with("a1"));
        assert!(line.ends_with("(Wire, 2024-06-01, world)"));
        assert_eq!(article_list(&[]), "No articles found.");
    }

    #[test]
    fn test_post() {
        let view = PostView {
            article: article(),
            interaction: Interaction::empty("a1"),
            like: LikeState { liked: true, count: 3 },
            saved: true,
            related: vec![],
        };
        let text = post(&view);
        assert!(text.contains("  > Said so."));
        assert!(text.contains("♥ 3 (you)"));
        assert!(text.contains("🔖 saved"));
        assert!(!text.contains("Related:"));
    }
}
