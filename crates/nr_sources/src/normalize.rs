use nr_core::{Article, BodyBlock};

use crate::newsdata::NewsArticle;

/// Marker the provider puts in fields hidden behind its paid plans.
pub const PAYWALL_MARKER: &str = "ONLY AVAILABLE";

/// A field is usable when present, non-blank and not a paywall placeholder.
pub fn usable(field: Option<&str>) -> Option<&str> {
    field.filter(|text| !text.trim().is_empty() && !text.contains(PAYWALL_MARKER))
}

/// Splits text into paragraph blocks on line breaks, dropping blank blocks.
pub fn split_into_paragraphs(content: &str) -> Vec<BodyBlock> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(BodyBlock::paragraph)
        .collect()
}

pub fn to_article(article: NewsArticle) -> Article {
    let lead = usable(article.description.as_deref())
        .or_else(|| usable(article.ai_summary.as_deref()))
        .unwrap_or_default()
        .to_string();

    let text = usable(article.content.as_deref())
        .or_else(|| usable(article.description.as_deref()))
        .or_else(|| usable(article.ai_summary.as_deref()))
        .unwrap_or_default();

    Article {
        body: split_into_paragraphs(text),
        id: article.article_id,
        source: article.source_name.unwrap_or_default(),
        published_at_display: article.pub_date.unwrap_or_default(),
        title: article.title.unwrap_or_default(),
        lead,
        image: article.image_url.filter(|u| !u.is_empty()),
        category: article.category,
        likes_count: 0,
        comments_count: 0,
        link: article.link,
        sentiment: article.sentiment,
        source_url: article.source_url,
    }
}
