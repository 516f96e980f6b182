use nb_core::{Article, SectionName};
use nb_session::SessionSnapshot;
use std::fmt::Write;

fn date_label(article: &Article) -> String {
    article
        .published_date
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "undated".to_string())
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("      {}\n", line)).collect()
}

/// One line per card, focus marked with `>`, expanded section printed below.
pub fn render_list(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let scope = match snapshot.query.term() {
        Some(term) => format!("results for \"{}\"", term),
        None => "latest".to_string(),
    };
    let _ = writeln!(
        out,
        "📰 {} articles ({}, sorted by {}){}",
        snapshot.articles.len(),
        scope,
        snapshot.sort_key,
        if snapshot.loading { " ⏳" } else { "" }
    );

    for article in snapshot.articles.iter() {
        let marker = if snapshot.focus.as_ref() == Some(&article.id) { ">" } else { " " };
        let _ = writeln!(
            out,
            "{} [{}] {}  ({}, {})",
            marker,
            article.id,
            article.headline,
            date_label(article),
            if article.duration.is_empty() { "-" } else { article.duration.as_str() }
        );
        if let Some(section) = snapshot.open_section_for(&article.id) {
            let _ = writeln!(out, "    ▾ {}", section);
            out.push_str(&indent(article.section_text(section)));
        }
    }
    out
}

/// Detail pane for the focused article, optionally forcing one section open.
pub fn render_detail(snapshot: &SessionSnapshot, section: Option<SectionName>) -> String {
    let Some(article) = snapshot.focused_article() else {
        return "No article selected\n".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(out, "{}", article.headline);
    let _ = writeln!(out, "{} · {}", date_label(article), article.id);
    if !article.teaser.is_empty() {
        let _ = writeln!(out, "\n{}", article.teaser);
    }
    if let Some(section) = section.or_else(|| snapshot.open_section_for(&article.id)) {
        let _ = writeln!(out, "\n── {} ──", section);
        let _ = writeln!(out, "{}", article.section_text(section));
    }
    out
}
