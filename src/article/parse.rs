//! Turning a crew's raw text into an [`Article`].
//!
//! Two shapes are understood: a JSON object with `title`, `content` and
//! `references` (optionally inside a fenced code block), and markdown with a
//! heading or `Title:` line and a trailing references list.

use regex::Regex;
use serde_json::Value;

use super::Article;

impl Article {
    /// Build an article from raw crew output. Never fails: missing parts
    /// fall back to defaults.
    pub fn from_raw(topic: &str, raw: &str) -> Self {
        let parsed = parse_json(raw).unwrap_or_else(|| parse_markdown(raw));

        let title = parsed
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Article about {}", topic));
        let content = parsed.content.unwrap_or_default();

        Self {
            topic: topic.to_string(),
            title,
            word_count: word_count(&content),
            content,
            references: parsed.references,
        }
    }
}

/// Whitespace-delimited token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Default)]
struct Parsed {
    title: Option<String>,
    content: Option<String>,
    references: Vec<String>,
}

fn parse_json(raw: &str) -> Option<Parsed> {
    let trimmed = raw.trim();
    let body = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        let fence = Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").ok()?;
        fence.captures(trimmed)?.get(1)?.as_str().to_string()
    };

    let Value::Object(map) = serde_json::from_str::<Value>(&body).ok()? else {
        return None;
    };
    if !["title", "content", "references"]
        .iter()
        .any(|k| map.contains_key(*k))
    {
        return None;
    }

    let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
    let references = match map.get("references") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.clone()],
        _ => Vec::new(),
    };

    Some(Parsed {
        title: text("title"),
        content: text("content"),
        references,
    })
}

fn parse_markdown(raw: &str) -> Parsed {
    let content = raw.trim().to_string();
    Parsed {
        title: find_title(&content),
        references: find_references(&content),
        content: Some(content),
    }
}

fn find_title(text: &str) -> Option<String> {
    let heading = Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+(.+?)[ \t#]*$").ok()?;
    let title_line = Regex::new(r"(?mi)^[ \t]*\**title\**[ \t]*:[ \t]*(.+?)[ \t]*$").ok()?;

    let first = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| (m.start(), strip_emphasis(m.as_str())))
    };
    // Whichever appears first in the text wins.
    match (first(&heading), first(&title_line)) {
        (Some(h), Some(t)) => Some(if h.0 <= t.0 { h.1 } else { t.1 }),
        (h, t) => h.or(t).map(|(_, title)| title),
    }
}

/// List items under the last References / Sources heading. The section
/// ends at the next heading or at the first line that is neither blank nor
/// a list item.
fn find_references(text: &str) -> Vec<String> {
    let (Some(section), Some(item)) = (
        Regex::new(
            r"(?i)^[ \t]*(?:#{1,6}[ \t]*(?:references|sources)[ \t]*:?[ \t#]*|\*\*(?:references|sources)[ \t]*:?\*\*[ \t]*:?|(?:references|sources)[ \t]*:)[ \t]*$",
        )
        .ok(),
        Regex::new(r"^[ \t]*(?:[-*+]|\d+[.)])[ \t]+(.+?)[ \t]*$").ok(),
    ) else {
        return Vec::new();
    };

    let lines: Vec<&str> = text.lines().collect();
    let Some(heading_at) = lines.iter().rposition(|line| section.is_match(line)) else {
        return Vec::new();
    };

    let mut references = Vec::new();
    for line in &lines[heading_at + 1..] {
        if line.trim().is_empty() {
            continue;
        }
        let Some(reference) = item.captures(line).and_then(|c| c.get(1)) else {
            break;
        };
        references.push(reference.as_str().to_string());
    }
    references
}

fn strip_emphasis(s: &str) -> String {
    s.trim().trim_matches('*').trim().to_string()
}
