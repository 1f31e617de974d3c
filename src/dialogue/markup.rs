//! Inline clue markup in dialogue text.
//!
//! Authors tag clue words as `<link=ID>word</link>` (the id may be quoted).
//! The presenter styles every link, the player clicks them to collect clues,
//! and a collected link is rewritten into plain styled text so it cannot be
//! clicked twice.

use std::sync::OnceLock;

use log::warn;
use regex::{Captures, Regex};

pub const LINK_STYLE: &str = "link";
#[cfg(test)]
pub const LINK_HOVER_STYLE: &str = "link_hover";
pub const LINK_ACTIVATED_STYLE: &str = "link_activated";

/// A clue link found in dialogue text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub inner: String,
}

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)(?P<open><link\s*=\s*["']?(?P<id>[^"'>\s]+)["']?\s*>)(?P<inner>.*?)</link>"#)
            .unwrap()
    })
}

fn style_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<style\s*=.*?>").unwrap())
}

fn any_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^<>]+>").unwrap())
}

fn link_with_id(id: &str) -> Option<Regex> {
    let pattern = format!(
        r#"(?s)<link\s*=\s*["']?{}["']?\s*>(?P<inner>.*?)</link>"#,
        regex::escape(id)
    );
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Cannot build link pattern for '{id}': {e}");
            None
        }
    }
}

fn strip_styles(inner: &str) -> String {
    style_open_regex().replace_all(inner, "").replace("</style>", "")
}

/// All links in declaration order, duplicates included.
pub fn extract_links(text: &str) -> Vec<Link> {
    link_regex()
        .captures_iter(text)
        .map(|caps| Link {
            id: caps["id"].to_string(),
            inner: caps["inner"].to_string(),
        })
        .collect()
}

/// Wrap the inner text of every link in `<style=STYLE>` unless the author
/// already styled it.
pub fn apply_link_style(text: &str, style: &str) -> String {
    if text.is_empty() || style.is_empty() {
        return text.to_string();
    }
    link_regex()
        .replace_all(text, |caps: &Captures| {
            let inner = &caps["inner"];
            if style_open_regex().is_match(inner) {
                return caps[0].to_string();
            }
            format!("{}<style={style}>{inner}</style></link>", &caps["open"])
        })
        .into_owned()
}

/// Restyle the first link with `id`. With no `style`, falls back to
/// `default_style`; with neither, the link is left unstyled.
#[cfg(test)]
pub fn restyle_link(text: &str, id: &str, style: Option<&str>, default_style: Option<&str>) -> String {
    if text.is_empty() || id.is_empty() {
        return text.to_string();
    }
    let Some(re) = link_with_id(id) else {
        return text.to_string();
    };
    let style = style.filter(|s| !s.is_empty()).or(default_style.filter(|s| !s.is_empty()));
    re.replacen(text, 1, |caps: &Captures| {
        let inner = strip_styles(&caps["inner"]);
        match style {
            Some(style) => format!("<link={id}><style={style}>{inner}</style></link>"),
            None => format!("<link={id}>{inner}</link>"),
        }
    })
    .into_owned()
}

/// Replace the first link with `id` by plain text in `style`, so it is no
/// longer a link.
pub fn disable_link(text: &str, id: &str, style: &str) -> String {
    if text.is_empty() || id.is_empty() {
        return text.to_string();
    }
    let Some(re) = link_with_id(id) else {
        return text.to_string();
    };
    re.replacen(text, 1, |caps: &Captures| {
        format!("<style={style}>{}</style>", strip_styles(&caps["inner"]))
    })
    .into_owned()
}

/// Drop every tag, leaving the readable text.
pub fn strip_markup(text: &str) -> String {
    any_tag_regex().replace_all(text, "").into_owned()
}
