//! HTML parsing and HTML-to-Markdown conversion helpers shared by the
//! structure processors.
//!
//! A tolerant DOM parser ([`scraper`]) backs the theme-keyed content
//! selectors each structure processor uses; [`htmd`] converts the
//! extracted fragment to Markdown.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};

/// Parses an HTML document. `scraper`'s parser never fails outright (it
/// accumulates quirks-mode errors instead), so this always succeeds; the
/// `Result` wrapper exists for future tightening and to keep call sites
/// uniform with other parse steps.
pub fn parse_document(html: &str) -> Result<Html> {
    Ok(Html::parse_document(html))
}

/// Parses a CSS selector, wrapping the parse failure as a typed error.
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|err| Error::DocumentationParseFailure {
        url: String::new(),
        cause: format!("invalid selector {selector:?}: {err:?}"),
    })
}

/// Returns the first element in `doc` matching `selector`, if any.
pub fn select_first<'a>(doc: &'a Html, selector: &str) -> Result<Option<ElementRef<'a>>> {
    let sel = parse_selector(selector)?;
    Ok(doc.select(&sel).next())
}

/// Returns every element in `doc` matching `selector`.
pub fn select_all<'a>(doc: &'a Html, selector: &str) -> Result<Vec<ElementRef<'a>>> {
    let sel = parse_selector(selector)?;
    Ok(doc.select(&sel).collect())
}

/// Tries each selector in `chain` in order, returning the first one that
/// matches. This backs the "generic fallback chain" used by the Sphinx and
/// MkDocs structure processors to locate the main content container.
pub fn select_first_of<'a>(doc: &'a Html, chain: &[&str]) -> Result<Option<ElementRef<'a>>> {
    for selector in chain {
        if let Some(found) = select_first(doc, selector)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Concatenates all text nodes under `element`, trimmed.
#[must_use]
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Removes every element matching any selector in `unwanted` from `html`'s
/// source text before further parsing or conversion, by excising each
/// matched element's outer HTML. This mirrors how browsers' reader modes
/// and HTML-to-Markdown pipelines commonly discard chrome (navigation,
/// sidebars, headerlinks) ahead of content extraction.
#[must_use]
pub fn strip_elements(html: &str, unwanted: &[&str]) -> String {
    let mut result = html.to_string();
    let doc = Html::parse_fragment(html);
    for selector_str in unwanted {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in doc.select(&selector) {
            let element_html = element.html();
            result = result.replace(&element_html, "");
        }
    }
    result
}

/// Converts an HTML fragment to Markdown, falling back to plain
/// text extraction if the converter rejects the input.
#[must_use]
pub fn to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|_| {
        let doc = Html::parse_fragment(html);
        doc.root_element().text().collect::<String>()
    })
}

/// Builds a truncated preview of `text`, suffixed with `…` if truncated.
/// Truncation respects UTF-8 character boundaries.
#[must_use]
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}…")
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_first_of_tries_chain_in_order() {
        let doc = parse_document("<html><body><div class=\"content\">hi</div></body></html>")
            .unwrap();
        let found = select_first_of(&doc, &["article[role=main]", "div.content"])
            .unwrap()
            .unwrap();
        assert_eq!(text_of(found), "hi");
    }

    #[test]
    fn strip_elements_removes_matches() {
        let html = "<div><nav class=\"sidebar\">skip</nav><p>keep</p></div>";
        let stripped = strip_elements(html, &["nav.sidebar"]);
        assert!(!stripped.contains("skip"));
        assert!(stripped.contains("keep"));
    }

    #[test]
    fn snippet_truncates_with_ellipsis() {
        assert_eq!(snippet("hello world", 5), "hello…");
        assert_eq!(snippet("hi", 5), "hi");
    }
}
