//! HTML main-content extraction

use scraper::{ElementRef, Html, Node, Selector};

/// Main-content regions, tried in order before falling back to `body`
const MAIN_SELECTORS: &[&str] = &[
    "main",
    "[role='main']",
    "article",
    "#content",
    ".content",
    ".main-content",
    ".article",
    "body",
];

/// Elements whose text never counts as content
const BOILERPLATE: &[&str] = &["script", "style", "nav", "header", "footer", "aside", "noscript"];

/// Extract readable text from an HTML page
///
/// The first selector whose region holds non-whitespace text wins. Text
/// nodes are joined with single spaces; further cleanup is left to the
/// normalizer.
pub fn extract_html_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector_str in MAIN_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(region) = document.select(&selector).next() {
            let text = region_text(region);
            if !text.trim().is_empty() {
                return text;
            }
        }
    }

    String::new()
}

fn region_text(region: ElementRef<'_>) -> String {
    let mut parts = Vec::new();

    for node in region.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let in_boilerplate = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| BOILERPLATE.contains(&el.name()))
        });
        if in_boilerplate {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}
