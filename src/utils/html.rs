//! Flatten HTML fragments to plain text
//!
//! Text nodes are emitted in document order, each trimmed, empty ones dropped,
//! and joined by single spaces. List items get a bullet token in front of
//! their content so list structure is still visible once the markup is gone.

use scraper::{ElementRef, Html, Node};

/// Marker placed before every list item
pub const BULLET: &str = "•";

/// Convert an HTML fragment into space-joined plain text
pub fn flatten_html(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let mut tokens: Vec<String> = Vec::new();

    collect_text(document.root_element(), &mut tokens);

    tokens.join(" ")
}

fn collect_text(element: ElementRef, tokens: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    tokens.push(trimmed.to_string());
                }
            }
            Node::Element(el) => {
                if matches!(el.name(), "script" | "style") {
                    continue;
                }
                if el.name() == "li" {
                    tokens.push(BULLET.to_string());
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, tokens);
                }
            }
            _ => {}
        }
    }
}
