// Text helpers shared by the source adapters
use scraper::{ElementRef, Html, Node};

/// Marker appended to every excerpt.
pub const ELLIPSIS: &str = "...";

/// Keeps the first `max_chars` characters (not bytes). Idempotent.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

/// `truncate_chars` followed by the ellipsis marker, applied even to short input.
pub fn excerpt(s: &str, max_chars: usize) -> String {
    let mut out = truncate_chars(s, max_chars);
    out.push_str(ELLIPSIS);
    out
}

/// Collapses every whitespace run (newlines included) into one space and trims.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Elements that start a new line when rendered; their text must not run into a neighbour's.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

/// True when `s` contains at least one complete tag such as `<p>`, `</b>` or `<!-- -->`.
/// A lone `<` (`a<b`, `5 < 6`) is not markup.
pub fn looks_like_markup(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'<'
            && bytes
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == b'/' || *n == b'!')
            && bytes[i + 1..].contains(&b'>')
    })
}

fn flatten_into(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_ELEMENTS.contains(&el.name());
                if block {
                    out.push(' ');
                }
                flatten_into(child_el, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Flattens an HTML fragment (feed descriptions are usually markup) into plain text.
/// Inline elements join their neighbours directly, block elements are separated by a space.
pub fn html_to_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let mut text = String::new();
    flatten_into(parsed.root_element(), &mut text);
    collapse_whitespace(&text)
}
