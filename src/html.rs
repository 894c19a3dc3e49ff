use scraper::{Html, Selector};
use url::Url;

/// Elements whose text never renders.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line of rendered text. Text on either side of
/// their boundaries is kept apart by a space.
const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "html", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "title", "tr",
    "ul",
];

const NEXT_LINK: &str = r#"a[rel~="next"], link[rel~="next"]"#;

/// What the scrape loop needs from one page of markup.
pub struct ParsedPage {
    /// Visible text, whitespace collapsed.
    pub text: String,
    /// First `rel="next"` link, resolved against the page URL.
    pub next: Option<Url>,
}

/// Parse once; extract visible text and the next-page link.
pub fn parse(html: &str, base: &Url) -> ParsedPage {
    let document = Html::parse_document(html);
    ParsedPage {
        text: visible_text(&document),
        next: next_link(&document, base),
    }
}

fn visible_text(document: &Html) -> String {
    let mut raw = String::new();
    let mut last_block = None;

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        let block = node
            .ancestors()
            .find(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| BLOCK.contains(&e.name()))
            })
            .map(|a| a.id());
        if last_block.is_some() && block != last_block {
            raw.push(' ');
        }
        last_block = block;
        raw.push_str(text);
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn next_link(document: &Html, base: &Url) -> Option<Url> {
    let selector = Selector::parse(NEXT_LINK).ok()?;

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .find(|url| matches!(url.scheme(), "http" | "https"))
}

/// `true` when a Content-Type header value is something we can read as markup.
pub fn is_markup(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime.starts_with("text/") || mime == "application/xhtml+xml"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn base() -> Url {
        Url::parse("http://example.test/").unwrap()
    }

    fn text(html: &str) -> String {
        parse(html, &base()).text
    }

    #[test]
    fn strips_tags() {
        let text = text("<p>Data <b>Breach</b> Reported</p>");
        assert_eq!(text, "Data Breach Reported");
    }

    #[test]
    fn skips_script_and_style() {
        let html = "<html><head><style>.breach{}</style></head>\
                    <body><script>var breach = 1;</script><p>clean</p></body></html>";
        assert_eq!(text(html), "clean");
    }

    #[test]
    fn keeps_title() {
        let html = "<html><head><title>Advisory</title></head><body>text</body></html>";
        assert_eq!(text(html), "Advisory text");
    }

    #[test]
    fn block_boundaries_separate_words() {
        assert_eq!(text("<p>leak</p><a href=\"/older\">older</a>"), "leak older");
        assert_eq!(text("<ul><li>bre</li><li>ach</li></ul>"), "bre ach");
        assert_eq!(text("<table><tr><td>1</td><td>2</td></tr></table>"), "1 2");
    }

    #[test]
    fn inline_elements_do_not_split_words() {
        assert_eq!(text("<p>ran<b>som</b><i>ware</i> here</p>"), "ransomware here");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(text("<p>AT&amp;T &lt;leak&gt;</p>"), "AT&T <leak>");
    }

    #[test]
    fn malformed_markup_still_yields_text() {
        assert_eq!(text("<div><p>unclosed <i>tags"), "unclosed tags");
    }

    #[test]
    fn advisory_fixture() {
        let text = text(&fixture("advisory"));
        assert!(text.contains("Data Breach Reported"));
        assert!(text.contains("44d88612fea8a8f36de82e1278abb02f"));
        assert!(!text.contains("trackingPixel"));
        assert!(!text.contains("font-family"));
    }

    #[test]
    fn next_link_resolves_relative() {
        let base = Url::parse("http://example.test/news/").unwrap();
        let html = r#"<a href="/about">About</a><a rel="next" href="?page=2">Older</a>"#;
        let next = parse(html, &base).next.unwrap();
        assert_eq!(next.as_str(), "http://example.test/news/?page=2");
    }

    #[test]
    fn next_link_from_head() {
        let base = Url::parse("http://example.test/a").unwrap();
        let html = r#"<html><head><link rel="prev next" href="http://example.test/b"></head></html>"#;
        assert_eq!(parse(html, &base).next.unwrap().as_str(), "http://example.test/b");
    }

    #[test]
    fn next_link_ignores_non_http() {
        let base = Url::parse("http://example.test/").unwrap();
        let html = r#"<a rel="next" href="javascript:void(0)">more</a>"#;
        assert!(parse(html, &base).next.is_none());
    }

    #[test]
    fn advisory_fixture_next_link() {
        let base = Url::parse("http://example.test/advisories").unwrap();
        let next = parse(&fixture("advisory"), &base).next.unwrap();
        assert_eq!(next.as_str(), "http://example.test/advisories?page=2");
    }

    #[test]
    fn markup_content_types() {
        assert!(is_markup("text/html; charset=utf-8"));
        assert!(is_markup("application/xhtml+xml"));
        assert!(is_markup("text/plain"));
        assert!(is_markup(""));
        assert!(!is_markup("application/pdf"));
        assert!(!is_markup("image/png"));
    }
}
