use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Keyword,
    Ioc,
}

/// A term found in page text, with a snippet around its first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub kind: TermKind,
    pub term: String,
    pub context: String,
}

struct Term {
    kind: TermKind,
    text: String,
    re: Regex,
}

/// Keywords match case-insensitively, IOCs exactly. Terms are literal, never patterns.
pub struct Matcher {
    terms: Vec<Term>,
    context_chars: usize,
}

impl Matcher {
    pub fn new(keywords: &[String], iocs: &[String], context_chars: usize) -> Result<Self, regex::Error> {
        let mut terms = Vec::with_capacity(keywords.len() + iocs.len());
        for kw in keywords {
            terms.push(Term {
                kind: TermKind::Keyword,
                text: kw.clone(),
                re: RegexBuilder::new(&regex::escape(kw))
                    .case_insensitive(true)
                    .build()?,
            });
        }
        for ioc in iocs {
            terms.push(Term {
                kind: TermKind::Ioc,
                text: ioc.clone(),
                re: Regex::new(&regex::escape(ioc))?,
            });
        }
        Ok(Self { terms, context_chars })
    }

    /// One hit per matching term, keywords first, each in configured order.
    pub fn find(&self, text: &str) -> Vec<Hit> {
        self.terms
            .iter()
            .filter_map(|t| {
                let m = t.re.find(text)?;
                Some(Hit {
                    kind: t.kind,
                    term: t.text.clone(),
                    context: snippet(text, m.start(), m.end(), self.context_chars),
                })
            })
            .collect()
    }
}

/// Window of at most `width` chars centred on `start..end`, `...` on cut ends.
pub fn snippet(text: &str, start: usize, end: usize, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if text.chars().count() <= width {
        return text.to_string();
    }

    let match_chars = text[start..end].chars().count();
    let pad = width.saturating_sub(match_chars) / 2;

    let from = match pad {
        0 => start,
        n => text[..start].char_indices().rev().nth(n - 1).map_or(0, |(i, _)| i),
    };
    let to = text[end..]
        .char_indices()
        .nth(pad)
        .map_or(text.len(), |(i, _)| end + i);

    let mut out = String::with_capacity(to - from + 6);
    if from > 0 {
        out.push_str("...");
    }
    out.push_str(text[from..to].trim());
    if to < text.len() {
        out.push_str("...");
    }
    out
}

/// Single spaces between words, as in extracted page text.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase, collapse whitespace, drop blanks and duplicates, keep first-seen order.
pub fn normalize_keywords<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for kw in raw {
        let kw = collapse_whitespace(kw.as_ref()).to_lowercase();
        if !kw.is_empty() && !out.contains(&kw) {
            out.push(kw);
        }
    }
    out
}

/// One IOC per line; whitespace collapsed, blank lines and duplicates dropped, case kept.
pub fn parse_iocs(contents: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in contents.lines() {
        let ioc = collapse_whitespace(line);
        if !ioc.is_empty() && !out.contains(&ioc) {
            out.push(ioc);
        }
    }
    out
}
