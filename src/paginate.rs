use std::collections::HashSet;

use clap::ValueEnum;
use url::Url;

/// How to get from page N to page N+1 of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// Follow `rel="next"` links; bump the page query parameter only if the target never offered one.
    #[default]
    Auto,
    /// Always set the page query parameter on the target URL.
    Query,
    /// Follow `rel="next"` links only.
    Link,
    /// First page only.
    #[value(name = "none")]
    Single,
}

/// Per-target pagination state: which strategy, which URLs were already visited,
/// and whether a link series has been entered.
pub struct Paginator<'a> {
    strategy: Strategy,
    param: &'a str,
    target: &'a Url,
    visited: HashSet<Url>,
    following_links: bool,
}

impl<'a> Paginator<'a> {
    pub fn new(strategy: Strategy, param: &'a str, target: &'a Url) -> Self {
        let mut visited = HashSet::new();
        visited.insert(target.clone());
        Self {
            strategy,
            param,
            target,
            visited,
            following_links: false,
        }
    }

    /// URL of page `page` (1-based, > 1), given the `rel="next"` link found on the previous page.
    /// `None` ends pagination for this target.
    pub fn next(&mut self, page: u32, discovered: Option<Url>) -> Option<Url> {
        let next = match self.strategy {
            Strategy::Single => None,
            Strategy::Link => discovered,
            Strategy::Query => Some(with_page_param(self.target, self.param, page)),
            Strategy::Auto => match discovered {
                Some(link) => {
                    self.following_links = true;
                    Some(link)
                }
                // A followed link series has ended.
                None if self.following_links => None,
                None => Some(with_page_param(self.target, self.param, page)),
            },
        }?;

        // A link back to somewhere we've been would loop until max_pages.
        if !self.visited.insert(next.clone()) {
            return None;
        }
        Some(next)
    }
}

/// `target` with `param=page` set, replacing any existing value for `param`.
pub fn with_page_param(target: &Url, param: &str, page: u32) -> Url {
    let kept: Vec<(String, String)> = target
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = target.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(param, &page.to_string());
    }
    url
}
