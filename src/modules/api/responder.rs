//! Link envelopes around results and the paging arithmetic behind
//! `next`/`prev` links.

use crate::sensors_info::validators::{non_neg_int, RawReq};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    pub fn new(rel: &str, href: String) -> Link {
        Link {
            rel: rel.to_string(),
            href,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub links: Vec<Link>,
    pub result: T,
}

pub fn single<T>(href: String, result: T) -> Envelope<T> {
    Envelope {
        links: vec![Link::new("self", href)],
        result,
    }
}

fn paging_value(raw: Option<&String>) -> Option<u64> {
    non_neg_int(raw?)
}

/// A list request whose `count`, when valid, is bumped by one so the reply
/// tells whether a next page exists.
#[derive(Debug, Clone)]
pub struct PageRequest {
    query: RawReq,
    index: u64,
    count: Option<u64>,
}

impl PageRequest {
    pub fn new(query: RawReq) -> PageRequest {
        let index = paging_value(query.get("index")).unwrap_or(0);
        let count = paging_value(query.get("count"));
        PageRequest {
            query,
            index,
            count,
        }
    }

    /// Query to hand to the core. Malformed paging values pass through
    /// untouched so validation reports them.
    pub fn probe(&self) -> RawReq {
        let mut probe = self.query.clone();
        if let Some(count) = self.count {
            // at u64::MAX no further page can exist anyway
            probe.insert("count".to_string(), count.saturating_add(1).to_string());
        }
        probe
    }

    fn href(&self, path: &str, index: u64) -> String {
        let mut params: BTreeMap<&str, String> = self
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        if index > 0 || params.contains_key("index") {
            params.insert("index", index.to_string());
        }
        if params.is_empty() {
            return path.to_string();
        }
        match serde_qs::to_string(&params) {
            Ok(qs) => format!("{}?{}", path, qs),
            Err(e) => {
                log::error!("Serialization error: {:?}", e);
                path.to_string()
            }
        }
    }

    /// Wraps each item with its own self link and adds `self`, `next` and
    /// `prev` links for the page. Drops the probe item, if it came back.
    pub fn envelope<T, F>(&self, path: &str, mut items: Vec<T>, item_href: F) -> Envelope<Vec<Envelope<T>>>
    where
        F: Fn(&T) -> String,
    {
        let mut links = vec![Link::new("self", self.href(path, self.index))];
        if let Some(count) = self.count {
            let page_len = usize::try_from(count).unwrap_or(usize::MAX);
            if items.len() > page_len {
                items.truncate(page_len);
                links.push(Link::new(
                    "next",
                    self.href(path, self.index.saturating_add(count)),
                ));
            }
        }
        if self.index > 0 {
            let back = self.count.unwrap_or(self.index).min(self.index);
            links.push(Link::new("prev", self.href(path, self.index - back)));
        }
        let result = items
            .into_iter()
            .map(|item| {
                let href = item_href(&item);
                single(href, item)
            })
            .collect();
        Envelope { links, result }
    }
}
