//! Pagination link construction.
//!
//! A link reproduces the original request: every parameter except the two
//! cursor keys is kept, in order, and one new cursor key is appended.

use crate::{ParamValue, QueryParams, RecordId};

fn encode(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// Builds next/previous page URLs for one request.
#[derive(Debug, Clone)]
pub struct LinkBuilder<'a> {
    base_url: &'a str,
    params: &'a QueryParams,
    starting_after_key: &'a str,
    ending_before_key: &'a str,
}

impl<'a> LinkBuilder<'a> {
    pub fn new(
        base_url: &'a str,
        params: &'a QueryParams,
        starting_after_key: &'a str,
        ending_before_key: &'a str,
    ) -> Self {
        Self {
            base_url,
            params,
            starting_after_key,
            ending_before_key,
        }
    }

    fn is_cursor_key(&self, key: &str) -> bool {
        key == self.starting_after_key || key == self.ending_before_key
    }

    /// Serialized non-cursor parameters, without the leading `?`.
    fn preserved_query(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();
        for (key, value) in self.params.iter() {
            if self.is_cursor_key(key) {
                continue;
            }
            match value {
                ParamValue::Scalar(v) => pairs.push(format!("{}={}", encode(key), encode(v))),
                ParamValue::Entity(id) => {
                    pairs.push(format!("{}={}", encode(key), encode(&id.to_string())))
                }
                ParamValue::List(items) => {
                    for (sub, v) in items {
                        pairs.push(format!("{}[{}]={}", encode(key), encode(sub), encode(v)));
                    }
                }
            }
        }
        pairs.join("&")
    }

    fn with_cursor(&self, cursor_key: &str, id: &RecordId) -> String {
        let query = self.preserved_query();
        let cursor = format!("{}={}", encode(cursor_key), encode(&id.to_string()));
        if query.is_empty() {
            format!("{}?{}", self.base_url, cursor)
        } else {
            format!("{}?{}&{}", self.base_url, query, cursor)
        }
    }

    /// Link to the page after the record `id`.
    pub fn next(&self, id: &RecordId) -> String {
        self.with_cursor(self.starting_after_key, id)
    }

    /// Link to the page before the record `id`.
    pub fn prev(&self, id: &RecordId) -> String {
        self.with_cursor(self.ending_before_key, id)
    }
}
