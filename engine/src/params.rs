//! Query-string parameters, in request order.

use crate::RecordId;

/// Value of one query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// `key=value`
    Scalar(String),
    /// `key[sub]=value` entries, in request order
    List(Vec<(String, String)>),
    /// A bound entity, serialized by its id
    Entity(RecordId),
}

/// Ordered query parameters of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

/// Split `key[sub]` into `("key", "sub")`.
fn split_bracket(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    let inner = key[open + 1..].strip_suffix(']')?;
    if open == 0 {
        return None;
    }
    Some((&key[..open], inner))
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw (percent-encoded) query string.
    ///
    /// `key[sub]=value` pairs are folded into a single list parameter
    /// under `key`. A repeated plain key keeps its last value.
    pub fn parse(query: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match split_bracket(&key) {
                Some((name, sub)) => params.push_list_item(name, sub, &value),
                None => {
                    params.insert(key.into_owned(), ParamValue::Scalar(value.into_owned()));
                }
            }
        }
        params
    }

    fn push_list_item(&mut self, name: &str, sub: &str, value: &str) {
        let sub = if sub.is_empty() {
            match self.get(name) {
                Some(ParamValue::List(items)) => items.len().to_string(),
                _ => "0".to_string(),
            }
        } else {
            sub.to_string()
        };

        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some((_, ParamValue::List(items))) => items.push((sub, value.to_string())),
            Some((_, other)) => *other = ParamValue::List(vec![(sub, value.to_string())]),
            None => self.entries.push((
                name.to_string(),
                ParamValue::List(vec![(sub, value.to_string())]),
            )),
        }
    }

    /// Set a parameter, keeping its position if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) -> &mut Self {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Builder-style scalar insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, ParamValue::Scalar(value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether the key is present, with any value.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Scalar value of a key; entities read as their id.
    pub fn scalar(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            ParamValue::Scalar(s) => Some(s.clone()),
            ParamValue::Entity(id) => Some(id.to_string()),
            ParamValue::List(_) => None,
        }
    }

    /// List entries of a key.
    pub fn list(&self, key: &str) -> &[(String, String)] {
        match self.get(key) {
            Some(ParamValue::List(items)) => items,
            _ => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
