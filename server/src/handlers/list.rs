//! List handler - serves one page of a collection.

use crate::error::Result;
use crate::{AppState, Backend};
use axum::http::{header, HeaderMap};
use folio_engine::{PageRequest, PageResult, QueryParams};

/// Serve one page of `collection` for a raw query string.
pub async fn handle_list(
    state: &AppState,
    collection: &str,
    raw_query: Option<&str>,
    base_url: String,
) -> Result<PageResult> {
    let schema = state.schema.collection(collection)?;
    let params = QueryParams::parse(raw_query.unwrap_or_default());
    let request = PageRequest::from_params(
        schema,
        state.paginator.config(),
        params,
        state.sort_policy.clone(),
        base_url,
    )?;

    let page = match &state.backend {
        Backend::Postgres(executor) => {
            state
                .paginator
                .paginate(executor, schema, &request)
                .await?
        }
        Backend::Memory(store) => {
            state
                .paginator
                .paginate(store.as_ref(), schema, &request)
                .await?
        }
    };

    tracing::debug!(
        collection,
        returned = page.data.len(),
        total = page.total,
        "served page"
    );
    Ok(page)
}

/// Base URL for pagination links: the configured public URL, else the
/// request's Host header, else the bare path.
pub fn link_base(public_url: Option<&str>, headers: &HeaderMap, path: &str) -> String {
    if let Some(public) = public_url {
        return format!("{}{}", public.trim_end_matches('/'), path);
    }
    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{host}{path}"),
        None => path.to_string(),
    }
}
