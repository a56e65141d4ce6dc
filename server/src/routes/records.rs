//! Collection endpoint routes.

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Uri},
    routing::get,
    Json, Router,
};
use folio_engine::PageResult;

use crate::error::Result;
use crate::handlers::{handle_list, link_base};
use crate::AppState;

/// Create collection routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/collections/{collection}/records", get(list_handler))
}

/// GET /collections/{collection}/records - One page of a collection.
async fn list_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<PageResult>> {
    let base_url = link_base(state.config.public_url.as_deref(), &headers, uri.path());
    let page = handle_list(&state, &collection, query.as_deref(), base_url).await?;
    Ok(Json(page))
}
