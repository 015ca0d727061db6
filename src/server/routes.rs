use axum::{
    extract::{Path, Query, State},
    Json,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use crate::server::AppState;
use crate::Error;
use std::sync::Arc;

const DEFAULT_TOP: usize = 3;
const MAX_TOP: usize = 5;
const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 10;

#[derive(Deserialize)]
pub struct VerseParams {
    #[serde(rename = "ref")]
    pub reference: String,
    pub refresh: Option<bool>,
}

#[derive(Deserialize)]
pub struct MatchParams {
    pub q: String,
    pub top: Option<usize>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Parse(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::CorpusEmpty => StatusCode::CONFLICT,
        Error::SourceUnavailable { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: Error) -> ApiError {
    (status_for(&err), Json(ErrorResponse { error: err.to_string() }))
}

fn to_json<T: Serialize>(value: &T) -> Result<Json<serde_json::Value>, ApiError> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))
}

pub async fn handle_verse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerseParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = if params.refresh.unwrap_or(false) {
        let reference = crate::parse_reference(&params.reference).map_err(|e| api_error(e.into()))?;
        state.resolver.refresh_verse(reference).await
    } else {
        state.resolver.resolve_reference(&params.reference).await
    };
    let resolution = result.map_err(api_error)?;

    to_json(&resolution)
}

pub async fn handle_match(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MatchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let top = params.top.unwrap_or(DEFAULT_TOP).clamp(1, MAX_TOP);
    let candidates = state.resolver.match_text(&params.q, top).map_err(api_error)?;
    to_json(&candidates)
}

pub async fn handle_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let results = state.resolver.search(&params.q, limit).map_err(api_error)?;
    to_json(&results)
}

pub async fn handle_chapter(
    State(state): State<Arc<AppState>>,
    Path(number): Path<u32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let resolution = state.resolver.resolve_chapter(number).await.map_err(api_error)?;
    to_json(&resolution)
}

pub async fn handle_stats(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.resolver.stats().map_err(api_error)?;
    to_json(&stats)
}

pub async fn handle_seed(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state.resolver.seed_all().await.map_err(api_error)?;
    to_json(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::test_support::{harness, FakeAuthoritative, FakeBulk};
    use crate::resolver::Resolver;
    use std::collections::HashSet;

    fn state() -> Arc<AppState> {
        let h = harness(FakeBulk::default(), FakeAuthoritative::blocked());
        let resolver = Resolver::new(h.store.clone(), h.bulk.clone(), h.authoritative.clone());
        Arc::new(AppState { resolver: Arc::new(resolver) })
    }

    #[tokio::test]
    async fn test_verse_route() {
        let state = state();
        let Json(body) = handle_verse(
            State(state.clone()),
            Query(VerseParams { reference: "bg 2:47".into(), refresh: None }),
        )
        .await
        .unwrap();
        assert_eq!(body["provenance"], "degraded");
        assert_eq!(body["record"]["reference"], "BG 2.47");
        assert_eq!(body["record"]["enrichment"], "degraded");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let state = state();
        let (status, Json(body)) = handle_verse(
            State(state.clone()),
            Query(VerseParams { reference: "BG 2.46-47".into(), refresh: Some(true) }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("range"));

        let (status, _) = handle_match(State(state.clone()), Query(MatchParams { q: "karma".into(), top: None }))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = handle_chapter(State(state), Path(19)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_verse_is_404() {
        let bulk = FakeBulk { missing: HashSet::from([(3, 5)]), ..FakeBulk::default() };
        let h = harness(bulk, FakeAuthoritative::default());
        let state = Arc::new(AppState { resolver: Arc::new(h.resolver) });

        let (status, Json(body)) = handle_verse(
            State(state),
            Query(VerseParams { reference: "BG 3.5".into(), refresh: None }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.contains("BG 3.5"));
        assert_eq!(h.store.puts(), 0);
    }

    #[tokio::test]
    async fn test_seed_then_stats() {
        let state = state();
        let Json(report) = handle_seed(State(state.clone())).await.unwrap();
        assert_eq!(report["outcome"], "completed");

        let Json(stats) = handle_stats(State(state)).await.unwrap();
        assert_eq!(stats["verses"], stats["corpus_size"]);
        assert_eq!(stats["chapters"], 18);
    }
}
