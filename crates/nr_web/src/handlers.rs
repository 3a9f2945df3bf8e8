use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use nr_core::{Article, Bookmark, Comment};
use nr_reader::{PostView, SearchQuery, SessionState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, AppState};

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: usize,
}

pub async fn feed(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedParams>,
) -> ApiResult<Json<Vec<Article>>> {
    let articles = state.reader.feed.latest(params.category.as_deref()).await?;
    Ok(Json(articles))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Article>>> {
    let query = SearchQuery::from_params(
        params.q.as_deref(),
        params.category.as_deref(),
        params.from.as_deref(),
        params.to.as_deref(),
        params.sort.as_deref(),
    )?;
    let results = state.reader.search.run_search(&query).await?;
    Ok(Json(results))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PostView>> {
    Ok(Json(state.reader.fetch_post(&id).await?))
}

pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<LikeResponse>> {
    let liked = state.reader.toggle_like(&id).await?;
    let interaction = state.reader.interactions.load_interactions(&id).await?;
    Ok(Json(LikeResponse { liked, likes_count: interaction.likes_count() }))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CommentBody>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state.reader.add_comment(&id, &body.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_bookmarks(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Bookmark>>> {
    Ok(Json(state.reader.saved_bookmarks().await?))
}

pub async fn save_bookmark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Bookmark>> {
    Ok(Json(state.reader.save_bookmark(&id).await?))
}

pub async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.reader.remove_bookmark(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionState> {
    Json(state.reader.session().state())
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInBody>,
) -> ApiResult<Json<SessionState>> {
    state.reader.session().signin(&body.email, &body.password).await?;
    Ok(Json(state.reader.session().state()))
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpBody>,
) -> ApiResult<Json<SessionState>> {
    state
        .reader
        .session()
        .signup(body.name.as_deref(), &body.email, &body.password)
        .await?;
    Ok(Json(state.reader.session().state()))
}

pub async fn guest(State(state): State<Arc<AppState>>) -> ApiResult<Json<SessionState>> {
    state.reader.session().guest_signin().await?;
    Ok(Json(state.reader.session().state()))
}

pub async fn sign_out(State(state): State<Arc<AppState>>) -> ApiResult<Json<SessionState>> {
    state.reader.session().signout().await?;
    Ok(Json(state.reader.session().state()))
}
