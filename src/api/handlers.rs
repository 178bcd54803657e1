//! Route handlers

use super::error::ApiResult;
use super::events::Event;
use super::state::{AppState, AuthUser};
use crate::auth::SignedIn;
use crate::community::QuestionThread;
use crate::dashboard::DashboardOutcome;
use crate::goals::GoalInput;
use crate::mentorship::ApplicationInput;
use crate::profile::{ProfileEdit, Registration};
use crate::roadmap::{career_paths, CareerPath, CompletionResult, ReplacedRoadmap};
use crate::types::{
    AnswerId, CommunityAnswer, CommunityQuestion, Goal, GoalId, GoalStatus, Mentor,
    MentorApplication, MentorId, MentorSession, ModuleId, Profile, ProgressSummary, QuestionId,
    RoadmapModule,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::{Stream, StreamExt as _};
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub instance_id: String,
    pub subscribers: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance_id: state.instance_id.clone(),
        subscribers: state.app.events.subscriber_count(),
    })
}

// Auth

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub profile: Profile,
    #[serde(flatten)]
    pub session: SignedIn,
}

pub async fn register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let email = registration.email.clone();
    let password = registration.password.clone();
    let profile = state.app.profiles.register(registration).await?;
    let session = state.app.auth.sign_in(&email, &password).await?;
    state
        .app
        .events
        .broadcast(Event::session_started(session.user_id));
    Ok((StatusCode::CREATED, Json(RegisterResponse { profile, session })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SignedIn>> {
    let signed_in = state.app.auth.sign_in(&req.email, &req.password).await?;
    state
        .app
        .events
        .broadcast(Event::session_started(signed_in.user_id));
    Ok(Json(signed_in))
}

pub async fn logout(State(state): State<AppState>, user: AuthUser) -> ApiResult<StatusCode> {
    state.app.auth.sign_out(&user.token).await?;
    state.app.events.broadcast(Event::session_ended(user.user_id));
    Ok(StatusCode::NO_CONTENT)
}

/// Live events of the caller
pub async fn events(
    State(state): State<AppState>,
    user: AuthUser,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    debug!("SSE client connected for {}", user.user_id);
    let stream = state
        .app
        .events
        .subscribe(user.user_id)
        .into_stream()
        .filter_map(|event| {
            let data = serde_json::to_string(&event).ok()?;
            Some(Ok(SseEvent::default().data(data).id(event.id)))
        });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

// Roadmap

pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<DashboardOutcome>> {
    Ok(Json(state.app.dashboard.load(user.user_id).await?))
}

pub async fn progress(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ProgressSummary>> {
    Ok(Json(state.app.dashboard.progress(user.user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RoadmapQuery {
    pub topic: Option<String>,
}

pub async fn roadmap(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RoadmapQuery>,
) -> ApiResult<Json<Vec<RoadmapModule>>> {
    let modules = state
        .app
        .dashboard
        .roadmap(user.user_id, query.topic.as_deref())
        .await?;
    Ok(Json(modules))
}

pub async fn complete_module(
    State(state): State<AppState>,
    user: AuthUser,
    Path(module_id): Path<ModuleId>,
) -> ApiResult<Json<CompletionResult>> {
    let result = state
        .app
        .progression
        .complete_module(user.user_id, module_id)
        .await?;
    Ok(Json(result))
}

/// Throw away every roadmap and start over on the beginner steps of a topic
pub async fn replace_roadmap(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SelectPathRequest>,
) -> ApiResult<Json<ReplacedRoadmap>> {
    Ok(Json(state.app.generator.replace(user.user_id, &req.topic).await?))
}

pub async fn paths() -> Json<&'static [CareerPath]> {
    Json(career_paths())
}

#[derive(Debug, Deserialize)]
pub struct SelectPathRequest {
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct SelectPathResponse {
    pub topic: String,
    pub removed: u64,
}

pub async fn select_path(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SelectPathRequest>,
) -> ApiResult<Json<SelectPathResponse>> {
    let removed = state.app.careers.select_path(user.user_id, &req.topic).await?;
    Ok(Json(SelectPathResponse {
        topic: req.topic.trim().to_string(),
        removed,
    }))
}

// Profile

pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Profile>> {
    Ok(Json(state.app.profiles.get(user.user_id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(edit): Json<ProfileEdit>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(state.app.profiles.update(user.user_id, edit).await?))
}

// Goals

pub async fn list_goals(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Goal>>> {
    Ok(Json(state.app.goals.list(user.user_id).await?))
}

pub async fn create_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<GoalInput>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let goal = state.app.goals.create(user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn update_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<GoalId>,
    Json(input): Json<GoalInput>,
) -> ApiResult<Json<Goal>> {
    Ok(Json(state.app.goals.update(user.user_id, id, input).await?))
}

#[derive(Debug, Deserialize)]
pub struct GoalStatusRequest {
    pub status: GoalStatus,
}

pub async fn set_goal_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<GoalId>,
    Json(req): Json<GoalStatusRequest>,
) -> ApiResult<Json<Goal>> {
    Ok(Json(state.app.goals.set_status(user.user_id, id, req.status).await?))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<GoalId>,
) -> ApiResult<StatusCode> {
    state.app.goals.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Community

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

pub async fn list_threads(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<QuestionThread>>> {
    Ok(Json(state.app.community.threads().await?))
}

pub async fn ask_question(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<QuestionRequest>,
) -> ApiResult<(StatusCode, Json<CommunityQuestion>)> {
    let question = state
        .app
        .community
        .ask(user.user_id, &req.question, req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn edit_question(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<QuestionId>,
    Json(req): Json<QuestionRequest>,
) -> ApiResult<Json<CommunityQuestion>> {
    let question = state
        .app
        .community
        .edit_question(user.user_id, id, &req.question, req.description)
        .await?;
    Ok(Json(question))
}

pub async fn delete_question(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<QuestionId>,
) -> ApiResult<StatusCode> {
    state.app.community.delete_question(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn answer_question(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<QuestionId>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<(StatusCode, Json<CommunityAnswer>)> {
    let answer = state
        .app
        .community
        .answer(user.user_id, id, &req.answer)
        .await?;
    Ok((StatusCode::CREATED, Json(answer)))
}

pub async fn edit_answer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<AnswerId>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<Json<CommunityAnswer>> {
    let answer = state
        .app
        .community
        .edit_answer(user.user_id, id, &req.answer)
        .await?;
    Ok(Json(answer))
}

pub async fn delete_answer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<AnswerId>,
) -> ApiResult<StatusCode> {
    state.app.community.delete_answer(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Mentorship

pub async fn list_mentors(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<Mentor>>> {
    Ok(Json(state.app.mentorship.list_mentors().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct BookRequest {
    #[serde(default)]
    pub session_date: Option<DateTime<Utc>>,
}

pub async fn book_mentor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(mentor_id): Path<MentorId>,
    body: Option<Json<BookRequest>>,
) -> ApiResult<(StatusCode, Json<MentorSession>)> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let session = state
        .app
        .mentorship
        .book(user.user_id, mentor_id, req.session_date)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<MentorSession>>> {
    Ok(Json(state.app.mentorship.sessions(user.user_id).await?))
}

pub async fn apply_as_mentor(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<ApplicationInput>,
) -> ApiResult<(StatusCode, Json<MentorApplication>)> {
    let application = state.app.mentorship.apply(input).await?;
    Ok((StatusCode::CREATED, Json(application)))
}
