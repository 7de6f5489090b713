use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{stream, Stream, StreamExt};
use validator::Validate;

use crate::dto::study_dto::{StudyPayload, StudyResponse};
use crate::error::Result;
use crate::services::study_service::StudyMode;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/study/{mode}",
    params(
        ("mode" = String, Path, description = "solver, notes, explainer, summarizer or practice-quiz")
    ),
    request_body = StudyPayload,
    responses(
        (status = 200, description = "Generated study content", body = StudyResponse),
        (status = 400, description = "Unknown mode or empty input"),
        (status = 502, description = "Generative service unavailable"),
    ),
)]
pub async fn generate(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    Json(payload): Json<StudyPayload>,
) -> Result<Json<StudyResponse>> {
    payload.validate()?;
    let mode = StudyMode::parse(&mode)?;
    let content = state.study_service.generate(mode, &payload.input).await?;
    Ok(Json(StudyResponse { mode, content }))
}

/// Server-sent events: one `data` event per fragment, then `done`. A failure
/// after the stream has started ends it with an `error` event instead.
pub async fn stream_generate(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    Json(payload): Json<StudyPayload>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    payload.validate()?;
    let mode = StudyMode::parse(&mode)?;
    let fragments = state.study_service.stream(mode, &payload.input).await?;

    let events = stream::unfold(Some(fragments), move |fragments| async move {
        let Some(mut fragments) = fragments else {
            return None;
        };
        match fragments.next().await {
            Some(Ok(text)) => Some((Event::default().data(strip_cr(&text)), Some(fragments))),
            Some(Err(e)) => {
                tracing::warn!(%mode, error = %e, "study stream interrupted");
                Some((Event::default().event("error").data(strip_cr(&e.to_string())), None))
            }
            None => Some((Event::default().event("done").data("[DONE]"), None)),
        }
    })
    .map(Ok::<Event, Infallible>);

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// SSE field values may not contain carriage returns.
fn strip_cr(text: &str) -> String {
    text.replace('\r', "")
}
