//! Server-sent event feeds over the event bus: each handler wraps an
//! `mpsc::Receiver` in a `ReceiverStream` and hands it to
//! `Sse::new(..).keep_alive(..)`.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;

use super::dto::AgentQuery;
use super::error::ApiError;
use super::routes::AppState;

fn to_sse<E: serde::Serialize>(event_name: &'static str, event: E) -> Result<Event, Infallible> {
    let data = serde_json::to_string(&event).unwrap_or_else(|err| json!({ "error": err.to_string() }).to_string());
    Ok(Event::default().event(event_name).data(data))
}

fn keep_alive() -> KeepAlive {
    KeepAlive::new().interval(Duration::from_secs(15)).text(":\n")
}

/// One table's public feed: the public state projection, delivered as a
/// stream of deltas rather than polled.
pub async fn table_feed(
    State(state): State<AppState>,
    Path(table_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let bus = state.events.table(&table_id);
    let (_id, rx) = bus.subscribe();
    let stream = ReceiverStream::new(rx).map(|event| to_sse("table", event));
    Sse::new(stream).keep_alive(keep_alive())
}

/// The global duel lifecycle feed: coinflip and RPS events for
/// every duel, regardless of which one a particular viewer cares about.
pub async fn duel_feed(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (_id, rx) = state.events.duels.subscribe();
    let stream = ReceiverStream::new(rx).map(|event| to_sse("duel", event));
    Sse::new(stream).keep_alive(keep_alive())
}

/// One agent's private feed: hole cards
/// at deal time and nothing else crosses this channel.
pub async fn private_feed(
    State(state): State<AppState>,
    Query(query): Query<AgentQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let agent = query.agent.ok_or_else(|| ApiError::bad_request("agent query parameter is required"))?;
    let (_id, rx) = state.events.private.subscribe(&agent);
    let stream = ReceiverStream::new(rx).map(|event| to_sse("private", event));
    Ok(Sse::new(stream).keep_alive(keep_alive()))
}
