//! SSE encoding for change streams

use axum::{
    http::{header, HeaderName, HeaderValue},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
};
use futures::stream::Stream;
use std::convert::Infallible;
use tracing::{debug, warn};

use super::stream::{FeedHandle, FeedMessage};

const KEEP_ALIVE_COMMENT: &str = "keep-alive";

/// Encode one feed message as an SSE frame
///
/// Events become a JSON `data:` line; keep-alives become the comment line
/// `: keep-alive`. Returns `None` if an event fails to serialize.
pub fn into_sse_event(message: &FeedMessage) -> Option<Event> {
    match message {
        FeedMessage::Event(event) => match Event::default().json_data(event) {
            Ok(sse_event) => Some(sse_event),
            Err(e) => {
                warn!("SSE: Failed to serialize {} event: {}", event.event_type(), e);
                None
            }
        },
        FeedMessage::KeepAlive => Some(Event::default().comment(KEEP_ALIVE_COMMENT)),
    }
}

/// Stream of SSE frames owning the feed handle
///
/// When axum drops the stream (client gone) the handle drops with it and
/// its task is aborted.
pub fn sse_stream(mut handle: FeedHandle) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(message) = handle.next().await {
            if let Some(event) = into_sse_event(&message) {
                yield Ok(event);
            }
        }
        debug!("SSE: change stream for {} ended", handle.scope());
    }
}

/// Full `text/event-stream` response for an open feed
pub fn sse_response(handle: FeedHandle) -> Response {
    (
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (
                HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
        ],
        Sse::new(sse_stream(handle)),
    )
        .into_response()
}
