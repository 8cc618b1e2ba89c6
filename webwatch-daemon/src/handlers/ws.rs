//! Live ingestion channel.
//!
//! Every connection is both a producer and a subscriber: each inbound text
//! frame is one raw event, and every alert published by other connections is
//! pushed back out as a JSON text frame. Frames on one connection are handled
//! one at a time; different connections interleave freely.
//!
//! The socket is split in two. A writer task owns the outgoing half and drains
//! the connection's subscription, so a reader blocked in `publish` never stops
//! its own subscription from draining.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use webwatch_core::types::AlertRecord;
use webwatch_detect::{AlertBroadcastHub, DetectError, PublishReport, SubscriberId, Subscription};

use crate::state::AppState;

/// `GET /ws/alerts`
pub async fn ws_alerts(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let subscription = state.hub.subscribe().await;
    let (outbound, inbound) = socket.split();
    serve_connection(Arc::clone(&state.hub), subscription, inbound, outbound).await;
}

/// Run one live connection until either side goes away.
///
/// `inbound` yields the client's frames; `outbound` receives the alerts
/// published by other connections. The subscription is removed from the hub
/// when this returns.
pub async fn serve_connection<St, Si, E>(
    hub: Arc<AlertBroadcastHub>,
    subscription: Subscription,
    mut inbound: St,
    outbound: Si,
) where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    Si: Sink<Message> + Unpin + Send + 'static,
    Si::Error: Display,
{
    let id = subscription.id;
    info!(subscriber = %id, "client connected");

    let mut writer = tokio::spawn(forward_alerts(subscription.receiver, outbound, id));

    loop {
        tokio::select! {
            incoming = inbound.next() => {
                let payload = match incoming {
                    Some(Ok(Message::Text(text))) => text.into_bytes(),
                    Some(Ok(Message::Binary(bytes))) => bytes,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(subscriber = %id, error = %e, "websocket receive failed");
                        break;
                    }
                };

                if let Err(e) = handle_frame(&hub, &payload, id).await {
                    error!(subscriber = %id, error = %e, "alert assembly failed, closing connection");
                    break;
                }
            }
            finished = &mut writer => {
                match finished {
                    // the hub pruned this subscriber after a failed delivery
                    Ok(Ok(())) => debug!(subscriber = %id, "subscription closed by hub"),
                    Ok(Err(e)) => debug!(subscriber = %id, error = %e, "alert writer stopped"),
                    Err(e) => error!(subscriber = %id, error = %e, "alert writer task failed"),
                }
                break;
            }
        }
    }

    writer.abort();
    hub.unsubscribe(id).await;
    info!(subscriber = %id, "client disconnected");
}

/// Push every alert from `receiver` out through `outbound` as a JSON text frame.
///
/// Returns `Ok(())` once the hub drops the sending side, and
/// `DetectError::Channel` when the socket refuses a frame.
async fn forward_alerts<Si>(
    mut receiver: mpsc::Receiver<Arc<AlertRecord>>,
    mut outbound: Si,
    id: SubscriberId,
) -> Result<(), DetectError>
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    while let Some(alert) = receiver.recv().await {
        let text = match serde_json::to_string(&*alert) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to serialize alert");
                continue;
            }
        };
        outbound
            .send(Message::Text(text))
            .await
            .map_err(|e| DetectError::Channel(format!("send to subscriber {}: {}", id, e)))?;
    }
    Ok(())
}

/// Handle one inbound frame from subscriber `origin`.
///
/// Frames that are not JSON are logged and skipped (`Ok(None)`). A
/// classifier failure is returned to the caller, which closes the connection.
pub async fn handle_frame(
    hub: &AlertBroadcastHub,
    payload: &[u8],
    origin: SubscriberId,
) -> Result<Option<PublishReport>, DetectError> {
    let raw: Value = match serde_json::from_slice(payload) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(subscriber = %origin, error = %e, "skipping non-JSON frame");
            return Ok(None);
        }
    };

    let report = hub.publish(&raw, Some(origin)).await?;
    debug!(
        subscriber = %origin,
        attack = %report.alert.attack,
        severity = report.alert.severity,
        delivered = report.delivered,
        pruned = report.pruned,
        "event published"
    );
    Ok(Some(report))
}
