//! Per-connection WebSocket session.
//!
//! Each connection registers a channel-backed subscriber with the hub, then
//! forwards queued hub messages to the socket while answering client pings.
//! The session ends when the client goes away or the hub drops the
//! subscriber, and always deregisters on the way out.

use callcast_core::{CallHub, ChannelSubscriber, Subscriber};
use callcast_protocol::{ClientMessage, ServerMessage, SubscriberId};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info, warn};
use rocket_ws::Message;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drive one subscriber connection until either side closes it.
pub async fn run<S, R, E>(hub: CallHub, buffer: usize, sink: S, incoming: R)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let (subscriber, outbound) = ChannelSubscriber::new(buffer);
    attach(hub, subscriber, outbound, sink, incoming).await;
}

/// Like [`run`], for a subscriber and queue created by the caller.
///
/// The sink is closed on every exit, including a rejected registration.
pub async fn attach<S, R, E>(
    hub: CallHub,
    subscriber: ChannelSubscriber,
    mut outbound: mpsc::Receiver<Arc<ServerMessage>>,
    mut sink: S,
    mut incoming: R,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let id = subscriber.id();
    if !hub.register(Arc::new(subscriber)) {
        warn!("websocket session rejected (subscriber_id={})", id);
        close(&mut sink, id).await;
        return;
    }
    info!("websocket session opened (subscriber_id={})", id);

    loop {
        tokio::select! {
            message = outbound.recv() => {
                let Some(message) = message else {
                    debug!("subscriber dropped by hub (subscriber_id={})", id);
                    break;
                };
                if let Err(err) = write_message(&mut sink, &message).await {
                    debug!("websocket write failed (subscriber_id={}, err={})", id, err);
                    break;
                }
            }
            frame = incoming.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if ClientMessage::parse(&text) == Some(ClientMessage::Ping) {
                        if let Err(err) = write_message(&mut sink, &ServerMessage::Pong).await {
                            debug!("websocket pong failed (subscriber_id={}, err={})", id, err);
                            break;
                        }
                    } else {
                        debug!("ignoring client frame (subscriber_id={}, len={})", id, text.len());
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!("websocket read failed (subscriber_id={}, err={})", id, err);
                    break;
                }
            }
        }
    }

    hub.deregister(&id);
    close(&mut sink, id).await;
    info!("websocket session closed (subscriber_id={})", id);
}

async fn close<S>(sink: &mut S, id: SubscriberId)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    if let Err(err) = sink.close().await {
        debug!("websocket close failed (subscriber_id={}, err={})", id, err);
    }
}

async fn write_message<S>(sink: &mut S, message: &ServerMessage) -> Result<(), String>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let text = serde_json::to_string(message).map_err(|err| err.to_string())?;
    sink.send(Message::Text(text))
        .await
        .map_err(|err| err.to_string())
}
