//! Gateway event stream: connect and receive loop.
//!
//! A connection is opened with [`connect`] and then driven by
//! [`stream_events`] until the gateway closes it, the transport fails, or
//! shutdown is requested. Each data frame is pushed through the
//! [`EventPipeline`] to completion before the next frame is read.
//!
//! No application-level pings are sent. Inbound pings are answered by the
//! transport.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::WiretapError;
use crate::service::EventPipeline;
use crate::shutdown::ShutdownSignal;

/// Client side of a gateway stream.
pub type GatewayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens the stream at `url`.
///
/// # Errors
///
/// Returns [`WiretapError::ConnectionLost`] if the connection or the
/// WebSocket upgrade fails.
pub async fn connect(url: &str) -> Result<GatewayStream, WiretapError> {
    let (stream, _response) =
        connect_async(url)
            .await
            .map_err(|e| WiretapError::ConnectionLost {
                url: url.to_string(),
                reason: format!("connect failed: {e}"),
            })?;
    Ok(stream)
}

/// Runs the receive loop for one gateway stream.
///
/// Returns `Ok(())` only when shutdown was requested, after sending a close
/// frame to the gateway.
///
/// # Errors
///
/// Returns [`WiretapError::ConnectionLost`] when the gateway closes the
/// stream or the transport errors.
pub async fn stream_events(
    stream: GatewayStream,
    url: &str,
    pipeline: &EventPipeline,
    mut shutdown: ShutdownSignal,
) -> Result<(), WiretapError> {
    let (mut ws_tx, mut ws_rx) = stream.split();
    let lost = |reason: String| WiretapError::ConnectionLost {
        url: url.to_string(),
        reason,
    };

    loop {
        tokio::select! {
            () = shutdown.wait() => {
                if let Err(e) = ws_tx.send(Message::Close(None)).await {
                    tracing::debug!(error = %e, "close frame not delivered");
                }
                tracing::info!("stream closed for shutdown");
                return Ok(());
            }
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        pipeline.handle_message(text.as_str()).await;
                    }
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => {
                            pipeline.handle_message(text).await;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, len = bytes.len(), "ignoring non-UTF-8 binary frame");
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| format!("closed by gateway ({}): {}", u16::from(f.code), f.reason.as_str()))
                            .unwrap_or_else(|| "closed by gateway".to_string());
                        return Err(lost(reason));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(lost(e.to_string())),
                    None => return Err(lost("stream ended".to_string())),
                }
            }
        }
    }
}
