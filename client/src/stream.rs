use {
    crate::error::ClientError,
    async_trait::async_trait,
    futures_util::{
        stream::BoxStream,
        SinkExt,
        StreamExt,
    },
    lotline_api_types::{
        ws::{
            self,
            BidPayload,
            StreamEvent,
        },
        AuctionId,
        Routable,
    },
    tokio::sync::mpsc,
    tokio_stream::wrappers::UnboundedReceiverStream,
    tokio_tungstenite::{
        connect_async,
        tungstenite::Message,
    },
    tracing::warn,
    url::Url,
};

/// Frames delivered by one established per-auction subscription. The stream
/// ends when the connection is gone; a trailing `Err` item marks a transport
/// failure.
pub type EventStream = BoxStream<'static, Result<StreamEvent, ClientError>>;

/// Opens the push subscription for one auction.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, auction_id: &AuctionId) -> Result<EventStream, ClientError>;
}

/// Websocket-backed connector against the marketplace push gateway.
pub struct WsConnector {
    ws_url: Url,
}

impl WsConnector {
    pub fn new(ws_url: Url) -> Self {
        Self { ws_url }
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self, auction_id: &AuctionId) -> Result<EventStream, ClientError> {
        let path = ws::Route::AuctionStream
            .properties()
            .full_path
            .replace(":auction_id", auction_id);
        let url_string = format!("{}{}", self.ws_url.as_str().trim_end_matches('/'), path);
        let (mut ws_stream, _) = connect_async(url_string)
            .await
            .map_err(|e| ClientError::StreamConnectFailed(e.to_string()))?;

        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(message) = ws_stream.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(err) => {
                        let _ = event_sender
                            .send(Err(ClientError::StreamConnectFailed(err.to_string())));
                        break;
                    }
                };
                let frame = match message {
                    Message::Text(text) => decode_frame(&text),
                    Message::Binary(binary) => decode_frame(&String::from_utf8_lossy(&binary)),
                    Message::Close(_) => break,
                    Message::Ping(data) => {
                        let _ = ws_stream.send(Message::Pong(data)).await;
                        continue;
                    }
                    Message::Pong(_) | Message::Frame(_) => continue,
                };
                if let Some(event) = frame {
                    if event_sender.send(Ok(event)).is_err() {
                        // subscriber is gone, stop reading
                        break;
                    }
                }
            }
        });
        Ok(UnboundedReceiverStream::new(event_receiver).boxed())
    }
}

/// Decodes one wire frame.
///
/// Structured frames carry a `type` tag. Untyped frames that still parse as a
/// bid payload with a usable amount are tolerated as a fallback bid channel;
/// everything else is rejected here at the boundary.
pub(crate) fn decode_frame(raw: &str) -> Option<StreamEvent> {
    match serde_json::from_str::<StreamEvent>(raw) {
        Ok(event) => Some(event),
        Err(_) => match serde_json::from_str::<BidPayload>(raw) {
            Ok(payload) if payload.effective_amount().is_some() => {
                Some(StreamEvent::Bid(payload))
            }
            _ => {
                warn!(frame = raw, "discarding frame with unknown shape");
                None
            }
        },
    }
}
