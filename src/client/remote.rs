//! HTTP client for a running daemon

use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::{error::ClientError, state::{Command, Snapshot}};

use super::{
    events::EventStreamParser,
    mirror::{MirrorUpdate, StateMirror},
};

type EventChunks = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Send one command over the message protocol
    pub async fn send(&self, command: &Command) -> Result<Snapshot, ClientError> {
        let url = format!("{}/command", self.base_url);
        debug!("Sending {} to {}", command.name(), url);

        let response = self.http.post(url).json(&command.to_message()).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.json::<Snapshot>().await?)
    }

    /// Open the push stream
    async fn subscribe(&self) -> Result<EventChunks, ClientError> {
        let response = self
            .http
            .get(format!("{}/events", self.base_url))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed())
    }

    /// Follow the timer: apply pushes from `GET /events` as they arrive and
    /// poll `GET_STATE` every `interval` as a fallback. A dropped push stream
    /// is reopened on the next poll. `on_update` sees every change.
    pub async fn watch<F>(&self, interval: Duration, mut on_update: F) -> Result<(), ClientError>
    where
        F: FnMut(MirrorUpdate, &StateMirror),
    {
        let mut mirror = StateMirror::new();
        let update = mirror.apply_response(self.send(&Command::GetState).await?);
        on_update(update, &mirror);

        let mut parser = EventStreamParser::new();
        let mut events = self.connect(&mut parser).await;
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                chunk = next_chunk(&mut events) => match chunk {
                    Some(Ok(bytes)) => {
                        for event in parser.feed(&bytes) {
                            let update = mirror.apply_push(&event);
                            if update != MirrorUpdate::Unchanged {
                                on_update(update, &mirror);
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Push stream failed, falling back to polling: {}", e);
                        events = None;
                    }
                    None => {
                        info!("Push stream closed, falling back to polling");
                        events = None;
                    }
                },
                _ = ticker.tick() => {
                    match self.send(&Command::GetState).await {
                        Ok(snapshot) => {
                            let update = mirror.apply_poll(snapshot);
                            if update == MirrorUpdate::Changed {
                                on_update(update, &mirror);
                            }
                        }
                        Err(e) => warn!("Poll failed: {}", e),
                    }
                    if events.is_none() {
                        events = self.connect(&mut parser).await;
                    }
                }
            }
        }
    }

    /// Open the push stream with a fresh parser, logging failures
    async fn connect(&self, parser: &mut EventStreamParser) -> Option<EventChunks> {
        match self.subscribe().await {
            Ok(events) => {
                *parser = EventStreamParser::new();
                debug!("Subscribed to push events");
                Some(events)
            }
            Err(e) => {
                warn!("Failed to subscribe to push events: {}", e);
                None
            }
        }
    }
}

/// Next chunk of the push stream; never resolves without one
async fn next_chunk(events: &mut Option<EventChunks>) -> Option<Result<Vec<u8>, reqwest::Error>> {
    match events {
        Some(events) => events.next().await,
        None => std::future::pending().await,
    }
}
