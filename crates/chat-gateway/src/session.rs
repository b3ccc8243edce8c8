//! [`MessagingSession`] implementation backed by the gateway daemon.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use digest_core::{
    session_name, ChatInfo, Dialog, HistoryMessage, MessagingSession, SessionError, SessionFactory,
};
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, info};

use crate::client::GatewayClient;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::types::{RawDialog, RawMessage};

/// Paging cursor shared by the dialog and history walks.
struct Cursor<T> {
    offset: Option<i64>,
    buffer: VecDeque<T>,
    done: bool,
}

impl<T> Cursor<T> {
    fn new() -> Self {
        Self {
            offset: None,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Record the outcome of a failed page fetch.
    ///
    /// Rate limits keep the cursor where it is so the next poll retries the
    /// same page; anything else ends the walk.
    fn fail(&mut self, err: GatewayError) -> SessionError {
        if !matches!(err, GatewayError::RateLimited { .. }) {
            self.done = true;
        }
        err.into()
    }
}

/// A user session held by the gateway daemon.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    client: GatewayClient,
    name: String,
}

impl GatewaySession {
    /// Session name as known to the daemon.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl MessagingSession for GatewaySession {
    fn chat_history(&self, chat_id: i64) -> BoxStream<'_, Result<HistoryMessage, SessionError>> {
        let page_size = self.client.config().page_size;

        stream::unfold(Cursor::<RawMessage>::new(), move |mut cursor| async move {
            loop {
                if let Some(raw) = cursor.buffer.pop_front() {
                    return Some((Ok(raw.to_history_message()), cursor));
                }
                if cursor.done {
                    return None;
                }

                match self
                    .client
                    .get_chat_history(&self.name, chat_id, cursor.offset, page_size)
                    .await
                {
                    Ok(page) => {
                        debug!(chat_id, "Fetched {} history messages", page.messages.len());
                        cursor.done = page.messages.is_empty() || page.next_offset_id.is_none();
                        cursor.offset = page.next_offset_id;
                        cursor.buffer.extend(page.messages);
                    }
                    Err(e) => {
                        let err = cursor.fail(e);
                        return Some((Err(err), cursor));
                    }
                }
            }
        })
        .boxed()
    }

    fn dialogs(&self) -> BoxStream<'_, Result<Dialog, SessionError>> {
        let page_size = self.client.config().page_size;

        stream::unfold(Cursor::<RawDialog>::new(), move |mut cursor| async move {
            loop {
                if let Some(raw) = cursor.buffer.pop_front() {
                    return Some((Ok(raw.to_dialog()), cursor));
                }
                if cursor.done {
                    return None;
                }

                match self
                    .client
                    .get_dialogs(&self.name, cursor.offset, page_size)
                    .await
                {
                    Ok(page) => {
                        cursor.done = page.dialogs.is_empty() || page.next_offset.is_none();
                        cursor.offset = page.next_offset;
                        cursor.buffer.extend(page.dialogs);
                    }
                    Err(e) => {
                        let err = cursor.fail(e);
                        return Some((Err(err), cursor));
                    }
                }
            }
        })
        .boxed()
    }

    async fn chat_info(&self, chat_id: i64) -> Result<ChatInfo, SessionError> {
        let chat = self.client.get_chat(&self.name, chat_id).await?;
        Ok(chat.to_chat_info())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.client.stop_session(&self.name).await?;
        info!("Stopped session {}", self.name);
        Ok(())
    }
}

/// Opens [`GatewaySession`]s on one daemon.
#[derive(Debug, Clone)]
pub struct GatewaySessionFactory {
    client: GatewayClient,
}

impl GatewaySessionFactory {
    /// Connect to the daemon described by `config`.
    pub async fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = GatewayClient::connect(config).await?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: GatewayClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionFactory for GatewaySessionFactory {
    async fn open(&self, identity: &str) -> Result<Arc<dyn MessagingSession>, SessionError> {
        let name = session_name(identity);
        self.client.start_session(&name, identity).await?;
        info!("Started session {}", name);

        Ok(Arc::new(GatewaySession {
            client: self.client.clone(),
            name,
        }))
    }

    async fn forget(&self, identity: &str) -> Result<(), SessionError> {
        let name = session_name(identity);
        self.client.log_out(&name).await?;
        info!("Logged out session {}", name);
        Ok(())
    }
}
