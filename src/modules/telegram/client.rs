use std::collections::VecDeque;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;

use crate::core::error::{AppError, Result};
use crate::features::dialogue::boundary::{ChatBoundary, EventKind, InboundEvent};
use crate::modules::telegram::types::{
    ApiResponse, InlineKeyboardButton, InlineKeyboardMarkup, Update,
};

/// Seconds the getUpdates call blocks server-side before returning empty.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Boundary adapter over the Telegram Bot API, long polling. One getUpdates
/// batch is buffered locally and handed out event by event.
pub struct TelegramBoundary {
    http: reqwest::Client,
    base_url: String,
    offset: Mutex<i64>,
    queue: Mutex<VecDeque<InboundEvent>>,
}

impl TelegramBoundary {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{}", token),
            offset: Mutex::new(0),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(&body)
            .send()
            .await?;

        let api: ApiResponse<T> = response.json().await?;
        if !api.ok {
            return Err(AppError::Telegram(
                api.description
                    .unwrap_or_else(|| format!("{} failed without description", method)),
            ));
        }
        api.result
            .ok_or_else(|| AppError::Telegram(format!("{} returned empty result", method)))
    }

    async fn poll(&self) -> Result<Vec<Update>> {
        let offset = *self.offset.lock().await;
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    async fn enqueue(&self, updates: Vec<Update>) {
        let mut offset = self.offset.lock().await;
        let mut queue = self.queue.lock().await;

        for update in updates {
            *offset = (*offset).max(update.update_id + 1);

            if let Some(callback) = update.callback_query {
                // Stops the client-side spinner; failure is not worth more
                // than a log line.
                if let Err(e) = self
                    .call::<bool>("answerCallbackQuery", json!({ "callback_query_id": callback.id }))
                    .await
                {
                    tracing::warn!("failed to answer callback query: {}", e);
                }
                if let Some(data) = callback.data {
                    queue.push_back(InboundEvent {
                        identity: callback.from.id,
                        kind: EventKind::Choice,
                        payload: data,
                    });
                }
            } else if let Some(message) = update.message {
                if let Some(text) = message.text {
                    let identity = message.from.map(|u| u.id).unwrap_or(message.chat.id);
                    queue.push_back(InboundEvent {
                        identity,
                        kind: EventKind::Text,
                        payload: text,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl ChatBoundary for TelegramBoundary {
    async fn recv(&self) -> Result<InboundEvent> {
        loop {
            if let Some(event) = self.queue.lock().await.pop_front() {
                return Ok(event);
            }
            let updates = self.poll().await?;
            self.enqueue(updates).await;
        }
    }

    async fn render(&self, identity: i64, text: &str, choices: &[(String, String)]) -> Result<()> {
        let mut body = json!({ "chat_id": identity, "text": text });
        if !choices.is_empty() {
            let markup = InlineKeyboardMarkup {
                inline_keyboard: choices
                    .iter()
                    .map(|(label, token)| {
                        vec![InlineKeyboardButton {
                            text: label.clone(),
                            callback_data: token.clone(),
                        }]
                    })
                    .collect(),
            };
            body["reply_markup"] = serde_json::to_value(markup)
                .map_err(|e| AppError::Telegram(format!("keyboard serialization: {}", e)))?;
        }

        self.call::<serde_json::Value>("sendMessage", body).await?;
        Ok(())
    }

    async fn notify(&self, identity: i64, text: &str) -> Result<()> {
        self.call::<serde_json::Value>("sendMessage", json!({ "chat_id": identity, "text": text }))
            .await?;
        Ok(())
    }
}
