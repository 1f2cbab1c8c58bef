//! Background worker answering chat messages from the knowledge base.
//!
//! The transport is left to the caller: messages arrive on an mpsc
//! receiver and replies leave through an mpsc sender. Each message is
//! answered in its own task, so a slow query never blocks the next one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use super::service::KnowledgeBase;
use crate::core::errors::ApiError;

pub const FAILED_REPLY: &str = "답변을 생성하지 못했습니다. 잠시 후 다시 시도해주세요.";
const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub thread_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub thread_id: String,
    pub text: String,
    pub source_previews: Vec<String>,
}

struct Worker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct ChatListener {
    knowledge: Arc<KnowledgeBase>,
    worker: Mutex<Option<Worker>>,
}

impl ChatListener {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            knowledge,
            worker: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Spawn the receive loop. Fails if a loop is already running.
    pub async fn start(
        &self,
        inbound: mpsc::Receiver<ChatMessage>,
        outbound: mpsc::Sender<ChatReply>,
    ) -> Result<(), ApiError> {
        let mut slot = self.worker.lock().await;
        if slot.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            return Err(ApiError::Conflict("Chat listener is already running".to_string()));
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run(self.knowledge.clone(), inbound, outbound, shutdown_rx));
        *slot = Some(Worker { shutdown, handle });
        tracing::info!("Chat listener started");
        Ok(())
    }

    /// Stop receiving and wait for the loop to exit. In-flight replies
    /// already spawned still complete.
    pub async fn stop(&self) {
        let Some(worker) = self.worker.lock().await.take() else {
            return;
        };
        let _ = worker.shutdown.send(());
        if let Err(err) = worker.handle.await {
            tracing::warn!("Chat listener task ended abnormally: {}", err);
        }
        tracing::info!("Chat listener stopped");
    }
}

async fn run(
    knowledge: Arc<KnowledgeBase>,
    mut inbound: mpsc::Receiver<ChatMessage>,
    outbound: mpsc::Sender<ChatReply>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            message = inbound.recv() => {
                let Some(message) = message else {
                    tracing::debug!("Chat inbound channel closed");
                    break;
                };
                tokio::spawn(answer(knowledge.clone(), message, outbound.clone()));
            }
        }
    }
}

async fn answer(knowledge: Arc<KnowledgeBase>, message: ChatMessage, outbound: mpsc::Sender<ChatReply>) {
    tracing::debug!("Chat message on thread {}", message.thread_id);

    let reply = match knowledge.query(&message.text, None).await {
        Ok(answer) => ChatReply {
            thread_id: message.thread_id,
            source_previews: answer.source_previews(PREVIEW_CHARS),
            text: answer.answer,
        },
        Err(err) => {
            tracing::warn!("Chat query on thread {} failed: {}", message.thread_id, err);
            ChatReply {
                thread_id: message.thread_id,
                text: FAILED_REPLY.to_string(),
                source_previews: Vec::new(),
            }
        }
    };

    if outbound.send(reply).await.is_err() {
        tracing::warn!("Chat reply dropped: outbound channel closed");
    }
}
