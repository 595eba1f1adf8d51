use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::error::AppError;
use crate::models::address::Target;
use crate::models::message::Envelope;

pub type Inbox = mpsc::UnboundedReceiver<Delivery>;

/// A serialized message handed to one context. Requests carry a reply slot.
#[derive(Debug)]
pub struct Delivery {
    body: String,
    reply_to: Option<oneshot::Sender<String>>,
}

impl Delivery {
    pub fn envelope(&self) -> Result<Envelope, AppError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn expects_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    /// Answers the request. Consumes the delivery, so there is at most one reply.
    pub fn reply<T: Serialize>(self, payload: &T) -> Result<(), AppError> {
        let Some(reply_to) = self.reply_to else {
            return Err(AppError::Delivery(
                "message does not accept a reply".to_string(),
            ));
        };
        let body = serde_json::to_string(payload)?;
        reply_to
            .send(body)
            .map_err(|_| AppError::Delivery("requester is gone".to_string()))
    }
}

#[derive(Clone, Default)]
pub struct MessageBus {
    routes: Arc<RwLock<HashMap<Target, mpsc::UnboundedSender<Delivery>>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the route for `target`, replacing any previous one.
    pub fn register(&self, target: Target) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut routes = self
            .routes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        routes.insert(target, tx);
        tracing::debug!(%target, "route registered");
        rx
    }

    pub fn unregister(&self, target: Target) {
        let mut routes = self
            .routes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if routes.remove(&target).is_some() {
            tracing::debug!(%target, "route removed");
        }
    }

    pub fn is_registered(&self, target: Target) -> bool {
        self.routes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&target)
            .is_some_and(|tx| !tx.is_closed())
    }

    fn route(&self, target: Target) -> Result<mpsc::UnboundedSender<Delivery>, AppError> {
        self.routes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&target)
            .cloned()
            .ok_or_else(|| AppError::Delivery(format!("no receiver for {target}")))
    }

    fn deliver(&self, target: Target, delivery: Delivery) -> Result<(), AppError> {
        self.route(target)?
            .send(delivery)
            .map_err(|_| AppError::Delivery(format!("receiver for {target} has shut down")))
    }

    /// Sends a request and waits for its single reply.
    pub async fn request<R: DeserializeOwned>(
        &self,
        target: Target,
        envelope: &Envelope,
    ) -> Result<R, AppError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let delivery = Delivery {
            body: serde_json::to_string(envelope)?,
            reply_to: Some(reply_tx),
        };
        self.deliver(target, delivery)?;

        let body = reply_rx.await.map_err(|_| AppError::NoReply)?;
        serde_json::from_str(&body).map_err(|e| AppError::MalformedResponse(e.to_string()))
    }

    /// Fire-and-forget delivery; the receiver never answers.
    pub fn notify(&self, target: Target, envelope: &Envelope) -> Result<(), AppError> {
        let delivery = Delivery {
            body: serde_json::to_string(envelope)?,
            reply_to: None,
        };
        self.deliver(target, delivery)
    }
}
