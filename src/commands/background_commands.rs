use crate::bus::{Delivery, Inbox};
use crate::error::AppError;
use crate::models::message::{Message, ReplyEnvelope, RequestId};
use crate::models::search::{Query, SearchReply};
use crate::services::search_service::SearchClient;

/// Runs one search and folds any failure into the `{error}` payload.
pub async fn handle_search(client: &SearchClient, query: &str) -> SearchReply {
    let result = match Query::parse(query) {
        Ok(query) => client.search(&query).await,
        Err(e) => Err(e),
    };
    SearchReply::from(result.map_err(AppError::capture))
}

fn send_reply(delivery: Delivery, reply: &ReplyEnvelope) {
    if let Err(e) = delivery.reply(reply) {
        tracing::debug!(request = %reply.id, error = %e, "reply dropped");
    }
}

pub async fn handle_delivery(client: &SearchClient, delivery: Delivery) {
    let envelope = match delivery.envelope() {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "malformed message");
            if delivery.expects_reply() {
                let reply = ReplyEnvelope {
                    id: RequestId(0),
                    reply: SearchReply::Error {
                        error: format!("Malformed message: {e}"),
                    },
                };
                send_reply(delivery, &reply);
            }
            return;
        }
    };

    match envelope.message {
        Message::Search { query } => {
            let reply = ReplyEnvelope {
                id: envelope.id,
                reply: handle_search(client, &query).await,
            };
            send_reply(delivery, &reply);
        }
        other => {
            tracing::warn!(action = other.action(), "background does not handle this action");
        }
    }
}

/// Coordinator loop. Each request is handled on its own task; nothing is shared
/// between requests except the HTTP client.
pub async fn run(mut inbox: Inbox, client: SearchClient) {
    while let Some(delivery) = inbox.recv().await {
        let client = client.clone();
        tokio::spawn(async move { handle_delivery(&client, delivery).await });
    }
    tracing::debug!("background coordinator stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MessageBus;
    use crate::config::ExtensionConfig;
    use crate::models::address::Target;
    use crate::models::message::Envelope;
    use mockito::Server;
    use serde_json::json;

    fn client_for(endpoint: &str) -> SearchClient {
        SearchClient::new(&ExtensionConfig {
            endpoint: endpoint.to_string(),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    fn search(id: u64, query: &str) -> Envelope {
        Envelope::new(
            RequestId(id),
            Message::Search {
                query: query.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn empty_query_is_answered_with_error_without_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .expect(0)
            .create_async()
            .await;

        let reply = handle_search(&client_for(&server.url()), "   ").await;
        assert_eq!(
            reply,
            SearchReply::Error {
                error: "No query provided".to_string()
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn replies_echo_request_id() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(200)
            .with_body(json!({"results": []}).to_string())
            .create_async()
            .await;

        let bus = MessageBus::new();
        let inbox = bus.register(Target::background());
        tokio::spawn(run(inbox, client_for(&server.url())));

        let reply: ReplyEnvelope = bus
            .request(Target::background(), &search(42, "anything"))
            .await
            .unwrap();
        assert_eq!(reply.id, RequestId(42));
        assert_eq!(reply.reply, SearchReply::Results { results: vec![] });
    }

    #[tokio::test]
    async fn http_failure_becomes_error_reply() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(503)
            .create_async()
            .await;

        let bus = MessageBus::new();
        let inbox = bus.register(Target::background());
        tokio::spawn(run(inbox, client_for(&server.url())));

        let reply: ReplyEnvelope = bus
            .request(Target::background(), &search(1, "refund policy"))
            .await
            .unwrap();
        match reply.reply {
            SearchReply::Error { error } => assert!(error.contains("503")),
            other => panic!("expected error reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn highlight_sent_to_background_gets_no_reply() {
        let server = Server::new_async().await;
        let bus = MessageBus::new();
        let inbox = bus.register(Target::background());
        tokio::spawn(run(inbox, client_for(&server.url())));

        let envelope = Envelope::new(
            RequestId(1),
            Message::Highlight {
                text: "x".to_string(),
            },
        );
        let result: Result<ReplyEnvelope, _> = bus.request(Target::background(), &envelope).await;
        assert!(matches!(result, Err(AppError::NoReply)));
    }

    #[tokio::test]
    async fn coordinator_keeps_serving_after_requester_leaves() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(200)
            .with_body(json!({"results": [{"url": "https://a.example", "content": "A"}]}).to_string())
            .expect_at_least(1)
            .create_async()
            .await;

        let bus = MessageBus::new();
        let inbox = bus.register(Target::background());
        tokio::spawn(run(inbox, client_for(&server.url())));

        let abandoned = {
            let bus = bus.clone();
            tokio::spawn(async move {
                let _: Result<ReplyEnvelope, _> =
                    bus.request(Target::background(), &search(1, "first")).await;
            })
        };
        abandoned.abort();
        let _ = abandoned.await;

        let reply: ReplyEnvelope = bus
            .request(Target::background(), &search(2, "second"))
            .await
            .unwrap();
        assert_eq!(reply.id, RequestId(2));
        assert!(matches!(reply.reply, SearchReply::Results { .. }));
    }
}
