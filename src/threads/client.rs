//! Client for the hosted agent service (threads, messages, streamed runs)

use anyhow::{Context, Result};
use futures::stream::Stream;
use futures::StreamExt;
use reqwest::Client;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use super::types::{
    parse_run_event, CreateMessageRequest, CreateRunRequest, MessageList, RunStreamEvent,
    ThreadObject,
};
use crate::core::{DeskError, DeskResult};
use crate::llm::auth::{AuthConfig, AuthProvider, AuthSource};

/// API version sent with every agent-service request
pub const AGENTS_API_VERSION: &str = "2024-12-01-preview";

/// Boxed stream of run events
pub type RunEventStream = Pin<Box<dyn Stream<Item = Result<RunStreamEvent>> + Send>>;

/// Operations the desk needs from the remote agent runtime
#[async_trait::async_trait]
pub trait ThreadService: Send + Sync {
    /// Create a new empty thread, returning its ID
    async fn create_thread(&self) -> Result<String>;

    /// Delete a thread
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Post a user message to a thread
    async fn create_message(&self, thread_id: &str, content: &str) -> Result<()>;

    /// Start a streamed run of `agent_id` on a thread
    async fn stream_run(&self, thread_id: &str, agent_id: &str) -> Result<RunEventStream>;

    /// Text of the most recent agent message in a thread
    async fn last_agent_text(&self, thread_id: &str) -> Result<Option<String>>;
}

/// Parsed project connection string `<host>;<subscription>;<resource group>;<project>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub host: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub project_name: String,
}

impl ConnectionString {
    /// Parse a connection string
    pub fn parse(raw: &str) -> DeskResult<Self> {
        let parts: Vec<&str> = raw.trim().split(';').map(str::trim).collect();
        match parts.as_slice() {
            [host, sub, rg, project]
                if [host, sub, rg, project].iter().all(|p| !p.is_empty()) =>
            {
                Ok(Self {
                    host: host.to_string(),
                    subscription_id: sub.to_string(),
                    resource_group: rg.to_string(),
                    project_name: project.to_string(),
                })
            }
            _ => Err(DeskError::InvalidConfig(
                "AIPROJECT_CONNECTION_STRING must have the form <host>;<subscription>;<resource group>;<project>".into(),
            )),
        }
    }

    /// Base URL of the project's agent endpoints
    pub fn base_url(&self) -> String {
        format!(
            "https://{}/agents/v1.0/subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}",
            self.host, self.subscription_id, self.resource_group, self.project_name
        )
    }
}

/// HTTP client for the agent service
pub struct AgentServiceClient {
    client: Client,
    auth: AuthSource,
    base_url: String,
}

impl AgentServiceClient {
    /// Create a client for a project with a static bearer token
    pub fn new(connection: &ConnectionString, token: impl Into<String>) -> Self {
        Self::with_base_url(connection.base_url(), token)
    }

    /// Create a client against an explicit base URL
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            auth: AuthSource::Static(AuthConfig::new(token)),
            base_url: base_url.into(),
        }
    }

    /// Create a client whose token is fetched before each request
    pub fn with_auth_provider(
        connection: &ConnectionString,
        provider: impl AuthProvider + 'static,
    ) -> Self {
        Self {
            client: Client::new(),
            auth: AuthSource::Dynamic(Arc::new(provider)),
            base_url: connection.base_url(),
        }
    }

    async fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let auth = self
            .auth
            .get_auth()
            .await
            .context("Failed to get agent service credentials")?;
        let base = auth.base_url.as_deref().unwrap_or(&self.base_url);
        let url = format!("{}{}", base.trim_end_matches('/'), path);

        Ok(self
            .client
            .request(method, &url)
            .query(&[("api-version", AGENTS_API_VERSION)])
            .bearer_auth(&auth.api_key))
    }

    async fn send(builder: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to agent service", what))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::error!("[AgentService] {} failed: {} - {}", what, status, body);
            anyhow::bail!("Agent service {} error ({}): {}", what, status, body);
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl ThreadService for AgentServiceClient {
    async fn create_thread(&self) -> Result<String> {
        let builder = self
            .request(reqwest::Method::POST, "/threads")
            .await?
            .json(&serde_json::json!({}));
        let thread: ThreadObject = Self::send(builder, "create thread")
            .await?
            .json()
            .await
            .context("Failed to parse thread")?;
        tracing::debug!("[AgentService] Created thread {}", thread.id);
        Ok(thread.id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let builder = self
            .request(reqwest::Method::DELETE, &format!("/threads/{}", thread_id))
            .await?;
        Self::send(builder, "delete thread").await?;
        tracing::debug!("[AgentService] Deleted thread {}", thread_id);
        Ok(())
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let builder = self
            .request(reqwest::Method::POST, &format!("/threads/{}/messages", thread_id))
            .await?
            .json(&CreateMessageRequest {
                role: "user",
                content,
            });
        Self::send(builder, "create message").await?;
        Ok(())
    }

    async fn stream_run(&self, thread_id: &str, agent_id: &str) -> Result<RunEventStream> {
        let builder = self
            .request(reqwest::Method::POST, &format!("/threads/{}/runs", thread_id))
            .await?
            .json(&CreateRunRequest {
                assistant_id: agent_id,
                stream: true,
            });
        let response = Self::send(builder, "run").await?;

        let byte_stream = response.bytes_stream();
        let stream_reader = StreamReader::new(
            byte_stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string()))),
        );
        let buf_reader = tokio::io::BufReader::new(stream_reader);

        let stream = async_stream::try_stream! {
            let mut lines = buf_reader.lines();
            let mut event_name = String::new();

            while let Some(line) = lines.next_line().await? {
                if line.is_empty() {
                    event_name.clear();
                    continue;
                }
                if let Some(name) = line.strip_prefix("event:") {
                    event_name = name.trim().to_string();
                    continue;
                }
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };

                let event = parse_run_event(&event_name, data.trim());
                let done = event == RunStreamEvent::Done;
                yield event;
                if done {
                    break;
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn last_agent_text(&self, thread_id: &str) -> Result<Option<String>> {
        let builder = self
            .request(reqwest::Method::GET, &format!("/threads/{}/messages", thread_id))
            .await?
            .query(&[("order", "desc")]);
        let list: MessageList = Self::send(builder, "list messages")
            .await?
            .json()
            .await
            .context("Failed to parse message list")?;
        Ok(list.last_agent_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_connection_string_parse() {
        let conn = ConnectionString::parse("eastus.api.azureml.ms;sub-1;rg-1;proj-1").unwrap();
        assert_eq!(conn.host, "eastus.api.azureml.ms");
        assert_eq!(
            conn.base_url(),
            "https://eastus.api.azureml.ms/agents/v1.0/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.MachineLearningServices/workspaces/proj-1"
        );
    }

    #[test]
    fn test_connection_string_rejects_malformed() {
        assert!(matches!(
            ConnectionString::parse("host;sub;rg"),
            Err(DeskError::InvalidConfig(_))
        ));
        assert!(ConnectionString::parse("host;;rg;proj").is_err());
    }

    #[tokio::test]
    async fn test_create_and_delete_thread() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads"))
            .and(header("authorization", "Bearer tok"))
            .and(query_param("api-version", AGENTS_API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "thread_abc", "object": "thread"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/threads/thread_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "thread_abc", "deleted": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AgentServiceClient::with_base_url(server.uri(), "tok");
        let id = client.create_thread().await.unwrap();
        assert_eq!(id, "thread_abc");
        client.delete_thread(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_stream_run_events() {
        let server = MockServer::start().await;
        let body = concat!(
            "event: thread.run.created\n",
            "data: {\"id\":\"run_1\",\"status\":\"queued\"}\n\n",
            "event: thread.message.delta\n",
            "data: {\"id\":\"msg_1\",\"delta\":{\"content\":[{\"index\":0,\"type\":\"text\",\"text\":{\"value\":\"Hel\"}}]}}\n\n",
            "event: thread.message.delta\n",
            "data: {\"id\":\"msg_1\",\"delta\":{\"content\":[{\"index\":0,\"type\":\"text\",\"text\":{\"value\":\"lo\"}}]}}\n\n",
            "event: done\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/threads/thread_abc/runs"))
            .and(body_partial_json(json!({"assistant_id": "asst_faq", "stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let client = AgentServiceClient::with_base_url(server.uri(), "tok");
        let events: Vec<RunStreamEvent> = client
            .stream_run("thread_abc", "asst_faq")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(
            events,
            vec![
                RunStreamEvent::Other("thread.run.created".into()),
                RunStreamEvent::MessageDelta("Hel".into()),
                RunStreamEvent::MessageDelta("lo".into()),
                RunStreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_last_agent_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_abc/messages"))
            .and(query_param("order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "m2", "role": "assistant", "content": [{"type": "text", "text": {"value": "Final answer"}}]},
                    {"id": "m1", "role": "user", "content": [{"type": "text", "text": {"value": "q"}}]}
                ]
            })))
            .mount(&server)
            .await;

        let client = AgentServiceClient::with_base_url(server.uri(), "tok");
        let text = client.last_agent_text("thread_abc").await.unwrap();
        assert_eq!(text.as_deref(), Some("Final answer"));
    }

    #[tokio::test]
    async fn test_service_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/missing/messages"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such thread"))
            .mount(&server)
            .await;

        let client = AgentServiceClient::with_base_url(server.uri(), "tok");
        let err = client.create_message("missing", "hi").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
