//! Assistant chat proxy.

use serde::Deserialize;
use serde_json::json;

use super::gateway::ApiGateway;
use super::transport::ApiRequest;
use super::ApiError;

const CHATBOT_PATH: &str = "/tenant/chatbot";

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

impl ApiGateway {
    /// Relay one message to the backend assistant and return its reply.
    pub async fn send_chat_message(&self, message: &str) -> Result<String, ApiError> {
        let response = self
            .auth_fetch(ApiRequest::post(CHATBOT_PATH).json(json!({ "message": message })))
            .await?;
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.text()));
        }
        Ok(response.json::<ChatReply>()?.response)
    }
}
