//! watsonx.ai text generation client

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::{CompletionEndpoint, LlmError};

const API_KEY_GRANT: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Endpoint settings, usually the `[llm]` table of the configuration file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatsonxConfig {
    pub enabled: bool,
    pub generation_url: String,
    pub token_url: String,
    pub model_id: String,
    pub project_id: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// First retry delay; doubles on every further attempt
    pub backoff_ms: u64,
}

impl Default for WatsonxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            generation_url:
                "https://us-south.ml.cloud.ibm.com/ml/v1/text/generation?version=2023-05-29".into(),
            token_url: "https://iam.cloud.ibm.com/identity/token".into(),
            model_id: "meta-llama/llama-3-3-70b-instruct".into(),
            project_id: String::new(),
            api_key_env: "TOWERLENS_LLM_API_KEY".into(),
            timeout_secs: 120,
            max_retries: 3,
            backoff_ms: 500,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Deserialize)]
struct GenerationResult {
    generated_text: String,
}

/// Token exchange followed by one generation request per completion
pub struct WatsonxClient {
    config: WatsonxConfig,
    api_key: String,
    http: ureq::Agent,
}

impl WatsonxClient {
    pub fn new(config: WatsonxConfig, api_key: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = ureq::AgentBuilder::new()
            .timeout_read(timeout)
            .timeout_write(timeout)
            .timeout_connect(timeout)
            .build();
        Self {
            config,
            api_key: api_key.into(),
            http,
        }
    }

    /// Read the API key from the variable named by `api_key_env`
    pub fn from_env(config: WatsonxConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(config, api_key))
    }

    pub fn config(&self) -> &WatsonxConfig {
        &self.config
    }

    /// Run `request`, retrying retryable failures with exponential backoff
    fn with_retries<T>(
        &self,
        what: &str,
        request: impl Fn() -> Result<T, LlmError>,
    ) -> Result<T, LlmError> {
        let mut attempt = 0;
        loop {
            match request() {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(self.config.backoff_ms << attempt.min(16));
                    warn!(%e, attempt = attempt + 1, ?delay, "{what} failed, retrying");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn access_token(&self) -> Result<String, LlmError> {
        self.with_retries("token exchange", || {
            let response = self
                .http
                .post(&self.config.token_url)
                .set("Accept", "application/json")
                .send_form(&[("grant_type", API_KEY_GRANT), ("apikey", self.api_key.as_str())])
                .map_err(from_ureq)?;
            let token: TokenResponse = response
                .into_json()
                .map_err(|e| LlmError::Response(format!("token: {e}")))?;
            Ok(token.access_token)
        })
    }

    fn generate(&self, token: &str, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "input": prompt,
            "parameters": {
                "decoding_method": "greedy",
                "max_new_tokens": 8100,
                "min_new_tokens": 0,
                "stop_sequences": [";"],
                "repetition_penalty": 1.05,
                "temperature": 0.5
            },
            "model_id": self.config.model_id,
            "project_id": self.config.project_id,
        });
        self.with_retries("text generation", || {
            let response = self
                .http
                .post(&self.config.generation_url)
                .set("Accept", "application/json")
                .set("Authorization", &format!("Bearer {token}"))
                .send_json(&body)
                .map_err(from_ureq)?;
            let generation: GenerationResponse = response
                .into_json()
                .map_err(|e| LlmError::Response(format!("generation: {e}")))?;
            generation
                .results
                .into_iter()
                .next()
                .map(|r| r.generated_text.trim().to_string())
                .ok_or_else(|| LlmError::Response("no results".into()))
        })
    }
}

impl CompletionEndpoint for WatsonxClient {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let token = self.access_token()?;
        let text = self.generate(&token, prompt)?;
        debug!(chars = text.len(), model = %self.config.model_id, "completion received");
        Ok(text)
    }
}

fn from_ureq(err: ureq::Error) -> LlmError {
    match err {
        ureq::Error::Status(code, response) => LlmError::Status {
            code,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => LlmError::Http(t.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_keys() {
        let config: WatsonxConfig = serde_json::from_value(json!({
            "enabled": true,
            "project_id": "p-1"
        }))
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.project_id, "p-1");
        assert_eq!(config.api_key_env, "TOWERLENS_LLM_API_KEY");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn missing_api_key() {
        let config = WatsonxConfig {
            api_key_env: "TOWERLENS_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..WatsonxConfig::default()
        };
        assert!(matches!(
            WatsonxClient::from_env(config),
            Err(LlmError::MissingApiKey(name)) if name == "TOWERLENS_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }
}
