use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::app_config::TranslationServiceConfig;
use crate::errors::ProviderError;
use crate::providers::TextTranslator;
use crate::providers::http::HttpService;

/// Ollama client translating chunks through `/api/generate`
#[derive(Debug)]
pub struct Ollama {
    http: HttpService,
    /// Model name
    model: String,
    /// System prompt with language names filled in
    system_prompt: String,
    temperature: f32,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Random seed for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system message
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature and a fixed seed so reruns translate identically
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
            seed: Some(0),
        });
        self
    }
}

impl Ollama {
    /// Create a client for the configured server, translating between the
    /// given language names.
    pub fn new(config: &TranslationServiceConfig, source_language: &str, target_language: &str) -> Self {
        let system_prompt = config
            .system_prompt
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language);

        Self {
            http: HttpService::new(&config.service),
            model: config.model.clone(),
            system_prompt,
            temperature: config.temperature,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Generate text from the Ollama API with retry logic
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        self.http.post_json("api/generate", request).await
    }
}

#[async_trait]
impl TextTranslator for Ollama {
    async fn translate(&self, chunk: &str) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(&self.model, chunk)
            .system(&self.system_prompt)
            .temperature(self.temperature);

        let response = self.generate(&request).await?;
        debug!(
            "Ollama {} translated {} chars ({} tokens)",
            response.model,
            chunk.chars().count(),
            response.eval_count.unwrap_or(0)
        );

        Ok(response.response.trim().to_string())
    }

    async fn check(&self) -> Result<(), ProviderError> {
        self.http.get_ok("api/version").await
    }
}
