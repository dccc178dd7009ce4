//! HTTP-backed classification capability.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint: the taxonomy is
//! rendered into the system prompt, the model is instructed to answer with a
//! strict JSON object matching the wire schema, and HTTP/transport failures
//! are mapped onto the transient/permanent split the retry policy consumes.

use std::fmt::Write as _;
use std::time::Duration;

use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::debug;

use reclass_taxonomy::TaxonomyCatalog;

use crate::capability::{
    CapabilityError, CapabilityResponse, ClassificationCapability, ClassificationRequest,
    TokenUsage,
};

const SYSTEM_PROMPT: &str = "You are an expert MRO (maintenance, repair and operations) product \
classifier. Classify products into the provided taxonomy using ONLY the codes it lists. \
Always answer with a single JSON object and nothing else.";

/// Configuration for the HTTP capability.
#[derive(Debug, Clone)]
pub struct HttpCapabilityConfig {
    /// Base URL of the OpenAI-compatible endpoint (no trailing path).
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl HttpCapabilityConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Classification capability speaking to a remote model over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCapability {
    config: HttpCapabilityConfig,
    taxonomy_prompt: String,
    http_client: Client,
}

impl HttpCapability {
    pub fn new(
        config: HttpCapabilityConfig,
        catalog: &TaxonomyCatalog,
    ) -> Result<Self, CapabilityError> {
        let http_client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| CapabilityError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            taxonomy_prompt: render_taxonomy(catalog),
            config,
            http_client,
        })
    }

    fn build_user_prompt(&self, request: &ClassificationRequest) -> String {
        let mut prompt = String::new();
        let _ = writeln!(prompt, "PRODUCT: {}", request.product_name);
        if let Some(brand) = &request.brand {
            let _ = writeln!(prompt, "BRAND: {brand}");
        }
        if let Some(model) = &request.model {
            let _ = writeln!(prompt, "MODEL: {model}");
        }
        if let Some(old_category) = &request.old_category {
            let _ = writeln!(
                prompt,
                "PREVIOUS CLASSIFICATION (hint, may be wrong): {} > {}",
                old_category,
                request.old_subcategory.as_deref().unwrap_or("?"),
            );
        }
        let _ = writeln!(prompt, "\nAVAILABLE TAXONOMY:\n{}", self.taxonomy_prompt);
        let _ = write!(
            prompt,
            "Answer with exactly this JSON object:\n\
             {{\"department_code\": \"DXX\", \"department_name\": \"...\", \
             \"category_code\": \"SXX\", \"category_name\": \"...\", \
             \"subcategory_code\": \"CXXX\", \"subcategory_name\": \"...\", \
             \"confidence\": 0.0}}\n\
             confidence is your certainty in [0, 1]. Use only codes from the taxonomy above."
        );
        prompt
    }
}

#[async_trait::async_trait]
impl ClassificationCapability for HttpCapability {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        let body = json!({
            "model": self.config.model,
            "temperature": 0.1,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": self.build_user_prompt(request) },
            ],
        });

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        // reqwest carries its own timeout, but an explicit outer deadline
        // keeps "slow upstream" and "dead upstream" on the same path.
        let response = timeout(
            self.config.request_timeout,
            self.http_client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| CapabilityError::Timeout)?
        .map_err(|e| {
            if e.is_timeout() {
                CapabilityError::Timeout
            } else {
                CapabilityError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CapabilityError::Network(e.to_string()))?;

        if let Some(error) = map_error_status(status, &text) {
            return Err(error);
        }

        debug!(%status, product = %request.product_name, "capability call completed");
        parse_completion(&text)
    }
}

/// Render the taxonomy (codes + names) for the prompt.
fn render_taxonomy(catalog: &TaxonomyCatalog) -> String {
    let mut out = String::new();
    for (dept_code, dept_name) in catalog.departments() {
        let _ = writeln!(out, "DEPARTMENT {dept_code}: {dept_name}");
        for (cat_code, cat_name) in catalog.categories(dept_code) {
            let _ = writeln!(out, "  {cat_code}: {cat_name}");
            for (sub_code, sub_name) in catalog.subcategories(dept_code, cat_code) {
                let _ = writeln!(out, "    {sub_code}: {sub_name}");
            }
        }
    }
    out
}

/// Map a non-success HTTP status to a capability failure. `None` for 2xx.
fn map_error_status(status: StatusCode, body: &str) -> Option<CapabilityError> {
    if status.is_success() {
        return None;
    }
    let detail = body.chars().take(200).collect::<String>();
    Some(match status {
        StatusCode::TOO_MANY_REQUESTS => CapabilityError::RateLimited,
        StatusCode::REQUEST_TIMEOUT => CapabilityError::Timeout,
        s if s.is_server_error() => {
            CapabilityError::Network(format!("upstream status {s}: {detail}"))
        }
        s => CapabilityError::Rejected(format!("upstream status {s}: {detail}")),
    })
}

#[derive(Debug, Deserialize)]
struct WireClassification {
    department_code: String,
    #[serde(default)]
    department_name: String,
    category_code: String,
    #[serde(default)]
    category_name: String,
    subcategory_code: String,
    #[serde(default)]
    subcategory_name: String,
    confidence: f64,
}

/// Parse a chat-completions body into the wire response.
fn parse_completion(body: &str) -> Result<CapabilityResponse, CapabilityError> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| CapabilityError::Malformed(format!("completion body is not JSON: {e}")))?;

    let content = envelope["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| CapabilityError::Malformed("completion has no message content".into()))?;

    let wire: WireClassification = serde_json::from_str(extract_json(content))
        .map_err(|e| CapabilityError::Malformed(format!("answer is not the expected JSON: {e}")))?;

    let usage = envelope.get("usage").map(|u| TokenUsage {
        input_tokens: u["prompt_tokens"].as_u64().unwrap_or(0),
        output_tokens: u["completion_tokens"].as_u64().unwrap_or(0),
    });

    Ok(CapabilityResponse {
        department_code: wire.department_code,
        department_name: wire.department_name,
        category_code: wire.category_code,
        category_name: wire.category_name,
        subcategory_code: wire.subcategory_code,
        subcategory_name: wire.subcategory_name,
        confidence: wire.confidence,
        usage,
    })
}

/// Models occasionally wrap the JSON answer in markdown fences; strip them.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}
