use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

/// Maximum completion response size. Recipes are small; anything bigger is
/// a misbehaving endpoint.
const MAX_RESPONSE_SIZE: usize = 1024 * 1024; // 1MB

/// Per-request timeout for the completion call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Default completion API base. Overridable for tests (localhost only).
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const SYSTEM_PROMPT: &str = "You are an expert chef that generates simple and delicious recipes.";

/// Resolve the completion-API credential: environment first, config second.
pub fn resolve_api_key(config: &Config) -> Option<SecretString> {
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .map(SecretString::from)
        .or_else(|| config.openai_api_key.clone().map(SecretString::from))
}

/// A generated ingredients/directions pair.
///
/// Both lists empty means "nothing was generated", the fail-open result for
/// every error path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GeneratedRecipe {
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub directions: Vec<String>,
}

impl GeneratedRecipe {
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty() && self.directions.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Request timed out after 20s")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("No API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,
    #[error("Completion contained no choices")]
    EmptyCompletion,
    #[error("Completion text was not a recipe object: {0}")]
    MalformedRecipe(String),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

impl GeneratorError {
    /// Transient failures worth one more attempt. HTTP statuses are not
    /// retried: completion endpoints answer 4xx/5xx deterministically enough
    /// that repeating the call only delays the fallback.
    fn is_retryable(&self) -> bool {
        matches!(self, GeneratorError::Timeout | GeneratorError::Network(_))
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

// ============================================================================
// Public API
// ============================================================================

/// Generate ingredients and directions for a recipe name.
///
/// Fails open: any error (missing credential, network failure, bad status,
/// unparseable completion) yields an empty [`GeneratedRecipe`] rather than
/// propagating. The caller treats the result as untrusted display content;
/// nothing is persisted here.
pub async fn generate(
    client: &reqwest::Client,
    api_key: Option<&SecretString>,
    model: &str,
    recipe_name: &str,
    base_url: Option<&str>,
) -> GeneratedRecipe {
    match try_generate(client, api_key, model, recipe_name, base_url).await {
        Ok(recipe) => recipe,
        Err(e) => {
            tracing::warn!(recipe = %recipe_name, error = %e, "Recipe generation failed, returning empty recipe");
            GeneratedRecipe::default()
        }
    }
}

async fn try_generate(
    client: &reqwest::Client,
    api_key: Option<&SecretString>,
    model: &str,
    recipe_name: &str,
    base_url: Option<&str>,
) -> Result<GeneratedRecipe, GeneratorError> {
    let base = base_url.unwrap_or(DEFAULT_BASE_URL);

    // Enforce HTTPS for the base URL so the credential cannot leak over
    // cleartext. HTTP is allowed only for localhost (testing).
    if !base.starts_with("https://") {
        let is_localhost =
            base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost");
        if !is_localhost {
            tracing::error!(base_url = %base, "Rejecting non-HTTPS completion base URL");
            return Err(GeneratorError::InsecureBaseUrl);
        }
        tracing::warn!(base_url = %base, "Using non-HTTPS completion base URL (localhost only)");
    }

    let is_official = base == DEFAULT_BASE_URL;
    if is_official && api_key.is_none() {
        return Err(GeneratorError::MissingApiKey);
    }

    let url = format!("{}/v1/chat/completions", base);
    let body = serde_json::json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            {
                "role": "user",
                "content": format!(
                    "Generate a recipe for \"{}\". \
                     Provide a list of ingredients and step-by-step directions in JSON format \
                     with two keys: ingredients (array) and directions (array). \
                     Respond with the JSON object only.",
                    recipe_name
                ),
            },
        ],
        "temperature": 0.7,
    })
    .to_string();

    let content = fetch_with_retry(client, &url, api_key.filter(|_| is_official), &body).await?;
    extract_recipe(&content)
}

/// Issue the completion request, retrying transient failures once each with
/// backoff: 1s, 2s.
async fn fetch_with_retry(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&SecretString>,
    body: &str,
) -> Result<String, GeneratorError> {
    const MAX_RETRIES: u32 = 2;
    let mut retry_count = 0;

    loop {
        match fetch_completion(client, url, api_key, body).await {
            Ok(content) => return Ok(content),
            Err(e) if e.is_retryable() && retry_count < MAX_RETRIES => {
                let delay = 1u64 << retry_count; // 1s, 2s
                tracing::debug!(
                    error = %e,
                    retry = retry_count + 1,
                    delay_secs = delay,
                    "Retrying completion call after transient error"
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
                retry_count += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// One completion round trip: POST, status check, bounded body read, and
/// extraction of the first choice's message content.
async fn fetch_completion(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&SecretString>,
    body: &str,
) -> Result<String, GeneratorError> {
    let mut request = client
        .post(url)
        .header("Content-Type", "application/json")
        .body(body.to_string());

    // The credential is only attached for the official endpoint; custom base
    // URLs (used for testing) never see it.
    if let Some(key) = api_key {
        request = request.header("Authorization", format!("Bearer {}", key.expose_secret()));
    }

    let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
        .await
        .map_err(|_| GeneratorError::Timeout)?
        .map_err(GeneratorError::Network)?;

    if !response.status().is_success() {
        return Err(GeneratorError::HttpStatus(response.status().as_u16()));
    }

    let raw = read_limited_text(response, MAX_RESPONSE_SIZE).await?;

    let completion: ChatCompletion = serde_json::from_str(&raw)
        .map_err(|e| GeneratorError::MalformedRecipe(format!("bad completion envelope: {}", e)))?;

    completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or(GeneratorError::EmptyCompletion)
}

/// Pull a `{ingredients, directions}` object out of completion text.
///
/// Models wrap JSON in markdown fences or chat framing often enough that we
/// parse the slice between the first `{` and the last `}` instead of the
/// whole text. Blank entries are filtered; the result is untrusted input.
fn extract_recipe(content: &str) -> Result<GeneratedRecipe, GeneratorError> {
    let start = content
        .find('{')
        .ok_or_else(|| GeneratorError::MalformedRecipe("no JSON object in completion".into()))?;
    let end = content
        .rfind('}')
        .ok_or_else(|| GeneratorError::MalformedRecipe("no JSON object in completion".into()))?;
    if end < start {
        return Err(GeneratorError::MalformedRecipe(
            "no JSON object in completion".into(),
        ));
    }

    let mut recipe: GeneratedRecipe = serde_json::from_str(&content[start..=end])
        .map_err(|e| GeneratorError::MalformedRecipe(e.to_string()))?;

    recipe.ingredients.retain(|i| !i.trim().is_empty());
    recipe.directions.retain(|d| !d.trim().is_empty());
    Ok(recipe)
}

async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, GeneratorError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(GeneratorError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(GeneratorError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(GeneratorError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| GeneratorError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": content } } ]
        })
        .to_string()
    }

    async fn mock_completion(content: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/json")
                    .set_body_string(completion_body(content)),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = mock_completion(
            r#"{"ingredients": ["2 eggs", "1 cup flour"], "directions": ["Mix", "Fry"]}"#,
        )
        .await;

        let client = reqwest::Client::new();
        let recipe = generate(&client, None, "gpt-3.5-turbo", "Pancakes", Some(&server.uri())).await;

        assert_eq!(recipe.ingredients, vec!["2 eggs", "1 cup flour"]);
        assert_eq!(recipe.directions, vec!["Mix", "Fry"]);
    }

    #[tokio::test]
    async fn test_generate_parses_fenced_json() {
        let server = mock_completion(
            "Here you go!\n```json\n{\"ingredients\": [\"Rice\"], \"directions\": [\"Steam\"]}\n```",
        )
        .await;

        let client = reqwest::Client::new();
        let recipe = generate(&client, None, "gpt-3.5-turbo", "Rice", Some(&server.uri())).await;

        assert_eq!(recipe.ingredients, vec!["Rice"]);
        assert_eq!(recipe.directions, vec!["Steam"]);
    }

    #[tokio::test]
    async fn test_generate_filters_blank_entries() {
        let server = mock_completion(
            r#"{"ingredients": ["", "Salt", "  "], "directions": ["Season", ""]}"#,
        )
        .await;

        let client = reqwest::Client::new();
        let recipe = generate(&client, None, "gpt-3.5-turbo", "Salted", Some(&server.uri())).await;

        assert_eq!(recipe.ingredients, vec!["Salt"]);
        assert_eq!(recipe.directions, vec!["Season"]);
    }

    #[tokio::test]
    async fn test_malformed_completion_fails_open() {
        let server = mock_completion("Sorry, I can't help with that.").await;

        let client = reqwest::Client::new();
        let recipe = generate(&client, None, "gpt-3.5-turbo", "X", Some(&server.uri())).await;

        assert!(recipe.is_empty());
    }

    #[tokio::test]
    async fn test_http_500_fails_open() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let recipe = generate(&client, None, "gpt-3.5-turbo", "X", Some(&server.uri())).await;

        assert!(recipe.is_empty());
    }

    #[tokio::test]
    async fn test_empty_choices_fails_open() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"choices": []}"#),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let recipe = generate(&client, None, "gpt-3.5-turbo", "X", Some(&server.uri())).await;

        assert!(recipe.is_empty());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_open_without_network() {
        // Official base, no key: short-circuits before any request
        let client = reqwest::Client::new();
        let recipe = generate(&client, None, "gpt-3.5-turbo", "X", None).await;
        assert!(recipe.is_empty());
    }

    #[tokio::test]
    async fn test_http_base_url_rejected() {
        let client = reqwest::Client::new();
        let result = try_generate(
            &client,
            None,
            "gpt-3.5-turbo",
            "X",
            Some("http://evil.example.com"),
        )
        .await;

        assert!(matches!(result, Err(GeneratorError::InsecureBaseUrl)));
    }

    #[test]
    fn test_extract_recipe_plain_object() {
        let recipe =
            extract_recipe(r#"{"ingredients": ["A"], "directions": ["B"]}"#).unwrap();
        assert_eq!(recipe.ingredients, vec!["A"]);
        assert_eq!(recipe.directions, vec!["B"]);
    }

    #[test]
    fn test_extract_recipe_with_surrounding_prose() {
        let recipe = extract_recipe(
            "Sure! Here's a recipe:\n{\"ingredients\": [\"A\"], \"directions\": []}\nEnjoy!",
        )
        .unwrap();
        assert_eq!(recipe.ingredients, vec!["A"]);
        assert!(recipe.directions.is_empty());
    }

    #[test]
    fn test_extract_recipe_missing_keys_default_empty() {
        let recipe = extract_recipe(r#"{"ingredients": ["A"]}"#).unwrap();
        assert_eq!(recipe.ingredients, vec!["A"]);
        assert!(recipe.directions.is_empty());
    }

    #[test]
    fn test_extract_recipe_no_object() {
        assert!(extract_recipe("no json here").is_err());
        assert!(extract_recipe("} backwards {").is_err());
    }
}
