use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::SentenceSmoother;
use crate::config::SentenceSettings;
use crate::error::SentenceError;

/// Asks a `generateContent`-style language model API to turn recognized signs into a sentence.
pub struct GenerativeSmoother {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerativeSmoother {
    pub fn from_settings(settings: &SentenceSettings) -> Result<Self, SentenceError> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| SentenceError::MissingApiKey(settings.api_key_env.clone()))?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                settings.endpoint.trim_end_matches('/'),
                settings.model
            ),
            api_key,
        })
    }

    fn prompt(words: &[String]) -> String {
        format!(
            "These words were recognized, in order, from American Sign Language: {}\n\
             Reply with one short, simple English sentence that uses them. Reply with the sentence only.",
            words.join(" ")
        )
    }
}

#[async_trait]
impl SentenceSmoother for GenerativeSmoother {
    async fn smooth(&self, words: &[String]) -> Result<String, SentenceError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(Self::prompt(words)),
                }],
            }],
        };
        let response: GenerateResponse = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or(SentenceError::EmptyResponse)
    }

    fn name(&self) -> &'static str {
        "generative"
    }
}
