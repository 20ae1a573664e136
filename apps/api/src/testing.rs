//! Test doubles shared by unit tests across modules.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::catalog::{CatalogError, EnrichedColumn, MemeCatalog};
use crate::llm_client::{GenerationRequest, LlmError, TextGenerator};
use crate::models::meme::MemeTemplate;

type Responder = Box<dyn Fn(&GenerationRequest<'_>) -> Result<String, LlmError> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
}

/// `TextGenerator` that answers from a closure and records every request.
pub struct ScriptedLlm {
    responder: Responder,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlm {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest<'_>) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replies with each scripted result in turn; fails once the script runs out.
    pub fn sequence(replies: Vec<Result<String, LlmError>>) -> Self {
        let replies = Mutex::new(VecDeque::from(replies));
        Self::new(move |_| {
            replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.user.clone())
            .collect()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.system.clone())
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedLlm {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: request.system.to_string(),
            user: request.user.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(request)
    }
}

/// Catalog kept in a `Vec`, with updates applied in place.
#[derive(Default)]
pub struct InMemoryCatalog {
    memes: Mutex<Vec<MemeTemplate>>,
}

impl InMemoryCatalog {
    pub fn new(memes: Vec<MemeTemplate>) -> Self {
        Self {
            memes: Mutex::new(memes),
        }
    }

    pub fn snapshot(&self) -> Vec<MemeTemplate> {
        self.memes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemeCatalog for InMemoryCatalog {
    async fn list(&self) -> Result<Vec<MemeTemplate>, CatalogError> {
        Ok(self.snapshot())
    }

    async fn get(&self, id: Uuid) -> Result<MemeTemplate, CatalogError> {
        self.memes
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    async fn update(
        &self,
        id: Uuid,
        column: EnrichedColumn,
        value: &str,
    ) -> Result<(), CatalogError> {
        let mut memes = self.memes.lock().unwrap();
        let meme = memes
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        let target = match column {
            EnrichedColumn::Description => &mut meme.description,
            EnrichedColumn::Schema => &mut meme.schema,
            EnrichedColumn::Rules => &mut meme.rules,
        };
        *target = value.to_string();
        Ok(())
    }
}

pub fn meme_fixture(name: &str, schema: &str) -> MemeTemplate {
    MemeTemplate {
        id: Uuid::new_v4(),
        name: name.to_string(),
        url: format!("https://storage.example.test/memes/{name}.jpg"),
        description: format!("The {} meme.", name.replace('-', " ")),
        schema: schema.to_string(),
        rules: "- Keep it about the group\n- Never mention JSON".to_string(),
        captions: vec!["Monday standup / Friday deploy".to_string()],
        created_at: Utc::now(),
    }
}
