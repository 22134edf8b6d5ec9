//! OpenAI `chat.completion` envelope assembly.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::routing::BackendModel;
use crate::types::{Choice, CompletionResponse, ResponseMessage, Role, Usage};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_PREFIX: &str = "chatcmpl-";
const ID_RANDOM_LEN: usize = 13;
const FINGERPRINT_RANDOM_LEN: usize = 10;

/// Builds completion responses.
///
/// The `system_fingerprint` is drawn once per composer, so every response
/// from one process carries the same value.
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    fingerprint: String,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseComposer {
    pub fn new() -> Self {
        Self {
            fingerprint: format!("fp_{}", random_base36(FINGERPRINT_RANDOM_LEN)),
        }
    }

    pub fn with_fingerprint(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn compose(&self, model: BackendModel, content: String, usage: Usage) -> CompletionResponse {
        self.compose_at(Utc::now(), model, content, usage)
    }

    fn compose_at(
        &self,
        now: DateTime<Utc>,
        model: BackendModel,
        content: String,
        usage: Usage,
    ) -> CompletionResponse {
        CompletionResponse {
            id: completion_id(now),
            object: "chat.completion".to_string(),
            created: now.timestamp(),
            model: model.id().to_string(),
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: Role::Assistant,
                    content,
                },
                logprobs: None,
                finish_reason: "stop".to_string(),
            }],
            usage,
            system_fingerprint: self.fingerprint.clone(),
        }
    }
}

/// `chatcmpl-` + base36 millis + random base36 suffix.
fn completion_id(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    format!(
        "{}{}{}",
        ID_PREFIX,
        to_base36(millis),
        random_base36(ID_RANDOM_LEN)
    )
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}
