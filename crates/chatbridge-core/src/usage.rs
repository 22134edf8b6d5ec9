//! Token usage approximation.
//!
//! The counts produced here are `ceil(chars / 4)`, not tokenizer output. They
//! are only meant to give clients a plausible `usage` block when the backend
//! reports none; never bill on them.

use crate::flatten::FlattenedContext;
use crate::types::Usage;

const CHARS_PER_TOKEN: usize = 4;

/// Approximate token count of `text`, counted in Unicode scalar values.
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count();
    u32::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX)
}

/// Exact counts reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportedUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UsageEstimator;

impl UsageEstimator {
    pub fn estimate(&self, context: &FlattenedContext, completion: &str) -> Usage {
        Usage::new(
            estimate_tokens(&context.prompt_text()),
            estimate_tokens(completion),
        )
    }

    /// Prefer backend counts; estimate when there are none.
    pub fn resolve(
        &self,
        reported: Option<ReportedUsage>,
        context: &FlattenedContext,
        completion: &str,
    ) -> Usage {
        match reported {
            Some(exact) => Usage::new(exact.prompt_tokens, exact.completion_tokens),
            None => self.estimate(context, completion),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::types::ChatMessage;

    #[test]
    fn rounds_up_to_whole_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 4 chars, 12 bytes
        assert_eq!(estimate_tokens("日本語だ"), 1);
    }

    #[test]
    fn estimate_covers_system_and_transcript() {
        let ctx = flatten(&[ChatMessage::system("1234"), ChatMessage::user("Hi")]);
        // "1234" + "User: Hi" = 12 chars
        let usage = UsageEstimator.estimate(&ctx, "hello world");
        assert_eq!(usage.prompt_tokens, 3);
        assert_eq!(usage.completion_tokens, 3);
        assert_eq!(usage.total_tokens, 6);
    }

    #[test]
    fn reported_counts_win() {
        let ctx = flatten(&[ChatMessage::user("Hi")]);
        let usage = UsageEstimator.resolve(
            Some(ReportedUsage {
                prompt_tokens: 11,
                completion_tokens: 5,
            }),
            &ctx,
            "whatever",
        );
        assert_eq!(usage, Usage::new(11, 5));
        assert_eq!(usage.total_tokens, 16);
    }
}
