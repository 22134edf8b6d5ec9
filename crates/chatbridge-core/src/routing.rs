//! Caller model name -> backend model routing.
//!
//! Routing is a best-effort alias layer: an ordered list of substring rules,
//! first match wins, anything unmatched goes to the default model. Unknown
//! names never fail a request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Models the backend can serve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendModel {
    #[default]
    Gpt,
    Claude,
    Gemini,
    DeepSeek,
    Llama,
}

impl BackendModel {
    /// Backend model id, echoed as `model` in responses.
    pub fn id(self) -> &'static str {
        match self {
            BackendModel::Gpt => "gpt-4o-mini",
            BackendModel::Claude => "claude-3-5-sonnet",
            BackendModel::Gemini => "gemini-2.0-flash",
            BackendModel::DeepSeek => "deepseek-chat",
            BackendModel::Llama => "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo",
        }
    }

    /// Backend driver that serves this model.
    pub fn service(self) -> &'static str {
        match self {
            BackendModel::Gpt => "openai-completion",
            BackendModel::Claude => "claude",
            BackendModel::Gemini => "gemini",
            BackendModel::DeepSeek => "deepseek",
            BackendModel::Llama => "together-ai",
        }
    }
}

impl fmt::Display for BackendModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A single `pattern -> model` routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub pattern: String,
    pub model: BackendModel,
}

impl RoutingRule {
    pub fn new(pattern: impl Into<String>, model: BackendModel) -> Self {
        Self {
            pattern: pattern.into(),
            model,
        }
    }

    /// Case-insensitive substring match. `caller` must already be lowercase.
    fn matches(&self, caller: &str) -> bool {
        !self.pattern.is_empty() && caller.contains(&self.pattern.to_lowercase())
    }
}

fn builtin_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule::new("claude", BackendModel::Claude),
        RoutingRule::new("gemini", BackendModel::Gemini),
        RoutingRule::new("deepseek", BackendModel::DeepSeek),
        RoutingRule::new("llama", BackendModel::Llama),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRouter {
    rules: Vec<RoutingRule>,
    default_model: BackendModel,
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self {
            rules: builtin_rules(),
            default_model: BackendModel::default(),
        }
    }
}

impl ModelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put extra rules ahead of the built-in ones.
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = RoutingRule>) -> Self {
        let mut merged: Vec<RoutingRule> = rules.into_iter().collect();
        merged.append(&mut self.rules);
        self.rules = merged;
        self
    }

    pub fn with_default(mut self, model: BackendModel) -> Self {
        self.default_model = model;
        self
    }

    pub fn default_model(&self) -> BackendModel {
        self.default_model
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    pub fn route(&self, caller_model: Option<&str>) -> BackendModel {
        let Some(caller) = caller_model.map(str::trim).filter(|m| !m.is_empty()) else {
            return self.default_model;
        };
        let caller = caller.to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.matches(&caller))
            .map(|rule| rule.model)
            .unwrap_or(self.default_model)
    }
}
