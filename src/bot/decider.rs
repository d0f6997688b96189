//! Decides whether the bot should respond to the latest turn.
//!
//! A cheap model reads the whole conversation and answers with free text that
//! should end in `(YES)` or `(NO)`. The parse is lenient: the first
//! parenthesised yes/no anywhere in the answer wins, in any case.

use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::bot::collaborators::LanguageModel;
use crate::bot::log::ConversationLog;
use crate::bot::prompts::{decider_prompt, decider_trailer};
use crate::bot::turn::Turn;

static VERDICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\((yes|no)\)").expect("verdict regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Yes,
    No,
    /// No parenthesised yes/no was found.
    Ambiguous,
}

pub fn parse_verdict(text: &str) -> Verdict {
    match VERDICT_RE.captures(text) {
        Some(caps) if caps[1].eq_ignore_ascii_case("yes") => Verdict::Yes,
        Some(_) => Verdict::No,
        None => Verdict::Ambiguous,
    }
}

/// How an ambiguous verdict is acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguousPolicy {
    #[default]
    StaySilent,
    Respond,
}

impl AmbiguousPolicy {
    pub fn should_respond(&self, verdict: Verdict) -> bool {
        match verdict {
            Verdict::Yes => true,
            Verdict::No => false,
            Verdict::Ambiguous => *self == AmbiguousPolicy::Respond,
        }
    }
}

impl FromStr for AmbiguousPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "silent" | "no" => Ok(Self::StaySilent),
            "respond" | "yes" => Ok(Self::Respond),
            other => Err(format!("unknown ambiguous verdict policy '{other}' (expected silent or respond)")),
        }
    }
}

pub struct ResponseDecider {
    llm: Arc<dyn LanguageModel>,
    model: String,
    bot_name: String,
}

impl ResponseDecider {
    pub fn new(llm: Arc<dyn LanguageModel>, model: impl Into<String>, bot_name: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            bot_name: bot_name.into(),
        }
    }

    /// Build the decision request: framing, the full log, then the restated last turn.
    pub fn build_request(&self, log: &ConversationLog) -> Option<Vec<Turn>> {
        let last = log.last().ok()?;
        let snapshot = log.snapshot();

        let mut messages = Vec::with_capacity(snapshot.len() + 2);
        messages.push(Turn::system(decider_prompt(&self.bot_name)));
        messages.extend_from_slice(snapshot);
        messages.push(Turn::system(decider_trailer(&self.bot_name, last)));
        Some(messages)
    }

    /// Ask the model. Service failures count as `No`.
    pub async fn decide(&self, log: &ConversationLog) -> Verdict {
        let Some(messages) = self.build_request(log) else {
            debug!("Nothing to decide on");
            return Verdict::No;
        };

        let answer = match self.llm.complete(&self.model, &messages).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!("Decision model returned no text");
                return Verdict::Ambiguous;
            }
            Err(e) => {
                warn!("Decision call failed: {e}");
                return Verdict::No;
            }
        };

        let verdict = parse_verdict(&answer);
        let preview: String = answer.chars().take(200).collect();
        info!("🤔 Decision: {:?} ({})", verdict, preview.replace('\n', " "));
        verdict
    }
}
