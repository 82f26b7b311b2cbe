//! Conversation sessions
//!
//! A session owns the bounded conversation history for one conversation
//! (a terminal chat, a Slack channel) and turns agent failures into replies.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::error;

use scout_agents::{Agent, AgentError};

/// Sent before a question is worked on
pub const ACKNOWLEDGEMENT: &str = "Thank you for your question, one moment.";

/// Reply to greetings, which skip the agent
pub const GREETING_REPLY: &str = "Hello!";

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Question/answer exchanges kept for the prompt
    pub history_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { history_window: 2 }
    }
}

/// One question and its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// The last `k` exchanges of a conversation
#[derive(Debug, Clone)]
pub struct ConversationWindow {
    k: usize,
    exchanges: VecDeque<Exchange>,
}

impl ConversationWindow {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            exchanges: VecDeque::with_capacity(k),
        }
    }

    pub fn record(&mut self, question: &str, answer: &str) {
        if self.k == 0 {
            return;
        }
        while self.exchanges.len() >= self.k {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back(Exchange {
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    /// `Human:`/`AI:` lines, oldest first
    pub fn render(&self) -> String {
        self.exchanges
            .iter()
            .map(|e| format!("Human: {}\nAI: {}", e.question, e.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A conversation with the agent
pub struct Session {
    agent: Arc<Agent>,
    history: Mutex<ConversationWindow>,
}

impl Session {
    pub fn new(agent: Arc<Agent>, config: &SessionConfig) -> Self {
        Self {
            agent,
            history: Mutex::new(ConversationWindow::new(config.history_window)),
        }
    }

    /// Ask a question; failed questions are not added to the history
    pub async fn ask(&self, question: &str) -> Result<String, AgentError> {
        let history = self.history.lock().render();
        let answer = self.agent.answer(question, &history).await?;
        self.history.lock().record(question, &answer);
        Ok(answer)
    }

    /// Ask a question and always come back with something to say
    pub async fn reply(&self, question: &str) -> String {
        match self.ask(question).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Question failed: {}", e);
                apology(&e)
            }
        }
    }

    pub fn history(&self) -> ConversationWindow {
        self.history.lock().clone()
    }
}

/// Chat reply for a question the agent could not answer
pub fn apology(err: &AgentError) -> String {
    format!("Sorry, I couldn't find an answer to that. ({})", err)
}

/// Greetings get a canned reply instead of a trip through the agent
pub fn is_greeting(text: &str) -> bool {
    text.to_lowercase().contains("hello")
}
