//! Product agent
//!
//! A bounded think/act/observe loop:
//! - **Thinking**: render the prompt with the transcript so far and ask the model
//! - **Acting**: run the tool the model picked and record the observation
//! - **Done**: the model gave a final answer
//!
//! The loop, not the model, decides when an observation is injected: the
//! backend is told to stop right after `Action Input`.

use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

use crate::{
    parse_reply, truncate_at_stop, Decision, LlmError, ParseError, PromptTemplate, PromptVars,
    SharedBackend, Tool, ToolError, Toolbox,
};

/// Errors that end a question without an answer
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("No tool named '{0}'")]
    UnknownTool(String),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("No final answer after {0} steps")]
    StepLimit(usize),
}

/// Loop settings
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Maximum model calls per question
    pub max_steps: usize,
    /// Generation stops at this marker
    pub stop: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: 5,
            stop: "\nObservation:".to_string(),
        }
    }
}

impl AgentSettings {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// One completed tool call
#[derive(Debug, Clone)]
pub struct Step {
    /// Model reply that requested the call
    pub log: String,
    pub tool: Tool,
    pub input: String,
    pub observation: String,
}

/// Tool calls made while answering one question
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    steps: Vec<Step>,
}

impl Transcript {
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Replies and observations as the model should continue from them
    pub fn scratchpad(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(&step.log);
            out.push_str(&format!("\nObservation: {}\nThought: ", step.observation));
        }
        out
    }
}

/// Final answer plus the tool calls that led to it
#[derive(Debug, Clone)]
pub struct Outcome {
    pub answer: String,
    pub transcript: Transcript,
}

enum LoopState {
    Thinking,
    Acting {
        tool: Tool,
        input: String,
        log: String,
    },
    Done(String),
}

/// The product question agent
///
/// Holds no per-question state; conversation history is passed in by the caller.
pub struct Agent {
    backend: SharedBackend,
    toolbox: Toolbox,
    prompt: PromptTemplate,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        backend: SharedBackend,
        toolbox: Toolbox,
        prompt: PromptTemplate,
        settings: AgentSettings,
    ) -> Self {
        Self {
            backend,
            toolbox,
            prompt,
            settings,
        }
    }

    /// Answer a question, returning only the final text
    pub async fn answer(&self, question: &str, history: &str) -> Result<String, AgentError> {
        Ok(self.run(question, history).await?.answer)
    }

    /// Answer a question and keep the transcript
    pub async fn run(&self, question: &str, history: &str) -> Result<Outcome, AgentError> {
        let run_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        let span = info_span!(
            "question",
            id = %run_id,
            agent = %self.prompt.agent.id,
            model = self.backend.model_name()
        );

        self.run_loop(question, history).instrument(span).await
    }

    async fn run_loop(&self, question: &str, history: &str) -> Result<Outcome, AgentError> {
        info!("Question: {}", question);

        let stop = vec![self.settings.stop.clone()];
        let mut transcript = Transcript::default();
        let mut state = LoopState::Thinking;
        let mut steps = 0;

        loop {
            state = match state {
                LoopState::Thinking => {
                    if steps >= self.settings.max_steps {
                        return Err(AgentError::StepLimit(self.settings.max_steps));
                    }
                    steps += 1;

                    let scratchpad = transcript.scratchpad();
                    let prompt = self.prompt.render(&PromptVars {
                        input: question,
                        history,
                        scratchpad: &scratchpad,
                        max_steps: self.settings.max_steps,
                    });

                    let raw = self.backend.complete(&prompt, &stop).await?;
                    let reply = truncate_at_stop(&raw, &self.settings.stop);
                    debug!("Step {} reply: {}", steps, reply);

                    match parse_reply(reply)? {
                        Decision::Finish { output, .. } => LoopState::Done(output),
                        Decision::Act { tool, input, log } => {
                            let tool = Tool::from_name(&tool).ok_or(AgentError::UnknownTool(tool))?;
                            // No model call is left to read the observation
                            if steps == self.settings.max_steps {
                                return Err(AgentError::StepLimit(self.settings.max_steps));
                            }
                            LoopState::Acting { tool, input, log }
                        }
                    }
                }
                LoopState::Acting { tool, input, log } => {
                    let observation = self.toolbox.invoke(tool, &input).await?;
                    info!("Observation: {}", observation);

                    transcript.push(Step {
                        log,
                        tool,
                        input,
                        observation,
                    });
                    LoopState::Thinking
                }
                LoopState::Done(answer) => {
                    info!("Final answer after {} tool calls", transcript.len());
                    return Ok(Outcome { answer, transcript });
                }
            };
        }
    }
}
