//! Model reply parser
//!
//! A reply either carries a final answer or names one tool and its input:
//!
//! ```text
//! Thought: I should look up a grill
//! Action: locate_product
//! Action Input: propane grill
//! ```

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Marker that ends the loop
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:(.*?)\nAction\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)").unwrap()
});

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Could not parse LLM output: `{0}`")]
pub struct ParseError(pub String);

/// What the model decided to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Call a tool by name
    Act {
        tool: String,
        input: String,
        log: String,
    },
    /// Answer the question
    Finish { output: String, log: String },
}

/// Parse one model reply into a decision
pub fn parse_reply(reply: &str) -> Result<Decision, ParseError> {
    if let Some((_, answer)) = reply.rsplit_once(FINAL_ANSWER_MARKER) {
        return Ok(Decision::Finish {
            output: answer.trim().to_string(),
            log: reply.to_string(),
        });
    }

    let captures = ACTION_RE
        .captures(reply)
        .ok_or_else(|| ParseError(reply.to_string()))?;

    let tool = captures[1].trim().to_string();
    let input = captures[2].trim().trim_matches('"').to_string();

    Ok(Decision::Act {
        tool,
        input,
        log: reply.to_string(),
    })
}

/// Cut a reply at the first stop marker, if the backend ran past it
pub fn truncate_at_stop<'a>(reply: &'a str, stop: &str) -> &'a str {
    if stop.is_empty() {
        return reply;
    }
    match reply.find(stop) {
        Some(idx) => &reply[..idx],
        None => reply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_answer() {
        let decision = parse_reply("Thought: I now know the final answer\nFinal Answer: It costs $19.99.").unwrap();
        assert_eq!(
            decision,
            Decision::Finish {
                output: "It costs $19.99.".to_string(),
                log: "Thought: I now know the final answer\nFinal Answer: It costs $19.99.".to_string(),
            }
        );
    }

    #[test]
    fn test_final_answer_takes_last_marker() {
        let decision = parse_reply("Final Answer: draft\nFinal Answer:  real one ").unwrap();
        assert!(matches!(decision, Decision::Finish { output, .. } if output == "real one"));
    }

    #[test]
    fn test_action() {
        let reply = "Thought: find a grill\nAction: locate_product\nAction Input: \"propane grill\"";
        match parse_reply(reply).unwrap() {
            Decision::Act { tool, input, log } => {
                assert_eq!(tool, "locate_product");
                assert_eq!(input, "propane grill");
                assert_eq!(log, reply);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_numbered_action_with_multiline_input() {
        let reply = "Action 1: describe_product\nAction 1 Input:\n  https://homedepot.com/p/Foo/1\n";
        match parse_reply(reply).unwrap() {
            Decision::Act { tool, input, .. } => {
                assert_eq!(tool, "describe_product");
                assert_eq!(input, "https://homedepot.com/p/Foo/1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_reply() {
        let err = parse_reply("I think grills are nice.").unwrap_err();
        assert_eq!(err, ParseError("I think grills are nice.".to_string()));
        assert!(err.to_string().starts_with("Could not parse LLM output"));
    }

    #[test]
    fn test_truncate_at_stop() {
        let reply = "Action: locate_product\nAction Input: grill\nObservation: made up";
        assert_eq!(
            truncate_at_stop(reply, "\nObservation:"),
            "Action: locate_product\nAction Input: grill"
        );
        assert_eq!(truncate_at_stop("no marker", "\nObservation:"), "no marker");
    }
}
