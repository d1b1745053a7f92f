//! Decoding of the assistant CLI's `stream-json` output.
//!
//! Each stdout line is either one JSON event or plain text. [`OutputCollector`]
//! folds the lines of one invocation into the final text and error flag.

use serde::Deserialize;
use serde_json::Value;

/// Events from Claude CLI's stream-json output format
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "assistant")]
    Assistant { message: AssistantMessage },

    #[serde(rename = "result")]
    Result {
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
    },

    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "tool_use")]
    ToolUse {
        name: String,
        #[serde(default)]
        input: Value,
    },

    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Other,
}

/// Something worth showing while the assistant is still running.
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    ToolUse(String),
    Thinking(String),
}

/// Accumulates the output of one assistant invocation.
#[derive(Debug, Default)]
pub struct OutputCollector {
    accumulated: String,
    final_result: Option<String>,
    is_error: bool,
}

impl OutputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one stdout line, returning any activity to surface.
    pub fn push_line(&mut self, line: &str) -> Option<Activity> {
        if line.trim().is_empty() {
            return None;
        }

        let Ok(event) = serde_json::from_str::<StreamEvent>(line) else {
            // Not an event; plain text output
            self.accumulated.push_str(line);
            self.accumulated.push('\n');
            return None;
        };

        match event {
            StreamEvent::Assistant { message, .. } => {
                let mut activity = None;
                for block in message.content {
                    match block {
                        ContentBlock::ToolUse { name, input } => {
                            activity = Some(Activity::ToolUse(describe_tool_use(&name, &input)));
                        }
                        ContentBlock::Text { text } => {
                            self.accumulated.push_str(&text);
                            self.accumulated.push('\n');
                            let snippet = preview(&text, 60);
                            if !snippet.is_empty() {
                                activity = Some(Activity::Thinking(snippet));
                            }
                        }
                        ContentBlock::Other => {}
                    }
                }
                activity
            }
            StreamEvent::Result { result, is_error } => {
                self.final_result = result;
                self.is_error = is_error;
                None
            }
            StreamEvent::Other => None,
        }
    }

    /// True when the stream ended with an error result event.
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// The final result text if one was reported, otherwise everything seen.
    pub fn finish(self) -> (String, bool) {
        let text = self.final_result.unwrap_or(self.accumulated);
        (text, self.is_error)
    }
}

/// Extract a human-readable description from a tool use event
pub fn describe_tool_use(name: &str, input: &Value) -> String {
    let field = |key: &str| input.get(key).and_then(|v| v.as_str());
    match name {
        "Read" => format!("Reading: {}", field("file_path").unwrap_or("file")),
        "Glob" => format!("Searching: {}", field("pattern").unwrap_or("*")),
        "Grep" => format!("Grep: {}", preview(field("pattern").unwrap_or("pattern"), 30)),
        "Bash" => format!("Running: {}", preview(field("command").unwrap_or("command"), 40)),
        "WebFetch" | "WebSearch" => format!(
            "Researching: {}",
            preview(field("query").or(field("url")).unwrap_or("web"), 40)
        ),
        _ => name.to_string(),
    }
}

/// First line of `text`, trimmed and cut to `max_chars` with an ellipsis.
pub fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let first_line = first_line.trim();
    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assistant_tool_use() {
        let json = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Read","input":{"file_path":"/foo/bar.rs"},"id":"123"}]},"session_id":"abc"}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();

        if let StreamEvent::Assistant { message, .. } = event {
            assert_eq!(message.content.len(), 1);
            if let ContentBlock::ToolUse { name, input } = &message.content[0] {
                assert_eq!(name, "Read");
                assert_eq!(input["file_path"], "/foo/bar.rs");
            } else {
                panic!("Expected ToolUse");
            }
        } else {
            panic!("Expected Assistant event");
        }
    }

    #[test]
    fn test_unknown_event_and_block_types_are_tolerated() {
        let event: StreamEvent = serde_json::from_str(r#"{"type":"system","subtype":"init"}"#).unwrap();
        assert!(matches!(event, StreamEvent::Other));

        let json = r#"{"type":"assistant","message":{"content":[{"type":"thinking","thinking":"hmm"}]}}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        if let StreamEvent::Assistant { message, .. } = event {
            assert!(matches!(message.content[0], ContentBlock::Other));
        } else {
            panic!("Expected Assistant event");
        }
    }

    #[test]
    fn test_collector_prefers_final_result() {
        let mut collector = OutputCollector::new();
        collector.push_line(
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Working..."}]}}"#,
        );
        collector.push_line(r#"{"type":"result","subtype":"success","result":"Created beads-abc123","is_error":false}"#);

        let (text, is_error) = collector.finish();
        assert_eq!(text, "Created beads-abc123");
        assert!(!is_error);
    }

    #[test]
    fn test_collector_falls_back_to_accumulated_text() {
        let mut collector = OutputCollector::new();
        collector.push_line("Creating issue...");
        collector.push_line(
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Created beads-xyz789"}]}}"#,
        );
        collector.push_line("");

        let (text, _) = collector.finish();
        assert_eq!(text, "Creating issue...\nCreated beads-xyz789\n");
    }

    #[test]
    fn test_collector_reports_error_result() {
        let mut collector = OutputCollector::new();
        collector.push_line(r#"{"type":"result","subtype":"error_max_turns","is_error":true}"#);
        assert!(collector.is_error());
        let (text, is_error) = collector.finish();
        assert!(is_error);
        assert!(text.is_empty());
    }

    #[test]
    fn test_collector_surfaces_activity() {
        let mut collector = OutputCollector::new();
        let activity = collector.push_line(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash","input":{"command":"bd create"}}]}}"#,
        );
        assert_eq!(activity, Some(Activity::ToolUse("Running: bd create".into())));
    }

    #[test]
    fn test_preview_truncates_on_char_boundaries() {
        assert_eq!(preview("héllo wörld", 8), "héllo...");
        assert_eq!(preview("\n\n  first line  \nsecond", 60), "first line");
        assert_eq!(preview("", 10), "");
    }
}
