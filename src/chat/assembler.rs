//! Message assembly
//!
//! Folds stream events into per-run state and derives the renderable
//! snapshot after each event.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::chat::conversation::MessagePart;
use crate::chat::model::events::{FinalEvent, StreamEvent, ToolEndEvent, ToolStartEvent};

/// Text shown when the user submitted nothing
pub const ASK_FOR_INPUT: &str = "Please enter a message.";

/// Completion state of a tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolStatus {
    Running,
    /// Finished, with the result if the backend reported one
    Completed { result: Option<Value> },
}

impl ToolStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Completed { result } => result.as_ref(),
            Self::Running => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolState {
    pub id: String,
    pub name: String,
    pub args: Value,
    pub status: ToolStatus,
}

fn empty_args() -> Value {
    Value::Object(Map::new())
}

/// Renderable part of a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPart {
    ToolCall(ToolState),
    Text(String),
}

/// Immutable view of the assistant message at one point in a run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub parts: Vec<RenderPart>,
}

impl Snapshot {
    /// Single-text snapshot asking the user for input
    pub fn ask_for_input() -> Self {
        Self {
            parts: vec![RenderPart::Text(ASK_FOR_INPUT.to_string())],
        }
    }

    /// Trailing text, if present
    pub fn text(&self) -> Option<&str> {
        self.parts.iter().rev().find_map(|part| match part {
            RenderPart::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolState> {
        self.parts.iter().filter_map(|part| match part {
            RenderPart::ToolCall(tool) => Some(tool),
            _ => None,
        })
    }

    /// Convert into message parts for the conversation history
    pub fn into_message_parts(self) -> Vec<MessagePart> {
        self.parts
            .into_iter()
            .map(|part| match part {
                RenderPart::ToolCall(tool) => MessagePart::ToolCall {
                    result: tool.status.result().cloned(),
                    id: tool.id,
                    name: tool.name,
                    args: tool.args,
                },
                RenderPart::Text(text) => MessagePart::Text { text },
            })
            .collect()
    }
}

/// Per-run assembly state
///
/// Created fresh for every run and never shared between runs.
#[derive(Debug, Default)]
pub struct AssemblerState {
    assistant_text: String,
    /// Tool call ID -> state
    tool_map: HashMap<String, ToolState>,
    /// Tool call IDs in first-reference order
    tool_order: Vec<String>,
    response_id: Option<String>,
    events_applied: usize,
}

impl AssemblerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event, in arrival order
    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Token(token) => self.assistant_text.push_str(&token.content),
            StreamEvent::ToolStart(start) => self.apply_tool_start(start),
            StreamEvent::ToolEnd(end) => self.apply_tool_end(end),
            StreamEvent::Final(fin) => self.apply_final(fin),
        }
        self.events_applied += 1;
    }

    fn register(&mut self, id: &str) {
        if !self.tool_map.contains_key(id) {
            self.tool_order.push(id.to_string());
        }
    }

    fn apply_tool_start(&mut self, start: &ToolStartEvent) {
        self.register(&start.id);
        let args = start.input.clone().unwrap_or_else(empty_args);

        // A tool_end that overtook its tool_start keeps its completion
        let status = match self.tool_map.get(&start.id) {
            Some(existing) if existing.status.is_completed() => existing.status.clone(),
            _ => ToolStatus::Running,
        };

        self.tool_map.insert(
            start.id.clone(),
            ToolState {
                id: start.id.clone(),
                name: start.name.clone(),
                args,
                status,
            },
        );
    }

    fn apply_tool_end(&mut self, end: &ToolEndEvent) {
        self.register(&end.id);
        let args = self
            .tool_map
            .get(&end.id)
            .map(|existing| existing.args.clone())
            .unwrap_or_else(empty_args);

        self.tool_map.insert(
            end.id.clone(),
            ToolState {
                id: end.id.clone(),
                name: end.name.clone(),
                args,
                status: ToolStatus::Completed {
                    result: end.output.clone(),
                },
            },
        );
    }

    fn apply_final(&mut self, fin: &FinalEvent) {
        if let Some(content) = fin.authoritative_content() {
            self.assistant_text = content.to_string();
        }
        if let Some(response_id) = &fin.response_id {
            self.response_id = Some(response_id.clone());
        }

        for call in &fin.tool_calls {
            self.register(&call.id);
            let existing = self.tool_map.get(&call.id);

            let args = call.input.clone().unwrap_or_else(empty_args);
            // A missing output keeps a result already reported by tool_end
            let result = call
                .output
                .clone()
                .or_else(|| existing.and_then(|tool| tool.status.result().cloned()));

            self.tool_map.insert(
                call.id.clone(),
                ToolState {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    args,
                    status: ToolStatus::Completed { result },
                },
            );
        }
    }

    /// Derive the current snapshot
    pub fn snapshot(&self) -> Snapshot {
        let mut parts: Vec<RenderPart> = self
            .tool_order
            .iter()
            .filter_map(|id| self.tool_map.get(id))
            .cloned()
            .map(RenderPart::ToolCall)
            .collect();

        if !self.assistant_text.is_empty() || parts.is_empty() {
            parts.push(RenderPart::Text(self.assistant_text.clone()));
        }

        Snapshot { parts }
    }

    pub fn assistant_text(&self) -> &str {
        &self.assistant_text
    }

    pub fn tool_order(&self) -> &[String] {
        &self.tool_order
    }

    #[cfg(test)]
    pub fn tool(&self, id: &str) -> Option<&ToolState> {
        self.tool_map.get(id)
    }

    pub fn response_id(&self) -> Option<&str> {
        self.response_id.as_deref()
    }

    pub fn events_applied(&self) -> usize {
        self.events_applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::model::events::{FinalToolCall, TokenEvent};
    use serde_json::json;
    use std::collections::HashSet;

    fn token(content: &str) -> StreamEvent {
        StreamEvent::Token(TokenEvent::new(content))
    }

    fn tool_start(id: &str, name: &str, input: Option<Value>) -> StreamEvent {
        StreamEvent::ToolStart(ToolStartEvent::new(id, name, input))
    }

    fn tool_end(id: &str, name: &str, output: Option<Value>) -> StreamEvent {
        StreamEvent::ToolEnd(ToolEndEvent::new(id, name, output))
    }

    fn final_event(content: Option<&str>, tool_calls: Vec<FinalToolCall>) -> StreamEvent {
        StreamEvent::Final(FinalEvent {
            content: content.map(str::to_string),
            tool_calls,
            ..FinalEvent::default()
        })
    }

    fn call(id: &str, input: Option<Value>, output: Option<Value>) -> FinalToolCall {
        FinalToolCall {
            id: id.to_string(),
            name: "tool".to_string(),
            input,
            output,
        }
    }

    fn fold(events: &[StreamEvent]) -> AssemblerState {
        let mut state = AssemblerState::new();
        for event in events {
            state.apply(event);
        }
        state
    }

    #[test]
    fn test_final_content_overrides_tokens() {
        let state = fold(&[
            tool_start("A", "search", Some(json!({"q": "x"}))),
            token("Hi"),
            tool_end("A", "search", Some(json!({"n": 3}))),
            final_event(Some("Final text"), vec![]),
        ]);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.parts.len(), 2);
        match &snapshot.parts[0] {
            RenderPart::ToolCall(tool) => {
                assert_eq!(tool.id, "A");
                assert_eq!(tool.args, json!({"q": "x"}));
                assert_eq!(tool.status.result(), Some(&json!({"n": 3})));
            }
            other => panic!("expected tool call, got {:?}", other),
        }
        assert_eq!(snapshot.parts[1], RenderPart::Text("Final text".to_string()));
    }

    #[test]
    fn test_final_without_content_keeps_tokens() {
        let state = fold(&[token("Hel"), token("lo"), final_event(None, vec![])]);
        assert_eq!(state.snapshot().parts, vec![RenderPart::Text("Hello".to_string())]);
    }

    #[test]
    fn test_empty_final_content_keeps_tokens() {
        let state = fold(&[token("kept"), final_event(Some(""), vec![])]);
        assert_eq!(state.assistant_text(), "kept");
    }

    #[test]
    fn test_lone_tool_end() {
        let state = fold(&[tool_end("B", "fetch", Some(json!({"ok": true})))]);
        assert_eq!(state.tool_order(), &["B".to_string()]);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.parts.len(), 1);
        let tool = snapshot.tool_calls().next().unwrap();
        assert_eq!(tool.args, json!({}));
        assert_eq!(tool.status.result(), Some(&json!({"ok": true})));
    }

    #[test]
    fn test_tool_start_is_running() {
        let state = fold(&[tool_start("A", "search", None)]);
        let tool = state.tool("A").unwrap();
        assert_eq!(tool.status, ToolStatus::Running);
        assert_eq!(tool.args, json!({}));
    }

    #[test]
    fn test_tool_end_without_output_is_completed() {
        let state = fold(&[tool_start("A", "search", Some(json!({"q": 1}))), tool_end("A", "search", None)]);
        let tool = state.tool("A").unwrap();
        assert_eq!(tool.status, ToolStatus::Completed { result: None });
        assert_eq!(tool.args, json!({"q": 1}));
    }

    #[test]
    fn test_late_tool_start_keeps_completion() {
        let state = fold(&[
            tool_end("A", "search", Some(json!(1))),
            tool_start("A", "search", Some(json!({"q": "x"}))),
        ]);
        let tool = state.tool("A").unwrap();
        assert_eq!(tool.args, json!({"q": "x"}));
        assert_eq!(tool.status.result(), Some(&json!(1)));
        assert_eq!(state.tool_order().len(), 1);
    }

    #[test]
    fn test_final_tool_calls_complete_tools() {
        let state = fold(&[
            tool_start("A", "search", Some(json!({"q": "x"}))),
            final_event(
                Some("done"),
                vec![call("A", None, None), call("C", Some(json!({"u": 1})), Some(json!("ok")))],
            ),
        ]);
        assert_eq!(state.tool_order(), &["A".to_string(), "C".to_string()]);

        let a = state.tool("A").unwrap();
        assert!(a.status.is_completed());
        assert_eq!(a.args, json!({}));
        assert!(a.status.result().is_none());

        let c = state.tool("C").unwrap();
        assert_eq!(c.status.result(), Some(&json!("ok")));
    }

    #[test]
    fn test_final_entry_without_input_resets_args() {
        let state = fold(&[
            tool_start("A", "search", Some(json!({"q": "x"}))),
            final_event(None, vec![call("A", None, None)]),
        ]);
        assert_eq!(state.tool("A").unwrap().args, json!({}));
    }

    #[test]
    fn test_final_entry_without_output_keeps_result() {
        let state = fold(&[
            tool_end("A", "search", Some(json!({"n": 3}))),
            final_event(None, vec![call("A", Some(json!({"q": "x"})), None)]),
        ]);
        let tool = state.tool("A").unwrap();
        assert_eq!(tool.args, json!({"q": "x"}));
        assert_eq!(tool.status.result(), Some(&json!({"n": 3})));
    }

    #[test]
    fn test_response_id_stored() {
        let state = fold(&[StreamEvent::Final(FinalEvent {
            response_id: Some("resp-9".to_string()),
            ..FinalEvent::default()
        })]);
        assert_eq!(state.response_id(), Some("resp-9"));
    }

    #[test]
    fn test_empty_text_omitted_only_with_tools() {
        assert_eq!(AssemblerState::new().snapshot().parts, vec![RenderPart::Text(String::new())]);

        let state = fold(&[tool_start("A", "search", None)]);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.parts.len(), 1);
        assert!(snapshot.text().is_none());
    }

    #[test]
    fn test_tool_order_is_duplicate_free_permutation() {
        let events = vec![
            tool_end("B", "fetch", None),
            tool_start("A", "search", None),
            tool_start("B", "fetch", None),
            token("x"),
            tool_end("A", "search", Some(json!(1))),
            final_event(None, vec![call("C", None, None), call("A", None, None)]),
            tool_start("C", "late", None),
        ];

        // Every rotation of the sequence is a different interleaving
        for shift in 0..events.len() {
            let mut rotated = events.clone();
            rotated.rotate_left(shift);
            let state = fold(&rotated);

            let order: Vec<&String> = state.tool_order().iter().collect();
            let unique: HashSet<&String> = order.iter().copied().collect();
            assert_eq!(order.len(), unique.len(), "duplicates at shift {}", shift);
            assert_eq!(unique.len(), 3);
            for id in ["A", "B", "C"] {
                assert!(state.tool(id).is_some());
            }
        }
    }

    #[test]
    fn test_first_reference_order() {
        let state = fold(&[
            final_event(None, vec![call("Z", None, None)]),
            tool_end("Y", "b", None),
            tool_start("X", "a", None),
            tool_start("Z", "again", None),
        ]);
        assert_eq!(state.tool_order(), &["Z".to_string(), "Y".to_string(), "X".to_string()]);
        assert_eq!(state.events_applied(), 4);
    }

    #[test]
    fn test_into_message_parts() {
        let state = fold(&[tool_end("B", "fetch", Some(json!({"ok": true}))), token("text")]);
        let parts = state.snapshot().into_message_parts();
        assert_eq!(
            parts,
            vec![
                MessagePart::ToolCall {
                    id: "B".to_string(),
                    name: "fetch".to_string(),
                    args: json!({}),
                    result: Some(json!({"ok": true})),
                },
                MessagePart::Text { text: "text".to_string() },
            ]
        );
    }

    #[test]
    fn test_ask_for_input() {
        assert_eq!(Snapshot::ask_for_input().text(), Some(ASK_FOR_INPUT));
    }
}
