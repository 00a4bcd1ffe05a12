use indexmap::map::Entry;

use crate::agent::StreamEvent;
use crate::tools::ToolCall;

/// Folds `ToolStart`/`ToolArg`/`ToolEnd` events back into structured calls.
#[derive(Debug, Default, Clone)]
pub struct ToolCallAssembler {
    open: Option<ToolCall>,
    completed: Vec<ToolCall>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::ToolStart { name } => {
                if let Some(unfinished) = self.open.replace(ToolCall::new(name.clone())) {
                    log::warn!(
                        "Tool '{}' started before '{}' ended, dropping the unfinished call",
                        name,
                        unfinished.name
                    );
                }
            }
            StreamEvent::ToolArg { name, value } => {
                let Some(call) = self.open.as_mut() else {
                    log::warn!("Argument '{}' arrived outside of a tool call", name);
                    return;
                };
                match call.arguments.entry(name.clone()) {
                    Entry::Vacant(entry) => {
                        entry.insert(value.clone());
                    }
                    Entry::Occupied(_) => {
                        log::warn!(
                            "Duplicate argument '{}' for tool '{}', keeping the first value",
                            name,
                            call.name
                        );
                    }
                }
            }
            StreamEvent::ToolEnd => {
                if let Some(call) = self.open.take() {
                    self.completed.push(call);
                }
            }
            StreamEvent::Token { .. } | StreamEvent::Error { .. } | StreamEvent::Done => {}
        }
    }

    pub fn extend<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a StreamEvent>,
    {
        for event in events {
            self.update(event);
        }
    }

    pub fn calls(&self) -> &[ToolCall] {
        &self.completed
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn finalize(self) -> Vec<ToolCall> {
        self.completed
    }
}
