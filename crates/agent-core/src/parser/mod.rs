//! Incremental scanner for `<tool_code>` markup embedded in model output.
//!
//! The parser is fed arbitrary fragments of one model turn. Text outside a
//! `<tool_code>` block is streamed back as `Token` events as soon as it can no
//! longer be the start of a recognised tag; each block is buffered and released
//! as `ToolStart`/`ToolArg`/`ToolEnd` runs only once its `</tool_code>` arrives,
//! so a malformed block never leaks partial tool events.

mod tag;

use std::mem;

use thiserror::Error;

use crate::agent::StreamEvent;
use crate::tools::{ToolCall, ToolCallAssembler};
use tag::TagMatch;

pub const TOOL_CODE_OPEN: &str = "<tool_code>";
pub const TOOL_CODE_CLOSE: &str = "</tool_code>";

pub(crate) const MAX_TAG_LEN: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated <tool_code> block")]
    UnterminatedBlock,

    #[error("<tool> tag is missing a non-empty name attribute")]
    MissingToolName,

    #[error("malformed <tool> tag: {0}")]
    MalformedToolTag(String),

    #[error("tool '{0}' was not closed before </tool_code>")]
    UnclosedTool(String),

    #[error("unexpected </{found}> inside tool '{tool}'")]
    UnexpectedClose { tool: String, found: String },

    #[error("argument <{0}> must not carry attributes")]
    ArgumentAttributes(String),

    #[error("tag '{0}' was not closed before the next tag")]
    UnfinishedTag(String),

    #[error("tag exceeds {0} bytes")]
    TagTooLong(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Text,
    InToolCode,
    InTool {
        tool: String,
    },
    InArg {
        tool: String,
        name: String,
        value: String,
    },
    /// Recovering from a malformed block until its `</tool_code>`.
    Skipping,
}

#[derive(Debug)]
pub struct TagParser {
    mode: Mode,
    possible_tag: Option<String>,
    text: String,
    block: Vec<StreamEvent>,
}

impl Default for TagParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TagParser {
    pub fn new() -> Self {
        Self {
            mode: Mode::Text,
            possible_tag: None,
            text: String::new(),
            block: Vec::new(),
        }
    }

    pub fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for c in chunk.chars() {
            self.step(c, &mut events);
        }
        self.flush_text(&mut events);
        events
    }

    /// Flushes buffered state, terminates with `Done` and resets the parser.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(pending) = self.possible_tag.take() {
            self.push_literal(&pending);
        }
        if !matches!(self.mode, Mode::Text | Mode::Skipping) {
            self.fail(ParseError::UnterminatedBlock, &mut events);
        }
        self.flush_text(&mut events);
        events.push(StreamEvent::Done);

        *self = Self::new();
        events
    }

    pub fn in_tool_code(&self) -> bool {
        !matches!(self.mode, Mode::Text)
    }

    fn step(&mut self, c: char, events: &mut Vec<StreamEvent>) {
        let Some(mut candidate) = self.possible_tag.take() else {
            if c == '<' {
                self.possible_tag = Some(String::from('<'));
            } else {
                let mut buf = [0u8; 4];
                self.push_literal(c.encode_utf8(&mut buf));
            }
            return;
        };

        candidate.push(c);
        match self.classify(&candidate) {
            TagMatch::Partial => self.possible_tag = Some(candidate),
            TagMatch::Complete => self.on_tag(&candidate, events),
            TagMatch::NoMatch => {
                let literal_len = candidate.len() - c.len_utf8();
                self.push_literal(&candidate[..literal_len]);
                self.step(c, events);
            }
            TagMatch::Overflow => self.fail(ParseError::TagTooLong(MAX_TAG_LEN), events),
            TagMatch::Interrupted => {
                let unfinished = &candidate[..candidate.len() - c.len_utf8()];
                self.fail(ParseError::UnfinishedTag(unfinished.to_string()), events);
                self.step(c, events);
            }
        }
    }

    fn classify(&self, candidate: &str) -> TagMatch {
        match &self.mode {
            Mode::Text => tag::match_literal(candidate, TOOL_CODE_OPEN),
            Mode::Skipping => tag::match_literal(candidate, TOOL_CODE_CLOSE),
            Mode::InArg { name, .. } => tag::match_literal(candidate, &format!("</{}>", name)),
            Mode::InToolCode => {
                if candidate.starts_with("</") {
                    tag::match_literal(candidate, TOOL_CODE_CLOSE)
                } else {
                    tag::match_tool_open(candidate)
                }
            }
            Mode::InTool { .. } => {
                if candidate.starts_with("</") {
                    tag::match_close_tag(candidate)
                } else {
                    tag::match_arg_open(candidate)
                }
            }
        }
    }

    fn on_tag(&mut self, tag: &str, events: &mut Vec<StreamEvent>) {
        match mem::replace(&mut self.mode, Mode::Text) {
            Mode::Text => {
                self.flush_text(events);
                self.block.clear();
                self.mode = Mode::InToolCode;
            }
            Mode::Skipping => {}
            Mode::InToolCode => {
                if tag == TOOL_CODE_CLOSE {
                    events.append(&mut self.block);
                    return;
                }
                match tag::parse_tool_tag(tag) {
                    Ok((name, self_closing)) => {
                        self.block.push(StreamEvent::ToolStart { name: name.clone() });
                        if self_closing {
                            self.block.push(StreamEvent::ToolEnd);
                            self.mode = Mode::InToolCode;
                        } else {
                            self.mode = Mode::InTool { tool: name };
                        }
                    }
                    Err(error) => self.fail(error, events),
                }
            }
            Mode::InTool { tool } => {
                if let Some(closing) = tag.strip_prefix("</").and_then(|t| t.strip_suffix('>')) {
                    match closing {
                        "tool" => {
                            self.block.push(StreamEvent::ToolEnd);
                            self.mode = Mode::InToolCode;
                        }
                        "tool_code" => {
                            self.fail(ParseError::UnclosedTool(tool), events);
                            self.mode = Mode::Text;
                        }
                        found => self.fail(
                            ParseError::UnexpectedClose {
                                tool,
                                found: found.to_string(),
                            },
                            events,
                        ),
                    }
                    return;
                }
                match tag::parse_arg_tag(tag) {
                    Ok((name, true)) => {
                        self.block.push(StreamEvent::ToolArg {
                            name,
                            value: String::new(),
                        });
                        self.mode = Mode::InTool { tool };
                    }
                    Ok((name, false)) => {
                        self.mode = Mode::InArg {
                            tool,
                            name,
                            value: String::new(),
                        };
                    }
                    Err(error) => self.fail(error, events),
                }
            }
            Mode::InArg { tool, name, value } => {
                self.block.push(StreamEvent::ToolArg { name, value });
                self.mode = Mode::InTool { tool };
            }
        }
    }

    fn push_literal(&mut self, literal: &str) {
        match &mut self.mode {
            Mode::Text => self.text.push_str(literal),
            Mode::InArg { value, .. } => value.push_str(literal),
            Mode::InToolCode | Mode::InTool { .. } | Mode::Skipping => {}
        }
    }

    fn flush_text(&mut self, events: &mut Vec<StreamEvent>) {
        if !self.text.is_empty() {
            events.push(StreamEvent::Token {
                content: mem::take(&mut self.text),
            });
        }
    }

    fn fail(&mut self, error: ParseError, events: &mut Vec<StreamEvent>) {
        log::warn!("Discarding tool_code block: {}", error);
        self.flush_text(events);
        self.block.clear();
        events.push(StreamEvent::Error {
            message: error.to_string(),
        });
        self.mode = Mode::Skipping;
    }
}

/// Merges adjacent `Token` events; token granularity follows chunk boundaries.
pub fn coalesce_tokens(events: impl IntoIterator<Item = StreamEvent>) -> Vec<StreamEvent> {
    let mut merged: Vec<StreamEvent> = Vec::new();
    for event in events {
        if let StreamEvent::Token { content } = &event {
            if let Some(StreamEvent::Token { content: previous }) = merged.last_mut() {
                previous.push_str(content);
                continue;
            }
        }
        merged.push(event);
    }
    merged
}

/// Parses a complete model turn into its visible text and tool calls.
pub fn extract_tool_calls(text: &str) -> (String, Vec<ToolCall>) {
    let mut parser = TagParser::new();
    let mut events = parser.feed(text);
    events.extend(parser.finish());

    let mut visible = String::new();
    let mut assembler = ToolCallAssembler::new();
    for event in &events {
        if let StreamEvent::Token { content } = event {
            visible.push_str(content);
        }
        assembler.update(event);
    }
    (visible, assembler.finalize())
}

/// Writes tool calls back out as a single `<tool_code>` block.
pub fn render_tool_calls(calls: &[ToolCall]) -> String {
    if calls.is_empty() {
        return String::new();
    }
    let mut out = String::from(TOOL_CODE_OPEN);
    out.push('\n');
    for call in calls {
        out.push_str(&format!("  <tool name=\"{}\">\n", call.name));
        for (name, value) in &call.arguments {
            out.push_str(&format!("    <{name}>{value}</{name}>\n"));
        }
        out.push_str("  </tool>\n");
    }
    out.push_str(TOOL_CODE_CLOSE);
    out
}
