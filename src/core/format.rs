//! Output formats for sinks
//!
//! Sinks render a [`Message`] either as JSON or through a template such as
//! `"%millisecond_format% [%level_string%] %body%"`. Templates are parsed once
//! when the sink is initialized and rendered per message in a single pass, so a
//! substituted value is never scanned for tokens again.

use super::error::Result;
use super::message::Message;
use std::fmt::Write;

/// Template used when a sink is configured without one
pub const DEFAULT_TEMPLATE: &str = "%millisecond_format% [%level_string%] %body%";

/// A `%name%` placeholder recognized in templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Timestamp,
    TimestampFormat,
    Millisecond,
    MillisecondFormat,
    Level,
    LevelString,
    Body,
    File,
    Line,
    Function,
}

impl Token {
    pub fn from_name(name: &str) -> Option<Self> {
        let token = match name {
            "timestamp" => Token::Timestamp,
            "timestamp_format" => Token::TimestampFormat,
            "millisecond" => Token::Millisecond,
            "millisecond_format" => Token::MillisecondFormat,
            "level" => Token::Level,
            "level_string" => Token::LevelString,
            "body" => Token::Body,
            "file" => Token::File,
            "line" => Token::Line,
            "function" => Token::Function,
            _ => return None,
        };
        Some(token)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Token::Timestamp => "timestamp",
            Token::TimestampFormat => "timestamp_format",
            Token::Millisecond => "millisecond",
            Token::MillisecondFormat => "millisecond_format",
            Token::Level => "level",
            Token::LevelString => "level_string",
            Token::Body => "body",
            Token::File => "file",
            Token::Line => "line",
            Token::Function => "function",
        }
    }

    fn render_into(&self, out: &mut String, msg: &Message) {
        // Writing into a String cannot fail
        let _ = match self {
            Token::Timestamp => write!(out, "{}", msg.timestamp),
            Token::TimestampFormat => out.write_str(&msg.timestamp_format),
            Token::Millisecond => write!(out, "{}", msg.millisecond),
            Token::MillisecondFormat => out.write_str(&msg.millisecond_format),
            Token::Level => write!(out, "{}", msg.severity.value()),
            Token::LevelString => out.write_str(msg.level_string),
            Token::Body => out.write_str(&msg.body),
            Token::File => out.write_str(&msg.file),
            Token::Line => write!(out, "{}", msg.line),
            Token::Function => out.write_str(&msg.function),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Token),
}

/// A parsed message template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFormat {
    template: String,
    segments: Vec<Segment>,
}

impl MessageFormat {
    /// Parse a template. `%...%` sequences that are not known tokens are kept
    /// as literal text.
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(start) = rest.find('%') {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            let token = after
                .find('%')
                .and_then(|end| Token::from_name(&after[..end]).map(|token| (token, end)));

            match token {
                Some((token, end)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Token(token));
                    rest = &after[end + 1..];
                }
                None => {
                    literal.push('%');
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            template: template.to_string(),
            segments,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Tokens in the order they appear
    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Token(token) => Some(*token),
            Segment::Literal(_) => None,
        })
    }

    pub fn render(&self, msg: &Message) -> String {
        let mut out = String::with_capacity(self.template.len() + msg.body.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(token) => token.render_into(&mut out, msg),
            }
        }
        out
    }
}

impl Default for MessageFormat {
    fn default() -> Self {
        Self::parse(DEFAULT_TEMPLATE)
    }
}

/// How a sink turns a message into one line of output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Template(MessageFormat),
    Json,
}

impl OutputFormat {
    /// Resolve a sink's `json_format` / `format` settings. An empty template
    /// falls back to [`DEFAULT_TEMPLATE`].
    pub fn from_settings(json_format: bool, template: &str) -> Self {
        if json_format {
            OutputFormat::Json
        } else if template.is_empty() {
            OutputFormat::Template(MessageFormat::default())
        } else {
            OutputFormat::Template(MessageFormat::parse(template))
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json)
    }

    pub fn format(&self, msg: &Message) -> Result<String> {
        match self {
            OutputFormat::Template(format) => Ok(format.render(msg)),
            OutputFormat::Json => Ok(msg.to_json()?),
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Template(MessageFormat::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::CallSite;
    use crate::core::severity::Severity;
    use chrono::{Local, TimeZone};

    fn message(body: &str) -> Message {
        let datetime = Local
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime");
        Message::at(
            datetime,
            Severity::Debug,
            body,
            CallSite::new("src/main.rs", 7, "app::main"),
        )
    }

    #[test]
    fn test_default_template() {
        let rendered = MessageFormat::default().render(&message("hello"));
        assert_eq!(rendered, "2025-01-08 10:30:45.000 [Debug] hello");
    }

    #[test]
    fn test_every_token_substituted() {
        let msg = message("hello");
        let format = MessageFormat::parse(
            "%timestamp%|%timestamp_format%|%millisecond%|%millisecond_format%|%level%|\
             %level_string%|%body%|%file%|%line%|%function%",
        );
        assert_eq!(format.tokens().count(), 10);

        let rendered = format.render(&msg);
        assert!(!rendered.contains('%'));
        let parts: Vec<&str> = rendered.split('|').collect();
        assert_eq!(parts[0], msg.timestamp.to_string());
        assert_eq!(parts[1], "2025-01-08 10:30:45");
        assert_eq!(parts[2], msg.millisecond.to_string());
        assert_eq!(parts[4], "7");
        assert_eq!(parts[5], "Debug");
        assert_eq!(parts[6], "hello");
        assert_eq!(parts[7], "main.rs");
        assert_eq!(parts[8], "7");
        assert_eq!(parts[9], "app::main");
    }

    #[test]
    fn test_unknown_tokens_kept_verbatim() {
        let format = MessageFormat::parse("100% done %thread% %body%");
        assert_eq!(format.render(&message("ok")), "100% done %thread% ok");
    }

    #[test]
    fn test_values_not_rescanned() {
        let format = MessageFormat::parse("%body% %level%");
        assert_eq!(format.render(&message("%level_string%")), "%level_string% 7");
    }

    #[test]
    fn test_from_settings() {
        assert!(OutputFormat::from_settings(true, "%body%").is_json());
        assert_eq!(
            OutputFormat::from_settings(false, ""),
            OutputFormat::Template(MessageFormat::default())
        );

        let format = OutputFormat::from_settings(false, "<%level_string%> %body%");
        assert_eq!(format.format(&message("x")).unwrap(), "<Debug> x");
    }

    #[test]
    fn test_json_output() {
        let out = OutputFormat::Json.format(&message("hello")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["body"], "hello");
        assert_eq!(value["level"], 7);
        assert_eq!(value["function"], "app::main");
    }
}
