//! Console sink implementation

use crate::core::{LoggerError, Message, OutputFormat, Result, Severity, Sink, SinkConfig};
use colored::{Color, Colorize};
use std::io::{self, Write};

/// Writes one line per message to stdout, optionally colored by severity.
pub struct ConsoleSink {
    writer: Box<dyn Write + Send>,
    color: bool,
    output_format: OutputFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Write to `writer` instead of stdout
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer,
            color: false,
            output_format: OutputFormat::default(),
        }
    }

    fn paint(line: &str, severity: Severity) -> String {
        match severity {
            Severity::Debug => line.on_color(Color::Blue).to_string(),
            other => line.color(other.color()).to_string(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn init(&mut self, config: &SinkConfig) -> Result<()> {
        let SinkConfig::Console(config) = config else {
            return Err(LoggerError::config(
                "ConsoleSink",
                format!("expected a console config, got '{}'", config.kind()),
            ));
        };

        self.color = config.color;
        self.output_format = OutputFormat::from_settings(config.json_format, &config.format);
        Ok(())
    }

    fn write(&mut self, message: &Message) -> Result<()> {
        let line = self.output_format.format(message)?;
        if self.color {
            writeln!(self.writer, "{}", Self::paint(&line, message.severity))?;
        } else {
            writeln!(self.writer, "{}", line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
