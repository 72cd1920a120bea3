use std::io::{BufRead, Write};

use tracing::debug;

use crate::command::{InputType, MetaCommand, PrepareError};
use crate::{DbError, Result, Table, constants_report, executor};

const SYNTAX_ERROR: &str = "Syntax error. Could not parse statement.";

enum Line {
    Text(String),
    NotUtf8,
    Eof,
}

struct InputBuffer {
    bytes: Vec<u8>,
}

impl InputBuffer {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Reads the next line, trimmed.
    fn read_input<R: BufRead>(&mut self, input: &mut R) -> Result<Line> {
        self.bytes.clear();
        let read = input
            .read_until(b'\n', &mut self.bytes)
            .map_err(DbError::Terminal)?;
        if read == 0 {
            return Ok(Line::Eof);
        }
        Ok(match std::str::from_utf8(&self.bytes) {
            Ok(text) => Line::Text(text.trim().to_string()),
            Err(_) => Line::NotUtf8,
        })
    }
}

pub struct Repl<R, W> {
    table: Table,
    input: R,
    output: W,
    prompt: String,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(table: Table, input: R, output: W, prompt: impl Into<String>) -> Self {
        Self {
            table,
            input,
            output,
            prompt: prompt.into(),
        }
    }

    /// Runs until `.exit` or end of input, then closes the table.
    ///
    /// A failure of the input or output stream still closes the table, so
    /// acknowledged rows are kept. Storage faults skip the flush.
    pub fn run(mut self) -> Result<()> {
        match self.run_loop() {
            Ok(()) => self.table.close(),
            Err(err) if err.is_storage_fault() => Err(err),
            Err(err) => {
                self.table.close()?;
                Err(err)
            }
        }
    }

    fn run_loop(&mut self) -> Result<()> {
        let mut input_buffer = InputBuffer::new();

        loop {
            self.print_prompt()?;
            let line = match input_buffer.read_input(&mut self.input)? {
                Line::Text(line) => line,
                Line::NotUtf8 => {
                    self.print_line(SYNTAX_ERROR)?;
                    continue;
                }
                Line::Eof => {
                    debug!("end of input");
                    break;
                }
            };
            if line.is_empty() {
                continue;
            }

            match InputType::parse(&line) {
                InputType::Meta(MetaCommand::Exit) => break,
                InputType::Meta(MetaCommand::Constants) => {
                    self.print_line("Constants:")?;
                    for (name, value) in constants_report() {
                        self.print_line(&format!("{name}: {value}"))?;
                    }
                }
                InputType::Meta(MetaCommand::BTree) => {
                    let tree = self.table.dump()?;
                    self.print_line("Tree:")?;
                    write!(self.output, "{tree}").map_err(DbError::Terminal)?;
                }
                InputType::Meta(MetaCommand::Unrecognized) => {
                    self.print_line(&format!("Unrecognized meta-command: {line}"))?;
                }
                InputType::Statement(Ok(statement)) => {
                    executor::execute(statement, &mut self.table, &mut self.output)?;
                }
                InputType::Statement(Err(PrepareError::SyntaxError)) => {
                    self.print_line(SYNTAX_ERROR)?;
                }
                InputType::Statement(Err(PrepareError::UnrecognizedStatement)) => {
                    self.print_line(&format!("Unrecognized command: {line}"))?;
                }
            }
        }

        self.output.flush().map_err(DbError::Terminal)
    }

    fn print_prompt(&mut self) -> Result<()> {
        write!(self.output, "{}", self.prompt).map_err(DbError::Terminal)?;
        self.output.flush().map_err(DbError::Terminal)
    }

    fn print_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}").map_err(DbError::Terminal)
    }
}
