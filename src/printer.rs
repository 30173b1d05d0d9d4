use anyhow::{Context, Result};
use std::{
    fmt,
    io::{self, Write},
};

use crate::output::OutputFmt;

pub trait Printer {
    fn out<T: fmt::Display + serde::Serialize>(&mut self, data: T) -> Result<()>;
}

pub struct WriterPrinter<W: Write> {
    writer: W,
    output: OutputFmt,
}

pub type StdoutPrinter = WriterPrinter<io::Stdout>;

impl<W: Write> WriterPrinter<W> {
    pub fn with_writer(writer: W, output: OutputFmt) -> Self {
        Self { writer, output }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl StdoutPrinter {
    pub fn new(output: OutputFmt) -> Self {
        Self::with_writer(io::stdout(), output)
    }
}

impl<W: Write> Printer for WriterPrinter<W> {
    fn out<T: fmt::Display + serde::Serialize>(&mut self, data: T) -> Result<()> {
        match self.output {
            OutputFmt::Plain => {
                write!(self.writer, "{data}")?;
            }
            OutputFmt::Json => {
                serde_json::to_writer(&mut self.writer, &data)
                    .context("cannot write json to writer")?;
                writeln!(self.writer)?;
            }
        };

        self.writer.flush()?;
        Ok(())
    }
}
