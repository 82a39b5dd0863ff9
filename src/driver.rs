use std::io::{self, Write};

use log::info;

use crate::ast::ASTNode;
use crate::parser::{ParseError, Parser, UnitKind};

pub const PROMPT: &str = "ready> ";

fn success_message(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Definition => "Parsed a function definition.",
        UnitKind::Extern => "Parsed an extern",
        UnitKind::TopLevelExpression => "Parsed a top-level expression",
    }
}

/// Everything a driver run produced, in input order.
#[derive(Debug, Default)]
pub struct Report {
    pub units: Vec<ASTNode>,
    pub errors: Vec<ParseError>,
}

/// Top-level read/dispatch loop. Progress and diagnostics go to `out`.
pub struct Driver<I: Iterator<Item = char>, W: Write> {
    parser: Parser<I>,
    out: W,
    pub interactive: bool,
}

impl<I: Iterator<Item = char>, W: Write> Driver<I, W> {
    pub fn new(parser: Parser<I>, out: W) -> Self {
        Self {
            parser,
            out,
            interactive: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn run(&mut self) -> io::Result<Report> {
        let mut report = Report::default();

        self.prompt()?;
        self.parser.advance();

        while let Some((kind, parsed)) = self.parser.parse_unit() {
            match parsed {
                Ok(node) => {
                    writeln!(self.out, "{}", success_message(kind))?;
                    report.units.push(node);
                }
                Err(err) => {
                    writeln!(self.out, "Error: {}", err)?;
                    report.errors.push(err);
                    // skip a token so the next unit starts past the failure
                    self.parser.advance();
                }
            }
            self.prompt()?;
        }

        info!(
            "parsed {} units with {} errors",
            report.units.len(),
            report.errors.len()
        );
        Ok(report)
    }

    fn prompt(&mut self) -> io::Result<()> {
        if self.interactive {
            write!(self.out, "{}", PROMPT)?;
            self.out.flush()?;
        }
        Ok(())
    }
}
