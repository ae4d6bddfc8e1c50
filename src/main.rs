//! sqlit console: reads `;`-terminated statements from standard input and
//! runs them against databases stored under a data directory.

use std::io::{BufRead, Write};

use clap::Parser as _;
use log::info;
use simplelog::{ConfigBuilder, LevelFilter, SimpleLogger};

use sqlit::{
    error::{Error, Result},
    sql::engine::{Engine as _, TextEngine},
    storage::disk::DiskEngine,
};

const PROMPT: &str = "sqlit> ";
const EXIT: &str = ".exit";
const COMMENT: &str = "--";

fn main() {
    if let Err(error) = Command::parse().run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

/// The sqlit command.
#[derive(clap::Parser)]
#[command(about = "A flat-file SQL console.", version)]
struct Command {
    /// Directory holding one subdirectory per database.
    #[arg(long, env = "SQLIT_DATA_DIR", default_value = "tmp")]
    data_dir: String,
    /// Delete all previously created databases before starting.
    #[arg(long)]
    clean: bool,
    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, env = "SQLIT_LOG_LEVEL", default_value = "warn")]
    log_level: String,
    /// Shorthand for --log-level debug.
    #[arg(long)]
    debug: bool,
}

impl Command {
    fn run(self) -> Result<()> {
        let level = match self.debug {
            true => LevelFilter::Debug,
            false => self
                .log_level
                .parse::<LevelFilter>()
                .map_err(|e| Error::Parse(format!("invalid log level {}: {}", self.log_level, e)))?,
        };
        let mut config = ConfigBuilder::new();
        if level != LevelFilter::Debug {
            config.add_filter_allow_str("sqlit");
        }
        SimpleLogger::init(level, config.build()).map_err(|e| Error::Internal(e.to_string()))?;

        let mut storage = DiskEngine::new(&self.data_dir)?;
        if self.clean {
            storage.clean()?;
            info!("cleaned data directory {}", self.data_dir);
        }
        let mut session = TextEngine::new(storage).session();

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let mut lines = Statements::new(stdin.lock());
        loop {
            write!(stdout, "{}", PROMPT)?;
            stdout.flush()?;
            let Some(input) = lines.next() else { break };
            match input? {
                Input::Exit => break,
                Input::Statement(sql) => match session.execute(&sql) {
                    Ok(result) => println!("{}", result),
                    Err(err) if err.is_fatal() => eprintln!("{}", err),
                    Err(err) => println!("{}", err),
                },
            }
        }
        println!("All done.");
        Ok(())
    }
}

/// A unit of console input
#[derive(Debug, PartialEq)]
enum Input {
    Statement(String),
    Exit,
}

/// Joins input lines into statements
///
/// Comments and carriage returns are stripped and blank lines ignored. Lines
/// accumulate until one ends with `;`.
struct Statements<R: BufRead> {
    reader: R,
}

impl<R: BufRead> Statements<R> {
    fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Iterator for Statements<R> {
    type Item = Result<Input>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut parts: Vec<String> = Vec::new();
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    return match parts.is_empty() {
                        true => None,
                        false => Some(Ok(Input::Statement(parts.join(" ")))),
                    };
                }
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }

            let line = line.split(COMMENT).next().unwrap_or_default();
            let line = line.replace('\r', "");
            let line = line.trim();
            if line.eq_ignore_ascii_case(EXIT) {
                return Some(Ok(Input::Exit));
            }
            if line.is_empty() {
                continue;
            }
            match line.strip_suffix(';') {
                Some(last) => {
                    parts.push(last.to_string());
                    return Some(Ok(Input::Statement(parts.join(" "))));
                }
                None => parts.push(line.to_string()),
            }
        }
    }
}
