use std::{
    fs::File,
    io::{self, BufRead, BufReader},
};

use anyhow::{anyhow, bail, Context};
use clap::{App, Arg, ArgMatches};
use log::LevelFilter;

use mana::{driver::Driver, source::ReadChars, Lexer, Parser, Settings, Token};

/// read an `OP=PRECEDENCE` pair such as `/=40`
fn parse_precedence(spec: &str) -> anyhow::Result<(char, i32)> {
    let mut chars = spec.chars();
    let op = chars
        .next()
        .ok_or_else(|| anyhow!("empty operator precedence"))?;
    if !op.is_ascii() {
        bail!("operator '{}' is not a single ASCII character", op);
    }
    let precedence = chars
        .as_str()
        .strip_prefix('=')
        .ok_or_else(|| anyhow!("expected OP=PRECEDENCE, found '{}'", spec))?;
    let precedence = precedence
        .parse()
        .with_context(|| format!("invalid precedence in '{}'", spec))?;
    Ok((op, precedence))
}

fn settings_from(matches: &ArgMatches) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    if let Some(specs) = matches.values_of("precedence") {
        for spec in specs {
            let (op, precedence) = parse_precedence(spec)?;
            settings = settings.with_operator(op, precedence);
        }
    }
    settings.allow_duplicate_params = !matches.is_present("strict-params");
    Ok(settings)
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let matches = App::new("mana")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(Arg::with_name("INPUT").help("source file to parse, stdin if omitted"))
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("don't print the prompt"),
        )
        .arg(
            Arg::with_name("dump-ast")
                .long("dump-ast")
                .help("print every parsed unit once input ends"),
        )
        .arg(
            Arg::with_name("tokens")
                .long("tokens")
                .help("print the token stream instead of parsing"),
        )
        .arg(
            Arg::with_name("precedence")
                .short("p")
                .long("precedence")
                .value_name("OP=N")
                .multiple(true)
                .number_of_values(1)
                .help("set the precedence of a binary operator"),
        )
        .arg(
            Arg::with_name("strict-params")
                .long("strict-params")
                .help("reject prototypes that repeat a parameter name"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("increase log verbosity"),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));
    let settings = settings_from(&matches)?;

    let (reader, from_stdin): (Box<dyn BufRead>, bool) = match matches.value_of("INPUT") {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("failed to open {}", path))?;
            (Box::new(BufReader::new(file)), false)
        }
        None => (Box::new(BufReader::new(io::stdin())), true),
    };
    let chars = ReadChars::new(reader);

    if matches.is_present("tokens") {
        let mut lexer = Lexer::new(chars);
        loop {
            let token = lexer.next_token();
            if token == Token::Eof {
                break;
            }
            println!("{}\t{}", lexer.token_start(), token);
        }
        return Ok(());
    }

    let mut driver = Driver::new(Parser::new(chars, settings), io::stderr());
    driver.interactive = from_stdin && !matches.is_present("quiet");
    let report = driver.run()?;

    if matches.is_present("dump-ast") {
        for unit in &report.units {
            println!("{}", unit);
        }
    }

    if !from_stdin && !report.errors.is_empty() {
        bail!("{} parse error(s)", report.errors.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_precedence;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_precedence_works() {
        assert_eq!(parse_precedence("/=40").unwrap(), ('/', 40));
        assert_eq!(parse_precedence("==5").unwrap(), ('=', 5));
        assert_eq!(parse_precedence("+=0").unwrap(), ('+', 0));
    }

    #[test]
    fn parse_precedence_rejects_garbage() {
        assert!(parse_precedence("").is_err());
        assert!(parse_precedence("/40").is_err());
        assert!(parse_precedence("/=high").is_err());
        assert!(parse_precedence("é=10").is_err());
    }
}
