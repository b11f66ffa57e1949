use icu_precompile::{
    compile_ast, from_json::from_json, generate_type_ast, json, parse_with_options, CompileError,
    Element, ParseError, ParserOptions,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use std::io::{self, Read};
use std::process::ExitCode;

const USAGE: &str = "usage: icuc [--types | --ast [--pretty]] [--locale TAG] [--from-ast] < message";

/// Locale used when neither `--locale` nor `ICUC_LOCALE` is given.
const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Compile,
    Types,
    Ast,
}

#[derive(Debug)]
struct Config {
    mode: Mode,
    locale: String,
    pretty: bool,
    from_ast: bool,
}

impl Config {
    fn from_args(args: impl Iterator<Item = String>) -> Result<Config, String> {
        let mut config = Config {
            mode: Mode::Compile,
            locale: std::env::var("ICUC_LOCALE").unwrap_or_else(|_| DEFAULT_LOCALE.to_string()),
            pretty: false,
            from_ast: false,
        };

        let mut args = args.peekable();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--types" => config.mode = Mode::Types,
                "--ast" => config.mode = Mode::Ast,
                "--pretty" => config.pretty = true,
                "--from-ast" => config.from_ast = true,
                "--locale" => match args.next() {
                    Some(locale) => config.locale = locale,
                    None => return Err("--locale needs a value".to_string()),
                },
                "-h" | "--help" => return Err(String::new()),
                other => return Err(format!("unknown argument '{}'", other)),
            }
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{}", message);
            }
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };
    debug!(?config, "starting");

    let mut input = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut input) {
        eprintln!("failed to read stdin: {}", err);
        return ExitCode::FAILURE;
    }

    let elements = if config.from_ast {
        match from_json(&input) {
            Ok(elements) => elements,
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::FAILURE;
            }
        }
    } else {
        match parse_message(&input, config.mode) {
            Ok(elements) => elements,
            Err(err) => {
                report_parse_error(&input, &err);
                return ExitCode::FAILURE;
            }
        }
    };

    match config.mode {
        Mode::Compile => match compile_ast(&elements, &config.locale) {
            Ok(source) => println!("{}", source),
            Err(CompileError::Parse(err)) => {
                report_parse_error(&input, &err);
                return ExitCode::FAILURE;
            }
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::FAILURE;
            }
        },
        Mode::Types => println!("{}", generate_type_ast(&elements)),
        Mode::Ast if config.pretty => println!("{}", json::to_json_pretty(&elements)),
        Mode::Ast => println!("{}", json::to_json(&elements)),
    }

    ExitCode::SUCCESS
}

/// The compilers accept select/plural without `other`; `--ast` shows the
/// tree exactly as the default parser would.
fn parse_message(input: &str, mode: Mode) -> Result<Vec<Element>, ParseError> {
    let options = ParserOptions {
        requires_other_clause: mode == Mode::Ast,
        ..ParserOptions::default()
    };
    parse_with_options(input, options)
}

fn report_parse_error(input: &str, err: &ParseError) {
    let lines: Vec<&str> = input.lines().collect();
    let line_num = err.begin.line;
    let line_text = lines.get(line_num).unwrap_or(&"");

    eprintln!("ERROR AT LINE {}:", line_num + 1);
    eprintln!("{}", line_text);
    eprintln!("{}", underline(line_text, err));
    eprintln!("{} ({})", err.message, err.code);
    eprintln!();
}

/// Caret and underscores under the error span. Columns count characters.
fn underline(line_text: &str, err: &ParseError) -> String {
    let line_len = line_text.chars().count();
    let start_col = err.begin.column;
    let end_col = if err.begin.line == err.end.line && err.end.column > err.begin.column {
        err.end.column
    } else if start_col < line_len {
        // Point error or spans multiple lines: underline to end of line
        line_len
    } else {
        start_col + 1
    };

    let mut underline = " ".repeat(start_col);
    underline.push('^');
    if end_col > start_col + 1 {
        underline.push_str(&"_".repeat(end_col - start_col - 1));
    }
    underline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_flags() {
        let config = Config::from_args(args(&["--ast", "--pretty", "--locale", "de-CH"])).unwrap();
        assert_eq!(config.mode, Mode::Ast);
        assert!(config.pretty);
        assert_eq!(config.locale, "de-CH");
        assert!(!config.from_ast);
    }

    #[test]
    fn rejects_unknown_and_incomplete_flags() {
        assert!(Config::from_args(args(&["--frobnicate"])).is_err());
        assert!(Config::from_args(args(&["--locale"])).is_err());
    }

    #[test]
    fn compile_modes_accept_missing_other() {
        assert!(parse_message("{g, select, a {A}}", Mode::Compile).is_ok());
        assert!(parse_message("{g, select, a {A}}", Mode::Types).is_ok());
        assert!(parse_message("{g, select, a {A}}", Mode::Ast).is_err());
    }

    #[test]
    fn underline_lines_up_after_multibyte_text() {
        let input = "né {name, foo}";
        let err = parse_message(input, Mode::Compile).unwrap_err();
        assert_eq!(underline(input, &err), "          ^__");

        let input = "ü {name";
        let err = parse_message(input, Mode::Compile).unwrap_err();
        assert_eq!(underline(input, &err), "  ^____");
    }
}
