use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use meta_parser::{CaptureClock, Extractor, SiteProfile};

/// Pins `captured_at` so saved pages extract to identical output.
const CAPTURED_AT_ENV: &str = "META_PARSER_CAPTURED_AT";

fn main() {
    if let Err(err) = run() {
        eprintln!("{}: {err}", env!("CARGO_PKG_NAME"));
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    let url = match args.next() {
        Some(flag) if is_help_flag(&flag) => {
            print_help(&program);
            return Ok(());
        }
        Some(flag) if is_version_flag(&flag) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(url) => url,
        None => return Err(format!("missing URL\n{}", usage(&program))),
    };

    let input = match args.next() {
        Some(path) if path == "-" => Input::Stdin,
        Some(path) => Input::File(path),
        None => Input::Stdin,
    };

    if let Some(extra) = args.next() {
        return Err(format!("unexpected argument: {extra}\n{}", usage(&program)));
    }

    let html = match input {
        Input::Stdin => read_stdin()?,
        Input::File(path) => read_file(&path)?,
    };

    let extractor = Extractor::new(SiteProfile::default(), capture_clock());
    let records = extractor.extract(&url, &html);
    let json = serde_json::to_string_pretty(&records)
        .map_err(|err| format!("failed to serialize JSON: {err}"))?;
    println!("{json}");
    Ok(())
}

enum Input {
    Stdin,
    File(String),
}

fn capture_clock() -> CaptureClock {
    match env::var(CAPTURED_AT_ENV) {
        Ok(value) if !value.trim().is_empty() => {
            CaptureClock::Fixed(meta_parser::normalize(value.as_str()))
        }
        _ => CaptureClock::System,
    }
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn is_version_flag(arg: &str) -> bool {
    arg == "-V" || arg == "--version"
}

fn read_file(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("failed to read '{path}': {err}"))
}

fn read_stdin() -> Result<String, String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|err| format!("failed to read stdin: {err}"))?;
    Ok(buf)
}

fn print_help(program: &str) {
    println!(
        "{}\n\nOptions:\n  -h, --help      Show this message\n  -V, --version   Print package version\n\n\
         Environment:\n  {CAPTURED_AT_ENV}   Pin captured_at (UNIX seconds or ISO date)",
        usage(program)
    );
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <URL> [HTML_FILE|-]\n\n\
         URL is the address the page was fetched from. Provide a path to a saved HTML file or \
         '-' to read from stdin. When no file is passed, stdin is used."
    )
}
