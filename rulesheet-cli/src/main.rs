//! Rulesheet CLI
//!
//! Compiles a JSON style object into CSS.
//!
//! - rulesheet styles.json                      # CSS to stdout
//! - rulesheet --classes styles.json            # class and keyframes names as JSON
//! - rulesheet --options opts.json styles.json  # sheet and id options from a file
//! - cat styles.json | rulesheet -              # read stdin

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use rulesheet::{IdOptions, Jss, JssOptions, Style, StyleSheet, StyleSheetOptions, ToCssOptions};
use serde::Deserialize;

/// Rulesheet: compile nested style objects into CSS
#[derive(Parser, Debug)]
#[command(name = "rulesheet")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Compile a file
    rulesheet styles.json

    # Compile inline JSON
    rulesheet --styles '{"button": {"color": "red"}}'

    # Short class names with a prefix, no whitespace
    rulesheet --minify --prefix app- --no-format styles.json

    # Options file: {"id": {"minify": true}, "sheet": {"classNamePrefix": "app-"}}
    rulesheet --options opts.json styles.json

    # Print generated class names
    rulesheet --classes styles.json
"#)]
struct Cli {
    /// JSON file with the styles object, `-` for stdin
    #[arg(value_name = "FILE")]
    path: Option<PathBuf>,

    /// Styles object given inline instead of a file
    #[arg(long, value_name = "JSON", conflicts_with = "path")]
    styles: Option<String>,

    /// JSON file with `id` and `sheet` options; flags override it
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Strip line breaks and indentation
    #[arg(long)]
    no_format: bool,

    /// Generate short class names
    #[arg(long)]
    minify: bool,

    /// Prefix for generated class names
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,

    /// Render empty rules too, as a linked sheet would
    #[arg(long)]
    link: bool,

    /// Print class and keyframes names as JSON instead of CSS
    #[arg(long)]
    classes: bool,

    /// Print a rule count summary to stderr
    #[arg(long)]
    stats: bool,

    /// Log verbosity (-v warnings, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Contents of an `--options` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OptionsFile {
    id: IdOptions,
    sheet: StyleSheetOptions,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        _ => log::LevelFilter::Debug,
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

/// Read the styles source named on the command line.
fn read_source(cli: &Cli) -> anyhow::Result<String> {
    if let Some(styles) = &cli.styles {
        return Ok(styles.clone());
    }
    match &cli.path {
        Some(path) if path.as_os_str() != "-" => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        _ => {
            let mut text = String::new();
            let _ = io::stdin().read_to_string(&mut text).context("reading stdin")?;
            Ok(text)
        }
    }
}

fn read_options(cli: &Cli) -> anyhow::Result<OptionsFile> {
    let mut options = match &cli.options {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => OptionsFile::default(),
    };
    options.id.minify |= cli.minify;
    options.sheet.link |= cli.link;
    if let Some(prefix) = &cli.prefix {
        options.sheet.class_name_prefix = Some(prefix.clone());
    }
    Ok(options)
}

fn compile(cli: &Cli, source: &str) -> anyhow::Result<StyleSheet> {
    let styles = Style::from_json_str(source).context("parsing styles")?;
    let options = read_options(cli)?;
    log::debug!("compiling with {options:?}");
    let mut jss = Jss::with_options(JssOptions {
        id: Some(options.id),
        ..JssOptions::default()
    });
    Ok(jss.create_style_sheet(&styles, options.sheet))
}

fn render(cli: &Cli, sheet: &StyleSheet) -> anyhow::Result<String> {
    if cli.classes {
        let names = serde_json::json!({
            "classes": sheet.classes(),
            "keyframes": sheet.keyframes(),
        });
        return serde_json::to_string_pretty(&names).context("serializing names");
    }
    let options = ToCssOptions {
        format: !cli.no_format,
        ..ToCssOptions::default()
    };
    Ok(sheet.to_css_string(&options))
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let source = read_source(cli)?;
    let sheet = compile(cli, &source)?;
    if cli.stats {
        eprintln!(
            "{} {} rules, {} classes",
            "compiled".green().bold(),
            sheet.rules().len(),
            sheet.classes().len()
        );
    }
    render(cli, &sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("rulesheet").chain(args.iter().copied()))
    }

    #[test]
    fn test_compile_inline_json() {
        let cli = cli(&["--styles", r#"{"a": {"color": "red"}}"#, "--no-format"]);
        let output = run(&cli).unwrap();
        assert!(output.ends_with("{color:red;}"), "{output}");
    }

    #[test]
    fn test_classes_output() {
        let cli = cli(&["--styles", r#"{"a": {"color": "red"}}"#, "--classes", "--prefix", "x-"]);
        let output = run(&cli).unwrap();
        let names: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(names["classes"]["a"].as_str().unwrap().starts_with("x-a-"));
        assert_eq!(names["keyframes"], serde_json::json!({}));
    }

    #[test]
    fn test_options_file_shape() {
        let options: OptionsFile =
            serde_json::from_str(r#"{"id": {"minify": true}, "sheet": {"classNamePrefix": "app-", "link": true}}"#)
                .unwrap();
        assert!(options.id.minify);
        assert!(options.sheet.link);
        assert_eq!(options.sheet.class_name_prefix.as_deref(), Some("app-"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let cli = cli(&["--styles", "[1, 2]"]);
        assert!(run(&cli).is_err());
    }
}
