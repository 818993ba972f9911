// src/main.rs

use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_crawl::{
    api_key_from_env, retrieve_page_full, AppError, CommandLineInput, Crawler, NotionHttpClient,
    OperationTable,
};
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration.
///
/// Console output goes to stderr so stdout carries nothing but the JSON result.
fn setup_logging(verbose: bool) -> Result<(), AppError> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notion_crawl.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )
        .map_err(|e| AppError::Logging(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| AppError::Logging(e.to_string()))?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let api_key = api_key_from_env()?;
    let client = NotionHttpClient::new(&api_key)?;
    let crawler = Crawler::new(Arc::new(client), Arc::new(OperationTable::notion()));

    let body = retrieve_page_full(&crawler, &cli.to_params()).await;
    let rendered = if cli.compact {
        serde_json::to_string(&body)?
    } else {
        serde_json::to_string_pretty(&body)?
    };
    println!("{}", rendered);

    if body.get("status").and_then(|s| s.as_str()) == Some("error") {
        std::process::exit(1);
    }
    Ok(())
}
