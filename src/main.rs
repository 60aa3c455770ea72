// CLI binary entry point for m4a-info

mod cli;

use std::process;

use anyhow::Result;
use clap::Parser;

use cli::commands;
use cli::{Commands, Config, OutputFormatter};
use m4a_info::{M4aParser, ParserConfig};

fn init_logging(config: &Config) {
    let default_level = if config.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(config: &Config) -> Result<()> {
    let parser_config = match &config.config {
        Some(path) => ParserConfig::from_file(path)?,
        None => ParserConfig::default(),
    };
    let parser = M4aParser::new().with_config(parser_config);
    let formatter = OutputFormatter::new(config.format, config.quiet);

    match &config.command {
        Commands::Read {
            files,
            fields,
            output,
            with_cover,
        } => commands::command_read(
            &parser,
            files,
            fields.as_deref(),
            output.as_deref(),
            *with_cover,
            &formatter,
        ),
        Commands::Batch { directory, pattern } => {
            commands::command_batch(&parser, directory, pattern, &formatter)
        }
        Commands::Detect { files } => commands::command_detect(&parser, files, &formatter),
        Commands::ExportCover { file, output } => {
            commands::command_export_cover(&parser, file, output, &formatter)
        }
        Commands::Info { files, detailed } => commands::command_info(&parser, files, *detailed),
    }
}

fn main() {
    let config = Config::parse();
    init_logging(&config);

    if let Err(e) = run(&config) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
