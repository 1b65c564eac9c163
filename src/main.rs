use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use hashtally::cli::Cli;
use hashtally::inventory::{HashComputer, Pipeline};
use hashtally::logging::init_logging;
use hashtally::progress::{print_settings, print_summary, ConsoleReporter};
use hashtally::settings::Settings;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("\nError: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let sessions_root = settings.sessions_root(cli.sessions_dir.as_deref());

    let pipeline = Pipeline::prepare(cli.to_request(), &sessions_root).with_context(|| {
        if cli.is_resume() {
            format!("Cannot resume session {}", cli.target.display())
        } else {
            format!("Cannot start session for {}", cli.target.display())
        }
    })?;

    let verbose = pipeline.session().verbose;
    init_logging(verbose);
    print_settings(pipeline.session(), pipeline.paths());

    let reporter = ConsoleReporter::new(verbose);
    let mut pipeline = pipeline
        .with_computer(HashComputer::with_chunk_size(settings.chunk_size))
        .with_progress_callback(move |event| reporter.handle(event));

    let summary = pipeline.run().context("Run aborted")?;
    print_summary(&summary, pipeline.paths());
    Ok(())
}
