//! StopAnyAds CLI - stop AnyDesk and wipe its data folder

use anyhow::Context;
use clap::Parser;
use std::io;
use stopanyads::cli::Args;
use stopanyads::target::APP_TITLE;
use stopanyads::{
    format_output, logging, prompt, Orchestrator, OutputFormat, ProcessNameSet, Report,
    TargetDirectory,
};
use tracing::warn;

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    logging::init_tracing(args.effective_log_level())?;

    if !cfg!(windows) {
        warn!(platform = std::env::consts::OS, "{} is intended for Windows", APP_TITLE);
    }

    let output_format = OutputFormat::from_json_flag(args.json);
    let target = TargetDirectory::resolve().context("cannot locate the data folder")?;
    let mut orchestrator = Orchestrator::system(ProcessNameSet::anydesk(), target);

    if args.dry_run {
        let preview = orchestrator.preview();
        println!("{}", format_output(&Report::Preview(preview), output_format));
        return Ok(());
    }

    if !args.yes {
        let confirmed = prompt::acknowledge_and_confirm(&mut io::stdin().lock(), &mut io::stderr())
            .context("failed to read the answer")?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let task = orchestrator.spawn().context("failed to start the reset")?;
    for event in task.events() {
        if output_format.streams_progress() {
            println!("{}", event.line());
        }
    }
    let report = task.join()?;

    if output_format.streams_progress() {
        println!();
    }
    println!("{}", format_output(&Report::Reset(report), output_format));
    Ok(())
}
