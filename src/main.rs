//! ragam CLI entry point

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ragam::config::cli::{AnalyzeArgs, MixArgs};
use ragam::config::{Cli, Command, Settings};
use ragam::export;
use ragam::pipeline::{AnalysisReport, AnalysisRequest, Pipeline};
use ragam::Result;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli);

    if let Err(e) = validate_inputs(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let settings = Settings::from_cli(&cli);

    match run(&cli.command, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Command, settings: Settings) -> Result<()> {
    if let Command::Hash(args) = command {
        let digest = ragam::cache::ContentHasher::new().hash(&args.input)?;
        println!("{}  {}", digest, args.input.display());
        return Ok(());
    }

    let show_progress = settings.show_progress;
    let pipeline = Pipeline::from_settings(settings);

    match command {
        Command::Separate(args) => {
            let spinner = spinner(show_progress, "Separating stems...");
            let result = pipeline.separate(&args.input);
            finish(spinner);
            let outcome = result?;

            let source = if outcome.cache_hit { "cache" } else { "model" };
            println!(
                "Stems for {} ({}, {:.2}s, key {})",
                args.input.display(),
                source,
                outcome.elapsed.as_secs_f64(),
                outcome.digest.short_hex()
            );
            for (kind, path) in outcome.stems.iter() {
                println!("  {:<7} {}", kind, path.display());
            }
            Ok(())
        }
        Command::Mix(args) => run_mix(&pipeline, args, show_progress),
        Command::Analyze(args) => run_analyze(&pipeline, args, show_progress),
        Command::Hash(_) => Ok(()),
    }
}

fn run_mix(pipeline: &Pipeline, args: &MixArgs, show_progress: bool) -> Result<()> {
    let spinner = spinner(show_progress, "Separating and mixing...");
    let result = pipeline.mix(&args.input, &args.stems);
    finish(spinner);
    let report = result?;

    for skipped in &report.outcome.skipped {
        eprintln!("Warning: {}", skipped);
    }
    match &report.outcome.output {
        Some(path) => println!("Mixed {} stem(s) into {}", report.outcome.mixed, path.display()),
        None => println!("No readable stems, nothing was mixed"),
    }
    Ok(())
}

fn run_analyze(pipeline: &Pipeline, args: &AnalyzeArgs, show_progress: bool) -> Result<()> {
    let spinner = spinner(show_progress, "Analyzing...");
    let result = pipeline.analyze(&AnalysisRequest {
        input: args.input.clone(),
        track: args.track.clone(),
    });
    finish(spinner);
    let report = result?;

    print_report(&report);

    if let Some(json_path) = &args.json {
        export::write_report(&report, json_path)?;
        println!();
        println!("Report written to {}", json_path.display());
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let raga = report.raga.raga;
    println!();
    println!("Track:   {} ({})", report.analyzed_path.display(), report.track);
    println!("Tonic:   {}", report.tonic);
    println!("Raga:    {} (overlap {}/7)", raga, report.raga.overlap);
    println!("  Arohanam:   {}", raga.arohanam);
    println!("  Avarohanam: {}", raga.avarohanam);
    println!();
    println!("Chords:  {}", report.chords.render_progression());
    println!();
    println!(
        "Transcription ({}, {}): {} notes",
        report.transcription.produced_by,
        report.transcription.backend,
        report.notes.len()
    );
    if report.notes.is_empty() {
        println!("  No pitched content found");
        return;
    }
    let shown = report.notes.len().min(report.display_limit);
    println!("  {}", report.swara_line());
    if shown < report.notes.len() {
        println!("  ... {} more", report.notes.len() - shown);
    }
    println!();
    for row in &report.notes[..shown] {
        println!("  {:<17} {:<4} {}", row.time_range(), row.western, row.swara);
    }
}

fn spinner(enabled: bool, message: &'static str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = if cli.quiet { "error" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn validate_inputs(cli: &Cli) -> std::result::Result<(), String> {
    let input = cli.command.input();
    if !input.is_file() {
        return Err(format!(
            "Input file does not exist: {}\n\n  Tip: Check the path is correct and accessible.\n  Examples:\n    ragam separate -i ./song.mp3\n    ragam analyze -i ./song.mp3 --track vocals",
            input.display()
        ));
    }

    if let Command::Analyze(args) = &cli.command {
        if let Some(parent) = args.json.as_ref().and_then(|p| p.parent()) {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(format!(
                    "Report directory does not exist: {}\n\n  Example: mkdir -p {}",
                    parent.display(),
                    parent.display()
                ));
            }
        }
    }

    Ok(())
}
