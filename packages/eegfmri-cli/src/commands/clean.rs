use crate::cli::Cli;
use crate::commands::list;
use crate::exit_codes;
use crate::selection;
use crate::terminal::TerminalPrompt;
use eegfmri_clean::{
    CleanError, CommandProcessor, Dataset, DatasetSummary, DerivativesLayout, Pipeline,
    PipelineConfig, ProgressEvent, StepStatus,
};

pub async fn execute(args: Cli) -> i32 {
    if !args.interactive && !args.has_step_flags() {
        eprintln!(
            "Error: Please provide at least one of the following arguments: \
             --interactive, --gradient, --bcg, --qc"
        );
        return exit_codes::INPUT_ERROR;
    }

    let config = match PipelineConfig::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let query = match selection::build_query(&args, &config) {
        Ok(q) => q,
        Err(e) => return fail(&e),
    };

    let dataset = match Dataset::index(&query) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let mut prompt = TerminalPrompt;
    let selection = match selection::resolve_steps(&args, &mut prompt) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let query = if args.interactive {
        match selection::refine_interactively(&mut prompt, &dataset, query) {
            Ok(q) => q,
            Err(e) => return fail(&e),
        }
    } else {
        query
    };

    let files = match dataset.select(&query) {
        Ok(f) if f.is_empty() => {
            return fail(&CleanError::NotFound(dataset.root().to_path_buf()));
        }
        Ok(f) => f,
        Err(e) => return fail(&e),
    };

    let steps = selection.steps();
    if args.dry_run {
        return list::execute(&files, &steps, args.json, args.quiet);
    }

    if !args.quiet {
        eprintln!("{}", DatasetSummary::from_files(&files));
        eprintln!("Found {} valid files.", files.len());
        let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
        eprintln!("Running [{}] on these files:", names.join(", "));
    }

    let layout = DerivativesLayout::new(
        selection::derivatives_root(&args, &config),
        config.output_extension.clone(),
    );
    let processor = CommandProcessor::new(config.steps.clone());

    let pipeline = match Pipeline::new(processor, layout, selection) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let quiet = args.quiet;
    let report = pipeline
        .run_with_progress(&files, |event| {
            if quiet {
                return;
            }
            match event {
                ProgressEvent::FileStarted { index, total, file } => {
                    eprintln!("[{}/{}] {}...", index + 1, total, file.path.display());
                }
                ProgressEvent::StepFinished { report, .. } => match report.status {
                    StepStatus::Failed => eprintln!(
                        "  Error: {} failed: {}",
                        report.step,
                        report.error.as_deref().unwrap_or("unknown error")
                    ),
                    StepStatus::Skipped => eprintln!("  Skipped {}", report.step),
                    StepStatus::Succeeded => {
                        log::info!("{} done in {:.1}s", report.step, report.elapsed_secs)
                    }
                },
                ProgressEvent::FileFinished { .. } => {}
            }
        })
        .await;

    if let Some(ref path) = args.report {
        if let Err(e) = report.write_json(path) {
            eprintln!("Error: Failed to write report '{}': {}", path.display(), e);
        }
    }

    if !args.quiet {
        eprintln!(
            "Batch complete: {}/{} succeeded, {}/{} failed, {:.1}s",
            report.succeeded(),
            report.total(),
            report.failed(),
            report.total(),
            report.elapsed_secs
        );
        if report.failed() > 0 {
            eprintln!(
                "Errors were logged to {}",
                pipeline.layout().error_log_path().display()
            );
        }
    }

    exit_codes::for_outcome(report.outcome())
}

fn fail(err: &CleanError) -> i32 {
    eprintln!("Error: {}", err);
    exit_codes::for_error(err)
}
