mod cli;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use audiosplice_core::{plan, run_with_progress, Config, ProgressEvent};
use indicatif::{HumanDuration, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::debug;

use crate::cli::build_cli;

fn default_output_dir(input_path: &Path) -> PathBuf {
    match input_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let input_path = matches
        .get_one::<PathBuf>("file_path")
        .expect("required argument");
    if !input_path.is_file() {
        return Err(anyhow!(
            "input file does not exist: {}",
            input_path.display()
        ));
    }

    let file_count = *matches.get_one::<usize>("count").expect("required argument");
    let offset = *matches
        .get_one::<Duration>("offset")
        .expect("required argument");
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| default_output_dir(input_path));
    let ramps = !matches.get_flag("no-ramps");
    let dry_run = matches.get_flag("dry-run");
    debug!(
        "count={file_count} offset={offset:?} ramps={ramps} output='{}'",
        output_dir.display()
    );

    let config = Config::builder(input_path, &output_dir, file_count, offset)
        .ramps(ramps)
        .build()
        .with_context(|| {
            format!(
                "failed to create configuration for '{}'",
                input_path.display()
            )
        })?;

    if dry_run {
        let plan = plan(&config)
            .with_context(|| format!("failed to plan files for '{}'", input_path.display()))?;

        println!(
            "Dry run: would generate {} file(s) of {} ({} frames, {} Hz, {}, {} channel(s)):",
            plan.outputs.len(),
            HumanDuration(plan.duration_per_file()),
            plan.frames_per_file,
            plan.sample_rate,
            plan.format,
            plan.channels
        );
        for path in &plan.outputs {
            println!("  {}", path.display());
        }

        return Ok(());
    }

    let progress = ProgressBar::new(0);
    progress.set_draw_target(ProgressDrawTarget::stderr());
    let bar_style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(bar_style);
    progress.set_message("Reading source...");
    progress.enable_steady_tick(Duration::from_millis(100));

    let output_label = config.output_dir.display().to_string();
    let progress_handle = progress.clone();
    let result = run_with_progress(config, move |event| match event {
        ProgressEvent::Start { total_files, .. } => {
            progress_handle.set_length(total_files as u64);
            progress_handle.set_message("Writing files...");
        }
        ProgressEvent::Writing { index, .. } => {
            progress_handle.set_position(index as u64 - 1);
            progress_handle.set_message(format!("Writing file {index}"));
        }
        ProgressEvent::Finish { files_written } => {
            progress_handle.set_position(files_written as u64);
            progress_handle.set_message(String::from("Completed"));
        }
    })
    .with_context(|| format!("failed to splice '{}'", input_path.display()));

    progress.finish_and_clear();

    let summary = result?;
    println!(
        "Successfully created {} files in {output_label}",
        summary.files_written
    );

    Ok(())
}
