mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use audioshuffle_core::{plan, run_with_progress, Config, ProgressEvent, Stage};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::debug;

use crate::cli::{build_cli, DEFAULT_POSTFIX};

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Segmenting => "segmenting",
        Stage::Mixing => "mixing",
        Stage::Writing => "writing",
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let input_path = matches
        .get_one::<PathBuf>("file_path")
        .ok_or_else(|| anyhow!("missing FILE_PATH"))?;
    if !input_path.is_file() {
        return Err(anyhow!(
            "input file does not exist: {}",
            input_path.display()
        ));
    }

    let segment_length = *matches
        .get_one::<Duration>("length")
        .ok_or_else(|| anyhow!("missing --length"))?;
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let postfix = matches
        .get_one::<String>("postfix")
        .cloned()
        .unwrap_or_else(|| DEFAULT_POSTFIX.to_owned());

    let config = Config::builder(input_path, &output_dir, segment_length, postfix)
        .overwrite(matches.get_flag("overwrite"))
        .write_segments(matches.get_flag("segments"))
        .seed(matches.get_one::<u64>("seed").copied())
        .mix_name(matches.get_one::<String>("name").cloned())
        .build()
        .with_context(|| {
            format!(
                "failed to create configuration for '{}'",
                input_path.display()
            )
        })?;
    debug!("{config:?}");

    if matches.get_flag("dry-run") {
        let plan = plan(&config)
            .with_context(|| format!("failed to plan '{}'", input_path.display()))?;

        println!(
            "Dry run: {} segment(s) of {}, {} trailing frame(s) discarded",
            plan.layout.segment_count, config.segment_length, plan.layout.discarded_frames
        );
        println!("Would write {} file(s):", plan.segment_paths.len() + 1);
        for path in plan.segment_paths.iter().chain(std::iter::once(&plan.mix_path)) {
            println!("  {}", path.display());
        }
        return Ok(());
    }

    let progress = ProgressBar::new(0);
    progress.set_draw_target(ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));

    let progress_handle = progress.clone();
    let segment_length = config.segment_length;
    let result = run_with_progress(config, &mut |event: ProgressEvent| match event {
        ProgressEvent::Start { stage, total } => {
            progress_handle.reset();
            progress_handle.set_length(total as u64);
            progress_handle.set_message(stage_label(stage));
        }
        ProgressEvent::Advance { completed, .. } => progress_handle.set_position(completed as u64),
        ProgressEvent::Finish { stage } => {
            progress_handle.set_message(format!("{} done", stage_label(stage)));
        }
    })
    .with_context(|| format!("failed to shuffle '{}'", input_path.display()));

    progress.finish_and_clear();

    let summary = result?;
    println!(
        "Cut {} segment(s) of {} ({} trailing frame(s) discarded)",
        summary.layout.segment_count, segment_length, summary.layout.discarded_frames
    );
    for path in &summary.segment_paths {
        println!("  {}", path.display());
    }
    println!("Mix: {}", summary.mix_path.display());

    Ok(())
}
