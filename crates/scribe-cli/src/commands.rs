use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use scribe_diff::{compute_diff, preview_text, ChangePreview, OpKind};
use scribe_plan::{
    EditPlan, ExecutorConfig, LocalFileStore, OperationStatus, PlanExecutor, PlanReport,
    ProjectStructure,
};
use scribe_player::ReplayOutcome;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Diff(args) => cmd_diff(args, cli.format).await,
        Command::Apply(args) => {
            let json = read_text(&args.plan).await?;
            let plan = EditPlan::from_json(&json)
                .with_context(|| format!("parsing {}", args.plan.display()))?;
            run_plan(plan, &args.run, cli.format).await
        }
        Command::Scaffold(args) => {
            let json = read_text(&args.structure).await?;
            let structure = ProjectStructure::from_json(&json)
                .with_context(|| format!("parsing {}", args.structure.display()))?;
            println!("Scaffolding {}", structure.name.bold());
            run_plan(structure.into_plan(), &args.run, cli.format).await
        }
        Command::Config(args) => cmd_config(args),
    }
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

/// Settings file (or defaults) with command-line overrides applied.
///
/// Animation is off unless `--animate` is given: a headless run has no live
/// view to animate into.
fn effective_config(run: &RunArgs) -> anyhow::Result<ExecutorConfig> {
    let mut config = match &run.config {
        Some(path) => ExecutorConfig::load(path)?,
        None => ExecutorConfig::default(),
    };
    config.animation.enabled = run.animate;
    if let Some(speed) = run.speed {
        config.animation.speed = speed;
    }
    if run.stop_on_error {
        config.continue_on_error = false;
    }
    Ok(config)
}

async fn execute(plan: &EditPlan, run: &RunArgs) -> anyhow::Result<PlanReport> {
    let config = effective_config(run)?;
    let store = Arc::new(LocalFileStore::new(&run.root));
    let executor = PlanExecutor::new(store, config);
    Ok(executor.execute(plan).await?)
}

async fn run_plan(plan: EditPlan, run: &RunArgs, format: OutputFormat) -> anyhow::Result<()> {
    if let Some(explanation) = &plan.explanation {
        if format == OutputFormat::Text {
            println!("{}", explanation.italic());
        }
    }

    let report = execute(&plan, run).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    if !report.is_success() {
        anyhow::bail!("{} of {} operation(s) failed", report.failed(), plan.len());
    }
    Ok(())
}

fn print_report(report: &PlanReport) {
    for op in &report.operations {
        match &op.status {
            OperationStatus::Applied { outcome } => {
                let note = match outcome {
                    Some(ReplayOutcome::FallbackApplied) => " (full write)".dimmed().to_string(),
                    _ => String::new(),
                };
                println!(
                    "  {} {:<14} {} {}{}",
                    "✓".green(),
                    op.kind.to_string().cyan(),
                    op.path,
                    format!("+{} -{}", op.additions, op.deletions).dimmed(),
                    note
                );
            }
            OperationStatus::Failed { reason } => {
                println!(
                    "  {} {:<14} {} {}",
                    "✗".red(),
                    op.kind.to_string().cyan(),
                    op.path,
                    reason.red()
                );
            }
        }
    }
    println!(
        "{} applied, {} failed in {:.2?}",
        report.applied().to_string().green().bold(),
        report.failed().to_string().red().bold(),
        report.elapsed
    );
}

async fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let old = tokio::fs::read(&args.old)
        .await
        .with_context(|| format!("reading {}", args.old.display()))?;
    let new = tokio::fs::read(&args.new)
        .await
        .with_context(|| format!("reading {}", args.new.display()))?;

    let (Ok(old_text), Ok(new_text)) = (std::str::from_utf8(&old), std::str::from_utf8(&new))
    else {
        return print_binary_diff(old.len(), new.len(), format);
    };

    let diff = compute_diff(old_text, new_text);
    let preview = preview_text(old_text, new_text);

    if format == OutputFormat::Json {
        let value = serde_json::json!({ "ops": diff, "preview": preview });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if diff.is_identity() {
        println!("No changes.");
        return Ok(());
    }

    println!("{}", "Edit sequence:".bold());
    for op in &diff {
        let chars = op.char_len();
        match op.kind {
            OpKind::Equal => println!("  {} {chars} chars", "keep".dimmed()),
            OpKind::Delete => println!("  {} {chars} chars: {:?}", "delete".red(), op.text),
            OpKind::Insert => println!("  {} {chars} chars: {:?}", "insert".green(), op.text),
        }
    }

    print_preview(&preview);
    Ok(())
}

fn print_binary_diff(
    old_bytes: usize,
    new_bytes: usize,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "binary": true,
                "old_bytes": old_bytes,
                "new_bytes": new_bytes,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => println!(
            "{} ({old_bytes} -> {new_bytes} bytes)",
            "Binary content; no edit sequence.".yellow()
        ),
    }
    Ok(())
}

fn print_preview(preview: &ChangePreview) {
    println!(
        "{} {} {}",
        "Lines:".bold(),
        format!("+{}", preview.stats.additions).green(),
        format!("-{}", preview.stats.deletions).red()
    );
    for hunk in &preview.hunks {
        println!("{}", hunk.header.cyan());
        for line in &hunk.lines {
            match line.kind {
                OpKind::Equal => println!(" {}", line.text),
                OpKind::Insert => println!("{}", format!("+{}", line.text).green()),
                OpKind::Delete => println!("{}", format!("-{}", line.text).red()),
            }
        }
    }
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ExecutorConfig::load(path)?,
        None => ExecutorConfig::default(),
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}
