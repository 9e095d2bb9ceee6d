use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use revlog_diff::{
    apply, diff, diff_text, summarize, unapply, ChangeLine, Delta, DiffLine, LineKind,
};
use revlog_history::{FileRevisionLog, RevisionLog};
use revlog_sdk::{History, RevertReport, Revisions, RevisionsConfig};
use revlog_types::{AggregateId, RevisionEntry};
use serde_json::Value;

use crate::cli::*;
use crate::session::{run_step, Script, StepOutput};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, format),
        Command::Patch(args) => cmd_patch(args),
        Command::History(args) => cmd_history(args, format),
        Command::Session(args) => cmd_session(args, format).await,
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let old = read_json(&args.old)?;
    let new = read_json(&args.new)?;
    let Some(delta) = diff(Some(&old), Some(&new)) else {
        println!("No changes.");
        return Ok(());
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&delta)?),
        OutputFormat::Text => print_delta(&delta, ""),
    }
    Ok(())
}

fn cmd_patch(args: PatchArgs) -> anyhow::Result<()> {
    let value = read_json(&args.value)?;
    let delta: Delta = serde_json::from_value(read_json(&args.delta)?)
        .with_context(|| format!("{} is not a delta", args.delta.display()))?;
    let patched = if args.reverse {
        unapply(&delta, Some(value))?
    } else {
        apply(&delta, Some(value))?
    };
    match patched {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("{}", "(deleted)".dimmed()),
    }
    Ok(())
}

fn cmd_history(args: HistoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let log = FileRevisionLog::open(&args.log_dir)?;
    let aggregate = AggregateId::new(args.aggregate.as_str())?;
    let Some(set) = log.read(&aggregate)? else {
        anyhow::bail!("no revisions for {aggregate} in {}", args.log_dir.display());
    };
    let entries = set.newest_first(args.limit);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            println!(
                "{} {} ({} entries)",
                "Aggregate".bold(),
                aggregate.to_string().cyan(),
                set.len()
            );
            for entry in &entries {
                print_entry(entry);
            }
        }
    }
    Ok(())
}

async fn cmd_session(args: SessionArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => RevisionsConfig::load(path)?,
        None => RevisionsConfig::default(),
    };
    let script: Script = serde_json::from_value(read_json(&args.script)?)
        .with_context(|| format!("{} is not a session script", args.script.display()))?;
    let revs = Revisions::new(config)?;

    for (index, step) in script.steps.iter().enumerate() {
        let label = format!("[{}]", index + 1).dimmed();
        match run_step(&revs, step).await {
            Ok(StepOutput::Mutated { op, ids }) => {
                println!("{label} {} {}", op.bold(), ids.join(", ").yellow());
            }
            Ok(StepOutput::Reverted(report)) => match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => {
                    println!("{label} {}", "revert".bold());
                    print_report(&report);
                }
            },
            Ok(StepOutput::History(history)) => match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&history)?),
                OutputFormat::Text => {
                    println!("{label} {}", "history".bold());
                    print_history(&history);
                }
            },
            Err(err) => println!("{label} {} {err}", "✗".red().bold()),
        }
    }
    Ok(())
}

fn print_history(history: &History) {
    let title = history.aggregate.get("title").and_then(Value::as_str).unwrap_or("");
    println!("  {} {}", "Aggregate".bold(), title.cyan());
    for entry in &history.entries {
        print_entry(entry);
    }
}

fn print_entry(entry: &RevisionEntry) {
    println!(
        "  {} {} {} {} {}",
        format!("#{}", entry.sequence).yellow().bold(),
        entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
        entry.action.to_string().green(),
        entry.target.kind,
        entry.target.id.to_string().cyan(),
    );
    print_delta(&entry.diff, "    ");
}

fn print_report(report: &RevertReport) {
    let undone: Vec<String> = report.undone.iter().map(|s| format!("#{s}")).collect();
    println!(
        "  {} Reverted {} on {} (truncated from #{})",
        "✓".green().bold(),
        undone.join(", ").yellow(),
        report.aggregate_id.to_string().cyan(),
        report.truncated_from,
    );
    for outcome in &report.outcomes {
        println!(
            "    {:?} {} {}",
            outcome.write,
            outcome.target.kind,
            outcome.target.id.to_string().cyan()
        );
    }
}

fn print_delta(delta: &Delta, indent: &str) {
    for line in summarize(delta) {
        print_line(&line, indent);
    }
}

fn print_line(line: &ChangeLine, indent: &str) {
    match line.kind {
        LineKind::Added => {
            let value = render(&line.new).green();
            println!("{indent}{} {} {value}", "+".green(), line.path);
        }
        LineKind::Removed => {
            let value = render(&line.old).red();
            println!("{indent}{} {} {value}", "-".red(), line.path);
        }
        LineKind::Changed => match (&line.old, &line.new) {
            (Some(Value::String(old)), Some(Value::String(new)))
                if old.contains('\n') || new.contains('\n') =>
            {
                let change = diff_text(old, new);
                println!(
                    "{indent}{} {} (+{} -{})",
                    "~".yellow(),
                    line.path,
                    change.additions(),
                    change.deletions()
                );
                for hunk in &change.hunks {
                    println!(
                        "{indent}  {}",
                        format!(
                            "@@ -{},{} +{},{} @@",
                            hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
                        )
                        .cyan()
                    );
                    for l in &hunk.lines {
                        match l {
                            DiffLine::Context(text) => println!("{indent}   {text}"),
                            DiffLine::Added(text) => {
                                println!("{indent}  {}", format!("+{text}").green())
                            }
                            DiffLine::Removed(text) => {
                                println!("{indent}  {}", format!("-{text}").red())
                            }
                        }
                    }
                }
            }
            (old, new) => println!(
                "{indent}{} {} {} → {}",
                "~".yellow(),
                line.path,
                render(old).red(),
                render(new).green()
            ),
        },
    }
}

fn render(value: &Option<Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "∅".into(),
    }
}
