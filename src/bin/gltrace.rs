//! gltrace: inspect GL call trace captures
//!
//! Parses a capture, then prints a summary, the frame list, the call list, or
//! a validation report, or writes framebuffer thumbnails as PNG files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gltrace::{
    validate_trace, Call, ImageThumbnailer, ParseOutcome, ParseTask, ParserConfig,
    SpinnerProgress, StateDelta, Trace, TraceParser,
};
use regex::Regex;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gltrace")]
#[command(about = "Inspect GL call trace captures")]
#[command(version)]
struct Cli {
    /// Enable debug logging (otherwise RUST_LOG is honored)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print headline numbers for a trace
    Summary {
        /// Path to the trace file
        trace: PathBuf,

        /// Output format: table, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
    /// List frames and their call ranges
    Frames {
        /// Path to the trace file
        trace: PathBuf,

        /// Output format: table, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
    /// List calls in time order
    Calls {
        /// Path to the trace file
        trace: PathBuf,

        /// Only show calls in this frame
        #[arg(long)]
        frame: Option<usize>,

        /// Only show calls whose text matches this regex
        #[arg(short, long)]
        grep: Option<String>,

        /// Show at most this many calls
        #[arg(short, long)]
        limit: Option<usize>,

        /// Include each call's state changes
        #[arg(long)]
        deltas: bool,

        /// Output format: table, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
    /// Check the parsed trace for inconsistencies
    Validate {
        /// Path to the trace file
        trace: PathBuf,
    },
    /// Write a PNG thumbnail for every call that captured the framebuffer
    Thumbnails {
        /// Path to the trace file
        trace: PathBuf,

        /// Directory to write PNG files into
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Thumbnail bounding box as WIDTHxHEIGHT
        #[arg(long, default_value = "256x256", value_parser = parse_size)]
        size: (u32, u32),
    },
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: u32 = w.parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h: u32 = h.parse().map_err(|_| format!("invalid height '{h}'"))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got '{s}'"));
    }
    Ok((w, h))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse `path` on a background thread, cancelling on Ctrl-C.
fn load_trace(path: &Path, parser: TraceParser) -> Result<Trace> {
    if !path.exists() {
        bail!("Trace file not found: {}", path.display());
    }

    let task = ParseTask::spawn(parser, path, SpinnerProgress::new())?;
    let cancel = task.cancel_token();
    // Ignore MultipleHandlers error (e.g., in test harnesses).
    let _ = ctrlc::set_handler(move || cancel.cancel());

    let outcome = task
        .join()
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    match outcome {
        ParseOutcome::Complete(trace) => Ok(trace),
        ParseOutcome::Cancelled => {
            eprintln!("Parse cancelled");
            process::exit(130);
        }
    }
}

fn run_summary(trace: &Trace, format: &str) -> Result<()> {
    let summary = trace.summary();
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let contexts: Vec<String> = summary.context_ids.iter().map(|c| c.to_string()).collect();
    let rows = vec![
        vec!["file".to_string(), summary.path.display().to_string()],
        vec!["size".to_string(), summary.file_size.to_string()],
        vec!["calls".to_string(), summary.calls.to_string()],
        vec!["frames".to_string(), summary.frames.to_string()],
        vec!["contexts".to_string(), contexts.join(",")],
        vec![
            "framebuffers".to_string(),
            summary.calls_with_framebuffer.to_string(),
        ],
        vec!["duration".to_string(), summary.duration.to_string()],
    ];
    print_table(&["field".to_string(), "value".to_string()], &rows);
    Ok(())
}

#[derive(Serialize)]
struct FrameRow {
    frame: usize,
    first_call: usize,
    last_call: usize,
    calls: usize,
    start_time: i64,
    duration: i64,
}

fn frame_rows(trace: &Trace) -> Vec<FrameRow> {
    trace
        .frames()
        .iter()
        .map(|frame| {
            let calls = trace.calls_in_frame(frame);
            let start_time = calls.first().map_or(0, Call::start_time);
            let end_time = calls
                .iter()
                .map(|c| c.start_time() + c.duration().max(0) as i64)
                .max()
                .unwrap_or(start_time);
            FrameRow {
                frame: frame.index(),
                first_call: frame.first_call(),
                last_call: frame.last_call(),
                calls: frame.len(),
                start_time,
                duration: end_time - start_time,
            }
        })
        .collect()
}

fn run_frames(trace: &Trace, format: &str) -> Result<()> {
    let rows = frame_rows(trace);
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let headers: Vec<String> = ["frame", "first", "last", "calls", "start", "duration"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.frame.to_string(),
                r.first_call.to_string(),
                r.last_call.to_string(),
                r.calls.to_string(),
                r.start_time.to_string(),
                r.duration.to_string(),
            ]
        })
        .collect();
    print_table(&headers, &table);
    eprintln!("\n{} frames", rows.len());
    Ok(())
}

#[derive(Serialize)]
struct CallRow<'a> {
    #[serde(flatten)]
    call: &'a Call,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_deltas: Option<&'a [StateDelta]>,
}

fn run_calls(
    trace: &Trace,
    frame: Option<usize>,
    grep: Option<&str>,
    limit: Option<usize>,
    deltas: bool,
    format: &str,
) -> Result<()> {
    let calls = match frame {
        Some(index) => {
            let frame = trace
                .frame(index)
                .with_context(|| format!("Frame {index} not found ({} frames)", trace.frames().len()))?;
            trace.calls_in_frame(frame)
        }
        None => trace.calls(),
    };

    let pattern = grep
        .map(Regex::new)
        .transpose()
        .context("Invalid --grep pattern")?;

    let selected: Vec<&Call> = calls
        .iter()
        .filter(|c| pattern.as_ref().map_or(true, |re| re.is_match(c.display_text())))
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if format == "json" {
        let rows: Vec<CallRow> = selected
            .iter()
            .map(|&call| CallRow {
                call,
                state_deltas: deltas.then(|| trace.state_deltas(call.index())),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut headers: Vec<String> = ["index", "start", "duration", "context", "fb", "call"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if deltas {
        headers.push("state".to_string());
    }

    let rows: Vec<Vec<String>> = selected
        .iter()
        .map(|call| {
            let mut row = vec![
                call.index().to_string(),
                call.start_time().to_string(),
                call.duration().to_string(),
                call.context_id().to_string(),
                if call.has_framebuffer() { "y" } else { "" }.to_string(),
                call.display_text().to_string(),
            ];
            if deltas {
                let changes: Vec<String> = trace
                    .state_deltas(call.index())
                    .iter()
                    .map(|d| format!("{}={}", d.path, serde_json::to_string(&d.value).unwrap_or_default()))
                    .collect();
                row.push(changes.join(" "));
            }
            row
        })
        .collect();
    print_table(&headers, &rows);
    eprintln!("\n{} calls shown", rows.len());
    Ok(())
}

fn run_validate(trace: &Trace) -> Result<()> {
    let result = validate_trace(trace);

    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
    for error in &result.errors {
        eprintln!("error: {error}");
    }

    if result.has_errors() {
        bail!(
            "{} failed validation with {} errors",
            trace.path().display(),
            result.errors.len()
        );
    }

    println!(
        "{}: valid ({} calls, {} frames, {} warnings)",
        trace.path().display(),
        trace.calls().len(),
        trace.frames().len(),
        result.warnings.len()
    );
    Ok(())
}

fn run_thumbnails(trace: &Trace, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut written = 0;
    for call in trace.calls() {
        if let Some(image) = call.thumbnail() {
            let path = output_dir.join(format!("call_{:06}.png", call.index()));
            image
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written += 1;
        }
    }

    println!("Wrote {written} thumbnails to {}", output_dir.display());
    Ok(())
}

const MAX_COLUMN_WIDTH: usize = 80;

fn print_table(headers: &[String], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("(no results)");
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, val) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(val.chars().count());
            }
        }
    }

    for w in &mut widths {
        *w = (*w).min(MAX_COLUMN_WIDTH);
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths.get(i).copied().unwrap_or(10)))
        .collect();
    println!("{}", header_line.join(" | "));

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    println!("{}", sep.join("-+-"));

    for row in rows {
        let row_line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let width = widths.get(i).copied().unwrap_or(10);
                let truncated = if v.chars().count() > width && width > 3 {
                    let head: String = v.chars().take(width - 3).collect();
                    format!("{head}...")
                } else {
                    v.clone()
                };
                format!("{truncated:width$}")
            })
            .collect();
        println!("{}", row_line.join(" | ").trim_end());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Summary { trace, format } => {
            let trace = load_trace(&trace, TraceParser::new())?;
            run_summary(&trace, &format)
        }
        Commands::Frames { trace, format } => {
            let trace = load_trace(&trace, TraceParser::new())?;
            run_frames(&trace, &format)
        }
        Commands::Calls {
            trace,
            frame,
            grep,
            limit,
            deltas,
            format,
        } => {
            let trace = load_trace(&trace, TraceParser::new())?;
            run_calls(&trace, frame, grep.as_deref(), limit, deltas, &format)
        }
        Commands::Validate { trace } => {
            let trace = load_trace(&trace, TraceParser::new())?;
            run_validate(&trace)
        }
        Commands::Thumbnails {
            trace,
            output_dir,
            size: (width, height),
        } => {
            let config = ParserConfig {
                thumbnail_width: width,
                thumbnail_height: height,
                ..Default::default()
            };
            let parser = TraceParser::new()
                .with_config(config)
                .with_thumbnails(ImageThumbnailer::default());
            let trace = load_trace(&trace, parser)?;
            run_thumbnails(&trace, &output_dir)
        }
    }
}
