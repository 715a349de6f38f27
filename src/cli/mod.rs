//! explain-viz CLI Module
//!
//! Command-line interface for previewing, rendering and inspecting explanations.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dashboard::{DashboardConfig, DashboardRunner};
use crate::explanation::ExplanationRecord;
use crate::ranking::RankingPolicy;
use crate::visual::FigureBackend;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "explain-viz")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Preview model explanations as charts")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a local dashboard hosting explanation files
    Serve {
        /// Explanation JSON files to register
        files: Vec<PathBuf>,

        /// Dashboard port (random free port when omitted)
        #[arg(short, long)]
        port: Option<u16>,

        /// Dashboard host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Print the routed figure for one view of an explanation
    Render {
        /// Explanation JSON file
        file: PathBuf,

        /// Detail key; the overall summary when omitted
        #[arg(short, long)]
        key: Option<usize>,
    },

    /// Show metadata and the top-ranked features of an explanation
    Inspect {
        /// Explanation JSON file
        file: PathBuf,
    },
}

fn load_record(path: &Path) -> anyhow::Result<ExplanationRecord> {
    ExplanationRecord::from_path(path)
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
}

// ─── Render ────────────────────────────────────────────────────────────────────

pub fn cmd_render(file: &Path, key: Option<usize>) -> anyhow::Result<()> {
    let record = load_record(file)?;
    match record.visualize(key, FigureBackend)? {
        Some(figure) => println!("{}", serde_json::to_string_pretty(&figure)?),
        None => eprintln!("  {}", dim("no visualization for this key")),
    }
    Ok(())
}

// ─── Inspect ───────────────────────────────────────────────────────────────────

pub fn cmd_inspect(file: &Path) -> anyhow::Result<()> {
    let record = load_record(file)?;

    section("Explanation");
    println!("  {:<12} {}", muted("Name"), record.name().unwrap_or("-"));
    println!("  {:<12} {}", muted("Type"), record.explanation_type());
    println!("  {:<12} {}", muted("Features"), record.feature_names().len());
    println!(
        "  {:<12} {}",
        muted("Details"),
        record.raw().specific.as_ref().map_or(0, Vec::len)
    );

    section("Features");
    for (name, ty) in record.feature_names().iter().zip(record.feature_types()) {
        println!("  {:<32} {}", name, muted(ty.as_str()));
    }

    if let Ok(overall) = record.overall() {
        section("Top features");
        let ranked = overall.rank(&RankingPolicy::new(Some(15), false));
        for (name, score) in ranked.label_strings().iter().zip(&ranked.scores) {
            println!("  {:<32} {:>10.4}", name, score);
        }
    }

    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

const READY_ATTEMPTS: usize = 50;
const READY_INTERVAL: Duration = Duration::from_millis(100);

pub fn cmd_serve(files: &[PathBuf], host: &str, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = DashboardConfig::local().with_host(host);
    config.port = port;

    let mut runner = DashboardRunner::new(config)?;
    let mut links = Vec::new();
    for file in files {
        let record = load_record(file)?;
        let label = record
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| file.display().to_string());
        let id = runner.register(record);
        links.push((label, id));
    }

    runner.start()?;
    let ready = (0..READY_ATTEMPTS).any(|_| {
        if runner.ping() {
            return true;
        }
        std::thread::sleep(READY_INTERVAL);
        false
    });
    if !ready {
        runner.stop();
        anyhow::bail!("dashboard at {} did not become reachable", runner.base_url());
    }

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Explanation Dashboard".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Index  ", &format!("{}/", runner.base_url())));
    line_box(&kv("Health ", &format!("{}/api/health", runner.base_url())));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    for (label, id) in &links {
        step_ok(&format!("{} {}", label, dim(&runner.display_link(id, None))));
    }

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(tokio::signal::ctrl_c())?;

    tracing::info!("Shutdown signal received, stopping dashboard");
    if !runner.stop() {
        anyhow::bail!("dashboard thread did not stop in time");
    }
    Ok(())
}

pub fn show_help() {
    section("Commands");

    let cmds: &[(&str, &str)] = &[
        ("explain-viz serve a.json b.json", "Host explanations on a local dashboard"),
        ("explain-viz serve -p 7001 a.json", "Serve on a fixed port"),
        ("explain-viz render a.json", "Overall top-15 figure as JSON"),
        ("explain-viz render a.json -k 3", "Figure for detail key 3"),
        ("explain-viz inspect a.json", "Metadata and feature ranking"),
    ];

    for (cmd, desc) in cmds {
        println!("  {:<40} {}", cmd.white(), muted(desc));
    }

    println!();
}
