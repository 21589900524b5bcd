use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use aqi_reader::parser::{self, PipelineConfig};
use aqi_reader::reading::{self, ClassifiedReading, StoredReading};
use aqi_reader::{Category, CsvStore, Rejection, SchemeKind, Settings};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "aqi_reader", about = "PM2.5 → AQI classifier for OCR and manual readings")]
struct Cli {
    /// CSV file readings are appended to
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    /// Classification scheme (overrides settings)
    #[arg(long, global = true, value_enum)]
    scheme: Option<SchemeKind>,
    /// Keep S and O as letters instead of reading them as 5 and 0
    #[arg(long, global = true)]
    no_ocr_correction: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify OCR text given as arguments, or read from stdin
    Classify {
        text: Vec<String>,
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
        /// Do not append to the CSV file
        #[arg(long)]
        dry_run: bool,
    },
    /// Classify every .txt OCR dump in a directory
    Batch {
        dir: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Type readings like "PM2.5 85 AQI 120"; "exit" stops
    Manual,
    /// Convert a PM2.5 concentration to AQI
    Convert {
        #[arg(allow_negative_numbers = true)]
        pm25: f64,
    },
    /// Show stored readings
    History {
        /// Only the last N rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show the most recent stored reading
    Latest {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(path) = cli.csv {
        settings.csv_path = path;
    }
    if let Some(scheme) = cli.scheme {
        settings.scheme = scheme;
    }
    if cli.no_ocr_correction {
        settings.ocr_correction = parser::OcrCorrection::Disabled;
    }
    debug!(settings = ?settings, "Settings loaded");
    let config = settings.pipeline().context("Invalid classification settings")?;

    match cli.command {
        Commands::Classify { text, json, dry_run } => {
            let raw = if text.is_empty() {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read stdin")?;
                buf
            } else {
                text.join(" ")
            };
            match parser::evaluate(&raw, &config, reading::now()) {
                Ok(record) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&record)?);
                    } else {
                        print_record(&record);
                    }
                    if !dry_run {
                        let store = open_store(&settings.csv_path)?;
                        store.append(&record)?;
                        info!(path = %store.path().display(), "Reading stored");
                    }
                }
                Err(reason) => report_rejection(&raw, &reason),
            }
        }
        Commands::Batch { dir, dry_run } => {
            let files = collect_text_files(&dir)?;
            if files.is_empty() {
                println!("No .txt files in {}", dir.display());
                return Ok(());
            }
            println!("Classifying {} files...", files.len());
            let outcome = classify_files(&files, &config, settings.batch_chunk)?;
            if !dry_run && !outcome.accepted.is_empty() {
                let store = open_store(&settings.csv_path)?;
                store.append_all(&outcome.accepted)?;
            }
            for (path, reason) in &outcome.rejected {
                warn!(file = %path.display(), %reason, "Rejected");
            }
            println!(
                "Accepted {}, rejected {}.",
                outcome.accepted.len(),
                outcome.rejected.len()
            );
        }
        Commands::Manual => {
            let store = open_store(&settings.csv_path)?;
            let saved = run_manual(&store, &config)?;
            println!("\n{} readings saved to {}", saved, store.path().display());
        }
        Commands::Convert { pm25 } => {
            let pm25 = match config.check_pm25(pm25) {
                Ok(v) => v,
                Err(reason) => bail!("{}", reason),
            };
            let aqi = config
                .table
                .compute_aqi(pm25)
                .with_context(|| format!("PM2.5 {} not covered by the breakpoint table", pm25))?;
            let category = config.scheme.classify(Some(aqi));
            if let Some(band) = config.table.band_for(pm25) {
                println!(
                    "Band:     {:.1}-{:.1} µg/m³ → {}-{}",
                    band.c_low, band.c_high, band.i_low, band.i_high
                );
            }
            println!("PM2.5:    {} µg/m³", pm25);
            println!("AQI:      {}", aqi);
            println!("Category: {} {}", category.indicator(), category);
        }
        Commands::History { limit } => {
            let store = open_store(&settings.csv_path)?;
            let rows = store.read_all()?;
            if rows.is_empty() {
                println!("No data yet");
                return Ok(());
            }
            let skip = limit.map(|n| rows.len().saturating_sub(n)).unwrap_or(0);
            println!(
                "{:>4} | {:<19} | {:>6} | {:>4} | {}",
                "#", "Timestamp", "PM2.5", "AQI", "Status"
            );
            println!("{}", "-".repeat(64));
            for (i, row) in rows.iter().enumerate().skip(skip) {
                print_row(i + 1, row);
            }
            println!("\n{} readings in {}", rows.len(), store.path().display());
        }
        Commands::Latest { json } => {
            let store = open_store(&settings.csv_path)?;
            match store.latest()? {
                Some(row) if json => println!("{}", serde_json::to_string_pretty(&row)?),
                Some(row) => print_row(store.count()?, &row),
                None => println!("No data yet"),
            }
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}

fn open_store(path: &Path) -> anyhow::Result<CsvStore> {
    CsvStore::open(path).with_context(|| format!("Failed to open store {}", path.display()))
}

fn print_record(r: &ClassifiedReading) {
    println!("Timestamp: {}", r.timestamp);
    println!("PM2.5:     {} µg/m³", r.pm25);
    println!("AQI:       {}", r.aqi);
    println!("Status:    {} {}", r.status.indicator(), r.status);
}

fn print_row(n: usize, row: &StoredReading) {
    let marker = row
        .category()
        .unwrap_or(Category::Unknown)
        .indicator();
    println!(
        "{:>4} | {:<19} | {:>6} | {:>4} | {} {}",
        n, row.timestamp, row.pm25, row.aqi, marker, row.status
    );
}

fn report_rejection(raw: &str, reason: &Rejection) {
    debug!(raw = %raw.trim(), "Rejected input");
    println!("REJECTED: invalid or unreliable reading ({})", reason);
}

fn collect_text_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
        })
        .collect();
    files.sort();
    Ok(files)
}

struct BatchOutcome {
    accepted: Vec<ClassifiedReading>,
    rejected: Vec<(PathBuf, Rejection)>,
}

fn classify_files(
    files: &[PathBuf],
    config: &PipelineConfig,
    chunk_size: usize,
) -> anyhow::Result<BatchOutcome> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut outcome = BatchOutcome {
        accepted: Vec::new(),
        rejected: Vec::new(),
    };

    for chunk in files.chunks(chunk_size.max(1)) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|path| (path, parser::evaluate_file(path, config, reading::now())))
            .collect();

        for (path, result) in results {
            match result {
                Ok(record) => outcome.accepted.push(record),
                Err(reason) => outcome.rejected.push((path.clone(), reason)),
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(outcome)
}

fn run_manual(store: &CsvStore, config: &PipelineConfig) -> anyhow::Result<usize> {
    println!("Type values like: PM2.5 85 AQI 120  (AQI optional)");
    println!("Type 'exit' to stop\n");

    let stdin = io::stdin();
    let mut saved = 0;
    let mut lines = stdin.lock().lines();
    loop {
        print!("Enter reading: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") {
            println!("Stopping input.");
            break;
        }
        if line.is_empty() {
            continue;
        }
        match parser::parse_manual(line, config, reading::now()) {
            Ok(record) => {
                store.append(&record)?;
                saved += 1;
                println!(
                    "ACCEPTED: {} | PM2.5 {} | AQI {} | {}",
                    record.timestamp, record.pm25, record.aqi, record.status
                );
            }
            Err(reason) => report_rejection(line, &reason),
        }
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_file_does_not_sink_the_batch() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "PM2.5: 85").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"\xff\xfe").unwrap();
        std::fs::write(dir.path().join("c.txt"), "PM2.5 20").unwrap();

        let files = collect_text_files(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        let outcome = classify_files(&files, &PipelineConfig::default(), 2).unwrap();

        assert_eq!(outcome.accepted.len(), 2);
        assert_eq!(outcome.rejected.len(), 1);
        let (path, reason) = &outcome.rejected[0];
        assert!(path.ends_with("b.txt"));
        assert!(matches!(reason, Rejection::Unreadable(_)));
    }
}
