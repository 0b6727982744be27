// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! impetus CLI: anytime top-k search over an impact index.
//!
//! ```bash
//! # Exhaustive evaluation, 8 workers, top 10 per query
//! impetus -q queries.txt -t 8
//!
//! # Anytime: cap work at 10% of the collection size per query
//! impetus -q topics.txt -r 10 -k 20
//! ```
//!
//! Reads the four index files from the working directory (or wherever the
//! path flags point), runs every query, and writes a TREC run file plus a
//! per-query stats file. Startup failures abort with a distinguishable exit
//! code; per-query failures degrade to empty results and the run continues.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use impetus::limits::MAX_TOP_K;
use impetus::{channel, codecs, render_stats, render_stats_line, render_trec_run};
use impetus::{Config, IndexView};

#[derive(Parser)]
#[command(
    name = "impetus",
    about = "Anytime impact-ordered top-k search over a precomputed index",
    version
)]
struct Cli {
    /// File of queries: one per line (id first), or a topic file
    #[arg(short = 'q', long = "queries")]
    queries: PathBuf,

    /// Number of worker threads (one query per thread)
    #[arg(short = 't', long = "threads", default_value = "1")]
    threads: usize,

    /// Number of results to return per query
    #[arg(short = 'k', long = "top-k", default_value = "10")]
    top_k: usize,

    /// Maximum number of postings to process per query (0 = no absolute cap)
    #[arg(short = 'R', long = "budget", default_value = "0")]
    budget: u64,

    /// Postings cap as a percentage of the collection size (overrides --budget)
    #[arg(short = 'r', long = "budget-percent", default_value = "100")]
    budget_percent: u64,

    /// Accumulator width exponent: the score array is split into 2^w blocks
    #[arg(short = 'w', long = "width", default_value = "7")]
    width: u32,

    /// Treat query text as whitespace-separated, pre-casefolded tokens
    #[arg(short = 'a', long = "raw-parser")]
    raw_parser: bool,

    /// Run tag written into the TREC output
    #[arg(long = "run-name", default_value = "impetus")]
    run_name: String,

    /// Primary key (document identifier) file
    #[arg(long = "doclist", default_value = "CIdoclist.bin")]
    doclist: PathBuf,

    /// Vocabulary triple file
    #[arg(long = "vocab", default_value = "CIvocab.bin")]
    vocab: PathBuf,

    /// Vocabulary term string file
    #[arg(long = "terms", default_value = "CIvocab_terms.bin")]
    terms: PathBuf,

    /// Postings file
    #[arg(long = "postings", default_value = "CIpostings.bin")]
    postings: PathBuf,

    /// Where to write the TREC run
    #[arg(long = "output", default_value = "ranking.txt")]
    output: PathBuf,

    /// Where to write per-query statistics
    #[arg(long = "stats", default_value = "stats.txt")]
    stats: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config {
        threads: cli.threads,
        top_k: cli.top_k,
        posting_budget_absolute: cli.budget,
        posting_budget_ratio_pct: cli.budget_percent,
        accumulator_width_exp: cli.width,
        raw_parser: cli.raw_parser,
        run_name: cli.run_name.clone(),
    };
    if let Err(why) = config.validate() {
        eprintln!("error: {} (top-k limit is {})", why, MAX_TOP_K);
        return ExitCode::from(1);
    }

    let total_started = Instant::now();

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Loading index...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let index = match IndexView::open(&cli.doclist, &cli.vocab, &cli.terms, &cli.postings) {
        Ok(index) => index,
        Err(err) => {
            spinner.finish_and_clear();
            eprintln!("error: {}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };
    let codex = match codecs::select(index.codec_tag()) {
        Ok(codex) => codex,
        Err(err) => {
            spinner.finish_and_clear();
            eprintln!("error: {}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };
    spinner.finish_with_message(format!(
        "Loaded {} documents, {} terms, codec {}-D{}",
        index.document_count(),
        index.term_count(),
        codex.name,
        codex.d_ness
    ));

    let queries = match channel::read_queries(&cli.queries) {
        Ok(queries) => queries,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };
    println!(
        "Processing {} queries with {} thread(s), budget {} postings",
        queries.len(),
        config.threads,
        config.postings_budget(index.document_count())
    );

    let progress = ProgressBar::new(queries.len() as u64);
    let search_started = Instant::now();
    let per_worker = match impetus::run_pool(&index, &queries, &config, Some(&progress)) {
        Ok(per_worker) => per_worker,
        Err(err) => {
            progress.finish_and_clear();
            eprintln!("error: {}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };
    progress.finish_and_clear();
    let search_time = search_started.elapsed();

    // Merge per-worker results: the set of (query, ranking) pairs is complete;
    // line order reflects worker identity and dispatch order.
    let mut run = String::new();
    let mut stats_lines = Vec::new();
    let mut total_postings = 0u64;
    for record in per_worker.iter().flatten() {
        render_trec_run(&mut run, record, &index, &config.run_name);
        let mut line = String::new();
        render_stats_line(&mut line, record);
        stats_lines.push(line);
        total_postings += record.postings_processed;
    }

    if let Err(err) = std::fs::write(&cli.output, &run) {
        eprintln!("error: cannot write {}: {}", cli.output.display(), err);
        return ExitCode::from(2);
    }
    if let Err(err) = std::fs::write(&cli.stats, render_stats(stats_lines.iter())) {
        eprintln!("error: cannot write {}: {}", cli.stats.display(), err);
        return ExitCode::from(2);
    }

    println!(
        "Done: {} queries, {} postings processed, search {:?}, total {:?}",
        queries.len(),
        total_postings,
        search_time,
        total_started.elapsed()
    );
    ExitCode::SUCCESS
}
