//! `thesis bib merge` and `thesis bib report`.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use thesis_bib::{
    DatabaseMerger, Deduplicator, DuplicateReport, RecordCollection, RenameMap, SimilarityEngine,
};
use thesis_error_reporting::{DiagnosticKind, DiagnosticMessage};

use super::{diagnostic_error, render_diagnostic};
use crate::config::ThesisConfig;
use crate::renames::{RenamePlan, absolute};
use crate::utils::glob_expand::expand_globs;

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Bibliography files or glob patterns. On a key collision the earlier
    /// file keeps the key.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Write the merged bibliography to FILE
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write the rename plan for `thesis assemble` to FILE
    #[arg(long)]
    pub renames: Option<PathBuf>,

    /// Keep records describing the same work as separate entries
    #[arg(long)]
    pub no_dedup: bool,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Bibliography files or glob patterns
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Matching fields needed to call two records similar
    #[arg(long)]
    pub threshold: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub renames_path: Option<PathBuf>,
    pub sources: usize,
    pub records: usize,
    /// Records folded into another by deduplication.
    pub duplicates_merged: usize,
    pub diagnostics: Vec<DiagnosticMessage>,
    pub plan: RenamePlan,
}

/// Load every bibliography named by `patterns`, in order.
pub fn load_collections(config: &ThesisConfig, patterns: &[String]) -> Result<Vec<RecordCollection>> {
    let options = config.bibliography.parse_options();
    expand_globs(patterns)?
        .iter()
        .map(|path| {
            let path = absolute(path)?;
            RecordCollection::from_path_with(&path, &options)
                .map_err(|e| diagnostic_error(e.to_diagnostic()))
        })
        .collect()
}

pub fn merge(config: &ThesisConfig, args: &MergeArgs) -> Result<MergeSummary> {
    let collections = load_collections(config, &args.files)?;
    let sources = collections.len();
    let engine = SimilarityEngine::new(config.bibliography.similarity.clone());
    let mut outcome = DatabaseMerger::new(&engine).combine_all(collections);

    let deduplicated = if args.no_dedup {
        RenameMap::new()
    } else {
        Deduplicator::new(&engine)
            .merge_all(&mut outcome.collection)
            .map_err(|e| diagnostic_error(e.to_diagnostic()))?
    };

    outcome
        .collection
        .write(&args.output)
        .map_err(|e| diagnostic_error(e.to_diagnostic()))?;
    tracing::info!(
        path = %args.output.display(),
        records = outcome.collection.len(),
        "Wrote merged bibliography"
    );

    let duplicates_merged = deduplicated.len();
    let plan = RenamePlan::new(outcome.renames_by_source, deduplicated);
    if let Some(path) = &args.renames {
        plan.write(path)?;
    }

    Ok(MergeSummary {
        output: args.output.clone(),
        renames_path: args.renames.clone(),
        sources,
        records: outcome.collection.len(),
        duplicates_merged,
        diagnostics: outcome.diagnostics,
        plan,
    })
}

/// Print the merge summary. Collision warnings go to stderr first, as JSON
/// lines when `json_errors` is set.
pub fn print_merge(summary: &MergeSummary, json_errors: bool) {
    for diagnostic in &summary.diagnostics {
        if diagnostic.kind == DiagnosticKind::Warning {
            eprintln!("{}", render_diagnostic(diagnostic, json_errors));
        }
    }

    let collisions = summary
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Warning)
        .count();
    let combined = summary.diagnostics.len() - collisions;

    println!(
        "{} Merged {} bibliographies into {} records",
        "✓".green(),
        summary.sources,
        summary.records
    );
    println!("  Same-key records merged:  {}", combined);
    println!("  Key collisions renamed:   {}", collisions);
    println!("  Duplicates merged:        {}", summary.duplicates_merged);
    println!("  Written to {}", summary.output.display().to_string().cyan());

    match &summary.renames_path {
        Some(path) => println!("  Rename plan: {}", path.display().to_string().cyan()),
        None if !summary.plan.is_empty() => println!(
            "{} {} citation keys changed; pass --renames FILE to save them for `thesis assemble`",
            "!".yellow(),
            summary.plan.len()
        ),
        None => {}
    }
}

/// Combine the bibliographies and report records that look like the same
/// work.
pub fn report(config: &ThesisConfig, args: &ReportArgs) -> Result<DuplicateReport> {
    let collections = load_collections(config, &args.files)?;
    let mut similarity = config.bibliography.similarity.clone();
    if let Some(threshold) = args.threshold {
        similarity.threshold = threshold;
    }
    let engine = SimilarityEngine::new(similarity);
    let outcome = DatabaseMerger::new(&engine).combine_all(collections);
    Ok(DuplicateReport::build(&outcome.collection, &engine))
}

pub fn print_report(report: &DuplicateReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else if report.is_empty() {
        println!("{} No duplicates found", "✓".green());
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}
