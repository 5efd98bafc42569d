//! `thesis assemble`: run the standard pass pipeline over each document.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indexmap::IndexMap;
use std::path::PathBuf;
use thesis_latex::{AssemblyPipeline, PassReport, SourceDocument, extract_sections};

use super::diagnostic_error;
use crate::config::ThesisConfig;
use crate::renames::RenamePlan;
use crate::utils::glob_expand::expand_globs;

#[derive(Debug, Args)]
pub struct AssembleArgs {
    /// LaTeX documents or glob patterns, in thesis order
    #[arg(required = true)]
    pub docs: Vec<String>,

    /// Rename plan (or flat rename map) from `thesis bib merge --renames`
    #[arg(long)]
    pub renames: Option<PathBuf>,

    /// Concatenate the sections of every document into FILE instead of
    /// writing one output per document
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print a unified diff of every document
    #[arg(long)]
    pub diff: bool,

    /// Write only the section bodies to per-document outputs
    #[arg(long)]
    pub sections: bool,

    /// Make acknowledgment and conflict-of-interest sections unnumbered
    /// when sections are extracted
    #[arg(long)]
    pub force_unnumbered: bool,
}

#[derive(Debug)]
pub struct AssembledDocument {
    pub source: PathBuf,
    pub title: String,
    pub report: PassReport,
    /// Empty unless `--diff` was given.
    pub diff: String,
    /// `None` when the document went into the combined output.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct AssemblySummary {
    pub documents: Vec<AssembledDocument>,
    pub combined: Option<PathBuf>,
    /// Every `\usepackage` line, by package, first declaration wins.
    pub packages: IndexMap<String, String>,
}

pub fn assemble(config: &ThesisConfig, args: &AssembleArgs) -> Result<AssemblySummary> {
    let plan = match &args.renames {
        Some(path) => RenamePlan::from_path(path)?,
        None => RenamePlan::default(),
    };
    let paths = expand_globs(&args.docs)?;
    if paths.is_empty() {
        anyhow::bail!("No documents to assemble");
    }

    let mut summary = AssemblySummary {
        combined: args.output.clone(),
        ..AssemblySummary::default()
    };
    let mut combined = Vec::new();

    for path in paths {
        let mut doc =
            SourceDocument::from_path(&path).map_err(|e| diagnostic_error(e.to_diagnostic()))?;
        let renames = plan.for_document(doc.directory());
        tracing::debug!(path = %doc.path().display(), renames = renames.len(), "Assembling document");

        let report = AssemblyPipeline::standard(renames)
            .execute(&mut doc, &config.assembly)
            .map_err(|e| diagnostic_error(e.to_diagnostic()))?;

        for (name, line) in doc.declared_packages() {
            summary
                .packages
                .entry(name.clone())
                .or_insert_with(|| line.clone());
        }

        let output = if args.output.is_some() {
            combined.push(extract_sections(&doc.working_text, args.force_unnumbered));
            None
        } else {
            let output = doc.output_path(&config.assembly.output_suffix);
            if args.sections {
                let sections = extract_sections(&doc.working_text, args.force_unnumbered);
                std::fs::write(&output, sections)
                    .with_context(|| format!("Failed to write file: {}", output.display()))?;
            } else {
                doc.write_to(&output)
                    .map_err(|e| diagnostic_error(e.to_diagnostic()))?;
            }
            Some(output)
        };

        summary.documents.push(AssembledDocument {
            source: doc.path().to_path_buf(),
            title: doc.title().to_string(),
            report,
            diff: if args.diff { doc.diff() } else { String::new() },
            output,
        });
    }

    if let Some(path) = &args.output {
        std::fs::write(path, combined.join("\n"))
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
    }

    Ok(summary)
}

pub fn print_assembly(summary: &AssemblySummary) {
    for document in &summary.documents {
        let title = if document.title.is_empty() {
            "untitled".dimmed().to_string()
        } else {
            document.title.clone()
        };
        println!(
            "{} {} ({})",
            "✓".green(),
            document.source.display(),
            title
        );
        for (pass, count) in &document.report.counts {
            if *count > 0 {
                println!("    {}: {}", pass.cyan(), count);
            }
        }
        if let Some(output) = &document.output {
            println!("    written to {}", output.display());
        }
        print_diff(&document.diff);
    }

    if let Some(path) = &summary.combined {
        println!(
            "\n{} {} documents combined into {}",
            "✓".green(),
            summary.documents.len(),
            path.display().to_string().cyan()
        );
        if !summary.packages.is_empty() {
            println!("{}", "Packages declared by the documents:".bold());
            for line in summary.packages.values() {
                println!("  {}", line);
            }
        }
    }
}

fn print_diff(diff: &str) {
    for line in diff.lines() {
        let styled = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with("@@") {
            line.cyan()
        } else {
            line.normal()
        };
        println!("{}", styled);
    }
}
