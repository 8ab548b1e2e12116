//! Resolve command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use dexpatch::{ClassPool, FingerprintSet, PatternScanResult, ResolutionStore};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::info;

use super::load_pool;

/// One line of the resolve report
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternScanResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub strings: Vec<(String, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run the resolve command
pub fn run(pool: &Path, fingerprints: &Path, json: bool) -> Result<()> {
    let pool = load_pool(pool)?;
    let set = dexpatch::load_fingerprints(fingerprints).with_context(|| {
        format!("Failed to load fingerprints from {}", fingerprints.display())
    })?;
    if let Some(version) = &set.version {
        info!("Loaded fingerprint set version {}", version);
    }

    let reports = resolve_all(&pool, &set)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        match &report.method {
            Some(method) => {
                print!("{} {} {}", "✓".green(), report.fingerprint.bold(), method);
                if let Some(pattern) = report.pattern {
                    print!(" [{}..={}]", pattern.start_index, pattern.end_index);
                }
                println!();
                for (string, index) in &report.strings {
                    println!("    {:?} @ {}", string, index);
                }
            }
            None => println!(
                "{} {} not found ({})",
                "✗".red(),
                report.fingerprint.bold(),
                report.error.as_deref().unwrap_or("no match")
            ),
        }
    }

    let resolved = reports.iter().filter(|r| r.method.is_some()).count();
    println!();
    println!("Resolved {}/{} fingerprints", resolved, reports.len());
    Ok(())
}

/// Resolve every fingerprint in file order, honouring parents
pub fn resolve_all(pool: &ClassPool, set: &FingerprintSet) -> Result<Vec<ResolveReport>> {
    let fingerprints = set.build().context("Invalid fingerprint definition")?;
    let mut store = ResolutionStore::new();

    let reports = fingerprints
        .iter()
        .map(|fingerprint| match store.resolve(fingerprint, pool) {
            Ok(resolution) => ResolveReport {
                fingerprint: resolution.fingerprint.clone(),
                method: Some(pool.method(resolution.method).descriptor()),
                pattern: resolution.scan.pattern,
                strings: resolution
                    .scan
                    .strings
                    .iter()
                    .map(|m| (m.string.clone(), m.index))
                    .collect(),
                error: None,
            },
            Err(e) => ResolveReport {
                fingerprint: fingerprint.name().to_string(),
                method: None,
                pattern: None,
                strings: Vec::new(),
                error: Some(e.to_string()),
            },
        })
        .collect();
    Ok(reports)
}
