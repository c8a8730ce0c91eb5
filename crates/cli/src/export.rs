//! CSV export of ranked recommendations.

use std::path::Path;

use anyhow::{Context, Result};
use pipeline::Candidate;
use serde::Serialize;

/// One CSV row; links are absolute so the file stands on its own.
#[derive(Debug, Serialize)]
struct Row<'a> {
    id: &'a str,
    title: &'a str,
    link: String,
    pred_rating: f64,
    score: f64,
    num_friends: usize,
}

/// Write `candidates` to `path` in rank order and return the row count.
pub fn write_csv(path: &Path, candidates: &[Candidate], domain: &str) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for candidate in candidates {
        writer
            .serialize(Row {
                id: &candidate.id,
                title: &candidate.title,
                link: candidate.absolute_link(domain),
                pred_rating: candidate.pred_rating,
                score: candidate.score,
                num_friends: candidate.num_friends,
            })
            .with_context(|| format!("Failed to write row for {}", candidate.id))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(candidates.len())
}
