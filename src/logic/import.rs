//! Bulk result import from CSV (`round,player_a,player_b,winner,score`).

use crate::models::{MatchResult, Tournament, TournamentError, UserId};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Read;

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("failed to parse results CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Row numbers are 1-based and do not count the header.
    #[error("row {row} rejected: {source}")]
    Rejected {
        row: usize,
        #[source]
        source: TournamentError,
    },
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    round: u32,
    player_a: UserId,
    player_b: UserId,
    winner: Option<UserId>,
    score: Option<String>,
}

/// Parse results. Empty `winner`/`score` cells mean undecided / no score.
pub fn parse_results_csv<R: Read>(
    reader: R,
    reported_at: DateTime<Utc>,
) -> Result<Vec<MatchResult>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut results = Vec::new();
    for row in rdr.deserialize() {
        let row: ResultRow = row?;
        let mut result =
            MatchResult::new(row.round, row.player_a, row.player_b, row.winner, reported_at);
        result.score = row.score.filter(|s| !s.is_empty());
        results.push(result);
    }
    Ok(results)
}

/// Parse and record every row, or none of them if any row is rejected.
pub fn import_results<R: Read>(
    tournament: &mut Tournament,
    reader: R,
    reported_at: DateTime<Utc>,
) -> Result<usize, ImportError> {
    let results = parse_results_csv(reader, reported_at)?;
    let mut draft = tournament.clone();
    for (idx, result) in results.iter().enumerate() {
        draft
            .record_result(result.clone())
            .map_err(|source| ImportError::Rejected {
                row: idx + 1,
                source,
            })?;
    }
    *tournament = draft;
    log::info!(
        "Imported {} result(s) into tournament {}",
        results.len(),
        tournament.id
    );
    Ok(results.len())
}
