//! Ranked domain list loading.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info, warn};

use super::{is_ip_literal, DomainEntry, TierBoundaries};
use crate::error_handling::InputError;

/// Reads the ranked domain list at `path`.
///
/// See [`parse_domain_list`] for the accepted format.
///
/// # Errors
///
/// Returns `InputError::Unreadable` if the file cannot be opened, or
/// `InputError::Malformed` if it is not valid delimited text.
pub fn load_domain_list(
    path: &Path,
    boundaries: &TierBoundaries,
) -> Result<Vec<DomainEntry>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_domain_list(file, boundaries)?;
    info!(
        "Loaded {} domains from {}",
        entries.len(),
        path.display()
    );
    Ok(entries)
}

/// A dotted name, an IP literal, or a `host:port` pair.
fn looks_like_host(field: &str) -> bool {
    field.contains('.') || field.contains(':') || is_ip_literal(field)
}

/// Parses a ranked domain list.
///
/// One `rank, hostname` pair per line (the hostname is the last column). Blank
/// lines and `#` comments are ignored. A line with a single column is taken as
/// a hostname whose rank is its position among the data lines. A header line
/// (a non-numeric first column, or a lone first word that cannot be a host) is
/// skipped, as are lines with rank 0, a bare number, or an invalid host name. Later duplicates of a host name are dropped with a
/// warning so the dataset stays keyed by host name.
///
/// # Errors
///
/// Returns `InputError::Malformed` if the reader fails or yields invalid UTF-8.
pub fn parse_domain_list<R: Read>(
    reader: R,
    boundaries: &TierBoundaries,
) -> Result<Vec<DomainEntry>, InputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut position = 0u64;

    for record in csv_reader.records() {
        let record = record?;
        let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
        let Some(raw_hostname) = fields.last().copied() else {
            continue;
        };
        if raw_hostname.bytes().all(|b| b.is_ascii_digit()) {
            warn!("Skipping line without a host name: {:?}", record);
            continue;
        }
        position += 1;

        if fields.len() == 1 && position == 1 && !looks_like_host(raw_hostname) {
            debug!("Skipping header line: {:?}", record);
            position -= 1;
            continue;
        }

        let rank = if fields.len() >= 2 {
            match fields[0].parse::<u64>() {
                Ok(rank) => rank,
                Err(_) if position == 1 => {
                    debug!("Skipping header line: {:?}", record);
                    position -= 1;
                    continue;
                }
                Err(_) => {
                    warn!("Skipping line with invalid rank {:?}", fields[0]);
                    continue;
                }
            }
        } else {
            position
        };

        let Some(entry) = DomainEntry::new(rank, raw_hostname, boundaries) else {
            warn!("Skipping invalid entry: rank {rank}, host {raw_hostname:?}");
            continue;
        };

        if !seen.insert(entry.hostname.clone()) {
            warn!(
                "Dropping duplicate host {} (rank {})",
                entry.hostname, entry.rank
            );
            continue;
        }
        entries.push(entry);
    }

    Ok(entries)
}
