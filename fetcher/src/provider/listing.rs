//! Directory listing parsing and newest-build selection.

use crate::error::{FetchError, Result};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

/// Rows of a download listing that describe files.
const ROW_SELECTOR: &str = ".listing > table > tbody > tr.file";
/// The link naming a file within a row.
const LINK_SELECTOR: &str = "td > a[href]";
/// The modification time within a row.
const TIME_SELECTOR: &str = "td > time[datetime]";

/// One downloadable file advertised by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// File name, as linked from the listing.
    pub name: String,
    /// Modification time, if the listing gave a parseable one.
    pub updated: Option<DateTime<Utc>>,
}

impl Candidate {
    /// Create a candidate.
    #[must_use]
    pub fn new(name: impl Into<String>, updated: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            updated,
        }
    }
}

/// Pick the newest candidate whose name ends with `suffix`.
///
/// Candidates with a different suffix are ignored entirely, as are those
/// without a timestamp. On equal timestamps the first one encountered wins.
///
/// # Examples
///
/// ```
/// use bootpull::provider::listing::{Candidate, select_latest};
/// use chrono::{TimeZone, Utc};
///
/// let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).single();
/// let candidates = [
///     Candidate::new("lineage-21-sunfish.zip", day(1)),
///     Candidate::new("lineage-21-sunfish-recovery.img", day(9)),
///     Candidate::new("lineage-21b-sunfish.zip", day(2)),
/// ];
/// let newest = select_latest(&candidates, "sunfish.zip").map(|c| c.name.as_str());
/// assert_eq!(newest, Some("lineage-21b-sunfish.zip"));
/// ```
#[must_use]
pub fn select_latest<'a>(candidates: &'a [Candidate], suffix: &str) -> Option<&'a Candidate> {
    let mut best: Option<(&Candidate, DateTime<Utc>)> = None;
    for candidate in candidates.iter().filter(|c| c.name.ends_with(suffix)) {
        let Some(time) = candidate.updated else {
            continue;
        };
        if best.is_none_or(|(_, best_time)| time > best_time) {
            best = Some((candidate, time));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Parse the file rows of an HTML directory listing.
///
/// Rows without a link are skipped; a missing or malformed timestamp leaves
/// `updated` empty.
///
/// # Errors
///
/// Returns [`FetchError::UpstreamError`] if a selector fails to compile.
pub fn parse_listing(html: &str, source_url: &str) -> Result<Vec<Candidate>> {
    let rows = selector(ROW_SELECTOR, source_url)?;
    let link = selector(LINK_SELECTOR, source_url)?;
    let time = selector(TIME_SELECTOR, source_url)?;

    let document = Html::parse_document(html);
    let candidates = document
        .select(&rows)
        .filter_map(|row| {
            let name = first_attr(row, &link, "href")?;
            let updated = first_attr(row, &time, "datetime").and_then(parse_timestamp);
            Some(Candidate::new(name, updated))
        })
        .collect();
    Ok(candidates)
}

fn first_attr<'a>(row: ElementRef<'a>, selector: &Selector, attr: &str) -> Option<&'a str> {
    row.select(selector).next()?.value().attr(attr)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

pub(crate) fn selector(css: &str, source_url: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| FetchError::UpstreamError {
        url: source_url.to_owned(),
        reason: format!("invalid selector {css}: {err}"),
    })
}
