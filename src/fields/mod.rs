/*!
 * # Field Resolver
 *
 * Collections in the warehouse store were written by several generations of
 * forms, so one concept (bag count, insurer, funding date) can live under
 * different keys, as a string in one version and an object in the next.
 *
 * Every read goes through a [`Concept`]: a name plus the ordered candidate
 * paths declared in [`table`]. The first candidate holding a usable value
 * wins. Absent or malformed values resolve to `None`; nothing here fails.
 */

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::models::Document;

pub mod coerce;
pub mod table;

/// A named concept and the ordered field paths it has been stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concept {
    pub name: &'static str,
    pub paths: &'static [&'static str],
}

impl Concept {
    pub const fn new(name: &'static str, paths: &'static [&'static str]) -> Self {
        Self { name, paths }
    }

    /// First present, non-empty raw value.
    pub fn raw<'a>(&self, doc: &'a Document) -> Option<&'a Value> {
        resolve(doc, self.paths)
    }

    pub fn text(&self, doc: &Document) -> Option<String> {
        resolve_text(doc, self.paths)
    }

    pub fn decimal(&self, doc: &Document) -> Option<Decimal> {
        resolve_decimal(doc, self.paths)
    }

    pub fn count(&self, doc: &Document) -> Option<i64> {
        resolve_count(doc, self.paths)
    }

    pub fn timestamp(&self, doc: &Document) -> Option<DateTime<Utc>> {
        resolve_timestamp(doc, self.paths)
    }

    pub fn date(&self, doc: &Document) -> Option<NaiveDate> {
        self.timestamp(doc).map(|ts| ts.date_naive())
    }

    /// Candidate paths as owned strings, for queries handed to a store.
    pub fn owned_paths(&self) -> Vec<String> {
        self.paths.iter().map(|path| path.to_string()).collect()
    }
}

/// Returns the first candidate path whose value is present and non-empty.
pub fn resolve<'a>(doc: &'a Document, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| doc.get_path(path))
        .find(|value| !coerce::is_empty(value))
}

// Candidates whose value cannot be coerced are skipped, so a malformed newer
// field never hides a well-formed older one.
fn resolve_with<T>(
    doc: &Document,
    paths: &[&str],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| doc.get_path(path))
        .find_map(convert)
}

pub fn resolve_text(doc: &Document, paths: &[&str]) -> Option<String> {
    resolve_with(doc, paths, coerce::as_text)
}

pub fn resolve_decimal(doc: &Document, paths: &[&str]) -> Option<Decimal> {
    resolve_with(doc, paths, coerce::as_decimal)
}

pub fn resolve_count(doc: &Document, paths: &[&str]) -> Option<i64> {
    resolve_with(doc, paths, coerce::as_count)
}

pub fn resolve_timestamp(doc: &Document, paths: &[&str]) -> Option<DateTime<Utc>> {
    resolve_with(doc, paths, coerce::as_timestamp)
}

/// Picks the first `Some` in provenance order.
///
/// Used by the enrichment step to express "prefer source A, then B" for
/// values already pulled out of different collections.
pub fn first_present<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}
