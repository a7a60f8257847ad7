//! Extractor registry.
//!
//! `DatasetKind::extract` maps each dataset to its extraction function. All
//! extractors return an ordered list of flat records and degrade to an empty
//! list when the upstream call fails; there is never partial data from one
//! call.

use serde_json::Value;

use crate::api::Endpoint;
use crate::context::RunContext;
use crate::domain::{DatasetKind, Record, Sequence};
use crate::events::Level;

impl DatasetKind {
    /// Extract this dataset's records, for one gameweek where that applies.
    ///
    /// `sequence` filters fixtures when present and selects the gameweek for
    /// live stats; bootstrap-sliced datasets ignore it.
    pub fn extract(self, ctx: &mut RunContext<'_>, sequence: Option<Sequence>) -> Vec<Record> {
        match self {
            DatasetKind::Players
            | DatasetKind::Positions
            | DatasetKind::Teams
            | DatasetKind::Gameweeks => extract_bootstrap_slice(ctx, self),
            DatasetKind::Fixtures => extract_fixtures(ctx, sequence),
            DatasetKind::GameweekLive => match sequence {
                Some(gw) => extract_gameweek_live(ctx, gw),
                None => {
                    ctx.sink().record(
                        Level::Warning,
                        "gameweek_live needs a gameweek; nothing extracted",
                        Some(self.name()),
                    );
                    Vec::new()
                }
            },
        }
    }
}

fn extract_bootstrap_slice(ctx: &mut RunContext<'_>, kind: DatasetKind) -> Vec<Record> {
    let Some(field) = kind.bootstrap_field() else {
        return Vec::new();
    };
    let records = match ctx.bootstrap() {
        Some(data) => records_in(data.get(field)),
        None => return Vec::new(),
    };
    ctx.sink().record(
        Level::Info,
        &format!("{kind} data extracted successfully"),
        Some(kind.name()),
    );
    records
}

fn extract_fixtures(ctx: &mut RunContext<'_>, event: Option<Sequence>) -> Vec<Record> {
    match ctx.call(&Endpoint::Fixtures { event }) {
        Ok(data) => records_in(Some(&data)),
        Err(_) => Vec::new(),
    }
}

fn extract_gameweek_live(ctx: &mut RunContext<'_>, gameweek: Sequence) -> Vec<Record> {
    let data = match ctx.call(&Endpoint::EventLive { event: gameweek }) {
        Ok(data) => data,
        Err(_) => return Vec::new(),
    };
    ctx.sink().record(
        Level::Info,
        &format!("Live player data for gameweek {gameweek} extracted successfully"),
        Some(DatasetKind::GameweekLive.name()),
    );
    records_in(data.get("elements"))
        .into_iter()
        .map(|element| flatten_live_element(element, gameweek))
        .collect()
}

/// Object elements of a JSON array, in order. Anything else yields nothing.
fn records_in(value: Option<&Value>) -> Vec<Record> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Stamp `gameweek` on a live-stats element and lift its nested `stats`
/// object onto the top level.
///
/// Field order: the element's own fields (minus `stats`) in upstream order,
/// then `gameweek`, then the stats fields. A stats key that already exists
/// overwrites the value in place. A `stats` value that is not an object is
/// kept as is.
pub fn flatten_live_element(element: Record, gameweek: Sequence) -> Record {
    let mut flat = Record::new();
    let mut stats = None;
    for (key, value) in element {
        match value {
            Value::Object(nested) if key == "stats" => stats = Some(nested),
            other => {
                flat.insert(key, other);
            }
        }
    }
    flat.insert("gameweek".to_string(), Value::from(gameweek));
    if let Some(nested) = stats {
        for (key, value) in nested {
            flat.insert(key, value);
        }
    }
    flat
}
