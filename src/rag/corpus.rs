//! Corpus builder.
//!
//! Converts per-zone metadata and pre-computed summary statistics into the
//! flat record list fed to the embedding index. Output order is
//! deterministic: zones in registration order, one zone overview record
//! first, then one record per (variable, column) pair in declared order.

use crate::data::ZoneSource;
use crate::rag::record::Record;

/// Build the retrievable corpus from a zone source.
///
/// Variables without a computed summary are skipped silently; the builder
/// tolerates partial data. Every statistic is reduced to a single scalar and
/// rendered with fixed 2-decimal precision.
pub fn build_corpus(source: &dyn ZoneSource) -> Vec<Record> {
    let mut records = Vec::new();

    for zone in source.zones() {
        let variables = source.variables(&zone.name);

        let mut overview = format!(
            "Zone: {}. Variables available: {}.",
            zone.name,
            variables.join(", ")
        );
        if let Some(timeframe) = source.data_timeframe(&zone.name) {
            overview.push_str(&format!(
                " Data available from {} to {}.",
                timeframe.start, timeframe.end
            ));
        }
        records.push(Record::zone_info(overview, zone.name.clone()));

        for variable in &variables {
            let Some(summary) = source.variable_summary(&zone.name, variable) else {
                continue;
            };
            for (column, stats) in summary {
                let content = format!(
                    "Variable: {} ({}) in {}. Mean value: {:.2}, Range: {:.2} to {:.2}, Standard deviation: {:.2}.",
                    variable,
                    column,
                    zone.name,
                    stats.mean.mean(),
                    stats.min.min(),
                    stats.max.max(),
                    stats.std.mean(),
                );
                records.push(Record::variable_info(
                    content,
                    zone.name.clone(),
                    variable.clone(),
                    column,
                ));
            }
        }
    }

    records
}
