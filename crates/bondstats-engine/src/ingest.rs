use std::io::BufRead;

use bondstats_core::{MetricVector, ResultRecord};
use thiserror::Error;
use tracing::debug;

use crate::store::AggregationStore;

/// Field separator of both input logs and emitted reports.
pub const CSV_SEPARATOR: char = ';';

/// Fields per line: the compound description plus the metric vector.
const LINE_FIELD_COUNT: usize = 1 + MetricVector::FIELD_COUNT;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("line {line}: expected {expected} `;`-separated fields, found {found}")]
    MissingFields { line: usize, expected: usize, found: usize },
    #[error("line {line}: malformed description `{description}`: {reason}")]
    BadDescription {
        line: usize,
        description: String,
        reason: String,
    },
    #[error("line {line}: metric field {field} is not a number: `{value}`")]
    BadMetric {
        line: usize,
        field: usize,
        value: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One tagged sub-token of the compound description field.
struct DescriptionField {
    /// Index among the `_`-separated tokens.
    position: usize,
    /// Prefix stripped before integer parsing.
    tag: &'static str,
    /// Whether a trailing `.`-suffix (such as `.csv`) is removed first.
    strip_extension: bool,
}

/// Layout of the description field, e.g.
/// `sim_input_nodes_n20_s10_cb4_load100.csv`: node count, scenario id,
/// policy code and traffic load at fixed token positions.
struct DescriptionSchema {
    fields: [DescriptionField; 4],
}

struct ParsedDescription {
    node_count: u32,
    scenario_id: u32,
    policy: u32,
    traffic_load: u32,
}

impl DescriptionSchema {
    const STANDARD: DescriptionSchema = DescriptionSchema {
        fields: [
            DescriptionField { position: 3, tag: "n", strip_extension: false },
            DescriptionField { position: 4, tag: "s", strip_extension: false },
            DescriptionField { position: 5, tag: "cb", strip_extension: false },
            DescriptionField { position: 6, tag: "load", strip_extension: true },
        ],
    };

    fn parse(&self, description: &str) -> Result<ParsedDescription, String> {
        let tokens: Vec<&str> = description.split('_').collect();
        let mut values = [0u32; 4];
        for (slot, field) in self.fields.iter().enumerate() {
            let token = tokens.get(field.position).ok_or_else(|| {
                format!("missing sub-field at position {} (tag `{}`)", field.position, field.tag)
            })?;
            let token = if field.strip_extension {
                token.split('.').next().unwrap_or(token)
            } else {
                token
            };
            let digits = token.strip_prefix(field.tag).ok_or_else(|| {
                format!("sub-field `{token}` does not start with tag `{}`", field.tag)
            })?;
            values[slot] = digits
                .parse()
                .map_err(|_| format!("sub-field `{token}`: `{digits}` is not an integer"))?;
        }
        Ok(ParsedDescription {
            node_count: values[0],
            scenario_id: values[1],
            policy: values[2],
            traffic_load: values[3],
        })
    }
}

/// Parse one raw log line. `line` is the 0-based position in the input,
/// used only for error reporting.
pub fn parse_line(raw: &str, line: usize) -> Result<ResultRecord, IngestError> {
    let fields: Vec<&str> = raw.split(CSV_SEPARATOR).collect();
    if fields.len() < LINE_FIELD_COUNT {
        return Err(IngestError::MissingFields {
            line,
            expected: LINE_FIELD_COUNT,
            found: fields.len(),
        });
    }

    let description = fields[0];
    let parsed = DescriptionSchema::STANDARD.parse(description).map_err(|reason| {
        IngestError::BadDescription {
            line,
            description: description.to_string(),
            reason,
        }
    })?;

    let mut metric_values = [0.0f64; MetricVector::FIELD_COUNT];
    for (i, value) in metric_values.iter_mut().enumerate() {
        let field = i + 1;
        *value = fields[field].trim().parse().map_err(|_| IngestError::BadMetric {
            line,
            field,
            value: fields[field].to_string(),
        })?;
    }

    Ok(ResultRecord {
        policy: parsed.policy,
        traffic_load: parsed.traffic_load,
        scenario_id: parsed.scenario_id,
        node_count: parsed.node_count,
        metrics: MetricVector {
            packets_generated: metric_values[0],
            avg_packets_generated: metric_values[1],
            throughput: metric_values[2],
            rho: metric_values[3],
            delay: metric_values[4],
            utilization: metric_values[5],
            drop_ratio: metric_values[6],
        },
    })
}

/// Read records line by line and feed them into the store. Stops at the
/// first malformed line; aggregation state accumulated before a failure
/// must be discarded by the caller. Returns the number of records ingested.
pub fn ingest_into<R: BufRead>(
    reader: R,
    store: &mut AggregationStore,
) -> Result<usize, IngestError> {
    let mut count = 0usize;
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let record = parse_line(&line, line_idx)?;
        debug!(
            policy = record.policy,
            load = record.traffic_load,
            scenario = record.scenario_id,
            "ingested record"
        );
        store.insert(&record);
        count += 1;
    }
    Ok(count)
}
