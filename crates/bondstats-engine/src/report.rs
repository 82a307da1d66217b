use std::io::{self, Write};

use bondstats_core::StudyConfig;

use crate::compare::DelayComparison;
use crate::stats::{BucketStats, stats_for};

use crate::ingest::CSV_SEPARATOR;

/// Marker appended to averages rows whose bucket missed the configured
/// sample count.
pub const INCOMPLETE_MARKER: &str = "incomplete";

// Percentages are floating-point throughout, never integer-truncated.
fn percent(count: u32, out_of: u32) -> f64 {
    f64::from(count) * 100.0 / f64::from(out_of)
}

/// Per-policy average table: one row per (policy, load) with the seven
/// averaged fields, the nonzero-delay std-dev, and a completeness flag.
pub fn write_averages<W: Write>(
    w: &mut W,
    stats: &[BucketStats],
    cfg: &StudyConfig,
) -> io::Result<()> {
    let s = CSV_SEPARATOR;
    writeln!(
        w,
        "policy{s}load{s}num_pkt_gen{s}avg_num_pkt_gen{s}through{s}rho{s}delay{s}util{s}drop{s}std_delay{s}flags"
    )?;
    for row in stats {
        let a = &row.averages;
        let flags = if row.complete { "" } else { INCOMPLETE_MARKER };
        writeln!(
            w,
            "{label}{s}{load}{s}{}{s}{}{s}{}{s}{}{s}{}{s}{}{s}{}{s}{}{s}{flags}",
            a.packets_generated,
            a.avg_packets_generated,
            a.throughput,
            a.rho,
            a.delay,
            a.utilization,
            a.drop_ratio,
            row.delay_std,
            label = cfg.policy_label(row.policy),
            load = row.traffic_load,
        )?;
    }
    Ok(())
}

/// Unconditional comparison table: per load, win percentages for both
/// comparison policies and the inferred draw percentage.
pub fn write_delay_comparison<W: Write>(
    w: &mut W,
    comparison: &DelayComparison,
    cfg: &StudyConfig,
) -> io::Result<()> {
    let s = CSV_SEPARATOR;
    writeln!(
        w,
        "load (delay_delta = {delta}){s}{p1}{s}{p2}{s}draw",
        delta = cfg.delay_delta,
        p1 = cfg.policy_label(comparison.p1),
        p2 = cfg.policy_label(comparison.p2),
    )?;
    let n = cfg.num_scenarios;
    for (load, tally) in &comparison.unconditional {
        let draws = n.saturating_sub(tally.p1_wins + tally.p2_wins);
        writeln!(
            w,
            "{load}{s}{}{s}{}{s}{}",
            percent(tally.p1_wins, n),
            percent(tally.p2_wins, n),
            percent(draws, n),
        )?;
    }
    Ok(())
}

/// Success-aware comparison table: per load, raw win and draw counts.
pub fn write_success_delay_comparison<W: Write>(
    w: &mut W,
    comparison: &DelayComparison,
    cfg: &StudyConfig,
) -> io::Result<()> {
    let s = CSV_SEPARATOR;
    writeln!(
        w,
        "load (delay_delta = {delta}){s}{p1}{s}{p2}{s}draw",
        delta = cfg.delay_delta,
        p1 = cfg.policy_label(comparison.p1),
        p2 = cfg.policy_label(comparison.p2),
    )?;
    for (load, tally) in &comparison.success_aware {
        writeln!(
            w,
            "{load}{s}{}{s}{}{s}{}",
            tally.p1_wins, tally.p2_wins, tally.draws,
        )?;
    }
    Ok(())
}

/// Load-accomplishment probability table: per load, the percentage of
/// scenarios that reached their offered load, one column per policy.
pub fn write_load_accomplishment<W: Write>(
    w: &mut W,
    stats: &[BucketStats],
    cfg: &StudyConfig,
) -> io::Result<()> {
    let s = CSV_SEPARATOR;
    write!(
        w,
        "load (throughput_delta_factor = {})",
        cfg.throughput_delta_factor
    )?;
    for policy in &cfg.policies {
        write!(w, "{s}{}", policy.label)?;
    }
    writeln!(w)?;
    for &load in &cfg.traffic_loads {
        write!(w, "{load}")?;
        for policy in &cfg.policies {
            let rate = stats_for(stats, policy.code, load)
                .map_or(f64::NAN, |row| row.success_rate_percent);
            write!(w, "{s}{rate}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Success-conditioned delay table: per load, the mean delay over
/// load-accomplished scenarios and its population std-dev, per policy.
pub fn write_success_delay<W: Write>(
    w: &mut W,
    stats: &[BucketStats],
    cfg: &StudyConfig,
) -> io::Result<()> {
    let s = CSV_SEPARATOR;
    write!(
        w,
        "load (throughput_delta_factor = {})",
        cfg.throughput_delta_factor
    )?;
    for policy in &cfg.policies {
        write!(w, "{s}{}", policy.label)?;
    }
    for policy in &cfg.policies {
        write!(w, "{s}std_{}", policy.label)?;
    }
    writeln!(w)?;
    for &load in &cfg.traffic_loads {
        write!(w, "{load}")?;
        for policy in &cfg.policies {
            let mean = stats_for(stats, policy.code, load)
                .map_or(f64::NAN, |row| row.success_mean_delay);
            write!(w, "{s}{mean}")?;
        }
        for policy in &cfg.policies {
            let std = stats_for(stats, policy.code, load)
                .map_or(f64::NAN, |row| row.success_delay_std);
            write!(w, "{s}{std}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_policies;
    use crate::stats::compute_stats;
    use crate::store::AggregationStore;
    use bondstats_core::{MetricVector, PolicySpec, ResultRecord};

    fn test_config() -> StudyConfig {
        StudyConfig {
            num_scenarios: 3,
            traffic_loads: vec![100],
            policies: vec![
                PolicySpec { code: 4, label: "AM".to_string() },
                PolicySpec { code: 6, label: "PU".to_string() },
            ],
            compare_p1: 4,
            compare_p2: 6,
            ..StudyConfig::default()
        }
    }

    fn record(policy: u32, scenario_id: u32, throughput: f64, delay: f64) -> ResultRecord {
        ResultRecord {
            policy,
            traffic_load: 100,
            scenario_id,
            node_count: 20,
            metrics: MetricVector {
                packets_generated: 2500.0,
                avg_packets_generated: 100.0,
                throughput,
                rho: 0.5,
                delay,
                utilization: 0.25,
                drop_ratio: 0.0,
            },
        }
    }

    fn populated_store(cfg: &StudyConfig) -> AggregationStore {
        let mut store = AggregationStore::new(cfg);
        for (s, delay) in [(1, 2.0), (2, 4.0), (3, 6.0)] {
            store.insert(&record(4, s, 100.0, delay));
        }
        for (s, delay) in [(1, 8.0), (2, 1.0), (3, 6.5)] {
            store.insert(&record(6, s, 100.0, delay));
        }
        store
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn averages_table_round_trips_through_a_trivial_reader() {
        let cfg = test_config();
        let store = populated_store(&cfg);
        let stats = compute_stats(&store, &cfg);
        let text = render(|buf| write_averages(buf, &stats, &cfg));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + stats.len());
        for (line, row) in lines[1..].iter().zip(&stats) {
            let fields: Vec<&str> = line.split(CSV_SEPARATOR).collect();
            assert_eq!(fields.len(), 11);
            assert_eq!(fields[0], cfg.policy_label(row.policy));
            assert_eq!(fields[1].parse::<u32>().unwrap(), row.traffic_load);
            assert_eq!(fields[2].parse::<f64>().unwrap(), row.averages.packets_generated);
            assert_eq!(fields[6].parse::<f64>().unwrap(), row.averages.delay);
            assert_eq!(fields[9].parse::<f64>().unwrap(), row.delay_std);
            assert_eq!(fields[10], "");
        }
    }

    #[test]
    fn incomplete_buckets_carry_the_marker() {
        let cfg = test_config();
        let mut store = AggregationStore::new(&cfg);
        store.insert(&record(4, 1, 100.0, 2.0)); // one of three scenarios
        let stats = compute_stats(&store, &cfg);
        let text = render(|buf| write_averages(buf, &stats, &cfg));
        for line in text.lines().skip(1) {
            assert!(line.ends_with(INCOMPLETE_MARKER));
        }
    }

    #[test]
    fn comparison_percentages_are_floating_point() {
        let cfg = test_config();
        let store = populated_store(&cfg);
        // Scenario 1: PU slower by 6 (AM wins); scenario 2: PU faster by 3
        // (PU wins); scenario 3: within delta (draw).
        let comparison = compare_policies(&store, &cfg);
        let text = render(|buf| write_delay_comparison(buf, &comparison, &cfg));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let fields: Vec<&str> = lines[1].split(CSV_SEPARATOR).collect();
        let third = 100.0 / 3.0;
        for field in &fields[1..] {
            let value: f64 = field.parse().unwrap();
            assert!((value - third).abs() < 1e-9, "expected ~{third}, got {value}");
        }
    }

    #[test]
    fn success_aware_table_holds_raw_counts() {
        let cfg = test_config();
        let store = populated_store(&cfg);
        let comparison = compare_policies(&store, &cfg);
        let text = render(|buf| write_success_delay_comparison(buf, &comparison, &cfg));
        assert_eq!(text.lines().nth(1).unwrap(), "100;1;1;1");
    }

    #[test]
    fn load_accomplishment_has_one_column_per_policy() {
        let cfg = test_config();
        let store = populated_store(&cfg);
        let stats = compute_stats(&store, &cfg);
        let text = render(|buf| write_load_accomplishment(buf, &stats, &cfg));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "load (throughput_delta_factor = 0.05);AM;PU");
        assert_eq!(lines[1], "100;100;100");
    }

    #[test]
    fn nan_cells_print_as_nan() {
        let cfg = test_config();
        let store = AggregationStore::new(&cfg); // nothing ingested
        let stats = compute_stats(&store, &cfg);
        let text = render(|buf| write_success_delay(buf, &stats, &cfg));
        let row = text.lines().nth(1).unwrap();
        assert_eq!(row, "100;NaN;NaN;NaN;NaN");
    }
}
