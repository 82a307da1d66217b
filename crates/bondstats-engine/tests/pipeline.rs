//! Full pipeline run over a small hand-built study: ingest raw lines,
//! aggregate, reduce, disperse, compare, emit.

use bondstats_core::{PolicySpec, StudyConfig};
use bondstats_engine::{
    AggregationStore, compare_policies, compute_stats, ingest_into, report,
};

fn study_config() -> StudyConfig {
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

/// `sim_input_nodes_n20_s<scenario>_cb<policy>_load100.csv` plus metrics.
fn line(policy: u32, scenario: u32, throughput: f64, delay: f64) -> String {
    format!(
        "sim_input_nodes_n20_s{scenario}_cb{policy}_load100.csv;2500;100.0;{throughput};0.8;{delay};0.5;0.01"
    )
}

#[test]
fn end_to_end_statistics_match_the_hand_computed_study() {
    let cfg = study_config();
    cfg.validate().unwrap();

    // Policy AM: delays [0, 4, 6]; only scenarios 2 and 3 serve their
    // generated rate of 2500 / 25 = 100 within the band of 5.
    // Policy PU: all succeed, delays [2, 4, 12].
    let input = [
        line(4, 1, 50.0, 0.0),
        line(4, 2, 100.0, 4.0),
        line(4, 3, 98.0, 6.0),
        line(6, 1, 100.0, 2.0),
        line(6, 2, 99.0, 4.0),
        line(6, 3, 101.0, 12.0),
    ]
    .join("\n");

    let mut store = AggregationStore::new(&cfg);
    let ingested = ingest_into(input.as_bytes(), &mut store).unwrap();
    assert_eq!(ingested, 6);
    assert!(store.completeness(&cfg).is_empty());

    let am = store.bucket(4, 100).unwrap();
    assert_eq!(am.zero_delay_count(), 1);
    assert_eq!(am.success_count(), 2);
    assert_eq!(am.success_delay_sum(), 10.0);

    let stats = compute_stats(&store, &cfg);
    let am_stats = &stats[0];
    assert_eq!(am_stats.policy, 4);
    assert!(am_stats.complete);
    // Delay averages over the two nonzero samples only.
    assert_eq!(am_stats.averages.delay, 5.0);
    // Success-conditioned mean 5.0, population std 1.0.
    assert_eq!(am_stats.success_mean_delay, 5.0);
    assert!((am_stats.success_delay_std - 1.0).abs() < 1e-12);
    assert!((am_stats.success_rate_percent - 200.0 / 3.0).abs() < 1e-9);

    let pu_stats = &stats[1];
    assert_eq!(pu_stats.policy, 6);
    assert_eq!(pu_stats.averages.delay, 6.0);
    assert_eq!(pu_stats.success_rate_percent, 100.0);

    // Pairwise: scenario 1 diff = 2 - 0 = 2 > 1 (AM wins); scenario 2
    // diff = 0 (draw); scenario 3 diff = 6 > 1 (AM wins).
    let comparison = compare_policies(&store, &cfg);
    let tally = comparison.unconditional[&100];
    assert_eq!((tally.p1_wins, tally.p2_wins), (2, 0));
    // Success-aware: scenario 1 has only PU succeeding, so PU takes it.
    let aware = comparison.success_aware[&100];
    assert_eq!((aware.p1_wins, aware.p2_wins, aware.draws), (1, 1, 1));
    // No PU delay win in the unconditional regime, so no extreme case.
    assert!(comparison.extreme.is_none());

    // Reports render without recomputation and with the expected shapes.
    let mut buf = Vec::new();
    report::write_averages(&mut buf, &stats, &cfg).unwrap();
    report::write_delay_comparison(&mut buf, &comparison, &cfg).unwrap();
    report::write_success_delay_comparison(&mut buf, &comparison, &cfg).unwrap();
    report::write_load_accomplishment(&mut buf, &stats, &cfg).unwrap();
    report::write_success_delay(&mut buf, &stats, &cfg).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("policy;load;num_pkt_gen"));
    assert!(text.contains("load (delay_delta = 1);AM;PU;draw"));
    assert!(text.contains("load (throughput_delta_factor = 0.05);AM;PU"));
}

#[test]
fn failed_ingestion_leaves_nothing_reportable() {
    let cfg = study_config();
    let input = format!("{}\nbroken line without separators\n", line(4, 1, 100.0, 4.0));
    let mut store = AggregationStore::new(&cfg);
    let err = ingest_into(input.as_bytes(), &mut store).unwrap_err();
    assert!(err.to_string().starts_with("line 1:"));
    // The partially filled store is discarded by the caller; completeness
    // checking would flag every cell anyway.
    assert_eq!(store.completeness(&cfg).len(), 2);
}
