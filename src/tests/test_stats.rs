use std::collections::BTreeMap;

use crate::results::RankRow;
use crate::stats::{
    wilcoxon_rank_preds, PairedSignificanceTest, StatsError, WilcoxonSignedRank,
};
use crate::tests::init_logger;

use approx::assert_relative_eq;

fn rows(subject: &str, ranks: &[f64]) -> Vec<RankRow> {
    ranks
        .iter()
        .map(|&rank| RankRow {
            subject: subject.to_string(),
            rank,
        })
        .collect()
}

#[test]
fn wilcoxon_one_sided_shift() {
    init_logger();
    // All differences positive with ranks 1..=5: W- = 0, so W = 0,
    // z = (0 - 7.5) / sqrt(13.75) and the two-sided p is about 0.0431.
    let a = [2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [1.0, 1.0, 1.0, 1.0, 1.0];

    let outcome = WilcoxonSignedRank.test(&a, &b).unwrap();
    assert_relative_eq!(outcome.statistic, 0.0);
    assert_relative_eq!(outcome.p_value, 0.0431, max_relative = 2e-2);
}

#[test]
fn wilcoxon_midranks_for_ties() {
    // Differences [1, -1, 2]: the two unit differences share midrank 1.5,
    // so W+ = 1.5 + 3 = 4.5 and W- = 1.5.
    let a = [1.0, 0.0, 2.0];
    let b = [0.0, 1.0, 0.0];

    let outcome = WilcoxonSignedRank.test(&a, &b).unwrap();
    assert_relative_eq!(outcome.statistic, 1.5);
    assert!(outcome.p_value > 0.0 && outcome.p_value <= 1.0);
}

#[test]
fn wilcoxon_drops_zero_differences() {
    let a = [1.0, 2.0, 3.0];
    let b = [1.0, 1.0, 3.0];

    let outcome = WilcoxonSignedRank.test(&a, &b).unwrap();
    // Only one nonzero difference survives.
    assert_relative_eq!(outcome.statistic, 0.0);
    assert!(outcome.p_value > 0.0 && outcome.p_value <= 1.0);
}

#[test]
fn wilcoxon_symmetric_samples_have_high_p() {
    let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];

    let outcome = WilcoxonSignedRank.test(&a, &b).unwrap();
    assert!(outcome.p_value > 0.5, "p = {}", outcome.p_value);
}

#[test]
fn wilcoxon_error_cases() {
    assert_eq!(
        WilcoxonSignedRank.test(&[1.0], &[1.0, 2.0]).unwrap_err(),
        StatsError::LengthMismatch { left: 1, right: 2 }
    );
    assert_eq!(
        WilcoxonSignedRank.test(&[], &[]).unwrap_err(),
        StatsError::EmptySample
    );
    assert_eq!(
        WilcoxonSignedRank.test(&[1.0, 2.0], &[1.0, 2.0]).unwrap_err(),
        StatsError::DegenerateSample
    );
}

fn two_model_tables() -> BTreeMap<String, Vec<RankRow>> {
    let mut tables = BTreeMap::new();

    let mut bert = rows("M02", &[3.0, 1.0, 4.0, 2.0, 0.0, 5.0]);
    bert.extend(rows("M04", &[10.0, 12.0, 8.0, 9.0, 11.0, 7.0]));
    tables.insert("bert".to_string(), bert);

    let mut glove = rows("M02", &[30.0, 25.0, 40.0, 22.0, 18.0, 35.0]);
    glove.extend(rows("M04", &[50.0, 48.0, 52.0, 47.0, 49.0, 51.0]));
    tables.insert("glove".to_string(), glove);

    tables
}

#[test]
fn rank_preds_compares_all_pairs_per_subject() {
    let tables = two_model_tables();

    let results =
        wilcoxon_rank_preds(&tables, None, false, &WilcoxonSignedRank).unwrap();

    // One model pair, two subjects.
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.model_a == "bert" && r.model_b == "glove"));
    assert_eq!(results[0].subject, "M02");
    assert_eq!(results[1].subject, "M04");
    assert!(results.iter().all(|r| r.p_corrected.is_none()));
    // bert ranks are uniformly lower (better); the shift should be visible.
    assert!(results.iter().all(|r| r.p_value < 0.1));
}

#[test]
fn rank_preds_bonferroni_correction() {
    let tables = two_model_tables();

    let results =
        wilcoxon_rank_preds(&tables, None, true, &WilcoxonSignedRank).unwrap();

    for result in &results {
        let corrected = result.p_corrected.expect("correction requested");
        assert_relative_eq!(corrected, result.p_value * results.len() as f64);
    }
}

#[test]
fn rank_preds_skips_unshared_subjects() {
    let mut tables = two_model_tables();
    tables
        .get_mut("bert")
        .unwrap()
        .extend(rows("M07", &[1.0, 2.0, 3.0]));

    let results =
        wilcoxon_rank_preds(&tables, None, false, &WilcoxonSignedRank).unwrap();
    assert!(results.iter().all(|r| r.subject != "M07"));
}

#[test]
fn rank_preds_rejects_unknown_model() {
    let tables = two_model_tables();
    let pairs = vec![("bert".to_string(), "elmo".to_string())];

    let err = wilcoxon_rank_preds(&tables, Some(&pairs), false, &WilcoxonSignedRank)
        .unwrap_err();
    assert_eq!(err, StatsError::UnknownModel("elmo".to_string()));
}
