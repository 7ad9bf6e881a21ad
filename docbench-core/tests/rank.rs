use docbench_core::contract::DocumentationResult;
use docbench_core::rank::{best_balance, fastest, most_detailed, rank, RankingSummary};

fn outcome(success: bool, time: u64, tokens: Option<u64>) -> DocumentationResult {
    DocumentationResult {
        success,
        documentation: success.then(|| "doc".to_string()),
        model_used: format!("m-{time}"),
        provider_used: "p".into(),
        error: (!success).then(|| "failed".to_string()),
        generation_time_ms: time,
        token_count: tokens,
    }
}

#[test]
fn test_successes_first_then_fastest() {
    let mut results = vec![outcome(true, 50, Some(1)), outcome(false, 5, None), outcome(true, 10, Some(1))];
    rank(&mut results);
    let order: Vec<(bool, u64)> = results.iter().map(|r| (r.success, r.generation_time_ms)).collect();
    assert_eq!(order, vec![(true, 10), (true, 50), (false, 5)]);
}

#[test]
fn test_best_balance_prefers_higher_ratio() {
    let results = vec![outcome(true, 50, Some(100)), outcome(true, 100, Some(400))];
    assert_eq!(best_balance(&results).unwrap().generation_time_ms, 100);
    assert_eq!(most_detailed(&results).unwrap().token_count, Some(400));
    assert_eq!(fastest(&results).unwrap().generation_time_ms, 50);
}

#[test]
fn test_zero_time_counts_as_one_millisecond() {
    let results = vec![outcome(true, 0, Some(10)), outcome(true, 2, Some(30))];
    assert_eq!(best_balance(&results).unwrap().generation_time_ms, 2);
}

#[test]
fn test_views_report_no_data_without_successes() {
    let results = vec![outcome(false, 1, None)];
    assert!(fastest(&results).is_none());
    assert!(most_detailed(&results).is_none());
    assert!(best_balance(&results).is_none());

    let summary = RankingSummary::from_results(&results, 2);
    assert_eq!(summary.total_tasks, 3);
    assert_eq!(summary.failed, 1);
    assert!(summary.fastest.is_none());
}
