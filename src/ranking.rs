//! Ranking and truncation of scored items before they reach a chart

/// How a series is ranked for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingPolicy {
    /// Keep at most this many items (`None` keeps all)
    pub top_n: Option<usize>,
    /// Reverse the truncated result so the most important item renders last
    pub reverse: bool,
}

impl RankingPolicy {
    /// Top 15 by absolute score, most important last
    pub const TOP_FEATURES: RankingPolicy = RankingPolicy {
        top_n: Some(15),
        reverse: true,
    };

    pub fn new(top_n: Option<usize>, reverse: bool) -> Self {
        Self { top_n, reverse }
    }

    /// Sort key ranking by magnitude regardless of sign
    pub fn importance_key(score: f64) -> f64 {
        -score.abs()
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self::TOP_FEATURES
    }
}

/// Sort `items` ascending by `sort_fn`, keep the first `top_n`, optionally reverse.
///
/// The sort is stable, so items with equal keys keep their input order.
/// NaN keys rank after every number. The input is never modified.
pub fn sort_take<T, F>(items: &[T], sort_fn: F, top_n: Option<usize>, reverse_results: bool) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    let mut keyed: Vec<(f64, &T)> = items
        .iter()
        .map(|item| {
            let key = sort_fn(item);
            (if key.is_nan() { f64::INFINITY } else { key }, item)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let take = top_n.unwrap_or(keyed.len());
    let mut ranked: Vec<T> = keyed
        .into_iter()
        .take(take)
        .map(|(_, item)| item.clone())
        .collect();

    if reverse_results {
        ranked.reverse();
    }
    ranked
}
