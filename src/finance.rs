use std::collections::BTreeMap;

use crate::model::Snapshot;

/// Item count per (city, state) pair. Always covers the full item set,
/// including rows the itemized table truncates.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationCount {
    pub city: String,
    pub state: String,
    pub screens: usize,
}

/// Aggregates derived from a snapshot. Never stored; recomputed per request.
#[derive(Clone, Debug)]
pub struct Metrics {
    pub total_screens: usize,
    pub total_daily_audience: f64,
    pub gross_value: f64,
    pub net_value: f64,
    /// Header CPM as quoted, not recomputed from items.
    pub average_cpm: f64,
    pub average_value_per_screen: f64,
    pub locations: Vec<LocationCount>,
}

/// Pure derivation: same snapshot, same numbers. No I/O, no side effects.
pub fn compute(snapshot: &Snapshot) -> Metrics {
    let items = &snapshot.items;
    let header = &snapshot.header;

    let total_screens = items.len();
    let total_daily_audience: f64 = items.iter().map(|i| i.daily_audience).sum();
    let gross_value: f64 = items.iter().map(|i| i.screen_value).sum();

    // Discounts were clamped to >= 0 at snapshot construction, so the net
    // can only fall below the gross, never exceed it.
    let net_value =
        (gross_value * (1.0 - header.discount_pct / 100.0) - header.discount_fixed).max(0.0);

    let average_value_per_screen = if total_screens == 0 {
        0.0
    } else {
        gross_value / total_screens as f64
    };

    // BTreeMap keeps the rollup order deterministic regardless of item order.
    let mut groups: BTreeMap<(String, String), usize> = BTreeMap::new();
    for item in items {
        *groups
            .entry((item.city.clone(), item.state.clone()))
            .or_default() += 1;
    }
    let locations = groups
        .into_iter()
        .map(|((city, state), screens)| LocationCount {
            city,
            state,
            screens,
        })
        .collect();

    Metrics {
        total_screens,
        total_daily_audience,
        gross_value,
        net_value,
        average_cpm: header.cpm_value,
        average_value_per_screen,
        locations,
    }
}
