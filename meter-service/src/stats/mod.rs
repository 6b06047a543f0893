use meter_store::{Reading, Receipt};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// How to treat a negative consumption delta (meter reset or correction).
/// `Raw` surfaces it as-is, `ClampZero` floors it at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaPolicy {
    #[default]
    Raw,
    ClampZero,
}

impl DeltaPolicy {
    fn apply(self, delta: f64) -> f64 {
        match self {
            Self::Raw => delta,
            Self::ClampZero => delta.max(0.0),
        }
    }
}

/// Grouping key for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucketing {
    Day,
    Month,
}

/// Consumption between two consecutive readings, tagged with the later
/// reading's timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    pub ts: OffsetDateTime,
    pub kwh: f64,
}

/// kWh differences between consecutive readings. Input must be sorted by
/// `created_at` ascending. The first reading has no delta, so the output has
/// length `readings.len() - 1` (and is empty for fewer than two readings).
pub fn consumption_deltas(readings: &[Reading], policy: DeltaPolicy) -> Vec<Delta> {
    readings
        .windows(2)
        .map(|pair| Delta {
            ts: pair[1].created_at,
            kwh: policy.apply(pair[1].kwh - pair[0].kwh),
        })
        .collect()
}

/// Per-reading delta series for charting, labelled `YYYY-MM-DD HH:MM`.
pub fn delta_series(readings: &[Reading], policy: DeltaPolicy) -> Vec<(String, f64)> {
    consumption_deltas(readings, policy)
        .into_iter()
        .map(|d| (minute_label(d.ts), round4(d.kwh)))
        .collect()
}

/// Sum deltas per bucket, chronological order. The bucket containing only the
/// very first reading yields nothing, since that reading has no delta.
pub fn bucket_deltas(
    readings: &[Reading],
    bucketing: Bucketing,
    policy: DeltaPolicy,
) -> Vec<(String, f64)> {
    let mut buckets: Vec<(String, f64)> = Vec::new();

    for delta in consumption_deltas(readings, policy) {
        let label = bucket_label(delta.ts, bucketing);
        match buckets.last_mut() {
            Some((last, sum)) if *last == label => *sum += delta.kwh,
            _ => buckets.push((label, delta.kwh)),
        }
    }

    for (_, sum) in &mut buckets {
        *sum = round4(*sum);
    }
    buckets
}

/// Total amount per billing period, first-seen order. Periods are not assumed
/// unique; duplicates are summed.
pub fn receipt_totals(receipts: &[Receipt]) -> Vec<(String, f64)> {
    let mut totals: Vec<((Date, Date), f64)> = Vec::new();

    for r in receipts {
        let key = (r.period_start, r.period_end);
        match totals.iter_mut().find(|(k, _)| *k == key) {
            Some((_, sum)) => *sum += r.amount,
            None => totals.push((key, r.amount)),
        }
    }

    totals
        .into_iter()
        .map(|((start, end), sum)| (period_label(start, end), sum))
        .collect()
}

/// Cost summary for one billing period: consumption inside the period and the
/// resulting average price per kWh (absent when no consumption fell inside).
#[derive(Debug, Clone, Serialize)]
pub struct PeriodCost {
    pub label: String,
    pub total_kwh: f64,
    pub amount: f64,
    pub avg_cost: Option<f64>,
}

/// Attribute each delta to the receipt periods whose date range covers the
/// later reading's date, and derive an average cost per kWh.
pub fn period_costs(
    readings: &[Reading],
    receipts: &[Receipt],
    policy: DeltaPolicy,
) -> Vec<PeriodCost> {
    let deltas = consumption_deltas(readings, policy);

    receipts
        .iter()
        .map(|r| {
            let total_kwh: f64 = deltas
                .iter()
                .filter(|d| {
                    let day = d.ts.date();
                    day >= r.period_start && day <= r.period_end
                })
                .map(|d| d.kwh)
                .sum();
            let total_kwh = round4(total_kwh);

            PeriodCost {
                label: period_label(r.period_start, r.period_end),
                total_kwh,
                amount: r.amount,
                avg_cost: (total_kwh > 0.0).then(|| round4(r.amount / total_kwh)),
            }
        })
        .collect()
}

pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

fn minute_label(ts: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute()
    )
}

fn bucket_label(ts: OffsetDateTime, bucketing: Bucketing) -> String {
    match bucketing {
        Bucketing::Day => format!(
            "{:04}-{:02}-{:02}",
            ts.year(),
            u8::from(ts.month()),
            ts.day()
        ),
        Bucketing::Month => format!("{:04}-{:02}", ts.year(), u8::from(ts.month())),
    }
}

fn period_label(start: Date, end: Date) -> String {
    format!("{start} to {end}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn reading(ts: OffsetDateTime, kwh: f64) -> Reading {
        Reading {
            id: 0,
            created_at: ts,
            kwh,
            description: None,
        }
    }

    fn receipt(start: Date, end: Date, amount: f64) -> Receipt {
        Receipt {
            id: 0,
            period_start: start,
            period_end: end,
            amount,
            notes: None,
        }
    }

    #[test]
    fn deltas_skip_the_first_reading() {
        let readings = vec![
            reading(datetime!(2024-01-01 00:00:00 UTC), 100.0),
            reading(datetime!(2024-02-01 00:00:00 UTC), 150.0),
            reading(datetime!(2024-03-01 00:00:00 UTC), 180.0),
        ];

        let deltas = consumption_deltas(&readings, DeltaPolicy::Raw);
        assert_eq!(deltas.len(), readings.len() - 1);
        assert_eq!(deltas[0].kwh, 50.0);
        assert_eq!(deltas[1].kwh, 30.0);
        assert_eq!(deltas[0].ts, datetime!(2024-02-01 00:00:00 UTC));
    }

    #[test]
    fn fewer_than_two_readings_yield_no_deltas() {
        assert!(consumption_deltas(&[], DeltaPolicy::Raw).is_empty());
        let one = vec![reading(datetime!(2024-01-01 00:00:00 UTC), 100.0)];
        assert!(consumption_deltas(&one, DeltaPolicy::Raw).is_empty());
    }

    #[test]
    fn negative_delta_policy_is_honored() {
        let readings = vec![
            reading(datetime!(2024-01-01 00:00:00 UTC), 100.0),
            reading(datetime!(2024-02-01 00:00:00 UTC), 40.0),
        ];

        let raw = consumption_deltas(&readings, DeltaPolicy::Raw);
        assert_eq!(raw[0].kwh, -60.0);

        let clamped = consumption_deltas(&readings, DeltaPolicy::ClampZero);
        assert_eq!(clamped[0].kwh, 0.0);
    }

    #[test]
    fn monthly_buckets_sum_deltas_in_order() {
        let readings = vec![
            reading(datetime!(2024-01-01 00:00:00 UTC), 100.0),
            reading(datetime!(2024-01-15 00:00:00 UTC), 120.0),
            reading(datetime!(2024-01-31 00:00:00 UTC), 130.0),
            reading(datetime!(2024-02-10 00:00:00 UTC), 170.0),
        ];

        let buckets = bucket_deltas(&readings, Bucketing::Month, DeltaPolicy::Raw);
        assert_eq!(
            buckets,
            vec![("2024-01".to_string(), 30.0), ("2024-02".to_string(), 40.0)]
        );
    }

    #[test]
    fn receipt_totals_sum_duplicate_periods() {
        let receipts = vec![
            receipt(date!(2024 - 01 - 01), date!(2024 - 03 - 01), 50.0),
            receipt(date!(2024 - 01 - 01), date!(2024 - 03 - 01), 5.0),
            receipt(date!(2024 - 03 - 01), date!(2024 - 05 - 01), 47.0),
        ];

        let totals = receipt_totals(&receipts);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0], ("2024-01-01 to 2024-03-01".to_string(), 55.0));
        assert_eq!(totals[1], ("2024-03-01 to 2024-05-01".to_string(), 47.0));
    }

    #[test]
    fn period_cost_averages_amount_over_contained_deltas() {
        let readings = vec![
            reading(datetime!(2024-01-01 00:00:00 UTC), 100.0),
            reading(datetime!(2024-01-20 00:00:00 UTC), 150.0),
            reading(datetime!(2024-02-20 00:00:00 UTC), 200.0),
        ];
        let receipts = vec![receipt(date!(2024 - 01 - 01), date!(2024 - 03 - 01), 50.0)];

        let costs = period_costs(&readings, &receipts, DeltaPolicy::Raw);
        assert_eq!(costs.len(), 1);
        assert_eq!(costs[0].total_kwh, 100.0);
        assert_eq!(costs[0].avg_cost, Some(0.5));
    }

    #[test]
    fn period_cost_is_absent_without_contained_deltas() {
        let readings = vec![reading(datetime!(2024-06-01 00:00:00 UTC), 100.0)];
        let receipts = vec![receipt(date!(2024 - 01 - 01), date!(2024 - 03 - 01), 50.0)];

        let costs = period_costs(&readings, &receipts, DeltaPolicy::Raw);
        assert_eq!(costs[0].total_kwh, 0.0);
        assert_eq!(costs[0].avg_cost, None);
    }

    #[test]
    fn delta_series_labels_match_values() {
        let readings = vec![
            reading(datetime!(2024-01-01 08:30:00 UTC), 100.0),
            reading(datetime!(2024-02-01 09:45:00 UTC), 150.0),
        ];

        let series = delta_series(&readings, DeltaPolicy::Raw);
        assert_eq!(series, vec![("2024-02-01 09:45".to_string(), 50.0)]);
    }
}
