use serde::Serialize;

/// Chart-ready payload: two parallel sequences of equal length, chronological
/// order preserved from the input series. Pure reshaping, no aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    pub fn from_series<I>(series: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut labels = Vec::new();
        let mut values = Vec::new();
        for (label, value) in series {
            labels.push(label);
            values.push(value);
        }
        Self { labels, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_values_stay_parallel() {
        let chart = ChartData::from_series(vec![
            ("2024-01".to_string(), 30.0),
            ("2024-02".to_string(), 40.0),
        ]);
        assert_eq!(chart.labels.len(), chart.values.len());
        assert_eq!(chart.labels, vec!["2024-01", "2024-02"]);
        assert_eq!(chart.values, vec![30.0, 40.0]);
    }

    #[test]
    fn empty_series_produces_empty_chart() {
        let chart = ChartData::from_series(Vec::new());
        assert!(chart.labels.is_empty());
        assert!(chart.values.is_empty());
    }
}
