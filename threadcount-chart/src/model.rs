use serde::Serialize;
use serde_json::{Value, json};
use threadcount_history::History;

/// Chart.js line chart description.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ChartData,
    pub options: Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<u64>,
    pub fill: bool,
    pub point_radius: u32,
}

impl Dataset {
    fn line(label: impl Into<String>, data: Vec<u64>) -> Self {
        Self {
            label: label.into(),
            data,
            fill: false,
            point_radius: 0,
        }
    }
}

/// Build a line chart of total accounts, one dataset per series plus the combined sum.
///
/// Series are aligned on the timestamps of the longest history: every other
/// series contributes its sample nearest in time. Empty series are skipped;
/// `None` when there is nothing to plot.
pub fn build_chart(series: &[(&str, &History)], title: &str) -> Option<ChartDefinition> {
    let plotted: Vec<&(&str, &History)> = series.iter().filter(|(_, h)| !h.is_empty()).collect();
    let reference = plotted.iter().map(|(_, h)| *h).max_by_key(|h| h.len())?;

    let labels = reference
        .samples()
        .iter()
        .map(|s| s.date.format("%b %d %H:%M").to_string())
        .collect();

    let mut datasets: Vec<Dataset> = plotted
        .iter()
        .map(|(name, history)| {
            let values = reference
                .samples()
                .iter()
                .map(|at| history.closest(at.date).map_or(0, |s| s.users.total))
                .collect();
            Dataset::line(*name, values)
        })
        .collect();

    if datasets.len() > 1 {
        let combined: Vec<u64> = (0..reference.len())
            .map(|i| datasets.iter().map(|d| d.data[i]).sum::<u64>())
            .collect();
        datasets.push(Dataset::line("Combined", combined));
    }

    Some(ChartDefinition {
        kind: "line",
        data: ChartData { labels, datasets },
        options: json!({
            "plugins": { "title": { "display": true, "text": title } },
            "scales": { "y": { "beginAtZero": false } }
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use threadcount_history::{Sample, UserCount};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 20, 0, 0, 0).unwrap()
    }

    fn series(offset_min: i64, totals: &[u64]) -> History {
        totals
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Sample::new(
                    t0() + Duration::minutes(offset_min + 60 * i as i64),
                    UserCount::new(*t, 0),
                )
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn nothing_to_plot() {
        let empty = History::new();
        assert!(build_chart(&[("lemmy", &empty)], "t").is_none());
        assert!(build_chart(&[], "t").is_none());
    }

    #[test]
    fn aligns_shorter_series_on_nearest_sample() {
        let lemmy = series(0, &[100, 110, 120]);
        // kbin started one hour later and is offset by a couple of minutes.
        let kbin = series(62, &[50, 55]);
        let chart = build_chart(&[("Lemmy", &lemmy), ("kbin", &kbin)], "Accounts").unwrap();

        assert_eq!(chart.data.labels, vec!["Jun 20 00:00", "Jun 20 01:00", "Jun 20 02:00"]);
        assert_eq!(chart.data.datasets.len(), 3);
        assert_eq!(chart.data.datasets[0].data, vec![100, 110, 120]);
        assert_eq!(chart.data.datasets[1].data, vec![50, 50, 55]);
        assert_eq!(chart.data.datasets[2].label, "Combined");
        assert_eq!(chart.data.datasets[2].data, vec![150, 160, 175]);
    }

    #[test]
    fn single_series_has_no_combined_line() {
        let lemmy = series(0, &[1, 2]);
        let empty = History::new();
        let chart = build_chart(&[("Lemmy", &lemmy), ("kbin", &empty)], "t").unwrap();
        assert_eq!(chart.data.datasets.len(), 1);
    }

    #[test]
    fn serializes_as_chartjs() {
        let lemmy = series(0, &[1]);
        let v = serde_json::to_value(build_chart(&[("Lemmy", &lemmy)], "t").unwrap()).unwrap();
        assert_eq!(v["type"], "line");
        assert_eq!(v["data"]["datasets"][0]["pointRadius"], 0);
        assert_eq!(v["options"]["plugins"]["title"]["text"], "t");
    }
}
