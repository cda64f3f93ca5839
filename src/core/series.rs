use super::types::{SamplePoint, Trajectory};

const YEAR_MATCH_EPS: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub labels: Vec<f64>,
    pub series: Vec<Vec<f64>>,
}

pub fn align(a: &Trajectory, b: &Trajectory) -> AlignedSeries {
    align_all(&[a, b])
}

pub fn align_all(trajectories: &[&Trajectory]) -> AlignedSeries {
    let max_year = trajectories
        .iter()
        .map(|t| t.last_year())
        .fold(0.0, f64::max);
    let labels = build_labels(max_year);
    let series = trajectories
        .iter()
        .map(|t| resample(t, &labels, |p| p.loan_balance))
        .collect();
    AlignedSeries { labels, series }
}

pub fn build_labels(max_year: f64) -> Vec<f64> {
    let whole_years = max_year.max(0.0).floor() as u32;
    let mut labels: Vec<f64> = (0..=whole_years).map(f64::from).collect();
    if max_year.fract() > 0.0 {
        let rounded = (max_year * 100.0).round() / 100.0;
        if labels.last().is_some_and(|&last| rounded > last) {
            labels.push(rounded);
        }
    }
    labels
}

pub fn resample<F>(trajectory: &Trajectory, labels: &[f64], value: F) -> Vec<f64>
where
    F: Fn(&SamplePoint) -> f64,
{
    labels
        .iter()
        .map(|&label| sample_at(&trajectory.points, label, &value))
        .collect()
}

pub fn offset_total_series(trajectory: &Trajectory, labels: &[f64]) -> Vec<f64> {
    resample(trajectory, labels, |p| p.offset_balances.iter().sum())
}

pub fn offset_account_series(trajectory: &Trajectory, account: usize, labels: &[f64]) -> Vec<f64> {
    resample(trajectory, labels, |p| {
        p.offset_balances.get(account).copied().unwrap_or(0.0)
    })
}

fn sample_at<F>(points: &[SamplePoint], label: f64, value: &F) -> f64
where
    F: Fn(&SamplePoint) -> f64,
{
    let mut held = None;
    for point in points {
        if (point.year - label).abs() <= YEAR_MATCH_EPS {
            return value(point);
        }
        if point.year > label {
            break;
        }
        held = Some(value(point));
    }
    held.unwrap_or_else(|| points.first().map(value).unwrap_or(0.0))
}
