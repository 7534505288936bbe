use pf_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::signal::SignalDetection;

/// One condition as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConditionRecord {
    #[serde(flatten)]
    counts: SignalDetection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExperimentFile {
    conditions: Vec<ConditionRecord>,
}

/// Ordered collection of experimental conditions.
///
/// Insertion order is preserved; it is the order in which item-response models
/// align conditions with their difficulty levels.
#[derive(Debug, Clone, Default)]
pub struct Experiment {
    conditions: Vec<SignalDetection>,
    labels: Vec<Option<String>>,
}

impl Experiment {
    /// Create an empty experiment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an experiment from unlabelled conditions.
    pub fn from_conditions(conditions: impl IntoIterator<Item = SignalDetection>) -> Self {
        let conditions: Vec<SignalDetection> = conditions.into_iter().collect();
        let labels = vec![None; conditions.len()];
        Self { conditions, labels }
    }

    /// Append a condition with an optional label.
    pub fn add_condition(&mut self, sdt: SignalDetection, label: Option<String>) {
        self.conditions.push(sdt);
        self.labels.push(label);
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// `true` if no condition has been added.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Conditions in insertion order.
    pub fn conditions(&self) -> &[SignalDetection] {
        &self.conditions
    }

    /// Labels, aligned with [`Experiment::conditions`].
    pub fn labels(&self) -> &[Option<String>] {
        &self.labels
    }

    /// Iterate `(condition, label)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&SignalDetection, Option<&str>)> {
        self.conditions.iter().zip(self.labels.iter().map(|l| l.as_deref()))
    }

    /// ROC coordinates `(false_alarm_rates, hit_rates)`, one point per condition,
    /// sorted by false-alarm rate (ties broken by hit rate).
    pub fn sorted_roc_points(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        self.ensure_non_empty()?;
        let mut points: Vec<(f64, f64)> =
            self.conditions.iter().map(|c| (c.false_alarm_rate(), c.hit_rate())).collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        Ok(points.into_iter().unzip())
    }

    /// Area under the ROC curve by the trapezoidal rule.
    ///
    /// The sorted condition points are anchored at `(0, 0)` and `(1, 1)`, so a
    /// single chance-level condition yields 0.5.
    pub fn compute_auc(&self) -> Result<f64> {
        let (far, hr) = self.sorted_roc_points()?;
        let xs = std::iter::once(0.0).chain(far).chain(std::iter::once(1.0));
        let ys = std::iter::once(0.0).chain(hr).chain(std::iter::once(1.0));
        let pts: Vec<(f64, f64)> = xs.zip(ys).collect();
        Ok(pts.windows(2).map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) * 0.5).sum())
    }

    /// Load an experiment from JSON.
    ///
    /// Format: `{"conditions": [{"hits": .., "misses": .., "false_alarms": ..,
    /// "correct_rejections": .., "label": ..}, ...]}`. Counts are validated.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ExperimentFile = serde_json::from_str(json)?;
        let (conditions, labels) = file.conditions.into_iter().map(|r| (r.counts, r.label)).unzip();
        Ok(Self { conditions, labels })
    }

    /// Serialize the experiment to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        let file = ExperimentFile {
            conditions: self
                .iter()
                .map(|(c, l)| ConditionRecord { counts: *c, label: l.map(str::to_string) })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    fn ensure_non_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidArgument("experiment has no conditions".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sdt(h: f64, m: f64, fa: f64, cr: f64) -> SignalDetection {
        SignalDetection::new(h, m, fa, cr).unwrap()
    }

    #[test]
    fn test_add_condition() {
        let mut exp = Experiment::new();
        exp.add_condition(sdt(40.0, 10.0, 20.0, 30.0), Some("Condition A".to_string()));
        assert_eq!(exp.len(), 1);
        assert_eq!(exp.labels()[0].as_deref(), Some("Condition A"));
    }

    #[test]
    fn test_add_condition_no_label() {
        let mut exp = Experiment::new();
        exp.add_condition(sdt(40.0, 10.0, 20.0, 30.0), None);
        assert_eq!(exp.len(), 1);
        assert!(exp.labels()[0].is_none());
    }

    #[test]
    fn test_sorted_roc_points() {
        let mut exp = Experiment::new();
        exp.add_condition(sdt(90.0, 10.0, 30.0, 70.0), Some("High".into()));
        exp.add_condition(sdt(50.0, 50.0, 10.0, 90.0), Some("Low".into()));
        let (far, hr) = exp.sorted_roc_points().unwrap();
        assert_eq!(far.len(), 2);
        assert_eq!(hr.len(), 2);
        assert!(far[0] < far[1]);
        assert!(hr[0] < hr[1]);
        // Insertion order is untouched.
        assert_eq!(exp.labels()[0].as_deref(), Some("High"));
    }

    #[test]
    fn test_compute_auc_chance() {
        let mut exp = Experiment::new();
        exp.add_condition(sdt(0.0, 100.0, 0.0, 100.0), Some("Low".into()));
        exp.add_condition(sdt(100.0, 0.0, 100.0, 0.0), Some("High".into()));
        assert_relative_eq!(exp.compute_auc().unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_compute_auc_perfect() {
        let mut exp = Experiment::new();
        exp.add_condition(sdt(0.0, 100.0, 0.0, 100.0), Some("Low".into()));
        exp.add_condition(sdt(100.0, 0.0, 0.0, 100.0), Some("Mid".into()));
        exp.add_condition(sdt(100.0, 0.0, 100.0, 0.0), Some("High".into()));
        assert_relative_eq!(exp.compute_auc().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_auc_realistic_data() {
        let mut exp = Experiment::new();
        exp.add_condition(sdt(80.0, 20.0, 30.0, 70.0), Some("Condition 1".into()));
        exp.add_condition(sdt(60.0, 40.0, 40.0, 60.0), Some("Condition 2".into()));
        exp.add_condition(sdt(40.0, 60.0, 50.0, 50.0), Some("Condition 3".into()));
        let auc = exp.compute_auc().unwrap();
        assert!(0.5 < auc && auc < 1.0, "auc = {auc}");
    }

    #[test]
    fn test_multiple_conditions() {
        let exp = Experiment::from_conditions([
            sdt(40.0, 10.0, 20.0, 30.0),
            sdt(30.0, 20.0, 20.0, 30.0),
            sdt(25.0, 25.0, 20.0, 30.0),
        ]);
        let auc = exp.compute_auc().unwrap();
        assert!(0.0 < auc && auc < 1.0);
        assert_eq!(exp.len(), 3);
        assert!(exp.labels().iter().all(Option::is_none));
    }

    #[test]
    fn test_empty_queries_fail() {
        let exp = Experiment::new();
        assert!(matches!(exp.sorted_roc_points(), Err(Error::InvalidArgument(_))));
        assert!(matches!(exp.compute_auc(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_json_roundtrip_preserves_order_and_labels() {
        let mut exp = Experiment::new();
        exp.add_condition(sdt(55.0, 45.0, 45.0, 55.0), Some("hard".into()));
        exp.add_condition(sdt(95.0, 5.0, 5.0, 95.0), None);
        let json = exp.to_json_string().unwrap();
        let back = Experiment::from_json_str(&json).unwrap();
        assert_eq!(back.conditions(), exp.conditions());
        assert_eq!(back.labels(), exp.labels());
    }

    #[test]
    fn test_json_rejects_negative_counts() {
        let json = r#"{"conditions":[{"hits":1,"misses":-2,"false_alarms":0,"correct_rejections":3}]}"#;
        assert!(matches!(Experiment::from_json_str(json), Err(Error::Json(_))));
    }
}
