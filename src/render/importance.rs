use dc_base::catalog;
use dc_base::constants::TOP_RANKED;
use dc_base::types::ImportancePayload;

use super::fragment::{ImportanceRow, ImportanceView};

/// Rows keep the service's order. Widths are relative to the largest score.
pub fn render(payload: &ImportancePayload) -> ImportanceView {
    let max = payload.top_features.iter().map(|(_, score)| *score).fold(0.0_f64, f64::max);

    let rows = payload
        .top_features
        .iter()
        .enumerate()
        .map(|(idx, (feature, score))| ImportanceRow {
            rank: idx + 1,
            feature: feature.clone(),
            label: catalog::feature_label(feature).to_string(),
            score: *score,
            width_percent: relative_width(*score, max),
            value: format!("{:.1}%", score * 100.0),
            top: idx < TOP_RANKED,
        })
        .collect();

    ImportanceView { rows, synthetic: payload.synthetic }
}

pub fn relative_width(score: f64, max: f64) -> u32 {
    if max <= 0.0 || !score.is_finite() {
        return 0;
    }
    (score / max * 100.0).round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(pairs: &[(&str, f64)]) -> ImportancePayload {
        ImportancePayload {
            top_features: pairs.iter().map(|(n, s)| (n.to_string(), *s)).collect(),
            synthetic: false,
        }
    }

    #[test]
    fn widths_ranks_and_top_flags() {
        let view = render(&payload(&[("A", 0.30), ("B", 0.20), ("C", 0.10)]));
        let widths: Vec<u32> = view.rows.iter().map(|r| r.width_percent).collect();
        assert_eq!(widths, vec![100, 67, 33]);
        let ranks: Vec<usize> = view.rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(view.rows.iter().all(|r| r.top));
        assert_eq!(view.rows[0].value, "30.0%");
    }

    #[test]
    fn order_is_not_resorted_and_fourth_is_not_top() {
        let view = render(&payload(&[("A", 0.1), ("B", 0.4), ("C", 0.05), ("D", 0.01)]));
        assert_eq!(view.rows[0].feature, "A");
        assert_eq!(view.rows[1].width_percent, 100);
        assert!(!view.rows[3].top);
    }

    #[test]
    fn labels_come_from_catalog() {
        let view = render(&payload(&[("Process_Pressure", 0.2)]));
        assert_eq!(view.rows[0].label, "Injection pressure");
    }

    #[test]
    fn empty_and_zero_scores_are_safe() {
        assert!(render(&payload(&[])).rows.is_empty());
        assert_eq!(render(&payload(&[("A", 0.0)])).rows[0].width_percent, 0);
    }
}
