use dc_base::catalog;
use dc_base::config::IntentRule;
use dc_base::types::Intent;

/// Keyword heuristic over the catalog's ordered rules. First match wins;
/// anything unmatched is a knowledge lookup.
pub fn classify_intent(question: &str) -> Intent {
    classify_with(question, catalog::intent_rules())
}

pub fn classify_with(question: &str, rules: &[IntentRule]) -> Intent {
    let question = question.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| question.contains(&k.to_lowercase())))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Knowledge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_beats_explanation() {
        assert_eq!(classify_intent("불량 원인이 뭐야?"), Intent::Prediction);
        assert_eq!(classify_intent("Why is the defect rate high?"), Intent::Prediction);
    }

    #[test]
    fn explanation_keywords() {
        assert_eq!(classify_intent("어떤 변수가 가장 영향이 커?"), Intent::Explanation);
        assert_eq!(classify_intent("Which factor has the biggest impact?"), Intent::Explanation);
    }

    #[test]
    fn knowledge_is_the_default() {
        assert_eq!(classify_intent("권장 사출 압력 범위는?"), Intent::Knowledge);
        assert_eq!(classify_intent("hello there"), Intent::Knowledge);
    }

    #[test]
    fn rules_are_plain_data() {
        let rules = vec![
            IntentRule { intent: Intent::Explanation, keywords: vec!["alpha".into()] },
            IntentRule { intent: Intent::Prediction, keywords: vec!["ALPHA".into(), "beta".into()] },
        ];
        assert_eq!(classify_with("Alpha and beta", &rules), Intent::Explanation);
        assert_eq!(classify_with("just beta", &rules), Intent::Prediction);
    }
}
