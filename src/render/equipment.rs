use dc_base::catalog;
use dc_base::constants::EQUIPMENT_FEATURE_WINDOW;
use dc_base::types::ImportancePayload;

use super::fragment::EquipmentCard;

/// One card per distinct subsystem behind the top features, first-seen order.
pub fn render(payload: &ImportancePayload) -> Vec<EquipmentCard> {
    let mut cards: Vec<EquipmentCard> = Vec::new();

    for (feature, _) in payload.top_features.iter().take(EQUIPMENT_FEATURE_WINDOW) {
        let Some(key) = catalog::equipment_key_for(feature) else {
            continue;
        };
        if let Some(card) = cards.iter_mut().find(|c| c.key == key) {
            card.features.push(feature.clone());
            continue;
        }
        let Some(spec) = catalog::equipment(key) else {
            continue;
        };
        cards.push(EquipmentCard {
            key: key.to_string(),
            name: spec.name.clone(),
            name_en: spec.name_en.clone(),
            description: spec.description.clone(),
            action: spec.action.clone(),
            features: vec![feature.clone()],
        });
    }

    cards
}
