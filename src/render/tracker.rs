use dc_base::types::ResultKind;

/// Which result kinds were already rendered for one request.
///
/// Every renderer call goes through [`RenderState::should_render`]; once a
/// kind is committed it is never rendered again for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderState {
    container_id: u64,
    prediction: bool,
    importance: bool,
    retrieval: bool,
}

impl RenderState {
    pub fn new(container_id: u64) -> Self {
        Self { container_id, prediction: false, importance: false, retrieval: false }
    }

    /// Check-and-set: true exactly once per kind.
    pub fn should_render(&mut self, kind: ResultKind) -> bool {
        let flag = match kind {
            ResultKind::Prediction => &mut self.prediction,
            ResultKind::Importance => &mut self.importance,
            ResultKind::Retrieval => &mut self.retrieval,
        };
        if *flag {
            return false;
        }
        *flag = true;
        true
    }

    pub fn is_rendered(&self, kind: ResultKind) -> bool {
        match kind {
            ResultKind::Prediction => self.prediction,
            ResultKind::Importance => self.importance,
            ResultKind::Retrieval => self.retrieval,
        }
    }

    pub fn any_rendered(&self) -> bool {
        self.prediction || self.importance || self.retrieval
    }

    /// Output region this state belongs to.
    pub fn container_id(&self) -> u64 {
        self.container_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_renders_once() {
        let mut state = RenderState::new(7);
        assert!(!state.any_rendered());
        assert!(state.should_render(ResultKind::Importance));
        assert!(!state.should_render(ResultKind::Importance));
        assert!(!state.should_render(ResultKind::Importance));
        assert!(state.should_render(ResultKind::Prediction));
        assert!(state.any_rendered());
        assert!(!state.is_rendered(ResultKind::Retrieval));
        assert_eq!(state.container_id(), 7);
    }
}
