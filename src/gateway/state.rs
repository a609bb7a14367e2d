use std::sync::Arc;

use crate::gate::ContentModerationGate;

#[derive(Clone)]
pub struct HandlerState {
    pub gate: Arc<ContentModerationGate>,

    /// Upper bound on `top_k` for recommendation requests.
    pub max_recommendations: usize,
}

impl HandlerState {
    pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 20;

    pub fn new(gate: Arc<ContentModerationGate>) -> Self {
        Self {
            gate,
            max_recommendations: Self::DEFAULT_MAX_RECOMMENDATIONS,
        }
    }
}
