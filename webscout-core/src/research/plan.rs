//! Research layers and the layered search plan.

use serde::{Deserialize, Serialize};

/// One of the four research angles a query is decomposed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Core facts directly answering the query.
    Primary,
    /// Background and surrounding context.
    Secondary,
    /// Claims to fact-check against independent sources.
    Verification,
    /// Latest developments.
    Recent,
}

impl Layer {
    /// All layers in research order.
    pub const ALL: [Layer; 4] = [
        Layer::Primary,
        Layer::Secondary,
        Layer::Verification,
        Layer::Recent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Primary => "primary",
            Layer::Secondary => "secondary",
            Layer::Verification => "verification",
            Layer::Recent => "recent",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A layered search plan: ordered search terms for each research layer.
///
/// Every layer is always present; an empty list means the layer is
/// skipped. Terms are non-empty after trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPlan {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    pub verification: Vec<String>,
    pub recent: Vec<String>,
}

impl SearchPlan {
    /// The degenerate plan used when planning fails: the raw query becomes
    /// the only primary term.
    pub fn fallback(user_query: &str) -> Self {
        Self {
            primary: vec![user_query.trim().to_string()],
            ..Self::default()
        }
    }

    /// Terms for one layer, in search order.
    pub fn terms(&self, layer: Layer) -> &[String] {
        match layer {
            Layer::Primary => &self.primary,
            Layer::Secondary => &self.secondary,
            Layer::Verification => &self.verification,
            Layer::Recent => &self.recent,
        }
    }

    pub fn terms_mut(&mut self, layer: Layer) -> &mut Vec<String> {
        match layer {
            Layer::Primary => &mut self.primary,
            Layer::Secondary => &mut self.secondary,
            Layer::Verification => &mut self.verification,
            Layer::Recent => &mut self.recent,
        }
    }

    /// Whether every layer is empty.
    pub fn is_empty(&self) -> bool {
        Layer::ALL.iter().all(|&layer| self.terms(layer).is_empty())
    }

    /// Total term count across all layers.
    pub fn total_terms(&self) -> usize {
        Layer::ALL.iter().map(|&layer| self.terms(layer).len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_layer_order_is_fixed() {
        assert_eq!(
            Layer::ALL,
            [
                Layer::Primary,
                Layer::Secondary,
                Layer::Verification,
                Layer::Recent
            ]
        );
    }

    #[test]
    fn test_layer_display() {
        assert_eq!(Layer::Primary.to_string(), "primary");
        assert_eq!(Layer::Verification.to_string(), "verification");
    }

    #[test]
    fn test_fallback_plan_shape() {
        let plan = SearchPlan::fallback("  Who founded Instagram  ");
        assert_eq!(plan.primary, vec!["Who founded Instagram".to_string()]);
        assert!(plan.secondary.is_empty());
        assert!(plan.verification.is_empty());
        assert!(plan.recent.is_empty());
    }

    #[test]
    fn test_terms_accessor() {
        let mut plan = SearchPlan::default();
        plan.terms_mut(Layer::Recent).push("latest news".to_string());
        assert_eq!(plan.terms(Layer::Recent), ["latest news".to_string()]);
        assert!(plan.terms(Layer::Primary).is_empty());
    }

    #[test]
    fn test_is_empty_and_total() {
        let mut plan = SearchPlan::default();
        assert!(plan.is_empty());
        assert_eq!(plan.total_terms(), 0);

        plan.primary.push("a".to_string());
        plan.verification.push("b".to_string());
        assert!(!plan.is_empty());
        assert_eq!(plan.total_terms(), 2);
    }
}
