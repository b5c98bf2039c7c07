//! Point values credited by match and bye reporting.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Points awarded per outcome.
///
/// A bye is credited like a win by default but never counts as a played match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub win_points: i64,
    pub draw_points: i64,
    pub loss_points: i64,
    pub bye_points: i64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            win_points: 3,
            draw_points: 1,
            loss_points: 0,
            bye_points: 3,
        }
    }
}

/// Inconsistent point table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringRulesError {
    NegativePoints(&'static str),
    /// Points must not decrease from loss to draw to win.
    OutcomeOrder,
}

impl Display for ScoringRulesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativePoints(field) => {
                write!(f, "scoring field `{field}` must not be negative")
            }
            Self::OutcomeOrder => write!(
                f,
                "scoring must satisfy loss_points <= draw_points <= win_points"
            ),
        }
    }
}

impl Error for ScoringRulesError {}

impl ScoringRules {
    pub fn validate(&self) -> Result<(), ScoringRulesError> {
        for (field, value) in [
            ("win_points", self.win_points),
            ("draw_points", self.draw_points),
            ("loss_points", self.loss_points),
            ("bye_points", self.bye_points),
        ] {
            if value < 0 {
                return Err(ScoringRulesError::NegativePoints(field));
            }
        }
        if self.loss_points > self.draw_points || self.draw_points > self.win_points {
            return Err(ScoringRulesError::OutcomeOrder);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ScoringRules, ScoringRulesError};

    #[test]
    fn default_rules_credit_bye_like_win() {
        let rules = ScoringRules::default();
        assert_eq!(rules.bye_points, rules.win_points);
        assert_eq!((rules.win_points, rules.draw_points, rules.loss_points), (3, 1, 0));
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn negative_points_are_rejected() {
        let rules = ScoringRules {
            bye_points: -1,
            ..ScoringRules::default()
        };
        assert_eq!(
            rules.validate().unwrap_err(),
            ScoringRulesError::NegativePoints("bye_points")
        );
    }

    #[test]
    fn draw_worth_more_than_win_is_rejected() {
        let rules = ScoringRules {
            draw_points: 4,
            ..ScoringRules::default()
        };
        assert_eq!(rules.validate().unwrap_err(), ScoringRulesError::OutcomeOrder);
    }
}
