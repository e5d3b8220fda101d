//! Goals: hierarchical desired outcomes, keyword-driven decomposition templates
//! and the achievement scoring rule.
//!
//! Goals are Concept atoms in the graph whose belief strength reads as
//! achievement. The manager keeps a [`GoalRecord`] per goal for the parts the
//! graph does not encode directly (suspension, decomposition state).

use serde::{Deserialize, Serialize};

use crate::belief::BeliefValue;
use crate::graph::GraphRef;

/// Initial belief of a top-level goal: unachieved, fairly certain.
pub const GOAL_BELIEF: (f64, f64) = (0.0, 0.9);
/// Initial belief of a subgoal.
pub const SUBGOAL_BELIEF: (f64, f64) = (0.0, 0.8);

/// Strength every subgoal must exceed for the completion bonus.
const BONUS_THRESHOLD: f64 = 0.8;
const BONUS_STRENGTH: f64 = 0.1;
const BONUS_CONFIDENCE: f64 = 0.05;
const MAX_CONFIDENCE: f64 = 0.9;
const MAX_BONUS_CONFIDENCE: f64 = 0.95;

/// Goal categories recognized by keyword decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Learning,
    ProblemSolving,
    Creation,
    Communication,
    Generic,
}

impl GoalCategory {
    /// Ordered subgoal names expanded for this category.
    pub fn template(self) -> &'static [&'static str] {
        match self {
            GoalCategory::Learning => &[
                "Identify_Learning_Objectives",
                "Gather_Resources",
                "Acquire_Knowledge",
                "Practice_Skills",
                "Validate_Understanding",
            ],
            GoalCategory::ProblemSolving => &[
                "Define_Problem",
                "Analyze_Constraints",
                "Generate_Solutions",
                "Evaluate_Options",
                "Implement_Solution",
                "Test_Result",
            ],
            GoalCategory::Creation => &[
                "Conceptualize_Design",
                "Plan_Implementation",
                "Gather_Resources",
                "Execute_Construction",
                "Test_Quality",
                "Refine_Output",
            ],
            GoalCategory::Communication => &[
                "Understand_Context",
                "Plan_Message",
                "Select_Medium",
                "Deliver_Communication",
                "Verify_Understanding",
            ],
            GoalCategory::Generic => &[
                "Analyze_Goal_Context",
                "Plan_Approach",
                "Identify_Resources",
                "Execute_Actions",
                "Monitor_Progress",
                "Verify_Achievement",
            ],
        }
    }
}

impl std::fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GoalCategory::Learning => "learning",
            GoalCategory::ProblemSolving => "problem-solving",
            GoalCategory::Creation => "creation",
            GoalCategory::Communication => "communication",
            GoalCategory::Generic => "generic",
        };
        f.write_str(s)
    }
}

/// Keywords per category, checked in this order; first hit wins.
const KEYWORDS: &[(GoalCategory, &[&str])] = &[
    (GoalCategory::Learning, &["learn", "study"]),
    (GoalCategory::ProblemSolving, &["solve", "problem"]),
    (GoalCategory::Creation, &["create", "build"]),
    (GoalCategory::Communication, &["communicate", "interact"]),
];

/// Classify a goal description by case-insensitive keyword substring match.
pub fn classify_goal(description: &str) -> GoalCategory {
    let lower = description.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(GoalCategory::Generic)
}

/// Bookkeeping for one goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRecord {
    pub description: String,
    pub parent: Option<GraphRef>,
    /// Hierarchy children in creation order.
    pub subgoals: Vec<GraphRef>,
    pub decomposed: bool,
    /// Set when another goal replaced this one as current.
    pub suspended: bool,
}

impl GoalRecord {
    pub fn new(description: &str, parent: Option<GraphRef>) -> Self {
        Self {
            description: description.to_string(),
            parent,
            subgoals: Vec::new(),
            decomposed: false,
            suspended: false,
        }
    }
}

/// Combine subgoal achievements into the parent's achievement.
///
/// Strength is the confidence-weighted mean of the children's strengths.
/// Confidence is their mean confidence capped at 0.9. When every child's
/// strength exceeds 0.8 a completion bonus is added. Returns `None` for an
/// empty slice so the caller can fall back to leaf scoring.
pub fn combine_achievements(children: &[BeliefValue]) -> Option<BeliefValue> {
    if children.is_empty() {
        return None;
    }
    let weighted: f64 = children.iter().map(BeliefValue::weight).sum();
    let total_confidence: f64 = children.iter().map(BeliefValue::confidence).sum();

    let mut strength = if total_confidence > 0.0 {
        weighted / total_confidence
    } else {
        0.0
    };
    let mut confidence = (total_confidence / children.len() as f64).min(MAX_CONFIDENCE);

    if children.iter().all(|c| c.strength() > BONUS_THRESHOLD) {
        strength = (strength + BONUS_STRENGTH).min(1.0);
        confidence = (confidence + BONUS_CONFIDENCE).min(MAX_BONUS_CONFIDENCE);
    }
    Some(BeliefValue::new(strength, confidence))
}
