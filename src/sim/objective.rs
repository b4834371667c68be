//! Level objectives and the win-condition tracker
//!
//! Progress only ever moves forward. Counts are capped at the required
//! amount and are cleared only by an explicit `reset` (level restart).

use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::entity::normalize_tag;

/// Targets that match any collectible or enemy
const WILDCARD_TARGETS: &[&str] = &["", "any", "all", "item", "collectible", "enemy", "pickup", "treasure"];

/// What an objective counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Collect N pickups whose kind matches `target`
    Collect { target: String },
    /// Defeat N enemies whose kind matches `target`
    Defeat { target: String },
    /// Enter a region of the world
    Reach { region: Aabb },
    /// Stay alive for a number of seconds
    Survive { seconds: f32 },
}

/// One win condition with its progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub kind: ObjectiveKind,
    pub required: u32,
    current: u32,
}

impl Objective {
    /// Create an objective. Reach always needs exactly one entry and
    /// Survive counts whole seconds, so `required` is derived for those.
    pub fn new(kind: ObjectiveKind, required: u32) -> Self {
        let required = match &kind {
            ObjectiveKind::Reach { .. } => 1,
            ObjectiveKind::Survive { seconds } => {
                if seconds.is_finite() {
                    seconds.max(0.0).ceil() as u32
                } else {
                    0
                }
            }
            _ => required,
        };
        Self {
            kind,
            required,
            current: 0,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn is_satisfied(&self) -> bool {
        self.current >= self.required
    }

    /// Raise progress to at least `value`. True if this completed the objective.
    fn raise_to(&mut self, value: u32) -> bool {
        let was = self.is_satisfied();
        self.current = self.current.max(value.min(self.required));
        !was && self.is_satisfied()
    }

    /// Short human-readable progress line
    pub fn describe(&self) -> String {
        let what = match &self.kind {
            ObjectiveKind::Collect { target } => format!("collect {target}"),
            ObjectiveKind::Defeat { target } => format!("defeat {target}"),
            ObjectiveKind::Reach { .. } => "reach the exit".to_string(),
            ObjectiveKind::Survive { .. } => "survive".to_string(),
        };
        format!("{what} {}/{}", self.current, self.required)
    }
}

/// A domain event that may advance objectives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress<'a> {
    /// A pickup of this kind tag was collected
    Collected(&'a str),
    /// An enemy of this kind tag was defeated
    Defeated(&'a str),
    /// The player's box this frame
    PlayerAt(&'a Aabb),
    /// Total seconds survived so far
    Survived(f32),
}

/// Does an objective target name match a kind tag?
///
/// Plurals and generic names are accepted: "coins" matches "coin",
/// "enemies" matches every enemy.
pub fn target_matches(target: &str, tag: &str) -> bool {
    let target = singular(&normalize_tag(target));
    if WILDCARD_TARGETS.contains(&target.as_str()) {
        return true;
    }
    target == singular(&normalize_tag(tag))
}

/// Concrete kind tag named by a target, `None` for generic targets
pub fn target_kind(target: &str) -> Option<String> {
    let target = singular(&normalize_tag(target));
    (!WILDCARD_TARGETS.contains(&target.as_str())).then_some(target)
}

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}y")
    } else if word.len() > 1 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// All objectives of a level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveTracker {
    objectives: Vec<Objective>,
}

impl ObjectiveTracker {
    pub fn new(objectives: Vec<Objective>) -> Self {
        Self { objectives }
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Feed one event. Returns indices of objectives it completed.
    pub fn record(&mut self, progress: Progress<'_>) -> Vec<usize> {
        let mut completed = Vec::new();
        for (i, obj) in self.objectives.iter_mut().enumerate() {
            let next = match (&obj.kind, progress) {
                (ObjectiveKind::Collect { target }, Progress::Collected(tag))
                | (ObjectiveKind::Defeat { target }, Progress::Defeated(tag))
                    if target_matches(target, tag) =>
                {
                    Some(obj.current.saturating_add(1))
                }
                (ObjectiveKind::Reach { region }, Progress::PlayerAt(player)) if region.overlaps(player) => {
                    Some(1)
                }
                (ObjectiveKind::Survive { .. }, Progress::Survived(secs)) if secs.is_finite() => {
                    Some(secs.max(0.0).floor() as u32)
                }
                _ => None,
            };
            if next.is_some_and(|value| obj.raise_to(value)) {
                completed.push(i);
            }
        }
        completed
    }

    /// True once every objective is met. A level without objectives is never won this way.
    pub fn all_satisfied(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(Objective::is_satisfied)
    }
}
