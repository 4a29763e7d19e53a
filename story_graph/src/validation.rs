//! Structural validation run before a story is played.
//!
//! Editing never rejects a dangling or looping choice, so a graph can be in an
//! unplayable state at any time. [`validate`] collects every such issue in one
//! pass so the caller can show them together.

use std::collections::VecDeque;
use std::fmt;

use crate::graph::StoryGraph;
use crate::parts::{ChoiceIndex, PartIndex};

/// How serious a structural issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Worth reviewing; play works.
    Warning,
    /// Play will refuse the affected choice or cannot start at all.
    Error,
}

/// A single structural problem in a story graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralIssue {
    /// The graph has no parts at all.
    EmptyStory,
    /// Two parts share a name, ignoring case.
    DuplicateName { first: PartIndex, second: PartIndex },
    /// A choice leads back to its own part.
    SelfLoop { part: PartIndex, choice: ChoiceIndex },
    /// A choice leads to a part that does not exist.
    DanglingTarget {
        part: PartIndex,
        choice: ChoiceIndex,
        target: PartIndex,
    },
    /// No route from the first part reaches this part.
    Unreachable { part: PartIndex },
    /// No ending can be reached from the first part.
    NoEnding,
}

impl StructuralIssue {
    pub fn severity(&self) -> Severity {
        match self {
            StructuralIssue::Unreachable { .. } | StructuralIssue::NoEnding => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralIssue::EmptyStory => write!(f, "the story has no parts"),
            StructuralIssue::DuplicateName { first, second } => {
                write!(f, "parts {first} and {second} share a name")
            }
            StructuralIssue::SelfLoop { part, choice } => write!(
                f,
                "choice {choice} of part {part} leads back to the same part"
            ),
            StructuralIssue::DanglingTarget {
                part,
                choice,
                target,
            } => write!(
                f,
                "choice {choice} of part {part} leads to part {target}, which does not exist"
            ),
            StructuralIssue::Unreachable { part } => {
                write!(f, "part {part} cannot be reached from the first part")
            }
            StructuralIssue::NoEnding => {
                write!(f, "no ending can be reached from the first part")
            }
        }
    }
}

/// Result of validating a story graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<StructuralIssue>,
}

impl ValidationReport {
    /// True when nothing at all was found.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when there are no errors (warnings allowed).
    pub fn is_playable(&self) -> bool {
        !self.issues.iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &StructuralIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &StructuralIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
    }
}

/// Check a graph for every structural issue.
pub fn validate(graph: &StoryGraph) -> ValidationReport {
    let mut report = ValidationReport::default();

    if graph.is_empty() {
        report.issues.push(StructuralIssue::EmptyStory);
        return report;
    }

    let parts = graph.parts();

    for first in 0..parts.len() {
        for second in (first + 1)..parts.len() {
            if parts[second].has_name(&parts[first].name) {
                report
                    .issues
                    .push(StructuralIssue::DuplicateName { first, second });
            }
        }
    }

    for (part, node) in parts.iter().enumerate() {
        for (choice, edge) in node.choices.iter().enumerate() {
            if edge.loops_back_to(part) {
                report.issues.push(StructuralIssue::SelfLoop { part, choice });
            } else if !graph.contains(edge.next_part) {
                report.issues.push(StructuralIssue::DanglingTarget {
                    part,
                    choice,
                    target: edge.next_part,
                });
            }
        }
    }

    let reachable = reachable_from_start(graph);
    for (part, seen) in reachable.iter().enumerate() {
        if !seen {
            report.issues.push(StructuralIssue::Unreachable { part });
        }
    }

    let ending_reachable = parts
        .iter()
        .enumerate()
        .any(|(index, part)| reachable[index] && part.is_ending());
    if !ending_reachable {
        report.issues.push(StructuralIssue::NoEnding);
    }

    report
}

/// Breadth-first walk from part 0 over the choices play would accept.
fn reachable_from_start(graph: &StoryGraph) -> Vec<bool> {
    let mut seen = vec![false; graph.len()];
    let mut queue = VecDeque::from([0]);
    seen[0] = true;

    while let Some(current) = queue.pop_front() {
        let Some(part) = graph.part(current) else {
            continue;
        };
        for choice in &part.choices {
            let target = choice.next_part;
            if target != current && graph.contains(target) && !seen[target] {
                seen[target] = true;
                queue.push_back(target);
            }
        }
    }

    seen
}
