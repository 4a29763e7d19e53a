//! Part and choice definitions - the nodes and edges of a story.

use serde::{Deserialize, Serialize};

/// Position of a part within its graph.
pub type PartIndex = usize;

/// Position of a choice within its part.
pub type ChoiceIndex = usize;

/// A labelled edge from one part to another.
///
/// The target is a plain index and is not checked when set; see
/// [`crate::validate`] for the structural checks run before play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    pub next_part: PartIndex,
}

impl Choice {
    /// Create a choice leading to `next_part`.
    pub fn new(text: impl Into<String>, next_part: PartIndex) -> Self {
        Self {
            text: text.into(),
            next_part,
        }
    }

    /// Check whether this choice leads back to the part that owns it.
    pub fn loops_back_to(&self, owner: PartIndex) -> bool {
        self.next_part == owner
    }
}

/// A narrative node with text and outgoing choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Part {
    /// Create an empty part with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            choices: Vec::new(),
        }
    }

    /// Set the narrative text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a choice.
    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// A part without choices ends the story.
    pub fn is_ending(&self) -> bool {
        self.choices.is_empty()
    }

    /// Compare names the way uniqueness is enforced: ignoring case.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_part_is_an_ending() {
        let part = Part::new("Part 1");
        assert_eq!(part.name, "Part 1");
        assert!(part.text.is_empty());
        assert!(part.is_ending());
    }

    #[test]
    fn test_part_builder() {
        let part = Part::new("Gate")
            .with_text("A rusted gate blocks the road.")
            .with_choice(Choice::new("Climb it", 1))
            .with_choice(Choice::new("Turn back", 2));

        assert_eq!(part.choices.len(), 2);
        assert!(!part.is_ending());
        assert_eq!(part.choices[1].next_part, 2);
    }

    #[test]
    fn test_name_comparison_ignores_case() {
        let part = Part::new("Dark Forest");
        assert!(part.has_name("dark forest"));
        assert!(part.has_name("DARK FOREST"));
        assert!(!part.has_name("Dark Forest 2"));
    }

    #[test]
    fn test_choice_loop_detection() {
        let choice = Choice::new("Wait", 3);
        assert!(choice.loops_back_to(3));
        assert!(!choice.loops_back_to(0));
    }

    #[test]
    fn test_serialized_field_names() {
        let part = Part::new("Part 1").with_choice(Choice::new("Go", 1));
        let json = serde_json::to_value(&part).unwrap();

        assert_eq!(json["name"], "Part 1");
        assert_eq!(json["text"], "");
        assert_eq!(json["choices"][0]["nextPart"], 1);
    }
}
