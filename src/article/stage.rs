//! Pipeline stages: who does what in the article crew.

use serde::{Deserialize, Serialize};

use crate::agents::AgentProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Research,
    Write,
    Edit,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Research => "research",
            Stage::Write => "write",
            Stage::Edit => "edit",
        }
    }

    /// `research -> write -> edit`.
    pub fn default_roster() -> Vec<Stage> {
        vec![Stage::Research, Stage::Write, Stage::Edit]
    }

    /// Parse a comma-separated roster such as `research,write`, then check
    /// it with [`Stage::validate_roster`].
    pub fn parse_list(raw: &str) -> Result<Vec<Stage>, String> {
        let stages = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<Stage>)
            .collect::<Result<Vec<Stage>, String>>()?;
        Self::validate_roster(&stages)?;
        Ok(stages)
    }

    /// The roster must start with `research`, contain `write`, list each
    /// stage once, and put `edit` (if present) after `write`.
    pub fn validate_roster(stages: &[Stage]) -> Result<(), String> {
        if stages.first() != Some(&Stage::Research) {
            return Err("pipeline must start with 'research'".to_string());
        }
        let write_at = stages
            .iter()
            .position(|s| *s == Stage::Write)
            .ok_or_else(|| "pipeline must contain 'write'".to_string())?;
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].contains(stage) {
                return Err(format!("stage '{}' is listed more than once", stage.name()));
            }
        }
        if let Some(edit_at) = stages.iter().position(|s| *s == Stage::Edit) {
            if edit_at < write_at {
                return Err("'edit' must come after 'write'".to_string());
            }
        }
        Ok(())
    }

    /// Only the researcher gets the lookup tool.
    pub fn uses_tools(&self) -> bool {
        matches!(self, Stage::Research)
    }

    pub fn profile(&self) -> AgentProfile {
        match self {
            Stage::Research => AgentProfile::new(
                "Content Researcher",
                "Find detailed, accurate and reliable information about the requested topic",
                "You are a meticulous researcher who knows how to find the most relevant \
                 and trustworthy information on any subject. You have long experience \
                 gathering data from encyclopedias and other open sources and organising \
                 it coherently.",
            ),
            Stage::Write => AgentProfile::new(
                "Content Writer",
                "Write informative and engaging articles based on the research provided",
                "You are a talented writer who turns raw research into well structured \
                 articles that hold the reader's attention from start to finish.",
            ),
            Stage::Edit => AgentProfile::new(
                "Content Editor",
                "Review and refine the article for clarity, consistency and correct grammar",
                "You are an editor who carefully reviews texts so they are ready for \
                 publication while keeping the author's voice.",
            ),
        }
    }

    pub fn task_description(&self, topic: &str, min_words: u32) -> String {
        match self {
            Stage::Research => format!(
                "Research and summarise detailed information about {topic} using the \
                 knowledge lookup tool and other open sources."
            ),
            Stage::Write => format!(
                "Write an article of at least {min_words} words about {topic} based on the \
                 researched information, with an introduction, development and conclusion. \
                 Start with a '# ' title line and end with a '## References' list of the \
                 sources used."
            ),
            Stage::Edit => format!(
                "Review the article about {topic}: fix errors, improve clarity and style, \
                 and keep it at {min_words} words or more. Keep the '# ' title line and the \
                 '## References' list."
            ),
        }
    }

    pub fn expected_output(&self, topic: &str, min_words: u32) -> String {
        match self {
            Stage::Research => format!(
                "A complete summary about {topic} with facts, accessible technical \
                 explanations and the sources they came from."
            ),
            Stage::Write => format!(
                "A complete markdown article with a title, subheadings and at least \
                 {min_words} words."
            ),
            Stage::Edit => "The final revised article, ready for publication.".to_string(),
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "research" | "researcher" => Ok(Stage::Research),
            "write" | "writer" => Ok(Stage::Write),
            "edit" | "editor" => Ok(Stage::Edit),
            other => Err(format!("unknown stage '{}'", other)),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_and_three_stage_rosters() {
        assert_eq!(
            Stage::parse_list("research,write").unwrap(),
            vec![Stage::Research, Stage::Write]
        );
        assert_eq!(
            Stage::parse_list(" Research , WRITE , edit ").unwrap(),
            Stage::default_roster()
        );
    }

    #[test]
    fn rejects_invalid_rosters() {
        assert!(Stage::parse_list("").is_err());
        assert!(Stage::parse_list("write,edit").is_err());
        assert!(Stage::parse_list("research,edit").is_err());
        assert!(Stage::parse_list("research,edit,write").is_err());
        assert!(Stage::parse_list("research,write,write").is_err());
        assert!(Stage::parse_list("research,write,publish")
            .unwrap_err()
            .contains("publish"));
    }

    #[test]
    fn validate_roster_checks_order_and_duplicates() {
        assert!(Stage::validate_roster(&Stage::default_roster()).is_ok());
        assert!(Stage::validate_roster(&[Stage::Research, Stage::Write]).is_ok());
        assert!(Stage::validate_roster(&[Stage::Research, Stage::Edit, Stage::Write]).is_err());
        assert!(Stage::validate_roster(&[Stage::Research, Stage::Write, Stage::Write]).is_err());
        assert!(Stage::validate_roster(&[]).is_err());
    }

    #[test]
    fn descriptions_mention_topic_and_length() {
        let text = Stage::Write.task_description("Solar Energy", 450);
        assert!(text.contains("Solar Energy"));
        assert!(text.contains("450"));
        assert!(Stage::Research.uses_tools());
        assert!(!Stage::Edit.uses_tools());
    }
}
