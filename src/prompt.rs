use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A proofreading aspect the user can enable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    Typo,
    Grammar,
    Academic,
    Terminology,
    Logic,
    /// Summarize, check the whole argument, then revise.
    Logicflow,
}

impl Check {
    pub fn as_str(self) -> &'static str {
        match self {
            Check::Typo => "typo",
            Check::Grammar => "grammar",
            Check::Academic => "academic",
            Check::Terminology => "terminology",
            Check::Logic => "logic",
            Check::Logicflow => "logicflow",
        }
    }

    fn instruction(self) -> Option<&'static str> {
        match self {
            Check::Typo => Some("Fix typos, omissions and spelling mistakes."),
            Check::Grammar => Some("Fix grammar mistakes."),
            Check::Academic => {
                Some("Rephrase so the text reads as appropriate for an academic paper.")
            }
            Check::Terminology => Some("Make the use of technical terminology consistent."),
            Check::Logic => Some(
                "Check the logical consistency and, where an explanation is missing, \
                 add a placeholder such as {{TODO::explanation}}.",
            ),
            Check::Logicflow => None,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Checks = BTreeSet<Check>;

const NO_STYLE_CHANGES: &str = "Do not make unnecessary changes to the writing style.";

fn term_reference(terms: &[String]) -> Option<String> {
    if terms.is_empty() {
        None
    } else {
        Some(format!(
            "Use the following terminology list as a reference: {}",
            terms.join(", ")
        ))
    }
}

/// Instructions for every enabled check (in a fixed order), then the
/// terminology list when there is one, a blank line, and the paragraphs.
pub fn revision_prompt(paragraphs: &[&str], checks: &Checks, terms: &[String]) -> String {
    let mut instructions: Vec<String> = checks
        .iter()
        .filter_map(|c| c.instruction())
        .map(str::to_string)
        .collect();
    instructions.push(NO_STYLE_CHANGES.to_string());
    instructions.extend(term_reference(terms));
    format!("{}\n\n{}", instructions.join("\n"), paragraphs.join("\n"))
}

pub fn summary_prompt(paragraph: &str, terms: &[String]) -> String {
    let mut prompt = String::from("Summarize the following paragraph in a single sentence.");
    if let Some(reference) = term_reference(terms) {
        prompt.push('\n');
        prompt.push_str(&reference);
    }
    prompt.push_str("\n\n");
    prompt.push_str(paragraph);
    prompt
}

pub fn logic_check_prompt(summaries: &[String]) -> String {
    let mut prompt = String::from(
        "Below are one-sentence summaries of each paragraph. Check the logical \
         consistency of the document as a whole and point out any problems.",
    );
    for s in summaries {
        prompt.push_str("\n- ");
        prompt.push_str(s);
    }
    prompt
}

pub fn logic_revision_prompt(paragraph: &str, feedback: &str, terms: &[String]) -> String {
    let mut prompt = format!(
        "You are given feedback on the logical consistency of the whole document, and one \
         paragraph. Revise the paragraph according to the feedback so its claim is clear and \
         emphasized. Reply with the paragraph only. {NO_STYLE_CHANGES}\n\
         [Logic check feedback]\n{feedback}\n\
         [Paragraph]\n{paragraph}"
    );
    if !terms.is_empty() {
        prompt.push_str(&format!("\n[Terminology] {}", terms.join(", ")));
    }
    prompt
}

/// Ask which enabled checks motivated a revision.
pub fn rationale_prompt(original: &str, revised: &str, checks: &Checks) -> String {
    let names: Vec<&str> = checks.iter().map(|c| c.as_str()).collect();
    format!(
        "List briefly which of these aspects ({}) the revision below addressed.\n\
         ---\n{original}\n---\nRevision:\n{revised}",
        names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checks(list: &[Check]) -> Checks {
        list.iter().copied().collect()
    }

    #[test]
    fn revision_prompt_lists_enabled_checks_then_terms() {
        let prompt = revision_prompt(
            &["Some text."],
            &checks(&[Check::Terminology, Check::Grammar]),
            &["test".to_string(), "cache".to_string()],
        );
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(lines[0], "Fix grammar mistakes.");
        assert_eq!(lines[1], "Make the use of technical terminology consistent.");
        assert_eq!(lines[2], NO_STYLE_CHANGES);
        assert!(lines[3].ends_with(": test, cache"));
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "Some text.");
    }

    #[test]
    fn empty_terms_add_no_reference_line() {
        let prompt = revision_prompt(&["A.", "B."], &checks(&[Check::Typo]), &[]);
        assert!(!prompt.contains("terminology list"));
        assert!(prompt.ends_with("\n\nA.\nB."));
    }

    #[test]
    fn logicflow_has_no_instruction() {
        let prompt = revision_prompt(&["x"], &checks(&[Check::Logicflow]), &[]);
        assert_eq!(prompt, format!("{NO_STYLE_CHANGES}\n\nx"));
    }

    #[test]
    fn logic_check_bullets_each_summary() {
        let prompt = logic_check_prompt(&["first".into(), "second".into()]);
        assert!(prompt.ends_with("\n- first\n- second"));
    }

    #[test]
    fn logic_revision_carries_feedback_and_terms() {
        let prompt = logic_revision_prompt("para", "missing step", &["API".into()]);
        assert!(prompt.contains("[Logic check feedback]\nmissing step"));
        assert!(prompt.contains("[Paragraph]\npara"));
        assert!(prompt.ends_with("[Terminology] API"));
    }

    #[test]
    fn rationale_names_checks() {
        let prompt = rationale_prompt("old", "new", &checks(&[Check::Typo, Check::Logic]));
        assert!(prompt.contains("(typo, logic)"));
        assert!(prompt.ends_with("Revision:\nnew"));
    }

    #[test]
    fn checks_parse_from_cli_and_config_names() {
        assert_eq!(Check::from_str("logicflow", true).unwrap(), Check::Logicflow);
        let parsed: Vec<Check> = serde_json::from_str(r#"["typo", "academic"]"#).unwrap();
        assert_eq!(parsed, vec![Check::Typo, Check::Academic]);
    }
}
