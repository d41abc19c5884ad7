use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{Pipeline, Revision};
use crate::document::{Block, Section};
use crate::prompt;

impl Pipeline<'_> {
    /// Summarize every paragraph, check the argument as a whole, then revise
    /// each paragraph with that feedback in hand.
    pub(super) fn revise_with_logic_check(&mut self, sections: &[Section]) -> Result<Revision> {
        let mut contexts: Vec<Vec<String>> = Vec::new();
        let mut summaries: Vec<String> = Vec::new();
        for paragraph in sections.iter().flat_map(Section::paragraphs) {
            let terms = self.terminology_context(paragraph);
            let summary = self.best_effort("summary", &prompt::summary_prompt(paragraph, &terms));
            debug!(%summary, "paragraph summary");
            summaries.push(summary);
            contexts.push(terms);
        }

        let feedback = self.best_effort("logic check", &prompt::logic_check_prompt(&summaries));
        info!(%feedback, "logic check result");

        let mut out = Revision {
            logic_feedback: Some(feedback),
            ..Default::default()
        };
        let mut contexts = contexts.into_iter();
        for section in sections {
            info!(section = section.label(), "revising section");
            if let Some(heading) = &section.heading {
                out.push_block([heading.as_str()]);
            }
            for block in &section.blocks {
                match block {
                    Block::Code(code) => out.push_block(code.iter().map(String::as_str)),
                    Block::Paragraph(paragraph) => {
                        let terms = contexts.next().unwrap_or_default();
                        let feedback = out.logic_feedback.as_deref().unwrap_or_default();
                        let prompt = prompt::logic_revision_prompt(paragraph, feedback, &terms);
                        let revised = self.generator.generate(&prompt).with_context(|| {
                            format!("revising a paragraph in {}", section.label())
                        })?;
                        self.record(&mut out, section, paragraph, &revised);
                    }
                }
            }
        }
        Ok(out)
    }
}
