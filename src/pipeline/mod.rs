//! Document revision: split, ask the model to rewrite each paragraph, put
//! the document back together and record why each paragraph changed.

pub mod audit;
mod logicflow;

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::document::{self, Block, Section, split_sections};
use crate::generate::Generator;
use crate::prompt::{self, Check, Checks};
use crate::terms::TermRetriever;
use audit::{AuditTrail, Note};

/// Revised document lines plus what the audit trail needs.
#[derive(Debug, Default)]
pub struct Revision {
    pub lines: Vec<String>,
    pub notes: Vec<Note>,
    pub logic_feedback: Option<String>,
    pub paragraphs: usize,
}

impl Revision {
    /// Append a block of lines, separated from the previous block by a blank
    /// line.
    fn push_block<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines.extend(lines.into_iter().map(Into::into));
    }
}

pub struct PassReport {
    pub pass: usize,
    pub output: PathBuf,
    pub audit: Option<PathBuf>,
    pub paragraphs: usize,
}

pub struct Pipeline<'a> {
    generator: &'a dyn Generator,
    retriever: Option<TermRetriever<'a>>,
    checks: Checks,
    threshold: f32,
    rationale: bool,
}

impl<'a> Pipeline<'a> {
    /// `retriever` is only consulted when the terminology check is enabled.
    pub fn new(
        generator: &'a dyn Generator,
        retriever: Option<TermRetriever<'a>>,
        checks: Checks,
    ) -> Self {
        Self {
            generator,
            retriever,
            checks,
            threshold: 0.7,
            rationale: true,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_rationale(mut self, enabled: bool) -> Self {
        self.rationale = enabled;
        self
    }

    fn uses_logic_flow(&self) -> bool {
        self.checks.contains(&Check::Logicflow)
    }

    /// Run `repeat` passes. The first reads `input`; every later pass revises
    /// the previous pass's output. A failed revision call aborts before the
    /// pass writes anything.
    pub fn run(&mut self, input: &Path, output: &Path, repeat: usize) -> Result<Vec<PassReport>> {
        let mut reports = Vec::new();
        for pass in 1..=repeat.max(1) {
            let source = if pass == 1 { input } else { output };
            let lines = document::read_lines(source)?;
            let sections = split_sections(&lines);
            info!(
                pass,
                source = %source.display(),
                sections = sections.len(),
                "starting revision pass"
            );

            let revision = self
                .revise(&sections)
                .with_context(|| format!("revision pass {pass} of {}", source.display()))?;
            document::write_lines(output, &revision.lines)?;

            let audit = if self.rationale {
                let trail = AuditTrail {
                    generated_at: Utc::now(),
                    model: self.generator.model_name(),
                    source_digest: audit::digest_lines(&lines),
                    logic_feedback: revision.logic_feedback.as_deref(),
                    notes: &revision.notes,
                };
                let path = trail.write(output)?;
                info!(path = %path.display(), "wrote audit trail");
                Some(path)
            } else {
                None
            };

            info!(
                pass,
                output = %output.display(),
                paragraphs = revision.paragraphs,
                "revised document written"
            );
            reports.push(PassReport {
                pass,
                output: output.to_path_buf(),
                audit,
                paragraphs: revision.paragraphs,
            });
        }
        Ok(reports)
    }

    pub fn revise(&mut self, sections: &[Section]) -> Result<Revision> {
        if self.uses_logic_flow() {
            info!("summarize, logic check, then revise");
            self.revise_with_logic_check(sections)
        } else {
            self.revise_paragraphs(sections)
        }
    }

    fn revise_paragraphs(&mut self, sections: &[Section]) -> Result<Revision> {
        let mut out = Revision::default();
        for section in sections {
            info!(section = section.label(), "revising section");
            if let Some(heading) = &section.heading {
                out.push_block([heading.as_str()]);
            }
            for block in &section.blocks {
                match block {
                    Block::Code(code) => out.push_block(code.iter().map(String::as_str)),
                    Block::Paragraph(paragraph) => {
                        let terms = self.terminology_context(paragraph);
                        let prompt =
                            prompt::revision_prompt(&[paragraph.as_str()], &self.checks, &terms);
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

    /// Emit a revised paragraph and, if enabled, its rationale.
    fn record(&self, out: &mut Revision, section: &Section, original: &str, revised: &str) {
        let lines: Vec<&str> = revised
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            warn!(
                section = section.label(),
                "model returned an empty revision; keeping the original paragraph"
            );
            out.push_block([original]);
        } else {
            out.push_block(lines);
        }
        out.paragraphs += 1;

        if self.rationale {
            let prompt = prompt::rationale_prompt(original, revised.trim(), &self.checks);
            out.notes.push(Note {
                section: section.label().to_string(),
                rationale: self.best_effort("rationale", &prompt),
            });
        }
    }

    /// Terms relevant to `paragraph`. An embedding failure switches lookup off
    /// for the rest of the run instead of failing the revision.
    fn terminology_context(&mut self, paragraph: &str) -> Vec<String> {
        if !self.checks.contains(&Check::Terminology) {
            return Vec::new();
        }
        let Some(retriever) = &self.retriever else {
            return Vec::new();
        };
        match retriever.search(paragraph, self.threshold) {
            Ok(terms) => terms,
            Err(e) => {
                warn!(
                    error = %e,
                    "terminology lookup failed; continuing without terminology context"
                );
                self.retriever = None;
                Vec::new()
            }
        }
    }

    /// Generation whose failure only costs some context: log it and carry on
    /// with an empty string.
    fn best_effort(&self, what: &str, prompt: &str) -> String {
        match self.generator.generate(prompt) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "{what} request failed");
                String::new()
            }
        }
    }
}
