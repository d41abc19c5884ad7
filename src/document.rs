use anyhow::{Context, Result};
use std::path::Path;

/// A unit of body text inside a section.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// One non-blank line; each is revised on its own.
    Paragraph(String),
    /// A fenced code block, fences included. Passed through untouched.
    Code(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// `None` for text that appears before the first heading.
    pub heading: Option<String>,
    pub blocks: Vec<Block>,
}

impl Section {
    fn new(heading: Option<String>) -> Self {
        Self {
            heading,
            blocks: Vec::new(),
        }
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p.as_str()),
            Block::Code(_) => None,
        })
    }

    /// Heading text for logs and the audit trail.
    pub fn label(&self) -> &str {
        self.heading.as_deref().map_or("(preamble)", str::trim)
    }
}

/// Opening fence of a code block: the fence character and its run length.
#[derive(Debug, Clone, Copy)]
struct Fence {
    ch: char,
    len: usize,
}

impl Fence {
    fn open(trimmed: &str) -> Option<Self> {
        let ch = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = trimmed.chars().take_while(|&c| c == ch).count();
        (len >= 3).then_some(Self { ch, len })
    }

    /// A closer is a bare run of the same character, at least as long as
    /// the opener. Info strings and shorter runs stay inside the block.
    fn closes(&self, trimmed: &str) -> bool {
        trimmed.chars().count() >= self.len && trimmed.chars().all(|c| c == self.ch)
    }
}

/// Split markdown lines into sections.
///
/// A line whose trimmed form starts with `#` opens a section. Blank lines are
/// dropped, every other line is its own paragraph. Fenced code is collected
/// verbatim and never treated as headings or paragraphs.
pub fn split_sections<S: AsRef<str>>(lines: &[S]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section::new(None);
    let mut fence: Option<(Fence, Vec<String>)> = None;

    for line in lines {
        let line = line.as_ref().trim_end_matches(['\n', '\r']);
        let trimmed = line.trim();

        if let Some((open, mut code)) = fence.take() {
            code.push(line.to_string());
            if open.closes(trimmed) {
                current.blocks.push(Block::Code(code));
            } else {
                fence = Some((open, code));
            }
            continue;
        }

        if let Some(open) = Fence::open(trimmed) {
            fence = Some((open, vec![line.to_string()]));
        } else if trimmed.starts_with('#') {
            let previous = std::mem::replace(&mut current, Section::new(Some(line.to_string())));
            if previous.heading.is_some() || !previous.blocks.is_empty() {
                sections.push(previous);
            }
        } else if !trimmed.is_empty() {
            current.blocks.push(Block::Paragraph(line.to_string()));
        }
    }

    // unterminated fence runs to end of file
    if let Some((_, code)) = fence {
        current.blocks.push(Block::Code(code));
    }
    if current.heading.is_some() || !current.blocks.is_empty() {
        sections.push(current);
    }
    sections
}

pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(contents.lines().map(str::to_string).collect())
}

/// Write each line followed by a newline.
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn para(s: &str) -> Block {
        Block::Paragraph(s.to_string())
    }

    #[test]
    fn splits_headings_and_line_paragraphs() {
        let md = "# Title\n\nThis is a test document.\n\n## Section\n\nSome content here.\nSecond line.";
        let lines: Vec<&str> = md.lines().collect();
        let sections = split_sections(&lines);
        assert_eq!(
            sections,
            vec![
                Section {
                    heading: Some("# Title".into()),
                    blocks: vec![para("This is a test document.")],
                },
                Section {
                    heading: Some("## Section".into()),
                    blocks: vec![para("Some content here."), para("Second line.")],
                },
            ]
        );
    }

    #[test]
    fn text_before_first_heading_is_kept() {
        let sections = split_sections(&["Intro line.", "", "# Body", "Text."]);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, None);
        assert_eq!(sections[0].label(), "(preamble)");
        assert_eq!(sections[0].blocks, vec![para("Intro line.")]);
        assert_eq!(sections[1].label(), "# Body");
    }

    #[test]
    fn heading_without_body_is_still_a_section() {
        let sections = split_sections(&["# Empty", "", "# Next", "Body."]);
        assert_eq!(sections.len(), 2);
        assert!(sections[0].blocks.is_empty());
    }

    #[test]
    fn code_fences_are_verbatim() {
        let lines = [
            "# Setup",
            "Run this:",
            "```sh",
            "# not a heading",
            "",
            "make build",
            "```",
            "Done.",
        ];
        let sections = split_sections(&lines);
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].blocks,
            vec![
                para("Run this:"),
                Block::Code(vec![
                    "```sh".into(),
                    "# not a heading".into(),
                    "".into(),
                    "make build".into(),
                    "```".into(),
                ]),
                para("Done."),
            ]
        );
        assert_eq!(sections[0].paragraphs().collect::<Vec<_>>(), vec!["Run this:", "Done."]);
    }

    #[test]
    fn unterminated_fence_runs_to_eof() {
        let sections = split_sections(&["# A", "~~~", "code"]);
        assert_eq!(
            sections[0].blocks,
            vec![Block::Code(vec!["~~~".into(), "code".into()])]
        );
    }

    #[test]
    fn shorter_inner_fence_stays_inside_the_block() {
        let lines = ["# A", "````md", "```", "x", "```", "````", "# B", "y"];
        let sections = split_sections(&lines);
        assert_eq!(
            sections,
            vec![
                Section {
                    heading: Some("# A".into()),
                    blocks: vec![Block::Code(vec![
                        "````md".into(),
                        "```".into(),
                        "x".into(),
                        "```".into(),
                        "````".into(),
                    ])],
                },
                Section {
                    heading: Some("# B".into()),
                    blocks: vec![para("y")],
                },
            ]
        );
    }

    #[test]
    fn lone_inner_fence_does_not_swallow_the_rest() {
        let lines = ["# A", "````", "```", "x", "````", "# B", "y"];
        let sections = split_sections(&lines);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].paragraphs().collect::<Vec<_>>(), vec!["y"]);
    }

    #[test]
    fn info_string_line_does_not_close_a_fence() {
        let lines = ["# Run", "```sh", "cat <<EOF", "```python", "print(1)", "```", "Done."];
        let sections = split_sections(&lines);
        assert_eq!(
            sections[0].blocks,
            vec![
                Block::Code(vec![
                    "```sh".into(),
                    "cat <<EOF".into(),
                    "```python".into(),
                    "print(1)".into(),
                    "```".into(),
                ]),
                para("Done."),
            ]
        );
    }

    #[test]
    fn tilde_fence_ignores_backtick_lines() {
        let sections = split_sections(&["~~~", "```", "~~~~", "after"]);
        assert_eq!(
            sections[0].blocks,
            vec![
                Block::Code(vec!["~~~".into(), "```".into(), "~~~~".into()]),
                para("after"),
            ]
        );
    }

    #[test]
    fn empty_document_has_no_sections() {
        let lines: [&str; 2] = ["", "  "];
        assert!(split_sections(&lines).is_empty());
    }

    #[test]
    fn write_then_read_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        write_lines(&path, &["# Title", "", "This is a revised document."]).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "# Title\n\nThis is a revised document.\n");
        assert_eq!(read_lines(&path).unwrap().len(), 3);
    }
}
