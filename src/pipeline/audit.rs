use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Why one paragraph changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub section: String,
    pub rationale: String,
}

pub struct AuditTrail<'a> {
    pub generated_at: DateTime<Utc>,
    pub model: &'a str,
    /// BLAKE3 of the text this pass revised.
    pub source_digest: String,
    pub logic_feedback: Option<&'a str>,
    pub notes: &'a [Note],
}

pub fn digest_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut hasher = blake3::Hasher::new();
    for line in lines {
        hasher.update(line.as_ref().as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

/// `<output>.comments.txt`, or the first free `<output>.comments_N.txt`.
/// Earlier trails are never overwritten.
pub fn audit_path(output: &Path) -> PathBuf {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(output.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };
    let first = with_suffix(".comments.txt");
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|i| with_suffix(&format!(".comments_{i}.txt")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

impl AuditTrail<'_> {
    pub fn render(&self) -> String {
        let mut out = format!(
            "# generated: {}\n# model: {}\n# source: blake3:{}\n",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.model,
            self.source_digest,
        );
        if let Some(feedback) = self.logic_feedback {
            out.push_str("[logic check]\n");
            out.push_str(feedback.trim());
            out.push('\n');
        }
        for note in self.notes {
            out.push_str(&format!("[{}] {}\n", note.section, note.rationale));
        }
        out
    }

    pub fn write(&self, output: &Path) -> Result<PathBuf> {
        let path = audit_path(output);
        std::fs::write(&path, self.render())
            .with_context(|| format!("writing audit trail {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn audit_path_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("paper.md");
        let first = audit_path(&output);
        assert_eq!(first, dir.path().join("paper.md.comments.txt"));

        std::fs::write(&first, "").unwrap();
        assert_eq!(audit_path(&output), dir.path().join("paper.md.comments_1.txt"));

        std::fs::write(dir.path().join("paper.md.comments_1.txt"), "").unwrap();
        assert_eq!(audit_path(&output), dir.path().join("paper.md.comments_2.txt"));
    }

    #[test]
    fn render_lists_header_feedback_and_notes() {
        let notes = vec![
            Note {
                section: "# Intro".into(),
                rationale: "typo".into(),
            },
            Note {
                section: "# Intro".into(),
                rationale: String::new(),
            },
        ];
        let trail = AuditTrail {
            generated_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
            model: "gemma3",
            source_digest: digest_lines(&["# Intro", "text"]),
            logic_feedback: Some("  flows well \n"),
            notes: &notes,
        };
        let rendered = trail.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "# generated: 2026-10-16T09:30:00Z");
        assert_eq!(lines[1], "# model: gemma3");
        assert!(lines[2].starts_with("# source: blake3:"));
        assert_eq!(&lines[3..], &["[logic check]", "flows well", "[# Intro] typo", "[# Intro] "]);
    }

    #[test]
    fn digest_tracks_content() {
        assert_eq!(digest_lines(&["a", "b"]), digest_lines(&["a", "b"]));
        assert_ne!(digest_lines(&["a", "b"]), digest_lines(&["ab"]));
    }
}
