use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::vectordb::RubricSection;

/// Sections shorter than this are treated as a failed split.
pub const MIN_SECTION_CHARS: usize = 100;

static CV_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)cv\s+match\s+evaluation").expect("static regex"));
static PROJECT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)project\s+deliverable\s+evaluation").expect("static regex")
});

/// How the rubric text was divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Both section headings were found.
    Headings,
    /// Lines mentioning a section switched the target section.
    Keywords,
    /// Both sections hold the whole rubric.
    FullText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubricSplit {
    pub cv_evaluation: String,
    pub project_evaluation: String,
    pub strategy: SplitStrategy,
}

impl RubricSplit {
    pub fn section(&self, section: RubricSection) -> &str {
        match section {
            RubricSection::CvEvaluation => &self.cv_evaluation,
            RubricSection::ProjectEvaluation => &self.project_evaluation,
        }
    }
}

/// Divides the unified rubric into its CV and project halves.
pub fn split_rubric(text: &str) -> RubricSplit {
    let split = split_by_headings(text)
        .map(|(cv, project)| (cv, project, SplitStrategy::Headings))
        .or_else(|| split_by_keywords(text).map(|(cv, project)| (cv, project, SplitStrategy::Keywords)));

    match split {
        Some((cv, project, strategy)) if long_enough(&cv) && long_enough(&project) => RubricSplit {
            cv_evaluation: cv,
            project_evaluation: project,
            strategy,
        },
        _ => {
            let full = text.trim().to_string();
            RubricSplit {
                cv_evaluation: full.clone(),
                project_evaluation: full,
                strategy: SplitStrategy::FullText,
            }
        }
    }
}

fn long_enough(section: &str) -> bool {
    section.chars().count() >= MIN_SECTION_CHARS
}

fn split_by_headings(text: &str) -> Option<(String, String)> {
    let cv = CV_HEADING.find(text)?.start();
    let project = PROJECT_HEADING.find(text)?.start();

    let (cv_text, project_text) = if cv < project {
        (&text[cv..project], &text[project..])
    } else {
        (&text[cv..], &text[project..cv])
    };
    Some((cv_text.trim().to_string(), project_text.trim().to_string()))
}

fn split_by_keywords(text: &str) -> Option<(String, String)> {
    let mut cv = Vec::new();
    let mut project = Vec::new();
    let mut current = None;

    for line in text.lines() {
        let lower = line.to_lowercase();
        if lower.contains("cv") && (lower.contains("evaluation") || lower.contains("match")) {
            current = Some(RubricSection::CvEvaluation);
        } else if lower.contains("project")
            && (lower.contains("evaluation") || lower.contains("deliverable"))
        {
            current = Some(RubricSection::ProjectEvaluation);
        }

        match current {
            Some(RubricSection::CvEvaluation) => cv.push(line),
            Some(RubricSection::ProjectEvaluation) => project.push(line),
            None => {}
        }
    }

    if cv.is_empty() || project.is_empty() {
        return None;
    }
    Some((cv.join("\n").trim().to_string(), project.join("\n").trim().to_string()))
}
