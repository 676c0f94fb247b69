//! Prompt construction for the scoring and summary completions.

use std::fmt::Write;

use crate::content::DocumentContent;
use crate::vectordb::SearchResult;

use super::criteria::Track;
use super::parser::truncate_chars;
use super::types::{CvEvaluation, ProjectEvaluation};

/// Max characters of document text shown to the model.
pub const PREVIEW_CHARS: usize = 2000;

/// A titled group of retrieved chunks.
#[derive(Debug, Clone)]
pub struct ContextSection {
    pub title: &'static str,
    pub results: Vec<SearchResult>,
}

impl ContextSection {
    pub fn new(title: &'static str, results: Vec<SearchResult>) -> Self {
        Self { title, results }
    }
}

/// Renders sections as `--- Title ---` blocks with numbered chunks. Empty sections are skipped.
pub fn build_context(sections: &[ContextSection]) -> String {
    let mut out = String::new();
    for section in sections.iter().filter(|s| !s.results.is_empty()) {
        let _ = writeln!(out, "\n--- {} ---", section.title);
        for (i, result) in section.results.iter().enumerate() {
            let _ = writeln!(out, "[{}] {}\n", i + 1, result.chunk.text.trim());
        }
    }
    out.trim().to_string()
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None detected".to_string()
    } else {
        items.join(", ")
    }
}

pub fn cv_summary(cv: &DocumentContent) -> String {
    let data = &cv.extracted_data;
    format!(
        "CV Summary:\n\
         - Pages: {}\n\
         - Words: {}\n\
         - Email: {}\n\
         - Phone: {}\n\
         - Skills: {}\n\n\
         CV Content Preview:\n{}",
        cv.page_count,
        cv.word_count,
        data.email.as_deref().unwrap_or("Not found"),
        data.phone.as_deref().unwrap_or("Not found"),
        join_or_none(&data.skills),
        truncate_chars(cv.text(), PREVIEW_CHARS),
    )
}

pub fn project_summary(project: &DocumentContent) -> String {
    let data = &project.extracted_data;
    format!(
        "Project Report Summary:\n\
         - Pages: {}\n\
         - Words: {}\n\
         - Technologies: {}\n\
         - Code Blocks: {}\n\
         - Sections: {}\n\n\
         Project Content Preview:\n{}",
        project.page_count,
        project.word_count,
        join_or_none(&data.technologies),
        data.code_blocks,
        join_or_none(&data.sections),
        truncate_chars(project.text(), PREVIEW_CHARS),
    )
}

fn rubric(track: Track) -> String {
    let mut out = String::new();
    for (i, criterion) in track.criteria().iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} ({:.0}%): {}",
            i + 1,
            criterion.title(),
            criterion.weight() * 100.0,
            criterion.description()
        );
    }
    out
}

fn output_format(track: Track) -> String {
    let mut out = String::new();
    for criterion in track.criteria() {
        let _ = writeln!(out, "{}: [score]/5 - [brief justification]", criterion.label());
    }
    out.push_str("Overall Feedback: [2-3 sentences]");
    out
}

fn scoring_prompt(intro: &str, context: &str, document: &str, track: Track) -> String {
    format!(
        "{intro}\n\n\
         REFERENCE CONTEXT:\n{context}\n\n\
         {document}\n\n\
         Score each criterion from 1 to 5:\n{rubric}\n\
         Respond using exactly this format, one line per criterion:\n{format}",
        rubric = rubric(track),
        format = output_format(track),
    )
}

pub fn cv_prompt(job_title: &str, context: &str, cv: &DocumentContent) -> String {
    scoring_prompt(
        &format!(
            "You are an experienced technical recruiter evaluating a candidate's CV for the position of {job_title}."
        ),
        context,
        &cv_summary(cv),
        Track::Cv,
    )
}

pub fn project_prompt(context: &str, project: &DocumentContent) -> String {
    scoring_prompt(
        "You are a senior engineer reviewing a candidate's case-study project report.",
        context,
        &project_summary(project),
        Track::Project,
    )
}

/// Asks for a short narrative from both tracks' headline numbers.
pub fn summary_prompt(job_title: &str, cv: &CvEvaluation, project: &ProjectEvaluation) -> String {
    format!(
        "Write a concise hiring summary (3-5 sentences) for a {job_title} candidate.\n\n\
         CV results:\n\
         - Match rate: {:.0}%\n\
         - Technical skills score {:.1}/5, experience score {:.1}/5\n\
         - Feedback: {}\n\n\
         Project results:\n\
         - Overall score {:.1}/5\n\
         - Correctness score {:.1}/5, code quality score {:.1}/5\n\
         - Feedback: {}\n\n\
         Cover the overall assessment, key strengths, areas for improvement and a hiring recommendation.",
        cv.match_rate * 100.0,
        cv.technical_skills,
        cv.experience,
        cv.feedback,
        project.score,
        project.correctness,
        project.code_quality,
        project.feedback,
    )
}
