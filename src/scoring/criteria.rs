use serde::{Deserialize, Serialize};

/// One of the two evaluation tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Cv,
    Project,
}

impl Track {
    /// Criteria of this track, in prompt order.
    pub fn criteria(&self) -> &'static [Criterion] {
        match self {
            Track::Cv => &[
                Criterion::TechnicalSkills,
                Criterion::Experience,
                Criterion::Achievements,
                Criterion::CulturalFit,
            ],
            Track::Project => &[
                Criterion::Correctness,
                Criterion::CodeQuality,
                Criterion::Resilience,
                Criterion::Documentation,
                Criterion::Creativity,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Cv => "cv",
            Track::Project => "project",
        }
    }
}

/// A weighted rubric criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    TechnicalSkills,
    Experience,
    Achievements,
    CulturalFit,
    Correctness,
    CodeQuality,
    Resilience,
    Documentation,
    Creativity,
}

impl Criterion {
    /// Line label the model must answer with (`<label>: <score>/5 - ...`).
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::TechnicalSkills => "Technical Skills",
            Criterion::Experience => "Experience",
            Criterion::Achievements => "Achievements",
            Criterion::CulturalFit => "Cultural Fit",
            Criterion::Correctness => "Correctness",
            Criterion::CodeQuality => "Code Quality",
            Criterion::Resilience => "Resilience",
            Criterion::Documentation => "Documentation",
            Criterion::Creativity => "Creativity",
        }
    }

    /// Rubric heading shown in the prompt.
    pub fn title(&self) -> &'static str {
        match self {
            Criterion::TechnicalSkills => "Technical Skills Match",
            Criterion::Experience => "Experience Level",
            Criterion::Achievements => "Relevant Achievements",
            Criterion::CulturalFit => "Cultural/Collaboration Fit",
            other => other.label(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Criterion::TechnicalSkills => {
                "How well do the candidate's technical skills match the job requirements?"
            }
            Criterion::Experience => "Years of experience and project complexity",
            Criterion::Achievements => "Impact and measurable outcomes",
            Criterion::CulturalFit => "Communication, teamwork, learning mindset",
            Criterion::Correctness => "Meets requirements, implements required features",
            Criterion::CodeQuality => "Clean, modular, well-structured, tested",
            Criterion::Resilience => "Error handling, retries, handles failures",
            Criterion::Documentation => "Clear README, explanations, setup instructions",
            Criterion::Creativity => "Extra features, innovative solutions",
        }
    }

    /// Weight within the criterion's track. Weights of a track sum to 1.
    pub fn weight(&self) -> f64 {
        match self {
            Criterion::TechnicalSkills => 0.40,
            Criterion::Experience => 0.25,
            Criterion::Achievements => 0.20,
            Criterion::CulturalFit => 0.15,
            Criterion::Correctness => 0.30,
            Criterion::CodeQuality => 0.25,
            Criterion::Resilience => 0.20,
            Criterion::Documentation => 0.15,
            Criterion::Creativity => 0.10,
        }
    }

    pub fn track(&self) -> Track {
        match self {
            Criterion::TechnicalSkills
            | Criterion::Experience
            | Criterion::Achievements
            | Criterion::CulturalFit => Track::Cv,
            _ => Track::Project,
        }
    }
}
