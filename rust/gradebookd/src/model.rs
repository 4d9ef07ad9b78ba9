use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::input;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StudentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical text of a JSON id. Numbers render without a trailing `.0`, so
/// `1` and `1.0` name the same record; blank strings are not ids.
pub fn id_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_u64().map(|u| u.to_string()))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.to_string())),
        _ => None,
    }
}

// Fixture documents carry numeric ids; request params carry strings.
impl<'de> Deserialize<'de> for StudentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        id_text(&raw)
            .map(Self)
            .ok_or_else(|| de::Error::custom("student id must be a number or a non-blank string"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the four assessment categories every subject is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assessment {
    Assignments,
    Quizzes,
    Projects,
    Exams,
}

impl Assessment {
    pub const ALL: [Assessment; 4] = [
        Assessment::Assignments,
        Assessment::Quizzes,
        Assessment::Projects,
        Assessment::Exams,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Assessment::Assignments => "assignments",
            Assessment::Quizzes => "quizzes",
            Assessment::Projects => "projects",
            Assessment::Exams => "exams",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Assessment::Assignments => "Assignments",
            Assessment::Quizzes => "Quizzes",
            Assessment::Projects => "Projects",
            Assessment::Exams => "Exams",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let t = raw.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.key().eq_ignore_ascii_case(t))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default = "SubjectId::new_v4")]
    pub id: SubjectId,
    pub subject: String,
    pub code: String,
    #[serde(default, deserialize_with = "input::deserialize_score")]
    pub assignments: f64,
    #[serde(default, deserialize_with = "input::deserialize_score")]
    pub quizzes: f64,
    #[serde(default, deserialize_with = "input::deserialize_score")]
    pub projects: f64,
    #[serde(default, deserialize_with = "input::deserialize_score")]
    pub exams: f64,
    #[serde(default)]
    pub feedback: String,
}

impl Subject {
    pub fn score(&self, a: Assessment) -> f64 {
        match a {
            Assessment::Assignments => self.assignments,
            Assessment::Quizzes => self.quizzes,
            Assessment::Projects => self.projects,
            Assessment::Exams => self.exams,
        }
    }

    pub fn set_score(&mut self, a: Assessment, value: f64) {
        match a {
            Assessment::Assignments => self.assignments = value,
            Assessment::Quizzes => self.quizzes = value,
            Assessment::Projects => self.projects = value,
            Assessment::Exams => self.exams = value,
        }
    }

    /// Scores in category order: assignments, quizzes, projects, exams.
    pub fn scores(&self) -> [f64; 4] {
        [self.assignments, self.quizzes, self.projects, self.exams]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub block: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl Student {
    pub fn subject(&self, id: &SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| &s.id == id)
    }

    pub fn subject_mut(&mut self, id: &SubjectId) -> Option<&mut Subject> {
        self.subjects.iter_mut().find(|s| &s.id == id)
    }
}

/// The static document shape: `{ "students": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentDocument {
    #[serde(default)]
    pub students: Vec<Student>,
}
