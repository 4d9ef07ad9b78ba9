use serde::Serialize;

use crate::model::{Assessment, Student, Subject};

pub const NO_DATA: &str = "no data";

/// Mean of the four assessment scores.
pub fn composite_grade(subject: &Subject) -> f64 {
    subject.scores().iter().sum::<f64>() / 4.0
}

/// Mean of every individual assessment score across all subjects.
/// `None` when the student has no subjects.
pub fn overall_average(subjects: &[Subject]) -> Option<f64> {
    if subjects.is_empty() {
        return None;
    }
    let total: f64 = subjects
        .iter()
        .map(|s| s.scores().iter().sum::<f64>())
        .sum();
    Some(total / (subjects.len() as f64 * 4.0))
}

pub fn format_grade(x: f64) -> String {
    format!("{:.2}", x)
}

pub fn format_average(avg: Option<f64>) -> String {
    avg.map(format_grade).unwrap_or_else(|| NO_DATA.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradingPeriod {
    Prelim,
    Midterm,
    PreFinals,
    Finals,
}

impl GradingPeriod {
    pub const ALL: [GradingPeriod; 4] = [
        GradingPeriod::Prelim,
        GradingPeriod::Midterm,
        GradingPeriod::PreFinals,
        GradingPeriod::Finals,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GradingPeriod::Prelim => "Prelim",
            GradingPeriod::Midterm => "Midterm",
            GradingPeriod::PreFinals => "Pre-Finals",
            GradingPeriod::Finals => "Finals",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let t = raw.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(t))
    }

    pub fn heading(self) -> String {
        format!("{} GRADES", self.label().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGrade {
    pub subject_id: String,
    pub subject: String,
    pub code: String,
    pub grade: f64,
    pub grade_display: String,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student_id: String,
    pub name: String,
    pub course: String,
    pub block: String,
    pub period: String,
    pub heading: String,
    pub subjects: Vec<SubjectGrade>,
    pub overall_average: Option<f64>,
    pub overall_display: String,
}

pub fn student_report(student: &Student, period: GradingPeriod) -> StudentReport {
    let subjects = student
        .subjects
        .iter()
        .map(|s| {
            let grade = composite_grade(s);
            SubjectGrade {
                subject_id: s.id.to_string(),
                subject: s.subject.clone(),
                code: s.code.clone(),
                grade,
                grade_display: format_grade(grade),
                feedback: s.feedback.clone(),
            }
        })
        .collect();
    let avg = overall_average(&student.subjects);

    StudentReport {
        student_id: student.id.to_string(),
        name: student.name.clone(),
        course: student.course.clone(),
        block: student.block.clone(),
        period: period.label().to_string(),
        heading: period.heading(),
        subjects,
        overall_average: avg,
        overall_display: format_average(avg),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub key: &'static str,
    pub label: &'static str,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBreakdown {
    pub subject_id: String,
    pub subject: String,
    pub code: String,
    pub categories: Vec<CategoryScore>,
    pub total: f64,
    pub feedback: String,
}

pub fn subject_breakdown(subject: &Subject) -> SubjectBreakdown {
    SubjectBreakdown {
        subject_id: subject.id.to_string(),
        subject: subject.subject.clone(),
        code: subject.code.clone(),
        categories: Assessment::ALL
            .into_iter()
            .map(|a| CategoryScore {
                key: a.key(),
                label: a.label(),
                score: subject.score(a),
            })
            .collect(),
        total: composite_grade(subject),
        feedback: subject.feedback.clone(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub student_id: String,
    pub name: String,
    pub course: String,
    pub block: String,
    pub subject_count: usize,
    pub overall_average: Option<f64>,
    pub overall_display: String,
}

pub fn dashboard_rows<'a, I>(students: I) -> Vec<DashboardRow>
where
    I: IntoIterator<Item = &'a Student>,
{
    students
        .into_iter()
        .map(|s| {
            let avg = overall_average(&s.subjects);
            DashboardRow {
                student_id: s.id.to_string(),
                name: s.name.clone(),
                course: s.course.clone(),
                block: s.block.clone(),
                subject_count: s.subjects.len(),
                overall_average: avg,
                overall_display: format_average(avg),
            }
        })
        .collect()
}
