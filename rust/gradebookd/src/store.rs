use serde::Serialize;

use crate::error::{GradebookError, Result};
use crate::input::{self, StudentDraft, SubjectDraft};
use crate::model::{Assessment, Student, StudentDocument, StudentId, Subject, SubjectId};

/// A delete awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PendingDelete {
    #[serde(rename_all = "camelCase")]
    Student { student_id: StudentId },
    #[serde(rename_all = "camelCase")]
    Subject {
        student_id: StudentId,
        subject_id: SubjectId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Removed {
    Student(Student),
    Subject(Subject),
}

/// In-memory student directory plus the teacher panel's selection state.
///
/// The selection is kept as an id and resolved against `students` on every
/// read, so it always observes the same value as the collection.
#[derive(Debug, Default)]
pub struct GradeBook {
    students: Vec<Student>,
    selected: Option<StudentId>,
    pending: Option<PendingDelete>,
    dirty: bool,
}

impl GradeBook {
    pub fn replace(&mut self, doc: StudentDocument) {
        self.students = doc.students;
        self.selected = None;
        self.pending = None;
        self.dirty = false;
    }

    pub fn to_document(&self) -> StudentDocument {
        StudentDocument {
            students: self.students.clone(),
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn student(&self, id: &StudentId) -> Option<&Student> {
        self.students.iter().find(|s| &s.id == id)
    }

    fn student_mut(&mut self, id: &StudentId) -> Result<&mut Student> {
        self.students
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| GradebookError::NotFound(format!("student {}", id)))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_committed(&mut self) {
        self.dirty = false;
    }

    pub fn pending(&self) -> Option<&PendingDelete> {
        self.pending.as_ref()
    }

    // --- filtering ---

    /// Distinct courses in first-seen order.
    pub fn courses(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for s in &self.students {
            if !out.contains(&s.course) {
                out.push(s.course.clone());
            }
        }
        out
    }

    /// Distinct blocks among students of `course`, in first-seen order.
    pub fn blocks(&self, course: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for s in self.students.iter().filter(|s| s.course == course) {
            if !out.contains(&s.block) {
                out.push(s.block.clone());
            }
        }
        out
    }

    pub fn filtered<'a>(
        &'a self,
        course: Option<&'a str>,
        block: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Student> + 'a {
        self.students.iter().filter(move |s| {
            course.map(|c| s.course == c).unwrap_or(true)
                && block.map(|b| s.block == b).unwrap_or(true)
        })
    }

    // --- selection ---

    pub fn select(&mut self, id: &StudentId) -> Result<&Student> {
        if self.student(id).is_none() {
            return Err(GradebookError::NotFound(format!("student {}", id)));
        }
        self.selected = Some(id.clone());
        self.student(id)
            .ok_or_else(|| GradebookError::NotFound(format!("student {}", id)))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&StudentId> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&Student> {
        self.selected.as_ref().and_then(|id| self.student(id))
    }

    // --- students ---

    pub fn add_student(&mut self, draft: StudentDraft) -> Result<&Student> {
        draft.validate()?;
        self.students.push(Student {
            id: StudentId::new_v4(),
            name: draft.name,
            course: draft.course,
            block: draft.block,
            subjects: Vec::new(),
        });
        self.dirty = true;
        self.students
            .last()
            .ok_or_else(|| GradebookError::NotFound("new student".to_string()))
    }

    pub fn request_delete_student(&mut self, id: &StudentId) -> Result<()> {
        if self.student(id).is_none() {
            return Err(GradebookError::NotFound(format!("student {}", id)));
        }
        self.pending = Some(PendingDelete::Student {
            student_id: id.clone(),
        });
        Ok(())
    }

    // --- subjects ---

    pub fn add_subject(
        &mut self,
        student_id: &StudentId,
        draft: SubjectDraft,
    ) -> Result<&Subject> {
        draft.validate()?;
        let student = self.student_mut(student_id)?;
        student.subjects.push(draft.into_subject());
        self.dirty = true;
        self.student(student_id)
            .and_then(|s| s.subjects.last())
            .ok_or_else(|| GradebookError::NotFound("new subject".to_string()))
    }

    /// Resolve a positional index to a stable id. Out-of-range yields `None`.
    pub fn subject_id_at(&self, student_id: &StudentId, index: usize) -> Option<SubjectId> {
        self.student(student_id)
            .and_then(|s| s.subjects.get(index))
            .map(|s| s.id.clone())
    }

    pub fn request_delete_subject(
        &mut self,
        student_id: &StudentId,
        subject_id: &SubjectId,
    ) -> Result<()> {
        let exists = self
            .student(student_id)
            .ok_or_else(|| GradebookError::NotFound(format!("student {}", student_id)))?
            .subject(subject_id)
            .is_some();
        if !exists {
            return Err(GradebookError::NotFound(format!("subject {}", subject_id)));
        }
        self.pending = Some(PendingDelete::Subject {
            student_id: student_id.clone(),
            subject_id: subject_id.clone(),
        });
        Ok(())
    }

    /// Apply the pending delete. A target that vanished since the request is
    /// a no-op and yields `None`.
    pub fn confirm_delete(&mut self) -> Option<Removed> {
        let pending = self.pending.take()?;
        let removed = match pending {
            PendingDelete::Student { student_id } => {
                let pos = self.students.iter().position(|s| s.id == student_id)?;
                if self.selected.as_ref() == Some(&student_id) {
                    self.selected = None;
                }
                Removed::Student(self.students.remove(pos))
            }
            PendingDelete::Subject {
                student_id,
                subject_id,
            } => {
                let student = self.students.iter_mut().find(|s| s.id == student_id)?;
                let pos = student.subjects.iter().position(|s| s.id == subject_id)?;
                Removed::Subject(student.subjects.remove(pos))
            }
        };
        self.dirty = true;
        Some(removed)
    }

    pub fn cancel_delete(&mut self) -> Option<PendingDelete> {
        self.pending.take()
    }

    pub fn edit_score(
        &mut self,
        student_id: &StudentId,
        subject_id: &SubjectId,
        assessment: Assessment,
        raw: &serde_json::Value,
    ) -> Result<&Subject> {
        let value = input::coerce_score(raw);
        let subject = self
            .student_mut(student_id)?
            .subject_mut(subject_id)
            .ok_or_else(|| GradebookError::NotFound(format!("subject {}", subject_id)))?;
        subject.set_score(assessment, value);
        self.dirty = true;
        self.subject(student_id, subject_id)
    }

    pub fn edit_feedback(
        &mut self,
        student_id: &StudentId,
        subject_id: &SubjectId,
        feedback: &str,
    ) -> Result<&Subject> {
        let subject = self
            .student_mut(student_id)?
            .subject_mut(subject_id)
            .ok_or_else(|| GradebookError::NotFound(format!("subject {}", subject_id)))?;
        subject.feedback = feedback.to_string();
        self.dirty = true;
        self.subject(student_id, subject_id)
    }

    fn subject(&self, student_id: &StudentId, subject_id: &SubjectId) -> Result<&Subject> {
        self.student(student_id)
            .and_then(|s| s.subject(subject_id))
            .ok_or_else(|| GradebookError::NotFound(format!("subject {}", subject_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc;
    use serde_json::json;

    fn student(id: &str, name: &str, course: &str, block: &str) -> Student {
        Student {
            id: StudentId::from(id),
            name: name.into(),
            course: course.into(),
            block: block.into(),
            subjects: Vec::new(),
        }
    }

    fn book() -> GradeBook {
        let mut b = GradeBook::default();
        b.replace(StudentDocument {
            students: vec![
                student("1", "Ana", "BSIT", "A"),
                student("2", "Ben", "BSIT", "B"),
                student("3", "Cy", "BSCS", "A"),
                student("4", "Di", "BSIT", "A"),
            ],
        });
        b
    }

    fn calculus() -> SubjectDraft {
        SubjectDraft::from_params(&json!({
            "subject": "Calculus",
            "code": "MATH101",
            "assignments": 90,
            "quizzes": 85,
            "projects": 88,
            "exams": 92,
            "feedback": "Good"
        }))
        .expect("valid draft")
    }

    fn assert_selection_consistent(b: &GradeBook) {
        let sel = b.selected().expect("selection").clone();
        assert_eq!(b.student(&sel.id), Some(&sel));
    }

    #[test]
    fn course_and_block_filters_keep_first_seen_order() {
        let b = book();
        assert_eq!(b.courses(), vec!["BSIT", "BSCS"]);
        assert_eq!(b.blocks("BSIT"), vec!["A", "B"]);
        let names: Vec<&str> = b
            .filtered(Some("BSIT"), Some("A"))
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ana", "Di"]);
    }

    #[test]
    fn add_subject_appends_one_entry() {
        let mut b = book();
        let id = StudentId::from("1");
        let grade = calc::composite_grade(b.add_subject(&id, calculus()).expect("added"));
        assert_eq!(grade, 88.75);
        assert_eq!(b.student(&id).map(|s| s.subjects.len()), Some(1));
        assert!(b.is_dirty());
    }

    #[test]
    fn invalid_subject_leaves_list_unchanged() {
        let mut b = book();
        let id = StudentId::from("1");
        b.add_subject(&id, calculus()).expect("added");
        let before = b.student(&id).cloned();

        let mut bad = calculus();
        bad.subject = String::new();
        let err = b.add_subject(&id, bad).expect_err("blank subject");
        assert_eq!(err.code(), "validation_failed");
        assert_eq!(b.student(&id).cloned(), before);
    }

    #[test]
    fn add_then_delete_subject_restores_list() {
        let mut b = book();
        let id = StudentId::from("2");
        b.add_subject(&id, calculus()).expect("first");
        let before = b.student(&id).map(|s| s.subjects.clone());

        b.add_subject(&id, calculus()).expect("second");
        let idx = b.student(&id).map(|s| s.subjects.len() - 1).expect("student");
        let sid = b.subject_id_at(&id, idx).expect("index in range");
        b.request_delete_subject(&id, &sid).expect("request");
        assert!(matches!(b.confirm_delete(), Some(Removed::Subject(_))));

        assert_eq!(b.student(&id).map(|s| s.subjects.clone()), before);
    }

    #[test]
    fn stale_subject_delete_is_noop() {
        let mut b = book();
        let id = StudentId::from("1");
        let sid = b.add_subject(&id, calculus()).expect("added").id.clone();
        b.request_delete_subject(&id, &sid).expect("request");

        // The subject disappears before confirmation.
        b.students[0].subjects.clear();
        assert_eq!(b.confirm_delete(), None);
        assert!(b.pending().is_none());
        assert!(b.subject_id_at(&id, 0).is_none());
    }

    #[test]
    fn deleting_selected_student_clears_selection() {
        let mut b = book();
        let id = StudentId::from("3");
        b.select(&id).expect("select");
        b.request_delete_student(&id).expect("request");
        assert!(matches!(b.confirm_delete(), Some(Removed::Student(_))));
        assert!(b.selected().is_none());
        assert!(b.student(&id).is_none());
    }

    #[test]
    fn cancel_keeps_student() {
        let mut b = book();
        let id = StudentId::from("2");
        b.request_delete_student(&id).expect("request");
        assert!(b.cancel_delete().is_some());
        assert_eq!(b.confirm_delete(), None);
        assert!(b.student(&id).is_some());
    }

    #[test]
    fn selection_tracks_every_subject_mutation() {
        let mut b = book();
        let id = StudentId::from("1");
        b.select(&id).expect("select");

        let sid = b.add_subject(&id, calculus()).expect("added").id.clone();
        assert_selection_consistent(&b);

        b.edit_score(&id, &sid, Assessment::Exams, &json!("70"))
            .expect("edit score");
        assert_selection_consistent(&b);
        assert_eq!(b.selected().map(|s| s.subjects[0].exams), Some(70.0));

        b.edit_feedback(&id, &sid, "Needs review").expect("edit feedback");
        assert_selection_consistent(&b);

        b.request_delete_subject(&id, &sid).expect("request");
        b.confirm_delete();
        assert_selection_consistent(&b);
        assert_eq!(b.selected().map(|s| s.subjects.len()), Some(0));
    }

    #[test]
    fn edit_score_coerces_junk_to_zero() {
        let mut b = book();
        let id = StudentId::from("1");
        let sid = b.add_subject(&id, calculus()).expect("added").id.clone();
        let s = b
            .edit_score(&id, &sid, Assessment::Quizzes, &json!("abc"))
            .expect("edit");
        assert_eq!(s.quizzes, 0.0);
    }

    #[test]
    fn add_student_requires_name() {
        let mut b = book();
        let draft = StudentDraft {
            name: "  ".into(),
            course: "BSIT".into(),
            block: "A".into(),
        };
        assert!(b.add_student(draft).is_err());
        assert_eq!(b.students().len(), 4);

        let draft = StudentDraft {
            name: "Eve".into(),
            course: "BSIT".into(),
            block: "C".into(),
        };
        let added = b.add_student(draft).expect("added").clone();
        assert!(added.subjects.is_empty());
        assert_eq!(b.blocks("BSIT"), vec!["A", "B", "C"]);
    }

    #[test]
    fn select_unknown_student_fails() {
        let mut b = book();
        assert!(b.select(&StudentId::from("99")).is_err());
        assert!(b.selected_id().is_none());
    }
}
