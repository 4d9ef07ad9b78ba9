use serde::{Deserialize, Serialize};

use crate::error::{GradebookError, Result};
use crate::model::StudentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    Dashboard,
    StudentGrades,
    SubjectGrades,
    TeacherGrading,
    Login,
    Signup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub view: View,
}

/// Role flag of the current user. Persisted by the caller into the
/// workspace settings; this type only owns the lifecycle rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
}

impl Session {
    pub fn login(
        &mut self,
        role: Role,
        access_code: Option<&str>,
        student_id: Option<StudentId>,
    ) -> Result<()> {
        if role == Role::Teacher && access_code.map(str::trim).unwrap_or("").is_empty() {
            return Err(GradebookError::validation(
                "accessCode",
                "please enter the teacher access code",
            ));
        }
        self.set(role, student_id);
        Ok(())
    }

    pub fn signup(&mut self, role: Role, student_id: Option<StudentId>) {
        self.set(role, student_id);
    }

    fn set(&mut self, role: Role, student_id: Option<StudentId>) {
        self.role = Some(role);
        self.student_id = match role {
            Role::Student => student_id,
            Role::Teacher => None,
        };
    }

    pub fn logout(&mut self) {
        self.role = None;
        self.student_id = None;
    }

    pub fn require(&self, role: Role) -> Result<()> {
        if self.role == Some(role) {
            return Ok(());
        }
        Err(GradebookError::Forbidden(format!(
            "{} role required",
            match role {
                Role::Student => "student",
                Role::Teacher => "teacher",
            }
        )))
    }

    pub fn can_access(&self, view: View) -> bool {
        match (self.role, view) {
            (None, View::Login | View::Signup) => true,
            (None, _) => false,
            (Some(_), View::Login | View::Signup) => false,
            (Some(Role::Teacher), _) => true,
            (Some(Role::Student), View::TeacherGrading) => false,
            (Some(Role::Student), _) => true,
        }
    }

    /// Menu for the current role; empty when logged out.
    pub fn navigation(&self) -> Vec<NavItem> {
        let Some(role) = self.role else {
            return Vec::new();
        };
        let mut items = vec![
            NavItem {
                label: "Dashboard",
                view: View::Dashboard,
            },
            NavItem {
                label: match role {
                    Role::Student => "My Grades",
                    Role::Teacher => "Student Grades",
                },
                view: View::StudentGrades,
            },
            NavItem {
                label: "Courses",
                view: View::SubjectGrades,
            },
        ];
        if role == Role::Teacher {
            items.insert(
                2,
                NavItem {
                    label: "Teacher Grading",
                    view: View::TeacherGrading,
                },
            );
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teacher_login_needs_access_code() {
        let mut s = Session::default();
        assert!(s.login(Role::Teacher, Some("  "), None).is_err());
        assert_eq!(s.role, None);
        s.login(Role::Teacher, Some("T-1234"), None).expect("login");
        assert_eq!(s.role, Some(Role::Teacher));
    }

    #[test]
    fn student_login_links_own_record() {
        let mut s = Session::default();
        s.login(Role::Student, None, Some(StudentId::from("1")))
            .expect("login");
        assert_eq!(s.student_id, Some(StudentId::from("1")));
        s.logout();
        assert_eq!(s, Session::default());
    }

    #[test]
    fn navigation_depends_on_role() {
        let mut s = Session::default();
        assert!(s.navigation().is_empty());
        assert!(s.can_access(View::Login));

        s.signup(Role::Student, None);
        let labels: Vec<&str> = s.navigation().iter().map(|n| n.label).collect();
        assert_eq!(labels, vec!["Dashboard", "My Grades", "Courses"]);
        assert!(!s.can_access(View::TeacherGrading));
        assert!(s.require(Role::Teacher).is_err());

        s.signup(Role::Teacher, None);
        let labels: Vec<&str> = s.navigation().iter().map(|n| n.label).collect();
        assert_eq!(
            labels,
            vec!["Dashboard", "Student Grades", "Teacher Grading", "Courses"]
        );
        assert!(s.can_access(View::TeacherGrading));
        assert!(!s.can_access(View::Signup));
    }
}
