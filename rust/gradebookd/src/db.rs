use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use crate::model::{Student, StudentId, Subject, SubjectId};

pub const DB_FILE: &str = "gradebook.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            course TEXT NOT NULL,
            block TEXT NOT NULL,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            subject TEXT NOT NULL,
            code TEXT NOT NULL,
            assignments REAL NOT NULL,
            quizzes REAL NOT NULL,
            projects REAL NOT NULL,
            exams REAL NOT NULL,
            feedback TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subjects_student ON subjects(student_id, sort_order)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS commits(
            id TEXT PRIMARY KEY,
            committed_at TEXT NOT NULL,
            student_count INTEGER NOT NULL,
            subject_count INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub id: String,
    pub committed_at: String,
    pub student_count: usize,
    pub subject_count: usize,
}

/// Replace the stored directory with `students` in a single transaction.
pub fn save_snapshot(conn: &mut Connection, students: &[Student]) -> anyhow::Result<CommitInfo> {
    let tx = conn.transaction().context("failed to begin transaction")?;
    tx.execute("DELETE FROM subjects", [])?;
    tx.execute("DELETE FROM students", [])?;

    let mut subject_count = 0usize;
    {
        let mut insert_student = tx.prepare(
            "INSERT INTO students(id, name, course, block, sort_order) VALUES(?, ?, ?, ?, ?)",
        )?;
        let mut insert_subject = tx.prepare(
            "INSERT INTO subjects(
                id, student_id, sort_order, subject, code,
                assignments, quizzes, projects, exams, feedback
             ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        for (i, s) in students.iter().enumerate() {
            insert_student
                .execute((s.id.as_str(), &s.name, &s.course, &s.block, i as i64))
                .with_context(|| format!("failed to write student {}", s.id))?;
            for (j, subj) in s.subjects.iter().enumerate() {
                insert_subject
                    .execute((
                        subj.id.as_str(),
                        s.id.as_str(),
                        j as i64,
                        &subj.subject,
                        &subj.code,
                        subj.assignments,
                        subj.quizzes,
                        subj.projects,
                        subj.exams,
                        &subj.feedback,
                    ))
                    .with_context(|| format!("failed to write subject {}", subj.id))?;
                subject_count += 1;
            }
        }
    }

    let info = CommitInfo {
        id: Uuid::new_v4().to_string(),
        committed_at: chrono::Utc::now().to_rfc3339(),
        student_count: students.len(),
        subject_count,
    };
    tx.execute(
        "INSERT INTO commits(id, committed_at, student_count, subject_count) VALUES(?, ?, ?, ?)",
        (
            &info.id,
            &info.committed_at,
            info.student_count as i64,
            info.subject_count as i64,
        ),
    )?;
    tx.commit().context("failed to commit snapshot")?;
    Ok(info)
}

pub fn load_snapshot(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let mut subjects_by_student: HashMap<String, Vec<Subject>> = HashMap::new();
    let mut subj_stmt = conn.prepare(
        "SELECT id, student_id, subject, code, assignments, quizzes, projects, exams, feedback
         FROM subjects
         ORDER BY student_id, sort_order",
    )?;
    let rows = subj_stmt.query_map([], |r| {
        let student_id: String = r.get(1)?;
        Ok((
            student_id,
            Subject {
                id: SubjectId::from(r.get::<_, String>(0)?.as_str()),
                subject: r.get(2)?,
                code: r.get(3)?,
                assignments: r.get(4)?,
                quizzes: r.get(5)?,
                projects: r.get(6)?,
                exams: r.get(7)?,
                feedback: r.get(8)?,
            },
        ))
    })?;
    for row in rows {
        let (student_id, subject) = row?;
        subjects_by_student
            .entry(student_id)
            .or_default()
            .push(subject);
    }

    let mut stmt = conn.prepare(
        "SELECT id, name, course, block FROM students ORDER BY sort_order",
    )?;
    let students = stmt
        .query_map([], |r| {
            let id: String = r.get(0)?;
            Ok(Student {
                id: StudentId::from(id.as_str()),
                name: r.get(1)?,
                course: r.get(2)?,
                block: r.get(3)?,
                subjects: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(students
        .into_iter()
        .map(|mut s| {
            s.subjects = subjects_by_student.remove(s.id.as_str()).unwrap_or_default();
            s
        })
        .collect())
}

pub fn last_commit(conn: &Connection) -> anyhow::Result<Option<CommitInfo>> {
    let row = conn
        .query_row(
            "SELECT id, committed_at, student_count, subject_count
             FROM commits
             ORDER BY committed_at DESC
             LIMIT 1",
            [],
            |r| {
                Ok(CommitInfo {
                    id: r.get(0)?,
                    committed_at: r.get(1)?,
                    student_count: r.get::<_, i64>(2)? as usize,
                    subject_count: r.get::<_, i64>(3)? as usize,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn settings_get_json(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value_json FROM settings WHERE key = ?", [key], |r| {
            r.get(0)
        })
        .optional()?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let v = serde_json::from_str(&raw)
        .with_context(|| format!("setting {} is not valid JSON", key))?;
    Ok(Some(v))
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

pub fn settings_delete(conn: &Connection, key: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
    Ok(())
}
