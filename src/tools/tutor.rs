//! Tutor tools: learning material lookup and student progress tracking.
//!
//! The progress tools share one [`ProgressBook`]. Updates take its write
//! lock, reads take the read lock, so concurrent updates never lose writes
//! and lookups run in parallel.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::{json, Value};

use crate::registry::{ParamSpec, Resource, Tool, ToolError, ToolSchema, ValidatedArgs};

/// Subject → topic → summary.
const MATERIALS: &[(&str, &[(&str, &str)])] = &[
    (
        "math",
        &[
            ("algebra", "Core algebra concepts and formulas: expressions, equations, functions."),
            ("calculus", "Foundations of calculus: limits, derivatives and integrals."),
            ("geometry", "Principles and theorems of plane and solid geometry."),
        ],
    ),
    (
        "programming",
        &[
            ("python", "Python basics: syntax, data types, control flow and functions."),
            ("javascript", "JavaScript overview: syntax, the DOM and asynchronous code."),
        ],
    ),
];

fn subject_topics(subject: &str) -> Option<&'static [(&'static str, &'static str)]> {
    MATERIALS
        .iter()
        .find(|(name, _)| *name == subject)
        .map(|(_, topics)| *topics)
}

/// The material catalog as a resource.
#[must_use]
pub fn materials_resource() -> Resource {
    let catalog: BTreeMap<&str, Vec<&str>> = MATERIALS
        .iter()
        .map(|(subject, topics)| (*subject, topics.iter().map(|(t, _)| *t).collect()))
        .collect();

    Resource::text(
        "learning-materials",
        "catalog",
        json!(catalog).to_string(),
    )
    .with_metadata("description", "Subjects and topics searchable with search_learning_materials")
    .with_metadata("format", "application/json")
}

/// `search_learning_materials`: looks up a subject or one of its topics.
pub struct SearchMaterials {
    schema: ToolSchema,
}

impl SearchMaterials {
    /// Creates the tool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new()
                .required(
                    "subject",
                    ParamSpec::string("Subject to search (math, programming)")
                        .with_enum(MATERIALS.iter().map(|(subject, _)| *subject)),
                )
                .optional("topic", ParamSpec::string("Topic within the subject (optional)")),
        }
    }
}

impl Default for SearchMaterials {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SearchMaterials {
    fn name(&self) -> &str {
        "search_learning_materials"
    }

    fn description(&self) -> &str {
        "Search learning subjects and materials"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn execute(&self, args: &ValidatedArgs) -> Result<Value, ToolError> {
        let subject = args.require_str("subject")?;
        let topics = subject_topics(subject).ok_or_else(|| {
            ToolError::InvalidArguments(format!("subject '{subject}' not found"))
        })?;

        match args.str("topic") {
            Some(topic) => {
                let (_, content) = topics
                    .iter()
                    .find(|(name, _)| *name == topic)
                    .ok_or_else(|| {
                        ToolError::InvalidArguments(format!(
                            "topic '{topic}' not found in '{subject}'"
                        ))
                    })?;
                Ok(json!({
                    "subject": subject,
                    "topic": topic,
                    "content": content,
                }))
            }
            None => Ok(json!({
                "subject": subject,
                "available_topics": topics.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            })),
        }
    }
}

/// Recorded state of one topic for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEntry {
    /// Whether the topic is finished.
    pub completed: bool,
    /// Optional score.
    pub score: Option<i64>,
    /// RFC 3339 time of the last update.
    pub timestamp: String,
}

type SubjectProgress = BTreeMap<String, BTreeMap<String, ProgressEntry>>;

/// Shared student → subject → topic progress map.
#[derive(Debug, Default)]
pub struct ProgressBook {
    students: RwLock<BTreeMap<String, SubjectProgress>>,
}

impl ProgressBook {
    /// Records progress, replacing any earlier entry for the same topic.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock was poisoned by a panicking writer.
    pub fn record(
        &self,
        student: &str,
        subject: &str,
        topic: &str,
        entry: ProgressEntry,
    ) -> Result<(), ToolError> {
        let mut students = self
            .students
            .write()
            .map_err(|_| ToolError::Failed("progress store is unavailable".to_string()))?;
        students
            .entry(student.to_string())
            .or_default()
            .entry(subject.to_string())
            .or_default()
            .insert(topic.to_string(), entry);
        Ok(())
    }

    /// Returns a student's progress, optionally limited to one subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock was poisoned by a panicking writer.
    pub fn snapshot(
        &self,
        student: &str,
        subject: Option<&str>,
    ) -> Result<SubjectProgress, ToolError> {
        let students = self
            .students
            .read()
            .map_err(|_| ToolError::Failed("progress store is unavailable".to_string()))?;
        let Some(progress) = students.get(student) else {
            return Ok(SubjectProgress::new());
        };
        Ok(match subject {
            Some(subject) => progress
                .get_key_value(subject)
                .map(|(k, v)| (k.clone(), v.clone()))
                .into_iter()
                .collect(),
            None => progress.clone(),
        })
    }

    /// Number of recorded topics across all students.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock was poisoned by a panicking writer.
    pub fn topic_count(&self) -> Result<usize, ToolError> {
        let students = self
            .students
            .read()
            .map_err(|_| ToolError::Failed("progress store is unavailable".to_string()))?;
        Ok(students
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum())
    }
}

/// `track_student_progress`: records a student's progress on a topic.
pub struct TrackProgress {
    book: Arc<ProgressBook>,
    schema: ToolSchema,
}

impl TrackProgress {
    /// Creates the tool writing to `book`.
    #[must_use]
    pub fn new(book: Arc<ProgressBook>) -> Self {
        Self {
            book,
            schema: ToolSchema::new()
                .required("student_id", ParamSpec::string("Student id"))
                .required("subject", ParamSpec::string("Subject"))
                .required("topic", ParamSpec::string("Topic"))
                .optional(
                    "completed",
                    ParamSpec::boolean("Whether the topic is finished").with_default(false),
                )
                .optional("score", ParamSpec::integer("Score (optional)")),
        }
    }
}

impl Tool for TrackProgress {
    fn name(&self) -> &str {
        "track_student_progress"
    }

    fn description(&self) -> &str {
        "Track a student's learning progress"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn execute(&self, args: &ValidatedArgs) -> Result<Value, ToolError> {
        let student = args.require_str("student_id")?;
        let subject = args.require_str("subject")?;
        let topic = args.require_str("topic")?;
        let completed = args.bool("completed").unwrap_or(false);
        let score = args.i64("score");

        self.book.record(
            student,
            subject,
            topic,
            ProgressEntry {
                completed,
                score,
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
        )?;

        tracing::debug!(student, subject, topic, completed, "Recorded progress");

        Ok(json!({
            "success": true,
            "student_id": student,
            "subject": subject,
            "topic": topic,
            "status": if completed { "completed" } else { "in progress" },
            "score": score,
        }))
    }
}

/// `get_student_progress`: reads back what `track_student_progress` stored.
pub struct GetProgress {
    book: Arc<ProgressBook>,
    schema: ToolSchema,
}

impl GetProgress {
    /// Creates the tool reading from `book`.
    #[must_use]
    pub fn new(book: Arc<ProgressBook>) -> Self {
        Self {
            book,
            schema: ToolSchema::new()
                .required("student_id", ParamSpec::string("Student id"))
                .optional("subject", ParamSpec::string("Limit to one subject (optional)")),
        }
    }
}

impl Tool for GetProgress {
    fn name(&self) -> &str {
        "get_student_progress"
    }

    fn description(&self) -> &str {
        "Show a student's recorded progress"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn execute(&self, args: &ValidatedArgs) -> Result<Value, ToolError> {
        let student = args.require_str("student_id")?;
        let progress = self.book.snapshot(student, args.str("subject"))?;
        Ok(json!({
            "student_id": student,
            "progress": progress,
        }))
    }
}
