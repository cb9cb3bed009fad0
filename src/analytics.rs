use crate::api::StudentRecord;
use crate::utils::time;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct StudentActivity {
    pub student_id: String,
    pub message_count: u64,
    /// The backend has no per-task breakdown yet.
    pub unique_tasks: u64,
    pub first_message: Option<DateTime<Utc>>,
    pub last_message: Option<DateTime<Utc>>,
}

/// Snapshot of the last analytics fetch. It is the only fetched data kept
/// around, so that clicking a student can show details without a request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyticsSummary {
    pub total_students: usize,
    pub total_messages: u64,
    pub avg_messages_per_student: f64,
    pub total_tasks: u64,
    pub students: Vec<StudentActivity>,
}

impl AnalyticsSummary {
    pub fn from_records(records: Vec<StudentRecord>) -> Self {
        let total_students = records.len();
        let total_messages: u64 = records.iter().map(|r| r.message_count).sum();
        let avg_messages_per_student = if total_students > 0 {
            (total_messages as f64 / total_students as f64 * 10.0).round() / 10.0
        } else {
            0.0
        };

        let students = records
            .into_iter()
            .map(|record| StudentActivity {
                student_id: record.username,
                message_count: record.message_count,
                unique_tasks: 0,
                first_message: record.first_interaction.and_then(time::from_epoch_secs),
                last_message: record.last_interaction.and_then(time::from_epoch_secs),
            })
            .collect();

        Self {
            total_students,
            total_messages,
            avg_messages_per_student,
            total_tasks: 0,
            students,
        }
    }

    pub fn student(&self, student_id: &str) -> Option<&StudentActivity> {
        self.students.iter().find(|s| s.student_id == student_id)
    }
}

impl StudentActivity {
    pub fn details(&self) -> Vec<(&'static str, String)> {
        let when = |t: &Option<DateTime<Utc>>| {
            t.as_ref()
                .map(time::format_datetime)
                .unwrap_or_else(|| "unknown".to_string())
        };
        vec![
            ("Student ID", self.student_id.clone()),
            ("Total Messages", self.message_count.to_string()),
            ("Unique Tasks", self.unique_tasks.to_string()),
            ("First Message", when(&self.first_message)),
            ("Last Message", when(&self.last_message)),
        ]
    }
}
