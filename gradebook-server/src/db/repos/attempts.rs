//! Attempt repository: latest exam attempts with nested question and
//! answer results.
//!
//! Three dependent fetches run strictly sequentially (each stage's filter
//! set comes from the previous stage), then two grouping passes fold the
//! flat rows into one tree per attempt. The limit clamp exists because the
//! exam-result fetch fans out into the batched child fetches: each extra
//! attempt multiplies the downstream row counts.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use gradebook_core::{
    column_keys, group_by_fk, scalar_key, ConfigError, ExamSchema, Row, SafeIdentifier,
    WarehouseSection,
};

use super::note_keyless_rows;
use crate::db::executor::{QueryExecutor, QueryParam, StoreError, TableRef};

/// Attempts below this are raised to it.
const MIN_ATTEMPT_LIMIT: i64 = 1;
/// Guardrail against unranked fan-out queries; requests above are clamped.
const MAX_ATTEMPT_LIMIT: i64 = 5;

/// One exam attempt with its question results, each carrying an `answers`
/// array. Built per request, discarded after serialization.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptTree {
    pub exam_result: Row,
    pub questions: Vec<Row>,
}

/// Assembles the exam-result → question-result → answer-result hierarchy.
pub struct AttemptRepo {
    executor: Arc<dyn QueryExecutor>,
    exam_results: TableRef,
    question_results: TableRef,
    answer_results: TableRef,
    order_col: SafeIdentifier,
    student_col: SafeIdentifier,
    test_col: SafeIdentifier,
    exam_id_col: SafeIdentifier,
    question_id_col: SafeIdentifier,
    question_fk_col: SafeIdentifier,
    answer_fk_col: SafeIdentifier,
}

impl AttemptRepo {
    /// Validate the configured schema mapping and build the repository.
    ///
    /// An invalid identifier fails here, before any query runs.
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        warehouse: &WarehouseSection,
        schema: &ExamSchema,
    ) -> Result<Self, ConfigError> {
        let dataset = SafeIdentifier::new(&warehouse.schema, "warehouse schema")?;
        Ok(Self {
            executor,
            exam_results: TableRef::new(
                &dataset,
                &SafeIdentifier::new(&schema.exam_result_table, "exam result table")?,
            ),
            question_results: TableRef::new(
                &dataset,
                &SafeIdentifier::new(&schema.question_result_table, "question result table")?,
            ),
            answer_results: TableRef::new(
                &dataset,
                &SafeIdentifier::new(&schema.answer_result_table, "answer result table")?,
            ),
            order_col: SafeIdentifier::new(&schema.order_column, "order column")?,
            student_col: SafeIdentifier::new(&schema.student_column, "student column")?,
            test_col: SafeIdentifier::new(&schema.test_column, "test column")?,
            exam_id_col: SafeIdentifier::new(
                &schema.exam_result_id_column,
                "exam result id column",
            )?,
            question_id_col: SafeIdentifier::new(
                &schema.question_result_id_column,
                "question result id column",
            )?,
            question_fk_col: SafeIdentifier::new(
                &schema.question_result_fk_column,
                "question result FK column",
            )?,
            answer_fk_col: SafeIdentifier::new(
                &schema.answer_result_fk_column,
                "answer result FK column",
            )?,
        })
    }

    /// Return the latest attempts for a student/test pair, most recent
    /// first, with nested question and answer results.
    ///
    /// Output length and order match the exam-result fetch; an attempt
    /// with no questions still appears, with `questions: []`.
    pub async fn latest_attempts(
        &self,
        student_id: &str,
        test_id: &str,
        limit: i64,
    ) -> Result<Vec<AttemptTree>, StoreError> {
        let limit = limit.clamp(MIN_ATTEMPT_LIMIT, MAX_ATTEMPT_LIMIT);
        let exam_results = self
            .fetch_exam_results(student_id, test_id, limit)
            .await?;
        if exam_results.is_empty() {
            return Ok(Vec::new());
        }

        let exam_ids = column_keys(&exam_results, self.exam_id_col.as_str());
        let question_results = self.fetch_question_results(exam_ids).await?;

        let question_ids = column_keys(&question_results, self.question_id_col.as_str());
        let answer_results = if question_ids.is_empty() {
            Vec::new()
        } else {
            self.fetch_answer_results(question_ids).await?
        };

        note_keyless_rows(&answer_results, &self.answer_fk_col, "answer results");
        let answers_by_question = group_by_fk(answer_results, |row| {
            row.get(self.answer_fk_col.as_str()).and_then(scalar_key)
        });

        let questions_with_answers: Vec<Row> = question_results
            .into_iter()
            .map(|mut question| {
                let answers = question
                    .get(self.question_id_col.as_str())
                    .and_then(scalar_key)
                    .and_then(|id| answers_by_question.get(&id).cloned())
                    .unwrap_or_default();
                question.insert(
                    "answers".to_owned(),
                    Value::Array(answers.into_iter().map(Value::Object).collect()),
                );
                question
            })
            .collect();

        note_keyless_rows(
            &questions_with_answers,
            &self.question_fk_col,
            "question results",
        );
        let questions_by_exam = group_by_fk(questions_with_answers, |row| {
            row.get(self.question_fk_col.as_str()).and_then(scalar_key)
        });

        let attempts = exam_results
            .into_iter()
            .map(|exam_result| {
                let questions = exam_result
                    .get(self.exam_id_col.as_str())
                    .and_then(scalar_key)
                    .and_then(|id| questions_by_exam.get(&id).cloned())
                    .unwrap_or_default();
                AttemptTree {
                    exam_result,
                    questions,
                }
            })
            .collect();
        Ok(attempts)
    }

    async fn fetch_exam_results(
        &self,
        student_id: &str,
        test_id: &str,
        limit: i64,
    ) -> Result<Vec<Row>, StoreError> {
        let sql = format!(
            "SELECT * FROM {table} WHERE {student} = $1 AND {test} = $2 \
             ORDER BY {order} DESC LIMIT $3",
            table = self.exam_results,
            student = self.student_col,
            test = self.test_col,
            order = self.order_col,
        );
        self.executor
            .run_query(
                &sql,
                vec![
                    QueryParam::Text(student_id.to_owned()),
                    QueryParam::Text(test_id.to_owned()),
                    QueryParam::Int(limit),
                ],
            )
            .await
    }

    async fn fetch_question_results(
        &self,
        exam_result_ids: Vec<String>,
    ) -> Result<Vec<Row>, StoreError> {
        let sql = format!(
            "SELECT * FROM {table} WHERE {fk} = ANY($1)",
            table = self.question_results,
            fk = self.question_fk_col,
        );
        self.executor
            .run_query(&sql, vec![QueryParam::TextArray(exam_result_ids)])
            .await
    }

    async fn fetch_answer_results(
        &self,
        question_result_ids: Vec<String>,
    ) -> Result<Vec<Row>, StoreError> {
        let sql = format!(
            "SELECT * FROM {table} WHERE {fk} = ANY($1)",
            table = self.answer_results,
            fk = self.answer_fk_col,
        );
        self.executor
            .run_query(&sql, vec![QueryParam::TextArray(question_result_ids)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::executor::testing::ScriptedExecutor;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn repo(executor: Arc<ScriptedExecutor>) -> AttemptRepo {
        AttemptRepo::new(
            executor,
            &WarehouseSection::default(),
            &ExamSchema::default(),
        )
        .unwrap()
    }

    #[test]
    fn invalid_identifier_fails_at_construction() {
        let executor = Arc::new(ScriptedExecutor::new(vec![]));
        let schema = ExamSchema {
            order_column: "created_at; DROP TABLE exam_result".to_string(),
            ..ExamSchema::default()
        };
        let err = AttemptRepo::new(executor.clone(), &WarehouseSection::default(), &schema)
            .err()
            .expect("construction should fail");
        assert!(matches!(err, ConfigError::InvalidIdentifier { .. }));
        // nothing reached the executor
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_exam_results_short_circuit() {
        let executor = Arc::new(ScriptedExecutor::new(vec![vec![]]));
        let attempts = repo(executor.clone())
            .latest_attempts("s1", "t1", 2)
            .await
            .unwrap();

        assert!(attempts.is_empty());
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn limit_zero_behaves_like_one() {
        let executor = Arc::new(ScriptedExecutor::new(vec![vec![]]));
        repo(executor.clone())
            .latest_attempts("s1", "t1", 0)
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0].1[2], QueryParam::Int(1));
    }

    #[tokio::test]
    async fn negative_limit_behaves_like_one() {
        let executor = Arc::new(ScriptedExecutor::new(vec![vec![]]));
        repo(executor.clone())
            .latest_attempts("s1", "t1", -3)
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0].1[2], QueryParam::Int(1));
    }

    #[tokio::test]
    async fn limit_hundred_behaves_like_five() {
        let executor = Arc::new(ScriptedExecutor::new(vec![vec![]]));
        repo(executor.clone())
            .latest_attempts("s1", "t1", 100)
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0].1[2], QueryParam::Int(5));
    }

    #[tokio::test]
    async fn no_answer_fetch_without_question_rows() {
        let exam = row(&[("id", json!("r1")), ("user_id", json!("s1"))]);
        let executor = Arc::new(ScriptedExecutor::new(vec![vec![exam], vec![]]));
        let attempts = repo(executor.clone())
            .latest_attempts("s1", "t1", 1)
            .await
            .unwrap();

        assert_eq!(executor.call_count(), 2);
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].questions.is_empty());
    }

    #[tokio::test]
    async fn attempt_order_follows_exam_fetch_not_question_arrival() {
        let exams = vec![
            row(&[("id", json!("A"))]),
            row(&[("id", json!("B"))]),
        ];
        let questions = vec![
            row(&[("id", json!("Q1")), ("exam_result_id", json!("B"))]),
            row(&[("id", json!("Q2")), ("exam_result_id", json!("A"))]),
        ];
        let executor = Arc::new(ScriptedExecutor::new(vec![exams, questions, vec![]]));
        let attempts = repo(executor)
            .latest_attempts("s1", "t1", 2)
            .await
            .unwrap();

        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].exam_result["id"], json!("A"));
        assert_eq!(attempts[0].questions.len(), 1);
        assert_eq!(attempts[0].questions[0]["id"], json!("Q2"));
        assert_eq!(attempts[1].exam_result["id"], json!("B"));
        assert_eq!(attempts[1].questions[0]["id"], json!("Q1"));
    }

    #[tokio::test]
    async fn question_without_answers_gets_empty_array() {
        let exams = vec![row(&[("id", json!("r1"))])];
        let questions = vec![
            row(&[("id", json!("q1")), ("exam_result_id", json!("r1"))]),
            row(&[("id", json!("q2")), ("exam_result_id", json!("r1"))]),
        ];
        let answers = vec![row(&[
            ("id", json!("a1")),
            ("exam_result_question_id", json!("q1")),
        ])];
        let executor = Arc::new(ScriptedExecutor::new(vec![exams, questions, answers]));
        let attempts = repo(executor)
            .latest_attempts("s1", "t1", 1)
            .await
            .unwrap();

        let questions = &attempts[0].questions;
        assert_eq!(questions[0]["answers"].as_array().unwrap().len(), 1);
        assert_eq!(questions[1]["answers"], json!([]));
    }

    #[tokio::test]
    async fn nested_scenario_end_to_end() {
        let exams = vec![row(&[
            ("id", json!("r1")),
            ("user_id", json!("s1")),
            ("test_id", json!("t1")),
        ])];
        let questions = vec![row(&[
            ("id", json!("q1")),
            ("exam_result_id", json!("r1")),
        ])];
        let answers = vec![row(&[
            ("id", json!("a1")),
            ("exam_result_question_id", json!("q1")),
        ])];
        let executor = Arc::new(ScriptedExecutor::new(vec![exams, questions, answers]));
        let attempts = repo(executor.clone())
            .latest_attempts("s1", "t1", 2)
            .await
            .unwrap();

        assert_eq!(attempts.len(), 1);
        let attempt = &attempts[0];
        assert_eq!(attempt.exam_result["id"], json!("r1"));
        assert_eq!(attempt.questions.len(), 1);
        let question = &attempt.questions[0];
        assert_eq!(question["id"], json!("q1"));
        assert_eq!(question["exam_result_id"], json!("r1"));
        let answers = question["answers"].as_array().unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0]["id"], json!("a1"));
        assert_eq!(answers[0]["exam_result_question_id"], json!("q1"));

        // three sequential fetches with value-only parameters
        let calls = executor.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0].1,
            vec![
                QueryParam::Text("s1".into()),
                QueryParam::Text("t1".into()),
                QueryParam::Int(2),
            ]
        );
        assert_eq!(calls[1].1, vec![QueryParam::TextArray(vec!["r1".into()])]);
        assert_eq!(calls[2].1, vec![QueryParam::TextArray(vec!["q1".into()])]);
    }

    #[tokio::test]
    async fn answers_with_null_fk_are_dropped_silently() {
        let exams = vec![row(&[("id", json!("r1"))])];
        let questions = vec![row(&[
            ("id", json!("q1")),
            ("exam_result_id", json!("r1")),
        ])];
        let answers = vec![
            row(&[("id", json!("a1")), ("exam_result_question_id", json!("q1"))]),
            row(&[("id", json!("a2")), ("exam_result_question_id", json!(null))]),
            row(&[("id", json!("a3"))]),
        ];
        let executor = Arc::new(ScriptedExecutor::new(vec![exams, questions, answers]));
        let attempts = repo(executor)
            .latest_attempts("s1", "t1", 1)
            .await
            .unwrap();

        let got = attempts[0].questions[0]["answers"].as_array().unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0]["id"], json!("a1"));
    }
}
