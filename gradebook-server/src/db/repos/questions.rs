//! Question repository: a test's question results paired with their
//! answer results.
//!
//! Same assembly as the attempt repository at one fewer join level: one
//! filtered fetch, one batched child fetch, one grouping pass.

use std::sync::Arc;

use serde::Serialize;

use gradebook_core::{
    column_keys, group_by_fk, scalar_key, ConfigError, ExamSchema, Row, SafeIdentifier,
    WarehouseSection,
};

use super::note_keyless_rows;
use crate::db::executor::{QueryExecutor, QueryParam, StoreError, TableRef};

/// One question with its matched answers. Transient response artifact.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionTree {
    pub question: Row,
    pub answers: Vec<Row>,
}

/// Assembles the question-result → answer-result pair for a test.
pub struct QuestionRepo {
    executor: Arc<dyn QueryExecutor>,
    questions: TableRef,
    answers: TableRef,
    test_col: SafeIdentifier,
    question_id_col: SafeIdentifier,
    answer_fk_col: SafeIdentifier,
}

impl QuestionRepo {
    /// Validate the configured schema mapping and build the repository.
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        warehouse: &WarehouseSection,
        schema: &ExamSchema,
    ) -> Result<Self, ConfigError> {
        let dataset = SafeIdentifier::new(&warehouse.schema, "warehouse schema")?;
        Ok(Self {
            executor,
            questions: TableRef::new(
                &dataset,
                &SafeIdentifier::new(&schema.question_result_table, "question result table")?,
            ),
            answers: TableRef::new(
                &dataset,
                &SafeIdentifier::new(&schema.answer_result_table, "answer result table")?,
            ),
            test_col: SafeIdentifier::new(&schema.test_id_column, "test id column")?,
            question_id_col: SafeIdentifier::new(
                &schema.question_result_id_column,
                "question result id column",
            )?,
            answer_fk_col: SafeIdentifier::new(
                &schema.answer_result_fk_column,
                "answer result FK column",
            )?,
        })
    }

    /// Return every question for a test with its answers, in fetch order.
    pub async fn questions_with_answers(
        &self,
        test_id: &str,
    ) -> Result<Vec<QuestionTree>, StoreError> {
        let questions = self.fetch_questions(test_id).await?;
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let question_ids = column_keys(&questions, self.question_id_col.as_str());
        let answers = if question_ids.is_empty() {
            Vec::new()
        } else {
            self.fetch_answers(question_ids).await?
        };

        note_keyless_rows(&answers, &self.answer_fk_col, "answer rows");
        let answers_by_question = group_by_fk(answers, |row| {
            row.get(self.answer_fk_col.as_str()).and_then(scalar_key)
        });

        let trees = questions
            .into_iter()
            .map(|question| {
                let answers = question
                    .get(self.question_id_col.as_str())
                    .and_then(scalar_key)
                    .and_then(|id| answers_by_question.get(&id).cloned())
                    .unwrap_or_default();
                QuestionTree { question, answers }
            })
            .collect();
        Ok(trees)
    }

    async fn fetch_questions(&self, test_id: &str) -> Result<Vec<Row>, StoreError> {
        let sql = format!(
            "SELECT * FROM {table} WHERE {test} = $1",
            table = self.questions,
            test = self.test_col,
        );
        self.executor
            .run_query(&sql, vec![QueryParam::Text(test_id.to_owned())])
            .await
    }

    async fn fetch_answers(&self, question_ids: Vec<String>) -> Result<Vec<Row>, StoreError> {
        let sql = format!(
            "SELECT * FROM {table} WHERE {fk} = ANY($1)",
            table = self.answers,
            fk = self.answer_fk_col,
        );
        self.executor
            .run_query(&sql, vec![QueryParam::TextArray(question_ids)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::executor::testing::ScriptedExecutor;
    use serde_json::{json, Value};

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn repo(executor: Arc<ScriptedExecutor>) -> QuestionRepo {
        QuestionRepo::new(
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
            answer_result_fk_column: "question id".to_string(),
            ..ExamSchema::default()
        };
        let err = QuestionRepo::new(executor, &WarehouseSection::default(), &schema)
            .err()
            .expect("construction should fail");
        assert!(matches!(err, ConfigError::InvalidIdentifier { .. }));
    }

    #[tokio::test]
    async fn unknown_test_returns_empty_without_answer_fetch() {
        let executor = Arc::new(ScriptedExecutor::new(vec![vec![]]));
        let trees = repo(executor.clone())
            .questions_with_answers("t-missing")
            .await
            .unwrap();

        assert!(trees.is_empty());
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn pairs_answers_in_question_fetch_order() {
        let questions = vec![
            row(&[("id", json!("q1")), ("test_id", json!("t1"))]),
            row(&[("id", json!("q2")), ("test_id", json!("t1"))]),
        ];
        let answers = vec![
            row(&[("id", json!("a1")), ("exam_result_question_id", json!("q2"))]),
            row(&[("id", json!("a2")), ("exam_result_question_id", json!("q1"))]),
            row(&[("id", json!("a3")), ("exam_result_question_id", json!("q1"))]),
        ];
        let executor = Arc::new(ScriptedExecutor::new(vec![questions, answers]));
        let trees = repo(executor.clone())
            .questions_with_answers("t1")
            .await
            .unwrap();

        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].question["id"], json!("q1"));
        let q1_answers: Vec<_> = trees[0].answers.iter().map(|a| &a["id"]).collect();
        assert_eq!(q1_answers, vec![&json!("a2"), &json!("a3")]);
        assert_eq!(trees[1].question["id"], json!("q2"));
        assert_eq!(trees[1].answers[0]["id"], json!("a1"));

        let calls = executor.calls();
        assert_eq!(
            calls[1].1,
            vec![QueryParam::TextArray(vec!["q1".into(), "q2".into()])]
        );
    }

    #[tokio::test]
    async fn question_without_answers_gets_empty_vec() {
        let questions = vec![row(&[("id", json!("q1")), ("test_id", json!("t1"))])];
        let executor = Arc::new(ScriptedExecutor::new(vec![questions, vec![]]));
        let trees = repo(executor)
            .questions_with_answers("t1")
            .await
            .unwrap();

        assert_eq!(trees.len(), 1);
        assert!(trees[0].answers.is_empty());
    }
}
