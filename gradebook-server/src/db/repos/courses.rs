//! Course repository: single-row lookup by primary key.
//!
//! No assembly here; the repository exists because it shares the
//! identifier validation and table-reference conventions with the
//! assemblers. Output columns are aliased to stable names so response
//! keys do not drift with the warehouse schema.

use std::sync::Arc;

use gradebook_core::{ConfigError, CourseSchema, Row, SafeIdentifier, WarehouseSection};

use crate::db::executor::{QueryExecutor, QueryParam, StoreError, TableRef};

pub struct CourseRepo {
    executor: Arc<dyn QueryExecutor>,
    courses: TableRef,
    id_col: SafeIdentifier,
    title_col: SafeIdentifier,
    created_at_col: SafeIdentifier,
    short_desc_col: SafeIdentifier,
    desc_col: SafeIdentifier,
    link_col: SafeIdentifier,
}

impl CourseRepo {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        warehouse: &WarehouseSection,
        schema: &CourseSchema,
    ) -> Result<Self, ConfigError> {
        let dataset = SafeIdentifier::new(&warehouse.schema, "warehouse schema")?;
        Ok(Self {
            executor,
            courses: TableRef::new(
                &dataset,
                &SafeIdentifier::new(&schema.table, "course table")?,
            ),
            id_col: SafeIdentifier::new(&schema.id_column, "course id column")?,
            title_col: SafeIdentifier::new(&schema.title_column, "course title column")?,
            created_at_col: SafeIdentifier::new(
                &schema.created_at_column,
                "course created column",
            )?,
            short_desc_col: SafeIdentifier::new(
                &schema.short_desc_column,
                "course short description column",
            )?,
            desc_col: SafeIdentifier::new(&schema.desc_column, "course description column")?,
            link_col: SafeIdentifier::new(&schema.link_column, "course link column")?,
        })
    }

    /// Fetch one course by id, or `None` when absent. Whether absence is
    /// a 404 is the caller's decision.
    pub async fn course(&self, course_id: &str) -> Result<Option<Row>, StoreError> {
        let sql = format!(
            "SELECT {id} AS id, {title} AS lesson_title, {created} AS created_at, \
             {short} AS short_description, {desc} AS description, {link} AS link \
             FROM {table} WHERE {id} = $1 LIMIT 1",
            id = self.id_col,
            title = self.title_col,
            created = self.created_at_col,
            short = self.short_desc_col,
            desc = self.desc_col,
            link = self.link_col,
            table = self.courses,
        );
        let rows = self
            .executor
            .run_query(&sql, vec![QueryParam::Text(course_id.to_owned())])
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::executor::testing::ScriptedExecutor;
    use serde_json::json;

    fn repo(executor: Arc<ScriptedExecutor>) -> CourseRepo {
        CourseRepo::new(
            executor,
            &WarehouseSection::default(),
            &CourseSchema::default(),
        )
        .unwrap()
    }

    #[test]
    fn invalid_identifier_fails_at_construction() {
        let executor = Arc::new(ScriptedExecutor::new(vec![]));
        let schema = CourseSchema {
            link_column: "link`".to_string(),
            ..CourseSchema::default()
        };
        let err = CourseRepo::new(executor, &WarehouseSection::default(), &schema)
            .err()
            .expect("construction should fail");
        assert!(matches!(err, ConfigError::InvalidIdentifier { .. }));
    }

    #[tokio::test]
    async fn absent_course_is_none() {
        let executor = Arc::new(ScriptedExecutor::new(vec![vec![]]));
        let course = repo(executor.clone()).course("c-missing").await.unwrap();

        assert!(course.is_none());
        assert_eq!(executor.call_count(), 1);
        assert_eq!(
            executor.calls()[0].1,
            vec![QueryParam::Text("c-missing".into())]
        );
    }

    #[tokio::test]
    async fn present_course_returns_aliased_row() {
        let mut row = Row::new();
        row.insert("id".into(), json!("c1"));
        row.insert("lesson_title".into(), json!("Intro to Warehousing"));
        let executor = Arc::new(ScriptedExecutor::new(vec![vec![row]]));
        let course = repo(executor.clone()).course("c1").await.unwrap().unwrap();

        assert_eq!(course["id"], json!("c1"));
        assert_eq!(course["lesson_title"], json!("Intro to Warehousing"));
        // aliases are rendered into the generated SQL
        let (sql, _) = &executor.calls()[0];
        assert!(sql.contains("AS lesson_title"));
        assert!(sql.contains("LIMIT 1"));
    }
}
