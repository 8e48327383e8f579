//! Service configuration: TOML file + environment overrides.
//!
//! Every warehouse table and column name the repositories interpolate into
//! SQL lives here, in one schema mapping shared by all assemblers. The
//! defaults match the reference deployment, so an empty config file (or no
//! file at all) is a working configuration for a conventionally-named
//! warehouse. Identifier validation happens later, at repository
//! construction; this module only carries the strings.
//!
//! Environment always wins over the file: `DATABASE_URL`,
//! `WAREHOUSE_SCHEMA`, `WAREHOUSE_TABLE`, and `DATA_DIR` mirror the knobs
//! an operator actually rotates per environment.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub warehouse: WarehouseSection,
    pub exams: ExamSchema,
    pub courses: CourseSchema,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Allow permissive CORS (default: false = localhost only).
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_permissive: false,
        }
    }
}

/// Warehouse connection and ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseSection {
    /// Connection string; usually supplied via `DATABASE_URL`.
    pub database_url: Option<String>,
    /// Schema holding the exam/course tables.
    pub schema: String,
    pub max_connections: u32,
    /// Directory scanned for bulk-load files.
    pub data_dir: PathBuf,
    /// Fallback destination table for uploads that name none.
    pub default_table: Option<String>,
}

impl Default for WarehouseSection {
    fn default() -> Self {
        Self {
            database_url: None,
            schema: "public".to_string(),
            max_connections: 5,
            data_dir: PathBuf::from("data"),
            default_table: None,
        }
    }
}

impl WarehouseSection {
    /// Connection string, required at startup.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::missing("warehouse.database_url (or DATABASE_URL)"))
    }

    /// Create the bulk-load directory if needed and return its path.
    pub fn ensure_data_dir(&self) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(self.data_dir.clone())
    }
}

/// Table and column names for the exam-result hierarchy.
///
/// Both assemblers read from this one mapping: the attempt assembler uses
/// the full three-table chain, the question assembler the lower two.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamSchema {
    pub exam_result_table: String,
    pub question_result_table: String,
    pub answer_result_table: String,

    /// "Most recent first" ordering column on exam results.
    pub order_column: String,
    pub student_column: String,
    pub test_column: String,

    pub exam_result_id_column: String,
    pub question_result_id_column: String,
    /// FK on question results pointing at an exam result.
    pub question_result_fk_column: String,
    /// FK on answer results pointing at a question result.
    pub answer_result_fk_column: String,

    /// Test-id filter column on question results.
    pub test_id_column: String,
}

impl Default for ExamSchema {
    fn default() -> Self {
        Self {
            exam_result_table: "exam_result".to_string(),
            question_result_table: "exam_question_result".to_string(),
            answer_result_table: "exam_answer_result".to_string(),
            order_column: "created_at".to_string(),
            student_column: "user_id".to_string(),
            test_column: "test_id".to_string(),
            exam_result_id_column: "id".to_string(),
            question_result_id_column: "id".to_string(),
            question_result_fk_column: "exam_result_id".to_string(),
            answer_result_fk_column: "exam_result_question_id".to_string(),
            test_id_column: "test_id".to_string(),
        }
    }
}

/// Table and column names for the course lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseSchema {
    pub table: String,
    pub id_column: String,
    pub title_column: String,
    pub created_at_column: String,
    pub short_desc_column: String,
    pub desc_column: String,
    pub link_column: String,
}

impl Default for CourseSchema {
    fn default() -> Self {
        Self {
            table: "course".to_string(),
            id_column: "id".to_string(),
            title_column: "lesson_title".to_string(),
            created_at_column: "created_at".to_string(),
            short_desc_column: "short_description".to_string(),
            desc_column: "description".to_string(),
            link_column: "link".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist and parse. With `None`,
    /// `config.toml` in the working directory is used if present, defaults
    /// otherwise. Environment overrides are applied last either way.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let fallback = Path::new("config.toml");
                if fallback.exists() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    fn apply_env(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            self.warehouse.database_url = Some(url);
        }
        if let Ok(schema) = env::var("WAREHOUSE_SCHEMA") {
            self.warehouse.schema = schema;
        }
        if let Ok(table) = env::var("WAREHOUSE_TABLE") {
            self.warehouse.default_table = Some(table);
        }
        if let Ok(dir) = env::var("DATA_DIR") {
            self.warehouse.data_dir = PathBuf::from(dir);
        }
    }
}
