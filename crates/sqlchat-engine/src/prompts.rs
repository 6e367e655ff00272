//! Prompt templates for the two model calls
//!
//! Both templates are compiled into a single minijinja environment once at
//! startup. Values are inserted verbatim; no escaping is applied.

use crate::error::PipelineError;
use minijinja::{context, Environment};

const SQL_GENERATION: &str = "sql_generation";
const ANSWER_SYNTHESIS: &str = "answer_synthesis";

/// Prompt asking for one single-line SQL statement
pub const SQL_GENERATION_TEMPLATE: &str = "\
Based on the table schema below, Write a sql query that will answer the user's question:
Remember : only provide me the sql query dont add anything else. provide me sql query in a single line dont add line breaks
Table Schema : {{ schema }}
Question : {{ question }}
sql query:
";

/// Prompt asking for a plain-English answer from the executed query
pub const ANSWER_SYNTHESIS_TEMPLATE: &str = "\
A user asked a question, and an SQL query was generated and executed.
Now, provide a clean, natural language answer based on the query and its result.

Original Question: {{ question }}
SQL Query: {{ query }}
SQL Result: {{ result }}

Final Answer (in plain English):
";

/// Compiled prompt templates
pub struct PromptTemplates {
    env: Environment<'static>,
}

impl PromptTemplates {
    /// Compile the built-in templates
    pub fn new() -> Result<Self, PipelineError> {
        Self::with_templates(SQL_GENERATION_TEMPLATE, ANSWER_SYNTHESIS_TEMPLATE)
    }

    /// Compile custom templates
    ///
    /// The generation template receives `schema` and `question`; the
    /// synthesis template receives `question`, `query` and `result`.
    pub fn with_templates(
        sql_generation: &'static str,
        answer_synthesis: &'static str,
    ) -> Result<Self, PipelineError> {
        let mut env = Environment::new();
        env.add_template(SQL_GENERATION, sql_generation)?;
        env.add_template(ANSWER_SYNTHESIS, answer_synthesis)?;
        Ok(Self { env })
    }

    /// Render the SQL generation prompt
    pub fn sql_generation(&self, schema: &str, question: &str) -> Result<String, PipelineError> {
        let template = self.env.get_template(SQL_GENERATION)?;
        Ok(template.render(context! { schema, question })?)
    }

    /// Render the answer synthesis prompt
    pub fn answer_synthesis(&self, question: &str, query: &str, result: &str) -> Result<String, PipelineError> {
        let template = self.env.get_template(ANSWER_SYNTHESIS)?;
        Ok(template.render(context! { question, query, result })?)
    }
}
