//! Schema context for the one managed table.
//!
//! A textual snapshot of table structure and sample content, assembled by the
//! store and embedded into generative-model prompts. Pure data plus string
//! formatting; the store owns the queries that populate it.

use serde::{Deserialize, Serialize};

/// One column of the managed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// Snapshot of the managed table: structure, constrained values, row count
/// and a few sample rows. Re-queried on every describe call, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaContext {
    pub table: String,
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub plant_types: Vec<String>,
    pub quantities: Vec<String>,
    pub sources: Vec<String>,
    pub sample_rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl SchemaContext {
    /// Render the context as a text block for inclusion in a model prompt.
    pub fn to_prompt_block(&self) -> String {
        let mut block = String::new();

        block.push_str("DATABASE CONTEXT:\n");
        block.push_str(&format!("Table: {}\n", self.table));
        block.push_str(&format!("Total Records: {}\n\n", self.row_count));

        block.push_str("SCHEMA:\n");
        for col in &self.columns {
            let nullability = if col.is_nullable { "NULL" } else { "NOT NULL" };
            block.push_str(&format!("- {} ({}): {}\n", col.name, col.data_type, nullability));
        }

        block.push_str("\nCONSTRAINTS:\n");
        block.push_str(&format!("- plant_type must be one of: {:?}\n", self.plant_types));
        block.push_str(&format!("- quantity must be one of: {:?}\n", self.quantities));
        block.push_str(&format!("- seed_source options include: {:?}\n", self.sources));

        if !self.sample_rows.is_empty() {
            block.push_str("\nSAMPLE DATA:\n");
            for row in self.sample_rows.iter().take(3) {
                block.push_str(&serde_json::Value::Object(row.clone()).to_string());
                block.push('\n');
            }
        }

        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> SchemaContext {
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), serde_json::json!(1));
        row.insert("seed_name".to_string(), serde_json::json!("Cherokee Purple Tomato"));

        SchemaContext {
            table: "seed_packs".to_string(),
            row_count: 12,
            columns: vec![
                ColumnInfo {
                    name: "id".to_string(),
                    data_type: "BIGINT".to_string(),
                    is_nullable: false,
                },
                ColumnInfo {
                    name: "seed_name".to_string(),
                    data_type: "VARCHAR".to_string(),
                    is_nullable: false,
                },
            ],
            plant_types: vec!["Vegetable".to_string(), "Herb".to_string()],
            quantities: vec!["Few".to_string(), "Lots".to_string()],
            sources: vec!["Oak Lawn Library".to_string()],
            sample_rows: vec![row],
        }
    }

    #[test]
    fn prompt_block_lists_schema_and_constraints() {
        let block = sample_context().to_prompt_block();

        assert!(block.contains("Table: seed_packs"));
        assert!(block.contains("Total Records: 12"));
        assert!(block.contains("- seed_name (VARCHAR): NOT NULL"));
        assert!(block.contains("plant_type must be one of"));
        assert!(block.contains("Cherokee Purple Tomato"));
    }

    #[test]
    fn prompt_block_omits_sample_section_when_empty() {
        let mut ctx = sample_context();
        ctx.sample_rows.clear();

        assert!(!ctx.to_prompt_block().contains("SAMPLE DATA"));
    }
}
