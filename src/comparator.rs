//! Table comparison pipeline
//!
//! A run fetches both schemas, reconciles them, counts rows, asks the warehouse whether
//! any asymmetric row exists and, only if one does, samples and exports the divergent
//! rows. All I/O goes through the injected warehouse and sink.

use crate::config::ComparisonConfig;
use crate::error::Result;
use crate::progress::ProgressReporter;
use crate::query::{
    build_difference_check_query, build_except_distinct_query, build_row_count_query,
    build_union_query, query_fingerprint, resolve_projection, ExceptOptions, QueryPlan,
};
use crate::report::{
    ComparisonReport, ComparisonStatus, DifferenceReport, ExportSummary, RowCountComparison,
};
use crate::schema::{SchemaComparison, TableSchema};
use crate::sink::DifferenceSink;
use crate::table_ref::{provenance_labels, TableRef};
use crate::warehouse::{scalar_bool, scalar_u64, RowMap, SchemaCatalog};
use chrono::Utc;
use uuid::Uuid;

/// Drives comparisons against one warehouse
pub struct TableComparator<'w, W: SchemaCatalog + ?Sized> {
    warehouse: &'w W,
    progress: ProgressReporter,
}

impl<'w, W: SchemaCatalog + ?Sized> TableComparator<'w, W> {
    pub fn new(warehouse: &'w W) -> Self {
        Self {
            warehouse,
            progress: ProgressReporter::new_minimal(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Ordered column name/type pairs of one table
    pub fn get_table_schema(&self, table: &TableRef) -> Result<TableSchema> {
        self.warehouse
            .table_schema(table)
            .map_err(|e| e.in_step(format!("fetch schema for {}", table)))
    }

    /// Row count of one table under the optional filter
    pub fn get_row_count(&self, table: &TableRef, where_clause: Option<&str>) -> Result<u64> {
        let step = || format!("row count for {}", table);
        let query = build_row_count_query(table, where_clause);
        let result = self
            .warehouse
            .execute(&query)
            .map_err(|e| e.in_step(step()))?;
        scalar_u64(&result, "count").map_err(|e| e.in_step(step()))
    }

    /// Count both tables with the same filter
    pub fn compare_row_counts(
        &self,
        table1: &TableRef,
        table2: &TableRef,
        where_clause: Option<&str>,
    ) -> Result<RowCountComparison> {
        let count1 = self.get_row_count(table1, where_clause)?;
        let count2 = self.get_row_count(table2, where_clause)?;
        Ok(RowCountComparison::new(count1, count2))
    }

    /// Whether any row exists on only one side, answered by a single existence query
    pub fn check_data_differences(
        &self,
        table1: &TableRef,
        table2: &TableRef,
        columns: &str,
        where_clause: Option<&str>,
    ) -> Result<bool> {
        let step = || format!("difference check between {} and {}", table1, table2);
        let query = build_difference_check_query(table1, table2, columns, where_clause);
        let result = self
            .warehouse
            .execute(&query)
            .map_err(|e| e.in_step(step()))?;
        scalar_bool(&result, "has_differences").map_err(|e| e.in_step(step()))
    }

    /// Up to `limit` rows exclusive to each side
    pub fn get_sample_differences(
        &self,
        table1: &TableRef,
        table2: &TableRef,
        columns: &str,
        where_clause: Option<&str>,
        order_by_clause: Option<&str>,
        limit: usize,
    ) -> Result<(Vec<RowMap>, Vec<RowMap>)> {
        let options = ExceptOptions {
            order_by_clause,
            limit: Some(limit),
            source_label: None,
        };

        let only_in_1 = self.sample_direction(table1, table2, columns, where_clause, options)?;
        let only_in_2 = self.sample_direction(table2, table1, columns, where_clause, options)?;

        Ok((only_in_1, only_in_2))
    }

    fn sample_direction(
        &self,
        from: &TableRef,
        subtracted: &TableRef,
        columns: &str,
        where_clause: Option<&str>,
        options: ExceptOptions<'_>,
    ) -> Result<Vec<RowMap>> {
        let query = build_except_distinct_query(from, subtracted, columns, where_clause, options);
        let result = self.warehouse.execute(&query).map_err(|e| {
            e.in_step(format!("sample rows in {} but not in {}", from, subtracted))
        })?;
        Ok(result.into_maps())
    }

    /// Export every divergent row from both directions, tagged with `source_table`
    pub fn export_all_differences(
        &self,
        table1: &TableRef,
        table2: &TableRef,
        columns: &str,
        where_clause: Option<&str>,
        order_by_clause: Option<&str>,
        sink: &mut dyn DifferenceSink,
    ) -> Result<ExportSummary> {
        let (label1, label2) = provenance_labels(table1, table2);

        let only_in_1 = build_except_distinct_query(
            table1,
            table2,
            columns,
            where_clause,
            ExceptOptions {
                source_label: Some(&label1),
                ..Default::default()
            },
        );
        let only_in_2 = build_except_distinct_query(
            table2,
            table1,
            columns,
            where_clause,
            ExceptOptions {
                source_label: Some(&label2),
                ..Default::default()
            },
        );
        let combined = build_union_query(&[only_in_1, only_in_2], order_by_clause)?;

        let result = self
            .warehouse
            .execute(&combined)
            .map_err(|e| e.in_step("export all differences"))?;

        let destination = sink.destination();
        let columns = result.columns.clone();
        let rows = result.into_maps();

        if rows.is_empty() {
            log::warn!("Export query returned no rows; nothing written to {}", destination);
        } else {
            sink.write_rows(&columns, &rows)
                .map_err(|e| e.in_step(format!("write differences to {}", destination)))?;
        }

        Ok(ExportSummary {
            destination,
            rows: rows.len(),
        })
    }

    /// Fetch and reconcile both schemas
    pub fn analyze_schemas(
        &self,
        config: &ComparisonConfig,
    ) -> Result<(TableSchema, TableSchema, SchemaComparison)> {
        let schema1 = self.get_table_schema(config.table1())?;
        let schema2 = self.get_table_schema(config.table2())?;

        log::info!("Table 1 ({}): {} columns", config.table1(), schema1.len());
        log::info!("Table 2 ({}): {} columns", config.table2(), schema2.len());

        let requested = config.specific_columns().map(|s| s.names());
        let comparison = SchemaComparison::analyze(&schema1, &schema2, requested);

        for col in &comparison.missing_specified_cols {
            log::warn!("Requested column '{}' is not present in both tables", col);
        }
        for mismatch in &comparison.schema_mismatches {
            log::warn!(
                "Type mismatch for '{}': {} vs {}",
                mismatch.column,
                mismatch.table1_type,
                mismatch.table2_type
            );
        }

        Ok((schema1, schema2, comparison))
    }

    /// Data queries a run would issue, or `None` when no column can be compared
    pub fn plan(
        &self,
        config: &ComparisonConfig,
    ) -> Result<(SchemaComparison, Option<QueryPlan>)> {
        let (_, _, schema) = self.analyze_schemas(config)?;
        if schema.has_no_common_columns() {
            return Ok((schema, None));
        }

        let projection = projection_for(config, &schema);
        let (label1, label2) = provenance_labels(config.table1(), config.table2());
        let plan = QueryPlan::build(
            config.table1(),
            config.table2(),
            &projection,
            config.where_clause(),
            config.order_by_clause(),
            config.sample_limit(),
            (&label1, &label2),
        )?;

        Ok((schema, Some(plan)))
    }

    /// Run the full pipeline.
    ///
    /// The verdict comes from the existence check alone. Row counts are reported but
    /// never decide the outcome, and schema-only differences are warnings.
    pub fn run(
        &mut self,
        config: &ComparisonConfig,
        sink: Option<&mut dyn DifferenceSink>,
    ) -> Result<ComparisonReport> {
        let table1 = config.table1();
        let table2 = config.table2();
        let where_clause = config.where_clause();
        let order_by_clause = config.order_by_clause();

        self.progress.start_step("Analyzing table schemas...");
        let (schema1, schema2, schema) = self.analyze_schemas(config)?;
        self.progress.finish_step(&format!(
            "Schemas: {} / {} columns, {} in common",
            schema1.len(),
            schema2.len(),
            schema.common_columns.len()
        ));

        let mut report = ComparisonReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            table1: table1.qualified(),
            table2: table2.qualified(),
            where_clause: where_clause.map(str::to_string),
            order_by_clause: order_by_clause.map(str::to_string),
            table1_column_count: schema1.len(),
            table2_column_count: schema2.len(),
            schema,
            status: ComparisonStatus::NoCommonColumns,
            projection: None,
            row_counts: None,
            differences: None,
            plan_fingerprint: None,
        };

        if report.schema.has_no_common_columns() {
            log::warn!("No common columns found between {} and {}", table1, table2);
            return Ok(report);
        }

        let projection = projection_for(config, &report.schema);
        log::info!("Comparing on columns: {}", projection);

        self.progress.start_step("Comparing row counts...");
        let row_counts = self.compare_row_counts(table1, table2, where_clause)?;
        self.progress.finish_step(&format!(
            "Row counts: {} vs {} (difference {})",
            row_counts.table1, row_counts.table2, row_counts.difference
        ));
        report.row_counts = Some(row_counts);

        self.progress.start_step("Checking for data differences...");
        report.plan_fingerprint = Some(query_fingerprint(&build_difference_check_query(
            table1,
            table2,
            &projection,
            where_clause,
        )));
        let has_differences =
            self.check_data_differences(table1, table2, &projection, where_clause)?;
        self.progress.finish_step(if has_differences {
            "Differences found"
        } else {
            "No differences"
        });

        if !has_differences {
            log::info!("Tables are identical for compared columns");
            report.status = ComparisonStatus::Pass;
            report.projection = Some(projection);
            return Ok(report);
        }

        report.status = ComparisonStatus::Fail;

        self.progress.start_step("Sampling differences...");
        let (only_in_table1, only_in_table2) = self.get_sample_differences(
            table1,
            table2,
            &projection,
            where_clause,
            order_by_clause,
            config.sample_limit(),
        )?;
        self.progress.finish_step(&format!(
            "Sampled {} + {} rows",
            only_in_table1.len(),
            only_in_table2.len()
        ));

        let export = match sink {
            Some(sink) => {
                self.progress.start_step("Exporting all differences...");
                let summary = self.export_all_differences(
                    table1,
                    table2,
                    &projection,
                    where_clause,
                    order_by_clause,
                    sink,
                )?;
                self.progress.finish_step(&format!(
                    "Exported {} rows to {}",
                    summary.rows, summary.destination
                ));
                Some(summary)
            }
            None => None,
        };

        report.differences = Some(DifferenceReport {
            sample_limit: config.sample_limit(),
            only_in_table1,
            only_in_table2,
            export,
        });
        report.projection = Some(projection);

        Ok(report)
    }
}

fn projection_for(config: &ComparisonConfig, schema: &SchemaComparison) -> String {
    resolve_projection(
        config.specific_columns().map(|s| s.raw()),
        Some(&schema.common_columns),
    )
}
