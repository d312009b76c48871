// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Data sinks - where a fragment sends its output

use crate::expr::Expr;
use crate::plan_fragment::DataPartition;
use crate::plan_node::JoinNode;
use fe_catalog::{FsTable, Table};
use fe_common::constants::{
    DEFAULT_NUM_PARTITIONS, PARQUET_SINK_MEM_PER_PARTITION, TEXT_SINK_MEM_PER_PARTITION,
};
use fe_common::{check_state, FeError, FileFormat, FragmentId, Id, JoinTableId, PlanNodeId, Result};
use std::fmt;

/// Materializes the build side of a join into a join table
#[derive(Debug, Clone, PartialEq)]
pub struct JoinBuildSink {
    pub join_table_id: JoinTableId,
    pub build_exprs: Vec<Expr>,
}

impl JoinBuildSink {
    pub fn new(join_table_id: JoinTableId, join: &JoinNode) -> Result<Self> {
        check_state!(
            join_table_id.is_valid(),
            "join build sink needs a valid join table id"
        );
        Ok(Self {
            join_table_id,
            build_exprs: join.build_exprs()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSinkOp {
    Insert,
    Update,
    Upsert,
    Delete,
}

impl fmt::Display for TableSinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableSinkOp::Insert => "INSERT INTO",
            TableSinkOp::Update => "UPDATE",
            TableSinkOp::Upsert => "UPSERT INTO",
            TableSinkOp::Delete => "DELETE FROM",
        };
        write!(f, "{}", name)
    }
}

/// Writes the fragment output into partition directories of a table
#[derive(Debug, Clone, PartialEq)]
pub struct TableSink {
    pub table_name: String,
    pub op: TableSinkOp,
    pub majority_format: FileFormat,
    pub partition_key_exprs: Vec<Expr>,
    pub overwrite: bool,

    /// Input is ordered by partition key, so partitions are written one at a time
    pub input_is_clustered: bool,

    /// Distinct partitions written (-1 = unknown)
    pub num_partitions: i64,
}

impl TableSink {
    /// File-system tables only support inserts
    pub fn create(
        table: &FsTable,
        op: TableSinkOp,
        partition_key_exprs: Vec<Expr>,
        overwrite: bool,
        input_is_clustered: bool,
    ) -> Result<Self> {
        if op != TableSinkOp::Insert {
            return Err(FeError::NotSupported(format!(
                "{} on file-system table {}",
                op,
                table.full_name()
            )));
        }
        Ok(Self {
            table_name: table.full_name(),
            op,
            majority_format: table.majority_format(),
            partition_key_exprs,
            overwrite,
            input_is_clustered,
            num_partitions: -1,
        })
    }

    pub fn with_num_partitions(mut self, num_partitions: i64) -> Self {
        self.num_partitions = num_partitions;
        self
    }

    fn per_partition_mem_req(&self) -> Result<i64> {
        match self.majority_format {
            FileFormat::Parquet => Ok(PARQUET_SINK_MEM_PER_PARTITION),
            FileFormat::Text => Ok(TEXT_SINK_MEM_PER_PARTITION),
            other => Err(FeError::NotSupported(format!(
                "table sink format {}",
                other
            ))),
        }
    }

    fn compute_mem_cost(&self, input: &SinkInput) -> Result<i64> {
        let num_partitions = if self.num_partitions == -1 {
            DEFAULT_NUM_PARTITIONS
        } else {
            self.num_partitions
        };
        let partitions_mem = num_partitions.saturating_mul(self.per_partition_mem_req()?);
        if input.cardinality == -1 || input.avg_row_size < 0.0 {
            return Ok(partitions_mem);
        }
        let per_host_cardinality = (input.cardinality / i64::from(input.num_nodes.max(1))).max(1);
        let per_host_input_bytes = (per_host_cardinality as f64 * input.avg_row_size).ceil() as i64;
        Ok(per_host_input_bytes.min(partitions_mem))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkKind {
    /// Returns the query result to the client
    PlanRoot,
    DataStream {
        exchange: PlanNodeId,
        output_partition: DataPartition,
    },
    JoinBuild(JoinBuildSink),
    Table(TableSink),
}

/// Properties of a fragment's root node that sink costs depend on
#[derive(Debug, Clone, Copy)]
pub struct SinkInput {
    pub cardinality: i64,
    pub avg_row_size: f64,
    pub num_nodes: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSink {
    /// Owning fragment
    pub fragment: FragmentId,

    /// -1 until computed
    pub per_host_mem_cost: i64,

    pub kind: SinkKind,
}

impl DataSink {
    pub fn new(fragment: FragmentId, kind: SinkKind) -> Self {
        Self {
            fragment,
            per_host_mem_cost: -1,
            kind,
        }
    }

    pub fn join_table_id(&self) -> Option<JoinTableId> {
        match &self.kind {
            SinkKind::JoinBuild(sink) => Some(sink.join_table_id),
            _ => None,
        }
    }

    pub fn compute_costs(&mut self, input: &SinkInput) -> Result<()> {
        self.per_host_mem_cost = match &self.kind {
            SinkKind::Table(sink) => sink.compute_mem_cost(input)?,
            SinkKind::PlanRoot | SinkKind::DataStream { .. } | SinkKind::JoinBuild(_) => 0,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fe_catalog::{Column, PartitionValue};
    use fe_common::DataType;

    fn target_table(format: FileFormat) -> FsTable {
        let mut table = FsTable::new(
            "db",
            "target",
            vec![
                Column::new("day", DataType::Int, 0),
                Column::new("v", DataType::String, 1),
            ],
            1,
            "/warehouse/target",
        )
        .unwrap();
        table
            .create_partition(vec![PartitionValue::Integer(1)], "/warehouse/target/day=1", format, Vec::new())
            .unwrap();
        table
    }

    fn table_sink(format: FileFormat) -> DataSink {
        let sink = TableSink::create(
            &target_table(format),
            TableSinkOp::Insert,
            vec![Expr::column("day")],
            false,
            false,
        )
        .unwrap();
        DataSink::new(FragmentId::new(0), SinkKind::Table(sink))
    }

    const UNKNOWN_INPUT: SinkInput = SinkInput {
        cardinality: -1,
        avg_row_size: -1.0,
        num_nodes: 3,
    };

    #[test]
    fn test_parquet_sink_cost_defaults_to_ten_partitions() {
        let mut sink = table_sink(FileFormat::Parquet);
        sink.compute_costs(&UNKNOWN_INPUT).unwrap();
        assert_eq!(sink.per_host_mem_cost, 10 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_sink_cost_bounded_by_input() {
        let mut sink = table_sink(FileFormat::Text);
        sink.compute_costs(&SinkInput {
            cardinality: 300,
            avg_row_size: 10.0,
            num_nodes: 3,
        })
        .unwrap();
        assert_eq!(sink.per_host_mem_cost, 1000);
    }

    #[test]
    fn test_unsupported_sink_format() {
        let mut sink = table_sink(FileFormat::Avro);
        assert!(matches!(
            sink.compute_costs(&UNKNOWN_INPUT),
            Err(FeError::NotSupported(_))
        ));
    }

    #[test]
    fn test_only_inserts_into_fs_tables() {
        let result = TableSink::create(
            &target_table(FileFormat::Text),
            TableSinkOp::Upsert,
            Vec::new(),
            false,
            false,
        );
        assert!(matches!(result, Err(FeError::NotSupported(_))));
    }

    #[test]
    fn test_other_sinks_cost_nothing() {
        let mut sink = DataSink::new(FragmentId::new(1), SinkKind::PlanRoot);
        assert_eq!(sink.per_host_mem_cost, -1);
        sink.compute_costs(&UNKNOWN_INPUT).unwrap();
        assert_eq!(sink.per_host_mem_cost, 0);
    }
}
