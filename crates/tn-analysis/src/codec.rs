//! Cell decoding between [`Value`]s and domain types.
//!
//! Every decoder takes a `context` string (usually `table.column`) that ends
//! up in [`AnalysisError::Corrupt`] so a bad cell can be located without
//! re-running anything.

use tn_core::{EdgeType, NodeId};
use tn_store::{Table, Value};

use crate::{AnalysisError, AnalysisResult};

fn corrupt(context: &str, reason: impl Into<String>) -> AnalysisError {
    AnalysisError::Corrupt { context: context.to_owned(), reason: reason.into() }
}

pub fn node(value: &Value, context: &str) -> AnalysisResult<NodeId> {
    let n = value
        .as_i64()
        .ok_or_else(|| corrupt(context, format!("expected a node id, found {}", value.kind())))?;
    Ok(NodeId::try_from(n)?)
}

pub fn float(value: &Value, context: &str) -> AnalysisResult<f32> {
    opt_float(value, context)?.ok_or_else(|| corrupt(context, "unexpected null"))
}

pub fn opt_float(value: &Value, context: &str) -> AnalysisResult<Option<f32>> {
    if value.is_null() {
        return Ok(None);
    }
    float64(value, context).map(|v| Some(v as f32))
}

/// Full-width numeric cell; nulls are rejected.
pub fn float64(value: &Value, context: &str) -> AnalysisResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| corrupt(context, format!("expected a number, found {}", value.kind())))
}

pub fn edge_type(value: &Value, context: &str) -> AnalysisResult<EdgeType> {
    let code = value
        .as_i64()
        .and_then(|c| i8::try_from(c).ok())
        .ok_or_else(|| corrupt(context, format!("expected a type code, found {value}")))?;
    Ok(EdgeType::from_code(code)?)
}

pub fn path(value: &Value, context: &str) -> AnalysisResult<Vec<NodeId>> {
    let list = value
        .as_int_list()
        .ok_or_else(|| corrupt(context, format!("expected a path, found {}", value.kind())))?;
    list.iter().map(|&n| Ok(NodeId::try_from(n)?)).collect()
}

pub fn path_value(path: &[NodeId]) -> Value {
    Value::IntList(path.iter().map(|&n| i64::from(n)).collect())
}

/// Column positions of `names` in `table`, in the order given.
pub fn indices<const N: usize>(table: &Table, names: [&str; N]) -> AnalysisResult<[usize; N]> {
    let mut out = [0usize; N];
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = table.column_index(name)?;
    }
    Ok(out)
}
