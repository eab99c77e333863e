//! Endpoint answers checked against the local computation
//!
//! The local rows are always the reference. An endpoint answer is used only
//! when it parses and agrees with them within the tolerance; otherwise the
//! local value comes back together with the reason it was kept. A call that
//! never produced an answer is `Local`; an answer that was checked and thrown
//! away is `Rejected`.

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};
use towerlens_core::{MonthTally, Percentage, ReportRow, ReportTable};
use towerlens_rollup::{activity_count_totals, pivot_totals};

use crate::prompt::{activity_totals_prompt, monthly_totals_prompt, structure_prompt};
use crate::{extract_json, CompletionEndpoint};

const NO_JSON: &str = "no JSON in endpoint response";

/// Where an enriched value came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// The endpoint answer, verified
    Endpoint,
    /// The local computation; the endpoint was off or the call failed
    Local(String),
    /// The local computation; the endpoint answer failed verification
    Rejected(String),
}

/// A value plus its provenance
#[derive(Clone, Debug, PartialEq)]
pub struct Enriched<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Enriched<T> {
    fn local(value: T, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug!(%reason, "using local computation");
        Self {
            value,
            source: Source::Local(reason),
        }
    }

    fn rejected(value: T, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(%reason, "endpoint answer rejected");
        Self {
            value,
            source: Source::Rejected(reason),
        }
    }

    fn endpoint(value: T) -> Self {
        Self {
            value,
            source: Source::Endpoint,
        }
    }

    pub fn is_endpoint(&self) -> bool {
        self.source == Source::Endpoint
    }
}

pub struct PostProcessor<'a> {
    endpoint: Option<&'a dyn CompletionEndpoint>,
    /// Largest accepted difference in percentage points
    tolerance: Decimal,
}

impl<'a> PostProcessor<'a> {
    pub fn new(endpoint: &'a dyn CompletionEndpoint) -> Self {
        Self {
            endpoint: Some(endpoint),
            tolerance: Decimal::ONE,
        }
    }

    /// Never calls out; every result is local
    pub fn disabled() -> Self {
        Self {
            endpoint: None,
            tolerance: Decimal::ONE,
        }
    }

    pub fn with_tolerance(mut self, points: Decimal) -> Self {
        self.tolerance = points;
        self
    }

    fn ask(&self, prompt: &str) -> Result<String, String> {
        let endpoint = self.endpoint.ok_or("endpoint disabled")?;
        endpoint
            .complete(prompt)
            .map_err(|e| format!("endpoint error: {e}"))
    }

    /// Structure rows restated by the endpoint, verified tower by tower
    pub fn structure_rows(&self, rows: &[ReportRow]) -> Enriched<Vec<ReportRow>> {
        let local = rows.to_vec();
        let text = match self.ask(&structure_prompt(rows)) {
            Ok(text) => text,
            Err(reason) => return Enriched::local(local, reason),
        };
        let Some(answer) = extract_json(&text) else {
            return Enriched::rejected(local, NO_JSON);
        };
        let Some(remote) = parse_rows(answer) else {
            return Enriched::rejected(local, "endpoint JSON is not a list of report rows");
        };
        match self.verify_rows(rows, &remote) {
            Ok(verified) => {
                info!(rows = verified.len(), "endpoint rows verified");
                Enriched::endpoint(verified)
            }
            Err(reason) => Enriched::rejected(local, reason),
        }
    }

    fn verify_rows(&self, local: &[ReportRow], remote: &[ReportRow]) -> Result<Vec<ReportRow>, String> {
        let same = |a: &str, b: &str| a.trim().eq_ignore_ascii_case(b.trim());
        local
            .iter()
            .map(|row| {
                let answer = remote
                    .iter()
                    .find(|r| same(&r.tower, &row.tower) && same(&r.project, &row.project))
                    .ok_or_else(|| format!("endpoint omitted {} {}", row.project, row.tower))?;
                let structure = self.agree(&row.tower, "Structure", &row.structure, &answer.structure)?;
                let finishing = self.agree(&row.tower, "Finishing", &row.finishing, &answer.finishing)?;
                Ok(ReportRow::new(&row.project, &row.tower, structure, finishing))
            })
            .collect()
    }

    fn agree(&self, tower: &str, field: &str, local: &str, remote: &str) -> Result<Percentage, String> {
        let expected = Percentage::parse(local)
            .ok_or_else(|| format!("local {field} of {tower} is not a percentage: {local}"))?;
        let answer = Percentage::parse(remote)
            .ok_or_else(|| format!("endpoint {field} of {tower} is not a percentage: {remote}"))?;
        if expected.distance(&answer) > self.tolerance {
            return Err(format!(
                "endpoint disagrees on {tower} {field}: {answer} vs {expected}"
            ));
        }
        Ok(answer)
    }

    /// Completed and non-completed totals of a month pivot. Counts must
    /// match the local sums exactly.
    pub fn monthly_totals(&self, table: &ReportTable) -> Enriched<MonthTally> {
        let Some(local) = pivot_totals(table) else {
            return Enriched::local(MonthTally::default(), "table has no totals");
        };
        let text = match self.ask(&monthly_totals_prompt(table)) {
            Ok(text) => text,
            Err(reason) => return Enriched::local(local, reason),
        };
        let Some(answer) = extract_json(&text) else {
            return Enriched::rejected(local, NO_JSON);
        };
        let remote = (
            answer.get("completed").and_then(as_count),
            answer.get("non-completed").and_then(as_count),
        );
        match remote {
            (Some(completed), Some(non_completed))
                if completed == local.completed && non_completed == local.non_completed =>
            {
                Enriched::endpoint(local)
            }
            (Some(completed), Some(non_completed)) => Enriched::rejected(
                local,
                format!(
                    "endpoint disagrees on {}: {completed}/{non_completed} vs {}/{}",
                    table.title, local.completed, local.non_completed
                ),
            ),
            _ => Enriched::rejected(local, "endpoint JSON lacks completed/non-completed totals"),
        }
    }

    /// Per-activity totals of an activity count table. Every activity must
    /// be answered with exactly its local row sum.
    pub fn activity_totals(&self, table: &ReportTable) -> Enriched<Vec<(String, u32)>> {
        let Some(local) = activity_count_totals(table) else {
            return Enriched::local(Vec::new(), "table has no totals");
        };
        let text = match self.ask(&activity_totals_prompt(table)) {
            Ok(text) => text,
            Err(reason) => return Enriched::local(local, reason),
        };
        let Some(answer) = extract_json(&text) else {
            return Enriched::rejected(local, NO_JSON);
        };
        let Value::Array(items) = answer else {
            return Enriched::rejected(local, "endpoint JSON is not a list of activity totals");
        };
        let remote: Vec<(&str, Option<u32>)> = items
            .iter()
            .filter_map(|item| {
                let name = item.get("Activity Name")?.as_str()?;
                Some((name.trim(), item.get("Total").and_then(as_count)))
            })
            .collect();
        for (name, total) in &local {
            match remote.iter().find(|(n, _)| n.eq_ignore_ascii_case(name.trim())) {
                None => return Enriched::rejected(local.clone(), format!("endpoint omitted {name}")),
                Some((_, Some(answer))) if answer == total => {}
                Some((_, answer)) => {
                    let answer = answer.map_or_else(|| "no count".to_string(), |a| a.to_string());
                    return Enriched::rejected(
                        local.clone(),
                        format!("endpoint disagrees on {name}: {answer} vs {total}"),
                    );
                }
            }
        }
        info!(activities = local.len(), "endpoint activity totals verified");
        Enriched::endpoint(local)
    }
}

/// Rows from an array (possibly nested one level, as models like to do) or
/// a single object
fn parse_rows(answer: Value) -> Option<Vec<ReportRow>> {
    let items = match answer {
        Value::Array(items) => items
            .into_iter()
            .flat_map(|item| match item {
                Value::Array(inner) => inner,
                other => vec![other],
            })
            .collect(),
        object @ Value::Object(_) => vec![object],
        _ => return None,
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).ok())
        .collect()
}

fn as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LlmError;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn rows() -> Vec<ReportRow> {
        vec![
            ReportRow::new(
                "VERIDIA",
                "TOWER 2",
                Percentage::parse("75").unwrap(),
                Percentage::ZERO,
            ),
            ReportRow::new(
                "VERIDIA",
                "TOWER 4",
                Percentage::parse("62").unwrap(),
                Percentage::parse("11").unwrap(),
            ),
        ]
    }

    fn answering(text: &'static str) -> impl Fn(&str) -> Result<String, LlmError> {
        move |_| Ok(text.to_string())
    }

    #[test]
    fn agreeing_answer_is_used() {
        let endpoint = answering(
            r#"```json
            [[{"Project": "VERIDIA", "Tower Name": "TOWER 2", "Structure": "75%", "Finishing": "0%"},
              {"Project": "veridia", "Tower Name": "Tower 4", "Structure": "61.5%", "Finishing": "11%"}]]
            ```"#,
        );
        let result = PostProcessor::new(&endpoint).structure_rows(&rows());
        assert!(result.is_endpoint());
        assert_eq!(result.value[1].tower, "TOWER 4");
        assert_eq!(result.value[1].structure, "61.5%");
    }

    #[test]
    fn disagreement_falls_back() {
        let endpoint = answering(
            r#"[{"Project": "VERIDIA", "Tower Name": "TOWER 2", "Structure": "7500%", "Finishing": "0%"},
                {"Project": "VERIDIA", "Tower Name": "TOWER 4", "Structure": "40%", "Finishing": "11%"}]"#,
        );
        let result = PostProcessor::new(&endpoint).structure_rows(&rows());
        assert_eq!(result.value, rows());
        assert_eq!(
            result.source,
            Source::Rejected("endpoint disagrees on TOWER 2 Structure: 100% vs 75%".into())
        );
    }

    #[test]
    fn missing_tower_falls_back() {
        let endpoint = answering(
            r#"{"Project": "VERIDIA", "Tower Name": "TOWER 2", "Structure": "75%", "Finishing": "0%"}"#,
        );
        let result = PostProcessor::new(&endpoint).structure_rows(&rows());
        assert_eq!(result.value, rows());
        assert_eq!(
            result.source,
            Source::Rejected("endpoint omitted VERIDIA TOWER 4".into())
        );
    }

    #[test]
    fn failures_fall_back_to_local() {
        let failing = |_: &str| -> Result<String, LlmError> {
            Err(LlmError::Status {
                code: 503,
                body: "busy".into(),
            })
        };
        let prose = answering("I could not compute that.");
        let wrong_shape = answering(r#"{"total": 3}"#);

        for endpoint in [
            &failing as &dyn CompletionEndpoint,
            &prose as &dyn CompletionEndpoint,
            &wrong_shape as &dyn CompletionEndpoint,
        ] {
            let result = PostProcessor::new(endpoint).structure_rows(&rows());
            assert_eq!(result.value, rows());
            assert!(!result.is_endpoint());
        }

        let result = PostProcessor::new(&failing).structure_rows(&rows());
        assert!(matches!(result.source, Source::Local(reason) if reason.contains("503")));
        let result = PostProcessor::new(&prose).structure_rows(&rows());
        assert_eq!(result.source, Source::Rejected(NO_JSON.into()));

        let result = PostProcessor::disabled().structure_rows(&rows());
        assert_eq!(result.source, Source::Local("endpoint disabled".into()));
    }

    fn pivot_table() -> ReportTable {
        let mut table = ReportTable::new("TOWER 6 Counts by Month", ["Category", "MAY", "Total"]);
        table.rows.push(vec!["Completed".into(), 4u32.into(), 4u32.into()]);
        table.rows.push(vec!["Non-Completed".into(), 2u32.into(), 2u32.into()]);
        table
    }

    #[test]
    fn monthly_totals_verified() {
        let calls = Cell::new(0);
        let endpoint = |_: &str| -> Result<String, LlmError> {
            calls.set(calls.get() + 1);
            Ok(r#"{"completed": "4", "non-completed": 2}"#.into())
        };
        let result = PostProcessor::new(&endpoint).monthly_totals(&pivot_table());
        assert_eq!(calls.get(), 1);
        assert!(result.is_endpoint());
        assert_eq!(
            result.value,
            MonthTally {
                completed: 4,
                non_completed: 2
            }
        );

        let wrong = answering(r#"{"completed": 5, "non-completed": 2}"#);
        let result = PostProcessor::new(&wrong).monthly_totals(&pivot_table());
        assert_eq!(result.value.completed, 4);
        assert_eq!(
            result.source,
            Source::Rejected("endpoint disagrees on TOWER 6 Counts by Month: 5/2 vs 4/2".into())
        );
    }

    fn count_table() -> ReportTable {
        let mut table = ReportTable::new(
            "Activity Counts For Tower 5 Report:(2025)",
            ["Activity Name", "MAY", "JUN", "Total"],
        );
        table
            .rows
            .push(vec!["Floor Tiling".into(), 0u32.into(), 1u32.into(), 1u32.into()]);
        table
            .rows
            .push(vec!["Wall Tiling".into(), 2u32.into(), 1u32.into(), 3u32.into()]);
        table
    }

    fn local_totals() -> Vec<(String, u32)> {
        vec![("Floor Tiling".into(), 1), ("Wall Tiling".into(), 3)]
    }

    #[test]
    fn activity_totals_verified() {
        let endpoint = answering(
            r#"[{"Activity Name": "Wall Tiling", "Total": "3"},
                {"Activity Name": "floor tiling", "Total": 1}]"#,
        );
        let result = PostProcessor::new(&endpoint).activity_totals(&count_table());
        assert!(result.is_endpoint());
        assert_eq!(result.value, local_totals());
    }

    #[test]
    fn activity_totals_fall_back_to_row_sums() {
        let result = PostProcessor::disabled().activity_totals(&count_table());
        assert_eq!(result.value, local_totals());
        assert_eq!(result.source, Source::Local("endpoint disabled".into()));

        let wrong = answering(
            r#"[{"Activity Name": "Wall Tiling", "Total": "4"},
                {"Activity Name": "Floor Tiling", "Total": "1"}]"#,
        );
        let result = PostProcessor::new(&wrong).activity_totals(&count_table());
        assert_eq!(result.value, local_totals());
        assert_eq!(
            result.source,
            Source::Rejected("endpoint disagrees on Wall Tiling: 4 vs 3".into())
        );

        let partial = answering(r#"[{"Activity Name": "Wall Tiling", "Total": "3"}]"#);
        let result = PostProcessor::new(&partial).activity_totals(&count_table());
        assert_eq!(
            result.source,
            Source::Rejected("endpoint omitted Floor Tiling".into())
        );

        let object = answering(r#"{"Wall Tiling": 3}"#);
        let result = PostProcessor::new(&object).activity_totals(&count_table());
        assert!(matches!(result.source, Source::Rejected(_)));
        assert_eq!(result.value, local_totals());
    }
}
