//! Prompts sent to the completion endpoint

use towerlens_core::{ReportRow, ReportTable};

/// Ask for the structure table restated as `ReportRow` JSON
pub fn structure_prompt(rows: &[ReportRow]) -> String {
    let table = serde_json::to_string_pretty(rows).unwrap_or_default();
    format!(
        "Read all data from this table carefully:\n\n\
         {table}\n\n\
         For each tower keep the \"Project\" and \"Tower Name\" values unchanged and \
         report its \"Structure\" and \"Finishing\" completion as a percentage.\n\n\
         Sample JSON:\n\
         [{{\"Project\": \"project name\", \"Tower Name\": \"tower name\", \
         \"Structure\": \"75%\", \"Finishing\": \"0%\"}}]\n\n\
         Return the result strictly as a JSON array. No code, no explanations, only the JSON."
    )
}

/// Ask for completed and non-completed totals over every month of a pivot
pub fn monthly_totals_prompt(table: &ReportTable) -> String {
    let markdown = table.to_markdown();
    format!(
        "Read all data from this table carefully:\n\n\
         {markdown}\n\
         Add up the completed and the non-completed values over every month column. \
         Only the two totals are needed, do not add any month names.\n\n\
         Sample JSON:\n\
         {{\"completed\": \"total\", \"non-completed\": \"total\"}}\n\n\
         Return the result strictly as a JSON object. No code, no explanations, only the JSON."
    )
}

/// Ask for the `Total` of every activity row of a count table
pub fn activity_totals_prompt(table: &ReportTable) -> String {
    let markdown = table.to_markdown();
    format!(
        "Read all data from this table carefully:\n\n\
         {markdown}\n\
         For every activity add up its counts over all month columns. \
         Keep each \"Activity Name\" exactly as written.\n\n\
         Sample JSON:\n\
         [{{\"Activity Name\": \"name\", \"Total\": \"count\"}}]\n\n\
         Return the result strictly as a JSON array. No code, no explanations, only the JSON."
    )
}
