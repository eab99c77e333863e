//! `towerlens files`: list store keys with the metadata parsed from them

use clap::Args;
use towerlens_core::files::{select_files, split_by_cutoff};
use towerlens_core::{FileFilter, RemoteFile, Report, ReportTable, TableCell};

use super::{parse_month_year, Context};

#[derive(Args, Debug, Default)]
pub struct FilesArgs {
    /// Keep keys starting with this folder
    #[arg(long)]
    pub prefix: Option<String>,

    /// Keep keys containing this text (repeatable)
    #[arg(long)]
    pub contains: Vec<String>,

    /// Keep keys dated in this month (MM-YYYY)
    #[arg(long, value_name = "MM-YYYY", value_parser = parse_month_year)]
    pub month: Option<(i32, u32)>,
}

impl FilesArgs {
    fn filter(&self) -> FileFilter {
        let mut filter = FileFilter::new();
        if let Some(prefix) = &self.prefix {
            filter = filter.prefix(prefix);
        }
        for needle in &self.contains {
            filter = filter.contains(needle);
        }
        if let Some((year, month)) = self.month {
            filter = filter.month_year(year, month);
        }
        filter
    }
}

pub fn run(ctx: &mut Context, args: &FilesArgs) -> Report {
    let keys = ctx.keys();
    let matches = select_files(&keys, &args.filter());
    let split = split_by_cutoff(&matches, ctx.today, ctx.config.cutoff_day);

    let mut table = ReportTable::new(
        "Tracker Files",
        ["Key", "Project", "Kind", "Date", "Snapshot"],
    )
    .with_sheet_name("Files");
    for key in &matches {
        let file = RemoteFile::parse(key);
        let snapshot = if split.current.contains(key) {
            "current"
        } else if split.previous.contains(key) {
            "previous"
        } else {
            ""
        };
        table.rows.push(vec![
            TableCell::text(&file.key),
            TableCell::text(&file.project),
            TableCell::text(file.kind.to_string()),
            file.date
                .map_or(TableCell::Empty, |d| TableCell::text(d.to_string())),
            TableCell::text(snapshot),
        ]);
    }
    tracing::info!(count = table.rows.len(), "listed files");
    Report::single(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use towerlens_core::{Layouts, MemoryStore};

    fn context() -> Context {
        let store = MemoryStore::new()
            .with_object("Veridia/Structure Work Tracker (12-05-2025).xlsx", b"x".to_vec())
            .with_object("Veridia/Tower 4 Finishing Tracker (13-06-2025).xlsx", b"x".to_vec())
            .with_object("Veridia/Tower 4 Finishing Tracker (02-06-2025).xlsx", b"x".to_vec())
            .with_object("Eligo/Structure Work Tracker.xlsx", b"x".to_vec())
            .with_object("Eligo/notes.txt", b"x".to_vec());
        let today = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        Context::new(Config::default(), Layouts::builtin(), Box::new(store), today)
    }

    #[test]
    fn lists_xlsx_with_metadata() {
        let report = run(&mut context(), &FilesArgs::default());
        let table = &report.sheets[0].tables[0];
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0][0].to_string(), "Eligo/Structure Work Tracker.xlsx");
        assert_eq!(table.rows[0][3], TableCell::Empty);
        assert_eq!(table.rows[0][4].to_string(), "");

        let tower_4: Vec<(String, String)> = table
            .rows
            .iter()
            .filter(|r| r[2].to_string() == "tower 4 finishing tracker")
            .map(|r| (r[3].to_string(), r[4].to_string()))
            .collect();
        assert_eq!(
            tower_4,
            [
                ("02-06-2025".to_string(), "previous".to_string()),
                ("13-06-2025".to_string(), "current".to_string()),
            ]
        );
    }

    #[test]
    fn filters_by_folder_and_month() {
        let args = FilesArgs {
            prefix: Some("Veridia".into()),
            contains: vec!["Finishing".into()],
            month: Some((2025, 6)),
        };
        let report = run(&mut context(), &args);
        assert_eq!(report.sheets[0].tables[0].rows.len(), 2);

        let args = FilesArgs {
            month: Some((2025, 7)),
            ..FilesArgs::default()
        };
        assert!(run(&mut context(), &args).sheets[0].tables[0].is_empty());
    }
}
