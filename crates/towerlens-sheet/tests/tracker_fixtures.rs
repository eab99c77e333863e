//! Integration tests reading workbooks written by rust_xlsxwriter

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use towerlens_core::layout::ActivityColumns;
use towerlens_core::{CellFill, CellRef, CellSource, CellValue, FillColor};
use towerlens_sheet::{read_activities, SheetError, TrackerWorkbook};

fn at(a1: &str) -> CellRef {
    CellRef::parse(a1).unwrap()
}

/// Serial day number of a date in the 1900 date system
fn serial(date: NaiveDate) -> f64 {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    (date - base).num_days() as f64
}

fn structure_fixture() -> Vec<u8> {
    let green = Format::new().set_background_color(0x92D050);
    let blue = Format::new().set_background_color(0x00B0F0);
    let dated_green = Format::new()
        .set_background_color(0x92D050)
        .set_num_format("dd/mm/yyyy");

    let mut workbook = Workbook::new();
    let cover = workbook.add_worksheet();
    cover.set_name("Cover").unwrap();
    cover.write_string(0, 0, "Structure Work Tracker").unwrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Revised Baselines").unwrap();
    sheet.write_string(2, 1, "Pour").unwrap();
    // B4 green text, C4 blue blank, D4 green date, B5 unfilled
    sheet.write_string_with_format(3, 1, "Done", &green).unwrap();
    sheet.write_blank(3, 2, &blue).unwrap();
    let may_15 = NaiveDate::from_ymd_opt(2025, 5, 15).unwrap();
    sheet
        .write_number_with_format(3, 3, serial(may_15), &dated_green)
        .unwrap();
    sheet.write_string(4, 1, "Pending").unwrap();

    workbook.save_to_buffer().unwrap()
}

#[test]
fn fills_and_values_from_a_real_package() {
    let mut workbook = TrackerWorkbook::from_bytes(structure_fixture()).unwrap();
    assert_eq!(workbook.sheet_names(), ["Cover", "Revised Baselines"]);

    let sheet = workbook.sheet("Revised Baselines").unwrap();
    let green = CellFill::Solid(FillColor::Rgb("#92D050".into()));
    let blue = CellFill::Solid(FillColor::Rgb("#00B0F0".into()));

    assert_eq!(sheet.fill(at("B4")), green);
    assert_eq!(sheet.fill(at("C4")), blue);
    assert_eq!(sheet.fill(at("D4")), green);
    assert_eq!(sheet.fill(at("B5")), CellFill::None);
    assert_eq!(sheet.fill(at("Z99")), CellFill::None);

    assert_eq!(sheet.value(at("B4")), CellValue::Text("Done".into()));
    assert!(sheet.value(at("C4")).is_empty());
    assert_eq!(
        sheet.value(at("D4")).as_date(),
        NaiveDate::from_ymd_opt(2025, 5, 15)
    );
    assert_eq!(sheet.max_row(), 5);
}

#[test]
fn sheet_lookup() {
    let mut workbook = TrackerWorkbook::from_bytes(structure_fixture()).unwrap();
    assert!(workbook.has_sheet("revised baselines "));

    let sheet = workbook
        .first_sheet_named(&["TOWER 4 FINISHING.", "Revised Baselines"])
        .unwrap();
    assert_eq!(sheet.name(), "Revised Baselines");

    assert!(matches!(
        workbook.sheet("Revised Baselines- 25 days SC"),
        Err(SheetError::SheetNotFound(_))
    ));
    assert!(matches!(
        workbook.first_sheet_named(&["TOWER 4 FINISHING."]),
        Err(SheetError::NoMatchingSheet(names)) if names == ["TOWER 4 FINISHING."]
    ));
}

#[test]
fn bold_activity_rows() {
    let bold = Format::new().set_bold();
    let date = Format::new().set_num_format("dd-mmm-yy");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("TOWER 4 FINISHING.").unwrap();
    for (col, header) in ["Activity ID", "Activity Name", "% Complete", "Start", "Finish"]
        .into_iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, header).unwrap();
    }
    sheet.write_string(1, 0, "T4-FIN").unwrap();
    sheet.write_string_with_format(1, 1, "Finishing Works", &bold).unwrap();
    sheet.write_string(2, 0, "T4-010").unwrap();
    sheet.write_string(2, 1, "Wall Putty").unwrap();
    sheet.write_number(2, 2, 0.4).unwrap();
    let finish = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
    sheet
        .write_number_with_format(2, 4, serial(finish), &date)
        .unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let mut workbook = TrackerWorkbook::from_bytes(bytes).unwrap();
    let sheet = workbook.sheet("TOWER 4 FINISHING.").unwrap();
    let activities = read_activities(&sheet, 1, &ActivityColumns::default()).unwrap();

    assert_eq!(activities.len(), 2);
    assert!(activities[0].bold);
    assert!(!activities[1].bold);
    assert_eq!(activities[1].percent_complete, Some(0.4));
    assert_eq!(activities[1].finish, Some(finish));
}

#[test]
fn rows_snapshot_of_values() {
    let mut workbook = TrackerWorkbook::from_bytes(structure_fixture()).unwrap();
    let sheet = workbook.sheet("Cover").unwrap();
    assert_eq!(
        sheet.rows(),
        vec![vec![CellValue::Text("Structure Work Tracker".into())]]
    );
}

#[test]
fn not_a_workbook() {
    assert!(matches!(
        TrackerWorkbook::from_bytes(b"PK but not really".to_vec()),
        Err(SheetError::Package(_))
    ));
}
