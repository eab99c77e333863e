//! Shared helpers: a temporary store with a small config and tracker
//! workbooks written by rust_xlsxwriter

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rust_xlsxwriter::{Format, Workbook};
use tempfile::TempDir;

pub const GREEN: u32 = 0x92D050;
pub const BLUE: u32 = 0x00B0F0;

/// Layouts for one small structure tracker; the built-in projects stay
/// configured and have no files, so they warn
const CONFIG: &str = r#"
cutoff_day = 10

[[layout]]
project = "NORTH"
sheet = "Baselines"
source = { prefix = "North", contains = ["Structure Work Tracker"] }
regions = [
  { name = "TOWER A", rows = [2, 3], columns = ["B", "C"] },
  { name = "TOWER B", rows = [2, 3], columns = ["E", "F"] },
]
"#;

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bucket")).unwrap();
        std::fs::write(dir.path().join("towerlens.toml"), CONFIG).unwrap();
        Self { dir }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn bucket(&self) -> PathBuf {
        self.path("bucket")
    }

    /// Put an object into the store directory
    pub fn put(&self, key: &str, bytes: &[u8]) {
        let path = self.bucket().join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    /// Run the binary in the workspace with a fixed report date
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_towerlens"))
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("TOWERLENS_CONFIG")
            .env_remove("TOWERLENS_STORE")
            .env("TOWERLENS_TODAY", "2025-06-20")
            .args(args)
            .output()
            .expect("failed to execute towerlens")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

/// One sheet of filled cells: `(A1, fill)`
pub fn structure_tracker(sheet: &str, cells: &[(&str, u32)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    for &(a1, color) in cells {
        let (row, col) = a1_to_zero_based(a1);
        let format = Format::new().set_background_color(color);
        worksheet.write_blank(row, col, &format).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// The NORTH tracker: tower A 3 green + 1 blue, tower B 1 blue
pub fn north_tracker() -> Vec<u8> {
    structure_tracker(
        "Baselines",
        &[
            ("B2", GREEN),
            ("C2", GREEN),
            ("B3", GREEN),
            ("C3", BLUE),
            ("E2", BLUE),
        ],
    )
}

fn a1_to_zero_based(a1: &str) -> (u32, u16) {
    let split = a1.find(|c: char| c.is_ascii_digit()).unwrap();
    let (letters, digits) = a1.split_at(split);
    let col = letters
        .bytes()
        .fold(0u16, |acc, b| acc * 26 + u16::from(b - b'A' + 1));
    (digits.parse::<u32>().unwrap() - 1, col - 1)
}

pub fn exists(path: &Path) -> bool {
    path.is_file()
}
