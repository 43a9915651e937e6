use std::io::Write;
use tempfile::NamedTempFile;

pub const HEADER: &str = "op,reference,show,user,seats,total_seats,price";

/// Writes a reservation script to a temp file, header included.
pub fn script_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp script");
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}
