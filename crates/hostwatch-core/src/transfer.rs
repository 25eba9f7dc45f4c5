//! CSV bulk import and export.
//!
//! Import is header-driven: columns are matched by name (`name`, `ip`,
//! `site`, `location`, `type`, case-insensitive) so column order and extra
//! columns do not matter. Each row goes through [`Registry::add`], which
//! means every accepted row is persisted individually and a bad row never
//! aborts the rest of the file.

use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{DeviceRecord, NewDevice};
use crate::store::Registry;

const EXPORT_HEADER: [&str; 6] = ["Name", "IP", "Site", "Location", "Type", "Status"];

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub added: Vec<DeviceRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// A row that could not be added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// 1-based line in the source file.
    pub line: u64,
    pub reason: String,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Column positions resolved from the header row.
#[derive(Debug)]
struct Columns {
    name: usize,
    ip: usize,
    site: Option<usize>,
    location: Option<usize>,
    device_type: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, CoreError> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };
        let required = |wanted: &str| {
            find(wanted).ok_or_else(|| CoreError::Import {
                line: 1,
                reason: format!("missing required column '{wanted}'"),
            })
        };

        Ok(Self {
            name: required("name")?,
            ip: required("ip")?,
            site: find("site"),
            location: find("location"),
            device_type: find("type"),
        })
    }

    fn device(&self, row: &StringRecord) -> NewDevice {
        let cell = |idx: usize| row.get(idx).unwrap_or_default().to_owned();
        let optional = |idx: Option<usize>| idx.map(cell).filter(|v| !v.is_empty());

        NewDevice {
            name: cell(self.name),
            ip: cell(self.ip),
            site: optional(self.site),
            location: optional(self.location),
            device_type: optional(self.device_type),
        }
    }
}

/// Add every row of a CSV document to `registry`.
///
/// Validation and duplicate failures are collected per row. A storage
/// failure stops the import: rows added before it stay added.
pub fn import_csv<R: Read>(registry: &Registry, reader: R) -> Result<ImportReport, CoreError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::resolve(rdr.headers()?)?;
    debug!(?columns, "import columns resolved");

    let mut report = ImportReport::default();
    for row in rdr.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                report.rejected.push(RejectedRow {
                    line: e.position().map_or(0, csv::Position::line),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = row.position().map_or(0, csv::Position::line);

        // Blank lines inside a flexible file come through as a single empty cell.
        if row.iter().all(str::is_empty) {
            continue;
        }

        match registry.add(columns.device(&row)) {
            Ok(record) => report.added.push(record),
            Err(e @ CoreError::Persistence { .. }) => return Err(e),
            Err(e) => {
                debug!(line, error = %e, "import row rejected");
                report.rejected.push(RejectedRow {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        added = report.added.len(),
        rejected = report.rejected.len(),
        "import finished"
    );
    Ok(report)
}

/// Write `records` as CSV with a `Name,IP,Site,Location,Type,Status` header.
pub fn export_csv<W: Write>(records: &[DeviceRecord], writer: W) -> Result<(), CoreError> {
    let export_err = |e: csv::Error| CoreError::Export(e.to_string());
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record(EXPORT_HEADER).map_err(export_err)?;
    for record in records {
        let status = record.status.to_string();
        wtr.write_record([
            record.name.as_str(),
            record.ip.as_str(),
            record.site.as_deref().unwrap_or_default(),
            record.location.as_deref().unwrap_or_default(),
            record.device_type.as_deref().unwrap_or_default(),
            status.as_str(),
        ])
        .map_err(export_err)?;
    }
    wtr.flush().map_err(|e| CoreError::Export(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::DeviceStatus;
    use crate::store::storage::MemoryStorage;
    use pretty_assertions::assert_eq;

    fn registry() -> (Registry, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (Registry::load(storage.clone()).unwrap(), storage)
    }

    #[test]
    fn import_maps_headers_in_any_order_and_case() {
        let (reg, _) = registry();
        let data = "\
IP,Location,NAME,Site,Type,Owner
10.0.0.1,Rack 1,Core switch,HQ,switch,ops
10.0.0.2,,Printer,,,facilities
";
        let report = import_csv(&reg, data.as_bytes()).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.added.len(), 2);
        let first = reg.get("10.0.0.1").unwrap();
        assert_eq!(first.name, "Core switch");
        assert_eq!(first.site.as_deref(), Some("HQ"));
        assert_eq!(first.location.as_deref(), Some("Rack 1"));
        assert_eq!(first.device_type.as_deref(), Some("switch"));
        assert_eq!(first.status, DeviceStatus::Pending);
        assert_eq!(reg.get("10.0.0.2").unwrap().site, None);
    }

    #[test]
    fn bad_rows_are_reported_and_good_rows_kept() {
        let (reg, storage) = registry();
        reg.add(NewDevice::new("existing", "10.0.0.5")).unwrap();
        let data = "\
name,ip
ok,10.0.0.1
,10.0.0.2
dup,10.0.0.5
nope,not-an-ip
also ok,10.0.0.3
";
        let report = import_csv(&reg, data.as_bytes()).unwrap();

        assert_eq!(report.added.len(), 2);
        let lines: Vec<u64> = report.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, [3, 4, 5]);
        assert!(report.rejected[1].reason.contains("already registered"));
        assert_eq!(reg.list_active().len(), 3);
        // One save for the seed record plus one per accepted row.
        assert_eq!(storage.save_count(), 3);
    }

    #[test]
    fn missing_ip_column_fails_up_front() {
        let (reg, _) = registry();
        let err = import_csv(&reg, "name,site\nA,HQ\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CoreError::Import { line: 1, ref reason } if reason.contains("'ip'")));
        assert!(reg.list_active().is_empty());
    }

    #[test]
    fn storage_failure_aborts_import() {
        let (reg, storage) = registry();
        storage.set_fail_saves(true);
        let err = import_csv(&reg, "name,ip\nA,10.0.0.1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CoreError::Persistence { .. }));
        assert!(reg.list_active().is_empty());
    }

    #[test]
    fn export_writes_header_and_rows() {
        let records = vec![
            NewDevice::new("Router1", "10.0.0.1")
                .site("HQ")
                .into_record()
                .unwrap()
                .with_status(DeviceStatus::Connected),
            NewDevice::new("Cam, lobby", "10.0.0.7")
                .device_type("camera")
                .into_record()
                .unwrap(),
        ];
        let mut out = Vec::new();
        export_csv(&records, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Name,IP,Site,Location,Type,Status\n\
             Router1,10.0.0.1,HQ,,,Connected\n\
             \"Cam, lobby\",10.0.0.7,,,camera,Pending\n"
        );
    }

    #[test]
    fn exported_file_imports_back() {
        let (source, _) = registry();
        source.add(NewDevice::new("a", "10.0.0.1").location("Lab")).unwrap();
        source.add(NewDevice::new("b", "2001:db8::1").device_type("nas")).unwrap();
        let mut out = Vec::new();
        export_csv(&source.list_active(), &mut out).unwrap();

        let (target, _) = registry();
        let report = import_csv(&target, out.as_slice()).unwrap();

        assert!(report.is_clean());
        assert_eq!(target.list_active(), source.list_active());
    }
}
