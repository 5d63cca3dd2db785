//! CSV import and export of the member roster. Photos are never included.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Member, MemberDetails},
    error::{AppError, Result},
};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RosterRecord {
    id: String,
    name: String,
    phone: String,
    emergency_contact_name: String,
    emergency_contact_phone: String,
    birth_date: String,
    dues_plan: String,
    medical_notes: String,
    comments: String,
}

impl From<&Member> for RosterRecord {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            phone: member.phone.clone().unwrap_or_default(),
            emergency_contact_name: member.emergency_contact_name.clone().unwrap_or_default(),
            emergency_contact_phone: member.emergency_contact_phone.clone().unwrap_or_default(),
            birth_date: member
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            dues_plan: member.dues_plan.clone(),
            medical_notes: member.medical_notes.clone().unwrap_or_default(),
            comments: member.comments.clone().unwrap_or_default(),
        }
    }
}

impl RosterRecord {
    fn into_details(self) -> std::result::Result<MemberDetails, String> {
        if self.id.trim().is_empty() || self.name.trim().is_empty() {
            return Err("missing id or name".to_string());
        }

        let birth_date = match self.birth_date.trim() {
            "" => None,
            raw => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| format!("invalid birth date '{}'", raw))?,
            ),
        };

        Ok(MemberDetails {
            id: self.id,
            name: self.name,
            phone: Some(self.phone),
            emergency_contact_name: Some(self.emergency_contact_name),
            emergency_contact_phone: Some(self.emergency_contact_phone),
            birth_date,
            dues_plan: self.dues_plan,
            medical_notes: Some(self.medical_notes),
            comments: Some(self.comments),
        }
        .normalized())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based line number in the uploaded file, header included.
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ParsedRoster {
    pub rows: Vec<(u64, MemberDetails)>,
    pub skipped: Vec<SkippedRow>,
}

/// Column order of an exported roster.
const ROSTER_COLUMNS: [&str; 9] = [
    "id",
    "name",
    "phone",
    "emergency_contact_name",
    "emergency_contact_phone",
    "birth_date",
    "dues_plan",
    "medical_notes",
    "comments",
];

pub fn export_members(members: &[Member]) -> Result<Vec<u8>> {
    // The header is written by hand so an empty roster still gets one
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer
        .write_record(ROSTER_COLUMNS)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    for member in members {
        writer
            .serialize(RosterRecord::from(member))
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    writer.into_inner().map_err(|e| AppError::Internal(e.to_string()))
}

/// Header names are matched case-insensitively; unknown columns (a `photo`
/// column from another tool, say) are ignored. Line numbers in `SkippedRow`
/// are where the record starts, so quoted multi-line fields are counted.
pub fn parse_members(data: &[u8]) -> Result<ParsedRoster> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Unreadable CSV header: {}", e)))?;
    let headers: StringRecord = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_lowercase()
        })
        .collect();

    if !headers.iter().any(|h| h == "id") || !headers.iter().any(|h| h == "name") {
        return Err(AppError::BadRequest(
            "CSV must have 'id' and 'name' columns".to_string(),
        ));
    }

    let mut parsed = ParsedRoster::default();
    let mut last_line = 1;
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(last_line + 1);
                last_line = line;
                parsed.skipped.push(SkippedRow { line, reason: e.to_string() });
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(last_line + 1);
        last_line = line;
        match record.deserialize::<RosterRecord>(Some(&headers)) {
            Ok(record) => match record.into_details() {
                Ok(details) => parsed.rows.push((line, details)),
                Err(reason) => parsed.skipped.push(SkippedRow { line, reason }),
            },
            Err(e) => parsed.skipped.push(SkippedRow { line, reason: e.to_string() }),
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member() -> Member {
        Member {
            id: "12345678".into(),
            name: "Juan Pérez".into(),
            phone: Some("099123456".into()),
            emergency_contact_name: Some("María Pérez".into()),
            emergency_contact_phone: None,
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 15),
            dues_plan: "Open - $2000".into(),
            medical_notes: None,
            comments: Some("Trains, mornings".into()),
            photo: Some(vec![0xff, 0xd8]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_export_has_header_and_no_photo() {
        let csv = String::from_utf8(export_members(&[member()]).unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "id,name,phone,emergency_contact_name,emergency_contact_phone,birth_date,dues_plan,medical_notes,comments"
        );
        assert_eq!(
            lines.next().unwrap(),
            "12345678,Juan Pérez,099123456,María Pérez,,1990-05-15,Open - $2000,,\"Trains, mornings\""
        );
        assert!(!csv.contains("photo"));
    }

    #[test]
    fn test_export_empty_roster_is_header_only() {
        let csv = String::from_utf8(export_members(&[]).unwrap()).unwrap();
        assert_eq!(csv, format!("{}\n", ROSTER_COLUMNS.join(",")));
    }

    #[test]
    fn test_parse_counts_lines_inside_quoted_fields() {
        let data = "\u{feff}id,name,comments\n\
            12345678,Juan Perez,\"first line\nsecond line\"\n\
            ,No Id,\n\
            87654321,Ana Garcia,\n";

        let parsed = parse_members(data.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].0, 2);
        assert_eq!(parsed.rows[0].1.comments.as_deref(), Some("first line\nsecond line"));
        assert_eq!(parsed.rows[1].0, 5);
        assert_eq!(parsed.skipped, vec![SkippedRow { line: 4, reason: "missing id or name".to_string() }]);
    }

    #[test]
    fn test_parse_accepts_mixed_case_headers_and_skips_incomplete_rows() {
        let data = b"ID, Name ,Dues_Plan,Birth_Date,photo\n\
            12345678,Juan Perez,Open - $2000,1990-05-15,xyz\n\
            ,No Id,Open - $2000,,\n\
            87654321,Ana Garcia,Weights only - $800,15/05/1990,\n";

        let parsed = parse_members(data).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        let (line, details) = &parsed.rows[0];
        assert_eq!(*line, 2);
        assert_eq!(details.id, "12345678");
        assert_eq!(details.birth_date, NaiveDate::from_ymd_opt(1990, 5, 15));
        assert_eq!(details.phone, None);

        assert_eq!(parsed.skipped.len(), 2);
        assert_eq!(parsed.skipped[0].line, 3);
        assert!(parsed.skipped[1].reason.contains("birth date"));
    }

    #[test]
    fn test_parse_requires_id_and_name_columns() {
        assert!(matches!(
            parse_members(b"nombre,ci\nJuan,123\n"),
            Err(AppError::BadRequest(_))
        ));
    }
}
