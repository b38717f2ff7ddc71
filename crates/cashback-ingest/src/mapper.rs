//! Record mapper
//!
//! Maps the first 25 cells of a canonical row onto a [`Record`] by position.
//! Rows with fewer cells produce nothing; extra trailing cells are ignored.
//!
//! A field that fails to parse keeps its zero value and is reported, it never
//! fails the row or touches another field:
//!
//! - empty numeric cells read as `"0"`
//! - empty date cells read as `"0000-00-00"`, which never parses, so an empty
//!   date always yields the zero date plus one reported failure

use chrono::{NaiveDate, NaiveDateTime};
use std::str::FromStr;
use tracing::warn;

use crate::models::{zero_date, zero_timestamp, Record, COLUMNS, COLUMN_COUNT};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layouts the raw text must match before parsing; `0` stands for any digit.
/// chrono alone accepts unpadded and space-padded values.
const DATE_LAYOUT: &str = "0000-00-00";
const TIMESTAMP_LAYOUT: &str = "0000-00-00 00:00:00";

const DATE_SENTINEL: &str = "0000-00-00";
const NUMERIC_DEFAULT: &str = "0";

/// A field that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub column: &'static str,
    pub value: String,
    pub reason: String,
}

/// A mapped row plus the fields that fell back to zero
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub record: Record,
    pub failures: Vec<FieldFailure>,
}

/// Map a canonical row. `line` is only used for diagnostics.
pub fn map_row(row: &[String], line: u64) -> Option<MappedRecord> {
    if row.len() < COLUMN_COUNT {
        return None;
    }

    let mut fields = Fields {
        row: &row[..COLUMN_COUNT],
        line,
        failures: Vec::new(),
    };

    let record = Record {
        no_waybill: fields.text(0),
        tgl_pengiriman: fields.date(1),
        drop_point_outgoing: fields.text(2),
        sprinter_pickup: fields.text(3),
        tempat_tujuan: fields.text(4),
        keterangan: fields.text(5),
        berat_yang_ditagih: fields.number(6),
        cod: fields.number(7),
        biaya_asuransi: fields.number(8),
        biaya_kirim: fields.number(9),
        biaya_lainnya: fields.number(10),
        total_biaya: fields.number(11),
        klien_pengiriman: fields.text(12),
        metode_pembayaran: fields.text(13),
        nama_pengirim: fields.text(14),
        sumber_waybill: fields.text(15),
        paket_retur: fields.text(16),
        waktu_ttd: fields.timestamp(17),
        layanan: fields.text(18),
        diskon: fields.number(19),
        total_biaya_setelah_diskon: fields.number(20),
        agen_tujuan: fields.text(21),
        nik: fields.text(22),
        kode_promo: fields.text(23),
        kategori: fields.text(24),
    };

    Some(MappedRecord {
        record,
        failures: fields.failures,
    })
}

struct Fields<'a> {
    row: &'a [String],
    line: u64,
    failures: Vec<FieldFailure>,
}

impl Fields<'_> {
    fn text(&self, idx: usize) -> String {
        self.row[idx].clone()
    }

    fn number<T>(&mut self, idx: usize) -> T
    where
        T: FromStr + Default,
        T::Err: std::fmt::Display,
    {
        let row = self.row;
        let raw = non_empty_or(&row[idx], NUMERIC_DEFAULT);
        match raw.parse() {
            Ok(value) => value,
            Err(e) => {
                self.fail(idx, raw, e);
                T::default()
            },
        }
    }

    fn date(&mut self, idx: usize) -> NaiveDate {
        let row = self.row;
        let raw = non_empty_or(&row[idx], DATE_SENTINEL);
        if !matches_layout(raw, DATE_LAYOUT) {
            self.fail(idx, raw, "expected YYYY-MM-DD");
            return zero_date();
        }
        match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(value) => value,
            Err(e) => {
                self.fail(idx, raw, e);
                zero_date()
            },
        }
    }

    fn timestamp(&mut self, idx: usize) -> NaiveDateTime {
        let row = self.row;
        let raw = non_empty_or(&row[idx], DATE_SENTINEL);
        if !matches_layout(raw, TIMESTAMP_LAYOUT) {
            self.fail(idx, raw, "expected YYYY-MM-DD HH:MM:SS");
            return zero_timestamp();
        }
        match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
            Ok(value) => value,
            Err(e) => {
                self.fail(idx, raw, e);
                zero_timestamp()
            },
        }
    }

    fn fail(&mut self, idx: usize, raw: &str, error: impl std::fmt::Display) {
        let column = COLUMNS[idx];
        let reason = error.to_string();

        warn!(
            line = self.line,
            column,
            value = %raw,
            error = %reason,
            "Failed to parse field, using zero value"
        );

        self.failures.push(FieldFailure {
            column,
            value: raw.to_string(),
            reason,
        });
    }
}

fn matches_layout(raw: &str, layout: &str) -> bool {
    raw.len() == layout.len()
        && raw.bytes().zip(layout.bytes()).all(|(c, l)| match l {
            b'0' => c.is_ascii_digit(),
            _ => c == l,
        })
}

fn non_empty_or<'a>(raw: &'a str, default: &'a str) -> &'a str {
    if raw.is_empty() {
        default
    } else {
        raw
    }
}
