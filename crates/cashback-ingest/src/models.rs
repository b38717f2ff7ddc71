//! Record and job types
//!
//! [`COLUMNS`] is the contract between a [`Record`] and the destination
//! table: [`Record::into_job`] emits values in exactly this order, and the
//! INSERT statement lists columns in exactly this order.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Number of mapped columns per row
pub const COLUMN_COUNT: usize = 25;

/// Destination table inside the per-period schema
pub const DESTINATION_TABLE: &str = "domain";

/// Destination column list, in Record order
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "no_waybill",
    "tgl_pengiriman",
    "drop_point_outgoing",
    "sprinter_pickup",
    "tempat_tujuan",
    "keterangan",
    "berat_yang_ditagih",
    "cod",
    "biaya_asuransi",
    "biaya_kirim",
    "biaya_lainnya",
    "total_biaya",
    "klien_pengiriman",
    "metode_pembayaran",
    "nama_pengirim",
    "sumber_waybill",
    "paket_retur",
    "waktu_ttd",
    "layanan",
    "diskon",
    "total_biaya_setelah_diskon",
    "agen_tujuan",
    "nik",
    "kode_promo",
    "kat",
];

/// Zero value for date fields (0001-01-01)
pub fn zero_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Zero value for timestamp fields (0001-01-01 00:00:00)
pub fn zero_timestamp() -> NaiveDateTime {
    zero_date().and_time(NaiveTime::MIN)
}

/// One shipment/cashback transaction. Every field is always populated.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub no_waybill: String,
    pub tgl_pengiriman: NaiveDate,
    pub drop_point_outgoing: String,
    pub sprinter_pickup: String,
    pub tempat_tujuan: String,
    pub keterangan: String,
    pub berat_yang_ditagih: f64,
    pub cod: i64,
    pub biaya_asuransi: f64,
    pub biaya_kirim: i64,
    pub biaya_lainnya: i64,
    pub total_biaya: f64,
    pub klien_pengiriman: String,
    pub metode_pembayaran: String,
    pub nama_pengirim: String,
    pub sumber_waybill: String,
    pub paket_retur: String,
    pub waktu_ttd: NaiveDateTime,
    pub layanan: String,
    pub diskon: i64,
    pub total_biaya_setelah_diskon: i64,
    pub agen_tujuan: String,
    pub nik: String,
    pub kode_promo: String,
    pub kategori: String,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            no_waybill: String::new(),
            tgl_pengiriman: zero_date(),
            drop_point_outgoing: String::new(),
            sprinter_pickup: String::new(),
            tempat_tujuan: String::new(),
            keterangan: String::new(),
            berat_yang_ditagih: 0.0,
            cod: 0,
            biaya_asuransi: 0.0,
            biaya_kirim: 0,
            biaya_lainnya: 0,
            total_biaya: 0.0,
            klien_pengiriman: String::new(),
            metode_pembayaran: String::new(),
            nama_pengirim: String::new(),
            sumber_waybill: String::new(),
            paket_retur: String::new(),
            waktu_ttd: zero_timestamp(),
            layanan: String::new(),
            diskon: 0,
            total_biaya_setelah_diskon: 0,
            agen_tujuan: String::new(),
            nik: String::new(),
            kode_promo: String::new(),
            kategori: String::new(),
        }
    }
}

impl Record {
    /// Convert into positional insert values, tagged with the source line
    pub fn into_job(self, line: u64) -> IngestJob {
        let values = [
            SqlValue::Text(self.no_waybill),
            SqlValue::Date(self.tgl_pengiriman),
            SqlValue::Text(self.drop_point_outgoing),
            SqlValue::Text(self.sprinter_pickup),
            SqlValue::Text(self.tempat_tujuan),
            SqlValue::Text(self.keterangan),
            SqlValue::Float(self.berat_yang_ditagih),
            SqlValue::Int(self.cod),
            SqlValue::Float(self.biaya_asuransi),
            SqlValue::Int(self.biaya_kirim),
            SqlValue::Int(self.biaya_lainnya),
            SqlValue::Float(self.total_biaya),
            SqlValue::Text(self.klien_pengiriman),
            SqlValue::Text(self.metode_pembayaran),
            SqlValue::Text(self.nama_pengirim),
            SqlValue::Text(self.sumber_waybill),
            SqlValue::Text(self.paket_retur),
            SqlValue::Timestamp(self.waktu_ttd),
            SqlValue::Text(self.layanan),
            SqlValue::Int(self.diskon),
            SqlValue::Int(self.total_biaya_setelah_diskon),
            SqlValue::Text(self.agen_tujuan),
            SqlValue::Text(self.nik),
            SqlValue::Text(self.kode_promo),
            SqlValue::Text(self.kategori),
        ];

        IngestJob { line, values }
    }
}

/// A single bindable value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// Positional values for one INSERT, aligned with [`COLUMNS`]
#[derive(Debug, Clone, PartialEq)]
pub struct IngestJob {
    line: u64,
    values: [SqlValue; COLUMN_COUNT],
}

impl IngestJob {
    /// Line of the input file the job came from
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Value bound to the named column, if the column exists
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| &self.values[idx])
    }
}
