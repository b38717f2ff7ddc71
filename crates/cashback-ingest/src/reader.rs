//! Input decoding and tokenizing
//!
//! The upload is held in memory. A leading UTF-8 BOM is stripped, the rest
//! is tokenized on `;` with standard double-quote handling and variable
//! record length. Cells are decoded lossily; whatever is not printable ASCII
//! is removed by the sanitizer anyway.

use csv_async::{AsyncReader, AsyncReaderBuilder, ByteRecord};
use tokio::io::AsyncRead;

use crate::error::IngestResult;
use crate::reassemble::RawRow;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Remove a leading UTF-8 byte-order mark, if any
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Yields data rows with their line numbers. The header line is skipped
/// without being looked at.
pub struct RowReader<R> {
    inner: AsyncReader<R>,
    record: ByteRecord,
    header_skipped: bool,
}

impl<R> RowReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        let inner = AsyncReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .create_reader(reader);

        Self {
            inner,
            record: ByteRecord::new(),
            header_skipped: false,
        }
    }

    /// Next data row, or `None` at end of input
    pub async fn next_row(&mut self) -> IngestResult<Option<(u64, RawRow)>> {
        loop {
            if !self.inner.read_byte_record(&mut self.record).await? {
                return Ok(None);
            }

            if !self.header_skipped {
                self.header_skipped = true;
                continue;
            }

            let line = self.record.position().map(|p| p.line()).unwrap_or(0);
            let cells = self
                .record
                .iter()
                .map(|cell| String::from_utf8_lossy(cell).into_owned())
                .collect();

            return Ok(Some((line, cells)));
        }
    }
}
