use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use tracing::debug;

use crate::banks::{Bank, BankRecord};
use crate::error::{MonetaError, Result};
use crate::transaction::AccountType;

/// Export files for savings accounts carry this marker in their name; the
/// banks put no account-type column in the CSV itself. The marker is an
/// external classification input to the adapters, not row data.
pub const SAVINGS_PATH_MARKER: &str = "sporici";

pub fn account_type_for_path(path: &Path) -> AccountType {
    if path.to_string_lossy().contains(SAVINGS_PATH_MARKER) {
        AccountType::Savings
    } else {
        AccountType::Basic
    }
}

/// Header-keyed view over one raw CSV row. Values are trimmed and the empty
/// string is treated as absent before any type coercion happens.
pub struct RowView<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl<'a> RowView<'a> {
    pub fn new(headers: &'a StringRecord, record: &'a StringRecord) -> Self {
        Self { headers, record }
    }

    pub fn optional(&self, column: &str) -> Option<String> {
        let idx = self.headers.iter().position(|h| h.trim() == column)?;
        let value = self.record.get(idx)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub fn required(&self, column: &str) -> Result<String> {
        self.optional(column)
            .ok_or_else(|| MonetaError::Validation(format!("missing required column '{column}'")))
    }
}

/// Forward-only reader over one bank export. Rows are decoded and parsed
/// incrementally; a malformed row fails the whole sequence.
pub struct CsvSource {
    bank: Bank,
    account_type: AccountType,
    headers: StringRecord,
    reader: csv::Reader<DecodeReaderBytes<File, Vec<u8>>>,
}

impl CsvSource {
    /// Open a source file, deriving the account type from the file path
    /// naming convention.
    pub fn open(path: &Path, bank: Bank) -> Result<Self> {
        Self::open_with_account_type(path, bank, account_type_for_path(path))
    }

    pub fn open_with_account_type(
        path: &Path,
        bank: Bank,
        account_type: AccountType,
    ) -> Result<Self> {
        let profile = bank.profile();
        let file = File::open(path)?;
        let decoder = DecodeReaderBytesBuilder::new()
            .encoding(Some(profile.encoding))
            .build(file);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(profile.delimiter)
            .flexible(true)
            .from_reader(decoder);
        let headers = reader.headers()?.clone();
        debug!(
            bank = bank.key(),
            account_type = account_type.as_str(),
            file = %path.display(),
            "opened source file"
        );
        Ok(Self {
            bank,
            account_type,
            headers,
            reader,
        })
    }

    pub fn records(&mut self) -> Records<'_> {
        Records { source: self }
    }
}

pub struct Records<'a> {
    source: &'a mut CsvSource,
}

impl Iterator for Records<'_> {
    type Item = Result<BankRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        match self.source.reader.read_record(&mut record) {
            Ok(false) => None,
            Ok(true) => {
                let row = RowView::new(&self.source.headers, &record);
                Some(self.source.bank.parse_row(&row, self.source.account_type))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_and_record(
        header_fields: &[&str],
        record_fields: &[&str],
    ) -> (StringRecord, StringRecord) {
        (
            StringRecord::from(header_fields.to_vec()),
            StringRecord::from(record_fields.to_vec()),
        )
    }

    #[test]
    fn test_row_view_empty_string_is_absent() {
        let (headers, record) = headers_and_record(&["A", "B", "C"], &["x", "", "  "]);
        let row = RowView::new(&headers, &record);
        assert_eq!(row.optional("A").as_deref(), Some("x"));
        assert_eq!(row.optional("B"), None);
        assert_eq!(row.optional("C"), None);
        assert_eq!(row.optional("Missing"), None);
    }

    #[test]
    fn test_row_view_required() {
        let (headers, record) = headers_and_record(&["A", "B"], &["x", ""]);
        let row = RowView::new(&headers, &record);
        assert_eq!(row.required("A").unwrap(), "x");
        assert!(matches!(row.required("B"), Err(MonetaError::Validation(_))));
        assert!(matches!(
            row.required("Missing"),
            Err(MonetaError::Validation(_))
        ));
    }

    #[test]
    fn test_account_type_for_path() {
        assert_eq!(
            account_type_for_path(Path::new("exports/ucet-sporici-2023.csv")),
            AccountType::Savings
        );
        assert_eq!(
            account_type_for_path(Path::new("exports/ucet-bezny-2023.csv")),
            AccountType::Basic
        );
    }

    #[test]
    fn test_reads_utf8_revolut_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revolut.csv");
        std::fs::write(
            &path,
            "Type,Product,Started Date,Completed Date,Description,Amount,Fee,Currency,State,Balance\n\
             CARD_PAYMENT,Current,2023-01-05 14:30:59,2023-01-05 15:00:00,Groceries,-12.50,0.00,CZK,COMPLETED,987.50\n",
        )
        .unwrap();

        let mut source = CsvSource::open(&path, Bank::Revolut).unwrap();
        let records: Vec<_> = source.records().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        let tx = records.into_iter().next().unwrap().into_generic().unwrap();
        assert_eq!(tx.source, "revolut");
        assert_eq!(tx.amount, -12.5);
        assert_eq!(tx.account_type, AccountType::Basic);
    }

    #[test]
    fn test_reads_windows_1250_airbank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airbank-sporici.csv");
        let content = "Referenční číslo;Datum provedení;Směr úhrady;Typ úhrady;Kategorie plateb;\
                       Měna účtu;Částka v měně účtu;Poplatek v měně účtu;Název protistrany;\
                       Název účtu protistrany;Zpráva pro příjemce;Poznámka k úhradě;Obchodní místo;\
                       Datum a čas zadání;Datum splatnosti;Datum zaúčtování;Zaúčtováno\n\
                       AB-123;05/01/2023;Odchozí;Platba kartou;Jídlo;CZK;-250,00;;Kavárna Útulno;;;;\
                       Kavárna Útulno;05/01/2023 14:30:59;;06/01/2023;Ano\n";
        let (encoded, _, had_errors) = encoding_rs::WINDOWS_1250.encode(content);
        assert!(!had_errors);
        std::fs::write(&path, &encoded).unwrap();

        let mut source = CsvSource::open(&path, Bank::Airbank).unwrap();
        let records: Vec<_> = source.records().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        let tx = records.into_iter().next().unwrap().into_generic().unwrap();
        assert_eq!(tx.id, "AB-123");
        assert_eq!(tx.amount, -250.0);
        // Account type came from the file-name marker, not the CSV.
        assert_eq!(tx.account_type, AccountType::Savings);
        assert_eq!(tx.counterparty.as_deref(), Some("kavarna utulno"));
    }

    #[test]
    fn test_malformed_row_fails_the_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revolut.csv");
        std::fs::write(
            &path,
            "Type,Started Date,Completed Date,Description,Amount,Fee,Currency,State,Balance\n\
             CARD_PAYMENT,2023-01-05 14:30:59,2023-01-05 15:00:00,ok,-12.50,0.00,CZK,COMPLETED,987.50\n\
             CARD_PAYMENT,2023-01-06 09:00:00,2023-01-06 09:30:00,bad,,0.00,CZK,COMPLETED,900.00\n",
        )
        .unwrap();

        let mut source = CsvSource::open(&path, Bank::Revolut).unwrap();
        let mut records = source.records();
        assert!(records.next().unwrap().is_ok());
        assert!(matches!(
            records.next().unwrap(),
            Err(MonetaError::Validation(_))
        ));
    }
}
