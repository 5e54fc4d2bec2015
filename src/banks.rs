use encoding_rs::{Encoding, UTF_8, WINDOWS_1250};

use crate::coerce::{normalize, parse_datetime, parse_decimal, DateFormat};
use crate::error::Result;
use crate::reader::RowView;
use crate::transaction::{AccountType, GenericTransaction};

// ---------------------------------------------------------------------------
// Bank kinds — enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Revolut,
    Airbank,
    Raiffeisen,
}

pub const ALL_BANKS: &[Bank] = &[Bank::Revolut, Bank::Airbank, Bank::Raiffeisen];

impl Bank {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Revolut => "revolut",
            Self::Airbank => "airbank",
            Self::Raiffeisen => "raiffeisen",
        }
    }

    pub fn from_key(key: &str) -> Option<Bank> {
        ALL_BANKS.iter().find(|b| b.key() == key).copied()
    }

    /// Declared shape of this bank's export files, consumed by the reader.
    pub fn profile(&self) -> SourceProfile {
        match self {
            Self::Revolut => SourceProfile {
                encoding: UTF_8,
                delimiter: b',',
            },
            Self::Airbank | Self::Raiffeisen => SourceProfile {
                encoding: WINDOWS_1250,
                delimiter: b';',
            },
        }
    }

    /// Build the bank-specific record from one raw row. The account type is
    /// supplied by the reader layer; none of the exports carry it as a
    /// column.
    pub fn parse_row(&self, row: &RowView, account_type: AccountType) -> Result<BankRecord> {
        match self {
            Self::Revolut => RevolutRecord::from_row(row, account_type).map(BankRecord::Revolut),
            Self::Airbank => AirbankRecord::from_row(row, account_type).map(BankRecord::Airbank),
            Self::Raiffeisen => {
                RaiffeisenRecord::from_row(row, account_type).map(BankRecord::Raiffeisen)
            }
        }
    }
}

/// File-level configuration of a bank export: how the bytes are decoded and
/// how fields are delimited.
#[derive(Debug, Clone, Copy)]
pub struct SourceProfile {
    pub encoding: &'static Encoding,
    pub delimiter: u8,
}

#[derive(Debug, Clone)]
pub enum BankRecord {
    Revolut(RevolutRecord),
    Airbank(AirbankRecord),
    Raiffeisen(RaiffeisenRecord),
}

impl BankRecord {
    /// Project the bank-specific record into the canonical transaction.
    pub fn into_generic(self) -> Result<GenericTransaction> {
        match self {
            Self::Revolut(r) => r.into_generic(),
            Self::Airbank(r) => r.into_generic(),
            Self::Raiffeisen(r) => r.into_generic(),
        }
    }
}

// ---------------------------------------------------------------------------
// Revolut
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RevolutRecord {
    pub account_type: AccountType,
    pub payment_type: String,
    pub started_date: String,
    pub completed_date: String,
    pub description: Option<String>,
    pub amount: String,
    pub fee: String,
    pub currency: String,
    pub state: String,
    pub balance: Option<String>,
}

impl RevolutRecord {
    fn from_row(row: &RowView, account_type: AccountType) -> Result<Self> {
        Ok(Self {
            account_type,
            payment_type: row.required("Type")?,
            started_date: row.required("Started Date")?,
            completed_date: row.required("Completed Date")?,
            description: row.optional("Description"),
            amount: row.required("Amount")?,
            fee: row.required("Fee")?,
            currency: row.required("Currency")?,
            state: row.required("State")?,
            balance: row.optional("Balance"),
        })
    }

    fn into_generic(self) -> Result<GenericTransaction> {
        let started = parse_datetime(&self.started_date, DateFormat::IsoDateTime)?;
        let completed = parse_datetime(&self.completed_date, DateFormat::IsoDateTime)?;
        let amount = parse_decimal(&self.amount)?;
        let payment_type = self.payment_type.to_lowercase();

        // Synthetic identity: two rows sharing type, start time and amount
        // collide. Kept as-is for compatibility with stored data.
        let id = format!(
            "{}{}{}",
            payment_type,
            started.format("%Y-%m-%d %H:%M:%S"),
            amount
        );

        Ok(GenericTransaction {
            id,
            source: Bank::Revolut.key().to_string(),
            account_type: self.account_type,
            payment_type: Some(payment_type),
            payment_instruction: None,
            payment_category: None,
            currency: self.currency,
            amount,
            fee: Some(parse_decimal(&self.fee)?),
            balance: self.balance.as_deref().map(parse_decimal).transpose()?,
            description: self.description.as_deref().map(normalize),
            counterparty: None,
            counterparty_account_name: None,
            payment_date: None,
            started_date: Some(started),
            due_date: None,
            completed_date: Some(completed),
            is_completed: Some(self.state == "COMPLETED"),
        })
    }
}

// ---------------------------------------------------------------------------
// Airbank
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AirbankRecord {
    pub id: String,
    pub account_type: AccountType,
    pub payment_date: String,
    pub payment_instruction: String,
    pub payment_type: String,
    pub payment_category: String,
    pub currency: String,
    pub amount: String,
    pub fee: Option<String>,
    pub counterparty: Option<String>,
    pub counterparty_account_name: Option<String>,
    pub message_for_recipient: Option<String>,
    pub description: Option<String>,
    pub business: Option<String>,
    pub started_date: Option<String>,
    pub due_date: Option<String>,
    pub completed_date: Option<String>,
    pub completed_flag: String,
}

impl AirbankRecord {
    fn from_row(row: &RowView, account_type: AccountType) -> Result<Self> {
        Ok(Self {
            id: row.required("Referenční číslo")?,
            account_type,
            payment_date: row.required("Datum provedení")?,
            payment_instruction: row.required("Směr úhrady")?,
            payment_type: row.required("Typ úhrady")?,
            payment_category: row.required("Kategorie plateb")?,
            currency: row.required("Měna účtu")?,
            amount: row.required("Částka v měně účtu")?,
            fee: row.optional("Poplatek v měně účtu"),
            counterparty: row.optional("Název protistrany"),
            counterparty_account_name: row.optional("Název účtu protistrany"),
            message_for_recipient: row.optional("Zpráva pro příjemce"),
            description: row.optional("Poznámka k úhradě"),
            business: row.optional("Obchodní místo"),
            started_date: row.optional("Datum a čas zadání"),
            due_date: row.optional("Datum splatnosti"),
            completed_date: row.optional("Datum zaúčtování"),
            completed_flag: row.required("Zaúčtováno")?,
        })
    }

    fn into_generic(self) -> Result<GenericTransaction> {
        let parse_opt_date = |value: &Option<String>, format| {
            value.as_deref().map(|v| parse_datetime(v, format)).transpose()
        };

        Ok(GenericTransaction {
            id: self.id,
            source: Bank::Airbank.key().to_string(),
            account_type: self.account_type,
            payment_type: Some(normalize(&self.payment_type)),
            payment_instruction: Some(normalize(&self.payment_instruction)),
            payment_category: Some(normalize(&self.payment_category)),
            currency: self.currency,
            amount: parse_decimal(&self.amount)?,
            fee: self.fee.as_deref().map(parse_decimal).transpose()?,
            balance: None,
            // The note column wins; the message-for-recipient column is the
            // fallback narrative.
            description: self
                .description
                .or(self.message_for_recipient)
                .as_deref()
                .map(normalize),
            // Counterparty name falls back to the merchant-place column.
            counterparty: self.counterparty.or(self.business).as_deref().map(normalize),
            counterparty_account_name: self
                .counterparty_account_name
                .as_deref()
                .map(normalize),
            payment_date: Some(parse_datetime(
                &self.payment_date,
                DateFormat::DaySlashMonthYear,
            )?),
            started_date: parse_opt_date(&self.started_date, DateFormat::DaySlashMonthYearTime)?,
            due_date: parse_opt_date(&self.due_date, DateFormat::DaySlashMonthYear)?,
            completed_date: parse_opt_date(&self.completed_date, DateFormat::DaySlashMonthYear)?,
            is_completed: Some(self.completed_flag == "Ano"),
        })
    }
}

// ---------------------------------------------------------------------------
// Raiffeisen
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RaiffeisenRecord {
    pub id: String,
    pub account_type: AccountType,
    pub payment_date: String,
    pub completed_date: Option<String>,
    /// Present in every export, but the value is the bank's own labeling and
    /// is not carried into the generic record.
    #[allow(dead_code)]
    pub payment_category: String,
    pub counterparty_account_name: Option<String>,
    pub payment_type: Option<String>,
    pub message: Option<String>,
    pub description: Option<String>,
    pub amount: String,
    pub currency: String,
    pub fee: Option<String>,
    pub counterparty: Option<String>,
}

impl RaiffeisenRecord {
    fn from_row(row: &RowView, account_type: AccountType) -> Result<Self> {
        Ok(Self {
            id: row.required("Id transakce")?,
            account_type,
            payment_date: row.required("Datum provedení")?,
            completed_date: row.optional("Datum zaúčtování"),
            payment_category: row.required("Kategorie transakce")?,
            counterparty_account_name: row.optional("Název protiúčtu"),
            payment_type: row.optional("Typ transakce"),
            message: row.optional("Zpráva"),
            description: row.optional("Poznámka"),
            amount: row.required("Zaúčtovaná částka")?,
            currency: row.required("Měna účtu")?,
            fee: row.optional("Poplatek"),
            counterparty: row.optional("Název obchodníka"),
        })
    }

    fn into_generic(self) -> Result<GenericTransaction> {
        let completed_date = self
            .completed_date
            .as_deref()
            .map(|v| parse_datetime(v, DateFormat::DayDotMonthYearTime))
            .transpose()?;

        Ok(GenericTransaction {
            id: self.id,
            source: Bank::Raiffeisen.key().to_string(),
            account_type: self.account_type,
            payment_type: self.payment_type.as_deref().map(normalize),
            payment_instruction: None,
            payment_category: None,
            currency: self.currency,
            amount: parse_decimal(&self.amount)?,
            fee: self.fee.as_deref().map(parse_decimal).transpose()?,
            balance: None,
            description: self.description.or(self.message).as_deref().map(normalize),
            counterparty: self.counterparty.as_deref().map(normalize),
            counterparty_account_name: self
                .counterparty_account_name
                .as_deref()
                .map(normalize),
            payment_date: Some(parse_datetime(
                &self.payment_date,
                DateFormat::DayDotMonthYear,
            )?),
            started_date: None,
            due_date: None,
            // No completion flag in this export; booking date presence is
            // the completion signal.
            is_completed: Some(completed_date.is_some()),
            completed_date,
        })
    }
}
