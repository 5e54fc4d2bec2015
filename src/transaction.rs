use chrono::NaiveDateTime;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Basic,
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Savings => "savings",
        }
    }

    pub fn from_key(key: &str) -> Option<AccountType> {
        match key {
            "basic" => Some(Self::Basic),
            "savings" => Some(Self::Savings),
            _ => None,
        }
    }
}

/// Canonical, bank-agnostic transaction record. Immutable once an adapter
/// has produced it. Text fields are normalized (lowercased, diacritics
/// folded); absent source columns stay `None`.
#[derive(Debug, Clone)]
pub struct GenericTransaction {
    pub id: String,
    pub source: String,
    pub account_type: AccountType,
    pub payment_type: Option<String>,
    pub payment_instruction: Option<String>,
    pub payment_category: Option<String>,
    pub currency: String,
    pub amount: f64,
    pub fee: Option<f64>,
    /// Running balance; only the Revolut export carries one.
    pub balance: Option<f64>,
    pub description: Option<String>,
    pub counterparty: Option<String>,
    pub counterparty_account_name: Option<String>,
    pub payment_date: Option<NaiveDateTime>,
    pub started_date: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    pub completed_date: Option<NaiveDateTime>,
    pub is_completed: Option<bool>,
}

/// A generic transaction with its assigned category. Created once by the
/// categorizer and handed straight to the store.
#[derive(Debug, Clone)]
pub struct CategorizedTransaction {
    pub transaction: GenericTransaction,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub group: String,
    pub active: bool,
}

/// Field identifiers usable in rule constraints. The serde names are the
/// vocabulary of the mapping file, so a rule naming a field that does not
/// exist fails at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Source,
    AccountType,
    PaymentType,
    PaymentInstruction,
    PaymentCategory,
    Currency,
    Amount,
    Fee,
    Balance,
    Description,
    Counterparty,
    CounterpartyAccountName,
    PaymentDate,
    StartedDate,
    DueDate,
    CompletedDate,
    IsCompleted,
}

const DATETIME_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

impl Field {
    /// String representation of the field on a given transaction, or `None`
    /// when the field is absent. Rule patterns match against this value.
    pub fn value_of(&self, tx: &GenericTransaction) -> Option<String> {
        let date = |d: &Option<NaiveDateTime>| d.map(|d| d.format(DATETIME_DISPLAY).to_string());
        match self {
            Self::Id => Some(tx.id.clone()),
            Self::Source => Some(tx.source.clone()),
            Self::AccountType => Some(tx.account_type.as_str().to_string()),
            Self::PaymentType => tx.payment_type.clone(),
            Self::PaymentInstruction => tx.payment_instruction.clone(),
            Self::PaymentCategory => tx.payment_category.clone(),
            Self::Currency => Some(tx.currency.clone()),
            Self::Amount => Some(tx.amount.to_string()),
            Self::Fee => tx.fee.map(|f| f.to_string()),
            Self::Balance => tx.balance.map(|b| b.to_string()),
            Self::Description => tx.description.clone(),
            Self::Counterparty => tx.counterparty.clone(),
            Self::CounterpartyAccountName => tx.counterparty_account_name.clone(),
            Self::PaymentDate => date(&tx.payment_date),
            Self::StartedDate => date(&tx.started_date),
            Self::DueDate => date(&tx.due_date),
            Self::CompletedDate => date(&tx.completed_date),
            Self::IsCompleted => tx.is_completed.map(|b| b.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_transaction() -> GenericTransaction {
    GenericTransaction {
        id: "card payment2023-01-05 14:30:59-12.5".to_string(),
        source: "revolut".to_string(),
        account_type: AccountType::Basic,
        payment_type: Some("card payment".to_string()),
        payment_instruction: None,
        payment_category: None,
        currency: "CZK".to_string(),
        amount: -12.5,
        fee: Some(0.0),
        balance: Some(1000.0),
        description: Some("barista coffee".to_string()),
        counterparty: None,
        counterparty_account_name: None,
        payment_date: None,
        started_date: chrono::NaiveDate::from_ymd_opt(2023, 1, 5)
            .and_then(|d| d.and_hms_opt(14, 30, 59)),
        due_date: None,
        completed_date: None,
        is_completed: Some(true),
    }
}
