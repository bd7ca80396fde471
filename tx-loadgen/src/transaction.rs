use std::convert::TryFrom;
use std::fmt;

use rust_decimal::prelude::*;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::LoadError;

pub const NUM_DECIMAL_PLACES: u32 = 2;

/// Amounts at or above this value (in cents) are considered high-value.
pub const HIGH_VALUE_THRESHOLD_CENTS: i64 = 1_000_000;

#[allow(clippy::module_name_repetitions)]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
    Refund,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Inr,
    Gbp,
    Jpy,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Groceries,
    Entertainment,
    Utilities,
    Healthcare,
    Education,
    Shopping,
    Dining,
}

/// A positive monetary amount, always carried with [`NUM_DECIMAL_PLACES`] decimal places.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(#[serde(with = "rust_decimal::serde::float")] Decimal);

/// Where a transaction was initiated from. Sent as top-level fields on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    /// `"<latitude>,<longitude>"`
    pub location: String,
    pub ip_address: String,
    pub device_id: String,
}

/// The other party of a transaction, if its type has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Counterparty {
    #[serde(rename = "targetAccountId")]
    TargetAccount(String),
    #[serde(rename = "merchantId")]
    Merchant(String),
}

/// The JSON shape accepted by the ingestion API, before the counterparty rules are checked.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub user_id: String,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub currency: Currency,
    pub category: Category,
    pub location: String,
    pub ip_address: String,
    pub device_id: String,
    pub target_account_id: Option<String>,
    pub merchant_id: Option<String>,
}

/// One generated transaction event.
///
/// The counterparty always agrees with the transaction type: transfers carry a target
/// account, payments and refunds carry a merchant, everything else carries neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TransactionRecord")]
pub struct Transaction {
    user_id: String,
    amount: Amount,
    transaction_type: TransactionType,
    currency: Currency,
    category: Category,
    #[serde(flatten)]
    origin: Origin,
    #[serde(flatten)]
    counterparty: Option<Counterparty>,
}

impl TransactionType {
    pub const ALL: [TransactionType; 5] = [
        TransactionType::Deposit,
        TransactionType::Withdrawal,
        TransactionType::Transfer,
        TransactionType::Payment,
        TransactionType::Refund,
    ];

    #[must_use]
    pub fn requires_target_account(self) -> bool {
        matches!(self, TransactionType::Transfer)
    }

    #[must_use]
    pub fn requires_merchant(self) -> bool {
        matches!(self, TransactionType::Payment | TransactionType::Refund)
    }

    fn accepts(self, counterparty: Option<&Counterparty>) -> bool {
        match counterparty {
            None => !self.requires_target_account() && !self.requires_merchant(),
            Some(Counterparty::TargetAccount(_)) => self.requires_target_account(),
            Some(Counterparty::Merchant(_)) => self.requires_merchant(),
        }
    }
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Inr,
        Currency::Gbp,
        Currency::Jpy,
    ];
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Groceries,
        Category::Entertainment,
        Category::Utilities,
        Category::Healthcare,
        Category::Education,
        Category::Shopping,
        Category::Dining,
    ];
}

impl Amount {
    /// Builds an amount from a whole number of cents.
    ///
    /// # Errors
    /// Errors when `cents` is not positive
    pub fn from_cents(cents: i64) -> Result<Amount, LoadError> {
        if cents > 0 {
            Ok(Amount(Decimal::new(cents, NUM_DECIMAL_PLACES)))
        } else {
            Err(LoadError::InvalidAmount)
        }
    }

    /// `cents` must be non-zero; the generator only draws from ranges starting at 1.
    pub(crate) fn from_whole_cents(cents: u32) -> Amount {
        debug_assert!(cents > 0);
        Amount(Decimal::new(i64::from(cents), NUM_DECIMAL_PLACES))
    }

    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_high_value(self) -> bool {
        self.0 >= Decimal::new(HIGH_VALUE_THRESHOLD_CENTS, NUM_DECIMAL_PLACES)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LoadError;
    fn try_from(mut decimal: Decimal) -> Result<Self, Self::Error> {
        decimal.rescale(NUM_DECIMAL_PLACES);
        if decimal > Decimal::ZERO {
            Ok(Amount(decimal))
        } else {
            Err(LoadError::InvalidAmount)
        }
    }
}

impl TryFrom<f64> for Amount {
    type Error = LoadError;
    fn try_from(decimal: f64) -> Result<Self, Self::Error> {
        Amount::try_from(Decimal::from_f64(decimal).ok_or(LoadError::InvalidAmount)?)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let decimal = rust_decimal::serde::float::deserialize(deserializer)?;
        Amount::try_from(decimal).map_err(de::Error::custom)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Transaction {
    /// # Errors
    /// Errors when `counterparty` does not match what `transaction_type` requires
    pub fn new(
        user_id: String,
        amount: Amount,
        transaction_type: TransactionType,
        currency: Currency,
        category: Category,
        origin: Origin,
        counterparty: Option<Counterparty>,
    ) -> Result<Self, LoadError> {
        if !transaction_type.accepts(counterparty.as_ref()) {
            return Err(LoadError::CounterpartyMismatch(transaction_type));
        }
        Ok(Transaction::from_parts(
            user_id,
            amount,
            transaction_type,
            currency,
            category,
            origin,
            counterparty,
        ))
    }

    /// Infallible constructor for callers that derive `counterparty` from `transaction_type`.
    pub(crate) fn from_parts(
        user_id: String,
        amount: Amount,
        transaction_type: TransactionType,
        currency: Currency,
        category: Category,
        origin: Origin,
        counterparty: Option<Counterparty>,
    ) -> Self {
        debug_assert!(transaction_type.accepts(counterparty.as_ref()));
        Transaction {
            user_id,
            amount,
            transaction_type,
            currency,
            category,
            origin,
            counterparty,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn amount(&self) -> Amount {
        self.amount
    }

    #[must_use]
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    #[must_use]
    pub fn counterparty(&self) -> Option<&Counterparty> {
        self.counterparty.as_ref()
    }

    #[must_use]
    pub fn target_account_id(&self) -> Option<&str> {
        match &self.counterparty {
            Some(Counterparty::TargetAccount(account)) => Some(account),
            _ => None,
        }
    }

    #[must_use]
    pub fn merchant_id(&self) -> Option<&str> {
        match &self.counterparty {
            Some(Counterparty::Merchant(merchant)) => Some(merchant),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_high_value(&self) -> bool {
        self.amount.is_high_value()
    }
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = LoadError;
    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let counterparty = match (record.target_account_id, record.merchant_id) {
            (None, None) => None,
            (Some(account), None) => Some(Counterparty::TargetAccount(account)),
            (None, Some(merchant)) => Some(Counterparty::Merchant(merchant)),
            (Some(_), Some(_)) => {
                return Err(LoadError::CounterpartyMismatch(record.transaction_type))
            }
        };
        Transaction::new(
            record.user_id,
            record.amount,
            record.transaction_type,
            record.currency,
            record.category,
            Origin {
                location: record.location,
                ip_address: record.ip_address,
                device_id: record.device_id,
            },
            counterparty,
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn origin() -> Origin {
        Origin {
            location: "12.5,-45.25".to_string(),
            ip_address: "10.0.0.7".to_string(),
            device_id: "device_42".to_string(),
        }
    }

    fn make_tx(transaction_type: TransactionType, counterparty: Option<Counterparty>) -> Transaction {
        Transaction::new(
            "user_7".to_string(),
            Amount::from_cents(123_456).unwrap(),
            transaction_type,
            Currency::Eur,
            Category::Dining,
            origin(),
            counterparty,
        )
        .unwrap()
    }

    #[test]
    fn test_amount_try_from() {
        assert!(Amount::try_from(Decimal::ZERO).is_err());
        assert!(Amount::try_from(-1.5).is_err());
        assert!(Amount::from_cents(0).is_err());

        let long_amount = Amount::try_from(1.234_9).unwrap();
        let short_amount = Amount::try_from(1.23).unwrap();
        assert_eq!(long_amount, short_amount);
        assert_eq!(long_amount.value().scale(), NUM_DECIMAL_PLACES);

        assert_eq!(Amount::from_cents(1).unwrap().to_string(), "0.01");
        assert_eq!(Amount::from_cents(500_000).unwrap().to_string(), "5000.00");
    }

    #[test]
    fn test_amount_high_value() {
        assert!(!Amount::from_cents(999_999).unwrap().is_high_value());
        assert!(Amount::from_cents(1_000_000).unwrap().is_high_value());
        assert!(Amount::from_cents(15_000_000).unwrap().is_high_value());
    }

    #[test]
    fn test_counterparty_must_match_type() {
        let account = || Some(Counterparty::TargetAccount("account_1".to_string()));
        let merchant = || Some(Counterparty::Merchant("merchant_1".to_string()));

        assert!(Transaction::new(
            "user_1".to_string(),
            Amount::from_cents(100).unwrap(),
            TransactionType::Transfer,
            Currency::Usd,
            Category::Shopping,
            origin(),
            None,
        )
        .is_err());
        assert!(Transaction::new(
            "user_1".to_string(),
            Amount::from_cents(100).unwrap(),
            TransactionType::Deposit,
            Currency::Usd,
            Category::Shopping,
            origin(),
            merchant(),
        )
        .is_err());
        assert!(Transaction::new(
            "user_1".to_string(),
            Amount::from_cents(100).unwrap(),
            TransactionType::Refund,
            Currency::Usd,
            Category::Shopping,
            origin(),
            account(),
        )
        .is_err());

        let transfer = make_tx(TransactionType::Transfer, account());
        assert_eq!(transfer.target_account_id(), Some("account_1"));
        assert_eq!(transfer.merchant_id(), None);

        let payment = make_tx(TransactionType::Payment, merchant());
        assert_eq!(payment.merchant_id(), Some("merchant_1"));
        assert_eq!(payment.target_account_id(), None);
    }

    #[test]
    fn test_serialize_wire_shape() {
        let deposit = make_tx(TransactionType::Deposit, None);
        let mut value = serde_json::to_value(&deposit).unwrap();
        let amount = value
            .as_object_mut()
            .unwrap()
            .remove("amount")
            .and_then(|amount| amount.as_f64())
            .unwrap();
        assert!((amount - 1234.56).abs() < 1e-9);
        assert_eq!(
            value,
            json!({
                "userId": "user_7",
                "transactionType": "DEPOSIT",
                "currency": "EUR",
                "category": "dining",
                "location": "12.5,-45.25",
                "ipAddress": "10.0.0.7",
                "deviceId": "device_42",
            })
        );
    }

    #[test]
    fn test_serialize_optional_keys() {
        let transfer = make_tx(
            TransactionType::Transfer,
            Some(Counterparty::TargetAccount("account_9".to_string())),
        );
        let value = serde_json::to_value(&transfer).unwrap();
        assert_eq!(value["targetAccountId"], Value::from("account_9"));
        assert!(value.get("merchantId").is_none());

        let refund = make_tx(
            TransactionType::Refund,
            Some(Counterparty::Merchant("merchant_3".to_string())),
        );
        let value = serde_json::to_value(&refund).unwrap();
        assert_eq!(value["merchantId"], Value::from("merchant_3"));
        assert_eq!(value["transactionType"], Value::from("REFUND"));
        assert!(value.get("targetAccountId").is_none());
    }

    #[test]
    fn test_deserialize_record() {
        let payment = make_tx(
            TransactionType::Payment,
            Some(Counterparty::Merchant("merchant_77".to_string())),
        );
        let body = serde_json::to_string(&payment).unwrap();
        let parsed: Transaction = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, payment);

        let both = json!({
            "userId": "user_1",
            "amount": 10.5,
            "transactionType": "TRANSFER",
            "currency": "USD",
            "category": "utilities",
            "location": "0,0",
            "ipAddress": "192.168.1.1",
            "deviceId": "device_1",
            "targetAccountId": "account_1",
            "merchantId": "merchant_1",
        });
        assert!(serde_json::from_value::<Transaction>(both).is_err());

        let negative = json!({
            "userId": "user_1",
            "amount": -3.0,
            "transactionType": "DEPOSIT",
            "currency": "USD",
            "category": "utilities",
            "location": "0,0",
            "ipAddress": "192.168.1.1",
            "deviceId": "device_1",
        });
        assert!(serde_json::from_value::<Transaction>(negative).is_err());
    }
}
