use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{DomainError, DomainResult, Entity, EntityId, Money, typed_id};

typed_id!(PaymentId(EntityId), "Payment identifier.");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    BankSlip,
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// A payment made against a sale. Owned by the sale; never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PaymentRecord", into = "PaymentRecord")]
pub struct Payment {
    id: PaymentId,
    method: PaymentMethod,
    amount: Money,
    status: PaymentStatus,
    paid_at: Option<DateTime<Utc>>,
    transaction_id: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

/// Stored form of a [`Payment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub method: PaymentMethod,
    pub amount: Money,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// New pending payment. The amount must be positive.
    pub fn create(
        id: PaymentId,
        method: PaymentMethod,
        amount: Money,
        transaction_id: Option<String>,
        notes: Option<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if amount.is_zero() {
            return Err(DomainError::validation("payment amount must be greater than zero"));
        }
        Ok(Self {
            id,
            method,
            amount,
            status: PaymentStatus::Pending,
            paid_at: None,
            transaction_id,
            notes,
            created_at,
        })
    }

    pub fn restore(record: PaymentRecord) -> DomainResult<Self> {
        if record.amount.is_zero() {
            return Err(DomainError::validation("payment amount must be greater than zero"));
        }
        if record.status == PaymentStatus::Confirmed && record.paid_at.is_none() {
            return Err(DomainError::invariant(format!(
                "confirmed payment {} has no payment date",
                record.id
            )));
        }
        Ok(Self {
            id: record.id,
            method: record.method,
            amount: record.amount,
            status: record.status,
            paid_at: record.paid_at,
            transaction_id: record.transaction_id,
            notes: record.notes,
            created_at: record.created_at,
        })
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == PaymentStatus::Cancelled
    }

    pub fn confirm(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            PaymentStatus::Confirmed => Err(DomainError::invariant("payment already confirmed")),
            PaymentStatus::Cancelled => {
                Err(DomainError::invariant("cannot confirm a cancelled payment"))
            }
            PaymentStatus::Pending => {
                self.status = PaymentStatus::Confirmed;
                self.paid_at = Some(at);
                Ok(())
            }
        }
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        match self.status {
            PaymentStatus::Cancelled => Err(DomainError::invariant("payment already cancelled")),
            PaymentStatus::Confirmed => {
                Err(DomainError::invariant("cannot cancel a confirmed payment"))
            }
            PaymentStatus::Pending => {
                self.status = PaymentStatus::Cancelled;
                Ok(())
            }
        }
    }
}

impl TryFrom<PaymentRecord> for Payment {
    type Error = DomainError;

    fn try_from(value: PaymentRecord) -> Result<Self, Self::Error> {
        Self::restore(value)
    }
}

impl From<Payment> for PaymentRecord {
    fn from(value: Payment) -> Self {
        Self {
            id: value.id,
            method: value.method,
            amount: value.amount,
            status: value.status,
            paid_at: value.paid_at,
            transaction_id: value.transaction_id,
            notes: value.notes,
            created_at: value.created_at,
        }
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use vendora_core::Currency;

    fn pending() -> Payment {
        Payment::create(
            PaymentId::generate(),
            PaymentMethod::Pix,
            Money::new(dec!(25), Currency::BRL).unwrap(),
            Some("tx-1".into()),
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = Payment::create(
            PaymentId::generate(),
            PaymentMethod::Cash,
            Money::zero(Currency::BRL),
            None,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn confirm_stamps_paid_at_once() {
        let mut payment = pending();
        payment.confirm(Utc::now()).unwrap();
        assert!(payment.is_confirmed());
        assert!(payment.paid_at().is_some());
        assert!(payment.confirm(Utc::now()).is_err());
        assert!(payment.cancel().is_err());
    }

    #[test]
    fn cancelled_payment_cannot_be_confirmed() {
        let mut payment = pending();
        payment.cancel().unwrap();
        assert!(payment.is_cancelled());
        assert!(payment.confirm(Utc::now()).is_err());
        assert!(payment.cancel().is_err());
    }

    #[test]
    fn restore_keeps_pending_status() {
        let record = PaymentRecord::from(pending());
        let restored = Payment::restore(record).unwrap();
        assert!(restored.is_pending());
        assert_eq!(restored.transaction_id(), Some("tx-1"));
    }
}
