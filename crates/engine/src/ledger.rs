//! Ledger primitives shared by transactions and transfers.
//!
//! A `LedgerTarget` is the single account or card whose stored balance a
//! ledger row moves. Rows persist it as two nullable columns; the domain only
//! ever sees the enum.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Direction of a transaction's effect on its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

impl TryFrom<&str> for EntryType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBIT" => Ok(Self::Debit),
            "CREDIT" => Ok(Self::Credit),
            other => Err(EngineError::Validation(format!(
                "invalid entry type: {other}"
            ))),
        }
    }
}

/// The account or card a ledger row points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LedgerTarget {
    Account(Uuid),
    Card(Uuid),
}

impl LedgerTarget {
    /// Builds a target from the two optional references carried by requests
    /// and storage rows. Exactly one must be set.
    pub fn from_pair(account_id: Option<Uuid>, card_id: Option<Uuid>) -> ResultEngine<Self> {
        match (account_id, card_id) {
            (Some(account_id), None) => Ok(Self::Account(account_id)),
            (None, Some(card_id)) => Ok(Self::Card(card_id)),
            (Some(_), Some(_)) => Err(EngineError::OperationNotAllowed(
                "provide only one of account or card".to_string(),
            )),
            (None, None) => Err(EngineError::OperationNotAllowed(
                "either an account or a card is required".to_string(),
            )),
        }
    }

    /// Splits the target back into `(account_id, card_id)` columns.
    pub fn into_pair(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Self::Account(id) => (Some(id), None),
            Self::Card(id) => (None, Some(id)),
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Account(id) | Self::Card(id) => id,
        }
    }

    pub fn account_id(self) -> Option<Uuid> {
        self.into_pair().0
    }

    pub fn card_id(self) -> Option<Uuid> {
        self.into_pair().1
    }
}

/// Signed balance delta of a transaction on its target.
///
/// Accounts grow on CREDIT and shrink on DEBIT. Cards track debt, so a DEBIT
/// (purchase) grows the card balance and a CREDIT (payment, refund) shrinks
/// it.
pub fn transaction_delta(target: LedgerTarget, entry_type: EntryType, amount_minor: i64) -> i64 {
    match (target, entry_type) {
        (LedgerTarget::Account(_), EntryType::Credit) | (LedgerTarget::Card(_), EntryType::Debit) => {
            amount_minor
        }
        (LedgerTarget::Account(_), EntryType::Debit) | (LedgerTarget::Card(_), EntryType::Credit) => {
            -amount_minor
        }
    }
}

/// Balance deltas of a transfer: `(source delta, destination delta)`.
pub fn transfer_deltas(amount_minor: i64) -> (i64, i64) {
    (-amount_minor, amount_minor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_sign_convention() {
        let account = LedgerTarget::Account(Uuid::new_v4());
        assert_eq!(transaction_delta(account, EntryType::Credit, 1000), 1000);
        assert_eq!(transaction_delta(account, EntryType::Debit, 1000), -1000);
    }

    #[test]
    fn card_sign_convention() {
        let card = LedgerTarget::Card(Uuid::new_v4());
        assert_eq!(transaction_delta(card, EntryType::Debit, 2500), 2500);
        assert_eq!(transaction_delta(card, EntryType::Credit, 2500), -2500);
    }

    #[test]
    fn transfer_moves_from_source_to_destination() {
        assert_eq!(transfer_deltas(2000), (-2000, 2000));
    }

    #[test]
    fn from_pair_requires_exactly_one() {
        let id = Uuid::new_v4();
        assert_eq!(
            LedgerTarget::from_pair(Some(id), None).unwrap(),
            LedgerTarget::Account(id)
        );
        assert_eq!(
            LedgerTarget::from_pair(None, Some(id)).unwrap(),
            LedgerTarget::Card(id)
        );
        assert!(matches!(
            LedgerTarget::from_pair(Some(id), Some(Uuid::new_v4())),
            Err(EngineError::OperationNotAllowed(_))
        ));
        assert!(matches!(
            LedgerTarget::from_pair(None, None),
            Err(EngineError::OperationNotAllowed(_))
        ));
    }

    #[test]
    fn entry_type_parses_case_insensitively() {
        assert_eq!(EntryType::try_from("debit").unwrap(), EntryType::Debit);
        assert_eq!(EntryType::try_from("CREDIT").unwrap(), EntryType::Credit);
        assert!(EntryType::try_from("refund").is_err());
    }
}
