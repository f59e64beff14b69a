use std::collections::BTreeMap;

use apg_common::Money;
use regex::Regex;

use super::IpnError;

/// One sub-transaction embedded in a payment notification. Split payments carry one entry per receiver.
#[derive(Debug, Clone, Default)]
pub struct IpnTransaction {
    pub id: Option<String>,
    pub receiver: Option<String>,
    pub amount: Option<Money>,
    pub status: Option<String>,
    pub is_primary_receiver: bool,
}

/// The ordered sub-transactions of a payment notification, grouped from the flat `transaction[N].field` key
/// convention of the wire format.
#[derive(Debug, Clone, Default)]
pub struct TransactionList {
    transactions: Vec<IpnTransaction>,
}

impl TransactionList {
    /// Groups `transaction[N].*` pairs by index. Indexes need not be contiguous; ordering follows the index, not the
    /// position in the body.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, IpnError> {
        let key_re = Regex::new(r"^transaction\[(\d+)\]\.(.+)$").expect("valid regex");
        let mut grouped: BTreeMap<u32, IpnTransaction> = BTreeMap::new();
        for (key, value) in pairs {
            let Some(caps) = key_re.captures(key) else {
                continue;
            };
            let index: u32 = caps[1]
                .parse()
                .map_err(|_| IpnError::InvalidField { field: "transaction index".into(), value: key.clone() })?;
            let entry = grouped.entry(index).or_default();
            match &caps[2] {
                "id" => entry.id = Some(value.clone()),
                "receiver" => entry.receiver = Some(value.clone()),
                "status" => entry.status = Some(value.clone()),
                "is_primary_receiver" => entry.is_primary_receiver = value.eq_ignore_ascii_case("true"),
                "amount" => {
                    let amount = value
                        .parse::<Money>()
                        .map_err(|_| IpnError::InvalidField { field: "transaction amount".into(), value: value.clone() })?;
                    entry.amount = Some(amount);
                },
                // the wire format carries more per-transaction fields than reconciliation needs
                _ => {},
            }
        }
        Ok(Self { transactions: grouped.into_values().collect() })
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpnTransaction> {
        self.transactions.iter()
    }

    /// Sum of all entry amounts, which must share one currency. A notification without any amount at all cannot be
    /// cross-checked and is an error, not a zero.
    pub fn total_money(&self) -> Result<Money, IpnError> {
        let mut total: Option<Money> = None;
        for tx in &self.transactions {
            let Some(amount) = &tx.amount else {
                continue;
            };
            total = Some(match total {
                None => amount.clone(),
                Some(t) => {
                    t.checked_add(amount).map_err(|e| IpnError::InvalidField {
                        field: "transaction amounts".into(),
                        value: e.to_string(),
                    })?
                },
            });
        }
        total.ok_or(IpnError::NoTransactionAmounts)
    }
}
