use {
    crate::error::FeeMarketError,
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::{borrow::Borrow, collections::HashMap, fmt},
};

/// Opaque account identifier (e.g. `"0xAlice"`).
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl From<String> for Address {
    fn from(address: String) -> Self {
        Self(address)
    }
}

// Lets `HashMap<Address, _>` be queried with a plain `&str`.
impl Borrow<str> for Address {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ledger account: balance in the native unit plus a replay-protection nonce.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Account {
    pub address: Address,
    /// Number of transactions executed from this account. Never decreases.
    pub nonce: u64,
    pub balance: u64,
}

impl Account {
    /// A fresh account with nonce 0.
    pub fn new(address: impl Into<Address>, balance: u64) -> Self {
        Self {
            address: address.into(),
            nonce: 0,
            balance,
        }
    }

    #[inline]
    pub fn can_pay(&self, amount: u128) -> bool {
        u128::from(self.balance) >= amount
    }

    /// Remove `amount` from the balance, or fail without touching it.
    pub fn debit(&mut self, amount: u128) -> Result<(), FeeMarketError> {
        let remaining = u64::try_from(amount)
            .ok()
            .and_then(|amount| self.balance.checked_sub(amount))
            .ok_or_else(|| FeeMarketError::InsufficientFunds {
                address: self.address.clone(),
                balance: self.balance,
                required: amount,
            })?;
        self.balance = remaining;
        Ok(())
    }

    pub fn credit(&mut self, amount: u64) -> Result<(), FeeMarketError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(FeeMarketError::Overflow)?;
        Ok(())
    }

    pub fn increment_nonce(&mut self) -> Result<(), FeeMarketError> {
        self.nonce = self.nonce.checked_add(1).ok_or(FeeMarketError::Overflow)?;
        Ok(())
    }
}

/// The system of record: every account known to the simulation, by address.
///
/// The executor takes `&mut LedgerState` and the validator `&LedgerState`, so
/// mutations are serialised by the borrow checker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    accounts: HashMap<Address, Account>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only lookup. Unknown addresses are NOT created.
    pub fn get_account(&self, address: &str) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Mutable lookup that inserts an empty account (balance 0, nonce 0) when
    /// `address` is unknown. Execution never fails on unknown addresses.
    pub fn get_account_mut(&mut self, address: &str) -> &mut Account {
        self.accounts
            .entry(Address::from(address))
            .or_insert_with(|| Account::new(address, 0))
    }

    /// Seed or overwrite an account, keyed by `account.address`.
    pub fn set_account(&mut self, account: Account) {
        self.accounts.insert(account.address.clone(), account);
    }

    /// Balance of `address`, 0 when unknown.
    pub fn balance(&self, address: &str) -> u64 {
        self.get_account(address).map_or(0, |account| account.balance)
    }

    /// Nonce of `address`, 0 when unknown.
    pub fn nonce(&self, address: &str) -> u64 {
        self.get_account(address).map_or(0, |account| account.nonce)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.accounts.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Sum of all tracked balances. Burning shows up as a drop in this value.
    pub fn total_supply(&self) -> u128 {
        self.accounts
            .values()
            .map(|account| u128::from(account.balance))
            .sum()
    }

    /// Remember the current state of `addresses` so that a failed execution
    /// can be undone with [`LedgerState::revert`].
    pub(crate) fn checkpoint<'a>(
        &self,
        addresses: impl IntoIterator<Item = &'a Address>,
    ) -> Checkpoint {
        Checkpoint(
            addresses
                .into_iter()
                .map(|address| (address.clone(), self.accounts.get(address).cloned()))
                .collect(),
        )
    }

    pub(crate) fn revert(&mut self, checkpoint: Checkpoint) {
        for (address, prior) in checkpoint.0 {
            match prior {
                Some(account) => {
                    self.accounts.insert(address, account);
                }
                None => {
                    self.accounts.remove(&address);
                }
            }
        }
    }
}

/// Prior account values captured before a transaction touches them.
#[derive(Debug)]
pub(crate) struct Checkpoint(Vec<(Address, Option<Account>)>);
