//! Treasury balance bookkeeping

use crate::error::{Error, Result};

use super::types::Treasury;

impl Treasury {
    /// Compute the balance after crediting `amount`, without mutating
    pub fn check_credit(&self, amount: u64) -> Result<u64> {
        self.balance
            .checked_add(amount)
            .ok_or(Error::AmountOverflow {
                current: self.balance,
                added: amount,
            })
    }

    /// Credit incoming funds, returning the new balance
    pub fn credit(&mut self, amount: u64) -> Result<u64> {
        self.balance = self.check_credit(amount)?;
        Ok(self.balance)
    }

    /// Validate a payment debit without mutating
    pub fn check_debit(&self, amount: u64) -> Result<()> {
        if amount > self.balance {
            return Err(Error::InsufficientFunds {
                available: self.balance,
                required: amount,
            });
        }
        self.total_paid
            .checked_add(amount)
            .ok_or(Error::AmountOverflow {
                current: self.total_paid,
                added: amount,
            })?;
        Ok(())
    }

    /// Debit a payment, returning the new balance
    pub fn debit_for_payment(&mut self, amount: u64) -> Result<u64> {
        self.check_debit(amount)?;
        self.balance -= amount;
        self.total_paid += amount;
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_debit() {
        let mut treasury = Treasury::default();

        assert_eq!(treasury.credit(2_000_000).unwrap(), 2_000_000);
        assert_eq!(treasury.debit_for_payment(500_000).unwrap(), 1_500_000);
        assert_eq!(treasury.total_paid, 500_000);
    }

    #[test]
    fn test_debit_insufficient_funds_leaves_state() {
        let mut treasury = Treasury {
            balance: 100,
            total_paid: 0,
        };

        let err = treasury.debit_for_payment(101).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientFunds {
                available: 100,
                required: 101
            }
        ));
        assert_eq!(treasury.balance, 100);
        assert_eq!(treasury.total_paid, 0);
    }

    #[test]
    fn test_credit_overflow() {
        let mut treasury = Treasury {
            balance: u64::MAX,
            total_paid: 0,
        };
        assert!(matches!(
            treasury.credit(1),
            Err(Error::AmountOverflow { .. })
        ));
        assert_eq!(treasury.balance, u64::MAX);
    }
}
