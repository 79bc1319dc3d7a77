//! Category registry
//!
//! Append-only store of budget categories. Ids come from a counter kept
//! next to the entries and are never reused.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::types::Category;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRegistry {
    next_id: u64,
    categories: Vec<Category>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next created category will receive
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Append a category with nothing spent, returning its id
    pub fn add(&mut self, name: String, budget: u64) -> u64 {
        let id = self.next_id;
        self.categories.push(Category {
            id,
            name,
            budget,
            spent: 0,
            created_at: Utc::now(),
        });
        self.next_id += 1;
        id
    }

    pub fn get(&self, id: u64) -> Option<&Category> {
        // Ids are dense and start at zero, so they double as indexes
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.categories.get(idx))
            .filter(|c| c.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Category> {
        usize::try_from(id)
            .ok()
            .and_then(move |idx| self.categories.get_mut(idx))
            .filter(|c| c.id == id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    /// Validate a reservation without mutating
    pub fn check_reserve(&self, id: u64, amount: u64) -> Result<()> {
        let category = self.get(id).ok_or(Error::CategoryNotFound(id))?;
        if !category.can_reserve(amount) {
            return Err(Error::BudgetExceeded {
                category_id: id,
                requested: amount,
                remaining: category.remaining(),
            });
        }
        Ok(())
    }

    /// Commit `amount` of the category's budget
    pub fn reserve_budget(&mut self, id: u64, amount: u64) -> Result<()> {
        self.check_reserve(id, amount)?;
        let category = self.get_mut(id).ok_or(Error::CategoryNotFound(id))?;
        category.spent += amount;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut registry = CategoryRegistry::new();

        assert_eq!(registry.add("Office Supplies".into(), 1_000_000), 0);
        assert_eq!(registry.add("Marketing".into(), 500_000), 1);
        assert_eq!(registry.next_id(), 2);
        assert_eq!(registry.get(1).unwrap().name, "Marketing");
        assert!(registry.get(2).is_none());
        assert!(registry.get(u64::MAX).is_none());
    }

    #[test]
    fn test_reserve_budget() {
        let mut registry = CategoryRegistry::new();
        let id = registry.add("Small Budget".into(), 400_000);

        registry.reserve_budget(id, 300_000).unwrap();
        assert_eq!(registry.get(id).unwrap().spent, 300_000);

        // Exactly the remaining budget is allowed
        registry.reserve_budget(id, 100_000).unwrap();
        assert_eq!(registry.get(id).unwrap().remaining(), 0);
    }

    #[test]
    fn test_reserve_over_budget_is_rejected() {
        let mut registry = CategoryRegistry::new();
        let id = registry.add("Small Budget".into(), 400_000);
        registry.reserve_budget(id, 300_000).unwrap();

        let err = registry.reserve_budget(id, 200_000).unwrap_err();
        assert!(matches!(
            err,
            Error::BudgetExceeded {
                category_id: 0,
                requested: 200_000,
                remaining: 100_000
            }
        ));
        assert_eq!(registry.get(id).unwrap().spent, 300_000);
    }

    #[test]
    fn test_reserve_unknown_category() {
        let mut registry = CategoryRegistry::new();
        assert!(matches!(
            registry.reserve_budget(7, 1),
            Err(Error::CategoryNotFound(7))
        ));
    }
}
