//! Account classification into KPI categories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// KPI bucket an account belongs to. `OperatingExpense` is the residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountCategory {
    Income,
    CostOfGoods,
    DriverCost,
    OtherIncome,
    OperatingExpense,
}

impl AccountCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::CostOfGoods => "cost_of_goods",
            Self::DriverCost => "driver_cost",
            Self::OtherIncome => "other_income",
            Self::OperatingExpense => "operating_expense",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryConfigError {
    #[error("Account category '{0}' has no accounts")]
    Empty(&'static str),

    #[error("Account '{account}' is listed under both '{first}' and '{second}'")]
    Overlap {
        account: String,
        first: &'static str,
        second: &'static str,
    },
}

/// Account-name lists per category. Names match verbatim after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountCategories {
    pub income: BTreeSet<String>,
    pub cost_of_goods: String,
    pub driver_costs: BTreeSet<String>,
    pub other_income: BTreeSet<String>,
}

const DEFAULT_INCOME: &[&str] = &[
    "Clubhouse Sales",
    "Clubhouse Sales: Value in Kind",
    "Club Membership Revenue",
    "Sponsorship Revenue",
    "Events Revenue (internal)",
    "Facilities Revenue",
    "Sports Programs Revenue",
    "Visitor Sales",
];

const DEFAULT_COST_OF_GOODS: &str = "Cost of Clubhouse Sales";

const DEFAULT_DRIVER_COSTS: &[&str] = &[
    "Direct Other Cost of Clubhouse Sales",
    "Direct Other Cost of Clubhouse: Wastage",
    "Direct Other Cost of Clubhouse: Consumables",
    "Direct Other Cost of Clubhouse: Events",
    "Direct Other Cost of Sports Programs",
    "Direct Other Cost of Facilities",
    "Direct Other Cost of Sports Events",
    "Direct Other Cost of Membership",
    "Direct Other Cost of Membership: Sports",
    "Direct Other Cost of Membership: Discounts",
    "Reception Variance",
    "Direct Other Cost of Sponsorship",
    "Direct Other Cost of Events (internal)",
    "Bank Card Fees",
];

const DEFAULT_OTHER_INCOME: &[&str] = &[
    "Ad Hoc Revenue",
    "Bank Interest Received",
    "Discount Received",
    "Kit Sales",
    "Cost of Kit Sales",
    "Rental Income",
    "Value in Kind Benefit",
];

fn to_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl Default for AccountCategories {
    fn default() -> Self {
        Self {
            income: to_set(DEFAULT_INCOME),
            cost_of_goods: DEFAULT_COST_OF_GOODS.to_string(),
            driver_costs: to_set(DEFAULT_DRIVER_COSTS),
            other_income: to_set(DEFAULT_OTHER_INCOME),
        }
    }
}

impl AccountCategories {
    /// Loads lists from a YAML, JSON or TOML file (format taken from the
    /// extension). Surrounding whitespace in names is dropped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let categories: AccountCategories = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        Ok(categories.trimmed())
    }

    fn trimmed(self) -> Self {
        let trim_all = |set: BTreeSet<String>| -> BTreeSet<String> {
            set.into_iter().map(|n| n.trim().to_string()).collect()
        };
        Self {
            income: trim_all(self.income),
            cost_of_goods: self.cost_of_goods.trim().to_string(),
            driver_costs: trim_all(self.driver_costs),
            other_income: trim_all(self.other_income),
        }
    }

    /// Checks that every list is non-empty and no account is in two lists.
    pub fn validate(&self) -> Result<(), CategoryConfigError> {
        let cost_of_goods: BTreeSet<String> = if self.cost_of_goods.is_empty() {
            BTreeSet::new()
        } else {
            BTreeSet::from([self.cost_of_goods.clone()])
        };

        let lists = [
            (AccountCategory::Income.as_str(), &self.income),
            (AccountCategory::CostOfGoods.as_str(), &cost_of_goods),
            (AccountCategory::DriverCost.as_str(), &self.driver_costs),
            (AccountCategory::OtherIncome.as_str(), &self.other_income),
        ];

        for (name, list) in lists {
            if list.iter().all(|account| account.is_empty()) {
                return Err(CategoryConfigError::Empty(name));
            }
        }

        for (i, &(first, a)) in lists.iter().enumerate() {
            for &(second, b) in &lists[i + 1..] {
                if let Some(account) = a.intersection(b).next() {
                    return Err(CategoryConfigError::Overlap {
                        account: account.clone(),
                        first,
                        second,
                    });
                }
            }
        }

        Ok(())
    }

    /// Classifies an account, checking Income, CostOfGoods, DriverCost and
    /// OtherIncome in that order.
    pub fn classify(&self, account: &str) -> AccountCategory {
        let account = account.trim();
        if self.income.contains(account) {
            AccountCategory::Income
        } else if self.cost_of_goods == account {
            AccountCategory::CostOfGoods
        } else if self.driver_costs.contains(account) {
            AccountCategory::DriverCost
        } else if self.other_income.contains(account) {
            AccountCategory::OtherIncome
        } else {
            AccountCategory::OperatingExpense
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn shipped_lists_are_pairwise_disjoint_and_non_empty() {
        let categories = AccountCategories::default();
        assert_eq!(categories.validate(), Ok(()));
        assert_eq!(categories.income.len(), DEFAULT_INCOME.len());
        assert_eq!(categories.driver_costs.len(), DEFAULT_DRIVER_COSTS.len());
        assert_eq!(categories.other_income.len(), DEFAULT_OTHER_INCOME.len());
    }

    #[test]
    fn classification_is_exact_after_trimming() {
        let categories = AccountCategories::default();

        assert_eq!(categories.classify("Clubhouse Sales"), AccountCategory::Income);
        assert_eq!(
            categories.classify("  Cost of Clubhouse Sales "),
            AccountCategory::CostOfGoods
        );
        assert_eq!(categories.classify("Bank Card Fees"), AccountCategory::DriverCost);
        assert_eq!(categories.classify("Kit Sales"), AccountCategory::OtherIncome);
        assert_eq!(categories.classify("Rent"), AccountCategory::OperatingExpense);
        // Case and punctuation must match verbatim.
        assert_eq!(
            categories.classify("clubhouse sales"),
            AccountCategory::OperatingExpense
        );
        assert_eq!(
            categories.classify("Events Revenue internal"),
            AccountCategory::OperatingExpense
        );
        assert_eq!(categories.classify(""), AccountCategory::OperatingExpense);
    }

    #[test]
    fn precedence_favours_earlier_lists() {
        let mut categories = AccountCategories::default();
        categories.other_income.insert("Clubhouse Sales".to_string());

        assert_eq!(categories.classify("Clubhouse Sales"), AccountCategory::Income);
        assert_eq!(
            categories.validate(),
            Err(CategoryConfigError::Overlap {
                account: "Clubhouse Sales".to_string(),
                first: "income",
                second: "other_income",
            })
        );
    }

    #[test]
    fn empty_lists_fail_validation() {
        let mut categories = AccountCategories::default();
        categories.driver_costs.clear();
        assert_eq!(
            categories.validate(),
            Err(CategoryConfigError::Empty("driver_cost"))
        );

        let mut categories = AccountCategories::default();
        categories.cost_of_goods.clear();
        assert_eq!(
            categories.validate(),
            Err(CategoryConfigError::Empty("cost_of_goods"))
        );
    }

    #[test]
    fn lists_load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "income:\n  - Ticket Sales\n  - \" Bar Sales \"\ncost_of_goods: Cost of Bar Sales\n\
             driver_costs:\n  - Card Fees\nother_income:\n  - Interest"
        )
        .unwrap();

        let categories = AccountCategories::from_file(file.path()).unwrap();

        assert!(categories.income.contains("Bar Sales"));
        assert_eq!(categories.cost_of_goods, "Cost of Bar Sales");
        assert_eq!(categories.classify("Card Fees"), AccountCategory::DriverCost);
        assert_eq!(categories.validate(), Ok(()));
    }
}
