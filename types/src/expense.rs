use std::collections::BTreeMap;
use std::fmt;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::form::{self, FieldErrors};
use crate::listing::Searchable;

/// Tolerance when comparing a breakdown against its total.
const BALANCE_EPSILON: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Fuel,
    Toll,
    Tyre,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Fuel, Category::Toll, Category::Tyre, Category::Other];

    pub fn label(self) -> &'static str {
        match self {
            Category::Fuel => "Fuel",
            Category::Toll => "Toll",
            Category::Tyre => "Tyre",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakdown {
    pub fuel: f64,
    pub toll: f64,
    pub tyre: f64,
    pub other: f64,
}

impl Breakdown {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Fuel => self.fuel,
            Category::Toll => self.toll,
            Category::Tyre => self.tyre,
            Category::Other => self.other,
        }
    }

    pub fn sum(&self) -> f64 {
        self.fuel + self.toll + self.tyre + self.other
    }

    fn add(&mut self, other: &Breakdown) {
        self.fuel += other.fuel;
        self.toll += other.toll;
        self.tyre += other.tyre;
        self.other += other.other;
    }
}

/// Where an expense record lives. Remote ones are read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseSource {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub cab_number: String,
    pub total_amount: f64,
    pub breakdown: Breakdown,
    pub recorded_on: Option<Date>,
    pub source: ExpenseSource,
}

impl Expense {
    /// The breakdown is expected to add up to the total, but nothing enforces it.
    pub fn is_balanced(&self) -> bool {
        (self.breakdown.sum() - self.total_amount).abs() < BALANCE_EPSILON
    }

    pub fn is_editable(&self) -> bool {
        self.source == ExpenseSource::Local
    }

    /// `YYYY-MM` of the record date.
    pub fn month(&self) -> Option<String> {
        self.recorded_on
            .map(|d| format!("{:04}-{:02}", d.year(), d.month()))
    }
}

impl Searchable for Expense {
    fn matches(&self, needle: &str) -> bool {
        self.cab_number.to_lowercase().contains(needle)
    }
}

/// Backend records followed by local ones. A failed backend fetch still
/// yields the local records, with the failure in `remote_error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseList {
    pub expenses: Vec<Expense>,
    pub remote_error: Option<String>,
}

impl ExpenseList {
    pub fn merge(remote: Result<Vec<Expense>, String>, local: Vec<Expense>) -> Self {
        let (mut expenses, remote_error) = match remote {
            Ok(remote) => (remote, None),
            Err(error) => (Vec::new(), Some(error)),
        };
        expenses.extend(local);
        Self {
            expenses,
            remote_error,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExpenseDraft {
    #[validate(custom(function = "crate::form::required"))]
    pub cab_number: String,
    /// Blank means "sum of the breakdown".
    #[validate(custom(function = "crate::form::optional_amount"))]
    pub total_amount: String,
    #[validate(custom(function = "crate::form::optional_amount"))]
    pub fuel: String,
    #[validate(custom(function = "crate::form::optional_amount"))]
    pub toll: String,
    #[validate(custom(function = "crate::form::optional_amount"))]
    pub tyre: String,
    #[validate(custom(function = "crate::form::optional_amount"))]
    pub other: String,
    #[validate(custom(function = "crate::form::optional_date"))]
    pub recorded_on: String,
}

impl From<&Expense> for ExpenseDraft {
    fn from(expense: &Expense) -> Self {
        Self {
            cab_number: expense.cab_number.clone(),
            total_amount: expense.total_amount.to_string(),
            fuel: expense.breakdown.fuel.to_string(),
            toll: expense.breakdown.toll.to_string(),
            tyre: expense.breakdown.tyre.to_string(),
            other: expense.breakdown.other.to_string(),
            recorded_on: form::date_input(expense.recorded_on),
        }
    }
}

impl ExpenseDraft {
    pub fn build(&self, id: Uuid) -> Result<Expense, FieldErrors> {
        form::check(self)?;

        let breakdown = Breakdown {
            fuel: form::parse_amount("fuel", &self.fuel)?,
            toll: form::parse_amount("toll", &self.toll)?,
            tyre: form::parse_amount("tyre", &self.tyre)?,
            other: form::parse_amount("other", &self.other)?,
        };
        let total_amount = match self.total_amount.trim() {
            "" => breakdown.sum(),
            total => form::parse_amount("total_amount", total)?,
        };

        Ok(Expense {
            id: id.to_string(),
            cab_number: self.cab_number.trim().to_string(),
            total_amount,
            breakdown,
            recorded_on: form::parse_optional_date("recorded_on", &self.recorded_on)?,
            source: ExpenseSource::Local,
        })
    }
}

/// Aggregates over a list of expenses, as shown on the dashboard and in exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total: f64,
    pub record_count: usize,
    pub by_category: Breakdown,
    /// Highest spend first; ties by cab number.
    pub by_cab: Vec<(String, f64)>,
    /// Oldest month first. Undated records are left out.
    pub by_month: Vec<(String, f64)>,
    pub unbalanced: usize,
}

impl ExpenseSummary {
    pub fn from_expenses(expenses: &[Expense]) -> Self {
        let mut summary = Self {
            record_count: expenses.len(),
            ..Self::default()
        };
        let mut by_cab = BTreeMap::<&str, f64>::new();
        let mut by_month = BTreeMap::<String, f64>::new();

        for expense in expenses {
            summary.total += expense.total_amount;
            summary.by_category.add(&expense.breakdown);
            *by_cab.entry(expense.cab_number.as_str()).or_default() += expense.total_amount;
            if let Some(month) = expense.month() {
                *by_month.entry(month).or_default() += expense.total_amount;
            }
            if !expense.is_balanced() {
                summary.unbalanced += 1;
            }
        }

        summary.by_cab = by_cab
            .into_iter()
            .map(|(cab, amount)| (cab.to_string(), amount))
            .collect();
        summary
            .by_cab
            .sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        summary.by_month = by_month.into_iter().collect();
        summary
    }

    /// Share of the total spend, in percent. Zero when nothing was spent.
    /// Totals without a breakdown count toward no category.
    pub fn percentage(&self, category: Category) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        self.by_category.get(category) / self.total * 100.0
    }

    pub fn average_per_cab(&self) -> f64 {
        if self.by_cab.is_empty() {
            return 0.0;
        }
        self.total / self.by_cab.len() as f64
    }

    pub fn category_shares(&self) -> Vec<(Category, f64, f64)> {
        Category::ALL
            .into_iter()
            .map(|c| (c, self.by_category.get(c), self.percentage(c)))
            .collect()
    }
}

/// `1234.5` → `"1,234.50"`.
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{grouped}.{:02}", if negative { "-" } else { "" }, cents % 100)
}
