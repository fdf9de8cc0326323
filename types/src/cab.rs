use std::fmt;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::form::{self, FieldErrors};
use crate::listing::Searchable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CabStatus {
    Active,
    #[serde(rename = "In Service")]
    InService,
    #[serde(rename = "Needs Repair")]
    NeedsRepair,
}

impl CabStatus {
    pub const ALL: [CabStatus; 3] = [CabStatus::Active, CabStatus::InService, CabStatus::NeedsRepair];

    pub fn as_str(self) -> &'static str {
        match self {
            CabStatus::Active => "Active",
            CabStatus::InService => "In Service",
            CabStatus::NeedsRepair => "Needs Repair",
        }
    }

    /// CSS modifier for the status badge.
    pub fn badge(self) -> &'static str {
        match self {
            CabStatus::Active => "badge-success",
            CabStatus::InService => "badge-info",
            CabStatus::NeedsRepair => "badge-danger",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for CabStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cab {
    pub id: Uuid,
    pub cab_number: String,
    pub model: String,
    pub driver_name: Option<String>,
    pub last_service: Option<Date>,
    pub next_service: Option<Date>,
    pub odometer_km: u32,
    pub status: CabStatus,
}

impl Cab {
    /// Days until the next service; negative when overdue.
    pub fn days_until_service(&self, today: Date) -> Option<i32> {
        let next = self.next_service?;
        Some((next - today).get_days())
    }

    pub fn service_due_within(&self, today: Date, days: i32) -> bool {
        self.days_until_service(today).is_some_and(|d| d <= days)
    }
}

impl Searchable for Cab {
    fn matches(&self, needle: &str) -> bool {
        [
            self.cab_number.as_str(),
            self.model.as_str(),
            self.driver_name.as_deref().unwrap_or_default(),
            self.status.as_str(),
        ]
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CabDraft {
    #[validate(custom(function = "crate::form::required"))]
    pub cab_number: String,
    #[validate(custom(function = "crate::form::required"))]
    pub model: String,
    pub driver_name: String,
    #[validate(custom(function = "crate::form::optional_date"))]
    pub last_service: String,
    #[validate(custom(function = "crate::form::optional_date"))]
    pub next_service: String,
    #[validate(custom(function = "crate::form::amount"))]
    pub odometer_km: String,
    pub status: CabStatus,
}

impl Default for CabDraft {
    fn default() -> Self {
        Self {
            cab_number: String::new(),
            model: String::new(),
            driver_name: String::new(),
            last_service: String::new(),
            next_service: String::new(),
            odometer_km: "0".into(),
            status: CabStatus::Active,
        }
    }
}

impl From<&Cab> for CabDraft {
    fn from(cab: &Cab) -> Self {
        Self {
            cab_number: cab.cab_number.clone(),
            model: cab.model.clone(),
            driver_name: cab.driver_name.clone().unwrap_or_default(),
            last_service: form::date_input(cab.last_service),
            next_service: form::date_input(cab.next_service),
            odometer_km: cab.odometer_km.to_string(),
            status: cab.status,
        }
    }
}

impl CabDraft {
    pub fn build(&self, id: Uuid) -> Result<Cab, FieldErrors> {
        form::check(self)?;

        let last_service = form::parse_optional_date("last_service", &self.last_service)?;
        let next_service = form::parse_optional_date("next_service", &self.next_service)?;
        if let (Some(last), Some(next)) = (last_service, next_service)
            && next < last
        {
            return Err(FieldErrors::single(
                "next_service",
                "Next service cannot be before the last one",
            ));
        }

        let odometer_km = self
            .odometer_km
            .trim()
            .parse::<u32>()
            .map_err(|_| FieldErrors::single("odometer_km", "Enter a whole number of kilometres"))?;

        Ok(Cab {
            id,
            cab_number: self.cab_number.trim().to_string(),
            model: self.model.trim().to_string(),
            driver_name: form::optional_text(&self.driver_name),
            last_service,
            next_service,
            odometer_km,
            status: self.status,
        })
    }
}
