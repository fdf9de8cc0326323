use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::form::{self, FieldErrors};
use crate::listing::Searchable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub license_number: String,
    pub assigned_cab: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub national_id: String,
    pub joined_on: Date,
    pub left_on: Option<Date>,
}

impl Driver {
    pub fn is_employed(&self, today: Date) -> bool {
        self.left_on.is_none_or(|left| left > today)
    }
}

impl Searchable for Driver {
    fn matches(&self, needle: &str) -> bool {
        [
            self.name.as_str(),
            self.license_number.as_str(),
            self.assigned_cab.as_deref().unwrap_or_default(),
            self.phone.as_str(),
            self.email.as_deref().unwrap_or_default(),
        ]
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct DriverDraft {
    #[validate(custom(function = "crate::form::required"))]
    pub name: String,
    #[validate(custom(function = "crate::form::required"))]
    pub license_number: String,
    pub assigned_cab: String,
    #[validate(custom(function = "crate::form::required"))]
    pub phone: String,
    #[validate(custom(function = "crate::form::optional_email"))]
    pub email: String,
    pub address: String,
    #[validate(custom(function = "crate::form::required"))]
    pub national_id: String,
    #[validate(custom(function = "crate::form::date"))]
    pub joined_on: String,
    #[validate(custom(function = "crate::form::optional_date"))]
    pub left_on: String,
}

impl From<&Driver> for DriverDraft {
    fn from(driver: &Driver) -> Self {
        Self {
            name: driver.name.clone(),
            license_number: driver.license_number.clone(),
            assigned_cab: driver.assigned_cab.clone().unwrap_or_default(),
            phone: driver.phone.clone(),
            email: driver.email.clone().unwrap_or_default(),
            address: driver.address.clone(),
            national_id: driver.national_id.clone(),
            joined_on: driver.joined_on.to_string(),
            left_on: form::date_input(driver.left_on),
        }
    }
}

impl DriverDraft {
    pub fn build(&self, id: Uuid) -> Result<Driver, FieldErrors> {
        form::check(self)?;

        let joined_on = form::parse_date("joined_on", &self.joined_on)?;
        let left_on = form::parse_optional_date("left_on", &self.left_on)?;
        if left_on.is_some_and(|left| left < joined_on) {
            return Err(FieldErrors::single("left_on", "Cannot leave before joining"));
        }

        Ok(Driver {
            id,
            name: self.name.trim().to_string(),
            license_number: self.license_number.trim().to_uppercase(),
            assigned_cab: form::optional_text(&self.assigned_cab),
            phone: self.phone.trim().to_string(),
            email: form::optional_text(&self.email),
            address: self.address.trim().to_string(),
            national_id: self.national_id.trim().to_string(),
            joined_on,
            left_on,
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn draft() -> DriverDraft {
        DriverDraft {
            name: "Ravi Kumar".into(),
            license_number: "dl-0420110012345".into(),
            assigned_cab: "KA-01-7781".into(),
            phone: "+91 98450 00000".into(),
            email: "".into(),
            address: "12 MG Road".into(),
            national_id: "XXXX-1234".into(),
            joined_on: "2022-06-01".into(),
            left_on: "".into(),
        }
    }

    #[test]
    fn build_normalizes_license_and_optional_fields() {
        let driver = draft().build(Uuid::nil()).unwrap();
        assert_eq!(driver.license_number, "DL-0420110012345");
        assert_eq!(driver.email, None);
        assert_eq!(driver.left_on, None);
        assert_eq!(driver.assigned_cab.as_deref(), Some("KA-01-7781"));
    }

    #[test]
    fn email_is_optional_but_checked_when_present() {
        let errors = DriverDraft {
            email: "not-an-email".into(),
            ..draft()
        }
        .build(Uuid::nil())
        .unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));

        let driver = DriverDraft {
            email: "ravi@example.com".into(),
            ..draft()
        }
        .build(Uuid::nil())
        .unwrap();
        assert_eq!(driver.email.as_deref(), Some("ravi@example.com"));
    }

    #[test]
    fn joining_date_is_required() {
        let errors = DriverDraft {
            joined_on: "".into(),
            ..draft()
        }
        .build(Uuid::nil())
        .unwrap_err();
        assert_eq!(errors.get("joined_on"), Some("This field is required"));
    }

    #[test]
    fn employment_ends_on_leaving_date() {
        let driver = DriverDraft {
            left_on: "2024-03-31".into(),
            ..draft()
        }
        .build(Uuid::nil())
        .unwrap();
        assert!(driver.is_employed(date(2024, 3, 30)));
        assert!(!driver.is_employed(date(2024, 3, 31)));

        let errors = DriverDraft {
            left_on: "2021-01-01".into(),
            ..draft()
        }
        .build(Uuid::nil())
        .unwrap_err();
        assert!(errors.get("left_on").is_some());
    }
}
