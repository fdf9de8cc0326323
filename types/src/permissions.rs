use std::fmt;

use serde::{Deserialize, Serialize};

/// A feature area a sub-admin can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    Dashboard,
    Cabs,
    Drivers,
    Expenses,
    Reports,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Dashboard,
        Feature::Cabs,
        Feature::Drivers,
        Feature::Expenses,
        Feature::Reports,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Feature::Dashboard => "Dashboard",
            Feature::Cabs => "Cab Management",
            Feature::Drivers => "Driver Management",
            Feature::Expenses => "Expense Tracking",
            Feature::Reports => "Reports & Export",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One flag per [`Feature`], serialized as `{"dashboard": true, "cabs": false, ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permissions {
    pub dashboard: bool,
    pub cabs: bool,
    pub drivers: bool,
    pub expenses: bool,
    pub reports: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            dashboard: true,
            ..Self::none()
        }
    }
}

impl Permissions {
    pub const fn none() -> Self {
        Self {
            dashboard: false,
            cabs: false,
            drivers: false,
            expenses: false,
            reports: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            dashboard: true,
            cabs: true,
            drivers: true,
            expenses: true,
            reports: true,
        }
    }

    fn slot(&mut self, feature: Feature) -> &mut bool {
        match feature {
            Feature::Dashboard => &mut self.dashboard,
            Feature::Cabs => &mut self.cabs,
            Feature::Drivers => &mut self.drivers,
            Feature::Expenses => &mut self.expenses,
            Feature::Reports => &mut self.reports,
        }
    }

    pub fn get(&self, feature: Feature) -> bool {
        match feature {
            Feature::Dashboard => self.dashboard,
            Feature::Cabs => self.cabs,
            Feature::Drivers => self.drivers,
            Feature::Expenses => self.expenses,
            Feature::Reports => self.reports,
        }
    }

    pub fn set(&mut self, feature: Feature, granted: bool) {
        *self.slot(feature) = granted;
    }

    /// Returns the full permission set with `feature` flipped.
    pub fn toggled(mut self, feature: Feature) -> Self {
        let slot = self.slot(feature);
        *slot = !*slot;
        self
    }

    pub fn granted(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| self.get(*f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grants_only_dashboard() {
        let permissions = Permissions::default();
        assert_eq!(permissions.granted().collect::<Vec<_>>(), vec![Feature::Dashboard]);
    }

    #[test]
    fn toggled_flips_a_single_feature() {
        let permissions = Permissions::default().toggled(Feature::Cabs);
        assert!(permissions.cabs);
        assert!(permissions.dashboard);
        assert!(!permissions.drivers);

        let permissions = permissions.toggled(Feature::Cabs);
        assert_eq!(permissions, Permissions::default());
    }

    #[test]
    fn serializes_as_flat_camel_case_map() {
        let mut permissions = Permissions::none();
        permissions.set(Feature::Expenses, true);

        let json = serde_json::to_value(permissions).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "dashboard": false,
                "cabs": false,
                "drivers": false,
                "expenses": true,
                "reports": false,
            })
        );
    }

    #[test]
    fn missing_keys_deserialize_as_defaults() {
        let permissions: Permissions = serde_json::from_str(r#"{"cabs": true}"#).unwrap();
        assert!(permissions.cabs);
        assert!(permissions.dashboard);
        assert!(!permissions.reports);
    }
}
