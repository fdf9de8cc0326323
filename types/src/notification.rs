use std::collections::BTreeSet;
use std::time::Duration;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::{Cab, CabStatus, InviteStatus, SubAdmin};

/// How often the layout asks the server for fresh notifications.
pub const NOTIFICATION_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Cabs are flagged this many days ahead of their next service.
pub const SERVICE_WARNING_DAYS: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Info,
}

impl Severity {
    pub fn class(self) -> &'static str {
        match self {
            Severity::Warning => "notification-warning",
            Severity::Info => "notification-info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Stable across polls for the same condition.
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

/// Notifications implied by the current fleet state, warnings first.
pub fn derive_notifications(cabs: &[Cab], sub_admins: &[SubAdmin], today: Date) -> Vec<Notification> {
    let mut out = Vec::new();

    for cab in cabs {
        if cab.status == CabStatus::NeedsRepair {
            out.push(Notification {
                id: format!("cab-repair-{}", cab.id),
                severity: Severity::Warning,
                title: format!("{} needs repair", cab.cab_number),
                message: format!("{} is marked as needing repair.", cab.model),
            });
        }

        match cab.days_until_service(today) {
            Some(days) if days < 0 => out.push(Notification {
                id: format!("cab-service-{}-{}", cab.id, today),
                severity: Severity::Warning,
                title: format!("{} service overdue", cab.cab_number),
                message: format!("Service was due {} day(s) ago.", -days),
            }),
            Some(days) if days <= SERVICE_WARNING_DAYS => out.push(Notification {
                id: format!("cab-service-{}-{}", cab.id, today),
                severity: Severity::Info,
                title: format!("{} service due", cab.cab_number),
                message: match days {
                    0 => "Service is due today.".to_string(),
                    days => format!("Service is due in {days} day(s)."),
                },
            }),
            _ => {}
        }
    }

    for sub in sub_admins.iter().filter(|s| s.invite == InviteStatus::Pending) {
        out.push(Notification {
            id: format!("invite-pending-{}", sub.id),
            severity: Severity::Info,
            title: "Invite pending".to_string(),
            message: format!("{} <{}> has not received an invite yet.", sub.name, sub.email),
        });
    }

    out.sort_by_key(|n| n.severity);
    out
}

/// Client-side view of the feed: what was dismissed stays hidden for the
/// rest of the page session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFeed {
    current: Vec<Notification>,
    dismissed: BTreeSet<String>,
}

impl NotificationFeed {
    pub fn replace(&mut self, notifications: Vec<Notification>) {
        self.current = notifications;
    }

    pub fn dismiss(&mut self, id: &str) {
        self.dismissed.insert(id.to_string());
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.current
            .iter()
            .filter(|n| !self.dismissed.contains(&n.id))
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use uuid::Uuid;

    use super::*;
    use crate::{Permissions, SubAdminStatus};

    fn cab(n: u128, status: CabStatus, next_service: Option<Date>) -> Cab {
        Cab {
            id: Uuid::from_u128(n),
            cab_number: format!("CAB-{n}"),
            model: "Etios".into(),
            driver_name: None,
            last_service: None,
            next_service,
            odometer_km: 0,
            status,
        }
    }

    fn sub(invite: InviteStatus) -> SubAdmin {
        SubAdmin {
            id: Uuid::from_u128(99),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            role: "Dispatcher".into(),
            status: SubAdminStatus::Active,
            permissions: Permissions::default(),
            invite,
        }
    }

    #[test]
    fn repairs_and_overdue_services_are_warnings_first() {
        let today = date(2024, 6, 10);
        let notifications = derive_notifications(
            &[
                cab(1, CabStatus::Active, Some(date(2024, 6, 12))),
                cab(2, CabStatus::NeedsRepair, None),
                cab(3, CabStatus::Active, Some(date(2024, 6, 1))),
                cab(4, CabStatus::Active, Some(date(2024, 9, 1))),
            ],
            &[sub(InviteStatus::Pending)],
            today,
        );

        let titles: Vec<_> = notifications.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "CAB-2 needs repair",
                "CAB-3 service overdue",
                "CAB-1 service due",
                "Invite pending",
            ]
        );
        assert_eq!(notifications[2].message, "Service is due in 2 day(s).");
    }

    #[test]
    fn successful_invites_are_quiet() {
        assert!(derive_notifications(&[], &[sub(InviteStatus::Success)], date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn ids_are_stable_between_polls() {
        let cabs = [cab(2, CabStatus::NeedsRepair, None)];
        let first = derive_notifications(&cabs, &[], date(2024, 1, 1));
        let second = derive_notifications(&cabs, &[], date(2024, 1, 1));
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn dismissed_notifications_stay_hidden_after_refresh() {
        let cabs = [cab(2, CabStatus::NeedsRepair, None)];
        let mut feed = NotificationFeed::default();
        feed.replace(derive_notifications(&cabs, &[sub(InviteStatus::Pending)], date(2024, 1, 1)));
        assert_eq!(feed.visible().count(), 2);

        feed.dismiss(&format!("cab-repair-{}", Uuid::from_u128(2)));
        feed.replace(derive_notifications(&cabs, &[sub(InviteStatus::Pending)], date(2024, 1, 1)));
        let visible: Vec<_> = feed.visible().map(|n| n.title.as_str()).collect();
        assert_eq!(visible, vec!["Invite pending"]);
    }
}
