use serde::Serialize;

use super::domain::{Permission, Role};

/// Sidebar destinations, filtered through the static permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavItem {
    Dashboard,
    MyEvaluations,
    TeamReviews,
    HrReviews,
    DirectorReviews,
    Reports,
    Users,
    Teams,
    Periods,
    Settings,
}

impl NavItem {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Dashboard,
            Self::MyEvaluations,
            Self::TeamReviews,
            Self::HrReviews,
            Self::DirectorReviews,
            Self::Reports,
            Self::Users,
            Self::Teams,
            Self::Periods,
            Self::Settings,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::MyEvaluations => "My Evaluations",
            Self::TeamReviews => "Team Reviews",
            Self::HrReviews => "HR Reviews",
            Self::DirectorReviews => "Director Reviews",
            Self::Reports => "Reports",
            Self::Users => "Users",
            Self::Teams => "Teams",
            Self::Periods => "Evaluation Periods",
            Self::Settings => "Settings",
        }
    }

    /// `None` means the item is open to every signed-in actor.
    pub const fn required_permission(self) -> Option<Permission> {
        match self {
            Self::Dashboard => None,
            Self::MyEvaluations => Some(Permission::SubmitSelfEvaluation),
            Self::TeamReviews => Some(Permission::ReviewAsLead),
            Self::HrReviews => Some(Permission::ReviewAsHr),
            Self::DirectorReviews => Some(Permission::ReviewAsDirector),
            Self::Reports => Some(Permission::ViewReports),
            Self::Users => Some(Permission::ManageUsers),
            Self::Teams => Some(Permission::ManageTeams),
            Self::Periods => Some(Permission::ManagePeriods),
            Self::Settings => Some(Permission::ManageSettings),
        }
    }
}

pub fn navigation_for(role: Option<Role>) -> Vec<NavItem> {
    NavItem::ordered()
        .into_iter()
        .filter(|item| match (item.required_permission(), role) {
            (None, _) => true,
            (Some(permission), Some(role)) => role.has_permission(permission),
            (Some(_), None) => false,
        })
        .collect()
}
