//! Plan entitlements.
//!
//! One table decides which tools a plan may open and how many projects and
//! monthly exports it allows. Pro has no numeric limits.

use serde::Serialize;

use crate::session::ToolId;
use crate::store::Plan;

/// Projects a free account may own at once.
pub const FREE_PROJECT_LIMIT: u32 = 3;

/// Exports a free account may perform per month.
pub const FREE_EXPORT_LIMIT: u32 = 20;

/// Tools available on the free plan.
const FREE_TOOLS: [ToolId; 4] = [ToolId::Resize, ToolId::Crop, ToolId::Adjust, ToolId::Text];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanAccess {
    plan: Plan,
}

/// Serializable summary for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub plan: Plan,
    pub is_pro: bool,
    pub restricted_tools: Vec<ToolId>,
    pub project_limit: Option<u32>,
    pub export_limit: Option<u32>,
}

impl PlanAccess {
    pub fn new(plan: Plan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    pub fn is_pro(&self) -> bool {
        self.plan == Plan::Pro
    }

    pub fn has_access(&self, tool: ToolId) -> bool {
        self.is_pro() || FREE_TOOLS.contains(&tool)
    }

    pub fn restricted_tools(&self) -> Vec<ToolId> {
        ToolId::ALL
            .into_iter()
            .filter(|t| !self.has_access(*t))
            .collect()
    }

    pub fn can_create_project(&self, current_projects: u32) -> bool {
        self.is_pro() || current_projects < FREE_PROJECT_LIMIT
    }

    pub fn can_export(&self, exports_this_month: u32) -> bool {
        self.is_pro() || exports_this_month < FREE_EXPORT_LIMIT
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            plan: self.plan,
            is_pro: self.is_pro(),
            restricted_tools: self.restricted_tools(),
            project_limit: (!self.is_pro()).then_some(FREE_PROJECT_LIMIT),
            export_limit: (!self.is_pro()).then_some(FREE_EXPORT_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_free_restrictions() {
        let free = PlanAccess::new(Plan::Free);
        assert!(free.has_access(ToolId::Crop));
        assert!(!free.has_access(ToolId::Background));
        assert_eq!(
            free.restricted_tools(),
            vec![ToolId::Background, ToolId::AiExtender, ToolId::AiEdit]
        );
    }

    #[test]
    fn test_pro_has_everything() {
        let pro = PlanAccess::new(Plan::Pro);
        assert!(ToolId::ALL.iter().all(|t| pro.has_access(*t)));
        assert!(pro.restricted_tools().is_empty());
        assert!(pro.can_create_project(1000));
        assert!(pro.can_export(1000));
    }

    #[test]
    fn test_free_limits() {
        let free = PlanAccess::new(Plan::Free);
        assert!(free.can_create_project(2));
        assert!(!free.can_create_project(3));
        assert!(free.can_export(19));
        assert!(!free.can_export(20));
    }
}
