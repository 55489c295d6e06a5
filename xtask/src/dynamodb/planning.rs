//! Pure functions for calculating deployment plans (Functional Core).

use super::config::{GsiConfig, TableConfig};

/// Represents the current state of a table.
#[derive(Debug, Clone)]
pub struct TableState {
    pub status: Status,
    pub gsis: Vec<GsiState>,
}

impl TableState {
    /// Whether the table and every index can serve traffic.
    pub fn is_ready(&self) -> bool {
        self.status == Status::Active && self.gsis.iter().all(|g| g.status == Status::Active)
    }
}

/// Lifecycle status shared by tables and indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Creating,
    Updating,
    Deleting,
}

#[derive(Debug, Clone)]
pub struct GsiState {
    pub name: String,
    pub status: Status,
}

/// Planned changes for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { config: TableConfig },
    /// Table exists, GSIs need to be added.
    AddGsis {
        table_name: String,
        gsis_to_add: Vec<GsiConfig>,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    DeleteTable { table_name: String },
    AlreadyGone { table_name: String },
}

/// Calculate what changes are needed to reach the desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            config: desired.clone(),
        };
    };

    let gsis_to_add: Vec<GsiConfig> = desired
        .gsis
        .iter()
        .filter(|gsi| !state.gsis.iter().any(|g| g.name == gsi.name))
        .cloned()
        .collect();

    if gsis_to_add.is_empty() {
        DeployPlan::NoChanges {
            table_name: desired.table_name.clone(),
        }
    } else {
        DeployPlan::AddGsis {
            table_name: desired.table_name.clone(),
            gsis_to_add,
        }
    }
}

pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    let table_name = table_name.to_string();
    match current {
        Some(_) => DestroyPlan::DeleteTable { table_name },
        None => DestroyPlan::AlreadyGone { table_name },
    }
}

/// Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => {
            let mut lines = vec![
                format!("+ Create table: {}", config.table_name),
                format!("  Partition key: {} (S)", config.partition_key.name),
            ];
            if let Some(sk) = &config.sort_key {
                lines.push(format!("  Sort key: {} (S)", sk.name));
            }
            for gsi in &config.gsis {
                lines.extend(format_gsi(gsi, "  + GSI"));
            }
            if let Some(ttl) = &config.ttl_attribute {
                lines.push(format!("  TTL attribute: {}", ttl));
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::AddGsis {
            table_name,
            gsis_to_add,
        } => {
            let mut lines = vec![format!("~ Update table: {}", table_name)];
            for gsi in gsis_to_add {
                lines.extend(format_gsi(gsi, "  + Add GSI"));
            }
            lines
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{}' is up to date", table_name)]
        }
    }
}

fn format_gsi(gsi: &GsiConfig, label: &str) -> Vec<String> {
    let mut lines = vec![
        format!("{}: {}", label, gsi.name),
        format!("    Partition key: {} (S)", gsi.partition_key.name),
    ];
    if let Some(sk) = &gsi.sort_key {
        lines.push(format!("    Sort key: {} (S)", sk.name));
    }
    lines
}

pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!(
                "- Delete table: {} (ALL DATA WILL BE LOST)",
                table_name
            )]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{}' does not exist", table_name)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::config::localeyes_table_config;
    use super::*;

    fn state(gsis: &[&str]) -> TableState {
        TableState {
            status: Status::Active,
            gsis: gsis
                .iter()
                .map(|name| GsiState {
                    name: name.to_string(),
                    status: Status::Active,
                })
                .collect(),
        }
    }

    #[test]
    fn missing_table_is_created() {
        let config = localeyes_table_config();
        let plan = calculate_deploy_plan(None, &config);
        assert_eq!(plan, DeployPlan::CreateTable { config });
    }

    #[test]
    fn missing_index_is_added() {
        let config = localeyes_table_config();
        let plan = calculate_deploy_plan(Some(&state(&[])), &config);
        match plan {
            DeployPlan::AddGsis { gsis_to_add, .. } => {
                assert_eq!(gsis_to_add.len(), 1);
                assert_eq!(gsis_to_add[0].name, "created_at-index");
            }
            other => panic!("unexpected plan: {:?}", other),
        }
    }

    #[test]
    fn complete_table_needs_nothing() {
        let config = localeyes_table_config();
        let plan = calculate_deploy_plan(Some(&state(&["created_at-index"])), &config);
        assert!(matches!(plan, DeployPlan::NoChanges { .. }));
    }

    #[test]
    fn table_with_building_index_is_not_ready() {
        let mut current = state(&["created_at-index"]);
        assert!(current.is_ready());
        current.gsis[0].status = Status::Creating;
        assert!(!current.is_ready());
    }

    #[test]
    fn create_plan_lists_the_recency_index_and_ttl() {
        let lines = format_deploy_plan(&DeployPlan::CreateTable {
            config: localeyes_table_config(),
        });
        assert!(lines.contains(&"  + GSI: created_at-index".to_string()));
        assert!(lines.contains(&"    Sort key: created_at (S)".to_string()));
        assert!(lines.contains(&"  TTL attribute: ttl".to_string()));
    }

    #[test]
    fn destroy_of_missing_table_is_a_no_op() {
        assert_eq!(
            calculate_destroy_plan(None, "localeyes"),
            DestroyPlan::AlreadyGone {
                table_name: "localeyes".to_string()
            }
        );
    }
}
