//! DynamoDB infrastructure management commands.

mod client;
mod config;
mod deploy;
mod error;
mod planning;
mod seed;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use dialoguer::Confirm;
use localeyes_core::social::{validate_email, validate_password};

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy the DynamoDB table.
    Deploy(DeployCommand),

    /// Create the administrator account.
    SeedAdmin(SeedAdminCommand),
}

/// Deploy or update DynamoDB infrastructure.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy the localeyes DynamoDB table.

By default, this command creates the table keyed by pk/sk together with the
recency index (pk, created_at) and enables expiry on the ttl attribute.
An existing table only gains the indexes it is missing.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  DYNAMO_REGION       - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the table instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    /// Table name to use.
    #[arg(long, env = "TABLE_NAME", default_value = "localeyes")]
    pub table_name: String,

    /// Name of the recency index.
    #[arg(long, env = "INDEX_NAME", default_value = "created_at-index")]
    pub index_name: String,
}

/// Create the administrator account.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Insert the administrator account into the table.

Sign-up refuses the reserved administrator identity, so this is the only way
to create it. Fails without writing anything if the username or email is
already taken.")]
pub struct SeedAdminCommand {
    /// Administrator username; must match the server's AdminUsername.
    #[arg(long, env = "AdminUsername", default_value = "admin")]
    pub username: String,

    #[arg(long, default_value = "localeyes22@gmail.com")]
    pub email: String,

    /// Administrator password.
    #[arg(long, env = "ADMIN_PASSWORD")]
    pub password: String,

    #[arg(long, default_value = "")]
    pub city: String,

    /// Table name to use.
    #[arg(long, env = "TABLE_NAME", default_value = "localeyes")]
    pub table_name: String,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
        DynamodbAction::SeedAdmin(seed_cmd) => run_seed_admin(seed_cmd, &global).await,
    }
}

fn confirm(prompt: &str, default: bool) -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;
    let current_state = client::get_table_state(&dynamo_client, &cmd.table_name).await?;

    if cmd.destroy {
        let plan = planning::calculate_destroy_plan(current_state.as_ref(), &cmd.table_name);

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for line in planning::format_destroy_plan(&plan) {
                aprintln!("  {}", p_r(&line));
            }
            aprintln!();
        }

        if matches!(plan, planning::DestroyPlan::AlreadyGone { .. }) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        if !cmd.force {
            confirm(
                "Are you sure you want to delete this table? ALL DATA WILL BE LOST",
                false,
            )?;
        }

        deploy::execute_destroy_plan(&dynamo_client, &plan).await?;

        if !global.is_silent() {
            aprintln!("{}", p_g("Table destroyed successfully."));
        }
        return Ok(());
    }

    let table_config = config::localeyes_table_config()
        .with_table_name(&cmd.table_name)
        .with_index_name(&cmd.index_name);

    let plan = planning::calculate_deploy_plan(current_state.as_ref(), &table_config);

    if !global.is_silent() {
        aprintln!("{}", p_c("Deploy Plan:"));
        for line in planning::format_deploy_plan(&plan) {
            match line.chars().next() {
                Some('+') => aprintln!("  {}", p_g(&line)),
                Some('~') => aprintln!("  {}", p_y(&line)),
                _ => aprintln!("  {}", line),
            }
        }
        aprintln!();
    }

    if matches!(plan, planning::DeployPlan::NoChanges { .. }) {
        if !global.is_silent() {
            aprintln!("{}", p_g("Infrastructure is up to date."));
        }
        return Ok(());
    }

    if !cmd.force {
        confirm("Apply these changes?", true)?;
    }

    if !global.is_silent() {
        aprintln!("{}", p_b("Applying changes..."));
    }

    deploy::execute_deploy_plan(&dynamo_client, &plan).await?;

    if !global.is_silent() {
        aprintln!("{}", p_g("Infrastructure deployed successfully."));
    }

    Ok(())
}

async fn run_seed_admin(cmd: SeedAdminCommand, global: &crate::Global) -> Result<()> {
    validate_email(&cmd.email).map_err(|e| DynamodbError::InvalidInput(e.to_string()))?;
    validate_password(&cmd.password).map_err(|e| DynamodbError::InvalidInput(e.to_string()))?;

    let aws_config = client::AwsConfig::default();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!("{} {}", p_b("Table:"), cmd.table_name);
        aprintln!("{} {}", p_b("Username:"), cmd.username);
        aprintln!("{} {}", p_b("Email:"), cmd.email);
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await;

    if client::get_table_state(&dynamo_client, &cmd.table_name)
        .await?
        .is_none()
    {
        return Err(DynamodbError::TableNotFound {
            table_name: cmd.table_name,
        });
    }

    if !cmd.force {
        confirm(&format!("Create administrator '{}'?", cmd.username), true)?;
    }

    let user = seed::admin_user(&cmd.username, &cmd.email, &cmd.password, &cmd.city)?;
    seed::seed_user(&dynamo_client, &cmd.table_name, &user).await?;

    if !global.is_silent() {
        aprintln!("{} administrator {} created.", p_g("Success:"), user.id);
    }

    Ok(())
}
