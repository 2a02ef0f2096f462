//! Tenant command handler.
//!
//! Registers, lists and deletes dots in the workspace store.

use super::print_json;
use clap::{Args, Subcommand};
use dot_core::{config::AppConfig, AppError, AppResult};
use dot_knowledge::{NewTenant, ServiceSet};

/// Register, list and delete dots
#[derive(Args, Debug)]
pub struct TenantCommand {
    #[command(subcommand)]
    pub action: TenantAction,
}

#[derive(Subcommand, Debug)]
pub enum TenantAction {
    /// Register a new dot
    Create(TenantCreateCommand),
    /// List registered dots
    List(TenantListCommand),
    /// Delete a dot with its knowledge, sessions and conversations
    Delete(TenantDeleteCommand),
}

/// Register a new dot
#[derive(Args, Debug)]
pub struct TenantCreateCommand {
    /// Business name the assistant speaks for
    pub name: String,

    /// Website domain
    pub domain: String,

    /// Free-text business context added to every chat prompt
    #[arg(long)]
    pub context: Option<String>,

    /// Chat model for this dot (default: llm.model)
    #[arg(long)]
    pub ai_model: Option<String>,

    /// Sampling temperature (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens per reply
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl TenantCreateCommand {
    pub async fn execute(&self, services: &ServiceSet) -> AppResult<()> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(AppError::InvalidRequest(format!(
                    "temperature must lie in [0, 2], got {}",
                    t
                )));
            }
        }

        let tenant = services
            .stores
            .tenants
            .create_tenant(NewTenant {
                name: self.name.clone(),
                domain: self.domain.clone(),
                business_context: self.context.clone(),
                ai_model: self.ai_model.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            })
            .await?;

        tracing::info!(tenant_id = %tenant.id, "Dot created");

        if self.json {
            print_json(&tenant)
        } else {
            println!("Created dot '{}' ({})", tenant.name, tenant.id);
            Ok(())
        }
    }
}

/// List registered dots
#[derive(Args, Debug)]
pub struct TenantListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl TenantListCommand {
    pub async fn execute(&self, services: &ServiceSet) -> AppResult<()> {
        let tenants = services.stores.tenants.list_tenants().await?;

        if self.json {
            return print_json(&tenants);
        }

        if tenants.is_empty() {
            println!("No dots registered. Create one with 'dot tenant create <name> <domain>'.");
            return Ok(());
        }

        for tenant in &tenants {
            println!(
                "{}  {:<24} {:<24} {}",
                tenant.id,
                tenant.name,
                tenant.domain,
                tenant.setup_status.as_str()
            );
        }
        Ok(())
    }
}

/// Delete a dot
#[derive(Args, Debug)]
pub struct TenantDeleteCommand {
    /// Dot ID
    pub id: String,
}

impl TenantDeleteCommand {
    pub async fn execute(&self, services: &ServiceSet) -> AppResult<()> {
        if !services.stores.tenants.delete_tenant(&self.id).await? {
            return Err(AppError::NotFound(format!("dot {}", self.id)));
        }

        println!("Deleted dot {}", self.id);
        Ok(())
    }
}

impl TenantCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let services = ServiceSet::from_config(config)?;
        match &self.action {
            TenantAction::Create(cmd) => cmd.execute(&services).await,
            TenantAction::List(cmd) => cmd.execute(&services).await,
            TenantAction::Delete(cmd) => cmd.execute(&services).await,
        }
    }
}
