//! Rolegrid command line for inspecting and editing role permission trees.

#![forbid(unsafe_code)]

mod commands;
mod config;

use clap::{ArgAction, Parser, Subcommand};
use rolegrid_application::RoleDetails;
use rolegrid_core::{AppError, RoleId};
use rolegrid_domain::PermissionAction;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    build_service, load_catalog, render_catalog_summary, render_codes, render_roles,
};
use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "rolegrid-cli")]
#[command(about = "Inspect and edit role permission trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the permission catalog and print a per-module summary
    CheckCatalog,
    /// List seeded roles
    ListRoles,
    /// Print the permission codes a role currently resolves to
    Codes {
        /// Role identifier
        role_id: RoleId,
    },
    /// Set one action on one item, save the role and print its codes
    Toggle {
        /// Role identifier
        role_id: RoleId,
        /// Module key
        module: String,
        /// Item key
        item: String,
        /// Action name (full, view, create, edit, delete, approve, export)
        action: PermissionAction,
        /// New value
        #[arg(action = ArgAction::Set)]
        value: bool,
    },
    /// Copy a role under a free "(Copy)" name and print the new role's codes
    CloneRole {
        /// Source role identifier
        role_id: RoleId,
    },
    /// Change a role's name, description or manufacturing flag
    UpdateRole {
        /// Role identifier
        role_id: RoleId,
        /// New unique name
        #[arg(long)]
        name: Option<String>,
        /// New description; an empty value clears it
        #[arg(long)]
        description: Option<String>,
        /// Whether the role is scoped to manufacturing staff
        #[arg(long)]
        manufacturing: Option<bool>,
    },
    /// Delete a role
    DeleteRole {
        /// Role identifier
        role_id: RoleId,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = CliConfig::load()?;

    match cli.command {
        Commands::CheckCatalog => {
            let catalog = load_catalog(&config).await?;
            println!("{}", render_catalog_summary(&catalog));
        }
        Commands::ListRoles => {
            let service = build_service(&config).await?;
            println!("{}", render_roles(&service.list_roles().await?));
        }
        Commands::Codes { role_id } => {
            let service = build_service(&config).await?;
            let session = service.open_session(role_id).await?;
            println!("{}", render_codes(&session.codes()));
        }
        Commands::Toggle {
            role_id,
            module,
            item,
            action,
            value,
        } => {
            let service = build_service(&config).await?;
            let mut session = service.open_session(role_id).await?;
            session.toggle(module.as_str(), item.as_str(), action, value)?;

            let role = service.save_session(&config.actor(), &mut session).await?;
            info!(
                role_id = %role.role_id,
                code_count = role.effective_codes.len(),
                "role saved"
            );
            println!("{}", render_codes(&session.codes()));
        }
        Commands::CloneRole { role_id } => {
            let service = build_service(&config).await?;
            let role = service.clone_role(&config.actor(), role_id).await?;
            let session = service.open_session(role.role_id).await?;
            println!("{} ({})", role.name, role.role_id);
            println!("{}", render_codes(&session.codes()));
        }
        Commands::UpdateRole {
            role_id,
            name,
            description,
            manufacturing,
        } => {
            let service = build_service(&config).await?;
            let current = service.role(role_id).await?;
            let details = RoleDetails {
                name: name.unwrap_or(current.name),
                description: description.or(current.description),
                is_manufacturing_role: manufacturing.unwrap_or(current.is_manufacturing_role),
            };

            let role = service
                .update_role_details(&config.actor(), role_id, details)
                .await?;
            println!("{}", render_roles(std::slice::from_ref(&role)));
        }
        Commands::DeleteRole { role_id } => {
            let service = build_service(&config).await?;
            let role = service.delete_role(&config.actor(), role_id).await?;
            println!("deleted {} ({})", role.name, role.role_id);
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
