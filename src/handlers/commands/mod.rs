//! Command handlers module
//!
//! This module contains the CLI definition and one handler per subcommand.

pub mod account;
pub mod equipment;
pub mod studio;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::handlers::kiosk;
use crate::models::{StudioRole, TransactionType};
use crate::services::{ServiceFactory, StudioContext};
use crate::utils::errors::Result;

#[derive(Parser, Debug)]
#[command(name = "studio-gear")]
#[command(version = crate::VERSION)]
#[command(about = "Track studio equipment with scannable labels", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// All available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the sign-in URL
    Login,
    /// Finish sign-in with the code or the full redirect URL
    Callback { code: String },
    /// Sign out and forget local state
    Logout,
    /// Show the signed-in user and active studio
    Whoami,
    /// Studios, invitations and recent activity
    Dashboard,
    /// Create a studio you own
    CreateStudio {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Make a studio the active one
    UseStudio { studio_id: Uuid },
    AcceptInvite { invitation_id: Uuid },
    DeclineInvite { invitation_id: Uuid },
    /// List equipment of the active studio
    Equipment {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Equipment detail with units and recent transactions
    ShowEquipment { equipment_id: Uuid },
    /// Add equipment and generate its units
    AddEquipment {
        name: String,
        #[arg(long, default_value = "general")]
        category: String,
        #[arg(long)]
        sku: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        quantity: i32,
        #[arg(long)]
        notes: Option<String>,
        /// Label type printed for the units (qr or barcode)
        #[arg(long, default_value = "qr")]
        code_type: String,
        /// Photo of the equipment
        #[arg(long)]
        photo: PathBuf,
    },
    EditEquipment {
        equipment_id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        sku: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    DeleteEquipment { equipment_id: Uuid },
    /// Export unit labels as a ZIP of PNG files
    Labels {
        /// Only templates whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Unit codes to leave out
        #[arg(long)]
        exclude: Vec<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        size: Option<String>,
        /// Directory for the archive (defaults to labels.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Members and pending invitations
    Members,
    Invite {
        email: String,
        #[arg(long, default_value = "colleague")]
        role: StudioRole,
    },
    RemoveMember { membership_id: Uuid },
    CancelInvite { invitation_id: Uuid },
    /// Latest transactions of the active studio
    Activity {
        #[arg(long = "type")]
        kind: Option<TransactionType>,
    },
    /// Approve or deny a pending transaction
    Review {
        transaction_id: Uuid,
        #[arg(long, conflicts_with = "deny")]
        approve: bool,
        #[arg(long)]
        deny: bool,
    },
    /// Scan labels from stdin and check equipment out or in
    Kiosk {
        /// One scan per commit instead of a cart
        #[arg(long)]
        quick: bool,
        /// Start in checkin mode
        #[arg(long)]
        checkin: bool,
    },
}

/// Main command dispatcher
pub async fn handle_command(command: Command, services: ServiceFactory) -> Result<()> {
    match command {
        Command::Login => account::handle_login(&services).await,
        Command::Callback { code } => account::handle_callback(&services, &code).await,
        Command::Logout => account::handle_logout(&services).await,
        Command::Whoami => account::handle_whoami(&services).await,
        Command::Dashboard => studio::handle_dashboard(&services).await,
        Command::CreateStudio {
            name,
            description,
            timezone,
        } => studio::handle_create_studio(&services, &name, description, timezone).await,
        Command::UseStudio { studio_id } => studio::handle_use_studio(&services, studio_id).await,
        Command::AcceptInvite { invitation_id } => studio::handle_accept_invite(&services, invitation_id).await,
        Command::DeclineInvite { invitation_id } => studio::handle_decline_invite(&services, invitation_id).await,
        Command::Equipment { search } => equipment::handle_list(&services, search.as_deref()).await,
        Command::ShowEquipment { equipment_id } => equipment::handle_show(&services, equipment_id).await,
        Command::AddEquipment {
            name,
            category,
            sku,
            quantity,
            notes,
            code_type,
            photo,
        } => {
            let input = equipment::AddEquipmentArgs {
                name,
                category,
                sku,
                quantity,
                notes,
                code_type,
                photo,
            };
            equipment::handle_add(&services, input).await
        }
        Command::EditEquipment {
            equipment_id,
            name,
            category,
            sku,
            notes,
        } => equipment::handle_edit(&services, equipment_id, name, category, sku, notes).await,
        Command::DeleteEquipment { equipment_id } => equipment::handle_delete(&services, equipment_id).await,
        Command::Labels {
            search,
            exclude,
            style,
            size,
            output,
        } => {
            let options = equipment::LabelArgs {
                search,
                exclude,
                style,
                size,
                output,
            };
            equipment::handle_labels(&services, options).await
        }
        Command::Members => studio::handle_members(&services).await,
        Command::Invite { email, role } => studio::handle_invite(&services, &email, role).await,
        Command::RemoveMember { membership_id } => studio::handle_remove_member(&services, membership_id).await,
        Command::CancelInvite { invitation_id } => studio::handle_cancel_invite(&services, invitation_id).await,
        Command::Activity { kind } => studio::handle_activity(&services, kind).await,
        Command::Review {
            transaction_id,
            approve,
            deny,
        } => studio::handle_review(&services, transaction_id, approve, deny).await,
        Command::Kiosk { quick, checkin } => {
            let context = active_context(&services).await?;
            kiosk::run_kiosk(&services, context, quick, checkin).await
        }
    }
}

/// Context of the remembered studio, revalidated
pub(crate) async fn active_context(services: &ServiceFactory) -> Result<StudioContext> {
    services.session_service.current_context().await
}
