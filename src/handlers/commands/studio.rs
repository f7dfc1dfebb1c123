//! Studio, member and activity command handlers

use tracing::info;
use uuid::Uuid;

use super::active_context;
use crate::models::{ApprovalStatus, StudioRole, TransactionRecord, TransactionType};
use crate::services::ServiceFactory;
use crate::utils::errors::{GearError, Result};
use crate::utils::helpers::{format_relative_time, truncate_text};

fn print_transactions(records: &[TransactionRecord]) {
    if records.is_empty() {
        println!("  (none)");
        return;
    }
    for record in records {
        let tx = &record.transaction;
        let approval = match tx.approval_status {
            Some(ApprovalStatus::Pending) => " [pending]",
            Some(ApprovalStatus::Denied) => " [denied]",
            _ => "",
        };
        println!(
            "  {:<8} {:>3} x {:<28} {}{}  {}",
            tx.kind.as_str(),
            tx.quantity,
            truncate_text(record.equipment_name(), 28),
            format_relative_time(tx.created_at),
            approval,
            tx.id
        );
    }
}

/// Handle `dashboard`
pub async fn handle_dashboard(services: &ServiceFactory) -> Result<()> {
    let session = services.auth_service.require_session().await?;
    let dashboard = services.studio_service.dashboard(&session.user).await?;

    println!("Your studios:");
    if dashboard.owned.is_empty() && dashboard.memberships.is_empty() {
        println!("  (none) - run `create-studio <name>` to get started");
    }
    for studio in &dashboard.owned {
        println!("  {}  {} (owner)", studio.id, studio.name);
    }
    for membership in &dashboard.memberships {
        let name = membership
            .studio
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("(unknown studio)");
        println!("  {}  {} ({})", membership.membership.studio_id, name, membership.membership.role);
    }

    if !dashboard.invitations.is_empty() {
        println!("\nPending invitations:");
        for invitation in &dashboard.invitations {
            let name = invitation
                .studio
                .as_ref()
                .map(|s| s.name.as_str())
                .unwrap_or("(unknown studio)");
            println!("  {}  {} as {}", invitation.invitation.id, name, invitation.invitation.role);
        }
    }

    println!("\nYour recent activity:");
    print_transactions(&dashboard.recent);

    if !dashboard.owned.is_empty() {
        println!("\nAcross your studios:");
        print_transactions(&dashboard.studio_activity);
    }
    Ok(())
}

pub async fn handle_create_studio(
    services: &ServiceFactory,
    name: &str,
    description: Option<String>,
    timezone: Option<String>,
) -> Result<()> {
    let session = services.auth_service.require_session().await?;
    let studio = services
        .studio_service
        .create_studio(&session.user, name, description, timezone)
        .await?;
    services.session_service.activate_studio(studio.id).await?;
    println!("Created studio {} ({}). It is now your active studio.", studio.name, studio.id);
    Ok(())
}

pub async fn handle_use_studio(services: &ServiceFactory, studio_id: Uuid) -> Result<()> {
    let context = services.session_service.activate_studio(studio_id).await?;
    println!("Active studio: {} ({})", context.studio_id, context.role);
    Ok(())
}

pub async fn handle_accept_invite(services: &ServiceFactory, invitation_id: Uuid) -> Result<()> {
    let session = services.auth_service.require_session().await?;
    let context = services
        .studio_service
        .accept_invitation(&session.user, invitation_id)
        .await?;
    services.session_service.activate_studio(context.studio_id).await?;
    println!("Joined studio {} as {}.", context.studio_id, context.role);
    Ok(())
}

pub async fn handle_decline_invite(services: &ServiceFactory, invitation_id: Uuid) -> Result<()> {
    let session = services.auth_service.require_session().await?;
    services
        .studio_service
        .decline_invitation(&session.user, invitation_id)
        .await?;
    println!("Invitation declined.");
    Ok(())
}

/// Handle `members` - owners and admins only
pub async fn handle_members(services: &ServiceFactory) -> Result<()> {
    let context = active_context(services).await?;
    let roster = services.members_service.roster(&context).await?;

    println!("Members:");
    for member in &roster.members {
        println!("  {}  user {}  {} ({:?})", member.id, member.user_id, member.role, member.status);
    }
    println!("\nPending invitations:");
    if roster.invitations.is_empty() {
        println!("  (none)");
    }
    for invitation in &roster.invitations {
        println!("  {}  {} as {}", invitation.id, invitation.email, invitation.role);
    }
    Ok(())
}

pub async fn handle_invite(services: &ServiceFactory, email: &str, role: StudioRole) -> Result<()> {
    let context = active_context(services).await?;
    let invitation = services.members_service.invite(&context, email, role).await?;
    println!("Invited {} as {}.", invitation.email, invitation.role);
    Ok(())
}

pub async fn handle_remove_member(services: &ServiceFactory, membership_id: Uuid) -> Result<()> {
    let context = active_context(services).await?;
    services.members_service.remove_member(&context, membership_id).await?;
    println!("Member removed.");
    Ok(())
}

pub async fn handle_cancel_invite(services: &ServiceFactory, invitation_id: Uuid) -> Result<()> {
    let context = active_context(services).await?;
    services
        .members_service
        .cancel_invitation(&context, invitation_id)
        .await?;
    println!("Invitation cancelled.");
    Ok(())
}

/// Handle `activity`
pub async fn handle_activity(services: &ServiceFactory, kind: Option<TransactionType>) -> Result<()> {
    let context = active_context(services).await?;
    let records = services.studio_service.activity(&context, kind).await?;
    if !context.can_manage() {
        println!("Showing your own transactions.");
    }
    print_transactions(&records);
    Ok(())
}

/// Handle `review` - approve or deny a pending transaction
pub async fn handle_review(services: &ServiceFactory, transaction_id: Uuid, approve: bool, deny: bool) -> Result<()> {
    if approve == deny {
        return Err(GearError::InvalidInput("Pass exactly one of --approve or --deny.".to_string()));
    }
    let context = active_context(services).await?;
    let transaction = services
        .studio_service
        .review(&context, transaction_id, approve)
        .await?;
    info!(transaction_id = %transaction.id, approved = approve, "Review recorded");
    println!(
        "Transaction {} {}.",
        transaction.id,
        if approve { "approved" } else { "denied" }
    );
    Ok(())
}
