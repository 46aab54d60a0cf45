//! Hooks the support desk installs by default

use rand::Rng;

use super::registry::HookRegistry;
use super::types::{HookContext, HookEvent, HookResult};
use crate::agents::AgentKind;

/// Stamp a fresh `ID-<n>` user ID, `n` in `100..=999`
pub fn assign_user_id(ctx: &mut HookContext<'_>) -> HookResult {
    let user_id = format!("ID-{}", rand::thread_rng().gen_range(100..=999));
    tracing::info!(
        "[Hooks] Assigned user ID {} in session {}",
        user_id,
        ctx.session_id()
    );
    ctx.context_mut().user_id = Some(user_id);
    HookResult::none()
}

/// Registry with the account management handoff hook installed
pub fn support_desk_hooks() -> Result<HookRegistry, regex::Error> {
    let mut hooks = HookRegistry::new();
    let pattern = format!("^{}$", regex::escape(AgentKind::AccountManagement.name()));
    hooks.add_with_pattern(HookEvent::Handoff, &pattern, assign_user_id)?;
    Ok(hooks)
}
