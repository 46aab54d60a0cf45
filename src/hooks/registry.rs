//! Hook Registry
//!
//! Contains:
//! - `Hook` trait - for implementing hooks
//! - `HookMatcher` - matches tools or handoff targets by regex pattern
//! - `HookRegistry` - stores and runs hooks

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use super::types::{HookContext, HookDecision, HookEvent, HookResult};

/// Trait for hook implementations
///
/// Hooks are synchronous. They run inside the session task and may mutate
/// the session through the context.
pub trait Hook: Send + Sync {
    /// Execute the hook with the given context
    fn call(&self, ctx: &mut HookContext<'_>) -> HookResult;
}

/// Implement Hook for closures
impl<F> Hook for F
where
    F: for<'a> Fn(&mut HookContext<'a>) -> HookResult + Send + Sync,
{
    fn call(&self, ctx: &mut HookContext<'_>) -> HookResult {
        (self)(ctx)
    }
}

/// Type alias for stored hooks
pub type ArcHook = Arc<dyn Hook>;

/// Matches a tool name or handoff target by pattern and executes a hook
pub struct HookMatcher {
    /// Regex pattern (None = match all)
    pattern: Option<Regex>,

    hook: ArcHook,
}

impl HookMatcher {
    /// Create a matcher that matches everything
    pub fn new<H: Hook + 'static>(hook: H) -> Self {
        Self {
            pattern: None,
            hook: Arc::new(hook),
        }
    }

    /// Create a matcher with a regex pattern
    ///
    /// Pattern examples:
    /// - `"faq_lookup_tool"` - the FAQ tool
    /// - `"^Account Management Agent$"` - handoffs into account management
    pub fn with_pattern<H: Hook + 'static>(pattern: &str, hook: H) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
            hook: Arc::new(hook),
        })
    }

    /// Check if this matcher applies to a name
    pub fn matches(&self, name: &str) -> bool {
        match &self.pattern {
            Some(regex) => regex.is_match(name),
            None => true,
        }
    }

    /// Run the hook with the given context
    pub fn run(&self, ctx: &mut HookContext<'_>) -> HookResult {
        self.hook.call(ctx)
    }
}

impl std::fmt::Debug for HookMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookMatcher")
            .field("pattern", &self.pattern.as_ref().map(|r| r.as_str()))
            .finish()
    }
}

/// Central registry for all hooks
///
/// # Example
///
/// ```ignore
/// let mut hooks = HookRegistry::new();
///
/// hooks.add_with_pattern(HookEvent::Handoff, "^Live Agent$", |ctx| {
///     tracing::info!("Escalating session {}", ctx.session_id());
///     HookResult::none()
/// })?;
/// ```
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<HookEvent, Vec<HookMatcher>>,
}

impl HookRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook that matches everything
    pub fn add<H: Hook + 'static>(&mut self, event: HookEvent, hook: H) -> &mut Self {
        self.hooks
            .entry(event)
            .or_default()
            .push(HookMatcher::new(hook));
        self
    }

    /// Add a hook with a name pattern
    pub fn add_with_pattern<H: Hook + 'static>(
        &mut self,
        event: HookEvent,
        pattern: &str,
        hook: H,
    ) -> Result<&mut Self, regex::Error> {
        self.hooks
            .entry(event)
            .or_default()
            .push(HookMatcher::with_pattern(pattern, hook)?);
        Ok(self)
    }

    /// Add a pre-built matcher
    pub fn add_matcher(&mut self, event: HookEvent, matcher: HookMatcher) -> &mut Self {
        self.hooks.entry(event).or_default().push(matcher);
        self
    }

    /// Check if there are any hooks for an event
    pub fn has_hooks(&self, event: HookEvent) -> bool {
        self.hooks
            .get(&event)
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    /// Get the number of hooks for an event
    pub fn hook_count(&self, event: HookEvent) -> usize {
        self.hooks.get(&event).map(|v| v.len()).unwrap_or(0)
    }

    /// Run all matching hooks for an event
    ///
    /// Tool hooks are filtered by tool name, handoff hooks by the target
    /// agent's name. UserPromptSubmit hooks always run.
    ///
    /// All matching hooks run unless `short_circuit_on_deny` is set.
    /// Results combine as Deny > Allow > None.
    pub fn run(&self, ctx: &mut HookContext<'_>) -> HookResult {
        let event = ctx.event;
        let target = ctx.match_target().map(str::to_string);
        let short_circuit = ctx.short_circuit_on_deny;

        let matchers = match self.hooks.get(&event) {
            Some(matchers) => matchers,
            None => return HookResult::none(),
        };

        let mut combined = HookResult::none();

        for matcher in matchers {
            let should_run = match (&target, event) {
                (_, HookEvent::UserPromptSubmit) => true,
                (Some(name), _) => matcher.matches(name),
                (None, _) => true,
            };

            if !should_run {
                continue;
            }

            let result = matcher.run(ctx);
            combined = combine_results(combined, result);

            if short_circuit && combined.decision == Some(HookDecision::Deny) {
                tracing::debug!("[HookRegistry] Short-circuiting on Deny (remaining hooks skipped)");
                break;
            }
        }

        combined
    }
}

/// Combine two hook results
///
/// Priority: Deny > Allow > None
fn combine_results(a: HookResult, b: HookResult) -> HookResult {
    match (a.decision, b.decision) {
        (Some(HookDecision::Deny), _) => a,
        (_, Some(HookDecision::Deny)) => b,
        (Some(HookDecision::Allow), _) => a,
        (_, Some(HookDecision::Allow)) => b,
        _ => HookResult::none(),
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (event, matchers) in &self.hooks {
            map.entry(event, &matchers.len());
        }
        map.finish()
    }
}
