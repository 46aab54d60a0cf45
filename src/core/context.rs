//! Conversation context shared by every agent in a session

use serde::{Deserialize, Serialize};

/// Customer facts gathered during one chat session.
///
/// Created empty when the chat starts. The account-management handoff stamps
/// `user_id`; the `update_user_name` tool fills in the rest. The record is
/// never shown to the model directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportContext {
    /// Customer's requested user name
    pub user_name: Option<String>,

    /// Path of the uploaded government ID or passport image
    pub image_path: Option<String>,

    /// Customer's birth date, as given
    pub birth_date: Option<String>,

    /// ID assigned when the conversation enters account management
    pub user_id: Option<String>,
}

impl SupportContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a user ID has been assigned
    pub fn has_user_id(&self) -> bool {
        self.user_id.is_some()
    }

    /// Record the identity fields supplied by the customer
    pub fn update_identity(
        &mut self,
        user_name: impl Into<String>,
        image_path: impl Into<String>,
        birth_date: impl Into<String>,
    ) {
        self.user_name = Some(user_name.into());
        self.image_path = Some(image_path.into());
        self.birth_date = Some(birth_date.into());
    }
}
