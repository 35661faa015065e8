//! Telegram Bot API wire types.
//!
//! Only the fields this engine reads are modeled; everything else in the
//! API's responses is ignored during deserialization.

use serde::{Deserialize, Serialize};

use crate::domain::verification::ChannelMemberStatus;

/// Envelope every Bot API method responds with.
///
/// `ok: true` carries `result`; `ok: false` carries `description` and
/// `error_code`, with throttle details in `parameters`.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

/// Extra failure details the API attaches to some errors.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before retrying, set on 429 responses.
    pub retry_after: Option<u64>,
    /// New chat id after a group-to-supergroup migration.
    pub migrate_to_chat_id: Option<i64>,
}

/// Subset of the `ChatMember` object returned by `getChatMember`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChatMemberInfo {
    pub status: ChannelMemberStatus,
    /// Only present for `restricted`: whether the user is still in the chat.
    #[serde(default)]
    pub is_member: Option<bool>,
}

impl ChatMemberInfo {
    /// Status with the `restricted` ambiguity resolved.
    ///
    /// A restricted user who has left the chat reports `restricted` with
    /// `is_member = false`; membership-wise that is `left`.
    pub fn effective_status(&self) -> ChannelMemberStatus {
        match (self.status, self.is_member) {
            (ChannelMemberStatus::Restricted, Some(false)) => ChannelMemberStatus::Left,
            (status, _) => status,
        }
    }
}

/// Permission set passed to `restrictChatMember`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChatPermissions {
    pub can_send_messages: bool,
    pub can_send_audios: bool,
    pub can_send_documents: bool,
    pub can_send_photos: bool,
    pub can_send_videos: bool,
    pub can_send_video_notes: bool,
    pub can_send_voice_notes: bool,
    pub can_send_polls: bool,
    pub can_send_other_messages: bool,
    pub can_add_web_page_previews: bool,
}

impl ChatPermissions {
    /// Everything off: the user can read but not post.
    pub fn muted() -> Self {
        Self {
            can_send_messages: false,
            can_send_audios: false,
            can_send_documents: false,
            can_send_photos: false,
            can_send_videos: false,
            can_send_video_notes: false,
            can_send_voice_notes: false,
            can_send_polls: false,
            can_send_other_messages: false,
            can_add_web_page_previews: false,
        }
    }

    /// Everything on: restores the group's ordinary posting rights.
    pub fn unrestricted() -> Self {
        Self {
            can_send_messages: true,
            can_send_audios: true,
            can_send_documents: true,
            can_send_photos: true,
            can_send_videos: true,
            can_send_video_notes: true,
            can_send_voice_notes: true,
            can_send_polls: true,
            can_send_other_messages: true,
            can_add_web_page_previews: true,
        }
    }
}

/// Subset of the `Message` object returned by `sendMessage`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

// ----- Request bodies -----

#[derive(Debug, Serialize)]
pub struct GetChatMemberBody {
    pub chat_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct RestrictChatMemberBody {
    pub chat_id: i64,
    pub user_id: i64,
    pub permissions: ChatPermissions,
}

#[derive(Debug, Serialize)]
pub struct SendMessageBody {
    pub chat_id: i64,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteMessageBody {
    pub chat_id: i64,
    pub message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_get_chat_member_response() {
        let json = r#"{"ok":true,"result":{"status":"member","user":{"id":42,"is_bot":false,"first_name":"A"}}}"#;
        let response: ApiResponse<ChatMemberInfo> = serde_json::from_str(json).unwrap();

        assert!(response.ok);
        let member = response.result.unwrap();
        assert_eq!(member.status, ChannelMemberStatus::Member);
        assert!(member.is_member.is_none());
    }

    #[test]
    fn parses_throttle_response_with_retry_after() {
        let json = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 17","parameters":{"retry_after":17}}"#;
        let response: ApiResponse<ChatMemberInfo> = serde_json::from_str(json).unwrap();

        assert!(!response.ok);
        assert_eq!(response.error_code, Some(429));
        assert_eq!(response.parameters.unwrap().retry_after, Some(17));
    }

    #[test]
    fn restricted_non_member_reads_as_left() {
        let json = r#"{"status":"restricted","is_member":false,"until_date":0}"#;
        let member: ChatMemberInfo = serde_json::from_str(json).unwrap();

        assert_eq!(member.effective_status(), ChannelMemberStatus::Left);
        assert!(!member.effective_status().is_member());
    }

    #[test]
    fn restricted_member_keeps_restricted_status() {
        let json = r#"{"status":"restricted","is_member":true}"#;
        let member: ChatMemberInfo = serde_json::from_str(json).unwrap();

        assert_eq!(member.effective_status(), ChannelMemberStatus::Restricted);
        assert!(member.effective_status().is_member());
    }

    #[test]
    fn muted_permissions_deny_all_posting() {
        let json = serde_json::to_value(ChatPermissions::muted()).unwrap();

        assert_eq!(json["can_send_messages"], false);
        assert_eq!(json["can_send_polls"], false);
        assert_eq!(json["can_add_web_page_previews"], false);
    }
}
