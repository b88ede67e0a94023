//! Server structure definitions shared by templates, saved builds and snapshots.

use serde::{Deserialize, Serialize};
use twilight_model::guild::Permissions;

use crate::utils::prelude::*;

/// Shape of a server: categories with their channels, and roles.
/// Both lists are deployed in order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    /// Name the server is renamed to on deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,

    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub roles: Vec<RoleSpec>,
}

impl Structure {
    /// Returns the rename target, if there is a non-empty one.
    pub fn rename_target(&self) -> Option<&str> {
        self.server_name.as_deref().filter(|n| !n.trim().is_empty())
    }

    /// Total number of channels across all categories.
    pub fn channel_count(&self) -> usize {
        self.categories.iter().map(|c| c.channels.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,

    #[serde(default)]
    pub channels: Vec<ChannelSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: ChannelKind,

    /// Only applied to text channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl ChannelSpec {
    /// Returns the topic if this is a text channel with a non-empty topic.
    pub fn text_topic(&self) -> Option<&str> {
        match self.kind {
            ChannelKind::Text => self.topic.as_deref().filter(|t| !t.is_empty()),
            ChannelKind::Voice => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Text,
    Voice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,

    /// Permission flag names, such as `send_messages`.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl RoleSpec {
    /// Permission set built from the recognized flag names. Unknown names are skipped.
    pub fn permission_set(&self) -> Permissions {
        self.permissions
            .iter()
            .fold(Permissions::empty(), |acc, name| match permission(name) {
                Some(p) => acc | p,
                None => {
                    debug!("Ignoring unknown permission '{name}' on role '{}'", self.name);
                    acc
                },
            })
    }
}

/// Permission flag names mapped to permission bits.
/// The first name listed for a bit is the one used when naming granted permissions.
#[allow(deprecated)]
pub static PERMISSIONS: &[(&str, Permissions)] = &[
    ("create_instant_invite", Permissions::CREATE_INVITE),
    ("kick_members", Permissions::KICK_MEMBERS),
    ("ban_members", Permissions::BAN_MEMBERS),
    ("administrator", Permissions::ADMINISTRATOR),
    ("manage_channels", Permissions::MANAGE_CHANNELS),
    ("manage_guild", Permissions::MANAGE_GUILD),
    ("add_reactions", Permissions::ADD_REACTIONS),
    ("view_audit_log", Permissions::VIEW_AUDIT_LOG),
    ("priority_speaker", Permissions::PRIORITY_SPEAKER),
    ("stream", Permissions::STREAM),
    ("view_channel", Permissions::VIEW_CHANNEL),
    ("read_messages", Permissions::VIEW_CHANNEL),
    ("send_messages", Permissions::SEND_MESSAGES),
    ("send_tts_messages", Permissions::SEND_TTS_MESSAGES),
    ("manage_messages", Permissions::MANAGE_MESSAGES),
    ("embed_links", Permissions::EMBED_LINKS),
    ("attach_files", Permissions::ATTACH_FILES),
    ("read_message_history", Permissions::READ_MESSAGE_HISTORY),
    ("mention_everyone", Permissions::MENTION_EVERYONE),
    ("use_external_emojis", Permissions::USE_EXTERNAL_EMOJIS),
    ("external_emojis", Permissions::USE_EXTERNAL_EMOJIS),
    ("view_guild_insights", Permissions::VIEW_GUILD_INSIGHTS),
    ("connect", Permissions::CONNECT),
    ("speak", Permissions::SPEAK),
    ("mute_members", Permissions::MUTE_MEMBERS),
    ("deafen_members", Permissions::DEAFEN_MEMBERS),
    ("move_members", Permissions::MOVE_MEMBERS),
    ("use_voice_activation", Permissions::USE_VAD),
    ("change_nickname", Permissions::CHANGE_NICKNAME),
    ("manage_nicknames", Permissions::MANAGE_NICKNAMES),
    ("manage_roles", Permissions::MANAGE_ROLES),
    ("manage_permissions", Permissions::MANAGE_ROLES),
    ("manage_webhooks", Permissions::MANAGE_WEBHOOKS),
    ("manage_expressions", Permissions::MANAGE_EMOJIS_AND_STICKERS),
    ("manage_emojis", Permissions::MANAGE_EMOJIS_AND_STICKERS),
    ("manage_emojis_and_stickers", Permissions::MANAGE_EMOJIS_AND_STICKERS),
    ("use_application_commands", Permissions::USE_SLASH_COMMANDS),
    ("request_to_speak", Permissions::REQUEST_TO_SPEAK),
    ("manage_events", Permissions::MANAGE_EVENTS),
    ("manage_threads", Permissions::MANAGE_THREADS),
    ("create_public_threads", Permissions::CREATE_PUBLIC_THREADS),
    ("create_private_threads", Permissions::CREATE_PRIVATE_THREADS),
    ("use_external_stickers", Permissions::USE_EXTERNAL_STICKERS),
    ("external_stickers", Permissions::USE_EXTERNAL_STICKERS),
    ("send_messages_in_threads", Permissions::SEND_MESSAGES_IN_THREADS),
    ("use_embedded_activities", Permissions::USE_EMBEDDED_ACTIVITIES),
    ("moderate_members", Permissions::MODERATE_MEMBERS),
];

/// Look up a permission by flag name.
pub fn permission(name: &str) -> Option<Permissions> {
    PERMISSIONS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, p)| *p)
}

/// Names of every known permission contained in `permissions`, one name per bit.
pub fn permission_names(permissions: Permissions) -> Vec<String> {
    let mut seen = Permissions::empty();
    let mut names = Vec::new();

    for (name, p) in PERMISSIONS {
        if permissions.contains(*p) && !seen.contains(*p) {
            seen |= *p;
            names.push(name.to_string());
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_template_shape() {
        let json = r#"{
            "server_name": "Test",
            "categories": [
                { "name": "General", "channels": [
                    { "name": "chat", "type": "text", "topic": "Talk here" },
                    { "name": "voice-1", "type": "voice" }
                ]}
            ],
            "roles": [{ "name": "Member", "permissions": ["send_messages"] }]
        }"#;

        let s: Structure = serde_json::from_str(json).unwrap();

        assert_eq!(s.rename_target(), Some("Test"));
        assert_eq!(s.categories[0].channels[1].kind, ChannelKind::Voice);
        assert_eq!(s.categories[0].channels[0].text_topic(), Some("Talk here"));
        assert_eq!(s.channel_count(), 2);
        assert_eq!(s.roles[0].permission_set(), Permissions::SEND_MESSAGES);
    }

    #[test]
    fn missing_fields_default() {
        let s: Structure = serde_json::from_str(r#"{ "categories": [{ "name": "A" }] }"#).unwrap();
        assert_eq!(s.rename_target(), None);
        assert!(s.categories[0].channels.is_empty());
        assert!(s.roles.is_empty());

        let c: ChannelSpec = serde_json::from_str(r#"{ "name": "x" }"#).unwrap();
        assert_eq!(c.kind, ChannelKind::Text);
    }

    #[test]
    fn empty_server_name_is_not_a_rename() {
        let s = Structure {
            server_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(s.rename_target(), None);
    }

    #[test]
    fn voice_topic_is_ignored() {
        let c = ChannelSpec {
            name: "lounge".to_string(),
            kind: ChannelKind::Voice,
            topic: Some("ignored".to_string()),
        };
        assert_eq!(c.text_topic(), None);
    }

    #[test]
    fn unknown_permissions_are_ignored() {
        let role = RoleSpec {
            name: "Mod".to_string(),
            permissions: vec![
                "kick_members".to_string(),
                "fly".to_string(),
                "read_messages".to_string(),
            ],
        };
        assert_eq!(
            role.permission_set(),
            Permissions::KICK_MEMBERS | Permissions::VIEW_CHANNEL
        );
    }

    #[test]
    fn aliases_name_once() {
        let names = permission_names(Permissions::VIEW_CHANNEL | Permissions::MANAGE_ROLES);
        assert_eq!(names, vec!["view_channel", "manage_roles"]);
    }

    #[test]
    #[allow(deprecated)]
    fn named_flags_keep_their_bits() {
        assert_eq!(permission("manage_expressions").map(|p| p.bits()), Some(1 << 30));
        assert_eq!(permission("use_application_commands").map(|p| p.bits()), Some(1 << 31));
        assert_eq!(permission("use_embedded_activities").map(|p| p.bits()), Some(1 << 39));
        assert_eq!(
            permission("manage_emojis"),
            Some(Permissions::MANAGE_EMOJIS_AND_STICKERS)
        );
    }

    #[test]
    fn names_round_trip() {
        let perms = Permissions::SEND_MESSAGES | Permissions::CONNECT | Permissions::USE_SLASH_COMMANDS;
        let role = RoleSpec {
            name: "r".to_string(),
            permissions: permission_names(perms),
        };
        assert_eq!(role.permission_set(), perms);
    }
}
