//! Thin Discord REST client for profile lookup and role verification.
//!
//! Role verification is a fail-closed chain: any missing configuration,
//! transport error, or non-OK response resolves to "no role" with a logged
//! diagnostic. Nothing in here returns an error past the auth boundary.

use serde::Deserialize;
use tracing::{info, warn};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Profile fields from `GET /users/@me` under the identify/email scopes.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PartialGuild {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GuildMember {
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Clone)]
pub struct DiscordApi {
    http: reqwest::Client,
    bot_token: Option<String>,
    guild_id: Option<String>,
    required_role_id: Option<String>,
}

impl DiscordApi {
    pub fn new(
        bot_token: Option<String>,
        guild_id: Option<String>,
        required_role_id: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            guild_id,
            required_role_id,
        }
    }

    /// Fetch the authenticated user's profile with their OAuth token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<DiscordProfile, reqwest::Error> {
        self.http
            .get(format!("{}/users/@me", DISCORD_API_BASE))
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// Run the full role-verification chain for a freshly authenticated user.
    ///
    /// Steps: user's guild list (their token) -> target guild present ->
    /// guild member fetch (bot token) -> required role in the member's role
    /// list. Every failure resolves to `false`.
    pub async fn verify_required_role(&self, access_token: &str, discord_id: &str) -> bool {
        let Some(guild_id) = self.guild_id.as_deref() else {
            warn!("role check: guild id not configured, failing closed");
            return false;
        };
        let Some(role_id) = self.required_role_id.as_deref() else {
            warn!("role check: required role id not configured, failing closed");
            return false;
        };

        // The guild list comes from the user's own token (guilds scope).
        let guilds_resp = self
            .http
            .get(format!("{}/users/@me/guilds", DISCORD_API_BASE))
            .bearer_auth(access_token)
            .send()
            .await;

        let guilds: Vec<PartialGuild> = match guilds_resp {
            Ok(resp) if resp.status().is_success() => match resp.json().await {
                Ok(guilds) => guilds,
                Err(e) => {
                    warn!("role check: failed to parse guild list: {}", e);
                    return false;
                }
            },
            Ok(resp) => {
                warn!("role check: guild list fetch returned {}", resp.status());
                return false;
            }
            Err(e) => {
                warn!("role check: guild list fetch failed: {}", e);
                return false;
            }
        };

        if !guild_listed(&guilds, guild_id) {
            info!(
                "role check: user {} is not a member of guild {}",
                discord_id, guild_id
            );
            return false;
        }

        // OAuth tokens cannot read guild member role lists; this call needs
        // the bot's own credential.
        let Some(bot_token) = self.bot_token.as_deref() else {
            warn!("role check: bot token not configured, cannot verify roles");
            return false;
        };

        let member_resp = self
            .http
            .get(format!(
                "{}/guilds/{}/members/{}",
                DISCORD_API_BASE, guild_id, discord_id
            ))
            .header("Authorization", format!("Bot {}", bot_token))
            .send()
            .await;

        let member: GuildMember = match member_resp {
            Ok(resp) if resp.status().is_success() => match resp.json().await {
                Ok(member) => member,
                Err(e) => {
                    warn!("role check: failed to parse member data: {}", e);
                    return false;
                }
            },
            Ok(resp) => {
                warn!("role check: member fetch returned {}", resp.status());
                return false;
            }
            Err(e) => {
                warn!("role check: member fetch failed: {}", e);
                return false;
            }
        };

        let has_role = member_holds_role(&member.roles, role_id);
        info!(
            "role check: user {} {} role {}",
            discord_id,
            if has_role { "holds" } else { "is missing" },
            role_id
        );
        has_role
    }
}

fn guild_listed(guilds: &[PartialGuild], guild_id: &str) -> bool {
    guilds.iter().any(|g| g.id == guild_id)
}

fn member_holds_role(roles: &[String], role_id: &str) -> bool {
    roles.iter().any(|r| r == role_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guilds(ids: &[&str]) -> Vec<PartialGuild> {
        ids.iter()
            .map(|id| PartialGuild { id: (*id).to_string() })
            .collect()
    }

    #[test]
    fn guild_membership_is_exact_id_match() {
        let list = guilds(&["111", "222", "333"]);
        assert!(guild_listed(&list, "222"));
        assert!(!guild_listed(&list, "22"));
        assert!(!guild_listed(&list, "444"));
        assert!(!guild_listed(&[], "222"));
    }

    #[test]
    fn role_lookup_matches_whole_snowflake() {
        let roles = vec!["100".to_string(), "1452267489970094211".to_string()];
        assert!(member_holds_role(&roles, "1452267489970094211"));
        assert!(!member_holds_role(&roles, "145226748997009421"));
        assert!(!member_holds_role(&[], "100"));
    }

    #[test]
    fn member_roles_default_to_empty() {
        // Discord omits `roles` in some error shapes; the parse must not fail.
        let member: GuildMember = serde_json::from_str("{}").unwrap();
        assert!(member.roles.is_empty());
    }
}
