/// Supported OAuth providers
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum AuthProvider {
    #[default]
    Gmail,
}

impl AuthProvider {
    /// Get the OAuth configuration for this provider
    pub fn config(&self) -> ProviderConfig {
        match self {
            Self::Gmail => ProviderConfig {
                name: "Gmail",
                auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
                token_url: "https://oauth2.googleapis.com/token",
                scopes: &["https://www.googleapis.com/auth/gmail.send"],
            },
        }
    }
}

/// OAuth provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider name (for display)
    pub name: &'static str,

    /// Authorization endpoint URL
    pub auth_url: &'static str,

    /// Token endpoint URL
    pub token_url: &'static str,

    /// OAuth scopes to request
    pub scopes: &'static [&'static str],
}

impl ProviderConfig {
    /// Get scopes as a single space-separated string (RFC 6749 format)
    pub fn scopes_str(&self) -> String {
        self.scopes.join(" ")
    }
}
