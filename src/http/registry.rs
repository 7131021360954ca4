//! Named clients and default selection.
//!
//! # Responsibilities
//! - Build one `HttpClient` per configured name, plus the built-in
//!   `http11` / `http2` clients
//! - Pick the process default once, at start-up
//! - Resolve the client for a call, honoring `CallContext::client`
//!
//! # Design Decisions
//! - Built once and passed by reference; there is no global client
//! - An unknown per-call override falls back to the default with a warning

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ClientConfig, Protocol, RegistryConfig, HTTP11_CLIENT, HTTP2_CLIENT};
use crate::context::CallContext;
use crate::http::client::HttpClient;

/// Environment variable selecting the HTTP/1.1 default client.
pub const USE_HTTP11_ENV: &str = "use_http11";
/// Environment variable holding the deployment profile.
pub const PROFILE_ENV: &str = "profile";

/// Start-up settings read from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub profile: String,
    pub use_http11: bool,
}

impl Environment {
    pub fn from_env() -> Self {
        Self {
            profile: std::env::var(PROFILE_ENV).unwrap_or_default(),
            use_http11: std::env::var(USE_HTTP11_ENV).is_ok_and(|v| v == "true"),
        }
    }

    fn default_client(&self) -> &'static str {
        if self.use_http11 {
            HTTP11_CLIENT
        } else {
            HTTP2_CLIENT
        }
    }
}

/// Every client of the process, by name.
#[derive(Debug)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<HttpClient>>,
    default: Arc<HttpClient>,
    profile: String,
}

impl ClientRegistry {
    /// Built-in clients only, default chosen from the environment.
    pub fn from_env() -> Self {
        Self::from_config(&RegistryConfig::default(), &Environment::from_env())
    }

    /// Build every configured client. `config` is expected to be validated,
    /// so `default_client` names a known client.
    pub fn from_config(config: &RegistryConfig, env: &Environment) -> Self {
        let mut configs: Vec<ClientConfig> = config.clients.clone();
        for (name, protocol) in [(HTTP11_CLIENT, Protocol::Http1), (HTTP2_CLIENT, Protocol::Http2)] {
            if !configs.iter().any(|c| c.name == name) {
                configs.push(ClientConfig::named(name, protocol));
            }
        }

        let clients: HashMap<String, Arc<HttpClient>> = configs
            .into_iter()
            .map(|c| {
                let client = HttpClient::new(c, &env.profile);
                (client.name().to_string(), Arc::new(client))
            })
            .collect();

        let wanted = config
            .default_client
            .as_deref()
            .unwrap_or_else(|| env.default_client());
        let default = match clients.get(wanted) {
            Some(client) => client.clone(),
            None => {
                tracing::warn!(client = %wanted, "Unknown default client, using built-in");
                clients[env.default_client()].clone()
            }
        };

        tracing::info!(
            default = %default.name(),
            clients = clients.len(),
            profile = %env.profile,
            "Client registry ready"
        );

        Self {
            clients,
            default,
            profile: env.profile.clone(),
        }
    }

    pub fn default_client(&self) -> &Arc<HttpClient> {
        &self.default
    }

    pub fn get(&self, name: &str) -> Option<&Arc<HttpClient>> {
        self.clients.get(name)
    }

    /// Client for a call: the override named by `ctx.client`, or the default.
    pub fn client_for(&self, ctx: &CallContext) -> &Arc<HttpClient> {
        match ctx.client.as_deref() {
            None => &self.default,
            Some(name) => self.clients.get(name).unwrap_or_else(|| {
                tracing::warn!(client = %name, "Unknown client override, using default");
                &self.default
            }),
        }
    }

    /// Register or replace a client under its own name.
    pub fn insert(&mut self, client: HttpClient) {
        let client = Arc::new(client);
        if client.name() == self.default.name() {
            self.default = client.clone();
        }
        self.clients.insert(client.name().to_string(), client);
    }

    /// Fresh context carrying the deployment profile.
    pub fn new_context(&self) -> CallContext {
        CallContext {
            profile: self.profile.clone(),
            ..Default::default()
        }
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
