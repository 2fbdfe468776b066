//! Command-line and environment configuration.

use std::{sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::{
    domain::{AuthError, Authenticator, TranslationError, Translator},
    infrastructure::{
        authenticator::{GoogleAuthenticator, StaticCredential, StaticTokenAuthenticator},
        translator::{DictionaryTranslator, OpenAiTranslator, PassthroughTranslator},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranslatorKind {
    /// OpenAI when an API key is configured, otherwise passthrough
    Auto,
    Openai,
    Dictionary,
    Passthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    /// Google OAuth access tokens, checked against the userinfo endpoint
    Google,
    /// Tokens given with --static-token
    Static,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "shabe-server")]
#[command(about = "Multi-room chat server that translates each message for every reader", long_about = None)]
pub struct ServerArgs {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "SHABE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "SHABE_PORT", default_value = "8080")]
    pub port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Translation backend
    #[arg(long, value_enum, env = "SHABE_TRANSLATOR", default_value = "auto")]
    pub translator: TranslatorKind,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, default_value = OpenAiTranslator::DEFAULT_MODEL)]
    pub openai_model: String,

    #[arg(long, default_value = OpenAiTranslator::DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// HTTP timeout for translation requests, in seconds
    #[arg(long, default_value = "10")]
    pub translation_timeout_secs: u64,

    /// How WebSocket credentials are verified
    #[arg(long, value_enum, env = "SHABE_AUTH", default_value = "google")]
    pub auth: AuthMode,

    /// Credential for --auth static, as TOKEN=NAME[:EMAIL] (repeatable)
    #[arg(long = "static-token", value_name = "TOKEN=NAME[:EMAIL]")]
    pub static_tokens: Vec<StaticCredential>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--translator openai requires --openai-api-key or OPENAI_API_KEY")]
    MissingApiKey,
    #[error("--auth static requires at least one --static-token")]
    MissingStaticTokens,
    #[error("failed to set up translator: {0}")]
    Translator(#[from] TranslationError),
    #[error("failed to set up authenticator: {0}")]
    Authenticator(#[from] AuthError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslatorConfig {
    OpenAi {
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    },
    Dictionary,
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    Google { timeout: Duration },
    Static(Vec<StaticCredential>),
}

/// Validated server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub translator: TranslatorConfig,
    pub auth: AuthConfig,
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        let timeout = Duration::from_secs(args.translation_timeout_secs);
        let api_key = args.openai_api_key.filter(|key| !key.trim().is_empty());

        let translator = match (args.translator, api_key) {
            (TranslatorKind::Openai | TranslatorKind::Auto, Some(api_key)) => {
                TranslatorConfig::OpenAi {
                    api_key,
                    model: args.openai_model,
                    base_url: args.openai_base_url,
                    timeout,
                }
            }
            (TranslatorKind::Openai, None) => return Err(ConfigError::MissingApiKey),
            (TranslatorKind::Auto | TranslatorKind::Passthrough, _) => TranslatorConfig::Passthrough,
            (TranslatorKind::Dictionary, _) => TranslatorConfig::Dictionary,
        };

        let auth = match args.auth {
            AuthMode::Google => AuthConfig::Google { timeout },
            AuthMode::Static if args.static_tokens.is_empty() => {
                return Err(ConfigError::MissingStaticTokens);
            }
            AuthMode::Static => AuthConfig::Static(args.static_tokens),
        };

        Ok(Self {
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            translator,
            auth,
        })
    }
}

impl ServerConfig {
    pub fn build_translator(&self) -> Result<Arc<dyn Translator>, ConfigError> {
        let translator: Arc<dyn Translator> = match &self.translator {
            TranslatorConfig::OpenAi {
                api_key,
                model,
                base_url,
                timeout,
            } => Arc::new(OpenAiTranslator::new(
                api_key.as_str(),
                model.as_str(),
                base_url.as_str(),
                *timeout,
            )?),
            TranslatorConfig::Dictionary => Arc::new(DictionaryTranslator::with_defaults()),
            TranslatorConfig::Passthrough => Arc::new(PassthroughTranslator),
        };
        Ok(translator)
    }

    pub fn build_authenticator(&self) -> Result<Arc<dyn Authenticator>, ConfigError> {
        let authenticator: Arc<dyn Authenticator> = match &self.auth {
            AuthConfig::Google { timeout } => Arc::new(GoogleAuthenticator::new(*timeout)?),
            AuthConfig::Static(credentials) => {
                Arc::new(StaticTokenAuthenticator::new(credentials.iter().cloned()))
            }
        };
        Ok(authenticator)
    }

    pub fn translator_name(&self) -> &'static str {
        match self.translator {
            TranslatorConfig::OpenAi { .. } => "openai",
            TranslatorConfig::Dictionary => "dictionary",
            TranslatorConfig::Passthrough => "passthrough",
        }
    }
}
