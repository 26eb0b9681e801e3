use clap::Parser;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory holding the built front-end
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<String>,

    /// Name of the session cookie
    #[arg(long, env = "SESSION_COOKIE")]
    pub cookie_name: Option<String>,

    /// Verify token signatures before trusting their claims
    #[arg(long, env = "VERIFY_SIGNATURE")]
    pub verify_signature: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gate: GateConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub static_dir: String,
}

/// Routes and redirect targets of the access gate.
#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    pub cookie_name: String,
    pub admin_prefix: String,
    pub user_prefix: String,
    pub admin_public_routes: Vec<String>,
    pub user_public_routes: Vec<String>,
    pub admin_login: String,
    pub user_login: String,
    pub admin_dashboard: String,
    pub user_dashboard: String,
    pub unresolved_session: UnresolvedSessionPolicy,
}

/// What the gate does with a cookie whose token carries no recognised role.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedSessionPolicy {
    /// Same as having no cookie: protected areas redirect to their login page.
    #[default]
    Anonymous,
    /// Treat it as a session of the other role: protected areas redirect to
    /// the opposite dashboard.
    WrongRole,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    pub verify_signature: bool,
    pub jwt_secret: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cookie_name: "token".to_string(),
            admin_prefix: "/admin".to_string(),
            user_prefix: "/user".to_string(),
            admin_public_routes: vec!["/admin/login".to_string(), "/admin/signup".to_string()],
            user_public_routes: vec!["/user/login".to_string(), "/user/signup".to_string()],
            admin_login: "/admin/login".to_string(),
            user_login: "/user/login".to_string(),
            admin_dashboard: "/admin/dashboard".to_string(),
            user_dashboard: "/user/dashboard".to_string(),
            unresolved_session: UnresolvedSessionPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;
        let gate = GateConfig::default();

        // 1. Defaults
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "public")?
            .set_default("gate.cookie_name", gate.cookie_name)?
            .set_default("gate.admin_prefix", gate.admin_prefix)?
            .set_default("gate.user_prefix", gate.user_prefix)?
            .set_default("gate.admin_public_routes", gate.admin_public_routes)?
            .set_default("gate.user_public_routes", gate.user_public_routes)?
            .set_default("gate.admin_login", gate.admin_login)?
            .set_default("gate.user_login", gate.user_login)?
            .set_default("gate.admin_dashboard", gate.admin_dashboard)?
            .set_default("gate.user_dashboard", gate.user_dashboard)?
            .set_default("gate.unresolved_session", "anonymous")?
            .set_default("security.verify_signature", false)?
            .set_default("security.jwt_secret", "")?;

        // 2. Config file: explicit path must exist, ./config.yaml is optional
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(
                File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false),
            ),
        };

        // 3. Environment variables, e.g. GATE_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("GATE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("gate.admin_public_routes")
                .with_list_parse_key("gate.user_public_routes")
                .try_parsing(true),
        );

        // 4. CLI flags (and their clap env vars) win over everything
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(dir) = cli.static_dir {
            builder = builder.set_override("server.static_dir", dir)?;
        }
        if let Some(name) = cli.cookie_name {
            builder = builder.set_override("gate.cookie_name", name)?;
        }
        if let Some(verify) = cli.verify_signature {
            builder = builder.set_override("security.verify_signature", verify)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let gate = &self.gate;
        let paths = [
            ("gate.admin_prefix", &gate.admin_prefix),
            ("gate.user_prefix", &gate.user_prefix),
            ("gate.admin_login", &gate.admin_login),
            ("gate.user_login", &gate.user_login),
            ("gate.admin_dashboard", &gate.admin_dashboard),
            ("gate.user_dashboard", &gate.user_dashboard),
        ];
        for (key, value) in paths {
            if !value.starts_with('/') {
                return Err(ConfigError::Message(format!(
                    "{key} must be an absolute path, got {value:?}"
                )));
            }
        }
        if gate.cookie_name.trim().is_empty() {
            return Err(ConfigError::Message(
                "gate.cookie_name cannot be empty".to_string(),
            ));
        }
        if self.security.verify_signature && self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Message(
                "security.jwt_secret is required when security.verify_signature is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
