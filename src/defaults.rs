//! Built-in defaults
//!
//! The default layer describes a conventional layout: every release is unpacked into
//! `<home>/<version>`, with source, virtualenv and runtime directories below it.
//! Lookups are lazy, so overriding `address` alone moves every derived path.

use crate::context::Context;
use crate::error::ResolveError;
use crate::layer::ConfigLayer;
use crate::path::{join_local, join_remote};
use crate::value::Value;
use chrono::Utc;
use std::path::{Path, PathBuf};

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Home directory of a remote user.
pub fn home_path(user: &str) -> String {
    if user == "root" {
        "/root".to_string()
    } else {
        join_remote(&["/home", user])
    }
}

fn local_user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "root".to_string())
}

/// Connection target parsed from `[user@]host[:port]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub user: String,
    pub host: String,
    pub port: u16,
}

impl Address {
    pub fn parse(address: &str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidAddress(address.to_string());
        let address = address.trim();
        let (user, rest) = match address.rsplit_once('@') {
            Some((user, rest)) if !user.is_empty() => (user.to_string(), rest),
            Some(_) => return Err(invalid()),
            None => (local_user(), address),
        };
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (rest, DEFAULT_SSH_PORT),
        };
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(Address {
            user,
            host: host.to_string(),
            port,
        })
    }
}

fn address(ctx: &Context) -> Result<Address, ResolveError> {
    Address::parse(&ctx.get_str("address")?)
}

fn workers(ctx: &Context) -> Result<Value, ResolveError> {
    Ok(Value::Int(ctx.get_int("cpu_count")? * 2 + 1))
}

/// The ordered default layer
pub fn builtin() -> ConfigLayer {
    ConfigLayer::new()
        .literal("conf_name", "default")
        .computed("address", |_| Ok(Value::Str(format!("{}@localhost", local_user()))))
        .computed("user", |ctx| Ok(Value::Str(address(ctx)?.user)))
        .computed("host", |ctx| Ok(Value::Str(address(ctx)?.host)))
        .computed("port", |ctx| Ok(Value::from(address(ctx)?.port)))
        .literal("time_format", "%Y.%m.%d-%H.%M.%S")
        .computed("current_time", |ctx| {
            let format = ctx.get_str("time_format")?;
            Ok(Value::Str(Utc::now().format(&format).to_string()))
        })
        .computed("version", |ctx| {
            // One version per run: store it globally, then read it back.
            let current = ctx.get("current_time")?;
            ctx.set_globally("version", current);
            ctx.get("version")
        })
        .literal("versions", vec!["active", "last", "previous"])
        .literal("instance_name", "{user}")
        // directory inside the repository that holds the project
        .literal("project_dir", "")
        // directory holding manage.py, relative to the project
        .literal("django_dir", "")
        .computed("home_path", |ctx| Ok(Value::Str(home_path(&ctx.get_str("user")?))))
        .segments("version_path", ["{home_path}", "{version}"])
        .segments("src_path", ["{version_path}", "src"])
        .segments("project_path", ["{src_path}", "{project_dir}"])
        .segments("django_path", ["{project_path}", "{django_dir}"])
        .segments("env_path", ["{version_path}", "env"])
        .segments("etc_path", ["{env_path}", "etc"])
        .segments("var_path", ["{env_path}", "var"])
        .segments("log_path", ["{var_path}", "log"])
        .segments("backup_path", ["{var_path}", "backup"])
        .literal("project_ldir", "")
        .literal("django_ldir", "{django_dir}")
        // directory the deployment is run from
        .computed("home_lpath", |_| join_local(&["."]).map(Value::Str))
        .literal("src_lpath", "{home_lpath}")
        .segments("project_lpath", ["{src_lpath}", "{project_ldir}"])
        .segments("django_lpath", ["{src_lpath}", "{django_ldir}"])
        .segments("version_data_file", ["{version_path}", ".deployconf"])
        // user with sudo rights; the deploy user usually has none
        .literal("sudo_user", "root")
        .literal("server_name", "{host}")
        .literal("server_admin", "admin@{host}")
        .literal("apache_processes", 1)
        .computed("apache_threads", workers)
        .computed("uwsgi_processes", workers)
        .literal(
            "config_templates_paths",
            vec!["config_templates/{conf_name}", "config_templates"],
        )
        .literal("settings", "settings")
        .literal("local_settings_file", "local_settings.py")
        .literal("remote_settings_file", "prod_settings.py")
        .literal("loglevel", "INFO")
        .literal("db_name", "{instance_name}")
        .literal("db_user", "{user}")
        .literal("db_password", "{user}")
        .literal("db_host", "localhost")
        .literal("mysql.db_root_user", "root")
        .literal("mysql.db_port", 3306)
        .literal("postgres.db_root_user", "postgres")
        .literal("postgres.db_port", 5432)
        .literal("pip_cache_path", "/var/run/pip-download-cache")
        .literal("pip_req_path", "reqs")
        .literal("pip_req_name", "active.txt")
        // prefix for supervisor programs when several projects share a server
        .literal("supervisor_prefix", "")
        .segments("supervisor_config_path", ["{etc_path}", "supervisor"])
        .literal("supervisord_config", "/etc/supervisord.conf")
}

/// First existing template named `name` in `config_templates_paths`.
pub fn config_template_lpath(ctx: &Context, name: &str) -> Result<Option<PathBuf>, ResolveError> {
    for dir in ctx.get_list("config_templates_paths")? {
        let candidate = Path::new(&dir).join(name);
        if candidate.exists() {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

pub fn django_path_for(ctx: &Context, name: &str) -> Result<String, ResolveError> {
    Ok(join_remote(&[ctx.get_str("django_path")?.as_str(), name]))
}

pub fn django_lpath_for(ctx: &Context, name: &str) -> Result<PathBuf, ResolveError> {
    Ok(Path::new(&ctx.get_str("django_lpath")?).join(name))
}

pub fn pip_req_path_for(ctx: &Context, name: &str) -> Result<String, ResolveError> {
    Ok(join_remote(&[ctx.get_str("pip_req_path")?.as_str(), name]))
}
