use std::path::{Path, PathBuf};

use axum::http::Method;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use trie_router::clean_path;
use trie_router::config::{build_router, load_config};
use trie_router::routing::{Dispatch, Router};

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Inspect how a route table resolves paths", long_about = None)]
struct Cli {
    /// Config file holding the route table.
    #[arg(short, long, default_value = "routes.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a request the way the server would
    Lookup {
        #[arg(short, long, default_value = "GET")]
        method: String,
        path: String,
    },
    /// Find the registered path matching PATH case-insensitively
    Fix {
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// Also try adding or removing a trailing slash
        #[arg(long)]
        trailing_slash: bool,
        path: String,
    },
    /// Print the canonical form of PATH (no config needed)
    Clean { path: String },
    /// List the methods that accept PATH
    Allowed { path: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Clean { path } => json!({ "path": path, "clean": clean_path(&path) }),
        Commands::Lookup { method, path } => {
            let router = load_router(&cli.config)?;
            let method = parse_method(&method)?;
            describe(&router, &method, &path)
        }
        Commands::Fix {
            method,
            trailing_slash,
            path,
        } => {
            let router = load_router(&cli.config)?;
            let method = parse_method(&method)?;
            let fixed = router.find_case_insensitive_path(&method, &path, trailing_slash);
            json!({ "method": method.as_str(), "path": path, "fixed": fixed })
        }
        Commands::Allowed { path } => {
            let router = load_router(&cli.config)?;
            let allow = router.allowed(&path, &Method::OPTIONS);
            let methods: Vec<&str> = allow.iter().map(Method::as_str).collect();
            json!({ "path": path, "allow": methods })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_router(path: &Path) -> Result<Router<String>, Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    Ok(build_router(&config, |route| route.name.clone())?)
}

fn parse_method(method: &str) -> Result<Method, Box<dyn std::error::Error>> {
    Ok(Method::from_bytes(method.to_ascii_uppercase().as_bytes())?)
}

fn describe(router: &Router<String>, method: &Method, path: &str) -> Value {
    let dispatch = router.dispatch(method, path);
    let outcome = dispatch.outcome();

    let detail = match dispatch {
        Dispatch::Matched { handler, params } => {
            let params: serde_json::Map<String, Value> = params
                .iter()
                .map(|p| (p.key.to_owned(), Value::from(p.value)))
                .collect();
            json!({ "route": handler, "params": params })
        }
        Dispatch::Redirect { location, status } => {
            json!({ "location": location, "status": status.as_u16() })
        }
        Dispatch::Options { allow } | Dispatch::MethodNotAllowed { allow } => {
            json!({ "allow": allow.to_string() })
        }
        Dispatch::NotFound => Value::Null,
    };

    json!({
        "method": method.as_str(),
        "path": path,
        "outcome": outcome,
        "detail": detail,
    })
}
