//! `mad`: inspect and check an application's route configuration.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indexmap::IndexMap;

use mad::config::{load_config, ConfigError};
use mad::observability::logging::init_logging;
use mad::routing::RouteSet;

#[derive(Parser)]
#[command(name = "mad")]
#[command(about = "Route inspection for Mad applications", long_about = None)]
struct Cli {
    /// Application configuration file
    #[arg(short, long, default_value = "config/mad.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List routes in match order
    Routes,
    /// Show the bindings a path produces
    Recognize {
        path: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
    },
    /// Build a URL from key=value params
    Generate {
        params: Vec<String>,
        /// Use only the route with this name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Validate the configuration file
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                eprintln!("error: {}", error);
            }
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.observability);

    let routes = match RouteSet::from_config(&config.routes) {
        Ok(routes) => routes,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Routes => {
            print_routes(&routes);
            ExitCode::SUCCESS
        }
        Commands::Recognize { path, method } => {
            match routes.recognize(&path, &method.to_ascii_uppercase()) {
                Some(found) => {
                    println!(
                        "route #{} ({})",
                        found.index,
                        found.route_name.as_deref().unwrap_or("unnamed")
                    );
                    for (key, value) in &found.params {
                        println!("  {:<14} {}", key, value);
                    }
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("no route matches {} {}", method.to_ascii_uppercase(), path);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Generate { params, name } => {
            let params = match parse_pairs(&params) {
                Ok(params) => params,
                Err(bad) => {
                    eprintln!("error: expected key=value, got `{}`", bad);
                    return ExitCode::FAILURE;
                }
            };
            let url = match &name {
                Some(name) => routes.generate_named(name, &params),
                None => routes.generate(&params),
            };
            match url {
                Some(url) => {
                    println!("{}", url);
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("no route generates a URL for {:?}", params);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Check => {
            println!(
                "{}: ok ({} routes, views in {})",
                cli.config.display(),
                routes.len(),
                config.views.root.display()
            );
            ExitCode::SUCCESS
        }
    }
}

fn print_routes(routes: &RouteSet) {
    for route in routes.routes() {
        let methods = route
            .method_conditions()
            .methods()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let defaults = route
            .defaults()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:<12} {:<8} /{:<32} {}",
            route.name().unwrap_or("-"),
            if methods.is_empty() { "ANY" } else { methods.as_str() },
            route.pattern().trim_start_matches('/'),
            defaults
        );
        for (key, source) in route.requirements() {
            println!("{:<22} {} =~ /{}/", "", key, source);
        }
    }
}

fn parse_pairs(pairs: &[String]) -> Result<IndexMap<String, String>, String> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(pair.clone()),
        })
        .collect()
}
