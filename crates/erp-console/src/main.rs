//! Operator console: navigation per role, permission audit and store
//! operations against a live backend

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use erp_access::prelude::*;
use erp_store::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let base_url = Arg::new("base-url")
        .long("base-url")
        .global(true)
        .help(
            "Backend base URL \
             (default: ERP_API_URL, API_BASE_URL, API_URL, then http://localhost:4000)",
        );

    Command::new("erp-console")
        .version(env!("CARGO_PKG_VERSION"))
        .about("ERP client core operator console")
        .arg_required_else_help(true)
        .arg(base_url)
        .subcommand(
            Command::new("roles")
                .about("Show the role to permission matrix")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("nav")
                .about("Render the sidebar a role would see")
                .arg(
                    Arg::new("role")
                        .long("role")
                        .required(true)
                        .help("Role name, e.g. cashier or sales_rep"),
                )
                .arg(
                    Arg::new("view")
                        .long("view")
                        .default_value("Dashboard")
                        .help("Active view id"),
                )
                .arg(
                    Arg::new("navigate")
                        .long("navigate")
                        .help("View to move to after mounting"),
                )
                .arg(
                    Arg::new("policy")
                        .long("policy")
                        .default_value("seed_once")
                        .value_parser(["seed_once", "follow_active"])
                        .help("Expansion policy on navigation"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output rows as JSON"),
                ),
        )
        .subcommand(
            Command::new("audit")
                .about("List navigation entries gated on permissions no role holds"),
        )
        .subcommand(
            Command::new("list")
                .about("List records of an entity")
                .arg(Arg::new("entity").required(true))
                .arg(
                    Arg::new("param")
                        .long("param")
                        .short('p')
                        .action(ArgAction::Append)
                        .value_parser(parse_param)
                        .help("Query parameter as key=value (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("get")
                .about("Fetch one record")
                .arg(Arg::new("entity").required(true))
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("create")
                .about("Create a record from a JSON body")
                .arg(Arg::new("entity").required(true))
                .arg(Arg::new("body").required(true)),
        )
        .subcommand(
            Command::new("update")
                .about("Update a record with a JSON body")
                .arg(Arg::new("entity").required(true))
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("body").required(true)),
        )
        .subcommand(
            Command::new("remove")
                .about("Delete a record")
                .arg(Arg::new("entity").required(true))
                .arg(Arg::new("id").required(true)),
        )
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument <{name}>"))
}

fn body(args: &ArgMatches) -> Result<Value> {
    serde_json::from_str(arg(args, "body")?).context("body is not valid JSON")
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn show_roles(json: bool) -> Result<()> {
    let matrix = RoleMatrix::standard();
    if json {
        return print_json(&matrix);
    }
    for role in Role::ALL {
        let granted = matrix.permissions_for(role);
        let permissions: Vec<&str> = granted.iter().map(Permission::as_str).collect();
        println!("{:<12} {}", role.as_str(), permissions.join(" "));
    }
    Ok(())
}

fn show_nav(args: &ArgMatches) -> Result<()> {
    let role: Role = arg(args, "role")?.parse()?;
    let policy = match arg(args, "policy")? {
        "follow_active" => ExpansionPolicy::FollowActive,
        _ => ExpansionPolicy::SeedOnce,
    };
    let user = User::for_role(role.as_str(), role, &RoleMatrix::standard());

    let mut sidebar = Sidebar::mount(
        &erp_navigation(),
        &user,
        &SetMembership,
        arg(args, "view")?,
        policy,
    );
    if let Some(next) = args.get_one::<String>("navigate") {
        sidebar.navigate(next);
    }

    let rows = sidebar.rows();
    if args.get_flag("json") {
        return print_json(&rows);
    }
    for row in rows {
        let marker = match (row.has_children, row.expanded) {
            (false, _) => ' ',
            (true, true) => 'v',
            (true, false) => '>',
        };
        let active = if row.active { " *" } else { "" };
        println!("{}{marker} {}{active}", "  ".repeat(row.depth), row.label);
    }
    Ok(())
}

fn audit() -> Result<()> {
    let unreachable = erp_navigation().unreachable_permissions(&RoleMatrix::standard());
    if unreachable.is_empty() {
        info!("every gated navigation entry is reachable by some role");
        return Ok(());
    }
    for node in &unreachable {
        warn!(view = %node.view, permission = %node.permission, "unreachable navigation entry");
        println!("{}\t{}", node.view, node.permission);
    }
    bail!("{} navigation entries are hidden from every role", unreachable.len())
}

async fn run_store(name: &str, args: &ArgMatches) -> Result<()> {
    let config = match args.get_one::<String>("base-url") {
        Some(url) => ClientConfig::new(url.as_str()),
        None => ClientConfig::from_env(),
    };
    info!(base_url = %config.base_url, "connecting");
    let ctx = StoreContext::new(RestClient::new(config)?);
    let store: Arc<EntityStore<Value, RestClient>> = ctx.store(arg(args, "entity")?)?;

    match name {
        "list" => {
            let params: QueryParams = args
                .get_many::<(String, String)>("param")
                .into_iter()
                .flatten()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            print_json(&store.list(params).await?)
        }
        "get" => print_json(&store.get(arg(args, "id")?).await?),
        "create" => print_json(&store.create(&body(args)?).await?),
        "update" => print_json(&store.update(arg(args, "id")?, &body(args)?).await?),
        "remove" => {
            let id = store.remove(arg(args, "id")?).await?;
            println!("removed {id}");
            Ok(())
        }
        other => bail!("unknown store command {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("roles", args)) => show_roles(args.get_flag("json")),
        Some(("nav", args)) => show_nav(args),
        Some(("audit", _)) => audit(),
        Some((name, args)) => run_store(name, args).await,
        None => Ok(()),
    }
}
