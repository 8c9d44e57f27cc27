//! CLI probe: opens the configured database and prints the top-level
//! circle layout.
//!
//! Usage: `circleboard_cli [--config <file.json>] [--json]`

use circleboard_core::db::migrations::schema_status;
use circleboard_core::repo::circle_repo::SqliteCircleRepository;
use circleboard_core::{
    init_logging_from_config, open_configured, pack_circles, truncate_to_width, wrap_text,
    CircleService, CoreConfig, LayoutKind,
};
use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const DIAGRAM_RADIUS: f64 = 300.0;
const ROOT_FALLBACK_COLOR: &str = "#6b7280";
const LABEL_FONT_SIZE: f64 = 12.0;

#[derive(Parser)]
#[command(name = "circleboard_cli", version, about = "Inspect a circleboard database")]
struct Args {
    /// JSON config file; `CIRCLEBOARD_*` variables still override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the packed layout as JSON.
    #[arg(long)]
    json: bool,
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::load(args.config.as_deref())?;
    init_logging_from_config(&config)?;

    let conn = open_configured(&config)?;
    let schema = schema_status(&conn)?;
    let service = CircleService::new(SqliteCircleRepository::try_new(&conn)?);

    println!("circleboard_core ping={}", circleboard_core::ping());
    println!("circleboard_core version={}", circleboard_core::core_version());
    println!("schema version={}/{}", schema.current, schema.latest);

    let Some(root) = service.load_circle_tree()? else {
        println!("no root circle");
        return Ok(());
    };
    info!(
        "event=cli_layout module=cli status=ok circles={} roles={}",
        root.circle_count(),
        root.roles.len()
    );

    let color = root.color.as_deref().unwrap_or(ROOT_FALLBACK_COLOR);
    let items = pack_circles(DIAGRAM_RADIUS, &root.children, &root.roles, color);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!("root={} children={}", root.name, items.len());
    for item in &items {
        let label = match item.kind {
            LayoutKind::Circle => {
                wrap_text(&item.label, item.radius * 1.6, LABEL_FONT_SIZE, 2).join(" / ")
            }
            LayoutKind::Role => truncate_to_width(&item.label, item.radius * 2.0, LABEL_FONT_SIZE),
        };
        println!(
            "{:?} x={:.1} y={:.1} r={:.1} color={} label={}",
            item.kind, item.x, item.y, item.radius, item.color, label
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn flags_are_parsed() {
        let args = Args::try_parse_from(["circleboard_cli", "--config", "/etc/board.json", "--json"])
            .unwrap();
        assert_eq!(args.config.as_deref(), Some(Path::new("/etc/board.json")));
        assert!(args.json);

        let bare = Args::try_parse_from(["circleboard_cli"]).unwrap();
        assert!(bare.config.is_none());
        assert!(!bare.json);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Args::try_parse_from(["circleboard_cli", "--colour"]).is_err());
        assert!(Args::try_parse_from(["circleboard_cli", "--config"]).is_err());
    }
}
