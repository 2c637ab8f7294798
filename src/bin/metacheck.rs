//! Scene hygiene checker for saved scene files.
//!
//! Table-driven passes (relink, deprecated removal) work standalone; the
//! registry-driven passes (orphan, singleton, update) only fire for specs
//! registered in-process, so a pipeline embedding this crate gets the full
//! set while the standalone tool covers the config tables.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use metanode::keys::{A_LINEAL_VERSION, A_META_VERSION};
use metanode::{MetaConfig, MetaManager, Scene, registry};

/// Validate and fix metanodes in a saved scene
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene JSON file
    #[arg(value_name = "SCENE")]
    scene: PathBuf,

    /// Manager config JSON (relink/check/remove tables)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Apply fixes and write the scene back
    #[arg(long)]
    fix: bool,

    /// Output path (defaults to overwriting the input when --fix)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// List every metanode in the scene
    #[arg(short, long)]
    list: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logger();
    let args = Args::parse();

    let mut scene = Scene::load(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;

    let config = match &args.config {
        Some(path) => MetaConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MetaConfig::new(),
    };

    if args.list {
        for node in scene.meta_nodes() {
            let meta_type = node.meta_type().unwrap_or("?");
            let registered = if registry::is_registered(meta_type) {
                ""
            } else {
                "  [unregistered]"
            };
            println!(
                "{:<24} {:<32} v{} lineal {}{}",
                node.name(),
                meta_type,
                node.attrs.get_i32_or(A_META_VERSION, -1),
                node.attrs.get_i32_or(A_LINEAL_VERSION, -1),
                registered
            );
        }
    }

    let mut manager = MetaManager::new(config);
    manager.validate(&scene);

    if !manager.has_issues() {
        println!("scene is clean: {} nodes checked", scene.len());
        return Ok(());
    }

    println!("{} issue(s) found", manager.issue_count());
    if args.fix {
        let msgs = manager.fix_all(&mut scene).context("fixing scene")?;
        for msg in &msgs {
            println!("{}", msg);
        }
        let out = args.output.unwrap_or(args.scene);
        scene
            .save(&out)
            .with_context(|| format!("saving scene {}", out.display()))?;
        println!("saved fixed scene to {}", out.display());
    } else {
        println!("re-run with --fix to apply fixes");
    }
    Ok(())
}
