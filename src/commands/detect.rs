use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use shipshape::detect;
use shipshape::Config;
use shipshape::EcosystemKind;

use super::CmdResult;

#[derive(Args)]
pub struct DetectArgs {
    /// Project root (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Recursion depth below the root (overrides configuration)
    #[arg(long)]
    pub depth: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DetectOutput {
    pub command: &'static str,
    pub root: PathBuf,
    pub detected: Vec<DetectedEcosystem>,
}

#[derive(Debug, Serialize)]
pub struct DetectedEcosystem {
    pub kind: EcosystemKind,
    pub name: &'static str,
    /// Marker files that matched, relative to the root, walked to the same
    /// depth as detection.
    pub markers: Vec<PathBuf>,
}

pub fn run_json(args: DetectArgs) -> CmdResult<DetectOutput> {
    let root = super::resolve_root(args.root.as_deref())?;
    let config = Config::load(&root)?;
    let depth = args.depth.unwrap_or(config.workflow.detect_depth);

    let detected = detect::detect(&root, depth)?
        .into_iter()
        .map(|kind| DetectedEcosystem {
            kind,
            name: kind.display_name(),
            markers: detect::matched_markers(&root, kind, depth),
        })
        .collect();

    Ok((
        DetectOutput {
            command: "detect",
            root,
            detected,
        },
        0,
    ))
}
