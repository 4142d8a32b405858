use std::path::{Path, PathBuf};

pub mod commit;
pub mod detect;
pub mod status;

pub type CmdResult<T> = shipshape::Result<(T, i32)>;

/// Project root for a command: the explicit `--root` value, or the current
/// working directory.
pub(crate) fn resolve_root(arg: Option<&Path>) -> shipshape::Result<PathBuf> {
    match arg {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::current_dir().map_err(shipshape::Error::from),
    }
}
