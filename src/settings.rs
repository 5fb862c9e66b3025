//! Per-machine settings selection.
//!
//! Each installation has a machine id (e.g. `production`, `staging`, or a
//! developer's own name). Settings code picks values per machine id:
//!
//! ```
//! use obfid_rs::settings::pick_for;
//!
//! let debug = pick_for("staging", false, [("development", true), ("staging", true)]);
//! assert!(debug);
//! let debug = pick_for("production", false, [("development", true)]);
//! assert!(!debug);
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

/// Environment variable that names the machine.
pub const MACHINE_ID_VAR: &str = "MACHINE_ID";

/// Older name of the variable, read when `MACHINE_ID` is not set.
pub const LEGACY_MACHINE_ID_VAR: &str = "DJANGO_MACHINE_ID";

/// File holding the machine id when the variable is not set.
pub const MACHINE_ID_FILE: &str = ".machine_id";

/// Id used when nothing else is configured.
pub const DEFAULT_MACHINE_ID: &str = "development";

/// Where to look for the machine id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lookup {
    /// Value of the environment variable, if set.
    pub env_value: Option<String>,
    /// Directories searched for the machine id file, in order.
    pub search_paths: Vec<PathBuf>,
}

impl Lookup {
    /// The standard lookup: the `MACHINE_ID` variable (or the legacy
    /// `DJANGO_MACHINE_ID`), then the current directory, then the user's home
    /// directory.
    pub fn from_environment() -> Self {
        let mut search_paths = vec![PathBuf::from(".")];
        if let Some(dirs) = BaseDirs::new() {
            search_paths.push(dirs.home_dir().to_path_buf());
        }
        Lookup {
            env_value: env_machine_id(|name| env::var(name).ok()),
            search_paths,
        }
    }
}

/// The first non-blank value of `MACHINE_ID` and `DJANGO_MACHINE_ID`.
fn env_machine_id<F>(var: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    [MACHINE_ID_VAR, LEGACY_MACHINE_ID_VAR]
        .into_iter()
        .filter_map(var)
        .find(|value| !value.trim().is_empty())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Environment,
    File(PathBuf),
    Default,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineId {
    pub id: String,
    pub source: Source,
}

impl MachineId {
    pub fn resolve(lookup: &Lookup) -> MachineId {
        if let Some(id) = lookup.env_value.as_deref().map(str::trim) {
            if !id.is_empty() {
                return MachineId {
                    id: id.to_string(),
                    source: Source::Environment,
                };
            }
        }

        for dir in &lookup.search_paths {
            let path = dir.join(MACHINE_ID_FILE);
            if let Some(id) = read_id_file(&path) {
                debug!(path = %path.display(), machine_id = %id, "read machine id");
                return MachineId {
                    id,
                    source: Source::File(path),
                };
            }
        }

        warn!(
            machine_id = DEFAULT_MACHINE_ID,
            "no machine id configured, set {} or create a {} file in the working or home directory",
            MACHINE_ID_VAR,
            MACHINE_ID_FILE
        );
        MachineId {
            id: DEFAULT_MACHINE_ID.to_string(),
            source: Source::Default,
        }
    }
}

fn read_id_file(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(contents) => {
            let id = contents.trim();
            (!id.is_empty()).then(|| id.to_string())
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read machine id file");
            None
        }
    }
}

static MACHINE_ID: OnceCell<MachineId> = OnceCell::new();

/// The machine id of this process, looked up once.
pub fn machine_id() -> &'static str {
    &MACHINE_ID
        .get_or_init(|| MachineId::resolve(&Lookup::from_environment()))
        .id
}

/// Picks the value configured for `environment`, or `default`.
pub fn pick_for<'a, V, I>(environment: &str, default: V, values: I) -> V
where
    I: IntoIterator<Item = (&'a str, V)>,
{
    values
        .into_iter()
        .find(|(name, _)| *name == environment)
        .map_or(default, |(_, value)| value)
}

/// Picks the value configured for this machine, or `default`.
pub fn pick<'a, V, I>(default: V, values: I) -> V
where
    I: IntoIterator<Item = (&'a str, V)>,
{
    pick_for(machine_id(), default, values)
}
