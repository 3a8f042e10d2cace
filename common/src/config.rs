//! Settings-file loading engine.
//!
//! This finds the default location of the rtkqa settings file and loads it
//! into a typed struct. The file format is HCL. A missing file is not an
//! error: every setting has a default, so callers get `T::default()` back.
//!

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use eyre::{eyre, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

/// Default settings filename
const CONFIG: &str = "settings.hcl";

/// Directory name under the per-user configuration base
const TAG: &str = "rtkqa";

/// Settings files carry a version number so stale files from an older
/// release are rejected instead of being half-understood.
///
pub trait Versioned {
    /// Version the running binary expects.
    const CURRENT: usize;

    /// Version found in the file.
    fn version(&self) -> usize;
}

/// Returns the per-user configuration directory for rtkqa.
///
pub fn config_path() -> PathBuf {
    let base = match BaseDirs::new() {
        Some(base) => {
            #[cfg(unix)]
            let base = base.home_dir().join(".config");

            #[cfg(windows)]
            let base = base.data_local_dir().to_path_buf();

            base
        }
        None => PathBuf::from("."),
    };
    base.join(TAG)
}

/// Returns the path of the default settings file.
///
pub fn default_config_file() -> PathBuf {
    let cfg = config_path().join(CONFIG);
    debug!("default = {cfg:?}");
    cfg
}

/// Load the settings file and return a struct `T`.
///
/// Search order:
/// - file specified by the caller (an explicit file that does not exist is
///   an error),
/// - the default location, falling back to `T::default()` when absent.
///
pub fn load_config<T>(fname: Option<&Path>) -> Result<T>
where
    T: Debug + DeserializeOwned + Default + Versioned,
{
    let fname = match fname {
        Some(fname) => {
            if !fname.exists() {
                return Err(eyre!("unknown settings file {fname:?}"));
            }
            fname.to_path_buf()
        }
        None => {
            let def = default_config_file();
            if !def.exists() {
                trace!("no settings file, using defaults");
                return Ok(T::default());
            }
            def
        }
    };

    trace!("loading settings from {fname:?}");

    let data = fs::read_to_string(&fname)?;
    let data: T = hcl::from_str(&data)?;
    debug!("settings = {data:?}");

    if data.version() != T::CURRENT {
        return Err(eyre!(
            "bad settings version {} in {:?}, expected {}",
            data.version(),
            fname,
            T::CURRENT
        ));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    #[serde(default)]
    struct Foo {
        version: usize,
        name: String,
    }

    impl Default for Foo {
        fn default() -> Self {
            Foo {
                version: 1,
                name: String::from("default"),
            }
        }
    }

    impl Versioned for Foo {
        const CURRENT: usize = 1;

        fn version(&self) -> usize {
            self.version
        }
    }

    #[test]
    fn test_load_explicit_file() -> Result<()> {
        let mut f = tempfile::NamedTempFile::new()?;
        writeln!(f, "version = 1\nname = \"local\"")?;

        let foo: Foo = load_config(Some(f.path()))?;
        assert_eq!("local", foo.name);
        Ok(())
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let r: Result<Foo> = load_config(Some(Path::new("/nonexistent/settings.hcl")));
        assert!(r.is_err());
    }

    #[test]
    fn test_load_bad_version_fails() -> Result<()> {
        let mut f = tempfile::NamedTempFile::new()?;
        writeln!(f, "version = 99\nname = \"stale\"")?;

        let r: Result<Foo> = load_config(Some(f.path()));
        assert!(r.is_err());
        Ok(())
    }
}
