//! Local storage of provider-issued private keys.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::KeyMaterialStore;

/// Writes `<dir>/<name>.pem` with owner-only read permission.
pub struct PemKeyStore {
    dir: PathBuf,
}

impl PemKeyStore {
    /// Store keys under `~/.<project>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn for_project(project: &str) -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::in_dir(home.join(format!(".{project}"))))
    }

    #[must_use]
    pub fn in_dir(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl KeyMaterialStore for PemKeyStore {
    fn save_private_key(&self, name: &str, material: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("cannot create {}", self.dir.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(0o700))
                .with_context(|| format!("cannot set permissions on {}", self.dir.display()))?;
        }

        let path = self.private_key_path(name);
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o400);
        }
        let mut file = options.open(&path).with_context(|| {
            format!(
                "cannot create {}. Remove the stale key file and its key pair first.",
                path.display()
            )
        })?;
        file.write_all(material.as_bytes())
            .with_context(|| format!("cannot write {}", path.display()))?;
        if !material.ends_with('\n') {
            file.write_all(b"\n")
                .with_context(|| format!("cannot write {}", path.display()))?;
        }
        Ok(path)
    }

    fn private_key_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.pem"))
    }
}
