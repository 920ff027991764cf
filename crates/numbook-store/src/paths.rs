use crate::error::{Result, StoreError};
use numbook_core::UserId;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "numbook";
const SESSIONS_DIR: &str = "sessions";
const INPUT_DIR: &str = "in";
const OUTPUT_DIR: &str = "out";

pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_DATA_HOME") {
        let path = PathBuf::from(dir);
        if path.as_os_str().is_empty() {
            return Err(StoreError::InvalidDataPath(path));
        }
        return Ok(path.join(APP_DIR));
    }

    let home = dirs::home_dir().ok_or(StoreError::MissingHomeDir)?;
    Ok(home.join(".local").join("share").join(APP_DIR))
}

pub fn resolve_sessions_root(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(StoreError::InvalidDataPath(path));
            }
            Ok(path)
        }
        None => Ok(data_dir()?.join(SESSIONS_DIR)),
    }
}

/// On-disk layout of session storage: `root/<user>/in` and `root/<user>/out`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLayout {
    root: PathBuf,
}

impl SessionLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_dir(&self, user: UserId) -> PathBuf {
        self.root.join(user.to_string())
    }

    pub fn input_dir(&self, user: UserId) -> PathBuf {
        self.user_dir(user).join(INPUT_DIR)
    }

    pub fn output_dir(&self, user: UserId) -> PathBuf {
        self.user_dir(user).join(OUTPUT_DIR)
    }

    pub fn ensure_root(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        restrict_dir_permissions(&self.root)?;
        Ok(())
    }

    pub fn ensure_user_dirs(&self, user: UserId) -> Result<(PathBuf, PathBuf)> {
        self.ensure_root()?;
        let input = self.input_dir(user);
        let output = self.output_dir(user);
        fs::create_dir_all(&input)?;
        fs::create_dir_all(&output)?;
        restrict_dir_permissions(&self.user_dir(user))?;
        Ok((input, output))
    }

    /// Removes everything stored for `user`. A missing tree is not an error.
    pub fn remove_user(&self, user: UserId) -> Result<()> {
        remove_dir_if_exists(&self.user_dir(user))
    }

    /// Removes every user tree under the root and returns how many were removed.
    pub fn remove_all(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                remove_dir_if_exists(&entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(unix)]
fn restrict_dir_permissions(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(0o700);
    fs::set_permissions(dir, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_dir_permissions(_dir: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{resolve_sessions_root, SessionLayout};
    use numbook_core::UserId;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn layout_places_user_dirs_under_root() {
        let layout = SessionLayout::new("/srv/sessions");
        assert_eq!(
            layout.input_dir(UserId(7)),
            PathBuf::from("/srv/sessions/7/in")
        );
        assert_eq!(
            layout.output_dir(UserId(7)),
            PathBuf::from("/srv/sessions/7/out")
        );
    }

    #[test]
    fn remove_user_tolerates_missing_tree() {
        let temp = TempDir::new().expect("tempdir");
        let layout = SessionLayout::new(temp.path().join("sessions"));
        layout.remove_user(UserId(1)).expect("remove missing");

        let (input, _) = layout.ensure_user_dirs(UserId(1)).expect("dirs");
        fs::write(input.join("a.txt"), "0811 111 1111\n").expect("write");
        layout.remove_user(UserId(1)).expect("remove");
        assert!(!layout.user_dir(UserId(1)).exists());
    }

    #[test]
    fn remove_all_counts_user_trees() {
        let temp = TempDir::new().expect("tempdir");
        let layout = SessionLayout::new(temp.path().join("sessions"));
        assert_eq!(layout.remove_all().expect("empty root"), 0);
        layout.ensure_user_dirs(UserId(1)).expect("dirs 1");
        layout.ensure_user_dirs(UserId(2)).expect("dirs 2");
        assert_eq!(layout.remove_all().expect("remove all"), 2);
        assert!(layout.root().exists());
        assert!(!layout.user_dir(UserId(2)).exists());
    }

    #[test]
    fn resolve_sessions_root_rejects_empty_path() {
        assert!(resolve_sessions_root(Some(PathBuf::new())).is_err());
    }
}
