use super::{Error, Result, Sha1Hash};
use std::fs;
use std::path::Path;

/// Creates `objects/`, `refs/heads/` and a `HEAD` pointing at `branch`.
/// Existing directories are left as they are.
pub fn init<P: AsRef<Path>>(git_dir: P, branch: &str) -> Result<()> {
    let git_dir = git_dir.as_ref();
    fs::create_dir_all(git_dir.join("objects"))?;
    fs::create_dir_all(git_dir.join("refs").join("heads"))?;
    write_head(git_dir, branch)
}

pub fn write_head<P: AsRef<Path>>(git_dir: P, branch: &str) -> Result<()> {
    check_branch(branch)?;
    fs::write(
        git_dir.as_ref().join("HEAD"),
        format!("ref: refs/heads/{branch}\n"),
    )?;
    Ok(())
}

/// Returns the branch `HEAD` points at.
pub fn read_head<P: AsRef<Path>>(git_dir: P) -> Result<String> {
    let text = fs::read_to_string(git_dir.as_ref().join("HEAD"))?;
    text.trim_end()
        .strip_prefix("ref: refs/heads/")
        .map(String::from)
        .ok_or_else(|| Error::CorruptObject(format!("HEAD is not a branch ref: {text:?}")))
}

/// Overwrites `refs/heads/<branch>`; the previous value is not kept.
pub fn write_ref<P: AsRef<Path>>(git_dir: P, branch: &str, hash: &Sha1Hash) -> Result<()> {
    check_branch(branch)?;
    let path = git_dir.as_ref().join("refs").join("heads").join(branch);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, format!("{hash}\n"))?;
    Ok(())
}

pub fn read_ref<P: AsRef<Path>>(git_dir: P, branch: &str) -> Result<Sha1Hash> {
    check_branch(branch)?;
    let path = git_dir.as_ref().join("refs").join("heads").join(branch);
    let text = fs::read_to_string(path)?;
    Sha1Hash::from_hex(text.trim_end())
}

// Nested names like `feature/x` are allowed, escaping `refs/heads` is not.
fn check_branch(branch: &str) -> Result<()> {
    let valid = !branch.is_empty()
        && !branch.starts_with('/')
        && branch
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..");
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgs(format!("invalid branch name: {branch:?}")))
    }
}
