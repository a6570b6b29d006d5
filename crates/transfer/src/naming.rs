use std::path::Path;

use b2up_protocol::constants::MAX_FILE_NAME_BYTES;

use crate::TransferError;

/// Normalizes a relative path into a remote object name.
///
/// Backslashes become forward slashes and leading slashes are dropped.
pub fn normalize_remote_name(raw: &str) -> String {
    raw.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Derives the remote name of `path` relative to the upload `root`.
///
/// Falls back to a textual prefix match when the two paths do not share
/// components (e.g. a Windows path handled on a Unix host).
pub fn remote_name_for(root: &Path, path: &Path) -> Result<String, TransferError> {
    let name = match path.strip_prefix(root) {
        Ok(rel) => normalize_remote_name(&rel.to_string_lossy()),
        Err(_) => relative_by_text(root, path)?,
    };
    validate_remote_name(&name)?;
    Ok(name)
}

fn relative_by_text(root: &Path, path: &Path) -> Result<String, TransferError> {
    let root_text = root.to_string_lossy().replace('\\', "/");
    let path_text = path.to_string_lossy().replace('\\', "/");
    let root_text = root_text.trim_end_matches('/');

    path_text
        .strip_prefix(root_text)
        .filter(|rest| rest.starts_with('/'))
        .map(normalize_remote_name)
        .ok_or_else(|| TransferError::OutsideRoot {
            path: path.display().to_string(),
            root: root.display().to_string(),
        })
}

/// Validates that a remote name is usable as an object key.
///
/// Rejects:
/// - Empty names
/// - Leading `/`
/// - `..` segments
/// - Control characters
/// - Names longer than the service limit
pub fn validate_remote_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidRemoteName("empty name".into()));
    }

    if name.starts_with('/') {
        return Err(TransferError::InvalidRemoteName(format!(
            "leading slash not allowed: {name}"
        )));
    }

    if name.len() > MAX_FILE_NAME_BYTES {
        return Err(TransferError::InvalidRemoteName(format!(
            "name exceeds {MAX_FILE_NAME_BYTES} bytes: {name}"
        )));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(TransferError::InvalidRemoteName(format!(
            "control character in name: {name:?}"
        )));
    }

    if name.split('/').any(|segment| segment == "..") {
        return Err(TransferError::InvalidRemoteName(format!(
            "parent directory segment not allowed: {name}"
        )));
    }

    Ok(())
}
