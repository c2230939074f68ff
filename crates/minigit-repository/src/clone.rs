//! Ref finalization after a clone fetch.

use bstr::{BString, ByteSlice};
use minigit_hash::ObjectId;
use minigit_ref::RefName;

use crate::{RepoError, Repository};

/// Choose the branch to check out from an advertised ref list.
///
/// Preference order: `refs/heads/main`, then `refs/heads/master`, then the
/// first advertised head. Returns `(short branch name, oid)`.
pub fn select_default_ref(refs: &[(ObjectId, BString)]) -> Option<(String, ObjectId)> {
    for wanted in ["refs/heads/main", "refs/heads/master"] {
        if let Some((oid, name)) = refs.iter().find(|(_, name)| name.as_bstr() == wanted) {
            let short = name
                .to_str_lossy()
                .strip_prefix("refs/heads/")
                .unwrap()
                .to_string();
            return Some((short, *oid));
        }
    }

    refs.iter()
        .find(|(_, name)| name.starts_with(b"refs/heads/"))
        .map(|(oid, name)| {
            let short = name
                .to_str_lossy()
                .strip_prefix("refs/heads/")
                .unwrap()
                .to_string();
            (short, *oid)
        })
}

/// Write the clone's refs once all objects are persisted.
///
/// Every advertised `refs/heads/<b>` becomes `refs/remotes/origin/<b>`;
/// the default branch also gets a local `refs/heads/<b>`, and HEAD is
/// written last as a symref to it. Returns the chosen `(branch, oid)`.
pub fn finalize_clone_refs(
    repo: &Repository,
    advertised: &[(ObjectId, BString)],
) -> Result<(String, ObjectId), RepoError> {
    let (default_branch, default_oid) =
        select_default_ref(advertised).ok_or(RepoError::NoBranch)?;

    for (oid, name) in advertised {
        let name_str = name.to_str_lossy();
        if let Some(branch) = name_str.strip_prefix("refs/heads/") {
            let remote = RefName::new(format!("refs/remotes/origin/{branch}"))?;
            repo.refs().write_ref(&remote, oid)?;
        }
    }

    let local = RefName::new(format!("refs/heads/{default_branch}"))?;
    repo.refs().write_ref(&local, &default_oid)?;

    let head = RefName::new("HEAD")?;
    repo.refs().write_symbolic_ref(&head, &local)?;

    Ok((default_branch, default_oid))
}
