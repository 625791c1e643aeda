use std::path::{Path, PathBuf};

use super::membership::{Membership, parse_memberships};
use super::{CgroupDescriptor, CgroupFile, CgroupMode};

/// Locates the cgroup files describing the agent's own container.
#[derive(Debug, Clone)]
pub struct CgroupResolver {
    cgroup_root: PathBuf,
    membership_file: PathBuf,
}

impl CgroupResolver {
    /// Creates a resolver reading the membership of the current process under `proc_root`.
    pub fn new(cgroup_root: impl Into<PathBuf>, proc_root: impl AsRef<Path>) -> Self {
        CgroupResolver {
            cgroup_root: cgroup_root.into(),
            membership_file: proc_root.as_ref().join("self/cgroup"),
        }
    }

    /// Resolves the interface version and the path of every metric file.
    ///
    /// Never fails: files that cannot be located are left out of the descriptor, and a host
    /// without any recognizable hierarchy yields [`CgroupMode::Unavailable`].
    pub fn resolve(&self) -> CgroupDescriptor {
        let memberships = match std::fs::read_to_string(&self.membership_file) {
            Ok(contents) => parse_memberships(&contents),
            Err(err) => {
                log::debug!(
                    "failed to read `{}`: {err}",
                    self.membership_file.display()
                );
                Vec::new()
            }
        };

        let descriptor = if self.cgroup_root.join("cgroup.controllers").is_file() {
            self.resolve_v2(&memberships)
        } else if self.has_v1_mounts() {
            self.resolve_v1(&memberships)
        } else {
            CgroupDescriptor::unavailable()
        };
        log::info!(
            "resolved cgroup interface {} under `{}`",
            descriptor.mode(),
            self.cgroup_root.display()
        );
        descriptor
    }

    fn resolve_v2(&self, memberships: &[Membership]) -> CgroupDescriptor {
        let group_dir = memberships
            .iter()
            .find(|m| m.is_unified())
            .map(|m| self.cgroup_root.join(m.relative_path()))
            .filter(|dir| dir.is_dir())
            .unwrap_or_else(|| self.cgroup_root.clone());

        let mut builder = CgroupDescriptor::builder(CgroupMode::V2);
        for file in CgroupFile::ALL {
            if let Some(name) = file.v2_file_name() {
                builder.set_first_existing(file, [group_dir.join(name)]);
            }
        }
        builder.build()
    }

    fn resolve_v1(&self, memberships: &[Membership]) -> CgroupDescriptor {
        let mut builder = CgroupDescriptor::builder(CgroupMode::V1);
        for file in CgroupFile::ALL {
            let relative = memberships
                .iter()
                .find(|m| m.has_controller(file.v1_controller()))
                .map(Membership::relative_path)
                .filter(|rel| !rel.is_empty());

            let candidates = file
                .v1_mount_candidates()
                .iter()
                .map(|mount| self.cgroup_root.join(mount))
                .filter(|mount| mount.is_dir())
                .flat_map(|mount| {
                    let nested = relative.map(|rel| mount.join(rel).join(file.v1_file_name()));
                    nested
                        .into_iter()
                        .chain(std::iter::once(mount.join(file.v1_file_name())))
                })
                .collect::<Vec<_>>();
            builder.set_first_existing(file, candidates);
        }
        builder.build()
    }

    fn has_v1_mounts(&self) -> bool {
        CgroupFile::ALL
            .iter()
            .flat_map(|f| f.v1_mount_candidates())
            .any(|mount| self.cgroup_root.join(mount).is_dir())
    }
}
