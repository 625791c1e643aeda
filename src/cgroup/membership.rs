use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MembershipError {
    #[error("invalid cgroup line format: {0}")]
    InvalidFormat(String),
    #[error("invalid hierarchy id in cgroup line: {0}")]
    InvalidHierarchyId(String),
}

/// One line of a `/proc/<pid>/cgroup` file: `<hierarchy-id>:<controller-list>:<path>`.
///
/// On cgroup v2 the unified hierarchy is reported as `0::<path>`; on v1 every mounted
/// hierarchy gets its own line, e.g. `4:cpu,cpuacct:/docker/<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub hierarchy_id: u32,
    pub controllers: Vec<String>,
    pub path: String,
}

impl Membership {
    /// Returns true for the cgroup v2 unified hierarchy entry (`0::<path>`).
    pub fn is_unified(&self) -> bool {
        self.hierarchy_id == 0 && self.controllers.is_empty()
    }

    pub fn has_controller(&self, name: &str) -> bool {
        self.controllers.iter().any(|c| c == name)
    }

    /// The membership path without its leading `/`, ready to be joined onto a mount point.
    pub fn relative_path(&self) -> &str {
        self.path.trim_start_matches('/')
    }

    /// Returns true if the path is the hierarchy root or the host's init scope.
    pub fn is_root_level(&self) -> bool {
        matches!(self.path.as_str(), "/" | "/init.scope")
    }
}

impl FromStr for Membership {
    type Err = MembershipError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        // The path itself may contain ':'; only the first two separators are significant.
        let mut it = line.trim_end().splitn(3, ':');
        let hierarchy_id = it
            .next()
            .ok_or_else(|| MembershipError::InvalidFormat(line.to_owned()))?
            .parse::<u32>()
            .map_err(|_| MembershipError::InvalidHierarchyId(line.to_owned()))?;
        let controller_list = it
            .next()
            .ok_or_else(|| MembershipError::InvalidFormat(line.to_owned()))?;
        let path = it
            .next()
            .ok_or_else(|| MembershipError::InvalidFormat(line.to_owned()))?;

        let controllers = if controller_list.is_empty() {
            Vec::new()
        } else {
            controller_list.split(',').map(str::to_owned).collect()
        };

        Ok(Membership {
            hierarchy_id,
            controllers,
            path: path.to_owned(),
        })
    }
}

/// Parses a whole membership file. Malformed lines are skipped.
pub fn parse_memberships(contents: &str) -> Vec<Membership> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match line.parse::<Membership>() {
            Ok(m) => Some(m),
            Err(err) => {
                log::debug!("skipping cgroup membership line: {err}");
                None
            }
        })
        .collect()
}
