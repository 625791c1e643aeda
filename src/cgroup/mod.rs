//! Resource-control interface resolution and reading.
//!
//! The agent accounts for its own container through the Linux cgroup filesystem. Two very
//! different layouts exist in the wild:
//!
//! - **v2** (unified): one hierarchy, detected by `<cgroup_root>/cgroup.controllers`. The
//!   group directory comes from the `0::<path>` line of `/proc/self/cgroup`.
//! - **v1**: one mount per controller (`cpuacct`, `cpu`, `memory`, ...), each with its own
//!   membership path.
//!
//! [`CgroupResolver`] turns either layout into a [`CgroupDescriptor`] mapping logical metrics
//! ([`CgroupFile`]) to absolute paths, and [`read`] loads them into a [`CgroupReading`].
//! Missing files never fail resolution; the metric is simply reported as unavailable.
mod descriptor;
mod membership;
mod reader;
mod resolve;

pub use descriptor::{CgroupDescriptor, CgroupFile, CgroupMode, DescriptorBuilder};
pub use membership::{Membership, MembershipError, parse_memberships};
pub use reader::{CgroupReading, read};
pub use resolve::CgroupResolver;
