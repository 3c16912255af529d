use sysinfo::System;

/// Number of logical CPUs on this host, never less than one.
#[must_use]
pub fn host_cpu_count() -> usize {
    let mut system = System::new();
    system.refresh_cpu_all();
    system.cpus().len().max(1)
}
