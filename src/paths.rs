use std::path::{Path, PathBuf};

/// Systemd's system-wide unit directory
pub const UNIT_DIR: &str = "/etc/systemd/system";

/// Where unit files are staged before the privileged move
pub const STAGING_DIR: &str = "/tmp";

/// File extension for service units
pub const UNIT_EXT: &str = "service";

/// File name of the unit for a service, e.g. "myserver.service"
pub fn unit_file_name(service_name: &str) -> String {
    format!("{}.{}", service_name, UNIT_EXT)
}

/// Final install location of the unit file
pub fn unit_path(service_name: &str) -> PathBuf {
    Path::new(UNIT_DIR).join(unit_file_name(service_name))
}

/// Temporary staging location of the unit file
pub fn staging_path(service_name: &str) -> PathBuf {
    Path::new(STAGING_DIR).join(unit_file_name(service_name))
}
