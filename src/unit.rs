/// Runtime settings for the service being installed.
///
/// `service_name` names the unit file and the systemctl invocations; the
/// other three fields are substituted into the unit body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Absolute path to the server binary
    pub server_path: String,
    /// Systemd service name
    pub service_name: String,
    /// Linux user to run the service
    pub user: String,
    /// Working directory for the server
    pub working_dir: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server_path: "/home/ctf-pi/server".into(),
            service_name: "myserver".into(),
            user: "ctf-pi".into(),
            working_dir: "/home/ctf-pi".into(),
        }
    }
}

impl ServiceConfig {
    /// Render the unit file content for this configuration.
    pub fn unit_text(&self) -> String {
        build_unit(&self.server_path, &self.user, &self.working_dir)
    }
}

/// Build the systemd unit file content with the provided runtime settings.
///
/// Pure and deterministic; the inputs are not validated here (a bad path or
/// unknown user is systemd's to reject at start time).
pub fn build_unit(server_path: &str, user: &str, working_dir: &str) -> String {
    format!(
        "[Unit]\n\
         Description=CTF Web Server\n\
         After=network.target\n\
         [Service]\n\
         Type=simple\n\
         User={}\n\
         WorkingDirectory={}\n\
         ExecStart={}\n\
         Restart=on-failure\n\
         RestartSec=5\n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        user, working_dir, server_path
    )
}
