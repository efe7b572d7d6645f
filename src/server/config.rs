// Server configuration

/// Server module configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Responses queued for the writer before handlers wait (default: 1024)
    pub outbound_capacity: usize,
    /// Longest accepted request line in bytes, enforced while reading (default: 1 MiB)
    pub max_line_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 1024,
            max_line_bytes: 1024 * 1024,
        }
    }
}
