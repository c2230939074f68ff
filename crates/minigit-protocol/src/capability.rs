//! Capability parsing and negotiation.
//!
//! In protocol v1, the server appends its capability list after a NUL byte
//! on the first advertised ref line. The client echoes the subset it wants
//! on its first want line.

/// Parsed set of server capabilities.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    entries: Vec<CapabilityEntry>,
}

/// A single capability, optionally with a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityEntry {
    pub name: String,
    pub value: Option<String>,
}

impl Capabilities {
    /// Parse capabilities from a whitespace-separated capability string.
    ///
    /// The first ref line looks like:
    /// `<oid> HEAD\0multi_ack thin-pack side-band-64k ofs-delta symref=HEAD:refs/heads/main agent=git/2.39.0`
    pub fn parse(caps_str: &str) -> Self {
        let mut entries = Vec::new();
        for cap in caps_str.split_whitespace() {
            if let Some(eq_pos) = cap.find('=') {
                entries.push(CapabilityEntry {
                    name: cap[..eq_pos].to_string(),
                    value: Some(cap[eq_pos + 1..].to_string()),
                });
            } else {
                entries.push(CapabilityEntry {
                    name: cap.to_string(),
                    value: None,
                });
            }
        }
        Self { entries }
    }

    /// Check if a capability is advertised.
    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Get the value of a capability (e.g., `symref=HEAD:refs/heads/main`).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.value.as_deref())
    }

    /// Get all capability entries.
    pub fn entries(&self) -> &[CapabilityEntry] {
        &self.entries
    }
}

/// Negotiate fetch capabilities (client side).
///
/// Given the server's capabilities, produce the list the client requests.
/// `side-band-64k` is the one this client relies on; the pack reader also
/// copes with servers that send a bare pack.
pub fn negotiate_fetch_capabilities(server: &Capabilities) -> Vec<String> {
    let mut client = Vec::new();

    if server.has("side-band-64k") {
        client.push("side-band-64k".into());
    }

    if server.has("ofs-delta") {
        client.push("ofs-delta".into());
    }

    if server.has("thin-pack") {
        client.push("thin-pack".into());
    }

    if server.has("multi_ack_detailed") {
        client.push("multi_ack_detailed".into());
    }

    // Always send agent
    client.push(concat!("agent=minigit/", env!("CARGO_PKG_VERSION")).into());

    client
}
