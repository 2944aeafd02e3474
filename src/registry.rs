// ==============================================================================
// Name Registry: Cross-Document Command and Event Collection
// ==============================================================================
//
// Commands and events produce no per-document output. Instead their names are
// collected across the whole run and rendered once at the end, into the
// service and the event enum. The registry is owned by the driver and threaded
// through each document's translation.

/// Command and event names collected across every translated document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRegistry {
    /// Command names in traversal order.
    commands: Vec<String>,
    /// Event names in traversal order.
    events: Vec<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, name: impl Into<String>) {
        self.commands.push(name.into());
    }

    pub fn add_event(&mut self, name: impl Into<String>) {
        self.events.push(name.into());
    }

    /// Command names in the order they were registered.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Event names in the order they were registered.
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Event names sorted lexicographically, which is the order they are
    /// numbered in the event enum.
    pub fn sorted_events(&self) -> Vec<&str> {
        let mut events: Vec<&str> = self.events.iter().map(String::as_str).collect();
        events.sort_unstable();
        events
    }
}
